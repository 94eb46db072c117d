use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // Input errors
    #[error("Address out of order at line {index}: 0x{addr:04X} follows 0x{prev:04X}")]
    NonMonotonicAddress { index: usize, prev: u32, addr: u32 },
}

/// Why a span could not be inserted into existing markup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("Range {0}..{1} is outside the markup")]
    OutOfBounds(usize, usize),

    #[error("Range {0}..{1} is empty")]
    Empty(usize, usize),

    #[error("Range {0}..{1} crosses a tag boundary")]
    CrossesTag(usize, usize),

    #[error("Range {0}..{1} lies inside an anchor")]
    InsideAnchor(usize, usize),

    #[error("Range {0}..{1} splits a character reference")]
    SplitsEntity(usize, usize),
}
