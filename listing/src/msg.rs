use color_print::cprintln;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsgKind {
    Error,
    Warn,
    Note,
}

/// Where a message points: a listing address or a document line (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loc {
    Address(u32),
    Line(usize),
    None,
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Loc::Address(addr) => write!(f, "0x{:04X}", addr),
            Loc::Line(line) => write!(f, "line {}", line),
            Loc::None => write!(f, "-"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Msg {
    pub kind: MsgKind,
    pub text: String,
    pub at: Loc,
}

impl Msg {
    pub fn error(text: String, at: Loc) -> Self {
        Msg {
            kind: MsgKind::Error,
            text,
            at,
        }
    }
    pub fn warn(text: String, at: Loc) -> Self {
        Msg {
            kind: MsgKind::Warn,
            text,
            at,
        }
    }
    pub fn note(text: String, at: Loc) -> Self {
        Msg {
            kind: MsgKind::Note,
            text,
            at,
        }
    }

    pub fn print(&self) {
        match self.kind {
            MsgKind::Error => cprintln!("<red,bold>error</>: {}", self.text),
            MsgKind::Warn => cprintln!("<yellow,bold>warn</>: {}", self.text),
            MsgKind::Note => cprintln!("<green,bold>note</>: {}", self.text),
        }
        cprintln!("     <blue>--></> <underline>{}</>", self.at);
    }
}

pub fn dump(msgs: &[Msg]) {
    for msg in msgs {
        msg.print();
    }
}

pub fn has_error(msgs: &[Msg]) -> bool {
    msgs.iter().any(|msg| msg.kind == MsgKind::Error)
}

pub fn warnings(msgs: &[Msg]) -> impl Iterator<Item = &Msg> {
    msgs.iter().filter(|msg| msg.kind == MsgKind::Warn)
}
