//! Structured subroutine documentation, rendered as a banner above the entry point.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subroutine {
    pub addr: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Register -> meaning, in document order.
    #[serde(default)]
    pub on_entry: IndexMap<String, String>,
    #[serde(default)]
    pub on_exit: IndexMap<String, String>,
}

impl Subroutine {
    /// Banner heading: the title, else the name.
    pub fn heading(&self) -> &str {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or("")
    }

    /// Only titled subroutines get a banner.
    pub fn has_banner(&self) -> bool {
        self.title.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// A source comment that restates the banner.
    pub fn repeats(&self, comment: &str) -> bool {
        match self.title.as_deref() {
            Some(title) if !title.is_empty() => comment.starts_with(title),
            _ => false,
        }
    }
}

/// Address range covered by one disassembled image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Meta {
    pub load_addr: u32,
    /// Exclusive.
    pub end_addr: u32,
}

impl Default for Meta {
    fn default() -> Self {
        Self {
            load_addr: 0,
            end_addr: 0xFFFF,
        }
    }
}

impl Meta {
    pub fn contains(&self, addr: u32) -> bool {
        (self.load_addr..self.end_addr).contains(&addr)
    }
}

/// Subroutines whose entry point lies inside the image.
pub fn filter_subroutines(subroutines: &[Subroutine], meta: &Meta) -> Vec<Subroutine> {
    subroutines
        .iter()
        .filter(|s| meta.contains(s.addr))
        .cloned()
        .collect()
}
