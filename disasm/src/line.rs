use crate::subroutine::Subroutine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strum::{Display, EnumString};
use unicode_width::UnicodeWidthStr;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LineKind {
    Instruction,
    Data,
    Label,
    Comment,
    /// Subroutine header block.
    Banner,
    #[default]
    Blank,
}

impl LineKind {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_ascii_lowercase().parse::<Self>() {
            Ok(k) => Ok(k),
            Err(_) => Err(format!("Unknown line kind: {s}")),
        }
    }

    /// Kinds that own their address: they get the address column and the anchor.
    pub fn is_addressed(self) -> bool {
        matches!(
            self,
            LineKind::Instruction | LineKind::Data | LineKind::Label | LineKind::Banner
        )
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FragmentKind {
    Mnemonic,
    Operand,
    Directive,
    Byte,
    Word,
    Quoted,
    Label,
    Text,
}

impl FragmentKind {
    /// A head fragment starts a row's content and is followed by a plain space.
    pub fn is_head(self) -> bool {
        matches!(self, FragmentKind::Mnemonic | FragmentKind::Directive)
    }

    /// Fragments which may carry an address literal or a label name.
    pub fn is_linkable(self) -> bool {
        matches!(self, FragmentKind::Operand | FragmentKind::Word)
    }

    /// Text placed between `prev` and `self` when both share a row.
    pub fn separator(self, prev: FragmentKind) -> &'static str {
        match (prev, self) {
            (p, _) if p.is_head() => " ",
            (FragmentKind::Operand, FragmentKind::Operand) => ",",
            (FragmentKind::Byte | FragmentKind::Word, _) => ", ",
            _ => " ",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub kind: FragmentKind,
    pub text: String,
}

impl Fragment {
    pub fn new(kind: FragmentKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// Display columns.
    pub fn width(&self) -> usize {
        UnicodeWidthStr::width(self.text.as_str())
    }
}

/// One logical row of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisassemblyLine {
    pub address: u32,
    pub kind: LineKind,
    #[serde(default)]
    pub content: Vec<Fragment>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub references: BTreeSet<u32>,
    #[serde(default)]
    pub bytes: Vec<u8>,
    #[serde(default)]
    pub banner: Option<Subroutine>,
}

impl DisassemblyLine {
    pub fn new(address: u32, kind: LineKind, content: Vec<Fragment>) -> Self {
        Self {
            address,
            kind,
            content,
            comment: None,
            references: BTreeSet::new(),
            bytes: vec![],
            banner: None,
        }
    }

    pub fn instruction(address: u32, mnemonic: &str, operands: &[&str]) -> Self {
        let mut content = vec![Fragment::new(FragmentKind::Mnemonic, mnemonic)];
        content.extend(
            operands
                .iter()
                .map(|op| Fragment::new(FragmentKind::Operand, *op)),
        );
        Self::new(address, LineKind::Instruction, content)
    }

    pub fn data(address: u32, directive: &str, kind: FragmentKind, values: &[&str]) -> Self {
        let mut content = vec![Fragment::new(FragmentKind::Directive, directive)];
        content.extend(values.iter().map(|v| Fragment::new(kind, *v)));
        Self::new(address, LineKind::Data, content)
    }

    pub fn label(address: u32, name: &str) -> Self {
        Self::new(
            address,
            LineKind::Label,
            vec![Fragment::new(FragmentKind::Label, name)],
        )
    }

    pub fn comment(address: u32, text: &str) -> Self {
        Self::new(
            address,
            LineKind::Comment,
            vec![Fragment::new(FragmentKind::Text, text)],
        )
    }

    pub fn banner(sub: &Subroutine) -> Self {
        let mut line = Self::new(
            sub.addr,
            LineKind::Banner,
            vec![Fragment::new(FragmentKind::Text, sub.heading())],
        );
        line.banner = Some(sub.clone());
        line
    }

    pub fn blank(address: u32) -> Self {
        Self::new(address, LineKind::Blank, vec![])
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_references(mut self, refs: impl IntoIterator<Item = u32>) -> Self {
        self.references.extend(refs);
        self
    }

    pub fn with_bytes(mut self, bytes: &[u8]) -> Self {
        self.bytes = bytes.to_vec();
        self
    }

    /// Label name of a label line.
    pub fn label_name(&self) -> Option<&str> {
        match self.kind {
            LineKind::Label => self
                .content
                .iter()
                .find(|f| f.kind == FragmentKind::Label)
                .map(|f| f.text.as_str()),
            _ => None,
        }
    }

    /// Free text of a comment line, fragments joined by newlines.
    pub fn comment_text(&self) -> String {
        self.content
            .iter()
            .map(|f| f.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
