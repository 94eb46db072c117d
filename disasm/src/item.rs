//! Per-version disassembly items and their lowering into listing lines.

use crate::line::{DisassemblyLine, Fragment, FragmentKind, LineKind};
use crate::subroutine::{filter_subroutines, Meta, Subroutine};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ItemKind {
    Code,
    Byte,
    Word,
    #[serde(rename = "string")]
    #[strum(serialize = "string")]
    Str,
}

/// One disassembled unit as emitted by the disassembler: an instruction or a
/// data directive, with the labels and comments that surround it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub addr: u32,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    #[serde(default)]
    pub mnemonic: Option<String>,
    #[serde(default)]
    pub operand: Option<String>,
    #[serde(default)]
    pub values: Vec<u32>,
    #[serde(default)]
    pub string: Option<String>,
    #[serde(default)]
    pub bytes: Vec<u8>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub comments_before: Vec<String>,
    #[serde(default)]
    pub comment_inline: Option<String>,
    #[serde(default)]
    pub comments_after: Vec<String>,
    #[serde(default)]
    pub target: Option<u32>,
}

/// One disassembled image as delivered per version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disassembly {
    #[serde(default)]
    pub meta: Meta,
    pub items: Vec<Item>,
    #[serde(default)]
    pub subroutines: Vec<Subroutine>,
}

impl Disassembly {
    /// Listing lines, with banners for the subroutines inside the image.
    pub fn lines(&self) -> Vec<DisassemblyLine> {
        lower(&self.items, &filter_subroutines(&self.subroutines, &self.meta))
    }
}

/// Lower items into listing lines, attaching come-from edges to branch
/// targets and a banner to every item that starts a titled subroutine.
pub fn lower(items: &[Item], subroutines: &[Subroutine]) -> Vec<DisassemblyLine> {
    let banners: BTreeMap<u32, &Subroutine> = subroutines
        .iter()
        .filter(|s| s.has_banner())
        .map(|s| (s.addr, s))
        .collect();
    let come_from = collect_come_from(items);
    let mut lines = vec![];
    for item in items {
        let start = lines.len();
        lower_item(item, banners.get(&item.addr).copied(), &mut lines);
        if let Some(refs) = come_from.get(&item.addr) {
            // First label line, otherwise the main line.
            let slot = lines[start..]
                .iter()
                .position(|l| l.kind == LineKind::Label)
                .or_else(|| {
                    lines[start..]
                        .iter()
                        .position(|l| matches!(l.kind, LineKind::Instruction | LineKind::Data))
                });
            if let Some(idx) = slot {
                lines[start + idx].references.extend(refs.iter().copied());
            }
        }
    }
    lines
}

/// Reverse branch edges: target address -> addresses that branch or call into it.
pub fn collect_come_from(items: &[Item]) -> BTreeMap<u32, BTreeSet<u32>> {
    let mut edges: BTreeMap<u32, BTreeSet<u32>> = BTreeMap::new();
    for item in items {
        if let Some(target) = item.target {
            edges.entry(target).or_default().insert(item.addr);
        }
    }
    edges
}

fn lower_item(item: &Item, banner: Option<&Subroutine>, lines: &mut Vec<DisassemblyLine>) {
    let addr = item.addr;

    let mut comments: Vec<&String> = item
        .comments_before
        .iter()
        .filter(|c| !is_reference_comment(c) && !is_banner_line(c))
        .collect();
    match banner {
        Some(sub) => {
            lines.push(DisassemblyLine::blank(addr));
            lines.push(DisassemblyLine::banner(sub));
            comments.retain(|c| !sub.repeats(c));
        }
        None if !comments.is_empty() => lines.push(DisassemblyLine::blank(addr)),
        None => {}
    }
    for text in comments {
        lines.push(DisassemblyLine::comment(addr, text));
    }

    for label in &item.labels {
        lines.push(DisassemblyLine::label(addr, label));
    }

    let mut main = match item.kind {
        ItemKind::Code => {
            let mnemonic = item.mnemonic.as_deref().unwrap_or("").to_ascii_uppercase();
            let mut content = vec![Fragment::new(FragmentKind::Mnemonic, mnemonic)];
            if let Some(operand) = &item.operand {
                content.extend(
                    split_operands(operand)
                        .into_iter()
                        .map(|op| Fragment::new(FragmentKind::Operand, op)),
                );
            }
            DisassemblyLine::new(addr, LineKind::Instruction, content)
        }
        ItemKind::Byte => data_line(
            addr,
            "EQUB",
            FragmentKind::Byte,
            item.values.iter().map(|v| format!("&{:02X}", v)),
        ),
        ItemKind::Word => data_line(
            addr,
            "EQUW",
            FragmentKind::Word,
            item.values.iter().map(|v| format!("&{:04X}", v)),
        ),
        ItemKind::Str => data_line(
            addr,
            "EQUS",
            FragmentKind::Quoted,
            std::iter::once(format!("\"{}\"", item.string.as_deref().unwrap_or(""))),
        ),
    };
    main.comment = item.comment_inline.clone().filter(|c| !c.is_empty());
    main.bytes = item.bytes.clone();
    lines.push(main);

    for text in &item.comments_after {
        lines.push(DisassemblyLine::comment(addr, text));
    }
}

fn data_line(
    addr: u32,
    directive: &str,
    kind: FragmentKind,
    values: impl Iterator<Item = String>,
) -> DisassemblyLine {
    let mut content = vec![Fragment::new(FragmentKind::Directive, directive)];
    content.extend(values.map(|v| Fragment::new(kind, v)));
    DisassemblyLine::new(addr, LineKind::Data, content)
}

/// Split an operand field at top-level commas. Commas inside parentheses or
/// quotes belong to the operand: `(&70),Y` is two operands, `"a,b"` is one.
pub fn split_operands(operand: &str) -> Vec<String> {
    let mut parts = vec![];
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut current = String::new();
    for ch in operand.chars() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '(' | '[') => depth += 1,
            (None, ')' | ']') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(current.trim().to_string());
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }
    if !current.trim().is_empty() || !parts.is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

/// Auto-generated cross-reference comments duplicate the come-from popups.
fn is_reference_comment(text: &str) -> bool {
    text.starts_with('&') && text.contains("referenced")
}

/// Lines made entirely of asterisks are banner decorations.
fn is_banner_line(text: &str) -> bool {
    let stripped = text.trim();
    stripped.chars().count() > 3 && stripped.chars().all(|c| c == '*')
}
