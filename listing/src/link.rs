//! Cross-reference linking: address/label anchors on raw row text, then
//! glossary tooltips on the escaped markup.

use crate::banner;
use crate::config::Config;
use crate::format::FormattedLine;
use crate::glossary::{GlossaryEntry, GlossaryIndex};
use crate::markup::Markup;
use crate::msg::{Loc, Msg};
use disasm::{DisassemblyLine, Fragment, FragmentKind, LineKind, Subroutine};
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::ops::Range;
use strum::Display;

/// A link target: the first row shown for an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub address: u32,
    pub id: String,
    pub labels: Vec<String>,
}

impl Anchor {
    pub fn label(&self) -> Option<&str> {
        self.labels.first().map(|l| l.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct AddressIndex {
    anchors: BTreeMap<u32, Anchor>,
    labels: IndexMap<String, u32>,
}

impl AddressIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an anchor for `address`, optionally naming it.
    /// A label keeps the address it was first given.
    pub fn insert(&mut self, address: u32, id: String, label: Option<&str>) {
        let anchor = self.anchors.entry(address).or_insert_with(|| Anchor {
            address,
            id,
            labels: vec![],
        });
        if let Some(label) = label {
            if !self.labels.contains_key(label) {
                self.labels.insert(label.to_string(), address);
                anchor.labels.push(label.to_string());
            }
        }
    }

    pub fn build(lines: &[DisassemblyLine], config: &Config) -> Self {
        let mut index = Self::new();
        for line in lines.iter().filter(|l| l.kind.is_addressed()) {
            index.insert(line.address, config.anchor_id(line.address), line.label_name());
        }
        index
    }

    pub fn get(&self, address: u32) -> Option<&Anchor> {
        self.anchors.get(&address)
    }

    pub fn label(&self, name: &str) -> Option<&Anchor> {
        self.labels.get(name).and_then(|addr| self.anchors.get(addr))
    }

    /// Greatest anchor at or below `address`.
    pub fn nearest(&self, address: u32) -> Option<&Anchor> {
        self.anchors.range(..=address).next_back().map(|(_, a)| a)
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}

/// Render-ready row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedLine {
    /// Anchor id, on the first row shown for an address.
    pub id: Option<String>,
    pub address: u32,
    /// Address column text.
    pub addr: Option<String>,
    pub kind: LineKind,
    pub html: Markup,
    pub hex: Option<String>,
    pub continuation: bool,
    pub oversized: bool,
    /// Addresses that branch into this row, ascending.
    pub come_from: Vec<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum SpanClass {
    Opcode,
    Operand,
    Directive,
    Value,
    #[strum(serialize = "string")]
    Str,
    Label,
    Comment,
}

impl From<FragmentKind> for SpanClass {
    fn from(kind: FragmentKind) -> Self {
        match kind {
            FragmentKind::Mnemonic => SpanClass::Opcode,
            FragmentKind::Operand => SpanClass::Operand,
            FragmentKind::Directive => SpanClass::Directive,
            FragmentKind::Byte | FragmentKind::Word => SpanClass::Value,
            FragmentKind::Quoted => SpanClass::Str,
            FragmentKind::Label => SpanClass::Label,
            FragmentKind::Text => SpanClass::Comment,
        }
    }
}

fn span(class: SpanClass, inner: &Markup) -> Markup {
    let class = class.to_string();
    Markup::element("span", &[("class", class.as_str())], inner)
}

// ----------------------------------------------------------------------------
// Linker

pub struct Linker<'a> {
    config: &'a Config,
    addresses: &'a AddressIndex,
    glossary: &'a GlossaryIndex,
}

/// Link with the default layout.
pub fn link(
    lines: &[FormattedLine],
    addresses: &AddressIndex,
    glossary: &GlossaryIndex,
) -> (Vec<LinkedLine>, Vec<Msg>) {
    let config = Config::default();
    Linker::new(&config, addresses, glossary).link(lines)
}

impl<'a> Linker<'a> {
    pub fn new(config: &'a Config, addresses: &'a AddressIndex, glossary: &'a GlossaryIndex) -> Self {
        Self {
            config,
            addresses,
            glossary,
        }
    }

    pub fn link(&self, rows: &[FormattedLine]) -> (Vec<LinkedLine>, Vec<Msg>) {
        let mut msgs = vec![];
        let linked = rows
            .iter()
            .map(|row| {
                let html = self.address_links(row);
                // no glossary links on label definitions
                let html = match row.kind {
                    LineKind::Blank | LineKind::Label => html,
                    _ => self.glossary_links(html, Loc::Address(row.address), &mut msgs),
                };
                LinkedLine {
                    id: row.anchor.then(|| self.anchor_id(row.address)),
                    address: row.address,
                    addr: row.addr.clone(),
                    kind: row.kind,
                    html,
                    hex: row.hex.clone(),
                    continuation: row.continuation,
                    oversized: row.oversized,
                    come_from: row.references.clone(),
                }
            })
            .collect();
        (linked, msgs)
    }

    /// The indexed anchor id, so links and targets agree.
    fn anchor_id(&self, address: u32) -> String {
        match self.addresses.get(address) {
            Some(anchor) => anchor.id.clone(),
            None => self.config.anchor_id(address),
        }
    }

    /// Pass 1: link address literals and labels in the raw row, then escape.
    pub fn address_links(&self, row: &FormattedLine) -> Markup {
        match row.kind {
            LineKind::Blank => Markup::new(),
            LineKind::Label => {
                let name = row
                    .fragments
                    .iter()
                    .map(|f| f.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                span(SpanClass::Label, &Markup::escape(&format!(".{}", name)))
            }
            LineKind::Banner => match &row.banner {
                Some(sub) => banner::render(sub),
                None => {
                    let title = row.fragments.iter().map(|f| f.text.as_str()).collect::<Vec<_>>().join(" ");
                    banner::render(&Subroutine {
                        addr: row.address,
                        title: Some(title),
                        ..Default::default()
                    })
                }
            },
            LineKind::Comment => {
                let text = row
                    .fragments
                    .iter()
                    .map(|f| f.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                span(SpanClass::Comment, &Markup::escape(&format!("; {}", text)))
            }
            LineKind::Instruction | LineKind::Data => {
                let mut html = Markup::new();
                let mut prev: Option<FragmentKind> = None;
                for frag in &row.fragments {
                    if let Some(prev) = prev {
                        html.push_raw(frag.kind.separator(prev));
                    }
                    html.push_markup(&self.fragment(frag));
                    prev = Some(frag.kind);
                }
                if let Some(comment) = &row.comment {
                    html.push_raw("  ");
                    html.push_markup(&span(
                        SpanClass::Comment,
                        &Markup::escape(&format!("; {}", comment)),
                    ));
                }
                html
            }
        }
    }

    fn fragment(&self, frag: &Fragment) -> Markup {
        let inner = if frag.kind.is_linkable() {
            self.link_tokens(&frag.text)
        } else {
            Markup::escape(&frag.text)
        };
        span(SpanClass::from(frag.kind), &inner)
    }

    /// Escape `raw`, turning every resolvable reference into an anchor.
    pub fn link_tokens(&self, raw: &str) -> Markup {
        let mut out = Markup::new();
        let mut last = 0;
        for (range, anchor) in self.find_references(raw) {
            out.push_raw(&raw[last..range.start]);
            let href = format!("#{}", anchor.id);
            out.push_markup(&Markup::element(
                "a",
                &[("href", href.as_str())],
                &Markup::escape(&raw[range.clone()]),
            ));
            last = range.end;
        }
        out.push_raw(&raw[last..]);
        out
    }

    /// Address literals (`&HHHH`, `$HHHH`, `0xHHHH`) and label names in raw
    /// operand text that resolve to an anchor. Immediates (`#&41`) are skipped.
    pub fn find_references(&self, raw: &str) -> Vec<(Range<usize>, &'a Anchor)> {
        let bytes = raw.as_bytes();
        let mut found = vec![];
        let mut i = 0;
        while i < bytes.len() {
            let word_start = i == 0 || !is_ident(bytes[i - 1]);
            if let Some((end, addr)) = address_literal(raw, i, word_start) {
                let immediate = i > 0 && bytes[i - 1] == b'#';
                if let Some(anchor) = self.resolve(addr).filter(|_| !immediate) {
                    found.push((i..end, anchor));
                }
                i = end;
            } else if word_start && is_ident(bytes[i]) {
                let end = i + bytes[i..].iter().take_while(|b| is_ident(**b)).count();
                let addresses: &'a AddressIndex = self.addresses;
                if !bytes[i].is_ascii_digit() {
                    if let Some(anchor) = addresses.label(&raw[i..end]) {
                        found.push((i..end, anchor));
                    }
                }
                i = end;
            } else {
                i += 1;
            }
        }
        found
    }

    fn resolve(&self, addr: u32) -> Option<&'a Anchor> {
        let addresses: &'a AddressIndex = self.addresses;
        match addresses.get(addr) {
            Some(anchor) => Some(anchor),
            None if self.config.nearest_anchor => addresses.nearest(addr),
            None => None,
        }
    }

    /// Pass 2: wrap glossary terms found in text outside tags.
    /// Longest term wins at each position; a term must sit on word boundaries.
    /// A term inside an existing anchor is left alone and reported as a note.
    pub fn glossary_links(&self, markup: Markup, at: Loc, msgs: &mut Vec<Msg>) -> Markup {
        if self.glossary.is_empty() {
            return markup;
        }

        let mut found: Vec<(usize, usize, &GlossaryEntry)> = vec![];
        let s = markup.as_str();
        for run in markup.text_nodes() {
            let mut i = run.start;
            while i < run.end {
                if boundary_before(s, i, run.start) {
                    let hit = self
                        .glossary
                        .prefixes(&s[i..run.end])
                        .find(|(len, _)| boundary_after(s, i + len, run.end));
                    if let Some((len, entry)) = hit {
                        found.push((i, i + len, entry));
                        i += len;
                        continue;
                    }
                }
                i += step(&s[i..run.end]);
            }
        }

        let mut out = markup;
        for (start, end, entry) in found.into_iter().rev() {
            let href = self.config.term_href(&entry.slug);
            let tip = entry.tooltip();
            let attrs = [
                ("href", href.as_str()),
                ("class", "glossary-ref"),
                ("data-tip", tip.as_str()),
            ];
            match out.wrap_span(start, end, "a", &attrs) {
                Ok(wrapped) => out = wrapped,
                Err(e) => msgs.push(Msg::note(
                    format!("Glossary term `{}` left unlinked: {}", entry.term, e),
                    at,
                )),
            }
        }
        out
    }
}

fn is_ident(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// `&HHHH`, `$HHHH` or (at a word start) `0xHHHH` beginning at `i`:
/// the end offset and the value.
fn address_literal(raw: &str, i: usize, word_start: bool) -> Option<(usize, u32)> {
    let rest = &raw.as_bytes()[i..];
    let prefix = match rest {
        [b'&' | b'$', ..] => 1,
        [b'0', b'x' | b'X', ..] if word_start => 2,
        _ => return None,
    };
    let digits = rest[prefix..]
        .iter()
        .take_while(|b| b.is_ascii_hexdigit())
        .count();
    let end = i + prefix + digits;
    if digits == 0 || raw.as_bytes().get(end).is_some_and(|b| is_ident(*b)) {
        return None;
    }
    let value = u32::from_str_radix(&raw[i + prefix..end], 16).ok()?;
    Some((end, value))
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn boundary_before(s: &str, i: usize, run_start: usize) -> bool {
    i == run_start || !s[run_start..i].chars().next_back().is_some_and(is_word_char)
}

fn boundary_after(s: &str, end: usize, run_end: usize) -> bool {
    end == run_end || !s[end..run_end].chars().next().is_some_and(is_word_char)
}

/// Bytes to advance past one character, or one whole character reference.
fn step(rest: &str) -> usize {
    if rest.starts_with('&') {
        if let Some(semi) = rest.find(';') {
            if rest[1..semi].bytes().all(|b| b.is_ascii_alphanumeric() || b == b'#') {
                return semi + 1;
            }
        }
    }
    rest.chars().next().map_or(1, |c| c.len_utf8())
}
