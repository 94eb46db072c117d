//! Fit logical listing lines into physical rows under a fixed column budget.

use crate::config::Config;
use crate::error::Error;
use crate::msg::{Loc, Msg};
use disasm::{DisassemblyLine, Fragment, FragmentKind, LineKind, Subroutine};
use unicode_width::UnicodeWidthStr;

/// One physical row of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedLine {
    pub address: u32,
    pub kind: LineKind,
    /// Address column text; `None` on continuation rows and repeated addresses.
    pub addr: Option<String>,
    /// Width of the listing's address column.
    pub column: usize,
    /// First row shown for its address; carries the anchor id once linked.
    pub anchor: bool,
    pub continuation: bool,
    /// A single fragment or word wider than the budget.
    pub oversized: bool,
    pub fragments: Vec<Fragment>,
    /// Trailing inline comment kept on this row.
    pub comment: Option<String>,
    pub hex: Option<String>,
    /// Come-from addresses, ascending. Only on the first row of a logical line.
    pub references: Vec<u32>,
    pub banner: Option<Subroutine>,
}

impl FormattedLine {
    fn new(address: u32, kind: LineKind, column: usize, fragments: Vec<Fragment>) -> Self {
        Self {
            address,
            kind,
            addr: None,
            column,
            anchor: false,
            continuation: false,
            oversized: false,
            fragments,
            comment: None,
            hex: None,
            references: vec![],
            banner: None,
        }
    }

    /// Row content as plain text, without the address column.
    pub fn text(&self) -> String {
        match self.kind {
            LineKind::Blank => String::new(),
            LineKind::Comment => format!("; {}", join_text(&self.fragments)),
            LineKind::Label => format!(".{}", join_text(&self.fragments)),
            LineKind::Banner => join_text(&self.fragments),
            LineKind::Instruction | LineKind::Data => {
                let mut text = join_fragments(&self.fragments);
                if let Some(comment) = &self.comment {
                    text.push_str(&inline_comment(comment));
                }
                text
            }
        }
    }

    /// Rendered width in display columns, address column and gap included.
    pub fn width(&self) -> usize {
        self.column + 1 + columns(&self.text())
    }

    /// The row as fixed-width listing text.
    pub fn render(&self) -> String {
        let addr = match &self.addr {
            Some(addr) => addr.clone(),
            None => " ".repeat(self.column),
        };
        format!("{} {}", addr, self.text()).trim_end().to_string()
    }
}

/// Display columns taken by `text`.
pub fn columns(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

/// Fragments joined with the separator their kinds call for.
pub fn join_fragments(fragments: &[Fragment]) -> String {
    let mut text = String::new();
    let mut prev: Option<FragmentKind> = None;
    for frag in fragments {
        if let Some(prev) = prev {
            text.push_str(frag.kind.separator(prev));
        }
        text.push_str(&frag.text);
        prev = Some(frag.kind);
    }
    text
}

fn join_text(fragments: &[Fragment]) -> String {
    fragments
        .iter()
        .map(|f| f.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn inline_comment(comment: &str) -> String {
    format!("  ; {}", comment)
}

// ----------------------------------------------------------------------------
// Formatter

pub struct Formatter<'a> {
    config: &'a Config,
}

/// Format with the default layout and an explicit column budget.
pub fn format(
    lines: &[DisassemblyLine],
    max_width: usize,
) -> Result<(Vec<FormattedLine>, Vec<Msg>), Error> {
    let config = Config::default().with_max_width(max_width);
    Formatter::new(&config).format(lines)
}

impl<'a> Formatter<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Address column width: the configured digits, or more when an address needs them.
    fn column(&self, lines: &[DisassemblyLine]) -> usize {
        let digits = lines
            .iter()
            .map(|l| format!("{:X}", l.address).len())
            .max()
            .unwrap_or(0);
        self.config.address_width.max(digits)
    }

    /// Columns left for row content once the address column and gap are placed.
    fn budget(&self, column: usize) -> usize {
        self.config.max_width.saturating_sub(column + 1)
    }

    pub fn format(
        &self,
        lines: &[DisassemblyLine],
    ) -> Result<(Vec<FormattedLine>, Vec<Msg>), Error> {
        let column = self.column(lines);
        let mut rows = vec![];
        let mut msgs = vec![];
        let mut shown: Option<u32> = None;

        for (index, line) in lines.iter().enumerate() {
            if index > 0 {
                let prev = lines[index - 1].address;
                if line.address < prev {
                    return Err(Error::NonMonotonicAddress {
                        index,
                        prev,
                        addr: line.address,
                    });
                }
            }

            let start = rows.len();
            match line.kind {
                LineKind::Blank => rows.push(FormattedLine::new(line.address, LineKind::Blank, column, vec![])),
                LineKind::Label | LineKind::Banner => {
                    let mut row = FormattedLine::new(line.address, line.kind, column, line.content.clone());
                    row.banner = line.banner.clone();
                    let w = columns(&row.text());
                    if w > self.budget(column) {
                        row.oversized = true;
                        msgs.push(Msg::warn(
                            format!("{} `{}` is {} columns wide; the row budget is {}", line.kind, row.text(), w, self.budget(column)),
                            Loc::Address(line.address),
                        ));
                    }
                    rows.push(row);
                }
                LineKind::Comment => {
                    let text = line.comment_text();
                    self.comment_rows(line.address, column, &text, &mut rows, &mut msgs);
                }
                LineKind::Instruction | LineKind::Data => self.pack(line, column, &mut rows, &mut msgs),
            }

            // The first row of a logical line owns its address, hex and come-from data.
            if let Some(first) = rows.get_mut(start) {
                if line.kind.is_addressed() && shown != Some(line.address) {
                    // a banner carries the anchor but no address text
                    if line.kind != LineKind::Banner {
                        first.addr = Some(format!("{:0width$X}", line.address, width = column));
                    }
                    first.anchor = true;
                    shown = Some(line.address);
                }
                if !line.bytes.is_empty() {
                    first.hex = Some(format_bytes(&line.bytes));
                }
                first.references = line.references.iter().copied().collect();
            }
            for row in rows.iter_mut().skip(start + 1) {
                row.continuation = true;
            }
        }

        Ok((rows, msgs))
    }

    /// Greedy packing of fragments; a fragment is never split across rows.
    fn pack(&self, line: &DisassemblyLine, column: usize, rows: &mut Vec<FormattedLine>, msgs: &mut Vec<Msg>) {
        let budget = self.budget(column);
        let mut packed: Vec<Vec<Fragment>> = vec![];
        let mut row: Vec<Fragment> = vec![];
        let mut width = 0;

        for frag in &line.content {
            let w = frag.width();
            let add = match row.last() {
                Some(prev) => frag.kind.separator(prev.kind).len() + w,
                None => w,
            };
            if !row.is_empty() && width + add > budget {
                packed.push(std::mem::take(&mut row));
                width = 0;
            }
            width = if row.is_empty() { w } else { width + add };
            row.push(frag.clone());
            if w > budget {
                msgs.push(Msg::warn(
                    format!(
                        "Fragment `{}` is {} columns wide; the row budget is {}",
                        frag.text, w, budget
                    ),
                    Loc::Address(line.address),
                ));
            }
        }
        if !row.is_empty() || packed.is_empty() {
            packed.push(row);
        }

        let last_width = packed.last().map(|r| columns(&join_fragments(r))).unwrap_or(0);
        for fragments in packed {
            let mut out = FormattedLine::new(line.address, line.kind, column, fragments);
            out.oversized = columns(&join_fragments(&out.fragments)) > budget;
            rows.push(out);
        }

        if let Some(comment) = &line.comment {
            let fits = last_width + columns(&inline_comment(comment)) <= budget;
            match rows.last_mut() {
                Some(last) if fits => last.comment = Some(comment.clone()),
                _ => self.comment_rows(line.address, column, comment, rows, msgs),
            }
        }
    }

    /// Word-wrapped comment rows; blank source lines become blank rows.
    fn comment_rows(&self, address: u32, column: usize, text: &str, rows: &mut Vec<FormattedLine>, msgs: &mut Vec<Msg>) {
        // "; " prefix
        let budget = self.budget(column).saturating_sub(2);
        for source in text.split('\n') {
            if source.trim().is_empty() {
                rows.push(FormattedLine::new(address, LineKind::Blank, column, vec![]));
                continue;
            }
            for (wrapped, oversized) in wrap(source, budget) {
                if oversized {
                    msgs.push(Msg::warn(
                        format!("Comment word in `{}` exceeds the {}-column budget", wrapped.trim(), budget),
                        Loc::Address(address),
                    ));
                }
                let mut row = FormattedLine::new(
                    address,
                    LineKind::Comment,
                    column,
                    vec![Fragment::new(FragmentKind::Text, wrapped)],
                );
                row.oversized = oversized;
                rows.push(row);
            }
        }
    }
}

/// Break `text` at whitespace into rows of at most `budget` display columns.
/// The leading indentation is repeated on every row.
pub fn wrap(text: &str, budget: usize) -> Vec<(String, bool)> {
    let trimmed = text.trim_start();
    let mut indent = text[..text.len() - trimmed.len()].to_string();
    if columns(&indent) * 2 > budget {
        indent.clear();
    }
    let indent_width = columns(&indent);

    let mut rows = vec![];
    let mut current = indent.clone();
    let mut width = indent_width;
    for word in trimmed.split_whitespace() {
        let w = columns(word);
        if width == indent_width {
            current.push_str(word);
            width += w;
        } else if width + 1 + w <= budget {
            current.push(' ');
            current.push_str(word);
            width += 1 + w;
        } else {
            rows.push((std::mem::replace(&mut current, indent.clone()), width > budget));
            current.push_str(word);
            width = indent_width + w;
        }
    }
    if width > indent_width {
        rows.push((current, width > budget));
    }
    rows
}

/// Format bytes as hex string for listing.
pub fn format_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
