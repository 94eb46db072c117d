//! Glossary documents: bold term headers followed by definition-list blocks.
//!
//! ```text
//! ## Vectors
//!
//! **BRKV** (Break Vector)
//! : MOS vector at &0202 called on BRK.
//!
//!   Extended detail, shown on the glossary page only.
//! ```
//!
//! The `: ` paragraph is the brief definition used for tooltips; indented
//! paragraphs after a blank line form the extended definition.

use crate::markup::escape;
use crate::msg::{Loc, Msg};
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GlossaryEntry {
    pub term: String,
    pub slug: String,
    pub expansion: Option<String>,
    pub brief: String,
    pub extended: String,
}

impl GlossaryEntry {
    /// Tooltip payload: `Expansion: brief`, or just the brief.
    pub fn tooltip(&self) -> String {
        match &self.expansion {
            Some(expansion) => format!("{}: {}", expansion, self.brief),
            None => self.brief.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub name: String,
    pub slug: String,
    pub terms: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Glossary {
    pub preamble: String,
    pub entries: IndexMap<String, GlossaryEntry>,
    pub categories: Vec<Category>,
}

impl Glossary {
    pub fn index(&self) -> GlossaryIndex {
        GlossaryIndex::new(self.entries.values().cloned())
    }

    pub fn category_entries<'a>(
        &'a self,
        category: &'a Category,
    ) -> impl Iterator<Item = &'a GlossaryEntry> + 'a {
        category.terms.iter().filter_map(|t| self.entries.get(t))
    }
}

pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .replace(' ', "-")
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect()
}

/// Entries in order of first appearance; a repeated term keeps its first
/// position and takes its last definition.
pub fn extract(document: &str) -> (Vec<GlossaryEntry>, Vec<Msg>) {
    let (glossary, msgs) = parse(document);
    (glossary.entries.into_values().collect(), msgs)
}

pub fn parse(document: &str) -> (Glossary, Vec<Msg>) {
    let mut parser = Parser::default();
    for (idx, line) in document.lines().enumerate() {
        parser.feed(idx + 1, line);
    }
    parser.end()
}

/// `**TERM**` or `**TERM** (Expansion)`.
fn parse_term_header(line: &str) -> Option<(String, Option<String>)> {
    let rest = line.strip_prefix("**")?;
    let close = rest.find("**")?;
    let term = &rest[..close];
    if term.trim().is_empty() {
        return None;
    }
    let tail = rest[close + 2..].trim();
    if tail.is_empty() {
        return Some((term.to_string(), None));
    }
    let expansion = tail.strip_prefix('(')?.strip_suffix(')')?;
    if expansion.trim().is_empty() {
        return None;
    }
    Some((term.to_string(), Some(expansion.to_string())))
}

fn is_heading(line: &str) -> bool {
    line.starts_with("# ") || line.starts_with("## ")
}

// ----------------------------------------------------------------------------
// Parser

#[derive(Debug)]
struct Pending {
    term: String,
    expansion: Option<String>,
    line: usize,
    brief: Vec<String>,
    extended: Vec<String>,
}

#[derive(Debug, Default)]
enum State {
    /// Between entries.
    #[default]
    Outside,
    /// Saw a term header; the next line must open the definition.
    Header(Pending),
    Brief(Pending),
    Extended(Pending),
}

#[derive(Debug, Default)]
struct Parser {
    state: State,
    /// Past the preamble: a category or a term has been seen.
    in_body: bool,
    preamble: Vec<String>,
    glossary: Glossary,
    defined_at: IndexMap<String, usize>,
    msgs: Vec<Msg>,
}

impl Parser {
    fn feed(&mut self, no: usize, line: &str) {
        match std::mem::take(&mut self.state) {
            State::Outside => self.outside(no, line),
            State::Header(mut entry) => match line.strip_prefix(": ") {
                Some(text) => {
                    entry.brief.push(text.trim().to_string());
                    self.state = State::Brief(entry);
                }
                None => {
                    self.malformed(&entry);
                    self.outside(no, line);
                }
            },
            State::Brief(mut entry) => {
                if is_heading(line) || parse_term_header(line).is_some() {
                    self.finish(entry);
                    self.outside(no, line);
                } else if line.trim().is_empty() {
                    self.state = State::Extended(entry);
                } else {
                    let text = line.strip_prefix(": ").unwrap_or(line);
                    entry.brief.push(text.trim().to_string());
                    self.state = State::Brief(entry);
                }
            }
            State::Extended(mut entry) => {
                if line.trim().is_empty() {
                    entry.extended.push(String::new());
                    self.state = State::Extended(entry);
                } else if line.starts_with(' ') || line.starts_with('\t') {
                    entry.extended.push(line.to_string());
                    self.state = State::Extended(entry);
                } else {
                    self.finish(entry);
                    self.outside(no, line);
                }
            }
        }
    }

    fn outside(&mut self, no: usize, line: &str) {
        if let Some(name) = line.strip_prefix("## ") {
            let name = name.trim().to_string();
            self.glossary.categories.push(Category {
                slug: slugify(&name),
                name,
                terms: vec![],
            });
            self.in_body = true;
        } else if line.starts_with("# ") {
            // document title
        } else if let Some((term, expansion)) = parse_term_header(line) {
            self.in_body = true;
            self.state = State::Header(Pending {
                term,
                expansion,
                line: no,
                brief: vec![],
                extended: vec![],
            });
        } else if !self.in_body {
            self.preamble.push(line.to_string());
        }
    }

    fn malformed(&mut self, entry: &Pending) {
        self.msgs.push(Msg::warn(
            format!(
                "Malformed glossary entry `{}`: no `: ` definition follows the term",
                entry.term
            ),
            Loc::Line(entry.line),
        ));
    }

    fn finish(&mut self, entry: Pending) {
        let term = entry.term;
        if let Some(prev) = self.defined_at.insert(term.clone(), entry.line) {
            self.msgs.push(Msg::warn(
                format!("Re-defined glossary term: `{}`", term),
                Loc::Line(entry.line),
            ));
            self.msgs.push(Msg::note(
                String::from("Already defined here. The definition has been overridden."),
                Loc::Line(prev),
            ));
            for category in &mut self.glossary.categories {
                category.terms.retain(|t| t != &term);
            }
        }
        if let Some(category) = self.glossary.categories.last_mut() {
            category.terms.push(term.clone());
        }

        let parsed = GlossaryEntry {
            slug: slugify(&term),
            term: term.clone(),
            expansion: entry.expansion,
            brief: entry.brief.join(" "),
            extended: paragraphs(&entry.extended),
        };
        self.glossary.entries.insert(term, parsed);
    }

    fn end(mut self) -> (Glossary, Vec<Msg>) {
        match std::mem::take(&mut self.state) {
            State::Outside => {}
            State::Header(entry) => self.malformed(&entry),
            State::Brief(entry) | State::Extended(entry) => self.finish(entry),
        }
        self.glossary.preamble = self.preamble.join("\n").trim().to_string();
        (self.glossary, self.msgs)
    }
}

/// Dedent by the common indentation and keep one blank line between paragraphs.
fn paragraphs(lines: &[String]) -> String {
    let indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.chars().take_while(|c| c.is_whitespace()).count())
        .min()
        .unwrap_or(0);

    let mut out: Vec<String> = vec![];
    for line in lines {
        if line.trim().is_empty() {
            if out.last().is_some_and(|l| !l.is_empty()) {
                out.push(String::new());
            }
        } else {
            out.push(line.chars().skip(indent).collect::<String>().trim_end().to_string());
        }
    }
    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    out.join("\n")
}

// ----------------------------------------------------------------------------
// Index

/// Read-only term lookup for tooltip linking, shared across listings.
#[derive(Debug, Clone, Default)]
pub struct GlossaryIndex {
    entries: IndexMap<String, GlossaryEntry>,
    /// (escaped term, term), longest escaped form first.
    patterns: Vec<(String, String)>,
}

impl GlossaryIndex {
    pub fn new(entries: impl IntoIterator<Item = GlossaryEntry>) -> Self {
        let entries: IndexMap<String, GlossaryEntry> =
            entries.into_iter().map(|e| (e.term.clone(), e)).collect();
        let mut patterns: Vec<(String, String)> = entries
            .keys()
            .map(|term| (escape(term), term.clone()))
            .filter(|(pattern, _)| !pattern.is_empty())
            .collect();
        patterns.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Self { entries, patterns }
    }

    pub fn get(&self, term: &str) -> Option<&GlossaryEntry> {
        self.entries.get(term)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Terms whose escaped form starts `markup`, longest first, with the
    /// matched byte length.
    pub fn prefixes<'a, 'm>(
        &'a self,
        markup: &'m str,
    ) -> impl Iterator<Item = (usize, &'a GlossaryEntry)> + 'm
    where
        'a: 'm,
    {
        self.patterns
            .iter()
            .filter(move |(pattern, _)| markup.starts_with(pattern.as_str()))
            .filter_map(move |(pattern, term)| self.entries.get(term).map(|e| (pattern.len(), e)))
    }
}
