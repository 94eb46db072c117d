//! Escaped inline markup and span insertion that respects existing tags.

use crate::error::RangeError;
use std::fmt;
use std::ops::Range;

/// Neutralise markup-significant characters. Applying it twice escapes twice.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Whether a value has already been escaped.
pub trait Safety {
    fn is_safe(&self) -> bool;
}

impl Safety for str {
    fn is_safe(&self) -> bool {
        false
    }
}

impl Safety for String {
    fn is_safe(&self) -> bool {
        false
    }
}

pub fn is_safe<T: Safety + ?Sized>(x: &T) -> bool {
    x.is_safe()
}

/// Escaped text, possibly carrying tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Markup(String);

impl Safety for Markup {
    fn is_safe(&self) -> bool {
        true
    }
}

impl fmt::Display for Markup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Markup {
    pub fn new() -> Self {
        Markup(String::new())
    }

    pub fn escape(raw: &str) -> Self {
        Markup(escape(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push_raw(&mut self, raw: &str) {
        self.0.push_str(&escape(raw));
    }

    pub fn push_markup(&mut self, markup: &Markup) {
        self.0.push_str(&markup.0);
    }

    /// `<tag attrs>inner</tag>` around already-safe content.
    pub fn element(tag: &str, attrs: &[(&str, &str)], inner: &Markup) -> Self {
        let mut out = Markup(open_tag(tag, attrs));
        out.push_markup(inner);
        out.0.push_str(&format!("</{}>", tag));
        out
    }

    /// Insert `<tag attrs>..</tag>` around the half-open byte range `start..end`.
    /// The range must sit in a single text run outside any anchor.
    pub fn wrap_span(
        &self,
        start: usize,
        end: usize,
        tag: &str,
        attrs: &[(&str, &str)],
    ) -> Result<Markup, RangeError> {
        let s = &self.0;
        if start > end || end > s.len() || !s.is_char_boundary(start) || !s.is_char_boundary(end)
        {
            return Err(RangeError::OutOfBounds(start, end));
        }
        if start == end {
            return Err(RangeError::Empty(start, end));
        }

        let mut scan = Scanner::default();
        for (i, b) in s.bytes().enumerate() {
            if i == start {
                scan.check_boundary(start, end)?;
                if scan.anchor_depth > 0 {
                    return Err(RangeError::InsideAnchor(start, end));
                }
            }
            if (start..end).contains(&i) && (b == b'<' || b == b'>') {
                return Err(RangeError::CrossesTag(start, end));
            }
            if i == end {
                scan.check_boundary(start, end)?;
                break;
            }
            scan.step(s, i, b);
        }
        if end == s.len() {
            scan.check_boundary(start, end)?;
        }

        let mut out = String::with_capacity(s.len() + 32);
        out.push_str(&s[..start]);
        out.push_str(&open_tag(tag, attrs));
        out.push_str(&s[start..end]);
        out.push_str(&format!("</{}>", tag));
        out.push_str(&s[end..]);
        Ok(Markup(out))
    }

    /// Byte ranges of text that lies outside every tag and every anchor.
    pub fn text_runs(&self) -> Vec<Range<usize>> {
        self.runs(true)
    }

    /// Byte ranges of text outside tags, anchor content included.
    pub fn text_nodes(&self) -> Vec<Range<usize>> {
        self.runs(false)
    }

    fn runs(&self, skip_anchors: bool) -> Vec<Range<usize>> {
        let s = &self.0;
        let mut runs = vec![];
        let mut scan = Scanner::default();
        let mut run_start: Option<usize> = None;
        for (i, b) in s.bytes().enumerate() {
            let hidden = skip_anchors && scan.anchor_depth > 0;
            let open = !scan.in_tag && !hidden && b != b'<';
            match (run_start, open) {
                (None, true) => run_start = Some(i),
                (Some(from), false) => {
                    runs.push(from..i);
                    run_start = None;
                }
                _ => {}
            }
            scan.step(s, i, b);
        }
        if let Some(from) = run_start {
            runs.push(from..s.len());
        }
        runs
    }

    /// Concatenate `parts` with raw separator text between them.
    pub fn join(parts: &[Markup], sep: &str) -> Markup {
        let mut out = Markup::new();
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                out.push_raw(sep);
            }
            out.push_markup(part);
        }
        out
    }
}

fn open_tag(tag: &str, attrs: &[(&str, &str)]) -> String {
    let mut out = format!("<{}", tag);
    for (name, value) in attrs {
        out.push_str(&format!(" {}=\"{}\"", name, escape(value)));
    }
    out.push('>');
    out
}

/// Tag, anchor and character-reference state while walking markup bytes.
#[derive(Debug, Default)]
struct Scanner {
    in_tag: bool,
    tag_start: usize,
    anchor_depth: usize,
    in_entity: bool,
}

impl Scanner {
    fn check_boundary(&self, start: usize, end: usize) -> Result<(), RangeError> {
        if self.in_tag {
            return Err(RangeError::CrossesTag(start, end));
        }
        if self.in_entity {
            return Err(RangeError::SplitsEntity(start, end));
        }
        Ok(())
    }

    fn step(&mut self, s: &str, i: usize, b: u8) {
        if self.in_tag {
            if b == b'>' {
                self.in_tag = false;
                self.close_tag(&s[self.tag_start + 1..i]);
            }
            return;
        }
        if self.in_entity {
            if b == b';' {
                self.in_entity = false;
                return;
            }
            if b.is_ascii_alphanumeric() || b == b'#' {
                return;
            }
            // stray '&'
            self.in_entity = false;
        }
        match b {
            b'<' => {
                self.in_tag = true;
                self.tag_start = i;
            }
            b'&' => self.in_entity = true,
            _ => {}
        }
    }

    fn close_tag(&mut self, content: &str) {
        let content = content.trim_start();
        let (closing, rest) = match content.strip_prefix('/') {
            Some(rest) => (true, rest),
            None => (false, content),
        };
        let name = rest
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or("");
        if !name.eq_ignore_ascii_case("a") {
            return;
        }
        if closing {
            self.anchor_depth = self.anchor_depth.saturating_sub(1);
        } else {
            self.anchor_depth += 1;
        }
    }
}

/// Text whose escaping state travels with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Text {
    Raw(String),
    Safe(Markup),
}

impl Safety for Text {
    fn is_safe(&self) -> bool {
        matches!(self, Text::Safe(_))
    }
}

impl Text {
    /// Escape raw text; safe text passes through untouched.
    pub fn into_markup(self) -> Markup {
        match self {
            Text::Raw(raw) => Markup::escape(&raw),
            Text::Safe(markup) => markup,
        }
    }
}

impl From<&str> for Text {
    fn from(raw: &str) -> Self {
        Text::Raw(raw.to_string())
    }
}

impl From<Markup> for Text {
    fn from(markup: Markup) -> Self {
        Text::Safe(markup)
    }
}
