//! Subroutine header blocks: heading, description and register tables.

use crate::markup::Markup;
use disasm::Subroutine;
use indexmap::IndexMap;

fn div(class: &str, inner: &Markup) -> Markup {
    Markup::element("div", &[("class", class)], inner)
}

pub fn render(sub: &Subroutine) -> Markup {
    let mut parts = vec![Markup::element("h3", &[], &Markup::escape(sub.heading()))];

    if let Some(desc) = sub.description.as_deref().filter(|d| !d.trim().is_empty()) {
        parts.push(div("sub-desc", &plaintext(desc)));
    }

    let mut tables = vec![];
    if !sub.on_entry.is_empty() {
        tables.push(register_table("On Entry", &sub.on_entry));
    }
    if !sub.on_exit.is_empty() {
        tables.push(register_table("On Exit", &sub.on_exit));
    }
    if !tables.is_empty() {
        parts.push(div("sub-registers", &Markup::join(&tables, "\n")));
    }

    div("sub-header", &Markup::join(&parts, "\n"))
}

/// Blank-line separated blocks. A block indented two spaces on every line is
/// kept verbatim; any other block is reflowed into one paragraph.
pub fn plaintext(text: &str) -> Markup {
    let mut blocks: Vec<Vec<&str>> = vec![];
    let mut current = vec![];
    for line in text.split('\n') {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    let parts: Vec<Markup> = blocks
        .iter()
        .map(|block| {
            if block.iter().all(|l| l.starts_with("  ")) {
                Markup::element("pre", &[("class", "sub-detail")], &Markup::escape(&block.join("\n")))
            } else {
                let prose: Vec<&str> = block.iter().map(|l| l.trim()).collect();
                Markup::element("p", &[], &Markup::escape(&prose.join(" ")))
            }
        })
        .collect();
    Markup::join(&parts, "\n")
}

/// Registers in document order, names upper-cased.
pub fn register_table(heading: &str, regs: &IndexMap<String, String>) -> Markup {
    let rows: Vec<Markup> = regs
        .iter()
        .map(|(reg, desc)| {
            let mut row = Markup::element("dt", &[], &Markup::escape(&reg.to_uppercase()));
            row.push_markup(&Markup::element("dd", &[], &Markup::escape(desc)));
            row
        })
        .collect();
    let list = Markup::element("dl", &[], &Markup::join(&rows, "\n"));
    Markup::join(&[Markup::element("h4", &[], &Markup::escape(heading)), list], "\n")
}
