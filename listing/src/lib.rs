pub mod banner;
pub mod config;
pub mod error;
pub mod format;
pub mod glossary;
pub mod link;
pub mod markup;
pub mod msg;
pub mod prose;

pub use config::Config;
pub use error::{Error, RangeError};
pub use format::{format, FormattedLine, Formatter};
pub use glossary::{extract, parse, Glossary, GlossaryEntry, GlossaryIndex};
pub use link::{link, AddressIndex, Anchor, LinkedLine, Linker};
pub use markup::{escape, is_safe, Markup};
pub use msg::{Loc, Msg, MsgKind};
pub use prose::{apply_address_links, AddressLink};

use disasm::DisassemblyLine;

/// Format one listing, index its anchors and link it.
pub fn build_listing(
    lines: &[DisassemblyLine],
    config: &Config,
    glossary: &GlossaryIndex,
) -> Result<(Vec<LinkedLine>, Vec<Msg>), Error> {
    let (rows, mut msgs) = Formatter::new(config).format(lines)?;
    let addresses = AddressIndex::build(lines, config);
    let (linked, link_msgs) = Linker::new(config, &addresses, glossary).link(&rows);
    msgs.extend(link_msgs);
    Ok((linked, msgs))
}
