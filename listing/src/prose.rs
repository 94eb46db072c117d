//! Address links inserted into prose documents that accompany a listing.

use crate::config::Config;
use crate::link::AddressIndex;
use crate::msg::{Loc, Msg};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Link one match of `pattern` to `address` in the listing named `version`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressLink {
    pub pattern: String,
    /// Which match to link; negative values count from the end.
    #[serde(default)]
    pub occurrence: i64,
    pub version: String,
    /// `0x`, `&` or `$` prefixed hex, or decimal.
    pub address: String,
}

pub fn parse_address(text: &str) -> Option<u32> {
    let text = text.trim();
    let hex = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .or_else(|| text.strip_prefix('&'))
        .or_else(|| text.strip_prefix('$'));
    match hex {
        Some(digits) => u32::from_str_radix(digits, 16).ok(),
        None => text.parse().ok(),
    }
}

/// Anchor id for `address` in a listing: the exact anchor, else the nearest
/// preceding one. Without an index for the listing the address is used as is.
fn anchor_id(address: u32, index: Option<&AddressIndex>, config: &Config) -> String {
    index
        .and_then(|index| index.get(address).or_else(|| index.nearest(address)))
        .map(|anchor| anchor.id.clone())
        .unwrap_or_else(|| config.anchor_id(address))
}

/// Rewrite each chosen match as a Markdown link `[match](version.html#id)`.
/// Links are applied end to start; one that overlaps a later link is dropped.
pub fn apply_address_links(
    text: &str,
    links: &[AddressLink],
    versions: &BTreeMap<String, AddressIndex>,
    config: &Config,
) -> (String, Vec<Msg>) {
    let mut msgs = vec![];
    let mut replacements: Vec<(usize, usize, String)> = vec![];

    for link in links {
        let re = match Regex::new(&link.pattern) {
            Ok(re) => re,
            Err(e) => {
                msgs.push(Msg::error(format!("Invalid pattern `{}`: {}", link.pattern, e), Loc::None));
                continue;
            }
        };
        let Some(address) = parse_address(&link.address) else {
            msgs.push(Msg::error(
                format!("Invalid address `{}` for pattern `{}`", link.address, link.pattern),
                Loc::None,
            ));
            continue;
        };

        let matches: Vec<_> = re.find_iter(text).collect();
        if matches.is_empty() {
            msgs.push(Msg::warn(format!("Pattern `{}` not found", link.pattern), Loc::None));
            continue;
        }
        let index = if link.occurrence < 0 {
            matches.len() as i64 + link.occurrence
        } else {
            link.occurrence
        };
        let Some(m) = usize::try_from(index).ok().and_then(|i| matches.get(i)) else {
            msgs.push(Msg::warn(
                format!("Occurrence {} out of range for pattern `{}`", link.occurrence, link.pattern),
                Loc::None,
            ));
            continue;
        };

        let id = anchor_id(address, versions.get(&link.version), config);
        let url = format!("{}.html#{}", link.version, id);
        replacements.push((m.start(), m.end(), format!("[{}]({})", m.as_str(), url)));
    }

    // end to start; at a shared start the longer match goes first
    replacements.sort_by(|a, b| (b.0, b.1).cmp(&(a.0, a.1)));
    let mut out = text.to_string();
    let mut limit = text.len();
    for (start, end, replacement) in replacements {
        if end > limit {
            msgs.push(Msg::warn(
                format!("Link for `{}` overlaps another link", &text[start..end]),
                Loc::None,
            ));
            continue;
        }
        out.replace_range(start..end, &replacement);
        limit = start;
    }
    (out, msgs)
}
