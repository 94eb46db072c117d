use disasm::DisassemblyLine;
use listing::msg::has_error;
use listing::{apply_address_links, AddressIndex, AddressLink, Config, MsgKind};
use std::collections::BTreeMap;

fn versions() -> BTreeMap<String, AddressIndex> {
    let config = Config::default();
    let lines = vec![
        DisassemblyLine::label(0xE000, "reset"),
        DisassemblyLine::instruction(0xE000, "SEI", &[]),
        DisassemblyLine::instruction(0xE010, "RTS", &[]),
    ];
    let mut versions = BTreeMap::new();
    versions.insert("v120".to_string(), AddressIndex::build(&lines, &config));
    versions
}

fn links(yaml: &str) -> Vec<AddressLink> {
    serde_yaml::from_str(yaml).unwrap()
}

#[test]
fn links_chosen_occurrence() {
    let text = "OSWRCH at &E000 calls OSWRCH again.";
    let links = links(
        r#"
- pattern: OSWRCH
  occurrence: -1
  version: v120
  address: "0xE000"
- pattern: "&E0[0-9A-F]{2}"
  version: v120
  address: "&E004"
"#,
    );
    let (out, msgs) = apply_address_links(text, &links, &versions(), &Config::default());
    assert!(msgs.is_empty());
    // &E004 has no anchor of its own and resolves to &E000
    assert_eq!(
        out,
        "OSWRCH at [&E000](v120.html#addr-E000) calls [OSWRCH](v120.html#addr-E000) again."
    );
}

#[test]
fn unknown_version_uses_address() {
    let links = links("- {pattern: reset, version: v100, address: \"57344\"}\n");
    let (out, msgs) = apply_address_links("see reset", &links, &versions(), &Config::default());
    assert!(msgs.is_empty());
    assert_eq!(out, "see [reset](v100.html#addr-E000)");
}

#[test]
fn misses_warn() {
    let text = "one OSBYTE call";
    let links = links(
        r#"
- {pattern: OSWORD, version: v120, address: "0xE000"}
- {pattern: OSBYTE, occurrence: 1, version: v120, address: "0xE000"}
- {pattern: OSBYTE, occurrence: -2, version: v120, address: "0xE000"}
"#,
    );
    let (out, msgs) = apply_address_links(text, &links, &versions(), &Config::default());
    assert_eq!(out, text);
    assert_eq!(msgs.len(), 3);
    assert!(msgs.iter().all(|m| m.kind == MsgKind::Warn));
    assert!(!has_error(&msgs));
}

#[test]
fn bad_entries_are_errors() {
    let links = links(
        r#"
- {pattern: "(unclosed", version: v120, address: "0xE000"}
- {pattern: reset, version: v120, address: "&XYZ"}
- {pattern: call, version: v120, address: "0xE010"}
"#,
    );
    let (out, msgs) = apply_address_links("reset call", &links, &versions(), &Config::default());
    assert_eq!(out, "reset [call](v120.html#addr-E010)");
    assert_eq!(msgs.len(), 2);
    assert!(msgs.iter().all(|m| m.kind == MsgKind::Error));
    assert!(has_error(&msgs));
}

#[test]
fn overlapping_links() {
    let links = links(
        r#"
- {pattern: "OS", version: v120, address: "0xE000"}
- {pattern: "OSWRCH", version: v120, address: "0xE010"}
"#,
    );
    let (out, msgs) = apply_address_links("OSWRCH", &links, &versions(), &Config::default());
    assert_eq!(out, "[OSWRCH](v120.html#addr-E010)");
    assert_eq!(msgs.len(), 1);
    assert_eq!(msgs[0].kind, MsgKind::Warn);
}
