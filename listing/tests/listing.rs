use disasm::{lower, Item, LineKind};
use listing::{build_listing, glossary, Config, Error, GlossaryIndex, Markup};

const ITEMS: &str = r#"
- addr: 0x8000
  type: code
  mnemonic: sei
  labels: [reset]
  comments_before:
    - "********"
    - "Power-on entry"
    - "&8000 referenced 1 time by &8008"
  bytes: [0x78]
- addr: 0x8001
  type: code
  mnemonic: lda
  operand: "&0202"
  comment_inline: BRKV low byte
  bytes: [0xAD, 0x02, 0x02]
- addr: 0x8004
  type: word
  values: [0x8000, 0x8001]
- addr: 0x8008
  type: code
  mnemonic: jmp
  operand: reset
  target: 0x8000
"#;

fn html(markup: &Markup) -> &str {
    markup.as_str()
}

#[test]
fn items_to_listing() {
    let items: Vec<Item> = serde_yaml::from_str(ITEMS).unwrap();
    let lines = lower(&items, &[]);
    let (entries, _) = glossary::extract("**BRKV** (Break Vector)\n: MOS vector at &0202.\n");
    let glossary = GlossaryIndex::new(entries);

    let (linked, msgs) = build_listing(&lines, &Config::default(), &glossary).unwrap();
    assert!(msgs.is_empty());

    let kinds: Vec<LineKind> = linked.iter().map(|l| l.kind).collect();
    assert_eq!(
        kinds,
        vec![
            LineKind::Blank,
            LineKind::Comment,
            LineKind::Label,
            LineKind::Instruction,
            LineKind::Instruction,
            LineKind::Data,
            LineKind::Instruction,
        ]
    );

    assert_eq!(html(&linked[1].html), "<span class=\"comment\">; Power-on entry</span>");
    assert_eq!(linked[1].addr, None);

    assert_eq!(linked[2].addr.as_deref(), Some("8000"));
    assert_eq!(linked[2].id.as_deref(), Some("addr-8000"));
    assert_eq!(linked[2].come_from, vec![0x8008]);

    assert_eq!(linked[3].addr, None);
    assert_eq!(linked[3].hex.as_deref(), Some("78"));

    assert_eq!(linked[4].id.as_deref(), Some("addr-8001"));
    assert_eq!(linked[4].hex.as_deref(), Some("AD 02 02"));
    assert_eq!(
        html(&linked[4].html),
        "<span class=\"opcode\">LDA</span> <span class=\"operand\">&amp;0202</span>  \
         <span class=\"comment\">; <a href=\"glossary.html#term-brkv\" class=\"glossary-ref\" \
         data-tip=\"Break Vector: MOS vector at &amp;0202.\">BRKV</a> low byte</span>"
    );
    assert_eq!(
        html(&linked[5].html),
        "<span class=\"directive\">EQUW</span> \
         <span class=\"value\"><a href=\"#addr-8000\">&amp;8000</a></span>, \
         <span class=\"value\"><a href=\"#addr-8001\">&amp;8001</a></span>"
    );
    assert_eq!(
        html(&linked[6].html),
        "<span class=\"opcode\">JMP</span> <span class=\"operand\"><a href=\"#addr-8000\">reset</a></span>"
    );
}

#[test]
fn narrow_config() {
    let items: Vec<Item> = serde_yaml::from_str(ITEMS).unwrap();
    let lines = lower(&items, &[]);
    let config = Config::from_yaml("max_width: 16\n").unwrap();

    let (linked, msgs) = build_listing(&lines, &config, &GlossaryIndex::default()).unwrap();
    assert!(msgs.is_empty());
    // EQUW &8000, &8001 no longer fits in 11 columns
    let words: Vec<_> = linked.iter().filter(|l| l.address == 0x8004).collect();
    assert_eq!(words.len(), 2);
    assert!(!words[0].continuation);
    assert!(words[1].continuation);
    assert_eq!(words[1].addr, None);
}

#[test]
fn missing_config() {
    let path = std::env::temp_dir().join("listing-no-such-config.yaml");
    assert!(matches!(Config::load(&path), Err(Error::Io(_))));
}
