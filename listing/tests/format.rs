use disasm::{DisassemblyLine, FragmentKind, LineKind, Subroutine};
use listing::format::{format, FormattedLine};
use listing::{Error, MsgKind};

fn case(lines: &[DisassemblyLine], max_width: usize) -> Vec<FormattedLine> {
    let (rows, msgs) = format(lines, max_width).unwrap();
    println!("{}|", "-".repeat(max_width));
    for row in &rows {
        println!("{}", row.render());
    }
    listing::msg::dump(&msgs);
    rows
}

fn values(n: usize) -> Vec<String> {
    (0..n).map(|v| format!("&{:02X}", v)).collect()
}

fn bytes_line(address: u32, n: usize) -> DisassemblyLine {
    let values = values(n);
    let refs: Vec<&str> = values.iter().map(|v| v.as_str()).collect();
    DisassemblyLine::data(address, "EQUB", FragmentKind::Byte, &refs)
}

fn check_width(max_width: usize, n: usize) {
    let line = bytes_line(0x2000, n);
    let rows = case(&[line.clone()], max_width);

    for row in &rows {
        assert!(!row.oversized);
        assert!(row.width() <= max_width, "`{}` exceeds {}", row.render(), max_width);
    }
    // fragments are never split and keep their order
    let packed: Vec<_> = rows.iter().flat_map(|r| r.fragments.clone()).collect();
    assert_eq!(packed, line.content);

    assert_eq!(rows[0].addr.as_deref(), Some("2000"));
    assert!(!rows[0].continuation);
    for row in rows.iter().skip(1) {
        assert!(row.continuation);
        assert_eq!(row.addr, None);
    }
}

macro_rules! width {
    ($name:ident, $max_width:expr, $n:expr) => {
        #[test]
        fn $name() {
            check_width($max_width, $n);
        }
    };
}

width!(width_wide, 80, 8);
width!(width_narrow, 30, 20);
width!(width_tight, 14, 12);
width!(width_exact, 19, 3);

#[test]
fn packs_greedily() {
    // "EQUB &00, &01" is 13 columns; the budget is 19 - 5 = 14.
    let rows = case(&[bytes_line(0x10, 4)], 19);
    let texts: Vec<String> = rows.iter().map(|r| r.text()).collect();
    assert_eq!(texts, vec!["EQUB &00, &01", "&02, &03"]);
    assert_eq!(rows[0].render(), "0010 EQUB &00, &01");
    assert_eq!(rows[1].render(), "     &02, &03");
}

#[test]
fn unsplittable_fragment() {
    let line = DisassemblyLine::data(0x3000, "EQUS", FragmentKind::Quoted, &["\"a long string\""]);
    let (rows, msgs) = format(&[line], 12).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].text(), "EQUS");
    assert!(!rows[0].oversized);
    assert_eq!(rows[1].text(), "\"a long string\"");
    assert!(rows[1].oversized);
    assert!(rows[1].continuation);
    assert_eq!(msgs.len(), 1);
    assert_eq!(msgs[0].kind, MsgKind::Warn);
}

#[test]
fn order_preserved() {
    let lines = vec![
        DisassemblyLine::blank(0x1000),
        DisassemblyLine::comment(0x1000, "Wait for the vertical sync before touching the palette"),
        DisassemblyLine::label(0x1000, "wait"),
        DisassemblyLine::instruction(0x1000, "LDA", &["&FE4D"]),
        bytes_line(0x1003, 16),
        DisassemblyLine::instruction(0x1013, "RTS", &[]),
    ];
    let rows = case(&lines, 24);

    let addrs: Vec<u32> = rows.iter().map(|r| r.address).collect();
    assert!(addrs.windows(2).all(|w| w[0] <= w[1]));
    let mut seen = addrs.clone();
    seen.dedup();
    assert_eq!(seen, vec![0x1000, 0x1003, 0x1013]);

    let kinds: Vec<LineKind> = rows.iter().map(|r| r.kind).collect();
    assert_eq!(kinds[0], LineKind::Blank);
    assert_eq!(*kinds.last().unwrap(), LineKind::Instruction);
}

#[test]
fn non_monotonic() {
    let lines = vec![
        DisassemblyLine::instruction(0x1002, "NOP", &[]),
        DisassemblyLine::instruction(0x1000, "NOP", &[]),
    ];
    match format(&lines, 80) {
        Err(Error::NonMonotonicAddress { index, prev, addr }) => {
            assert_eq!((index, prev, addr), (1, 0x1002, 0x1000));
        }
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn comment_wrap() {
    // budget 12 - 5 = 7, minus "; "
    let rows = case(&[DisassemblyLine::comment(0x10, "one two three")], 12);
    let texts: Vec<String> = rows.iter().map(|r| r.text()).collect();
    assert_eq!(texts, vec!["; one", "; two", "; three"]);
    assert!(rows.iter().all(|r| r.addr.is_none()));
    assert!(rows[1].continuation);
}

#[test]
fn comment_blank_lines() {
    let rows = case(&[DisassemblyLine::comment(0x10, "first\n\nsecond")], 80);
    let kinds: Vec<LineKind> = rows.iter().map(|r| r.kind).collect();
    assert_eq!(kinds, vec![LineKind::Comment, LineKind::Blank, LineKind::Comment]);
}

#[test]
fn inline_comment() {
    let line = DisassemblyLine::instruction(0x1000, "LDA", &["&70"]).with_comment("fetch");
    let rows = case(&[line.clone()], 80);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].render(), "1000 LDA &70  ; fetch");

    // "LDA &70  ; fetch" is 16 columns against a budget of 15
    let rows = case(&[line], 20);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].render(), "1000 LDA &70");
    assert_eq!(rows[1].kind, LineKind::Comment);
    assert_eq!(rows[1].render(), "     ; fetch");
    assert!(rows[1].continuation);
}

#[test]
fn address_once() {
    let lines = vec![
        DisassemblyLine::label(0x1000, "loop").with_references([0x1010, 0x1005]),
        DisassemblyLine::instruction(0x1000, "DEX", &[]).with_bytes(&[0xCA]),
    ];
    let rows = case(&lines, 80);
    assert_eq!(rows[0].addr.as_deref(), Some("1000"));
    assert!(rows[0].anchor);
    assert_eq!(rows[0].text(), ".loop");
    assert_eq!(rows[0].references, vec![0x1005, 0x1010]);
    assert_eq!(rows[1].addr, None);
    assert!(!rows[1].anchor);
    assert!(!rows[1].continuation);
    assert_eq!(rows[1].hex.as_deref(), Some("CA"));
}

#[test]
fn wide_address_column() {
    // five hex digits: the budget is 18 - 6 = 12
    let line = DisassemblyLine::data(0x12345, "EQUB", FragmentKind::Byte, &["&00", "&01", "&02", "&03"]);
    let rows = case(&[line], 18);
    let texts: Vec<String> = rows.iter().map(|r| r.text()).collect();
    assert_eq!(texts, vec!["EQUB &00", "&01, &02", "&03"]);
    assert_eq!(rows[0].render(), "12345 EQUB &00");
    assert_eq!(rows[1].render(), "      &01, &02");
    for row in &rows {
        assert_eq!(row.column, 5);
        assert!(row.width() <= 18);
    }

    let lines = vec![
        DisassemblyLine::instruction(0xFFFF, "NOP", &[]),
        DisassemblyLine::instruction(0x10000, "NOP", &[]),
    ];
    let rows = case(&lines, 80);
    assert_eq!(rows[0].render(), "0FFFF NOP");
    assert_eq!(rows[1].render(), "10000 NOP");
}

#[test]
fn wide_characters() {
    // each word is 6 characters but 12 columns; the comment budget is 13
    let comment = "割り込み処理 割り込み処理 割り込み処理";
    let (rows, msgs) = format(&[DisassemblyLine::comment(0x10, comment)], 20).unwrap();
    assert!(msgs.is_empty());
    assert_eq!(rows.len(), 3);
    for row in &rows {
        assert_eq!(row.text(), "; 割り込み処理");
        assert_eq!(row.width(), 19);
        assert!(!row.oversized);
    }
}

#[test]
fn banner_row() {
    let sub = Subroutine {
        addr: 0x8000,
        title: Some("Reset handler".to_string()),
        ..Default::default()
    };
    let lines = vec![
        DisassemblyLine::blank(0x8000),
        DisassemblyLine::banner(&sub),
        DisassemblyLine::label(0x8000, "reset"),
        DisassemblyLine::instruction(0x8000, "SEI", &[]),
    ];
    let rows = case(&lines, 80);
    assert_eq!(rows[1].kind, LineKind::Banner);
    assert_eq!(rows[1].text(), "Reset handler");
    assert_eq!(rows[1].banner.as_ref(), Some(&sub));
    // the banner owns the anchor but shows no address
    assert!(rows[1].anchor);
    assert_eq!(rows[1].addr, None);
    assert!(!rows[2].anchor);
    assert_eq!(rows[2].addr, None);
    assert_eq!(rows[3].addr, None);

    let (rows, msgs) = format(&lines, 12).unwrap();
    assert!(rows[1].oversized);
    assert_eq!(msgs.len(), 1);
    assert_eq!(msgs[0].kind, MsgKind::Warn);
}
