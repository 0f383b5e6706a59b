//! End-to-end extraction programs against real temp files.

use std::io::Write as _;

use carve_rs::{parse_program, run_program, EngineError, FileView};

fn view(content: &[u8]) -> FileView {
    let mut f = tempfile::tempfile().unwrap();
    f.write_all(content).unwrap();
    FileView::from_file(f).unwrap()
}

fn run(content: &[u8], ops: &str) -> Result<Vec<u8>, EngineError> {
    let tokens: Vec<String> = ops.split_whitespace().map(String::from).collect();
    let program = parse_program(&tokens).unwrap();
    let mut io = view(content);
    let mut out = Vec::new();
    run_program(&program, &mut io, &mut out)?;
    Ok(out)
}

#[test]
fn find_then_take_to_match_end() {
    // find moves the cursor to match START, so only the match is emitted.
    let out = run(b"abc\ndef\nghi\n", "find def take to match-end").unwrap();
    assert_eq!(out, b"def");
}

#[test]
fn failed_first_clause_does_not_poison_the_run() {
    let out = run(
        b"abc\ndef\nghi\n",
        "find NOPE take to EOF :: find ghi take 3b",
    )
    .unwrap();
    assert_eq!(out, b"ghi");
}

#[test]
fn take_first_bytes() {
    let out = run(b"hello world", "take 5b").unwrap();
    assert_eq!(out, b"hello");
}

#[test]
fn take_line_range() {
    // Lines 2-4: skip one line, take three.
    let content = b"l1\nl2\nl3\nl4\nl5\n";
    let out = run(content, "skip 1l take 3l").unwrap();
    assert_eq!(out, b"l2\nl3\nl4\n");
}

#[test]
fn take_from_match_to_eof() {
    let out = run(b"noise STATUS ok\nmore\n", "find STATUS take to EOF").unwrap();
    assert_eq!(out, b"STATUS ok\nmore\n");
}

#[test]
fn lines_around_a_match() {
    // Two lines before and three lines from the WARN line.
    let content = b"a\nb\nc\nWARN boom\nd\ne\nf\n";
    let out = run(content, "find WARN take -2l take 3l").unwrap();
    assert_eq!(out, b"b\nc\nWARN boom\nd\ne\n");
}

#[test]
fn take_until_at_line_start() {
    let content = b"keep this\nEND of section\ntail\n";
    let out = run(content, "take until END at line-start").unwrap();
    assert_eq!(out, b"keep this\n");
}

#[test]
fn label_bridges_clauses() {
    let content = b"alpha one two beta three";
    let out = run(content, "find one label S :: find beta take to S").unwrap();
    // Clause 2: cursor at "beta", take back to the label at "one".
    assert_eq!(out, b"one two ");
}

#[test]
fn backward_find_via_location() {
    // Cursor at EOF, search back to BOF: the rightmost needle wins.
    let content = b"x=1 x=2 x=3";
    let out = run(content, "goto EOF find to BOF x= take 3b").unwrap();
    assert_eq!(out, b"x=3");
}

#[test]
fn whole_run_fails_with_last_clause_error() {
    let err = run(b"abc", "find NOPE :: goto MISSING").unwrap_err();
    assert!(matches!(err, EngineError::LocResolve(_)));
}

#[test]
fn eof_offset_takes_tail() {
    let out = run(b"0123456789", "goto EOF -4b take to EOF").unwrap();
    assert_eq!(out, b"6789");
}

#[test]
fn utf8_chars_are_not_split() {
    // "héllo" -- take 2 chars = "h" + 2-byte "é".
    let out = run("héllo".as_bytes(), "take 2c").unwrap();
    assert_eq!(out, "hé".as_bytes());
}

#[test]
fn output_preserves_staging_order_across_clauses() {
    let out = run(b"0123456789", "take 2b :: goto BOF+6b take 2b :: goto BOF take 1b").unwrap();
    assert_eq!(out, b"01670");
}
