//! Label semantics across clause boundaries.

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
fn relabel_updates_position() {
    // A is committed twice; the second position wins for later clauses.
    let out = run(
        b"0123456789",
        "label A :: skip 6b label A :: goto A take 2b",
    )
    .unwrap();
    assert_eq!(out, b"67");
}

#[test]
fn label_from_failed_clause_never_exists() {
    let err = run(b"0123456789", "skip 2b label A find NOPE :: goto A").unwrap_err();
    assert!(matches!(err, EngineError::LocResolve(_)));
}

#[test]
fn last_staged_write_wins_at_commit() {
    // Both writes happen in one clause; only the final position persists.
    let out = run(
        b"0123456789",
        "label A skip 5b label A :: goto A take 2b",
    )
    .unwrap();
    assert_eq!(out, b"56");
}

#[test]
fn oldest_label_is_evicted_once_slots_fill() {
    // Commit 33 distinct labels; the first one is the eviction victim.
    let mut ops = String::from("label L0");
    for i in 1..33 {
        ops.push_str(&format!(" :: label L{i}"));
    }
    ops.push_str(" :: goto L0 take 1b");
    // Earlier clauses committed, so the run succeeds, but the final
    // clause fails to resolve the evicted label and emits nothing.
    let out = run(b"0123456789", &ops).unwrap();
    assert!(out.is_empty());

    // L1 survived the eviction and still resolves.
    let mut ops = String::from("label L0");
    for i in 1..33 {
        ops.push_str(&format!(" :: label L{i}"));
    }
    ops.push_str(" :: goto L1 take 1b");
    let out = run(b"0123456789", &ops).unwrap();
    assert_eq!(out, b"0");
}

#[test]
fn label_offset_location() {
    let out = run(b"0123456789", "skip 3b label M :: goto M+2b take 1b").unwrap();
    assert_eq!(out, b"5");
}
