//! Clause atomicity observed through the public entry points.

use std::io::Write as _;

use carve_rs::{clause_caps, execute_clause, parse_program, run_program, FileView, Vm};

fn view(content: &[u8]) -> FileView {
    let mut f = tempfile::tempfile().unwrap();
    f.write_all(content).unwrap();
    FileView::from_file(f).unwrap()
}

fn program(ops: &str) -> carve_rs::Program {
    let tokens: Vec<String> = ops.split_whitespace().map(String::from).collect();
    parse_program(&tokens).unwrap()
}

#[test]
fn failing_clause_produces_no_output_at_all() {
    // The take stages bytes, the find then fails: nothing may leak out.
    let prog = program("take 5b find NOPE");
    let mut io = view(b"0123456789");
    let mut out = Vec::new();
    assert!(run_program(&prog, &mut io, &mut out).is_err());
    assert!(out.is_empty());
}

#[test]
fn failing_clause_leaves_vm_untouched() {
    let prog = program("skip 4b label P take 2b find NOPE");
    let mut io = view(b"0123456789");
    let mut vm = Vm::new();
    let mut out = Vec::new();
    assert!(execute_clause(&prog.clauses[0], &mut io, &mut vm, &mut out).is_err());
    assert_eq!(vm.cursor, 0);
    assert!(!vm.last_match.valid);
    assert!(vm.labels.is_empty());
    assert!(out.is_empty());
}

#[test]
fn successful_clause_publishes_everything_together() {
    let prog = program("find def label D take 3b");
    let mut io = view(b"abc\ndef\nghi\n");
    let mut vm = Vm::new();
    let mut out = Vec::new();
    execute_clause(&prog.clauses[0], &mut io, &mut vm, &mut out).unwrap();
    assert_eq!(out, b"def");
    assert_eq!(vm.cursor, 7);
    assert!(vm.last_match.valid);
    assert_eq!(vm.labels.len(), 1);
    assert_eq!(vm.labels.generation(), 1);
}

#[test]
fn later_clause_sees_committed_state_only() {
    // Clause 1 commits cursor 4; clause 2 fails after staging movement;
    // clause 3 must observe cursor 4, not clause 2's staging.
    let prog = program("skip 4b :: skip 3b find NOPE :: take 2b");
    let mut io = view(b"0123456789");
    let mut out = Vec::new();
    run_program(&prog, &mut io, &mut out).unwrap();
    assert_eq!(out, b"45");
}

#[test]
fn clause_caps_count_staging_ops() {
    let prog = program("find x take 2b take to EOF take until y label A label B skip 1b");
    let (ranges, labels) = clause_caps(&prog.clauses[0]);
    assert_eq!(ranges, 3);
    assert_eq!(labels, 2);
}
