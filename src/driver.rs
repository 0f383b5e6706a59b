//! Program driver: runs clauses sequentially against one shared VM.
//!
//! The driver is the composition root. Each clause either commits atomically
//! or leaves no trace; the driver records failures and keeps going. The run
//! as a whole succeeds if at least one clause committed, and fails with the
//! error of the last clause attempted only when every clause failed.

use std::io::Write;

use crate::error::EngineError;
use crate::exec::{execute_clause, Vm};
use crate::file_view::FileView;
use crate::program::Program;

/// Run `program` against `io`, writing committed ranges to `out`.
///
/// VM state (cursor, match, labels) lives exactly as long as this call.
pub fn run_program(
    program: &Program,
    io: &mut FileView,
    out: &mut dyn Write,
) -> Result<(), EngineError> {
    let mut vm = Vm::new();
    let mut committed = 0usize;
    let mut last_err: Option<EngineError> = None;

    for clause in &program.clauses {
        match execute_clause(clause, io, &mut vm, out) {
            Ok(()) => committed += 1,
            Err(err) => last_err = Some(err),
        }
    }

    out.flush().map_err(EngineError::Io)?;

    match last_err {
        Some(err) if committed == 0 => Err(err),
        _ => Ok(()),
    }
}
