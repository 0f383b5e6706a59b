//! Streaming byte-range extraction with a transactional clause VM.
//!
//! ## Scope
//! This crate runs a small instruction program (find/skip/take/label/goto)
//! against a possibly very large input and streams exact byte ranges to an
//! output sink. The input is never materialized in memory.
//!
//! ## Key invariants
//! - Clauses are transactional: every staged range, label write, and
//!   cursor/match change becomes visible together on success, or not at all.
//! - All file access is bounded: searches, line/char boundary queries, and
//!   range emission go through one reusable scan buffer.
//! - Forward search returns the leftmost match in its window; backward
//!   search returns the rightmost, scanning overlapping blocks so seam
//!   matches are never missed.
//! - Labels live in a fixed 32-slot store; when full, the least recently
//!   committed entry is evicted.
//!
//! ## Execution flow (one run)
//! 1) Parse tokens into a validated [`Program`] of clauses.
//! 2) Open a [`FileView`] over the input (a file on disk, or stdin spooled
//!    to a temp file so it is seekable).
//! 3) [`run_program`] executes clauses in order against one VM; a failed
//!    clause rolls back and the run continues.
//! 4) The run succeeds if at least one clause committed; otherwise it fails
//!    with the last clause's error.
//!
//! ## Notable entry points
//! - [`parse_program`]: tokens to a [`Program`].
//! - [`FileView`]: bounded file access and windowed search.
//! - [`run_program`]: the driver.

pub mod driver;
pub mod error;
pub mod exec;
pub mod file_view;
pub mod labels;
pub mod parse;
pub mod program;
pub mod resolve;

pub use driver::run_program;
pub use error::EngineError;
pub use exec::{clause_caps, execute_clause, Match, Range, Vm};
pub use file_view::{Dir, FileView, BK_BLK, FWD_WIN, OVERLAP_MAX, OVERLAP_MIN};
pub use labels::{LabelStore, LABEL_SLOTS};
pub use parse::parse_program;
pub use program::{
    is_valid_label, AtBase, AtExpr, Clause, LabelId, LocBase, LocExpr, Op, Program,
    ProgramBuilder, Unit, MAX_LABEL_LEN,
};
