//! Clause execution with staged, all-or-nothing commits.
//!
//! # Scope
//! One clause runs at a time against staged copies of the VM's cursor and
//! last match, accumulating output ranges and label writes into clause-scoped
//! buffers. The first failing operation aborts the clause and every staged
//! effect is discarded; on full success the staged ranges are emitted in
//! staging order, the label writes are committed, and the staged cursor and
//! match are published to the shared VM.
//!
//! # Invariants
//! - No partial commit is ever observable: a later clause sees exactly the
//!   state left by earlier successful clauses.
//! - Staging buffers are pre-sized from a static count of the clause's
//!   capture/label-producing operations ([`clause_caps`]); exceeding them is
//!   a [`EngineError::Capacity`] failure, not a reallocation.
//! - Every committed range and cursor value lies in `[0, size]` by clamping.

use std::io::Write;

use crate::error::EngineError;
use crate::file_view::{Dir, FileView};
use crate::labels::LabelStore;
use crate::program::{Clause, LabelId, Op, Unit};
use crate::resolve::{resolve_at, resolve_loc, ResolveCtx};

/// The most recent search result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Match {
    pub start: i64,
    pub end: i64,
    pub valid: bool,
}

impl Match {
    pub fn invalid() -> Self {
        Match {
            start: 0,
            end: 0,
            valid: false,
        }
    }
}

/// One staged output byte interval. Emitted in staging order, never merged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Range {
    pub start: i64,
    pub end: i64,
}

/// One staged label write.
#[derive(Clone, Copy, Debug)]
pub struct LabelWrite {
    pub name: LabelId,
    pub pos: i64,
}

/// Process-lifetime execution state, owned by the driver and mutated only by
/// clause commit. Created fresh per run; nothing survives the run.
#[derive(Clone, Debug)]
pub struct Vm {
    pub cursor: i64,
    pub last_match: Match,
    pub labels: LabelStore,
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl Vm {
    pub fn new() -> Self {
        Vm {
            cursor: 0,
            last_match: Match::invalid(),
            labels: LabelStore::new(),
        }
    }
}

/// Static staging capacity of a clause: (ranges, label writes).
pub fn clause_caps(clause: &Clause) -> (usize, usize) {
    let mut ranges = 0;
    let mut labels = 0;
    for op in &clause.ops {
        match op {
            Op::TakeLen { .. } | Op::TakeTo { .. } | Op::TakeUntil { .. } => ranges += 1,
            Op::Label(_) => labels += 1,
            _ => {}
        }
    }
    (ranges, labels)
}

/// Clause-scoped staging area. Dropping it is the rollback.
struct Staging {
    cursor: i64,
    last_match: Match,
    ranges: Vec<Range>,
    writes: Vec<LabelWrite>,
    ranges_cap: usize,
    writes_cap: usize,
}

impl Staging {
    fn from_vm(vm: &Vm, ranges_cap: usize, writes_cap: usize) -> Self {
        Staging {
            cursor: vm.cursor,
            last_match: vm.last_match,
            ranges: Vec::with_capacity(ranges_cap),
            writes: Vec::with_capacity(writes_cap),
            ranges_cap,
            writes_cap,
        }
    }

    fn stage_range(&mut self, start: i64, end: i64) -> Result<(), EngineError> {
        if self.ranges.len() >= self.ranges_cap {
            return Err(EngineError::Capacity { what: "ranges" });
        }
        self.ranges.push(Range { start, end });
        Ok(())
    }

    fn stage_write(&mut self, name: LabelId, pos: i64) -> Result<(), EngineError> {
        if self.writes.len() >= self.writes_cap {
            return Err(EngineError::Capacity {
                what: "label writes",
            });
        }
        self.writes.push(LabelWrite { name, pos });
        Ok(())
    }
}

fn resolve(
    loc: &crate::program::LocExpr,
    io: &mut FileView,
    vm: &Vm,
    st: &Staging,
) -> Result<i64, EngineError> {
    resolve_loc(
        loc,
        io,
        &ResolveCtx {
            labels: &vm.labels,
            staged_match: &st.last_match,
            staged_cursor: st.cursor,
            staged_writes: &st.writes,
        },
    )
}

/// Execute one clause against the shared VM.
///
/// On success the staged ranges have been written to `out`, label writes
/// committed, and the VM's cursor and last match replaced. On error the VM
/// is untouched and nothing was written.
pub fn execute_clause(
    clause: &Clause,
    io: &mut FileView,
    vm: &mut Vm,
    out: &mut dyn Write,
) -> Result<(), EngineError> {
    let (ranges_cap, writes_cap) = clause_caps(clause);
    let mut st = Staging::from_vm(vm, ranges_cap, writes_cap);

    for op in &clause.ops {
        execute_op(op, io, vm, &mut st)?;
    }

    // Commit: emit in staging order, fold label writes, publish cursor/match.
    for range in &st.ranges {
        io.emit(range.start, range.end, out)?;
    }
    for write in &st.writes {
        vm.labels.commit(write.name, write.pos);
    }
    vm.cursor = st.cursor;
    vm.last_match = st.last_match;
    Ok(())
}

fn execute_op(
    op: &Op,
    io: &mut FileView,
    vm: &Vm,
    st: &mut Staging,
) -> Result<(), EngineError> {
    let size = io.size();
    match op {
        Op::Find { to, needle } => {
            let to_pos = match to {
                Some(loc) => resolve(loc, io, vm, st)?,
                None => size,
            };
            let cursor = st.cursor.clamp(0, size);
            let (win_lo, win_hi, dir) = if to_pos >= cursor {
                (cursor, to_pos, Dir::Fwd)
            } else {
                (to_pos, cursor, Dir::Bwd)
            };
            let (ms, me) = io.find_window(win_lo, win_hi, needle, dir)?;
            st.last_match = Match {
                start: ms,
                end: me,
                valid: true,
            };
            st.cursor = ms;
        }

        Op::Skip { n, unit } => {
            let n = i64::try_from(*n).unwrap_or(i64::MAX);
            match unit {
                Unit::Bytes => {
                    st.cursor = st.cursor.clamp(0, size).saturating_add(n).clamp(0, size);
                }
                Unit::Lines => {
                    let line_start = io.line_start(st.cursor)?;
                    st.cursor = io.step_lines(line_start, n)?;
                }
                Unit::Chars => {
                    let char_start = io.char_start(st.cursor)?;
                    st.cursor = io.step_chars(char_start, n)?;
                }
            }
        }

        Op::TakeLen { n, unit } => {
            let (start, end) = take_len_range(io, st.cursor, *n, *unit)?;
            st.stage_range(start, end)?;
            // Cursor Law: a non-empty range moves the cursor to its far end.
            if start != end {
                st.cursor = start.max(end);
            }
        }

        Op::TakeTo { to } => {
            let target = resolve(to, io, vm, st)?;
            let a = st.cursor.clamp(0, size);
            let b = target.clamp(0, size);
            st.stage_range(a.min(b), a.max(b))?;
            // Always moves, even for an empty range.
            st.cursor = b;
        }

        Op::TakeUntil { needle, at } => {
            let lo = st.cursor.clamp(0, size);
            let (ms, me) = io.find_window(lo, size, needle, Dir::Fwd)?;
            st.last_match = Match {
                start: ms,
                end: me,
                valid: true,
            };
            let target = match at {
                Some(at) => resolve_at(at, io, &st.last_match)?,
                None => ms,
            };
            let dst = target.clamp(0, size);
            // Verbatim [cursor, dst): an inverted range stays inverted and
            // is dropped at emit time.
            st.stage_range(lo, dst)?;
            if dst > st.cursor {
                st.cursor = dst;
            }
        }

        Op::Label(id) => {
            st.stage_write(*id, st.cursor)?;
        }

        Op::Goto { to } => {
            st.cursor = resolve(to, io, vm, st)?;
        }
    }
    Ok(())
}

/// Compute the `[start, end)` staged by `take <n><unit>` at `cursor`.
fn take_len_range(
    io: &mut FileView,
    cursor: i64,
    n: i64,
    unit: Unit,
) -> Result<(i64, i64), EngineError> {
    let size = io.size();
    match unit {
        Unit::Bytes => {
            if n >= 0 {
                let start = cursor.clamp(0, size);
                let end = start.saturating_add(n).clamp(0, size);
                Ok((start, end))
            } else {
                let end = cursor.clamp(0, size);
                let start = end.saturating_add(n).clamp(0, end);
                Ok((start, end))
            }
        }
        Unit::Lines => {
            let anchor = io.line_start(cursor)?;
            if n >= 0 {
                let end = io.step_lines(anchor, n)?.clamp(0, size);
                Ok((anchor, end))
            } else {
                let start = io.step_lines(anchor, n)?.clamp(0, anchor);
                Ok((start, anchor))
            }
        }
        Unit::Chars => {
            let anchor = io.char_start(cursor)?;
            if n >= 0 {
                let end = io.step_chars(anchor, n)?.clamp(0, size);
                Ok((anchor, end))
            } else {
                let start = io.step_chars(anchor, n)?.clamp(0, anchor);
                Ok((start, anchor))
            }
        }
    }
}
