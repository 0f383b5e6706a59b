//! Symbolic location resolution.
//!
//! Translates a [`LocExpr`] into an absolute byte offset, consulting staged
//! state first and committed state second. Resolution has no side effects on
//! the VM; it only reads the file for line/char boundary queries.
//!
//! Rules:
//! - `label:<name>` checks the current clause's staged writes first (last
//!   write wins), then the committed store.
//! - Match bases require a valid staged match.
//! - Line bases answer "start/end of the line containing the staged cursor",
//!   independent of any offset on the expression.
//! - After the base, an optional signed offset is applied in its unit, then
//!   the result is clamped to `[0, size]`.

use crate::error::EngineError;
use crate::exec::{LabelWrite, Match};
use crate::file_view::FileView;
use crate::labels::LabelStore;
use crate::program::{AtBase, AtExpr, LocBase, LocExpr, Unit};

/// Read-only view of the state a location resolves against.
pub struct ResolveCtx<'a> {
    pub labels: &'a LabelStore,
    pub staged_match: &'a Match,
    pub staged_cursor: i64,
    pub staged_writes: &'a [LabelWrite],
}

/// Resolve `loc` to an absolute, clamped byte offset.
pub fn resolve_loc(
    loc: &LocExpr,
    io: &mut FileView,
    ctx: &ResolveCtx<'_>,
) -> Result<i64, EngineError> {
    let base = match loc.base {
        LocBase::Cursor => ctx.staged_cursor,
        LocBase::Bof => 0,
        LocBase::Eof => io.size(),
        LocBase::Label(id) => {
            let staged = ctx
                .staged_writes
                .iter()
                .rev()
                .find(|w| w.name == id)
                .map(|w| w.pos);
            match staged.or_else(|| ctx.labels.get(id)) {
                Some(pos) => pos,
                None => return Err(EngineError::LocResolve("label not set")),
            }
        }
        LocBase::MatchStart => {
            if !ctx.staged_match.valid {
                return Err(EngineError::LocResolve("no valid match"));
            }
            ctx.staged_match.start
        }
        LocBase::MatchEnd => {
            if !ctx.staged_match.valid {
                return Err(EngineError::LocResolve("no valid match"));
            }
            ctx.staged_match.end
        }
        LocBase::LineStart => io.line_start(ctx.staged_cursor)?,
        LocBase::LineEnd => io.line_end(ctx.staged_cursor)?,
    };

    apply_offset(base, loc.offset, loc.unit, io)
}

/// Resolve an `at` expression against the match produced by the enclosing
/// `take until`'s own search. Line bases anchor at the match start.
pub fn resolve_at(at: &AtExpr, io: &mut FileView, m: &Match) -> Result<i64, EngineError> {
    debug_assert!(m.valid);
    let base = match at.base {
        AtBase::MatchStart => m.start,
        AtBase::MatchEnd => m.end,
        AtBase::LineStart => io.line_start(m.start)?,
        AtBase::LineEnd => io.line_end(m.start)?,
    };
    apply_offset(base, at.offset, at.unit, io)
}

fn apply_offset(
    base: i64,
    offset: i64,
    unit: Unit,
    io: &mut FileView,
) -> Result<i64, EngineError> {
    let mut pos = base;
    if offset != 0 {
        match unit {
            Unit::Bytes => pos = pos.saturating_add(offset),
            Unit::Lines => pos = io.step_lines(pos.clamp(0, io.size()), offset)?,
            Unit::Chars => {
                let start = io.char_start(pos.clamp(0, io.size()))?;
                pos = io.step_chars(start, offset)?;
            }
        }
    }
    Ok(pos.clamp(0, io.size()))
}
