//! Instruction program data model.
//!
//! A [`Program`] is an ordered sequence of [`Clause`]s, each an ordered
//! sequence of [`Op`]s, plus a deduplicated table of label names. Programs
//! are immutable once built: the parser (or a test) constructs one through
//! [`ProgramBuilder`], and execution reads it without re-validating syntax.
//!
//! Invariants enforced at build time:
//! - Label names are 1-16 chars of `[A-Z0-9_-]` with an uppercase first char.
//! - Label names are interned; every `LabelId` indexes the name table.
//! - Needles are non-empty byte strings.

use crate::error::EngineError;

/// Maximum length of a label name in bytes.
pub const MAX_LABEL_LEN: usize = 16;

/// Measurement unit for offsets and lengths.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Unit {
    Bytes,
    /// LF-delimited lines. CR bytes are ordinary bytes.
    Lines,
    /// UTF-8 code points; malformed sequences are stepped permissively.
    Chars,
}

/// Index into a program's label name table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LabelId(pub u16);

/// Base selector of a symbolic location.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocBase {
    Cursor,
    Bof,
    Eof,
    Label(LabelId),
    MatchStart,
    MatchEnd,
    /// Start of the line containing the staged cursor.
    LineStart,
    /// End of the line containing the staged cursor.
    LineEnd,
}

/// A symbolic location: a base plus an optional signed, unit-typed offset.
///
/// `offset == 0` means no offset was given; resolution skips the offset
/// arithmetic entirely in that case.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocExpr {
    pub base: LocBase,
    pub offset: i64,
    pub unit: Unit,
}

impl LocExpr {
    pub fn at(base: LocBase) -> Self {
        LocExpr {
            base,
            offset: 0,
            unit: Unit::Bytes,
        }
    }

    pub fn with_offset(base: LocBase, offset: i64, unit: Unit) -> Self {
        LocExpr { base, offset, unit }
    }
}

/// Base selector for `take until ... at <loc>` expressions.
///
/// Same shape as [`LocBase`] restricted to match/line bases; line bases are
/// anchored at the start of the match produced by that `take until`'s own
/// search, not at the clause cursor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AtBase {
    MatchStart,
    MatchEnd,
    LineStart,
    LineEnd,
}

/// An `at` expression: restricted base plus optional signed offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AtExpr {
    pub base: AtBase,
    pub offset: i64,
    pub unit: Unit,
}

/// One operation inside a clause.
#[derive(Clone, Debug)]
pub enum Op {
    /// Search for `needle` in `[min(cursor, to), max(cursor, to))`, forward
    /// if `to >= cursor`, backward otherwise. `to` defaults to EOF.
    Find {
        to: Option<LocExpr>,
        needle: Vec<u8>,
    },
    /// Move the cursor `n` units forward. Unsigned: skip never retreats.
    Skip { n: u64, unit: Unit },
    /// Stage `n` units anchored at the cursor; negative `n` extends backward
    /// ending at the cursor.
    TakeLen { n: i64, unit: Unit },
    /// Stage the order-normalized range between the cursor and `to`.
    TakeTo { to: LocExpr },
    /// Search forward for `needle` and stage `[cursor, target)` verbatim,
    /// where `target` comes from `at` (or the match start).
    TakeUntil {
        needle: Vec<u8>,
        at: Option<AtExpr>,
    },
    /// Stage a label write at the current staged cursor.
    Label(LabelId),
    /// Set the staged cursor to `to`. No range, no match change.
    Goto { to: LocExpr },
}

/// An atomically committed sequence of operations.
#[derive(Clone, Debug, Default)]
pub struct Clause {
    pub ops: Vec<Op>,
}

/// A validated, immutable instruction program.
#[derive(Clone, Debug, Default)]
pub struct Program {
    pub clauses: Vec<Clause>,
    names: Vec<String>,
}

impl Program {
    /// Label name for an interned id.
    pub fn label_name(&self, id: LabelId) -> &str {
        &self.names[id.0 as usize]
    }

    /// Number of distinct label names in the program.
    pub fn name_count(&self) -> usize {
        self.names.len()
    }
}

/// Incremental program construction with label interning.
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    clauses: Vec<Clause>,
    names: Vec<String>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a label name, validating its format.
    pub fn intern_label(&mut self, name: &str) -> Result<LabelId, EngineError> {
        if !is_valid_label(name) {
            return Err(EngineError::LabelFormat(name.to_string()));
        }
        if let Some(idx) = self.names.iter().position(|n| n == name) {
            return Ok(LabelId(idx as u16));
        }
        let idx = self.names.len();
        if idx > u16::MAX as usize {
            return Err(EngineError::parse("too many distinct labels"));
        }
        self.names.push(name.to_string());
        Ok(LabelId(idx as u16))
    }

    pub fn push_clause(&mut self, clause: Clause) {
        self.clauses.push(clause);
    }

    pub fn finish(self) -> Program {
        Program {
            clauses: self.clauses,
            names: self.names,
        }
    }
}

/// Label names: 1-16 chars, `[A-Z0-9_-]`, first char `[A-Z]`.
pub fn is_valid_label(name: &str) -> bool {
    let bytes = name.as_bytes();
    if bytes.is_empty() || bytes.len() > MAX_LABEL_LEN {
        return false;
    }
    if !bytes[0].is_ascii_uppercase() {
        return false;
    }
    bytes
        .iter()
        .all(|&b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_' || b == b'-')
}
