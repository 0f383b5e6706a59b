//! Error types shared across the extraction engine.
//!
//! The taxonomy is deliberately flat: a clause either commits or it fails
//! with exactly one of these kinds, and the driver only needs to distinguish
//! "this clause failed" from "the whole run failed". Variants carry just
//! enough context for a useful stderr line; messages are not stable for
//! machine parsing.

use std::fmt;
use std::io;

/// Failure kinds surfaced by parsing, location resolution, search, and I/O.
///
/// Any of these returned from inside a clause aborts that clause only; the
/// staged cursor, match, ranges, and label writes are discarded and the
/// shared VM is left untouched.
#[derive(Debug)]
#[non_exhaustive]
pub enum EngineError {
    /// Malformed program structure. Carries the offending token index when
    /// the parser knows it.
    Parse {
        position: Option<usize>,
        detail: String,
    },
    /// Empty search pattern.
    BadNeedle,
    /// A symbolic location could not be resolved (missing label, or a
    /// match-relative location with no valid match).
    LocResolve(&'static str),
    /// Search exhausted its window without a match.
    NoMatch,
    /// Invalid label name (parser-stage concern).
    LabelFormat(String),
    /// Underlying read/seek/write failure.
    Io(io::Error),
    /// A clause staged more ranges or label writes than its pre-sized
    /// buffers allow.
    Capacity { what: &'static str },
}

impl EngineError {
    /// Parse error helper with a token position.
    pub fn parse_at(position: usize, detail: impl Into<String>) -> Self {
        EngineError::Parse {
            position: Some(position),
            detail: detail.into(),
        }
    }

    /// Parse error helper without a position.
    pub fn parse(detail: impl Into<String>) -> Self {
        EngineError::Parse {
            position: None,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Parse {
                position: Some(pos),
                detail,
            } => write!(f, "parse error at token {pos}: {detail}"),
            EngineError::Parse {
                position: None,
                detail,
            } => write!(f, "parse error: {detail}"),
            EngineError::BadNeedle => write!(f, "empty search pattern"),
            EngineError::LocResolve(detail) => write!(f, "cannot resolve location: {detail}"),
            EngineError::NoMatch => write!(f, "no match in search window"),
            EngineError::LabelFormat(name) => write!(f, "invalid label name: {name:?}"),
            EngineError::Io(err) => write!(f, "i/o error: {err}"),
            EngineError::Capacity { what } => write!(f, "clause staging capacity exceeded: {what}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for EngineError {
    fn from(err: io::Error) -> Self {
        EngineError::Io(err)
    }
}
