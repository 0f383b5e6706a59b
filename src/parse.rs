//! Token parser: command-line tokens to a validated [`Program`].
//!
//! Grammar (one token per item unless noted):
//!
//! ```text
//! program   := clause ( "::" clause )*
//! clause    := op+
//! op        := "find" [ "to" loc ] <needle>
//!            | "skip" <n><unit>
//!            | "take" <signed-n><unit>
//!            | "take" "to" loc
//!            | "take" "until" <needle> [ "at" atloc ]
//!            | "label" NAME
//!            | "goto" loc
//! loc       := base [ ("+"|"-") <n><unit> ]      (offset inline or next token)
//! base      := cursor | BOF | EOF | match-start | match-end
//!            | line-start | line-end | NAME
//! unit      := "b" | "l" | "c"                   (default: bytes)
//! NAME      := [A-Z][A-Z0-9_-]{0,15}
//! ```
//!
//! `atloc` accepts only match/line bases. Needle tokens are taken as raw
//! bytes. The produced program is fully validated: the execution core does
//! not re-check syntax.

use crate::error::EngineError;
use crate::program::{
    is_valid_label, AtBase, AtExpr, Clause, LocBase, LocExpr, Op, Program, ProgramBuilder, Unit,
};

/// Named location bases, checked before label names.
const BASES: &[(&str, LocBase)] = &[
    ("cursor", LocBase::Cursor),
    ("BOF", LocBase::Bof),
    ("EOF", LocBase::Eof),
    ("match-start", LocBase::MatchStart),
    ("match-end", LocBase::MatchEnd),
    ("line-start", LocBase::LineStart),
    ("line-end", LocBase::LineEnd),
];

/// Parse command tokens into a program.
pub fn parse_program(tokens: &[String]) -> Result<Program, EngineError> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        builder: ProgramBuilder::new(),
    };
    parser.program()?;
    Ok(parser.builder.finish())
}

struct Parser<'a> {
    tokens: &'a [String],
    pos: usize,
    builder: ProgramBuilder,
}

impl<'a> Parser<'a> {
    fn program(&mut self) -> Result<(), EngineError> {
        if self.tokens.is_empty() {
            return Err(EngineError::parse("empty program"));
        }
        loop {
            let clause = self.clause()?;
            self.builder.push_clause(clause);
            if self.pos >= self.tokens.len() {
                return Ok(());
            }
            // Only "::" can follow a clause.
            self.expect("::")?;
        }
    }

    fn clause(&mut self) -> Result<Clause, EngineError> {
        let mut ops = Vec::new();
        while let Some(tok) = self.peek() {
            if tok == "::" {
                break;
            }
            ops.push(self.op()?);
        }
        if ops.is_empty() {
            return Err(EngineError::parse_at(self.pos, "empty clause"));
        }
        Ok(Clause { ops })
    }

    fn op(&mut self) -> Result<Op, EngineError> {
        let at = self.pos;
        let tok = self.next("expected operation")?;
        match tok {
            "find" => {
                let to = if self.peek() == Some("to") {
                    self.pos += 1;
                    Some(self.loc()?)
                } else {
                    None
                };
                let needle = self.needle()?;
                Ok(Op::Find { to, needle })
            }
            "skip" => {
                let at = self.pos;
                let arg = self.next("skip needs a count")?;
                let (n, unit) = parse_unsigned(arg)
                    .ok_or_else(|| EngineError::parse_at(at, format!("bad skip count: {arg:?}")))?;
                Ok(Op::Skip { n, unit })
            }
            "take" => self.take(),
            "label" => {
                let name = self.next("label needs a name")?;
                let id = self.builder.intern_label(name)?;
                Ok(Op::Label(id))
            }
            "goto" => {
                let to = self.loc()?;
                Ok(Op::Goto { to })
            }
            other => Err(EngineError::parse_at(
                at,
                format!("unknown operation: {other:?}"),
            )),
        }
    }

    fn take(&mut self) -> Result<Op, EngineError> {
        let at = self.pos;
        let arg = self.next("take needs an argument")?;
        match arg {
            "to" => {
                let to = self.loc()?;
                Ok(Op::TakeTo { to })
            }
            "until" => {
                let needle = self.needle()?;
                let at_expr = if self.peek() == Some("at") {
                    self.pos += 1;
                    Some(self.at_expr()?)
                } else {
                    None
                };
                Ok(Op::TakeUntil {
                    needle,
                    at: at_expr,
                })
            }
            len => {
                let (n, unit) = parse_signed(len).ok_or_else(|| {
                    EngineError::parse_at(at, format!("bad take length: {len:?}"))
                })?;
                Ok(Op::TakeLen { n, unit })
            }
        }
    }

    fn needle(&mut self) -> Result<Vec<u8>, EngineError> {
        let tok = self.next("expected search pattern")?;
        if tok.is_empty() {
            return Err(EngineError::BadNeedle);
        }
        Ok(tok.as_bytes().to_vec())
    }

    fn loc(&mut self) -> Result<LocExpr, EngineError> {
        let at = self.pos;
        let tok = self.next("expected location")?;
        let (base, inline) = self.split_base(tok, at)?;
        let mut loc = LocExpr::at(base);

        if let Some(rest) = inline {
            let (offset, unit) = parse_signed(rest).ok_or_else(|| {
                EngineError::parse_at(at, format!("bad location offset: {rest:?}"))
            })?;
            loc.offset = offset;
            loc.unit = unit;
        } else if let Some(next) = self.peek() {
            // A separate "+3b" / "-2l" token binds to the location.
            if next.starts_with('+') || next.starts_with('-') {
                if let Some((offset, unit)) = parse_signed(next) {
                    self.pos += 1;
                    loc.offset = offset;
                    loc.unit = unit;
                }
            }
        }
        Ok(loc)
    }

    fn at_expr(&mut self) -> Result<AtExpr, EngineError> {
        let at = self.pos;
        let loc = self.loc()?;
        let base = match loc.base {
            LocBase::MatchStart => AtBase::MatchStart,
            LocBase::MatchEnd => AtBase::MatchEnd,
            LocBase::LineStart => AtBase::LineStart,
            LocBase::LineEnd => AtBase::LineEnd,
            _ => {
                return Err(EngineError::parse_at(
                    at,
                    "at-location must be match- or line-relative",
                ))
            }
        };
        Ok(AtExpr {
            base,
            offset: loc.offset,
            unit: loc.unit,
        })
    }

    /// Split a location token into its base and an optional inline offset.
    ///
    /// Named bases win over labels. A token that is entirely a valid label
    /// name is that label (so `A-2` is a label, not `A` minus two); otherwise
    /// the longest valid label prefix followed by a parseable signed offset
    /// is accepted.
    fn split_base<'t>(
        &mut self,
        tok: &'t str,
        at: usize,
    ) -> Result<(LocBase, Option<&'t str>), EngineError> {
        for (name, base) in BASES {
            if tok == *name {
                return Ok((*base, None));
            }
            if let Some(rest) = tok.strip_prefix(name) {
                if rest.starts_with('+') || rest.starts_with('-') {
                    return Ok((*base, Some(rest)));
                }
            }
        }

        if is_valid_label(tok) {
            let id = self.builder.intern_label(tok)?;
            return Ok((LocBase::Label(id), None));
        }

        // Longest label prefix with an inline offset, e.g. "MARK+3b".
        for (i, c) in tok.char_indices().rev() {
            if c != '+' && c != '-' {
                continue;
            }
            let (name, rest) = tok.split_at(i);
            if is_valid_label(name) && parse_signed(rest).is_some() {
                let id = self.builder.intern_label(name)?;
                return Ok((LocBase::Label(id), Some(rest)));
            }
        }

        Err(EngineError::parse_at(at, format!("bad location: {tok:?}")))
    }

    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).map(String::as_str)
    }

    fn next(&mut self, what: &str) -> Result<&'a str, EngineError> {
        match self.tokens.get(self.pos) {
            Some(tok) => {
                self.pos += 1;
                Ok(tok)
            }
            None => Err(EngineError::parse_at(self.pos, what)),
        }
    }

    fn expect(&mut self, tok: &str) -> Result<(), EngineError> {
        let at = self.pos;
        let got = self.next(&format!("expected {tok:?}"))?;
        if got != tok {
            return Err(EngineError::parse_at(at, format!("expected {tok:?}")));
        }
        Ok(())
    }
}

/// `"10"`, `"10b"`, `"3l"`, `"7c"` -> count and unit. Bytes when unitless.
fn parse_unsigned(s: &str) -> Option<(u64, Unit)> {
    let (digits, unit) = split_unit(s)?;
    let n = digits.parse::<u64>().ok()?;
    Some((n, unit))
}

/// Signed variant; an explicit `+` is accepted.
fn parse_signed(s: &str) -> Option<(i64, Unit)> {
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1i64, &s[1..]),
        b'-' => (-1i64, &s[1..]),
        _ => (1i64, s),
    };
    let (digits, unit) = split_unit(rest)?;
    let n = digits.parse::<i64>().ok()?;
    Some((sign * n, unit))
}

fn split_unit(s: &str) -> Option<(&str, Unit)> {
    if s.is_empty() {
        return None;
    }
    let (digits, unit) = match s.as_bytes()[s.len() - 1] {
        b'b' => (&s[..s.len() - 1], Unit::Bytes),
        b'l' => (&s[..s.len() - 1], Unit::Lines),
        b'c' => (&s[..s.len() - 1], Unit::Chars),
        _ => (s, Unit::Bytes),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((digits, unit))
}
