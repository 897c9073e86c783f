//! Idempotency guards for DDL statements.
//!
//! Rewrites every unguarded statement into a block that swallows the
//! "already exists" condition for its kind:
//!
//! ```sql
//! -- CreateTable
//! DO $$ BEGIN
//!     CREATE TABLE "User" (
//!         "id" TEXT NOT NULL
//!     );
//! EXCEPTION
//!     WHEN duplicate_table THEN null;
//! END $$;
//! ```
//!
//! The pass is pure and idempotent: running it on its own output changes
//! nothing, because every wrapped statement is preceded by the open marker.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::codes::ErrorCodes;
use crate::statement::{self, StatementKind, CLOSE_LINE, OPEN_LINE};

const DEFAULT_INDENT: usize = 4;

/// A statement whose end could not be found. It is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unresolved {
    pub kind: StatementKind,
    pub name: String,
    /// 1-based line of the opener.
    pub line: usize,
}

/// Summary of one wrap pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WrapStats {
    /// Statements wrapped by this pass, per kind.
    pub wrapped: BTreeMap<StatementKind, usize>,
    /// Statements found already inside a guard block.
    pub already_wrapped: usize,
    pub unresolved: Vec<Unresolved>,
}

impl WrapStats {
    pub fn count(&self, kind: StatementKind) -> usize {
        self.wrapped.get(&kind).copied().unwrap_or(0)
    }

    pub fn total_wrapped(&self) -> usize {
        self.wrapped.values().sum()
    }

    /// True when the pass left its input unchanged.
    pub fn is_noop(&self) -> bool {
        self.total_wrapped() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapOutput {
    pub lines: Vec<String>,
    pub stats: WrapStats,
}

/// Statement wrapper with a configurable error-code table and indent unit.
#[derive(Debug, Clone)]
pub struct Wrapper {
    codes: ErrorCodes,
    indent: String,
}

impl Default for Wrapper {
    fn default() -> Self {
        Self::new(ErrorCodes::default())
    }
}

impl Wrapper {
    pub fn new(codes: ErrorCodes) -> Self {
        Self {
            codes,
            indent: " ".repeat(DEFAULT_INDENT),
        }
    }

    /// Indent wrapped lines by `width` spaces instead of the default 4.
    pub fn with_indent(mut self, width: usize) -> Self {
        self.indent = " ".repeat(width);
        self
    }

    pub fn codes(&self) -> &ErrorCodes {
        &self.codes
    }

    /// Wrap every unguarded statement in `source`.
    pub fn wrap<S: AsRef<str>>(&self, source: &[S]) -> WrapOutput {
        let mut lines = Vec::with_capacity(source.len());
        let mut stats = WrapStats::default();
        let mut i = 0;

        while i < source.len() {
            let line = source[i].as_ref();
            let Some(opener) = statement::parse_opener(line) else {
                lines.push(line.to_string());
                i += 1;
                continue;
            };

            let end = statement::statement_end(source, i, opener.kind);

            if statement::is_guarded(source, i) {
                stats.already_wrapped += 1;
                let last = end.unwrap_or(i);
                lines.extend(source[i..=last].iter().map(|l| l.as_ref().to_string()));
                i = last + 1;
                continue;
            }

            let Some(end) = end else {
                stats.unresolved.push(Unresolved {
                    kind: opener.kind,
                    name: opener.name,
                    line: i + 1,
                });
                lines.push(line.to_string());
                i += 1;
                continue;
            };

            self.emit_guarded(&mut lines, &source[i..=end], opener.kind);
            *stats.wrapped.entry(opener.kind).or_insert(0) += 1;
            i = end + 1;
        }

        WrapOutput { lines, stats }
    }

    fn emit_guarded<S: AsRef<str>>(&self, out: &mut Vec<String>, body: &[S], kind: StatementKind) {
        out.push(OPEN_LINE.to_string());
        for line in body {
            let line = line.as_ref();
            if line.trim().is_empty() {
                out.push(String::new());
            } else {
                out.push(format!("{}{}", self.indent, line));
            }
        }
        out.push("EXCEPTION".to_string());
        out.push(format!(
            "{}WHEN {} THEN null;",
            self.indent,
            self.codes.for_kind(kind)
        ));
        out.push(CLOSE_LINE.to_string());
    }
}

/// Wrap with the default error codes and indent.
pub fn wrap<S: AsRef<str>>(source: &[S]) -> WrapOutput {
    Wrapper::default().wrap(source)
}
