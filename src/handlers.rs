//! Fix exception handlers that catch the wrong condition.
//!
//! Older migrations guarded indexes with `duplicate_table`, which PostgreSQL
//! never raises for `CREATE INDEX`; the guard then fails on re-run. This pass
//! rewrites the `WHEN <code> THEN` clause of each guard block so it matches
//! the [`ErrorCodes`] entry for the statement inside.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::codes::ErrorCodes;
use crate::statement::{self, StatementKind};

static HANDLER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bWHEN\s+([a-z_][a-z0-9_]*)\s+THEN\b").expect("handler pattern is valid")
});

/// A handler clause whose code disagrees with its statement kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    pub kind: StatementKind,
    /// 1-based line of the `WHEN` clause.
    pub line: usize,
    pub found: String,
    pub expected: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealignOutput {
    pub lines: Vec<String>,
    pub fixed: Vec<Mismatch>,
}

impl RealignOutput {
    pub fn count(&self, kind: StatementKind) -> usize {
        self.fixed.iter().filter(|m| m.kind == kind).count()
    }

    pub fn per_kind(&self) -> BTreeMap<StatementKind, usize> {
        let mut counts = BTreeMap::new();
        for m in &self.fixed {
            *counts.entry(m.kind).or_insert(0) += 1;
        }
        counts
    }
}

/// Rewrite mismatched handler codes inside guard blocks.
///
/// Only codes that [`ErrorCodes::is_known`] recognizes are touched, so
/// unrelated handlers such as `WHEN others THEN` survive unchanged.
pub fn realign<S: AsRef<str>>(source: &[S], codes: &ErrorCodes) -> RealignOutput {
    let mut lines: Vec<String> = source.iter().map(|l| l.as_ref().to_string()).collect();
    let mut fixed = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if !statement::opens_block(&lines[i]) {
            i += 1;
            continue;
        }
        let Some(close) = (i + 1..lines.len()).find(|&j| statement::is_close_marker(&lines[j]))
        else {
            break;
        };

        let kind = lines[i + 1..close]
            .iter()
            .find_map(|line| statement::parse_opener(line))
            .map(|opener| opener.kind);

        if let Some(kind) = kind {
            let expected = codes.for_kind(kind);
            for (j, line) in lines.iter_mut().enumerate().take(close).skip(i + 1) {
                if let Some(m) = realign_line(line, expected, codes) {
                    fixed.push(Mismatch {
                        kind,
                        line: j + 1,
                        found: m,
                        expected: expected.to_string(),
                    });
                }
            }
        }
        i = close + 1;
    }

    RealignOutput { lines, fixed }
}

/// Replace the handler code on `line` if it is a known, wrong code.
/// Returns the code that was replaced.
fn realign_line(line: &mut String, expected: &str, codes: &ErrorCodes) -> Option<String> {
    let caps = HANDLER.captures(line)?;
    let code = caps.get(1)?;
    let found = code.as_str();
    if found.eq_ignore_ascii_case(expected) || !codes.is_known(found) {
        return None;
    }
    let found = found.to_string();
    line.replace_range(code.range(), expected);
    Some(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_realign_index_handler() {
        let input = [
            "DO $$ BEGIN",
            r#"    CREATE INDEX "Task_tenantId_idx" ON "Task"("tenantId");"#,
            "EXCEPTION",
            "    WHEN duplicate_table THEN null;",
            "END $$;",
        ];
        let out = realign(&input, &ErrorCodes::default());
        assert_eq!(out.lines[3], "    WHEN duplicate_object THEN null;");
        assert_eq!(
            out.fixed,
            vec![Mismatch {
                kind: StatementKind::Index,
                line: 4,
                found: "duplicate_table".to_string(),
                expected: "duplicate_object".to_string(),
            }]
        );

        let again = realign(&out.lines, &ErrorCodes::default());
        assert_eq!(again.lines, out.lines);
        assert!(again.fixed.is_empty());
    }

    #[test]
    fn test_single_line_handler() {
        let input = [
            "DO $$ BEGIN",
            r#"  CREATE TABLE "A" ("id" TEXT);"#,
            "EXCEPTION WHEN duplicate_object THEN NULL; END $$;",
        ];
        // the close marker must start its own line, so this block is skipped
        let out = realign(&input, &ErrorCodes::default());
        assert!(out.fixed.is_empty());

        let input = [
            "DO $$ BEGIN",
            r#"  CREATE TABLE "A" ("id" TEXT);"#,
            "EXCEPTION WHEN duplicate_object THEN NULL;",
            "END $$;",
        ];
        let out = realign(&input, &ErrorCodes::default());
        assert_eq!(out.lines[2], "EXCEPTION WHEN duplicate_table THEN NULL;");
        assert_eq!(out.count(StatementKind::Table), 1);
    }

    #[test]
    fn test_one_line_block_skipped() {
        let input = [
            "DO $$ BEGIN CREATE INDEX \"a\" ON \"b\"(\"c\"); EXCEPTION WHEN duplicate_table THEN null; END $$;",
            "DO $$ BEGIN",
            r#"    CREATE TABLE "A" ("id" TEXT);"#,
            "EXCEPTION",
            "    WHEN duplicate_table THEN null;",
            "END $$;",
        ];
        let out = realign(&input, &ErrorCodes::default());
        assert_eq!(out.lines, input.to_vec());
        assert!(out.fixed.is_empty());
    }

    #[test]
    fn test_unknown_codes_untouched() {
        let input = [
            "DO $$ BEGIN",
            r#"    CREATE TYPE "Role" AS ENUM ('A');"#,
            "EXCEPTION",
            "    WHEN others THEN null;",
            "END $$;",
        ];
        let out = realign(&input, &ErrorCodes::default());
        assert_eq!(out.lines, input.to_vec());
        assert!(out.fixed.is_empty());
    }

    #[test]
    fn test_blocks_without_statements_untouched() {
        let input = [
            "DO $$ BEGIN",
            r#"    ALTER TABLE "A" ADD CONSTRAINT "A_fkey" FOREIGN KEY ("b") REFERENCES "B"("id");"#,
            "EXCEPTION",
            "    WHEN duplicate_table THEN null;",
            "END $$;",
        ];
        let out = realign(&input, &ErrorCodes::default());
        assert_eq!(out.lines, input.to_vec());
    }

    #[test]
    fn test_per_kind_counts() {
        let input = [
            "DO $$ BEGIN",
            r#"    CREATE UNIQUE INDEX "u" ON "A"("b");"#,
            "EXCEPTION",
            "    WHEN duplicate_table THEN null;",
            "END $$;",
            "DO $$ BEGIN",
            r#"    CREATE TABLE "A" ("#,
            "    );",
            "EXCEPTION",
            "    WHEN duplicate_object THEN null;",
            "END $$;",
        ];
        let out = realign(&input, &ErrorCodes::default());
        let counts = out.per_kind();
        assert_eq!(counts.get(&StatementKind::UniqueIndex), Some(&1));
        assert_eq!(counts.get(&StatementKind::Table), Some(&1));
    }
}
