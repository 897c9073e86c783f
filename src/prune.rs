//! Remove erroneous lines from a migration.
//!
//! Patterns are project specific (a stray `DROP INDEX`, a column that was
//! renamed by hand) so they come from config or the command line.

use regex::Regex;
use serde::Serialize;

use crate::error::{GuardError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovedLine {
    /// 1-based line number in the input.
    pub line: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PruneOutput {
    pub lines: Vec<String>,
    pub removed: Vec<RemovedLine>,
}

/// Drops every line matching any of its patterns.
#[derive(Debug, Clone, Default)]
pub struct Pruner {
    patterns: Vec<Regex>,
}

impl Pruner {
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| {
                let p = p.as_ref();
                Regex::new(p).map_err(|source| GuardError::Pattern {
                    pattern: p.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn prune<S: AsRef<str>>(&self, source: &[S]) -> PruneOutput {
        let mut lines = Vec::with_capacity(source.len());
        let mut removed = Vec::new();

        for (idx, line) in source.iter().enumerate() {
            let line = line.as_ref();
            if self.patterns.iter().any(|re| re.is_match(line)) {
                removed.push(RemovedLine {
                    line: idx + 1,
                    text: line.to_string(),
                });
            } else {
                lines.push(line.to_string());
            }
        }

        PruneOutput { lines, removed }
    }
}
