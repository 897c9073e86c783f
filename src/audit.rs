//! Post-transformation check deciding whether output is safe to persist.

use serde::Serialize;

use crate::codes::ErrorCodes;
use crate::handlers::{self, Mismatch};
use crate::wrapper::{Unresolved, Wrapper};

/// What a text still needs before it can be re-run safely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Audit {
    /// Statements with known bounds that are not guarded.
    pub unwrapped: usize,
    /// Statements already inside a guard block.
    pub guarded: usize,
    pub mismatched_handlers: Vec<Mismatch>,
    pub unresolved: Vec<Unresolved>,
}

impl Audit {
    /// No unguarded statements and no wrong handler codes remain.
    /// Unresolved statements are reported but do not fail the audit.
    pub fn is_clean(&self) -> bool {
        self.unwrapped == 0 && self.mismatched_handlers.is_empty()
    }
}

pub fn audit<S: AsRef<str>>(source: &[S], codes: &ErrorCodes) -> Audit {
    let wrapped = Wrapper::new(codes.clone()).wrap(source);
    let realigned = handlers::realign(source, codes);
    Audit {
        unwrapped: wrapped.stats.total_wrapped(),
        guarded: wrapped.stats.already_wrapped,
        mismatched_handlers: realigned.fixed,
        unresolved: wrapped.stats.unresolved,
    }
}
