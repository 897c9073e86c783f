//! Database error codes swallowed by each guard.

use serde::{Deserialize, Serialize};

use crate::statement::StatementKind;

/// PostgreSQL condition raised when a relation already exists.
pub const DUPLICATE_TABLE: &str = "duplicate_table";
/// PostgreSQL condition raised when any other object already exists.
pub const DUPLICATE_OBJECT: &str = "duplicate_object";

/// Per-kind lookup of the condition a guard block catches.
///
/// The defaults follow what PostgreSQL actually raises: `CREATE TABLE`
/// fails with `duplicate_table`, while indexes and enum types fail with
/// `duplicate_object`. Override individual entries from config when a
/// database disagrees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorCodes {
    pub table: String,
    pub index: String,
    pub unique_index: String,
    pub enum_type: String,
}

impl Default for ErrorCodes {
    fn default() -> Self {
        Self {
            table: DUPLICATE_TABLE.to_string(),
            index: DUPLICATE_OBJECT.to_string(),
            unique_index: DUPLICATE_OBJECT.to_string(),
            enum_type: DUPLICATE_OBJECT.to_string(),
        }
    }
}

impl ErrorCodes {
    /// Code expected in the handler for a statement of `kind`.
    pub fn for_kind(&self, kind: StatementKind) -> &str {
        match kind {
            StatementKind::Table => &self.table,
            StatementKind::Index => &self.index,
            StatementKind::UniqueIndex => &self.unique_index,
            StatementKind::Enum => &self.enum_type,
        }
    }

    /// Whether `code` is one of the "already exists" conditions this table
    /// knows about, or one of the PostgreSQL built-ins.
    pub fn is_known(&self, code: &str) -> bool {
        [
            DUPLICATE_TABLE,
            DUPLICATE_OBJECT,
            self.table.as_str(),
            self.index.as_str(),
            self.unique_index.as_str(),
            self.enum_type.as_str(),
        ]
        .iter()
        .any(|known| known.eq_ignore_ascii_case(code))
    }
}
