//! # ddl-guard
//!
//! Make generated PostgreSQL migrations safe to run twice.
//!
//! ```
//! use ddl_guard::wrap;
//!
//! let out = wrap(&["CREATE INDEX \"Foo_idx\" ON \"Foo\"(id);"]);
//! assert_eq!(out.lines[0], "DO $$ BEGIN");
//! assert_eq!(out.lines[3], "    WHEN duplicate_object THEN null;");
//! ```
//!
//! Every pass is a pure function over lines; file handling lives in
//! [`migration_file`].

pub mod audit;
pub mod codes;
pub mod config;
pub mod error;
pub mod handlers;
pub mod migration_file;
pub mod prune;
pub mod statement;
pub mod wrapper;

pub use audit::{audit, Audit};
pub use codes::ErrorCodes;
pub use config::Config;
pub use error::{GuardError, Result};
pub use handlers::{realign, Mismatch, RealignOutput};
pub use migration_file::MigrationFile;
pub use prune::{PruneOutput, Pruner, RemovedLine};
pub use statement::StatementKind;
pub use wrapper::{wrap, Unresolved, WrapOutput, WrapStats, Wrapper};
