//! Errors raised by the I/O and configuration layers.
//!
//! The text passes themselves never fail: malformed statements are reported
//! through their stats instead.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur outside the pure transformation passes.
#[derive(Debug, Error)]
pub enum GuardError {
    /// Reading, copying or writing a migration file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for [`crate::config::Config`].
    #[error("invalid config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A prune pattern failed to compile.
    #[error("invalid pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// No timestamped migration directory with a `migration.sql` was found.
    #[error("no migration.sql found under {}", dir.display())]
    NoMigration { dir: PathBuf },
}

impl GuardError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GuardError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, GuardError>;
