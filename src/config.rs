//! Configuration file handling.
//!
//! # Configuration Format
//!
//! ```toml
//! indent = 4                         # spaces used inside guard blocks
//! latest_dir = "prisma/migrations"   # used when no path is given
//! prune = ['^DROP INDEX "Task_tenantId_idx";$']
//!
//! [codes]
//! table = "duplicate_table"
//! index = "duplicate_object"
//! unique_index = "duplicate_object"
//! enum_type = "duplicate_object"
//! ```
//!
//! Lookup order: an explicit `--config` path, `./ddl-guard.toml`, then
//! `<config_dir>/ddl-guard/config.toml`. Missing files fall back to defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::codes::ErrorCodes;
use crate::error::{GuardError, Result};
use crate::prune::Pruner;
use crate::wrapper::Wrapper;

pub const FILE_NAME: &str = "ddl-guard.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Spaces used to indent statements inside a guard block.
    pub indent: usize,

    /// Error codes caught per statement kind.
    pub codes: ErrorCodes,

    /// Regular expressions for lines `prune` removes.
    pub prune: Vec<String>,

    /// Directory of timestamped migrations, searched when no file is given.
    pub latest_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            indent: 4,
            codes: ErrorCodes::default(),
            prune: Vec::new(),
            latest_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| GuardError::io(path, e))?;
        toml::from_str(&content).map_err(|source| GuardError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve the configuration using the documented lookup order.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let local = PathBuf::from(FILE_NAME);
        if local.is_file() {
            return Self::load(&local);
        }
        match Self::user_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// `<config_dir>/ddl-guard/config.toml`
    pub fn user_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("ddl-guard").join("config.toml"))
    }

    pub fn wrapper(&self) -> Wrapper {
        Wrapper::new(self.codes.clone()).with_indent(self.indent)
    }

    /// Build a pruner from the configured patterns plus `extra`.
    pub fn pruner(&self, extra: &[String]) -> Result<Pruner> {
        Pruner::new(self.prune.iter().chain(extra))
    }
}
