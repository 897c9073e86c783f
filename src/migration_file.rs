//! Reading, backing up and rewriting a migration file.

use std::path::{Path, PathBuf};

use crate::error::{GuardError, Result};

/// File name generated inside each timestamped migration directory.
pub const MIGRATION_FILE: &str = "migration.sql";

/// A migration file loaded into memory.
#[derive(Debug, Clone)]
pub struct MigrationFile {
    path: PathBuf,
    original: String,
    lines: Vec<String>,
}

impl MigrationFile {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let original = std::fs::read_to_string(&path).map_err(|e| GuardError::io(&path, e))?;
        let lines = original.lines().map(str::to_string).collect();
        Ok(Self {
            path,
            original,
            lines,
        })
    }

    /// Path of the newest `migration.sql` below `dir`.
    ///
    /// Migration directories are prefixed with a timestamp
    /// (`20240101120000_init`), so the greatest name is the latest.
    pub fn latest_in(dir: &Path) -> Result<PathBuf> {
        let entries = std::fs::read_dir(dir).map_err(|e| GuardError::io(dir, e))?;
        let mut latest: Option<PathBuf> = None;

        for entry in entries {
            let entry = entry.map_err(|e| GuardError::io(dir, e))?;
            let candidate = entry.path().join(MIGRATION_FILE);
            if !candidate.is_file() {
                continue;
            }
            if latest.as_ref().is_none_or(|current| candidate > *current) {
                latest = Some(candidate);
            }
        }

        latest.ok_or_else(|| GuardError::NoMigration {
            dir: dir.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Whether `lines` differ from what was read.
    pub fn is_changed(&self, lines: &[String]) -> bool {
        self.lines != lines
    }

    /// Copy the original content to `<file>.<YYYYmmddHHMMSS>.bak` beside it.
    pub fn backup(&self) -> Result<PathBuf> {
        let stamp = chrono::Local::now().format("%Y%m%d%H%M%S");
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| MIGRATION_FILE.to_string());
        let backup = self.path.with_file_name(format!("{}.{}.bak", file_name, stamp));
        std::fs::write(&backup, &self.original).map_err(|e| GuardError::io(&backup, e))?;
        Ok(backup)
    }

    /// Replace the file's content with `lines`.
    pub fn write(&self, lines: &[String]) -> Result<()> {
        self.write_to(&self.path, lines)
    }

    /// Write `lines` to `path`, keeping the original's trailing newline.
    pub fn write_to(&self, path: &Path, lines: &[String]) -> Result<()> {
        std::fs::write(path, self.render(lines)).map_err(|e| GuardError::io(path, e))
    }

    fn render(&self, lines: &[String]) -> String {
        let mut content = lines.join("\n");
        if self.original.ends_with('\n') && !lines.is_empty() {
            content.push('\n');
        }
        content
    }
}
