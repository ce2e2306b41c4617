//! CLI Common Utilities
//!
//! Shared initialization for command handlers.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::{Config, ConfigLoader};
use crate::report::SqliteCheckpointer;
use crate::types::{RapportError, Result};

/// Checkpoint database inside the state directory
pub const RUNS_DB: &str = "runs.db";

/// Command execution context
pub struct CommandContext {
    pub config: Config,
}

impl CommandContext {
    /// Load the merged configuration
    pub fn load() -> Result<Self> {
        Ok(Self {
            config: ConfigLoader::load()?,
        })
    }

    pub fn runs_db_path(&self) -> PathBuf {
        self.config.storage.state_dir.join(RUNS_DB)
    }

    /// Open (creating if needed) the checkpoint store
    pub fn checkpointer(&self) -> Result<SqliteCheckpointer> {
        SqliteCheckpointer::open(self.runs_db_path())
    }

    /// Checkpoint store, only if a run was ever recorded
    pub fn existing_checkpointer(&self) -> Result<Option<SqliteCheckpointer>> {
        let path = self.runs_db_path();
        if !path.exists() {
            return Ok(None);
        }
        SqliteCheckpointer::open(path).map(Some)
    }
}

/// Platform command that opens `path` in the default application
pub fn open_command(path: &Path) -> (&'static str, Vec<String>) {
    let path = path.display().to_string();
    if cfg!(target_os = "macos") {
        ("open", vec![path])
    } else if cfg!(target_os = "windows") {
        ("cmd", vec!["/C".into(), "start".into(), String::new(), path])
    } else {
        ("xdg-open", vec![path])
    }
}

/// Spawn the opener without waiting for it
pub fn open_in_default_app(path: &Path) -> Result<()> {
    let (program, args) = open_command(path);
    Command::new(program).args(&args).spawn().map_err(|e| {
        RapportError::Io(std::io::Error::new(
            e.kind(),
            format!("{} {}: {}", program, args.join(" "), e),
        ))
    })?;
    Ok(())
}
