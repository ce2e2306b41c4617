//! Run Checkpoints
//!
//! Persists the whole [`RunState`] after every completed stage so a failed
//! run can continue from its first incomplete stage.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;

use super::contract::Stage;
use super::state::RunState;
use crate::storage::{Database, RunRow, SharedDatabase};
use crate::types::{RapportError, Result, RunId};

// =============================================================================
// Run Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Listing entry for `status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub run_id: RunId,
    pub request: String,
    pub status: RunStatus,
    pub pending_stage: Option<Stage>,
    pub last_error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RunSummary {
    fn from_state(state: &RunState, status: RunStatus, last_error: Option<String>) -> Self {
        Self {
            run_id: state.run_id.clone(),
            request: state.request().to_string(),
            status,
            pending_stage: state.pending(),
            last_error,
            started_at: state.started_at,
            updated_at: Utc::now(),
        }
    }
}

// =============================================================================
// Checkpointer Trait
// =============================================================================

/// Storage for run checkpoints
pub trait Checkpointer: Send + Sync {
    /// Overwrite the stored state of `state.run_id`
    fn save(&self, state: &RunState, status: RunStatus) -> Result<()>;

    fn load(&self, run_id: &RunId) -> Result<Option<RunState>>;

    /// Flag the run as failed, keeping its last saved state
    fn mark_failed(&self, run_id: &RunId, error: &str) -> Result<()>;

    /// Most recently updated runs first
    fn list(&self, limit: usize) -> Result<Vec<RunSummary>>;
}

pub type SharedCheckpointer = Arc<dyn Checkpointer>;

// =============================================================================
// In-Memory Checkpointer
// =============================================================================

/// Process-local checkpoints
#[derive(Default)]
pub struct MemoryCheckpointer {
    runs: DashMap<RunId, (RunState, RunSummary)>,
}

impl MemoryCheckpointer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self, run_id: &RunId) -> Option<RunStatus> {
        self.runs.get(run_id).map(|entry| entry.1.status)
    }
}

impl Checkpointer for MemoryCheckpointer {
    fn save(&self, state: &RunState, status: RunStatus) -> Result<()> {
        let summary = RunSummary::from_state(state, status, None);
        self.runs
            .insert(state.run_id.clone(), (state.clone(), summary));
        Ok(())
    }

    fn load(&self, run_id: &RunId) -> Result<Option<RunState>> {
        Ok(self.runs.get(run_id).map(|entry| entry.0.clone()))
    }

    fn mark_failed(&self, run_id: &RunId, error: &str) -> Result<()> {
        if let Some(mut entry) = self.runs.get_mut(run_id) {
            entry.1.status = RunStatus::Failed;
            entry.1.last_error = Some(error.to_string());
            entry.1.updated_at = Utc::now();
        }
        Ok(())
    }

    fn list(&self, limit: usize) -> Result<Vec<RunSummary>> {
        let mut summaries: Vec<RunSummary> =
            self.runs.iter().map(|entry| entry.1.clone()).collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        summaries.truncate(limit);
        Ok(summaries)
    }
}

// =============================================================================
// SQLite Checkpointer
// =============================================================================

/// Checkpoints in the project's `runs.db`
pub struct SqliteCheckpointer {
    db: SharedDatabase,
}

impl SqliteCheckpointer {
    pub fn new(db: SharedDatabase) -> Self {
        Self { db }
    }

    /// Open (creating if needed) the database at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Database::open(path)?;
        db.initialize()?;
        Ok(Self::new(Arc::new(db)))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn summary_from_row(row: RunRow) -> Result<RunSummary> {
        let status = RunStatus::parse(&row.status).ok_or_else(|| {
            RapportError::Storage(format!("Unknown run status '{}' for {}", row.status, row.id))
        })?;
        Ok(RunSummary {
            run_id: RunId::new(row.id),
            request: row.request,
            status,
            pending_stage: row.pending_stage.as_deref().and_then(Stage::from_id),
            last_error: row.last_error,
            started_at: parse_timestamp(&row.started_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| RapportError::Storage(format!("Invalid timestamp '{}': {}", raw, e)))
}

impl Checkpointer for SqliteCheckpointer {
    fn save(&self, state: &RunState, status: RunStatus) -> Result<()> {
        self.db.upsert_run(&RunRow {
            id: state.run_id.to_string(),
            request: state.request().to_string(),
            status: status.as_str().to_string(),
            pending_stage: state.pending().map(|s| s.id().to_string()),
            state_json: serde_json::to_string(state)?,
            last_error: None,
            started_at: state.started_at.to_rfc3339(),
            updated_at: Utc::now().to_rfc3339(),
        })
    }

    fn load(&self, run_id: &RunId) -> Result<Option<RunState>> {
        match self.db.load_run(run_id.as_str())? {
            Some(row) => Ok(Some(serde_json::from_str(&row.state_json)?)),
            None => Ok(None),
        }
    }

    fn mark_failed(&self, run_id: &RunId, error: &str) -> Result<()> {
        if !self.db.mark_run_failed(run_id.as_str(), error)? {
            tracing::debug!("No checkpoint to mark failed for {}", run_id);
        }
        Ok(())
    }

    fn list(&self, limit: usize) -> Result<Vec<RunSummary>> {
        self.db
            .list_runs(limit)?
            .into_iter()
            .map(Self::summary_from_row)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::state::StageUpdate;
    use crate::types::Message;
    use tempfile::TempDir;

    fn outlined_state(id: &str) -> RunState {
        let mut state = RunState::new(RunId::new(id), "Rédige un rapport sur X");
        state.apply(StageUpdate {
            stage: Stage::Outline,
            messages: vec![Message::user("p"), Message::model("{\"title\": \"X\"}")],
            value: "{\"title\": \"X\"}".to_string(),
        });
        state.advance(Some(Stage::Research));
        state
    }

    fn exercise(checkpointer: &dyn Checkpointer) {
        let state = outlined_state("cli-a");
        checkpointer.save(&state, RunStatus::Running).unwrap();

        let loaded = checkpointer.load(&state.run_id).unwrap().unwrap();
        assert_eq!(loaded, state);
        assert!(checkpointer.load(&RunId::new("cli-missing")).unwrap().is_none());

        checkpointer.mark_failed(&state.run_id, "network down").unwrap();
        let runs = checkpointer.list(10).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].status, RunStatus::Failed);
        assert_eq!(runs[0].pending_stage, Some(Stage::Research));
        assert_eq!(runs[0].last_error.as_deref(), Some("network down"));
        assert_eq!(runs[0].request, "Rédige un rapport sur X");

        // Failure keeps the saved state intact
        assert_eq!(checkpointer.load(&state.run_id).unwrap().unwrap(), state);

        // Missing run is not an error
        checkpointer.mark_failed(&RunId::new("cli-missing"), "x").unwrap();
    }

    #[test]
    fn test_memory_checkpointer() {
        let checkpointer = MemoryCheckpointer::new();
        exercise(&checkpointer);
        assert_eq!(
            checkpointer.status(&RunId::new("cli-a")),
            Some(RunStatus::Failed)
        );
    }

    #[test]
    fn test_sqlite_checkpointer() {
        let temp_dir = TempDir::new().unwrap();
        let checkpointer = SqliteCheckpointer::open(temp_dir.path().join("runs.db")).unwrap();
        exercise(&checkpointer);
    }

    #[test]
    fn test_sqlite_save_clears_previous_error() {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        let checkpointer = SqliteCheckpointer::new(Arc::new(db));

        let state = outlined_state("cli-b");
        checkpointer.save(&state, RunStatus::Running).unwrap();
        checkpointer.mark_failed(&state.run_id, "boom").unwrap();
        checkpointer.save(&state, RunStatus::Completed).unwrap();

        let runs = checkpointer.list(5).unwrap();
        assert_eq!(runs[0].status, RunStatus::Completed);
        assert_eq!(runs[0].last_error, None);
    }

    #[test]
    fn test_list_respects_limit() {
        let checkpointer = MemoryCheckpointer::new();
        for i in 0..4 {
            checkpointer
                .save(&outlined_state(&format!("cli-{}", i)), RunStatus::Running)
                .unwrap();
        }
        assert_eq!(checkpointer.list(2).unwrap().len(), 2);
    }

    #[test]
    fn test_status_parse() {
        for status in [RunStatus::Running, RunStatus::Completed, RunStatus::Failed] {
            assert_eq!(RunStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(RunStatus::parse("paused"), None);
    }
}
