//! Database Layer with Connection Pooling
//!
//! SQLite store for run checkpoints:
//! - Connection pooling via r2d2
//! - WAL mode for concurrent readers while a run is writing
//! - Schema version tracked in `user_version`

use std::path::Path;
use std::sync::Arc;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OptionalExtension, params};

use crate::types::{RapportError, Result, ResultExt};

/// Shared database handle for async contexts.
pub type SharedDatabase = Arc<Database>;

const SCHEMA: &str = include_str!("schema.sql");

/// Current schema version
const SCHEMA_VERSION: u32 = 1;

/// One row of the `runs` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRow {
    pub id: String,
    pub request: String,
    pub status: String,
    pub pending_stage: Option<String>,
    pub state_json: String,
    pub last_error: Option<String>,
    pub started_at: String,
    pub updated_at: String,
}

/// Connection pool configuration
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum number of connections in the pool
    pub max_size: u32,
    /// Minimum idle connections to keep ready
    pub min_idle: u32,
    /// Timeout for acquiring a connection (seconds)
    pub connection_timeout_secs: u64,
}

impl Default for PoolConfig {
    /// One run writes at a time; a handful of connections is plenty
    fn default() -> Self {
        Self {
            max_size: 4,
            min_idle: 1,
            connection_timeout_secs: 30,
        }
    }
}

/// Thread-safe database with connection pooling.
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    /// Open database with connection pooling at the specified path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_config(path, PoolConfig::default())
    }

    /// Open database with custom pool configuration.
    pub fn open_with_config<P: AsRef<Path>>(path: P, config: PoolConfig) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let manager =
            SqliteConnectionManager::file(path.as_ref()).with_init(Self::configure_connection);

        let pool = Pool::builder()
            .max_size(config.max_size)
            .min_idle(Some(config.min_idle))
            .connection_timeout(std::time::Duration::from_secs(
                config.connection_timeout_secs,
            ))
            .build(manager)
            .map_err(|e| {
                RapportError::Storage(format!("Failed to create connection pool: {}", e))
            })?;

        Ok(Self { pool })
    }

    /// Open an in-memory database for testing.
    pub fn open_in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory();

        let pool = Pool::builder().max_size(1).build(manager).map_err(|e| {
            RapportError::Storage(format!("Failed to create in-memory pool: {}", e))
        })?;

        Ok(Self { pool })
    }

    fn configure_connection(conn: &mut Connection) -> std::result::Result<(), rusqlite::Error> {
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
            "#,
        )?;
        Ok(())
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        self.pool.get().map_err(|e| {
            RapportError::Storage(format!("Failed to acquire database connection: {}", e))
        })
    }

    /// Initialize database schema.
    pub fn initialize(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(SCHEMA)
            .with_context("Failed to initialize database schema")?;

        let current: u32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap_or(0);
        if current < SCHEMA_VERSION {
            conn.pragma_update(None, "user_version", SCHEMA_VERSION)
                .with_context("Failed to set schema version")?;
        }
        Ok(())
    }

    /// Execute a single SQL statement.
    pub fn execute(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<usize> {
        let conn = self.conn()?;
        conn.execute(sql, params).with_context("Failed to execute SQL")
    }

    // =========================================================================
    // Runs
    // =========================================================================

    /// Insert or overwrite a run row; `started_at` is kept from the first insert.
    pub fn upsert_run(&self, row: &RunRow) -> Result<()> {
        self.conn()?
            .execute(
                "INSERT INTO runs
                 (id, request, status, pending_stage, state_json, last_error, started_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(id) DO UPDATE SET
                    status = excluded.status,
                    pending_stage = excluded.pending_stage,
                    state_json = excluded.state_json,
                    last_error = excluded.last_error,
                    updated_at = excluded.updated_at",
                params![
                    row.id,
                    row.request,
                    row.status,
                    row.pending_stage,
                    row.state_json,
                    row.last_error,
                    row.started_at,
                    row.updated_at,
                ],
            )
            .with_context("Failed to save run")?;

        tracing::debug!("Saved run {} ({})", row.id, row.status);
        Ok(())
    }

    pub fn load_run(&self, id: &str) -> Result<Option<RunRow>> {
        self.conn()?
            .query_row(
                "SELECT id, request, status, pending_stage, state_json, last_error, started_at, updated_at
                 FROM runs WHERE id = ?1",
                params![id],
                Self::map_run_row,
            )
            .optional()
            .with_context("Failed to load run")
    }

    /// Record a failure without touching the stored state
    pub fn mark_run_failed(&self, id: &str, error: &str) -> Result<bool> {
        let now = chrono::Utc::now().to_rfc3339();
        let changed = self
            .conn()?
            .execute(
                "UPDATE runs SET status = 'failed', last_error = ?2, updated_at = ?3 WHERE id = ?1",
                params![id, error, now],
            )
            .with_context("Failed to mark run as failed")?;
        Ok(changed > 0)
    }

    /// Most recently updated runs first
    pub fn list_runs(&self, limit: usize) -> Result<Vec<RunRow>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, request, status, pending_stage, state_json, last_error, started_at, updated_at
                 FROM runs ORDER BY updated_at DESC LIMIT ?1",
            )
            .with_context("Failed to prepare run listing")?;

        let rows = stmt
            .query_map(params![limit as i64], Self::map_run_row)
            .with_context("Failed to list runs")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .with_context("Failed to read run row")?;
        Ok(rows)
    }

    /// Delete every run, returning how many were removed
    pub fn delete_runs(&self) -> Result<usize> {
        self.execute("DELETE FROM runs", &[])
    }

    fn map_run_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RunRow> {
        Ok(RunRow {
            id: row.get(0)?,
            request: row.get(1)?,
            status: row.get(2)?,
            pending_stage: row.get(3)?,
            state_json: row.get(4)?,
            last_error: row.get(5)?,
            started_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}
