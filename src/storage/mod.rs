//! Persistence: run checkpoints in SQLite, reports as Markdown files with a
//! JSON index beside them.

pub mod database;
pub mod report_index;
pub mod report_store;

pub use database::{Database, PoolConfig, RunRow, SharedDatabase};
pub use report_index::{ReportEntry, ReportIndex, ReportStats};
pub use report_store::{ReportStore, SavedReport, file_name, preview, sanitize_request};
