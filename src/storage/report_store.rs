//! Report Files
//!
//! Writes a generated report as Markdown under the reports directory, named
//! after a sanitized slice of the request plus a timestamp.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::constants::report::{FILE_PREFIX, SLUG_MAX_CHARS, SLUG_SOURCE_CHARS};
use crate::types::{Result, ResultExt};

/// A report written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedReport {
    pub path: PathBuf,
    /// File size in bytes, header included
    pub size: u64,
    /// Newlines in the report body
    pub lines: usize,
    pub words: usize,
}

pub struct ReportStore {
    dir: PathBuf,
}

impl ReportStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save(&self, content: &str, request: &str) -> Result<SavedReport> {
        self.save_at(content, request, Local::now())
    }

    pub fn save_at(&self, content: &str, request: &str, now: DateTime<Local>) -> Result<SavedReport> {
        fs::create_dir_all(&self.dir)
            .with_context_fn(|| format!("Failed to create {}", self.dir.display()))?;

        let path = self.dir.join(file_name(request, now));
        let header = format!(
            "<!--\nRapport généré automatiquement\nDate: {}\nRequête: {}\n-->\n\n",
            now.format("%Y-%m-%d %H:%M:%S"),
            request
        );
        fs::write(&path, format!("{}{}", header, content))
            .with_context_fn(|| format!("Failed to write {}", path.display()))?;

        let size = fs::metadata(&path)?.len();
        tracing::info!("Saved report to {} ({} bytes)", path.display(), size);

        Ok(SavedReport {
            path,
            size,
            lines: content.matches('\n').count(),
            words: content.split_whitespace().count(),
        })
    }
}

/// Request slug used in file names.
///
/// Keeps alphanumerics and whitespace of the first characters, turns
/// everything else into `_`, joins words with `_` and caps the length.
pub fn sanitize_request(request: &str) -> String {
    let kept: String = request
        .chars()
        .take(SLUG_SOURCE_CHARS)
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                '_'
            }
        })
        .collect();

    kept.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .take(SLUG_MAX_CHARS)
        .collect()
}

pub fn file_name(request: &str, now: DateTime<Local>) -> String {
    format!(
        "{}_{}_{}.md",
        FILE_PREFIX,
        sanitize_request(request),
        now.format("%Y%m%d_%H%M%S")
    )
}

/// First `max_chars` characters with newlines flattened to spaces
pub fn preview(report: &str, max_chars: usize) -> String {
    report
        .chars()
        .take(max_chars)
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect()
}
