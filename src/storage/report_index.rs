//! Report Index
//!
//! `index.json` next to the saved reports, listing every registered report:
//!
//! ```json
//! {"reports": [{"id": 1, "filepath": "...", "filename": "...", "query": "...",
//!               "created_at": "...", "size": 1234, "metadata": {}}]}
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::constants::report::INDEX_FILE;
use crate::types::{Result, ResultExt};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub id: u64,
    pub filepath: String,
    pub filename: String,
    pub query: String,
    /// Local time, ISO 8601 with microseconds
    pub created_at: String,
    pub size: u64,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct IndexFile {
    #[serde(default)]
    reports: Vec<ReportEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportStats {
    pub total: usize,
    pub total_size: u64,
    pub average_size: u64,
    pub oldest: Option<String>,
    pub newest: Option<String>,
    /// Entries whose file is Markdown
    pub markdown: usize,
}

pub struct ReportIndex {
    path: PathBuf,
    index: IndexFile,
}

impl ReportIndex {
    /// Load the index of `reports_dir`, creating the directory if needed
    pub fn open(reports_dir: impl AsRef<Path>) -> Result<Self> {
        let reports_dir = reports_dir.as_ref();
        fs::create_dir_all(reports_dir)?;

        let path = reports_dir.join(INDEX_FILE);
        let index = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            IndexFile::default()
        };

        Ok(Self { path, index })
    }

    fn persist(&self) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.index)?;
        fs::write(&self.path, content)
            .with_context_fn(|| format!("Failed to write {}", self.path.display()))
    }

    /// Register a saved report, returning its id
    pub fn add(&mut self, filepath: &Path, query: &str, metadata: serde_json::Value) -> Result<u64> {
        let id = self.index.reports.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        let entry = ReportEntry {
            id,
            filepath: filepath.to_string_lossy().to_string(),
            filename: filepath
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            query: query.to_string(),
            created_at: Local::now()
                .naive_local()
                .format("%Y-%m-%dT%H:%M:%S%.6f")
                .to_string(),
            size: fs::metadata(filepath).map(|m| m.len()).unwrap_or(0),
            metadata,
        };

        self.index.reports.push(entry);
        self.persist()?;
        Ok(id)
    }

    /// Newest first
    pub fn list(&self, limit: usize) -> Vec<&ReportEntry> {
        let mut reports: Vec<&ReportEntry> = self.index.reports.iter().collect();
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        reports.truncate(limit);
        reports
    }

    pub fn get(&self, id: u64) -> Option<&ReportEntry> {
        self.index.reports.iter().find(|r| r.id == id)
    }

    /// Remove the entry and its file; `false` when the id is unknown
    pub fn delete(&mut self, id: u64) -> Result<bool> {
        let Some(entry) = self.get(id) else {
            return Ok(false);
        };

        let file = PathBuf::from(&entry.filepath);
        if file.exists() {
            fs::remove_file(&file)?;
        }

        self.index.reports.retain(|r| r.id != id);
        self.persist()?;
        Ok(true)
    }

    /// Delete everything but the `keep_last` newest reports
    pub fn clean(&mut self, keep_last: usize) -> Result<usize> {
        let stale: Vec<u64> = self
            .list(usize::MAX)
            .into_iter()
            .skip(keep_last)
            .map(|r| r.id)
            .collect();

        for id in &stale {
            self.delete(*id)?;
        }
        Ok(stale.len())
    }

    /// Copy a report into `export_dir` under a comment block naming its origin.
    ///
    /// `None` when the id is unknown or its file is gone.
    pub fn export(&self, id: u64, export_dir: impl AsRef<Path>) -> Result<Option<PathBuf>> {
        let Some(entry) = self.get(id) else {
            return Ok(None);
        };
        let source = Path::new(&entry.filepath);
        if !source.exists() {
            return Ok(None);
        }

        let export_dir = export_dir.as_ref();
        fs::create_dir_all(export_dir)?;

        let now = Local::now();
        let dest = export_dir.join(format!(
            "export_{}_{}",
            now.format("%Y%m%d_%H%M%S"),
            entry.filename
        ));
        let content = fs::read_to_string(source)?;
        let header = format!(
            "<!--\nRAPPORT EXPORTÉ\nDate export: {}\nSource: {}\nRequête originale: {}\n-->\n\n",
            now.format("%Y-%m-%d %H:%M:%S"),
            entry.filepath,
            entry.query
        );
        fs::write(&dest, format!("{}{}", header, content))?;
        Ok(Some(dest))
    }

    pub fn statistics(&self) -> ReportStats {
        let reports = &self.index.reports;
        let total_size: u64 = reports.iter().map(|r| r.size).sum();

        ReportStats {
            total: reports.len(),
            total_size,
            average_size: if reports.is_empty() {
                0
            } else {
                total_size / reports.len() as u64
            },
            oldest: reports.iter().map(|r| r.created_at.clone()).min(),
            newest: reports.iter().map(|r| r.created_at.clone()).max(),
            markdown: reports.iter().filter(|r| r.filename.ends_with(".md")).count(),
        }
    }
}
