//! Run report: one outcome per source file, persisted as JSON.

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tickshelf_core::writer::PartitionCommit;

/// Where a file's processing stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// File missing or not parseable as CSV.
    SourceRead,
    /// Header lacks a required column.
    SchemaMismatch,
    /// Listing existing partitions failed.
    CatalogRead,
    /// A partition could not be serialized.
    Encode,
    /// A partition commit was rejected by the store.
    Write,
    /// Anything else, including panics.
    Unhandled,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    Synced,
    /// `partitions` lists the `<SYMBOL>/<date>` keys a real run would commit.
    Previewed { partitions: Vec<String>, preview: String },
    Failed { kind: FailureKind, error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileOutcome {
    pub file_name: String,
    pub symbol: String,
    #[serde(flatten)]
    pub status: FileStatus,
    pub rows_read: usize,
    pub rows_dropped: usize,
    pub rows_skipped: usize,
    /// Partitions committed before the file finished or failed.
    pub committed: Vec<PartitionCommit>,
}

impl FileOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self.status, FileStatus::Failed { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub dry_run: bool,
    pub outcomes: Vec<FileOutcome>,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_failed()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failed()).count()
    }

    pub fn previewed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, FileStatus::Previewed { .. }))
            .count()
    }

    pub fn partitions_written(&self) -> usize {
        self.outcomes.iter().map(|o| o.committed.len()).sum()
    }

    pub fn rows_read(&self) -> usize {
        self.outcomes.iter().map(|o| o.rows_read).sum()
    }

    pub fn rows_dropped(&self) -> usize {
        self.outcomes.iter().map(|o| o.rows_dropped).sum()
    }

    pub fn rows_skipped(&self) -> usize {
        self.outcomes.iter().map(|o| o.rows_skipped).sum()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }

    pub fn outcome(&self, symbol: &str) -> Option<&FileOutcome> {
        self.outcomes.iter().find(|o| o.symbol == symbol)
    }

    /// Write the report to `<dir>/runs/<started_at>.json`.
    pub fn save(&self, dir: &Path) -> anyhow::Result<PathBuf> {
        let runs = dir.join("runs");
        fs::create_dir_all(&runs)
            .with_context(|| format!("failed to create {}", runs.display()))?;

        let path = runs.join(format!("{}.json", self.started_at.format("%Y%m%dT%H%M%S%.3fZ")));
        let json = serde_json::to_string_pretty(self).context("failed to serialize run report")?;
        fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }
}
