//! Per-file sync pipeline and the run loop.
//!
//! Files are processed one after another. For each file:
//! catalog snapshot → ingest → clean → delta filter → enrich → encode → commit.
//! Enrichment and encoding fan out over the context's worker pool; commits
//! are issued sequentially in ascending date order.
//!
//! Every file ends in a `FileOutcome`. Errors and panics stop at the file
//! boundary and never abort the run.

use chrono::Utc;
use rayon::prelude::*;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error, info, warn};

use tickshelf_core::catalog::{CatalogError, CatalogReader};
use tickshelf_core::data::{clean_observations, filter_new, DataIngestor, IngestError};
use tickshelf_core::enrich::Enricher;
use tickshelf_core::store::PartitionLayout;
use tickshelf_core::writer::{
    encode_partition, EncodedPartition, PartitionCommit, PartitionWriter, WriteError,
};

use crate::context::ComputeContext;
use crate::discovery::SourceFile;
use crate::preview::render_preview;
use crate::report::{FailureKind, FileOutcome, FileStatus, RunReport};

/// Per-run settings the pipeline reads.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub layout: PartitionLayout,
    pub dry_run: bool,
    pub preview_rows: usize,
}

impl SyncSettings {
    pub fn new(prefix: &str) -> Self {
        Self {
            layout: PartitionLayout::new(prefix),
            dry_run: false,
            preview_rows: 5,
        }
    }
}

/// Run every source file through the pipeline, in order.
pub fn run_sync(ctx: &ComputeContext, settings: &SyncSettings, sources: &[SourceFile]) -> RunReport {
    let started_at = Utc::now();
    info!(
        files = sources.len(),
        store = ctx.store().name(),
        prefix = settings.layout.prefix(),
        dry_run = settings.dry_run,
        "run started"
    );

    let outcomes: Vec<FileOutcome> = sources
        .iter()
        .map(|source| process_file(ctx, settings, source))
        .collect();

    let report = RunReport {
        started_at,
        finished_at: Utc::now(),
        dry_run: settings.dry_run,
        outcomes,
    };

    info!(
        succeeded = report.succeeded(),
        failed = report.failed(),
        partitions = report.partitions_written(),
        "run finished"
    );
    report
}

/// Process one file end to end. Never panics and never returns an error.
pub fn process_file(ctx: &ComputeContext, settings: &SyncSettings, source: &SourceFile) -> FileOutcome {
    let mut progress = FileProgress::default();

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        sync_file(ctx, settings, source, &mut progress)
    }));

    let status = match result {
        Ok(Ok(Completed::Synced)) => FileStatus::Synced,
        Ok(Ok(Completed::Previewed {
            partitions,
            preview,
        })) => FileStatus::Previewed {
            partitions,
            preview,
        },
        Ok(Err(failure)) => FileStatus::Failed {
            kind: failure.kind,
            error: failure.error,
        },
        Err(payload) => FileStatus::Failed {
            kind: FailureKind::Unhandled,
            error: panic_message(payload.as_ref()),
        },
    };

    let outcome = FileOutcome {
        file_name: source.file_name.clone(),
        symbol: source.symbol.clone(),
        status,
        rows_read: progress.rows_read,
        rows_dropped: progress.rows_dropped,
        rows_skipped: progress.rows_skipped,
        committed: progress.committed,
    };
    log_outcome(settings, &outcome);
    outcome
}

fn log_outcome(settings: &SyncSettings, outcome: &FileOutcome) {
    let file = outcome.file_name.as_str();
    let symbol = outcome.symbol.as_str();
    let target = settings.layout.symbol_prefix(symbol);

    match &outcome.status {
        FileStatus::Synced => info!(
            file,
            symbol,
            partitions = outcome.committed.len(),
            rows_dropped = outcome.rows_dropped,
            rows_skipped = outcome.rows_skipped,
            "sync complete for {file} -> {target}"
        ),
        FileStatus::Previewed { partitions, .. } => info!(
            file,
            symbol,
            partitions = partitions.len(),
            "dry run complete for {file} -> {target}"
        ),
        FileStatus::Failed { kind, error } => error!(
            file,
            symbol,
            kind = ?kind,
            committed = outcome.committed.len(),
            "sync failed for {file}: {error}"
        ),
    }
}

/// Counters that must survive a failure partway through a file.
#[derive(Debug, Default)]
struct FileProgress {
    rows_read: usize,
    rows_dropped: usize,
    rows_skipped: usize,
    committed: Vec<PartitionCommit>,
}

enum Completed {
    Synced,
    Previewed { partitions: Vec<String>, preview: String },
}

struct FileFailure {
    kind: FailureKind,
    error: String,
}

impl From<CatalogError> for FileFailure {
    fn from(e: CatalogError) -> Self {
        Self {
            kind: FailureKind::CatalogRead,
            error: e.to_string(),
        }
    }
}

impl From<IngestError> for FileFailure {
    fn from(e: IngestError) -> Self {
        let kind = match e {
            IngestError::Schema(_) => FailureKind::SchemaMismatch,
            IngestError::ReadFailed { .. } | IngestError::Column { .. } => FailureKind::SourceRead,
        };
        Self {
            kind,
            error: e.to_string(),
        }
    }
}

impl From<WriteError> for FileFailure {
    fn from(e: WriteError) -> Self {
        let kind = match e {
            WriteError::Store { .. } => FailureKind::Write,
            _ => FailureKind::Encode,
        };
        Self {
            kind,
            error: e.to_string(),
        }
    }
}

fn sync_file(
    ctx: &ComputeContext,
    settings: &SyncSettings,
    source: &SourceFile,
    progress: &mut FileProgress,
) -> Result<Completed, FileFailure> {
    let symbol = source.symbol.as_str();

    // Snapshot taken once; later commits in this run are not observed.
    let existing = CatalogReader::new(ctx.store(), &settings.layout).existing_partitions(symbol)?;
    debug!(symbol, existing = existing.len(), "catalog snapshot");

    let ingested = DataIngestor::new().ingest_csv(&source.path)?;
    if !ingested.ignored.unknown.is_empty() {
        warn!(file = %source.file_name, columns = ?ingested.ignored.unknown, "ignoring unknown columns");
    }

    let cleaned = clean_observations(symbol, &ingested.observations);
    progress.rows_read = cleaned.rows_read;
    progress.rows_dropped = cleaned.rows_dropped;
    debug!(symbol, read = cleaned.rows_read, dropped = cleaned.rows_dropped, "cleaned");

    let delta = filter_new(cleaned.records, &existing);
    progress.rows_skipped = delta.skipped;
    if !delta.skipped_dates.is_empty() {
        debug!(symbol, dates = ?delta.skipped_dates, "skipping materialized partitions");
    }

    let enricher = Enricher::new(source.file_name.as_str(), Utc::now().naive_utc());
    let partitions = ctx.install(|| enricher.enrich(symbol, delta.records));
    debug!(symbol, partitions = partitions.len(), "enriched");

    if settings.dry_run {
        let preview = render_preview(&partitions, settings.preview_rows)?;
        return Ok(Completed::Previewed {
            partitions: partitions.iter().map(|p| p.key.to_string()).collect(),
            preview,
        });
    }

    let encoded: Vec<EncodedPartition> = ctx.install(|| {
        partitions
            .par_iter()
            .map(encode_partition)
            .collect::<Result<Vec<_>, _>>()
    })?;

    let writer = PartitionWriter::new(ctx.store(), &settings.layout);
    for partition in encoded {
        let commit = writer.commit(partition)?;
        debug!(symbol, path = %commit.path, rows = commit.rows, hash = %commit.content_hash, "committed");
        progress.committed.push(commit);
    }

    Ok(Completed::Synced)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic with non-string payload".to_string()
    }
}
