//! Tickshelf Runner: sync orchestration over `tickshelf-core`.
//!
//! This crate provides:
//! - Layered configuration (TOML file, environment, CLI overrides)
//! - The compute context: store, worker pool and I/O runtime, scoped to one run
//! - Source discovery for `archived_<SYMBOL>_results.csv` files
//! - The per-file pipeline with failure isolation
//! - Run reports and dry-run previews

pub mod config;
pub mod context;
pub mod discovery;
pub mod pipeline;
pub mod preview;
pub mod report;

pub use config::{ConfigError, ConfigOverrides, SyncConfig};
pub use context::{ComputeContext, ContextError};
pub use discovery::{discover_sources, symbol_from_file_name, DiscoveryError, SourceFile};
pub use pipeline::{process_file, run_sync, SyncSettings};
pub use preview::render_preview;
pub use report::{FailureKind, FileOutcome, FileStatus, RunReport};

impl From<&SyncConfig> for SyncSettings {
    fn from(config: &SyncConfig) -> Self {
        Self {
            layout: tickshelf_core::store::PartitionLayout::new(&config.prefix),
            dry_run: config.dry_run,
            preview_rows: config.preview_rows,
        }
    }
}
