//! Compute context for a sync run.
//!
//! Acquired once per run and passed by reference into every file's pipeline.
//! It owns the partition store, the rayon pool used for per-partition work,
//! and (for `object_store` backends) the tokio runtime that drives store I/O.
//! Everything is released when the context is dropped, whether the run
//! finished cleanly or files failed along the way.

use std::sync::Arc;
use thiserror::Error;
use tickshelf_core::store::{ObjectStoreBackend, PartitionStore, StoreError, StoreLocation};
use tokio::runtime::Runtime;
use tracing::{debug, info};

use crate::config::SyncConfig;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error("failed to start I/O runtime: {0}")]
    Runtime(String),

    #[error("failed to build worker pool: {0}")]
    Pool(String),
}

pub struct ComputeContext {
    store: Arc<dyn PartitionStore>,
    pool: rayon::ThreadPool,
    runtime: Option<Runtime>,
}

impl ComputeContext {
    /// Open the configured store and start the worker pool.
    pub fn acquire(config: &SyncConfig) -> Result<Self, ContextError> {
        let location = StoreLocation::parse(&config.bucket)?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("tickshelf-io")
            .enable_all()
            .build()
            .map_err(|e| ContextError::Runtime(e.to_string()))?;

        let backend = ObjectStoreBackend::for_location(&location, runtime.handle().clone())?;
        let pool = build_pool(config.workers)?;

        info!(store = %location, workers = pool.current_num_threads(), "compute context acquired");

        Ok(Self {
            store: Arc::new(backend),
            pool,
            runtime: Some(runtime),
        })
    }

    /// Context over an already-built store (tests, embedding).
    pub fn with_store(store: Arc<dyn PartitionStore>, workers: usize) -> Result<Self, ContextError> {
        let pool = build_pool(workers)?;
        debug!(store = store.name(), "compute context acquired");
        Ok(Self {
            store,
            pool,
            runtime: None,
        })
    }

    /// Acquire, run `f`, release. Release happens even if `f` panics.
    pub fn scoped<T, F>(config: &SyncConfig, f: F) -> Result<T, ContextError>
    where
        F: FnOnce(&ComputeContext) -> T,
    {
        let ctx = Self::acquire(config)?;
        Ok(f(&ctx))
    }

    pub fn store(&self) -> &dyn PartitionStore {
        self.store.as_ref()
    }

    /// Run `op` inside the context's worker pool.
    pub fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl Drop for ComputeContext {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
        info!(store = self.store.name(), "compute context released");
    }
}

fn build_pool(workers: usize) -> Result<rayon::ThreadPool, ContextError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("tickshelf-worker-{i}"))
        .build()
        .map_err(|e| ContextError::Pool(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickshelf_core::store::MemoryStore;

    #[test]
    fn with_store_honours_worker_count() {
        let ctx = ComputeContext::with_store(Arc::new(MemoryStore::new()), 2).unwrap();
        assert_eq!(ctx.workers(), 2);
        assert_eq!(ctx.install(|| rayon::current_num_threads()), 2);
        assert_eq!(ctx.store().name(), "memory://");
    }

    #[test]
    fn acquire_memory_location() {
        let config = SyncConfig {
            bucket: "memory://".into(),
            workers: 1,
            ..Default::default()
        };
        let listed = ComputeContext::scoped(&config, |ctx| {
            ctx.store().list_page("data/AAA/", None).map(|p| p.common_prefixes.len())
        })
        .unwrap()
        .unwrap();
        assert_eq!(listed, 0);
    }

    #[test]
    fn acquire_rejects_bad_location() {
        let config = SyncConfig {
            bucket: "gs://elsewhere".into(),
            ..Default::default()
        };
        assert!(matches!(
            ComputeContext::acquire(&config),
            Err(ContextError::Store(StoreError::UnsupportedLocation(_)))
        ));
    }
}
