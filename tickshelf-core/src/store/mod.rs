//! Partition store abstraction.
//!
//! The pipeline only needs two things from remote storage: a delimiter-grouped
//! listing that may be paginated, and a whole-object put with replace
//! semantics. `PartitionStore` is that seam. Two implementations live here:
//! - `MemoryStore`: in-process, configurable page size, used by tests and dry runs
//! - `ObjectStoreBackend`: any `object_store` backend (S3, local filesystem, in-memory)

pub mod layout;
pub mod memory;
pub mod object;

pub use layout::{PartitionLayout, PARTITION_FILE};
pub use memory::MemoryStore;
pub use object::{ObjectStoreBackend, StoreLocation};

/// One page of a delimiter-grouped listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    /// Child "directories" directly under the listed prefix, as full paths.
    pub common_prefixes: Vec<String>,
    /// Token for the next page; `None` once the listing is exhausted.
    pub continuation: Option<String>,
}

/// Remote storage for committed partitions.
pub trait PartitionStore: Send + Sync {
    /// Human-readable location, for logs.
    fn name(&self) -> &str;

    /// List the common prefixes directly under `prefix`, one page at a time.
    fn list_page(&self, prefix: &str, continuation: Option<&str>) -> Result<ListPage, StoreError>;

    /// Write `payload` at `path`, replacing anything already there.
    fn put(&self, path: &str, payload: Vec<u8>) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("listing {prefix} failed: {reason}")]
    List { prefix: String, reason: String },

    #[error("put {path} failed: {reason}")]
    Put { path: String, reason: String },

    #[error("invalid object path {path}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("unsupported store location: {0}")]
    UnsupportedLocation(String),

    #[error("store setup failed: {0}")]
    Setup(String),
}
