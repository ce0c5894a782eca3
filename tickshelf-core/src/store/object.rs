//! `object_store` adapter.
//!
//! The pipeline is synchronous, so every call is driven to completion on a
//! tokio runtime handle owned by the caller.

use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{ObjectStore, PutPayload};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Handle;

use super::{ListPage, PartitionStore, StoreError};

/// Where partitions are committed, parsed from the configured bucket string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// `s3://bucket` or a bare bucket name. Credentials come from the environment.
    S3 { bucket: String },
    /// `file:///abs/path`
    Local { root: PathBuf },
    /// `memory://`
    Memory,
}

impl StoreLocation {
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        let raw = raw.trim();
        if let Some(bucket) = raw.strip_prefix("s3://") {
            let bucket = bucket.trim_end_matches('/');
            if bucket.is_empty() || bucket.contains('/') {
                return Err(StoreError::UnsupportedLocation(raw.to_string()));
            }
            return Ok(Self::S3 {
                bucket: bucket.to_string(),
            });
        }
        if let Some(root) = raw.strip_prefix("file://") {
            if root.is_empty() {
                return Err(StoreError::UnsupportedLocation(raw.to_string()));
            }
            return Ok(Self::Local {
                root: PathBuf::from(root),
            });
        }
        if raw == "memory://" {
            return Ok(Self::Memory);
        }
        if raw.is_empty() || raw.contains("://") || raw.contains('/') {
            return Err(StoreError::UnsupportedLocation(raw.to_string()));
        }
        Ok(Self::S3 {
            bucket: raw.to_string(),
        })
    }
}

impl fmt::Display for StoreLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::S3 { bucket } => write!(f, "s3://{bucket}"),
            Self::Local { root } => write!(f, "file://{}", root.display()),
            Self::Memory => write!(f, "memory://"),
        }
    }
}

/// A `PartitionStore` over any `object_store` backend.
pub struct ObjectStoreBackend {
    name: String,
    store: Arc<dyn ObjectStore>,
    runtime: Handle,
}

impl fmt::Debug for ObjectStoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectStoreBackend<{}>", self.name)
    }
}

impl ObjectStoreBackend {
    pub fn new(name: impl Into<String>, store: Arc<dyn ObjectStore>, runtime: Handle) -> Self {
        Self {
            name: name.into(),
            store,
            runtime,
        }
    }

    /// Build the backend for a parsed location.
    pub fn for_location(location: &StoreLocation, runtime: Handle) -> Result<Self, StoreError> {
        let store: Arc<dyn ObjectStore> = match location {
            StoreLocation::S3 { bucket } => Arc::new(
                AmazonS3Builder::from_env()
                    .with_bucket_name(bucket)
                    .build()
                    .map_err(|e| StoreError::Setup(e.to_string()))?,
            ),
            StoreLocation::Local { root } => {
                std::fs::create_dir_all(root)
                    .map_err(|e| StoreError::Setup(format!("{}: {e}", root.display())))?;
                Arc::new(
                    LocalFileSystem::new_with_prefix(root)
                        .map_err(|e| StoreError::Setup(e.to_string()))?,
                )
            }
            StoreLocation::Memory => Arc::new(InMemory::new()),
        };
        Ok(Self::new(location.to_string(), store, runtime))
    }

    pub fn inner(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }
}

impl PartitionStore for ObjectStoreBackend {
    fn name(&self) -> &str {
        &self.name
    }

    /// `list_with_delimiter` follows the backend's continuation tokens itself,
    /// so the first page is already complete and a continued call is empty.
    fn list_page(&self, prefix: &str, continuation: Option<&str>) -> Result<ListPage, StoreError> {
        if continuation.is_some() {
            return Ok(ListPage::default());
        }

        let path = Path::parse(prefix).map_err(|e| StoreError::InvalidPath {
            path: prefix.to_string(),
            reason: e.to_string(),
        })?;
        let scope = if path.as_ref().is_empty() {
            None
        } else {
            Some(&path)
        };

        let listing = self
            .runtime
            .block_on(self.store.list_with_delimiter(scope))
            .map_err(|e| StoreError::List {
                prefix: prefix.to_string(),
                reason: e.to_string(),
            })?;

        let common_prefixes = listing
            .common_prefixes
            .iter()
            .map(|p| format!("{p}/"))
            .collect();

        Ok(ListPage {
            common_prefixes,
            continuation: None,
        })
    }

    fn put(&self, path: &str, payload: Vec<u8>) -> Result<(), StoreError> {
        let location = Path::parse(path).map_err(|e| StoreError::InvalidPath {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

        self.runtime
            .block_on(self.store.put(&location, PutPayload::from(payload)))
            .map_err(|e| StoreError::Put {
                path: path.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bucket_forms() {
        assert_eq!(
            StoreLocation::parse("s3://market-data").unwrap(),
            StoreLocation::S3 {
                bucket: "market-data".into()
            }
        );
        assert_eq!(
            StoreLocation::parse("market-data").unwrap(),
            StoreLocation::S3 {
                bucket: "market-data".into()
            }
        );
        assert_eq!(
            StoreLocation::parse("file:///tmp/shelf").unwrap(),
            StoreLocation::Local {
                root: PathBuf::from("/tmp/shelf")
            }
        );
        assert_eq!(StoreLocation::parse("memory://").unwrap(), StoreLocation::Memory);
    }

    #[test]
    fn parse_rejects_unknown_schemes() {
        for raw in ["gs://bucket", "", "s3://", "s3://a/b", "a/b"] {
            assert!(
                matches!(
                    StoreLocation::parse(raw),
                    Err(StoreError::UnsupportedLocation(_))
                ),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn location_display_round_trips_scheme() {
        let loc = StoreLocation::parse("market-data").unwrap();
        assert_eq!(loc.to_string(), "s3://market-data");
    }
}
