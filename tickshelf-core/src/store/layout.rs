//! Path layout of committed partitions.
//!
//! Layout: `{prefix}/{SYMBOL}/{YYYY-MM-DD}/part-00000.parquet`
//!
//! The partition directory is the unit of replacement; it always holds a
//! single object with a fixed name, so a rewrite overwrites rather than
//! accumulates.

use crate::domain::PartitionKey;

/// File name of the single object inside each partition directory.
pub const PARTITION_FILE: &str = "part-00000.parquet";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionLayout {
    prefix: String,
}

impl PartitionLayout {
    /// Leading and trailing slashes on `prefix` are ignored.
    pub fn new(prefix: impl AsRef<str>) -> Self {
        Self {
            prefix: prefix.as_ref().trim_matches('/').to_string(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Listing root for a symbol: `{prefix}/{SYMBOL}/`
    pub fn symbol_prefix(&self, symbol: &str) -> String {
        if self.prefix.is_empty() {
            format!("{symbol}/")
        } else {
            format!("{}/{symbol}/", self.prefix)
        }
    }

    /// Directory for a partition: `{prefix}/{SYMBOL}/{date}`
    pub fn partition_dir(&self, key: &PartitionKey) -> String {
        format!("{}{}", self.symbol_prefix(&key.symbol), key.date_key())
    }

    /// Object written for a partition.
    pub fn partition_object(&self, key: &PartitionKey) -> String {
        format!("{}/{PARTITION_FILE}", self.partition_dir(key))
    }

    /// Date segment of a listed common prefix such as `data/AAA/2024-01-01/`.
    pub fn date_segment(common_prefix: &str) -> Option<&str> {
        common_prefix.rsplit('/').find(|segment| !segment.is_empty())
    }
}
