//! Partition identity and the catalog snapshot.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Format of the date segment in partition paths.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// The unit of committed storage: one symbol on one date.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartitionKey {
    pub symbol: String,
    pub date: NaiveDate,
}

impl PartitionKey {
    pub fn new(symbol: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            symbol: symbol.into(),
            date,
        }
    }

    /// The date segment as written in the store.
    pub fn date_key(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.symbol, self.date_key())
    }
}

/// Date segments already materialized for one symbol.
///
/// Captured once before a symbol is processed and never updated afterwards,
/// so partitions written during the same run are not observed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistingPartitionSet {
    symbol: String,
    dates: BTreeSet<String>,
}

impl ExistingPartitionSet {
    pub fn new(symbol: impl Into<String>, dates: impl IntoIterator<Item = String>) -> Self {
        Self {
            symbol: symbol.into(),
            dates: dates.into_iter().collect(),
        }
    }

    pub fn empty(symbol: impl Into<String>) -> Self {
        Self::new(symbol, std::iter::empty())
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Exact string match against a date segment.
    pub fn contains(&self, date_key: &str) -> bool {
        self.dates.contains(date_key)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Date segments in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.dates.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_display_is_store_relative_path() {
        let key = PartitionKey::new("AAA", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(key.to_string(), "AAA/2024-01-01");
        assert_eq!(key.date_key(), "2024-01-01");
    }

    #[test]
    fn existing_set_matches_exact_strings_only() {
        let set = ExistingPartitionSet::new("AAA", vec!["2024-01-01".to_string()]);
        assert!(set.contains("2024-01-01"));
        assert!(!set.contains("2024-1-1"));
        assert!(!set.contains("2024-01-01 "));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn existing_set_dedupes_and_sorts() {
        let set = ExistingPartitionSet::new(
            "AAA",
            vec![
                "2024-01-03".to_string(),
                "2024-01-01".to_string(),
                "2024-01-03".to_string(),
            ],
        );
        let dates: Vec<&str> = set.iter().collect();
        assert_eq!(dates, vec!["2024-01-01", "2024-01-03"]);
        assert!(ExistingPartitionSet::empty("AAA").is_empty());
    }
}
