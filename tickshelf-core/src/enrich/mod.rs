//! Feature enrichment per date partition.
//!
//! Records are grouped by date, each group is ordered by `datetime`, and
//! `moving_avg_5` is computed inside the group only. Groups are independent
//! so they are enriched in parallel; the sort happens inside each task.

pub mod trailing_mean;

pub use trailing_mean::TrailingMean;

use chrono::{NaiveDate, NaiveDateTime};
use rayon::prelude::*;
use std::collections::BTreeMap;

use crate::domain::{CandidateRecord, CleanRecord, PartitionKey};

/// Size of the trailing window behind `moving_avg_5`.
pub const MOVING_AVG_WINDOW: usize = 5;

/// All records of one partition, ordered by `datetime`.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedPartition {
    pub key: PartitionKey,
    pub records: Vec<CleanRecord>,
}

impl EnrichedPartition {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Attaches the trailing mean and audit metadata for one source file.
#[derive(Debug, Clone)]
pub struct Enricher {
    source_file: String,
    ingested_at: NaiveDateTime,
    mean: TrailingMean,
}

impl Enricher {
    /// `ingested_at` is the UTC processing instant, shared by every record
    /// from the same file.
    pub fn new(source_file: impl Into<String>, ingested_at: NaiveDateTime) -> Self {
        Self {
            source_file: source_file.into(),
            ingested_at,
            mean: TrailingMean::new(MOVING_AVG_WINDOW),
        }
    }

    /// Enrich one symbol's filtered records. Partitions come back in
    /// ascending date order.
    pub fn enrich(&self, symbol: &str, records: Vec<CandidateRecord>) -> Vec<EnrichedPartition> {
        let groups: Vec<(NaiveDate, Vec<CandidateRecord>)> =
            group_by_date(records).into_iter().collect();

        groups
            .into_par_iter()
            .map(|(date, group)| self.enrich_partition(PartitionKey::new(symbol, date), group))
            .collect()
    }

    /// Order one group by `datetime` and compute its trailing mean.
    ///
    /// The sort is stable: rows with equal timestamps keep their file order.
    pub fn enrich_partition(
        &self,
        key: PartitionKey,
        mut group: Vec<CandidateRecord>,
    ) -> EnrichedPartition {
        group.sort_by_key(|r| r.datetime);

        let closes: Vec<f64> = group.iter().map(|r| r.closing_price).collect();
        let means = self.mean.compute(&closes);

        let records = group
            .into_iter()
            .zip(means)
            .map(|(candidate, avg)| {
                CleanRecord::new(candidate, avg, self.source_file.clone(), self.ingested_at)
            })
            .collect();

        EnrichedPartition { key, records }
    }
}

/// Bucket records by calendar date, keeping input order inside each bucket.
pub fn group_by_date(records: Vec<CandidateRecord>) -> BTreeMap<NaiveDate, Vec<CandidateRecord>> {
    let mut groups: BTreeMap<NaiveDate, Vec<CandidateRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.date).or_default().push(record);
    }
    groups
}
