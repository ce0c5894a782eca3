//! Delta filter: the idempotency boundary.
//!
//! Records whose date already appears in the catalog snapshot are discarded
//! here and never reach the enricher or the writer.

use std::collections::BTreeSet;

use crate::domain::{CandidateRecord, ExistingPartitionSet};

/// Records that survived the filter, plus what was skipped.
#[derive(Debug, Clone, Default)]
pub struct DeltaOutcome {
    pub records: Vec<CandidateRecord>,
    pub skipped: usize,
    pub skipped_dates: BTreeSet<String>,
}

/// Keep only records whose date segment is absent from `existing`.
///
/// Matching is exact on the `YYYY-MM-DD` string. Input order is preserved.
pub fn filter_new(records: Vec<CandidateRecord>, existing: &ExistingPartitionSet) -> DeltaOutcome {
    let mut outcome = DeltaOutcome::default();

    for record in records {
        let key = record.date_key();
        if existing.contains(&key) {
            outcome.skipped += 1;
            outcome.skipped_dates.insert(key);
        } else {
            outcome.records.push(record);
        }
    }

    outcome
}
