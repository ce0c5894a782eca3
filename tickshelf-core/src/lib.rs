//! Tickshelf Core: the incremental partition-diff and enrichment engine.
//!
//! This crate contains everything that touches a record on its way from a
//! local archive file to a committed partition:
//! - Domain types (raw observations, candidate and clean records, partition keys)
//! - Input schema resolution and CSV ingest
//! - Record cleaning and the catalog delta filter
//! - Trailing-mean enrichment per date partition
//! - The partition store abstraction, catalog reader, and partition writer

pub mod catalog;
pub mod data;
pub mod domain;
pub mod enrich;
pub mod store;
pub mod writer;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything that crosses the rayon pool is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::CandidateRecord>();
        require_sync::<domain::CandidateRecord>();
        require_send::<domain::CleanRecord>();
        require_sync::<domain::CleanRecord>();
        require_send::<domain::PartitionKey>();
        require_sync::<domain::PartitionKey>();
        require_send::<domain::ExistingPartitionSet>();
        require_sync::<domain::ExistingPartitionSet>();

        require_send::<enrich::Enricher>();
        require_sync::<enrich::Enricher>();
        require_send::<enrich::EnrichedPartition>();
        require_sync::<enrich::EnrichedPartition>();

        require_send::<writer::EncodedPartition>();
        require_send::<writer::PartitionCommit>();

        require_send::<store::MemoryStore>();
        require_sync::<store::MemoryStore>();
        require_send::<store::ObjectStoreBackend>();
        require_sync::<store::ObjectStoreBackend>();
    }

    /// Architecture contract: the delta filter only sees an immutable catalog
    /// snapshot, so in-run writes can never leak back into the filter.
    #[test]
    fn delta_filter_takes_catalog_by_shared_reference() {
        fn _check(
            records: Vec<domain::CandidateRecord>,
            existing: &domain::ExistingPartitionSet,
        ) -> data::DeltaOutcome {
            data::filter_new(records, existing)
        }
    }
}
