//! `ObjectStoreBackend` against real `object_store` implementations.

use chrono::NaiveDate;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::ObjectStore;
use std::sync::Arc;
use tickshelf_core::catalog::CatalogReader;
use tickshelf_core::domain::CandidateRecord;
use tickshelf_core::enrich::Enricher;
use tickshelf_core::store::{
    ObjectStoreBackend, PartitionLayout, PartitionStore, StoreLocation,
};
use tickshelf_core::writer::{encode_partition, PartitionWriter};
use tokio::runtime::Runtime;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap()
}

fn one_partition(day: u32) -> tickshelf_core::enrich::EnrichedPartition {
    let dt = NaiveDate::from_ymd_opt(2024, 1, day)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap();
    let ingested = NaiveDate::from_ymd_opt(2024, 2, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    Enricher::new("archived_AAA_results.csv", ingested)
        .enrich("AAA", vec![CandidateRecord::new(dt, 10.0, 11.0, 9.0, 10.0, 1.0)])
        .remove(0)
}

#[test]
fn in_memory_list_and_put() {
    let rt = runtime();
    let inner = Arc::new(InMemory::new());
    let backend = ObjectStoreBackend::new("memory://", inner.clone(), rt.handle().clone());
    let layout = PartitionLayout::new("data");

    let reader = CatalogReader::new(&backend, &layout);
    assert!(reader.existing_partitions("AAA").unwrap().is_empty());

    let writer = PartitionWriter::new(&backend, &layout);
    for day in [1, 2] {
        writer
            .commit(encode_partition(&one_partition(day)).unwrap())
            .unwrap();
    }

    let set = reader.existing_partitions("AAA").unwrap();
    let dates: Vec<&str> = set.iter().collect();
    assert_eq!(dates, vec!["2024-01-01", "2024-01-02"]);

    let head = rt
        .block_on(inner.head(&Path::from("data/AAA/2024-01-01/part-00000.parquet")))
        .unwrap();
    assert!(head.size > 0);
}

#[test]
fn continued_listing_is_empty() {
    let rt = runtime();
    let backend = ObjectStoreBackend::new("memory://", Arc::new(InMemory::new()), rt.handle().clone());
    backend.put("data/AAA/2024-01-01/part-00000.parquet", vec![1]).unwrap();

    let first = backend.list_page("data/AAA/", None).unwrap();
    assert_eq!(first.common_prefixes, vec!["data/AAA/2024-01-01/"]);
    assert!(first.continuation.is_none());

    let next = backend.list_page("data/AAA/", Some("anything")).unwrap();
    assert!(next.common_prefixes.is_empty());
}

#[test]
fn local_filesystem_round_trip() {
    let rt = runtime();
    let dir = tempfile::tempdir().unwrap();
    let location = StoreLocation::parse(&format!("file://{}", dir.path().display())).unwrap();
    let backend = ObjectStoreBackend::for_location(&location, rt.handle().clone()).unwrap();
    let layout = PartitionLayout::new("minute");

    let commit = PartitionWriter::new(&backend, &layout)
        .commit(encode_partition(&one_partition(3)).unwrap())
        .unwrap();

    let on_disk = dir.path().join(&commit.path);
    assert!(on_disk.exists(), "{} missing", on_disk.display());

    let set = CatalogReader::new(&backend, &layout)
        .existing_partitions("AAA")
        .unwrap();
    assert!(set.contains("2024-01-03"));
}
