//! Partition writer.
//!
//! Encoding and committing are separate steps. Encoding is pure and can run
//! on any thread; committing issues exactly one `put` per partition, at a
//! fixed object path, so a repeated commit replaces instead of appending.

use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;

use crate::data::schema::{OutputSchema, SchemaError};
use crate::domain::{CleanRecord, PartitionKey};
use crate::enrich::EnrichedPartition;
use crate::store::{PartitionLayout, PartitionStore, StoreError};

/// A partition serialized to Parquet, not yet committed.
#[derive(Debug, Clone)]
pub struct EncodedPartition {
    pub key: PartitionKey,
    pub rows: usize,
    pub payload: Vec<u8>,
    /// BLAKE3 of `payload`, hex.
    pub content_hash: String,
}

/// Record of one successful commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionCommit {
    pub key: PartitionKey,
    pub path: String,
    pub rows: usize,
    pub bytes: usize,
    pub content_hash: String,
}

/// Build the output frame for one partition, in record order.
pub fn records_to_dataframe(records: &[CleanRecord]) -> Result<DataFrame, WriteError> {
    let frame_err = |reason: String| WriteError::Frame(reason);
    let epoch = NaiveDate::default();

    let datetimes: Vec<i64> = records
        .iter()
        .map(|r| r.datetime().and_utc().timestamp_micros())
        .collect();
    let closes: Vec<f64> = records.iter().map(CleanRecord::closing_price).collect();
    let highs: Vec<f64> = records.iter().map(CleanRecord::high_price).collect();
    let lows: Vec<f64> = records.iter().map(CleanRecord::low_price).collect();
    let opens: Vec<f64> = records.iter().map(CleanRecord::open_price).collect();
    let volumes: Vec<f64> = records.iter().map(CleanRecord::volume).collect();
    let dates: Vec<i32> = records
        .iter()
        .map(|r| (r.date() - epoch).num_days() as i32)
        .collect();
    let times: Vec<&str> = records.iter().map(CleanRecord::time).collect();
    let sources: Vec<&str> = records.iter().map(CleanRecord::source_file).collect();
    let ingested: Vec<i64> = records
        .iter()
        .map(|r| r.ingested_at().and_utc().timestamp_micros())
        .collect();
    let averages: Vec<f64> = records.iter().map(CleanRecord::moving_avg_5).collect();

    let micros = DataType::Datetime(TimeUnit::Microseconds, None);

    let df = DataFrame::new(vec![
        Column::new("datetime".into(), datetimes)
            .cast(&micros)
            .map_err(|e| frame_err(format!("datetime cast: {e}")))?,
        Column::new("closing_price".into(), closes),
        Column::new("high_price".into(), highs),
        Column::new("low_price".into(), lows),
        Column::new("open_price".into(), opens),
        Column::new("volume".into(), volumes),
        Column::new("date".into(), dates)
            .cast(&DataType::Date)
            .map_err(|e| frame_err(format!("date cast: {e}")))?,
        Column::new("time".into(), times),
        Column::new("source_file".into(), sources),
        Column::new("ingested_at".into(), ingested)
            .cast(&micros)
            .map_err(|e| frame_err(format!("ingested_at cast: {e}")))?,
        Column::new("moving_avg_5".into(), averages),
    ])
    .map_err(|e| frame_err(format!("dataframe creation: {e}")))?;

    OutputSchema::validate(&df)?;
    Ok(df)
}

/// Serialize one enriched partition to Parquet bytes.
pub fn encode_partition(partition: &EnrichedPartition) -> Result<EncodedPartition, WriteError> {
    if partition.is_empty() {
        return Err(WriteError::EmptyPartition(partition.key.clone()));
    }

    let encode_err = |reason: String| WriteError::Encode {
        key: partition.key.clone(),
        reason,
    };

    let mut df = records_to_dataframe(&partition.records)
        .map_err(|e| encode_err(e.to_string()))?;

    let mut payload = Vec::new();
    ParquetWriter::new(&mut payload)
        .with_compression(ParquetCompression::Snappy)
        .finish(&mut df)
        .map_err(|e| encode_err(format!("write parquet: {e}")))?;

    let content_hash = blake3::hash(&payload).to_hex().to_string();

    Ok(EncodedPartition {
        key: partition.key.clone(),
        rows: partition.len(),
        payload,
        content_hash,
    })
}

/// Commits encoded partitions to a store.
pub struct PartitionWriter<'a> {
    store: &'a dyn PartitionStore,
    layout: &'a PartitionLayout,
}

impl<'a> PartitionWriter<'a> {
    pub fn new(store: &'a dyn PartitionStore, layout: &'a PartitionLayout) -> Self {
        Self { store, layout }
    }

    /// One `put` for the whole partition, replacing any prior object.
    pub fn commit(&self, encoded: EncodedPartition) -> Result<PartitionCommit, WriteError> {
        let path = self.layout.partition_object(&encoded.key);
        let bytes = encoded.payload.len();

        self.store
            .put(&path, encoded.payload)
            .map_err(|source| WriteError::Store {
                key: encoded.key.clone(),
                source,
            })?;

        Ok(PartitionCommit {
            key: encoded.key,
            path,
            rows: encoded.rows,
            bytes,
            content_hash: encoded.content_hash,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("building frame: {0}")]
    Frame(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("encoding {key} failed: {reason}")]
    Encode { key: PartitionKey, reason: String },

    #[error("committing {key} failed: {source}")]
    Store {
        key: PartitionKey,
        #[source]
        source: StoreError,
    },

    #[error("partition {0} has no records")]
    EmptyPartition(PartitionKey),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CandidateRecord;
    use crate::enrich::Enricher;
    use crate::store::MemoryStore;
    use std::io::Cursor;

    fn partition(closes: &[f64]) -> EnrichedPartition {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let records = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let dt = day.and_hms_opt(9, 30 + i as u32, 0).unwrap();
                CandidateRecord::new(dt, c, c + 1.0, c - 1.0, c, 1000.0)
            })
            .collect();
        let ingested = NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        Enricher::new("archived_AAA_results.csv", ingested)
            .enrich("AAA", records)
            .remove(0)
    }

    #[test]
    fn frame_matches_output_schema() {
        let p = partition(&[10.0, 11.0, 12.0]);
        let df = records_to_dataframe(&p.records).unwrap();

        assert_eq!(df.height(), 3);
        assert_eq!(df.width(), 11);
        let avg: Vec<Option<f64>> = df
            .column("moving_avg_5")
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(avg, vec![Some(10.0), Some(10.5), Some(11.0)]);
    }

    #[test]
    fn encoded_payload_reads_back() {
        let encoded = encode_partition(&partition(&[10.0, 11.0])).unwrap();
        assert_eq!(encoded.rows, 2);
        assert_eq!(encoded.content_hash.len(), 64);

        let df = ParquetReader::new(Cursor::new(encoded.payload)).finish().unwrap();
        assert_eq!(df.height(), 2);
        let source = df.column("source_file").unwrap().str().unwrap().get(0);
        assert_eq!(source, Some("archived_AAA_results.csv"));
        let time = df.column("time").unwrap().str().unwrap().get(1);
        assert_eq!(time, Some("09:31:00"));
    }

    #[test]
    fn empty_partition_is_rejected() {
        let p = EnrichedPartition {
            key: PartitionKey::new("AAA", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            records: vec![],
        };
        assert!(matches!(encode_partition(&p), Err(WriteError::EmptyPartition(_))));
    }

    #[test]
    fn commit_puts_once_at_partition_path() {
        let store = MemoryStore::new();
        let layout = PartitionLayout::new("data");
        let writer = PartitionWriter::new(&store, &layout);

        let commit = writer.commit(encode_partition(&partition(&[10.0])).unwrap()).unwrap();

        assert_eq!(commit.path, "data/AAA/2024-01-01/part-00000.parquet");
        assert_eq!(store.put_count(), 1);
        assert_eq!(store.paths(), vec![commit.path.clone()]);
        assert_eq!(store.get(&commit.path).map(|b| b.len()), Some(commit.bytes));
    }

    #[test]
    fn recommit_replaces_prior_object() {
        let store = MemoryStore::new();
        let layout = PartitionLayout::new("data");
        let writer = PartitionWriter::new(&store, &layout);

        writer.commit(encode_partition(&partition(&[10.0])).unwrap()).unwrap();
        let second = writer
            .commit(encode_partition(&partition(&[20.0, 21.0])).unwrap())
            .unwrap();

        assert_eq!(store.paths().len(), 1);
        let df = ParquetReader::new(Cursor::new(store.get(&second.path).unwrap()))
            .finish()
            .unwrap();
        assert_eq!(df.height(), 2);
    }
}
