//! Record types for each stage of the pipeline.
//!
//! `RawObservation` → (cleaner) → `CandidateRecord` → (delta filter, enricher) → `CleanRecord`

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::partition::DATE_FORMAT;

/// Wall-clock format of the derived `time` column.
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// One source row exactly as read, before coercion.
///
/// Every cell is optional text. The legacy `Date`/`Time`/`TimeZone` columns
/// are never carried here; they are re-derived from `datetime`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawObservation {
    pub datetime: Option<String>,
    pub close: Option<String>,
    pub high: Option<String>,
    pub low: Option<String>,
    pub open: Option<String>,
    pub volume: Option<String>,
}

/// A fully typed row with its partition key derived, not yet checked
/// against the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub datetime: NaiveDateTime,
    pub closing_price: f64,
    pub high_price: f64,
    pub low_price: f64,
    pub open_price: f64,
    pub volume: f64,
    pub date: NaiveDate,
    pub time: String,
}

impl CandidateRecord {
    /// Build a candidate from typed prices, deriving `date` and `time`.
    pub fn new(
        datetime: NaiveDateTime,
        closing_price: f64,
        high_price: f64,
        low_price: f64,
        open_price: f64,
        volume: f64,
    ) -> Self {
        Self {
            datetime,
            closing_price,
            high_price,
            low_price,
            open_price,
            volume,
            date: datetime.date(),
            time: datetime.format(TIME_FORMAT).to_string(),
        }
    }

    /// The partition date as it appears in store paths (`YYYY-MM-DD`).
    pub fn date_key(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }
}

/// An enriched record, ready to be committed.
///
/// Only the enricher constructs these; fields are read through accessors so a
/// record cannot be altered once its trailing mean has been computed.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanRecord {
    candidate: CandidateRecord,
    moving_avg_5: f64,
    source_file: String,
    ingested_at: NaiveDateTime,
}

impl CleanRecord {
    pub(crate) fn new(
        candidate: CandidateRecord,
        moving_avg_5: f64,
        source_file: String,
        ingested_at: NaiveDateTime,
    ) -> Self {
        Self {
            candidate,
            moving_avg_5,
            source_file,
            ingested_at,
        }
    }

    pub fn datetime(&self) -> NaiveDateTime {
        self.candidate.datetime
    }

    pub fn closing_price(&self) -> f64 {
        self.candidate.closing_price
    }

    pub fn high_price(&self) -> f64 {
        self.candidate.high_price
    }

    pub fn low_price(&self) -> f64 {
        self.candidate.low_price
    }

    pub fn open_price(&self) -> f64 {
        self.candidate.open_price
    }

    pub fn volume(&self) -> f64 {
        self.candidate.volume
    }

    pub fn date(&self) -> NaiveDate {
        self.candidate.date
    }

    pub fn time(&self) -> &str {
        &self.candidate.time
    }

    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    /// Processing instant, UTC.
    pub fn ingested_at(&self) -> NaiveDateTime {
        self.ingested_at
    }

    pub fn moving_avg_5(&self) -> f64 {
        self.moving_avg_5
    }
}
