//! Record cleaner: raw text rows → typed candidate records.
//!
//! A row survives only if every mandatory field is present and coerces to its
//! type. Anything else (empty cell, `abc` in a price, `NaN`, an unparseable
//! timestamp) drops the whole row. No partial repair, no error escalation.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::domain::{CandidateRecord, RawObservation};

/// Naive timestamp layouts accepted in the `Datetime` column.
const NAIVE_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Offset-bearing layouts; the recorded wall-clock time is kept.
const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Why a row was excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowRejection {
    MissingField(&'static str),
    Unparseable(&'static str),
}

/// Candidates from one file plus row accounting.
#[derive(Debug, Clone)]
pub struct CleanOutcome {
    pub symbol: String,
    pub records: Vec<CandidateRecord>,
    pub rows_read: usize,
    pub rows_dropped: usize,
}

/// Clean every observation of one symbol's file, preserving file order.
pub fn clean_observations(symbol: &str, observations: &[RawObservation]) -> CleanOutcome {
    let records: Vec<CandidateRecord> = observations
        .iter()
        .filter_map(|obs| coerce(obs).ok())
        .collect();

    CleanOutcome {
        symbol: symbol.to_string(),
        rows_read: observations.len(),
        rows_dropped: observations.len() - records.len(),
        records,
    }
}

/// Coerce one row, or say why it cannot be.
pub fn coerce(obs: &RawObservation) -> Result<CandidateRecord, RowRejection> {
    let datetime = required(&obs.datetime, "datetime")?;
    let datetime = parse_datetime(datetime).ok_or(RowRejection::Unparseable("datetime"))?;

    Ok(CandidateRecord::new(
        datetime,
        number(&obs.close, "closing_price")?,
        number(&obs.high, "high_price")?,
        number(&obs.low, "low_price")?,
        number(&obs.open, "open_price")?,
        number(&obs.volume, "volume")?,
    ))
}

fn required<'a>(cell: &'a Option<String>, field: &'static str) -> Result<&'a str, RowRejection> {
    match cell.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(RowRejection::MissingField(field)),
    }
}

fn number(cell: &Option<String>, field: &'static str) -> Result<f64, RowRejection> {
    let raw = required(cell, field)?;
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        // NaN is a null under drop-null semantics
        Ok(_) => Err(RowRejection::MissingField(field)),
        Err(_) => Err(RowRejection::Unparseable(field)),
    }
}

/// Parse a source timestamp, keeping the wall-clock time as recorded.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.naive_local());
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(datetime: &str, close: Option<&str>) -> RawObservation {
        RawObservation {
            datetime: Some(datetime.to_string()),
            close: close.map(str::to_string),
            high: Some("11".into()),
            low: Some("9".into()),
            open: Some("10".into()),
            volume: Some("1000".into()),
        }
    }

    #[test]
    fn clean_keeps_complete_rows_in_file_order() {
        let rows = vec![
            obs("2024-01-02 09:31:00", Some("10.5")),
            obs("2024-01-02 09:30:00", Some("10.0")),
        ];
        let outcome = clean_observations("AAA", &rows);

        assert_eq!(outcome.rows_read, 2);
        assert_eq!(outcome.rows_dropped, 0);
        assert_eq!(outcome.records[0].closing_price, 10.5);
        assert_eq!(outcome.records[1].time, "09:30:00");
        assert_eq!(outcome.symbol, "AAA");
    }

    #[test]
    fn null_close_drops_row() {
        let rows = vec![
            obs("2024-01-02 09:30:00", Some("10.0")),
            obs("2024-01-02 09:31:00", None),
            obs("2024-01-02 09:32:00", Some("  ")),
        ];
        let outcome = clean_observations("AAA", &rows);

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.rows_dropped, 2);
    }

    #[test]
    fn non_numeric_price_is_unparseable() {
        let row = obs("2024-01-02 09:30:00", Some("abc"));
        assert_eq!(
            coerce(&row),
            Err(RowRejection::Unparseable("closing_price"))
        );
    }

    #[test]
    fn nan_price_counts_as_missing() {
        let row = obs("2024-01-02 09:30:00", Some("NaN"));
        assert_eq!(coerce(&row), Err(RowRejection::MissingField("closing_price")));
    }

    #[test]
    fn any_missing_mandatory_field_drops_row() {
        let mut row = obs("2024-01-02 09:30:00", Some("10"));
        row.volume = None;
        assert_eq!(coerce(&row), Err(RowRejection::MissingField("volume")));

        let mut row = obs("2024-01-02 09:30:00", Some("10"));
        row.datetime = None;
        assert_eq!(coerce(&row), Err(RowRejection::MissingField("datetime")));
    }

    #[test]
    fn bad_timestamp_is_unparseable() {
        let row = obs("yesterday", Some("10"));
        assert_eq!(coerce(&row), Err(RowRejection::Unparseable("datetime")));
    }

    #[test]
    fn parse_datetime_keeps_recorded_wall_clock() {
        let dt = parse_datetime("2024-01-02 15:59:00-05:00").unwrap();
        assert_eq!(dt.to_string(), "2024-01-02 15:59:00");

        let dt = parse_datetime("2024-01-02T23:30:00+09:00").unwrap();
        assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[test]
    fn parse_datetime_accepts_naive_and_date_only() {
        assert_eq!(
            parse_datetime("2024-01-02 09:30:00").unwrap().to_string(),
            "2024-01-02 09:30:00"
        );
        assert_eq!(
            parse_datetime("2024-01-02T09:30:00.250").unwrap().to_string(),
            "2024-01-02 09:30:00.250"
        );
        assert_eq!(
            parse_datetime("2024-01-02").unwrap().to_string(),
            "2024-01-02 00:00:00"
        );
    }
}
