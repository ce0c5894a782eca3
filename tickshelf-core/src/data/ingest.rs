use polars::prelude::*;
use std::path::Path;

use crate::data::schema::{InputSchema, ResolvedColumns, SchemaError};
use crate::domain::RawObservation;

/// Reads archived CSV files into raw observations.
///
/// Every column is read as text (`infer_schema_length = 0`) so that type
/// coercion happens row by row in the cleaner, where a bad cell drops one row
/// instead of failing the whole file.
#[derive(Debug, Default)]
pub struct DataIngestor;

/// Raw rows from one file plus the columns that were ignored.
#[derive(Debug, Clone)]
pub struct IngestedFile {
    pub observations: Vec<RawObservation>,
    pub ignored: ResolvedColumns,
}

impl DataIngestor {
    pub fn new() -> Self {
        Self
    }

    /// Ingest CSV file
    pub fn ingest_csv(&self, path: &Path) -> Result<IngestedFile, IngestError> {
        let df = LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .finish()
            .and_then(|lf| lf.collect())
            .map_err(|e| IngestError::ReadFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        self.observations_from_frame(&df)
    }

    /// Pull the required columns out of a text frame.
    pub fn observations_from_frame(&self, df: &DataFrame) -> Result<IngestedFile, IngestError> {
        let header: Vec<&str> = df
            .get_column_names()
            .into_iter()
            .map(|name| name.as_str())
            .collect();
        let ignored = InputSchema::resolve(&header)?;

        let text = |name: &str| -> Result<StringChunked, IngestError> {
            let column = df
                .column(name)
                .map_err(|e| IngestError::Column {
                    column: name.to_string(),
                    reason: e.to_string(),
                })?;
            let cast = column
                .cast(&DataType::String)
                .map_err(|e| IngestError::Column {
                    column: name.to_string(),
                    reason: e.to_string(),
                })?;
            cast.str()
                .cloned()
                .map_err(|e| IngestError::Column {
                    column: name.to_string(),
                    reason: e.to_string(),
                })
        };

        let datetime = text(InputSchema::DATETIME)?;
        let close = text(InputSchema::CLOSE)?;
        let high = text(InputSchema::HIGH)?;
        let low = text(InputSchema::LOW)?;
        let open = text(InputSchema::OPEN)?;
        let volume = text(InputSchema::VOLUME)?;

        let cell = |ca: &StringChunked, i: usize| ca.get(i).map(str::to_string);

        let observations = (0..df.height())
            .map(|i| RawObservation {
                datetime: cell(&datetime, i),
                close: cell(&close, i),
                high: cell(&high, i),
                low: cell(&low, i),
                open: cell(&open, i),
                volume: cell(&volume, i),
            })
            .collect();

        Ok(IngestedFile {
            observations,
            ignored,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: String, reason: String },

    #[error("column {column} unreadable: {reason}")]
    Column { column: String, reason: String },

    #[error("schema mismatch: {0}")]
    Schema(#[from] SchemaError),
}
