//! Source ingestion, row cleaning and delta filtering

pub mod clean;
pub mod delta;
pub mod ingest;
pub mod schema;

pub use clean::{clean_observations, CleanOutcome, RowRejection};
pub use delta::{filter_new, DeltaOutcome};
pub use ingest::{DataIngestor, IngestError, IngestedFile};
pub use schema::{InputSchema, OutputSchema, ResolvedColumns, SchemaError};
