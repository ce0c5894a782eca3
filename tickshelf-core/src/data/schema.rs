use polars::prelude::*;

/// Declared layout of an archived source file.
///
/// Required columns must be present in the header. Legacy columns are
/// known and ignored; `date`/`time` are re-derived from `Datetime`.
pub struct InputSchema;

impl InputSchema {
    pub const DATETIME: &'static str = "Datetime";
    pub const CLOSE: &'static str = "Close";
    pub const HIGH: &'static str = "High";
    pub const LOW: &'static str = "Low";
    pub const OPEN: &'static str = "Open";
    pub const VOLUME: &'static str = "Volume";

    pub const REQUIRED: [&'static str; 6] = [
        Self::DATETIME,
        Self::CLOSE,
        Self::HIGH,
        Self::LOW,
        Self::OPEN,
        Self::VOLUME,
    ];

    pub const LEGACY: [&'static str; 3] = ["Date", "Time", "TimeZone"];

    /// Check a header against the declared layout, once per file.
    pub fn resolve<S: AsRef<str>>(header: &[S]) -> Result<ResolvedColumns, SchemaError> {
        for required in Self::REQUIRED {
            if !header.iter().any(|h| h.as_ref() == required) {
                return Err(SchemaError::MissingColumn(required.to_string()));
            }
        }

        let mut resolved = ResolvedColumns::default();
        for name in header.iter().map(AsRef::as_ref) {
            if Self::REQUIRED.contains(&name) {
                continue;
            }
            if Self::LEGACY.contains(&name) {
                resolved.legacy.push(name.to_string());
            } else {
                resolved.unknown.push(name.to_string());
            }
        }
        Ok(resolved)
    }
}

/// Columns in a source header that will not be read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub legacy: Vec<String>,
    pub unknown: Vec<String>,
}

/// Columnar layout of a committed partition.
pub struct OutputSchema;

impl OutputSchema {
    pub fn schema() -> Schema {
        Schema::from_iter(vec![
            Field::new("datetime".into(), DataType::Datetime(TimeUnit::Microseconds, None)),
            Field::new("closing_price".into(), DataType::Float64),
            Field::new("high_price".into(), DataType::Float64),
            Field::new("low_price".into(), DataType::Float64),
            Field::new("open_price".into(), DataType::Float64),
            Field::new("volume".into(), DataType::Float64),
            Field::new("date".into(), DataType::Date),
            Field::new("time".into(), DataType::String),
            Field::new("source_file".into(), DataType::String),
            Field::new("ingested_at".into(), DataType::Datetime(TimeUnit::Microseconds, None)),
            Field::new("moving_avg_5".into(), DataType::Float64),
        ])
    }

    /// Validate DataFrame against schema
    pub fn validate(df: &DataFrame) -> Result<(), SchemaError> {
        let expected = Self::schema();
        let actual = df.schema();

        for field in expected.iter_fields() {
            let actual_dtype = actual
                .get(field.name())
                .ok_or_else(|| SchemaError::MissingColumn(field.name().to_string()))?;
            if actual_dtype != field.dtype() {
                return Err(SchemaError::TypeMismatch {
                    column: field.name().to_string(),
                    expected: field.dtype().clone(),
                    actual: actual_dtype.clone(),
                });
            }
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Type mismatch in column {column}: expected {expected:?}, got {actual:?}")]
    TypeMismatch {
        column: String,
        expected: DataType,
        actual: DataType,
    },
}
