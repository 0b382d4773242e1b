//! Error types for the dataset transforms

use thiserror::Error;

/// Errors raised while loading, resampling or encoding pickup data.
///
/// Every variant is fatal for a run; callers do not retry.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The CSV reader itself failed (I/O or malformed quoting)
    #[error("Failed to read staged records: {0}")]
    Csv(#[from] csv::Error),

    /// A field could not be converted to its column type
    #[error("Parse error on line {line}, column '{field}': {reason} (value: {value:?})")]
    Parse {
        line: u64,
        field: &'static str,
        value: String,
        reason: String,
    },

    /// No rows were loaded, so no global time range exists
    #[error("Event table is empty; cannot compute a global time range")]
    EmptyTable,

    /// Resample step must be a positive duration
    #[error("Resample step must be positive, got {step_secs}s")]
    InvalidStep { step_secs: i64 },

    /// A dense series cannot give up `prediction_length` trailing intervals
    #[error(
        "Series for '{geohash}' has {len} intervals, needs more than prediction_length={prediction_length}"
    )]
    SeriesTooShort {
        geohash: String,
        len: usize,
        prediction_length: usize,
    },

    /// Local dataset file could not be written
    #[error("Failed to write '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode series record: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    pub(crate) fn parse(
        line: u64,
        field: &'static str,
        value: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        Self::Parse {
            line,
            field,
            value: value.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Result type alias for CoreError
pub type Result<T> = std::result::Result<T, CoreError>;
