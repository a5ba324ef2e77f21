use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Load-time errors
// ---------------------------------------------------------------------------

/// Errors raised while reading and normalizing the collision source file.
///
/// All load errors are fatal for the affected load: the dashboard cannot
/// serve views over a dataset it could not read. The one row-level case,
/// an unparseable timestamp, is governed by
/// [`TimestampPolicy`](crate::data::loader::TimestampPolicy) and only
/// surfaces as [`LoadError::MalformedTimestamp`] under the strict policy.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The backing file is absent or unreadable.
    #[error("source file not found: {path}")]
    SourceNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An expected raw column is missing from the source header.
    #[error("source is missing expected column '{column}'")]
    MalformedSchema { column: String },

    /// A row's crash date/time could not be merged and parsed.
    #[error("row {row}: cannot parse crash timestamp '{value}'")]
    MalformedTimestamp { row: usize, value: String },

    /// The file extension maps to no known loader.
    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    /// A malformed row or file at the CSV layer.
    #[error("malformed CSV content")]
    Csv(#[from] csv::Error),

    /// A malformed file at the JSON layer, or a JSON record with the
    /// wrong shape.
    #[error("malformed JSON content: {0}")]
    Json(String),

    #[error("I/O error reading source")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Query-time errors
// ---------------------------------------------------------------------------

/// Errors raised at the aggregation boundary.
///
/// Never fatal to the process: the hosting UI renders an explicit
/// empty/error state instead of a meaningless default.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    /// A caller-supplied selector value is out of range or unknown.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A filter matched zero records and the requested aggregate is
    /// undefined over an empty set (e.g. the centroid).
    #[error("selection is empty")]
    EmptySelection,
}
