use thiserror::Error;

/// Errors raised by the aggregation / plot-preparation core.
///
/// I/O edges (loading, saving, rendering) use `anyhow` and wrap these where needed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// A selected column does not exist in the table.
    #[error("invalid column selection: `{column}` (available: {})", available.join(", "))]
    InvalidColumn {
        column: String,
        available: Vec<String>,
    },

    /// The value column holds something that cannot be reduced numerically.
    #[error("non-numeric value column `{column}`: cannot aggregate `{value}`")]
    NonNumeric { column: String, value: String },

    /// A row whose width does not match the header.
    #[error("row {row} has {found} fields, expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("invalid year-week value `{0}` (expected e.g. 2020-W05)")]
    InvalidYearWeek(String),

    #[error("invalid hex color `{0}`")]
    InvalidColor(String),
}

pub type Result<T> = std::result::Result<T, Error>;
