use thiserror::Error;

use crate::value::ValueKind;

/// Canonical result for core.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// An operation read a column the row does not carry.
    #[error("missing column '{0}'")]
    MissingColumn(String),

    #[error("column '{column}': expected {expected}, found {found}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        found: ValueKind,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    /// A row source failed to produce its next row.
    #[error("row source error: {0}")]
    Source(String),

    #[error("hashing error: {0}")]
    Hash(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Hash(e.to_string())
    }
}
