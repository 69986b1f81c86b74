//! Error types for the bet ledger.

use crate::bet::BetId;
use thiserror::Error;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur while recording, aggregating or exporting bets.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Failed to open, read or write a file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing or writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Submission refused before reaching the store
    #[error("Invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// An export was requested for an empty row set
    #[error("Nothing to export")]
    NothingToExport,

    /// Export rows do not share the field set of the first row
    #[error("Export row {row} has fields [{found}], expected [{expected}]")]
    RowShape {
        row: usize,
        expected: String,
        found: String,
    },

    /// The first export row names the same field twice
    #[error("Export field '{0}' appears more than once")]
    DuplicateField(String),

    /// The backing store rejected an operation
    #[error("Store error: {0}")]
    Store(String),

    /// Delete targeted a record the store does not hold
    #[error("Unknown record {0}")]
    UnknownRecord(BetId),

    /// Bad command line
    #[error("{0}")]
    Usage(String),
}

impl LedgerError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        LedgerError::Validation {
            field,
            message: message.into(),
        }
    }
}
