//! Error types for roster loading and graph construction.

use thiserror::Error;

/// Errors raised while loading the positions file.
///
/// All of these are fatal at startup: no musician runs on a partial or
/// malformed roster.
#[derive(Debug, Error)]
pub enum RosterError {
    /// The positions file could not be read.
    #[error("Failed to read positions file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is empty or has no count line.
    #[error("Positions file is empty")]
    Empty,

    /// The declared count does not match the number of position records.
    #[error("Invalid number of arguments: declared {declared} musicians, found {actual}")]
    CountMismatch { declared: usize, actual: usize },

    /// A position record does not have exactly two fields.
    #[error("Invalid number of arguments on line {line}")]
    InvalidRecord { line: usize },

    /// A field could not be parsed as an integer.
    #[error("Invalid format of arguments on line {line}: {field:?}")]
    InvalidNumber { line: usize, field: String },
}
