//! Error types for sheetwright-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in sheetwright-core
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid column label or cell reference format
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    /// Column arithmetic left the addressable range (e.g. the column before "A")
    #[error("Out of range: {0}")]
    OutOfRange(String),

    /// Referenced row, column, cell or shared value does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A shift would move a column past the last supported column
    #[error("Column {column} would exceed the last supported column (max: {max})")]
    ColumnOverflow { column: u32, max: u32 },

    /// Row index out of bounds
    #[error("Row index {0} out of bounds (max: {1})")]
    RowOutOfBounds(u32, u32),

    /// The operation is not valid for the current state of the target
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Sheet index out of bounds
    #[error("Sheet index {0} out of bounds (count: {1})")]
    SheetOutOfBounds(usize, usize),

    /// Sheet not found by name
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// Invalid sheet name
    #[error("Invalid sheet name: {0}")]
    InvalidSheetName(String),

    /// Duplicate sheet name
    #[error("Sheet name already exists: {0}")]
    DuplicateSheetName(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Create a "not found" error with a message
    pub fn not_found<S: Into<String>>(what: S) -> Self {
        Error::NotFound(what.into())
    }

    pub(crate) fn column_overflow(column: u32) -> Self {
        Error::ColumnOverflow {
            column,
            max: crate::MAX_COLS,
        }
    }
}
