//! Prelude module - common imports for sheetwright users
//!
//! ```rust
//! use sheetwright::prelude::*;
//! ```

pub use crate::{
    // Cell types
    Cell,
    CellRef,
    CellValue,
    ColumnAddress,
    // Column formats
    ColumnFormat,
    // Documents
    Document,
    DocumentError,
    DocumentResult,
    DocumentStore,
    // Error types
    Error,
    // Formula index
    FormulaIndex,
    NoFormulaIndex,
    Result,
    Row,
    SharedValuePool,
    StoreOptions,
    // Main types
    Workbook,
    Worksheet,
};
