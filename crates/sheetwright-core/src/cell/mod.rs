//! Cell-related types and utilities
//!
//! This module contains:
//! - [`ColumnAddress`] - Column label arithmetic (e.g., "A" <-> 1)
//! - [`CellRef`] - A cell's location (e.g., "B12")
//! - [`CellValue`] - The value stored in a cell
//! - [`Cell`] - Complete cell data including column, value and style

mod address;
mod entry;
mod value;

pub use address::{CellRef, ColumnAddress};
pub use entry::Cell;
pub use value::CellValue;
