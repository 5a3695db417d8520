//! # sheetwright-core
//!
//! Core document model for the sheetwright spreadsheet library.
//!
//! This crate provides the grid a spreadsheet document is edited through:
//! - [`ColumnAddress`] and [`CellRef`] - Column label arithmetic and cell references
//! - [`SharedValuePool`] - The workbook's shared text table
//! - [`Cell`] and [`CellValue`] - Cells and their value payloads
//! - [`Row`] - The ordered cells of one row, with column shifting
//! - [`ColumnStyleRanges`] - Sheet-wide column formats
//! - [`Worksheet`], [`Workbook`] - The main document structures
//! - [`CalcChain`] - The index of formula cells kept in step with shifts
//!
//! ## Example
//!
//! ```rust
//! use sheetwright_core::{Cell, CellValue, Workbook};
//!
//! let mut workbook = Workbook::new();
//! let hallo = workbook.shared_values_mut().intern("Hallo");
//!
//! let (sheet, mut chain) = workbook.worksheet_with_calc_chain(0).unwrap();
//! let row = sheet.append_row().unwrap();
//! row.append_cell("Test 1").unwrap();
//! row.append_cell(CellValue::Shared(hallo)).unwrap();
//! row.insert_cell_at(Cell::new(5), "B", &mut chain).unwrap();
//!
//! let pool = workbook.shared_values();
//! let sheet = workbook.worksheet(0).unwrap();
//! assert_eq!(sheet.cell("B1").unwrap().value_text(pool).unwrap(), "5");
//! assert_eq!(sheet.cell("C1").unwrap().value_text(pool).unwrap(), "Hallo");
//! ```

pub mod calc_chain;
pub mod cell;
pub mod column;
pub mod error;
pub mod pool;
pub mod row;
pub mod store;
pub mod style;
pub mod workbook;
pub mod worksheet;

// Re-exports for convenience
pub use calc_chain::{CalcChain, CalcChainEntry, FormulaIndex, NoFormulaIndex, SheetCalcChain};
pub use cell::{Cell, CellRef, CellValue, ColumnAddress};
pub use column::{ColumnFormat, ColumnStyleRange, ColumnStyleRanges};
pub use error::{Error, Result};
pub use pool::SharedValuePool;
pub use row::Row;
pub use store::{DocumentStore, MemoryStore};
pub use style::{StyleTable, Stylesheet};
pub use workbook::{Workbook, WorkbookSettings};
pub use worksheet::Worksheet;

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u32 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;
