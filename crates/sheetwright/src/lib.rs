//! # sheetwright
//!
//! Edit the cell grid of spreadsheet documents.
//!
//! sheetwright opens a packaged spreadsheet, lets you append, insert, shift,
//! move and copy rows and cells while keeping column labels, shared text,
//! column formats and the calculation chain consistent, and writes the
//! result back at an explicit save point.
//!
//! ## Example
//!
//! ```rust,no_run
//! use sheetwright::prelude::*;
//!
//! let mut doc = Document::create("report.xlsx").unwrap();
//! let workbook = doc.workbook_mut();
//! let hallo = workbook.shared_values_mut().intern("Hallo");
//!
//! let (sheet, mut chain) = workbook.worksheet_with_calc_chain(0).unwrap();
//! let row = sheet.append_row().unwrap();
//! row.append_cell("Test 1").unwrap();
//! row.append_cell(CellValue::Shared(hallo)).unwrap();
//! row.insert_cell_at(Cell::new(5), "B", &mut chain).unwrap();
//!
//! doc.save().unwrap();
//! doc.close().unwrap();
//! ```

pub mod prelude;

use std::path::Path;

use thiserror::Error;

// Re-export core types
pub use sheetwright_core::{
    CalcChain, CalcChainEntry, Cell, CellRef, CellValue, ColumnAddress, ColumnFormat,
    ColumnStyleRange, ColumnStyleRanges, DocumentStore, Error, FormulaIndex, MemoryStore,
    NoFormulaIndex, Result, Row, SharedValuePool, SheetCalcChain, StyleTable, Stylesheet,
    Workbook, WorkbookSettings, Worksheet, MAX_COLS, MAX_ROWS, MAX_SHEET_NAME_LEN,
};

// Re-export I/O types
pub use sheetwright_xlsx::{
    Compression, StoreOptions, XlsxError, XlsxReader, XlsxStore, XlsxWriter,
};

/// Errors raised by a [`Document`]
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The grid rejected an operation
    #[error(transparent)]
    Grid(#[from] Error),

    /// The package could not be read or written
    #[error(transparent)]
    Store(#[from] XlsxError),
}

/// Result type for document operations
pub type DocumentResult<T> = std::result::Result<T, DocumentError>;

/// A workbook bound to the store it was loaded from
///
/// The grid is edited in memory through [`Document::workbook_mut`]; the store
/// only sees it again on [`Document::save`].
#[derive(Debug)]
pub struct Document<S = XlsxStore> {
    store: S,
    workbook: Workbook,
}

impl Document<XlsxStore> {
    /// Create a new document that will be written to `path` on save
    pub fn create<P: AsRef<Path>>(path: P) -> DocumentResult<Self> {
        Self::create_with(path, StoreOptions::default())
    }

    /// Create a new document with explicit store options
    pub fn create_with<P: AsRef<Path>>(path: P, options: StoreOptions) -> DocumentResult<Self> {
        let store = XlsxStore::create(path.as_ref(), options);
        log::info!("created document {}", path.as_ref().display());
        Self::from_store(store)
    }

    /// Open an existing document
    pub fn open<P: AsRef<Path>>(path: P, options: StoreOptions) -> DocumentResult<Self> {
        let store = XlsxStore::open(path, options)?;
        Self::from_store(store)
    }

    /// Location of the package
    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// Create a new document at `path` that shares this document's styles
    ///
    /// The copy mirrors the sheet names and column formats, either of every
    /// sheet or only of `sheet_name`, and holds no rows. Nothing is written
    /// until the copy is saved.
    pub fn copy_with_style<P: AsRef<Path>>(
        &self,
        path: P,
        sheet_name: Option<&str>,
    ) -> DocumentResult<Document<XlsxStore>> {
        let workbook = self.workbook.copy_with_style(sheet_name)?;
        let store = XlsxStore::create(path, StoreOptions::default());
        Ok(Document { store, workbook })
    }
}

impl<S> Document<S>
where
    S: DocumentStore,
    DocumentError: From<S::Error>,
{
    /// Load the workbook held by `store`
    pub fn from_store(mut store: S) -> DocumentResult<Self> {
        let workbook = store.load()?;
        Ok(Self { store, workbook })
    }

    /// Write the current workbook to the store
    pub fn save(&mut self) -> DocumentResult<()> {
        self.store.save(&self.workbook)?;
        Ok(())
    }

    /// Release the store without saving
    pub fn close(self) -> DocumentResult<()> {
        self.store.close()?;
        Ok(())
    }
}

impl<S> Document<S> {
    /// The workbook being edited
    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    /// The workbook being edited, mutably
    pub fn workbook_mut(&mut self) -> &mut Workbook {
        &mut self.workbook
    }

    /// The store backing this document
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Split the document into its store and workbook
    pub fn into_parts(self) -> (S, Workbook) {
        (self.store, self.workbook)
    }
}
