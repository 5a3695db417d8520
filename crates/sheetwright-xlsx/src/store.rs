//! File-backed document store

use std::path::{Path, PathBuf};

use crate::error::{XlsxError, XlsxResult};
use crate::options::StoreOptions;
use crate::reader::XlsxReader;
use crate::writer::XlsxWriter;
use sheetwright_core::{DocumentStore, Workbook};

/// An XLSX package on disk
///
/// The package is read when the store is opened. Nothing is written until
/// [`DocumentStore::save`] is called.
#[derive(Debug)]
pub struct XlsxStore {
    path: PathBuf,
    options: StoreOptions,
    loaded: Option<Workbook>,
}

impl XlsxStore {
    /// Open an existing package
    pub fn open<P: AsRef<Path>>(path: P, options: StoreOptions) -> XlsxResult<Self> {
        let path = path.as_ref().to_path_buf();
        let workbook = XlsxReader::read_file(&path)?;
        log::info!(
            "opened {} ({} sheet(s){})",
            path.display(),
            workbook.sheet_count(),
            if options.editable { "" } else { ", read-only" }
        );
        Ok(Self {
            path,
            options,
            loaded: Some(workbook),
        })
    }

    /// Create a store for a new package at `path`
    ///
    /// The file is created on the first save.
    pub fn create<P: AsRef<Path>>(path: P, options: StoreOptions) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            options,
            loaded: None,
        }
    }

    /// Location of the package
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Options the store was opened with
    pub fn options(&self) -> StoreOptions {
        self.options
    }

    /// Whether saving is allowed
    pub fn is_editable(&self) -> bool {
        self.options.editable
    }
}

impl DocumentStore for XlsxStore {
    type Error = XlsxError;

    fn load(&mut self) -> XlsxResult<Workbook> {
        if let Some(workbook) = self.loaded.take() {
            return Ok(workbook);
        }
        if self.path.exists() {
            XlsxReader::read_file(&self.path)
        } else {
            Ok(Workbook::new())
        }
    }

    fn save(&mut self, workbook: &Workbook) -> XlsxResult<()> {
        if !self.options.editable {
            return Err(XlsxError::ReadOnly(self.path.clone()));
        }
        XlsxWriter::write_file(workbook, &self.path, self.options.compression)?;
        log::info!(
            "saved {} ({} sheet(s))",
            self.path.display(),
            workbook.sheet_count()
        );
        Ok(())
    }

    fn close(self) -> XlsxResult<()> {
        log::debug!("closed {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetwright_core::CellValue;

    #[test]
    fn test_create_writes_nothing_until_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.xlsx");

        let mut store = XlsxStore::create(&path, StoreOptions::default());
        let mut workbook = store.load().unwrap();
        assert!(!path.exists());

        workbook
            .worksheet_mut(0)
            .unwrap()
            .append_row()
            .unwrap()
            .append_cell(42.0)
            .unwrap();
        store.save(&workbook).unwrap();
        store.close().unwrap();
        assert!(path.exists());

        let mut reopened = XlsxStore::open(&path, StoreOptions::read_only()).unwrap();
        let workbook = reopened.load().unwrap();
        assert_eq!(
            workbook.worksheet(0).unwrap().cell("A1").unwrap().value(),
            &CellValue::Number(42.0)
        );
    }

    #[test]
    fn test_read_only_store_refuses_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locked.xlsx");
        XlsxWriter::write_file(&Workbook::new(), &path, Default::default()).unwrap();

        let mut store = XlsxStore::open(&path, StoreOptions::read_only()).unwrap();
        assert!(!store.is_editable());
        let workbook = store.load().unwrap();
        assert!(matches!(store.save(&workbook), Err(XlsxError::ReadOnly(_))));
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = XlsxStore::open(dir.path().join("missing.xlsx"), StoreOptions::default());
        assert!(matches!(result, Err(XlsxError::Io(_))));
    }
}
