//! Document store contract
//!
//! A store owns the persisted form of a workbook. The grid is read from it
//! once when a document is opened and written back only at explicit save
//! points.

use crate::error::Result;
use crate::workbook::Workbook;

/// Persistence backend for a [`Workbook`]
///
/// Stores are constructed with `open`/`create` style constructors of their
/// own; this trait covers what happens to an acquired store.
pub trait DocumentStore {
    /// Error type of the backend
    type Error: std::error::Error + From<crate::Error>;

    /// Read the workbook held by the store
    fn load(&mut self) -> std::result::Result<Workbook, Self::Error>;

    /// Persist `workbook`, replacing what the store held
    fn save(&mut self, workbook: &Workbook) -> std::result::Result<(), Self::Error>;

    /// Release the store and any handles it holds
    fn close(self) -> std::result::Result<(), Self::Error>
    where
        Self: Sized;
}

/// A store that keeps the last saved workbook in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    saved: Option<Workbook>,
    saves: usize,
}

impl MemoryStore {
    /// Create an empty store; loading it yields a new workbook
    pub fn create() -> Self {
        Self::default()
    }

    /// Create a store holding `workbook`
    pub fn open(workbook: Workbook) -> Self {
        Self {
            saved: Some(workbook),
            saves: 0,
        }
    }

    /// The last saved workbook
    pub fn saved(&self) -> Option<&Workbook> {
        self.saved.as_ref()
    }

    /// Number of explicit saves so far
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl DocumentStore for MemoryStore {
    type Error = crate::Error;

    fn load(&mut self) -> Result<Workbook> {
        Ok(self.saved.clone().unwrap_or_default())
    }

    fn save(&mut self, workbook: &Workbook) -> Result<()> {
        self.saved = Some(workbook.clone());
        self.saves += 1;
        log::debug!("memory store: saved {} sheet(s)", workbook.sheet_count());
        Ok(())
    }

    fn close(self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellValue;

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryStore::create();
        let mut workbook = store.load().unwrap();
        assert_eq!(workbook.sheet_count(), 1);

        workbook
            .worksheet_mut(0)
            .unwrap()
            .append_row()
            .unwrap()
            .append_cell("kept")
            .unwrap();
        assert!(store.saved().is_none());

        store.save(&workbook).unwrap();
        assert_eq!(store.save_count(), 1);

        let reloaded = store.load().unwrap();
        assert_eq!(
            reloaded.worksheet(0).unwrap().cell("A1").unwrap().value(),
            &CellValue::Text("kept".into())
        );
        store.close().unwrap();
    }
}
