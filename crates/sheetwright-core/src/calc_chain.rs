//! Calculation chain: the document's index of formula cells
//!
//! The chain lists every formula cell by sheet and reference so a consumer can
//! recalculate in order. It lives outside the grid, so any operation that
//! relabels a formula cell must repoint the matching entry through
//! [`FormulaIndex`].

use ahash::AHashMap;

use crate::cell::CellRef;

/// Sink for formula-cell relocations performed by grid operations
pub trait FormulaIndex {
    /// Apply a batch of moves; every entry is matched against its position
    /// before the batch, so chained moves (B->C, C->D) do not cascade.
    fn relocate(&mut self, moves: &[(CellRef, CellRef)]);

    /// Drop the entry for a formula cell that no longer exists
    fn remove(&mut self, cell: CellRef);
}

/// A [`FormulaIndex`] that records nothing, for rows that are not attached
/// to a document yet
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFormulaIndex;

impl FormulaIndex for NoFormulaIndex {
    fn relocate(&mut self, _moves: &[(CellRef, CellRef)]) {}

    fn remove(&mut self, _cell: CellRef) {}
}

/// One calculation chain entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalcChainEntry {
    /// Id of the sheet holding the formula
    pub sheet_id: u32,
    /// Reference of the formula cell
    pub cell: CellRef,
}

/// Ordered list of formula cells across all sheets of a workbook
#[derive(Debug, Clone, Default)]
pub struct CalcChain {
    entries: Vec<CalcChainEntry>,
}

impl CalcChain {
    /// Create an empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a chain from entries in calculation order
    pub fn from_entries(entries: Vec<CalcChainEntry>) -> Self {
        Self { entries }
    }

    /// Append an entry
    pub fn push(&mut self, sheet_id: u32, cell: CellRef) {
        self.entries.push(CalcChainEntry { sheet_id, cell });
    }

    /// All entries in calculation order
    pub fn entries(&self) -> &[CalcChainEntry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the chain is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check if a formula cell is listed
    pub fn contains(&self, sheet_id: u32, cell: CellRef) -> bool {
        self.entries
            .iter()
            .any(|e| e.sheet_id == sheet_id && e.cell == cell)
    }

    /// Drop every entry of a sheet
    pub fn remove_sheet(&mut self, sheet_id: u32) {
        self.entries.retain(|e| e.sheet_id != sheet_id);
    }

    /// Keep only the entries for which `keep` returns true
    pub fn retain<F: FnMut(&CalcChainEntry) -> bool>(&mut self, keep: F) {
        self.entries.retain(keep);
    }

    /// View of the chain scoped to one sheet
    pub fn for_sheet(&mut self, sheet_id: u32) -> SheetCalcChain<'_> {
        SheetCalcChain {
            chain: self,
            sheet_id,
        }
    }
}

/// Calculation chain entries of a single sheet, usable as a [`FormulaIndex`]
#[derive(Debug)]
pub struct SheetCalcChain<'a> {
    chain: &'a mut CalcChain,
    sheet_id: u32,
}

impl FormulaIndex for SheetCalcChain<'_> {
    fn relocate(&mut self, moves: &[(CellRef, CellRef)]) {
        if moves.is_empty() {
            return;
        }
        let sheet_id = self.sheet_id;
        let targets: AHashMap<CellRef, CellRef> = moves.iter().copied().collect();

        for entry in self
            .chain
            .entries
            .iter_mut()
            .filter(|e| e.sheet_id == sheet_id)
        {
            if let Some(&to) = targets.get(&entry.cell) {
                log::trace!("calc chain: sheet {} {} -> {}", sheet_id, entry.cell, to);
                entry.cell = to;
            }
        }
    }

    fn remove(&mut self, cell: CellRef) {
        let sheet_id = self.sheet_id;
        self.chain
            .entries
            .retain(|e| !(e.sheet_id == sheet_id && e.cell == cell));
    }
}
