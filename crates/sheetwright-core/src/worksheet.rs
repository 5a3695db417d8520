//! Worksheet type: the ordered rows of one sheet

use crate::calc_chain::{FormulaIndex, NoFormulaIndex};
use crate::cell::{Cell, CellRef, ColumnAddress};
use crate::column::ColumnStyleRanges;
use crate::error::{Error, Result};
use crate::pool::SharedValuePool;
use crate::row::Row;
use crate::style::StyleTable;
use crate::{MAX_COLS, MAX_ROWS};

/// A worksheet (single sheet in a workbook)
///
/// Rows are kept in strictly increasing index order. Column formats live in
/// [`ColumnStyleRanges`] and follow column moves and removals.
#[derive(Debug, Clone)]
pub struct Worksheet {
    /// Sheet name
    name: String,
    /// Sheet id, unique within the workbook and never reused
    sheet_id: u32,
    /// Rows ordered by index
    rows: Vec<Row>,
    /// Column formats
    columns: ColumnStyleRanges,
    /// Sheet is visible
    visible: bool,
}

impl Worksheet {
    /// Create a new worksheet with the given name
    pub fn new<S: Into<String>>(name: S, sheet_id: u32) -> Self {
        Self {
            name: name.into(),
            sheet_id,
            rows: Vec::new(),
            columns: ColumnStyleRanges::new(),
            visible: true,
        }
    }

    /// Build a worksheet from rows and column formats read from a document
    pub fn from_stored<S: Into<String>>(
        name: S,
        sheet_id: u32,
        mut rows: Vec<Row>,
        columns: ColumnStyleRanges,
    ) -> Result<Self> {
        let name = name.into();
        rows.sort_by_key(Row::index);
        for pair in rows.windows(2) {
            if pair[0].index() == pair[1].index() {
                return Err(Error::InvalidState(format!(
                    "sheet '{}' stores row {} twice",
                    name,
                    pair[0].index()
                )));
            }
        }
        if let Some(row) = rows.iter().find(|r| r.index() == 0 || r.index() > MAX_ROWS) {
            return Err(Error::RowOutOfBounds(row.index(), MAX_ROWS));
        }

        Ok(Self {
            name,
            sheet_id,
            rows,
            columns,
            visible: true,
        })
    }

    /// Get the sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    /// Sheet id
    pub fn sheet_id(&self) -> u32 {
        self.sheet_id
    }

    /// Check if the sheet is visible
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Set sheet visibility
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    // === Row Access ===

    /// All rows in index order
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get a row by its 1-based index
    pub fn row(&self, index: u32) -> Option<&Row> {
        self.position_of(index).ok().map(|pos| &self.rows[pos])
    }

    /// Get a mutable row by its 1-based index
    pub fn row_mut(&mut self, index: u32) -> Option<&mut Row> {
        self.position_of(index).ok().map(move |pos| &mut self.rows[pos])
    }

    /// Index of the last row
    pub fn last_row_index(&self) -> Option<u32> {
        self.rows.last().map(Row::index)
    }

    /// Get a cell by reference string (e.g., "B12")
    pub fn cell(&self, reference: &str) -> Option<&Cell> {
        let reference = CellRef::parse(reference).ok()?;
        self.cell_at(reference.row, reference.column)
    }

    /// Get a cell by 1-based row and column indices
    pub fn cell_at(&self, row: u32, column: u32) -> Option<&Cell> {
        self.row(row)?.get_cell_by_column_index(column)
    }

    /// Column formats
    pub fn columns(&self) -> &ColumnStyleRanges {
        &self.columns
    }

    /// Mutable column formats
    pub fn columns_mut(&mut self) -> &mut ColumnStyleRanges {
        &mut self.columns
    }

    fn position_of(&self, index: u32) -> std::result::Result<usize, usize> {
        self.rows.binary_search_by_key(&index, Row::index)
    }

    fn next_row_index(&self) -> Result<u32> {
        let index = self.last_row_index().map_or(1, |last| last + 1);
        if index > MAX_ROWS {
            return Err(Error::RowOutOfBounds(index, MAX_ROWS));
        }
        Ok(index)
    }

    // === Append / Insert Rows ===

    /// Append an empty row after the last row (or as row 1)
    pub fn append_row(&mut self) -> Result<&mut Row> {
        let index = self.next_row_index()?;
        self.rows.push(Row::new(index));
        let last = self.rows.len() - 1;
        Ok(&mut self.rows[last])
    }

    /// Append a row built from `reference` after the last row
    ///
    /// The new row takes the reference row's settings. Its cells keep their
    /// column labels rather than being re-sequenced. The reference row is
    /// consumed; pass a clone to keep it.
    pub fn append_row_from(&mut self, reference: Row) -> Result<&mut Row> {
        let index = self.next_row_index()?;
        let row = Self::build_row(reference, index)?;
        self.rows.push(row);
        let last = self.rows.len() - 1;
        Ok(&mut self.rows[last])
    }

    /// Insert a row built from `reference` at `index`
    ///
    /// If a row already holds `index`, it and every row below it move down by
    /// one and their formula cells are repointed in `formulas`.
    pub fn insert_row_at(
        &mut self,
        reference: Row,
        index: u32,
        formulas: &mut dyn FormulaIndex,
    ) -> Result<&mut Row> {
        if index == 0 || index > MAX_ROWS {
            return Err(Error::RowOutOfBounds(index, MAX_ROWS));
        }
        let row = Self::build_row(reference, index)?;

        let pos = match self.position_of(index) {
            Ok(pos) => {
                if let Some(last) = self.last_row_index().filter(|&l| l >= MAX_ROWS) {
                    return Err(Error::RowOutOfBounds(last + 1, MAX_ROWS));
                }
                self.shift_rows_down(pos, formulas);
                pos
            }
            Err(pos) => pos,
        };

        self.rows.insert(pos, row);
        Ok(&mut self.rows[pos])
    }

    fn build_row(reference: Row, index: u32) -> Result<Row> {
        let mut row = reference.clone_empty();
        row.set_index(index);
        // A fresh row holds no formula cells that could need repointing
        row.insert_cells(reference.into_cells(), &mut NoFormulaIndex)?;
        Ok(row)
    }

    fn shift_rows_down(&mut self, pos: usize, formulas: &mut dyn FormulaIndex) {
        let mut moves = Vec::new();
        for row in &mut self.rows[pos..] {
            let index = row.index() + 1;
            moves.extend(
                row.formula_refs()
                    .map(|cell| (cell, CellRef::new(cell.column, index))),
            );
            row.set_index(index);
        }

        log::debug!(
            "sheet '{}': moved {} row(s) down",
            self.name,
            self.rows.len() - pos
        );
        formulas.relocate(&moves);
    }

    // === Column Operations ===

    /// Move a whole column within this sheet
    ///
    /// Every row moves the column (see [`Row::move_column`]) and the column
    /// formats follow. A no-op if `from == to`.
    pub fn move_column(
        &mut self,
        from: &str,
        to: &str,
        formulas: &mut dyn FormulaIndex,
    ) -> Result<()> {
        let from = ColumnAddress::label_to_index(from)?;
        let to = ColumnAddress::label_to_index(to)?;
        self.move_column_index(from, to, formulas)
    }

    /// Move a whole column by 1-based indices (see [`Worksheet::move_column`])
    pub fn move_column_index(
        &mut self,
        from: u32,
        to: u32,
        formulas: &mut dyn FormulaIndex,
    ) -> Result<()> {
        for index in [from, to] {
            if index == 0 {
                return Err(Error::OutOfRange("column index 0".into()));
            }
            if index > MAX_COLS {
                return Err(Error::column_overflow(index));
            }
        }
        if from == to {
            return Ok(());
        }

        for row in &mut self.rows {
            row.move_column_index(from, to, formulas)?;
        }
        self.columns.move_column(from, to)?;

        log::debug!(
            "sheet '{}': moved column {} to {} in {} row(s)",
            self.name,
            from,
            to,
            self.rows.len()
        );
        Ok(())
    }

    /// Remove a whole column from this sheet
    ///
    /// With `move_all_right_of`, every column right of it moves one left and
    /// the column formats close the gap as well.
    pub fn remove_column(
        &mut self,
        label: &str,
        move_all_right_of: bool,
        formulas: &mut dyn FormulaIndex,
    ) -> Result<()> {
        let index = ColumnAddress::label_to_index(label)?;

        let mut removed = 0;
        for row in &mut self.rows {
            if row
                .remove_cell_at_index(index, move_all_right_of, formulas)
                .is_some()
            {
                removed += 1;
            }
        }
        if move_all_right_of {
            self.columns.remove_at(index);
        }

        log::debug!(
            "sheet '{}': removed column {} ({} cell(s), shift: {})",
            self.name,
            label,
            removed,
            move_all_right_of
        );
        Ok(())
    }

    // === Cross-Document Copy ===

    /// Append a copy of a row that belongs to another document
    ///
    /// Cells are rebuilt against `target`, this document's shared value pool:
    /// shared text is re-interned, other values are copied verbatim. Style
    /// indices are copied by number and never remapped; an index that
    /// `styles` does not define is logged.
    pub fn copy_row_from_other_document(
        &mut self,
        row: &Row,
        source: &SharedValuePool,
        target: &mut SharedValuePool,
        styles: &dyn StyleTable,
    ) -> Result<&mut Row> {
        let index = self.next_row_index()?;
        let mut staged = target.clone();
        let cells = self.rebuild_cells(row.cells(), source, &mut staged, styles)?;

        let mut copy = row.clone_empty();
        copy.set_index(index);
        copy.insert_cells(cells, &mut NoFormulaIndex)?;
        self.rows.push(copy);
        *target = staged;

        let last = self.rows.len() - 1;
        Ok(&mut self.rows[last])
    }

    /// Insert copies of cells from another document into row `row_index`
    ///
    /// Each cell is rebuilt as in [`Worksheet::copy_row_from_other_document`]
    /// and inserted at its own column, shifting occupied columns right. The
    /// row is created if it does not exist yet.
    pub fn copy_cells_from_other_document(
        &mut self,
        row_index: u32,
        cells: &[Cell],
        source: &SharedValuePool,
        target: &mut SharedValuePool,
        styles: &dyn StyleTable,
        formulas: &mut dyn FormulaIndex,
    ) -> Result<()> {
        if row_index == 0 || row_index > MAX_ROWS {
            return Err(Error::RowOutOfBounds(row_index, MAX_ROWS));
        }
        // Interned into a staged pool first so a failure leaves `target` as it was
        let mut staged = target.clone();
        let cells = self.rebuild_cells(cells, source, &mut staged, styles)?;

        // Dry run on a scratch copy so an overflow leaves the sheet and `formulas` as they were
        let mut scratch = self.row(row_index).cloned().unwrap_or_else(|| Row::new(row_index));
        scratch.insert_cells(cells.iter().cloned(), &mut NoFormulaIndex)?;

        let pos = match self.position_of(row_index) {
            Ok(pos) => pos,
            Err(pos) => {
                self.rows.insert(pos, Row::new(row_index));
                pos
            }
        };
        self.rows[pos].insert_cells(cells, formulas)?;
        *target = staged;
        Ok(())
    }

    fn rebuild_cells(
        &self,
        cells: &[Cell],
        source: &SharedValuePool,
        target: &mut SharedValuePool,
        styles: &dyn StyleTable,
    ) -> Result<Vec<Cell>> {
        cells
            .iter()
            .map(|cell| {
                if let Some(style) = cell.style_index().filter(|&s| !styles.contains(s)) {
                    log::warn!(
                        "sheet '{}': copied cell {} keeps style index {} which the destination \
                         stylesheet does not define ({} formats)",
                        self.name,
                        cell.column_label(),
                        style,
                        styles.cell_format_count()
                    );
                }
                cell.rebuilt_for(source, target)
            })
            .collect()
    }
}
