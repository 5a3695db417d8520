//! Row types: the ordered cells of one row

use crate::calc_chain::FormulaIndex;
use crate::cell::{Cell, CellRef, CellValue, ColumnAddress};
use crate::error::{Error, Result};
use crate::MAX_COLS;

/// A row and its cells
///
/// Cells are kept sorted by column with at most one cell per column. Column
/// labels are derived from the cell positions, so every operation that moves
/// cells keeps the order and relabels in one step.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Row index (1-based)
    index: u32,
    /// Cells ordered by column
    cells: Vec<Cell>,
    /// Custom height (None = default)
    pub height: Option<f64>,
    /// Row is hidden
    pub hidden: bool,
    /// Outline/grouping level (0-7)
    pub outline_level: u8,
    /// Row-level style index (None = no row style)
    pub style_index: Option<u32>,
    /// Row is collapsed (in outline)
    pub collapsed: bool,
}

impl Row {
    /// Create a new empty row with default settings
    pub fn new(index: u32) -> Self {
        Self {
            index,
            cells: Vec::new(),
            height: None,
            hidden: false,
            outline_level: 0,
            style_index: None,
            collapsed: false,
        }
    }

    /// Build a row from the cells stored for it in a document
    ///
    /// Stored rows are often sparse. Every column before the last stored cell
    /// that has no cell gets an empty placeholder, so the row reads like a
    /// dense one and the cell at column `n` sits at position `n - 1`.
    pub fn from_stored(index: u32, mut cells: Vec<Cell>) -> Result<Self> {
        cells.sort_by_key(Cell::column_index);

        let capacity = cells.last().map_or(0, |c| c.column_index() as usize);
        let mut dense: Vec<Cell> = Vec::with_capacity(capacity);
        for cell in cells {
            let column = cell.column_index();
            if column > MAX_COLS {
                return Err(Error::column_overflow(column));
            }
            if dense.last().map_or(false, |c| c.column_index() == column) {
                return Err(Error::InvalidState(format!(
                    "row {} stores column {} twice",
                    index,
                    cell.column_label()
                )));
            }
            for missing in dense.len() as u32 + 1..column {
                dense.push(Cell::placeholder(ColumnAddress::new(missing)?));
            }
            dense.push(cell);
        }

        let mut row = Self::new(index);
        row.cells = dense;
        Ok(row)
    }

    /// A row with the same settings and index but no cells
    pub fn clone_empty(&self) -> Self {
        Self {
            index: self.index,
            cells: Vec::new(),
            height: self.height,
            hidden: self.hidden,
            outline_level: self.outline_level,
            style_index: self.style_index,
            collapsed: self.collapsed,
        }
    }

    /// Row index (1-based)
    pub fn index(&self) -> u32 {
        self.index
    }

    pub(crate) fn set_index(&mut self, index: u32) {
        self.index = index;
    }

    /// Cells in column order
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Consume the row, returning its cells in column order
    pub fn into_cells(self) -> Vec<Cell> {
        self.cells
    }

    /// Number of cells (placeholders included)
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if row has any cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Column of the last cell
    pub fn last_column(&self) -> Option<ColumnAddress> {
        self.cells.last().map(Cell::column)
    }

    /// Check if this row has any custom settings
    pub fn has_custom_settings(&self) -> bool {
        self.height.is_some()
            || self.hidden
            || self.outline_level > 0
            || self.style_index.is_some()
            || self.collapsed
    }

    // === Lookup ===

    /// Get a cell by column label
    pub fn get_cell_by_column_label(&self, label: &str) -> Option<&Cell> {
        let index = ColumnAddress::label_to_index(label).ok()?;
        self.get_cell_by_column_index(index)
    }

    /// Get a cell by 1-based column index
    pub fn get_cell_by_column_index(&self, index: u32) -> Option<&Cell> {
        self.position_of(index).map(|pos| &self.cells[pos])
    }

    /// Get a mutable cell by column label
    pub fn get_cell_by_column_label_mut(&mut self, label: &str) -> Option<&mut Cell> {
        let index = ColumnAddress::label_to_index(label).ok()?;
        self.get_cell_by_column_index_mut(index)
    }

    /// Get a mutable cell by 1-based column index
    pub fn get_cell_by_column_index_mut(&mut self, index: u32) -> Option<&mut Cell> {
        self.position_of(index).map(move |pos| &mut self.cells[pos])
    }

    /// Cells strictly right of a column label, in column order
    pub fn cells_right_of<'a>(&'a self, label: &str) -> impl Iterator<Item = &'a Cell> + 'a {
        // An unparseable label has nothing to its right
        let index = ColumnAddress::label_to_index(label).unwrap_or(u32::MAX);
        self.cells_right_of_index(index)
    }

    /// Cells strictly right of a 1-based column index, in column order
    pub fn cells_right_of_index(&self, index: u32) -> impl Iterator<Item = &Cell> + '_ {
        let start = self.cells.partition_point(|c| c.column_index() <= index);
        self.cells[start..].iter()
    }

    fn position_of(&self, index: u32) -> Option<usize> {
        // Dense rows keep column n at position n - 1
        let guess = (index as usize).checked_sub(1)?;
        if self
            .cells
            .get(guess)
            .map_or(false, |c| c.column_index() == index)
        {
            return Some(guess);
        }
        self.cells
            .binary_search_by_key(&index, Cell::column_index)
            .ok()
    }

    // === Append ===

    /// Append a new cell after the last cell (or at "A" if the row is empty)
    pub fn append_cell<V: Into<CellValue>>(&mut self, value: V) -> Result<&mut Cell> {
        self.append_existing(Cell::new(value))
    }

    /// Append an existing cell after the last cell, relabelling it
    ///
    /// The cell is moved into the row; pass `cell.clone()` to keep the
    /// original.
    pub fn append_existing(&mut self, mut cell: Cell) -> Result<&mut Cell> {
        let column = self.next_free_column()?;
        cell.set_column(column);
        self.cells.push(cell);
        let last = self.cells.len() - 1;
        Ok(&mut self.cells[last])
    }

    /// Append several cells in order, relabelling each
    pub fn append_cells<I: IntoIterator<Item = Cell>>(&mut self, cells: I) -> Result<()> {
        for cell in cells {
            self.append_existing(cell)?;
        }
        Ok(())
    }

    fn next_free_column(&self) -> Result<ColumnAddress> {
        match self.cells.last() {
            None => Ok(ColumnAddress::FIRST),
            Some(last) if last.column_index() >= MAX_COLS => {
                Err(Error::column_overflow(last.column_index() + 1))
            }
            Some(last) => last.column().next(),
        }
    }

    // === Insert ===

    /// Insert a cell at a column label
    ///
    /// If a cell already occupies the column, it and every cell right of it
    /// move one column right first. Formula cells that move are repointed in
    /// `formulas`. Fails with [`Error::ColumnOverflow`] without touching the
    /// row if the last cell would move past [`MAX_COLS`].
    pub fn insert_cell_at(
        &mut self,
        cell: Cell,
        label: &str,
        formulas: &mut dyn FormulaIndex,
    ) -> Result<&mut Cell> {
        let column = ColumnAddress::parse(label)
            .map_err(|_| Error::not_found(format!("column '{}'", label)))?;
        self.insert_cell_at_index(cell, column.index(), formulas)
    }

    /// Insert a cell at a 1-based column index (see [`Row::insert_cell_at`])
    pub fn insert_cell_at_index(
        &mut self,
        mut cell: Cell,
        index: u32,
        formulas: &mut dyn FormulaIndex,
    ) -> Result<&mut Cell> {
        let column = ColumnAddress::new(index)?;
        if index > MAX_COLS {
            return Err(Error::column_overflow(index));
        }

        let pos = self.cells.partition_point(|c| c.column_index() < index);
        if self
            .cells
            .get(pos)
            .map_or(false, |c| c.column_index() == index)
        {
            self.shift_right_from(pos, formulas)?;
        }

        cell.set_column(column);
        self.cells.insert(pos, cell);
        Ok(&mut self.cells[pos])
    }

    /// Insert a cell at the column it already carries
    pub fn insert_cell(&mut self, cell: Cell, formulas: &mut dyn FormulaIndex) -> Result<&mut Cell> {
        let index = cell.column_index();
        self.insert_cell_at_index(cell, index, formulas)
    }

    /// Insert several cells, each at the column it already carries
    pub fn insert_cells<I: IntoIterator<Item = Cell>>(
        &mut self,
        cells: I,
        formulas: &mut dyn FormulaIndex,
    ) -> Result<()> {
        for cell in cells {
            self.insert_cell(cell, formulas)?;
        }
        Ok(())
    }

    /// Check that every cell from `index` on can move one column right
    pub fn check_shift_right(&self, index: u32) -> Result<()> {
        match self.cells.last() {
            Some(last) if last.column_index() >= index && last.column_index() >= MAX_COLS => {
                Err(Error::column_overflow(last.column_index() + 1))
            }
            _ => Ok(()),
        }
    }

    fn shift_right_from(&mut self, pos: usize, formulas: &mut dyn FormulaIndex) -> Result<()> {
        let Some(first) = self.cells.get(pos) else {
            return Ok(());
        };
        self.check_shift_right(first.column_index())?;

        let row = self.index;
        let mut moves = Vec::new();
        for cell in &mut self.cells[pos..] {
            let from = cell.column();
            // Checked above: the last cell is below MAX_COLS
            let to = from.next()?;
            if cell.value().is_formula() {
                moves.push((cell.cell_ref(row), CellRef::new(to.index(), row)));
            }
            cell.set_column(to);
        }

        log::trace!(
            "row {}: shifted {} cell(s) right",
            row,
            self.cells.len() - pos
        );
        formulas.relocate(&moves);
        Ok(())
    }

    // === Remove ===

    /// Remove the cell at a column label
    ///
    /// With `move_all_right_of`, every remaining cell right of the column
    /// moves one column left, whether or not a cell was removed.
    pub fn remove_cell(
        &mut self,
        label: &str,
        move_all_right_of: bool,
        formulas: &mut dyn FormulaIndex,
    ) -> Option<Cell> {
        let index = ColumnAddress::label_to_index(label).ok()?;
        self.remove_cell_at_index(index, move_all_right_of, formulas)
    }

    /// Remove the cell at a 1-based column index (see [`Row::remove_cell`])
    pub fn remove_cell_at_index(
        &mut self,
        index: u32,
        move_all_right_of: bool,
        formulas: &mut dyn FormulaIndex,
    ) -> Option<Cell> {
        let removed = self.position_of(index).map(|pos| self.cells.remove(pos));
        if let Some(cell) = &removed {
            if cell.value().is_formula() {
                formulas.remove(cell.cell_ref(self.index));
            }
        }

        if move_all_right_of {
            self.shift_left_after(index, formulas);
        }
        removed
    }

    fn shift_left_after(&mut self, index: u32, formulas: &mut dyn FormulaIndex) {
        let row = self.index;
        let start = self.cells.partition_point(|c| c.column_index() <= index);
        let mut moves = Vec::new();

        for cell in &mut self.cells[start..] {
            // Every cell here is right of `index` >= 1, so column >= 2
            let to = cell.column_index() - 1;
            if cell.value().is_formula() {
                moves.push((cell.cell_ref(row), CellRef::new(to, row)));
            }
            if let Ok(column) = ColumnAddress::new(to) {
                cell.set_column(column);
            }
        }

        if start < self.cells.len() {
            log::trace!(
                "row {}: shifted {} cell(s) left",
                row,
                self.cells.len() - start
            );
        }
        formulas.relocate(&moves);
    }

    // === Move ===

    /// Move a whole column within this row
    ///
    /// Equivalent to removing the column with a left shift and then inserting
    /// it at `to` with a right shift: the cell at `from` lands on `to` and the
    /// cells between the two positions close up. Columns with no cell move the
    /// same way, so the row stays aligned with rows that do hold the column.
    /// A no-op if `from == to`.
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

    /// Move a whole column by 1-based indices (see [`Row::move_column`])
    pub fn move_column_index(
        &mut self,
        from: u32,
        to: u32,
        formulas: &mut dyn FormulaIndex,
    ) -> Result<()> {
        ColumnAddress::new(from)?;
        ColumnAddress::new(to)?;
        if from > MAX_COLS {
            return Err(Error::column_overflow(from));
        }
        if to > MAX_COLS {
            return Err(Error::column_overflow(to));
        }
        if from == to {
            return Ok(());
        }

        let row = self.index;
        let mut moves = Vec::new();
        for cell in &mut self.cells {
            let old = cell.column_index();
            let new = moved_column(old, from, to);
            if new != old {
                if cell.value().is_formula() {
                    moves.push((CellRef::new(old, row), CellRef::new(new, row)));
                }
                cell.set_column(ColumnAddress::new(new)?);
            }
        }

        // The mapping is a bijection on columns, so sorting restores strict order
        self.cells.sort_by_key(Cell::column_index);
        formulas.relocate(&moves);
        Ok(())
    }

    /// Formula cells of this row, by reference
    pub(crate) fn formula_refs(&self) -> impl Iterator<Item = CellRef> + '_ {
        self.cells
            .iter()
            .filter(|c| c.value().is_formula())
            .map(move |c| c.cell_ref(self.index))
    }
}

/// Where column `col` ends up when column `from` moves to `to`
fn moved_column(col: u32, from: u32, to: u32) -> u32 {
    if col == from {
        to
    } else if from < to && col > from && col <= to {
        col - 1
    } else if from > to && col >= to && col < from {
        col + 1
    } else {
        col
    }
}
