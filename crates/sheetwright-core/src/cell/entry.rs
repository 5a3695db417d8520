//! A single grid cell

use std::borrow::Cow;

use super::{CellRef, CellValue, ColumnAddress};
use crate::error::{Error, Result};
use crate::pool::SharedValuePool;

/// A cell: its column, value payload and style reference
///
/// A cell does not know which row, sheet or workbook it belongs to. Operations
/// that need the shared value pool or the stylesheet take them as arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Column position (reassigned when the cell is placed in a row)
    column: ColumnAddress,
    /// The cell's value
    value: CellValue,
    /// Index into the workbook's cell formats (not owned)
    style_index: Option<u32>,
}

impl Cell {
    /// Create a new unplaced cell with a value and no style
    pub fn new<V: Into<CellValue>>(value: V) -> Self {
        Self {
            column: ColumnAddress::FIRST,
            value: value.into(),
            style_index: None,
        }
    }

    /// Create a cell that targets a specific column label
    pub fn at<V: Into<CellValue>>(column: &str, value: V) -> Result<Self> {
        Ok(Self {
            column: ColumnAddress::parse(column)?,
            value: value.into(),
            style_index: None,
        })
    }

    /// Create a cell holding a shared value reference
    pub fn shared(id: u32) -> Self {
        Self::new(CellValue::Shared(id))
    }

    /// Create a cell holding a formula
    pub fn with_formula<S: Into<String>>(text: S) -> Self {
        Self::new(CellValue::formula(text))
    }

    /// Create an empty placeholder for a column with no stored cell
    pub fn placeholder(column: ColumnAddress) -> Self {
        Self {
            column,
            value: CellValue::Empty,
            style_index: None,
        }
    }

    /// Set the style index (builder form)
    pub fn with_style(mut self, style_index: u32) -> Self {
        self.style_index = Some(style_index);
        self
    }

    /// Column position
    pub fn column(&self) -> ColumnAddress {
        self.column
    }

    /// 1-based column index
    pub fn column_index(&self) -> u32 {
        self.column.index()
    }

    /// Column label ("A", "B", ...)
    pub fn column_label(&self) -> String {
        self.column.label()
    }

    /// Reference of this cell when it sits in `row`
    pub fn cell_ref(&self, row: u32) -> CellRef {
        CellRef::new(self.column.index(), row)
    }

    pub(crate) fn set_column(&mut self, column: ColumnAddress) {
        self.column = column;
    }

    /// The value payload
    pub fn value(&self) -> &CellValue {
        &self.value
    }

    /// Replace the value payload
    pub fn set_value<V: Into<CellValue>>(&mut self, value: V) {
        self.value = value.into();
    }

    /// Formula text, if this is a formula cell
    pub fn formula(&self) -> Option<&str> {
        self.value.formula_text()
    }

    /// Style index, if one is assigned
    pub fn style_index(&self) -> Option<u32> {
        self.style_index
    }

    /// Assign a style index from the workbook's cell formats
    pub fn set_style(&mut self, style_index: u32) {
        self.style_index = Some(style_index);
    }

    /// Remove the style reference
    pub fn clear_style(&mut self) {
        self.style_index = None;
    }

    /// Check if this is an unstyled empty placeholder
    pub fn is_placeholder(&self) -> bool {
        self.value.is_empty() && self.style_index.is_none()
    }

    /// Read the cell's value as text
    ///
    /// Shared references are resolved through `pool`. Formula cells have no
    /// current value until recomputed and fail with [`Error::InvalidState`].
    pub fn value_text<'a>(&'a self, pool: &'a SharedValuePool) -> Result<Cow<'a, str>> {
        match &self.value {
            CellValue::Empty => Ok(Cow::Borrowed("")),
            CellValue::Text(s) | CellValue::Error(s) => Ok(Cow::Borrowed(s.as_str())),
            CellValue::Number(n) => Ok(Cow::Owned(n.to_string())),
            CellValue::Boolean(b) => Ok(Cow::Borrowed(if *b { "TRUE" } else { "FALSE" })),
            CellValue::Shared(id) => pool.resolve(*id).map(Cow::Borrowed),
            CellValue::Formula(text) => Err(Error::InvalidState(format!(
                "formula cell {} (={}) has no value until it is recalculated",
                self.column_label(),
                text
            ))),
        }
    }

    /// Rebuild this cell against another workbook's shared value pool
    ///
    /// Shared references are resolved in `source` and re-interned in `target`,
    /// so the returned cell may carry a different id. Other payloads are
    /// copied verbatim. The style index is copied by number without remapping.
    pub fn rebuilt_for(
        &self,
        source: &SharedValuePool,
        target: &mut SharedValuePool,
    ) -> Result<Cell> {
        let value = match &self.value {
            CellValue::Shared(id) => CellValue::Shared(target.intern(source.resolve(*id)?)),
            other => other.clone(),
        };
        Ok(Cell {
            column: self.column,
            value,
            style_index: self.style_index,
        })
    }
}
