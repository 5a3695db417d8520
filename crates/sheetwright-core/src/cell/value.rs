//! Cell value types

use std::fmt;

/// The payload stored in a cell
///
/// Shared-string cells hold only the pool id; resolving the text needs the
/// owning workbook's [`SharedValuePool`](crate::SharedValuePool). Formula cells
/// carry no cached result: their displayed value is stale until an external
/// engine recomputes it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellValue {
    /// Placeholder for a column with no stored value
    Empty,

    /// Literal text stored in the cell itself
    Text(String),

    /// Literal number
    Number(f64),

    /// Boolean value (TRUE/FALSE)
    Boolean(bool),

    /// Error literal such as `#REF!`
    Error(String),

    /// Reference into the workbook's shared value pool
    Shared(u32),

    /// Formula text without the leading `=`
    Formula(String),
}

impl CellValue {
    /// Create a literal text value
    pub fn text<S: Into<String>>(s: S) -> Self {
        CellValue::Text(s.into())
    }

    /// Create a formula value; a leading `=` is stripped
    pub fn formula<S: Into<String>>(text: S) -> Self {
        let text = text.into();
        match text.strip_prefix('=') {
            Some(stripped) => CellValue::Formula(stripped.to_string()),
            None => CellValue::Formula(text),
        }
    }

    /// Check if the cell is an empty placeholder
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Check if the cell contains a formula
    pub fn is_formula(&self) -> bool {
        matches!(self, CellValue::Formula(_))
    }

    /// Get the formula text if this is a formula cell
    pub fn formula_text(&self) -> Option<&str> {
        match self {
            CellValue::Formula(text) => Some(text),
            _ => None,
        }
    }

    /// Get the shared pool id if this is a shared-string cell
    pub fn shared_id(&self) -> Option<u32> {
        match self {
            CellValue::Shared(id) => Some(*id),
            _ => None,
        }
    }

    /// Try to get the value as a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Empty => "empty",
            CellValue::Text(_) => "text",
            CellValue::Number(_) => "number",
            CellValue::Boolean(_) => "boolean",
            CellValue::Error(_) => "error",
            CellValue::Shared(_) => "shared",
            CellValue::Formula(_) => "formula",
        }
    }
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Empty
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Boolean(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            CellValue::Error(e) => f.write_str(e),
            CellValue::Shared(id) => write!(f, "#{}", id),
            CellValue::Formula(text) => write!(f, "={}", text),
        }
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::text(s)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}
