//! Style table service
//!
//! Cells and columns reference cell formats by index only. The grid never
//! owns the format definitions; operations that need to know about them take
//! a [`StyleTable`] argument.

use std::sync::Arc;

/// Read access to a workbook's cell formats
pub trait StyleTable {
    /// Number of cell formats defined (valid indices are `0..count`)
    fn cell_format_count(&self) -> u32;

    /// Check if a style index refers to a defined cell format
    fn contains(&self, style_index: u32) -> bool {
        style_index < self.cell_format_count()
    }
}

/// The stylesheet of a workbook
///
/// Index 0 is always the default format. The serialized part is kept as the
/// store read it so documents copied with their style keep identical format
/// indices.
#[derive(Debug, Clone, PartialEq)]
pub struct Stylesheet {
    /// Number of cell formats
    cell_formats: u32,
    /// Stylesheet part as stored in the package (None = generate a default)
    part: Option<Arc<[u8]>>,
}

impl Stylesheet {
    /// Create a stylesheet holding only the default format
    pub fn new() -> Self {
        Self {
            cell_formats: 1,
            part: None,
        }
    }

    /// Stylesheet read from a package part
    pub fn from_part(cell_formats: u32, part: Vec<u8>) -> Self {
        Self {
            cell_formats: cell_formats.max(1),
            part: Some(Arc::from(part)),
        }
    }

    /// The stored part, if this stylesheet was read from a package
    pub fn part(&self) -> Option<&[u8]> {
        self.part.as_deref()
    }
}

impl Default for Stylesheet {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleTable for Stylesheet {
    fn cell_format_count(&self) -> u32 {
        self.cell_formats
    }
}
