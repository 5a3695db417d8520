//! Shared formulas: one anchor cell stores the text, the other cells of the
//! group reuse it with relative references moved by their offset

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use sheetwright_core::{CellRef, ColumnAddress, MAX_ROWS};

/// An A1 reference with an optional sheet prefix. Quoted sheet names are
/// matched whole so that text inside them is never taken for a reference.
static CELL_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?P<sheet>'(?:[^']|'')*'!|[A-Za-z_][A-Za-z0-9_.]*!)?(?P<col_abs>\$?)(?P<col>[A-Za-z]{1,3})(?P<row_abs>\$?)(?P<row>[0-9]+)",
    )
    .expect("valid cell reference pattern")
});

/// The anchors of the shared formula groups of one worksheet, keyed by `si`
#[derive(Debug, Default)]
pub(crate) struct SharedFormulas {
    anchors: HashMap<u32, (CellRef, String)>,
}

impl SharedFormulas {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record the cell holding the text of group `si`
    pub(crate) fn set_anchor(&mut self, si: u32, at: CellRef, formula: &str) {
        self.anchors.insert(si, (at, formula.to_string()));
    }

    /// The formula of group `si` as seen from cell `at`
    pub(crate) fn formula_at(&self, si: u32, at: CellRef) -> Option<String> {
        let (anchor, formula) = self.anchors.get(&si)?;
        let rows = i64::from(at.row) - i64::from(anchor.row);
        let columns = i64::from(at.column) - i64::from(anchor.column);
        Some(translate(formula, rows, columns))
    }
}

/// Move the relative references of `formula` by `rows` and `columns`
///
/// `$`-anchored parts stay put. String literals are copied unchanged. A
/// reference moved off the grid becomes `#REF!`.
pub(crate) fn translate(formula: &str, rows: i64, columns: i64) -> String {
    if rows == 0 && columns == 0 {
        return formula.to_string();
    }

    // Odd pieces sit inside string literals; a doubled quote yields an empty piece
    formula
        .split('"')
        .enumerate()
        .map(|(i, piece)| {
            if i % 2 == 1 {
                piece.to_string()
            } else {
                translate_piece(piece, rows, columns)
            }
        })
        .collect::<Vec<_>>()
        .join("\"")
}

fn translate_piece(piece: &str, rows: i64, columns: i64) -> String {
    let mut out = String::with_capacity(piece.len() + 8);
    let mut last = 0;
    for caps in CELL_REF.captures_iter(piece) {
        let Some(whole) = caps.get(0) else { continue };
        let before = piece[..whole.start()].chars().next_back();
        let after = piece[whole.end()..].chars().next();
        // Part of a longer name, or a function such as LOG10(
        let embedded = before.map_or(false, |c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
            || after.map_or(false, |c| c.is_ascii_alphanumeric() || c == '_' || c == '(' || c == '!');
        if embedded {
            continue;
        }
        let Some(moved) = move_reference(&caps, rows, columns) else {
            continue;
        };
        out.push_str(&piece[last..whole.start()]);
        out.push_str(&moved);
        last = whole.end();
    }
    out.push_str(&piece[last..]);
    out
}

/// The moved reference, or `None` when the match is not a cell of the grid
fn move_reference(caps: &Captures<'_>, rows: i64, columns: i64) -> Option<String> {
    let sheet = caps.name("sheet").map_or("", |m| m.as_str());
    let col_abs = caps.name("col_abs").map_or(false, |m| !m.as_str().is_empty());
    let row_abs = caps.name("row_abs").map_or(false, |m| !m.as_str().is_empty());
    let column = ColumnAddress::parse(caps.name("col")?.as_str()).ok()?.index();
    let row: u32 = caps.name("row")?.as_str().parse().ok()?;
    if row == 0 || row > MAX_ROWS {
        return None;
    }

    let new_column = if col_abs { i64::from(column) } else { i64::from(column) + columns };
    let new_row = if row_abs { i64::from(row) } else { i64::from(row) + rows };
    if new_row < 1 || new_row > i64::from(MAX_ROWS) {
        return Some("#REF!".to_string());
    }
    let Ok(label) = u32::try_from(new_column).map_err(|_| ()).and_then(|c| {
        ColumnAddress::index_to_label(c).map_err(|_| ())
    }) else {
        return Some("#REF!".to_string());
    };

    Some(format!(
        "{}{}{}{}{}",
        sheet,
        if col_abs { "$" } else { "" },
        label,
        if row_abs { "$" } else { "" },
        new_row
    ))
}
