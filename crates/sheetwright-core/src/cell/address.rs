//! Column labels and cell references

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// A 1-based column position rendered as a bijective base-26 label
///
/// Column labels use the symbols A-Z with values 1-26 and no zero digit, so
/// `A = 1`, `Z = 26`, `AA = 27`, `AZ = 52`, `BA = 53`. Label arithmetic is
/// unbounded; the worksheet limit ([`crate::MAX_COLS`]) is only enforced when
/// cells are shifted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColumnAddress(u32);

impl ColumnAddress {
    /// Column "A"
    pub const FIRST: ColumnAddress = ColumnAddress(1);

    /// Create a column address from a 1-based index
    pub fn new(index: u32) -> Result<Self> {
        if index == 0 {
            return Err(Error::OutOfRange("column index 0 has no label".into()));
        }
        Ok(Self(index))
    }

    /// Parse a column label (case-insensitive)
    ///
    /// # Examples
    /// ```
    /// use sheetwright_core::ColumnAddress;
    ///
    /// assert_eq!(ColumnAddress::parse("A").unwrap().index(), 1);
    /// assert_eq!(ColumnAddress::parse("AA").unwrap().index(), 27);
    /// assert_eq!(ColumnAddress::parse("BA").unwrap().index(), 53);
    /// ```
    pub fn parse(label: &str) -> Result<Self> {
        Self::label_to_index(label).map(Self)
    }

    /// The 1-based column index
    pub fn index(self) -> u32 {
        self.0
    }

    /// The column label
    pub fn label(self) -> String {
        let mut letters = Vec::new();
        let mut n = self.0;

        while n > 0 {
            n -= 1;
            letters.push(b'A' + (n % 26) as u8);
            n /= 26;
        }

        letters.reverse();
        letters.into_iter().map(char::from).collect()
    }

    /// The column one to the right
    pub fn next(self) -> Result<Self> {
        self.0
            .checked_add(1)
            .map(Self)
            .ok_or_else(|| Error::OutOfRange(format!("no column after index {}", self.0)))
    }

    /// The column one to the left; fails for column "A"
    pub fn previous(self) -> Result<Self> {
        if self.0 <= 1 {
            return Err(Error::OutOfRange(format!(
                "no column before '{}'",
                self.label()
            )));
        }
        Ok(Self(self.0 - 1))
    }

    /// Convert a column label to its 1-based index (A = 1, Z = 26, AA = 27)
    pub fn label_to_index(label: &str) -> Result<u32> {
        if label.is_empty() {
            return Err(Error::InvalidAddress("empty column label".into()));
        }

        let mut col: u32 = 0;
        for c in label.chars() {
            if !c.is_ascii_alphabetic() {
                return Err(Error::InvalidAddress(format!(
                    "invalid column letter '{}' in '{}'",
                    c, label
                )));
            }
            let digit = c.to_ascii_uppercase() as u32 - 'A' as u32 + 1;
            col = col
                .checked_mul(26)
                .and_then(|v| v.checked_add(digit))
                .ok_or_else(|| Error::InvalidAddress(format!("column label '{}' too long", label)))?;
        }

        Ok(col)
    }

    /// Convert a 1-based column index to its label; fails for index 0
    pub fn index_to_label(index: u32) -> Result<String> {
        Self::new(index).map(Self::label)
    }

    /// The label of the column after `label`
    pub fn next_label(label: &str) -> Result<String> {
        Self::parse(label)?.next().map(Self::label)
    }

    /// The label of the column before `label`; fails for "A"
    pub fn previous_label(label: &str) -> Result<String> {
        Self::parse(label)?.previous().map(Self::label)
    }
}

impl fmt::Display for ColumnAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for ColumnAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A cell reference such as "B12" (1-based column and row)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellRef {
    /// Row index (1-based)
    pub row: u32,
    /// Column index (1-based)
    pub column: u32,
}

impl CellRef {
    /// Create a new cell reference
    pub fn new(column: u32, row: u32) -> Self {
        Self { row, column }
    }

    /// Parse an A1-style reference
    ///
    /// # Examples
    /// ```
    /// use sheetwright_core::CellRef;
    ///
    /// let r = CellRef::parse("AB12").unwrap();
    /// assert_eq!(r.column, 28);
    /// assert_eq!(r.row, 12);
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let split = s
            .find(|c: char| !c.is_ascii_alphabetic())
            .ok_or_else(|| Error::InvalidAddress(format!("no row number in '{}'", s)))?;

        if split == 0 {
            return Err(Error::InvalidAddress(format!(
                "no column letters in '{}'",
                s
            )));
        }

        let column = ColumnAddress::label_to_index(&s[..split])?;
        let row: u32 = s[split..]
            .parse()
            .map_err(|_| Error::InvalidAddress(format!("invalid row number in '{}'", s)))?;

        if row == 0 {
            return Err(Error::InvalidAddress(format!(
                "row number must be >= 1 in '{}'",
                s
            )));
        }

        Ok(Self { row, column })
    }

    /// Column label part of the reference
    pub fn column_label(&self) -> String {
        ColumnAddress(self.column).label()
    }

    /// Format as A1-style string
    pub fn to_a1_string(&self) -> String {
        format!("{}{}", self.column_label(), self.row)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for CellRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
