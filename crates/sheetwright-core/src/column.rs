//! Column types: per-column formats stored as ranges

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::MAX_COLS;

/// Column formatting shared by every column of a range
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ColumnFormat {
    /// Custom width (None = default)
    pub width: Option<f64>,
    /// Width was set by the user rather than the default
    pub custom_width: bool,
    /// Column is hidden
    pub hidden: bool,
    /// Outline/grouping level (0-7)
    pub outline_level: u8,
    /// Column-level style index (None = no column style)
    pub style_index: Option<u32>,
    /// Column is collapsed (in outline)
    pub collapsed: bool,
    /// Best fit (auto-sized)
    pub best_fit: bool,
}

impl ColumnFormat {
    /// Create a format with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set width
    pub fn with_width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self.custom_width = true;
        self
    }

    /// Set hidden
    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Set the column style index
    pub fn with_style(mut self, style_index: u32) -> Self {
        self.style_index = Some(style_index);
        self
    }

    /// Check if this format has any custom settings
    pub fn has_custom_settings(&self) -> bool {
        self.width.is_some()
            || self.hidden
            || self.outline_level > 0
            || self.style_index.is_some()
            || self.collapsed
            || self.best_fit
    }
}

/// A run of columns `min..=max` sharing one format (1-based, inclusive)
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ColumnStyleRange {
    /// Start column index
    pub min: u32,
    /// End column index (inclusive)
    pub max: u32,
    /// Format of every column in the range
    pub format: ColumnFormat,
    /// Left half of a range split by an insert; joins its right half again
    /// once the inserted column is removed
    #[cfg_attr(feature = "serde", serde(skip))]
    split_before_next: bool,
}

impl PartialEq for ColumnStyleRange {
    fn eq(&self, other: &Self) -> bool {
        self.min == other.min && self.max == other.max && self.format == other.format
    }
}

impl ColumnStyleRange {
    /// Create a range of columns
    pub fn new(min: u32, max: u32, format: ColumnFormat) -> Self {
        Self {
            min,
            max,
            format,
            split_before_next: false,
        }
    }

    /// Create a range for a single column
    pub fn single(index: u32, format: ColumnFormat) -> Self {
        Self::new(index, index, format)
    }

    /// Check if a column lies in this range
    pub fn contains(&self, index: u32) -> bool {
        self.min <= index && index <= self.max
    }

    /// Check if this range holds exactly one column
    pub fn is_single(&self) -> bool {
        self.min == self.max
    }
}

/// The column formats of a sheet
///
/// Ranges are sorted by `min` and never overlap. Inserting or removing a
/// column shifts every range at or right of it, splitting or shrinking the
/// range that covers the column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnStyleRanges {
    ranges: Vec<ColumnStyleRange>,
}

impl ColumnStyleRanges {
    /// Create an empty set of ranges
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from ranges as stored in a document, in any order
    pub fn from_ranges(mut ranges: Vec<ColumnStyleRange>) -> Result<Self> {
        ranges.sort_by_key(|r| r.min);
        for (i, range) in ranges.iter().enumerate() {
            if range.min == 0 || range.min > range.max {
                return Err(Error::InvalidState(format!(
                    "invalid column range {}..{}",
                    range.min, range.max
                )));
            }
            if range.max > MAX_COLS {
                return Err(Error::column_overflow(range.max));
            }
            if i > 0 && ranges[i - 1].max >= range.min {
                return Err(Error::InvalidState(format!(
                    "column ranges {}..{} and {}..{} overlap",
                    ranges[i - 1].min,
                    ranges[i - 1].max,
                    range.min,
                    range.max
                )));
            }
        }
        Ok(Self { ranges })
    }

    /// All ranges in column order
    pub fn ranges(&self) -> &[ColumnStyleRange] {
        &self.ranges
    }

    /// Number of ranges
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Check if there are no ranges
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// The range covering a column, if any
    pub fn covering(&self, index: u32) -> Option<&ColumnStyleRange> {
        self.position_covering(index).map(|pos| &self.ranges[pos])
    }

    /// The format of a column, if one is set
    pub fn format_at(&self, index: u32) -> Option<&ColumnFormat> {
        self.covering(index).map(|r| &r.format)
    }

    /// Set the format of `min..=max`, replacing whatever covered those columns
    pub fn set_range(&mut self, min: u32, max: u32, format: ColumnFormat) -> Result<()> {
        if min == 0 || min > max {
            return Err(Error::OutOfRange(format!("column range {}..{}", min, max)));
        }
        if max > MAX_COLS {
            return Err(Error::column_overflow(max));
        }

        let mut kept = Vec::with_capacity(self.ranges.len() + 2);
        for mut range in self.ranges.drain(..) {
            range.split_before_next = false;
            if range.max < min || range.min > max {
                kept.push(range);
                continue;
            }
            if range.min < min {
                kept.push(ColumnStyleRange::new(range.min, min - 1, range.format.clone()));
            }
            if range.max > max {
                kept.push(ColumnStyleRange::new(max + 1, range.max, range.format));
            }
        }
        kept.push(ColumnStyleRange::new(min, max, format));
        kept.sort_by_key(|r| r.min);
        self.ranges = kept;
        Ok(())
    }

    /// Check that a column can be inserted at `index` without pushing a
    /// range past the last column
    pub fn check_insert(&self, index: u32) -> Result<()> {
        match self.ranges.last() {
            Some(last) if last.max >= index && last.max >= MAX_COLS => {
                Err(Error::column_overflow(last.max + 1))
            }
            _ => Ok(()),
        }
    }

    /// Insert a column at `index`
    ///
    /// Every column at or right of `index` moves one to the right, opening a
    /// gap. A range that strictly contains `index` is split around it. With a
    /// format, the gap becomes a single-column range. Neighbouring ranges are
    /// never merged, so removing the same column restores the ranges exactly.
    pub fn insert_at(&mut self, index: u32, format: Option<ColumnFormat>) -> Result<()> {
        if index == 0 {
            return Err(Error::OutOfRange("column index 0".into()));
        }
        if index > MAX_COLS {
            return Err(Error::column_overflow(index));
        }
        self.check_insert(index)?;

        match self.position_covering(index) {
            Some(pos) if self.ranges[pos].min < index => {
                let left = &mut self.ranges[pos];
                let mut right =
                    ColumnStyleRange::new(index + 1, left.max + 1, left.format.clone());
                right.split_before_next = left.split_before_next;
                left.max = index - 1;
                left.split_before_next = true;
                self.shift_from(pos + 1, 1);
                self.ranges.insert(pos + 1, right);
            }
            _ => {
                let first = self.ranges.partition_point(|r| r.min < index);
                self.shift_from(first, 1);
            }
        }

        if let Some(format) = format {
            let pos = self.ranges.partition_point(|r| r.min < index);
            self.ranges.insert(pos, ColumnStyleRange::single(index, format));
        }

        log::trace!("column ranges: inserted column {}", index);
        Ok(())
    }

    /// Remove the column at `index` and return its format
    ///
    /// A single-column range covering `index` is deleted and a wider one
    /// shrinks by one. Every range right of `index` moves one to the left
    /// whether or not any range covered it. Two halves of a range split by
    /// [`insert_at`](Self::insert_at) join again once they touch.
    pub fn remove_at(&mut self, index: u32) -> Option<ColumnFormat> {
        if index == 0 {
            return None;
        }
        let removed = match self.position_covering(index) {
            Some(pos) if self.ranges[pos].is_single() => {
                let range = self.ranges.remove(pos);
                self.shift_from(pos, -1);
                Some(range.format)
            }
            Some(pos) => {
                self.ranges[pos].max -= 1;
                self.shift_from(pos + 1, -1);
                Some(self.ranges[pos].format.clone())
            }
            None => {
                let first = self.ranges.partition_point(|r| r.min < index);
                self.shift_from(first, -1);
                None
            }
        };

        self.rejoin_split(index);
        log::trace!("column ranges: removed column {}", index);
        removed
    }

    /// Move the format of column `from` to `to`, closing the gap at `from`
    pub fn move_column(&mut self, from: u32, to: u32) -> Result<()> {
        if from == 0 || to == 0 {
            return Err(Error::OutOfRange("column index 0".into()));
        }
        if from > MAX_COLS {
            return Err(Error::column_overflow(from));
        }
        if to > MAX_COLS {
            return Err(Error::column_overflow(to));
        }
        if from == to {
            return Ok(());
        }

        // Removing first always frees the last column, so the insert fits
        let format = self.remove_at(from);
        self.insert_at(to, format)
    }

    fn position_covering(&self, index: u32) -> Option<usize> {
        let pos = self.ranges.partition_point(|r| r.max < index);
        self.ranges
            .get(pos)
            .filter(|r| r.contains(index))
            .map(|_| pos)
    }

    fn shift_from(&mut self, start: usize, delta: i64) {
        for range in &mut self.ranges[start..] {
            range.min = (range.min as i64 + delta) as u32;
            range.max = (range.max as i64 + delta) as u32;
        }
    }

    /// Join the split halves that meet at `index` after a removal
    fn rejoin_split(&mut self, index: u32) {
        let pos = self.ranges.partition_point(|r| r.max + 1 < index);
        if pos + 1 >= self.ranges.len() {
            return;
        }
        let (left, right) = (&self.ranges[pos], &self.ranges[pos + 1]);
        if !left.split_before_next || left.max + 1 != index || right.min != index {
            return;
        }
        if left.format == right.format {
            let right = self.ranges.remove(pos + 1);
            self.ranges[pos].max = right.max;
            self.ranges[pos].split_before_next = right.split_before_next;
        } else {
            self.ranges[pos].split_before_next = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn spans(ranges: &ColumnStyleRanges) -> Vec<(u32, u32)> {
        ranges.ranges().iter().map(|r| (r.min, r.max)).collect()
    }

    fn wide() -> ColumnFormat {
        ColumnFormat::new().with_width(20.0)
    }

    fn narrow() -> ColumnFormat {
        ColumnFormat::new().with_width(4.0)
    }

    #[test]
    fn test_insert_splits_covering_range() {
        let mut ranges =
            ColumnStyleRanges::from_ranges(vec![ColumnStyleRange::new(2, 5, wide())]).unwrap();

        ranges.insert_at(3, Some(narrow())).unwrap();

        assert_eq!(spans(&ranges), vec![(2, 2), (3, 3), (4, 6)]);
        assert_eq!(ranges.format_at(3), Some(&narrow()));
        assert_eq!(ranges.format_at(6), Some(&wide()));
    }

    #[test]
    fn test_insert_at_range_start_shifts_whole_range() {
        let mut ranges = ColumnStyleRanges::from_ranges(vec![
            ColumnStyleRange::new(2, 3, wide()),
            ColumnStyleRange::single(7, narrow()),
        ])
        .unwrap();

        ranges.insert_at(2, None).unwrap();

        assert_eq!(spans(&ranges), vec![(3, 4), (8, 8)]);
        assert!(ranges.format_at(2).is_none());
    }

    #[test]
    fn test_insert_in_gap_shifts_ranges_to_the_right() {
        let mut ranges = ColumnStyleRanges::from_ranges(vec![
            ColumnStyleRange::single(1, wide()),
            ColumnStyleRange::new(5, 6, narrow()),
        ])
        .unwrap();

        ranges.insert_at(3, Some(wide())).unwrap();

        assert_eq!(spans(&ranges), vec![(1, 1), (3, 3), (6, 7)]);
    }

    #[test]
    fn test_remove_shrinks_or_deletes() {
        let mut ranges = ColumnStyleRanges::from_ranges(vec![
            ColumnStyleRange::single(1, wide()),
            ColumnStyleRange::new(3, 5, narrow()),
            ColumnStyleRange::single(8, wide()),
        ])
        .unwrap();

        assert_eq!(ranges.remove_at(4), Some(narrow()));
        assert_eq!(spans(&ranges), vec![(1, 1), (3, 4), (7, 7)]);

        assert_eq!(ranges.remove_at(1), Some(wide()));
        assert_eq!(spans(&ranges), vec![(2, 3), (6, 6)]);

        assert_eq!(ranges.remove_at(4), None);
        assert_eq!(spans(&ranges), vec![(2, 3), (5, 5)]);
    }

    #[test]
    fn test_insert_then_remove_restores_ranges() {
        let original = ColumnStyleRanges::from_ranges(vec![
            ColumnStyleRange::new(2, 5, wide()),
            ColumnStyleRange::single(9, narrow()),
        ])
        .unwrap();

        let mut ranges = original.clone();
        ranges.insert_at(4, Some(narrow())).unwrap();
        ranges.remove_at(4);
        assert_eq!(ranges, original);

        let mut ranges = original.clone();
        ranges.insert_at(3, None).unwrap();
        ranges.remove_at(3);
        assert_eq!(ranges, original);
    }

    #[test]
    fn test_insert_then_remove_keeps_adjacent_ranges_apart() {
        let original = ColumnStyleRanges::from_ranges(vec![
            ColumnStyleRange::new(1, 2, wide()),
            ColumnStyleRange::new(3, 4, wide()),
        ])
        .unwrap();

        let mut ranges = original.clone();
        ranges.insert_at(3, Some(narrow())).unwrap();
        assert_eq!(spans(&ranges), vec![(1, 2), (3, 3), (4, 5)]);
        ranges.remove_at(3);
        assert_eq!(spans(&ranges), vec![(1, 2), (3, 4)]);
        assert_eq!(ranges, original);

        let mut ranges = original.clone();
        ranges.insert_at(3, Some(wide())).unwrap();
        assert_eq!(spans(&ranges), vec![(1, 2), (3, 3), (4, 5)]);
        ranges.remove_at(3);
        assert_eq!(ranges, original);
    }

    #[test]
    fn test_split_halves_stay_apart_until_gap_closes() {
        let mut ranges =
            ColumnStyleRanges::from_ranges(vec![ColumnStyleRange::new(2, 6, wide())]).unwrap();

        ranges.insert_at(4, None).unwrap();
        ranges.remove_at(2);
        assert_eq!(spans(&ranges), vec![(2, 2), (4, 6)]);

        ranges.remove_at(3);
        assert_eq!(spans(&ranges), vec![(2, 5)]);
    }

    #[test]
    fn test_insert_past_last_column() {
        let mut ranges = ColumnStyleRanges::new();

        assert!(matches!(
            ranges.insert_at(MAX_COLS + 1, Some(wide())),
            Err(Error::ColumnOverflow { .. })
        ));
        assert!(ranges.is_empty());
        assert!(ranges.set_range(1, MAX_COLS, wide()).is_ok());
    }

    #[test]
    fn test_insert_overflow_leaves_ranges_untouched() {
        let mut ranges = ColumnStyleRanges::from_ranges(vec![ColumnStyleRange::new(
            MAX_COLS - 2,
            MAX_COLS,
            wide(),
        )])
        .unwrap();
        let before = ranges.clone();

        assert!(matches!(
            ranges.insert_at(MAX_COLS - 1, None),
            Err(Error::ColumnOverflow { .. })
        ));
        assert_eq!(ranges, before);

        // Columns right of every range are still free
        let mut short = ColumnStyleRanges::from_ranges(vec![ColumnStyleRange::single(1, wide())])
            .unwrap();
        short.insert_at(MAX_COLS, Some(narrow())).unwrap();
        assert_eq!(spans(&short), vec![(1, 1), (MAX_COLS, MAX_COLS)]);
    }

    #[test]
    fn test_move_column() {
        let mut ranges = ColumnStyleRanges::from_ranges(vec![
            ColumnStyleRange::single(2, wide()),
            ColumnStyleRange::single(4, narrow()),
        ])
        .unwrap();

        ranges.move_column(2, 4).unwrap();

        assert_eq!(ranges.format_at(3), Some(&narrow()));
        assert_eq!(ranges.format_at(4), Some(&wide()));
        assert!(ranges.format_at(2).is_none());
    }

    #[test]
    fn test_set_range_replaces_overlap() {
        let mut ranges =
            ColumnStyleRanges::from_ranges(vec![ColumnStyleRange::new(1, 10, wide())]).unwrap();

        ranges.set_range(4, 5, narrow()).unwrap();

        assert_eq!(spans(&ranges), vec![(1, 3), (4, 5), (6, 10)]);
    }

    #[test]
    fn test_from_ranges_rejects_overlap() {
        let result = ColumnStyleRanges::from_ranges(vec![
            ColumnStyleRange::new(1, 4, wide()),
            ColumnStyleRange::new(3, 6, narrow()),
        ]);
        assert!(matches!(result, Err(Error::InvalidState(_))));
    }

    fn format_map(ranges: &ColumnStyleRanges, upto: u32) -> Vec<Option<ColumnFormat>> {
        (1..=upto).map(|c| ranges.format_at(c).cloned()).collect()
    }

    fn assert_well_formed(ranges: &ColumnStyleRanges) -> std::result::Result<(), TestCaseError> {
        for r in ranges.ranges() {
            prop_assert!(r.min >= 1 && r.min <= r.max);
        }
        for pair in ranges.ranges().windows(2) {
            prop_assert!(pair[0].max < pair[1].min);
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn edits_keep_ranges_sorted_and_disjoint(
            ops in proptest::collection::vec((any::<bool>(), 1u32..30, any::<bool>()), 0..40)
        ) {
            let mut ranges = ColumnStyleRanges::new();
            for (insert, index, styled) in ops {
                if insert {
                    let format = styled.then(wide);
                    ranges.insert_at(index, format).unwrap();
                } else {
                    ranges.remove_at(index);
                }
                assert_well_formed(&ranges)?;
            }
        }

        #[test]
        fn insert_then_remove_restores_formats(
            spans in proptest::collection::vec((1u32..20, 0u32..4, any::<bool>()), 0..6),
            index in 1u32..30,
            styled in any::<bool>(),
        ) {
            let mut ranges = ColumnStyleRanges::new();
            for (min, len, flag) in spans {
                let format = if flag { wide() } else { narrow() };
                ranges.set_range(min, min + len, format).unwrap();
            }
            let before = format_map(&ranges, 40);

            ranges.insert_at(index, styled.then(narrow)).unwrap();
            ranges.remove_at(index);

            prop_assert_eq!(format_map(&ranges, 40), before);
            assert_well_formed(&ranges)?;
        }

        #[test]
        fn insert_then_remove_restores_ranges(
            runs in proptest::collection::vec((0u32..2, 0u32..3, any::<bool>()), 0..8),
            index in 1u32..40,
            styled in any::<bool>(),
        ) {
            let mut list = Vec::new();
            let mut next = 1;
            for (gap, len, flag) in runs {
                let min = next + gap;
                let format = if flag { wide() } else { narrow() };
                list.push(ColumnStyleRange::new(min, min + len, format));
                next = min + len + 1;
            }
            let mut ranges = ColumnStyleRanges::from_ranges(list).unwrap();
            let before = ranges.clone();

            ranges.insert_at(index, styled.then(wide)).unwrap();
            ranges.remove_at(index);

            prop_assert_eq!(ranges, before);
        }
    }
}
