//! Rectangular cell ranges, including whole-row and whole-column forms

use super::address::{parse_column_part, parse_row_part, CellAddress};
use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};
use std::fmt;
use std::str::FromStr;

/// Which axis of a [`CellRange`] is unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OpenAxis {
    /// Both corners are concrete cells (`A1:C3`)
    #[default]
    None,
    /// Whole columns (`A:C`); the row axis spans the entire sheet
    Rows,
    /// Whole rows (`2:5`); the column axis spans the entire sheet
    Columns,
}

/// A range of cells (e.g., "A1:B10", "C:C", "3:7")
///
/// Ranges are always normalized so that `start` is the top-left and `end`
/// the bottom-right corner. An open axis is stored with the sheet limits as
/// its bounds and remembered in [`CellRange::open`] so it formats back as a
/// whole-row or whole-column reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    /// Start address (top-left)
    pub start: CellAddress,
    /// End address (bottom-right)
    pub end: CellAddress,
    /// Unbounded axis, if any
    pub open: OpenAxis,
}

impl CellRange {
    /// Create a new bounded cell range from two corners in any order
    pub fn new(start: CellAddress, end: CellAddress) -> Self {
        let (top, bottom) = if start.row <= end.row {
            (start, end)
        } else {
            (end, start)
        };
        let (left, right) = if start.col <= end.col {
            (start, end)
        } else {
            (end, start)
        };

        Self {
            start: CellAddress::with_absolute(
                top.row,
                left.col,
                top.row_absolute,
                left.col_absolute,
            ),
            end: CellAddress::with_absolute(
                bottom.row,
                right.col,
                bottom.row_absolute,
                right.col_absolute,
            ),
            open: OpenAxis::None,
        }
    }

    /// Create a range from row/column indices
    pub fn from_indices(start_row: u32, start_col: u16, end_row: u32, end_col: u16) -> Self {
        Self::new(
            CellAddress::new(start_row, start_col),
            CellAddress::new(end_row, end_col),
        )
    }

    /// Create a single-cell range
    pub fn single(addr: CellAddress) -> Self {
        Self {
            start: addr,
            end: addr,
            open: OpenAxis::None,
        }
    }

    /// Whole columns `first..=last` (0-based, any order)
    pub fn whole_columns(first: u16, last: u16) -> Self {
        let (first, last) = (first.min(last), first.max(last));
        Self {
            start: CellAddress::new(0, first),
            end: CellAddress::new(MAX_ROWS - 1, last),
            open: OpenAxis::Rows,
        }
    }

    /// Whole rows `first..=last` (0-based, any order)
    pub fn whole_rows(first: u32, last: u32) -> Self {
        let (first, last) = (first.min(last), first.max(last));
        Self {
            start: CellAddress::new(first, 0),
            end: CellAddress::new(last, MAX_COLS - 1),
            open: OpenAxis::Columns,
        }
    }

    /// Parse a range from `A1`, `A1:B10`, `A:C` or `2:5` notation
    ///
    /// # Examples
    /// ```
    /// use cellfence_core::{CellRange, OpenAxis};
    ///
    /// let range = CellRange::parse("c3:a1").unwrap();
    /// assert_eq!(range.to_string(), "A1:C3");
    ///
    /// let cols = CellRange::parse("B:D").unwrap();
    /// assert_eq!(cols.open, OpenAxis::Rows);
    /// assert!(!cols.is_bounded());
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidRange("empty range".into()));
        }

        let Some((first, second)) = s.split_once(':') else {
            return CellAddress::parse(s).map(Self::single);
        };
        if second.contains(':') {
            return Err(Error::InvalidRange(format!("too many ':' in '{}'", s)));
        }
        let (first, second) = (first.trim(), second.trim());

        match (part_kind(first), part_kind(second)) {
            (PartKind::Cell, PartKind::Cell) => {
                let start = CellAddress::parse(first)?;
                let end = CellAddress::parse(second)?;
                Ok(Self::new(start, end))
            }
            (PartKind::Column, PartKind::Column) => {
                let (a, a_abs) = parse_column_part(first)?;
                let (b, b_abs) = parse_column_part(second)?;
                let mut range = Self::whole_columns(a, b);
                let (lo_abs, hi_abs) = if a <= b { (a_abs, b_abs) } else { (b_abs, a_abs) };
                range.start.col_absolute = lo_abs;
                range.end.col_absolute = hi_abs;
                Ok(range)
            }
            (PartKind::Row, PartKind::Row) => {
                let (a, a_abs) = parse_row_part(first)?;
                let (b, b_abs) = parse_row_part(second)?;
                let mut range = Self::whole_rows(a, b);
                let (lo_abs, hi_abs) = if a <= b { (a_abs, b_abs) } else { (b_abs, a_abs) };
                range.start.row_absolute = lo_abs;
                range.end.row_absolute = hi_abs;
                Ok(range)
            }
            _ => Err(Error::InvalidRange(format!(
                "'{}' mixes cell, column and row references",
                s
            ))),
        }
    }

    /// Whether both axes have concrete bounds
    pub fn is_bounded(&self) -> bool {
        self.open == OpenAxis::None
    }

    /// Return this range if it is bounded, or [`Error::UnboundedRange`]
    pub fn require_bounded(&self) -> Result<Self> {
        if self.is_bounded() {
            Ok(*self)
        } else {
            Err(Error::UnboundedRange(self.to_a1_string()))
        }
    }

    /// Check if a cell is within this range
    pub fn contains(&self, addr: &CellAddress) -> bool {
        addr.row >= self.start.row
            && addr.row <= self.end.row
            && addr.col >= self.start.col
            && addr.col <= self.end.col
    }

    /// Get the number of rows in the range
    pub fn row_count(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    /// Get the number of columns in the range
    pub fn col_count(&self) -> u16 {
        self.end.col - self.start.col + 1
    }

    /// Get the total number of cells in the range
    pub fn cell_count(&self) -> u64 {
        self.row_count() as u64 * self.col_count() as u64
    }

    /// Check if this range overlaps with another
    pub fn overlaps(&self, other: &CellRange) -> bool {
        self.start.row <= other.end.row
            && self.end.row >= other.start.row
            && self.start.col <= other.end.col
            && self.end.col >= other.start.col
    }

    /// Iterate over all cell addresses in the range, row by row
    ///
    /// The iterator is lazy; calling `cells()` again restarts from the
    /// top-left corner.
    pub fn cells(&self) -> CellRangeIterator {
        CellRangeIterator {
            range: *self,
            current_row: self.start.row,
            current_col: self.start.col,
            done: false,
        }
    }

    /// Format in normalized A1 notation
    pub fn to_a1_string(&self) -> String {
        match self.open {
            OpenAxis::None if self.start == self.end => self.start.to_a1_string(),
            OpenAxis::None => {
                format!("{}:{}", self.start.to_a1_string(), self.end.to_a1_string())
            }
            OpenAxis::Rows => format!(
                "{}{}:{}{}",
                if self.start.col_absolute { "$" } else { "" },
                CellAddress::column_to_letters(self.start.col),
                if self.end.col_absolute { "$" } else { "" },
                CellAddress::column_to_letters(self.end.col),
            ),
            OpenAxis::Columns => format!(
                "{}{}:{}{}",
                if self.start.row_absolute { "$" } else { "" },
                self.start.row + 1,
                if self.end.row_absolute { "$" } else { "" },
                self.end.row + 1,
            ),
        }
    }
}

#[derive(PartialEq)]
enum PartKind {
    Cell,
    Column,
    Row,
    Invalid,
}

fn part_kind(part: &str) -> PartKind {
    let body = part.trim_start_matches('$');
    let has_letters = body.bytes().any(|b| b.is_ascii_alphabetic());
    let has_digits = body.bytes().any(|b| b.is_ascii_digit());
    match (has_letters, has_digits) {
        (true, true) => PartKind::Cell,
        (true, false) => PartKind::Column,
        (false, true) => PartKind::Row,
        (false, false) => PartKind::Invalid,
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for CellRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Iterator over cells in a range
#[derive(Debug, Clone)]
pub struct CellRangeIterator {
    range: CellRange,
    current_row: u32,
    current_col: u16,
    done: bool,
}

impl Iterator for CellRangeIterator {
    type Item = CellAddress;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let addr = CellAddress::new(self.current_row, self.current_col);

        if self.current_col < self.range.end.col {
            self.current_col += 1;
        } else if self.current_row < self.range.end.row {
            self.current_col = self.range.start.col;
            self.current_row += 1;
        } else {
            self.done = true;
        }

        Some(addr)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            return (0, Some(0));
        }
        let width = self.range.col_count() as u64;
        let rows_after = (self.range.end.row - self.current_row) as u64;
        let in_row = (self.range.end.col - self.current_col) as u64 + 1;
        let remaining = usize::try_from(rows_after * width + in_row).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}
