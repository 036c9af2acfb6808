//! Row and column insertion/deletion as index maps
//!
//! A [`ShiftOp`] describes one structural edit along one axis. It knows how
//! to move a single index and a closed span of indices; storage, metadata
//! bands, merged regions and formula references are all shifted through it,
//! so every part of a sheet agrees on where content ends up.

use crate::cell::{CellRange, OpenAxis};
use crate::{MAX_COLS, MAX_ROWS};

/// The axis a structural edit runs along
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Rows (numbers in A1 notation)
    Row,
    /// Columns (letters in A1 notation)
    Column,
}

impl Axis {
    /// Number of indices available on this axis
    pub fn limit(self) -> u32 {
        match self {
            Axis::Row => MAX_ROWS,
            Axis::Column => MAX_COLS as u32,
        }
    }

    /// Plural noun used in messages
    pub fn noun(self) -> &'static str {
        match self {
            Axis::Row => "rows",
            Axis::Column => "columns",
        }
    }
}

/// Whether content is pushed apart or pulled together
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftKind {
    /// Open `count` empty lines before index `at`
    Insert,
    /// Remove the lines `[at, at + count)`
    Delete,
}

/// A single structural edit (0-based `at`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftOp {
    /// Axis being edited
    pub axis: Axis,
    /// Insert or delete
    pub kind: ShiftKind,
    /// First affected index (0-based)
    pub at: u32,
    /// Number of lines inserted or deleted
    pub count: u32,
}

impl ShiftOp {
    /// Insert `count` lines before 0-based index `at`
    pub fn insert(axis: Axis, at: u32, count: u32) -> Self {
        Self {
            axis,
            kind: ShiftKind::Insert,
            at,
            count,
        }
    }

    /// Delete `count` lines starting at 0-based index `at`
    pub fn delete(axis: Axis, at: u32, count: u32) -> Self {
        Self {
            axis,
            kind: ShiftKind::Delete,
            at,
            count,
        }
    }

    /// One past the last line of the affected band
    fn band_end(&self) -> u64 {
        self.at as u64 + self.count as u64
    }

    /// Where an index ends up, or `None` if it is deleted or pushed off the sheet
    pub fn map_index(&self, idx: u32) -> Option<u32> {
        if idx < self.at {
            return Some(idx);
        }
        match self.kind {
            ShiftKind::Insert => {
                let moved = idx as u64 + self.count as u64;
                (moved < self.axis.limit() as u64).then_some(moved as u32)
            }
            ShiftKind::Delete => {
                if (idx as u64) < self.band_end() {
                    None
                } else {
                    Some(idx - self.count)
                }
            }
        }
    }

    /// Where a closed span `first..=last` ends up
    ///
    /// Inserting inside a span stretches it. Deleting part of a span shrinks
    /// it; deleting all of it, or pushing any part past the sheet limit,
    /// yields `None`.
    pub fn map_span(&self, first: u32, last: u32) -> Option<(u32, u32)> {
        match self.kind {
            ShiftKind::Insert => Some((self.map_index(first)?, self.map_index(last)?)),
            ShiftKind::Delete => {
                let end = self.band_end();
                if last < self.at || first as u64 >= end {
                    return Some((self.map_index(first)?, self.map_index(last)?));
                }
                if first >= self.at && (last as u64) < end {
                    return None;
                }
                let new_first = first.min(self.at);
                let new_last = if last as u64 >= end {
                    last - self.count
                } else {
                    self.at - 1
                };
                Some((new_first, new_last))
            }
        }
    }

    /// Where a range ends up
    ///
    /// Follows [`ShiftOp::map_span`], except that an insert which pushes only
    /// the far edge off the sheet clips the range at the limit. An axis the
    /// range leaves open (`A:C` along rows) does not move.
    pub fn map_range(&self, range: &CellRange) -> Option<CellRange> {
        let mut shifted = *range;
        match (self.axis, range.open) {
            (Axis::Row, OpenAxis::Rows) | (Axis::Column, OpenAxis::Columns) => {}
            (Axis::Row, _) => {
                let (first, last) = self.map_span_clipped(range.start.row, range.end.row)?;
                shifted.start.row = first;
                shifted.end.row = last;
            }
            (Axis::Column, _) => {
                let (first, last) =
                    self.map_span_clipped(range.start.col as u32, range.end.col as u32)?;
                shifted.start.col = first as u16;
                shifted.end.col = last as u16;
            }
        }
        Some(shifted)
    }

    fn map_span_clipped(&self, first: u32, last: u32) -> Option<(u32, u32)> {
        match self.kind {
            ShiftKind::Insert => {
                let first = self.map_index(first)?;
                let last = self
                    .map_index(last)
                    .unwrap_or(self.axis.limit() - 1);
                Some((first, last))
            }
            ShiftKind::Delete => self.map_span(first, last),
        }
    }

    /// Whether an insert would push the line at `idx` past the sheet limit
    pub fn overflows(&self, idx: u32) -> bool {
        self.kind == ShiftKind::Insert && idx >= self.at && self.map_index(idx).is_none()
    }
}
