//! Cell storage implementation
//!
//! This module provides sparse storage for spreadsheet cells.
//! Only non-empty cells are stored, using a row-based BTreeMap structure.

use std::collections::BTreeMap;

use super::{CellAddress, CellRange, CellValue};
use crate::error::{Error, Result};
use crate::shift::{Axis, ShiftOp};
use crate::style::StylePool;

/// Complete data for a single cell
#[derive(Debug, Clone, PartialEq)]
pub struct CellData {
    /// The cell's value
    pub value: CellValue,
    /// Index into the sheet's style pool (0 = default style)
    pub style_index: u32,
}

impl CellData {
    /// Create a new cell with a value and default style
    pub fn new(value: CellValue) -> Self {
        Self {
            value,
            style_index: 0,
        }
    }

    /// Create a new cell with a value and style
    pub fn with_style(value: CellValue, style_index: u32) -> Self {
        Self { value, style_index }
    }

    /// Create an empty cell
    pub fn empty() -> Self {
        Self {
            value: CellValue::Empty,
            style_index: 0,
        }
    }

    /// Check if this cell is effectively empty (no value and default style)
    pub fn is_empty(&self) -> bool {
        self.value.is_empty() && self.style_index == 0
    }
}

impl Default for CellData {
    fn default() -> Self {
        Self::empty()
    }
}

/// Sparse row-based storage for worksheet cells
///
/// - `BTreeMap` keeps rows and columns ordered, so iteration is row-major
///   and the writer can stream rows in order
/// - only cells with a value or a non-default style are stored
/// - row heights, column widths, hidden flags and merged regions live here
///   too, so a structural shift moves all of them in one place
///
/// Structure: `BTreeMap<row_index, BTreeMap<col_index, CellData>>`
#[derive(Debug)]
pub struct CellStorage {
    /// Row index → column map
    rows: BTreeMap<u32, BTreeMap<u16, CellData>>,

    /// Styles referenced by `CellData::style_index`
    pub(crate) style_pool: StylePool,

    /// Default row height in points (default: 15.0)
    default_row_height: f64,

    /// Default column width in characters (default: 8.43)
    default_column_width: f64,

    /// Custom row heights
    row_heights: BTreeMap<u32, f64>,

    /// Hidden rows
    hidden_rows: BTreeMap<u32, bool>,

    /// Custom column widths
    column_widths: BTreeMap<u16, f64>,

    /// Hidden columns
    hidden_columns: BTreeMap<u16, bool>,

    /// Merged cell regions
    merged_regions: Vec<CellRange>,
}

impl CellStorage {
    /// Create a new empty cell storage
    pub fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            style_pool: StylePool::new(),
            default_row_height: 15.0,
            default_column_width: 8.43,
            row_heights: BTreeMap::new(),
            hidden_rows: BTreeMap::new(),
            column_widths: BTreeMap::new(),
            hidden_columns: BTreeMap::new(),
            merged_regions: Vec::new(),
        }
    }

    /// Get a cell value
    pub fn get(&self, row: u32, col: u16) -> Option<&CellData> {
        self.rows.get(&row).and_then(|r| r.get(&col))
    }

    /// Get a mutable cell value
    pub fn get_mut(&mut self, row: u32, col: u16) -> Option<&mut CellData> {
        self.rows.get_mut(&row).and_then(|r| r.get_mut(&col))
    }

    /// Set a cell value
    ///
    /// If the cell data is empty (no value, default style), the cell is removed.
    pub fn set(&mut self, row: u32, col: u16, data: CellData) {
        if data.is_empty() {
            self.remove(row, col);
        } else {
            self.rows.entry(row).or_default().insert(col, data);
        }
    }

    /// Set just the cell value (preserving style)
    pub fn set_value(&mut self, row: u32, col: u16, value: CellValue) {
        let style_index = self.get(row, col).map_or(0, |c| c.style_index);
        self.set(row, col, CellData::with_style(value, style_index));
    }

    /// Set just the cell style (preserving value)
    pub fn set_style(&mut self, row: u32, col: u16, style_index: u32) {
        let value = self
            .get(row, col)
            .map(|c| c.value.clone())
            .unwrap_or_default();
        self.set(row, col, CellData::with_style(value, style_index));
    }

    /// Remove a cell
    pub fn remove(&mut self, row: u32, col: u16) -> Option<CellData> {
        let row_map = self.rows.get_mut(&row)?;
        let result = row_map.remove(&col);
        if row_map.is_empty() {
            self.rows.remove(&row);
        }
        result
    }

    /// Get the number of stored cells
    pub fn cell_count(&self) -> usize {
        self.rows.values().map(|r| r.len()).sum()
    }

    /// Check if storage is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get the bounds of used cells
    ///
    /// Returns (min_row, min_col, max_row, max_col) or None if empty
    pub fn used_bounds(&self) -> Option<(u32, u16, u32, u16)> {
        let min_row = *self.rows.keys().next()?;
        let max_row = *self.rows.keys().next_back()?;

        let mut min_col = u16::MAX;
        let mut max_col = 0u16;

        for row_data in self.rows.values() {
            if let Some(&col) = row_data.keys().next() {
                min_col = min_col.min(col);
            }
            if let Some(&col) = row_data.keys().next_back() {
                max_col = max_col.max(col);
            }
        }

        Some((min_row, min_col, max_row, max_col))
    }

    /// Iterate over all cells in row order
    pub fn iter(&self) -> impl Iterator<Item = (u32, u16, &CellData)> {
        self.rows
            .iter()
            .flat_map(|(&row, cols)| cols.iter().map(move |(&col, data)| (row, col, data)))
    }

    /// Iterate mutably over all cells in row order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (u32, u16, &mut CellData)> {
        self.rows.iter_mut().flat_map(|(&row, cols)| {
            cols.iter_mut()
                .map(move |(&col, data)| (row, col, data))
        })
    }

    /// Iterate over cells in a specific row
    pub fn iter_row(&self, row: u32) -> impl Iterator<Item = (u16, &CellData)> {
        self.rows
            .get(&row)
            .into_iter()
            .flat_map(|cols| cols.iter().map(|(&col, data)| (col, data)))
    }

    /// Iterate over stored cells inside `range`, row by row
    ///
    /// Only materialized cells are visited, so this is cheap for open ranges.
    pub fn iter_range(&self, range: CellRange) -> impl Iterator<Item = (u32, u16, &CellData)> {
        self.rows
            .range(range.start.row..=range.end.row)
            .flat_map(move |(&row, cols)| {
                cols.range(range.start.col..=range.end.col)
                    .map(move |(&col, data)| (row, col, data))
            })
    }

    /// Iterate over row indices that have data
    pub fn row_indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.rows.keys().copied()
    }

    /// Get default row height
    pub fn default_row_height(&self) -> f64 {
        self.default_row_height
    }

    /// Set default row height
    pub fn set_default_row_height(&mut self, height: f64) {
        self.default_row_height = height;
    }

    /// Get row height (returns default if not customized)
    pub fn row_height(&self, row: u32) -> f64 {
        self.row_heights
            .get(&row)
            .copied()
            .unwrap_or(self.default_row_height)
    }

    /// Set custom row height
    pub fn set_row_height(&mut self, row: u32, height: f64) {
        if (height - self.default_row_height).abs() < 0.001 {
            self.row_heights.remove(&row);
        } else {
            self.row_heights.insert(row, height);
        }
    }

    /// Check if row is hidden
    pub fn is_row_hidden(&self, row: u32) -> bool {
        self.hidden_rows.get(&row).copied().unwrap_or(false)
    }

    /// Set row hidden state
    pub fn set_row_hidden(&mut self, row: u32, hidden: bool) {
        if hidden {
            self.hidden_rows.insert(row, true);
        } else {
            self.hidden_rows.remove(&row);
        }
    }

    /// Get default column width
    pub fn default_column_width(&self) -> f64 {
        self.default_column_width
    }

    /// Set default column width
    pub fn set_default_column_width(&mut self, width: f64) {
        self.default_column_width = width;
    }

    /// Get column width (returns default if not customized)
    pub fn column_width(&self, col: u16) -> f64 {
        self.column_widths
            .get(&col)
            .copied()
            .unwrap_or(self.default_column_width)
    }

    /// Set custom column width
    pub fn set_column_width(&mut self, col: u16, width: f64) {
        if (width - self.default_column_width).abs() < 0.001 {
            self.column_widths.remove(&col);
        } else {
            self.column_widths.insert(col, width);
        }
    }

    /// Check if column is hidden
    pub fn is_column_hidden(&self, col: u16) -> bool {
        self.hidden_columns.get(&col).copied().unwrap_or(false)
    }

    /// Set column hidden state
    pub fn set_column_hidden(&mut self, col: u16, hidden: bool) {
        if hidden {
            self.hidden_columns.insert(col, true);
        } else {
            self.hidden_columns.remove(&col);
        }
    }

    /// Get all custom row heights (row index → height in points).
    pub fn custom_row_heights(&self) -> &BTreeMap<u32, f64> {
        &self.row_heights
    }

    /// Get all hidden rows (row index → true).
    pub fn hidden_rows(&self) -> &BTreeMap<u32, bool> {
        &self.hidden_rows
    }

    /// Get all custom column widths (column index → width in characters).
    pub fn custom_column_widths(&self) -> &BTreeMap<u16, f64> {
        &self.column_widths
    }

    /// Get all hidden columns (column index → true).
    pub fn hidden_columns(&self) -> &BTreeMap<u16, bool> {
        &self.hidden_columns
    }

    /// Get merged regions
    pub fn merged_regions(&self) -> &[CellRange] {
        &self.merged_regions
    }

    /// Add a merged region
    ///
    /// Fails if the region overlaps an existing one.
    pub fn add_merged_region(&mut self, range: CellRange) -> Result<()> {
        if let Some(existing) = self.merged_regions.iter().find(|r| r.overlaps(&range)) {
            return Err(Error::MergedCellConflict(format!(
                "{} overlaps {}",
                range, existing
            )));
        }
        self.merged_regions.push(range);
        Ok(())
    }

    /// Get the style pool
    pub fn style_pool(&self) -> &StylePool {
        &self.style_pool
    }

    /// Get the style pool mutably
    pub fn style_pool_mut(&mut self) -> &mut StylePool {
        &mut self.style_pool
    }

    /// Check that `op` would not push anything past the sheet limit
    pub fn check_shift(&self, op: &ShiftOp) -> Result<()> {
        let overflow = |what: &str| Error::ShiftOverflow {
            what: what.to_string(),
            count: op.count,
        };

        match op.axis {
            Axis::Row => {
                if self.rows.keys().next_back().is_some_and(|&r| op.overflows(r)) {
                    return Err(overflow("populated rows"));
                }
                let last_height = self.row_heights.keys().next_back().copied();
                let last_hidden = self.hidden_rows.keys().next_back().copied();
                if last_height.max(last_hidden).is_some_and(|r| op.overflows(r)) {
                    return Err(overflow("row formatting"));
                }
                if self.merged_regions.iter().any(|m| op.overflows(m.end.row)) {
                    return Err(overflow("merged cells"));
                }
            }
            Axis::Column => {
                let last_col = self
                    .rows
                    .values()
                    .filter_map(|cols| cols.keys().next_back().copied())
                    .max();
                if last_col.is_some_and(|c| op.overflows(c as u32)) {
                    return Err(overflow("populated columns"));
                }
                let last_width = self.column_widths.keys().next_back().copied();
                let last_hidden = self.hidden_columns.keys().next_back().copied();
                if last_width.max(last_hidden).is_some_and(|c| op.overflows(c as u32)) {
                    return Err(overflow("column formatting"));
                }
                if self.merged_regions.iter().any(|m| op.overflows(m.end.col as u32)) {
                    return Err(overflow("merged cells"));
                }
            }
        }
        Ok(())
    }

    /// Move every cell, metadata band and merged region through `op`
    ///
    /// Validates first; on error nothing has changed.
    pub fn apply_shift(&mut self, op: &ShiftOp) -> Result<()> {
        self.check_shift(op)?;

        match op.axis {
            Axis::Row => {
                remap_keys(&mut self.rows, |r| op.map_index(r));
                remap_keys(&mut self.row_heights, |r| op.map_index(r));
                remap_keys(&mut self.hidden_rows, |r| op.map_index(r));
            }
            Axis::Column => {
                let map_col = |c: u16| op.map_index(c as u32).map(|c| c as u16);
                for cols in self.rows.values_mut() {
                    remap_keys(cols, map_col);
                }
                self.rows.retain(|_, cols| !cols.is_empty());
                remap_keys(&mut self.column_widths, map_col);
                remap_keys(&mut self.hidden_columns, map_col);
            }
        }

        self.merged_regions = self
            .merged_regions
            .iter()
            .filter_map(|m| op.map_range(m))
            .filter(|m| m.cell_count() > 1)
            .collect();

        Ok(())
    }
}

/// Rebuild `map` with every key passed through `f`, dropping keys mapped to `None`
fn remap_keys<K: Ord + Copy, V>(map: &mut BTreeMap<K, V>, f: impl Fn(K) -> Option<K>) {
    let old = std::mem::take(map);
    *map = old
        .into_iter()
        .filter_map(|(k, v)| f(k).map(|k| (k, v)))
        .collect();
}

impl Default for CellStorage {
    fn default() -> Self {
        Self::new()
    }
}
