//! Error types for cellfence-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in cellfence-core
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid cell address format
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    /// Invalid cell range format
    #[error("Invalid cell range: {0}")]
    InvalidRange(String),

    /// Row index out of bounds
    #[error("Row index {0} out of bounds (max: {1})")]
    RowOutOfBounds(u32, u32),

    /// Column index out of bounds
    #[error("Column index {0} out of bounds (max: {1})")]
    ColumnOutOfBounds(u32, u32),

    /// A range with an open axis was used where concrete bounds are required
    #[error("Range {0} is unbounded; a bounded range like A1:C10 is required")]
    UnboundedRange(String),

    /// A structural edit would push content past the sheet limit
    #[error("Shifting by {count} would move {what} past the sheet limit")]
    ShiftOverflow { what: String, count: u32 },

    /// Sheet index out of bounds
    #[error("Sheet index {0} out of bounds (count: {1})")]
    SheetOutOfBounds(usize, usize),

    /// Sheet not found by name
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// Invalid sheet name
    #[error("Invalid sheet name: {0}")]
    InvalidSheetName(String),

    /// Duplicate sheet name
    #[error("Sheet already exists: {0}")]
    DuplicateSheetName(String),

    /// The workbook would be left without any sheet
    #[error("Cannot delete the only sheet in the workbook")]
    LastSheet,

    /// Every remaining sheet would be hidden
    #[error("Cannot delete '{0}': it is the only visible sheet")]
    LastVisibleSheet(String),

    /// Invalid style attribute text (color, alignment keyword, border style)
    #[error("Invalid style: {0}")]
    InvalidStyle(String),

    /// Merged cell conflict
    #[error("Cell {0} is part of a merged region")]
    MergedCellConflict(String),
}
