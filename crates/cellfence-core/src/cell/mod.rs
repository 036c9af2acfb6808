//! Cell-related types and utilities
//!
//! This module contains:
//! - [`CellValue`] - The value stored in a cell
//! - [`CellAddress`] - A cell's location (e.g., "A1")
//! - [`CellRange`] - A range of cells (e.g., "A1:B10", "C:C")
//! - [`CellData`] - Complete cell data including value and style

mod address;
mod range;
mod storage;
mod value;

pub use address::CellAddress;
pub use range::{CellRange, CellRangeIterator, OpenAxis};
pub use storage::{CellData, CellStorage};
pub use value::{
    datetime_to_serial, format_iso, serial_to_datetime, ArrayFormula, CellError, CellValue,
    SharedString,
};
