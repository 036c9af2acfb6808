//! # cellfence-core
//!
//! In-memory workbook model used by the cellfence mutation engine.
//!
//! This crate provides:
//! - [`CellAddress`] and [`CellRange`] - A1-style addressing, including
//!   whole-column (`A:C`) and whole-row (`2:5`) ranges with an open axis
//! - [`CellValue`] - Values stored in cells (numbers, text, booleans, dates, formulas)
//! - [`Style`] - Immutable cell formatting values, deduplicated per sheet by [`StylePool`]
//! - [`StylePatch`] - A partial style descriptor merged onto existing styles
//! - [`Workbook`], [`Worksheet`] - Ordered sheets with sparse cell storage
//! - [`ShiftOp`] - Row/column insertion and deletion, including formula reference rewriting
//! - [`CellComment`], [`ConditionalFormat`], [`DataValidation`], [`Hyperlink`] - Sheet
//!   annotations that follow row and column edits
//!
//! ## Example
//!
//! ```rust
//! use cellfence_core::{Axis, CellValue, ShiftOp, Workbook};
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//!
//! sheet.set_cell_value("B2", 42.0).unwrap();
//! sheet.set_cell_formula("C2", "=B2*2").unwrap();
//!
//! // Insert one row above row 1; everything moves down.
//! sheet.apply_shift(ShiftOp::insert(Axis::Row, 0, 1)).unwrap();
//!
//! assert_eq!(sheet.get_value("B3").unwrap(), CellValue::Number(42.0));
//! assert_eq!(sheet.get_value("C3").unwrap().formula_text(), Some("=B3*2"));
//! ```

pub mod cell;
pub mod comment;
pub mod conditional_format;
pub mod error;
pub mod hyperlink;
pub mod preserved;
pub mod reference;
pub mod shift;
pub mod style;
pub mod validation;
pub mod workbook;
pub mod worksheet;

pub use cell::{ArrayFormula, CellAddress, CellData, CellError, CellRange, CellValue, OpenAxis};
pub use comment::CellComment;
pub use conditional_format::{ConditionalFormat, ConditionalFormatRule};
pub use error::{Error, Result};
pub use hyperlink::Hyperlink;
pub use preserved::PreservedMarkup;
pub use shift::{Axis, ShiftOp};
pub use validation::{DataValidation, ValidationErrorStyle, ValidationOperator, ValidationType};
pub use workbook::{DefinedName, Workbook};
pub use worksheet::{SheetState, Worksheet};

pub use style::{
    Alignment, BorderEdge, BorderLineStyle, BorderPatch, BorderSide, BorderStyle, Color,
    FillStyle, FontStyle, HorizontalAlignment, NumberFormat, PatternType, Style, StylePatch,
    StylePool, Underline, VerticalAlignment,
};

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;
