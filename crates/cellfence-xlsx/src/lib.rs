//! # cellfence-xlsx
//!
//! XLSX and XLSM (Office Open XML) reader and writer for cellfence.
//!
//! The reader keeps what the workbook model can represent: cell values and
//! formulas (array formulas included), the recognized style subset, row
//! heights, column widths, merged regions, conditional formats and their
//! differential formats, data validations, hyperlinks, comments, sheet
//! order and visibility, the active tab, defined names and the macro
//! project of an `.xlsm` file. Other top-level worksheet elements (sheet
//! views, protection, print setup) are kept as written.
//!
//! The writer emits a fresh container from the model. Parts reached only
//! through relationships the model does not represent (charts, drawings,
//! tables, printer settings) are not carried over.

pub mod error;
pub mod reader;
pub mod writer;

mod escape;
mod styles;

use std::path::Path;

pub use error::{XlsxError, XlsxResult};
pub use reader::XlsxReader;
pub use writer::XlsxWriter;

/// Which flavour of container to write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContainerKind {
    /// Plain workbook (`.xlsx`)
    #[default]
    Xlsx,
    /// Macro-enabled workbook (`.xlsm`)
    Xlsm,
}

impl ContainerKind {
    /// Pick the kind from a file extension; anything but `xlsm` is plain
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("xlsm") => ContainerKind::Xlsm,
            _ => ContainerKind::Xlsx,
        }
    }

    /// Content type of the `xl/workbook.xml` part
    pub fn workbook_content_type(self) -> &'static str {
        match self {
            ContainerKind::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"
            }
            ContainerKind::Xlsm => "application/vnd.ms-excel.sheet.macroEnabled.main+xml",
        }
    }
}
