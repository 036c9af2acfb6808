//! Cell hyperlinks

use crate::cell::CellRange;
use crate::shift::ShiftOp;

/// A `<hyperlink>` on a cell or range
///
/// A link either leaves the workbook (`target`, a URL or file path) or
/// jumps inside it (`location`, e.g. `Summary!A1`); a file may set both.
#[derive(Debug, Clone, PartialEq)]
pub struct Hyperlink {
    /// Cells that carry the link
    pub range: CellRange,
    /// External address
    pub target: Option<String>,
    /// Location inside the workbook
    pub location: Option<String>,
    /// Text shown in place of the address
    pub display: Option<String>,
    /// Hover text
    pub tooltip: Option<String>,
}

impl Hyperlink {
    /// A link from `range` to an external address
    pub fn external(range: CellRange, target: impl Into<String>) -> Self {
        Self {
            range,
            target: Some(target.into()),
            location: None,
            display: None,
            tooltip: None,
        }
    }

    /// Move the link's range through `op`; `false` when it was deleted
    pub fn shift(&mut self, op: &ShiftOp) -> bool {
        match op.map_range(&self.range) {
            Some(range) => {
                self.range = range;
                true
            }
            None => false,
        }
    }
}
