//! Conditional formatting
//!
//! A [`ConditionalFormat`] is one `<conditionalFormatting>` block: a set of
//! ranges and the rules applied to them in priority order. Rules are not
//! evaluated. The parts a row or column edit must touch (the ranges and the
//! `<formula>` operands) are typed; the rest of a rule is carried as written
//! so color scales, data bars and icon sets survive a save untouched.

use crate::cell::CellRange;
use crate::reference::shift_formula;
use crate::shift::ShiftOp;
use crate::validation::join_sqref;

/// One `<conditionalFormatting>` block
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConditionalFormat {
    /// Cells the rules apply to
    pub ranges: Vec<CellRange>,
    /// Rules in file order
    pub rules: Vec<ConditionalFormatRule>,
    /// `pivot="1"`: the block belongs to a pivot table
    pub pivot: bool,
}

/// One `<cfRule>`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConditionalFormatRule {
    /// Rule kind as written, e.g. `cellIs`, `expression`, `colorScale`
    pub rule_type: String,
    /// Evaluation order across the sheet; lower runs first
    pub priority: u32,
    /// Index into the workbook's differential formats
    pub dxf_id: Option<u32>,
    /// Later rules are skipped when this one matches
    pub stop_if_true: bool,
    /// Every other attribute in file order (`operator`, `text`, `rank`, ...)
    pub attributes: Vec<(String, String)>,
    /// `<formula>` operands, without a leading `=`
    pub formulas: Vec<String>,
    /// Remaining child elements (`colorScale`, `dataBar`, `iconSet`,
    /// `extLst`) as serialized XML
    pub extra_xml: String,
}

impl ConditionalFormatRule {
    /// Create a rule of the given kind
    pub fn new(rule_type: impl Into<String>, priority: u32) -> Self {
        Self {
            rule_type: rule_type.into(),
            priority,
            ..Self::default()
        }
    }

    /// Look up one of the other attributes
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

impl ConditionalFormat {
    /// Create a block covering `ranges` with no rules yet
    pub fn new(ranges: Vec<CellRange>) -> Self {
        Self {
            ranges,
            ..Self::default()
        }
    }

    /// Ranges as a space-separated `sqref`
    pub fn sqref(&self) -> String {
        join_sqref(&self.ranges)
    }

    /// Move the block's ranges and rule formulas through `op`
    ///
    /// Returns `false` when no range survives; the block should then be
    /// dropped.
    pub fn shift(&mut self, op: &ShiftOp) -> bool {
        self.ranges = self.ranges.iter().filter_map(|r| op.map_range(r)).collect();
        for rule in &mut self.rules {
            for formula in &mut rule.formulas {
                *formula = shift_formula(formula, op);
            }
        }
        !self.ranges.is_empty()
    }
}
