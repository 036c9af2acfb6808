//! Data validation
//!
//! Data validation restricts what may be typed into a set of cells and can
//! show an input prompt and an error alert. Rules are not evaluated here;
//! they are kept so that a load/save cycle, and any row or column edits in
//! between, leave them pointing at the same cells.
//!
//! ## Example
//!
//! ```rust
//! use cellfence_core::{Axis, CellRange, DataValidation, ShiftOp, ValidationType};
//!
//! let mut rule = DataValidation::new(ValidationType::List);
//! rule.ranges.push(CellRange::parse("B2:B10").unwrap());
//! rule.formula1 = Some("$H$2:$H$5".into());
//!
//! assert!(rule.shift(&ShiftOp::insert(Axis::Row, 0, 1)));
//! assert_eq!(rule.sqref(), "B3:B11");
//! assert_eq!(rule.formula1.as_deref(), Some("$H$3:$H$6"));
//! ```

use crate::cell::CellRange;
use crate::reference::shift_formula;
use crate::shift::ShiftOp;

/// Kind of value a validation accepts (`type` attribute)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationType {
    /// Any value; only the prompt is used
    #[default]
    None,
    /// Whole numbers
    Whole,
    /// Decimal numbers
    Decimal,
    /// One of a list of values
    List,
    /// Dates
    Date,
    /// Times
    Time,
    /// Text of a certain length
    TextLength,
    /// A formula that must evaluate to TRUE
    Custom,
}

impl ValidationType {
    /// Attribute text
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationType::None => "none",
            ValidationType::Whole => "whole",
            ValidationType::Decimal => "decimal",
            ValidationType::List => "list",
            ValidationType::Date => "date",
            ValidationType::Time => "time",
            ValidationType::TextLength => "textLength",
            ValidationType::Custom => "custom",
        }
    }

    /// Parse the attribute; unknown text yields `None`
    pub fn from_attr(s: &str) -> Option<Self> {
        Some(match s {
            "none" => ValidationType::None,
            "whole" => ValidationType::Whole,
            "decimal" => ValidationType::Decimal,
            "list" => ValidationType::List,
            "date" => ValidationType::Date,
            "time" => ValidationType::Time,
            "textLength" => ValidationType::TextLength,
            "custom" => ValidationType::Custom,
            _ => return None,
        })
    }
}

/// Comparison used by numeric, date, time and length validations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationOperator {
    #[default]
    Between,
    NotBetween,
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
}

impl ValidationOperator {
    /// Attribute text
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationOperator::Between => "between",
            ValidationOperator::NotBetween => "notBetween",
            ValidationOperator::Equal => "equal",
            ValidationOperator::NotEqual => "notEqual",
            ValidationOperator::GreaterThan => "greaterThan",
            ValidationOperator::LessThan => "lessThan",
            ValidationOperator::GreaterThanOrEqual => "greaterThanOrEqual",
            ValidationOperator::LessThanOrEqual => "lessThanOrEqual",
        }
    }

    /// Parse the attribute; unknown text yields `None`
    pub fn from_attr(s: &str) -> Option<Self> {
        Some(match s {
            "between" => ValidationOperator::Between,
            "notBetween" => ValidationOperator::NotBetween,
            "equal" => ValidationOperator::Equal,
            "notEqual" => ValidationOperator::NotEqual,
            "greaterThan" => ValidationOperator::GreaterThan,
            "lessThan" => ValidationOperator::LessThan,
            "greaterThanOrEqual" => ValidationOperator::GreaterThanOrEqual,
            "lessThanOrEqual" => ValidationOperator::LessThanOrEqual,
            _ => return None,
        })
    }
}

/// Icon and buttons of the error alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationErrorStyle {
    /// Reject the value
    #[default]
    Stop,
    /// Warn, allow override
    Warning,
    /// Inform only
    Information,
}

impl ValidationErrorStyle {
    /// Attribute text
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationErrorStyle::Stop => "stop",
            ValidationErrorStyle::Warning => "warning",
            ValidationErrorStyle::Information => "information",
        }
    }

    /// Parse the attribute; unknown text yields `None`
    pub fn from_attr(s: &str) -> Option<Self> {
        Some(match s {
            "stop" => ValidationErrorStyle::Stop,
            "warning" => ValidationErrorStyle::Warning,
            "information" => ValidationErrorStyle::Information,
            _ => return None,
        })
    }
}

/// One `<dataValidation>` rule
///
/// Flags default to the values an absent attribute means in the file
/// format, so a rule read and written back keeps its behavior.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataValidation {
    /// Kind of value accepted
    pub validation_type: ValidationType,
    /// Comparison for numeric, date, time and length rules
    pub operator: ValidationOperator,
    /// Cells the rule applies to
    pub ranges: Vec<CellRange>,
    /// First operand, list source or custom formula (no leading `=`)
    pub formula1: Option<String>,
    /// Second operand of `between`/`notBetween`
    pub formula2: Option<String>,
    /// Empty cells pass
    pub allow_blank: bool,
    /// Suppress the in-cell dropdown of a list rule (`showDropDown`)
    pub hide_dropdown: bool,
    /// Show the prompt when a cell is selected
    pub show_input_message: bool,
    /// Prompt title
    pub prompt_title: Option<String>,
    /// Prompt text
    pub prompt: Option<String>,
    /// Show the error alert on invalid input
    pub show_error_message: bool,
    /// Error alert style
    pub error_style: ValidationErrorStyle,
    /// Error alert title
    pub error_title: Option<String>,
    /// Error alert text
    pub error: Option<String>,
    /// Input method editor mode (`imeMode`), kept as written
    pub ime_mode: Option<String>,
}

impl DataValidation {
    /// Create a rule of the given kind with no ranges
    pub fn new(validation_type: ValidationType) -> Self {
        Self {
            validation_type,
            ..Self::default()
        }
    }

    /// Ranges as a space-separated `sqref`
    pub fn sqref(&self) -> String {
        join_sqref(&self.ranges)
    }

    /// Move the rule's ranges and formula references through `op`
    ///
    /// Returns `false` when no range survives; the rule should then be
    /// dropped.
    pub fn shift(&mut self, op: &ShiftOp) -> bool {
        self.ranges = self.ranges.iter().filter_map(|r| op.map_range(r)).collect();
        for formula in [&mut self.formula1, &mut self.formula2].into_iter().flatten() {
            *formula = shift_formula(formula, op);
        }
        !self.ranges.is_empty()
    }
}

/// Format ranges as a space-separated `sqref` list
pub fn join_sqref(ranges: &[CellRange]) -> String {
    ranges
        .iter()
        .map(|r| r.to_a1_string())
        .collect::<Vec<_>>()
        .join(" ")
}
