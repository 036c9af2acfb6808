//! Cell value types

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::fmt;
use std::sync::Arc;

use super::range::CellRange;

/// `NaiveDate::num_days_from_ce` of 1899-12-30, serial day zero of the
/// 1900 date system once the phantom 1900-02-29 is accounted for.
const SERIAL_EPOCH_DAYS_FROM_CE: i32 = 693_594;

/// First serial after the phantom leap day (1900-03-01).
const FIRST_SERIAL_AFTER_LEAP_BUG: f64 = 61.0;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Represents the value stored in a cell
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Empty cell (no value)
    #[default]
    Empty,

    /// Boolean value (TRUE/FALSE)
    Boolean(bool),

    /// Numeric value
    Number(f64),

    /// String value
    String(SharedString),

    /// Date or date-time; persisted as a 1900-system serial number
    DateTime(NaiveDateTime),

    /// Error value (#VALUE!, #REF!, etc.)
    Error(CellError),

    /// Formula with cached result
    Formula {
        /// Formula text including the leading `=` (e.g., "=SUM(A1:A10)")
        text: String,
        /// Last calculated value as stored in the file, if any
        cached_value: Option<Box<CellValue>>,
        /// Set on the top-left cell of an array (CSE) formula
        array: Option<ArrayFormula>,
    },
}

/// Extent of an array formula (`<f t="array" ref="..">`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayFormula {
    /// Cells that receive the formula's results
    pub range: CellRange,
    /// Recalculate on every change (`aca`)
    pub always_calculate: bool,
}

impl ArrayFormula {
    /// An array formula filling `range`
    pub fn new(range: CellRange) -> Self {
        Self {
            range,
            always_calculate: false,
        }
    }
}

impl CellValue {
    /// Create a new string value
    pub fn string<S: Into<String>>(s: S) -> Self {
        CellValue::String(SharedString::new(s.into()))
    }

    /// Create a new formula value; a missing leading `=` is added
    pub fn formula<S: Into<String>>(text: S) -> Self {
        let text = text.into();
        let text = if text.starts_with('=') {
            text
        } else {
            format!("={}", text)
        };
        CellValue::Formula {
            text,
            cached_value: None,
            array: None,
        }
    }

    /// Create an array formula filling `range`; a missing leading `=` is added
    pub fn array_formula<S: Into<String>>(text: S, range: CellRange) -> Self {
        match Self::formula(text) {
            CellValue::Formula { text, .. } => CellValue::Formula {
                text,
                cached_value: None,
                array: Some(ArrayFormula::new(range)),
            },
            other => other,
        }
    }

    /// Check if the cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Try to get the value as a number
    ///
    /// Dates yield their serial number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Boolean(true) => Some(1.0),
            CellValue::Boolean(false) => Some(0.0),
            CellValue::DateTime(dt) => Some(datetime_to_serial(dt)),
            CellValue::Formula {
                cached_value: Some(v),
                ..
            } => v.as_number(),
            _ => None,
        }
    }

    /// Try to get the value as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Boolean(b) => Some(*b),
            CellValue::Number(n) => Some(*n != 0.0),
            CellValue::Formula {
                cached_value: Some(v),
                ..
            } => v.as_bool(),
            _ => None,
        }
    }

    /// Try to get the value as a string
    pub fn as_string(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s.as_str()),
            CellValue::Formula {
                cached_value: Some(v),
                ..
            } => v.as_string(),
            _ => None,
        }
    }

    /// Try to get the value as a date-time
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            CellValue::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// The array extent if this cell anchors an array formula
    pub fn array_extent(&self) -> Option<&ArrayFormula> {
        match self {
            CellValue::Formula { array, .. } => array.as_ref(),
            _ => None,
        }
    }

    /// Get the formula text if this is a formula cell
    pub fn formula_text(&self) -> Option<&str> {
        match self {
            CellValue::Formula { text, .. } => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => write!(f, ""),
            CellValue::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::String(s) => write!(f, "{}", s.as_str()),
            CellValue::DateTime(dt) => write!(f, "{}", format_iso(dt)),
            CellValue::Error(e) => write!(f, "{}", e),
            CellValue::Formula { text, .. } => write!(f, "{}", text),
        }
    }
}

/// ISO-8601 text for a date-time: the date alone at midnight, otherwise
/// `YYYY-MM-DDTHH:MM:SS`.
pub fn format_iso(dt: &NaiveDateTime) -> String {
    if dt.time() == NaiveTime::MIN {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S").to_string()
    }
}

/// Convert a date-time to its 1900-system serial number
///
/// Serials before 1900-03-01 are one lower than the plain day count, which
/// reproduces the phantom 1900-02-29 that spreadsheet files assume.
pub fn datetime_to_serial(dt: &NaiveDateTime) -> f64 {
    let days = (dt.date().num_days_from_ce() - SERIAL_EPOCH_DAYS_FROM_CE) as f64;
    let millis = dt.time().num_seconds_from_midnight() as f64 * 1000.0
        + (dt.time().nanosecond() / 1_000_000) as f64;
    let serial = days + millis / MILLIS_PER_DAY;
    if serial < FIRST_SERIAL_AFTER_LEAP_BUG {
        serial - 1.0
    } else {
        serial
    }
}

/// Convert a 1900-system serial number back to a date-time
///
/// Returns `None` for negative or out-of-range serials. Time of day is
/// rounded to the nearest millisecond.
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let serial = if serial < FIRST_SERIAL_AFTER_LEAP_BUG - 1.0 {
        serial + 1.0
    } else {
        serial
    };

    let mut days = serial.trunc() as i64;
    let mut millis = (serial.fract() * MILLIS_PER_DAY).round() as i64;
    if millis >= MILLIS_PER_DAY as i64 {
        days += 1;
        millis -= MILLIS_PER_DAY as i64;
    }

    let days = i32::try_from(days).ok()?;
    let date = NaiveDate::from_num_days_from_ce_opt(days.checked_add(SERIAL_EPOCH_DAYS_FROM_CE)?)?;
    let secs = (millis / 1000) as u32;
    let time = NaiveTime::from_num_seconds_from_midnight_opt(secs, (millis % 1000) as u32 * 1_000_000)?;
    Some(date.and_time(time))
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::string(s)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::string(s)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(dt: NaiveDateTime) -> Self {
        CellValue::DateTime(dt)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(d: NaiveDate) -> Self {
        CellValue::DateTime(d.and_time(NaiveTime::MIN))
    }
}

impl From<CellError> for CellValue {
    fn from(e: CellError) -> Self {
        CellValue::Error(e)
    }
}

/// Spreadsheet error values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellError {
    /// #NULL! - Incorrect range operator
    Null,
    /// #DIV/0! - Division by zero
    Div0,
    /// #VALUE! - Wrong type of argument or operand
    Value,
    /// #REF! - Invalid cell reference
    Ref,
    /// #NAME? - Unrecognized formula name
    Name,
    /// #NUM! - Invalid numeric value
    Num,
    /// #N/A - Value not available
    Na,
    /// #GETTING_DATA - External data is loading
    GettingData,
    /// #SPILL! - Dynamic array cannot spill
    Spill,
    /// #CALC! - Calculation error
    Calc,
}

impl CellError {
    /// Get the display string for this error
    pub fn as_str(&self) -> &'static str {
        match self {
            CellError::Null => "#NULL!",
            CellError::Div0 => "#DIV/0!",
            CellError::Value => "#VALUE!",
            CellError::Ref => "#REF!",
            CellError::Name => "#NAME?",
            CellError::Num => "#NUM!",
            CellError::Na => "#N/A",
            CellError::GettingData => "#GETTING_DATA",
            CellError::Spill => "#SPILL!",
            CellError::Calc => "#CALC!",
        }
    }

    /// Parse an error literal, case-insensitively
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "#NULL!" => Some(CellError::Null),
            "#DIV/0!" => Some(CellError::Div0),
            "#VALUE!" => Some(CellError::Value),
            "#REF!" => Some(CellError::Ref),
            "#NAME?" => Some(CellError::Name),
            "#NUM!" => Some(CellError::Num),
            "#N/A" => Some(CellError::Na),
            "#GETTING_DATA" => Some(CellError::GettingData),
            "#SPILL!" => Some(CellError::Spill),
            "#CALC!" => Some(CellError::Calc),
            _ => None,
        }
    }
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reference-counted string shared between cells holding the same text
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SharedString(Arc<str>);

impl SharedString {
    /// Create a new shared string
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        SharedString(Arc::from(s.as_ref()))
    }

    /// Get the string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the length of the string in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the string is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SharedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl fmt::Display for SharedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SharedString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SharedString {
    fn from(s: &str) -> Self {
        SharedString::new(s)
    }
}

impl From<String> for SharedString {
    fn from(s: String) -> Self {
        SharedString::new(s)
    }
}
