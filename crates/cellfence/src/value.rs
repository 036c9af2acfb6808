//! Cell values as they cross the JSON boundary
//!
//! Input: `null` clears, booleans and numbers are stored as-is, a string
//! starting with `=` is formula text, `{"date": "YYYY-MM-DD"}` and
//! `{"datetime": "YYYY-MM-DDTHH:MM:SS"}` are dates. Every other string is
//! text. Output mirrors this, with dates as ISO-8601 strings and error
//! values as their literal.

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{Map, Number, Value};

use cellfence_core::cell::format_iso;
use cellfence_core::CellValue;

use crate::error::{EngineError, Result};

const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Convert a JSON value supplied by a caller into a cell value
pub fn from_json(value: &Value) -> Result<CellValue> {
    match value {
        Value::Null => Ok(CellValue::Empty),
        Value::Bool(b) => Ok(CellValue::Boolean(*b)),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.is_finite() => Ok(CellValue::Number(f)),
            _ => Err(EngineError::Format(format!("number {} is out of range", n))),
        },
        Value::String(s) if s.len() > 1 && s.starts_with('=') => {
            Ok(CellValue::formula(s.as_str()))
        }
        Value::String(s) => Ok(CellValue::string(s.as_str())),
        Value::Object(map) => date_from_object(map),
        Value::Array(_) => Err(EngineError::Format("a cell value cannot be an array".into())),
    }
}

fn date_from_object(map: &Map<String, Value>) -> Result<CellValue> {
    let bad_shape = || {
        EngineError::Format(
            "object cell values must be {\"date\": \"YYYY-MM-DD\"} or \
             {\"datetime\": \"YYYY-MM-DDTHH:MM:SS\"}"
                .into(),
        )
    };
    if map.len() != 1 {
        return Err(bad_shape());
    }

    if let Some(text) = map.get("date") {
        let text = text.as_str().ok_or_else(bad_shape)?;
        let date = NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
            .map_err(|e| EngineError::Format(format!("invalid date '{}': {}", text, e)))?;
        return Ok(CellValue::DateTime(date.and_hms_opt(0, 0, 0).ok_or_else(bad_shape)?));
    }

    if let Some(text) = map.get("datetime") {
        let text = text.as_str().ok_or_else(bad_shape)?;
        return DATETIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(text.trim(), fmt).ok())
            .map(CellValue::DateTime)
            .ok_or_else(|| EngineError::Format(format!("invalid datetime '{}'", text)));
    }

    Err(bad_shape())
}

/// Convert a stored cell value into the JSON reported to callers
pub fn to_json(value: &CellValue) -> Value {
    match value {
        CellValue::Empty => Value::Null,
        CellValue::Boolean(b) => Value::Bool(*b),
        CellValue::Number(n) => number_to_json(*n),
        CellValue::String(s) => Value::String(s.as_str().to_string()),
        CellValue::DateTime(dt) => Value::String(format_iso(dt)),
        CellValue::Error(e) => Value::String(e.as_str().to_string()),
        CellValue::Formula { text, .. } => Value::String(text.clone()),
    }
}

/// Integral values are reported as JSON integers (`42`, not `42.0`)
fn number_to_json(n: f64) -> Value {
    const I64_SAFE: f64 = 9_007_199_254_740_992.0;
    if n.fract() == 0.0 && n.abs() <= I64_SAFE {
        Value::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}
