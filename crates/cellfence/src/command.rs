//! Operations and their arguments
//!
//! A [`Command`] is one call into the engine. It deserializes from a JSON
//! object whose `op` field names the operation, e.g.
//! `{"op": "write_cell", "path": "book.xlsx", "sheet": "Sheet1", "cell": "B2", "value": 42}`.
//! The long argument names used by older callers (`file_path`, `sheet_name`,
//! `cell_range`, `idx`, `amount`, `old_name`, `new_name`) are accepted too.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use cellfence_core::{
    BorderLineStyle, BorderPatch, BorderSide, Color, HorizontalAlignment, StylePatch, Underline,
    VerticalAlignment,
};

use crate::error::Result;

fn yes() -> bool {
    true
}

fn one() -> i64 {
    1
}

/// One engine operation with its arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    ListSheets(ListSheetsArgs),
    ReadRange(RangeArgs),
    WriteCell(WriteCellArgs),
    WriteRange(WriteRangeArgs),
    InsertRows(ShiftArgs),
    DeleteRows(ShiftArgs),
    InsertColumns(ShiftArgs),
    DeleteColumns(ShiftArgs),
    RenameSheet(RenameSheetArgs),
    DeleteSheet(DeleteSheetArgs),
    ClearRange(RangeArgs),
    FormatRange(FormatRangeArgs),
}

impl Command {
    /// Operation name as used in the `op` field
    pub fn name(&self) -> &'static str {
        match self {
            Command::ListSheets(_) => "list_sheets",
            Command::ReadRange(_) => "read_range",
            Command::WriteCell(_) => "write_cell",
            Command::WriteRange(_) => "write_range",
            Command::InsertRows(_) => "insert_rows",
            Command::DeleteRows(_) => "delete_rows",
            Command::InsertColumns(_) => "insert_columns",
            Command::DeleteColumns(_) => "delete_columns",
            Command::RenameSheet(_) => "rename_sheet",
            Command::DeleteSheet(_) => "delete_sheet",
            Command::ClearRange(_) => "clear_range",
            Command::FormatRange(_) => "format_range",
        }
    }

    /// The workbook path the command targets, as supplied
    pub fn path(&self) -> &str {
        match self {
            Command::ListSheets(a) => &a.path,
            Command::ReadRange(a) | Command::ClearRange(a) => &a.path,
            Command::WriteCell(a) => &a.path,
            Command::WriteRange(a) => &a.path,
            Command::InsertRows(a)
            | Command::DeleteRows(a)
            | Command::InsertColumns(a)
            | Command::DeleteColumns(a) => &a.path,
            Command::RenameSheet(a) => &a.path,
            Command::DeleteSheet(a) => &a.path,
            Command::FormatRange(a) => &a.path,
        }
    }

    /// Whether a successful run rewrites the file
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Command::ListSheets(_) | Command::ReadRange(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListSheetsArgs {
    #[serde(alias = "file_path")]
    pub path: String,
    /// Create the workbook if it does not exist
    #[serde(default)]
    pub create_if_missing: bool,
}

/// Arguments of `read_range` and `clear_range`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RangeArgs {
    #[serde(alias = "file_path")]
    pub path: String,
    #[serde(alias = "sheet_name")]
    pub sheet: String,
    #[serde(alias = "cell_range")]
    pub range: String,
    #[serde(default)]
    pub create_if_missing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WriteCellArgs {
    #[serde(alias = "file_path")]
    pub path: String,
    #[serde(alias = "sheet_name")]
    pub sheet: String,
    pub cell: String,
    /// JSON cell value; see [`crate::value`]
    #[serde(default)]
    pub value: Value,
    /// Style merged onto the cell after the value is written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<StyleArgs>,
    #[serde(default = "yes")]
    pub create_if_missing: bool,
}

/// Arguments of `write_range`
///
/// Exactly one of `range` (values must match its shape) and `start_cell`
/// (values are anchored there, rows may be ragged) is given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WriteRangeArgs {
    #[serde(alias = "file_path")]
    pub path: String,
    #[serde(alias = "sheet_name")]
    pub sheet: String,
    #[serde(default, alias = "cell_range", skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_cell: Option<String>,
    pub values: Vec<Vec<Value>>,
    #[serde(default = "yes")]
    pub create_if_missing: bool,
}

/// Arguments of the row and column insert/delete operations
///
/// `at` is 1-based (row number or column number). Both are signed so that
/// out-of-domain input is reported as a range error rather than a parse
/// failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShiftArgs {
    #[serde(alias = "file_path")]
    pub path: String,
    #[serde(alias = "sheet_name")]
    pub sheet: String,
    #[serde(alias = "idx")]
    pub at: i64,
    #[serde(default = "one", alias = "amount")]
    pub count: i64,
    #[serde(default)]
    pub create_if_missing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenameSheetArgs {
    #[serde(alias = "file_path")]
    pub path: String,
    #[serde(alias = "old_name")]
    pub old: String,
    #[serde(alias = "new_name")]
    pub new: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteSheetArgs {
    #[serde(alias = "file_path")]
    pub path: String,
    #[serde(alias = "sheet_name")]
    pub sheet: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormatRangeArgs {
    #[serde(alias = "file_path")]
    pub path: String,
    #[serde(alias = "sheet_name")]
    pub sheet: String,
    #[serde(alias = "cell_range")]
    pub range: String,
    pub style: StyleArgs,
    #[serde(default)]
    pub create_if_missing: bool,
}

/// `underline` accepts `true`/`false` or a keyword such as `double`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UnderlineArg {
    Flag(bool),
    Kind(String),
}

/// Border part of a style descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BorderArgs {
    /// Line style keyword (`thin`, `medium`, `dashed`, ... or `none`)
    pub style: String,
    /// 6-digit hex color
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Any of `left`, `right`, `top`, `bottom`; all four when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edges: Option<Vec<String>>,
}

/// Style descriptor as supplied by callers; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StyleArgs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underline: Option<UnderlineArg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strikethrough: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_hex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizontal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrap_text: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border: Option<BorderArgs>,
}

impl StyleArgs {
    /// Validate every field and build the patch
    ///
    /// Nothing is applied here, so a bad field is reported before any cell
    /// is touched.
    pub fn to_patch(&self) -> Result<StylePatch> {
        let underline = match &self.underline {
            None => None,
            Some(UnderlineArg::Flag(true)) => Some(Underline::Single),
            Some(UnderlineArg::Flag(false)) => Some(Underline::None),
            Some(UnderlineArg::Kind(kind)) => Some(Underline::parse(kind)?),
        };

        let font_size = match self.font_size {
            Some(size) if !(size.is_finite() && size > 0.0 && size <= 409.0) => {
                return Err(cellfence_core::Error::InvalidStyle(format!(
                    "font size {} must be between 0 and 409",
                    size
                ))
                .into());
            }
            other => other,
        };

        let font_name = match self.font_name.as_deref().map(str::trim) {
            Some("") => {
                return Err(
                    cellfence_core::Error::InvalidStyle("font name is empty".into()).into(),
                )
            }
            other => other.map(str::to_string),
        };

        let border = match &self.border {
            None => None,
            Some(args) => {
                let style = BorderLineStyle::parse(&args.style)?;
                let color = args.color.as_deref().map(Color::parse_rgb).transpose()?;
                let sides = match &args.edges {
                    None => BorderSide::ALL.to_vec(),
                    Some(edges) => edges
                        .iter()
                        .map(|edge| BorderSide::parse(edge))
                        .collect::<cellfence_core::Result<Vec<_>>>()?,
                };
                Some(BorderPatch {
                    style,
                    color,
                    sides,
                })
            }
        };

        Ok(StylePatch {
            bold: self.bold,
            italic: self.italic,
            underline,
            strikethrough: self.strikethrough,
            font_name,
            font_size,
            font_color: self.font_color.as_deref().map(Color::parse_rgb).transpose()?,
            fill: self.fill_hex.as_deref().map(Color::parse_rgb).transpose()?,
            horizontal: self
                .horizontal
                .as_deref()
                .map(HorizontalAlignment::parse)
                .transpose()?,
            vertical: self
                .vertical
                .as_deref()
                .map(VerticalAlignment::parse)
                .transpose()?,
            wrap_text: self.wrap_text,
            number_format: self.number_format.clone(),
            border,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_deserialize_tagged_command() {
        let command: Command = serde_json::from_value(json!({
            "op": "write_cell",
            "path": "book.xlsx",
            "sheet": "Sheet1",
            "cell": "B2",
            "value": 42
        }))
        .unwrap();

        assert_eq!(
            command,
            Command::WriteCell(WriteCellArgs {
                path: "book.xlsx".into(),
                sheet: "Sheet1".into(),
                cell: "B2".into(),
                value: json!(42),
                style: None,
                create_if_missing: true,
            })
        );
        assert!(command.is_mutating());
        assert_eq!(command.name(), "write_cell");
    }

    #[test]
    fn test_long_argument_names() {
        let command: Command = serde_json::from_value(json!({
            "op": "insert_rows",
            "file_path": "book.xlsx",
            "sheet_name": "Data",
            "idx": 3,
            "amount": 2
        }))
        .unwrap();

        let Command::InsertRows(args) = command else {
            panic!("wrong variant");
        };
        assert_eq!((args.at, args.count), (3, 2));
        assert!(!args.create_if_missing);
    }

    #[test]
    fn test_count_defaults_to_one() {
        let command: Command = serde_json::from_value(json!({
            "op": "delete_columns", "path": "b.xlsx", "sheet": "S", "at": 2
        }))
        .unwrap();
        let Command::DeleteColumns(args) = command else {
            panic!("wrong variant");
        };
        assert_eq!(args.count, 1);
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let result: std::result::Result<Command, _> = serde_json::from_value(json!({
            "op": "list_sheets", "path": "b.xlsx", "colour": "red"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_style_args_to_patch() {
        let args: StyleArgs = serde_json::from_value(json!({
            "bold": true,
            "underline": "double",
            "fill_hex": "#eaf2ff",
            "horizontal": "center",
            "border": {"style": "thin", "edges": ["top", "bottom"]}
        }))
        .unwrap();
        let patch = args.to_patch().unwrap();

        assert_eq!(patch.bold, Some(true));
        assert_eq!(patch.underline, Some(Underline::Double));
        assert_eq!(patch.fill, Some(Color::rgb(0xEA, 0xF2, 0xFF)));
        assert_eq!(patch.horizontal, Some(HorizontalAlignment::Center));
        let border = patch.border.unwrap();
        assert_eq!(border.sides, vec![BorderSide::Top, BorderSide::Bottom]);
        assert_eq!(border.color, None);
    }

    #[test]
    fn test_style_args_validation() {
        let bad = [
            json!({"fill_hex": "EAF2F"}),
            json!({"font_color": "zzzzzz"}),
            json!({"horizontal": "middle"}),
            json!({"vertical": "left"}),
            json!({"border": {"style": "wavy"}}),
            json!({"border": {"style": "thin", "edges": ["diagonal"]}}),
            json!({"font_size": 0}),
            json!({"underline": "squiggly"}),
        ];
        for value in bad {
            let args: StyleArgs = serde_json::from_value(value.clone()).unwrap();
            let err = args.to_patch().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Format, "{}", value);
        }
    }
}
