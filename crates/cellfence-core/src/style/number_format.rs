//! Number format types

/// Number format for cell display
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum NumberFormat {
    /// General format (default)
    #[default]
    General,

    /// Built-in format by ID
    BuiltIn(u32),

    /// Custom format string
    Custom(String),
}

impl NumberFormat {
    /// Format applied when a date without a time part is written
    pub const DATE_CODE: &'static str = "yyyy-mm-dd";

    /// Format applied when a date with a time part is written
    pub const DATETIME_CODE: &'static str = "yyyy-mm-dd h:mm:ss";

    /// First id available to custom formats in a styles part
    pub const FIRST_CUSTOM_ID: u32 = 164;

    /// Create a number format from a format code
    ///
    /// `General` (any case) maps to [`NumberFormat::General`]; a code equal
    /// to a built-in one maps to that built-in id.
    pub fn from_code<S: AsRef<str>>(code: S) -> Self {
        let code = code.as_ref();
        if code.eq_ignore_ascii_case("general") {
            return NumberFormat::General;
        }
        match BUILTIN_CODES.iter().find(|(_, c)| *c == code) {
            Some((id, _)) => NumberFormat::BuiltIn(*id),
            None => NumberFormat::Custom(code.to_string()),
        }
    }

    /// Get the format string
    pub fn format_string(&self) -> &str {
        match self {
            NumberFormat::General => "General",
            NumberFormat::BuiltIn(id) => Self::builtin_format_string(*id).unwrap_or("General"),
            NumberFormat::Custom(s) => s,
        }
    }

    /// Get built-in format string by ID
    pub fn builtin_format_string(id: u32) -> Option<&'static str> {
        BUILTIN_CODES
            .iter()
            .find(|(builtin, _)| *builtin == id)
            .map(|(_, code)| *code)
    }

    /// Check if this is a date/time format
    ///
    /// Quoted literals, `\`-escaped characters and bracketed sections such as
    /// `[Red]` or `[$-409]` are ignored; any remaining `y`, `m`, `d`, `h` or
    /// `s` marks the format as a date.
    pub fn is_date_format(&self) -> bool {
        match self {
            NumberFormat::General => false,
            NumberFormat::BuiltIn(id) => matches!(id, 14..=22 | 45..=47),
            NumberFormat::Custom(code) => code_has_date_tokens(code),
        }
    }
}

fn code_has_date_tokens(code: &str) -> bool {
    let mut chars = code.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                for q in chars.by_ref() {
                    if q == '"' {
                        break;
                    }
                }
            }
            '[' => {
                for b in chars.by_ref() {
                    if b == ']' {
                        break;
                    }
                }
            }
            '\\' | '_' | '*' => {
                chars.next();
            }
            c if matches!(c.to_ascii_lowercase(), 'y' | 'm' | 'd' | 'h' | 's') => return true,
            _ => {}
        }
    }
    false
}

const BUILTIN_CODES: &[(u32, &str)] = &[
    (1, "0"),
    (2, "0.00"),
    (3, "#,##0"),
    (4, "#,##0.00"),
    (9, "0%"),
    (10, "0.00%"),
    (11, "0.00E+00"),
    (12, "# ?/?"),
    (13, "# ??/??"),
    (14, "mm-dd-yy"),
    (15, "d-mmm-yy"),
    (16, "d-mmm"),
    (17, "mmm-yy"),
    (18, "h:mm AM/PM"),
    (19, "h:mm:ss AM/PM"),
    (20, "h:mm"),
    (21, "h:mm:ss"),
    (22, "m/d/yy h:mm"),
    (37, "#,##0 ;(#,##0)"),
    (38, "#,##0 ;[Red](#,##0)"),
    (39, "#,##0.00;(#,##0.00)"),
    (40, "#,##0.00;[Red](#,##0.00)"),
    (45, "mm:ss"),
    (46, "[h]:mm:ss"),
    (47, "mmss.0"),
    (48, "##0.0E+0"),
    (49, "@"),
];
