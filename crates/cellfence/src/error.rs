//! Engine error taxonomy

use serde::Serialize;
use thiserror::Error;

use cellfence_xlsx::XlsxError;

/// Result type alias using [`EngineError`]
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors returned by engine operations
///
/// Every variant carries a human-readable message; [`EngineError::kind`]
/// gives the machine-readable category that callers forward alongside it.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Path or extension outside what the sandbox allows
    #[error("security error: {0}")]
    Security(String),

    /// Missing workbook file or sheet
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed argument text or an unreadable container
    #[error("format error: {0}")]
    Format(String),

    /// Values whose dimensions do not match the target range
    #[error("shape error: {0}")]
    Shape(String),

    /// Unbounded range where bounds are needed, or an out-of-domain index
    #[error("range error: {0}")]
    Range(String),

    /// Sheet name collision or deleting the last sheet
    #[error("conflict: {0}")]
    Conflict(String),

    /// Filesystem failure while loading or saving
    #[error("io error: {0}")]
    Io(String),
}

/// Machine-readable error category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Security,
    NotFound,
    Format,
    Shape,
    Range,
    Conflict,
    Io,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Security => "security",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Format => "format",
            ErrorKind::Shape => "shape",
            ErrorKind::Range => "range",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Io => "io",
        }
    }
}

/// The `{ kind, message }` pair handed back to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
}

impl EngineError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Security(_) => ErrorKind::Security,
            EngineError::NotFound(_) => ErrorKind::NotFound,
            EngineError::Format(_) => ErrorKind::Format,
            EngineError::Shape(_) => ErrorKind::Shape,
            EngineError::Range(_) => ErrorKind::Range,
            EngineError::Conflict(_) => ErrorKind::Conflict,
            EngineError::Io(_) => ErrorKind::Io,
        }
    }

    /// The message without the category prefix
    pub fn message(&self) -> &str {
        match self {
            EngineError::Security(m)
            | EngineError::NotFound(m)
            | EngineError::Format(m)
            | EngineError::Shape(m)
            | EngineError::Range(m)
            | EngineError::Conflict(m)
            | EngineError::Io(m) => m,
        }
    }

    /// Serializable form of this error
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            message: self.message().to_string(),
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

impl From<XlsxError> for EngineError {
    fn from(value: XlsxError) -> Self {
        match value {
            XlsxError::Core(inner) => inner.into(),
            other if other.is_io() => Self::Io(other.to_string()),
            other => Self::Format(other.to_string()),
        }
    }
}

impl From<cellfence_core::Error> for EngineError {
    fn from(value: cellfence_core::Error) -> Self {
        use cellfence_core::Error as Core;

        match value {
            Core::DuplicateSheetName(_)
            | Core::LastSheet
            | Core::LastVisibleSheet(_)
            | Core::MergedCellConflict(_) => Self::Conflict(value.to_string()),
            Core::SheetNotFound(_) => Self::NotFound(value.to_string()),
            Core::RowOutOfBounds(..)
            | Core::ColumnOutOfBounds(..)
            | Core::UnboundedRange(_)
            | Core::ShiftOverflow { .. }
            | Core::SheetOutOfBounds(..) => Self::Range(value.to_string()),
            Core::InvalidAddress(_)
            | Core::InvalidRange(_)
            | Core::InvalidSheetName(_)
            | Core::InvalidStyle(_) => Self::Format(value.to_string()),
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(value: serde_json::Error) -> Self {
        Self::Format(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_map_to_taxonomy() {
        let dup: EngineError = cellfence_core::Error::DuplicateSheetName("Data".into()).into();
        assert_eq!(dup.kind(), ErrorKind::Conflict);

        let last: EngineError = cellfence_core::Error::LastSheet.into();
        assert_eq!(last.kind(), ErrorKind::Conflict);

        let hidden: EngineError = cellfence_core::Error::LastVisibleSheet("Data".into()).into();
        assert_eq!(hidden.kind(), ErrorKind::Conflict);

        let open: EngineError = cellfence_core::Error::UnboundedRange("A:A".into()).into();
        assert_eq!(open.kind(), ErrorKind::Range);

        let bad: EngineError = cellfence_core::Error::InvalidAddress("1A".into()).into();
        assert_eq!(bad.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_xlsx_errors_map_to_taxonomy() {
        let disk_full = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let io: EngineError = XlsxError::Io(disk_full).into();
        assert_eq!(io.kind(), ErrorKind::Io);

        let broken: EngineError = XlsxError::MissingPart("xl/workbook.xml".into()).into();
        assert_eq!(broken.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_report_serializes_kind_in_snake_case() {
        let err = EngineError::NotFound("sheet 'Missing'".into());
        let json = serde_json::to_value(err.report()).unwrap();
        assert_eq!(json["kind"], "not_found");
        assert_eq!(json["message"], "sheet 'Missing'");
    }
}
