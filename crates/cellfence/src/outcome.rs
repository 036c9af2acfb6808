//! Structured results of engine operations

use serde::Serialize;
use serde_json::Value;

/// Result of one command; serializes as the bare outcome object
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    ListSheets(ListSheetsOutcome),
    ReadRange(ReadRangeOutcome),
    WriteCell(WriteCellOutcome),
    WriteRange(WriteRangeOutcome),
    Shift(ShiftOutcome),
    RenameSheet(RenameSheetOutcome),
    DeleteSheet(DeleteSheetOutcome),
    ClearRange(ClearRangeOutcome),
    FormatRange(FormatRangeOutcome),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListSheetsOutcome {
    pub file_path: String,
    pub sheets: Vec<String>,
    pub workspace_root: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadRangeOutcome {
    pub file_path: String,
    pub sheet_name: String,
    pub cell_range: String,
    /// Row-major values; empty cells are `null`
    pub values: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WriteCellOutcome {
    pub file_path: String,
    pub sheet_name: String,
    pub cell: String,
    /// The value as supplied
    pub value: Value,
    pub saved: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WriteRangeOutcome {
    pub file_path: String,
    pub sheet_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_cell: Option<String>,
    pub rows: usize,
    pub written_cells: usize,
    pub saved: bool,
}

/// Result of the row and column insert/delete operations
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShiftOutcome {
    pub file_path: String,
    pub sheet_name: String,
    /// 1-based position the edit started at
    pub idx: u32,
    pub amount: u32,
    pub saved: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenameSheetOutcome {
    pub file_path: String,
    pub old_name: String,
    pub new_name: String,
    pub saved: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeleteSheetOutcome {
    pub file_path: String,
    pub deleted_sheet: String,
    pub remaining_sheets: Vec<String>,
    pub saved: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClearRangeOutcome {
    pub file_path: String,
    pub sheet_name: String,
    pub cell_range: String,
    /// Cells that held a value before the clear
    pub cleared_cells: usize,
    pub saved: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormatRangeOutcome {
    pub file_path: String,
    pub sheet_name: String,
    pub cell_range: String,
    pub updated_cells: u64,
    pub saved: bool,
}
