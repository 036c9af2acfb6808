//! Reading, writing and clearing cell values

use chrono::Timelike;

use cellfence_core::{CellAddress, CellRange, CellValue, NumberFormat, StylePatch, Worksheet};
use cellfence_core::{MAX_COLS, MAX_ROWS};

use serde_json::Value;

use super::{parse_bounded_range, parse_cell, parse_limited_range, Engine};
use crate::command::{RangeArgs, WriteCellArgs, WriteRangeArgs};
use crate::error::{EngineError, Result};
use crate::outcome::{ClearRangeOutcome, ReadRangeOutcome, WriteCellOutcome, WriteRangeOutcome};
use crate::value;

impl Engine {
    /// Values of a bounded range, row by row
    ///
    /// Ranges over [`MAX_RANGE_CELLS`](super::MAX_RANGE_CELLS) cells are
    /// refused. Only stored cells are visited; the rest read as null.
    pub fn read_range(&self, args: &RangeArgs) -> Result<ReadRangeOutcome> {
        let range = parse_limited_range(&args.range)?;

        let mut session = self.open(&args.path, args.create_if_missing)?;
        let index = session.sheet_index(&args.sheet, args.create_if_missing)?;
        session.save_if_created()?;

        let sheet = session.sheet(index)?;
        let mut values =
            vec![vec![Value::Null; range.col_count() as usize]; range.row_count() as usize];
        for (row, col, data) in sheet.iter_range(&range) {
            values[(row - range.start.row) as usize][(col - range.start.col) as usize] =
                value::to_json(&data.value);
        }

        Ok(ReadRangeOutcome {
            file_path: session.file_path(),
            sheet_name: args.sheet.clone(),
            cell_range: range.to_a1_string(),
            values,
        })
    }

    /// Set one cell, keeping its style unless a style is given
    pub fn write_cell(&self, args: &WriteCellArgs) -> Result<WriteCellOutcome> {
        let addr = parse_cell(&args.cell)?;
        let cell_value = value::from_json(&args.value)?;
        let patch = args.style.as_ref().map(|s| s.to_patch()).transpose()?;

        let mut session = self.open(&args.path, args.create_if_missing)?;
        let index = session.sheet_index(&args.sheet, args.create_if_missing)?;
        let sheet = session.sheet_mut(index)?;
        store_value(sheet, addr.row, addr.col, cell_value)?;
        if let Some(patch) = &patch {
            sheet.apply_style_patch_at(addr.row, addr.col, patch)?;
        }
        session.save()?;

        log::info!(
            "wrote {}!{} in '{}'",
            args.sheet,
            addr.to_a1_string(),
            session.path.display()
        );
        Ok(WriteCellOutcome {
            file_path: session.file_path(),
            sheet_name: args.sheet.clone(),
            cell: addr.to_a1_string(),
            value: args.value.clone(),
            saved: true,
        })
    }

    /// Write a block of values, either into an exact range or anchored at a cell
    pub fn write_range(&self, args: &WriteRangeArgs) -> Result<WriteRangeOutcome> {
        let target = WriteTarget::from_args(args)?;
        let rows = args
            .values
            .iter()
            .map(|row| row.iter().map(value::from_json).collect::<Result<Vec<_>>>())
            .collect::<Result<Vec<_>>>()?;
        let origin = target.check_shape(&rows)?;

        let mut session = self.open(&args.path, args.create_if_missing)?;
        let index = session.sheet_index(&args.sheet, args.create_if_missing)?;
        let sheet = session.sheet_mut(index)?;

        let mut written_cells = 0;
        for (row_offset, row) in rows.into_iter().enumerate() {
            for (col_offset, cell_value) in row.into_iter().enumerate() {
                // check_shape guarantees both offsets stay on the sheet
                let r = origin.row + row_offset as u32;
                let c = origin.col + col_offset as u16;
                store_value(sheet, r, c, cell_value)?;
                written_cells += 1;
            }
        }
        session.save()?;

        log::info!(
            "wrote {} cell(s) to '{}' in '{}'",
            written_cells,
            args.sheet,
            session.path.display()
        );
        let (cell_range, start_cell) = match target {
            WriteTarget::Exact(range) => (Some(range.to_a1_string()), None),
            WriteTarget::Anchored(addr) => (None, Some(addr.to_a1_string())),
        };
        Ok(WriteRangeOutcome {
            file_path: session.file_path(),
            sheet_name: args.sheet.clone(),
            cell_range,
            start_cell,
            rows: args.values.len(),
            written_cells,
            saved: true,
        })
    }

    /// Reset values in a bounded range to empty, keeping styles
    pub fn clear_range(&self, args: &RangeArgs) -> Result<ClearRangeOutcome> {
        let range = parse_bounded_range(&args.range)?;

        let mut session = self.open(&args.path, args.create_if_missing)?;
        let index = session.sheet_index(&args.sheet, args.create_if_missing)?;
        let cleared_cells = session.sheet_mut(index)?.clear_range(&range);
        session.save()?;

        log::info!(
            "cleared {} cell(s) in {}!{}",
            cleared_cells,
            args.sheet,
            range.to_a1_string()
        );
        Ok(ClearRangeOutcome {
            file_path: session.file_path(),
            sheet_name: args.sheet.clone(),
            cell_range: range.to_a1_string(),
            cleared_cells,
            saved: true,
        })
    }
}

/// Where `write_range` puts its values
#[derive(Debug, Clone, Copy)]
enum WriteTarget {
    /// Values must match the range's dimensions exactly
    Exact(CellRange),
    /// Values are laid out from this cell; rows may differ in length
    Anchored(CellAddress),
}

impl WriteTarget {
    fn from_args(args: &WriteRangeArgs) -> Result<Self> {
        match (&args.range, &args.start_cell) {
            (Some(range), None) => Ok(WriteTarget::Exact(parse_bounded_range(range)?)),
            (None, Some(cell)) => Ok(WriteTarget::Anchored(parse_cell(cell)?)),
            (Some(_), Some(_)) => Err(EngineError::Format(
                "give either 'range' or 'start_cell', not both".into(),
            )),
            (None, None) => Err(EngineError::Format(
                "one of 'range' or 'start_cell' is required".into(),
            )),
        }
    }

    /// Check that `rows` fits the target, returning the top-left cell
    fn check_shape(&self, rows: &[Vec<CellValue>]) -> Result<CellAddress> {
        match self {
            WriteTarget::Exact(range) => {
                let expected_cols = range.col_count() as usize;
                let mismatch = rows.len() != range.row_count() as usize
                    || rows.iter().any(|row| row.len() != expected_cols);
                if mismatch {
                    return Err(EngineError::Shape(format!(
                        "range {} is {}x{} but values are {}",
                        range.to_a1_string(),
                        range.row_count(),
                        range.col_count(),
                        describe_shape(rows)
                    )));
                }
                Ok(range.start)
            }
            WriteTarget::Anchored(addr) => {
                let height = rows.len() as u64;
                let width = rows.iter().map(Vec::len).max().unwrap_or(0) as u64;
                if addr.row as u64 + height > MAX_ROWS as u64
                    || addr.col as u64 + width > MAX_COLS as u64
                {
                    return Err(EngineError::Range(format!(
                        "{} values anchored at {} run past the sheet limit",
                        describe_shape(rows),
                        addr.to_a1_string()
                    )));
                }
                Ok(*addr)
            }
        }
    }
}

fn describe_shape(rows: &[Vec<CellValue>]) -> String {
    let widths: Vec<usize> = rows.iter().map(Vec::len).collect();
    match widths.first() {
        None => "empty".to_string(),
        Some(&first) if widths.iter().all(|w| *w == first) => {
            format!("{}x{}", rows.len(), first)
        }
        Some(_) => format!("{} ragged rows", rows.len()),
    }
}

/// Store a value, keeping the cell's style
///
/// Dates also get a date number format unless the cell already shows
/// dates.
pub(super) fn store_value(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: CellValue,
) -> Result<()> {
    let date_code = value.as_datetime().map(|dt| {
        if dt.num_seconds_from_midnight() == 0 && dt.nanosecond() == 0 {
            NumberFormat::DATE_CODE
        } else {
            NumberFormat::DATETIME_CODE
        }
    });

    sheet.set_cell_value_at(row, col, value)?;

    if let Some(code) = date_code {
        if !sheet.style_at(row, col).number_format.is_date_format() {
            let patch = StylePatch {
                number_format: Some(code.to_string()),
                ..Default::default()
            };
            sheet.apply_style_patch_at(row, col, &patch)?;
        }
    }
    Ok(())
}
