//! Row and column insertion and deletion

use cellfence_core::shift::ShiftKind;
use cellfence_core::{Axis, ShiftOp};

use super::Engine;
use crate::command::ShiftArgs;
use crate::error::{EngineError, Result};
use crate::outcome::ShiftOutcome;

impl Engine {
    /// Insert `count` empty rows before row `at`
    pub fn insert_rows(&self, args: &ShiftArgs) -> Result<ShiftOutcome> {
        self.shift(args, Axis::Row, ShiftKind::Insert)
    }

    /// Delete rows `at..at + count`
    pub fn delete_rows(&self, args: &ShiftArgs) -> Result<ShiftOutcome> {
        self.shift(args, Axis::Row, ShiftKind::Delete)
    }

    /// Insert `count` empty columns before column `at`
    pub fn insert_columns(&self, args: &ShiftArgs) -> Result<ShiftOutcome> {
        self.shift(args, Axis::Column, ShiftKind::Insert)
    }

    /// Delete columns `at..at + count`
    pub fn delete_columns(&self, args: &ShiftArgs) -> Result<ShiftOutcome> {
        self.shift(args, Axis::Column, ShiftKind::Delete)
    }

    fn shift(&self, args: &ShiftArgs, axis: Axis, kind: ShiftKind) -> Result<ShiftOutcome> {
        let op = shift_op(axis, kind, args.at, args.count)?;

        let mut session = self.open(&args.path, args.create_if_missing)?;
        let index = session.sheet_index(&args.sheet, args.create_if_missing)?;
        // Atomic: on overflow the sheet is unchanged and nothing is saved
        session.sheet_mut(index)?.apply_shift(op)?;
        session.save()?;

        log::info!(
            "{} {} {} at {} on '{}' in '{}'",
            match kind {
                ShiftKind::Insert => "inserted",
                ShiftKind::Delete => "deleted",
            },
            op.count,
            axis.noun(),
            args.at,
            args.sheet,
            session.path.display()
        );
        Ok(ShiftOutcome {
            file_path: session.file_path(),
            sheet_name: args.sheet.clone(),
            idx: op.at + 1,
            amount: op.count,
            saved: true,
        })
    }
}

/// Validate 1-based `at`/`count` and build the 0-based edit
///
/// Both must be at least 1 and `at` must be on the sheet. A deletion band
/// must end on the sheet too; an insertion may push only empty lines off
/// the end, which [`cellfence_core::Worksheet::apply_shift`] checks.
fn shift_op(axis: Axis, kind: ShiftKind, at: i64, count: i64) -> Result<ShiftOp> {
    let limit = axis.limit() as i64;
    let line = match axis {
        Axis::Row => "row",
        Axis::Column => "column",
    };

    if at < 1 {
        return Err(EngineError::Range(format!(
            "{} position must be at least 1, got {}",
            line, at
        )));
    }
    if count < 1 {
        return Err(EngineError::Range(format!(
            "count must be at least 1, got {}",
            count
        )));
    }
    if at > limit {
        return Err(EngineError::Range(format!(
            "{} {} is past the sheet limit of {}",
            line, at, limit
        )));
    }
    if count > limit {
        return Err(EngineError::Range(format!(
            "cannot {} {} {}; a sheet has {}",
            match kind {
                ShiftKind::Insert => "insert",
                ShiftKind::Delete => "delete",
            },
            count,
            axis.noun(),
            limit
        )));
    }
    if kind == ShiftKind::Delete && at + count - 1 > limit {
        return Err(EngineError::Range(format!(
            "deleting {} {} from {} runs past the sheet limit of {}",
            count,
            axis.noun(),
            at,
            limit
        )));
    }

    let (at0, count) = ((at - 1) as u32, count as u32);
    Ok(match kind {
        ShiftKind::Insert => ShiftOp::insert(axis, at0, count),
        ShiftKind::Delete => ShiftOp::delete(axis, at0, count),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_shift_op_is_zero_based() {
        let op = shift_op(Axis::Row, ShiftKind::Insert, 3, 2).unwrap();
        assert_eq!(op, ShiftOp::insert(Axis::Row, 2, 2));
    }

    #[test]
    fn test_shift_op_rejects_out_of_domain() {
        let cases = [
            (Axis::Row, ShiftKind::Insert, 0, 1),
            (Axis::Row, ShiftKind::Insert, 1, 0),
            (Axis::Column, ShiftKind::Delete, -1, 1),
            (Axis::Column, ShiftKind::Insert, 16_385, 1),
            (Axis::Column, ShiftKind::Delete, 16_384, 2),
            (Axis::Row, ShiftKind::Delete, 1, 1_048_577),
        ];
        for (axis, kind, at, count) in cases {
            let err = shift_op(axis, kind, at, count).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Range, "{:?} {:?} {} {}", axis, kind, at, count);
        }
    }

    #[test]
    fn test_delete_up_to_the_last_line_is_allowed() {
        assert!(shift_op(Axis::Column, ShiftKind::Delete, 16_384, 1).is_ok());
        assert!(shift_op(Axis::Row, ShiftKind::Delete, 1, 1_048_576).is_ok());
    }
}
