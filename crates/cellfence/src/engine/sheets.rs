//! Workbook-level operations: listing, renaming and deleting sheets

use cellfence_core::Workbook;

use super::Engine;
use crate::command::{DeleteSheetArgs, ListSheetsArgs, RenameSheetArgs};
use crate::error::{EngineError, Result};
use crate::outcome::{DeleteSheetOutcome, ListSheetsOutcome, RenameSheetOutcome};

impl Engine {
    /// Sheet names in tab order
    pub fn list_sheets(&self, args: &ListSheetsArgs) -> Result<ListSheetsOutcome> {
        let session = self.open(&args.path, args.create_if_missing)?;
        session.save_if_created()?;

        Ok(ListSheetsOutcome {
            file_path: session.file_path(),
            sheets: session.workbook.sheet_names(),
            workspace_root: self.sandbox.root().display().to_string(),
        })
    }

    /// Rename a sheet in place
    ///
    /// Formulas that mention the old name are left as they are.
    pub fn rename_sheet(&self, args: &RenameSheetArgs) -> Result<RenameSheetOutcome> {
        Workbook::validate_sheet_name(&args.new)?;

        let mut session = self.open(&args.path, false)?;
        let index = session.sheet_index(&args.old, false)?;
        session.workbook.rename_worksheet(index, &args.new)?;
        session.save()?;

        log::info!(
            "renamed sheet '{}' to '{}' in '{}'",
            args.old,
            args.new,
            session.path.display()
        );
        Ok(RenameSheetOutcome {
            file_path: session.file_path(),
            old_name: args.old.clone(),
            new_name: args.new.clone(),
            saved: true,
        })
    }

    /// Remove a sheet; the last remaining sheet cannot be removed
    pub fn delete_sheet(&self, args: &DeleteSheetArgs) -> Result<DeleteSheetOutcome> {
        let mut session = self.open(&args.path, false)?;
        let index = session.sheet_index(&args.sheet, false)?;
        if session.workbook.sheet_count() == 1 {
            return Err(EngineError::Conflict(format!(
                "last sheet: '{}' is the only sheet in the workbook",
                args.sheet
            )));
        }
        session.workbook.remove_worksheet(index)?;
        session.save()?;

        log::info!(
            "deleted sheet '{}' from '{}'",
            args.sheet,
            session.path.display()
        );
        Ok(DeleteSheetOutcome {
            file_path: session.file_path(),
            deleted_sheet: args.sheet.clone(),
            remaining_sheets: session.workbook.sheet_names(),
            saved: true,
        })
    }
}
