//! The mutation engine
//!
//! Every operation follows the same path: arguments are parsed and
//! validated, the workbook path is resolved through the sandbox, the
//! workbook is loaded (or created), the edit is applied to the in-memory
//! model and, for mutating operations, the workbook is saved atomically.
//! Nothing is written if any step before the save fails.

mod cells;
mod format;
mod sheets;
mod structure;

use std::path::{Path, PathBuf};

use cellfence_core::{CellAddress, CellRange, Workbook, Worksheet, MAX_ROWS};

use crate::command::Command;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::outcome::Outcome;
use crate::persistence;
use crate::sandbox::SandboxPolicy;

/// Most cells `read_range` and `format_range` visit in one call: one full
/// column. A larger range fails with a range error before the workbook is
/// opened.
pub const MAX_RANGE_CELLS: u64 = MAX_ROWS as u64;

/// Executes commands against workbooks inside one sandbox root
#[derive(Debug, Clone)]
pub struct Engine {
    sandbox: SandboxPolicy,
}

impl Engine {
    /// Build an engine for the configured root
    pub fn new(config: &EngineConfig) -> Result<Self> {
        Ok(Self::with_policy(SandboxPolicy::new(&config.root)?))
    }

    pub fn with_policy(sandbox: SandboxPolicy) -> Self {
        Self { sandbox }
    }

    pub fn sandbox(&self) -> &SandboxPolicy {
        &self.sandbox
    }

    /// Run one command
    pub fn execute(&self, command: &Command) -> Result<Outcome> {
        let span = tracing::info_span!("command", op = command.name(), path = command.path());
        let _enter = span.enter();

        let result = match command {
            Command::ListSheets(args) => self.list_sheets(args).map(Outcome::ListSheets),
            Command::ReadRange(args) => self.read_range(args).map(Outcome::ReadRange),
            Command::WriteCell(args) => self.write_cell(args).map(Outcome::WriteCell),
            Command::WriteRange(args) => self.write_range(args).map(Outcome::WriteRange),
            Command::InsertRows(args) => self.insert_rows(args).map(Outcome::Shift),
            Command::DeleteRows(args) => self.delete_rows(args).map(Outcome::Shift),
            Command::InsertColumns(args) => self.insert_columns(args).map(Outcome::Shift),
            Command::DeleteColumns(args) => self.delete_columns(args).map(Outcome::Shift),
            Command::RenameSheet(args) => self.rename_sheet(args).map(Outcome::RenameSheet),
            Command::DeleteSheet(args) => self.delete_sheet(args).map(Outcome::DeleteSheet),
            Command::ClearRange(args) => self.clear_range(args).map(Outcome::ClearRange),
            Command::FormatRange(args) => self.format_range(args).map(Outcome::FormatRange),
        };

        if let Err(e) = &result {
            log::warn!("{} failed ({}): {}", command.name(), e.kind().as_str(), e.message());
        }
        result
    }

    /// Parse a JSON command, run it and return the JSON outcome
    pub fn execute_json(&self, command: serde_json::Value) -> Result<serde_json::Value> {
        let command: Command = serde_json::from_value(command)?;
        let outcome = self.execute(&command)?;
        Ok(serde_json::to_value(outcome)?)
    }

    /// Resolve `requested` and load the workbook behind it
    ///
    /// With `create_if_missing`, a missing file yields a fresh workbook
    /// that is written on the next save.
    fn open(&self, requested: &str, create_if_missing: bool) -> Result<Session> {
        let path = self.sandbox.resolve(requested)?;

        if path.exists() {
            let workbook = persistence::load(&path)?;
            return Ok(Session {
                sandbox: self.sandbox.clone(),
                path,
                workbook,
                created: false,
            });
        }
        if !create_if_missing {
            return Err(EngineError::NotFound(format!(
                "workbook '{}' does not exist",
                path.display()
            )));
        }

        log::info!("creating workbook '{}'", path.display());
        Ok(Session {
            sandbox: self.sandbox.clone(),
            path,
            workbook: Workbook::new(),
            created: true,
        })
    }
}

/// A workbook loaded for the duration of one command
pub(crate) struct Session {
    sandbox: SandboxPolicy,
    path: PathBuf,
    workbook: Workbook,
    /// The file or a sheet was created while opening
    created: bool,
}

impl Session {
    fn file_path(&self) -> String {
        self.path.display().to_string()
    }

    /// Index of the sheet named exactly `name`, appending it if allowed
    fn sheet_index(&mut self, name: &str, create_if_missing: bool) -> Result<usize> {
        if let Some(index) = self.workbook.sheet_index(name) {
            return Ok(index);
        }
        if !create_if_missing {
            return Err(EngineError::NotFound(format!("sheet '{}' not found", name)));
        }
        let index = self.workbook.add_worksheet_with_name(name)?;
        log::info!("created sheet '{}'", name);
        self.created = true;
        Ok(index)
    }

    fn sheet(&self, index: usize) -> Result<&Worksheet> {
        let count = self.workbook.sheet_count();
        self.workbook
            .worksheet(index)
            .ok_or_else(|| cellfence_core::Error::SheetOutOfBounds(index, count).into())
    }

    fn sheet_mut(&mut self, index: usize) -> Result<&mut Worksheet> {
        let count = self.workbook.sheet_count();
        self.workbook
            .worksheet_mut(index)
            .ok_or_else(|| cellfence_core::Error::SheetOutOfBounds(index, count).into())
    }

    /// Save if opening created anything; read-only commands use this
    fn save_if_created(&self) -> Result<()> {
        if self.created {
            self.save()?;
        }
        Ok(())
    }

    fn save(&self) -> Result<()> {
        if self.created {
            create_parent_dirs(&self.path)?;
        }
        // The directory may have been swapped for a link since resolution
        self.sandbox.check_parent(&self.path)?;
        persistence::save(&self.workbook, &self.path)
    }
}

fn create_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Parse a range that must have concrete bounds on both axes
fn parse_bounded_range(text: &str) -> Result<CellRange> {
    let range = CellRange::parse(text)?;
    Ok(range.require_bounded()?)
}

/// Parse a bounded range of at most [`MAX_RANGE_CELLS`] cells
fn parse_limited_range(text: &str) -> Result<CellRange> {
    let range = parse_bounded_range(text)?;
    if range.cell_count() > MAX_RANGE_CELLS {
        return Err(EngineError::Range(format!(
            "range {} covers {} cells; at most {} can be visited at once",
            range.to_a1_string(),
            range.cell_count(),
            MAX_RANGE_CELLS
        )));
    }
    Ok(range)
}

fn parse_cell(text: &str) -> Result<CellAddress> {
    Ok(CellAddress::parse(text)?)
}
