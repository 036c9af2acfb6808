//! cellfence CLI - sandboxed workbook editing from the shell
//!
//! Every subcommand runs one engine operation and prints its result as JSON
//! on stdout. Failures print `{"kind": ..., "message": ...}` and exit with
//! status 1. Logs go to stderr, filtered by `RUST_LOG`.

use anyhow::{Context, Result};
use cellfence::command::{
    DeleteSheetArgs, FormatRangeArgs, ListSheetsArgs, RangeArgs, RenameSheetArgs, ShiftArgs,
    WriteCellArgs, WriteRangeArgs,
};
use cellfence::{Command, Engine, EngineConfig, EngineError, StyleArgs};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "cellfence")]
#[command(author, version, about = "Read and edit xlsx/xlsm workbooks inside a sandbox root")]
struct Cli {
    /// Sandbox root (default: $EXCEL_MCP_ROOT, then the working directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Workbook and sheet every sheet-level subcommand takes
#[derive(Args)]
struct Target {
    /// Workbook path, relative to the root
    path: String,

    /// Sheet name
    sheet: String,
}

#[derive(Args)]
struct Shift {
    #[command(flatten)]
    target: Target,

    /// 1-based row or column number
    #[arg(allow_hyphen_values = true)]
    at: i64,

    /// Number of rows or columns
    #[arg(short = 'n', long, default_value = "1", allow_hyphen_values = true)]
    count: i64,

    /// Create the workbook and sheet if they do not exist
    #[arg(long)]
    create: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the sheets of a workbook in order
    #[command(alias = "sheets")]
    ListSheets {
        /// Workbook path, relative to the root
        path: String,

        /// Create the workbook if it does not exist
        #[arg(long)]
        create: bool,
    },

    /// Print the values of a bounded range, row by row
    #[command(alias = "read")]
    ReadRange {
        #[command(flatten)]
        target: Target,

        /// Range in A1 notation, e.g. A1:C3
        range: String,

        /// Create the workbook and sheet if they do not exist
        #[arg(long)]
        create: bool,
    },

    /// Write one cell
    #[command(alias = "write")]
    WriteCell {
        #[command(flatten)]
        target: Target,

        /// Cell in A1 notation
        cell: String,

        /// Value; parsed as JSON when possible (42, true, null,
        /// {"date": "2024-01-31"}), otherwise stored as text
        value: String,

        /// Store the value as text even if it parses as JSON
        #[arg(long)]
        text: bool,

        /// Style descriptor as a JSON object
        #[arg(long)]
        style: Option<String>,

        /// Fail instead of creating a missing workbook or sheet
        #[arg(long)]
        no_create: bool,
    },

    /// Write a 2-D JSON array of values
    WriteRange {
        #[command(flatten)]
        target: Target,

        /// Values as a JSON array of rows, e.g. '[[1, 2], ["a", "b"]]'
        values: String,

        /// Exact range the values must fill
        #[arg(long, conflicts_with = "start", required_unless_present = "start")]
        range: Option<String>,

        /// Top-left cell to anchor the values at; rows may differ in length
        #[arg(long)]
        start: Option<String>,

        /// Fail instead of creating a missing workbook or sheet
        #[arg(long)]
        no_create: bool,
    },

    /// Insert empty rows before a row
    InsertRows(Shift),

    /// Delete rows starting at a row
    DeleteRows(Shift),

    /// Insert empty columns before a column
    InsertColumns(Shift),

    /// Delete columns starting at a column
    DeleteColumns(Shift),

    /// Rename a sheet
    RenameSheet {
        /// Workbook path, relative to the root
        path: String,

        /// Current sheet name
        old: String,

        /// New sheet name
        new: String,
    },

    /// Delete a sheet (the last sheet cannot be deleted)
    DeleteSheet {
        #[command(flatten)]
        target: Target,
    },

    /// Clear the values of a range, keeping styles
    ClearRange {
        #[command(flatten)]
        target: Target,

        /// Range in A1 notation
        range: String,
    },

    /// Merge a style descriptor onto every cell of a range
    FormatRange {
        #[command(flatten)]
        target: Target,

        /// Range in A1 notation
        range: String,

        /// Style descriptor as a JSON object, e.g. '{"bold": true, "fill_hex": "FFFF00"}'
        style: String,

        /// Create the workbook and sheet if they do not exist
        #[arg(long)]
        create: bool,
    },

    /// Run a JSON command: inline, @file, or - / absent for stdin
    Exec {
        command: Option<String>,
    },
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match cli.root {
        Some(root) => EngineConfig::new(root),
        None => EngineConfig::from_env().context("failed to determine the sandbox root")?,
    };
    let engine = Engine::new(&config)
        .with_context(|| format!("cannot use '{}' as sandbox root", config.root.display()))?;
    log::debug!("sandbox root: {}", engine.sandbox().root().display());

    // Malformed arguments are reported like any other format error
    let result = build_command(cli.command).and_then(|command| engine.execute(&command));
    let (output, code) = match result {
        Ok(outcome) => (serde_json::to_value(outcome)?, ExitCode::SUCCESS),
        Err(e) => (serde_json::to_value(e.report())?, ExitCode::FAILURE),
    };
    print_json(&output, cli.pretty)?;
    Ok(code)
}

fn build_command(command: Commands) -> cellfence::Result<Command> {
    Ok(match command {
        Commands::ListSheets { path, create } => Command::ListSheets(ListSheetsArgs {
            path,
            create_if_missing: create,
        }),
        Commands::ReadRange {
            target,
            range,
            create,
        } => Command::ReadRange(RangeArgs {
            path: target.path,
            sheet: target.sheet,
            range,
            create_if_missing: create,
        }),
        Commands::WriteCell {
            target,
            cell,
            value,
            text,
            style,
            no_create,
        } => Command::WriteCell(WriteCellArgs {
            path: target.path,
            sheet: target.sheet,
            cell,
            value: parse_value(&value, text),
            style: style.as_deref().map(parse_style).transpose()?,
            create_if_missing: !no_create,
        }),
        Commands::WriteRange {
            target,
            values,
            range,
            start,
            no_create,
        } => Command::WriteRange(WriteRangeArgs {
            path: target.path,
            sheet: target.sheet,
            range,
            start_cell: start,
            values: serde_json::from_str(&values).map_err(|e| {
                EngineError::Format(format!("values must be a JSON array of rows: {}", e))
            })?,
            create_if_missing: !no_create,
        }),
        Commands::InsertRows(shift) => Command::InsertRows(shift_args(shift)),
        Commands::DeleteRows(shift) => Command::DeleteRows(shift_args(shift)),
        Commands::InsertColumns(shift) => Command::InsertColumns(shift_args(shift)),
        Commands::DeleteColumns(shift) => Command::DeleteColumns(shift_args(shift)),
        Commands::RenameSheet { path, old, new } => {
            Command::RenameSheet(RenameSheetArgs { path, old, new })
        }
        Commands::DeleteSheet { target } => Command::DeleteSheet(DeleteSheetArgs {
            path: target.path,
            sheet: target.sheet,
        }),
        Commands::ClearRange { target, range } => Command::ClearRange(RangeArgs {
            path: target.path,
            sheet: target.sheet,
            range,
            create_if_missing: false,
        }),
        Commands::FormatRange {
            target,
            range,
            style,
            create,
        } => Command::FormatRange(FormatRangeArgs {
            path: target.path,
            sheet: target.sheet,
            range,
            style: parse_style(&style)?,
            create_if_missing: create,
        }),
        Commands::Exec { command } => {
            let text = read_command_text(command.as_deref())?;
            serde_json::from_str(&text)
                .map_err(|e| EngineError::Format(format!("invalid JSON command: {}", e)))?
        }
    })
}

fn shift_args(shift: Shift) -> ShiftArgs {
    ShiftArgs {
        path: shift.target.path,
        sheet: shift.target.sheet,
        at: shift.at,
        count: shift.count,
        create_if_missing: shift.create,
    }
}

/// JSON if the argument parses as JSON, text otherwise
fn parse_value(raw: &str, force_text: bool) -> Value {
    if force_text {
        return Value::String(raw.to_string());
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn parse_style(raw: &str) -> cellfence::Result<StyleArgs> {
    serde_json::from_str(raw)
        .map_err(|e| EngineError::Format(format!("invalid style descriptor: {}", e)))
}

fn read_command_text(source: Option<&str>) -> cellfence::Result<String> {
    match source {
        None | Some("-") => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text).map_err(|e| {
                EngineError::Io(format!("failed to read command from stdin: {}", e))
            })?;
            Ok(text)
        }
        Some(arg) => match arg.strip_prefix('@') {
            Some(file) => std::fs::read_to_string(file).map_err(|e| {
                EngineError::Io(format!("failed to read command file '{}': {}", file, e))
            }),
            None => Ok(arg.to_string()),
        },
    }
}

fn print_json(value: &Value, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", text)?;
    Ok(())
}
