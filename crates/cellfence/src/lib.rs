//! # cellfence
//!
//! Sandboxed reading and editing of `.xlsx` / `.xlsm` workbooks.
//!
//! An [`Engine`] is built once from an [`EngineConfig`] and executes
//! [`Command`]s. Every command names a workbook path, which must resolve
//! inside the configured root ([`SandboxPolicy`]). The workbook is loaded
//! fresh for each command, edited in memory and saved back atomically, so
//! every command sees the file as it was when it started.
//!
//! Supported operations: `list_sheets`, `read_range`, `write_cell`,
//! `write_range`, `insert_rows`, `delete_rows`, `insert_columns`,
//! `delete_columns`, `rename_sheet`, `delete_sheet`, `clear_range` and
//! `format_range`. Failures are [`EngineError`]s whose [`EngineError::kind`]
//! classifies them for the caller.
//!
//! ## Concurrency
//!
//! There is no locking between processes. Two commands editing the same
//! file at the same time race: the last save wins and the other edit is
//! lost. Callers that need ordering must serialize their commands.
//!
//! ## Example
//!
//! ```rust
//! use cellfence::{Command, Engine, EngineConfig};
//! use serde_json::json;
//!
//! let root = tempfile::tempdir().unwrap();
//! let engine = Engine::new(&EngineConfig::new(root.path())).unwrap();
//!
//! let write: Command = serde_json::from_value(json!({
//!     "op": "write_cell", "path": "book.xlsx", "sheet": "Sheet1", "cell": "B2", "value": 42
//! }))
//! .unwrap();
//! engine.execute(&write).unwrap();
//!
//! let read = json!({"op": "read_range", "path": "book.xlsx", "sheet": "Sheet1", "range": "B2"});
//! let outcome = engine.execute_json(read).unwrap();
//! assert_eq!(outcome["values"], json!([[42]]));
//! ```

pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod outcome;
pub mod persistence;
pub mod sandbox;
pub mod value;

pub use command::{Command, StyleArgs};
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{EngineError, ErrorKind, ErrorReport, Result};
pub use outcome::Outcome;
pub use sandbox::SandboxPolicy;
