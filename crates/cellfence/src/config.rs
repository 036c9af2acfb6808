//! Process-level configuration

use std::path::{Path, PathBuf};

use crate::error::Result;

/// Environment variable naming the sandbox root
pub const ROOT_ENV_VAR: &str = "EXCEL_MCP_ROOT";

/// Settings fixed for the lifetime of the process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Directory every workbook path must resolve into
    pub root: PathBuf,
}

impl EngineConfig {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Read the root from `EXCEL_MCP_ROOT`, falling back to the working directory
    ///
    /// A leading `~` is expanded against `HOME`.
    pub fn from_env() -> Result<Self> {
        let configured = std::env::var(ROOT_ENV_VAR)
            .ok()
            .filter(|value| !value.trim().is_empty());
        let home = std::env::var_os("HOME").map(PathBuf::from);

        let root = match configured {
            Some(value) => expand_home(value.trim(), home.as_deref()),
            None => std::env::current_dir()?,
        };
        log::debug!("sandbox root from environment: {}", root.display());
        Ok(Self { root })
    }
}

/// Replace a leading `~` (alone or followed by a separator) with `home`
pub(crate) fn expand_home(value: &str, home: Option<&Path>) -> PathBuf {
    let Some(home) = home else {
        return PathBuf::from(value);
    };
    if value == "~" {
        return home.to_path_buf();
    }
    match value.strip_prefix("~/").or_else(|| value.strip_prefix("~\\")) {
        Some(rest) => home.join(rest),
        None => PathBuf::from(value),
    }
}
