//! Loading workbooks from disk and saving them back atomically

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use cellfence_core::Workbook;
use cellfence_xlsx::{ContainerKind, XlsxError, XlsxReader, XlsxWriter};
use tempfile::NamedTempFile;

use crate::error::{EngineError, Result};

/// Load the workbook stored at `path`
///
/// A missing file is [`EngineError::NotFound`]; a file that is not a
/// readable container is [`EngineError::Format`].
pub fn load(path: &Path) -> Result<Workbook> {
    if !path.exists() {
        return Err(EngineError::NotFound(format!(
            "workbook '{}' does not exist",
            path.display()
        )));
    }

    let file = File::open(path)?;
    let workbook = XlsxReader::read(BufReader::new(file)).map_err(|e| load_error(path, e))?;
    log::debug!(
        "loaded '{}' with {} sheet(s)",
        path.display(),
        workbook.sheet_count()
    );
    Ok(workbook)
}

fn load_error(path: &Path, err: XlsxError) -> EngineError {
    if err.is_io() {
        EngineError::Io(format!("cannot read '{}': {}", path.display(), err))
    } else {
        EngineError::Format(format!(
            "'{}' is not a valid workbook: {}",
            path.display(),
            err
        ))
    }
}

/// Save `workbook` to `path`, replacing any existing file in one step
///
/// The container is written to a temporary file in the same directory,
/// synced, then renamed over the target. If anything fails before the
/// rename the previous file is untouched. The container flavour follows
/// the target's extension.
pub fn save(workbook: &Workbook, path: &Path) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let kind = ContainerKind::from_path(path);

    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        XlsxWriter::write_as(workbook, &mut writer, kind)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| EngineError::from(e.error))?;

    // The file is already in place; a failed directory sync is not a failed save
    if let Err(e) = File::open(dir).and_then(|d| d.sync_all()) {
        log::debug!("directory sync after saving '{}' failed: {}", path.display(), e);
    }

    log::debug!("saved '{}' as {:?}", path.display(), kind);
    Ok(())
}
