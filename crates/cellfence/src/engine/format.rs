//! Applying style descriptors to ranges

use super::{parse_limited_range, Engine};
use crate::command::FormatRangeArgs;
use crate::error::Result;
use crate::outcome::FormatRangeOutcome;

impl Engine {
    /// Merge a style descriptor onto every cell of a bounded range
    ///
    /// Only the attributes the descriptor sets change; cells that end up
    /// with the same style share one entry in the sheet's style pool.
    /// Ranges over [`MAX_RANGE_CELLS`](super::MAX_RANGE_CELLS) cells are
    /// refused.
    pub fn format_range(&self, args: &FormatRangeArgs) -> Result<FormatRangeOutcome> {
        let range = parse_limited_range(&args.range)?;
        let patch = args.style.to_patch()?;

        let mut session = self.open(&args.path, args.create_if_missing)?;
        let index = session.sheet_index(&args.sheet, args.create_if_missing)?;
        let sheet = session.sheet_mut(index)?;
        for addr in range.cells() {
            sheet.apply_style_patch_at(addr.row, addr.col, &patch)?;
        }
        session.save()?;

        log::info!(
            "formatted {} cell(s) in {}!{}",
            range.cell_count(),
            args.sheet,
            range.to_a1_string()
        );
        Ok(FormatRangeOutcome {
            file_path: session.file_path(),
            sheet_name: args.sheet.clone(),
            cell_range: range.to_a1_string(),
            updated_cells: range.cell_count(),
            saved: true,
        })
    }
}
