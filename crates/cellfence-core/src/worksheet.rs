//! Worksheet type

use std::collections::BTreeMap;

use crate::cell::{CellAddress, CellData, CellRange, CellStorage, CellValue};
use crate::comment::CellComment;
use crate::conditional_format::ConditionalFormat;
use crate::error::{Error, Result};
use crate::hyperlink::Hyperlink;
use crate::preserved::PreservedMarkup;
use crate::reference::shift_formula;
use crate::shift::{Axis, ShiftOp};
use crate::style::{Style, StylePatch, StylePool};
use crate::validation::DataValidation;
use crate::{MAX_COLS, MAX_ROWS};

/// Sheet tab visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SheetState {
    #[default]
    Visible,
    /// Hidden, but the user can unhide it
    Hidden,
    /// Only reachable programmatically
    VeryHidden,
}

impl SheetState {
    /// Value of the `state` attribute on `<sheet>`
    pub fn as_str(&self) -> &'static str {
        match self {
            SheetState::Visible => "visible",
            SheetState::Hidden => "hidden",
            SheetState::VeryHidden => "veryHidden",
        }
    }

    /// Parse the `state` attribute; unknown values count as visible
    pub fn from_attr(s: &str) -> Self {
        match s {
            "hidden" => SheetState::Hidden,
            "veryHidden" => SheetState::VeryHidden,
            _ => SheetState::Visible,
        }
    }
}

/// A worksheet (single sheet in a workbook)
#[derive(Debug)]
pub struct Worksheet {
    /// Sheet name
    name: String,
    /// Cell storage
    cells: CellStorage,
    /// Tab visibility
    state: SheetState,
    /// Notes keyed by (row, col)
    comments: BTreeMap<(u32, u16), CellComment>,
    /// Conditional formatting blocks in file order
    conditional_formats: Vec<ConditionalFormat>,
    /// Data validation rules in file order
    data_validations: Vec<DataValidation>,
    /// Hyperlinks in file order
    hyperlinks: Vec<Hyperlink>,
    /// Markup carried over from the file as-is
    preserved: PreservedMarkup,
}

impl Worksheet {
    /// Create a new worksheet with the given name
    ///
    /// The name is not validated here; [`crate::Workbook`] checks names when
    /// sheets are added or renamed.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            cells: CellStorage::new(),
            state: SheetState::Visible,
            comments: BTreeMap::new(),
            conditional_formats: Vec::new(),
            data_validations: Vec::new(),
            hyperlinks: Vec::new(),
            preserved: PreservedMarkup::default(),
        }
    }

    /// Get the sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    /// Get the tab visibility
    pub fn state(&self) -> SheetState {
        self.state
    }

    /// Set the tab visibility
    pub fn set_state(&mut self, state: SheetState) {
        self.state = state;
    }

    // === Cell Access ===

    /// Get a cell by address string (e.g., "A1")
    pub fn cell(&self, address: &str) -> Result<Option<&CellData>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.cells.get(addr.row, addr.col))
    }

    /// Get cell value (convenience method)
    pub fn get_value(&self, address: &str) -> Result<CellValue> {
        let addr = CellAddress::parse(address)?;
        Ok(self.get_value_at(addr.row, addr.col))
    }

    /// Get cell value by indices
    pub fn get_value_at(&self, row: u32, col: u16) -> CellValue {
        self.cells
            .get(row, col)
            .map(|c| c.value.clone())
            .unwrap_or_default()
    }

    /// Get a cell's style index by row/column.
    ///
    /// Returns 0 if the cell does not exist or has the default style.
    pub fn cell_style_index_at(&self, row: u32, col: u16) -> u32 {
        self.cells.get(row, col).map_or(0, |c| c.style_index)
    }

    /// Get the effective style of a cell (the default style for plain cells)
    pub fn style_at(&self, row: u32, col: u16) -> &Style {
        self.cells
            .style_pool()
            .get_or_default(self.cell_style_index_at(row, col))
    }

    /// Get the effective style of a cell by address
    pub fn style(&self, address: &str) -> Result<&Style> {
        let addr = CellAddress::parse(address)?;
        Ok(self.style_at(addr.row, addr.col))
    }

    /// The styles referenced by this sheet's cells
    pub fn style_pool(&self) -> &StylePool {
        self.cells.style_pool()
    }

    /// Intern a style in this sheet's pool, returning its index
    pub fn intern_style(&mut self, style: Style) -> u32 {
        self.cells.style_pool_mut().get_or_insert(style)
    }

    // === Cell Modification ===

    /// Set a cell value by address string
    pub fn set_cell_value<V: Into<CellValue>>(&mut self, address: &str, value: V) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_value_at(addr.row, addr.col, value)
    }

    /// Set a cell value by row and column indices, keeping its style
    pub fn set_cell_value_at<V: Into<CellValue>>(
        &mut self,
        row: u32,
        col: u16,
        value: V,
    ) -> Result<()> {
        self.validate_cell_position(row, col)?;
        self.cells.set_value(row, col, value.into());
        Ok(())
    }

    /// Set a cell formula by address string
    pub fn set_cell_formula(&mut self, address: &str, formula: &str) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_value_at(addr.row, addr.col, CellValue::formula(formula))
    }

    /// Set a cell style by row and column indices
    pub fn set_cell_style_at(&mut self, row: u32, col: u16, style: &Style) -> Result<()> {
        self.validate_cell_position(row, col)?;
        let style_index = self.intern_style(style.clone());
        self.cells.set_style(row, col, style_index);
        Ok(())
    }

    /// Merge `patch` onto the cell's current style
    pub fn apply_style_patch_at(&mut self, row: u32, col: u16, patch: &StylePatch) -> Result<()> {
        let style = patch.apply(self.style_at(row, col));
        self.set_cell_style_at(row, col, &style)
    }

    /// Reset a cell's value to empty, keeping its style
    ///
    /// Returns whether the cell held a value.
    pub fn clear_value_at(&mut self, row: u32, col: u16) -> bool {
        let had_value = self.cells.get(row, col).is_some_and(|c| !c.value.is_empty());
        if had_value {
            self.cells.set_value(row, col, CellValue::Empty);
        }
        had_value
    }

    // === Range Operations ===

    /// Get the used range (bounds of all stored cells)
    pub fn used_range(&self) -> Option<CellRange> {
        self.cells
            .used_bounds()
            .map(|(min_row, min_col, max_row, max_col)| {
                CellRange::from_indices(min_row, min_col, max_row, max_col)
            })
    }

    /// Reset every value in `range` to empty, keeping styles
    ///
    /// Returns the number of cells that held a value.
    pub fn clear_range(&mut self, range: &CellRange) -> usize {
        let occupied: Vec<(u32, u16)> = self
            .cells
            .iter_range(*range)
            .filter(|(_, _, data)| !data.value.is_empty())
            .map(|(row, col, _)| (row, col))
            .collect();
        for (row, col) in &occupied {
            self.cells.set_value(*row, *col, CellValue::Empty);
        }
        occupied.len()
    }

    /// Stored cells inside `range`, row by row
    pub fn iter_range(&self, range: &CellRange) -> impl Iterator<Item = (u32, u16, &CellData)> {
        self.cells.iter_range(*range)
    }

    // === Structural edits ===

    /// Insert or delete rows/columns as one atomic step
    ///
    /// Cells, row heights, column widths, hidden flags, merged regions,
    /// comments, conditional formats, data validations and hyperlinks move
    /// with the edit, and every formula on this sheet has its unqualified
    /// references rewritten to match. If a cell or comment would be pushed
    /// past the sheet limit the sheet is left unchanged. Preserved markup is
    /// not rewritten.
    pub fn apply_shift(&mut self, op: ShiftOp) -> Result<()> {
        if op.count == 0 {
            return Ok(());
        }
        let comment_overflows = self.comments.keys().any(|&(row, col)| match op.axis {
            Axis::Row => op.overflows(row),
            Axis::Column => op.overflows(col as u32),
        });
        if comment_overflows {
            return Err(Error::ShiftOverflow {
                what: "comments".to_string(),
                count: op.count,
            });
        }
        self.cells.apply_shift(&op)?;

        for (_, _, data) in self.cells.iter_mut() {
            if let CellValue::Formula { text, array, .. } = &mut data.value {
                *text = shift_formula(text.as_str(), &op);
                if let Some(extent) = array.as_mut() {
                    if let Some(range) = op.map_range(&extent.range) {
                        extent.range = range;
                    }
                }
            }
        }

        let old = std::mem::take(&mut self.comments);
        self.comments = old
            .into_iter()
            .filter_map(|((row, col), comment)| {
                let moved = match op.axis {
                    Axis::Row => (op.map_index(row)?, col),
                    Axis::Column => (row, op.map_index(col as u32)? as u16),
                };
                Some((moved, comment))
            })
            .collect();
        self.conditional_formats.retain_mut(|block| block.shift(&op));
        self.data_validations.retain_mut(|rule| rule.shift(&op));
        self.hyperlinks.retain_mut(|link| link.shift(&op));
        Ok(())
    }

    // === Row/Column Operations ===

    /// Get row height
    pub fn row_height(&self, row: u32) -> f64 {
        self.cells.row_height(row)
    }

    /// Set row height
    pub fn set_row_height(&mut self, row: u32, height: f64) {
        self.cells.set_row_height(row, height);
    }

    /// Check if row is hidden
    pub fn is_row_hidden(&self, row: u32) -> bool {
        self.cells.is_row_hidden(row)
    }

    /// Set row hidden state
    pub fn set_row_hidden(&mut self, row: u32, hidden: bool) {
        self.cells.set_row_hidden(row, hidden);
    }

    /// Get column width
    pub fn column_width(&self, col: u16) -> f64 {
        self.cells.column_width(col)
    }

    /// Set column width
    pub fn set_column_width(&mut self, col: u16, width: f64) {
        self.cells.set_column_width(col, width);
    }

    /// Check if column is hidden
    pub fn is_column_hidden(&self, col: u16) -> bool {
        self.cells.is_column_hidden(col)
    }

    /// Set column hidden state
    pub fn set_column_hidden(&mut self, col: u16, hidden: bool) {
        self.cells.set_column_hidden(col, hidden);
    }

    /// Get default row height
    pub fn default_row_height(&self) -> f64 {
        self.cells.default_row_height()
    }

    /// Set default row height
    pub fn set_default_row_height(&mut self, height: f64) {
        self.cells.set_default_row_height(height);
    }

    /// Get default column width
    pub fn default_column_width(&self) -> f64 {
        self.cells.default_column_width()
    }

    /// Set default column width
    pub fn set_default_column_width(&mut self, width: f64) {
        self.cells.set_default_column_width(width);
    }

    /// Get all custom row heights (row index → height in points).
    pub fn custom_row_heights(&self) -> &BTreeMap<u32, f64> {
        self.cells.custom_row_heights()
    }

    /// Get all hidden rows (row index → true).
    pub fn hidden_rows(&self) -> &BTreeMap<u32, bool> {
        self.cells.hidden_rows()
    }

    /// Get all custom column widths (column index → width in characters).
    pub fn custom_column_widths(&self) -> &BTreeMap<u16, f64> {
        self.cells.custom_column_widths()
    }

    /// Get all hidden columns (column index → true).
    pub fn hidden_columns(&self) -> &BTreeMap<u16, bool> {
        self.cells.hidden_columns()
    }

    // === Merged Cells ===

    /// Get merged regions
    pub fn merged_regions(&self) -> &[CellRange] {
        self.cells.merged_regions()
    }

    /// Merge cells; fails if `range` overlaps an existing merge
    pub fn merge_cells(&mut self, range: &CellRange) -> Result<()> {
        self.cells.add_merged_region(range.require_bounded()?)
    }

    // === Comments ===

    /// Get the comment on a cell by address
    pub fn comment(&self, address: &str) -> Result<Option<&CellComment>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.comments.get(&(addr.row, addr.col)))
    }

    /// Get the comment on a cell by indices
    pub fn comment_at(&self, row: u32, col: u16) -> Option<&CellComment> {
        self.comments.get(&(row, col))
    }

    /// Attach a comment to a cell by address, replacing any existing one
    pub fn set_comment(&mut self, address: &str, comment: CellComment) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_comment_at(addr.row, addr.col, comment)
    }

    /// Attach a comment to a cell by indices, replacing any existing one
    pub fn set_comment_at(&mut self, row: u32, col: u16, comment: CellComment) -> Result<()> {
        self.validate_cell_position(row, col)?;
        self.comments.insert((row, col), comment);
        Ok(())
    }

    /// Remove a cell's comment, returning it
    pub fn remove_comment_at(&mut self, row: u32, col: u16) -> Option<CellComment> {
        self.comments.remove(&(row, col))
    }

    /// All comments in row order
    pub fn comments(&self) -> impl Iterator<Item = ((u32, u16), &CellComment)> {
        self.comments.iter().map(|(pos, comment)| (*pos, comment))
    }

    /// Number of comments on the sheet
    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }

    /// Distinct comment authors in first-seen row order
    pub fn comment_authors(&self) -> Vec<&str> {
        let mut authors: Vec<&str> = Vec::new();
        for comment in self.comments.values() {
            if !authors.contains(&comment.author.as_str()) {
                authors.push(comment.author.as_str());
            }
        }
        authors
    }

    // === Conditional formats, validations, hyperlinks ===

    /// Conditional formatting blocks in file order
    pub fn conditional_formats(&self) -> &[ConditionalFormat] {
        &self.conditional_formats
    }

    /// Add a conditional formatting block
    pub fn add_conditional_format(&mut self, block: ConditionalFormat) {
        self.conditional_formats.push(block);
    }

    /// Data validation rules in file order
    pub fn data_validations(&self) -> &[DataValidation] {
        &self.data_validations
    }

    /// Add a data validation rule
    pub fn add_data_validation(&mut self, rule: DataValidation) {
        self.data_validations.push(rule);
    }

    /// Hyperlinks in file order
    pub fn hyperlinks(&self) -> &[Hyperlink] {
        &self.hyperlinks
    }

    /// Add a hyperlink
    pub fn add_hyperlink(&mut self, link: Hyperlink) {
        self.hyperlinks.push(link);
    }

    /// Markup carried over from the file without interpretation
    pub fn preserved(&self) -> &PreservedMarkup {
        &self.preserved
    }

    /// Replace the carried-over markup
    pub fn set_preserved(&mut self, preserved: PreservedMarkup) {
        self.preserved = preserved;
    }

    // === Internal ===

    fn validate_cell_position(&self, row: u32, col: u16) -> Result<()> {
        if row >= MAX_ROWS {
            return Err(Error::RowOutOfBounds(row, MAX_ROWS - 1));
        }
        if col >= MAX_COLS {
            return Err(Error::ColumnOutOfBounds(col as u32, MAX_COLS as u32 - 1));
        }
        Ok(())
    }

    /// Get the number of stored cells
    pub fn cell_count(&self) -> usize {
        self.cells.cell_count()
    }

    /// Check if the sheet has no stored cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterate over all stored cells in row order
    pub fn iter_cells(&self) -> impl Iterator<Item = (u32, u16, &CellData)> {
        self.cells.iter()
    }

    /// Iterate over stored cells of one row
    pub fn iter_row(&self, row: u32) -> impl Iterator<Item = (u16, &CellData)> {
        self.cells.iter_row(row)
    }

    /// Row indices that hold at least one stored cell
    pub fn row_indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.cells.row_indices()
    }
}

impl Default for Worksheet {
    fn default() -> Self {
        Self::new("Sheet1")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Color;

    #[test]
    fn test_new_worksheet() {
        let ws = Worksheet::new("Test");
        assert_eq!(ws.name(), "Test");
        assert_eq!(ws.state(), SheetState::Visible);
        assert!(ws.is_empty());
    }

    #[test]
    fn test_set_cell_values() {
        let mut ws = Worksheet::new("Test");

        ws.set_cell_value("A1", 42.0).unwrap();
        ws.set_cell_value("B1", "Hello").unwrap();
        ws.set_cell_value("C1", true).unwrap();

        assert_eq!(ws.get_value("A1").unwrap().as_number(), Some(42.0));
        assert_eq!(ws.get_value("B1").unwrap().as_string(), Some("Hello"));
        assert_eq!(ws.get_value("C1").unwrap().as_bool(), Some(true));
        assert!(ws.get_value("D1").unwrap().is_empty());
    }

    #[test]
    fn test_set_cell_formula() {
        let mut ws = Worksheet::new("Test");
        ws.set_cell_formula("A3", "SUM(A1:A2)").unwrap();
        assert_eq!(ws.get_value("A3").unwrap().formula_text(), Some("=SUM(A1:A2)"));
    }

    #[test]
    fn test_value_write_keeps_style() {
        let mut ws = Worksheet::new("Test");
        let bold = Style::new().bold(true);
        ws.set_cell_style_at(0, 0, &bold).unwrap();
        ws.set_cell_value("A1", 5.0).unwrap();

        assert_eq!(ws.style("A1").unwrap(), &bold);
        assert!(ws.clear_value_at(0, 0));
        assert!(!ws.clear_value_at(0, 0));
        assert_eq!(ws.style("A1").unwrap(), &bold);
    }

    #[test]
    fn test_style_patch_does_not_leak_to_other_cells() {
        let mut ws = Worksheet::new("Test");
        let shared = Style::new().italic(true);
        ws.set_cell_style_at(0, 0, &shared).unwrap();
        ws.set_cell_style_at(0, 1, &shared).unwrap();
        assert_eq!(ws.cell_style_index_at(0, 0), ws.cell_style_index_at(0, 1));

        let patch = StylePatch {
            fill: Some(Color::RED),
            ..Default::default()
        };
        ws.apply_style_patch_at(0, 0, &patch).unwrap();

        assert_eq!(ws.style_at(0, 1), &shared);
        assert!(ws.style_at(0, 0).font.italic);
        assert_ne!(ws.style_at(0, 0), &shared);
    }

    #[test]
    fn test_clear_range_counts_values_only() {
        let mut ws = Worksheet::new("Test");
        ws.set_cell_value("A1", 1.0).unwrap();
        ws.set_cell_value("B2", "x").unwrap();
        ws.set_cell_style_at(1, 0, &Style::new().bold(true)).unwrap();
        ws.set_cell_value("D4", 4.0).unwrap();

        let cleared = ws.clear_range(&CellRange::parse("A1:B2").unwrap());
        assert_eq!(cleared, 2);
        assert!(ws.get_value("A1").unwrap().is_empty());
        assert!(ws.style_at(1, 0).font.bold);
        assert_eq!(ws.get_value("D4").unwrap().as_number(), Some(4.0));
    }

    #[test]
    fn test_shift_rewrites_formulas() {
        let mut ws = Worksheet::new("Test");
        ws.set_cell_value("A1", 1.0).unwrap();
        ws.set_cell_value("A2", 2.0).unwrap();
        ws.set_cell_formula("A3", "=SUM(A1:A2)").unwrap();

        ws.apply_shift(ShiftOp::insert(Axis::Row, 1, 1)).unwrap();
        assert_eq!(ws.get_value("A3").unwrap().as_number(), Some(2.0));
        assert_eq!(ws.get_value("A4").unwrap().formula_text(), Some("=SUM(A1:A3)"));

        ws.apply_shift(ShiftOp::delete(Axis::Row, 1, 1)).unwrap();
        assert_eq!(ws.get_value("A3").unwrap().formula_text(), Some("=SUM(A1:A2)"));
    }

    #[test]
    fn test_merge_cells() {
        let mut ws = Worksheet::new("Test");

        ws.merge_cells(&CellRange::parse("A1:C3").unwrap()).unwrap();
        assert_eq!(ws.merged_regions().len(), 1);

        assert!(ws.merge_cells(&CellRange::parse("B2:D4").unwrap()).is_err());
        assert!(ws.merge_cells(&CellRange::parse("F:F").unwrap()).is_err());
    }

    #[test]
    fn test_shift_moves_sheet_annotations() {
        use crate::conditional_format::ConditionalFormatRule;
        use crate::validation::ValidationType;

        let mut ws = Worksheet::new("Test");
        ws.set_comment("B2", CellComment::new("Kim", "check")).unwrap();
        ws.set_comment("B9", CellComment::new("Kim", "gone")).unwrap();

        let mut block = ConditionalFormat::new(vec![CellRange::parse("A2:A9").unwrap()]);
        let mut rule = ConditionalFormatRule::new("expression", 1);
        rule.formulas.push("A2>$C$1".into());
        block.rules.push(rule);
        ws.add_conditional_format(block);

        let mut validation = DataValidation::new(ValidationType::List);
        validation.ranges.push(CellRange::parse("D9").unwrap());
        ws.add_data_validation(validation);

        ws.add_hyperlink(Hyperlink::external(
            CellRange::parse("E3").unwrap(),
            "https://example.com",
        ));

        ws.apply_shift(ShiftOp::delete(Axis::Row, 8, 1)).unwrap();
        ws.apply_shift(ShiftOp::insert(Axis::Row, 0, 2)).unwrap();

        assert_eq!(ws.comment("B4").unwrap().unwrap().text, "check");
        assert_eq!(ws.comment_count(), 1);
        assert_eq!(ws.conditional_formats()[0].sqref(), "A4:A10");
        assert_eq!(ws.conditional_formats()[0].rules[0].formulas[0], "A4>$C$3");
        assert!(ws.data_validations().is_empty());
        assert_eq!(ws.hyperlinks()[0].range.to_string(), "E5");
    }

    #[test]
    fn test_comment_past_limit_blocks_shift() {
        let mut ws = Worksheet::new("Test");
        ws.set_cell_value("A1", 1.0).unwrap();
        ws.set_comment_at(MAX_ROWS - 1, 0, CellComment::new("", "bottom"))
            .unwrap();

        let err = ws.apply_shift(ShiftOp::insert(Axis::Row, 0, 1)).unwrap_err();
        assert!(matches!(err, Error::ShiftOverflow { .. }));
        assert_eq!(ws.get_value("A1").unwrap().as_number(), Some(1.0));
        assert!(ws.comment_at(MAX_ROWS - 1, 0).is_some());
    }

    #[test]
    fn test_shift_moves_array_formula_extent() {
        let mut ws = Worksheet::new("Test");
        ws.set_cell_value(
            "C1",
            CellValue::array_formula("=A1:A3*B1:B3", CellRange::parse("C1:C3").unwrap()),
        )
        .unwrap();

        ws.apply_shift(ShiftOp::insert(Axis::Row, 0, 1)).unwrap();

        let value = ws.get_value("C2").unwrap();
        assert_eq!(value.formula_text(), Some("=A2:A4*B2:B4"));
        assert_eq!(value.array_extent().unwrap().range.to_string(), "C2:C4");
    }
}
