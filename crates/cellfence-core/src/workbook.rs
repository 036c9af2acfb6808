//! Workbook type - the ordered collection of sheets

use crate::error::{Error, Result};
use crate::worksheet::{SheetState, Worksheet};
use crate::MAX_SHEET_NAME_LEN;

/// Characters a sheet name may not contain
const INVALID_SHEET_NAME_CHARS: &[char] = &[':', '\\', '/', '?', '*', '[', ']'];

/// A workbook (spreadsheet document)
///
/// Sheet order is significant and preserved. A workbook built with
/// [`Workbook::new`] always has at least one sheet, and
/// [`Workbook::remove_worksheet`] refuses to remove the last one or the
/// last visible one.
#[derive(Debug)]
pub struct Workbook {
    /// Worksheets in tab order
    worksheets: Vec<Worksheet>,
    /// Active sheet index
    active_sheet: usize,
    /// Defined names, carried through unchanged
    defined_names: Vec<DefinedName>,
    /// Raw `xl/vbaProject.bin` of a macro-enabled workbook
    vba_project: Option<Vec<u8>>,
    /// Serialized `<dxfs>` block that conditional formats index into
    differential_formats: Option<String>,
}

/// A workbook-level defined name (`<definedName>`)
///
/// The formula is kept as opaque text; only the sheet scope is tracked so
/// it can follow sheet deletions.
#[derive(Debug, Clone, PartialEq)]
pub struct DefinedName {
    /// Name, e.g. `TaxRate` or `_xlnm.Print_Area`
    pub name: String,
    /// Index of the sheet the name is local to, if any
    pub local_sheet_id: Option<usize>,
    /// Hidden from the name manager
    pub hidden: bool,
    /// What the name refers to, e.g. `Sheet1!$B$1`
    pub formula: String,
}

impl Workbook {
    /// Create a new workbook with one worksheet named `Sheet1`
    pub fn new() -> Self {
        let mut wb = Self::empty();
        wb.worksheets.push(Worksheet::new("Sheet1"));
        wb
    }

    /// Create an empty workbook with no worksheets
    ///
    /// Used by readers that add sheets one by one.
    pub fn empty() -> Self {
        Self {
            worksheets: Vec::new(),
            active_sheet: 0,
            defined_names: Vec::new(),
            vba_project: None,
            differential_formats: None,
        }
    }

    /// Get the number of worksheets
    pub fn sheet_count(&self) -> usize {
        self.worksheets.len()
    }

    /// Check if the workbook has no worksheets
    pub fn is_empty(&self) -> bool {
        self.worksheets.is_empty()
    }

    /// Get a worksheet by index
    pub fn worksheet(&self, index: usize) -> Option<&Worksheet> {
        self.worksheets.get(index)
    }

    /// Get a mutable worksheet by index
    pub fn worksheet_mut(&mut self, index: usize) -> Option<&mut Worksheet> {
        self.worksheets.get_mut(index)
    }

    /// Get a worksheet by exact name
    pub fn worksheet_by_name(&self, name: &str) -> Option<&Worksheet> {
        self.worksheets.iter().find(|ws| ws.name() == name)
    }

    /// Get the index of a worksheet by exact name
    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.worksheets.iter().position(|ws| ws.name() == name)
    }

    /// Sheet names in tab order
    pub fn sheet_names(&self) -> Vec<String> {
        self.worksheets.iter().map(|ws| ws.name().to_string()).collect()
    }

    /// Iterate over all worksheets
    pub fn worksheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.worksheets.iter()
    }

    /// Add a new, empty worksheet at the end
    pub fn add_worksheet_with_name(&mut self, name: &str) -> Result<usize> {
        self.add_existing_worksheet(Worksheet::new(name))
    }

    /// Add an existing worksheet at the end
    pub fn add_existing_worksheet(&mut self, worksheet: Worksheet) -> Result<usize> {
        self.check_new_name(worksheet.name(), None)?;
        self.worksheets.push(worksheet);
        Ok(self.worksheets.len() - 1)
    }

    /// Remove a worksheet by index
    ///
    /// Fails with [`Error::LastSheet`] when it is the only sheet and with
    /// [`Error::LastVisibleSheet`] when every other sheet is hidden. Names
    /// local to the removed sheet are dropped; names local to later sheets
    /// follow their sheet's new index. If the active sheet ends up hidden,
    /// the first visible sheet becomes active.
    pub fn remove_worksheet(&mut self, index: usize) -> Result<Worksheet> {
        if index >= self.worksheets.len() {
            return Err(Error::SheetOutOfBounds(index, self.worksheets.len()));
        }
        if self.worksheets.len() == 1 {
            return Err(Error::LastSheet);
        }
        let other_visible = self
            .worksheets
            .iter()
            .enumerate()
            .any(|(i, ws)| i != index && ws.state() == SheetState::Visible);
        if !other_visible {
            return Err(Error::LastVisibleSheet(
                self.worksheets[index].name().to_string(),
            ));
        }

        let worksheet = self.worksheets.remove(index);

        if self.active_sheet > index || self.active_sheet >= self.worksheets.len() {
            self.active_sheet = self.active_sheet.saturating_sub(1);
        }
        if self.worksheets[self.active_sheet].state() != SheetState::Visible {
            if let Some(visible) = self
                .worksheets
                .iter()
                .position(|ws| ws.state() == SheetState::Visible)
            {
                self.active_sheet = visible;
            }
        }

        self.defined_names
            .retain(|name| name.local_sheet_id != Some(index));
        for name in &mut self.defined_names {
            if let Some(id) = name.local_sheet_id.as_mut() {
                if *id > index {
                    *id -= 1;
                }
            }
        }

        Ok(worksheet)
    }

    /// Rename a worksheet
    ///
    /// Only the sheet's own name changes; formulas elsewhere that mention
    /// the old name are not rewritten.
    pub fn rename_worksheet(&mut self, index: usize, new_name: &str) -> Result<()> {
        if index >= self.worksheets.len() {
            return Err(Error::SheetOutOfBounds(index, self.worksheets.len()));
        }
        self.check_new_name(new_name, Some(index))?;
        self.worksheets[index].set_name(new_name);
        Ok(())
    }

    /// Get the active sheet index
    pub fn active_sheet(&self) -> usize {
        self.active_sheet
    }

    /// Set the active sheet index
    pub fn set_active_sheet(&mut self, index: usize) -> Result<()> {
        if index >= self.worksheets.len() {
            return Err(Error::SheetOutOfBounds(index, self.worksheets.len()));
        }
        self.active_sheet = index;
        Ok(())
    }

    /// Defined names in file order
    pub fn defined_names(&self) -> &[DefinedName] {
        &self.defined_names
    }

    /// Add a defined name
    pub fn add_defined_name(&mut self, name: DefinedName) {
        self.defined_names.push(name);
    }

    /// The macro project of a macro-enabled workbook
    pub fn vba_project(&self) -> Option<&[u8]> {
        self.vba_project.as_deref()
    }

    /// Attach or drop the macro project
    pub fn set_vba_project(&mut self, data: Option<Vec<u8>>) {
        self.vba_project = data;
    }

    /// The serialized `<dxfs>` block of the source file, if any
    pub fn differential_formats(&self) -> Option<&str> {
        self.differential_formats.as_deref()
    }

    /// Carry a serialized `<dxfs>` block through to the next save
    pub fn set_differential_formats(&mut self, xml: Option<String>) {
        self.differential_formats = xml;
    }

    /// Check the form of a sheet name, without looking at other sheets
    ///
    /// A name is 1 to 31 characters, contains none of `: \ / ? * [ ]` and
    /// does not start or end with an apostrophe.
    pub fn validate_sheet_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::InvalidSheetName("Sheet name cannot be empty".into()));
        }
        if name.chars().count() > MAX_SHEET_NAME_LEN {
            return Err(Error::InvalidSheetName(format!(
                "Sheet name too long (max {} characters)",
                MAX_SHEET_NAME_LEN
            )));
        }
        if let Some(c) = name.chars().find(|c| INVALID_SHEET_NAME_CHARS.contains(c)) {
            return Err(Error::InvalidSheetName(format!(
                "Sheet name cannot contain '{}'",
                c
            )));
        }
        if name.starts_with('\'') || name.ends_with('\'') {
            return Err(Error::InvalidSheetName(
                "Sheet name cannot start or end with an apostrophe".into(),
            ));
        }
        Ok(())
    }

    /// Validate a name and reject case-insensitive clashes with other sheets
    fn check_new_name(&self, name: &str, exclude_index: Option<usize>) -> Result<()> {
        Self::validate_sheet_name(name)?;

        let name_lower = name.to_lowercase();
        let clash = self
            .worksheets
            .iter()
            .enumerate()
            .any(|(i, ws)| Some(i) != exclude_index && ws.name().to_lowercase() == name_lower);
        if clash {
            return Err(Error::DuplicateSheetName(name.into()));
        }
        Ok(())
    }
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workbook_with(names: &[&str]) -> Workbook {
        let mut wb = Workbook::empty();
        for name in names {
            wb.add_worksheet_with_name(name).unwrap();
        }
        wb
    }

    #[test]
    fn test_new_workbook() {
        let wb = Workbook::new();
        assert_eq!(wb.sheet_count(), 1);
        assert_eq!(wb.sheet_names(), vec!["Sheet1"]);
    }

    #[test]
    fn test_duplicate_name() {
        let mut wb = Workbook::new();
        assert!(matches!(
            wb.add_worksheet_with_name("SHEET1"),
            Err(Error::DuplicateSheetName(_))
        ));
        assert!(wb.add_worksheet_with_name("sheet1").is_err());
    }

    #[test]
    fn test_invalid_sheet_name() {
        let mut wb = Workbook::new();

        for bad in ["", "  ", "Sheet/1", "Sheet:1", "Sheet[1]", "'quoted'", "a?b"] {
            assert!(
                matches!(wb.add_worksheet_with_name(bad), Err(Error::InvalidSheetName(_))),
                "{bad:?} should be rejected"
            );
        }

        let long_name = "A".repeat(MAX_SHEET_NAME_LEN + 1);
        assert!(wb.add_worksheet_with_name(&long_name).is_err());
        let max_name = "é".repeat(MAX_SHEET_NAME_LEN);
        assert!(wb.add_worksheet_with_name(&max_name).is_ok());
    }

    #[test]
    fn test_rename() {
        let mut wb = workbook_with(&["Sheet1", "Sheet2"]);

        wb.rename_worksheet(0, "Data").unwrap();
        assert_eq!(wb.sheet_names(), vec!["Data", "Sheet2"]);

        assert!(matches!(
            wb.rename_worksheet(1, "data"),
            Err(Error::DuplicateSheetName(_))
        ));

        // Changing only the case of its own name is allowed
        wb.rename_worksheet(0, "DATA").unwrap();
        assert_eq!(wb.sheet_index("DATA"), Some(0));
        assert_eq!(wb.sheet_index("Data"), None);
    }

    #[test]
    fn test_remove_keeps_order_and_last_sheet() {
        let mut wb = workbook_with(&["A", "B", "C"]);
        wb.set_active_sheet(2).unwrap();

        wb.remove_worksheet(1).unwrap();
        assert_eq!(wb.sheet_names(), vec!["A", "C"]);
        assert_eq!(wb.active_sheet(), 1);

        wb.remove_worksheet(0).unwrap();
        assert_eq!(wb.active_sheet(), 0);
        assert!(matches!(wb.remove_worksheet(0), Err(Error::LastSheet)));
        assert_eq!(wb.sheet_names(), vec!["C"]);
    }

    #[test]
    fn test_remove_reindexes_local_names() {
        let mut wb = workbook_with(&["A", "B", "C"]);
        for (name, local) in [("Global", None), ("OnB", Some(1)), ("OnC", Some(2))] {
            wb.add_defined_name(DefinedName {
                name: name.into(),
                local_sheet_id: local,
                hidden: false,
                formula: "$A$1".into(),
            });
        }

        wb.remove_worksheet(1).unwrap();

        let names: Vec<_> = wb
            .defined_names()
            .iter()
            .map(|n| (n.name.as_str(), n.local_sheet_id))
            .collect();
        assert_eq!(names, vec![("Global", None), ("OnC", Some(1))]);
    }

    #[test]
    fn test_remove_refuses_last_visible_sheet() {
        let mut wb = workbook_with(&["Front", "Lookup", "Secret"]);
        wb.worksheet_mut(1).unwrap().set_state(SheetState::Hidden);
        wb.worksheet_mut(2).unwrap().set_state(SheetState::VeryHidden);

        assert!(matches!(
            wb.remove_worksheet(0),
            Err(Error::LastVisibleSheet(name)) if name == "Front"
        ));
        assert_eq!(wb.sheet_count(), 3);

        // A hidden sheet can still go
        wb.remove_worksheet(2).unwrap();
        assert_eq!(wb.sheet_names(), vec!["Front", "Lookup"]);
    }

    #[test]
    fn test_remove_moves_active_off_hidden_sheet() {
        let mut wb = workbook_with(&["Shown", "Hidden", "Active"]);
        wb.worksheet_mut(1).unwrap().set_state(SheetState::Hidden);
        wb.set_active_sheet(2).unwrap();

        wb.remove_worksheet(2).unwrap();
        assert_eq!(wb.active_sheet(), 0);
        assert_eq!(wb.worksheet(wb.active_sheet()).unwrap().name(), "Shown");
    }
}
