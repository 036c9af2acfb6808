//! XLSX reader

mod annotations;
mod sheet;

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use crate::escape::decode_excel_escapes;
use crate::styles::{attr_value, parse_bool, read_differential_formats, read_styles_xml};
use cellfence_core::style::Style;
use cellfence_core::{DefinedName, SheetState, Workbook, Worksheet};

pub(crate) const VBA_PROJECT_PART: &str = "xl/vbaProject.bin";

/// A `<sheet>` entry of `xl/workbook.xml`
#[derive(Debug)]
struct SheetEntry {
    name: String,
    r_id: String,
    state: SheetState,
}

/// What `xl/workbook.xml` contributes besides the cells
#[derive(Debug, Default)]
struct WorkbookPart {
    sheets: Vec<SheetEntry>,
    active_tab: usize,
    defined_names: Vec<DefinedName>,
}

/// XLSX/XLSM file reader
pub struct XlsxReader;

impl XlsxReader {
    /// Read a workbook from a file path
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsxResult<Workbook> {
        let file = File::open(path)?;
        Self::read(file)
    }

    /// Read a workbook from a reader
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<Workbook> {
        let mut archive = zip::ZipArchive::new(reader)?;

        if archive.by_name("[Content_Types].xml").is_err() {
            return Err(XlsxError::InvalidFormat(
                "Missing [Content_Types].xml".into(),
            ));
        }

        let shared_strings = Self::read_shared_strings(&mut archive)?;
        let (cell_styles, differential_formats) = Self::read_styles(&mut archive)?;
        let workbook_part = Self::read_workbook_xml(&mut archive)?;
        let sheet_paths = Self::read_workbook_rels(&mut archive)?;

        let mut workbook = Workbook::empty();
        workbook.set_differential_formats(differential_formats);
        // Position in workbook.xml -> index in the model, for sheets that were kept
        let mut kept: Vec<Option<usize>> = Vec::with_capacity(workbook_part.sheets.len());

        for entry in &workbook_part.sheets {
            let Some(path) = sheet_paths.get(&entry.r_id) else {
                // Chartsheets and dialog sheets have no cell grid
                log::warn!("skipping sheet '{}': not a worksheet part", entry.name);
                kept.push(None);
                continue;
            };

            let mut worksheet = Worksheet::new(entry.name.as_str());
            worksheet.set_state(entry.state);
            sheet::read_worksheet(
                &mut archive,
                path,
                &mut worksheet,
                &shared_strings,
                &cell_styles,
            )?;
            kept.push(Some(workbook.add_existing_worksheet(worksheet)?));
        }

        if workbook.is_empty() {
            workbook.add_worksheet_with_name("Sheet1")?;
        }

        let active = kept
            .get(workbook_part.active_tab)
            .copied()
            .flatten()
            .unwrap_or(0);
        workbook.set_active_sheet(active)?;

        for mut name in workbook_part.defined_names {
            match name.local_sheet_id {
                None => workbook.add_defined_name(name),
                Some(position) => match kept.get(position).copied().flatten() {
                    Some(index) => {
                        name.local_sheet_id = Some(index);
                        workbook.add_defined_name(name);
                    }
                    None => log::warn!(
                        "dropping defined name '{}' scoped to a missing sheet",
                        name.name
                    ),
                },
            }
        }

        workbook.set_vba_project(Self::read_vba_project(&mut archive)?);

        log::debug!(
            "read workbook: {} sheet(s), {} shared string(s), {} cell style(s)",
            workbook.sheet_count(),
            shared_strings.len(),
            cell_styles.len()
        );
        Ok(workbook)
    }

    /// Read the shared strings table
    ///
    /// Rich-text runs are flattened to their text; phonetic runs (`<rPh>`)
    /// are not part of the displayed string and are skipped.
    fn read_shared_strings<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<String>> {
        let mut strings = Vec::new();

        let file = match archive.by_name("xl/sharedStrings.xml") {
            Ok(f) => f,
            Err(_) => return Ok(strings),
        };

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        // Leading and trailing spaces in <t> are significant
        xml_reader.trim_text(false);

        let mut buf = Vec::new();
        let mut current = String::new();
        let mut in_si = false;
        let mut in_t = false;
        let mut in_phonetic = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.local_name().as_ref() {
                    b"si" => {
                        in_si = true;
                        current.clear();
                    }
                    b"rPh" => in_phonetic = true,
                    b"t" if in_si && !in_phonetic => in_t = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) if e.local_name().as_ref() == b"si" => {
                    strings.push(String::new());
                }
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"si" => {
                        strings.push(decode_excel_escapes(&current));
                        in_si = false;
                    }
                    b"rPh" => in_phonetic = false,
                    b"t" => in_t = false,
                    _ => {}
                },
                Ok(Event::Text(e)) if in_t => {
                    current.push_str(&e.unescape()?);
                }
                Ok(Event::CData(e)) if in_t => {
                    current.push_str(&String::from_utf8_lossy(&e));
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(strings)
    }

    /// Cell styles by `cellXfs` index, plus the raw differential formats
    fn read_styles<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<(Vec<Style>, Option<String>)> {
        let mut file = match archive.by_name("xl/styles.xml") {
            Ok(file) => file,
            Err(_) => return Ok((vec![Style::default()], None)),
        };
        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data)?;
        Ok((
            read_styles_xml(data.as_slice())?,
            read_differential_formats(&data)?,
        ))
    }

    /// Read sheet entries, the active tab and defined names from workbook.xml
    fn read_workbook_xml<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<WorkbookPart> {
        let file = archive
            .by_name("xl/workbook.xml")
            .map_err(|_| XlsxError::MissingPart("xl/workbook.xml".into()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut part = WorkbookPart::default();
        let mut pending_name: Option<DefinedName> = None;

        loop {
            let event = xml_reader.read_event_into(&mut buf)?;
            let is_empty = matches!(event, Event::Empty(_));
            match event {
                Event::Empty(e) | Event::Start(e) => match e.local_name().as_ref() {
                    b"sheet" => {
                        let name = attr_value(&e, b"name");
                        // `r:id`; the prefix varies between producers
                        let r_id = e
                            .attributes()
                            .flatten()
                            .find(|a| {
                                a.key.prefix().is_some() && a.key.local_name().as_ref() == b"id"
                            })
                            .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()));
                        let state = attr_value(&e, b"state")
                            .map(|s| SheetState::from_attr(&s))
                            .unwrap_or_default();

                        if let (Some(name), Some(r_id)) = (name, r_id) {
                            part.sheets.push(SheetEntry { name, r_id, state });
                        }
                    }
                    b"workbookView" => {
                        if let Some(tab) = attr_value(&e, b"activeTab").and_then(|s| s.parse().ok())
                        {
                            part.active_tab = tab;
                        }
                    }
                    b"definedName" => {
                        if let Some(name) = attr_value(&e, b"name") {
                            let defined = DefinedName {
                                name,
                                local_sheet_id: attr_value(&e, b"localSheetId")
                                    .and_then(|s| s.parse().ok()),
                                hidden: attr_value(&e, b"hidden").is_some_and(|s| parse_bool(&s)),
                                formula: String::new(),
                            };
                            if is_empty {
                                part.defined_names.push(defined);
                            } else {
                                pending_name = Some(defined);
                            }
                        }
                    }
                    _ => {}
                },
                Event::Text(e) => {
                    if let Some(name) = pending_name.as_mut() {
                        name.formula.push_str(&e.unescape()?);
                    }
                }
                Event::End(e) if e.local_name().as_ref() == b"definedName" => {
                    if let Some(name) = pending_name.take() {
                        part.defined_names.push(name);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(part)
    }

    /// Read workbook.xml.rels to get worksheet part paths by relationship id
    fn read_workbook_rels<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<HashMap<String, String>> {
        let file = archive
            .by_name("xl/_rels/workbook.xml.rels")
            .map_err(|_| XlsxError::MissingPart("xl/_rels/workbook.xml.rels".into()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut rels = HashMap::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e))
                    if e.local_name().as_ref() == b"Relationship" =>
                {
                    let id = attr_value(&e, b"Id");
                    let target = attr_value(&e, b"Target");
                    let rel_type = attr_value(&e, b"Type");

                    if let (Some(id), Some(target), Some(rel_type)) = (id, target, rel_type) {
                        if rel_type.ends_with("/worksheet") {
                            rels.insert(id, resolve_target("xl", &target));
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(rels)
    }

    /// The raw macro project, if the container has one
    fn read_vba_project<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Option<Vec<u8>>> {
        let mut file = match archive.by_name(VBA_PROJECT_PART) {
            Ok(f) => f,
            Err(_) => return Ok(None),
        };
        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data)?;
        Ok(Some(data))
    }
}

/// Resolve a relationship target against the folder of the part that owns
/// the relationship, giving a part name inside the archive
fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut parts: Vec<&str> = base_dir.split('/').filter(|p| !p.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}
