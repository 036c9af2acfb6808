//! Worksheet content around the cell grid
//!
//! Conditional formats, data validations, hyperlinks and comments are read
//! into the model; any other top-level worksheet element is kept as written
//! unless it points at a part the writer does not produce.

use std::collections::{HashMap, HashSet};
use std::io::{Read, Seek};

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::reader::Reader;

use super::resolve_target;
use crate::error::{XlsxError, XlsxResult};
use crate::escape::decode_excel_escapes;
use crate::styles::{attr_value, parse_bool};
use cellfence_core::{
    CellAddress, CellComment, CellRange, ConditionalFormat, ConditionalFormatRule,
    DataValidation, Hyperlink, PreservedMarkup, ValidationErrorStyle, ValidationOperator,
    ValidationType, Worksheet,
};

pub(crate) const RELATIONSHIPS_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// One `<Relationship>` of a worksheet part
#[derive(Debug)]
pub(super) struct SheetRelationship {
    pub(super) rel_type: String,
    /// Part name inside the archive, or the address of an external target
    pub(super) target: String,
}

impl SheetRelationship {
    fn is(&self, kind: &str) -> bool {
        self.rel_type.rsplit('/').next() == Some(kind)
    }
}

/// Read a whole part, `None` when the archive has no such entry
pub(super) fn read_part<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    name: &str,
) -> XlsxResult<Option<Vec<u8>>> {
    let mut file = match archive.by_name(name) {
        Ok(f) => f,
        Err(_) => return Ok(None),
    };
    let mut data = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut data)?;
    Ok(Some(data))
}

/// Relationships of the worksheet part at `sheet_path`, by id
pub(super) fn read_sheet_relationships<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    sheet_path: &str,
) -> XlsxResult<HashMap<String, SheetRelationship>> {
    let (dir, file) = sheet_path.rsplit_once('/').unwrap_or(("", sheet_path));
    let rels_path = if dir.is_empty() {
        format!("_rels/{}.rels", file)
    } else {
        format!("{}/_rels/{}.rels", dir, file)
    };
    let Some(data) = read_part(archive, &rels_path)? else {
        return Ok(HashMap::new());
    };

    let mut xml_reader = Reader::from_reader(data.as_slice());
    xml_reader.trim_text(true);
    let mut buf = Vec::new();
    let mut rels = HashMap::new();

    loop {
        match xml_reader.read_event_into(&mut buf)? {
            Event::Empty(e) | Event::Start(e) if e.local_name().as_ref() == b"Relationship" => {
                let id = attr_value(&e, b"Id");
                let rel_type = attr_value(&e, b"Type");
                let target = attr_value(&e, b"Target");
                if let (Some(id), Some(rel_type), Some(target)) = (id, rel_type, target) {
                    let external = attr_value(&e, b"TargetMode").as_deref() == Some("External");
                    let target = if external {
                        target
                    } else {
                        resolve_target(dir, &target)
                    };
                    rels.insert(id, SheetRelationship { rel_type, target });
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(rels)
}

/// Space-separated ranges; unreadable entries are skipped
pub(super) fn parse_sqref(sqref: &str) -> Vec<CellRange> {
    sqref
        .split_whitespace()
        .filter_map(|part| match CellRange::parse(part) {
            Ok(range) => Some(range),
            Err(err) => {
                log::warn!("ignoring range '{}' in sqref: {}", part, err);
                None
            }
        })
        .collect()
}

/// Offset just past the element that opened with `start`
fn element_end(
    xml_reader: &mut Reader<&[u8]>,
    start: &BytesStart<'_>,
    is_empty: bool,
) -> XlsxResult<usize> {
    if !is_empty {
        let name = start.name().as_ref().to_vec();
        let mut skip = Vec::new();
        xml_reader.read_to_end_into(QName(&name), &mut skip)?;
    }
    Ok(xml_reader.buffer_position())
}

/// Skip the element that opened with `start`
pub(super) fn skip_element(
    xml_reader: &mut Reader<&[u8]>,
    start: &BytesStart<'_>,
    is_empty: bool,
) -> XlsxResult<()> {
    element_end(xml_reader, start, is_empty).map(|_| ())
}

/// Read one `<conditionalFormatting>` block
///
/// `data` is the document `xml_reader` reads from; children of a rule other
/// than `<formula>` are copied out of it verbatim.
pub(super) fn read_conditional_formatting(
    xml_reader: &mut Reader<&[u8]>,
    data: &[u8],
    start: &BytesStart<'_>,
    is_empty: bool,
) -> XlsxResult<ConditionalFormat> {
    let mut block = ConditionalFormat::new(parse_sqref(
        attr_value(start, b"sqref").as_deref().unwrap_or_default(),
    ));
    block.pivot = attr_value(start, b"pivot").is_some_and(|v| parse_bool(&v));
    if is_empty {
        return Ok(block);
    }

    let mut buf = Vec::new();
    let mut rule: Option<ConditionalFormatRule> = None;
    let mut in_formula = false;

    loop {
        let before = xml_reader.buffer_position();
        let event = xml_reader.read_event_into(&mut buf)?;
        let is_empty = matches!(event, Event::Empty(_));
        match event {
            Event::Start(e) | Event::Empty(e) => {
                let name = e.local_name().as_ref().to_vec();
                if name == b"cfRule" {
                    let parsed = read_cf_rule_attrs(&e);
                    if is_empty {
                        block.rules.push(parsed);
                    } else {
                        rule = Some(parsed);
                    }
                } else if let Some(current) = rule.as_mut() {
                    if name == b"formula" {
                        current.formulas.push(String::new());
                        in_formula = !is_empty;
                    } else {
                        let end = element_end(xml_reader, &e, is_empty)?;
                        current
                            .extra_xml
                            .push_str(&String::from_utf8_lossy(&data[before..end]));
                    }
                } else {
                    // `extLst` directly under the block
                    skip_element(xml_reader, &e, is_empty)?;
                }
            }
            Event::Text(t) if in_formula => {
                if let Some(formula) = rule.as_mut().and_then(|r| r.formulas.last_mut()) {
                    formula.push_str(&t.unescape()?);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"formula" => in_formula = false,
                b"cfRule" => {
                    if let Some(done) = rule.take() {
                        block.rules.push(done);
                    }
                }
                b"conditionalFormatting" => break,
                _ => {}
            },
            Event::Eof => {
                return Err(XlsxError::Parse(
                    "unterminated <conditionalFormatting>".into(),
                ))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(block)
}

fn read_cf_rule_attrs(e: &BytesStart<'_>) -> ConditionalFormatRule {
    let mut rule = ConditionalFormatRule::default();
    for attr in e.attributes().flatten() {
        let Ok(value) = attr.unescape_value() else {
            continue;
        };
        match attr.key.as_ref() {
            b"type" => rule.rule_type = value.into_owned(),
            b"priority" => rule.priority = value.parse().unwrap_or(0),
            b"dxfId" => rule.dxf_id = value.parse().ok(),
            b"stopIfTrue" => rule.stop_if_true = parse_bool(&value),
            key => rule.attributes.push((
                String::from_utf8_lossy(key).into_owned(),
                value.into_owned(),
            )),
        }
    }
    rule
}

/// Read the rules of a `<dataValidations>` element
pub(super) fn read_data_validations(
    xml_reader: &mut Reader<&[u8]>,
    is_empty: bool,
) -> XlsxResult<Vec<DataValidation>> {
    let mut rules = Vec::new();
    if is_empty {
        return Ok(rules);
    }

    let mut buf = Vec::new();
    let mut rule: Option<DataValidation> = None;
    // 1 or 2 while inside <formula1>/<formula2>
    let mut formula_slot = 0u8;

    loop {
        let event = xml_reader.read_event_into(&mut buf)?;
        let is_empty = matches!(event, Event::Empty(_));
        match event {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"dataValidation" => {
                    let parsed = read_validation_attrs(&e);
                    if is_empty {
                        rules.push(parsed);
                    } else {
                        rule = Some(parsed);
                    }
                }
                b"formula1" if !is_empty => formula_slot = 1,
                b"formula2" if !is_empty => formula_slot = 2,
                _ => {}
            },
            Event::Text(t) if formula_slot > 0 => {
                if let Some(current) = rule.as_mut() {
                    let slot = if formula_slot == 1 {
                        &mut current.formula1
                    } else {
                        &mut current.formula2
                    };
                    slot.get_or_insert_with(String::new).push_str(&t.unescape()?);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"formula1" | b"formula2" => formula_slot = 0,
                b"dataValidation" => {
                    if let Some(done) = rule.take() {
                        rules.push(done);
                    }
                }
                b"dataValidations" => break,
                _ => {}
            },
            Event::Eof => return Err(XlsxError::Parse("unterminated <dataValidations>".into())),
            _ => {}
        }
        buf.clear();
    }

    Ok(rules)
}

fn read_validation_attrs(e: &BytesStart<'_>) -> DataValidation {
    let text = |key: &[u8]| attr_value(e, key);
    let flag = |key: &[u8]| text(key).is_some_and(|v| parse_bool(&v));

    DataValidation {
        validation_type: text(b"type")
            .and_then(|v| ValidationType::from_attr(&v))
            .unwrap_or_default(),
        operator: text(b"operator")
            .and_then(|v| ValidationOperator::from_attr(&v))
            .unwrap_or_default(),
        ranges: parse_sqref(text(b"sqref").as_deref().unwrap_or_default()),
        formula1: None,
        formula2: None,
        allow_blank: flag(b"allowBlank"),
        hide_dropdown: flag(b"showDropDown"),
        show_input_message: flag(b"showInputMessage"),
        prompt_title: text(b"promptTitle"),
        prompt: text(b"prompt"),
        show_error_message: flag(b"showErrorMessage"),
        error_style: text(b"errorStyle")
            .and_then(|v| ValidationErrorStyle::from_attr(&v))
            .unwrap_or_default(),
        error_title: text(b"errorTitle"),
        error: text(b"error"),
        ime_mode: text(b"imeMode"),
    }
}

/// Build a hyperlink from a `<hyperlink>` element
///
/// The `r:id` of an external link is looked up in the sheet's relationships.
pub(super) fn read_hyperlink(
    e: &BytesStart<'_>,
    rels: &HashMap<String, SheetRelationship>,
) -> Option<Hyperlink> {
    let reference = attr_value(e, b"ref")?;
    let range = match CellRange::parse(&reference) {
        Ok(range) => range,
        Err(err) => {
            log::warn!("ignoring hyperlink on '{}': {}", reference, err);
            return None;
        }
    };
    let r_id = e
        .attributes()
        .flatten()
        .find(|a| a.key.prefix().is_some() && a.key.local_name().as_ref() == b"id")
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()));
    let target = r_id.and_then(|id| match rels.get(&id) {
        Some(rel) if rel.is("hyperlink") => Some(rel.target.clone()),
        _ => {
            log::warn!("hyperlink on {} names unknown relationship '{}'", reference, id);
            None
        }
    });
    let location = attr_value(e, b"location");
    if target.is_none() && location.is_none() {
        return None;
    }

    Some(Hyperlink {
        range,
        target,
        location,
        display: attr_value(e, b"display"),
        tooltip: attr_value(e, b"tooltip"),
    })
}

/// Attach the comments of the sheet's comments part, if it has one
pub(super) fn read_comments<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    rels: &HashMap<String, SheetRelationship>,
    worksheet: &mut Worksheet,
) -> XlsxResult<()> {
    let Some(path) = rels.values().find(|r| r.is("comments")).map(|r| &r.target) else {
        return Ok(());
    };
    let Some(data) = read_part(archive, path)? else {
        log::warn!("comments part {} is missing", path);
        return Ok(());
    };

    let shown = match rels.values().find(|r| r.is("vmlDrawing")) {
        Some(rel) => match read_part(archive, &rel.target)? {
            Some(vml) => visible_notes(&String::from_utf8_lossy(&vml)),
            None => HashSet::new(),
        },
        None => HashSet::new(),
    };

    let mut xml_reader = Reader::from_reader(data.as_slice());
    xml_reader.trim_text(false);
    let mut buf = Vec::new();

    let mut authors: Vec<String> = Vec::new();
    let mut author = String::new();
    let mut in_author = false;
    let mut current: Option<(CellAddress, usize)> = None;
    let mut text = String::new();
    let mut in_t = false;
    let mut in_phonetic = false;

    loop {
        let event = xml_reader.read_event_into(&mut buf)?;
        let is_empty = matches!(event, Event::Empty(_));
        match event {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"author" => {
                    if is_empty {
                        authors.push(String::new());
                    } else {
                        in_author = true;
                        author.clear();
                    }
                }
                b"comment" => {
                    let cell = attr_value(&e, b"ref").and_then(|r| CellAddress::parse(&r).ok());
                    let author_id = attr_value(&e, b"authorId")
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(0);
                    current = cell.map(|addr| (addr, author_id));
                    text.clear();
                }
                b"rPh" => in_phonetic = !is_empty,
                b"t" if current.is_some() && !in_phonetic => in_t = !is_empty,
                _ => {}
            },
            Event::Text(t) => {
                if in_author {
                    author.push_str(&t.unescape()?);
                } else if in_t {
                    text.push_str(&t.unescape()?);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"author" => {
                    in_author = false;
                    authors.push(std::mem::take(&mut author));
                }
                b"t" => in_t = false,
                b"rPh" => in_phonetic = false,
                b"comment" => {
                    if let Some((addr, author_id)) = current.take() {
                        let author = authors.get(author_id).cloned().unwrap_or_default();
                        let comment = CellComment::new(author, decode_excel_escapes(&text))
                            .with_visible(shown.contains(&(addr.row, addr.col)));
                        worksheet.set_comment_at(addr.row, addr.col, comment)?;
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(())
}

/// Cells whose note shape is marked always visible in a legacy drawing
///
/// VML written by spreadsheet applications is often not well-formed XML, so
/// the `<x:ClientData>` blocks are located by text search.
fn visible_notes(vml: &str) -> HashSet<(u32, u16)> {
    let mut shown = HashSet::new();
    let mut rest = vml;
    while let Some(open) = rest.find("<x:ClientData") {
        let block_start = &rest[open..];
        let Some(close) = block_start.find("</x:ClientData>") else {
            break;
        };
        let block = &block_start[..close];
        rest = &block_start[close..];

        if !block.contains("ObjectType=\"Note\"") || !block.contains("<x:Visible") {
            continue;
        }
        let row = tag_text(block, "x:Row").and_then(|s| s.trim().parse::<u32>().ok());
        let col = tag_text(block, "x:Column").and_then(|s| s.trim().parse::<u16>().ok());
        if let (Some(row), Some(col)) = (row, col) {
            shown.insert((row, col));
        }
    }
    shown
}

fn tag_text<'a>(xml: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = xml.find(&open)? + open.len();
    let len = xml[start..].find(&close)?;
    Some(&xml[start..start + len])
}

/// Namespace declarations of the root element worth carrying, plus the
/// prefix bound to the relationships namespace
pub(super) fn read_root_attributes(e: &BytesStart<'_>) -> (Vec<(String, String)>, Vec<u8>) {
    let mut kept = Vec::new();
    let mut rel_prefix = b"r".to_vec();
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let Ok(value) = attr.unescape_value() else {
            continue;
        };
        if let Some(prefix) = key.strip_prefix("xmlns:") {
            if value == RELATIONSHIPS_NS {
                rel_prefix = prefix.as_bytes().to_vec();
            }
            if prefix != "r" {
                kept.push((key.clone(), value.into_owned()));
            }
        } else if attr.key.local_name().as_ref() == b"Ignorable" {
            kept.push((key, value.into_owned()));
        }
    }
    (kept, rel_prefix)
}

fn has_relationship_attr(e: &BytesStart<'_>, rel_prefix: &[u8]) -> bool {
    e.attributes()
        .flatten()
        .any(|a| a.key.prefix().is_some_and(|p| p.as_ref() == rel_prefix))
}

/// Copy one top-level element into `preserved` as written
///
/// An element that points at another part through a relationship is
/// dropped with a warning, since the writer does not produce that part.
/// `<pageSetup>` only loses its printer-settings link, and sheet views lose
/// their tab selection so the active tab alone decides it.
pub(super) fn preserve_element(
    xml_reader: &mut Reader<&[u8]>,
    data: &[u8],
    before: usize,
    start: &BytesStart<'_>,
    is_empty: bool,
    rel_prefix: &[u8],
    preserved: &mut PreservedMarkup,
) -> XlsxResult<()> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut uses_relationship = has_relationship_attr(start, rel_prefix);

    if !is_empty {
        let mut depth = 1usize;
        let mut buf = Vec::new();
        loop {
            match xml_reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    depth += 1;
                    uses_relationship |= has_relationship_attr(&e, rel_prefix);
                }
                Event::Empty(e) => uses_relationship |= has_relationship_attr(&e, rel_prefix),
                Event::End(_) => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                Event::Eof => return Err(XlsxError::Parse(format!("unterminated <{}>", name))),
                _ => {}
            }
            buf.clear();
        }
    }
    let raw = String::from_utf8_lossy(&data[before..xml_reader.buffer_position()]);

    let xml = match name.as_str() {
        "pageSetup" if uses_relationship && is_empty => without_relationship_attrs(start, rel_prefix),
        _ if uses_relationship => {
            log::warn!(
                "dropping <{}>: it refers to a part that is not carried over",
                name
            );
            return Ok(());
        }
        "sheetViews" => raw
            .replace(" tabSelected=\"1\"", "")
            .replace(" tabSelected=\"true\"", ""),
        _ => raw.into_owned(),
    };
    preserved.elements.push((name, xml));
    Ok(())
}

/// Re-serialize an empty element without its relationship attributes
fn without_relationship_attrs(e: &BytesStart<'_>, rel_prefix: &[u8]) -> String {
    let mut xml = format!("<{}", String::from_utf8_lossy(e.name().as_ref()));
    for attr in e.attributes().flatten() {
        if attr.key.prefix().is_some_and(|p| p.as_ref() == rel_prefix) {
            continue;
        }
        xml.push_str(&format!(
            " {}=\"{}\"",
            String::from_utf8_lossy(attr.key.as_ref()),
            String::from_utf8_lossy(&attr.value)
        ));
    }
    xml.push_str("/>");
    xml
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_notes_from_vml() {
        let vml = r#"<xml xmlns:v="urn:schemas-microsoft-com:vml">
 <v:shape id="_x0000_s1025"><x:ClientData ObjectType="Note"><x:MoveWithCells/>
  <x:Row>1</x:Row><x:Column>2</x:Column><x:Visible/></x:ClientData></v:shape>
 <v:shape id="_x0000_s1026"><x:ClientData ObjectType="Note">
  <x:Row>4</x:Row><x:Column>0</x:Column></x:ClientData></v:shape>
 <br></xml>"#;
        let shown = visible_notes(vml);
        assert!(shown.contains(&(1, 2)));
        assert!(!shown.contains(&(4, 0)));
        assert_eq!(shown.len(), 1);
    }

    #[test]
    fn test_page_setup_loses_printer_link() {
        let xml = r#"<pageSetup paperSize="9" orientation="landscape" r:id="rId3"/>"#;
        let mut reader = Reader::from_reader(xml.as_bytes());
        let mut buf = Vec::new();
        let Event::Empty(e) = reader.read_event_into(&mut buf).unwrap() else {
            panic!("expected an empty element");
        };
        assert_eq!(
            without_relationship_attrs(&e, b"r"),
            r#"<pageSetup paperSize="9" orientation="landscape"/>"#
        );
    }

    #[test]
    fn test_sqref_skips_bad_parts() {
        let ranges = parse_sqref("A1:B2  D4 ZZZZ9 F:F");
        let text: Vec<String> = ranges.iter().map(|r| r.to_string()).collect();
        assert_eq!(text, vec!["A1:B2", "D4", "F:F"]);
    }
}
