//! Worksheet part parsing

use std::collections::HashMap;
use std::io::{Read, Seek};

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use super::annotations::{
    preserve_element, read_comments, read_conditional_formatting, read_data_validations,
    read_hyperlink, read_part, read_root_attributes, read_sheet_relationships, skip_element,
};
use crate::error::{XlsxError, XlsxResult};
use crate::escape::decode_excel_escapes;
use crate::styles::{attr_value, parse_bool};
use cellfence_core::cell::serial_to_datetime;
use cellfence_core::reference::translate_formula;
use cellfence_core::style::Style;
use cellfence_core::{
    ArrayFormula, CellAddress, CellError, CellRange, CellValue, PreservedMarkup, Worksheet,
    MAX_COLS, MAX_ROWS,
};

/// Top-level worksheet children read by the main loop; any other child is
/// handed to the annotation readers or preserved as written
const GRID_ELEMENTS: &[&[u8]] = &[
    b"dimension",
    b"sheetFormatPr",
    b"cols",
    b"sheetData",
    b"mergeCells",
    b"hyperlinks",
];

/// Anchor of a shared formula group (`<f t="shared" ref=".." si="..">`)
struct SharedFormula {
    row: u32,
    col: u16,
    text: String,
}

/// A `<c>` element being assembled
#[derive(Default)]
struct PendingCell {
    row: u32,
    col: u16,
    cell_type: Option<String>,
    style: u32,
    value: Option<String>,
    formula: Option<String>,
    /// `si` of a shared formula
    shared_index: Option<String>,
    /// `ref` of an array formula
    array_ref: Option<String>,
    /// `aca` of an array formula
    always_calculate: bool,
}

/// What the reader is currently collecting text for
#[derive(Clone, Copy, PartialEq, Eq)]
enum TextTarget {
    None,
    Value,
    Formula,
    Inline,
}

pub(super) fn read_worksheet<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    path: &str,
    worksheet: &mut Worksheet,
    shared_strings: &[String],
    cell_styles: &[Style],
) -> XlsxResult<()> {
    let data = read_part(archive, path)?.ok_or_else(|| XlsxError::MissingPart(path.to_string()))?;
    let rels = read_sheet_relationships(archive, path)?;

    let mut xml_reader = Reader::from_reader(data.as_slice());
    // Inline strings may carry significant leading/trailing spaces, and
    // preserved elements are sliced out of `data` by offset
    xml_reader.trim_text(false);

    let mut buf = Vec::new();
    let mut shared_formulas: HashMap<String, SharedFormula> = HashMap::new();

    let mut cell: Option<PendingCell> = None;
    let mut target = TextTarget::None;
    let mut in_inline_str = false;
    let mut in_phonetic = false;
    // Rows and cells may omit `r`; they then follow the previous one
    let mut current_row: u32 = 0;
    let mut next_row: u32 = 0;
    let mut next_col: u16 = 0;
    // Open elements, the root included
    let mut depth = 0usize;
    let mut rel_prefix = b"r".to_vec();
    let mut preserved = PreservedMarkup::default();

    loop {
        let before = xml_reader.buffer_position();
        let event = match xml_reader.read_event_into(&mut buf) {
            Ok(event) => event,
            Err(e) => return Err(XlsxError::Xml(e)),
        };
        let is_empty = matches!(event, Event::Empty(_));

        match event {
            Event::Start(e) | Event::Empty(e) if depth == 0 => {
                let (root_attributes, prefix) = read_root_attributes(&e);
                preserved.root_attributes = root_attributes;
                rel_prefix = prefix;
                if !is_empty {
                    depth = 1;
                }
            }

            Event::Start(e) | Event::Empty(e)
                if depth == 1 && !GRID_ELEMENTS.contains(&e.local_name().as_ref()) =>
            {
                match e.local_name().as_ref() {
                    b"conditionalFormatting" => {
                        let block =
                            read_conditional_formatting(&mut xml_reader, &data, &e, is_empty)?;
                        if !block.ranges.is_empty() {
                            worksheet.add_conditional_format(block);
                        }
                    }
                    b"dataValidations" => {
                        for rule in read_data_validations(&mut xml_reader, is_empty)? {
                            if !rule.ranges.is_empty() {
                                worksheet.add_data_validation(rule);
                            }
                        }
                    }
                    // Rebuilt from the comments on save
                    b"legacyDrawing" => skip_element(&mut xml_reader, &e, is_empty)?,
                    _ => preserve_element(
                        &mut xml_reader,
                        &data,
                        before,
                        &e,
                        is_empty,
                        &rel_prefix,
                        &mut preserved,
                    )?,
                }
            }

            Event::Start(e) | Event::Empty(e) => {
                if !is_empty {
                    depth += 1;
                }
                match e.local_name().as_ref() {
                    b"sheetFormatPr" => {
                        if let Some(h) = attr_value(&e, b"defaultRowHeight").and_then(|s| s.parse().ok())
                        {
                            worksheet.set_default_row_height(h);
                        }
                        if let Some(w) = attr_value(&e, b"defaultColWidth").and_then(|s| s.parse().ok())
                        {
                            worksheet.set_default_column_width(w);
                        }
                    }
                    b"col" => read_column(&e, worksheet),
                    b"row" => {
                        current_row = match attr_value(&e, b"r") {
                            Some(r) => parse_row_number(&r)?,
                            None => next_row,
                        };
                        next_row = current_row + 1;
                        next_col = 0;
                        read_row_attrs(&e, current_row, worksheet);
                    }
                    b"c" => {
                        let (row, col) = match attr_value(&e, b"r") {
                            Some(r) => {
                                let addr = CellAddress::parse(&r).map_err(|err| {
                                    XlsxError::Parse(format!("Invalid cell reference '{}': {}", r, err))
                                })?;
                                (addr.row, addr.col)
                            }
                            None => (current_row, next_col),
                        };
                        next_col = col.saturating_add(1);

                        let pending = PendingCell {
                            row,
                            col,
                            cell_type: attr_value(&e, b"t"),
                            style: attr_value(&e, b"s")
                                .and_then(|s| s.parse().ok())
                                .unwrap_or(0),
                            ..Default::default()
                        };
                        if is_empty {
                            store_cell(
                                worksheet,
                                pending,
                                shared_strings,
                                cell_styles,
                                &mut shared_formulas,
                            )?;
                        } else {
                            cell = Some(pending);
                        }
                    }
                    b"v" if cell.is_some() && !is_empty => target = TextTarget::Value,
                    b"f" => {
                        if let Some(pending) = cell.as_mut() {
                            match attr_value(&e, b"t").as_deref() {
                                Some("shared") => pending.shared_index = attr_value(&e, b"si"),
                                Some("array") => {
                                    pending.array_ref = attr_value(&e, b"ref");
                                    pending.always_calculate =
                                        attr_value(&e, b"aca").is_some_and(|s| parse_bool(&s));
                                }
                                _ => {}
                            }
                            if !is_empty {
                                target = TextTarget::Formula;
                            }
                        }
                    }
                    b"is" if cell.is_some() => in_inline_str = !is_empty,
                    b"rPh" if in_inline_str => in_phonetic = !is_empty,
                    b"t" if in_inline_str && !in_phonetic && !is_empty => {
                        target = TextTarget::Inline;
                    }
                    b"mergeCell" => {
                        if let Some(reference) = attr_value(&e, b"ref") {
                            match CellRange::parse(&reference) {
                                Ok(range) => {
                                    if let Err(err) = worksheet.merge_cells(&range) {
                                        log::warn!("ignoring merged region {}: {}", reference, err);
                                    }
                                }
                                Err(err) => log::warn!("ignoring merged region {}: {}", reference, err),
                            }
                        }
                    }
                    b"hyperlink" => {
                        if let Some(link) = read_hyperlink(&e, &rels) {
                            worksheet.add_hyperlink(link);
                        }
                    }
                    _ => {}
                }
            }

            Event::Text(e) => {
                if target != TextTarget::None {
                    if let Some(pending) = cell.as_mut() {
                        let text = e.unescape()?;
                        let slot = match target {
                            TextTarget::Value => &mut pending.value,
                            TextTarget::Formula => &mut pending.formula,
                            _ => {
                                pending.cell_type = Some("inlineStr".to_string());
                                &mut pending.value
                            }
                        };
                        slot.get_or_insert_with(String::new).push_str(&text);
                    }
                }
            }

            Event::End(e) => {
                depth = depth.saturating_sub(1);
                match e.local_name().as_ref() {
                    b"c" => {
                        if let Some(pending) = cell.take() {
                            store_cell(
                                worksheet,
                                pending,
                                shared_strings,
                                cell_styles,
                                &mut shared_formulas,
                            )?;
                        }
                        target = TextTarget::None;
                        in_inline_str = false;
                    }
                    b"v" | b"f" => target = TextTarget::None,
                    b"t" if in_inline_str => target = TextTarget::None,
                    b"rPh" => in_phonetic = false,
                    b"is" => in_inline_str = false,
                    _ => {}
                }
            }

            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    worksheet.set_preserved(preserved);
    read_comments(archive, &rels, worksheet)
}

fn parse_row_number(text: &str) -> XlsxResult<u32> {
    match text.parse::<u32>() {
        Ok(r) if (1..=MAX_ROWS).contains(&r) => Ok(r - 1),
        _ => Err(XlsxError::Parse(format!("Invalid row number '{}'", text))),
    }
}

fn read_row_attrs(e: &BytesStart<'_>, row: u32, worksheet: &mut Worksheet) {
    let custom_height = attr_value(e, b"customHeight").is_some_and(|s| parse_bool(&s));
    if custom_height {
        if let Some(h) = attr_value(e, b"ht").and_then(|s| s.parse::<f64>().ok()) {
            worksheet.set_row_height(row, h);
        }
    }
    if attr_value(e, b"hidden").is_some_and(|s| parse_bool(&s)) {
        worksheet.set_row_hidden(row, true);
    }
}

/// Apply a `<col min max width customWidth hidden>` span
fn read_column(e: &BytesStart<'_>, worksheet: &mut Worksheet) {
    let bound = |key: &[u8]| attr_value(e, key).and_then(|s| s.parse::<u32>().ok());
    let (Some(min), Some(max)) = (bound(b"min"), bound(b"max")) else {
        return;
    };
    let width = attr_value(e, b"width").and_then(|s| s.parse::<f64>().ok());
    let custom_width = attr_value(e, b"customWidth").is_some_and(|s| parse_bool(&s));
    let hidden = attr_value(e, b"hidden").is_some_and(|s| parse_bool(&s));

    let first = min.max(1);
    let last = max.min(MAX_COLS as u32);
    for col in first..=last {
        let col_idx = (col - 1) as u16;
        if custom_width {
            if let Some(w) = width {
                worksheet.set_column_width(col_idx, w);
            }
        }
        if hidden {
            worksheet.set_column_hidden(col_idx, true);
        }
    }
}

/// Turn a finished `<c>` into a model cell
fn store_cell(
    worksheet: &mut Worksheet,
    pending: PendingCell,
    shared_strings: &[String],
    cell_styles: &[Style],
    shared_formulas: &mut HashMap<String, SharedFormula>,
) -> XlsxResult<()> {
    let style = match pending.style {
        0 => None,
        s => Some(cell_styles.get(s as usize).ok_or_else(|| {
            XlsxError::Parse(format!("Style index {} out of bounds", s))
        })?),
    };
    let cell_type = pending.cell_type.as_deref();
    let array = pending.array_ref.as_deref().and_then(|reference| {
        match CellRange::parse(reference) {
            Ok(range) => Some(ArrayFormula {
                range,
                always_calculate: pending.always_calculate,
            }),
            Err(err) => {
                log::warn!("ignoring array extent '{}': {}", reference, err);
                None
            }
        }
    });

    let formula = match (pending.formula, pending.shared_index) {
        (Some(text), Some(si)) if !text.is_empty() => {
            shared_formulas.insert(
                si,
                SharedFormula {
                    row: pending.row,
                    col: pending.col,
                    text: text.clone(),
                },
            );
            Some(text)
        }
        (_, Some(si)) => match shared_formulas.get(&si) {
            Some(anchor) => Some(translate_formula(
                &anchor.text,
                pending.row as i64 - anchor.row as i64,
                pending.col as i64 - anchor.col as i64,
            )),
            None => {
                log::warn!(
                    "shared formula {} has no anchor before {}; keeping the cached value",
                    si,
                    CellAddress::new(pending.row, pending.col)
                );
                None
            }
        },
        (text, None) => text.filter(|t| !t.is_empty()),
    };

    let value = match formula {
        Some(text) => {
            let cached = pending
                .value
                .as_deref()
                .and_then(|v| decode_value(cell_type, v, shared_strings).ok());
            let text = if text.starts_with('=') {
                text
            } else {
                format!("={}", text)
            };
            CellValue::Formula {
                text,
                cached_value: cached.map(Box::new),
                array,
            }
        }
        None => match pending.value.as_deref() {
            Some(v) => {
                let value = decode_value(cell_type, v, shared_strings)?;
                match (value, style) {
                    (CellValue::Number(n), Some(style)) if style.number_format.is_date_format() => {
                        serial_to_datetime(n).map_or(CellValue::Number(n), CellValue::DateTime)
                    }
                    (value, _) => value,
                }
            }
            None => CellValue::Empty,
        },
    };

    if !value.is_empty() {
        worksheet.set_cell_value_at(pending.row, pending.col, value)?;
    }
    if let Some(style) = style {
        worksheet.set_cell_style_at(pending.row, pending.col, style)?;
    }
    Ok(())
}

/// Decode a `<v>` (or inline string) according to the cell's `t` attribute
fn decode_value(
    cell_type: Option<&str>,
    value: &str,
    shared_strings: &[String],
) -> XlsxResult<CellValue> {
    Ok(match cell_type {
        Some("s") => {
            let idx: usize = value.trim().parse().map_err(|_| {
                XlsxError::Parse(format!("Invalid shared string index: {}", value))
            })?;
            let s = shared_strings.get(idx).ok_or_else(|| {
                XlsxError::Parse(format!("Shared string index {} out of bounds", idx))
            })?;
            CellValue::string(s.as_str())
        }
        Some("b") => CellValue::Boolean(parse_bool(value.trim())),
        Some("e") => CellError::parse(value)
            .map(CellValue::Error)
            .unwrap_or_else(|| CellValue::string(value)),
        Some("inlineStr") | Some("str") => CellValue::string(decode_excel_escapes(value)),
        Some("d") => match chrono::NaiveDateTime::parse_from_str(value.trim(), "%Y-%m-%dT%H:%M:%S")
            .or_else(|_| {
                chrono::NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
                    .map(|d| d.and_time(chrono::NaiveTime::MIN))
            }) {
            Ok(dt) => CellValue::DateTime(dt),
            Err(_) => CellValue::string(value),
        },
        None | Some("n") => match value.trim().parse::<f64>() {
            Ok(n) => CellValue::Number(n),
            Err(_) => CellValue::string(value),
        },
        Some(_) => CellValue::string(value),
    })
}
