//! XLSX styles (styles.xml) read/write helpers

use std::collections::HashMap;
use std::io::{BufReader, Read};

use ahash::AHashMap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::reader::Reader;

use crate::error::XlsxResult;
use crate::escape::escape_xml;
use cellfence_core::style::{
    Alignment, BorderEdge, BorderLineStyle, BorderSide, BorderStyle, Color, FillStyle, FontStyle,
    HorizontalAlignment, NumberFormat, PatternType, Style, Underline, VerticalAlignment,
};
use cellfence_core::Workbook;

// === Writing ===

/// Workbook-wide `cellXfs` table
///
/// Each worksheet interns styles in its own pool, so the same local index can
/// mean different styles on different sheets. The table dedupes across
/// sheets and remembers, per sheet, which `xf` each local index became.
#[derive(Debug)]
pub(crate) struct XlsxStyleTable {
    /// Deduplicated styles; position is the `s` attribute written on cells
    styles: Vec<Style>,
    /// Per sheet: local style index -> xf id
    sheet_maps: Vec<AHashMap<u32, u32>>,
    /// `<dxfs>` block carried over from the source file
    differential_formats: Option<String>,
}

#[derive(Debug, Clone, Copy)]
struct ResolvedXfIds {
    font_id: u32,
    fill_id: u32,
    border_id: u32,
    num_fmt_id: u32,
}

impl XlsxStyleTable {
    pub(crate) fn build(workbook: &Workbook) -> Self {
        let mut styles = vec![Style::default()];
        let mut style_to_xf: AHashMap<Style, u32> = AHashMap::new();
        style_to_xf.insert(Style::default(), 0);

        let sheet_maps = workbook
            .worksheets()
            .map(|sheet| {
                let mut map = AHashMap::new();
                map.insert(0, 0);
                for (_, _, cell) in sheet.iter_cells() {
                    let local = cell.style_index;
                    if map.contains_key(&local) {
                        continue;
                    }
                    let style = sheet.style_pool().get_or_default(local);
                    let xf_id = *style_to_xf.entry(style.clone()).or_insert_with(|| {
                        styles.push(style.clone());
                        styles.len() as u32 - 1
                    });
                    map.insert(local, xf_id);
                }
                map
            })
            .collect();

        Self {
            styles,
            sheet_maps,
            differential_formats: workbook.differential_formats().map(str::to_string),
        }
    }

    pub(crate) fn xf_id_for(&self, sheet_index: usize, local_style_index: u32) -> u32 {
        self.sheet_maps
            .get(sheet_index)
            .and_then(|m| m.get(&local_style_index).copied())
            .unwrap_or(0)
    }

    pub(crate) fn to_styles_xml(&self) -> String {
        let mut fonts = Interner::new(FontStyle::default());
        // The first two fills are reserved: none and gray125
        let mut fills = Interner::new(FillStyle::None);
        fills.items.push(FillStyle::Pattern {
            pattern: PatternType::Gray125,
            foreground: Color::Auto,
            background: Color::Auto,
        });
        let mut borders = Interner::new(BorderStyle::default());

        let mut numfmt_ids: HashMap<&str, u32> = HashMap::new();
        let mut numfmts: Vec<(u32, &str)> = Vec::new();

        let resolved: Vec<ResolvedXfIds> = self
            .styles
            .iter()
            .map(|style| {
                let fill_id = if style.fill.is_none() {
                    0
                } else {
                    fills.id_of(&style.fill)
                };
                let num_fmt_id = match &style.number_format {
                    NumberFormat::General => 0,
                    NumberFormat::BuiltIn(id) => *id,
                    NumberFormat::Custom(code) => {
                        let next = NumberFormat::FIRST_CUSTOM_ID + numfmts.len() as u32;
                        *numfmt_ids.entry(code.as_str()).or_insert_with(|| {
                            numfmts.push((next, code.as_str()));
                            next
                        })
                    }
                };
                ResolvedXfIds {
                    font_id: fonts.id_of(&style.font),
                    fill_id,
                    border_id: borders.id_of(&style.border),
                    num_fmt_id,
                }
            })
            .collect();

        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );

        if !numfmts.is_empty() {
            xml.push_str(&format!("\n  <numFmts count=\"{}\">", numfmts.len()));
            for (id, code) in &numfmts {
                xml.push_str(&format!(
                    "\n    <numFmt numFmtId=\"{}\" formatCode=\"{}\"/>",
                    id,
                    escape_xml(code)
                ));
            }
            xml.push_str("\n  </numFmts>");
        }

        push_section(&mut xml, "fonts", &fonts.items, write_font);
        push_section(&mut xml, "fills", &fills.items, write_fill);
        push_section(&mut xml, "borders", &borders.items, write_border);

        xml.push_str(
            r#"
  <cellStyleXfs count="1">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>
  </cellStyleXfs>"#,
        );

        xml.push_str(&format!("\n  <cellXfs count=\"{}\">", self.styles.len()));
        for (style, ids) in self.styles.iter().zip(&resolved) {
            xml.push_str("\n    ");
            xml.push_str(&write_xf(style, *ids));
        }
        xml.push_str("\n  </cellXfs>");

        xml.push_str(
            r#"
  <cellStyles count="1">
    <cellStyle name="Normal" xfId="0" builtinId="0"/>
  </cellStyles> count="0" defaultTableStyle="TableStyleMedium9" defaultPivotStyle="PivotStyleLight16"/>
</styleSheet>"#,
        );
        xml
    }
}

/// Ordered, deduplicated list of style components
struct Interner<T> {
    items: Vec<T>,
    ids: HashMap<T, u32>,
}

impl<T: Clone + Eq + std::hash::Hash> Interner<T> {
    fn new(first: T) -> Self {
        let mut ids = HashMap::new();
        ids.insert(first.clone(), 0);
        Self {
            items: vec![first],
            ids,
        }
    }

    fn id_of(&mut self, item: &T) -> u32 {
        if let Some(&id) = self.ids.get(item) {
            return id;
        }
        let id = self.items.len() as u32;
        self.items.push(item.clone());
        self.ids.insert(item.clone(), id);
        id
    }
}

fn push_section<T>(xml: &mut String, tag: &str, items: &[T], write: fn(&T) -> String) {
    xml.push_str(&format!("\n  <{} count=\"{}\">", tag, items.len()));
    for item in items {
        xml.push_str("\n    ");
        xml.push_str(&write(item));
    }
    xml.push_str(&format!("\n  </{}>", tag));
}

fn color_attrs(color: &Color) -> String {
    match color {
        Color::Auto => " auto=\"1\"".to_string(),
        Color::Rgb { .. } | Color::Argb { .. } => {
            format!(" rgb=\"{}\"", color.to_argb_hex().unwrap_or_default())
        }
        Color::Indexed(i) => format!(" indexed=\"{}\"", i),
        Color::Theme { index, tint: 0 } => format!(" theme=\"{}\"", index),
        Color::Theme { index, tint } => {
            format!(" theme=\"{}\" tint=\"{}\"", index, *tint as f64 / 1000.0)
        }
    }
}

fn write_font(font: &FontStyle) -> String {
    let mut s = String::from("<font>");
    if font.bold {
        s.push_str("<b/>");
    }
    if font.italic {
        s.push_str("<i/>");
    }
    if font.strikethrough {
        s.push_str("<strike/>");
    }
    match font.underline {
        Underline::None => {}
        Underline::Single => s.push_str("<u/>"),
        other => s.push_str(&format!("<u val=\"{}\"/>", other.as_str())),
    }
    s.push_str(&format!("<sz val=\"{}\"/>", font.size));
    if !font.color.is_auto() {
        s.push_str(&format!("<color{}/>", color_attrs(&font.color)));
    }
    s.push_str(&format!("<name val=\"{}\"/>", escape_xml(&font.name)));
    s.push_str("</font>");
    s
}

fn write_fill(fill: &FillStyle) -> String {
    match fill {
        FillStyle::None => "<fill><patternFill patternType=\"none\"/></fill>".to_string(),
        FillStyle::Solid { color } => format!(
            "<fill><patternFill patternType=\"solid\"><fgColor{}/><bgColor indexed=\"64\"/></patternFill></fill>",
            color_attrs(color)
        ),
        FillStyle::Pattern {
            pattern,
            foreground,
            background,
        } => format!(
            "<fill><patternFill patternType=\"{}\"><fgColor{}/><bgColor{}/></patternFill></fill>",
            pattern.as_str(),
            color_attrs(foreground),
            color_attrs(background)
        ),
    }
}

fn write_border(border: &BorderStyle) -> String {
    let mut s = String::from("<border>");
    for side in BorderSide::ALL {
        let tag = side.as_str();
        match border.side(side) {
            Some(edge) if edge.style != BorderLineStyle::None => {
                s.push_str(&format!(
                    "<{tag} style=\"{}\"><color{}/></{tag}>",
                    edge.style.as_str(),
                    color_attrs(&edge.color)
                ));
            }
            _ => s.push_str(&format!("<{tag}/>")),
        }
    }
    s.push_str("<diagonal/></border>");
    s
}

fn write_alignment(al: &Alignment) -> String {
    if al.is_default() {
        return String::new();
    }
    let default = Alignment::default();
    let mut s = String::from("<alignment");
    if al.horizontal != default.horizontal {
        s.push_str(&format!(" horizontal=\"{}\"", al.horizontal.as_str()));
    }
    if al.vertical != default.vertical {
        s.push_str(&format!(" vertical=\"{}\"", al.vertical.as_str()));
    }
    if al.wrap_text {
        s.push_str(" wrapText=\"1\"");
    }
    if al.shrink_to_fit {
        s.push_str(" shrinkToFit=\"1\"");
    }
    if al.indent != 0 {
        s.push_str(&format!(" indent=\"{}\"", al.indent));
    }
    if al.rotation != 0 {
        s.push_str(&format!(" textRotation=\"{}\"", al.rotation));
    }
    s.push_str("/>");
    s
}

fn write_xf(style: &Style, ids: ResolvedXfIds) -> String {
    let mut s = format!(
        "<xf numFmtId=\"{}\" fontId=\"{}\" fillId=\"{}\" borderId=\"{}\" xfId=\"0\"",
        ids.num_fmt_id, ids.font_id, ids.fill_id, ids.border_id
    );
    if ids.num_fmt_id != 0 {
        s.push_str(" applyNumberFormat=\"1\"");
    }
    if ids.font_id != 0 {
        s.push_str(" applyFont=\"1\"");
    }
    if ids.fill_id != 0 {
        s.push_str(" applyFill=\"1\"");
    }
    if ids.border_id != 0 {
        s.push_str(" applyBorder=\"1\"");
    }

    let alignment = write_alignment(&style.alignment);
    if alignment.is_empty() {
        s.push_str("/>");
    } else {
        s.push_str(" applyAlignment=\"1\">");
        s.push_str(&alignment);
        s.push_str("</xf>");
    }
    s
}

// === Reading ===

/// Pending `<xf>` inside `cellXfs`
struct XfRecord {
    num_fmt_id: u32,
    font_id: u32,
    fill_id: u32,
    border_id: u32,
    alignment: Alignment,
}

/// Pending `<fill>`
#[derive(Default)]
struct FillRecord {
    pattern: Option<PatternType>,
    fg: Color,
    bg: Color,
}

/// Read `xl/styles.xml` into one [`Style`] per `cellXfs` entry
///
/// The returned list is never empty: index 0 is the default style when the
/// part has no `cellXfs`.
pub(crate) fn read_styles_xml<R: Read>(reader: R) -> XlsxResult<Vec<Style>> {
    let mut xml_reader = Reader::from_reader(BufReader::new(reader));
    xml_reader.trim_text(true);

    let mut buf = Vec::new();

    let mut numfmts: HashMap<u32, String> = HashMap::new();
    let mut fonts: Vec<FontStyle> = Vec::new();
    let mut fills: Vec<FillStyle> = Vec::new();
    let mut borders: Vec<BorderStyle> = Vec::new();
    let mut cell_xfs: Vec<Style> = Vec::new();

    let mut current_font: Option<FontStyle> = None;
    let mut current_fill: Option<FillRecord> = None;
    let mut current_border: Option<BorderStyle> = None;
    let mut current_side: Option<BorderSide> = None;
    let mut current_xf: Option<XfRecord> = None;
    let mut in_cell_xfs = false;
    // Differential formats reuse font/fill/border tags; they are skipped
    let mut in_dxfs = false;

    loop {
        let event = xml_reader.read_event_into(&mut buf)?;
        let is_empty = matches!(event, Event::Empty(_));
        match event {
            Event::Start(e) | Event::Empty(e) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"dxfs" if !is_empty => in_dxfs = true,
                    _ if in_dxfs => {}
                    b"cellXfs" if !is_empty => in_cell_xfs = true,
                    b"numFmt" => {
                        let id = attr_value(&e, b"numFmtId").and_then(|s| s.parse().ok());
                        let code = attr_value(&e, b"formatCode");
                        if let (Some(id), Some(code)) = (id, code) {
                            numfmts.insert(id, code);
                        }
                    }
                    b"font" => {
                        if is_empty {
                            fonts.push(FontStyle::default());
                        } else {
                            current_font = Some(FontStyle::default());
                        }
                    }
                    b"b" | b"i" | b"strike" | b"u" | b"sz" | b"name" => {
                        if let Some(font) = current_font.as_mut() {
                            apply_font_child(font, name.as_ref(), &e);
                        }
                    }
                    b"fill" => {
                        if is_empty {
                            fills.push(FillStyle::None);
                        } else {
                            current_fill = Some(FillRecord::default());
                        }
                    }
                    b"patternFill" => {
                        if let Some(fill) = current_fill.as_mut() {
                            fill.pattern = attr_value(&e, b"patternType")
                                .and_then(|v| PatternType::from_name(&v));
                        }
                    }
                    b"fgColor" => {
                        if let Some(fill) = current_fill.as_mut() {
                            fill.fg = parse_color_attrs(&e);
                        }
                    }
                    b"bgColor" => {
                        if let Some(fill) = current_fill.as_mut() {
                            fill.bg = parse_color_attrs(&e);
                        }
                    }
                    b"border" => {
                        if is_empty {
                            borders.push(BorderStyle::default());
                        } else {
                            current_border = Some(BorderStyle::default());
                        }
                    }
                    b"left" | b"right" | b"top" | b"bottom" | b"start" | b"end" => {
                        if let Some(border) = current_border.as_mut() {
                            let side = match name.as_ref() {
                                b"left" | b"start" => BorderSide::Left,
                                b"right" | b"end" => BorderSide::Right,
                                b"top" => BorderSide::Top,
                                _ => BorderSide::Bottom,
                            };
                            let style = attr_value(&e, b"style")
                                .and_then(|v| BorderLineStyle::parse(&v).ok())
                                .filter(|s| *s != BorderLineStyle::None);
                            if let Some(style) = style {
                                *border.side_mut(side) = Some(BorderEdge::new(style, Color::Auto));
                            }
                            if !is_empty {
                                current_side = Some(side);
                            }
                        }
                    }
                    b"color" => {
                        let color = parse_color_attrs(&e);
                        if let Some(font) = current_font.as_mut() {
                            font.color = color;
                        } else if let (Some(border), Some(side)) =
                            (current_border.as_mut(), current_side)
                        {
                            if let Some(edge) = border.side_mut(side).as_mut() {
                                edge.color = color;
                            }
                        }
                    }
                    b"xf" if in_cell_xfs => {
                        let id = |key: &[u8]| {
                            attr_value(&e, key)
                                .and_then(|s| s.parse().ok())
                                .unwrap_or(0)
                        };
                        let record = XfRecord {
                            num_fmt_id: id(b"numFmtId"),
                            font_id: id(b"fontId"),
                            fill_id: id(b"fillId"),
                            border_id: id(b"borderId"),
                            alignment: Alignment::default(),
                        };
                        if is_empty {
                            cell_xfs.push(resolve_style(record, &numfmts, &fonts, &fills, &borders));
                        } else {
                            current_xf = Some(record);
                        }
                    }
                    b"alignment" => {
                        if let Some(xf) = current_xf.as_mut() {
                            apply_alignment_attrs(&mut xf.alignment, &e);
                        }
                    }
                    _ => {}
                }
            }

            Event::End(e) => match e.local_name().as_ref() {
                b"dxfs" => in_dxfs = false,
                _ if in_dxfs => {}
                b"font" => {
                    if let Some(font) = current_font.take() {
                        fonts.push(font);
                    }
                }
                b"fill" => {
                    if let Some(fill) = current_fill.take() {
                        fills.push(finalize_fill(fill));
                    }
                }
                b"border" => {
                    if let Some(border) = current_border.take() {
                        borders.push(border);
                    }
                    current_side = None;
                }
                b"left" | b"right" | b"top" | b"bottom" | b"start" | b"end" => {
                    current_side = None;
                }
                b"xf" => {
                    if let Some(record) = current_xf.take() {
                        cell_xfs.push(resolve_style(record, &numfmts, &fonts, &fills, &borders));
                    }
                }
                b"cellXfs" => in_cell_xfs = false,
                _ => {}
            },

            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if cell_xfs.is_empty() {
        cell_xfs.push(Style::default());
    }
    Ok(cell_xfs)
}

/// The `<dxfs>` block of a styles part, byte for byte
///
/// Conditional formats refer to differential formats by position, so the
/// block is carried whole rather than parsed. A prefixed block is not
/// carried, since the prefix would be undeclared in the rewritten part.
pub(crate) fn read_differential_formats(data: &[u8]) -> XlsxResult<Option<String>> {
    let mut xml_reader = Reader::from_reader(data);
    let mut buf = Vec::new();

    loop {
        let start = xml_reader.buffer_position();
        match xml_reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"dxfs" => {
                if e.name().prefix().is_some() {
                    log::warn!("differential formats use a namespace prefix; not carried over");
                    return Ok(None);
                }
                let end_name = e.name().as_ref().to_vec();
                let mut skip = Vec::new();
                xml_reader.read_to_end_into(QName(&end_name), &mut skip)?;
                let end = xml_reader.buffer_position();
                return Ok(Some(String::from_utf8_lossy(&data[start..end]).into_owned()));
            }
            Event::Empty(e) if e.local_name().as_ref() == b"dxfs" => return Ok(None),
            Event::Eof => return Ok(None),
            _ => {}
        }
        buf.clear();
    }
}

/// First value of attribute `key`, unescaped
pub(crate) fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Parse an OOXML boolean attribute (`1`, `true`, `0`, `false`)
pub(crate) fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

fn apply_font_child(font: &mut FontStyle, tag: &[u8], e: &BytesStart<'_>) {
    // Toggle elements default to on; `<b val="0"/>` turns them off
    let flag = || attr_value(e, b"val").map_or(true, |v| parse_bool(&v));
    match tag {
        b"b" => font.bold = flag(),
        b"i" => font.italic = flag(),
        b"strike" => font.strikethrough = flag(),
        b"u" => {
            font.underline = match attr_value(e, b"val") {
                Some(v) => Underline::parse(&v).unwrap_or(Underline::Single),
                None => Underline::Single,
            }
        }
        b"sz" => {
            if let Some(size) = attr_value(e, b"val").and_then(|v| v.parse::<f64>().ok()) {
                font.size = size;
            }
        }
        b"name" => {
            if let Some(name) = attr_value(e, b"val") {
                font.name = name;
            }
        }
        _ => {}
    }
}

fn apply_alignment_attrs(align: &mut Alignment, e: &BytesStart<'_>) {
    for attr in e.attributes().flatten() {
        let Ok(val) = attr.unescape_value() else {
            continue;
        };
        match attr.key.as_ref() {
            b"horizontal" => {
                if let Ok(h) = HorizontalAlignment::parse(&val) {
                    align.horizontal = h;
                }
            }
            b"vertical" => {
                if let Ok(v) = VerticalAlignment::parse(&val) {
                    align.vertical = v;
                }
            }
            b"wrapText" => align.wrap_text = parse_bool(&val),
            b"shrinkToFit" => align.shrink_to_fit = parse_bool(&val),
            b"indent" => align.indent = val.parse().unwrap_or(0),
            b"textRotation" => align.rotation = val.parse().unwrap_or(0),
            _ => {}
        }
    }
}

fn resolve_style(
    xf: XfRecord,
    numfmts: &HashMap<u32, String>,
    fonts: &[FontStyle],
    fills: &[FillStyle],
    borders: &[BorderStyle],
) -> Style {
    let number_format = if xf.num_fmt_id == 0 {
        NumberFormat::General
    } else if let Some(code) = numfmts.get(&xf.num_fmt_id) {
        NumberFormat::Custom(code.clone())
    } else {
        NumberFormat::BuiltIn(xf.num_fmt_id)
    };

    Style {
        font: fonts.get(xf.font_id as usize).cloned().unwrap_or_default(),
        fill: fills.get(xf.fill_id as usize).cloned().unwrap_or_default(),
        border: borders.get(xf.border_id as usize).cloned().unwrap_or_default(),
        alignment: xf.alignment,
        number_format,
    }
}

fn finalize_fill(fill: FillRecord) -> FillStyle {
    match fill.pattern.unwrap_or(PatternType::None) {
        PatternType::None | PatternType::Gray125 => FillStyle::None,
        PatternType::Solid => FillStyle::Solid { color: fill.fg },
        pattern => FillStyle::Pattern {
            pattern,
            foreground: fill.fg,
            background: fill.bg,
        },
    }
}

/// Read a color element; `rgb` wins over `theme`, then `indexed`
fn parse_color_attrs(e: &BytesStart<'_>) -> Color {
    if let Some(color) = attr_value(e, b"rgb").and_then(|v| Color::from_hex(&v)) {
        return color;
    }
    if let Some(index) = attr_value(e, b"theme").and_then(|v| v.parse::<u8>().ok()) {
        let tint = attr_value(e, b"tint")
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(0.0);
        return Color::theme(index, tint);
    }
    match attr_value(e, b"indexed").and_then(|v| v.parse::<u8>().ok()) {
        // 64 is the system foreground, i.e. automatic
        Some(64) | None => Color::Auto,
        Some(i) => Color::Indexed(i),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellfence_core::Workbook;
    use pretty_assertions::assert_eq;

    fn roundtrip(styles: &[Style]) -> Vec<Style> {
        let mut wb = Workbook::new();
        let sheet = wb.worksheet_mut(0).unwrap();
        for (i, style) in styles.iter().enumerate() {
            sheet.set_cell_value_at(i as u32, 0, 1.0).unwrap();
            sheet.set_cell_style_at(i as u32, 0, style).unwrap();
        }
        let table = XlsxStyleTable::build(&wb);
        let xml = table.to_styles_xml();
        let parsed = read_styles_xml(xml.as_bytes()).unwrap();
        (0..styles.len())
            .map(|i| {
                let local = wb.worksheet(0).unwrap().cell_style_index_at(i as u32, 0);
                parsed[table.xf_id_for(0, local) as usize].clone()
            })
            .collect()
    }

    #[test]
    fn test_styles_survive_write_and_read() {
        let mut bordered = Style::new();
        bordered.border.left = Some(BorderEdge::new(BorderLineStyle::Thin, Color::rgb(1, 2, 3)));
        bordered.border.bottom = Some(BorderEdge::new(BorderLineStyle::Double, Color::Auto));

        let mut aligned = Style::new().horizontal_alignment(HorizontalAlignment::Center);
        aligned.alignment.vertical = VerticalAlignment::Top;
        aligned.alignment.wrap_text = true;

        let styles = vec![
            Style::new().bold(true).font_color(Color::RED).font_size(14.0),
            Style::new().fill_color(Color::rgb(0xFF, 0xFF, 0x00)),
            Style::new().number_format("0.00%"),
            Style::new().number_format("#,##0.000;[Red]-#,##0.000"),
            bordered,
            aligned,
        ];
        assert_eq!(roundtrip(&styles), styles);
    }

    #[test]
    fn test_theme_color_keeps_tint() {
        let style = Style::new().fill_color(Color::theme(4, 0.399));
        assert_eq!(roundtrip(&[style.clone()]), vec![style]);
    }

    #[test]
    fn test_same_style_on_two_sheets_shares_xf() {
        let mut wb = Workbook::new();
        wb.add_worksheet_with_name("Other").unwrap();
        let bold = Style::new().bold(true);
        let italic = Style::new().italic(true);

        let first = wb.worksheet_mut(0).unwrap();
        first.set_cell_style_at(0, 0, &bold).unwrap();
        let second = wb.worksheet_mut(1).unwrap();
        second.set_cell_style_at(0, 0, &italic).unwrap();
        second.set_cell_style_at(1, 0, &bold).unwrap();

        let table = XlsxStyleTable::build(&wb);
        let bold_first = table.xf_id_for(0, wb.worksheet(0).unwrap().cell_style_index_at(0, 0));
        let bold_second = table.xf_id_for(1, wb.worksheet(1).unwrap().cell_style_index_at(1, 0));
        assert_eq!(bold_first, bold_second);
        assert_eq!(table.styles.len(), 3);
    }

    #[test]
    fn test_dxf_fonts_are_not_cell_fonts() {
        let xml = r#"<styleSheet>
            <fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts>
            <fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>
            <borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>
            <cellXfs count="2">
                <xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>
                <xf numFmtId="14" fontId="0" fillId="0" borderId="0" applyNumberFormat="1"/>
            </cellXfs>
            <dxfs count="1"><dxf><font><b/><color rgb="FF9C0006"/></font></dxf></dxfs>
        </styleSheet>"#;
        let styles = read_styles_xml(xml.as_bytes()).unwrap();
        assert_eq!(styles.len(), 2);
        assert_eq!(
            read_differential_formats(xml.as_bytes()).unwrap().as_deref(),
            Some(r#"<dxfs count="1"><dxf><font><b/><color rgb="FF9C0006"/></font></dxf></dxfs>"#)
        );
        assert_eq!(styles[0], Style::default());
        assert_eq!(styles[1].number_format, NumberFormat::BuiltIn(14));
        assert!(styles[1].number_format.is_date_format());
        assert!(!styles[1].font.bold);
    }

    #[test]
    fn test_bold_val_zero() {
        let xml = r#"<styleSheet><fonts><font><b val="0"/><i/><u val="double"/></font></fonts>
            <cellXfs><xf fontId="0"/></cellXfs></styleSheet>"#;
        let styles = read_styles_xml(xml.as_bytes()).unwrap();
        assert!(!styles[0].font.bold);
        assert!(styles[0].font.italic);
        assert_eq!(styles[0].font.underline, Underline::Double);
    }

    #[test]
    fn test_differential_formats_are_written_back() {
        let mut wb = Workbook::new();
        let dxfs = r#"<dxfs count="1"><dxf><fill><patternFill><bgColor rgb="FFFFC7CE"/></patternFill></fill></dxf></dxfs>"#;
        wb.set_differential_formats(Some(dxfs.to_string()));

        let xml = XlsxStyleTable::build(&wb).to_styles_xml();
        assert!(xml.contains(dxfs));
        assert!(!xml.contains(r#"<dxfs count="0"/>"#));
        assert_eq!(read_differential_formats(xml.as_bytes()).unwrap().as_deref(), Some(dxfs));

        let plain = XlsxStyleTable::build(&Workbook::new()).to_styles_xml();
        assert!(plain.contains(r#"<dxfs count="0"/>"#));
        assert_eq!(read_differential_formats(plain.as_bytes()).unwrap(), None);
    }
}
