//! XLSX writer

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use crate::error::XlsxResult;
use crate::escape::{encode_excel_escapes, escape_xml, needs_space_preserve};
use crate::reader::VBA_PROJECT_PART;
use crate::styles::XlsxStyleTable;
use crate::ContainerKind;
use cellfence_core::cell::datetime_to_serial;
use cellfence_core::{
    CellAddress, CellError, CellValue, ConditionalFormat, DataValidation, SheetState, Workbook,
    Worksheet,
};

const VBA_CONTENT_TYPE: &str = "application/vnd.ms-office.vbaProject";
const VBA_RELATIONSHIP: &str =
    "http://schemas.microsoft.com/office/2006/relationships/vbaProject";
const OFFICE_RELATIONSHIP: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Worksheet children in the order the schema requires
const WORKSHEET_CHILDREN: &[&str] = &[
    "sheetPr",
    "dimension",
    "sheetViews",
    "sheetFormatPr",
    "cols",
    "sheetData",
    "sheetCalcPr",
    "sheetProtection",
    "protectedRanges",
    "scenarios",
    "autoFilter",
    "sortState",
    "dataConsolidate",
    "customSheetViews",
    "mergeCells",
    "phoneticPr",
    "conditionalFormatting",
    "dataValidations",
    "hyperlinks",
    "printOptions",
    "pageMargins",
    "pageSetup",
    "headerFooter",
    "rowBreaks",
    "colBreaks",
    "customProperties",
    "cellWatches",
    "ignoredErrors",
    "smartTags",
    "drawing",
    "legacyDrawing",
    "legacyDrawingHF",
    "drawingHF",
    "picture",
    "oleObjects",
    "controls",
    "webPublishItems",
    "tableParts",
    "extLst",
];

fn schema_position(name: &str) -> Option<usize> {
    WORKSHEET_CHILDREN.iter().position(|child| *child == name)
}

/// A relationship from a worksheet part; its id is `rId` followed by its
/// 1-based position in the sheet's list
struct SheetLink {
    kind: &'static str,
    target: String,
    external: bool,
}

/// XLSX/XLSM file writer
pub struct XlsxWriter;

impl XlsxWriter {
    /// Write a workbook to a file path
    ///
    /// The container kind follows the extension: `.xlsm` is written
    /// macro-enabled, anything else as a plain workbook.
    pub fn write_file<P: AsRef<Path>>(workbook: &Workbook, path: P) -> XlsxResult<()> {
        let kind = ContainerKind::from_path(&path);
        let file = File::create(path)?;
        Self::write_as(workbook, BufWriter::new(file), kind)
    }

    /// Write a workbook to a writer
    ///
    /// A workbook carrying a macro project is written macro-enabled.
    pub fn write<W: Write + Seek>(workbook: &Workbook, writer: W) -> XlsxResult<()> {
        let kind = if workbook.vba_project().is_some() {
            ContainerKind::Xlsm
        } else {
            ContainerKind::Xlsx
        };
        Self::write_as(workbook, writer, kind)
    }

    /// Write a workbook to a writer as the given container kind
    ///
    /// A plain `Xlsx` container never carries the macro project, even when
    /// the workbook has one.
    pub fn write_as<W: Write + Seek>(
        workbook: &Workbook,
        writer: W,
        kind: ContainerKind,
    ) -> XlsxResult<()> {
        let mut zip = zip::ZipWriter::new(writer);

        let style_table = XlsxStyleTable::build(workbook);
        let vba = match kind {
            ContainerKind::Xlsm => workbook.vba_project(),
            ContainerKind::Xlsx => {
                if workbook.vba_project().is_some() {
                    log::warn!("macro project dropped: writing a plain .xlsx container");
                }
                None
            }
        };

        Self::write_content_types(&mut zip, workbook, kind, vba.is_some())?;
        Self::write_root_rels(&mut zip)?;
        Self::write_workbook_xml(&mut zip, workbook)?;
        Self::write_workbook_rels(&mut zip, workbook, vba.is_some())?;
        Self::write_part(&mut zip, "xl/styles.xml", style_table.to_styles_xml().as_bytes())?;

        for (index, sheet) in workbook.worksheets().enumerate() {
            let number = index + 1;
            let (xml, links) = Self::worksheet_xml(sheet, index, &style_table);
            Self::write_part(
                &mut zip,
                &format!("xl/worksheets/sheet{}.xml", number),
                xml.as_bytes(),
            )?;
            if !links.is_empty() {
                Self::write_worksheet_rels(&mut zip, number, &links)?;
            }
            if sheet.comment_count() > 0 {
                Self::write_comments(&mut zip, sheet, number)?;
                Self::write_note_drawing(&mut zip, sheet, number)?;
            }
        }

        if let Some(data) = vba {
            Self::write_part(&mut zip, VBA_PROJECT_PART, data)?;
        }

        zip.finish()?.flush()?;
        log::debug!(
            "wrote {:?} container with {} sheet(s)",
            kind,
            workbook.sheet_count()
        );
        Ok(())
    }

    fn write_part<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        name: &str,
        data: &[u8],
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file(name, options)?;
        zip.write_all(data)?;
        Ok(())
    }

    fn write_content_types<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
        kind: ContainerKind,
        has_vba: bool,
    ) -> XlsxResult<()> {
        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="xml" ContentType="application/xml"/>"#,
        );
        if has_vba {
            content.push_str(&format!(
                "\n    <Default Extension=\"bin\" ContentType=\"{}\"/>",
                VBA_CONTENT_TYPE
            ));
        }
        let commented: Vec<usize> = workbook
            .worksheets()
            .enumerate()
            .filter(|(_, sheet)| sheet.comment_count() > 0)
            .map(|(i, _)| i + 1)
            .collect();
        if !commented.is_empty() {
            content.push_str(
                "\n    <Default Extension=\"vml\" ContentType=\"application/vnd.openxmlformats-officedocument.vmlDrawing\"/>",
            );
        }
        content.push_str(&format!(
            r#"
    <Override PartName="/xl/workbook.xml" ContentType="{}"/>
    <Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
            kind.workbook_content_type()
        ));

        for i in 0..workbook.sheet_count() {
            content.push_str(&format!(
                r#"
    <Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                i + 1
            ));
        }
        for number in commented {
            content.push_str(&format!(
                r#"
    <Override PartName="/xl/comments{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.comments+xml"/>"#,
                number
            ));
        }
        if has_vba {
            content.push_str(&format!(
                "\n    <Override PartName=\"/{}\" ContentType=\"{}\"/>",
                VBA_PROJECT_PART, VBA_CONTENT_TYPE
            ));
        }
        content.push_str("\n</Types>");

        Self::write_part(zip, "[Content_Types].xml", content.as_bytes())
    }

    fn write_root_rels<W: Write + Seek>(zip: &mut zip::ZipWriter<W>) -> XlsxResult<()> {
        let content = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;
        Self::write_part(zip, "_rels/.rels", content.as_bytes())
    }

    fn write_workbook_xml<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
    ) -> XlsxResult<()> {
        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
        );
        content.push_str(&format!(
            "\n    <bookViews>\n        <workbookView activeTab=\"{}\"/>\n    </bookViews>\n    <sheets>",
            workbook.active_sheet()
        ));

        for (i, sheet) in workbook.worksheets().enumerate() {
            let state = match sheet.state() {
                SheetState::Visible => String::new(),
                other => format!(" state=\"{}\"", other.as_str()),
            };
            content.push_str(&format!(
                "\n        <sheet name=\"{}\" sheetId=\"{}\"{} r:id=\"rId{}\"/>",
                escape_xml(sheet.name()),
                i + 1,
                state,
                i + 1
            ));
        }
        content.push_str("\n    </sheets>");

        let names = workbook.defined_names();
        if !names.is_empty() {
            content.push_str("\n    <definedNames>");
            for name in names {
                content.push_str(&format!("\n        <definedName name=\"{}\"", escape_xml(&name.name)));
                if let Some(id) = name.local_sheet_id {
                    content.push_str(&format!(" localSheetId=\"{}\"", id));
                }
                if name.hidden {
                    content.push_str(" hidden=\"1\"");
                }
                content.push_str(&format!(">{}</definedName>", escape_xml(&name.formula)));
            }
            content.push_str("\n    </definedNames>");
        }

        content.push_str("\n</workbook>");
        Self::write_part(zip, "xl/workbook.xml", content.as_bytes())
    }

    fn write_workbook_rels<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
        has_vba: bool,
    ) -> XlsxResult<()> {
        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );

        for i in 0..workbook.sheet_count() {
            content.push_str(&format!(
                r#"
    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                i + 1,
                i + 1
            ));
        }

        let styles_rid = workbook.sheet_count() + 1;
        content.push_str(&format!(
            r#"
    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
            styles_rid
        ));

        if has_vba {
            content.push_str(&format!(
                r#"
    <Relationship Id="rId{}" Type="{}" Target="vbaProject.bin"/>"#,
                styles_rid + 1,
                VBA_RELATIONSHIP
            ));
        }

        content.push_str("\n</Relationships>");
        Self::write_part(zip, "xl/_rels/workbook.xml.rels", content.as_bytes())
    }

    fn worksheet_xml(
        sheet: &Worksheet,
        index: usize,
        style_table: &XlsxStyleTable,
    ) -> (String, Vec<SheetLink>) {
        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships""#,
        );
        for (key, value) in &sheet.preserved().root_attributes {
            content.push_str(&format!(" {}=\"{}\"", key, escape_xml(value)));
        }
        content.push('>');

        let mut links = Vec::new();
        // (schema position, markup); a stable sort keeps file order per slot
        let mut fragments: Vec<(usize, String)> = Vec::new();
        let mut push = |name: &str, xml: String| {
            fragments.push((schema_position(name).unwrap_or(0), xml));
        };

        let dimension = sheet
            .used_range()
            .map(|r| r.to_a1_string())
            .unwrap_or_else(|| "A1".to_string());
        push("dimension", format!("\n    <dimension ref=\"{}\"/>", dimension));

        push(
            "sheetFormatPr",
            format!(
                "\n    <sheetFormatPr defaultRowHeight=\"{}\" defaultColWidth=\"{}\"/>",
                sheet.default_row_height(),
                sheet.default_column_width()
            ),
        );

        if let Some(cols) = Self::columns_xml(sheet) {
            push("cols", cols);
        }
        push("sheetData", Self::sheet_data_xml(sheet, index, style_table));

        let merged_regions = sheet.merged_regions();
        if !merged_regions.is_empty() {
            let mut merges = format!("\n    <mergeCells count=\"{}\">", merged_regions.len());
            for range in merged_regions {
                merges.push_str(&format!(
                    "\n        <mergeCell ref=\"{}\"/>",
                    range.to_a1_string()
                ));
            }
            merges.push_str("\n    </mergeCells>");
            push("mergeCells", merges);
        }

        for block in sheet.conditional_formats() {
            if let Some(xml) = Self::conditional_formatting_xml(block) {
                push("conditionalFormatting", xml);
            }
        }
        if let Some(xml) = Self::data_validations_xml(sheet.data_validations()) {
            push("dataValidations", xml);
        }
        if let Some(xml) = Self::hyperlinks_xml(sheet, &mut links) {
            push("hyperlinks", xml);
        }

        if sheet.comment_count() > 0 {
            let number = index + 1;
            links.push(SheetLink {
                kind: "comments",
                target: format!("../comments{}.xml", number),
                external: false,
            });
            links.push(SheetLink {
                kind: "vmlDrawing",
                target: format!("../drawings/vmlDrawing{}.vml", number),
                external: false,
            });
            push(
                "legacyDrawing",
                format!("\n    <legacyDrawing r:id=\"rId{}\"/>", links.len()),
            );
        }

        // Unknown elements stay behind whatever preceded them in the file
        let mut slot = schema_position("sheetData").unwrap_or(0);
        for (name, xml) in &sheet.preserved().elements {
            if let Some(position) = schema_position(name) {
                slot = position;
            }
            fragments.push((slot, format!("\n    {}", xml)));
        }

        fragments.sort_by_key(|(position, _)| *position);
        for (_, xml) in fragments {
            content.push_str(&xml);
        }
        content.push_str("\n</worksheet>");
        (content, links)
    }

    fn sheet_data_xml(sheet: &Worksheet, index: usize, style_table: &XlsxStyleTable) -> String {
        let mut content = String::from("\n    <sheetData>");
        let rows: BTreeSet<u32> = sheet
            .row_indices()
            .chain(sheet.custom_row_heights().keys().copied())
            .chain(sheet.hidden_rows().iter().filter(|(_, h)| **h).map(|(r, _)| *r))
            .collect();

        for row in rows {
            content.push_str(&format!("\n        <row r=\"{}\"", row + 1));
            if let Some(height) = sheet.custom_row_heights().get(&row) {
                content.push_str(&format!(" ht=\"{}\" customHeight=\"1\"", height));
            }
            if sheet.is_row_hidden(row) {
                content.push_str(" hidden=\"1\"");
            }

            let mut cells = sheet.iter_row(row).peekable();
            if cells.peek().is_none() {
                content.push_str("/>");
                continue;
            }
            content.push('>');
            for (col, cell) in cells {
                let cell_ref = CellAddress::new(row, col).to_a1_string();
                let xf_id = style_table.xf_id_for(index, cell.style_index);
                Self::write_cell(&mut content, &cell_ref, xf_id, &cell.value);
            }
            content.push_str("\n        </row>");
        }
        content.push_str("\n    </sheetData>");
        content
    }

    fn conditional_formatting_xml(block: &ConditionalFormat) -> Option<String> {
        if block.ranges.is_empty() {
            return None;
        }
        let pivot = if block.pivot { " pivot=\"1\"" } else { "" };
        let mut content = format!(
            "\n    <conditionalFormatting{} sqref=\"{}\">",
            pivot,
            block.sqref()
        );

        for rule in &block.rules {
            content.push_str(&format!(
                "\n        <cfRule type=\"{}\"",
                escape_xml(&rule.rule_type)
            ));
            if let Some(dxf_id) = rule.dxf_id {
                content.push_str(&format!(" dxfId=\"{}\"", dxf_id));
            }
            content.push_str(&format!(" priority=\"{}\"", rule.priority.max(1)));
            if rule.stop_if_true {
                content.push_str(" stopIfTrue=\"1\"");
            }
            for (key, value) in &rule.attributes {
                content.push_str(&format!(" {}=\"{}\"", key, escape_xml(value)));
            }

            if rule.formulas.is_empty() && rule.extra_xml.is_empty() {
                content.push_str("/>");
                continue;
            }
            content.push('>');
            for formula in &rule.formulas {
                content.push_str(&format!("<formula>{}</formula>", escape_xml(formula)));
            }
            content.push_str(&rule.extra_xml);
            content.push_str("</cfRule>");
        }

        content.push_str("\n    </conditionalFormatting>");
        Some(content)
    }

    fn data_validations_xml(validations: &[DataValidation]) -> Option<String> {
        let validations: Vec<&DataValidation> =
            validations.iter().filter(|v| !v.ranges.is_empty()).collect();
        if validations.is_empty() {
            return None;
        }

        let mut content = format!("\n    <dataValidations count=\"{}\">", validations.len());
        for validation in validations {
            content.push_str("\n        <dataValidation");
            if validation.validation_type != Default::default() {
                content.push_str(&format!(
                    " type=\"{}\"",
                    validation.validation_type.as_str()
                ));
            }
            if validation.error_style != Default::default() {
                content.push_str(&format!(
                    " errorStyle=\"{}\"",
                    validation.error_style.as_str()
                ));
            }
            if let Some(mode) = &validation.ime_mode {
                content.push_str(&format!(" imeMode=\"{}\"", escape_xml(mode)));
            }
            if validation.operator != Default::default() {
                content.push_str(&format!(" operator=\"{}\"", validation.operator.as_str()));
            }
            for (flag, attr) in [
                (validation.allow_blank, "allowBlank"),
                (validation.hide_dropdown, "showDropDown"),
                (validation.show_input_message, "showInputMessage"),
                (validation.show_error_message, "showErrorMessage"),
            ] {
                if flag {
                    content.push_str(&format!(" {}=\"1\"", attr));
                }
            }
            for (text, attr) in [
                (&validation.error_title, "errorTitle"),
                (&validation.error, "error"),
                (&validation.prompt_title, "promptTitle"),
                (&validation.prompt, "prompt"),
            ] {
                if let Some(text) = text {
                    content.push_str(&format!(" {}=\"{}\"", attr, escape_xml(text)));
                }
            }
            content.push_str(&format!(" sqref=\"{}\"", validation.sqref()));

            if validation.formula1.is_none() && validation.formula2.is_none() {
                content.push_str("/>");
                continue;
            }
            content.push('>');
            if let Some(formula) = &validation.formula1 {
                content.push_str(&format!("<formula1>{}</formula1>", escape_xml(formula)));
            }
            if let Some(formula) = &validation.formula2 {
                content.push_str(&format!("<formula2>{}</formula2>", escape_xml(formula)));
            }
            content.push_str("</dataValidation>");
        }
        content.push_str("\n    </dataValidations>");
        Some(content)
    }

    /// `<hyperlinks>`; external targets are added to `links`
    fn hyperlinks_xml(sheet: &Worksheet, links: &mut Vec<SheetLink>) -> Option<String> {
        if sheet.hyperlinks().is_empty() {
            return None;
        }
        let mut content = String::from("\n    <hyperlinks>");
        for link in sheet.hyperlinks() {
            content.push_str(&format!(
                "\n        <hyperlink ref=\"{}\"",
                link.range.to_a1_string()
            ));
            if let Some(target) = &link.target {
                links.push(SheetLink {
                    kind: "hyperlink",
                    target: target.clone(),
                    external: true,
                });
                content.push_str(&format!(" r:id=\"rId{}\"", links.len()));
            }
            for (text, attr) in [
                (&link.location, "location"),
                (&link.tooltip, "tooltip"),
                (&link.display, "display"),
            ] {
                if let Some(text) = text {
                    content.push_str(&format!(" {}=\"{}\"", attr, escape_xml(text)));
                }
            }
            content.push_str("/>");
        }
        content.push_str("\n    </hyperlinks>");
        Some(content)
    }

    /// Write the relationships of worksheet `number`
    fn write_worksheet_rels<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        number: usize,
        links: &[SheetLink],
    ) -> XlsxResult<()> {
        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for (i, link) in links.iter().enumerate() {
            let mode = if link.external {
                " TargetMode=\"External\""
            } else {
                ""
            };
            content.push_str(&format!(
                "\n    <Relationship Id=\"rId{}\" Type=\"{}/{}\" Target=\"{}\"{}/>",
                i + 1,
                OFFICE_RELATIONSHIP,
                link.kind,
                escape_xml(&link.target),
                mode
            ));
        }
        content.push_str("\n</Relationships>");
        Self::write_part(
            zip,
            &format!("xl/worksheets/_rels/sheet{}.xml.rels", number),
            content.as_bytes(),
        )
    }

    /// Write the comments part of worksheet `number`
    fn write_comments<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        sheet: &Worksheet,
        number: usize,
    ) -> XlsxResult<()> {
        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<comments xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
    <authors>"#,
        );
        let authors = sheet.comment_authors();
        for author in &authors {
            content.push_str(&format!("\n        <author>{}</author>", escape_xml(author)));
        }
        content.push_str("\n    </authors>\n    <commentList>");

        for ((row, col), comment) in sheet.comments() {
            let author_id = authors
                .iter()
                .position(|a| *a == comment.author)
                .unwrap_or(0);
            let text = comment.text.as_str();
            let space = if needs_space_preserve(text) || text.contains('\n') {
                " xml:space=\"preserve\""
            } else {
                ""
            };
            content.push_str(&format!(
                "\n        <comment ref=\"{}\" authorId=\"{}\"><text><t{}>{}</t></text></comment>",
                CellAddress::new(row, col).to_a1_string(),
                author_id,
                space,
                escape_xml(&encode_excel_escapes(text))
            ));
        }
        content.push_str("\n    </commentList>\n</comments>");

        Self::write_part(zip, &format!("xl/comments{}.xml", number), content.as_bytes())
    }

    /// Write the legacy drawing that gives each comment of worksheet
    /// `number` its note shape
    fn write_note_drawing<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        sheet: &Worksheet,
        number: usize,
    ) -> XlsxResult<()> {
        let mut content = format!(
            r##"<xml xmlns:v="urn:schemas-microsoft-com:vml" xmlns:o="urn:schemas-microsoft-com:office:office" xmlns:x="urn:schemas-microsoft-com:office:excel">
 <o:shapelayout v:ext="edit"><o:idmap v:ext="edit" data="{}"/></o:shapelayout>
 <v:shapetype id="_x0000_t202" coordsize="21600,21600" o:spt="202" path="m,l,21600r21600,l21600,xe">
  <v:stroke joinstyle="miter"/><v:path gradientshapeok="t" o:connecttype="rect"/>
 </v:shapetype>"##,
            number
        );

        for (i, ((row, col), comment)) in sheet.comments().enumerate() {
            let visibility = if comment.visible { "visible" } else { "hidden" };
            content.push_str(&format!(
                r##"
 <v:shape id="_x0000_s{}" type="#_x0000_t202" style="position:absolute;margin-left:59.25pt;margin-top:1.5pt;width:108pt;height:59.25pt;z-index:{};visibility:{}" fillcolor="#ffffe1" o:insetmode="auto">
  <v:fill color2="#ffffe1"/><v:shadow on="t" color="black" obscured="t"/><v:path o:connecttype="none"/>
  <v:textbox style="mso-direction-alt:auto"><div style="text-align:left"></div></v:textbox>
  <x:ClientData ObjectType="Note"><x:MoveWithCells/><x:SizeWithCells/><x:Anchor>{}, 15, {}, 10, {}, 15, {}, 4</x:Anchor><x:AutoFill>False</x:AutoFill><x:Row>{}</x:Row><x:Column>{}</x:Column>{}</x:ClientData>
 </v:shape>"##,
                number * 1024 + i + 1,
                i + 1,
                visibility,
                u32::from(col) + 1,
                row.saturating_sub(1),
                u32::from(col) + 3,
                row.saturating_add(3),
                row,
                col,
                if comment.visible { "<x:Visible/>" } else { "" }
            ));
        }
        content.push_str("\n</xml>");

        Self::write_part(
            zip,
            &format!("xl/drawings/vmlDrawing{}.vml", number),
            content.as_bytes(),
        )
    }

    /// `<cols>`, one element per run of adjacent columns with equal settings
    fn columns_xml(sheet: &Worksheet) -> Option<String> {
        let columns: BTreeSet<u16> = sheet
            .custom_column_widths()
            .keys()
            .copied()
            .chain(
                sheet
                    .hidden_columns()
                    .iter()
                    .filter(|(_, h)| **h)
                    .map(|(c, _)| *c),
            )
            .collect();
        if columns.is_empty() {
            return None;
        }

        let settings = |col: u16| {
            (
                sheet.custom_column_widths().get(&col).copied(),
                sheet.is_column_hidden(col),
            )
        };

        // (first, last, width, hidden)
        let mut runs: Vec<(u16, u16, Option<f64>, bool)> = Vec::new();
        for col in columns {
            let (width, hidden) = settings(col);
            match runs.last_mut() {
                Some(run) if run.1 + 1 == col && run.2 == width && run.3 == hidden => run.1 = col,
                _ => runs.push((col, col, width, hidden)),
            }
        }

        let mut content = String::from("\n    <cols>");
        for (first, last, width, hidden) in runs {
            content.push_str(&format!(
                "\n        <col min=\"{}\" max=\"{}\" width=\"{}\"",
                first + 1,
                last + 1,
                width.unwrap_or_else(|| sheet.default_column_width())
            ));
            if width.is_some() {
                content.push_str(" customWidth=\"1\"");
            }
            if hidden {
                content.push_str(" hidden=\"1\"");
            }
            content.push_str("/>");
        }
        content.push_str("\n    </cols>");
        Some(content)
    }

    fn write_cell(content: &mut String, cell_ref: &str, xf_id: u32, value: &CellValue) {
        let style_attr = if xf_id != 0 {
            format!(" s=\"{}\"", xf_id)
        } else {
            String::new()
        };

        match value {
            CellValue::Empty => {
                content.push_str(&format!("\n            <c r=\"{}\"{}/>", cell_ref, style_attr));
            }
            CellValue::Formula {
                text,
                cached_value,
                array,
            } => {
                let formula = text.strip_prefix('=').unwrap_or(text);
                let (type_attr, cached) = match cached_value.as_deref() {
                    Some(cached) => Self::value_parts(cached),
                    None => ("", None),
                };
                let array_attrs = match array {
                    Some(array) => format!(
                        " t=\"array\" ref=\"{}\"{}",
                        array.range.to_a1_string(),
                        if array.always_calculate { " aca=\"1\"" } else { "" }
                    ),
                    None => String::new(),
                };
                content.push_str(&format!(
                    "\n            <c r=\"{}\"{}{}><f{}>{}</f>",
                    cell_ref,
                    style_attr,
                    type_attr,
                    array_attrs,
                    escape_xml(formula)
                ));
                if let Some(v) = cached {
                    content.push_str(&format!("<v>{}</v>", v));
                }
                content.push_str("</c>");
            }
            CellValue::String(s) => {
                let space = if needs_space_preserve(s.as_str()) {
                    " xml:space=\"preserve\""
                } else {
                    ""
                };
                content.push_str(&format!(
                    "\n            <c r=\"{}\"{} t=\"inlineStr\"><is><t{}>{}</t></is></c>",
                    cell_ref,
                    style_attr,
                    space,
                    escape_xml(&encode_excel_escapes(s.as_str()))
                ));
            }
            other => {
                let (type_attr, v) = Self::value_parts(other);
                content.push_str(&format!(
                    "\n            <c r=\"{}\"{}{}><v>{}</v></c>",
                    cell_ref,
                    style_attr,
                    type_attr,
                    v.unwrap_or_default()
                ));
            }
        }
    }

    /// The `t` attribute and escaped `<v>` text for a plain value
    ///
    /// Strings are only passed here as cached formula results, where they
    /// use `t="str"` rather than an inline string.
    fn value_parts(value: &CellValue) -> (&'static str, Option<String>) {
        match value {
            CellValue::Empty | CellValue::Formula { .. } => ("", None),
            CellValue::Number(n) if !n.is_finite() => {
                (" t=\"e\"", Some(CellError::Num.as_str().to_string()))
            }
            CellValue::Number(n) => ("", Some(n.to_string())),
            CellValue::DateTime(dt) => ("", Some(datetime_to_serial(dt).to_string())),
            CellValue::Boolean(b) => (" t=\"b\"", Some(if *b { "1" } else { "0" }.to_string())),
            CellValue::Error(e) => (" t=\"e\"", Some(escape_xml(e.as_str()))),
            CellValue::String(s) => (
                " t=\"str\"",
                Some(escape_xml(&encode_excel_escapes(s.as_str()))),
            ),
        }
    }
}
