//! Container round trips (build -> write -> read -> verify) and reads of
//! hand-assembled packages covering what the writer never produces itself

use std::io::{Cursor, Read, Write};

use cellfence_core::{
    ArrayFormula, CellComment, CellError, CellRange, CellValue, Color, ConditionalFormat,
    ConditionalFormatRule, DataValidation, DefinedName, Hyperlink, SheetState, Style,
    ValidationErrorStyle, ValidationType, Workbook,
};
use cellfence_xlsx::{ContainerKind, XlsxReader, XlsxWriter};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;

fn roundtrip(wb: &Workbook) -> Workbook {
    let mut buf = Vec::new();
    XlsxWriter::write(wb, Cursor::new(&mut buf)).unwrap();
    XlsxReader::read(Cursor::new(&buf)).unwrap()
}

/// Zip the given parts into an in-memory package
fn package(parts: &[(&str, &str)]) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
        for (name, body) in parts {
            zip.start_file(*name, zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }
    buf
}

/// Text of one part of a written package
fn part_text(buf: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(buf)).unwrap();
    let mut text = String::new();
    archive
        .by_name(name)
        .unwrap()
        .read_to_string(&mut text)
        .unwrap();
    text
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#;

const ONE_SHEET_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
</Relationships>"#;

const ONE_SHEET_WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheets><sheet name="Data" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#;

#[test]
fn test_roundtrip_values() {
    let mut wb = Workbook::new();
    let sheet = wb.worksheet_mut(0).unwrap();

    sheet.set_cell_value("A1", 42.0).unwrap();
    sheet.set_cell_value("B1", -0.125).unwrap();
    sheet.set_cell_value("C1", 1e10).unwrap();
    sheet.set_cell_value("A2", "Special: <>&\"'").unwrap();
    sheet.set_cell_value("B2", "  padded  ").unwrap();
    sheet.set_cell_value("C2", "Multi\nLine \u{1F600}").unwrap();
    sheet.set_cell_value("D2", "literal _x0041_ and bell\u{7}").unwrap();
    sheet.set_cell_value("A3", true).unwrap();
    sheet.set_cell_value("B3", false).unwrap();
    sheet.set_cell_value("C3", CellError::Div0).unwrap();

    let wb2 = roundtrip(&wb);
    let sheet2 = wb2.worksheet(0).unwrap();

    assert_eq!(sheet2.get_value("A1").unwrap(), CellValue::Number(42.0));
    assert_eq!(sheet2.get_value("B1").unwrap(), CellValue::Number(-0.125));
    assert_eq!(sheet2.get_value("C1").unwrap(), CellValue::Number(1e10));
    assert_eq!(
        sheet2.get_value("A2").unwrap().as_string(),
        Some("Special: <>&\"'")
    );
    assert_eq!(sheet2.get_value("B2").unwrap().as_string(), Some("  padded  "));
    assert_eq!(
        sheet2.get_value("C2").unwrap().as_string(),
        Some("Multi\nLine \u{1F600}")
    );
    assert_eq!(
        sheet2.get_value("D2").unwrap().as_string(),
        Some("literal _x0041_ and bell\u{7}")
    );
    assert_eq!(sheet2.get_value("A3").unwrap(), CellValue::Boolean(true));
    assert_eq!(sheet2.get_value("B3").unwrap(), CellValue::Boolean(false));
    assert_eq!(
        sheet2.get_value("C3").unwrap(),
        CellValue::Error(CellError::Div0)
    );
    assert_eq!(sheet2.get_value("Z99").unwrap(), CellValue::Empty);
}

#[test]
fn test_roundtrip_formulas_keep_cached_values() {
    let mut wb = Workbook::new();
    let sheet = wb.worksheet_mut(0).unwrap();
    sheet.set_cell_value("A1", 2.0).unwrap();
    sheet.set_cell_formula("B1", "=A1*2").unwrap();
    sheet
        .set_cell_value(
            "C1",
            CellValue::Formula {
                text: "=IF(A1>1,\"big\",\"small\")".into(),
                cached_value: Some(Box::new(CellValue::string("big"))),
                array: None,
            },
        )
        .unwrap();
    sheet
        .set_cell_value(
            "D1",
            CellValue::Formula {
                text: "=A1>1".into(),
                cached_value: Some(Box::new(CellValue::Boolean(true))),
                array: None,
            },
        )
        .unwrap();

    let wb2 = roundtrip(&wb);
    let sheet2 = wb2.worksheet(0).unwrap();

    assert_eq!(sheet2.get_value("B1").unwrap(), CellValue::formula("=A1*2"));
    assert_eq!(
        sheet2.get_value("C1").unwrap(),
        CellValue::Formula {
            text: "=IF(A1>1,\"big\",\"small\")".into(),
            cached_value: Some(Box::new(CellValue::string("big"))),
            array: None,
        }
    );
    assert_eq!(
        sheet2.get_value("D1").unwrap(),
        CellValue::Formula {
            text: "=A1>1".into(),
            cached_value: Some(Box::new(CellValue::Boolean(true))),
            array: None,
        }
    );
}

#[test]
fn test_roundtrip_dates_need_a_date_format() {
    let date = NaiveDate::from_ymd_opt(2024, 2, 29)
        .unwrap()
        .and_hms_opt(13, 30, 0)
        .unwrap();

    let mut wb = Workbook::new();
    let sheet = wb.worksheet_mut(0).unwrap();
    sheet.set_cell_value("A1", date).unwrap();
    sheet
        .set_cell_style_at(0, 0, &Style::new().number_format("yyyy-mm-dd h:mm:ss"))
        .unwrap();
    sheet.set_cell_value("A2", date).unwrap();

    let wb2 = roundtrip(&wb);
    let sheet2 = wb2.worksheet(0).unwrap();

    assert_eq!(sheet2.get_value("A1").unwrap(), CellValue::DateTime(date));
    // Without a date format the serial comes back as a plain number
    assert!(matches!(sheet2.get_value("A2").unwrap(), CellValue::Number(_)));
}

#[test]
fn test_roundtrip_styles_and_layout() {
    let mut wb = Workbook::new();
    let sheet = wb.worksheet_mut(0).unwrap();

    let header = Style::new()
        .bold(true)
        .fill_color(Color::rgb(0xDD, 0xEE, 0xFF))
        .font_color(Color::RED);
    sheet.set_cell_value("A1", "Header").unwrap();
    sheet.set_cell_style_at(0, 0, &header).unwrap();
    // Style-only cell
    sheet.set_cell_style_at(4, 4, &header).unwrap();

    sheet.set_row_height(0, 30.0);
    sheet.set_row_hidden(7, true);
    sheet.set_column_width(1, 20.0);
    sheet.set_column_width(2, 20.0);
    sheet.set_column_hidden(5, true);
    sheet.merge_cells(&CellRange::parse("A10:C11").unwrap()).unwrap();

    let wb2 = roundtrip(&wb);
    let sheet2 = wb2.worksheet(0).unwrap();

    assert_eq!(sheet2.style_at(0, 0), &header);
    assert_eq!(sheet2.style_at(4, 4), &header);
    assert_eq!(sheet2.get_value_at(4, 4), CellValue::Empty);
    assert_eq!(sheet2.style_at(1, 0), &Style::default());

    assert_eq!(sheet2.row_height(0), 30.0);
    assert!(sheet2.is_row_hidden(7));
    assert!(!sheet2.is_row_hidden(6));
    assert_eq!(sheet2.column_width(1), 20.0);
    assert_eq!(sheet2.column_width(2), 20.0);
    assert!(sheet2.is_column_hidden(5));
    assert_eq!(
        sheet2.merged_regions(),
        &[CellRange::parse("A10:C11").unwrap()]
    );
}

#[test]
fn test_roundtrip_workbook_structure() {
    let mut wb = Workbook::new();
    wb.add_worksheet_with_name("Q1 & Q2").unwrap();
    wb.add_worksheet_with_name("Secret").unwrap();
    wb.worksheet_mut(2)
        .unwrap()
        .set_state(SheetState::VeryHidden);
    wb.set_active_sheet(1).unwrap();
    wb.add_defined_name(DefinedName {
        name: "TaxRate".into(),
        local_sheet_id: None,
        hidden: false,
        formula: "'Q1 & Q2'!$B$1".into(),
    });
    wb.add_defined_name(DefinedName {
        name: "_xlnm.Print_Area".into(),
        local_sheet_id: Some(1),
        hidden: true,
        formula: "'Q1 & Q2'!$A$1:$C$9".into(),
    });

    let wb2 = roundtrip(&wb);

    assert_eq!(wb2.sheet_names(), vec!["Sheet1", "Q1 & Q2", "Secret"]);
    assert_eq!(wb2.active_sheet(), 1);
    assert_eq!(wb2.worksheet(2).unwrap().state(), SheetState::VeryHidden);
    assert_eq!(wb2.worksheet(0).unwrap().state(), SheetState::Visible);
    assert_eq!(wb2.defined_names(), wb.defined_names());
}

#[test]
fn test_macro_project_follows_container_kind() {
    let payload = vec![0xD0, 0xCF, 0x11, 0xE0, 1, 2, 3];
    let mut wb = Workbook::new();
    wb.set_vba_project(Some(payload.clone()));

    let mut xlsm = Vec::new();
    XlsxWriter::write_as(&wb, Cursor::new(&mut xlsm), ContainerKind::Xlsm).unwrap();
    let read = XlsxReader::read(Cursor::new(&xlsm)).unwrap();
    assert_eq!(read.vba_project(), Some(payload.as_slice()));

    let mut archive = zip::ZipArchive::new(Cursor::new(&xlsm)).unwrap();
    let mut types = String::new();
    std::io::Read::read_to_string(
        &mut archive.by_name("[Content_Types].xml").unwrap(),
        &mut types,
    )
    .unwrap();
    assert!(types.contains(ContainerKind::Xlsm.workbook_content_type()));
    assert!(types.contains("/xl/vbaProject.bin"));

    let mut xlsx = Vec::new();
    XlsxWriter::write_as(&wb, Cursor::new(&mut xlsx), ContainerKind::Xlsx).unwrap();
    let read = XlsxReader::read(Cursor::new(&xlsx)).unwrap();
    assert_eq!(read.vba_project(), None);
}

#[test]
fn test_write_file_picks_kind_from_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("macros.XLSM");

    let mut wb = Workbook::new();
    wb.set_vba_project(Some(vec![1, 2, 3]));
    XlsxWriter::write_file(&wb, &path).unwrap();

    let read = XlsxReader::read_file(&path).unwrap();
    assert_eq!(read.vba_project(), Some(&[1u8, 2, 3][..]));
}

#[test]
fn test_read_shared_strings_and_shared_formulas() {
    let shared_strings = r#"<?xml version="1.0" encoding="UTF-8"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="3" uniqueCount="3">
  <si><t>plain</t></si>
  <si><r><rPr><b/></rPr><t>rich </t></r><r><t>text</t></r><rPh sb="0" eb="1"><t>ignored</t></rPh></si>
  <si><t xml:space="preserve"> spaced_x000D_ </t></si>
</sst>"#;
    let sheet = r#"<?xml version="1.0" encoding="UTF-8"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <sheetData>
    <row r="1">
      <c r="A1" t="s"><v>0</v></c>
      <c r="B1" t="s"><v>1</v></c>
      <c r="C1" t="s"><v>2</v></c>
    </row>
    <row r="2"><c r="A2"><v>1</v></c><c r="B2"><f t="shared" ref="B2:B4" si="0">A2*$C$1</f><v>0</v></c></row>
    <row r="3"><c r="A3"><v>2</v></c><c r="B3"><f t="shared" si="0"/><v>0</v></c></row>
    <row><c><v>3</v></c><c><f t="shared" si="0"/></c></row>
  </sheetData>
</worksheet>"#;

    let buf = package(&[
        ("[Content_Types].xml", CONTENT_TYPES),
        ("xl/workbook.xml", ONE_SHEET_WORKBOOK),
        ("xl/_rels/workbook.xml.rels", ONE_SHEET_RELS),
        ("xl/sharedStrings.xml", shared_strings),
        ("xl/worksheets/sheet1.xml", sheet),
    ]);
    let wb = XlsxReader::read(Cursor::new(&buf)).unwrap();
    let sheet = wb.worksheet_by_name("Data").unwrap();

    assert_eq!(sheet.get_value("A1").unwrap().as_string(), Some("plain"));
    assert_eq!(sheet.get_value("B1").unwrap().as_string(), Some("rich text"));
    assert_eq!(sheet.get_value("C1").unwrap().as_string(), Some(" spaced\r "));

    let formula = |addr: &str| {
        sheet
            .get_value(addr)
            .unwrap()
            .formula_text()
            .map(str::to_string)
    };
    assert_eq!(formula("B2").as_deref(), Some("=A2*$C$1"));
    assert_eq!(formula("B3").as_deref(), Some("=A3*$C$1"));
    // Row and cell without `r` continue from the previous ones
    assert_eq!(sheet.get_value("A4").unwrap(), CellValue::Number(3.0));
    assert_eq!(formula("B4").as_deref(), Some("=A4*$C$1"));
}

#[test]
fn test_read_builtin_date_format() {
    let styles = r#"<?xml version="1.0" encoding="UTF-8"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <cellXfs count="2">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>
    <xf numFmtId="14" fontId="0" fillId="0" borderId="0" applyNumberFormat="1"/>
  </cellXfs>
</styleSheet>"#;
    let sheet = r#"<?xml version="1.0" encoding="UTF-8"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <sheetData>
    <row r="1"><c r="A1" s="1"><v>45292</v></c><c r="B1"><v>45292</v></c></row>
  </sheetData>
</worksheet>"#;

    let buf = package(&[
        ("[Content_Types].xml", CONTENT_TYPES),
        ("xl/workbook.xml", ONE_SHEET_WORKBOOK),
        ("xl/_rels/workbook.xml.rels", ONE_SHEET_RELS),
        ("xl/styles.xml", styles),
        ("xl/worksheets/sheet1.xml", sheet),
    ]);
    let wb = XlsxReader::read(Cursor::new(&buf)).unwrap();
    let sheet = wb.worksheet(0).unwrap();

    assert_eq!(
        sheet.get_value("A1").unwrap(),
        CellValue::DateTime(
            NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        )
    );
    assert_eq!(sheet.get_value("B1").unwrap(), CellValue::Number(45292.0));
}

#[test]
fn test_rejects_non_containers() {
    assert!(XlsxReader::read(Cursor::new(b"not a zip".to_vec())).is_err());

    let buf = package(&[("xl/workbook.xml", ONE_SHEET_WORKBOOK)]);
    assert!(XlsxReader::read(Cursor::new(&buf)).is_err());
}

#[test]
fn test_roundtrip_sheet_annotations() {
    let mut wb = Workbook::new();
    wb.set_differential_formats(Some(
        r#"<dxfs count="1"><dxf><font><b/><color rgb="FFFF0000"/></font></dxf></dxfs>"#.into(),
    ));
    let sheet = wb.worksheet_mut(0).unwrap();
    sheet.set_cell_value("B2", 10.0).unwrap();

    let mut block = ConditionalFormat::new(vec![
        CellRange::parse("B2:B20").unwrap(),
        CellRange::parse("D2").unwrap(),
    ]);
    let mut rule = ConditionalFormatRule::new("cellIs", 1);
    rule.dxf_id = Some(0);
    rule.stop_if_true = true;
    rule.attributes.push(("operator".into(), "greaterThan".into()));
    rule.formulas.push("$F$1<>\"\"".into());
    block.rules.push(rule);
    sheet.add_conditional_format(block);

    let mut validation = DataValidation::new(ValidationType::List);
    validation.ranges.push(CellRange::parse("C2:C9").unwrap());
    validation.formula1 = Some("\"Yes,No\"".into());
    validation.allow_blank = true;
    validation.show_error_message = true;
    validation.error_style = ValidationErrorStyle::Warning;
    validation.error = Some("Pick one of <Yes, No>".into());
    sheet.add_data_validation(validation);

    let mut link = Hyperlink::external(
        CellRange::parse("A5").unwrap(),
        "https://example.com/?a=1&b=2",
    );
    link.tooltip = Some("Open".into());
    sheet.add_hyperlink(link);
    sheet.add_hyperlink(Hyperlink {
        range: CellRange::parse("B5").unwrap(),
        target: None,
        location: Some("Sheet1!A1".into()),
        display: Some("back".into()),
        tooltip: None,
    });

    sheet
        .set_comment("B2", CellComment::new("Ana", "Check\nthis").with_visible(true))
        .unwrap();
    sheet
        .set_comment("E7", CellComment::new("", "unsigned"))
        .unwrap();

    let wb2 = roundtrip(&wb);
    let (before, after) = (wb.worksheet(0).unwrap(), wb2.worksheet(0).unwrap());

    assert_eq!(after.conditional_formats(), before.conditional_formats());
    assert_eq!(after.data_validations(), before.data_validations());
    assert_eq!(after.hyperlinks(), before.hyperlinks());
    assert_eq!(after.comment_count(), 2);
    assert_eq!(after.comment("B2").unwrap(), before.comment("B2").unwrap());
    let unsigned = after.comment("E7").unwrap().unwrap();
    assert_eq!(unsigned.text, "unsigned");
    assert!(!unsigned.visible);
    assert_eq!(wb2.differential_formats(), wb.differential_formats());
}

#[test]
fn test_roundtrip_array_formula_extent() {
    let mut wb = Workbook::new();
    let sheet = wb.worksheet_mut(0).unwrap();
    for (i, addr) in ["A1", "A2", "A3"].iter().enumerate() {
        sheet.set_cell_value(addr, i as f64).unwrap();
    }
    sheet
        .set_cell_value(
            "B1",
            CellValue::array_formula("=A1:A3*2", CellRange::parse("B1:B3").unwrap()),
        )
        .unwrap();
    sheet
        .set_cell_value("C1", CellValue::formula("=SUM(A1:A3)"))
        .unwrap();

    let wb2 = roundtrip(&wb);
    let sheet2 = wb2.worksheet(0).unwrap();

    let b1 = sheet2.get_value("B1").unwrap();
    assert_eq!(b1.formula_text(), Some("=A1:A3*2"));
    assert_eq!(
        b1.array_extent(),
        Some(&ArrayFormula::new(CellRange::parse("B1:B3").unwrap()))
    );
    assert_eq!(sheet2.get_value("C1").unwrap().array_extent(), None);
}

#[test]
fn test_read_array_formula_attributes() {
    let sheet = r#"<?xml version="1.0" encoding="UTF-8"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <sheetData>
    <row r="1">
      <c r="A1"><f t="array" ref="A1:C1" aca="1">TRANSPOSE(E1:E3)</f><v>4</v></c>
      <c r="B1"><v>5</v></c>
      <c r="C1"><v>6</v></c>
    </row>
  </sheetData>
</worksheet>"#;
    let buf = package(&[
        ("[Content_Types].xml", CONTENT_TYPES),
        ("xl/workbook.xml", ONE_SHEET_WORKBOOK),
        ("xl/_rels/workbook.xml.rels", ONE_SHEET_RELS),
        ("xl/worksheets/sheet1.xml", sheet),
    ]);
    let wb = XlsxReader::read(Cursor::new(&buf)).unwrap();

    let mut out = Vec::new();
    XlsxWriter::write(&wb, Cursor::new(&mut out)).unwrap();
    let written = part_text(&out, "xl/worksheets/sheet1.xml");
    assert!(written.contains(r#"<f t="array" ref="A1:C1" aca="1">TRANSPOSE(E1:E3)</f>"#));

    let wb2 = XlsxReader::read(Cursor::new(&out)).unwrap();
    let a1 = wb2.worksheet(0).unwrap().get_value("A1").unwrap();
    let extent = a1.array_extent().unwrap();
    assert_eq!(extent.range, CellRange::parse("A1:C1").unwrap());
    assert!(extent.always_calculate);
    assert_eq!(
        wb2.worksheet(0).unwrap().get_value("C1").unwrap(),
        CellValue::Number(6.0)
    );
}

#[test]
fn test_unmodeled_worksheet_elements_survive_a_save() {
    let sheet = r#"<?xml version="1.0" encoding="UTF-8"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006" xmlns:x14ac="http://schemas.microsoft.com/office/spreadsheetml/2009/9/ac" mc:Ignorable="x14ac">
  <sheetPr><tabColor rgb="FF00B050"/></sheetPr>
  <dimension ref="A1:B2"/>
  <sheetViews><sheetView tabSelected="1" workbookViewId="0"><pane ySplit="1" topLeftCell="A2" activePane="bottomLeft" state="frozen"/></sheetView></sheetViews>
  <sheetFormatPr defaultRowHeight="15" x14ac:dyDescent="0.25"/>
  <sheetData>
    <row r="1"><c r="A1"><v>1</v></c></row>
    <row r="2"><c r="B2"><v>2</v></c></row>
  </sheetData>
  <sheetProtection sheet="1" objects="1" scenarios="1"/>
  <conditionalFormatting sqref="A1:A10">
    <cfRule type="colorScale" priority="1"><colorScale><cfvo type="min"/><cfvo type="max"/><color rgb="FFF8696B"/><color rgb="FF63BE7B"/></colorScale></cfRule>
  </conditionalFormatting>
  <dataValidations count="1">
    <dataValidation type="whole" operator="greaterThan" allowBlank="1" sqref="B1:B5"><formula1>0</formula1></dataValidation>
  </dataValidations>
  <pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/>
  <pageSetup paperSize="9" orientation="landscape" r:id="rId1"/>
  <drawing r:id="rId2"/>
</worksheet>"#;
    let buf = package(&[
        ("[Content_Types].xml", CONTENT_TYPES),
        ("xl/workbook.xml", ONE_SHEET_WORKBOOK),
        ("xl/_rels/workbook.xml.rels", ONE_SHEET_RELS),
        ("xl/worksheets/sheet1.xml", sheet),
    ]);
    let wb = XlsxReader::read(Cursor::new(&buf)).unwrap();
    let loaded = wb.worksheet(0).unwrap();

    let names: Vec<&str> = loaded.preserved().element_names().collect();
    assert_eq!(
        names,
        vec!["sheetPr", "sheetViews", "sheetProtection", "pageMargins", "pageSetup"]
    );
    assert_eq!(loaded.conditional_formats().len(), 1);
    assert!(loaded.conditional_formats()[0].rules[0]
        .extra_xml
        .starts_with("<colorScale>"));
    assert_eq!(loaded.data_validations()[0].sqref(), "B1:B5");

    let mut out = Vec::new();
    XlsxWriter::write(&wb, Cursor::new(&mut out)).unwrap();
    let written = part_text(&out, "xl/worksheets/sheet1.xml");

    assert!(written.contains(r#"mc:Ignorable="x14ac""#));
    assert!(written.contains(r#"<tabColor rgb="FF00B050"/>"#));
    assert!(written.contains(r#"state="frozen""#));
    assert!(!written.contains("tabSelected"));
    assert!(written.contains(r#"<pageSetup paperSize="9" orientation="landscape"/>"#));
    assert!(!written.contains("<drawing"));
    assert!(written.contains(r#"<cfvo type="min"/>"#));

    let order: Vec<usize> = [
        "<sheetPr",
        "<dimension",
        "<sheetViews",
        "<sheetFormatPr",
        "<sheetData",
        "<sheetProtection",
        "<conditionalFormatting",
        "<dataValidations",
        "<pageMargins",
        "<pageSetup",
    ]
    .iter()
    .map(|tag| written.find(tag).unwrap())
    .collect();
    assert!(order.windows(2).all(|w| w[0] < w[1]), "{}", written);

    let wb2 = XlsxReader::read(Cursor::new(&out)).unwrap();
    let reloaded = wb2.worksheet(0).unwrap();
    assert_eq!(reloaded.conditional_formats(), loaded.conditional_formats());
    assert_eq!(reloaded.data_validations(), loaded.data_validations());
    assert_eq!(reloaded.preserved(), loaded.preserved());
}

#[test]
fn test_read_comments_and_links_through_sheet_relationships() {
    let sheet = r#"<?xml version="1.0" encoding="UTF-8"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:rel="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheetData><row r="1"><c r="A1"><v>1</v></c></row></sheetData>
  <hyperlinks><hyperlink ref="A1" rel:id="rId3" display="docs"/></hyperlinks>
  <legacyDrawing rel:id="rId2"/>
</worksheet>"#;
    let rels = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/comments" Target="../comments7.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/vmlDrawing" Target="../drawings/vmlDrawing7.vml"/>
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.org/docs" TargetMode="External"/>
</Relationships>"#;
    let comments = r#"<?xml version="1.0" encoding="UTF-8"?>
<comments xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <authors><author>Reviewer</author></authors>
  <commentList>
    <comment ref="A1" authorId="0"><text><r><rPr><b/></rPr><t>Reviewer:</t></r><r><t xml:space="preserve"> check source</t></r></text></comment>
  </commentList>
</comments>"#;
    let vml = r#"<xml xmlns:v="urn:schemas-microsoft-com:vml" xmlns:x="urn:schemas-microsoft-com:office:excel">
 <v:shape><x:ClientData ObjectType="Note"><x:Row>0</x:Row><x:Column>0</x:Column><x:Visible/></x:ClientData></v:shape>
</xml>"#;
    let buf = package(&[
        ("[Content_Types].xml", CONTENT_TYPES),
        ("xl/workbook.xml", ONE_SHEET_WORKBOOK),
        ("xl/_rels/workbook.xml.rels", ONE_SHEET_RELS),
        ("xl/worksheets/sheet1.xml", sheet),
        ("xl/worksheets/_rels/sheet1.xml.rels", rels),
        ("xl/comments7.xml", comments),
        ("xl/drawings/vmlDrawing7.vml", vml),
    ]);
    let wb = XlsxReader::read(Cursor::new(&buf)).unwrap();
    let sheet = wb.worksheet(0).unwrap();

    let comment = sheet.comment("A1").unwrap().unwrap();
    assert_eq!(comment.author, "Reviewer");
    assert_eq!(comment.text, "Reviewer: check source");
    assert!(comment.visible);

    assert_eq!(sheet.hyperlinks().len(), 1);
    assert_eq!(
        sheet.hyperlinks()[0].target.as_deref(),
        Some("https://example.org/docs")
    );
    assert_eq!(sheet.hyperlinks()[0].display.as_deref(), Some("docs"));
    assert!(sheet.preserved().is_empty());
}
