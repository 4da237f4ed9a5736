//! Serializes worksheets into an xlsx package.
//! Values are written without formulas or formatting; dates and times get one of
//! three fixed number-format styles so they read back as dates.
use crate::error::SheetSieveError;
use crate::helpers::xml::XmlWriter;
use crate::helpers::zip::ZipWriterHelper;
use crate::spreadsheet::cell::datetime_to_serial;
use crate::spreadsheet::cell::time_to_serial;
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::sheet::Worksheet;
use std::io::Seek;
use std::io::Write;
use std::path::Path;
use zip::ZipWriter;

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_RELATIONSHIPS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PACKAGE_RELATIONSHIPS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const REL_OFFICE_DOCUMENT: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const REL_WORKSHEET: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
const REL_STYLES: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
const TYPE_WORKBOOK: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
const TYPE_MACRO_WORKBOOK: &str = "application/vnd.ms-excel.sheet.macroEnabled.main+xml";
const TYPE_WORKSHEET: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
const TYPE_STYLES: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";
const TYPE_RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";

// Cell style indexes, matching the order of `cellXfs` in styles.xml
const STYLE_DATE: &str = "1";
const STYLE_DATETIME: &str = "2";
const STYLE_TIME: &str = "3";

/// Package flavour, decided by the destination extension
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum PackageKind {
    /// `.xlsx`
    #[default]
    Workbook,
    /// `.xlsm`; Excel refuses the plain workbook content type under this extension
    MacroEnabled,
}

impl PackageKind {
    pub(crate) fn from_path(path: &Path) -> PackageKind {
        match path.extension().and_then(|extension| extension.to_str()) {
            Some(extension) if extension.eq_ignore_ascii_case("xlsm") => PackageKind::MacroEnabled,
            _ => PackageKind::Workbook,
        }
    }

    fn content_type(self) -> &'static str {
        match self {
            PackageKind::Workbook => TYPE_WORKBOOK,
            PackageKind::MacroEnabled => TYPE_MACRO_WORKBOOK,
        }
    }
}

/// Writes a complete workbook package holding `sheets` into `writer`
pub(crate) fn write_workbook<W: Write + Seek>(sheets: &[Worksheet], kind: PackageKind, writer: W) -> Result<W, SheetSieveError> {
    let mut zip = ZipWriter::new(writer);
    zip.add_part("[Content_Types].xml", &content_types(sheets.len(), kind)?)?;
    zip.add_part("_rels/.rels", &package_relationships()?)?;
    zip.add_part("xl/workbook.xml", &workbook(sheets)?)?;
    zip.add_part("xl/_rels/workbook.xml.rels", &workbook_relationships(sheets.len())?)?;
    zip.add_part("xl/styles.xml", &styles()?)?;
    for (index, sheet) in sheets.iter().enumerate() {
        zip.add_part(&format!("xl/worksheets/sheet{}.xml", index + 1), &worksheet(sheet)?)?;
    }
    Ok(zip.finish()?)
}

fn content_types(sheet_count: usize, kind: PackageKind) -> Result<Vec<u8>, SheetSieveError> {
    let mut xml = XmlWriter::new()?;
    xml.start("Types", &[("xmlns", NS_CONTENT_TYPES)])?;
    xml.empty("Default", &[("Extension", "rels"), ("ContentType", TYPE_RELATIONSHIPS)])?;
    xml.empty("Default", &[("Extension", "xml"), ("ContentType", "application/xml")])?;
    xml.empty("Override", &[("PartName", "/xl/workbook.xml"), ("ContentType", kind.content_type())])?;
    for number in 1..=sheet_count {
        let part = format!("/xl/worksheets/sheet{number}.xml");
        xml.empty("Override", &[("PartName", part.as_str()), ("ContentType", TYPE_WORKSHEET)])?;
    }
    xml.empty("Override", &[("PartName", "/xl/styles.xml"), ("ContentType", TYPE_STYLES)])?;
    xml.end("Types")?;
    Ok(xml.into_bytes())
}

fn package_relationships() -> Result<Vec<u8>, SheetSieveError> {
    let mut xml = XmlWriter::new()?;
    xml.start("Relationships", &[("xmlns", NS_PACKAGE_RELATIONSHIPS)])?;
    xml.empty("Relationship", &[("Id", "rId1"), ("Type", REL_OFFICE_DOCUMENT), ("Target", "xl/workbook.xml")])?;
    xml.end("Relationships")?;
    Ok(xml.into_bytes())
}

fn workbook(sheets: &[Worksheet]) -> Result<Vec<u8>, SheetSieveError> {
    let mut xml = XmlWriter::new()?;
    xml.start("workbook", &[("xmlns", NS_MAIN), ("xmlns:r", NS_RELATIONSHIPS)])?;
    xml.start("sheets", &[])?;
    for (index, sheet) in sheets.iter().enumerate() {
        let id = (index + 1).to_string();
        let relationship = format!("rId{id}");
        xml.empty("sheet", &[("name", sheet.name()), ("sheetId", id.as_str()), ("r:id", relationship.as_str())])?;
    }
    xml.end("sheets")?;
    xml.end("workbook")?;
    Ok(xml.into_bytes())
}

/// Worksheets take `rId1..=rIdN`, styles the id after them
fn workbook_relationships(sheet_count: usize) -> Result<Vec<u8>, SheetSieveError> {
    let mut xml = XmlWriter::new()?;
    xml.start("Relationships", &[("xmlns", NS_PACKAGE_RELATIONSHIPS)])?;
    for number in 1..=sheet_count {
        let id = format!("rId{number}");
        let target = format!("worksheets/sheet{number}.xml");
        xml.empty("Relationship", &[("Id", id.as_str()), ("Type", REL_WORKSHEET), ("Target", target.as_str())])?;
    }
    let id = format!("rId{}", sheet_count + 1);
    xml.empty("Relationship", &[("Id", id.as_str()), ("Type", REL_STYLES), ("Target", "styles.xml")])?;
    xml.end("Relationships")?;
    Ok(xml.into_bytes())
}

fn styles() -> Result<Vec<u8>, SheetSieveError> {
    let mut xml = XmlWriter::new()?;
    xml.start("styleSheet", &[("xmlns", NS_MAIN)])?;

    xml.start("fonts", &[("count", "1")])?;
    xml.start("font", &[])?;
    xml.empty("sz", &[("val", "11")])?;
    xml.empty("name", &[("val", "Calibri")])?;
    xml.end("font")?;
    xml.end("fonts")?;

    xml.start("fills", &[("count", "2")])?;
    for pattern in ["none", "gray125"] {
        xml.start("fill", &[])?;
        xml.empty("patternFill", &[("patternType", pattern)])?;
        xml.end("fill")?;
    }
    xml.end("fills")?;

    xml.start("borders", &[("count", "1")])?;
    xml.start("border", &[])?;
    for edge in ["left", "right", "top", "bottom", "diagonal"] {
        xml.empty(edge, &[])?;
    }
    xml.end("border")?;
    xml.end("borders")?;

    xml.start("cellStyleXfs", &[("count", "1")])?;
    xml.empty("xf", &[("numFmtId", "0"), ("fontId", "0"), ("fillId", "0"), ("borderId", "0")])?;
    xml.end("cellStyleXfs")?;

    // general, date (14), date-time (22), time (21)
    xml.start("cellXfs", &[("count", "4")])?;
    xml.empty("xf", &[("numFmtId", "0"), ("fontId", "0"), ("fillId", "0"), ("borderId", "0"), ("xfId", "0")])?;
    for format in ["14", "22", "21"] {
        xml.empty("xf", &[
            ("numFmtId", format),
            ("fontId", "0"),
            ("fillId", "0"),
            ("borderId", "0"),
            ("xfId", "0"),
            ("applyNumberFormat", "1"),
        ])?;
    }
    xml.end("cellXfs")?;

    xml.start("cellStyles", &[("count", "1")])?;
    xml.empty("cellStyle", &[("name", "Normal"), ("xfId", "0"), ("builtinId", "0")])?;
    xml.end("cellStyles")?;

    xml.end("styleSheet")?;
    Ok(xml.into_bytes())
}

fn worksheet(sheet: &Worksheet) -> Result<Vec<u8>, SheetSieveError> {
    let mut xml = XmlWriter::new()?;
    xml.start("worksheet", &[("xmlns", NS_MAIN), ("xmlns:r", NS_RELATIONSHIPS)])?;
    let dimension = match (sheet.max_row(), sheet.max_column()) {
        (0, _) | (_, 0) => "A1".to_owned(),
        (rows, columns) => format!("A1:{}", index_to_reference(rows - 1, columns - 1)),
    };
    xml.empty("dimension", &[("ref", dimension.as_str())])?;
    xml.start("sheetData", &[])?;

    let mut current_row = None::<usize>;
    for (row, col, value) in sheet.cells() {
        if current_row != Some(row) {
            if current_row.is_some() {
                xml.end("row")?;
            }
            xml.start("row", &[("r", (row + 1).to_string().as_str())])?;
            current_row = Some(row);
        }
        write_cell(&mut xml, &index_to_reference(row, col), value)?;
    }
    if current_row.is_some() {
        xml.end("row")?;
    }

    xml.end("sheetData")?;
    xml.end("worksheet")?;
    Ok(xml.into_bytes())
}

fn write_cell(xml: &mut XmlWriter, reference: &str, value: &CellValue) -> Result<(), SheetSieveError> {
    match value {
        CellValue::Empty => (),
        CellValue::Text(text) => {
            xml.start("c", &[("r", reference), ("t", "inlineStr")])?;
            xml.start("is", &[])?;
            xml.text_element("t", &[("xml:space", "preserve")], text)?;
            xml.end("is")?;
            xml.end("c")?;
        }
        CellValue::Number(number) => {
            xml.start("c", &[("r", reference)])?;
            xml.text_element("v", &[], &number.to_string())?;
            xml.end("c")?;
        }
        CellValue::Bool(flag) => {
            xml.start("c", &[("r", reference), ("t", "b")])?;
            xml.text_element("v", &[], if *flag { "1" } else { "0" })?;
            xml.end("c")?;
        }
        CellValue::Error(code) => {
            xml.start("c", &[("r", reference), ("t", "e")])?;
            xml.text_element("v", &[], code)?;
            xml.end("c")?;
        }
        CellValue::Date(date) => {
            let serial = date.and_hms_opt(0, 0, 0).map(datetime_to_serial).unwrap_or_default();
            write_serial(xml, reference, STYLE_DATE, serial)?;
        }
        CellValue::DateTime(datetime) => write_serial(xml, reference, STYLE_DATETIME, datetime_to_serial(*datetime))?,
        CellValue::Time(time) => write_serial(xml, reference, STYLE_TIME, time_to_serial(*time))?,
    }
    Ok(())
}

fn write_serial(xml: &mut XmlWriter, reference: &str, style: &str, serial: f64) -> Result<(), SheetSieveError> {
    xml.start("c", &[("r", reference), ("s", style)])?;
    xml.text_element("v", &[], &serial.to_string())?;
    xml.end("c")
}
