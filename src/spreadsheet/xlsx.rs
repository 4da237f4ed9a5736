use crate::error::ResultMessage;
use crate::error::SheetSieveError;
use crate::helpers::reader::UnifiedReader;
use crate::helpers::xml::XmlAttributeHelper;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlReader;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::serial_to_datetime;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::reference::reference_to_index;
use crate::spreadsheet::sheet::Worksheet;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;
use tracing::debug;
use zip::ZipArchive;

// XML tag names for parsing the xlsx package
const TAG_RELATIONSHIP: &[u8] = b"Relationship";
const TAG_CUSTOM_FORMATS: QName = QName(b"numFmts"); // Custom number formats container
const TAG_CUSTOM_FORMAT: QName = QName(b"numFmt");   // Individual custom number format
const TAG_FORMAT_INDEXES: QName = QName(b"cellXfs");  // Cell format indexes container
const TAG_FORMAT_INDEX: QName = QName(b"xf");         // Individual cell format index
const TAG_SHARED_STRING_ITEM: QName = QName(b"si");   // Shared string table item
const TAG_PHONETIC_TEXT: QName = QName(b"rPh");       // Phonetic text for Asian languages
const TAG_TEXT: QName = QName(b"t");                  // Text content within strings
const TAG_WORKBOOK_PROPERTIES: QName = QName(b"workbookPr");
const TAG_SHEET: QName = QName(b"sheet");
const TAG_ROW: QName = QName(b"row");
const TAG_CELL: QName = QName(b"c");
const TAG_INLINE_STRING: QName = QName(b"is");
const TAG_VALUE: QName = QName(b"v");

/// An xlsx/xlsm workbook opened for reading
pub(crate) struct XlsxSpreadsheet {
    /// Path the workbook was opened from
    name: String,
    /// ZIP archive containing the package parts
    zip: ZipArchive<UnifiedReader>,
    /// Worksheets as (name, zip_path) pairs in workbook order
    sheets: Vec<(String, String)>,
    /// Cell kind per style index, used to spot dates stored as serials
    number_formats: Vec<CellType>,
    /// Whether serials count from 1904-01-01
    is_1904: bool,
    shared_strings: Vec<String>,
}

impl XlsxSpreadsheet {
    pub(crate) fn open(path: &Path) -> Result<XlsxSpreadsheet, SheetSieveError> {
        let name = path.display().to_string();
        let reader = UnifiedReader::open(path).with_prefix(&name)?;
        Self::from_reader(&name, reader)
    }

    /// Parses the workbook structure, styles and shared strings up front
    pub(crate) fn from_reader(name: &str, reader: UnifiedReader) -> Result<XlsxSpreadsheet, SheetSieveError> {
        let mut zip = ZipArchive::new(reader)?;
        let (sheets, is_1904) = load_workbook(&mut zip)?;
        if sheets.is_empty() {
            Err(SpreadsheetError::EmptyWorkbook(name.to_owned()))?
        }
        let number_formats = load_number_formats(&mut zip)?;
        let shared_strings = load_shared_strings(&mut zip)?;
        debug!(workbook = name, sheets = sheets.len(), shared_strings = shared_strings.len(), "opened xlsx package");
        Ok(XlsxSpreadsheet {
            name: name.to_owned(),
            zip,
            sheets,
            number_formats,
            is_1904,
            shared_strings,
        })
    }
}

impl Spreadsheet for XlsxSpreadsheet {
    fn name(&self) -> String {
        self.name.to_owned()
    }

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.to_owned()).collect()
    }

    /// Parses one worksheet part into a grid of typed values.
    ///
    /// Cells carry their own `r` reference; rows and cells without one fall back to
    /// their position in the document.
    fn read_sheet(&mut self, index: usize) -> Result<Worksheet, SheetSieveError> {
        let (sheet_name, zip_path) = self.sheets.get(index).ok_or(SpreadsheetError::SheetIndexOutOfRange {
            index,
            available: self.sheets.len(),
        })?;
        let mut sheet = Worksheet::new(sheet_name);
        let mut row_count = 0usize;
        let mut col_count = 0usize;
        let mut row = 0usize;
        let mut col = 0usize;
        let mut kind = CellType::default();
        let mut value = String::new();
        let mut reader = self.zip.xml_reader(zip_path)?
            .ok_or_else(|| SpreadsheetError::FileError(zip_path.to_owned()))?;
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TAG_ROW => {
                if let Some(number) = event.parse_attribute_value::<usize>("r")? {
                    row_count = number.saturating_sub(1);
                }
                col_count = 0;
            }
            Event::End(event) if event.name() == TAG_ROW => {
                row_count += 1;
            }
            Event::Start(event) if event.name() == TAG_CELL => {
                (row, col) = event.get_attribute_value("r")?
                    .and_then(|reference| reference_to_index(&reference))
                    .unwrap_or((row_count, col_count));
                col_count = col + 1;
                kind = CellType::from_type_attribute(event.get_attribute_value("t")?.as_deref());
                if let Some(format_id) = event.get_attribute_value("s")? {
                    if kind == CellType::Number && !format_id.is_empty() {
                        let index = format_id.parse::<usize>()?;
                        kind = self.number_formats.get(index).copied().unwrap_or(CellType::Number);
                    }
                }
                value.clear();
            }
            Event::Start(event) if event.name() == TAG_INLINE_STRING => {
                value = read_string_value(&mut reader, TAG_INLINE_STRING, false)?;
            }
            Event::Start(event) if event.name() == TAG_VALUE => {
                value = read_string_value(&mut reader, TAG_VALUE, true)?;
            }
            Event::End(event) if !value.is_empty() && event.name() == TAG_CELL => {
                let cell = to_cell_value(kind, &value, &self.shared_strings, self.is_1904)
                    .map_err(|message| SpreadsheetError::InvalidCellValue {
                        sheet: sheet_name.to_owned(),
                        reference: index_to_reference(row, col),
                        message,
                    })?;
                sheet.set(row, col, cell);
                value.clear();
            }
        });
        debug!(sheet = sheet_name.as_str(), rows = sheet.max_row(), columns = sheet.max_column(), "read worksheet");
        Ok(sheet)
    }
}

/// Converts the raw text of a cell into a typed value
fn to_cell_value(kind: CellType, raw: &str, shared_strings: &[String], is_1904: bool) -> Result<CellValue, String> {
    let to_serial = || raw.trim().parse::<f64>().map_err(|_| format!("'{raw}' is not a number"));
    let to_datetime = |serial: f64| serial_to_datetime(serial, is_1904).ok_or_else(|| format!("'{raw}' is not a valid date serial"));
    let value = match kind {
        CellType::Empty => CellValue::Empty,
        CellType::Boolean => match raw.trim() {
            "1" | "true" | "TRUE" => CellValue::Bool(true),
            "0" | "false" | "FALSE" => CellValue::Bool(false),
            _ => return Err(format!("'{raw}' is not a boolean")),
        },
        CellType::Number => CellValue::Number(to_serial()?),
        CellType::NumberDate => CellValue::Date(to_datetime(to_serial()?)?.date()),
        CellType::NumberDateTime => CellValue::DateTime(to_datetime(to_serial()?)?),
        CellType::NumberTime => {
            let serial = to_serial()?;
            let datetime = to_datetime(serial)?;
            if (0.0..1.0).contains(&serial) {
                CellValue::Time(datetime.time())
            } else {
                CellValue::DateTime(datetime)
            }
        }
        CellType::IsoDateTime => parse_iso_datetime(raw),
        CellType::InlineString => CellValue::Text(raw.to_owned()),
        CellType::SharedString => {
            let index = raw.trim().parse::<usize>().map_err(|_| format!("'{raw}' is not a shared string index"))?;
            shared_strings
                .get(index)
                .map(|text| CellValue::Text(text.to_owned()))
                .ok_or_else(|| format!("shared string {index} out of range"))?
        }
        CellType::Error => CellValue::Error(raw.to_owned()),
    };
    Ok(value)
}

/// Parses `t="d"` cell content, keeping the text when no ISO shape matches
fn parse_iso_datetime(raw: &str) -> CellValue {
    let raw = raw.trim();
    if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        CellValue::DateTime(datetime)
    } else if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        CellValue::Date(date)
    } else if let Ok(time) = NaiveTime::parse_from_str(raw, "%H:%M:%S%.f") {
        CellValue::Time(time)
    } else {
        CellValue::Text(raw.to_owned())
    }
}

/// Loads worksheet names and part paths, and the date system of the workbook
fn load_workbook(zip: &mut ZipArchive<UnifiedReader>) -> Result<(Vec<(String, String)>, bool), SheetSieveError> {
    let relationships = load_relationships(zip, "xl/_rels/workbook.xml.rels")?;
    let mut reader = zip.xml_reader("xl/workbook.xml")?
        .ok_or_else(|| SpreadsheetError::FileError("xl/workbook.xml".to_string()))?;
    let mut sheets: Vec<(String, String)> = Vec::new();
    let mut is_1904 = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHEET => {
            let mut name = None::<Cow<str>>;
            let mut id = None::<Cow<str>>;
            for result in event.attributes() {
                let attribute = result?;
                let key = attribute.key.local_name();
                if key.as_ref() == b"name" {
                    name = Some(attribute.get_value()?);
                } else if key.as_ref() == b"id" {
                    id = Some(attribute.get_value()?);
                }
            }
            if let Some((name, id)) = name.zip(id) {
                if let Some(path) = relationships.get(id.as_ref()) {
                    sheets.push((name.to_string(), path.to_owned()));
                }
            }
        }
        Event::Start(event) if event.name() == TAG_WORKBOOK_PROPERTIES => {
            is_1904 = event.get_attribute_value("date1904")?
                .map(|value| value.eq("1") || value.eq("true"))
                .unwrap_or(false);
        }
    });
    Ok((sheets, is_1904))
}

/// Maps worksheet relationship ids to part paths
fn load_relationships(zip: &mut ZipArchive<UnifiedReader>, path: &str) -> Result<HashMap<String, String>, SheetSieveError> {
    let mut reader = zip.xml_reader(path)?
        .ok_or_else(|| SpreadsheetError::FileError(path.to_string()))?;
    let mut relationships: HashMap<String, String> = HashMap::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let id = event.get_attribute_value("Id")?;
            let kind = event.get_attribute_value("Type")?;
            let target = event.get_attribute_value("Target")?;
            if kind.map(|it| it.ends_with("/worksheet")).unwrap_or(true) {
                if let Some((id, target)) = id.zip(target) {
                    relationships.insert(id.to_string(), to_zip_path(&target));
                }
            }
        }
    });
    Ok(relationships)
}

/// Resolves a relationship target to a path inside the package
fn to_zip_path(path: &str) -> String {
    if let Some(path) = path.strip_prefix('/') {
        path.to_string()
    } else if path.starts_with("xl/") {
        path.to_string()
    } else {
        format!("xl/{path}")
    }
}

/// Loads the cell kind of every cell style from `xl/styles.xml`
fn load_number_formats(zip: &mut ZipArchive<UnifiedReader>) -> Result<Vec<CellType>, SheetSieveError> {
    let mut reader = match zip.xml_reader("xl/styles.xml")? {
        Some(reader) => reader,
        None => return Ok(Vec::new()),
    };

    let mut custom_formats_context = false;
    let mut custom_formats = HashMap::<String, CellType>::new();

    let mut format_indexes_context = false;
    let mut format_indexes = Vec::<String>::new();

    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_CUSTOM_FORMATS => custom_formats_context = true,
        Event::End(event) if event.name() == TAG_CUSTOM_FORMATS => custom_formats_context = false,
        Event::Start(event) if custom_formats_context && event.name() == TAG_CUSTOM_FORMAT => {
            let id = event.get_attribute_value("numFmtId")?;
            let format = event.get_attribute_value("formatCode")?;
            if let Some((id, format)) = id.zip(format) {
                custom_formats.insert(id.to_string(), CellType::parse_custom_number_format(&format));
            }
        }

        Event::Start(event) if event.name() == TAG_FORMAT_INDEXES => format_indexes_context = true,
        Event::End(event) if event.name() == TAG_FORMAT_INDEXES => format_indexes_context = false,
        Event::Start(event) if format_indexes_context && event.name() == TAG_FORMAT_INDEX => {
            let id = event.get_attribute_value("numFmtId")?;
            format_indexes.push(id.map(|id| id.to_string()).unwrap_or_default());
        }
    });

    Ok(format_indexes
        .iter()
        .map(|id| {
            custom_formats
                .get(id)
                .copied()
                .or_else(|| CellType::parse_builtin_number_format_id(id))
                .unwrap_or(CellType::Number)
        })
        .collect())
}

fn load_shared_strings(zip: &mut ZipArchive<UnifiedReader>) -> Result<Vec<String>, SheetSieveError> {
    let mut shared_strings = Vec::<String>::new();
    let mut reader = match zip.xml_reader("xl/sharedStrings.xml")? {
        Some(reader) => reader,
        None => return Ok(shared_strings),
    };
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHARED_STRING_ITEM => {
            shared_strings.push(read_string_value(&mut reader, TAG_SHARED_STRING_ITEM, false)?);
        }
    });
    Ok(shared_strings)
}

/// Reads string content up to `end_tag`, skipping phonetic annotations.
/// With `is_text_content` the element body itself is the text; otherwise only
/// nested `<t>` runs are collected.
fn read_string_value<R: BufRead>(
    reader: &mut XmlReader<R>,
    end_tag: QName,
    is_text_content: bool,
) -> Result<String, SheetSieveError> {
    let mut is_phonetic_text = false;
    let mut is_text = is_text_content;
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.name() == end_tag => break,
        Event::Start(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = true,
        Event::End(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = false,
        Event::Start(event) if !is_phonetic_text && event.name() == TAG_TEXT => is_text = true,
        Event::End(event) if is_text && event.name() == TAG_TEXT => is_text = false,
        Event::Text(event) if is_text => text.push_bytes_text(&event)?,
        Event::CData(event) if is_text => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if is_text => text.push_bytes_ref(&event)?,
    });
    Ok(text)
}
