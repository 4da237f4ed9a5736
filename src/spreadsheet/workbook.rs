use crate::error::ResultMessage;
use crate::error::SheetSieveError;
use crate::helpers::reader::UnifiedReader;
use crate::spreadsheet::ensure_supported_format;
use crate::spreadsheet::open_spreadsheet;
use crate::spreadsheet::selector::find_sheet;
use crate::spreadsheet::selector::SheetSelector;
use crate::spreadsheet::sheet::Worksheet;
use crate::spreadsheet::writer::write_workbook;
use crate::spreadsheet::writer::PackageKind;
use crate::spreadsheet::xlsx::XlsxSpreadsheet;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use std::fs::File;
use std::io::BufWriter;
use std::io::Cursor;
use std::io::Write;
use std::path::Path;
use tracing::debug;
use tracing::info;

/// A fully loaded, editable workbook.
///
/// Every sheet is held in memory; [`Workbook::save`] rewrites the whole package.
#[derive(Clone, Debug, Default)]
pub struct Workbook {
    sheets: Vec<Worksheet>,
}

impl Workbook {
    /// Creates a workbook without sheets
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every sheet of an existing workbook
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Workbook, SheetSieveError> {
        let mut spreadsheet = open_spreadsheet(path)?;
        Workbook::load(spreadsheet.as_mut())
    }

    /// Loads every sheet of xlsx bytes held in memory
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Workbook, SheetSieveError> {
        let mut spreadsheet = XlsxSpreadsheet::from_reader("<memory>", UnifiedReader::from_bytes(bytes))?;
        Workbook::load(&mut spreadsheet)
    }

    fn load(spreadsheet: &mut dyn Spreadsheet) -> Result<Workbook, SheetSieveError> {
        let sheets = (0..spreadsheet.sheet_names().len())
            .map(|index| spreadsheet.read_sheet(index))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Workbook { sheets })
    }

    /// Loads the workbook at `path` when it exists, otherwise starts an empty one
    pub fn open_or_create<P: AsRef<Path>>(path: P) -> Result<Workbook, SheetSieveError> {
        let path = path.as_ref();
        if path.exists() {
            Workbook::open(path)
        } else {
            ensure_supported_format(path)?;
            debug!(path = %path.display(), "creating new workbook");
            Ok(Workbook::new())
        }
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|sheet| sheet.name().to_owned()).collect()
    }

    pub fn sheets(&self) -> &[Worksheet] {
        &self.sheets
    }

    pub fn sheet(&self, selector: &SheetSelector) -> Result<&Worksheet, SpreadsheetError> {
        let index = selector.resolve(&self.sheet_names())?;
        Ok(&self.sheets[index])
    }

    /// Returns the sheet matching `name` case-insensitively, creating it with the
    /// exact given name when absent.
    pub fn ensure_sheet(&mut self, name: &str) -> &mut Worksheet {
        let index = match find_sheet(&self.sheet_names(), name) {
            Some(index) => index,
            None => {
                debug!(sheet = name, "creating sheet");
                self.sheets.push(Worksheet::new(name));
                self.sheets.len() - 1
            }
        };
        &mut self.sheets[index]
    }

    /// Appends a sheet, replacing any sheet with the same name (case-insensitive)
    pub fn add_sheet(&mut self, sheet: Worksheet) {
        match find_sheet(&self.sheet_names(), sheet.name()) {
            Some(index) => self.sheets[index] = sheet,
            None => self.sheets.push(sheet),
        }
    }

    /// Writes the whole workbook to `path`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SheetSieveError> {
        let path = path.as_ref();
        let name = path.display().to_string();
        ensure_supported_format(path)?;
        if self.sheets.is_empty() {
            Err(SpreadsheetError::EmptyWorkbook(name.to_owned()))?
        }
        let file = File::create(path).map_err(SheetSieveError::from).with_prefix(&name)?;
        let mut writer = write_workbook(&self.sheets, PackageKind::from_path(path), BufWriter::new(file))?;
        writer.flush()?;
        info!(path = %name, sheets = self.sheets.len(), "saved workbook");
        Ok(())
    }

    /// Serializes the workbook into xlsx bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, SheetSieveError> {
        if self.sheets.is_empty() {
            Err(SpreadsheetError::EmptyWorkbook("<memory>".to_owned()))?
        }
        Ok(write_workbook(&self.sheets, PackageKind::default(), Cursor::new(Vec::new()))?.into_inner())
    }
}

impl Spreadsheet for Workbook {
    fn name(&self) -> String {
        "<memory>".to_owned()
    }

    fn sheet_names(&self) -> Vec<String> {
        Workbook::sheet_names(self)
    }

    fn read_sheet(&mut self, index: usize) -> Result<Worksheet, SheetSieveError> {
        let available = self.sheets.len();
        let sheet = self.sheets
            .get(index)
            .ok_or(SpreadsheetError::SheetIndexOutOfRange { index, available })?;
        Ok(sheet.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::cell::CellValue;
    use chrono::NaiveDate;
    use chrono::NaiveTime;
    use pretty_assertions::assert_eq;

    fn sample() -> Workbook {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let mut workbook = Workbook::new();
        workbook.add_sheet(Worksheet::from_rows("Tasks", vec![
            vec![CellValue::from("Name"), CellValue::from("Due"), CellValue::from("Done")],
            vec![CellValue::from("A & B"), CellValue::Date(date), CellValue::Bool(true)],
            vec![
                CellValue::Number(7.25),
                CellValue::DateTime(date.and_hms_opt(9, 15, 0).unwrap()),
                CellValue::Time(NaiveTime::from_hms_opt(18, 0, 0).unwrap()),
            ],
            vec![CellValue::Empty, CellValue::Error("#DIV/0!".to_owned()), CellValue::from(" padded ")],
        ]));
        workbook.add_sheet(Worksheet::new("Empty"));
        workbook
    }

    #[test]
    fn saved_bytes_read_back_identically() {
        let workbook = sample();
        let bytes = workbook.to_bytes().unwrap();
        let mut spreadsheet = XlsxSpreadsheet::from_reader("memory.xlsx", UnifiedReader::from_bytes(bytes.clone())).unwrap();

        assert_eq!(spreadsheet.sheet_names(), vec!["Tasks", "Empty"]);
        assert_eq!(spreadsheet.read_sheet(0).unwrap(), workbook.sheets()[0]);
        assert_eq!(spreadsheet.read_sheet(1).unwrap().max_row(), 0);

        let reloaded = Workbook::from_bytes(bytes).unwrap();
        assert_eq!(reloaded.sheet_names(), vec!["Tasks", "Empty"]);
        assert_eq!(reloaded.sheets()[0], workbook.sheets()[0]);
    }

    #[test]
    fn ensure_sheet_matches_case_insensitively() {
        let mut workbook = sample();
        workbook.ensure_sheet("tasks").set(9, 0, CellValue::from("x"));
        assert_eq!(workbook.sheet_names(), vec!["Tasks", "Empty"]);
        assert_eq!(workbook.sheet(&SheetSelector::from("TASKS")).unwrap().max_row(), 10);

        workbook.ensure_sheet("Filtered");
        assert_eq!(workbook.sheet_names(), vec!["Tasks", "Empty", "Filtered"]);
    }

    #[test]
    fn save_and_reopen_through_the_file_system() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("out.xlsx");

        let mut workbook = Workbook::open_or_create(&path).unwrap();
        assert!(workbook.sheet_names().is_empty());
        workbook.ensure_sheet("Result").set(0, 0, CellValue::from("ok"));
        workbook.save(&path).unwrap();

        let reopened = Workbook::open_or_create(&path).unwrap();
        assert_eq!(reopened.sheet_names(), vec!["Result"]);
        assert_eq!(reopened.sheets()[0].get(0, 0), &CellValue::from("ok"));
    }

    #[test]
    fn macro_enabled_destinations_keep_their_flavour() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("out.xlsm");
        sample().save(&path).unwrap();

        let mut archive = zip::ZipArchive::new(File::open(&path).unwrap()).unwrap();
        let mut content_types = String::new();
        std::io::Read::read_to_string(&mut archive.by_name("[Content_Types].xml").unwrap(), &mut content_types).unwrap();
        assert!(content_types.contains("application/vnd.ms-excel.sheet.macroEnabled.main+xml"));

        assert_eq!(Workbook::open(&path).unwrap().sheet_names(), vec!["Tasks", "Empty"]);
    }

    #[test]
    fn empty_workbooks_and_foreign_formats_are_refused() {
        let directory = tempfile::tempdir().unwrap();
        let error = Workbook::new().save(directory.path().join("empty.xlsx")).unwrap_err();
        assert!(matches!(error, SheetSieveError::SpreadsheetError(SpreadsheetError::EmptyWorkbook(_))));

        let error = sample().save(directory.path().join("out.csv")).unwrap_err();
        assert!(matches!(error, SheetSieveError::SpreadsheetError(SpreadsheetError::UnsupportedFormat(_))));
        assert!(Workbook::open_or_create(directory.path().join("new.ods")).is_err());
    }
}
