//! # Table Module
//!
//! Header-aware access to one worksheet. Opening a [`Table`] locates the header
//! row, after which columns can be addressed by header name (trimmed,
//! case-insensitive) or by 0-based position. Data rows are loaded on first use,
//! filtered with a [`filter::RuleSet`] and copied into other workbooks.
pub mod column;
pub mod filter;
pub mod header;
pub mod projection;
pub mod rows;

use crate::error::SheetSieveError;
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::open_spreadsheet;
use crate::spreadsheet::selector::SheetSelector;
use crate::spreadsheet::sheet::Row;
use crate::spreadsheet::sheet::Worksheet;
use crate::spreadsheet::Spreadsheet;
use crate::table::column::ColumnRef;
use crate::table::filter::RuleSet;
use crate::table::header::build_header;
use crate::table::header::HeaderInfo;
use crate::table::header::DEFAULT_SCAN_ROWS;
use crate::table::projection::project;
use crate::table::projection::write_block_to;
use crate::table::projection::Destination;
use crate::table::projection::ProjectionSpec;
use crate::table::rows::read_rows;
use std::cell::OnceCell;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Errors raised while resolving the header and columns of a table
#[derive(Error, Debug)]
pub enum TableError {
    #[error("No header row found in sheet '{sheet}': none of the first {scan_rows} rows has two filled cells")]
    HeaderNotFound { sheet: String, scan_rows: usize },

    #[error("Header row {row} is outside sheet '{sheet}' which has {available} row(s)")]
    HeaderRowOutOfBounds { sheet: String, row: usize, available: usize },

    #[error("Column '{column}' not found among headers {available:?}")]
    ColumnNotFound { column: String, available: Vec<String> },
}

/// How [`Table::value`] counts rows
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Addressing {
    /// 1 is the first data row after the header
    #[default]
    Relative,
    /// 1-based physical sheet row
    Absolute,
}

/// How a table is located inside its workbook
#[derive(Clone, Debug, PartialEq)]
pub struct TableOptions {
    pub sheet: SheetSelector,
    /// 1-based header row; detected when `None`
    pub header_row: Option<usize>,
    /// Rows scanned when detecting the header
    pub scan_rows: usize,
}

impl Default for TableOptions {
    fn default() -> Self {
        TableOptions {
            sheet: SheetSelector::default(),
            header_row: None,
            scan_rows: DEFAULT_SCAN_ROWS,
        }
    }
}

impl TableOptions {
    pub fn sheet<S: Into<SheetSelector>>(mut self, sheet: S) -> Self {
        self.sheet = sheet.into();
        self
    }

    pub fn header_row(mut self, header_row: usize) -> Self {
        self.header_row = Some(header_row);
        self
    }

    pub fn scan_rows(mut self, scan_rows: usize) -> Self {
        self.scan_rows = scan_rows;
        self
    }
}

/// One worksheet with its resolved header
#[derive(Debug)]
pub struct Table {
    /// Workbook the sheet was read from
    source: String,
    sheet_names: Vec<String>,
    sheet: Worksheet,
    header: HeaderInfo,
    /// Data rows, loaded on first access
    rows: OnceCell<Vec<Row>>,
}

impl Table {
    /// Opens the workbook at `path` and resolves the selected sheet's header
    pub fn open<P: AsRef<Path>>(path: P, options: &TableOptions) -> Result<Table, SheetSieveError> {
        let mut spreadsheet = open_spreadsheet(path)?;
        Table::from_spreadsheet(spreadsheet.as_mut(), options)
    }

    pub fn from_spreadsheet(spreadsheet: &mut dyn Spreadsheet, options: &TableOptions) -> Result<Table, SheetSieveError> {
        let sheet_names = spreadsheet.sheet_names();
        let index = options.sheet.resolve(&sheet_names)?;
        let sheet = spreadsheet.read_sheet(index)?;
        let header = build_header(&sheet, options.header_row, options.scan_rows)?;
        Ok(Table {
            source: spreadsheet.name(),
            sheet_names,
            sheet,
            header,
            rows: OnceCell::new(),
        })
    }

    /// Wraps a sheet that is already in memory; the selector in `options` is ignored
    pub fn from_worksheet(sheet: Worksheet, options: &TableOptions) -> Result<Table, TableError> {
        let header = build_header(&sheet, options.header_row, options.scan_rows)?;
        Ok(Table {
            source: String::new(),
            sheet_names: vec![sheet.name().to_owned()],
            sheet,
            header,
            rows: OnceCell::new(),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn sheet(&self) -> &Worksheet {
        &self.sheet
    }

    /// Sheet names of the source workbook
    pub fn sheet_names(&self) -> &[String] {
        &self.sheet_names
    }

    pub fn header(&self) -> &HeaderInfo {
        &self.header
    }

    pub fn headers(&self) -> &[String] {
        self.header.names()
    }

    pub fn indexed_headers(&self) -> Vec<(usize, &str)> {
        self.header.names().iter().map(String::as_str).enumerate().collect()
    }

    /// Non-blank rows after the header
    pub fn data_rows(&self) -> &[Row] {
        self.rows.get_or_init(|| read_rows(&self.sheet, self.header.row_index() + 1))
    }

    pub fn count_rows(&self) -> usize {
        self.data_rows().len()
    }

    pub fn column_index(&self, column: &ColumnRef) -> Result<usize, TableError> {
        column.resolve(&self.header)
    }

    /// Reads one value. Rows outside the table and columns past the end of a row
    /// read as `Empty`.
    pub fn value(&self, row_no: usize, column: &ColumnRef, addressing: Addressing) -> Result<CellValue, TableError> {
        let index = self.column_index(column)?;
        let value = match addressing {
            Addressing::Relative => row_no
                .checked_sub(1)
                .and_then(|position| self.data_rows().get(position))
                .and_then(|row| row.get(index))
                .cloned(),
            Addressing::Absolute => self.sheet.row(row_no).and_then(|row| row.get(index).cloned()),
        };
        Ok(value.unwrap_or_default())
    }

    /// All values of a column, preceded by its header text when requested
    pub fn column_values(&self, column: &ColumnRef, include_header: bool) -> Result<Vec<CellValue>, TableError> {
        let index = self.column_index(column)?;
        let mut values = Vec::with_capacity(self.count_rows() + 1);
        if include_header {
            values.push(self.header.names().get(index).map(|name| CellValue::from(name.as_str())).unwrap_or_default());
        }
        values.extend(self.data_rows().iter().map(|row| row.get(index).cloned().unwrap_or_default()));
        Ok(values)
    }

    /// Data rows no rule fires on
    pub fn filter(&self, rules: &RuleSet) -> Result<Vec<Row>, TableError> {
        rules.apply(self.data_rows(), &self.header)
    }

    /// Projects every data row and writes the block; returns the number of lines written
    pub fn copy_columns(&self, spec: &ProjectionSpec) -> Result<usize, SheetSieveError> {
        self.transfer_rows(spec, self.data_rows())
    }

    /// Copies the columns named by `headers`, in that order
    pub fn transfer_by_headers(&self, destination: &Destination, headers: &[&str], include_header: bool) -> Result<usize, SheetSieveError> {
        let spec = ProjectionSpec::new(headers.iter().copied(), destination.clone()).include_header(include_header);
        self.copy_columns(&spec)
    }

    /// Writes an arbitrary block of rows
    pub fn write_rows(&self, destination: &Destination, rows: &[Row]) -> Result<(), SheetSieveError> {
        write_block_to(destination, rows)
    }

    /// Filters `rows` (the data rows when `None`), then projects and writes the survivors
    pub fn filter_and_transfer(&self, spec: &ProjectionSpec, rules: &RuleSet, rows: Option<&[Row]>) -> Result<usize, SheetSieveError> {
        let rows = rows.unwrap_or_else(|| self.data_rows());
        let kept = rules.apply(rows, &self.header)?;
        info!(sheet = self.sheet.name(), rows = rows.len(), kept = kept.len(), "filtered table");
        self.transfer_rows(spec, &kept)
    }

    fn transfer_rows(&self, spec: &ProjectionSpec, rows: &[Row]) -> Result<usize, SheetSieveError> {
        let block = project(&self.header, rows, &spec.columns, spec.include_header)?;
        write_block_to(&spec.destination, &block)?;
        Ok(block.len())
    }
}
