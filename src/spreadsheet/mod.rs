//! # Spreadsheet Module
//!
//! In-memory worksheets backed by a native OOXML (.xlsx, .xlsm) reader and writer.
//! Sheets are addressed by name, index or a list of candidate names, read into a
//! sparse [`Worksheet`] grid, edited in place and saved back as a whole workbook.
pub mod cell;
pub mod reference;
pub mod selector;
pub mod sheet;
pub mod workbook;
mod writer;
mod xlsx;

use crate::error::SheetSieveError;
use crate::spreadsheet::sheet::Worksheet;
use crate::spreadsheet::xlsx::XlsxSpreadsheet;
use std::path::Path;
use thiserror::Error;

/// Errors raised while locating, reading or writing spreadsheet data
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("Sheet '{requested}' not found, available sheets: {available:?}")]
    SheetNotFound { requested: String, available: Vec<String> },

    #[error("Sheet index {index} out of range, workbook has {available} sheet(s)")]
    SheetIndexOutOfRange { index: usize, available: usize },

    #[error("Unsupported spreadsheet format '{0}', expected .xlsx or .xlsm")]
    UnsupportedFormat(String),

    #[error("Missing '{0}' in spreadsheet package")]
    FileError(String),

    #[error("Workbook '{0}' has no sheets")]
    EmptyWorkbook(String),

    #[error("Invalid cell value at '{sheet}'!{reference}: {message}")]
    InvalidCellValue { sheet: String, reference: String, message: String },

    #[error("Invalid cell reference '{0}'")]
    InvalidCellReference(String),
}

/// A readable workbook source
pub trait Spreadsheet {
    /// Returns the path or name the workbook was opened from
    fn name(&self) -> String;

    /// Returns the worksheet names in workbook order
    fn sheet_names(&self) -> Vec<String>;

    /// Reads the worksheet at the zero-based `index`
    fn read_sheet(&mut self, index: usize) -> Result<Worksheet, SheetSieveError>;
}

/// Checks the file extension against the supported OOXML workbook family
pub(crate) fn ensure_supported_format(path: &Path) -> Result<(), SpreadsheetError> {
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| extension.to_ascii_lowercase());
    match extension.as_deref() {
        Some("xlsx") | Some("xlsm") => Ok(()),
        _ => Err(SpreadsheetError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Opens a workbook for reading, dispatching on its file extension
pub fn open_spreadsheet<P: AsRef<Path>>(path: P) -> Result<Box<dyn Spreadsheet>, SheetSieveError> {
    let path = path.as_ref();
    ensure_supported_format(path)?;
    Ok(Box::new(XlsxSpreadsheet::open(path)?))
}
