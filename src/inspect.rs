//! Plain-text reports about a table, written to any [`Write`] sink.
use crate::error::SheetSieveError;
use crate::spreadsheet::cell::CellValue;
use crate::table::column::ColumnRef;
use crate::table::Table;
use std::io::Write;

/// Column dumps stop after this many values unless told otherwise.
pub const DEFAULT_COLUMN_LIMIT: usize = 20;

/// Numbered list of header labels.
pub fn write_headers<W: Write>(table: &Table, out: &mut W) -> Result<(), SheetSieveError> {
    writeln!(out, "Headers:")?;
    for (number, name) in table.headers().iter().enumerate() {
        writeln!(out, "[{:>2}] {}", number + 1, name)?;
    }
    Ok(())
}

/// Numbered list of a workbook's sheets.
pub fn write_sheets<W: Write>(sheet_names: &[String], out: &mut W) -> Result<(), SheetSieveError> {
    writeln!(out, "Sheets:")?;
    for (number, name) in sheet_names.iter().enumerate() {
        writeln!(out, "[{:>2}] {}", number + 1, name)?;
    }
    Ok(())
}

pub fn write_column<W: Write>(
    table: &Table,
    column: &ColumnRef,
    limit: Option<usize>,
    include_header: bool,
    out: &mut W,
) -> Result<(), SheetSieveError> {
    let values = table.column_values(column, include_header)?;
    let title = format!("Column: {:?}", column.to_string());
    writeln!(out, "{}", title)?;
    writeln!(out, "{}", "-".repeat(title.chars().count()))?;
    for (number, value) in values.iter().take(limit.unwrap_or(usize::MAX)).enumerate() {
        writeln!(out, "{:>5}: {}", number + 1, describe(value))?;
    }
    Ok(())
}

/// Quoted text for text cells, `None` for blanks, display text otherwise.
fn describe(value: &CellValue) -> String {
    match value {
        CellValue::Empty => "None".to_owned(),
        CellValue::Text(text) => format!("{:?}", text),
        value => value.to_string(),
    }
}
