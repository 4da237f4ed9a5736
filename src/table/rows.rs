use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::sheet::Row;
use crate::spreadsheet::sheet::Worksheet;
use tracing::debug;

/// A cell holds data unless it is null or whitespace-only text.
fn has_data(value: &CellValue) -> bool {
    match value {
        CellValue::Empty => false,
        CellValue::Text(text) => !text.trim().is_empty(),
        _ => true,
    }
}

/// Reads every row from `start_row` (1-based) to the last used row, skipping rows
/// without any data.
pub fn read_rows(sheet: &Worksheet, start_row: usize) -> Vec<Row> {
    let rows: Vec<Row> = sheet
        .iter_rows(start_row.max(1), None)
        .filter(|row| row.iter().any(has_data))
        .collect();
    debug!(sheet = sheet.name(), start_row, rows = rows.len(), "loaded data rows");
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_rows_are_skipped_and_order_kept() {
        let sheet = Worksheet::from_rows("Data", vec![
            vec![CellValue::from("Name"), CellValue::from("Status")],
            vec![CellValue::from("B"), CellValue::from("Open")],
            vec![CellValue::from(""), CellValue::from("   ")],
            vec![CellValue::Empty, CellValue::Number(0.0)],
            vec![CellValue::from("B"), CellValue::from("Open")],
        ]);

        let rows = read_rows(&sheet, 2);
        assert_eq!(rows, vec![
            vec![CellValue::from("B"), CellValue::from("Open")],
            vec![CellValue::Empty, CellValue::Number(0.0)],
            vec![CellValue::from("B"), CellValue::from("Open")],
        ]);
        assert!(read_rows(&sheet, 6).is_empty());
        assert_eq!(read_rows(&sheet, 0).len(), 4);
    }
}
