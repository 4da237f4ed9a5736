//! Header row detection and name resolution.
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::sheet::Worksheet;
use crate::table::TableError;
use std::collections::HashMap;
use tracing::debug;

/// Rows scanned for a header when none is given.
pub const DEFAULT_SCAN_ROWS: usize = 20;

/// The header row of a table and the lookup built from it.
#[derive(Clone, Debug, PartialEq)]
pub struct HeaderInfo {
    /// 1-based sheet row holding the header
    row_index: usize,
    /// Header labels as written, `""` for blank cells
    names: Vec<String>,
    /// Normalized label to 0-based column; later duplicates win
    name_to_index: HashMap<String, usize>,
}

impl HeaderInfo {
    pub fn new(row_index: usize, names: Vec<String>) -> Self {
        let name_to_index = names
            .iter()
            .enumerate()
            .map(|(index, name)| (normalize_header(name), index))
            .collect();
        HeaderInfo {
            row_index,
            names,
            name_to_index,
        }
    }

    pub fn row_index(&self) -> usize {
        self.row_index
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn name_to_index(&self) -> &HashMap<String, usize> {
        &self.name_to_index
    }

    /// Looks a label up after normalizing it
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(&normalize_header(name)).copied()
    }
}

/// Trims surrounding whitespace and lowercases.
pub fn normalize_header(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Header cells count as blank when null, empty or a single space.
pub(crate) fn is_blank(value: &CellValue) -> bool {
    match value {
        CellValue::Empty => true,
        CellValue::Text(text) => text.is_empty() || text == " ",
        _ => false,
    }
}

/// Finds the first of the top `scan_rows` rows holding at least two non-blank cells.
pub fn detect_header_row(sheet: &Worksheet, scan_rows: usize) -> Result<usize, TableError> {
    sheet
        .iter_rows(1, Some(scan_rows))
        .position(|row| row.iter().filter(|value| !is_blank(value)).count() >= 2)
        .map(|position| position + 1)
        .ok_or_else(|| TableError::HeaderNotFound {
            sheet: sheet.name().to_owned(),
            scan_rows,
        })
}

/// Builds the header from `header_row` (1-based) or from the detected header row.
pub fn build_header(sheet: &Worksheet, header_row: Option<usize>, scan_rows: usize) -> Result<HeaderInfo, TableError> {
    let row_index = match header_row {
        Some(row) => row,
        None => detect_header_row(sheet, scan_rows)?,
    };
    let row = sheet.row(row_index).ok_or_else(|| TableError::HeaderRowOutOfBounds {
        sheet: sheet.name().to_owned(),
        row: row_index,
        available: sheet.max_row(),
    })?;
    let names: Vec<String> = row.iter().map(ToString::to_string).collect();
    debug!(sheet = sheet.name(), row = row_index, columns = names.len(), "resolved header row");
    Ok(HeaderInfo::new(row_index, names))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(rows: Vec<Vec<&str>>) -> Worksheet {
        Worksheet::from_rows(
            "Data",
            rows.into_iter().map(|row| {
                row.into_iter().map(|text| {
                    if text.is_empty() {
                        CellValue::Empty
                    } else {
                        CellValue::from(text)
                    }
                })
            }),
        )
    }

    #[test]
    fn detects_first_row_with_two_filled_cells() {
        let sheet = sheet(vec![
            vec!["Quarterly report"],
            vec![" ", "Owner"],
            vec!["Name", "Status", ""],
            vec!["A", "Done"],
        ]);
        assert_eq!(detect_header_row(&sheet, DEFAULT_SCAN_ROWS).unwrap(), 3);
    }

    #[test]
    fn missing_header_names_sheet_and_window() {
        let sheet = sheet(vec![vec!["title"], vec![], vec!["Name", "Status"]]);
        let error = detect_header_row(&sheet, 2).unwrap_err();
        assert!(matches!(
            &error,
            TableError::HeaderNotFound { sheet, scan_rows: 2 } if sheet == "Data"
        ));
        assert_eq!(detect_header_row(&sheet, 3).unwrap(), 3);
    }

    #[test]
    fn later_duplicates_win_the_lookup() {
        let header = HeaderInfo::new(1, vec![
            " Name ".to_owned(),
            "STATUS".to_owned(),
            "".to_owned(),
            "status".to_owned(),
        ]);
        assert_eq!(header.index_of("name"), Some(0));
        assert_eq!(header.index_of("Status"), Some(3));
        assert_eq!(header.index_of(""), Some(2));
        assert_eq!(header.names()[1], "STATUS");
        assert_eq!(header.name_to_index().len(), 3);
    }

    #[test]
    fn normalization_is_idempotent() {
        for text in ["  Mixed Case  ", "ÜBER", "\tTabbed\n", "plain", ""] {
            let once = normalize_header(text);
            assert_eq!(normalize_header(&once), once);
        }
    }

    #[test]
    fn explicit_header_row_is_bounds_checked() {
        let sheet = sheet(vec![vec!["a", "b"], vec!["Name", "", "Status"]]);

        let header = build_header(&sheet, Some(2), DEFAULT_SCAN_ROWS).unwrap();
        assert_eq!(header.row_index(), 2);
        assert_eq!(header.names(), &["Name", "", "Status"]);

        for row in [0, 3] {
            let error = build_header(&sheet, Some(row), DEFAULT_SCAN_ROWS).unwrap_err();
            assert!(matches!(
                error,
                TableError::HeaderRowOutOfBounds { row: r, available: 2, .. } if r == row
            ));
        }
    }

    #[test]
    fn non_text_headers_are_stringified() {
        let sheet = Worksheet::from_rows("Data", vec![vec![CellValue::Number(2024.0), CellValue::Bool(true)]]);
        let header = build_header(&sheet, None, DEFAULT_SCAN_ROWS).unwrap();
        assert_eq!(header.names(), &["2024", "TRUE"]);
        assert_eq!(header.index_of("true"), Some(1));
    }
}
