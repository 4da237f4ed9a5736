use crate::spreadsheet::cell::CellValue;
use std::collections::BTreeMap;

/// One row of raw cell values, positionally aligned to columns starting at `A`.
pub type Row = Vec<CellValue>;

static EMPTY: CellValue = CellValue::Empty;

/// An in-memory worksheet: a sparse grid of cell values keyed by 0-based (row, col).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Worksheet {
    /// Sheet name as stored in the workbook
    name: String,
    /// Non-empty cells in row-major order
    cells: BTreeMap<(usize, usize), CellValue>,
    /// Highest row index ever written (0-based)
    row_upper_bound: Option<usize>,
    /// Highest column index ever written (0-based)
    col_upper_bound: Option<usize>,
}

impl Worksheet {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Self::default()
        }
    }

    /// Builds a sheet whose first row is sheet row 1.
    pub fn from_rows<R, C>(name: &str, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator<Item = CellValue>,
    {
        let mut sheet = Self::new(name);
        for (row, values) in rows.into_iter().enumerate() {
            for (col, value) in values.into_iter().enumerate() {
                sheet.set(row, col, value);
            }
        }
        sheet
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the cell at 0-based (row, col), `Empty` when unset.
    pub fn get(&self, row: usize, col: usize) -> &CellValue {
        self.cells.get(&(row, col)).unwrap_or(&EMPTY)
    }

    /// Sets the cell at 0-based (row, col); writing `Empty` clears the cell.
    pub fn set(&mut self, row: usize, col: usize, value: CellValue) {
        self.update_bound(row, col);
        if value.is_empty() {
            self.cells.remove(&(row, col));
        } else {
            self.cells.insert((row, col), value);
        }
    }

    fn update_bound(&mut self, row: usize, col: usize) {
        if self.row_upper_bound.map(|bound| bound < row).unwrap_or(true) {
            self.row_upper_bound = Some(row);
        }
        if self.col_upper_bound.map(|bound| bound < col).unwrap_or(true) {
            self.col_upper_bound = Some(col);
        }
    }

    /// Number of the last used row (1-based), 0 for a blank sheet.
    pub fn max_row(&self) -> usize {
        self.row_upper_bound.map(|bound| bound + 1).unwrap_or(0)
    }

    /// Number of the last used column (1-based), 0 for a blank sheet.
    pub fn max_column(&self) -> usize {
        self.col_upper_bound.map(|bound| bound + 1).unwrap_or(0)
    }

    /// Returns sheet row `row_number` (1-based) padded to the used width,
    /// or `None` outside `1..=max_row`.
    pub fn row(&self, row_number: usize) -> Option<Row> {
        if row_number == 0 || row_number > self.max_row() {
            return None;
        }
        let row = row_number - 1;
        Some((0..self.max_column()).map(|col| self.get(row, col).clone()).collect())
    }

    /// Iterates rows `min_row..=max_row` (1-based, inclusive), values only.
    /// `max_row` defaults to and is capped at the last used row.
    pub fn iter_rows(&self, min_row: usize, max_row: Option<usize>) -> impl Iterator<Item = Row> + '_ {
        let upper = max_row.unwrap_or(usize::MAX).min(self.max_row());
        (min_row.max(1)..=upper).filter_map(move |row_number| self.row(row_number))
    }

    /// Writes a block of rows with its top-left corner at 0-based `origin`.
    /// Cells outside the written rectangle are left untouched.
    pub fn write_block(&mut self, origin: (usize, usize), rows: &[Row]) {
        let (row_origin, col_origin) = origin;
        for (row_offset, values) in rows.iter().enumerate() {
            for (col_offset, value) in values.iter().enumerate() {
                self.set(row_origin + row_offset, col_origin + col_offset, value.clone());
            }
        }
    }

    /// Non-empty cells in row-major order.
    pub(crate) fn cells(&self) -> impl Iterator<Item = (usize, usize, &CellValue)> {
        self.cells.iter().map(|((row, col), value)| (*row, *col, value))
    }
}
