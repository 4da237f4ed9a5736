use crate::error::SheetSieveError;
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::reference::parse_cell_reference;
use crate::spreadsheet::sheet::Row;
use crate::spreadsheet::workbook::Workbook;
use crate::table::column::ColumnRef;
use crate::table::header::HeaderInfo;
use crate::table::TableError;
use std::path::Path;
use std::path::PathBuf;
use tracing::info;

/// Prefix put in front of the source file name by [`filled_output_path`].
pub const FILLED_PREFIX: &str = "(filled) ";

/// Where a block of rows is written
#[derive(Clone, Debug, PartialEq)]
pub struct Destination {
    /// Workbook path; created when missing
    pub path: PathBuf,
    /// Sheet name, matched case-insensitively and created when missing
    pub sheet: String,
    /// Top-left cell of the block, `A1` style
    pub start_cell: String,
}

impl Destination {
    pub fn new<P: Into<PathBuf>>(path: P, sheet: &str) -> Self {
        Destination {
            path: path.into(),
            sheet: sheet.to_owned(),
            start_cell: "A1".to_owned(),
        }
    }

    pub fn at(mut self, start_cell: &str) -> Self {
        self.start_cell = start_cell.to_owned();
        self
    }
}

/// Which columns to copy, in output order, and where to
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectionSpec {
    pub columns: Vec<ColumnRef>,
    pub destination: Destination,
    pub include_header: bool,
}

impl ProjectionSpec {
    pub fn new<I, C>(columns: I, destination: Destination) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ColumnRef>,
    {
        ProjectionSpec {
            columns: columns.into_iter().map(Into::into).collect(),
            destination,
            include_header: true,
        }
    }

    pub fn include_header(mut self, include_header: bool) -> Self {
        self.include_header = include_header;
        self
    }
}

/// Builds the output block: the optional header line, then one line per row
/// holding the requested columns in the requested order.
pub fn project(header: &HeaderInfo, rows: &[Row], columns: &[ColumnRef], include_header: bool) -> Result<Vec<Row>, TableError> {
    let indexes = columns
        .iter()
        .map(|column| column.resolve(header))
        .collect::<Result<Vec<_>, _>>()?;

    let mut block = Vec::with_capacity(rows.len() + 1);
    if include_header {
        block.push(
            indexes
                .iter()
                .map(|index| header.names().get(*index).map(|name| CellValue::from(name.as_str())).unwrap_or_default())
                .collect(),
        );
    }
    block.extend(
        rows.iter()
            .map(|row| indexes.iter().map(|index| row.get(*index).cloned().unwrap_or_default()).collect()),
    );
    Ok(block)
}

/// Writes `rows` into the destination workbook and saves it.
///
/// The workbook is loaded when it exists and created otherwise. Only the cells
/// covered by the block change.
pub fn write_block_to(destination: &Destination, rows: &[Row]) -> Result<(), SheetSieveError> {
    let origin = parse_cell_reference(&destination.start_cell)?;
    let mut workbook = Workbook::open_or_create(&destination.path)?;
    workbook.ensure_sheet(&destination.sheet).write_block(origin, rows);
    workbook.save(&destination.path)?;
    info!(
        path = %destination.path.display(),
        sheet = destination.sheet.as_str(),
        start_cell = destination.start_cell.as_str(),
        rows = rows.len(),
        "wrote rows"
    );
    Ok(())
}

/// Output workbook placed next to `source`: `<dir>/(filled) <file name>`.
pub fn filled_output_path(source: &Path) -> PathBuf {
    let name = source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    source.with_file_name(format!("{FILLED_PREFIX}{name}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::selector::SheetSelector;
    use pretty_assertions::assert_eq;

    fn text(value: &str) -> CellValue {
        CellValue::from(value)
    }

    fn header() -> HeaderInfo {
        HeaderInfo::new(1, vec!["Name".to_owned(), "Status".to_owned(), "Owner".to_owned()])
    }

    #[test]
    fn projection_keeps_requested_order() {
        let rows = vec![
            vec![text("A"), text("Done"), text("ann")],
            vec![text("B")],
        ];
        let columns = vec![ColumnRef::from("owner"), ColumnRef::from("Name"), ColumnRef::from(7usize)];

        let block = project(&header(), &rows, &columns, true).unwrap();
        assert_eq!(block, vec![
            vec![text("Owner"), text("Name"), CellValue::Empty],
            vec![text("ann"), text("A"), CellValue::Empty],
            vec![CellValue::Empty, text("B"), CellValue::Empty],
        ]);

        let block = project(&header(), &rows, &columns[..1], false).unwrap();
        assert_eq!(block, vec![vec![text("ann")], vec![CellValue::Empty]]);
    }

    #[test]
    fn unknown_column_fails_before_writing() {
        let columns = vec![ColumnRef::from("Due")];
        assert!(matches!(
            project(&header(), &[], &columns, true),
            Err(TableError::ColumnNotFound { column, .. }) if column == "Due"
        ));
    }

    #[test]
    fn writes_into_existing_sheet_at_origin() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("dest.xlsx");
        let destination = Destination::new(&path, "Report");
        write_block_to(&destination, &[vec![text("a1"), text("b1")], vec![text("a2"), text("b2")]]).unwrap();

        let destination = Destination::new(&path, "REPORT").at("B2");
        write_block_to(&destination, &[vec![text("x")]]).unwrap();

        let workbook = Workbook::open(&path).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["Report"]);
        let sheet = workbook.sheet(&SheetSelector::from("report")).unwrap();
        assert_eq!(sheet.row(1), Some(vec![text("a1"), text("b1")]));
        assert_eq!(sheet.row(2), Some(vec![text("a2"), text("x")]));
    }

    #[test]
    fn invalid_origin_leaves_files_alone() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("dest.xlsx");
        let error = write_block_to(&Destination::new(&path, "Report").at("1A"), &[]).unwrap_err();
        assert!(error.to_string().contains("'1A'"));
        assert!(!path.exists());
    }

    #[test]
    fn filled_path_sits_next_to_source() {
        assert_eq!(
            filled_output_path(Path::new("/data/in/review.xlsx")),
            PathBuf::from("/data/in/(filled) review.xlsx")
        );
        assert_eq!(filled_output_path(Path::new("review.xlsx")), PathBuf::from("(filled) review.xlsx"));
    }
}
