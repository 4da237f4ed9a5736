//! # sheet_sieve
//!
//! Header-aware review of spreadsheet tables.
//!
//! ## Features
//!
//! - **Header detection**: the first row near the top of a sheet holding at
//!   least two non-blank cells becomes the header, or an explicit 1-based row is used
//! - **Column addressing**: by trimmed, case-insensitive header name or by
//!   0-based position
//! - **Exclusion rules**: per-column `equals`, `not_equals`, `contains`, `regex`
//!   and `empty` clauses combined with OR or AND; a row matching any rule is dropped
//! - **Projection**: selected columns are written in the requested order into a
//!   sheet of another workbook, created when missing
//! - **Review files**: one TOML file describes a whole run
//! - **Pure Rust xlsx support**: a streaming OOXML reader and a minimal writer
//!
//! ## Example
//!
//! ```no_run
//! use sheet_sieve::{Destination, ProjectionSpec, RuleSet, RuleSpec, Table, TableOptions};
//!
//! # fn main() -> Result<(), sheet_sieve::SheetSieveError> {
//! let table = Table::open("review.xlsx", &TableOptions::default().sheet("Tasks"))?;
//! let rules = RuleSet::new().with_rule("Status", RuleSpec::default().equals(["Done"]))?;
//! let spec = ProjectionSpec::new(["Name", "Owner"], Destination::new("out.xlsx", "Open"));
//! table.filter_and_transfer(&spec, &rules, None)?;
//! # Ok(())
//! # }
//! ```
pub mod config;
pub mod error;
pub mod helpers;
pub mod inspect;
pub mod spreadsheet;
pub mod table;

pub use crate::config::ReviewConfig;
pub use crate::error::SheetSieveError;
pub use crate::helpers::timing::timed;
pub use crate::inspect::DEFAULT_COLUMN_LIMIT;
pub use crate::spreadsheet::cell::CellValue;
pub use crate::spreadsheet::selector::SheetSelector;
pub use crate::spreadsheet::sheet::Row;
pub use crate::spreadsheet::sheet::Worksheet;
pub use crate::spreadsheet::workbook::Workbook;
pub use crate::table::column::ColumnRef;
pub use crate::table::filter::Mode;
pub use crate::table::filter::RuleSet;
pub use crate::table::filter::RuleSpec;
pub use crate::table::header::DEFAULT_SCAN_ROWS;
pub use crate::table::projection::filled_output_path;
pub use crate::table::projection::Destination;
pub use crate::table::projection::ProjectionSpec;
pub use crate::table::Addressing;
pub use crate::table::Table;
pub use crate::table::TableOptions;
