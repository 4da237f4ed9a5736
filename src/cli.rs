//! Command-line argument definitions.

use clap::Args as ClapArgs;
use clap::Parser;
use clap::Subcommand;
use sheet_sieve::ColumnRef;
use sheet_sieve::SheetSelector;
use sheet_sieve::TableOptions;
use sheet_sieve::DEFAULT_COLUMN_LIMIT;
use sheet_sieve::DEFAULT_SCAN_ROWS;
use std::path::PathBuf;

/// Review spreadsheet tables: inspect headers, filter rows by rules, copy columns.
#[derive(Parser, Debug)]
#[command(name = "sheet-sieve")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the sheets of a workbook
    Sheets {
        /// Workbook (.xlsx or .xlsm)
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// List the header labels of a sheet
    Headers {
        #[command(flatten)]
        table: TableArgs,
    },

    /// Print the values of one column
    Column {
        #[command(flatten)]
        table: TableArgs,

        /// Header name, or `#N` for the 0-based column position
        #[arg(value_name = "COLUMN", value_parser = parse_column)]
        column: ColumnRef,

        /// Maximum number of values to print
        #[arg(long = "limit", default_value_t = DEFAULT_COLUMN_LIMIT)]
        limit: usize,

        /// Print the header label first
        #[arg(long = "include-header")]
        include_header: bool,
    },

    /// Filter and transfer rows as described by a review file
    Run {
        /// Review file (TOML)
        #[arg(value_name = "REVIEW")]
        config: PathBuf,
    },
}

/// Locates the table to inspect
#[derive(ClapArgs, Debug)]
pub struct TableArgs {
    /// Workbook (.xlsx or .xlsm)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Sheet name; repeat to give fallbacks tried in order
    #[arg(short = 's', long = "sheet", value_name = "NAME", conflicts_with = "sheet_index")]
    pub sheet: Vec<String>,

    /// 0-based sheet position
    #[arg(long = "sheet-index", value_name = "INDEX")]
    pub sheet_index: Option<usize>,

    /// 1-based header row; detected when omitted
    #[arg(long = "header-row", value_name = "ROW")]
    pub header_row: Option<usize>,

    /// Rows scanned when detecting the header
    #[arg(long = "scan-rows", value_name = "ROWS", default_value_t = DEFAULT_SCAN_ROWS)]
    pub scan_rows: usize,
}

impl TableArgs {
    pub fn options(&self) -> TableOptions {
        let sheet = match (self.sheet_index, self.sheet.as_slice()) {
            (Some(index), _) => SheetSelector::Index(index),
            (None, []) => SheetSelector::default(),
            (None, [name]) => SheetSelector::Name(name.to_owned()),
            (None, names) => SheetSelector::Candidates(names.to_vec()),
        };
        TableOptions {
            sheet,
            header_row: self.header_row,
            scan_rows: self.scan_rows,
        }
    }
}

fn parse_column(value: &str) -> Result<ColumnRef, String> {
    match value.strip_prefix('#') {
        Some(digits) if !digits.is_empty() && digits.chars().all(|digit| digit.is_ascii_digit()) => digits
            .parse::<usize>()
            .map(ColumnRef::Index)
            .map_err(|error| format!("invalid column position '{value}': {error}")),
        _ => Ok(ColumnRef::Name(value.to_owned())),
    }
}
