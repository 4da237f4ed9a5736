//! sheet-sieve CLI entry point.

mod cli;

use crate::cli::Args;
use crate::cli::Command;
use crate::cli::TableArgs;
use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use sheet_sieve::inspect;
use sheet_sieve::spreadsheet::open_spreadsheet;
use sheet_sieve::spreadsheet::Spreadsheet;
use sheet_sieve::timed;
use sheet_sieve::ReviewConfig;
use sheet_sieve::Table;
use std::io;
use std::io::Write;
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so reports on stdout stay clean
    let filter = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(io::stderr)
        .init();

    let mut stdout = io::stdout().lock();
    match args.command {
        Command::Sheets { file } => {
            let workbook = open_spreadsheet(&file)
                .with_context(|| format!("Failed to open {}", file.display()))?;
            inspect::write_sheets(&workbook.sheet_names(), &mut stdout)?;
        }
        Command::Headers { table } => {
            let table = open_table(&table)?;
            inspect::write_headers(&table, &mut stdout)?;
        }
        Command::Column {
            table,
            column,
            limit,
            include_header,
        } => {
            let table = open_table(&table)?;
            inspect::write_column(&table, &column, Some(limit), include_header, &mut stdout)
                .with_context(|| format!("Failed to read column {column}"))?;
        }
        Command::Run { config } => run_review(&config, &mut stdout)?,
    }
    Ok(())
}

fn open_table(args: &TableArgs) -> Result<Table> {
    Table::open(&args.file, &args.options())
        .with_context(|| format!("Failed to open table in {}", args.file.display()))
}

fn run_review<W: Write>(path: &Path, out: &mut W) -> Result<()> {
    let config = ReviewConfig::load(path)?;
    let rules = config.rule_set()?;
    let spec = config.projection_spec();

    let written = timed("review", || {
        let table = Table::open(&config.source, &config.table_options())?;
        table.filter_and_transfer(&spec, &rules, None)
    })
    .with_context(|| format!("Review {} failed", path.display()))?;

    writeln!(
        out,
        "Wrote {} lines to {} [{}]",
        written,
        spec.destination.path.display(),
        spec.destination.sheet
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheet_sieve::CellValue;
    use sheet_sieve::Workbook;
    use sheet_sieve::Worksheet;

    #[test]
    fn review_summary_goes_to_the_report_sink() {
        let directory = tempfile::tempdir().unwrap();
        let mut source = Workbook::new();
        source.add_sheet(Worksheet::from_rows("Tasks", vec![
            vec![CellValue::from("Name"), CellValue::from("Status")],
            vec![CellValue::from("A"), CellValue::from("Done")],
            vec![CellValue::from("B"), CellValue::from("Open")],
        ]));
        source.save(directory.path().join("review.xlsx")).unwrap();
        let config = directory.path().join("review.toml");
        std::fs::write(
            &config,
            "source = \"review.xlsx\"\n[[rules]]\ncolumn = \"Status\"\nequals = [\"Open\"]\n[output]\nsheet = \"Kept\"\ncolumns = [\"Name\"]\n",
        )
        .unwrap();

        let mut out = Vec::new();
        run_review(&config, &mut out).unwrap();

        let report = String::from_utf8(out).unwrap();
        assert!(report.starts_with("Wrote 2 lines to "));
        assert!(report.trim_end().ends_with("[Kept]"));
        let written = Workbook::open(directory.path().join("(filled) review.xlsx")).unwrap();
        assert_eq!(written.sheet_names(), vec!["Kept"]);
    }
}
