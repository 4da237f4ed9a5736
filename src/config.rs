//! Review files
//!
//! A review file describes one complete run in TOML: which sheet to read, the
//! exclusion rules to apply and where the surviving rows go.
//!
//! ```toml
//! source = "review.xlsx"
//! sheet = ["Tasks", "Sheet1"]
//!
//! [[rules]]
//! column = "Status"
//! equals = ["Open", "Draft"]
//!
//! [output]
//! sheet = "Filtered"
//! columns = ["Name", "Status"]
//! ```
//!
//! Relative paths are taken relative to the directory of the review file.
use crate::spreadsheet::selector::SheetSelector;
use crate::table::column::ColumnRef;
use crate::table::filter::RuleEntry;
use crate::table::filter::RuleError;
use crate::table::filter::RuleSet;
use crate::table::header::DEFAULT_SCAN_ROWS;
use crate::table::projection::filled_output_path;
use crate::table::projection::Destination;
use crate::table::projection::ProjectionSpec;
use crate::table::TableOptions;
use serde::Deserialize;
use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading a review file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read review file '{path}': {source}")]
    Read { path: String, source: std::io::Error },

    #[error("Failed to parse review file '{path}': {message}")]
    Parse { path: String, message: String },
}

fn default_scan_rows() -> usize {
    DEFAULT_SCAN_ROWS
}

fn default_start_cell() -> String {
    "A1".to_owned()
}

fn default_include_header() -> bool {
    true
}

/// A complete review run
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ReviewConfig {
    /// Workbook to review
    pub source: PathBuf,
    #[serde(default)]
    pub sheet: SheetSelector,
    /// 1-based header row; detected when absent
    #[serde(default)]
    pub header_row: Option<usize>,
    #[serde(default = "default_scan_rows")]
    pub scan_rows: usize,
    /// Exclusion rules in evaluation order
    #[serde(default)]
    pub rules: Vec<RuleEntry>,
    pub output: OutputConfig,
}

/// Where and what to write
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Destination workbook; `(filled) <source name>` next to the source when absent
    #[serde(default)]
    pub path: Option<PathBuf>,
    pub sheet: String,
    #[serde(default = "default_start_cell")]
    pub start_cell: String,
    #[serde(default = "default_include_header")]
    pub include_header: bool,
    pub columns: Vec<ColumnRef>,
}

impl ReviewConfig {
    /// Reads a review file and anchors its relative paths at the file's directory
    pub fn load<P: AsRef<Path>>(path: P) -> Result<ReviewConfig, ConfigError> {
        let path = path.as_ref();
        let name = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: name.to_owned(),
            source,
        })?;
        let mut config = ReviewConfig::from_toml_str(&content).map_err(|error| match error {
            ConfigError::Parse { message, .. } => ConfigError::Parse { path: name, message },
            other => other,
        })?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<ReviewConfig, ConfigError> {
        toml::from_str(content).map_err(|error| ConfigError::Parse {
            path: "<inline>".to_owned(),
            message: error.to_string(),
        })
    }

    fn resolve_paths(&mut self, base: &Path) {
        if self.source.is_relative() {
            self.source = base.join(&self.source);
        }
        if let Some(output) = self.output.path.as_mut() {
            if output.is_relative() {
                *output = base.join(&*output);
            }
        }
    }

    pub fn table_options(&self) -> TableOptions {
        TableOptions {
            sheet: self.sheet.clone(),
            header_row: self.header_row,
            scan_rows: self.scan_rows,
        }
    }

    /// Compiles the rules, failing on the first bad pattern
    pub fn rule_set(&self) -> Result<RuleSet, RuleError> {
        RuleSet::from_entries(self.rules.iter().cloned())
    }

    pub fn output_path(&self) -> PathBuf {
        self.output
            .path
            .clone()
            .unwrap_or_else(|| filled_output_path(&self.source))
    }

    pub fn projection_spec(&self) -> ProjectionSpec {
        let destination = Destination::new(self.output_path(), &self.output.sheet).at(&self.output.start_cell);
        ProjectionSpec::new(self.output.columns.iter().cloned(), destination).include_header(self.output.include_header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::filter::Mode;
    use pretty_assertions::assert_eq;

    const REVIEW: &str = r#"
        source = "input/review.xlsx"
        sheet = ["Tasks", "Sheet1"]
        header_row = 3

        [[rules]]
        column = "Status"
        equals = ["Open", "Draft"]

        [[rules]]
        column = 2
        empty = true
        mode = "and"

        [output]
        sheet = "Filtered"
        start_cell = "B2"
        columns = ["Name", 1]
    "#;

    #[test]
    fn parses_a_full_review() {
        let config = ReviewConfig::from_toml_str(REVIEW).unwrap();
        assert_eq!(
            config.sheet,
            SheetSelector::Candidates(vec!["Tasks".to_owned(), "Sheet1".to_owned()])
        );
        assert_eq!(config.table_options().header_row, Some(3));
        assert_eq!(config.table_options().scan_rows, DEFAULT_SCAN_ROWS);
        assert_eq!(config.rules.len(), 2);
        assert_eq!(config.rules[1].mode, Mode::And);
        assert_eq!(config.rule_set().unwrap().len(), 2);

        let spec = config.projection_spec();
        assert_eq!(spec.columns, vec![ColumnRef::from("Name"), ColumnRef::Index(1)]);
        assert!(spec.include_header);
        assert_eq!(spec.destination.start_cell, "B2");
        assert_eq!(spec.destination.path, PathBuf::from("input/(filled) review.xlsx"));
    }

    #[test]
    fn defaults_apply_when_omitted() {
        let config = ReviewConfig::from_toml_str(
            "source = \"a.xlsx\"\n[output]\nsheet = \"Out\"\npath = \"b.xlsx\"\ncolumns = [\"Name\"]\n",
        )
        .unwrap();
        assert_eq!(config.sheet, SheetSelector::Index(0));
        assert!(config.rules.is_empty());
        assert_eq!(config.output.start_cell, "A1");
        assert_eq!(config.output_path(), PathBuf::from("b.xlsx"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let error = ReviewConfig::from_toml_str(
            "source = \"a.xlsx\"\n[[rules]]\ncolumn = \"A\"\nstartswith = [\"x\"]\n[output]\nsheet = \"O\"\ncolumns = []\n",
        )
        .unwrap_err();
        assert!(error.to_string().contains("startswith"));
    }

    #[test]
    fn load_anchors_relative_paths() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("review.toml");
        std::fs::write(&path, REVIEW).unwrap();

        let config = ReviewConfig::load(&path).unwrap();
        assert_eq!(config.source, directory.path().join("input/review.xlsx"));
        assert_eq!(config.output_path(), directory.path().join("input/(filled) review.xlsx"));

        let error = ReviewConfig::load(directory.path().join("missing.toml")).unwrap_err();
        assert!(matches!(error, ConfigError::Read { .. }));
    }
}
