use crate::spreadsheet::SpreadsheetError;
use serde::Deserialize;
use std::fmt::Display;

/// Chooses one worksheet out of a workbook.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SheetSelector {
    /// Zero-based position in workbook order
    Index(usize),
    /// Sheet name, matched case-insensitively
    Name(String),
    /// Ordered candidate names; the first one present wins
    Candidates(Vec<String>),
}

impl Default for SheetSelector {
    fn default() -> Self {
        SheetSelector::Index(0)
    }
}

impl SheetSelector {
    /// Resolves the selector to a zero-based sheet index.
    pub fn resolve(&self, names: &[String]) -> Result<usize, SpreadsheetError> {
        match self {
            SheetSelector::Index(index) if *index < names.len() => Ok(*index),
            SheetSelector::Index(index) => Err(SpreadsheetError::SheetIndexOutOfRange {
                index: *index,
                available: names.len(),
            }),
            SheetSelector::Name(name) => find_sheet(names, name).ok_or_else(|| self.not_found(names)),
            SheetSelector::Candidates(candidates) => candidates
                .iter()
                .find_map(|candidate| find_sheet(names, candidate))
                .ok_or_else(|| self.not_found(names)),
        }
    }

    fn not_found(&self, names: &[String]) -> SpreadsheetError {
        SpreadsheetError::SheetNotFound {
            requested: self.to_string(),
            available: names.to_vec(),
        }
    }
}

/// Case-insensitive lookup of a sheet name
pub(crate) fn find_sheet(names: &[String], name: &str) -> Option<usize> {
    let name = name.to_lowercase();
    names.iter().position(|candidate| candidate.to_lowercase() == name)
}

impl Display for SheetSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetSelector::Index(index) => write!(f, "#{}", index),
            SheetSelector::Name(name) => write!(f, "{}", name),
            SheetSelector::Candidates(candidates) => write!(f, "{}", candidates.join(" | ")),
        }
    }
}

impl From<&str> for SheetSelector {
    fn from(name: &str) -> Self {
        SheetSelector::Name(name.to_owned())
    }
}

impl From<usize> for SheetSelector {
    fn from(index: usize) -> Self {
        SheetSelector::Index(index)
    }
}
