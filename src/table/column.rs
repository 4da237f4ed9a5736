use crate::table::header::HeaderInfo;
use crate::table::TableError;
use serde::Deserialize;
use std::fmt::Display;

/// Addresses a column by header name or by 0-based position.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq)]
#[serde(untagged)]
pub enum ColumnRef {
    Index(usize),
    Name(String),
}

impl ColumnRef {
    /// Resolves to a 0-based column index.
    /// Positions pass through unchecked; names must exist in the header.
    pub fn resolve(&self, header: &HeaderInfo) -> Result<usize, TableError> {
        match self {
            ColumnRef::Index(index) => Ok(*index),
            ColumnRef::Name(name) => header.index_of(name).ok_or_else(|| TableError::ColumnNotFound {
                column: name.to_owned(),
                available: header.names().to_vec(),
            }),
        }
    }
}

impl Display for ColumnRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnRef::Index(index) => write!(f, "#{}", index),
            ColumnRef::Name(name) => write!(f, "{}", name),
        }
    }
}

impl From<&str> for ColumnRef {
    fn from(name: &str) -> Self {
        ColumnRef::Name(name.to_owned())
    }
}

impl From<String> for ColumnRef {
    fn from(name: String) -> Self {
        ColumnRef::Name(name)
    }
}

impl From<usize> for ColumnRef {
    fn from(index: usize) -> Self {
        ColumnRef::Index(index)
    }
}
