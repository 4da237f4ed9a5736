use thiserror::Error;

/// Main error type for the sheet_sieve crate.
/// Aggregates errors from the standard library, dependencies, and internal modules.
#[derive(Error, Debug)]
pub enum SheetSieveError {
    #[error("{0}")]
    WithContextError(String),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    #[error("{0}")]
    StringEncodingError(#[from] std::str::Utf8Error),

    // Third-party library errors
    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    // Helper module errors
    #[error("{0}")]
    XmlHelperError(#[from] crate::helpers::xml::XmlError),

    // Spreadsheet module errors
    #[error("{0}")]
    SpreadsheetError(#[from] crate::spreadsheet::SpreadsheetError),

    // Table module errors
    #[error("{0}")]
    TableError(#[from] crate::table::TableError),

    #[error("{0}")]
    RuleError(#[from] crate::table::filter::RuleError),

    #[error("{0}")]
    ConfigError(#[from] crate::config::ConfigError),
}

pub type Result<T, E = SheetSieveError> = std::result::Result<T, E>;

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, SheetSieveError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| SheetSieveError::WithContextError(format!("{}: {}", message, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableError;

    #[test]
    fn with_prefix_wraps_message() {
        let result: Result<()> = Err(TableError::ColumnNotFound {
            column: "Status".to_owned(),
            available: vec!["Name".to_owned()],
        }
        .into());
        let message = result.with_prefix("filter").unwrap_err().to_string();
        assert!(message.starts_with("filter: "));
        assert!(message.contains("'Status'"));
    }

    #[test]
    fn with_prefix_keeps_ok() {
        let result: Result<usize> = Ok(3);
        assert_eq!(result.with_prefix("ignored").unwrap(), 3);
    }
}
