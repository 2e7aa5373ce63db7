//! Upload parse errors.

use thiserror::Error;

/// Anything that stops an uploaded file from becoming a workbook.
///
/// Missing sheets and missing cells are not errors; they default to zero or
/// empty values during extraction.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("unsupported file type '{0}', upload a .xlsx, .xls or .csv file")]
    UnsupportedExtension(String),

    #[error("file is not a recognized spreadsheet or CSV document")]
    UnrecognizedFormat,

    #[error("could not open spreadsheet: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("could not read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("could not read file: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn unsupported_extension_names_the_extension() {
        let err = ParseError::UnsupportedExtension("pdf".to_string());
        assert_eq!(
            err.to_string(),
            "unsupported file type 'pdf', upload a .xlsx, .xls or .csv file"
        );
    }

    #[test]
    fn io_errors_convert() {
        let err: ParseError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, ParseError::Io(_)));
        assert_eq!(err.to_string(), "could not read file: gone");
    }
}
