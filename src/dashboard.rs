// Upload handling and the last successfully parsed results.
//
// A failed upload only changes the status message; whatever was shown
// before stays shown.
use crate::error::ParseError;
use crate::reader::read_workbook;
use crate::reports::{analyze, AnalysisOptions, Insights};
use std::path::Path;
use tracing::{info, warn};

pub const MSG_SUCCESS: &str = "Upload and parsing successful!";
pub const MSG_NO_FILE: &str = "Please select a file to upload.";

#[derive(Debug, Default)]
pub struct Dashboard {
    insights: Option<Insights>,
    loading: bool,
    status: String,
    options: AnalysisOptions,
}

impl Dashboard {
    pub fn new(options: AnalysisOptions) -> Self {
        Dashboard {
            options,
            ..Dashboard::default()
        }
    }

    pub fn insights(&self) -> Option<&Insights> {
        self.insights.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Parse an uploaded payload. `file_name` picks the format; `None`
    /// means no file was selected.
    pub fn upload(&mut self, file_name: Option<&str>, payload: &[u8]) -> Result<(), ParseError> {
        let Some(name) = file_name else {
            self.status = MSG_NO_FILE.to_string();
            return Ok(());
        };
        self.loading = true;
        let result = read_workbook(payload, Some(name)).map(|book| analyze(book, self.options));
        self.loading = false;
        self.finish(name, result)
    }

    /// Read a file from disk, then parse it like an upload. A file that
    /// cannot be read is reported the same way as one that cannot be parsed.
    pub fn upload_path(&mut self, path: &Path) -> Result<(), ParseError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        match std::fs::read(path) {
            Ok(payload) => self.upload(Some(&name), &payload),
            Err(e) => self.finish(&name, Err(e.into())),
        }
    }

    fn finish(&mut self, name: &str, result: Result<Insights, ParseError>) -> Result<(), ParseError> {
        match result {
            Ok(insights) => {
                info!(
                    file = name,
                    records = insights.students.len(),
                    "upload parsed"
                );
                self.insights = Some(insights);
                self.status = MSG_SUCCESS.to_string();
                Ok(())
            }
            Err(e) => {
                warn!(file = name, error = %e, "upload rejected");
                self.status = format!("Error reading file: {}", e);
                Err(e)
            }
        }
    }
}
