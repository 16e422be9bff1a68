// ⚙️ Pipeline Configuration
// Fixed relative paths; tests point them into temp directories.

use crate::error::{PipelineError, Result};
use std::path::{Path, PathBuf};

pub const DEFAULT_INPUT_FILE: &str = "raw_sales_data.xlsx";
pub const DEFAULT_SHEET_NAME: &str = "Raw_Data";
pub const DEFAULT_OUTPUT_FILE: &str = "cleaned_sales_data.xlsx";
pub const DEFAULT_REPORT_FILE: &str = "sales_report.txt";

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub input_path: PathBuf,
    pub sheet_name: String,
    pub output_path: PathBuf,
    pub report_path: PathBuf,

    /// Customers listed in the report's TOP CUSTOMERS section
    pub top_customers: usize,

    /// Rows shown in the console previews (raw and cleaned)
    pub preview_rows: usize,

    /// tracing filter directive, e.g. "warn" or "sales_cleaner=debug"
    pub log_level: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            input_path: PathBuf::from(DEFAULT_INPUT_FILE),
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_FILE),
            report_path: PathBuf::from(DEFAULT_REPORT_FILE),
            top_customers: 5,
            preview_rows: 20,
            log_level: "warn".to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sheet_name.trim().is_empty() {
            return Err(PipelineError::Config("sheet_name must not be empty".to_string()));
        }

        if self.output_path == self.input_path || self.report_path == self.input_path {
            return Err(PipelineError::Config(
                "output paths must differ from the input path".to_string(),
            ));
        }

        if self.output_path == self.report_path {
            return Err(PipelineError::Config(
                "output_path and report_path must differ".to_string(),
            ));
        }

        Ok(())
    }

    /// File name shown in the report (directory stripped)
    pub fn display_name(path: &Path) -> String {
        path.file_name()
            .and_then(|n| n.to_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| path.display().to_string())
    }
}
