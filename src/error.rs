// ⚠️ Pipeline Errors - everything that can stop a cleaning run
//
// Per-row amount problems are NOT errors (rows are dropped by the cleaner).
// Everything here is fatal for the run.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Input spreadsheet does not exist
    #[error("File '{}' not found", .0.display())]
    MissingInput(PathBuf),

    #[error("Sheet '{sheet}' not found in '{}' (available: {})", .path.display(), .available.join(", "))]
    MissingSheet {
        path: PathBuf,
        sheet: String,
        available: Vec<String>,
    },

    #[error("Required column '{0}' is missing from the header row")]
    MissingColumn(String),

    #[error("Unsupported input format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// A single malformed date aborts the whole run
    #[error("Unparseable date '{value}' at row {row}")]
    InvalidDate { row: usize, value: String },

    /// Row reached the typed table without passing amount/date validation
    #[error("Row {row} has not been validated: {reason}")]
    UnvalidatedRow { row: usize, reason: String },

    #[error("Spreadsheet read error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("Workbook write error: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    pub fn is_missing_input(&self) -> bool {
        matches!(self, PipelineError::MissingInput(_))
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_input_message() {
        let err = PipelineError::MissingInput(PathBuf::from("raw_sales_data.xlsx"));
        assert!(err.is_missing_input());
        assert_eq!(err.to_string(), "File 'raw_sales_data.xlsx' not found");
    }

    #[test]
    fn test_invalid_date_message() {
        let err = PipelineError::InvalidDate {
            row: 4,
            value: "31/31/2024".to_string(),
        };
        assert!(!err.is_missing_input());
        assert_eq!(err.to_string(), "Unparseable date '31/31/2024' at row 4");
    }

    #[test]
    fn test_missing_sheet_lists_available() {
        let err = PipelineError::MissingSheet {
            path: PathBuf::from("in.xlsx"),
            sheet: "Raw_Data".to_string(),
            available: vec!["Sheet1".to_string(), "Sheet2".to_string()],
        };
        assert!(err.to_string().contains("available: Sheet1, Sheet2"));
    }
}
