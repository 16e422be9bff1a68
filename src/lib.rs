// Sales Cleaner - Core Library
// Every pipeline stage lives here so the CLI and the tests share it

pub mod config;
pub mod error;
pub mod table;
pub mod loader;
pub mod cleaner;
pub mod deduplication;
pub mod aggregator;
pub mod writer;
pub mod report;
pub mod progress;
pub mod pipeline;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use table::{Cell, RawRecord, RawTable, Transaction, TransactionTable, COLUMNS};
pub use loader::{
    InputFormat, TableReader, WorkbookReader, CsvReader, SheetRows,
    detect_format, get_reader, build_table, load_table,
};
pub use cleaner::{
    Cleaner, CleanedData, CleaningSummary, NO_NOTES,
    title_case, normalize_names, deduplicate, fill_missing_notes,
    coerce_amount, validate_amounts, parse_date, normalize_dates, finalize,
};
pub use deduplication::{DeduplicationEngine, DuplicateKey, DuplicateMatch};
pub use aggregator::{
    SalesStatistics, CategorySummary, CustomerSummary, DailySummary, SalesSummary,
    compute_statistics, summarize_by_category, summarize_by_customer, summarize_by_day, aggregate,
};
pub use writer::{
    build_workbook, write_workbook,
    SHEET_CLEANED_DATA, SHEET_CATEGORY_SUMMARY, SHEET_CUSTOMER_SUMMARY, SHEET_DAILY_REPORT,
};
pub use report::{ReportContext, render_report, write_report, format_currency, format_optional_currency};
pub use progress::{PipelineEvent, ProgressSink, ConsoleProgress, SilentProgress};
pub use pipeline::{PipelineOutcome, run_pipeline};
