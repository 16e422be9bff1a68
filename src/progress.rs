// 📣 Progress narration - decoupled from the pipeline stages
//
// Stages emit PipelineEvents; what happens to them (console, nothing, a test
// recorder) is up to the sink.

use crate::aggregator::{CategorySummary, CustomerSummary, SalesStatistics};
use crate::report::{category_table, customer_table, format_currency, format_optional_currency};
use crate::table::{RawTable, Transaction, TransactionTable, COLUMNS, DATETIME_DISPLAY_FORMAT};
use comfy_table::{presets::ASCII_BORDERS_ONLY_CONDENSED, ContentArrangement, Table};
use std::path::Path;

const RULE_WIDTH: usize = 70;

#[derive(Debug)]
pub enum PipelineEvent<'a> {
    LoadStarted { input: &'a Path },
    Loaded { table: &'a RawTable },
    CleaningStarted,
    NamesNormalized,
    DuplicatesRemoved { removed: usize },
    NotesFilled { filled: usize },
    AmountsValidated { dropped: usize },
    DatesNormalized,
    Cleaned { table: &'a TransactionTable },
    Statistics { stats: &'a SalesStatistics },
    CategorySummary { rows: &'a [CategorySummary] },
    CustomerSummary { rows: &'a [CustomerSummary] },
    SavingStarted { output: &'a Path },
    WorkbookSaved { output: &'a Path },
    ReportStarted,
    ReportGenerated { text: &'a str },
    ReportSaved { path: &'a Path },
}

pub trait ProgressSink {
    fn on_event(&mut self, event: &PipelineEvent<'_>);
}

/// Discards every event
#[derive(Debug, Default)]
pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn on_event(&mut self, _event: &PipelineEvent<'_>) {}
}

// ============================================================================
// CONSOLE
// ============================================================================

/// Step-by-step console narration
pub struct ConsoleProgress {
    preview_rows: usize,
}

impl ConsoleProgress {
    pub fn new(preview_rows: usize) -> Self {
        ConsoleProgress { preview_rows }
    }

    pub fn banner(title: &str) {
        println!("{}", "=".repeat(RULE_WIDTH));
        println!("{}", title);
        println!("{}", "=".repeat(RULE_WIDTH));
    }

    fn section(title: &str) {
        println!("{}", "-".repeat(RULE_WIDTH));
        println!("{}", title);
        println!("{}", "-".repeat(RULE_WIDTH));
    }

    fn print_preview(&self, rows: Vec<[String; 7]>) {
        let total = rows.len();

        let mut table = Table::new();
        table.load_preset(ASCII_BORDERS_ONLY_CONDENSED);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(COLUMNS.to_vec());
        for row in rows.into_iter().take(self.preview_rows) {
            table.add_row(row.to_vec());
        }

        println!("{table}");
        if total > self.preview_rows {
            println!("... {} more rows", total - self.preview_rows);
        }
    }
}

impl ProgressSink for ConsoleProgress {
    fn on_event(&mut self, event: &PipelineEvent<'_>) {
        match event {
            PipelineEvent::LoadStarted { .. } => {
                println!("[STEP 1] Loading raw data from Excel...");
            }
            PipelineEvent::Loaded { table } => {
                println!("✓ Successfully loaded {} rows of data", table.len());
                println!();
                Self::section("RAW DATA (BEFORE CLEANING):");
                self.print_preview(
                    table
                        .records
                        .iter()
                        .map(|r| r.cells().map(|c| c.to_string()))
                        .collect(),
                );
                println!("\nTotal rows: {}", table.len());
                println!();
            }
            PipelineEvent::CleaningStarted => {
                println!("[STEP 2] Starting Data Cleaning Process...");
                println!();
                println!("2a. Standardizing Customer Names (Title Case)...");
            }
            PipelineEvent::NamesNormalized => {
                println!("    ✓ Customer names standardized");
                println!("2b. Removing Duplicate Entries...");
            }
            PipelineEvent::DuplicatesRemoved { removed } => {
                println!("    ✓ Removed {} duplicate entries", removed);
                println!("2c. Filling Missing Values...");
            }
            PipelineEvent::NotesFilled { .. } => {
                println!("    ✓ Missing values filled");
                println!("2d. Validating Amount Data...");
            }
            PipelineEvent::AmountsValidated { .. } => {
                println!("    ✓ Removed invalid amounts");
                println!("2e. Standardizing Date Format...");
            }
            PipelineEvent::DatesNormalized => {
                println!("    ✓ Dates formatted consistently");
                println!();
            }
            PipelineEvent::Cleaned { table } => {
                Self::section("CLEANED DATA (AFTER CLEANING):");
                self.print_preview(table.iter().map(transaction_cells).collect());
                println!("\nTotal rows after cleaning: {}", table.len());
                println!();
            }
            PipelineEvent::Statistics { stats } => {
                println!("[STEP 3] Generating Summary Report...");
                println!();
                println!("Total Sales: {}", format_currency(stats.total_sales));
                println!("Average Sale: {}", format_optional_currency(stats.average_sale));
                println!("Highest Sale: {}", format_optional_currency(stats.highest_sale));
                println!("Lowest Sale: {}", format_optional_currency(stats.lowest_sale));
                println!("Total Transactions: {}", stats.transaction_count);
                println!("Unique Customers: {}", stats.unique_customers);
                println!();
            }
            PipelineEvent::CategorySummary { rows } => {
                println!("[STEP 4] Creating Category Summary...");
                println!();
                println!("{}", category_table(rows));
                println!();
            }
            PipelineEvent::CustomerSummary { rows } => {
                println!("[STEP 5] Creating Customer Summary...");
                println!();
                println!("{}", customer_table(rows));
                println!();
            }
            PipelineEvent::SavingStarted { .. } => {
                println!("[STEP 6] Saving Cleaned Data...");
            }
            PipelineEvent::WorkbookSaved { output } => {
                println!("✓ Cleaned data saved to '{}'", output.display());
                println!();
            }
            PipelineEvent::ReportStarted => {
                println!("[STEP 7] Generating Final Report...");
                println!();
            }
            PipelineEvent::ReportGenerated { text } => {
                println!("{}", text);
            }
            PipelineEvent::ReportSaved { path } => {
                println!("✓ Report saved to '{}'", path.display());
                println!();
            }
        }
    }
}

fn transaction_cells(tx: &Transaction) -> [String; 7] {
    [
        tx.transaction_id.to_string(),
        tx.customer_name.clone(),
        tx.product.clone(),
        tx.category.clone(),
        format!("{:.2}", tx.amount),
        tx.date.format(DATETIME_DISPLAY_FORMAT).to_string(),
        tx.notes.clone(),
    ]
}
