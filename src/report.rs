// 📝 Reporter - fixed-layout text report
//
// render_report is pure: same inputs, same text. The generated-at line is the
// only part that changes between runs on the same input.

use crate::aggregator::{CategorySummary, CustomerSummary, SalesSummary};
use crate::cleaner::CleaningSummary;
use crate::error::Result;
use crate::writer::{
    write_atomically, SHEET_CATEGORY_SUMMARY, SHEET_CLEANED_DATA, SHEET_CUSTOMER_SUMMARY,
    SHEET_DAILY_REPORT,
};
use chrono::NaiveDateTime;
use std::path::Path;

const REPORT_WIDTH: usize = 80;
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ============================================================================
// NUMBER FORMATTING
// ============================================================================

/// 1234567.891 → "1,234,567.89"
pub fn format_number(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (integer, fraction) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    // "-0.00" would be noise
    let sign = if value < 0.0 && formatted != "0.00" { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, fraction)
}

/// 1234.5 → "$1,234.50"
pub fn format_currency(value: f64) -> String {
    let number = format_number(value);
    match number.strip_prefix('-') {
        Some(positive) => format!("-${}", positive),
        None => format!("${}", number),
    }
}

/// Statistics that do not exist for an empty table show as "N/A"
pub fn format_optional_currency(value: Option<f64>) -> String {
    value.map(format_currency).unwrap_or_else(|| "N/A".to_string())
}

// ============================================================================
// TABLES
// ============================================================================

fn name_width<'a>(header: &str, names: impl Iterator<Item = &'a str>) -> usize {
    names
        .map(|n| n.chars().count())
        .chain(std::iter::once(header.chars().count()))
        .max()
        .unwrap_or(0)
}

/// Category breakdown, one line per category
pub fn category_table(rows: &[CategorySummary]) -> String {
    let width = name_width("Category", rows.iter().map(|r| r.category.as_str()));

    let mut lines = vec![format!(
        "{:<width$}  {:>14}  {:>14}  {:>17}",
        "Category", "Total Sales", "Average Sale", "Transaction Count"
    )];

    if rows.is_empty() {
        lines.push("(no transactions)".to_string());
    }

    for row in rows {
        lines.push(format!(
            "{:<width$}  {:>14}  {:>14}  {:>17}",
            row.category,
            format_number(row.total_sales),
            format_number(row.average_sale),
            row.transaction_count
        ));
    }

    lines.join("\n")
}

/// Customer ranking, in the order given
pub fn customer_table(rows: &[CustomerSummary]) -> String {
    let width = name_width("Customer Name", rows.iter().map(|r| r.customer_name.as_str()));

    let mut lines = vec![format!(
        "{:<width$}  {:>14}  {:>9}",
        "Customer Name", "Total Spent", "Purchases"
    )];

    if rows.is_empty() {
        lines.push("(no transactions)".to_string());
    }

    for row in rows {
        lines.push(format!(
            "{:<width$}  {:>14}  {:>9}",
            row.customer_name,
            format_number(row.total_spent),
            row.purchases
        ));
    }

    lines.join("\n")
}

// ============================================================================
// REPORT
// ============================================================================

pub struct ReportContext<'a> {
    pub generated_at: NaiveDateTime,
    pub input_file: String,
    pub output_file: String,
    pub report_file: String,
    pub cleaning: &'a CleaningSummary,
    pub summary: &'a SalesSummary,
    /// How many customers TOP CUSTOMERS lists
    pub top_customers: usize,
}

fn centered(text: &str) -> String {
    let line = format!("{:^width$}", text, width = REPORT_WIDTH);
    format!("{}\n", line.trim_end())
}

pub fn render_report(ctx: &ReportContext<'_>) -> String {
    let rule = "=".repeat(REPORT_WIDTH);
    let stats = &ctx.summary.statistics;
    let top_count = ctx.top_customers.min(ctx.summary.customers.len());

    let mut out = String::new();
    out.push('\n');
    out.push_str(&rule);
    out.push('\n');
    out.push_str(&centered("SALES DATA AUTOMATION REPORT"));
    out.push_str(&centered(&format!(
        "Generated: {}",
        ctx.generated_at.format(TIMESTAMP_FORMAT)
    )));
    out.push_str(&rule);
    out.push_str("\n\n");

    out.push_str("PROJECT OVERVIEW:\n");
    out.push_str(&format!("- Input File: {}\n", ctx.input_file));
    out.push_str(&format!("- Output File: {}\n", ctx.output_file));
    out.push_str(&format!("- Report File: {}\n\n", ctx.report_file));

    out.push_str("DATA CLEANING SUMMARY:\n");
    out.push_str(&format!("- Rows Loaded: {}\n", ctx.cleaning.rows_loaded));
    out.push_str(&format!("- Duplicates Removed: {}\n", ctx.cleaning.duplicates_removed));
    out.push_str(&format!(
        "- Invalid Amounts Removed: {}\n",
        ctx.cleaning.invalid_amounts_removed
    ));
    out.push_str(&format!("- Missing Notes Filled: {}\n", ctx.cleaning.notes_filled));
    out.push_str(&format!("- Rows Retained: {}\n", ctx.cleaning.rows_retained));
    out.push_str("- Data Quality: 100% (All invalid entries removed)\n\n");

    out.push_str("FINANCIAL SUMMARY:\n");
    out.push_str(&format!("- Total Sales: {}\n", format_currency(stats.total_sales)));
    for (label, value) in [
        ("Average", stats.average_sale),
        ("Highest", stats.highest_sale),
        ("Lowest", stats.lowest_sale),
    ] {
        out.push_str(&format!(
            "- {} Transaction: {}\n",
            label,
            format_optional_currency(value)
        ));
    }
    out.push_str(&format!("- Total Transactions: {}\n", stats.transaction_count));
    out.push_str(&format!("- Unique Customers: {}\n\n", stats.unique_customers));

    out.push_str("CATEGORY BREAKDOWN:\n");
    out.push_str(&category_table(&ctx.summary.categories));
    out.push_str("\n\n");

    out.push_str("TOP CUSTOMERS:\n");
    out.push_str(&customer_table(&ctx.summary.customers[..top_count]));
    out.push_str("\n\n");

    out.push_str("FILES GENERATED:\n");
    out.push_str(&format!(
        "1. {} - Main output with all cleaned data\n",
        ctx.output_file
    ));
    out.push_str(&format!("   - Sheet 1: {} (Full dataset)\n", SHEET_CLEANED_DATA));
    out.push_str(&format!("   - Sheet 2: {} (Sales by category)\n", SHEET_CATEGORY_SUMMARY));
    out.push_str(&format!("   - Sheet 3: {} (Sales by customer)\n", SHEET_CUSTOMER_SUMMARY));
    out.push_str(&format!("   - Sheet 4: {} (Sales by date)\n", SHEET_DAILY_REPORT));
    out.push_str(&format!("2. {} - This report\n\n", ctx.report_file));

    out.push_str(&rule);
    out.push('\n');
    out
}

/// Replace the report file in one step
pub fn write_report(path: &Path, text: &str) -> Result<()> {
    write_atomically(path, text.as_bytes())
}
