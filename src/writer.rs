// 💾 Writer - cleaned table + summaries → one workbook
//
// The workbook is built in memory, then written to a temp file next to the
// target and renamed over it, so readers never see a half-written file.

use crate::aggregator::{CategorySummary, CustomerSummary, DailySummary, SalesSummary};
use crate::error::Result;
use crate::table::{Cell, TransactionTable, COLUMNS};
use rust_xlsxwriter::{DocProperties, ExcelDateTime, Format, Workbook, Worksheet};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

pub const SHEET_CLEANED_DATA: &str = "Cleaned Data";
pub const SHEET_CATEGORY_SUMMARY: &str = "Category Summary";
pub const SHEET_CUSTOMER_SUMMARY: &str = "Customer Summary";
pub const SHEET_DAILY_REPORT: &str = "Daily Report";

const DATETIME_NUM_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";
const DATE_NUM_FORMAT: &str = "yyyy-mm-dd";
const MONEY_NUM_FORMAT: &str = "0.00";

// ============================================================================
// ATOMIC FILE REPLACEMENT
// ============================================================================

/// Temp file with the mode a plain `File::create` would get (0666 minus umask)
fn sibling_temp_file(dir: &Path) -> Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }

    Ok(builder.tempfile_in(dir)?)
}

/// Write `bytes` to a sibling temp file, then rename it over `path`
///
/// If anything fails the temp file is removed and `path` is left untouched.
/// An existing target keeps its permissions.
pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = sibling_temp_file(dir)?;
    if let Ok(existing) = fs::metadata(path) {
        temp.as_file().set_permissions(existing.permissions())?;
    }
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}

// ============================================================================
// SHEETS
// ============================================================================

struct Formats {
    header: Format,
    datetime: Format,
    date: Format,
    money: Format,
}

impl Formats {
    fn new() -> Self {
        Formats {
            header: Format::new().set_bold(),
            datetime: Format::new().set_num_format(DATETIME_NUM_FORMAT),
            date: Format::new().set_num_format(DATE_NUM_FORMAT),
            money: Format::new().set_num_format(MONEY_NUM_FORMAT),
        }
    }
}

fn write_header(worksheet: &mut Worksheet, headers: &[&str], formats: &Formats) -> Result<()> {
    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &formats.header)?;
    }
    Ok(())
}

fn write_cell(worksheet: &mut Worksheet, row: u32, col: u16, cell: &Cell, formats: &Formats) -> Result<()> {
    match cell {
        Cell::Empty => {}
        Cell::Text(s) => {
            worksheet.write_string(row, col, s.as_str())?;
        }
        Cell::Number(n) => {
            worksheet.write_number(row, col, *n)?;
        }
        Cell::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        Cell::DateTime(dt) => {
            worksheet.write_datetime_with_format(row, col, dt, &formats.datetime)?;
        }
    }
    Ok(())
}

fn cleaned_data_sheet(table: &TransactionTable, formats: &Formats) -> Result<Worksheet> {
    let mut worksheet = Worksheet::new();
    worksheet.set_name(SHEET_CLEANED_DATA)?;
    write_header(&mut worksheet, &COLUMNS, formats)?;

    for (index, tx) in table.iter().enumerate() {
        let row = index as u32 + 1;
        write_cell(&mut worksheet, row, 0, &tx.transaction_id, formats)?;
        worksheet.write_string(row, 1, tx.customer_name.as_str())?;
        worksheet.write_string(row, 2, tx.product.as_str())?;
        worksheet.write_string(row, 3, tx.category.as_str())?;
        worksheet.write_number(row, 4, tx.amount)?;
        worksheet.write_datetime_with_format(row, 5, &tx.date, &formats.datetime)?;
        worksheet.write_string(row, 6, tx.notes.as_str())?;
    }

    worksheet.set_column_width(5, 20)?;
    Ok(worksheet)
}

fn category_sheet(rows: &[CategorySummary], formats: &Formats) -> Result<Worksheet> {
    let mut worksheet = Worksheet::new();
    worksheet.set_name(SHEET_CATEGORY_SUMMARY)?;
    write_header(
        &mut worksheet,
        &["Category", "Total Sales", "Average Sale", "Transaction Count"],
        formats,
    )?;

    for (index, summary) in rows.iter().enumerate() {
        let row = index as u32 + 1;
        worksheet.write_string(row, 0, summary.category.as_str())?;
        worksheet.write_number_with_format(row, 1, summary.total_sales, &formats.money)?;
        worksheet.write_number_with_format(row, 2, summary.average_sale, &formats.money)?;
        worksheet.write_number(row, 3, summary.transaction_count as f64)?;
    }

    Ok(worksheet)
}

fn customer_sheet(rows: &[CustomerSummary], formats: &Formats) -> Result<Worksheet> {
    let mut worksheet = Worksheet::new();
    worksheet.set_name(SHEET_CUSTOMER_SUMMARY)?;
    write_header(&mut worksheet, &["Customer Name", "Total Spent", "Purchases"], formats)?;

    for (index, summary) in rows.iter().enumerate() {
        let row = index as u32 + 1;
        worksheet.write_string(row, 0, summary.customer_name.as_str())?;
        worksheet.write_number_with_format(row, 1, summary.total_spent, &formats.money)?;
        worksheet.write_number(row, 2, summary.purchases as f64)?;
    }

    Ok(worksheet)
}

fn daily_sheet(rows: &[DailySummary], formats: &Formats) -> Result<Worksheet> {
    let mut worksheet = Worksheet::new();
    worksheet.set_name(SHEET_DAILY_REPORT)?;
    write_header(&mut worksheet, &["Date", "Daily Sales", "Transaction Count"], formats)?;

    for (index, summary) in rows.iter().enumerate() {
        let row = index as u32 + 1;
        worksheet.write_datetime_with_format(row, 0, &summary.date, &formats.date)?;
        worksheet.write_number_with_format(row, 1, summary.daily_sales, &formats.money)?;
        worksheet.write_number(row, 2, summary.transaction_count as f64)?;
    }

    worksheet.set_column_width(0, 12)?;
    Ok(worksheet)
}

// ============================================================================
// WORKBOOK
// ============================================================================

/// All four sheets, in output order
pub fn build_workbook(table: &TransactionTable, summary: &SalesSummary) -> Result<Workbook> {
    let formats = Formats::new();
    let mut workbook = Workbook::new();

    // Fixed document timestamp so identical input gives identical bytes
    let created = ExcelDateTime::from_ymd(2000, 1, 1)?;
    workbook.set_properties(&DocProperties::new().set_creation_datetime(&created));

    workbook.push_worksheet(cleaned_data_sheet(table, &formats)?);
    workbook.push_worksheet(category_sheet(&summary.categories, &formats)?);
    workbook.push_worksheet(customer_sheet(&summary.customers, &formats)?);
    workbook.push_worksheet(daily_sheet(&summary.daily, &formats)?);

    Ok(workbook)
}

pub fn write_workbook(path: &Path, table: &TransactionTable, summary: &SalesSummary) -> Result<()> {
    let mut workbook = build_workbook(table, summary)?;
    let bytes = workbook.save_to_buffer()?;
    write_atomically(path, &bytes)?;

    info!(path = %path.display(), rows = table.len(), "workbook written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::aggregate;
    use crate::table::Transaction;
    use calamine::{open_workbook_auto, Data, Reader};
    use chrono::NaiveDate;

    fn create_test_transaction(id: Cell, name: &str, category: &str, amount: f64, day: u32) -> Transaction {
        Transaction {
            transaction_id: id,
            customer_name: name.to_string(),
            product: "Widget".to_string(),
            category: category.to_string(),
            amount,
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap().and_hms_opt(10, 30, 0).unwrap(),
            notes: "No notes".to_string(),
        }
    }

    fn sample_table() -> TransactionTable {
        TransactionTable::new(vec![
            create_test_transaction(Cell::Number(1001.0), "John Doe", "Electronics", 1200.0, 15),
            create_test_transaction(Cell::text("T002"), "Jane Smith", "Accessories", 25.5, 16),
        ])
    }

    #[test]
    fn test_write_workbook_sheets_and_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cleaned_sales_data.xlsx");
        let table = sample_table();
        let summary = aggregate(&table);

        write_workbook(&path, &table, &summary).unwrap();

        let mut workbook = open_workbook_auto(&path).unwrap();
        assert_eq!(
            workbook.sheet_names(),
            vec![
                SHEET_CLEANED_DATA.to_string(),
                SHEET_CATEGORY_SUMMARY.to_string(),
                SHEET_CUSTOMER_SUMMARY.to_string(),
                SHEET_DAILY_REPORT.to_string(),
            ]
        );

        let cleaned = workbook.worksheet_range(SHEET_CLEANED_DATA).unwrap();
        assert_eq!(cleaned.height(), 3);
        assert_eq!(cleaned.get_value((0, 0)), Some(&Data::String("Transaction ID".to_string())));
        assert_eq!(cleaned.get_value((1, 0)), Some(&Data::Float(1001.0)));
        assert_eq!(cleaned.get_value((2, 0)), Some(&Data::String("T002".to_string())));
        assert_eq!(cleaned.get_value((1, 4)), Some(&Data::Float(1200.0)));

        let customers = workbook.worksheet_range(SHEET_CUSTOMER_SUMMARY).unwrap();
        assert_eq!(customers.get_value((1, 0)), Some(&Data::String("John Doe".to_string())));
        assert_eq!(customers.get_value((1, 1)), Some(&Data::Float(1200.0)));

        let daily = workbook.worksheet_range(SHEET_DAILY_REPORT).unwrap();
        assert_eq!(daily.height(), 3);
    }

    #[test]
    fn test_empty_table_writes_header_only_sheets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.xlsx");
        let table = TransactionTable::default();

        write_workbook(&path, &table, &aggregate(&table)).unwrap();

        let mut workbook = open_workbook_auto(&path).unwrap();
        let categories = workbook.worksheet_range(SHEET_CATEGORY_SUMMARY).unwrap();
        assert_eq!(categories.height(), 1);
    }

    #[test]
    fn test_identical_input_identical_bytes() {
        let table = sample_table();
        let summary = aggregate(&table);

        let first = build_workbook(&table, &summary).unwrap().save_to_buffer().unwrap();
        let second = build_workbook(&table, &summary).unwrap().save_to_buffer().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_write_atomically_replaces_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        std::fs::write(&path, b"previous").unwrap();

        write_atomically(&path, b"next").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"next");

        // No temp files left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomically_new_file_gets_default_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("plain.txt");
        let atomic = dir.path().join("sales_report.txt");
        std::fs::write(&plain, b"x").unwrap();

        write_atomically(&atomic, b"x").unwrap();

        let mode = |p: &Path| std::fs::metadata(p).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode(atomic.as_path()), mode(plain.as_path()));
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomically_keeps_existing_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cleaned_sales_data.xlsx");
        std::fs::write(&path, b"previous").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o640)).unwrap();

        write_atomically(&path, b"next").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
    }

    #[test]
    fn test_write_atomically_failure_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing_dir").join("out.bin");

        assert!(write_atomically(&path, b"data").is_err());
        assert!(!path.exists());
    }
}
