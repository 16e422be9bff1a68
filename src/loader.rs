// 📂 Loader - spreadsheet/CSV → RawTable
//
// Format is detected from the file extension and dispatched to a reader,
// the same way each bank export gets its own parser.

use crate::error::{PipelineError, Result};
use crate::table::{
    Cell, RawRecord, RawTable, COL_AMOUNT, COL_CATEGORY, COL_CUSTOMER_NAME, COL_DATE,
    COL_NOTES, COL_PRODUCT, COL_TRANSACTION_ID,
};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;
use tracing::{debug, info, warn};

// ============================================================================
// CORE TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// xlsx / xlsm / xlsb / xls / ods
    Workbook,
    Csv,
}

impl InputFormat {
    pub fn name(&self) -> &'static str {
        match self {
            InputFormat::Workbook => "Excel workbook",
            InputFormat::Csv => "CSV",
        }
    }
}

/// Rows exactly as read, header included
#[derive(Debug, Clone, Default)]
pub struct SheetRows {
    /// 1-based sheet row number of `rows[0]`
    pub first_row: usize,
    pub rows: Vec<Vec<Cell>>,
}

/// Reads one sheet of an input file into untyped cells
pub trait TableReader {
    fn read(&self, path: &Path, sheet: &str) -> Result<SheetRows>;

    fn format(&self) -> InputFormat;
}

// ============================================================================
// FORMAT DETECTION
// ============================================================================

pub fn detect_format(path: &Path) -> Result<InputFormat> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(InputFormat::Workbook),
        "csv" => Ok(InputFormat::Csv),
        _ => Err(PipelineError::UnsupportedFormat(path.to_path_buf())),
    }
}

pub fn get_reader(format: InputFormat) -> Box<dyn TableReader> {
    match format {
        InputFormat::Workbook => Box::new(WorkbookReader),
        InputFormat::Csv => Box::new(CsvReader),
    }
}

// ============================================================================
// READERS
// ============================================================================

pub struct WorkbookReader;

impl TableReader for WorkbookReader {
    fn read(&self, path: &Path, sheet: &str) -> Result<SheetRows> {
        let mut workbook = open_workbook_auto(path)?;

        let available = workbook.sheet_names();
        if !available.iter().any(|name| name == sheet) {
            return Err(PipelineError::MissingSheet {
                path: path.to_path_buf(),
                sheet: sheet.to_string(),
                available,
            });
        }

        let range = workbook.worksheet_range(sheet)?;
        let first_row = range.start().map(|(row, _)| row as usize + 1).unwrap_or(1);

        let rows = range
            .rows()
            .map(|row| row.iter().map(cell_from_data).collect())
            .collect();

        Ok(SheetRows { first_row, rows })
    }

    fn format(&self) -> InputFormat {
        InputFormat::Workbook
    }
}

pub struct CsvReader;

impl TableReader for CsvReader {
    fn read(&self, path: &Path, sheet: &str) -> Result<SheetRows> {
        debug!(sheet, "CSV input has a single sheet; sheet name ignored");

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            rows.push(record.iter().map(Cell::from_csv_field).collect());
        }

        Ok(SheetRows { first_row: 1, rows })
    }

    fn format(&self) -> InputFormat {
        InputFormat::Csv
    }
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::text(s),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(Cell::DateTime)
            .unwrap_or(Cell::Number(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::text(s),
        // #N/A, #DIV/0! ... behave like blanks
        Data::Error(_) => Cell::Empty,
    }
}

// ============================================================================
// TABLE BUILDING
// ============================================================================

struct ColumnIndex {
    transaction_id: usize,
    customer_name: usize,
    product: usize,
    category: usize,
    amount: usize,
    date: usize,
    notes: Option<usize>,
}

impl ColumnIndex {
    fn from_header(header: &[Cell]) -> Result<Self> {
        let names: Vec<String> = header.iter().map(|c| c.to_text().trim().to_string()).collect();
        let find = |column: &str| names.iter().position(|n| n == column);
        let required =
            |column: &str| find(column).ok_or_else(|| PipelineError::MissingColumn(column.to_string()));

        Ok(ColumnIndex {
            transaction_id: required(COL_TRANSACTION_ID)?,
            customer_name: required(COL_CUSTOMER_NAME)?,
            product: required(COL_PRODUCT)?,
            category: required(COL_CATEGORY)?,
            amount: required(COL_AMOUNT)?,
            date: required(COL_DATE)?,
            notes: find(COL_NOTES),
        })
    }
}

/// Map header names to columns and turn data rows into RawRecords
pub fn build_table(sheet: SheetRows) -> Result<RawTable> {
    let mut rows = sheet.rows.into_iter();

    let header = match rows.next() {
        Some(header) => header,
        None => return Err(PipelineError::MissingColumn(COL_TRANSACTION_ID.to_string())),
    };
    let columns = ColumnIndex::from_header(&header)?;

    if columns.notes.is_none() {
        warn!("No '{}' column found; every row will get the default note", COL_NOTES);
    }

    let cell_at = |row: &[Cell], index: usize| row.get(index).cloned().unwrap_or(Cell::Empty);

    let mut records = Vec::new();
    for (offset, row) in rows.enumerate() {
        if row.iter().all(Cell::is_empty) {
            continue;
        }

        records.push(RawRecord {
            source_row: sheet.first_row + offset + 1,
            transaction_id: cell_at(&row, columns.transaction_id),
            customer_name: cell_at(&row, columns.customer_name),
            product: cell_at(&row, columns.product),
            category: cell_at(&row, columns.category),
            amount: cell_at(&row, columns.amount),
            date: cell_at(&row, columns.date),
            notes: columns.notes.map(|i| cell_at(&row, i)).unwrap_or(Cell::Empty),
        });
    }

    Ok(RawTable::new(records))
}

/// Load `sheet` from `path`; a missing file is reported before anything is opened
pub fn load_table(path: &Path, sheet: &str) -> Result<RawTable> {
    if !path.exists() {
        return Err(PipelineError::MissingInput(path.to_path_buf()));
    }

    let format = detect_format(path)?;
    let reader = get_reader(format);
    let rows = reader.read(path, sheet)?;
    let table = build_table(rows)?;

    info!(
        path = %path.display(),
        format = reader.format().name(),
        rows = table.len(),
        "loaded input table"
    );

    Ok(table)
}
