// 🧹 Cleaner - the five cleaning stages, in order
//
//   1. customer names → title case
//   2. exact duplicates removed (first occurrence kept)
//   3. blank notes → "No notes"
//   4. amounts coerced to numbers; missing / non-positive rows dropped
//   5. dates parsed; ONE bad date aborts the run
//
// Each stage takes the table by value and hands it back.

use crate::deduplication::DeduplicationEngine;
use crate::error::{PipelineError, Result};
use crate::progress::{PipelineEvent, ProgressSink};
use crate::table::{Cell, RawTable, Transaction, TransactionTable};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use tracing::{debug, info};

pub const NO_NOTES: &str = "No notes";

const DATETIME_FORMATS: [&str; 8] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M %p",
    "%B %d, %Y %H:%M",
];

const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%d %B %Y",
    "%B %d %Y",
];

// ============================================================================
// STAGE 1: NAME NORMALIZATION
// ============================================================================

/// Upper-case a letter that follows a non-letter, lower-case every other letter
pub fn title_case(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut previous_is_letter = false;

    for c in value.chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                result.extend(c.to_lowercase());
            } else {
                result.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            result.push(c);
            previous_is_letter = false;
        }
    }

    result
}

pub fn normalize_names(mut table: RawTable) -> RawTable {
    for record in &mut table.records {
        if !record.customer_name.is_empty() {
            record.customer_name = Cell::Text(title_case(&record.customer_name.to_text()));
        }
    }
    table
}

// ============================================================================
// STAGE 2: DEDUPLICATION
// ============================================================================

/// Returns the table without duplicates and how many rows were removed
pub fn deduplicate(table: RawTable) -> (RawTable, usize) {
    let (table, matches) = DeduplicationEngine::new().remove_duplicates(table);
    (table, matches.len())
}

// ============================================================================
// STAGE 3: NULL-FILLING
// ============================================================================

/// Only Notes is filled; returns how many notes were blank
pub fn fill_missing_notes(mut table: RawTable) -> (RawTable, usize) {
    let mut filled = 0;
    for record in &mut table.records {
        if record.notes.is_empty() {
            record.notes = Cell::Text(NO_NOTES.to_string());
            filled += 1;
        }
    }
    (table, filled)
}

// ============================================================================
// STAGE 4: AMOUNT VALIDATION
// ============================================================================

/// Numeric value of an amount cell, None when it cannot be a number
pub fn coerce_amount(cell: &Cell) -> Option<f64> {
    let value = match cell {
        Cell::Number(n) => *n,
        Cell::Text(s) => s.trim().parse::<f64>().ok()?,
        Cell::Empty | Cell::Bool(_) | Cell::DateTime(_) => return None,
    };

    value.is_finite().then_some(value)
}

/// Keeps rows with a strictly positive amount; returns how many were dropped
pub fn validate_amounts(table: RawTable) -> (RawTable, usize) {
    let before = table.len();

    let records: Vec<_> = table
        .records
        .into_iter()
        .filter_map(|mut record| match coerce_amount(&record.amount) {
            Some(amount) if amount > 0.0 => {
                record.amount = Cell::Number(amount);
                Some(record)
            }
            _ => {
                debug!(row = record.source_row, amount = %record.amount, "invalid amount, row dropped");
                None
            }
        })
        .collect();

    let dropped = before - records.len();
    (RawTable::new(records), dropped)
}

// ============================================================================
// STAGE 5: DATE NORMALIZATION
// ============================================================================

/// First serial day past 9999-12-31
const MAX_SERIAL: f64 = 2_958_466.0;

/// Spreadsheet serial day numbers count from 1899-12-30
fn from_serial(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(1.0..MAX_SERIAL).contains(&serial) {
        return None;
    }

    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(Duration::milliseconds(millis))
}

fn parse_date_text(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    None
}

pub fn parse_date(cell: &Cell) -> Option<NaiveDateTime> {
    match cell {
        Cell::DateTime(dt) => Some(*dt),
        Cell::Number(serial) => from_serial(*serial),
        Cell::Text(text) => parse_date_text(text),
        Cell::Empty | Cell::Bool(_) => None,
    }
}

/// Whole-table parse: the first malformed date fails the run
pub fn normalize_dates(mut table: RawTable) -> Result<RawTable> {
    for record in &mut table.records {
        match parse_date(&record.date) {
            Some(dt) => record.date = Cell::DateTime(dt),
            None => {
                return Err(PipelineError::InvalidDate {
                    row: record.source_row,
                    value: record.date.to_text(),
                })
            }
        }
    }
    Ok(table)
}

// ============================================================================
// FINAL: TYPED TABLE
// ============================================================================

/// Convert a fully cleaned RawTable into typed rows (indices become 0..n)
pub fn finalize(table: RawTable) -> Result<TransactionTable> {
    let mut transactions = Vec::with_capacity(table.len());

    for record in table.records {
        let row = record.source_row;

        let amount = match record.amount {
            Cell::Number(n) if n.is_finite() && n > 0.0 => n,
            other => {
                return Err(PipelineError::UnvalidatedRow {
                    row,
                    reason: format!("amount '{}' is not a positive number", other),
                })
            }
        };

        let date = match record.date {
            Cell::DateTime(dt) => dt,
            other => {
                return Err(PipelineError::UnvalidatedRow {
                    row,
                    reason: format!("date '{}' has not been normalized", other),
                })
            }
        };

        if record.notes.is_empty() {
            return Err(PipelineError::UnvalidatedRow {
                row,
                reason: "notes have not been filled".to_string(),
            });
        }

        transactions.push(Transaction {
            transaction_id: record.transaction_id,
            customer_name: record.customer_name.to_text(),
            product: record.product.to_text(),
            category: record.category.to_text(),
            amount,
            date,
            notes: record.notes.to_text(),
        });
    }

    Ok(TransactionTable::new(transactions))
}

// ============================================================================
// CLEANER
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleaningSummary {
    pub rows_loaded: usize,
    pub duplicates_removed: usize,
    pub notes_filled: usize,
    pub invalid_amounts_removed: usize,
    pub rows_retained: usize,
}

#[derive(Debug, Clone)]
pub struct CleanedData {
    pub table: TransactionTable,
    pub summary: CleaningSummary,
}

#[derive(Debug, Default)]
pub struct Cleaner;

impl Cleaner {
    pub fn new() -> Self {
        Cleaner
    }

    /// Run every stage in order, reporting each one to `progress`
    pub fn clean(&self, table: RawTable, progress: &mut dyn ProgressSink) -> Result<CleanedData> {
        let rows_loaded = table.len();
        progress.on_event(&PipelineEvent::CleaningStarted);

        let table = normalize_names(table);
        progress.on_event(&PipelineEvent::NamesNormalized);

        let (table, duplicates_removed) = deduplicate(table);
        progress.on_event(&PipelineEvent::DuplicatesRemoved {
            removed: duplicates_removed,
        });

        let (table, notes_filled) = fill_missing_notes(table);
        progress.on_event(&PipelineEvent::NotesFilled {
            filled: notes_filled,
        });

        let (table, invalid_amounts_removed) = validate_amounts(table);
        progress.on_event(&PipelineEvent::AmountsValidated {
            dropped: invalid_amounts_removed,
        });

        let table = normalize_dates(table)?;
        progress.on_event(&PipelineEvent::DatesNormalized);

        let table = finalize(table)?;

        let summary = CleaningSummary {
            rows_loaded,
            duplicates_removed,
            notes_filled,
            invalid_amounts_removed,
            rows_retained: table.len(),
        };

        info!(
            rows_loaded,
            duplicates_removed,
            notes_filled,
            invalid_amounts_removed,
            rows_retained = summary.rows_retained,
            "cleaning complete"
        );

        progress.on_event(&PipelineEvent::Cleaned { table: &table });

        Ok(CleanedData { table, summary })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::SilentProgress;
    use crate::table::RawRecord;

    fn create_test_record(row: usize, id: &str, name: &str, amount: Cell, date: &str) -> RawRecord {
        RawRecord {
            source_row: row,
            transaction_id: Cell::text(id),
            customer_name: Cell::text(name),
            product: Cell::text("Laptop"),
            category: Cell::text("Electronics"),
            amount,
            date: Cell::text(date),
            notes: Cell::Empty,
        }
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("john doe"), "John Doe");
        assert_eq!(title_case("JANE SMITH"), "Jane Smith");
        assert_eq!(title_case("mARY-jane o'neil"), "Mary-Jane O'Neil");
        assert_eq!(title_case("  bob  "), "  Bob  ");
        assert_eq!(title_case("agent 007x"), "Agent 007X");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_normalize_names_keeps_blanks() {
        let table = RawTable::new(vec![
            create_test_record(2, "T1", "john DOE", Cell::Number(1.0), "2024-01-01"),
            create_test_record(3, "T2", "", Cell::Number(1.0), "2024-01-01"),
        ]);

        let table = normalize_names(table);
        assert_eq!(table.records[0].customer_name, Cell::text("John Doe"));
        assert_eq!(table.records[1].customer_name, Cell::Empty);
    }

    #[test]
    fn test_names_normalized_before_dedup() {
        let table = RawTable::new(vec![
            create_test_record(2, "T1", "john doe", Cell::Number(10.0), "2024-01-01"),
            create_test_record(3, "T1", "JOHN DOE", Cell::Number(10.0), "2024-01-01"),
        ]);

        let (table, removed) = deduplicate(normalize_names(table));
        assert_eq!(removed, 1);
        assert_eq!(table.records[0].source_row, 2);
    }

    #[test]
    fn test_fill_missing_notes() {
        let mut with_note = create_test_record(3, "T2", "b", Cell::Number(1.0), "2024-01-01");
        with_note.notes = Cell::text("Gift wrap");
        let table = RawTable::new(vec![
            create_test_record(2, "T1", "a", Cell::Number(1.0), "2024-01-01"),
            with_note,
        ]);

        let (table, filled) = fill_missing_notes(table);
        assert_eq!(filled, 1);
        assert_eq!(table.records[0].notes, Cell::text(NO_NOTES));
        assert_eq!(table.records[1].notes, Cell::text("Gift wrap"));
    }

    #[test]
    fn test_coerce_amount() {
        assert_eq!(coerce_amount(&Cell::Number(12.5)), Some(12.5));
        assert_eq!(coerce_amount(&Cell::text(" 99.99 ")), Some(99.99));
        assert_eq!(coerce_amount(&Cell::text("-10")), Some(-10.0));
        assert_eq!(coerce_amount(&Cell::text("abc")), None);
        assert_eq!(coerce_amount(&Cell::text("$25")), None);
        assert_eq!(coerce_amount(&Cell::text("NaN")), None);
        assert_eq!(coerce_amount(&Cell::Empty), None);
        assert_eq!(coerce_amount(&Cell::Bool(true)), None);
    }

    #[test]
    fn test_validate_amounts_drops_invalid() {
        let table = RawTable::new(vec![
            create_test_record(2, "T1", "a", Cell::Number(100.0), "2024-01-01"),
            create_test_record(3, "T2", "b", Cell::text("-10"), "2024-01-01"),
            create_test_record(4, "T3", "c", Cell::text("abc"), "2024-01-01"),
            create_test_record(5, "T4", "d", Cell::Number(0.0), "2024-01-01"),
            create_test_record(6, "T5", "e", Cell::text("42.5"), "2024-01-01"),
            create_test_record(7, "T6", "f", Cell::Empty, "2024-01-01"),
        ]);

        let (table, dropped) = validate_amounts(table);
        assert_eq!(dropped, 4);
        assert_eq!(table.len(), 2);
        assert_eq!(table.records[1].amount, Cell::Number(42.5));
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date(&Cell::text("2024-01-15")), Some(ymd(2024, 1, 15)));
        assert_eq!(parse_date(&Cell::text("2024/01/15")), Some(ymd(2024, 1, 15)));
        assert_eq!(parse_date(&Cell::text("1/5/2024")), Some(ymd(2024, 1, 5)));
        assert_eq!(parse_date(&Cell::text("January 15, 2024")), Some(ymd(2024, 1, 15)));
        assert_eq!(parse_date(&Cell::text("15 Jan 2024")), Some(ymd(2024, 1, 15)));
        assert_eq!(
            parse_date(&Cell::text("2024-01-15T13:45:00")),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap().and_hms_opt(13, 45, 0)
        );
        assert_eq!(
            parse_date(&Cell::text("2024-01-15 08:30:00")),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap().and_hms_opt(8, 30, 0)
        );
    }

    #[test]
    fn test_parse_date_cells() {
        assert_eq!(parse_date(&Cell::DateTime(ymd(2024, 3, 1))), Some(ymd(2024, 3, 1)));
        // 45306 = 2024-01-15 in spreadsheet serial days
        assert_eq!(parse_date(&Cell::Number(45306.0)), Some(ymd(2024, 1, 15)));
        assert_eq!(parse_date(&Cell::Number(-3.0)), None);
        assert_eq!(parse_date(&Cell::Empty), None);
        assert_eq!(parse_date(&Cell::text("not a date")), None);
        assert_eq!(parse_date(&Cell::text("2024-13-45")), None);
    }

    #[test]
    fn test_normalize_dates_fails_whole_table() {
        let table = RawTable::new(vec![
            create_test_record(2, "T1", "a", Cell::Number(1.0), "2024-01-01"),
            create_test_record(3, "T2", "b", Cell::Number(1.0), "yesterday"),
        ]);

        match normalize_dates(table) {
            Err(PipelineError::InvalidDate { row, value }) => {
                assert_eq!(row, 3);
                assert_eq!(value, "yesterday");
            }
            other => panic!("expected InvalidDate, got {other:?}"),
        }
    }

    #[test]
    fn test_finalize_rejects_unvalidated_rows() {
        let table = RawTable::new(vec![create_test_record(
            2,
            "T1",
            "a",
            Cell::text("abc"),
            "2024-01-01",
        )]);

        assert!(matches!(
            finalize(table),
            Err(PipelineError::UnvalidatedRow { row: 2, .. })
        ));
    }

    #[test]
    fn test_clean_example_scenario() {
        // rows 2 and 4 duplicate, row 3 negative, row 5 non-numeric
        let table = RawTable::new(vec![
            create_test_record(2, "T001", "john doe", Cell::Number(1200.0), "2024-01-15"),
            create_test_record(3, "T002", "jane smith", Cell::Number(25.5), "2024-01-16"),
            create_test_record(4, "T003", "bob lee", Cell::text("-10"), "2024-01-16"),
            create_test_record(5, "T002", "JANE SMITH", Cell::Number(25.5), "2024-01-16"),
            create_test_record(6, "T004", "amy wu", Cell::text("abc"), "2024-01-17"),
        ]);

        let cleaned = Cleaner::new().clean(table, &mut SilentProgress).unwrap();

        assert_eq!(
            cleaned.summary,
            CleaningSummary {
                rows_loaded: 5,
                duplicates_removed: 1,
                notes_filled: 4,
                invalid_amounts_removed: 2,
                rows_retained: 2,
            }
        );

        let names: Vec<&str> = cleaned.table.iter().map(|t| t.customer_name.as_str()).collect();
        assert_eq!(names, vec!["John Doe", "Jane Smith"]);
        assert!(cleaned.table.iter().all(|t| t.amount > 0.0 && t.notes == NO_NOTES));
        assert_eq!(cleaned.table.transactions[1].date, ymd(2024, 1, 16));
    }

    #[test]
    fn test_clean_to_empty_table() {
        let table = RawTable::new(vec![create_test_record(
            2,
            "T1",
            "a",
            Cell::text("-5"),
            "garbage",
        )]);

        // The bad date is never examined: its row was dropped by amount validation
        let cleaned = Cleaner::new().clean(table, &mut SilentProgress).unwrap();
        assert!(cleaned.table.is_empty());
        assert_eq!(cleaned.summary.rows_retained, 0);
    }
}
