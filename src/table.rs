// 📋 Transaction Table - raw cells in, typed rows out
//
// RawTable carries loosely typed cells through the cleaning stages.
// TransactionTable is what the aggregator, writer and reporter see.

use chrono::NaiveDateTime;
use std::fmt;

// ============================================================================
// COLUMN NAMES (fixed layout, input and output)
// ============================================================================

pub const COL_TRANSACTION_ID: &str = "Transaction ID";
pub const COL_CUSTOMER_NAME: &str = "Customer Name";
pub const COL_PRODUCT: &str = "Product";
pub const COL_CATEGORY: &str = "Category";
pub const COL_AMOUNT: &str = "Amount";
pub const COL_DATE: &str = "Date";
pub const COL_NOTES: &str = "Notes";

/// Output order of the cleaned sheet
pub const COLUMNS: [&str; 7] = [
    COL_TRANSACTION_ID,
    COL_CUSTOMER_NAME,
    COL_PRODUCT,
    COL_CATEGORY,
    COL_AMOUNT,
    COL_DATE,
    COL_NOTES,
];

pub const DATETIME_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ============================================================================
// CELL
// ============================================================================

/// One spreadsheet cell before type coercion
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl Cell {
    /// CSV fields: blank → Empty, numeric-looking → Number, else Text
    pub fn from_csv_field(field: &str) -> Cell {
        if field.is_empty() {
            return Cell::Empty;
        }

        match field.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Cell::Number(n),
            _ => Cell::Text(field.to_string()),
        }
    }

    pub fn text(value: &str) -> Cell {
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Text rendering used for name/product/category/notes columns
    pub fn to_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            other => other.to_string(),
        }
    }

    /// Canonical form used for duplicate detection
    ///
    /// Numbers compare by value (1001 == 1001.0), text compares exactly,
    /// and two blanks are equal to each other.
    pub fn dedup_key(&self) -> String {
        match self {
            Cell::Empty => "e:".to_string(),
            Cell::Text(s) => format!("s:{}", s),
            // -0.0 and 0.0 are the same amount
            Cell::Number(n) => format!("n:{}", if *n == 0.0 { 0.0 } else { *n }),
            Cell::Bool(b) => format!("b:{}", b),
            Cell::DateTime(dt) => format!("d:{}", dt.format(DATETIME_DISPLAY_FORMAT)),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => write!(f, "NaN"),
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{:.0}", n)
                } else {
                    write!(f, "{}", n)
                }
            }
            Cell::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            Cell::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_DISPLAY_FORMAT)),
        }
    }
}

// ============================================================================
// RAW TABLE (cleaning stages)
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// 1-based row in the source sheet (header is row 1)
    pub source_row: usize,
    pub transaction_id: Cell,
    pub customer_name: Cell,
    pub product: Cell,
    pub category: Cell,
    pub amount: Cell,
    pub date: Cell,
    pub notes: Cell,
}

impl RawRecord {
    /// Cells in output column order
    pub fn cells(&self) -> [&Cell; 7] {
        [
            &self.transaction_id,
            &self.customer_name,
            &self.product,
            &self.category,
            &self.amount,
            &self.date,
            &self.notes,
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub records: Vec<RawRecord>,
}

impl RawTable {
    pub fn new(records: Vec<RawRecord>) -> Self {
        RawTable { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ============================================================================
// TRANSACTION TABLE (cleaned)
// ============================================================================

/// A row that passed every cleaning stage
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub transaction_id: Cell,
    pub customer_name: String,
    pub product: String,
    pub category: String,
    /// Always finite and > 0
    pub amount: f64,
    pub date: NaiveDateTime,
    pub notes: String,
}

/// Cleaned table; position in `transactions` is the contiguous row index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionTable {
    pub transactions: Vec<Transaction>,
}

impl TransactionTable {
    pub fn new(transactions: Vec<Transaction>) -> Self {
        TransactionTable { transactions }
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter()
    }

    pub fn amounts(&self) -> impl Iterator<Item = f64> + '_ {
        self.transactions.iter().map(|tx| tx.amount)
    }
}
