// 🔍 Deduplication Engine - exact-match duplicates, first occurrence wins
//
// Two rows are duplicates when Transaction ID, Customer Name, Product,
// Amount and Date are all identical. Category and Notes are ignored.

use crate::table::{RawRecord, RawTable};
use std::collections::HashMap;
use tracing::debug;

// ============================================================================
// DUPLICATE KEY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DuplicateKey {
    transaction_id: String,
    customer_name: String,
    product: String,
    amount: String,
    date: String,
}

impl DuplicateKey {
    pub fn of(record: &RawRecord) -> Self {
        DuplicateKey {
            transaction_id: record.transaction_id.dedup_key(),
            customer_name: record.customer_name.dedup_key(),
            product: record.product.dedup_key(),
            amount: record.amount.dedup_key(),
            date: record.date.dedup_key(),
        }
    }
}

// ============================================================================
// DUPLICATE MATCH RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateMatch {
    /// Source row of the first occurrence (kept)
    pub kept_row: usize,

    /// Source row of the later occurrence (removed)
    pub removed_row: usize,
}

// ============================================================================
// DEDUPLICATION ENGINE
// ============================================================================

#[derive(Debug, Default)]
pub struct DeduplicationEngine;

impl DeduplicationEngine {
    pub fn new() -> Self {
        DeduplicationEngine
    }

    /// Drop later occurrences, keeping original order of the survivors
    pub fn remove_duplicates(&self, table: RawTable) -> (RawTable, Vec<DuplicateMatch>) {
        let mut first_seen: HashMap<DuplicateKey, usize> = HashMap::new();
        let mut matches = Vec::new();
        let mut kept = Vec::with_capacity(table.len());

        for record in table.records {
            let key = DuplicateKey::of(&record);
            if let Some(&kept_row) = first_seen.get(&key) {
                debug!(kept_row, removed_row = record.source_row, "duplicate row removed");
                matches.push(DuplicateMatch {
                    kept_row,
                    removed_row: record.source_row,
                });
                continue;
            }

            first_seen.insert(key, record.source_row);
            kept.push(record);
        }

        (RawTable::new(kept), matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;

    fn create_test_record(row: usize, id: &str, name: &str, amount: Cell, notes: &str) -> RawRecord {
        RawRecord {
            source_row: row,
            transaction_id: Cell::text(id),
            customer_name: Cell::text(name),
            product: Cell::text("Laptop"),
            category: Cell::text("Electronics"),
            amount,
            date: Cell::text("2024-01-15"),
            notes: Cell::text(notes),
        }
    }

    fn dedup(records: Vec<RawRecord>) -> (Vec<usize>, Vec<DuplicateMatch>) {
        let (table, matches) = DeduplicationEngine::new().remove_duplicates(RawTable::new(records));
        (table.records.iter().map(|r| r.source_row).collect(), matches)
    }

    #[test]
    fn test_exact_duplicate_detected() {
        let (kept, matches) = dedup(vec![
            create_test_record(2, "T001", "John Doe", Cell::Number(1200.0), ""),
            create_test_record(3, "T001", "John Doe", Cell::Number(1200.0), ""),
        ]);

        assert_eq!(kept, vec![2]);
        assert_eq!(matches, vec![DuplicateMatch { kept_row: 2, removed_row: 3 }]);
    }

    #[test]
    fn test_notes_and_category_ignored() {
        let mut second = create_test_record(3, "T001", "John Doe", Cell::Number(1200.0), "gift");
        second.category = Cell::text("Computers");

        let (kept, matches) = dedup(vec![
            create_test_record(2, "T001", "John Doe", Cell::Number(1200.0), ""),
            second,
        ]);

        assert_eq!(kept, vec![2]);
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn test_case_sensitive_names() {
        // Names are title-cased before this stage; raw case differences stay distinct
        let (kept, matches) = dedup(vec![
            create_test_record(2, "T001", "john doe", Cell::Number(1200.0), ""),
            create_test_record(3, "T001", "John Doe", Cell::Number(1200.0), ""),
        ]);

        assert_eq!(kept, vec![2, 3]);
        assert!(matches.is_empty());
    }

    #[test]
    fn test_different_amounts_not_duplicates() {
        let (kept, matches) = dedup(vec![
            create_test_record(2, "T001", "John Doe", Cell::Number(1200.0), ""),
            create_test_record(3, "T001", "John Doe", Cell::Number(1200.01), ""),
            create_test_record(4, "T001", "John Doe", Cell::text("1200"), ""),
        ]);

        assert_eq!(kept, vec![2, 3, 4]);
        assert!(matches.is_empty());
    }

    #[test]
    fn test_remove_keeps_first_in_order() {
        let table = RawTable::new(vec![
            create_test_record(2, "T001", "A", Cell::Number(10.0), "first"),
            create_test_record(3, "T002", "B", Cell::Number(20.0), ""),
            create_test_record(4, "T001", "A", Cell::Number(10.0), "second"),
            create_test_record(5, "T003", "C", Cell::Number(30.0), ""),
            create_test_record(6, "T001", "A", Cell::Number(10.0), "third"),
        ]);

        let (deduped, matches) = DeduplicationEngine::new().remove_duplicates(table);

        let rows: Vec<usize> = deduped.records.iter().map(|r| r.source_row).collect();
        assert_eq!(rows, vec![2, 3, 5]);
        assert_eq!(deduped.records[0].notes, Cell::text("first"));
        assert_eq!(matches.len(), 2);
        assert!(matches.iter().all(|m| m.kept_row == 2));
    }

    #[test]
    fn test_blank_cells_match_each_other() {
        let (kept, matches) = dedup(vec![
            create_test_record(2, "", "A", Cell::Empty, ""),
            create_test_record(3, "", "A", Cell::Empty, ""),
        ]);

        assert_eq!(kept, vec![2]);
        assert_eq!(matches.len(), 1);
    }
}
