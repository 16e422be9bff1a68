// 📊 Aggregator - group-and-reduce over the cleaned table
//
// Three independent summaries (category, customer, day) plus the headline
// statistics. Each one walks the table on its own, so their totals can be
// cross-checked against each other afterwards.

use crate::table::TransactionTable;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

/// Round half-to-even at 2 decimals
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

// ============================================================================
// SUMMARY TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct SalesStatistics {
    pub total_sales: f64,
    /// None for an empty table
    pub average_sale: Option<f64>,
    pub highest_sale: Option<f64>,
    pub lowest_sale: Option<f64>,
    pub transaction_count: usize,
    pub unique_customers: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategorySummary {
    pub category: String,
    pub total_sales: f64,
    pub average_sale: f64,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomerSummary {
    pub customer_name: String,
    pub total_spent: f64,
    pub purchases: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub daily_sales: f64,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SalesSummary {
    pub statistics: SalesStatistics,
    pub categories: Vec<CategorySummary>,
    pub customers: Vec<CustomerSummary>,
    pub daily: Vec<DailySummary>,
}

impl SalesSummary {
    /// Largest gap between the grand total and any summary's column total
    pub fn total_discrepancy(&self) -> f64 {
        let grand = self.statistics.total_sales;
        let by_category: f64 = self.categories.iter().map(|c| c.total_sales).sum();
        let by_customer: f64 = self.customers.iter().map(|c| c.total_spent).sum();
        let by_day: f64 = self.daily.iter().map(|d| d.daily_sales).sum();

        [by_category, by_customer, by_day]
            .iter()
            .map(|total| (total - grand).abs())
            .fold(0.0, f64::max)
    }

    /// Totals agree within `tolerance` (per-group rounding can drift by cents)
    pub fn totals_agree(&self, tolerance: f64) -> bool {
        self.total_discrepancy() <= tolerance
    }
}

// ============================================================================
// AGGREGATION
// ============================================================================

#[derive(Default)]
struct Accumulator {
    sum: f64,
    count: usize,
}

impl Accumulator {
    fn add(&mut self, amount: f64) {
        self.sum += amount;
        self.count += 1;
    }

    fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }
}

pub fn compute_statistics(table: &TransactionTable) -> SalesStatistics {
    let total_sales: f64 = table.amounts().sum();
    let transaction_count = table.len();

    let average_sale = if transaction_count == 0 {
        None
    } else {
        Some(total_sales / transaction_count as f64)
    };

    let highest_sale = table.amounts().reduce(f64::max);
    let lowest_sale = table.amounts().reduce(f64::min);

    let unique_customers = table
        .iter()
        .map(|tx| tx.customer_name.as_str())
        .collect::<BTreeSet<_>>()
        .len();

    SalesStatistics {
        total_sales,
        average_sale,
        highest_sale,
        lowest_sale,
        transaction_count,
        unique_customers,
    }
}

/// One row per category, ascending by name
pub fn summarize_by_category(table: &TransactionTable) -> Vec<CategorySummary> {
    let mut groups: BTreeMap<&str, Accumulator> = BTreeMap::new();
    for tx in table.iter() {
        groups.entry(tx.category.as_str()).or_default().add(tx.amount);
    }

    groups
        .into_iter()
        .map(|(category, acc)| CategorySummary {
            category: category.to_string(),
            total_sales: round2(acc.sum),
            average_sale: round2(acc.mean()),
            transaction_count: acc.count,
        })
        .collect()
}

/// One row per customer, highest total first (ties by name)
pub fn summarize_by_customer(table: &TransactionTable) -> Vec<CustomerSummary> {
    let mut groups: BTreeMap<&str, Accumulator> = BTreeMap::new();
    for tx in table.iter() {
        groups.entry(tx.customer_name.as_str()).or_default().add(tx.amount);
    }

    let mut customers: Vec<CustomerSummary> = groups
        .into_iter()
        .map(|(name, acc)| CustomerSummary {
            customer_name: name.to_string(),
            total_spent: round2(acc.sum),
            purchases: acc.count,
        })
        .collect();

    customers.sort_by(|a, b| b.total_spent.total_cmp(&a.total_spent));
    customers
}

/// One row per calendar day, oldest first; time of day is discarded
pub fn summarize_by_day(table: &TransactionTable) -> Vec<DailySummary> {
    let mut groups: BTreeMap<NaiveDate, Accumulator> = BTreeMap::new();
    for tx in table.iter() {
        groups.entry(tx.date.date()).or_default().add(tx.amount);
    }

    groups
        .into_iter()
        .map(|(date, acc)| DailySummary {
            date,
            daily_sales: round2(acc.sum),
            transaction_count: acc.count,
        })
        .collect()
}

pub fn aggregate(table: &TransactionTable) -> SalesSummary {
    SalesSummary {
        statistics: compute_statistics(table),
        categories: summarize_by_category(table),
        customers: summarize_by_customer(table),
        daily: summarize_by_day(table),
    }
}
