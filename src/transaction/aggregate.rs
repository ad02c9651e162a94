//! Balance and category totals derived from a list of transactions.
//!
//! Amounts that are not finite, e.g. from an unreadable imported amount, are
//! skipped by every function here.

use serde::Serialize;

use super::core::{Transaction, TransactionType};

/// The sums of income and expenses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    /// The sum of all income.
    pub income: f64,
    /// The sum of all expenses as a positive number.
    pub expense: f64,
}

impl Totals {
    /// Income minus expenses.
    pub fn balance(&self) -> f64 {
        self.income - self.expense
    }
}

/// The total spent in a single category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    /// The category name.
    pub category: String,
    /// The sum of the expenses in the category.
    pub total: f64,
}

/// Sum income and expenses separately.
pub fn totals(transactions: &[Transaction]) -> Totals {
    transactions
        .iter()
        .filter(|transaction| transaction.amount.is_finite())
        .fold(Totals::default(), |mut totals, transaction| {
            match transaction.kind {
                TransactionType::Income => totals.income += transaction.amount,
                TransactionType::Expense => totals.expense += transaction.amount,
            }

            totals
        })
}

/// Income minus expenses over every transaction.
pub fn total_balance(transactions: &[Transaction]) -> f64 {
    totals(transactions).balance()
}

/// Sum expenses per category.
///
/// Categories are listed in the order they are first seen in `transactions`.
pub fn category_breakdown(transactions: &[Transaction]) -> Vec<CategoryTotal> {
    let mut breakdown: Vec<CategoryTotal> = Vec::new();

    for transaction in transactions {
        if transaction.kind != TransactionType::Expense || !transaction.amount.is_finite() {
            continue;
        }

        match breakdown
            .iter_mut()
            .find(|bucket| bucket.category == transaction.category)
        {
            Some(bucket) => bucket.total += transaction.amount,
            None => breakdown.push(CategoryTotal {
                category: transaction.category.clone(),
                total: transaction.amount,
            }),
        }
    }

    breakdown
}
