//! Transactions and the pipeline that turns them into balances, breakdowns and
//! history views.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and database functions for storing and counting transactions
//! - The normalizer that reads loosely shaped backup payloads
//! - Aggregation, filtering, grouping and CSV export
//! - View handlers for the dashboard and history pages and the JSON API

mod aggregate;
mod api;
mod chart;
mod core;
mod create_endpoint;
mod dashboard_page;
mod delete_endpoint;
mod export;
mod export_endpoint;
mod filter;
mod history_page;
mod import_endpoint;
mod normalize;
mod view;

pub use self::core::{
    NewTransaction, Transaction, TransactionCounts, TransactionType, count_transactions,
    create_transaction, create_transaction_table, list_transactions,
};
pub use aggregate::total_balance;
pub use api::{get_transaction_count, get_transactions_json};
pub use create_endpoint::create_transaction_endpoint;
pub use dashboard_page::get_dashboard_page;
pub use delete_endpoint::delete_transaction_endpoint;
pub use export_endpoint::export_transactions_endpoint;
pub use history_page::get_history_page;
pub use import_endpoint::import_transactions;

#[cfg(test)]
pub use aggregate::CategoryTotal;
#[cfg(test)]
pub use filter::FilterQuery;
