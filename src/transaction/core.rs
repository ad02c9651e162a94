//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};

use crate::{Error, auth::UserID};

/// Alias for the integer type used for transaction IDs.
pub type TransactionId = i64;

/// The category given to transactions that do not specify one.
pub const DEFAULT_CATEGORY: &str = "Other";

/// The categories offered in the add-transaction form.
///
/// Any other category is also accepted.
pub const SUGGESTED_CATEGORIES: [&str; 5] = ["Food", "Transport", "Shopping", "Bills", "Other"];

// ============================================================================
// MODELS
// ============================================================================

/// Whether money was earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money earned, adds to the balance.
    Income,
    /// Money spent, subtracts from the balance.
    Expense,
}

impl TransactionType {
    /// The lowercase name used in forms, JSON and the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(Error::InvalidTransactionType(other.to_owned())),
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// An income or expense recorded by a user.
///
/// `amount` is always a magnitude, the sign comes from `kind`.
/// Records read from an imported file may have a non-finite `amount` or no
/// `created_at`, see `normalize_transactions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// A short description of what the transaction was for.
    pub title: String,
    /// How much money was earned or spent.
    pub amount: f64,
    /// Whether the transaction is income or an expense.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Free text category, e.g. "Food".
    pub category: String,
    /// When the transaction was recorded.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
}

/// A validated transaction that is ready to be inserted into the database.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    title: String,
    amount: f64,
    kind: TransactionType,
    category: String,
    created_at: Option<OffsetDateTime>,
}

impl NewTransaction {
    /// Validate the fields of a new transaction.
    ///
    /// The title and category are trimmed and an empty category becomes
    /// [DEFAULT_CATEGORY].
    ///
    /// # Errors
    /// Returns [Error::EmptyTitle] for a blank title, or [Error::InvalidAmount]
    /// if `amount` is negative or not finite.
    pub fn new(
        title: &str,
        amount: f64,
        kind: TransactionType,
        category: &str,
    ) -> Result<Self, Error> {
        let title = title.trim();

        if title.is_empty() {
            return Err(Error::EmptyTitle);
        }

        if !amount.is_finite() || amount < 0.0 {
            return Err(Error::InvalidAmount(amount.to_string()));
        }

        let category = match category.trim() {
            "" => DEFAULT_CATEGORY,
            category => category,
        };

        Ok(Self {
            title: title.to_owned(),
            amount,
            kind,
            category: category.to_owned(),
            created_at: None,
        })
    }

    /// Validate a new transaction from raw form fields.
    ///
    /// # Errors
    /// Returns the errors from [NewTransaction::new], plus
    /// [Error::InvalidAmount] if `amount` is not a number and
    /// [Error::InvalidTransactionType] if `kind` is not "income" or "expense".
    pub fn parse(title: &str, amount: &str, kind: &str, category: &str) -> Result<Self, Error> {
        let parsed_amount: f64 = amount
            .trim()
            .parse()
            .map_err(|_| Error::InvalidAmount(amount.to_owned()))?;

        if !parsed_amount.is_finite() || parsed_amount < 0.0 {
            return Err(Error::InvalidAmount(amount.to_owned()));
        }

        let kind = kind.parse()?;

        Self::new(title, parsed_amount, kind, category)
    }

    /// Set when the transaction was recorded.
    ///
    /// Defaults to the time of insertion.
    pub fn created_at(mut self, created_at: OffsetDateTime) -> Self {
        self.created_at = Some(created_at);
        self
    }
}

/// How many transactions a user has recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransactionCounts {
    /// The number of transactions of either type.
    pub total: i64,
    /// The number of income transactions.
    pub income: i64,
    /// The number of expense transactions.
    pub expense: i64,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the transaction table and its indexes.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                amount REAL NOT NULL,
                type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
                category TEXT NOT NULL DEFAULT 'Other',
                created_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Used by the history page and the JSON list, both ordered by creation time.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_created_at
            ON \"transaction\"(user_id, created_at);",
        (),
    )?;

    Ok(())
}

/// Create a new transaction for `user_id`.
///
/// The creation time is stored in UTC and defaults to now.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error, e.g. `user_id` does not
/// refer to a registered user.
pub fn create_transaction(
    user_id: UserID,
    transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let created_at = transaction
        .created_at
        .unwrap_or_else(OffsetDateTime::now_utc)
        .to_offset(UtcOffset::UTC);

    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (user_id, title, amount, type, category, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id, title, amount, type, category, created_at",
        )?
        .query_row(
            (
                user_id.as_i64(),
                transaction.title,
                transaction.amount,
                transaction.kind,
                transaction.category,
                created_at,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Get every transaction belonging to `user_id`, newest first.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn list_transactions(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, title, amount, type, category, created_at
             FROM \"transaction\"
             WHERE user_id = :user_id
             ORDER BY created_at DESC, id DESC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_transaction_row)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(Error::from)
}

/// Delete the transaction `id` belonging to `user_id`.
///
/// # Errors
/// Returns [Error::DeleteMissingTransaction] if there is no such transaction
/// or it belongs to another user.
pub fn delete_transaction(
    user_id: UserID,
    id: TransactionId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    match rows_affected {
        0 => Err(Error::DeleteMissingTransaction),
        _ => Ok(()),
    }
}

/// Count the transactions belonging to `user_id` by type.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn count_transactions(
    user_id: UserID,
    connection: &Connection,
) -> Result<TransactionCounts, Error> {
    connection
        .query_row(
            "SELECT COUNT(*),
                    COUNT(CASE WHEN type = 'income' THEN 1 END),
                    COUNT(CASE WHEN type = 'expense' THEN 1 END)
             FROM \"transaction\" WHERE user_id = ?1",
            [user_id.as_i64()],
            |row| {
                Ok(TransactionCounts {
                    total: row.get(0)?,
                    income: row.get(1)?,
                    expense: row.get(2)?,
                })
            },
        )
        .map_err(Error::from)
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let title = row.get(1)?;
    let amount = row.get(2)?;
    let kind = row.get(3)?;
    let category = row.get(4)?;
    let created_at: OffsetDateTime = row.get(5)?;

    Ok(Transaction {
        id,
        title,
        amount,
        kind,
        category,
        created_at: Some(created_at),
    })
}

// ============================================================================
// TESTS
// ============================================================================
