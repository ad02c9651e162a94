//! Turns loosely shaped JSON, such as an uploaded backup file, into transactions.

use serde::Deserialize;
use serde_json::{Map, Value};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use super::core::{DEFAULT_CATEGORY, Transaction, TransactionType};

/// The shapes a list of transactions may arrive in, tried in order.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Envelope {
    List(Vec<Value>),
    Data { data: Vec<Value> },
    Transactions { transactions: Vec<Value> },
    Nested { data: NestedTransactions },
}

#[derive(Debug, Deserialize)]
struct NestedTransactions {
    transactions: Vec<Value>,
}

impl Envelope {
    fn into_records(self) -> Vec<Value> {
        match self {
            Envelope::List(records)
            | Envelope::Data { data: records }
            | Envelope::Transactions {
                transactions: records,
            }
            | Envelope::Nested {
                data: NestedTransactions {
                    transactions: records,
                },
            } => records,
        }
    }
}

/// Extract the transactions from `payload`.
///
/// `payload` may be a list of transactions, or a list nested under `data`,
/// `transactions` or `data.transactions`. Anything else yields no
/// transactions. Records that are not objects or have a type other than
/// "income" or "expense" are skipped.
///
/// Amounts that cannot be read as a number become NaN rather than failing,
/// so callers that sum amounts must skip non-finite values.
pub fn normalize_transactions(payload: &Value) -> Vec<Transaction> {
    let records = match Envelope::deserialize(payload) {
        Ok(envelope) => envelope.into_records(),
        Err(_) => {
            tracing::debug!("Payload does not contain a list of transactions");
            return Vec::new();
        }
    };

    records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| normalize_record(index, record))
        .collect()
}

fn normalize_record(index: usize, record: &Value) -> Option<Transaction> {
    let Some(fields) = record.as_object() else {
        tracing::warn!("Skipping record {index}: expected an object, got {record}");
        return None;
    };

    let kind = match fields.get("type").and_then(Value::as_str).map(str::parse) {
        Some(Ok(kind)) => kind,
        _ => {
            tracing::warn!(
                "Skipping record {index}: type must be \"income\" or \"expense\", got {:?}",
                fields.get("type")
            );
            return None;
        }
    };

    Some(Transaction {
        id: fields.get("id").and_then(Value::as_i64).unwrap_or(0),
        title: text_field(fields, "title").unwrap_or_default(),
        amount: coerce_amount(fields.get("amount")),
        kind,
        category: text_field(fields, "category")
            .filter(|category| !category.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_owned()),
        created_at: fields.get("createdAt").and_then(parse_timestamp),
    })
}

fn text_field(fields: &Map<String, Value>, name: &str) -> Option<String> {
    match fields.get(name) {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text.to_owned()),
        Some(other) => Some(other.to_string()),
    }
}

/// Read an amount the way a loosely typed client would have sent it.
fn coerce_amount(amount: Option<&Value>) -> f64 {
    match amount {
        None => f64::NAN,
        Some(Value::Null) => 0.0,
        Some(Value::Number(number)) => number.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(text)) => match text.trim() {
            "" => 0.0,
            text => text.parse().unwrap_or(f64::NAN),
        },
        Some(Value::Bool(true)) => 1.0,
        Some(Value::Bool(false)) => 0.0,
        Some(Value::Array(_) | Value::Object(_)) => f64::NAN,
    }
}

/// Parse an RFC 3339 string or a Unix timestamp in milliseconds.
fn parse_timestamp(value: &Value) -> Option<OffsetDateTime> {
    match value {
        Value::String(text) => OffsetDateTime::parse(text.trim(), &Rfc3339).ok(),
        Value::Number(number) => {
            let millis = number.as_f64().filter(|millis| millis.is_finite())?;
            let nanos = (millis as i128).checked_mul(1_000_000)?;
            OffsetDateTime::from_unix_timestamp_nanos(nanos).ok()
        }
        _ => None,
    }
}
