//! The JSON endpoints for reading transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{AppState, Error, auth::UserID};

use super::core::{count_transactions, list_transactions};

/// The state needed by the JSON transaction endpoints.
#[derive(Debug, Clone)]
pub struct TransactionApiState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionApiState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// List the user's transactions as JSON, newest first.
pub async fn get_transactions_json(
    State(state): State<TransactionApiState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_json_response();
        }
    };

    match list_transactions(user_id, &connection) {
        Ok(transactions) => Json(transactions).into_response(),
        Err(error) => {
            tracing::error!("could not get transactions: {error}");
            error.into_json_response()
        }
    }
}

/// Count the user's transactions by type as JSON, e.g.
/// `{"total": 3, "income": 1, "expense": 2}`.
pub async fn get_transaction_count(
    State(state): State<TransactionApiState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_json_response();
        }
    };

    match count_transactions(user_id, &connection) {
        Ok(counts) => Json(counts).into_response(),
        Err(error) => {
            tracing::error!("could not count transactions: {error}");
            error.into_json_response()
        }
    }
}
