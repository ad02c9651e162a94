//! Defines the endpoint for creating a new transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::Deserialize;

use crate::{AppState, Error, auth::UserID, endpoints};

use super::core::{NewTransaction, create_transaction};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating a transaction.
///
/// Fields are kept as text so that bad input produces a helpful alert
/// instead of a generic rejection.
#[derive(Debug, Deserialize)]
pub struct TransactionForm {
    /// A short description of the transaction.
    #[serde(default)]
    pub title: String,
    /// The amount of money earned or spent.
    #[serde(default)]
    pub amount: String,
    /// Either "income" or "expense".
    #[serde(default, rename = "type")]
    pub kind: String,
    /// The category, defaults to "Other" when empty.
    #[serde(default)]
    pub category: Option<String>,
}

/// A route handler for creating a new transaction, redirects to the dashboard on success.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<TransactionForm>,
) -> Response {
    let transaction = match NewTransaction::parse(
        &form.title,
        &form.amount,
        &form.kind,
        form.category.as_deref().unwrap_or_default(),
    ) {
        Ok(transaction) => transaction,
        Err(error) => {
            tracing::debug!("rejected new transaction: {error}");
            return error.into_alert_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    if let Err(error) = create_transaction(user_id, transaction, &connection) {
        tracing::error!("could not create transaction: {error}");

        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
