//! Defines the endpoint for downloading transactions as a CSV file.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    http::{
        StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{AppState, Error, auth::UserID, timezone::local_offset_or_error};

use super::{
    core::list_transactions,
    export::export_csv,
    filter::{FilterQuery, TransactionFilter, filter_transactions},
};

/// The state needed to export transactions.
#[derive(Debug, Clone)]
pub struct ExportState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Asia/Jakarta".
    pub local_timezone: String,
}

impl FromRef<AppState> for ExportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Download the transactions matching the query string filters as
/// `transactions.csv`.
///
/// All transactions are exported when nothing matches the filters. Responds
/// with `204 No Content` when the user has no transactions at all.
pub async fn export_transactions_endpoint(
    State(state): State<ExportState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<FilterQuery>,
) -> Result<Response, Error> {
    let local_offset = local_offset_or_error(&state.local_timezone)?;

    let transactions = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        list_transactions(user_id, &connection)
            .inspect_err(|error| tracing::error!("could not get transactions: {error}"))?
    };

    let filter = TransactionFilter::from(query);
    let filtered = filter_transactions(&transactions, &filter, local_offset);

    match export_csv(&filtered, &transactions, local_offset)? {
        Some(csv) => Ok((
            [
                (CONTENT_TYPE, "text/csv; charset=utf-8"),
                (CONTENT_DISPOSITION, "attachment; filename=\"transactions.csv\""),
            ],
            csv,
        )
            .into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Query, State},
        http::StatusCode,
    };
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        auth::{PasswordHash, UserID, create_user},
        db::initialize,
        test_utils::{assert_content_type, get_header, response_text},
        transaction::{FilterQuery, NewTransaction, create_transaction},
    };

    use super::{ExportState, export_transactions_endpoint};

    fn get_test_state() -> (ExportState, UserID) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user = create_user(
            "test@example.com",
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .unwrap();

        let state = ExportState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Asia/Jakarta".to_owned(),
        };

        (state, user.id)
    }

    fn add(state: &ExportState, user_id: UserID, title: &str, category: &str) {
        let connection = state.db_connection.lock().unwrap();
        create_transaction(
            user_id,
            NewTransaction::parse(title, "45000", "expense", category)
                .unwrap()
                .created_at(datetime!(2025-01-15 01:30:05 UTC)),
            &connection,
        )
        .unwrap();
    }

    #[tokio::test]
    async fn downloads_csv_attachment() {
        let (state, user_id) = get_test_state();
        add(&state, user_id, "Coffee", "Food");

        let response = export_transactions_endpoint(
            State(state),
            Extension(user_id),
            Query(FilterQuery::default()),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_content_type(&response, "text/csv; charset=utf-8");
        assert_eq!(
            get_header(&response, "content-disposition"),
            "attachment; filename=\"transactions.csv\""
        );
        assert_eq!(
            response_text(response).await,
            "Title,Amount,Type,Category,Date\nCoffee,45000,expense,Food,15/01/2025 08:30:05"
        );
    }

    #[tokio::test]
    async fn exports_filtered_transactions() {
        let (state, user_id) = get_test_state();
        add(&state, user_id, "Coffee", "Food");
        add(&state, user_id, "Bus", "Transport");
        let query = FilterQuery {
            category: "Transport".to_owned(),
            ..Default::default()
        };

        let response = export_transactions_endpoint(State(state), Extension(user_id), Query(query))
            .await
            .unwrap();

        let csv = response_text(response).await;
        assert!(csv.contains("Bus"));
        assert!(!csv.contains("Coffee"));
    }

    #[tokio::test]
    async fn falls_back_to_everything_when_nothing_matches() {
        let (state, user_id) = get_test_state();
        add(&state, user_id, "Coffee", "Food");
        let query = FilterQuery {
            search: "nothing like this".to_owned(),
            ..Default::default()
        };

        let response = export_transactions_endpoint(State(state), Extension(user_id), Query(query))
            .await
            .unwrap();

        assert!(response_text(response).await.contains("Coffee"));
    }

    #[tokio::test]
    async fn no_content_without_transactions() {
        let (state, user_id) = get_test_state();

        let response = export_transactions_endpoint(
            State(state),
            Extension(user_id),
            Query(FilterQuery::default()),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}
