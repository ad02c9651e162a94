//! Defines the endpoint for restoring transactions from a JSON backup file.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Multipart, State, multipart::Field},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde_json::Value;

use crate::{AppState, Error, alert::Alert, auth::UserID};

use super::{
    core::{NewTransaction, Transaction, create_transaction},
    normalize::normalize_transactions,
};

/// The state needed for importing transactions.
#[derive(Debug, Clone)]
pub struct ImportState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ImportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Route handler for importing transactions from uploaded JSON files.
///
/// Each file may hold a list of transactions or a list wrapped in an object,
/// see [normalize_transactions]. Transactions without a title, with an
/// unreadable amount or with a negative amount are skipped. Imported
/// transactions keep their original creation time when it can be read.
pub async fn import_transactions(
    State(state): State<ImportState>,
    Extension(user_id): Extension<UserID>,
    mut multipart: Multipart,
) -> Result<Response, Response> {
    let mut transactions = Vec::new();
    let mut file_count = 0;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(error) => {
                tracing::error!("Could not read multipart form: {error}");
                return Err(Error::MultipartError(error.body_text()).into_alert_response());
            }
        };

        let payload = parse_multipart_field(field)
            .await
            .map_err(|error| error.into_alert_response())?;

        file_count += 1;
        transactions.extend(normalize_transactions(&payload));
    }

    if file_count == 0 {
        return Err(Error::MultipartError("No file was uploaded.".to_owned()).into_alert_response());
    }

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError.into_alert_response()
    })?;

    let (imported_count, skipped_count) =
        import_transaction_list(user_id, &transactions, &connection)
            .inspect_err(|error| tracing::error!("Failed to import transactions: {error}"))
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Alert::Error {
                        message: "Import failed".to_owned(),
                        details: "An unexpected error occurred, please try again later".to_owned(),
                    }
                    .into_html(),
                )
                    .into_response()
            })?;

    tracing::info!("Imported {imported_count} transactions, skipped {skipped_count}");

    let alert = Alert::Success {
        message: "Import complete".to_owned(),
        details: format!(
            "Imported {imported_count} {}, skipped {skipped_count} invalid {}.",
            plural(imported_count),
            plural(skipped_count)
        ),
    };

    Ok((StatusCode::CREATED, alert.into_html()).into_response())
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        "transaction"
    } else {
        "transactions"
    }
}

async fn parse_multipart_field(field: Field<'_>) -> Result<Value, Error> {
    let file_name = field.file_name().unwrap_or("upload").to_owned();

    let data = match field.text().await {
        Ok(data) => data,
        Err(error) => {
            tracing::error!("Could not read data from multipart form field: {error}");
            return Err(Error::MultipartError(
                "Could not read data from multipart form field.".to_owned(),
            ));
        }
    };

    serde_json::from_str(&data).map_err(|error| {
        tracing::debug!("{file_name} is not valid JSON: {error}");
        Error::InvalidJson(error.to_string())
    })
}

/// Insert the valid transactions in a single SQL transaction.
///
/// Returns the number of imported and skipped transactions.
fn import_transaction_list(
    user_id: UserID,
    transactions: &[Transaction],
    connection: &Connection,
) -> Result<(usize, usize), Error> {
    let sql_transaction = connection.unchecked_transaction()?;
    let mut imported_count = 0;
    let mut skipped_count = 0;

    for transaction in transactions {
        let new_transaction = match NewTransaction::new(
            &transaction.title,
            transaction.amount,
            transaction.kind,
            &transaction.category,
        ) {
            Ok(new_transaction) => new_transaction,
            Err(error) => {
                tracing::debug!("Skipping imported transaction {}: {error}", transaction.id);
                skipped_count += 1;
                continue;
            }
        };

        let new_transaction = match transaction.created_at {
            Some(created_at) => new_transaction.created_at(created_at),
            None => new_transaction,
        };

        create_transaction(user_id, new_transaction, &sql_transaction)?;
        imported_count += 1;
    }

    sql_transaction.commit()?;

    Ok((imported_count, skipped_count))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{FromRequest, Multipart, State},
        http::{Request, StatusCode},
    };
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        auth::{PasswordHash, UserID, create_user},
        db::initialize,
        endpoints,
        test_utils::parse_html_fragment,
        transaction::list_transactions,
    };

    use super::{ImportState, import_transactions};

    fn get_test_state() -> (ImportState, UserID) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user = create_user(
            "test@example.com",
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .unwrap();

        let state = ImportState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        (state, user.id)
    }

    async fn must_make_multipart(json_strings: &[&str]) -> Multipart {
        let boundary = "MY_BOUNDARY123456789";
        let boundary_start = format!("--{boundary}");
        let boundary_end = format!("--{boundary}--");

        let mut lines: Vec<&str> = Vec::new();

        for json_string in json_strings {
            lines.push(&boundary_start);
            lines.push("Content-Disposition: form-data; name=\"file\"; filename=\"backup.json\"");
            lines.push("Content-Type: application/json");
            lines.push("");
            lines.push(json_string);
        }

        lines.push(&boundary_end);

        let data = lines.join("\r\n").into_bytes();

        let request = Request::builder()
            .method("POST")
            .uri(endpoints::IMPORT)
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(data.into())
            .unwrap();

        Multipart::from_request(request, &{}).await.unwrap()
    }

    async fn alert_text(response: axum::response::Response) -> String {
        parse_html_fragment(response)
            .await
            .root_element()
            .text()
            .collect::<String>()
    }

    #[tokio::test]
    async fn imports_wrapped_backup() {
        let (state, user_id) = get_test_state();
        let backup = r#"{"data": [
            {"id": 9, "title": "Coffee", "amount": "45000", "type": "expense",
             "category": "Food", "createdAt": "2025-01-15T08:30:00Z"},
            {"id": 10, "title": "Salary", "amount": 5000000, "type": "income"}
        ]}"#;

        let response = import_transactions(
            State(state.clone()),
            Extension(user_id),
            must_make_multipart(&[backup]).await,
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let connection = state.db_connection.lock().unwrap();
        let transactions = list_transactions(user_id, &connection).unwrap();
        assert_eq!(transactions.len(), 2);
        let coffee = transactions
            .iter()
            .find(|transaction| transaction.title == "Coffee")
            .expect("Coffee was not imported");
        assert_eq!(coffee.amount, 45_000.0);
        assert_eq!(coffee.created_at, Some(datetime!(2025-01-15 08:30 UTC)));
        let salary = transactions
            .iter()
            .find(|transaction| transaction.title == "Salary")
            .expect("Salary was not imported");
        assert_eq!(salary.category, "Other");
    }

    #[tokio::test]
    async fn skips_invalid_transactions() {
        let (state, user_id) = get_test_state();
        let backup = r#"[
            {"title": "Coffee", "amount": "45000", "type": "expense"},
            {"title": "", "amount": "1", "type": "expense"},
            {"title": "Words", "amount": "lots", "type": "expense"},
            {"title": "Refund", "amount": -5, "type": "income"},
            {"title": "Gift", "amount": 5, "type": "gift"}
        ]"#;

        let response = import_transactions(
            State(state.clone()),
            Extension(user_id),
            must_make_multipart(&[backup]).await,
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let text = alert_text(response).await;
        assert!(
            text.contains("Imported 1 transaction, skipped 3 invalid transactions."),
            "got alert text {text:?}"
        );
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(list_transactions(user_id, &connection).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejects_invalid_json() {
        let (state, user_id) = get_test_state();

        let response = import_transactions(
            State(state.clone()),
            Extension(user_id),
            must_make_multipart(&["this is not json"]).await,
        )
        .await
        .unwrap_err();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let connection = state.db_connection.lock().unwrap();
        assert!(list_transactions(user_id, &connection).unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_empty_form() {
        let (state, user_id) = get_test_state();

        let response = import_transactions(
            State(state),
            Extension(user_id),
            must_make_multipart(&[]).await,
        )
        .await
        .unwrap_err();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unrecognised_shape_imports_nothing() {
        let (state, user_id) = get_test_state();

        let response = import_transactions(
            State(state.clone()),
            Extension(user_id),
            must_make_multipart(&[r#"{"foo": []}"#]).await,
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let connection = state.db_connection.lock().unwrap();
        assert!(list_transactions(user_id, &connection).unwrap().is_empty());
    }
}
