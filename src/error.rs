//! Defines the app level error type and conversions to rendered HTML pages, alerts and JSON.
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{alert::Alert, internal_server_error::InternalServerError, not_found::NotFoundError};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an invalid combination of email and password.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The auth token cookie is missing from the cookie jar in the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// There was an error parsing the date in the cookie or creating the new
    /// expiry date time.
    ///
    /// Callers should pass in the original error as a string and the date
    /// string that caused the error.
    #[error("could not format expiry cookie date-time string \"{1}\": {0}")]
    InvalidDateFormat(String, String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The email address is already registered to another user.
    #[error("the email address is already in use")]
    DuplicateEmail,

    /// The email address does not look like an email address.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// A transaction was submitted without a title.
    #[error("the title cannot be empty")]
    EmptyTitle,

    /// A transaction amount was not a finite, non-negative number.
    #[error("\"{0}\" is not a valid amount")]
    InvalidAmount(String),

    /// A transaction type other than income or expense was submitted.
    #[error("\"{0}\" is not a valid transaction type, expected income or expense")]
    InvalidTransactionType(String),

    /// A settings value was out of range.
    #[error("invalid setting: {0}")]
    InvalidSetting(String),

    /// The multipart form could not be parsed.
    #[error("could not parse multipart form: {0}")]
    MultipartError(String),

    /// An uploaded backup file was not valid JSON.
    #[error("could not parse the JSON file: {0}")]
    InvalidJson(String),

    /// Transactions could not be written as CSV.
    #[error("could not export transactions: {0}")]
    ExportError(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to delete a transaction that does not exist or belongs to
    /// another user.
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => NotFoundError.into_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// The status code and user facing message and details for this error.
    fn status_and_message(&self) -> (StatusCode, String, String) {
        match self {
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Invalid Timezone Settings".to_owned(),
                format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            ),
            Error::EmptyTitle => (
                StatusCode::BAD_REQUEST,
                "Missing title".to_owned(),
                "Give the transaction a short title, e.g. \"Coffee\".".to_owned(),
            ),
            Error::InvalidAmount(amount) => (
                StatusCode::BAD_REQUEST,
                "Invalid amount".to_owned(),
                format!("\"{amount}\" is not a valid amount. Enter a number that is zero or more."),
            ),
            Error::InvalidTransactionType(kind) => (
                StatusCode::BAD_REQUEST,
                "Invalid transaction type".to_owned(),
                format!("\"{kind}\" is not a transaction type. Choose income or expense."),
            ),
            Error::InvalidSetting(reason) => (
                StatusCode::BAD_REQUEST,
                "Invalid settings".to_owned(),
                reason.to_owned(),
            ),
            Error::InvalidJson(reason) => (
                StatusCode::BAD_REQUEST,
                "Could not read file".to_owned(),
                format!("The uploaded file is not valid JSON: {reason}"),
            ),
            Error::MultipartError(reason) => (
                StatusCode::BAD_REQUEST,
                "Could not read upload".to_owned(),
                reason.to_owned(),
            ),
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                "Not found".to_owned(),
                "The requested resource could not be found.".to_owned(),
            ),
            Error::DeleteMissingTransaction => (
                StatusCode::NOT_FOUND,
                "Could not delete transaction".to_owned(),
                "The transaction could not be found. \
                Try refreshing the page to see if the transaction has already been deleted."
                    .to_owned(),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong".to_owned(),
                "An unexpected error occurred, check the server logs for more details.".to_owned(),
            ),
        }
    }

    /// Convert the error into an HTTP response with an HTML alert.
    pub fn into_alert_response(self) -> Response {
        let (status_code, message, details) = self.status_and_message();

        (status_code, Alert::Error { message, details }.into_html()).into_response()
    }

    /// Convert the error into an HTTP response with a JSON body of the form
    /// `{"error": "...", "details": "..."}`.
    pub fn into_json_response(self) -> Response {
        let (status_code, message, details) = self.status_and_message();

        (
            status_code,
            Json(json!({ "error": message, "details": details })),
        )
            .into_response()
    }
}
