//! The JSON endpoints for reading and partially updating reminder settings.

use axum::{
    Extension, Json,
    extract::State,
    response::{IntoResponse, Response},
};

use crate::{Error, auth::UserID};

use super::{
    core::{SettingsUpdate, get_settings, put_settings},
    page::SettingsState,
};

/// Get the user's settings as JSON, creating the defaults on first use.
pub async fn get_settings_json(
    State(state): State<SettingsState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_json_response();
        }
    };

    match get_settings(user_id, &connection) {
        Ok(settings) => Json(settings).into_response(),
        Err(error) => {
            tracing::error!("could not get settings: {error}");
            error.into_json_response()
        }
    }
}

/// Merge the fields in the request body into the user's settings and respond
/// with the updated settings.
pub async fn put_settings_json(
    State(state): State<SettingsState>,
    Extension(user_id): Extension<UserID>,
    Json(update): Json<SettingsUpdate>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_json_response();
        }
    };

    match put_settings(user_id, update, &connection) {
        Ok(settings) => Json(settings).into_response(),
        Err(error) => {
            tracing::debug!("could not update settings: {error}");
            error.into_json_response()
        }
    }
}

#[cfg(test)]
mod settings_api_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Json, extract::State, http::StatusCode};
    use rusqlite::Connection;
    use serde_json::json;

    use crate::{
        auth::{PasswordHash, UserID, create_user},
        db::initialize,
        settings::SettingsUpdate,
        test_utils::json_body,
    };

    use super::{SettingsState, get_settings_json, put_settings_json};

    fn get_test_state() -> (SettingsState, UserID) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user = create_user(
            "test@example.com",
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .unwrap();

        let state = SettingsState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        (state, user.id)
    }

    #[tokio::test]
    async fn get_returns_defaults() {
        let (state, user_id) = get_test_state();

        let response = get_settings_json(State(state), Extension(user_id)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({
                "dailyEnabled": true,
                "dailyHour": 20,
                "weeklyEnabled": true,
                "weeklyDay": 0,
                "soundEnabled": true,
                "reminderTone": "normal"
            })
        );
    }

    #[tokio::test]
    async fn put_merges_partial_update() {
        let (state, user_id) = get_test_state();
        let update: SettingsUpdate =
            serde_json::from_value(json!({ "dailyHour": 6, "reminderTone": "loud" })).unwrap();

        let response = put_settings_json(State(state.clone()), Extension(user_id), Json(update)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["dailyHour"], json!(6));
        assert_eq!(body["reminderTone"], json!("loud"));
        assert_eq!(body["weeklyEnabled"], json!(true));

        let response = get_settings_json(State(state), Extension(user_id)).await;
        assert_eq!(json_body(response).await, body);
    }

    #[tokio::test]
    async fn put_rejects_invalid_day() {
        let (state, user_id) = get_test_state();
        let update = SettingsUpdate {
            weekly_day: Some(9),
            ..Default::default()
        };

        let response = put_settings_json(State(state), Extension(user_id), Json(update)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], json!("Invalid settings"));
    }
}
