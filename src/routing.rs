//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    response::Redirect,
    routing::{delete, get, post},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{
        auth_guard, auth_guard_hx, get_forgot_password_page, get_log_in_page, get_log_out,
        get_register_page, post_log_in, register_user,
    },
    endpoints,
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    profile::get_profile_page,
    settings::{get_settings_json, get_settings_page, put_settings_json, save_settings_endpoint},
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, export_transactions_endpoint,
        get_dashboard_page, get_history_page, get_transaction_count, get_transactions_json,
        import_transactions,
    },
};

/// Return a router with all the app's routes.
///
/// Static files are served from `static_dir`.
pub fn build_router(state: AppState, static_dir: &str) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(
            endpoints::FORGOT_PASSWORD_VIEW,
            get(get_forgot_password_page),
        )
        .route(endpoints::USERS, post(register_user))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::TRANSACTIONS_VIEW, get(get_history_page))
        .route(endpoints::SETTINGS_VIEW, get(get_settings_page))
        .route(endpoints::PROFILE_VIEW, get(get_profile_page))
        .route(endpoints::EXPORT, get(export_transactions_endpoint))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These routes are called by htmx or scripts, so they need to use the
    // HX-REDIRECT header for auth redirects to work properly.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(
                endpoints::TRANSACTIONS_API,
                get(get_transactions_json).post(create_transaction_endpoint),
            )
            .route(endpoints::TRANSACTION_COUNT, get(get_transaction_count))
            .route(endpoints::TRANSACTION, delete(delete_transaction_endpoint))
            .route(endpoints::IMPORT, post(import_transactions))
            .route(
                endpoints::SETTINGS_API,
                get(get_settings_json)
                    .put(put_settings_json)
                    .post(save_settings_endpoint),
            )
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new(static_dir))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}

#[cfg(test)]
mod routing_tests {
    use axum::http::StatusCode;
    use axum_extra::extract::cookie::Cookie;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::{
        AppState,
        auth::{COOKIE_TOKEN, PasswordHash, ValidatedPassword, create_user},
        endpoints,
    };

    use super::build_router;

    fn get_test_server() -> TestServer {
        let connection = Connection::open_in_memory().unwrap();
        let state = AppState::new(connection, "foobar", "Asia/Jakarta").unwrap();
        {
            let connection = state.db_connection.lock().unwrap();
            create_user(
                "test@example.com",
                PasswordHash::new(ValidatedPassword::new_unchecked("averysafeandsecurepassword"), 4)
                    .unwrap(),
                &connection,
            )
            .unwrap();
        }

        TestServer::try_new(build_router(state, "static/")).expect("Could not create test server.")
    }

    async fn log_in(server: &TestServer) -> Cookie<'static> {
        let response = server
            .post(endpoints::LOG_IN_API)
            .form(&[
                ("email", "test@example.com"),
                ("password", "averysafeandsecurepassword"),
            ])
            .await;

        response.cookie(COOKIE_TOKEN)
    }

    #[tokio::test]
    async fn pages_redirect_to_log_in_without_session() {
        let server = get_test_server();

        let response = server.get(endpoints::DASHBOARD_VIEW).await;

        response.assert_status(StatusCode::SEE_OTHER);
        let location = response.header("location");
        assert!(
            location
                .to_str()
                .unwrap()
                .starts_with(endpoints::LOG_IN_VIEW),
            "got location {location:?}"
        );
    }

    #[tokio::test]
    async fn api_uses_hx_redirect_without_session() {
        let server = get_test_server();

        let response = server.get(endpoints::TRANSACTION_COUNT).await;

        response.assert_status_ok();
        assert!(
            response.headers().get("hx-redirect").is_some(),
            "want an HX-Redirect header"
        );
    }

    #[tokio::test]
    async fn root_redirects_to_dashboard() {
        let server = get_test_server();
        let cookie = log_in(&server).await;

        let response = server.get(endpoints::ROOT).add_cookie(cookie).await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), endpoints::DASHBOARD_VIEW);
    }

    #[tokio::test]
    async fn logged_in_user_can_reach_every_page() {
        let server = get_test_server();
        let cookie = log_in(&server).await;

        for page in [
            endpoints::DASHBOARD_VIEW,
            endpoints::TRANSACTIONS_VIEW,
            endpoints::SETTINGS_VIEW,
            endpoints::PROFILE_VIEW,
        ] {
            let response = server.get(page).add_cookie(cookie.clone()).await;

            assert_eq!(response.status_code(), StatusCode::OK, "GET {page}");
        }
    }

    #[tokio::test]
    async fn create_then_count_transactions() {
        let server = get_test_server();
        let cookie = log_in(&server).await;

        server
            .post(endpoints::TRANSACTIONS_API)
            .add_cookie(cookie.clone())
            .form(&[
                ("title", "Coffee"),
                ("amount", "45000"),
                ("type", "expense"),
                ("category", "Food"),
            ])
            .await
            .assert_status(StatusCode::SEE_OTHER);

        let response = server
            .get(endpoints::TRANSACTION_COUNT)
            .add_cookie(cookie)
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({ "total": 1, "income": 0, "expense": 1 }));
    }

    #[tokio::test]
    async fn settings_api_reads_and_updates() {
        let server = get_test_server();
        let cookie = log_in(&server).await;

        server
            .put(endpoints::SETTINGS_API)
            .add_cookie(cookie.clone())
            .json(&json!({ "dailyHour": 9 }))
            .await
            .assert_status_ok();

        let response = server.get(endpoints::SETTINGS_API).add_cookie(cookie).await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["dailyHour"], json!(9));
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let server = get_test_server();

        let response = server.get("/does/not/exist").await;

        response.assert_status(StatusCode::NOT_FOUND);
    }
}
