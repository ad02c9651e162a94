use axum::{body::Body, http::StatusCode, response::Response};
use serde_json::Value;

use super::html::response_text;

#[track_caller]
pub(crate) fn assert_status_ok(response: &Response<Body>) {
    assert_eq!(
        response.status(),
        StatusCode::OK,
        "want 200 OK, got {}",
        response.status()
    );
}

#[track_caller]
pub(crate) fn get_header(response: &Response<Body>, header_name: &str) -> String {
    let Some(value) = response.headers().get(header_name) else {
        panic!("Headers missing {header_name}, got {:?}", response.headers());
    };

    value
        .to_str()
        .unwrap_or_else(|error| panic!("Header {header_name} is not text: {error}"))
        .to_owned()
}

#[track_caller]
pub(crate) fn assert_content_type(response: &Response<Body>, content_type: &str) {
    assert_eq!(get_header(response, "content-type"), content_type);
}

#[track_caller]
pub(crate) fn assert_hx_redirect(response: &Response<Body>, endpoint: &str) {
    assert_eq!(get_header(response, "hx-redirect"), endpoint);
}

/// Parse the response body of a JSON API call.
pub(crate) async fn json_body(response: Response<Body>) -> Value {
    let text = response_text(response).await;

    serde_json::from_str(&text).unwrap_or_else(|error| panic!("Body {text:?} is not JSON: {error}"))
}
