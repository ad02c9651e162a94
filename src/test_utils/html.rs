use axum::{body::Body, response::Response};
use scraper::{Html, Selector};

/// Read the whole response body as UTF-8 text.
pub(crate) async fn response_text(response: Response<Body>) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Could not get response body");

    String::from_utf8_lossy(&body).into_owned()
}

pub(crate) async fn parse_html_document(response: Response<Body>) -> Html {
    Html::parse_document(&response_text(response).await)
}

/// Parse an htmx partial, such as an alert.
pub(crate) async fn parse_html_fragment(response: Response<Body>) -> Html {
    Html::parse_fragment(&response_text(response).await)
}

#[track_caller]
pub(crate) fn assert_valid_html(html: &Html) {
    assert!(
        html.errors.is_empty(),
        "Got HTML parsing errors: {:?}",
        html.errors
    );
}

/// The trimmed text of the first element matching `selector`.
#[track_caller]
pub(crate) fn text_of(html: &Html, selector: &str) -> String {
    html.select(&Selector::parse(selector).expect("Invalid selector"))
        .next()
        .unwrap_or_else(|| panic!("No element matches {selector}"))
        .text()
        .collect::<String>()
        .trim()
        .to_owned()
}
