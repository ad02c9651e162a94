//! Alerts for displaying success and error messages to users.
//!
//! Alerts are rendered as an out-of-band swap into the `#alert-container`
//! element that [crate::html::base] places at the bottom of every page.

use axum::response::{Html, IntoResponse, Response};
use maud::{Markup, html};

/// A success or error message shown to the user after an action.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// A success message with extra details.
    Success {
        /// The headline.
        message: String,
        /// A longer explanation shown under the headline.
        details: String,
    },
    /// A success message on its own.
    SuccessSimple {
        /// The headline.
        message: String,
    },
    /// An error message with extra details.
    Error {
        /// The headline.
        message: String,
        /// A longer explanation shown under the headline.
        details: String,
    },
}

const SUCCESS_STYLE: &str = "flex items-start p-4 mb-4 text-green-800 \
    border border-green-300 rounded-lg bg-green-50 dark:bg-gray-800 \
    dark:text-green-400 dark:border-green-800";

const ERROR_STYLE: &str = "flex items-start p-4 mb-4 text-red-800 \
    border border-red-300 rounded-lg bg-red-50 dark:bg-gray-800 \
    dark:text-red-400 dark:border-red-800";

impl Alert {
    fn parts(&self) -> (&'static str, &str, Option<&str>) {
        match self {
            Alert::Success { message, details } => (SUCCESS_STYLE, message, Some(details)),
            Alert::SuccessSimple { message } => (SUCCESS_STYLE, message, None),
            Alert::Error { message, details } => (ERROR_STYLE, message, Some(details)),
        }
    }

    /// Render the alert as HTML that replaces the page's alert container.
    pub fn into_markup(self) -> Markup {
        let (style, message, details) = self.parts();

        html! {
            div
                id="alert-container"
                hx-swap-oob="true"
                class="w-full max-w-md px-4"
                style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
            {
                div class=(style) role="alert"
                {
                    div class="flex-1"
                    {
                        p class="text-sm font-medium" { (message) }

                        @if let Some(details) = details.filter(|details| !details.is_empty()) {
                            p class="mt-1 text-sm" { (details) }
                        }
                    }

                    button
                        type="button"
                        class="ms-3 text-sm font-semibold"
                        aria-label="Close"
                        onclick="this.closest('[role=alert]').remove()"
                    {
                        "×"
                    }
                }
            }
        }
    }

    /// Render the alert as an HTML response body.
    pub fn into_html(self) -> Html<String> {
        Html(self.into_markup().into_string())
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        self.into_html().into_response()
    }
}
