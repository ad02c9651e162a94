use axum::response::{IntoResponse, Response};
use maud::{Markup, html};

use crate::html::{base, log_in_register};

fn forgot_password_content() -> Markup {
    let instructions = html! {
        p class="text-justify text-gray-900 dark:text-white"
        {
            "Passwords are reset by whoever runs this server. Ask them to run the "
            code { "reset_password" }
            " program next to the server with the path to the database file and
            your email address, e.g."
        }

        pre class="p-2 overflow-x-auto text-sm rounded bg-gray-100 dark:bg-gray-700 dark:text-white"
        {
            "reset_password --db-path pocketbook.db --email you@example.com"
        }
    };

    base(
        "Forgot Password",
        &[],
        &log_in_register("Forgot your password?", &instructions),
    )
}

/// Renders a page describing how the user's password can be reset.
pub async fn get_forgot_password_page() -> Response {
    forgot_password_content().into_response()
}
