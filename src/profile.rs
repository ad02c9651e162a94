//! The profile page: account details, transaction counts, a summary of the
//! reminder settings and the backup tools.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::{UserID, get_user_by_id},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, BUTTON_SECONDARY_STYLE, CARD_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, base, format_currency, link, loading_spinner,
    },
    navigation::NavBar,
    settings::{Settings, get_settings},
    transaction::{TransactionCounts, count_transactions, list_transactions, total_balance},
};

/// The state needed for the profile page.
#[derive(Debug, Clone)]
pub struct ProfileState {
    /// The database connection for reading the user, transactions and settings.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ProfileState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

struct Profile {
    email: String,
    counts: TransactionCounts,
    balance: f64,
    settings: Settings,
}

/// Display the profile page for the logged in user.
pub async fn get_profile_page(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let profile = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        let user = get_user_by_id(user_id, &connection)
            .inspect_err(|error| tracing::error!("could not get user {user_id}: {error}"))?;
        let counts = count_transactions(user_id, &connection)?;
        let transactions = list_transactions(user_id, &connection)?;
        let settings = get_settings(user_id, &connection)?;

        Profile {
            email: user.email,
            counts,
            balance: total_balance(&transactions),
            settings,
        }
    };

    Ok(profile_view(&profile).into_response())
}

fn profile_view(profile: &Profile) -> Markup {
    let nav_bar = NavBar::new(endpoints::PROFILE_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            section
                class="w-full p-6 rounded-lg shadow-sm text-white bg-gradient-to-br
                    from-blue-600 to-cyan-500"
            {
                h1 class="text-lg font-semibold" { "Profile" }
                p id="email" class="mt-2 text-sm opacity-80" { (profile.email) }
                p id="balance" class="mt-4 text-2xl font-bold" { (format_currency(profile.balance)) }
            }

            (counts_view(&profile.counts))
            (reminder_summary(&profile.settings))
            (backup_view())

            a href=(endpoints::LOG_OUT) id="log-out" class=(BUTTON_SECONDARY_STYLE) { "Log out" }
        }
    };

    base("Profile", &[], &content)
}

fn counts_view(counts: &TransactionCounts) -> Markup {
    html! {
        section id="transaction-counts" class="w-full grid grid-cols-3 gap-3"
        {
            @for (label, count) in [
                ("Total", counts.total),
                ("Income", counts.income),
                ("Expense", counts.expense),
            ] {
                div class={ "text-center " (CARD_STYLE) }
                {
                    p class="text-lg font-bold" { (count) }
                    p class="text-xs text-gray-500 dark:text-gray-400" { (label) }
                }
            }
        }
    }
}

fn reminder_summary(settings: &Settings) -> Markup {
    let daily = if settings.daily_enabled {
        format!("Daily reminder at {:02}:00", settings.daily_hour)
    } else {
        "Daily reminder off".to_owned()
    };

    let weekly = if settings.weekly_enabled {
        format!("Weekly reminder on {}", settings.weekly_day_name())
    } else {
        "Weekly reminder off".to_owned()
    };

    let sound = if settings.sound_enabled {
        format!("{} reminder sound", settings.reminder_tone.label())
    } else {
        "Reminder sound off".to_owned()
    };

    html! {
        section id="reminders" class={ "space-y-2 " (CARD_STYLE) }
        {
            h2 class="text-sm font-semibold" { "Reminders" }

            ul class="text-sm space-y-1"
            {
                li { (daily) }
                li { (weekly) }
                li { (sound) }
            }

            p class="text-sm" { (link(endpoints::SETTINGS_VIEW, "Change reminder settings")) }
        }
    }
}

fn backup_view() -> Markup {
    let spinner = loading_spinner();

    html! {
        section id="backup" class={ "space-y-4 " (CARD_STYLE) }
        {
            h2 class="text-sm font-semibold" { "Backup" }

            a href=(endpoints::EXPORT) id="export-link" class=(BUTTON_SECONDARY_STYLE)
            {
                "Export transactions (CSV)"
            }

            form
                hx-post=(endpoints::IMPORT)
                hx-encoding="multipart/form-data"
                hx-swap="none"
                hx-target-error="#alert-container"
                hx-indicator="#import-indicator"
                hx-disabled-elt="#import-button"
                class="space-y-2"
            {
                label for="file" class=(FORM_LABEL_STYLE) { "Import a JSON backup" }

                input
                    type="file"
                    name="file"
                    id="file"
                    accept=".json,application/json"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);

                button type="submit" id="import-button" class=(BUTTON_PRIMARY_STYLE)
                {
                    span id="import-indicator" class="inline htmx-indicator" { (spinner) }
                    " Import"
                }
            }
        }
    }
}
