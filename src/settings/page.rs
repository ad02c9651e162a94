//! The reminder settings page and the form endpoint that saves it.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    alert::Alert,
    auth::UserID,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, CARD_STYLE, FORM_CHECKBOX_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, base, loading_spinner,
    },
    navigation::NavBar,
};

use super::core::{ReminderTone, Settings, SettingsUpdate, WEEKDAY_NAMES, get_settings, put_settings};

/// The state needed for reading and saving reminder settings.
#[derive(Debug, Clone)]
pub struct SettingsState {
    /// The database connection for managing settings.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SettingsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Display the reminder settings form filled in with the user's settings.
pub async fn get_settings_page(
    State(state): State<SettingsState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let settings = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_settings(user_id, &connection)
            .inspect_err(|error| tracing::error!("could not get settings: {error}"))?
    };

    Ok(settings_view(&settings).into_response())
}

/// The form data for saving reminder settings.
///
/// Browsers leave unchecked checkboxes out of the form, so a missing checkbox
/// means the option is turned off.
#[derive(Debug, Default, Deserialize)]
pub struct SettingsForm {
    #[serde(default)]
    pub daily_enabled: Option<String>,
    #[serde(default)]
    pub daily_hour: Option<i64>,
    #[serde(default)]
    pub weekly_enabled: Option<String>,
    #[serde(default)]
    pub weekly_day: Option<i64>,
    #[serde(default)]
    pub sound_enabled: Option<String>,
    #[serde(default)]
    pub reminder_tone: Option<String>,
}

impl From<SettingsForm> for SettingsUpdate {
    fn from(form: SettingsForm) -> Self {
        Self {
            daily_enabled: Some(form.daily_enabled.is_some()),
            daily_hour: form.daily_hour,
            weekly_enabled: Some(form.weekly_enabled.is_some()),
            weekly_day: form.weekly_day,
            sound_enabled: Some(form.sound_enabled.is_some()),
            reminder_tone: form.reminder_tone.filter(|tone| !tone.is_empty()),
        }
    }
}

/// Save the settings form, responding with a success or error alert.
pub async fn save_settings_endpoint(
    State(state): State<SettingsState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<SettingsForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match put_settings(user_id, form.into(), &connection) {
        Ok(_) => (
            StatusCode::OK,
            Alert::SuccessSimple {
                message: "Settings saved".to_owned(),
            },
        )
            .into_response(),
        Err(Error::InvalidSetting(reason)) => {
            tracing::debug!("rejected settings: {reason}");
            Error::InvalidSetting(reason).into_alert_response()
        }
        Err(error) => {
            tracing::error!("could not save settings: {error}");
            error.into_alert_response()
        }
    }
}

fn settings_view(settings: &Settings) -> Markup {
    let nav_bar = NavBar::new(endpoints::SETTINGS_VIEW).into_html();
    let spinner = loading_spinner();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold self-start" { "Reminder Settings" }

            form
                hx-post=(endpoints::SETTINGS_API)
                hx-target-error="#alert-container"
                hx-indicator="#indicator"
                hx-disabled-elt="#submit-button"
                class="w-full space-y-4"
            {
                section id="daily-reminder" class={ "space-y-3 " (CARD_STYLE) }
                {
                    (checkbox(
                        "daily_enabled",
                        "Daily reminder",
                        "Remind me to log expenses",
                        settings.daily_enabled,
                    ))

                    div
                    {
                        label for="daily_hour" class=(FORM_LABEL_STYLE) { "Time" }

                        select name="daily_hour" id="daily_hour" class=(FORM_TEXT_INPUT_STYLE)
                        {
                            @for hour in 0..24u8 {
                                option value=(hour) selected[hour == settings.daily_hour]
                                {
                                    (format!("{hour:02}:00"))
                                }
                            }
                        }
                    }
                }

                section id="weekly-reminder" class={ "space-y-3 " (CARD_STYLE) }
                {
                    (checkbox(
                        "weekly_enabled",
                        "Weekly reminder",
                        "Remind me if I have not logged anything this week",
                        settings.weekly_enabled,
                    ))

                    div
                    {
                        label for="weekly_day" class=(FORM_LABEL_STYLE) { "Day" }

                        select name="weekly_day" id="weekly_day" class=(FORM_TEXT_INPUT_STYLE)
                        {
                            @for (day, name) in WEEKDAY_NAMES.iter().enumerate() {
                                option
                                    value=(day)
                                    selected[usize::from(settings.weekly_day) == day]
                                {
                                    (name)
                                }
                            }
                        }
                    }
                }

                section id="reminder-sound" class={ "space-y-3 " (CARD_STYLE) }
                {
                    (checkbox(
                        "sound_enabled",
                        "Reminder sound",
                        "Play a sound with each reminder",
                        settings.sound_enabled,
                    ))

                    div
                    {
                        label for="reminder_tone" class=(FORM_LABEL_STYLE) { "Tone" }

                        select name="reminder_tone" id="reminder_tone" class=(FORM_TEXT_INPUT_STYLE)
                        {
                            @for tone in ReminderTone::ALL {
                                option
                                    value=(tone.as_str())
                                    selected[tone == settings.reminder_tone]
                                {
                                    (tone.label())
                                }
                            }
                        }
                    }
                }

                button type="submit" id="submit-button" class=(BUTTON_PRIMARY_STYLE)
                {
                    span id="indicator" class="inline htmx-indicator" { (spinner) }
                    " Save settings"
                }
            }
        }
    };

    base("Settings", &[], &content)
}

fn checkbox(name: &str, title: &str, description: &str, checked: bool) -> Markup {
    html! {
        div class="flex items-center justify-between gap-4"
        {
            div
            {
                label for=(name) class="font-medium" { (title) }
                p class="text-sm text-gray-500 dark:text-gray-400" { (description) }
            }

            input
                type="checkbox"
                name=(name)
                id=(name)
                value="on"
                checked[checked]
                class=(FORM_CHECKBOX_STYLE);
        }
    }
}
