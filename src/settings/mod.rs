//! Reminder preferences, one set per user, created with defaults on first use.

mod api;
mod core;
mod page;

pub use self::core::{
    ReminderTone, Settings, SettingsUpdate, create_settings_table, get_settings,
};
pub use api::{get_settings_json, put_settings_json};
pub use page::{get_settings_page, save_settings_endpoint};

#[cfg(test)]
pub use self::core::put_settings;
