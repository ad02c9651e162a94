//! Reminder settings: the model, defaults, partial updates and database functions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::{Error, auth::UserID};

/// The names of the days of the week, indexed by `weekly_day`.
pub const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

// ============================================================================
// MODELS
// ============================================================================

/// How loud the reminder sound is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderTone {
    /// A quiet chime.
    Soft,
    /// The default tone.
    #[default]
    Normal,
    /// A loud alarm.
    Loud,
}

impl ReminderTone {
    /// Every tone, in the order they are offered to the user.
    pub const ALL: [ReminderTone; 3] = [ReminderTone::Soft, ReminderTone::Normal, ReminderTone::Loud];

    /// The lowercase name used in forms, JSON and the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderTone::Soft => "soft",
            ReminderTone::Normal => "normal",
            ReminderTone::Loud => "loud",
        }
    }

    /// The name shown to users.
    pub fn label(&self) -> &'static str {
        match self {
            ReminderTone::Soft => "Soft",
            ReminderTone::Normal => "Normal",
            ReminderTone::Loud => "Loud",
        }
    }
}

impl Display for ReminderTone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReminderTone {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "soft" => Ok(ReminderTone::Soft),
            "normal" => Ok(ReminderTone::Normal),
            "loud" => Ok(ReminderTone::Loud),
            other => Err(Error::InvalidSetting(format!(
                "\"{other}\" is not a reminder tone, expected soft, normal or loud"
            ))),
        }
    }
}

impl ToSql for ReminderTone {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ReminderTone {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// A user's reminder preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Whether to remind the user to log expenses every day.
    pub daily_enabled: bool,
    /// The hour of the day, 0 to 23, for the daily reminder.
    pub daily_hour: u8,
    /// Whether to remind the user when they have not logged anything this week.
    pub weekly_enabled: bool,
    /// The day of the week for the weekly reminder, 0 is Sunday.
    pub weekly_day: u8,
    /// Whether reminders play a sound.
    pub sound_enabled: bool,
    /// The sound reminders play.
    pub reminder_tone: ReminderTone,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            daily_enabled: true,
            daily_hour: 20,
            weekly_enabled: true,
            weekly_day: 0,
            sound_enabled: true,
            reminder_tone: ReminderTone::Normal,
        }
    }
}

impl Settings {
    /// Apply `update` on top of these settings.
    ///
    /// # Errors
    /// Returns [Error::InvalidSetting] if the hour is not between 0 and 23, the
    /// day is not between 0 and 6, or the tone is not soft, normal or loud.
    pub fn merge(self, update: SettingsUpdate) -> Result<Self, Error> {
        let daily_hour = match update.daily_hour {
            Some(hour) => u8::try_from(hour)
                .ok()
                .filter(|hour| *hour <= 23)
                .ok_or_else(|| {
                    Error::InvalidSetting(format!("dailyHour must be between 0 and 23, got {hour}"))
                })?,
            None => self.daily_hour,
        };

        let weekly_day = match update.weekly_day {
            Some(day) => u8::try_from(day)
                .ok()
                .filter(|day| *day <= 6)
                .ok_or_else(|| {
                    Error::InvalidSetting(format!("weeklyDay must be between 0 and 6, got {day}"))
                })?,
            None => self.weekly_day,
        };

        let reminder_tone = match update.reminder_tone {
            Some(tone) => tone.parse()?,
            None => self.reminder_tone,
        };

        Ok(Self {
            daily_enabled: update.daily_enabled.unwrap_or(self.daily_enabled),
            daily_hour,
            weekly_enabled: update.weekly_enabled.unwrap_or(self.weekly_enabled),
            weekly_day,
            sound_enabled: update.sound_enabled.unwrap_or(self.sound_enabled),
            reminder_tone,
        })
    }

    /// The name of the weekday for the weekly reminder.
    pub fn weekly_day_name(&self) -> &'static str {
        WEEKDAY_NAMES
            .get(usize::from(self.weekly_day))
            .copied()
            .unwrap_or(WEEKDAY_NAMES[0])
    }
}

/// A partial update to [Settings], fields that are `None` keep their current value.
///
/// Numbers and the tone are kept loose so that out of range values are
/// reported as [Error::InvalidSetting] rather than rejected while parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    #[serde(default)]
    pub daily_enabled: Option<bool>,
    #[serde(default)]
    pub daily_hour: Option<i64>,
    #[serde(default)]
    pub weekly_enabled: Option<bool>,
    #[serde(default)]
    pub weekly_day: Option<i64>,
    #[serde(default)]
    pub sound_enabled: Option<bool>,
    #[serde(default)]
    pub reminder_tone: Option<String>,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the settings table, one row per user.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_settings_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS settings (
                user_id INTEGER PRIMARY KEY,
                daily_enabled INTEGER NOT NULL,
                daily_hour INTEGER NOT NULL CHECK (daily_hour BETWEEN 0 AND 23),
                weekly_enabled INTEGER NOT NULL,
                weekly_day INTEGER NOT NULL CHECK (weekly_day BETWEEN 0 AND 6),
                sound_enabled INTEGER NOT NULL,
                reminder_tone TEXT NOT NULL CHECK (reminder_tone IN ('soft', 'normal', 'loud')),
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Get the settings for `user_id`, saving the defaults first if the user has
/// no settings yet.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error, e.g. `user_id` does not
/// refer to a registered user.
pub fn get_settings(user_id: UserID, connection: &Connection) -> Result<Settings, Error> {
    let defaults = Settings::default();

    connection.execute(
        "INSERT INTO settings
            (user_id, daily_enabled, daily_hour, weekly_enabled, weekly_day, sound_enabled, reminder_tone)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(user_id) DO NOTHING",
        (
            user_id.as_i64(),
            defaults.daily_enabled,
            defaults.daily_hour,
            defaults.weekly_enabled,
            defaults.weekly_day,
            defaults.sound_enabled,
            defaults.reminder_tone,
        ),
    )?;

    connection
        .query_row(
            "SELECT daily_enabled, daily_hour, weekly_enabled, weekly_day, sound_enabled, reminder_tone
             FROM settings WHERE user_id = ?1",
            [user_id.as_i64()],
            map_settings_row,
        )
        .map_err(Error::from)
}

/// Merge `update` into the stored settings for `user_id` and save the result.
///
/// Nothing is saved if any field in `update` is invalid.
///
/// # Errors
/// Returns [Error::InvalidSetting] for out of range values or
/// [Error::SqlError] if there is an SQL error.
pub fn put_settings(
    user_id: UserID,
    update: SettingsUpdate,
    connection: &Connection,
) -> Result<Settings, Error> {
    let settings = get_settings(user_id, connection)?.merge(update)?;

    connection.execute(
        "UPDATE settings
         SET daily_enabled = ?2, daily_hour = ?3, weekly_enabled = ?4,
             weekly_day = ?5, sound_enabled = ?6, reminder_tone = ?7
         WHERE user_id = ?1",
        (
            user_id.as_i64(),
            settings.daily_enabled,
            settings.daily_hour,
            settings.weekly_enabled,
            settings.weekly_day,
            settings.sound_enabled,
            settings.reminder_tone,
        ),
    )?;

    Ok(settings)
}

fn map_settings_row(row: &Row) -> Result<Settings, rusqlite::Error> {
    Ok(Settings {
        daily_enabled: row.get(0)?,
        daily_hour: row.get(1)?,
        weekly_enabled: row.get(2)?,
        weekly_day: row.get(3)?,
        sound_enabled: row.get(4)?,
        reminder_tone: row.get(5)?,
    })
}
