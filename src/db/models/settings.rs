//! Per-user timer settings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Notification sound. Unknown values sanitize to `Beep`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SoundType {
    Beep,
    Bell,
    Chime,
    Digital,
}

impl SoundType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SoundType::Beep => "beep",
            SoundType::Bell => "bell",
            SoundType::Chime => "chime",
            SoundType::Digital => "digital",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "beep" => Some(SoundType::Beep),
            "bell" => Some(SoundType::Bell),
            "chime" => Some(SoundType::Chime),
            "digital" => Some(SoundType::Digital),
            _ => None,
        }
    }
}

impl Default for SoundType {
    fn default() -> Self {
        SoundType::Beep
    }
}

/// Singleton-per-user settings record. The table can hold rows for several
/// users, but at most one logical record exists per user id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub id: i64,
    pub user_id: String,
    /// Focus interval length in minutes.
    pub pomodoro_length: i64,
    pub short_break_length: i64,
    pub long_break_length: i64,
    pub sessions_until_long_break: i64,
    pub auto_start_breaks: bool,
    pub auto_start_pomodoros: bool,
    pub sound_enabled: bool,
    pub sound_type: SoundType,
    pub notifications_enabled: bool,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub public_profile: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserSettings {
    /// Documented defaults for a brand-new user.
    pub fn defaults(user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            user_id: user_id.to_string(),
            pomodoro_length: 25,
            short_break_length: 5,
            long_break_length: 15,
            sessions_until_long_break: 4,
            auto_start_breaks: false,
            auto_start_pomodoros: false,
            sound_enabled: true,
            sound_type: SoundType::Beep,
            notifications_enabled: true,
            username: None,
            display_name: None,
            bio: None,
            public_profile: false,
            created_at: now,
            updated_at: now,
        }
    }
}
