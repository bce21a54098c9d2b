//! Wire-format rows for the remote relational API.
//!
//! The remote store speaks snake_case JSON; local models are the camelCase
//! structs under `db::models`. Every field that crosses the boundary is
//! listed here exactly once, in both directions, so the mapping stays a
//! single auditable table instead of ad hoc literals at call sites.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::models::{ActiveTimerState, Session, SessionKind, SoundType, Tag, UserSettings};

/// Remote `sessions` row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteSessionRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: String,
    pub start_time: String,
    #[serde(default)]
    pub end_time: Option<String>,
    pub duration: i64,
    pub kind: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub completed: bool,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl From<&Session> for RemoteSessionRow {
    fn from(session: &Session) -> Self {
        Self {
            id: session.remote_id.clone(),
            user_id: session.user_id.clone(),
            start_time: session.start_time.to_rfc3339(),
            end_time: session.end_time.map(|dt| dt.to_rfc3339()),
            duration: session.duration,
            kind: session.kind.as_str().to_string(),
            tags: session.tags.clone(),
            completed: session.completed,
            notes: session.notes.clone(),
            created_at: Some(session.created_at.to_rfc3339()),
        }
    }
}

impl RemoteSessionRow {
    /// Convert to a local session. Returns `None` when the remote record is
    /// itself malformed (bad timestamp or kind); such records are skipped
    /// during download rather than imported as corruption.
    pub fn into_session(self) -> Option<Session> {
        let start_time = parse_wire_datetime(&self.start_time)?;
        let kind = SessionKind::parse(&self.kind)?;
        let end_time = match self.end_time {
            Some(raw) => Some(parse_wire_datetime(&raw)?),
            None => None,
        };
        let created_at = self
            .created_at
            .as_deref()
            .and_then(parse_wire_datetime)
            .unwrap_or(start_time);

        let mut tags = self.tags;
        tags.sort();
        tags.dedup();

        Some(Session {
            id: 0,
            user_id: self.user_id,
            start_time,
            end_time,
            duration: self.duration,
            kind,
            tags,
            completed: self.completed,
            notes: self.notes,
            synced: true,
            remote_id: self.id,
            created_at,
            updated_at: created_at,
        })
    }
}

/// Remote `tags` row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteTagRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: String,
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl From<&Tag> for RemoteTagRow {
    fn from(tag: &Tag) -> Self {
        Self {
            id: tag.remote_id.clone(),
            user_id: tag.user_id.clone(),
            name: tag.name.clone(),
            color: tag.color.clone(),
            created_at: Some(tag.created_at.to_rfc3339()),
        }
    }
}

/// Remote `user_settings` row. Numeric and boolean fields arrive as options
/// so partially-written rows deserialize instead of failing; conversion
/// fills the gaps with defaults and sanitization clamps afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteSettingsRow {
    pub user_id: String,
    #[serde(default)]
    pub pomodoro_length: Option<i64>,
    #[serde(default)]
    pub short_break_length: Option<i64>,
    #[serde(default)]
    pub long_break_length: Option<i64>,
    #[serde(default)]
    pub sessions_until_long_break: Option<i64>,
    #[serde(default)]
    pub auto_start_breaks: Option<bool>,
    #[serde(default)]
    pub auto_start_pomodoros: Option<bool>,
    #[serde(default)]
    pub sound_enabled: Option<bool>,
    #[serde(default)]
    pub sound_type: Option<String>,
    #[serde(default)]
    pub notifications_enabled: Option<bool>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub public_profile: Option<bool>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl From<&UserSettings> for RemoteSettingsRow {
    fn from(settings: &UserSettings) -> Self {
        Self {
            user_id: settings.user_id.clone(),
            pomodoro_length: Some(settings.pomodoro_length),
            short_break_length: Some(settings.short_break_length),
            long_break_length: Some(settings.long_break_length),
            sessions_until_long_break: Some(settings.sessions_until_long_break),
            auto_start_breaks: Some(settings.auto_start_breaks),
            auto_start_pomodoros: Some(settings.auto_start_pomodoros),
            sound_enabled: Some(settings.sound_enabled),
            sound_type: Some(settings.sound_type.as_str().to_string()),
            notifications_enabled: Some(settings.notifications_enabled),
            username: settings.username.clone(),
            display_name: settings.display_name.clone(),
            bio: settings.bio.clone(),
            public_profile: Some(settings.public_profile),
            updated_at: Some(settings.updated_at.to_rfc3339()),
        }
    }
}

impl RemoteSettingsRow {
    /// Convert to local settings, substituting documented defaults for any
    /// missing field. Booleans are always concrete after this point.
    pub fn into_settings(self, now: DateTime<Utc>) -> UserSettings {
        let defaults = UserSettings::defaults(&self.user_id, now);
        UserSettings {
            id: 0,
            user_id: self.user_id,
            pomodoro_length: self.pomodoro_length.unwrap_or(defaults.pomodoro_length),
            short_break_length: self
                .short_break_length
                .unwrap_or(defaults.short_break_length),
            long_break_length: self.long_break_length.unwrap_or(defaults.long_break_length),
            sessions_until_long_break: self
                .sessions_until_long_break
                .unwrap_or(defaults.sessions_until_long_break),
            auto_start_breaks: self.auto_start_breaks.unwrap_or(defaults.auto_start_breaks),
            auto_start_pomodoros: self
                .auto_start_pomodoros
                .unwrap_or(defaults.auto_start_pomodoros),
            sound_enabled: self.sound_enabled.unwrap_or(defaults.sound_enabled),
            sound_type: self
                .sound_type
                .as_deref()
                .and_then(SoundType::parse)
                .unwrap_or_default(),
            notifications_enabled: self
                .notifications_enabled
                .unwrap_or(defaults.notifications_enabled),
            username: self.username,
            display_name: self.display_name,
            bio: self.bio,
            public_profile: self.public_profile.unwrap_or(defaults.public_profile),
            created_at: now,
            updated_at: self
                .updated_at
                .as_deref()
                .and_then(parse_wire_datetime)
                .unwrap_or(now),
        }
    }
}

/// Remote `active_timer_state` row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteTimerStateRow {
    pub user_id: String,
    pub remaining_seconds: i64,
    pub is_running: bool,
    pub is_paused: bool,
    pub kind: String,
    pub completed_sessions: i64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub session_start: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl From<&ActiveTimerState> for RemoteTimerStateRow {
    fn from(state: &ActiveTimerState) -> Self {
        Self {
            user_id: state.user_id.clone(),
            remaining_seconds: state.remaining_seconds,
            is_running: state.is_running,
            is_paused: state.is_paused,
            kind: state.kind.as_str().to_string(),
            completed_sessions: state.completed_sessions,
            tags: state.tags.clone(),
            notes: state.notes.clone(),
            session_start: state.session_start.map(|dt| dt.to_rfc3339()),
            updated_at: Some(state.updated_at.to_rfc3339()),
        }
    }
}

impl RemoteTimerStateRow {
    pub fn into_state(self) -> Option<ActiveTimerState> {
        let kind = SessionKind::parse(&self.kind)?;
        let session_start = match self.session_start {
            Some(raw) => Some(parse_wire_datetime(&raw)?),
            None => None,
        };
        let updated_at = self
            .updated_at
            .as_deref()
            .and_then(parse_wire_datetime)
            .unwrap_or_else(Utc::now);

        Some(ActiveTimerState {
            user_id: self.user_id,
            remaining_seconds: self.remaining_seconds,
            is_running: self.is_running,
            is_paused: self.is_paused,
            kind,
            completed_sessions: self.completed_sessions,
            tags: self.tags,
            notes: self.notes,
            session_start,
            session_id: None,
            updated_at,
        })
    }
}

/// Aggregate returned by the dashboard stats endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteStatsRow {
    pub total_sessions: i64,
    pub total_focus_seconds: i64,
    #[serde(default)]
    pub current_streak_days: i64,
}

fn parse_wire_datetime(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_session_maps_both_directions() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let session = Session {
            id: 7,
            user_id: "user-1".to_string(),
            start_time: start,
            end_time: None,
            duration: 1500,
            kind: SessionKind::Focus,
            tags: vec!["writing".to_string()],
            completed: true,
            notes: Some("draft chapter".to_string()),
            synced: false,
            remote_id: None,
            created_at: start,
            updated_at: start,
        };

        let row = RemoteSessionRow::from(&session);
        assert_eq!(row.kind, "focus");
        assert_eq!(row.start_time, start.to_rfc3339());

        let back = row.into_session().unwrap();
        assert_eq!(back.start_time, start);
        assert_eq!(back.kind, SessionKind::Focus);
        assert!(back.synced);
    }

    #[test]
    fn test_malformed_remote_session_is_rejected() {
        let row = RemoteSessionRow {
            id: Some("r-1".to_string()),
            user_id: "user-1".to_string(),
            start_time: "yesterday".to_string(),
            end_time: None,
            duration: 1500,
            kind: "focus".to_string(),
            tags: Vec::new(),
            completed: true,
            notes: None,
            created_at: None,
        };
        assert!(row.into_session().is_none());
    }

    #[test]
    fn test_partial_settings_row_fills_defaults() {
        let row = RemoteSettingsRow {
            user_id: "user-1".to_string(),
            pomodoro_length: Some(30),
            short_break_length: None,
            long_break_length: None,
            sessions_until_long_break: None,
            auto_start_breaks: None,
            auto_start_pomodoros: None,
            sound_enabled: None,
            sound_type: Some("gong".to_string()),
            notifications_enabled: None,
            username: None,
            display_name: None,
            bio: None,
            public_profile: None,
            updated_at: None,
        };

        let settings = row.into_settings(Utc::now());
        assert_eq!(settings.pomodoro_length, 30);
        assert_eq!(settings.short_break_length, 5);
        // Unknown sound type falls back to the default.
        assert_eq!(settings.sound_type, SoundType::Beep);
        assert!(settings.sound_enabled);
    }

    #[test]
    fn test_wire_rows_use_snake_case() {
        let state = ActiveTimerState {
            user_id: "user-1".to_string(),
            remaining_seconds: 900,
            is_running: true,
            is_paused: false,
            kind: SessionKind::ShortBreak,
            completed_sessions: 2,
            tags: Vec::new(),
            notes: None,
            session_start: None,
            session_id: Some(3),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(RemoteTimerStateRow::from(&state)).unwrap();
        assert!(json.get("remaining_seconds").is_some());
        assert!(json.get("completed_sessions").is_some());
        assert_eq!(json.get("kind").unwrap(), "short_break");
    }
}
