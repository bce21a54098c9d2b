//! Session-related data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of timer interval a session records.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum SessionKind {
    Focus,
    ShortBreak,
    LongBreak,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Focus => "focus",
            SessionKind::ShortBreak => "short_break",
            SessionKind::LongBreak => "long_break",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "focus" => Some(SessionKind::Focus),
            "short_break" => Some(SessionKind::ShortBreak),
            "long_break" => Some(SessionKind::LongBreak),
            _ => None,
        }
    }

    pub fn is_break(&self) -> bool {
        !matches!(self, SessionKind::Focus)
    }
}

/// One completed or in-progress timer interval.
///
/// `synced` stays false until the sync engine confirms the remote store
/// accepted the record; only the engine ever flips it to true.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: i64,
    pub user_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    /// Planned interval length in seconds.
    pub duration: i64,
    pub kind: SessionKind,
    pub tags: Vec<String>,
    pub completed: bool,
    pub notes: Option<String>,
    pub synced: bool,
    /// Id assigned by the remote store after a successful upload.
    pub remote_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a local session before any remote round-trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSession {
    pub user_id: String,
    pub start_time: DateTime<Utc>,
    pub duration: i64,
    pub kind: SessionKind,
    pub tags: Vec<String>,
    pub completed: bool,
    pub notes: Option<String>,
}

impl Session {
    /// De-duplication key: remote and local stores share no stable id, so
    /// (start time RFC 3339, duration, kind) stands in for identity.
    pub fn dedup_key(&self) -> SessionKey {
        SessionKey {
            start_time: self.start_time.to_rfc3339(),
            duration: self.duration,
            kind: self.kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub start_time: String,
    pub duration: i64,
    pub kind: SessionKind,
}
