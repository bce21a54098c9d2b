//! Live countdown state replicated across open sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SessionKind;

/// Snapshot of the in-progress timer for one user.
///
/// Overwritten in place per user (never appended); the remote singleton row
/// is last-write-wins with no resolution beyond recency.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActiveTimerState {
    pub user_id: String,
    pub remaining_seconds: i64,
    pub is_running: bool,
    pub is_paused: bool,
    pub kind: SessionKind,
    pub completed_sessions: i64,
    pub tags: Vec<String>,
    pub notes: Option<String>,
    pub session_start: Option<DateTime<Utc>>,
    /// Local id of the in-progress Session record, when one exists.
    pub session_id: Option<i64>,
    pub updated_at: DateTime<Utc>,
}

impl ActiveTimerState {
    /// Equality over the fields that describe the countdown itself, ignoring
    /// bookkeeping like `updated_at`. Used for echo suppression: a state that
    /// matches what this device last published came from its own round-trip.
    pub fn same_core_state(&self, other: &ActiveTimerState) -> bool {
        self.remaining_seconds == other.remaining_seconds
            && self.is_running == other.is_running
            && self.is_paused == other.is_paused
            && self.kind == other.kind
            && self.completed_sessions == other.completed_sessions
    }
}
