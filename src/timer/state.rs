//! Pure timer state machine: {idle, running, paused} x session kind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::models::{ActiveTimerState, SessionKind, UserSettings};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TimerPhase {
    Idle,
    Running,
    Paused,
}

impl Default for TimerPhase {
    fn default() -> Self {
        TimerPhase::Idle
    }
}

/// Seconds a full interval of `kind` lasts under the given settings.
pub fn duration_for(kind: SessionKind, settings: &UserSettings) -> i64 {
    let minutes = match kind {
        SessionKind::Focus => settings.pomodoro_length,
        SessionKind::ShortBreak => settings.short_break_length,
        SessionKind::LongBreak => settings.long_break_length,
    };
    minutes * 60
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub phase: TimerPhase,
    pub kind: SessionKind,
    pub remaining_seconds: i64,
    pub completed_sessions: i64,
    pub session_id: Option<i64>,
    pub session_start: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub notes: Option<String>,
}

impl Default for TimerState {
    fn default() -> Self {
        Self {
            phase: TimerPhase::Idle,
            kind: SessionKind::Focus,
            remaining_seconds: 0,
            completed_sessions: 0,
            session_id: None,
            session_start: None,
            tags: Vec::new(),
            notes: None,
        }
    }
}

impl TimerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// idle -> running.
    pub fn begin(&mut self, session_id: i64, duration_seconds: i64, started_at: DateTime<Utc>) {
        self.phase = TimerPhase::Running;
        self.remaining_seconds = duration_seconds;
        self.session_id = Some(session_id);
        self.session_start = Some(started_at);
    }

    /// running -> paused.
    pub fn pause(&mut self) {
        if self.phase == TimerPhase::Running {
            self.phase = TimerPhase::Paused;
        }
    }

    /// paused -> running.
    pub fn resume(&mut self) {
        if self.phase == TimerPhase::Paused {
            self.phase = TimerPhase::Running;
        }
    }

    /// Count down one second. Returns true when the interval just hit zero.
    pub fn tick(&mut self) -> bool {
        if self.phase != TimerPhase::Running || self.remaining_seconds <= 0 {
            return false;
        }
        self.remaining_seconds -= 1;
        self.remaining_seconds == 0
    }

    /// running/paused -> idle, rotating to the next kind. A completed focus
    /// interval bumps the counter; every Nth one leads into a long break
    /// (N = sessions-until-long-break), otherwise a short break. Breaks
    /// always lead back to focus.
    pub fn advance(&mut self, count_completion: bool, settings: &UserSettings) {
        if count_completion && self.kind == SessionKind::Focus {
            self.completed_sessions += 1;
        }

        let next_kind = if self.kind == SessionKind::Focus {
            if self.completed_sessions > 0
                && self.completed_sessions % settings.sessions_until_long_break == 0
            {
                SessionKind::LongBreak
            } else {
                SessionKind::ShortBreak
            }
        } else {
            SessionKind::Focus
        };

        self.phase = TimerPhase::Idle;
        self.kind = next_kind;
        self.remaining_seconds = duration_for(next_kind, settings);
        self.session_id = None;
        self.session_start = None;
        self.notes = None;
    }

    /// running/paused -> idle without rotating; the current kind's full
    /// duration is restored.
    pub fn reset(&mut self, settings: &UserSettings) {
        self.phase = TimerPhase::Idle;
        self.remaining_seconds = duration_for(self.kind, settings);
        self.session_id = None;
        self.session_start = None;
        self.notes = None;
    }

    /// Mirror of this state as the replication payload.
    pub fn to_active_state(&self, user_id: &str) -> ActiveTimerState {
        ActiveTimerState {
            user_id: user_id.to_string(),
            remaining_seconds: self.remaining_seconds,
            is_running: self.phase == TimerPhase::Running,
            is_paused: self.phase == TimerPhase::Paused,
            kind: self.kind,
            completed_sessions: self.completed_sessions,
            tags: self.tags.clone(),
            notes: self.notes.clone(),
            session_start: self.session_start,
            session_id: self.session_id,
            updated_at: Utc::now(),
        }
    }

    /// Adopt a state replicated from another device.
    pub fn apply_remote(&mut self, state: &ActiveTimerState) {
        self.phase = if state.is_running {
            TimerPhase::Running
        } else if state.is_paused {
            TimerPhase::Paused
        } else {
            TimerPhase::Idle
        };
        self.kind = state.kind;
        self.remaining_seconds = state.remaining_seconds;
        self.completed_sessions = state.completed_sessions;
        self.tags = state.tags.clone();
        self.notes = state.notes.clone();
        self.session_start = state.session_start;
        // session_id is local-only; a remote state does not carry ours.
    }
}
