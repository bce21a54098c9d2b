//! In-process remote store used by tests and offline development.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::rows::{
    RemoteSessionRow, RemoteSettingsRow, RemoteStatsRow, RemoteTagRow, RemoteTimerStateRow,
};
use super::{RemoteError, RemoteResult, RemoteStore, TimerStateFeed};

#[derive(Default)]
struct Inner {
    sessions: Vec<RemoteSessionRow>,
    tags: Vec<RemoteTagRow>,
    settings: HashMap<String, RemoteSettingsRow>,
    timer_state: HashMap<String, RemoteTimerStateRow>,

    // Failure injection for tests.
    fail_session_inserts: usize,
    settings_upsert_conflict: bool,
    timer_upsert_conflict: bool,

    session_insert_calls: usize,
    settings_fetch_calls: usize,
    timer_write_calls: usize,
}

#[derive(Clone)]
pub struct MemoryRemoteStore {
    inner: Arc<Mutex<Inner>>,
    changes: broadcast::Sender<RemoteTimerStateRow>,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            changes,
        }
    }

    /// Make the next `count` session inserts fail with a transport error.
    pub fn fail_next_session_inserts(&self, count: usize) {
        self.inner.lock().unwrap().fail_session_inserts = count;
    }

    /// Force settings upserts to report a unique-constraint conflict.
    pub fn set_settings_upsert_conflict(&self, conflict: bool) {
        self.inner.lock().unwrap().settings_upsert_conflict = conflict;
    }

    /// Force timer-state upserts to report a unique-constraint conflict.
    pub fn set_timer_upsert_conflict(&self, conflict: bool) {
        self.inner.lock().unwrap().timer_upsert_conflict = conflict;
    }

    pub fn session_insert_calls(&self) -> usize {
        self.inner.lock().unwrap().session_insert_calls
    }

    pub fn settings_fetch_calls(&self) -> usize {
        self.inner.lock().unwrap().settings_fetch_calls
    }

    /// Outbound timer-state writes (upserts plus fallback inserts).
    pub fn timer_write_calls(&self) -> usize {
        self.inner.lock().unwrap().timer_write_calls
    }

    pub fn sessions(&self) -> Vec<RemoteSessionRow> {
        self.inner.lock().unwrap().sessions.clone()
    }

    pub fn tags(&self) -> Vec<RemoteTagRow> {
        self.inner.lock().unwrap().tags.clone()
    }

    pub fn stored_settings(&self, user_id: &str) -> Option<RemoteSettingsRow> {
        self.inner.lock().unwrap().settings.get(user_id).cloned()
    }

    pub fn stored_timer_state(&self, user_id: &str) -> Option<RemoteTimerStateRow> {
        self.inner.lock().unwrap().timer_state.get(user_id).cloned()
    }

    pub fn seed_session(&self, mut row: RemoteSessionRow) {
        if row.id.is_none() {
            row.id = Some(Uuid::new_v4().to_string());
        }
        self.inner.lock().unwrap().sessions.push(row);
    }

    pub fn seed_tag(&self, mut row: RemoteTagRow) {
        if row.id.is_none() {
            row.id = Some(Uuid::new_v4().to_string());
        }
        self.inner.lock().unwrap().tags.push(row);
    }

    pub fn seed_settings(&self, row: RemoteSettingsRow) {
        self.inner
            .lock()
            .unwrap()
            .settings
            .insert(row.user_id.clone(), row);
    }

    /// Store a timer-state row and emit it on the change feed, as if another
    /// device had just published it.
    pub fn push_timer_state(&self, row: RemoteTimerStateRow) {
        self.inner
            .lock()
            .unwrap()
            .timer_state
            .insert(row.user_id.clone(), row.clone());
        let _ = self.changes.send(row);
    }
}

impl Default for MemoryRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn insert_session(&self, mut row: RemoteSessionRow) -> RemoteResult<RemoteSessionRow> {
        let mut inner = self.inner.lock().unwrap();
        inner.session_insert_calls += 1;
        if inner.fail_session_inserts > 0 {
            inner.fail_session_inserts -= 1;
            return Err(RemoteError::Transport("injected insert failure".into()));
        }
        row.id = Some(Uuid::new_v4().to_string());
        if row.created_at.is_none() {
            row.created_at = Some(Utc::now().to_rfc3339());
        }
        inner.sessions.push(row.clone());
        Ok(row)
    }

    async fn recent_sessions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> RemoteResult<Vec<RemoteSessionRow>> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<RemoteSessionRow> = inner
            .sessions
            .iter()
            .filter(|row| row.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn insert_tag(&self, mut row: RemoteTagRow) -> RemoteResult<RemoteTagRow> {
        let mut inner = self.inner.lock().unwrap();
        row.id = Some(Uuid::new_v4().to_string());
        if row.created_at.is_none() {
            row.created_at = Some(Utc::now().to_rfc3339());
        }
        inner.tags.push(row.clone());
        Ok(row)
    }

    async fn tags_for_user(&self, user_id: &str) -> RemoteResult<Vec<RemoteTagRow>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .tags
            .iter()
            .filter(|row| row.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn fetch_settings(&self, user_id: &str) -> RemoteResult<Option<RemoteSettingsRow>> {
        let mut inner = self.inner.lock().unwrap();
        inner.settings_fetch_calls += 1;
        Ok(inner.settings.get(user_id).cloned())
    }

    async fn upsert_settings(&self, row: RemoteSettingsRow) -> RemoteResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.settings_upsert_conflict {
            return Err(RemoteError::UniqueViolation(
                "duplicate key value violates unique constraint".into(),
            ));
        }
        inner.settings.insert(row.user_id.clone(), row);
        Ok(())
    }

    async fn insert_settings(&self, row: RemoteSettingsRow) -> RemoteResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.settings.contains_key(&row.user_id) {
            return Err(RemoteError::UniqueViolation(
                "settings row already exists".into(),
            ));
        }
        inner.settings.insert(row.user_id.clone(), row);
        Ok(())
    }

    async fn fetch_timer_state(
        &self,
        user_id: &str,
    ) -> RemoteResult<Option<RemoteTimerStateRow>> {
        Ok(self.inner.lock().unwrap().timer_state.get(user_id).cloned())
    }

    async fn upsert_timer_state(&self, row: RemoteTimerStateRow) -> RemoteResult<()> {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.timer_write_calls += 1;
            if inner.timer_upsert_conflict {
                return Err(RemoteError::UniqueViolation(
                    "duplicate key value violates unique constraint".into(),
                ));
            }
            inner.timer_state.insert(row.user_id.clone(), row.clone());
        }
        let _ = self.changes.send(row);
        Ok(())
    }

    async fn insert_timer_state(&self, row: RemoteTimerStateRow) -> RemoteResult<()> {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.timer_write_calls += 1;
            if inner.timer_state.contains_key(&row.user_id) {
                return Err(RemoteError::UniqueViolation(
                    "timer-state row already exists".into(),
                ));
            }
            inner.timer_state.insert(row.user_id.clone(), row.clone());
        }
        let _ = self.changes.send(row);
        Ok(())
    }

    async fn subscribe_timer_state(&self, user_id: &str) -> RemoteResult<TimerStateFeed> {
        let (tx, rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();
        let mut changes = self.changes.subscribe();
        let user_id = user_id.to_string();
        let task_cancel = cancel.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = task_cancel.cancelled() => break,
                    event = changes.recv() => match event {
                        Ok(row) if row.user_id == user_id => {
                            if tx.send(row).await.is_err() {
                                break;
                            }
                        }
                        Ok(_) => {}
                        Err(broadcast::error::RecvError::Lagged(_)) => {}
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        });

        Ok(TimerStateFeed::new(rx, cancel))
    }

    async fn fetch_stats(&self, user_id: &str) -> RemoteResult<RemoteStatsRow> {
        let inner = self.inner.lock().unwrap();
        let focus: Vec<&RemoteSessionRow> = inner
            .sessions
            .iter()
            .filter(|row| row.user_id == user_id && row.kind == "focus" && row.completed)
            .collect();
        Ok(RemoteStatsRow {
            total_sessions: focus.len() as i64,
            total_focus_seconds: focus.iter().map(|row| row.duration).sum(),
            current_streak_days: 0,
        })
    }
}
