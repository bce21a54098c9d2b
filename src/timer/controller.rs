//! Drives the timer state machine, records sessions locally, and feeds
//! every transition into the replication channel.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::Utc;
use log::{info, warn};
use tokio::sync::Mutex;

use crate::config::SyncConfig;
use crate::db::models::{ActiveTimerState, NewSession, UserSettings};
use crate::db::Database;
use crate::replicator::TimerStateReplicator;
use crate::timer::state::{duration_for, TimerPhase, TimerState};
use crate::utils::Debouncer;
use crate::validate::{self, RecordKind};

pub struct TimerController {
    user_id: String,
    db: Database,
    state: Arc<Mutex<TimerState>>,
    publish: Debouncer<ActiveTimerState>,
}

impl TimerController {
    /// Local timer-state changes are debounced before they reach the
    /// replicator, so a burst of transitions (or countdown ticks) does not
    /// turn into a write per tick.
    pub fn new(
        user_id: &str,
        db: Database,
        replicator: Arc<TimerStateReplicator>,
        config: &SyncConfig,
    ) -> Self {
        let publish = Debouncer::new(
            Duration::from_millis(config.publish_debounce_ms),
            move |state: ActiveTimerState| {
                let replicator = replicator.clone();
                Box::pin(async move {
                    replicator.publish(state);
                })
            },
        );

        Self {
            user_id: user_id.to_string(),
            db,
            state: Arc::new(Mutex::new(TimerState::new())),
            publish,
        }
    }

    /// Close sessions left open by a crash mid-interval: they get an end
    /// time and `completed = false`, the same shape as an explicit reset.
    pub async fn recover_dangling_sessions(&self) -> Result<usize> {
        let open = match self.db.open_sessions(&self.user_id).await {
            Ok(open) => open,
            Err(err) if err.is_integrity() => {
                warn!("Recovery scan hit corrupted data: {err}");
                validate::quarantine(&self.db, RecordKind::Session, &self.user_id).await?;
                self.db.open_sessions(&self.user_id).await?
            }
            Err(err) => return Err(err.into()),
        };

        let now = Utc::now();
        let count = open.len();
        for session in open {
            info!("Recovering dangling session {}", session.id);
            self.db
                .close_session(session.id, now, false, session.notes)
                .await?;
        }
        Ok(count)
    }

    pub async fn current_state(&self) -> ActiveTimerState {
        self.state.lock().await.to_active_state(&self.user_id)
    }

    /// Start the current kind's interval, creating the local session record
    /// optimistically before any remote round-trip.
    pub async fn start(&self, settings: &UserSettings) -> Result<ActiveTimerState> {
        let mut state = self.state.lock().await;
        if state.phase != TimerPhase::Idle {
            return Err(anyhow!("timer already active"));
        }

        let started_at = Utc::now();
        let duration = duration_for(state.kind, settings);
        let session_id = self
            .db
            .insert_session(
                NewSession {
                    user_id: self.user_id.clone(),
                    start_time: started_at,
                    duration,
                    kind: state.kind,
                    tags: state.tags.clone(),
                    completed: false,
                    notes: state.notes.clone(),
                },
                false,
                None,
            )
            .await?;

        state.begin(session_id, duration, started_at);
        let snapshot = state.to_active_state(&self.user_id);
        self.publish.call(snapshot.clone());
        Ok(snapshot)
    }

    pub async fn pause(&self) -> Result<ActiveTimerState> {
        let mut state = self.state.lock().await;
        if state.phase != TimerPhase::Running {
            return Err(anyhow!("no running timer to pause"));
        }
        state.pause();
        let snapshot = state.to_active_state(&self.user_id);
        self.publish.call(snapshot.clone());
        Ok(snapshot)
    }

    pub async fn resume(&self) -> Result<ActiveTimerState> {
        let mut state = self.state.lock().await;
        if state.phase != TimerPhase::Paused {
            return Err(anyhow!("no paused timer to resume"));
        }
        state.resume();
        let snapshot = state.to_active_state(&self.user_id);
        self.publish.call(snapshot.clone());
        Ok(snapshot)
    }

    /// Count down one second; when the interval reaches zero the session is
    /// completed and the machine rotates to the next kind. Returns true
    /// when this tick finished the interval.
    pub async fn tick(&self, settings: &UserSettings) -> Result<bool> {
        let mut state = self.state.lock().await;
        let finished = state.tick();
        if finished {
            self.close_and_advance(&mut state, true, true, settings)
                .await?;
        }
        let snapshot = state.to_active_state(&self.user_id);
        self.publish.call(snapshot);
        Ok(finished)
    }

    /// Explicit completion (the user ends the interval early but keeps it).
    pub async fn complete(&self, settings: &UserSettings) -> Result<ActiveTimerState> {
        let mut state = self.state.lock().await;
        if state.phase == TimerPhase::Idle {
            return Err(anyhow!("no active session to complete"));
        }
        self.close_and_advance(&mut state, true, true, settings)
            .await?;
        let snapshot = state.to_active_state(&self.user_id);
        self.publish.call(snapshot.clone());
        Ok(snapshot)
    }

    /// Abandon the current interval and move on to the next kind. The
    /// session is recorded as not completed.
    pub async fn skip(&self, settings: &UserSettings) -> Result<ActiveTimerState> {
        let mut state = self.state.lock().await;
        if state.phase == TimerPhase::Idle {
            return Err(anyhow!("no active session to skip"));
        }
        self.close_and_advance(&mut state, false, false, settings)
            .await?;
        let snapshot = state.to_active_state(&self.user_id);
        self.publish.call(snapshot.clone());
        Ok(snapshot)
    }

    /// Reset before completion: a logical cancel, recorded as
    /// `completed = false` with an end time. The kind does not rotate.
    pub async fn reset(&self, settings: &UserSettings) -> Result<ActiveTimerState> {
        let mut state = self.state.lock().await;
        if let Some(session_id) = state.session_id {
            self.db
                .close_session(session_id, Utc::now(), false, state.notes.clone())
                .await?;
        }
        state.reset(settings);
        let snapshot = state.to_active_state(&self.user_id);
        self.publish.call(snapshot.clone());
        Ok(snapshot)
    }

    pub async fn set_tags(&self, tags: Vec<String>) {
        let mut state = self.state.lock().await;
        state.tags = tags;
        let snapshot = state.to_active_state(&self.user_id);
        self.publish.call(snapshot);
    }

    pub async fn set_notes(&self, notes: Option<String>) {
        let mut state = self.state.lock().await;
        state.notes = notes;
        let snapshot = state.to_active_state(&self.user_id);
        self.publish.call(snapshot);
    }

    /// Mirror a state replicated from another device. No publish happens
    /// here; the replicator's echo suppression would reject it anyway.
    pub async fn apply_remote_state(&self, remote: &ActiveTimerState) {
        let mut state = self.state.lock().await;
        state.apply_remote(remote);
    }

    async fn close_and_advance(
        &self,
        state: &mut TimerState,
        completed: bool,
        count_completion: bool,
        settings: &UserSettings,
    ) -> Result<()> {
        if let Some(session_id) = state.session_id {
            self.db
                .close_session(session_id, Utc::now(), completed, state.notes.clone())
                .await?;
        }
        state.advance(count_completion, settings);

        let auto_start = if state.kind.is_break() {
            settings.auto_start_breaks
        } else {
            settings.auto_start_pomodoros
        };
        if auto_start {
            let started_at = Utc::now();
            let duration = duration_for(state.kind, settings);
            let session_id = self
                .db
                .insert_session(
                    NewSession {
                        user_id: self.user_id.clone(),
                        start_time: started_at,
                        duration,
                        kind: state.kind,
                        tags: state.tags.clone(),
                        completed: false,
                        notes: None,
                    },
                    false,
                    None,
                )
                .await?;
            state.begin(session_id, duration, started_at);
        }
        Ok(())
    }
}
