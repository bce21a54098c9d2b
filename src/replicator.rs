//! Near-real-time replication of the active timer state across a user's
//! open sessions.
//!
//! Runs outside the batch sync cycle on its own channel: outbound writes
//! are debounced upserts keyed by user id, inbound changes arrive over the
//! remote change feed. The replicator remembers the last state it delivered
//! or wrote (`last_synced`) and refuses to re-publish a matching state, so
//! a change that round-trips through the remote store cannot loop forever.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, warn};
use tokio::task::JoinHandle;

use crate::config::SyncConfig;
use crate::db::models::ActiveTimerState;
use crate::remote::{RemoteError, RemoteStore, RemoteTimerStateRow};
use crate::utils::Debouncer;

type ChangeCallback = Arc<dyn Fn(ActiveTimerState) + Send + Sync + 'static>;

pub struct TimerStateReplicator {
    remote: Arc<dyn RemoteStore>,
    last_synced: Arc<Mutex<Option<ActiveTimerState>>>,
    debouncer: Debouncer<ActiveTimerState>,
    subscription: Mutex<Option<JoinHandle<()>>>,
}

impl TimerStateReplicator {
    pub fn new(remote: Arc<dyn RemoteStore>, config: &SyncConfig) -> Self {
        let last_synced: Arc<Mutex<Option<ActiveTimerState>>> = Arc::new(Mutex::new(None));

        let debounce_remote = remote.clone();
        let debounce_last = last_synced.clone();
        let debouncer = Debouncer::new(
            Duration::from_millis(config.replicate_debounce_ms),
            move |state: ActiveTimerState| {
                let remote = debounce_remote.clone();
                let last_synced = debounce_last.clone();
                Box::pin(async move {
                    if let Err(err) = write_state(remote.as_ref(), &state).await {
                        warn!("Timer-state publish failed: {err:#}");
                        return;
                    }
                    *last_synced.lock().unwrap() = Some(state);
                })
            },
        );

        Self {
            remote,
            last_synced,
            debouncer,
            subscription: Mutex::new(None),
        }
    }

    /// Open a standing change feed for `user_id`. The current remote state
    /// is fetched and delivered immediately so a freshly-opened session is
    /// not stuck waiting for the next change event; every subsequent change
    /// for this user is delivered to `on_change`.
    pub async fn subscribe<F>(&self, user_id: &str, on_change: F) -> Result<()>
    where
        F: Fn(ActiveTimerState) + Send + Sync + 'static,
    {
        self.unsubscribe();

        let callback: ChangeCallback = Arc::new(on_change);

        if let Some(row) = self
            .remote
            .fetch_timer_state(user_id)
            .await
            .context("initial timer-state fetch failed")?
        {
            if let Some(state) = row.into_state() {
                *self.last_synced.lock().unwrap() = Some(state.clone());
                callback(state);
            }
        }

        let mut feed = self
            .remote
            .subscribe_timer_state(user_id)
            .await
            .context("failed to open timer-state feed")?;

        let last_synced = self.last_synced.clone();
        let handle = tokio::spawn(async move {
            while let Some(row) = feed.receiver.recv().await {
                let Some(state) = row.into_state() else {
                    debug!("Skipping malformed timer-state event");
                    continue;
                };
                *last_synced.lock().unwrap() = Some(state.clone());
                callback(state);
            }
        });

        *self.subscription.lock().unwrap() = Some(handle);
        Ok(())
    }

    pub fn unsubscribe(&self) {
        if let Some(handle) = self.subscription.lock().unwrap().take() {
            handle.abort();
        }
        self.debouncer.cancel();
    }

    /// True when `state` differs from the last state this replicator
    /// delivered or wrote. A matching state originated from this device's
    /// own replication round-trip and must not be re-published.
    pub fn should_publish(&self, state: &ActiveTimerState) -> bool {
        match self.last_synced.lock().unwrap().as_ref() {
            Some(last) => !last.same_core_state(state),
            None => true,
        }
    }

    /// Queue a state change for upload. Calls within the debounce window
    /// collapse into a single outbound write carrying the latest state.
    pub fn publish(&self, state: ActiveTimerState) {
        if !self.should_publish(&state) {
            debug!("Suppressing echo publish for {}", state.user_id);
            return;
        }
        self.debouncer.call(state);
    }
}

impl Drop for TimerStateReplicator {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// Upsert keyed by user id; a uniqueness conflict falls back to a plain
/// insert once.
async fn write_state(remote: &dyn RemoteStore, state: &ActiveTimerState) -> Result<()> {
    let row = RemoteTimerStateRow::from(state);
    match remote.upsert_timer_state(row.clone()).await {
        Ok(()) => Ok(()),
        Err(RemoteError::UniqueViolation(message)) => {
            warn!("Timer-state upsert conflicted ({message}); retrying as plain insert");
            remote
                .insert_timer_state(row)
                .await
                .context("timer-state insert fallback failed")
        }
        Err(err) => Err(err).context("timer-state upsert failed"),
    }
}
