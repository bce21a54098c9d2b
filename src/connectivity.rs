//! Connectivity and scheduling: turns online/offline transitions, sign-in,
//! and a fixed interval into sync triggers.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::SyncConfig;
use crate::sync::SyncEngine;

pub struct ConnectivityController {
    engine: Arc<SyncEngine>,
    online: watch::Receiver<bool>,
    user: Arc<Mutex<Option<String>>>,
    interval: Duration,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ConnectivityController {
    /// `online` is the host-supplied browser/OS connectivity signal.
    pub fn new(
        engine: Arc<SyncEngine>,
        online: watch::Receiver<bool>,
        config: &SyncConfig,
    ) -> Self {
        Self {
            engine,
            online,
            user: Arc::new(Mutex::new(None)),
            interval: Duration::from_secs(config.sync_interval_secs),
            cancel: CancellationToken::new(),
            task: Mutex::new(None),
        }
    }

    /// Spawn the watcher loop: one sync on each offline-to-online
    /// transition, one sync per interval tick while online. Both require an
    /// authenticated user.
    pub fn start(&self) {
        let engine = self.engine.clone();
        let mut online = self.online.clone();
        let user = self.user.clone();
        let interval = self.interval;
        let cancel = self.cancel.clone();

        let handle = tokio::spawn(async move {
            let mut was_online = *online.borrow();
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick completes immediately; sign-in already covers
            // the initial sync.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    changed = online.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let is_online = *online.borrow();
                        if is_online && !was_online {
                            info!("Connectivity restored; triggering sync");
                            trigger(&engine, &user).await;
                        }
                        was_online = is_online;
                    }
                    _ = ticker.tick() => {
                        if *online.borrow() {
                            debug!("Scheduled sync tick");
                            trigger(&engine, &user).await;
                        }
                    }
                }
            }
            debug!("Connectivity controller stopped");
        });

        *self.task.lock().unwrap() = Some(handle);
    }

    /// Record the authenticated user. This is the "user just signed in"
    /// event: it fires the first sync for the session.
    pub fn set_user(&self, user_id: &str) {
        *self.user.lock().unwrap() = Some(user_id.to_string());

        let engine = self.engine.clone();
        let user_id = user_id.to_string();
        tokio::spawn(async move {
            if let Err(err) = engine.sync_all(&user_id).await {
                warn!("Sign-in sync failed: {err:#}");
            }
        });
    }

    pub fn clear_user(&self) {
        *self.user.lock().unwrap() = None;
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
        if let Some(handle) = self.task.lock().unwrap().take() {
            handle.abort();
        }
    }
}

impl Drop for ConnectivityController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn trigger(engine: &Arc<SyncEngine>, user: &Arc<Mutex<Option<String>>>) {
    let user_id = user.lock().unwrap().clone();
    let Some(user_id) = user_id else {
        debug!("No authenticated user; skipping sync trigger");
        return;
    };

    let engine = engine.clone();
    tokio::spawn(async move {
        // Failures are already logged and reflected in status events;
        // the next trigger retries naturally.
        let _ = engine.sync_all(&user_id).await;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::remote::MemoryRemoteStore;

    fn setup(
        online: bool,
        interval_secs: u64,
    ) -> (
        ConnectivityController,
        MemoryRemoteStore,
        watch::Sender<bool>,
    ) {
        let db = Database::open_in_memory().unwrap();
        let remote = MemoryRemoteStore::new();
        let (tx, rx) = watch::channel(online);
        let mut config = SyncConfig::default();
        config.sync_interval_secs = interval_secs;
        let engine = Arc::new(SyncEngine::new(
            db,
            Arc::new(remote.clone()),
            rx.clone(),
            &config,
        ));
        let controller = ConnectivityController::new(engine, rx, &config);
        (controller, remote, tx)
    }

    #[tokio::test]
    async fn test_sign_in_triggers_first_sync() {
        let (controller, remote, _tx) = setup(true, 300);

        controller.set_user("user-1");
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(remote.settings_fetch_calls(), 1);
    }

    #[tokio::test]
    async fn test_online_transition_triggers_sync() {
        let (controller, remote, tx) = setup(false, 300);
        controller.start();

        controller.set_user("user-1");
        tokio::time::sleep(Duration::from_millis(50)).await;
        // Offline: the sign-in sync was a no-op.
        assert_eq!(remote.settings_fetch_calls(), 0);

        tx.send(true).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(remote.settings_fetch_calls(), 1);

        controller.shutdown();
    }

    #[tokio::test]
    async fn test_no_trigger_without_authenticated_user() {
        let (controller, remote, tx) = setup(false, 300);
        controller.start();

        tx.send(true).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(remote.settings_fetch_calls(), 0);
        controller.shutdown();
    }

    #[tokio::test]
    async fn test_interval_triggers_repeated_syncs() {
        let (controller, remote, _tx) = setup(true, 1);
        controller.start();
        controller.set_user("user-1");

        tokio::time::sleep(Duration::from_millis(2500)).await;

        // Sign-in sync plus at least one interval tick.
        assert!(remote.settings_fetch_calls() >= 2);
        controller.shutdown();
    }
}
