//! Offline-first sync core for the Pomosync pomodoro timer.
//!
//! The embedding application owns the rendering layer and supplies three
//! things: a database path, an online/offline signal, and the authenticated
//! user id. The local store, the batch sync engine, the settings reconciler,
//! and the live timer-state replication channel are wired up here as
//! explicitly constructed objects, one [`SyncCore`] per authenticated
//! session.

pub mod config;
pub mod connectivity;
pub mod db;
pub mod events;
pub mod remote;
pub mod replicator;
pub mod sync;
pub mod timer;
pub mod utils;
pub mod validate;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::watch;

pub use config::SyncConfig;
pub use connectivity::ConnectivityController;
pub use db::models::{
    ActiveTimerState, NewSession, NewTag, Session, SessionKind, SoundType, Tag, UserSettings,
};
pub use db::Database;
pub use remote::{HttpRemoteStore, MemoryRemoteStore, RemoteStore};
pub use replicator::TimerStateReplicator;
pub use sync::{SyncEngine, SyncEvent, SyncStatus};
pub use timer::TimerController;

/// The fully wired sync core. Holds one of everything; the consuming
/// application constructs it once per authenticated session and passes it
/// around explicitly.
pub struct SyncCore {
    pub db: Database,
    pub engine: Arc<SyncEngine>,
    pub replicator: Arc<TimerStateReplicator>,
    pub connectivity: ConnectivityController,
    config: SyncConfig,
}

impl SyncCore {
    /// Wire the core against the HTTP remote described by the config.
    pub fn open(
        db_path: PathBuf,
        config: SyncConfig,
        online: watch::Receiver<bool>,
    ) -> Result<Self> {
        let remote: Arc<dyn RemoteStore> = Arc::new(HttpRemoteStore::new(
            &config.remote_url,
            &config.api_key,
            Duration::from_millis(config.subscribe_poll_ms),
        ));
        let db = Database::new(db_path)?;
        Ok(Self::with_remote(db, remote, online, config))
    }

    /// Wire the core against any remote store implementation.
    pub fn with_remote(
        db: Database,
        remote: Arc<dyn RemoteStore>,
        online: watch::Receiver<bool>,
        config: SyncConfig,
    ) -> Self {
        let engine = Arc::new(SyncEngine::new(
            db.clone(),
            remote.clone(),
            online.clone(),
            &config,
        ));
        let replicator = Arc::new(TimerStateReplicator::new(remote, &config));
        let connectivity = ConnectivityController::new(engine.clone(), online, &config);

        Self {
            db,
            engine,
            replicator,
            connectivity,
            config,
        }
    }

    /// Build the timer controller for the signed-in user.
    pub fn timer_controller(&self, user_id: &str) -> TimerController {
        TimerController::new(user_id, self.db.clone(), self.replicator.clone(), &self.config)
    }

    /// Handle the "user just signed in" event: start the scheduler and run
    /// the first sync.
    pub fn sign_in(&self, user_id: &str) {
        self.connectivity.start();
        self.connectivity.set_user(user_id);
    }

    pub fn sign_out(&self) {
        self.connectivity.clear_user();
        self.replicator.unsubscribe();
    }
}
