pub mod engine;
pub mod settings;

use serde::{Deserialize, Serialize};

pub use engine::SyncEngine;

/// User-visible sync state, reflected by a non-blocking status indicator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SyncStatus {
    Offline,
    Syncing,
    Synced,
    SyncFailed,
}

/// Notifications emitted by the sync engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    Status(SyncStatus),
    Completed { user_id: String },
}
