//! Remote store boundary.
//!
//! The rest of the crate talks to the remote relational API through the
//! [`RemoteStore`] trait; `HttpRemoteStore` speaks the real API and
//! `MemoryRemoteStore` backs tests and offline development.

pub mod http;
pub mod memory;
pub mod rows;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub use http::HttpRemoteStore;
pub use memory::MemoryRemoteStore;
pub use rows::{
    RemoteSessionRow, RemoteSettingsRow, RemoteStatsRow, RemoteTagRow, RemoteTimerStateRow,
};

/// Errors from remote store operations, classified by how the sync engine
/// reacts to them.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("authentication rejected: {0}")]
    Auth(String),

    #[error("unique constraint conflict: {0}")]
    UniqueViolation(String),

    #[error("remote api error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type RemoteResult<T> = Result<T, RemoteError>;

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        RemoteError::Transport(err.to_string())
    }
}

/// A standing change feed for one user's active-timer-state row. Dropping
/// the feed (or calling `cancel`) tears the underlying channel down.
pub struct TimerStateFeed {
    pub receiver: mpsc::Receiver<RemoteTimerStateRow>,
    cancel: CancellationToken,
}

impl TimerStateFeed {
    pub fn new(receiver: mpsc::Receiver<RemoteTimerStateRow>, cancel: CancellationToken) -> Self {
        Self { receiver, cancel }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Drop for TimerStateFeed {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// The four logical remote tables plus the stats aggregate, scoped to the
/// authenticated user by the server's row-level security.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Insert one session; returns the stored row including its remote id.
    async fn insert_session(&self, row: RemoteSessionRow) -> RemoteResult<RemoteSessionRow>;

    /// Most recently created sessions for the user, newest first.
    async fn recent_sessions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> RemoteResult<Vec<RemoteSessionRow>>;

    async fn insert_tag(&self, row: RemoteTagRow) -> RemoteResult<RemoteTagRow>;

    async fn tags_for_user(&self, user_id: &str) -> RemoteResult<Vec<RemoteTagRow>>;

    async fn fetch_settings(&self, user_id: &str) -> RemoteResult<Option<RemoteSettingsRow>>;

    /// Insert-or-replace keyed by user id.
    async fn upsert_settings(&self, row: RemoteSettingsRow) -> RemoteResult<()>;

    /// Plain insert, used as the one-shot fallback after an upsert conflict.
    async fn insert_settings(&self, row: RemoteSettingsRow) -> RemoteResult<()>;

    async fn fetch_timer_state(&self, user_id: &str)
        -> RemoteResult<Option<RemoteTimerStateRow>>;

    async fn upsert_timer_state(&self, row: RemoteTimerStateRow) -> RemoteResult<()>;

    async fn insert_timer_state(&self, row: RemoteTimerStateRow) -> RemoteResult<()>;

    /// Open a change feed filtered to the given user id.
    async fn subscribe_timer_state(&self, user_id: &str) -> RemoteResult<TimerStateFeed>;

    /// Dashboard aggregate. Callers wrap this in a deadline race.
    async fn fetch_stats(&self, user_id: &str) -> RemoteResult<RemoteStatsRow>;
}
