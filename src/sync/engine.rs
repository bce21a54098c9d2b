//! Batch reconciliation between the local store and the remote API.
//!
//! One pass per trigger: settings first, then sessions (upload before
//! download), then tags, then a duplicate-cleanup sweep. Individual record
//! failures are logged and retried on the next scheduled pass; there is no
//! backoff beyond the fixed trigger interval.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use log::{debug, error, info, warn};
use tokio::sync::watch;
use tokio::time::timeout;

use crate::config::SyncConfig;
use crate::db::models::{Session, SessionKey};
use crate::db::Database;
use crate::events::EventEmitter;
use crate::remote::{RemoteSessionRow, RemoteStatsRow, RemoteStore, RemoteTagRow};
use crate::sync::{settings, SyncEvent, SyncStatus};
use crate::validate::{self, RecordKind};

/// Releases the in-progress flag on every exit path.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct SyncEngine {
    db: Database,
    remote: Arc<dyn RemoteStore>,
    online: watch::Receiver<bool>,
    events: EventEmitter<SyncEvent>,
    in_flight: AtomicBool,
    download_limit: usize,
    dedup_window: chrono::Duration,
    stats_deadline: Duration,
}

impl SyncEngine {
    pub fn new(
        db: Database,
        remote: Arc<dyn RemoteStore>,
        online: watch::Receiver<bool>,
        config: &SyncConfig,
    ) -> Self {
        Self {
            db,
            remote,
            online,
            events: EventEmitter::new(),
            in_flight: AtomicBool::new(false),
            download_limit: config.session_download_limit,
            dedup_window: chrono::Duration::days(config.dedup_window_days),
            stats_deadline: Duration::from_secs(config.stats_deadline_secs),
        }
    }

    pub fn events(&self) -> &EventEmitter<SyncEvent> {
        &self.events
    }

    pub fn is_online(&self) -> bool {
        *self.online.borrow()
    }

    /// Run one full reconciliation pass. No-op when offline, when the user
    /// id is empty, or when a pass is already in flight (at most one sync
    /// per engine instance at any time).
    ///
    /// Failures are logged and reflected in the status events; the returned
    /// error exists so an explicit user-invoked "force sync" can surface a
    /// notification. Background callers ignore it.
    pub async fn sync_all(&self, user_id: &str) -> Result<()> {
        if user_id.is_empty() {
            return Ok(());
        }
        if !self.is_online() {
            self.events.emit(&SyncEvent::Status(SyncStatus::Offline));
            return Ok(());
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Sync already in progress; skipping");
            return Ok(());
        }
        let _guard = InFlightGuard(&self.in_flight);

        self.events.emit(&SyncEvent::Status(SyncStatus::Syncing));

        match self.run_pass(user_id).await {
            Ok(()) => {
                self.events.emit(&SyncEvent::Status(SyncStatus::Synced));
                self.events.emit(&SyncEvent::Completed {
                    user_id: user_id.to_string(),
                });
                Ok(())
            }
            Err(err) => {
                error!("Sync pass failed for {user_id}: {err:#}");
                self.events.emit(&SyncEvent::Status(SyncStatus::SyncFailed));
                Err(err)
            }
        }
    }

    async fn run_pass(&self, user_id: &str) -> Result<()> {
        // Settings must resolve before anything else: a missing settings row
        // can signal the first sync for this user.
        settings::reconcile(&self.db, self.remote.as_ref(), user_id)
            .await
            .context("settings reconciliation failed")?;

        self.sync_sessions(user_id).await?;
        self.sync_tags(user_id).await?;
        self.cleanup_duplicate_sessions(user_id).await?;

        Ok(())
    }

    /// Read unsynced records, quarantining and re-reading once if the
    /// strict read trips over corrupted rows.
    async fn unsynced_sessions_healed(&self, user_id: &str) -> Result<Vec<Session>> {
        match self.db.unsynced_sessions(user_id).await {
            Ok(sessions) => Ok(sessions),
            Err(err) if err.is_integrity() => {
                warn!("Unsynced session read hit corrupted data: {err}");
                validate::quarantine(&self.db, RecordKind::Session, user_id).await?;
                Ok(self.db.unsynced_sessions(user_id).await?)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn sync_sessions(&self, user_id: &str) -> Result<()> {
        // Upload before download, so a record we just pushed is matched by
        // its dedup key instead of being re-imported as foreign.
        let unsynced = self.unsynced_sessions_healed(user_id).await?;
        let mut uploaded = 0usize;
        for session in &unsynced {
            match self
                .remote
                .insert_session(RemoteSessionRow::from(session))
                .await
            {
                Ok(stored) => {
                    self.db.mark_session_synced(session.id, stored.id).await?;
                    uploaded += 1;
                }
                Err(err) => {
                    // Leave synced = false; the next scheduled pass retries.
                    warn!("Failed to upload session {}: {err}", session.id);
                }
            }
        }
        if uploaded > 0 {
            info!("Uploaded {uploaded} session(s) for {user_id}");
        }

        let remote_rows = self
            .remote
            .recent_sessions(user_id, self.download_limit)
            .await
            .context("session download failed")?;

        let mut local_keys = self.local_session_keys(user_id).await?;
        let mut downloaded = 0usize;
        for row in remote_rows {
            let Some(session) = row.into_session() else {
                debug!("Skipping malformed remote session for {user_id}");
                continue;
            };
            let key = session.dedup_key();
            if local_keys.contains(&key) {
                continue;
            }
            self.db.insert_downloaded_session(session).await?;
            local_keys.insert(key);
            downloaded += 1;
        }
        if downloaded > 0 {
            info!("Downloaded {downloaded} session(s) for {user_id}");
        }

        Ok(())
    }

    /// Dedup keys for roughly the last year of local sessions. Falls back
    /// to the lenient read (skip bad rows in memory) after quarantine.
    async fn local_session_keys(&self, user_id: &str) -> Result<HashSet<SessionKey>> {
        let since = Utc::now() - self.dedup_window;
        let sessions = match self.db.sessions_since(user_id, since).await {
            Ok(sessions) => sessions,
            Err(err) if err.is_integrity() => {
                warn!("Session key scan hit corrupted data: {err}");
                validate::quarantine(&self.db, RecordKind::Session, user_id).await?;
                self.db.sessions_since_lenient(user_id, since).await
            }
            Err(err) => return Err(err.into()),
        };
        Ok(sessions.iter().map(Session::dedup_key).collect())
    }

    async fn sync_tags(&self, user_id: &str) -> Result<()> {
        let unsynced = match self.db.unsynced_tags(user_id).await {
            Ok(tags) => tags,
            Err(err) if err.is_integrity() => {
                warn!("Unsynced tag read hit corrupted data: {err}");
                validate::quarantine(&self.db, RecordKind::Tag, user_id).await?;
                self.db.unsynced_tags(user_id).await?
            }
            Err(err) => return Err(err.into()),
        };

        for tag in &unsynced {
            match self.remote.insert_tag(RemoteTagRow::from(tag)).await {
                Ok(stored) => {
                    self.db.mark_tag_synced(tag.id, stored.id).await?;
                }
                Err(err) => {
                    warn!("Failed to upload tag '{}': {err}", tag.name);
                }
            }
        }

        let remote_rows = self
            .remote
            .tags_for_user(user_id)
            .await
            .context("tag download failed")?;

        // Tag names are expected unique per user and serve as the dedup key.
        let mut local_names: HashSet<String> = self
            .db
            .tags_for_user_lenient(user_id)
            .await
            .into_iter()
            .map(|tag| tag.name)
            .collect();

        for row in remote_rows {
            if row.name.is_empty() || row.color.is_empty() {
                debug!("Skipping malformed remote tag for {user_id}");
                continue;
            }
            if local_names.contains(&row.name) {
                continue;
            }
            local_names.insert(row.name.clone());
            self.db
                .insert_tag(
                    crate::db::models::NewTag {
                        user_id: row.user_id,
                        name: row.name,
                        color: row.color,
                    },
                    true,
                    row.id,
                )
                .await?;
        }

        Ok(())
    }

    /// Collapse groups of sessions sharing a dedup key down to the earliest
    /// created record. Guards against the upload/download race where a
    /// session's own upload is re-imported before its synced flag commits.
    async fn cleanup_duplicate_sessions(&self, user_id: &str) -> Result<()> {
        let since = Utc::now() - self.dedup_window;
        let sessions = self.db.sessions_since_lenient(user_id, since).await;

        let mut groups: std::collections::HashMap<SessionKey, Vec<&Session>> =
            std::collections::HashMap::new();
        for session in &sessions {
            groups.entry(session.dedup_key()).or_default().push(session);
        }

        let mut to_delete = Vec::new();
        for (_, mut group) in groups {
            if group.len() < 2 {
                continue;
            }
            group.sort_by_key(|session| (session.created_at, session.id));
            for duplicate in &group[1..] {
                to_delete.push(duplicate.id);
            }
        }

        if !to_delete.is_empty() {
            let count = to_delete.len();
            self.db.delete_sessions(to_delete).await?;
            info!("Duplicate cleanup removed {count} session(s) for {user_id}");
        }

        Ok(())
    }

    /// Dashboard aggregate, raced against a fixed deadline. A timeout or
    /// error resolves to "no data" instead of hanging or propagating.
    pub async fn fetch_stats(&self, user_id: &str) -> Option<RemoteStatsRow> {
        match timeout(self.stats_deadline, self.remote.fetch_stats(user_id)).await {
            Ok(Ok(stats)) => Some(stats),
            Ok(Err(err)) => {
                warn!("Stats fetch failed for {user_id}: {err}");
                None
            }
            Err(_) => {
                warn!("Stats fetch for {user_id} timed out");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, Utc};
    use rusqlite::params;
    use tokio::sync::Notify;

    use super::*;
    use crate::db::models::{NewSession, NewTag, SessionKind};
    use crate::remote::{
        MemoryRemoteStore, RemoteResult, RemoteSettingsRow, RemoteTimerStateRow, TimerStateFeed,
    };

    // A dropped watch sender leaves the receiver serving the last value,
    // which is exactly what a fixed-connectivity test needs.
    fn online_engine(db: &Database, remote: Arc<dyn RemoteStore>) -> SyncEngine {
        let (_tx, rx) = watch::channel(true);
        SyncEngine::new(db.clone(), remote, rx, &SyncConfig::default())
    }

    fn offline_engine(db: &Database, remote: Arc<dyn RemoteStore>) -> SyncEngine {
        let (_tx, rx) = watch::channel(false);
        SyncEngine::new(db.clone(), remote, rx, &SyncConfig::default())
    }

    fn new_session(user_id: &str, offset_minutes: i64) -> NewSession {
        NewSession {
            user_id: user_id.to_string(),
            start_time: Utc::now() - ChronoDuration::minutes(offset_minutes),
            duration: 1500,
            kind: SessionKind::Focus,
            tags: Vec::new(),
            completed: true,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_offline_sync_is_a_noop() {
        let db = Database::open_in_memory().unwrap();
        let remote = MemoryRemoteStore::new();
        let engine = offline_engine(&db, Arc::new(remote.clone()));

        db.insert_session(new_session("user-1", 30), false, None)
            .await
            .unwrap();
        engine.sync_all("user-1").await.unwrap();

        assert_eq!(remote.settings_fetch_calls(), 0);
        assert!(remote.sessions().is_empty());
    }

    #[tokio::test]
    async fn test_empty_user_id_is_a_noop() {
        let db = Database::open_in_memory().unwrap();
        let remote = MemoryRemoteStore::new();
        let engine = online_engine(&db, Arc::new(remote.clone()));

        engine.sync_all("").await.unwrap();
        assert_eq!(remote.settings_fetch_calls(), 0);
    }

    #[tokio::test]
    async fn test_upload_marks_sessions_synced() {
        let db = Database::open_in_memory().unwrap();
        let remote = MemoryRemoteStore::new();
        let engine = online_engine(&db, Arc::new(remote.clone()));

        let id = db
            .insert_session(new_session("user-1", 30), false, None)
            .await
            .unwrap();
        engine.sync_all("user-1").await.unwrap();

        assert_eq!(remote.sessions().len(), 1);
        let session = db.get_session(id).await.unwrap().unwrap();
        assert!(session.synced);
        assert!(session.remote_id.is_some());
    }

    #[tokio::test]
    async fn test_repeated_sync_does_not_duplicate() {
        let db = Database::open_in_memory().unwrap();
        let remote = MemoryRemoteStore::new();
        let engine = online_engine(&db, Arc::new(remote.clone()));

        db.insert_session(new_session("user-1", 30), false, None)
            .await
            .unwrap();
        engine.sync_all("user-1").await.unwrap();
        engine.sync_all("user-1").await.unwrap();

        assert_eq!(remote.sessions().len(), 1);
        // The second pass issued no session insert at all.
        assert_eq!(remote.session_insert_calls(), 1);
        let since = Utc::now() - ChronoDuration::days(1);
        assert_eq!(db.sessions_since("user-1", since).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_cleanup_keeps_earliest_created() {
        let db = Database::open_in_memory().unwrap();
        let remote = MemoryRemoteStore::new();
        let engine = online_engine(&db, Arc::new(remote.clone()));

        // Two local records with the same dedup key, as left behind by the
        // upload/re-download race.
        let start = Utc::now() - ChronoDuration::minutes(30);
        let template = NewSession {
            user_id: "user-1".to_string(),
            start_time: start,
            duration: 1500,
            kind: SessionKind::Focus,
            tags: Vec::new(),
            completed: true,
            notes: None,
        };
        let first = db
            .insert_session(template.clone(), true, Some("r-1".to_string()))
            .await
            .unwrap();
        let second = db.insert_session(template, true, None).await.unwrap();
        // Make creation order unambiguous.
        db.execute(move |conn| {
            conn.execute(
                "UPDATE sessions SET created_at = ?1 WHERE id = ?2",
                params![(Utc::now() - ChronoDuration::minutes(5)).to_rfc3339(), first],
            )?;
            conn.execute(
                "UPDATE sessions SET created_at = ?1 WHERE id = ?2",
                params![Utc::now().to_rfc3339(), second],
            )?;
            Ok(())
        })
        .await
        .unwrap();

        engine.sync_all("user-1").await.unwrap();

        let since = Utc::now() - ChronoDuration::days(1);
        let remaining = db.sessions_since("user-1", since).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, first);
    }

    #[tokio::test]
    async fn test_tag_dedup_by_name() {
        let db = Database::open_in_memory().unwrap();
        let remote = MemoryRemoteStore::new();
        let engine = online_engine(&db, Arc::new(remote.clone()));

        db.insert_tag(
            NewTag {
                user_id: "user-1".to_string(),
                name: "Work".to_string(),
                color: "#ff0000".to_string(),
            },
            false,
            None,
        )
        .await
        .unwrap();
        remote.seed_tag(crate::remote::RemoteTagRow {
            id: None,
            user_id: "user-1".to_string(),
            name: "Work".to_string(),
            color: "#ff0000".to_string(),
            created_at: None,
        });
        remote.seed_tag(crate::remote::RemoteTagRow {
            id: None,
            user_id: "user-1".to_string(),
            name: "Personal".to_string(),
            color: "#00ff00".to_string(),
            created_at: None,
        });

        engine.sync_all("user-1").await.unwrap();

        let mut names: Vec<String> = db
            .tags_for_user("user-1")
            .await
            .unwrap()
            .into_iter()
            .map(|tag| tag.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["Personal".to_string(), "Work".to_string()]);
        // The locally-created Work tag was uploaded alongside the seeds.
        assert_eq!(remote.tags().len(), 3);
    }

    #[tokio::test]
    async fn test_corrupted_session_never_uploaded_and_quarantined() {
        let db = Database::open_in_memory().unwrap();
        let remote = MemoryRemoteStore::new();
        let engine = online_engine(&db, Arc::new(remote.clone()));

        db.insert_session(new_session("user-1", 30), false, None)
            .await
            .unwrap();
        // Corrupted record: missing duration.
        db.execute(|conn| {
            conn.execute(
                "INSERT INTO sessions (user_id, start_time, duration, kind, completed, \
                 synced, created_at, updated_at)
                 VALUES ('user-1', ?1, NULL, 'focus', 1, 0, ?1, ?1)",
                params![Utc::now().to_rfc3339()],
            )?;
            Ok(())
        })
        .await
        .unwrap();

        engine.sync_all("user-1").await.unwrap();

        // Only the valid session reached the remote store.
        assert_eq!(remote.sessions().len(), 1);
        // The corrupted record was removed by quarantine.
        let raw = db.raw_session_rows("user-1").await.unwrap();
        assert_eq!(raw.len(), 1);
    }

    #[tokio::test]
    async fn test_individual_upload_failure_does_not_abort_batch() {
        let db = Database::open_in_memory().unwrap();
        let remote = MemoryRemoteStore::new();
        let engine = online_engine(&db, Arc::new(remote.clone()));

        db.insert_session(new_session("user-1", 40), false, None)
            .await
            .unwrap();
        db.insert_session(new_session("user-1", 20), false, None)
            .await
            .unwrap();
        remote.fail_next_session_inserts(1);

        engine.sync_all("user-1").await.unwrap();

        // One made it, the other stayed unsynced for the next pass.
        assert_eq!(remote.sessions().len(), 1);
        assert_eq!(db.unsynced_sessions("user-1").await.unwrap().len(), 1);

        engine.sync_all("user-1").await.unwrap();
        assert_eq!(remote.sessions().len(), 2);
        assert!(db.unsynced_sessions("user-1").await.unwrap().is_empty());
    }

    /// Remote wrapper that parks the first settings fetch until released,
    /// holding a sync pass open so re-entrancy is observable.
    struct GatedRemote {
        inner: MemoryRemoteStore,
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl RemoteStore for GatedRemote {
        async fn insert_session(
            &self,
            row: RemoteSessionRow,
        ) -> RemoteResult<RemoteSessionRow> {
            self.inner.insert_session(row).await
        }
        async fn recent_sessions(
            &self,
            user_id: &str,
            limit: usize,
        ) -> RemoteResult<Vec<RemoteSessionRow>> {
            self.inner.recent_sessions(user_id, limit).await
        }
        async fn insert_tag(&self, row: RemoteTagRow) -> RemoteResult<RemoteTagRow> {
            self.inner.insert_tag(row).await
        }
        async fn tags_for_user(&self, user_id: &str) -> RemoteResult<Vec<RemoteTagRow>> {
            self.inner.tags_for_user(user_id).await
        }
        async fn fetch_settings(
            &self,
            user_id: &str,
        ) -> RemoteResult<Option<RemoteSettingsRow>> {
            self.gate.notified().await;
            self.inner.fetch_settings(user_id).await
        }
        async fn upsert_settings(&self, row: RemoteSettingsRow) -> RemoteResult<()> {
            self.inner.upsert_settings(row).await
        }
        async fn insert_settings(&self, row: RemoteSettingsRow) -> RemoteResult<()> {
            self.inner.insert_settings(row).await
        }
        async fn fetch_timer_state(
            &self,
            user_id: &str,
        ) -> RemoteResult<Option<RemoteTimerStateRow>> {
            self.inner.fetch_timer_state(user_id).await
        }
        async fn upsert_timer_state(&self, row: RemoteTimerStateRow) -> RemoteResult<()> {
            self.inner.upsert_timer_state(row).await
        }
        async fn insert_timer_state(&self, row: RemoteTimerStateRow) -> RemoteResult<()> {
            self.inner.insert_timer_state(row).await
        }
        async fn subscribe_timer_state(&self, user_id: &str) -> RemoteResult<TimerStateFeed> {
            self.inner.subscribe_timer_state(user_id).await
        }
        async fn fetch_stats(&self, user_id: &str) -> RemoteResult<RemoteStatsRow> {
            self.inner.fetch_stats(user_id).await
        }
    }

    #[tokio::test]
    async fn test_reentrancy_guard_skips_overlapping_sync() {
        let db = Database::open_in_memory().unwrap();
        let memory = MemoryRemoteStore::new();
        let gate = Arc::new(Notify::new());
        let remote = Arc::new(GatedRemote {
            inner: memory.clone(),
            gate: gate.clone(),
        });
        let engine = Arc::new(online_engine(&db, remote));

        let first = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.sync_all("user-1").await })
        };
        // Let the first pass reach the gated settings fetch.
        tokio::task::yield_now().await;

        // The overlapping call returns immediately without remote traffic.
        engine.sync_all("user-1").await.unwrap();
        assert_eq!(memory.settings_fetch_calls(), 0);

        gate.notify_one();
        first.await.unwrap().unwrap();
        assert_eq!(memory.settings_fetch_calls(), 1);

        // The guard was released; a later sync runs normally. (Local
        // settings exist now, so this pass is not gated.)
        db.insert_session(new_session("user-1", 10), false, None)
            .await
            .unwrap();
        engine.sync_all("user-1").await.unwrap();
        assert_eq!(memory.sessions().len(), 1);
    }

    struct NeverRemote;

    #[async_trait]
    impl RemoteStore for NeverRemote {
        async fn insert_session(
            &self,
            _row: RemoteSessionRow,
        ) -> RemoteResult<RemoteSessionRow> {
            std::future::pending().await
        }
        async fn recent_sessions(
            &self,
            _user_id: &str,
            _limit: usize,
        ) -> RemoteResult<Vec<RemoteSessionRow>> {
            std::future::pending().await
        }
        async fn insert_tag(&self, _row: RemoteTagRow) -> RemoteResult<RemoteTagRow> {
            std::future::pending().await
        }
        async fn tags_for_user(&self, _user_id: &str) -> RemoteResult<Vec<RemoteTagRow>> {
            std::future::pending().await
        }
        async fn fetch_settings(
            &self,
            _user_id: &str,
        ) -> RemoteResult<Option<RemoteSettingsRow>> {
            std::future::pending().await
        }
        async fn upsert_settings(&self, _row: RemoteSettingsRow) -> RemoteResult<()> {
            std::future::pending().await
        }
        async fn insert_settings(&self, _row: RemoteSettingsRow) -> RemoteResult<()> {
            std::future::pending().await
        }
        async fn fetch_timer_state(
            &self,
            _user_id: &str,
        ) -> RemoteResult<Option<RemoteTimerStateRow>> {
            std::future::pending().await
        }
        async fn upsert_timer_state(&self, _row: RemoteTimerStateRow) -> RemoteResult<()> {
            std::future::pending().await
        }
        async fn insert_timer_state(&self, _row: RemoteTimerStateRow) -> RemoteResult<()> {
            std::future::pending().await
        }
        async fn subscribe_timer_state(&self, _user_id: &str) -> RemoteResult<TimerStateFeed> {
            std::future::pending().await
        }
        async fn fetch_stats(&self, _user_id: &str) -> RemoteResult<RemoteStatsRow> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stats_fetch_resolves_to_none_on_deadline() {
        let db = Database::open_in_memory().unwrap();
        let engine = online_engine(&db, Arc::new(NeverRemote));

        assert!(engine.fetch_stats("user-1").await.is_none());
    }

    #[tokio::test]
    async fn test_status_events_reflect_pass_outcome() {
        let db = Database::open_in_memory().unwrap();
        let remote = MemoryRemoteStore::new();
        let engine = online_engine(&db, Arc::new(remote));

        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let _sub = engine.events().subscribe(move |event: &SyncEvent| {
            seen_clone.lock().unwrap().push(event.clone());
        });

        engine.sync_all("user-1").await.unwrap();

        let events = seen.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                SyncEvent::Status(SyncStatus::Syncing),
                SyncEvent::Status(SyncStatus::Synced),
                SyncEvent::Completed {
                    user_id: "user-1".to_string()
                },
            ]
        );
    }
}
