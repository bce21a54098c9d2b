//! Settings sanitization and the singleton-record reconciler.

use anyhow::{Context, Result};
use chrono::Utc;
use log::{info, warn};

use crate::db::models::UserSettings;
use crate::db::Database;
use crate::remote::{RemoteError, RemoteSettingsRow, RemoteStore};
use crate::validate::{self, RecordKind};

const MIN_LENGTH_MINUTES: i64 = 1;
const MAX_LENGTH_MINUTES: i64 = 120;
const MIN_SESSIONS_UNTIL_LONG_BREAK: i64 = 1;
const MAX_SESSIONS_UNTIL_LONG_BREAK: i64 = 10;

/// Clamp every numeric field into its valid range. Returns the sanitized
/// record and whether anything changed. Sanitizing twice is a fixed point:
/// the second pass never changes a value the first pass produced.
///
/// Boolean coercion and sound-type fallback happen at the wire adapter
/// (`RemoteSettingsRow::into_settings`), so by this point those fields are
/// already concrete and valid.
pub fn sanitize(settings: &UserSettings) -> (UserSettings, bool) {
    let mut sanitized = settings.clone();
    sanitized.pomodoro_length = sanitized
        .pomodoro_length
        .clamp(MIN_LENGTH_MINUTES, MAX_LENGTH_MINUTES);
    sanitized.short_break_length = sanitized
        .short_break_length
        .clamp(MIN_LENGTH_MINUTES, MAX_LENGTH_MINUTES);
    sanitized.long_break_length = sanitized
        .long_break_length
        .clamp(MIN_LENGTH_MINUTES, MAX_LENGTH_MINUTES);
    sanitized.sessions_until_long_break = sanitized
        .sessions_until_long_break
        .clamp(MIN_SESSIONS_UNTIL_LONG_BREAK, MAX_SESSIONS_UNTIL_LONG_BREAK);

    let changed = sanitized.pomodoro_length != settings.pomodoro_length
        || sanitized.short_break_length != settings.short_break_length
        || sanitized.long_break_length != settings.long_break_length
        || sanitized.sessions_until_long_break != settings.sessions_until_long_break;

    (sanitized, changed)
}

/// Upsert keyed by user id; a unique-constraint conflict is retried once as
/// a plain insert.
async fn push_to_remote(remote: &dyn RemoteStore, settings: &UserSettings) -> Result<()> {
    let row = RemoteSettingsRow::from(settings);
    match remote.upsert_settings(row.clone()).await {
        Ok(()) => Ok(()),
        Err(RemoteError::UniqueViolation(message)) => {
            warn!("Settings upsert conflicted ({message}); retrying as plain insert");
            remote
                .insert_settings(row)
                .await
                .context("settings insert fallback failed")
        }
        Err(err) => Err(err).context("settings upload failed"),
    }
}

/// Reconcile the per-user settings singleton between the local and remote
/// stores. Local always wins when both exist: the local record is the
/// user's latest intent and overwrites the remote row (last-writer-wins by
/// omission: no timestamp comparison, deliberately).
pub async fn reconcile(db: &Database, remote: &dyn RemoteStore, user_id: &str) -> Result<()> {
    let local = match db.get_settings(user_id).await {
        Ok(local) => local,
        Err(err) if err.is_integrity() => {
            // A corrupted settings row cannot participate in reconciliation;
            // quarantine it and proceed as if no local record exists.
            warn!("Local settings for {user_id} are corrupted: {err}");
            validate::quarantine(db, RecordKind::Settings, user_id).await?;
            None
        }
        Err(err) => return Err(err).context("failed to read local settings"),
    };

    match local {
        Some(local) => {
            let (sanitized, changed) = sanitize(&local);
            push_to_remote(remote, &sanitized).await?;
            if changed {
                info!("Sanitization adjusted settings for {user_id}; rewriting local record");
                db.upsert_settings(sanitized).await?;
            }
        }
        None => {
            let remote_row = remote
                .fetch_settings(user_id)
                .await
                .context("failed to fetch remote settings")?;
            match remote_row {
                Some(row) => {
                    // Bootstrap: download-wins when only the remote exists.
                    let (sanitized, _) = sanitize(&row.into_settings(Utc::now()));
                    db.upsert_settings(sanitized).await?;
                }
                None => {
                    // First sync for this user anywhere: construct defaults,
                    // store locally, then create the remote row.
                    let defaults = UserSettings::defaults(user_id, Utc::now());
                    db.upsert_settings(defaults.clone()).await?;
                    push_to_remote(remote, &defaults).await?;
                    info!("Created default settings for new user {user_id}");
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::SoundType;
    use crate::remote::MemoryRemoteStore;

    fn settings_with_pomodoro(length: i64) -> UserSettings {
        let mut settings = UserSettings::defaults("user-1", Utc::now());
        settings.pomodoro_length = length;
        settings
    }

    #[test]
    fn test_clamping_boundaries() {
        let (sanitized, changed) = sanitize(&settings_with_pomodoro(0));
        assert_eq!(sanitized.pomodoro_length, 1);
        assert!(changed);

        let (sanitized, changed) = sanitize(&settings_with_pomodoro(121));
        assert_eq!(sanitized.pomodoro_length, 120);
        assert!(changed);

        let (sanitized, changed) = sanitize(&settings_with_pomodoro(25));
        assert_eq!(sanitized.pomodoro_length, 25);
        assert!(!changed);
    }

    #[test]
    fn test_sanitize_is_a_fixed_point() {
        let mut settings = settings_with_pomodoro(500);
        settings.sessions_until_long_break = 0;
        let (once, changed_once) = sanitize(&settings);
        assert!(changed_once);
        let (twice, changed_twice) = sanitize(&once);
        assert!(!changed_twice);
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn test_fresh_user_gets_documented_defaults_everywhere() {
        let db = Database::open_in_memory().unwrap();
        let remote = MemoryRemoteStore::new();

        reconcile(&db, &remote, "user-1").await.unwrap();

        let local = db.get_settings("user-1").await.unwrap().unwrap();
        assert_eq!(local.pomodoro_length, 25);
        assert_eq!(local.short_break_length, 5);
        assert_eq!(local.long_break_length, 15);
        assert_eq!(local.sessions_until_long_break, 4);
        assert_eq!(local.sound_type, SoundType::Beep);
        assert!(local.sound_enabled);
        assert!(local.notifications_enabled);
        assert!(!local.auto_start_breaks);
        assert!(!local.auto_start_pomodoros);

        let stored = remote.stored_settings("user-1").unwrap();
        assert_eq!(stored.pomodoro_length, Some(25));
    }

    #[tokio::test]
    async fn test_remote_only_bootstraps_local() {
        let db = Database::open_in_memory().unwrap();
        let remote = MemoryRemoteStore::new();

        let mut row = RemoteSettingsRow::from(&settings_with_pomodoro(45));
        // Out-of-range value coming from the remote is clamped on the way in.
        row.sessions_until_long_break = Some(99);
        remote.seed_settings(row);

        reconcile(&db, &remote, "user-1").await.unwrap();

        let local = db.get_settings("user-1").await.unwrap().unwrap();
        assert_eq!(local.pomodoro_length, 45);
        assert_eq!(local.sessions_until_long_break, 10);
    }

    #[tokio::test]
    async fn test_local_wins_over_remote_when_both_exist() {
        let db = Database::open_in_memory().unwrap();
        let remote = MemoryRemoteStore::new();

        remote.seed_settings(RemoteSettingsRow::from(&settings_with_pomodoro(45)));
        db.upsert_settings(settings_with_pomodoro(30)).await.unwrap();

        reconcile(&db, &remote, "user-1").await.unwrap();

        let stored = remote.stored_settings("user-1").unwrap();
        assert_eq!(stored.pomodoro_length, Some(30));
        // Nothing was out of range, so the local record is untouched.
        let local = db.get_settings("user-1").await.unwrap().unwrap();
        assert_eq!(local.pomodoro_length, 30);
    }

    #[tokio::test]
    async fn test_local_rewritten_only_when_sanitization_changed_it() {
        let db = Database::open_in_memory().unwrap();
        let remote = MemoryRemoteStore::new();

        db.upsert_settings(settings_with_pomodoro(500)).await.unwrap();
        reconcile(&db, &remote, "user-1").await.unwrap();

        let local = db.get_settings("user-1").await.unwrap().unwrap();
        assert_eq!(local.pomodoro_length, 120);
        let stored = remote.stored_settings("user-1").unwrap();
        assert_eq!(stored.pomodoro_length, Some(120));
    }

    #[tokio::test]
    async fn test_upsert_conflict_falls_back_to_plain_insert() {
        let db = Database::open_in_memory().unwrap();
        let remote = MemoryRemoteStore::new();
        remote.set_settings_upsert_conflict(true);

        db.upsert_settings(settings_with_pomodoro(30)).await.unwrap();
        reconcile(&db, &remote, "user-1").await.unwrap();

        let stored = remote.stored_settings("user-1").unwrap();
        assert_eq!(stored.pomodoro_length, Some(30));
    }
}
