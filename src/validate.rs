//! Structural record validation and quarantine.
//!
//! The predicates here are the single source of truth for "is this record
//! shaped well enough to sync": the engine filters upload batches through
//! them, and quarantine deletes the records that fail them so later queries
//! stop tripping over the same damage.

use chrono::DateTime;
use log::{info, warn};

use crate::db::models::SessionKind;
use crate::db::repositories::{RawSessionRow, RawSettingsRow, RawTagRow};
use crate::db::{Database, StoreResult};

/// Record kinds subject to quarantine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Session,
    Tag,
    Settings,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Session => "session",
            RecordKind::Tag => "tag",
            RecordKind::Settings => "settings",
        }
    }
}

/// A session is valid only when start time, kind, duration, and completion
/// flag are all present, the start time parses, and the kind is one of the
/// three enumerated values.
pub fn session_row_is_valid(row: &RawSessionRow) -> bool {
    let start_ok = row
        .start_time
        .as_deref()
        .map(|raw| DateTime::parse_from_rfc3339(raw).is_ok())
        .unwrap_or(false);
    let kind_ok = row
        .kind
        .as_deref()
        .map(|raw| SessionKind::parse(raw).is_some())
        .unwrap_or(false);

    start_ok && kind_ok && row.duration.is_some() && row.completed.is_some()
}

pub fn tag_row_is_valid(row: &RawTagRow) -> bool {
    let non_empty = |value: &Option<String>| value.as_deref().map(|s| !s.is_empty()).unwrap_or(false);
    non_empty(&row.name) && non_empty(&row.color)
}

pub fn settings_row_is_valid(row: &RawSettingsRow) -> bool {
    row.pomodoro_length.is_some()
        && row.short_break_length.is_some()
        && row.long_break_length.is_some()
        && row.sessions_until_long_break.is_some()
}

/// Scan all records of a kind for a user, delete the structurally invalid
/// ones in a single batch, and return how many were removed.
pub async fn quarantine(db: &Database, kind: RecordKind, user_id: &str) -> StoreResult<usize> {
    let invalid_ids: Vec<i64> = match kind {
        RecordKind::Session => db
            .raw_session_rows(user_id)
            .await?
            .iter()
            .filter(|row| !session_row_is_valid(row))
            .map(|row| row.id)
            .collect(),
        RecordKind::Tag => db
            .raw_tag_rows(user_id)
            .await?
            .iter()
            .filter(|row| !tag_row_is_valid(row))
            .map(|row| row.id)
            .collect(),
        RecordKind::Settings => db
            .raw_settings_rows(user_id)
            .await?
            .iter()
            .filter(|row| !settings_row_is_valid(row))
            .map(|row| row.id)
            .collect(),
    };

    if invalid_ids.is_empty() {
        return Ok(0);
    }

    let count = invalid_ids.len();
    warn!(
        "Quarantining {count} corrupted {} record(s) for user {user_id}",
        kind.as_str()
    );

    let deleted = match kind {
        RecordKind::Session => db.delete_sessions(invalid_ids).await?,
        RecordKind::Tag => db.delete_tags(invalid_ids).await?,
        RecordKind::Settings => db.delete_settings_rows(invalid_ids).await?,
    };

    info!("Quarantine removed {deleted} {} record(s)", kind.as_str());
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rusqlite::params;

    use super::*;
    use crate::db::models::{NewSession, NewTag, SessionKind};

    async fn insert_valid_session(db: &Database, user_id: &str) -> i64 {
        db.insert_session(
            NewSession {
                user_id: user_id.to_string(),
                start_time: Utc::now(),
                duration: 1500,
                kind: SessionKind::Focus,
                tags: Vec::new(),
                completed: true,
                notes: None,
            },
            false,
            None,
        )
        .await
        .unwrap()
    }

    async fn insert_session_missing_duration(db: &Database, user_id: &str) {
        let user_id = user_id.to_string();
        db.execute(move |conn| {
            conn.execute(
                "INSERT INTO sessions (user_id, start_time, duration, kind, completed, \
                 synced, created_at, updated_at)
                 VALUES (?1, ?2, NULL, 'focus', 1, 0, ?3, ?3)",
                params![user_id, Utc::now().to_rfc3339(), Utc::now().to_rfc3339()],
            )?;
            Ok(())
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_quarantine_removes_exactly_the_invalid_sessions() {
        let db = Database::open_in_memory().unwrap();

        for _ in 0..3 {
            insert_valid_session(&db, "user-1").await;
        }
        for _ in 0..2 {
            insert_session_missing_duration(&db, "user-1").await;
        }

        let removed = quarantine(&db, RecordKind::Session, "user-1")
            .await
            .unwrap();
        assert_eq!(removed, 2);

        let remaining = db.raw_session_rows("user-1").await.unwrap();
        assert_eq!(remaining.len(), 3);
        assert!(remaining.iter().all(session_row_is_valid));
    }

    #[tokio::test]
    async fn test_quarantine_ignores_other_users_records() {
        let db = Database::open_in_memory().unwrap();

        insert_session_missing_duration(&db, "user-1").await;
        insert_session_missing_duration(&db, "user-2").await;

        let removed = quarantine(&db, RecordKind::Session, "user-1")
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(db.raw_session_rows("user-2").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_tag_missing_color_is_invalid() {
        let db = Database::open_in_memory().unwrap();

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
        db.execute(|conn| {
            conn.execute(
                "INSERT INTO tags (user_id, name, color, synced, created_at)
                 VALUES ('user-1', 'Broken', NULL, 0, ?1)",
                params![Utc::now().to_rfc3339()],
            )?;
            Ok(())
        })
        .await
        .unwrap();

        let removed = quarantine(&db, RecordKind::Tag, "user-1").await.unwrap();
        assert_eq!(removed, 1);
        let tags = db.tags_for_user("user-1").await.unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].name, "Work");
    }

    #[tokio::test]
    async fn test_quarantine_noop_when_everything_is_valid() {
        let db = Database::open_in_memory().unwrap();
        insert_valid_session(&db, "user-1").await;
        let removed = quarantine(&db, RecordKind::Session, "user-1")
            .await
            .unwrap();
        assert_eq!(removed, 0);
    }
}
