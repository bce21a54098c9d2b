use chrono::{DateTime, Utc};
use log::warn;
use rusqlite::{params, Row};

use crate::db::{
    connection::Database,
    error::{StoreError, StoreResult},
    helpers::{
        parse_datetime, parse_kind, parse_optional_datetime, parse_tag_list, tag_list_to_json,
        value_as_i64, value_as_string,
    },
    models::{NewSession, Session},
};

const SELECT_COLUMNS: &str = "id, user_id, start_time, end_time, duration, kind, tags, completed, \
     notes, synced, remote_id, created_at, updated_at";

fn row_to_session(row: &Row) -> StoreResult<Session> {
    let start_time: Option<String> = row.get("start_time")?;
    let end_time: Option<String> = row.get("end_time")?;
    let duration: Option<i64> = row.get("duration")?;
    let kind: Option<String> = row.get("kind")?;
    let tags: Option<String> = row.get("tags")?;
    let completed: Option<i64> = row.get("completed")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    let start_time = start_time
        .ok_or_else(|| StoreError::integrity("start_time", "required field is missing"))?;
    let duration =
        duration.ok_or_else(|| StoreError::integrity("duration", "required field is missing"))?;
    let kind = kind.ok_or_else(|| StoreError::integrity("kind", "required field is missing"))?;
    let completed =
        completed.ok_or_else(|| StoreError::integrity("completed", "required field is missing"))?;

    Ok(Session {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        start_time: parse_datetime(&start_time, "start_time")?,
        end_time: parse_optional_datetime(end_time, "end_time")?,
        duration,
        kind: parse_kind(&kind, "kind")?,
        tags: parse_tag_list(tags, "tags")?,
        completed: completed != 0,
        notes: row.get("notes")?,
        synced: row.get::<_, i64>("synced")? != 0,
        remote_id: row.get("remote_id")?,
        created_at: parse_datetime(&created_at, "created_at")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
    })
}

/// Raw row shape used by validation and quarantine, read without parsing so
/// corrupted records are observable instead of erroring mid-query.
#[derive(Debug, Clone)]
pub struct RawSessionRow {
    pub id: i64,
    pub start_time: Option<String>,
    pub duration: Option<i64>,
    pub kind: Option<String>,
    pub completed: Option<i64>,
}

impl Database {
    /// Insert a session. UI-path writes pass `synced = false`; only the sync
    /// engine's download path inserts with `synced = true`.
    pub async fn insert_session(
        &self,
        session: NewSession,
        synced: bool,
        remote_id: Option<String>,
    ) -> StoreResult<i64> {
        self.execute(move |conn| {
            let now = Utc::now();
            conn.execute(
                "INSERT INTO sessions (user_id, start_time, end_time, duration, kind, tags, \
                 completed, notes, synced, remote_id, created_at, updated_at)
                 VALUES (?1, ?2, NULL, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    session.user_id,
                    session.start_time.to_rfc3339(),
                    session.duration,
                    session.kind.as_str(),
                    tag_list_to_json(&session.tags)?,
                    session.completed as i64,
                    session.notes,
                    synced as i64,
                    remote_id,
                    now.to_rfc3339(),
                    now.to_rfc3339(),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    /// Insert a fully-formed session downloaded from the remote store,
    /// preserving its end time and completion flag.
    pub async fn insert_downloaded_session(&self, session: Session) -> StoreResult<i64> {
        self.execute(move |conn| {
            let now = Utc::now();
            conn.execute(
                "INSERT INTO sessions (user_id, start_time, end_time, duration, kind, tags, \
                 completed, notes, synced, remote_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, ?9, ?10, ?11)",
                params![
                    session.user_id,
                    session.start_time.to_rfc3339(),
                    session.end_time.map(|dt| dt.to_rfc3339()),
                    session.duration,
                    session.kind.as_str(),
                    tag_list_to_json(&session.tags)?,
                    session.completed as i64,
                    session.notes,
                    session.remote_id,
                    now.to_rfc3339(),
                    now.to_rfc3339(),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    /// Patch end time, completion flag, and notes when a timer finishes,
    /// is skipped, or is reset before completion.
    pub async fn close_session(
        &self,
        session_id: i64,
        end_time: DateTime<Utc>,
        completed: bool,
        notes: Option<String>,
    ) -> StoreResult<()> {
        self.execute(move |conn| {
            let rows_affected = conn.execute(
                "UPDATE sessions
                 SET end_time = ?1,
                     completed = ?2,
                     notes = ?3,
                     synced = 0,
                     updated_at = ?4
                 WHERE id = ?5",
                params![
                    end_time.to_rfc3339(),
                    completed as i64,
                    notes,
                    Utc::now().to_rfc3339(),
                    session_id,
                ],
            )?;
            if rows_affected == 0 {
                return Err(StoreError::Other(format!("session {session_id} not found")));
            }
            Ok(())
        })
        .await
    }

    /// Flip `synced` false -> true after the remote store confirmed the
    /// record. Only the sync engine calls this.
    pub async fn mark_session_synced(
        &self,
        session_id: i64,
        remote_id: Option<String>,
    ) -> StoreResult<()> {
        self.execute(move |conn| {
            conn.execute(
                "UPDATE sessions
                 SET synced = 1,
                     remote_id = COALESCE(?1, remote_id),
                     updated_at = ?2
                 WHERE id = ?3",
                params![remote_id, Utc::now().to_rfc3339(), session_id],
            )?;
            Ok(())
        })
        .await
    }

    pub async fn get_session(&self, session_id: i64) -> StoreResult<Option<Session>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM sessions WHERE id = ?1"
            ))?;
            let mut rows = stmt.query(params![session_id])?;
            match rows.next()? {
                Some(row) => Ok(Some(row_to_session(row)?)),
                None => Ok(None),
            }
        })
        .await
    }

    /// Unsynced sessions for a user, oldest first so uploads happen in
    /// creation order.
    pub async fn unsynced_sessions(&self, user_id: &str) -> StoreResult<Vec<Session>> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM sessions
                 WHERE user_id = ?1 AND synced = 0
                 ORDER BY created_at ASC"
            ))?;
            let mut rows = stmt.query(params![user_id])?;
            let mut sessions = Vec::new();
            while let Some(row) = rows.next()? {
                sessions.push(row_to_session(row)?);
            }
            Ok(sessions)
        })
        .await
    }

    /// Sessions started at or after `since`, strict parse. An integrity
    /// failure here is the quarantine trigger.
    pub async fn sessions_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<Session>> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM sessions
                 WHERE user_id = ?1 AND start_time >= ?2
                 ORDER BY start_time DESC"
            ))?;
            let mut rows = stmt.query(params![user_id, since.to_rfc3339()])?;
            let mut sessions = Vec::new();
            while let Some(row) = rows.next()? {
                sessions.push(row_to_session(row)?);
            }
            Ok(sessions)
        })
        .await
    }

    /// Fallback for `sessions_since`: re-read without the strict parse and
    /// skip rows that fail, returning the valid subset. Returns an empty
    /// list if even the lenient read fails.
    pub async fn sessions_since_lenient(&self, user_id: &str, since: DateTime<Utc>) -> Vec<Session> {
        let user_id_owned = user_id.to_string();
        let result = self
            .execute(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {SELECT_COLUMNS} FROM sessions
                     WHERE user_id = ?1 AND start_time >= ?2
                     ORDER BY start_time DESC"
                ))?;
                let mut rows = stmt.query(params![user_id_owned, since.to_rfc3339()])?;
                let mut sessions = Vec::new();
                let mut skipped = 0usize;
                while let Some(row) = rows.next()? {
                    match row_to_session(row) {
                        Ok(session) => sessions.push(session),
                        Err(_) => skipped += 1,
                    }
                }
                Ok((sessions, skipped))
            })
            .await;

        match result {
            Ok((sessions, skipped)) => {
                if skipped > 0 {
                    warn!("Lenient session read skipped {skipped} unparseable rows");
                }
                sessions
            }
            Err(err) => {
                warn!("Lenient session read failed, returning empty list: {err}");
                Vec::new()
            }
        }
    }

    /// Sessions with no end time, left behind by a crash mid-interval.
    pub async fn open_sessions(&self, user_id: &str) -> StoreResult<Vec<Session>> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM sessions
                 WHERE user_id = ?1 AND end_time IS NULL
                 ORDER BY start_time DESC"
            ))?;
            let mut rows = stmt.query(params![user_id])?;
            let mut sessions = Vec::new();
            while let Some(row) = rows.next()? {
                sessions.push(row_to_session(row)?);
            }
            Ok(sessions)
        })
        .await
    }

    /// Raw rows for validation; never fails on corrupted field values.
    pub async fn raw_session_rows(&self, user_id: &str) -> StoreResult<Vec<RawSessionRow>> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, start_time, duration, kind, completed FROM sessions
                 WHERE user_id = ?1",
            )?;
            let mut rows = stmt.query(params![user_id])?;
            let mut raw = Vec::new();
            while let Some(row) = rows.next()? {
                raw.push(RawSessionRow {
                    id: row.get(0)?,
                    start_time: value_as_string(row.get(1)?),
                    duration: value_as_i64(row.get(2)?),
                    kind: value_as_string(row.get(3)?),
                    completed: value_as_i64(row.get(4)?),
                });
            }
            Ok(raw)
        })
        .await
    }

    pub async fn delete_sessions(&self, ids: Vec<i64>) -> StoreResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        self.execute(move |conn| {
            let placeholders = vec!["?"; ids.len()].join(", ");
            let query = format!("DELETE FROM sessions WHERE id IN ({placeholders})");
            let params_refs: Vec<&dyn rusqlite::ToSql> =
                ids.iter().map(|id| id as &dyn rusqlite::ToSql).collect();
            let deleted = conn.execute(&query, params_refs.as_slice())?;
            Ok(deleted)
        })
        .await
    }
}
