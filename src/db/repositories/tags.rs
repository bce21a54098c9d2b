use chrono::Utc;
use log::warn;
use rusqlite::{params, Row};

use crate::db::{
    connection::Database,
    error::{StoreError, StoreResult},
    helpers::{parse_datetime, value_as_string},
    models::{NewTag, Tag},
};

fn row_to_tag(row: &Row) -> StoreResult<Tag> {
    let name: Option<String> = row.get("name")?;
    let color: Option<String> = row.get("color")?;
    let created_at: String = row.get("created_at")?;

    let name = name
        .filter(|value| !value.is_empty())
        .ok_or_else(|| StoreError::integrity("name", "required field is missing or empty"))?;
    let color = color
        .filter(|value| !value.is_empty())
        .ok_or_else(|| StoreError::integrity("color", "required field is missing or empty"))?;

    Ok(Tag {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        name,
        color,
        synced: row.get::<_, i64>("synced")? != 0,
        remote_id: row.get("remote_id")?,
        created_at: parse_datetime(&created_at, "created_at")?,
    })
}

/// Raw row shape used by validation and quarantine.
#[derive(Debug, Clone)]
pub struct RawTagRow {
    pub id: i64,
    pub name: Option<String>,
    pub color: Option<String>,
}

impl Database {
    pub async fn insert_tag(
        &self,
        tag: NewTag,
        synced: bool,
        remote_id: Option<String>,
    ) -> StoreResult<i64> {
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO tags (user_id, name, color, synced, remote_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    tag.user_id,
                    tag.name,
                    tag.color,
                    synced as i64,
                    remote_id,
                    Utc::now().to_rfc3339(),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    pub async fn tags_for_user(&self, user_id: &str) -> StoreResult<Vec<Tag>> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, name, color, synced, remote_id, created_at FROM tags
                 WHERE user_id = ?1
                 ORDER BY name ASC",
            )?;
            let mut rows = stmt.query(params![user_id])?;
            let mut tags = Vec::new();
            while let Some(row) = rows.next()? {
                tags.push(row_to_tag(row)?);
            }
            Ok(tags)
        })
        .await
    }

    /// Fallback read that skips unparseable rows instead of failing.
    pub async fn tags_for_user_lenient(&self, user_id: &str) -> Vec<Tag> {
        let user_id_owned = user_id.to_string();
        let result = self
            .execute(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, user_id, name, color, synced, remote_id, created_at FROM tags
                     WHERE user_id = ?1
                     ORDER BY name ASC",
                )?;
                let mut rows = stmt.query(params![user_id_owned])?;
                let mut tags = Vec::new();
                let mut skipped = 0usize;
                while let Some(row) = rows.next()? {
                    match row_to_tag(row) {
                        Ok(tag) => tags.push(tag),
                        Err(_) => skipped += 1,
                    }
                }
                Ok((tags, skipped))
            })
            .await;

        match result {
            Ok((tags, skipped)) => {
                if skipped > 0 {
                    warn!("Lenient tag read skipped {skipped} unparseable rows");
                }
                tags
            }
            Err(err) => {
                warn!("Lenient tag read failed, returning empty list: {err}");
                Vec::new()
            }
        }
    }

    pub async fn unsynced_tags(&self, user_id: &str) -> StoreResult<Vec<Tag>> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, name, color, synced, remote_id, created_at FROM tags
                 WHERE user_id = ?1 AND synced = 0
                 ORDER BY created_at ASC",
            )?;
            let mut rows = stmt.query(params![user_id])?;
            let mut tags = Vec::new();
            while let Some(row) = rows.next()? {
                tags.push(row_to_tag(row)?);
            }
            Ok(tags)
        })
        .await
    }

    pub async fn mark_tag_synced(&self, tag_id: i64, remote_id: Option<String>) -> StoreResult<()> {
        self.execute(move |conn| {
            conn.execute(
                "UPDATE tags
                 SET synced = 1,
                     remote_id = COALESCE(?1, remote_id)
                 WHERE id = ?2",
                params![remote_id, tag_id],
            )?;
            Ok(())
        })
        .await
    }

    /// Explicit user deletion of a single tag.
    pub async fn delete_tag(&self, tag_id: i64) -> StoreResult<()> {
        self.execute(move |conn| {
            let rows_affected = conn.execute("DELETE FROM tags WHERE id = ?1", params![tag_id])?;
            if rows_affected == 0 {
                return Err(StoreError::Other(format!("tag {tag_id} not found")));
            }
            Ok(())
        })
        .await
    }

    pub async fn raw_tag_rows(&self, user_id: &str) -> StoreResult<Vec<RawTagRow>> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare("SELECT id, name, color FROM tags WHERE user_id = ?1")?;
            let mut rows = stmt.query(params![user_id])?;
            let mut raw = Vec::new();
            while let Some(row) = rows.next()? {
                raw.push(RawTagRow {
                    id: row.get(0)?,
                    name: value_as_string(row.get(1)?),
                    color: value_as_string(row.get(2)?),
                });
            }
            Ok(raw)
        })
        .await
    }

    pub async fn delete_tags(&self, ids: Vec<i64>) -> StoreResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        self.execute(move |conn| {
            let placeholders = vec!["?"; ids.len()].join(", ");
            let query = format!("DELETE FROM tags WHERE id IN ({placeholders})");
            let params_refs: Vec<&dyn rusqlite::ToSql> =
                ids.iter().map(|id| id as &dyn rusqlite::ToSql).collect();
            let deleted = conn.execute(&query, params_refs.as_slice())?;
            Ok(deleted)
        })
        .await
    }
}
