use chrono::Utc;
use rusqlite::{params, Row};

use crate::db::{
    connection::Database,
    error::StoreResult,
    helpers::{parse_datetime, parse_sound_type, value_as_i64},
    models::UserSettings,
};

const SELECT_COLUMNS: &str = "id, user_id, pomodoro_length, short_break_length, long_break_length, \
     sessions_until_long_break, auto_start_breaks, auto_start_pomodoros, sound_enabled, \
     sound_type, notifications_enabled, username, display_name, bio, public_profile, \
     created_at, updated_at";

fn row_to_settings(row: &Row) -> StoreResult<UserSettings> {
    let sound_type: String = row.get("sound_type")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(UserSettings {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        pomodoro_length: row.get("pomodoro_length")?,
        short_break_length: row.get("short_break_length")?,
        long_break_length: row.get("long_break_length")?,
        sessions_until_long_break: row.get("sessions_until_long_break")?,
        auto_start_breaks: row.get::<_, i64>("auto_start_breaks")? != 0,
        auto_start_pomodoros: row.get::<_, i64>("auto_start_pomodoros")? != 0,
        sound_enabled: row.get::<_, i64>("sound_enabled")? != 0,
        sound_type: parse_sound_type(&sound_type, "sound_type")?,
        notifications_enabled: row.get::<_, i64>("notifications_enabled")? != 0,
        username: row.get("username")?,
        display_name: row.get("display_name")?,
        bio: row.get("bio")?,
        public_profile: row.get::<_, i64>("public_profile")? != 0,
        created_at: parse_datetime(&created_at, "created_at")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
    })
}

/// Raw numeric fields used by validation.
#[derive(Debug, Clone)]
pub struct RawSettingsRow {
    pub id: i64,
    pub pomodoro_length: Option<i64>,
    pub short_break_length: Option<i64>,
    pub long_break_length: Option<i64>,
    pub sessions_until_long_break: Option<i64>,
}

impl Database {
    pub async fn get_settings(&self, user_id: &str) -> StoreResult<Option<UserSettings>> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM user_settings WHERE user_id = ?1"
            ))?;
            let mut rows = stmt.query(params![user_id])?;
            match rows.next()? {
                Some(row) => Ok(Some(row_to_settings(row)?)),
                None => Ok(None),
            }
        })
        .await
    }

    /// Insert-or-replace keyed by user id. The settings record is a logical
    /// singleton per user, so writes always go through this upsert.
    pub async fn upsert_settings(&self, settings: UserSettings) -> StoreResult<()> {
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO user_settings (user_id, pomodoro_length, short_break_length, \
                 long_break_length, sessions_until_long_break, auto_start_breaks, \
                 auto_start_pomodoros, sound_enabled, sound_type, notifications_enabled, \
                 username, display_name, bio, public_profile, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
                 ON CONFLICT(user_id) DO UPDATE SET
                     pomodoro_length = excluded.pomodoro_length,
                     short_break_length = excluded.short_break_length,
                     long_break_length = excluded.long_break_length,
                     sessions_until_long_break = excluded.sessions_until_long_break,
                     auto_start_breaks = excluded.auto_start_breaks,
                     auto_start_pomodoros = excluded.auto_start_pomodoros,
                     sound_enabled = excluded.sound_enabled,
                     sound_type = excluded.sound_type,
                     notifications_enabled = excluded.notifications_enabled,
                     username = excluded.username,
                     display_name = excluded.display_name,
                     bio = excluded.bio,
                     public_profile = excluded.public_profile,
                     updated_at = excluded.updated_at",
                params![
                    settings.user_id,
                    settings.pomodoro_length,
                    settings.short_break_length,
                    settings.long_break_length,
                    settings.sessions_until_long_break,
                    settings.auto_start_breaks as i64,
                    settings.auto_start_pomodoros as i64,
                    settings.sound_enabled as i64,
                    settings.sound_type.as_str(),
                    settings.notifications_enabled as i64,
                    settings.username,
                    settings.display_name,
                    settings.bio,
                    settings.public_profile as i64,
                    settings.created_at.to_rfc3339(),
                    Utc::now().to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    pub async fn raw_settings_rows(&self, user_id: &str) -> StoreResult<Vec<RawSettingsRow>> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, pomodoro_length, short_break_length, long_break_length, \
                 sessions_until_long_break
                 FROM user_settings WHERE user_id = ?1",
            )?;
            let mut rows = stmt.query(params![user_id])?;
            let mut raw = Vec::new();
            while let Some(row) = rows.next()? {
                raw.push(RawSettingsRow {
                    id: row.get(0)?,
                    pomodoro_length: value_as_i64(row.get(1)?),
                    short_break_length: value_as_i64(row.get(2)?),
                    long_break_length: value_as_i64(row.get(3)?),
                    sessions_until_long_break: value_as_i64(row.get(4)?),
                });
            }
            Ok(raw)
        })
        .await
    }

    pub async fn delete_settings_rows(&self, ids: Vec<i64>) -> StoreResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        self.execute(move |conn| {
            let placeholders = vec!["?"; ids.len()].join(", ");
            let query = format!("DELETE FROM user_settings WHERE id IN ({placeholders})");
            let params_refs: Vec<&dyn rusqlite::ToSql> =
                ids.iter().map(|id| id as &dyn rusqlite::ToSql).collect();
            let deleted = conn.execute(&query, params_refs.as_slice())?;
            Ok(deleted)
        })
        .await
    }
}
