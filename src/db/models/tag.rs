//! User-defined session labels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A label with a display color. Tag names are expected unique per user and
/// double as the de-duplication key during sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub color: String,
    pub synced: bool,
    pub remote_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input data for creating a tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTag {
    pub user_id: String,
    pub name: String,
    pub color: String,
}
