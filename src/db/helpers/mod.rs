use chrono::{DateTime, Utc};

use crate::db::error::{StoreError, StoreResult};
use crate::db::models::{SessionKind, SoundType};

pub fn parse_datetime(value: &str, field: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| StoreError::integrity(field, format!("invalid datetime '{value}': {err}")))
}

pub fn parse_optional_datetime(
    value: Option<String>,
    field: &str,
) -> StoreResult<Option<DateTime<Utc>>> {
    match value {
        Some(raw) => parse_datetime(&raw, field).map(Some),
        None => Ok(None),
    }
}

pub fn parse_kind(value: &str, field: &str) -> StoreResult<SessionKind> {
    SessionKind::parse(value)
        .ok_or_else(|| StoreError::integrity(field, format!("unknown session kind '{value}'")))
}

pub fn parse_sound_type(value: &str, field: &str) -> StoreResult<SoundType> {
    SoundType::parse(value)
        .ok_or_else(|| StoreError::integrity(field, format!("unknown sound type '{value}'")))
}

/// Tag labels are stored as a JSON array in a TEXT column.
pub fn parse_tag_list(value: Option<String>, field: &str) -> StoreResult<Vec<String>> {
    match value {
        Some(raw) => serde_json::from_str(&raw)
            .map_err(|err| StoreError::integrity(field, format!("invalid tag list: {err}"))),
        None => Ok(Vec::new()),
    }
}

pub fn tag_list_to_json(tags: &[String]) -> StoreResult<String> {
    Ok(serde_json::to_string(tags)?)
}

/// Lenient accessors for raw-row reads: a corrupted column (wrong storage
/// class, NULL) becomes `None` instead of a query failure, so validation can
/// observe the damage.
pub fn value_as_i64(value: rusqlite::types::Value) -> Option<i64> {
    match value {
        rusqlite::types::Value::Integer(i) => Some(i),
        _ => None,
    }
}

pub fn value_as_string(value: rusqlite::types::Value) -> Option<String> {
    match value {
        rusqlite::types::Value::Text(s) => Some(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_datetime_classifies_garbage_as_integrity() {
        let err = parse_datetime("not-a-date", "start_time").unwrap_err();
        assert!(err.is_integrity());
    }

    #[test]
    fn test_parse_kind_rejects_unknown_value() {
        assert!(parse_kind("focus", "kind").is_ok());
        let err = parse_kind("nap", "kind").unwrap_err();
        assert!(err.is_integrity());
    }

    #[test]
    fn test_tag_list_round_trips_through_json() {
        let tags = vec!["deep work".to_string(), "writing".to_string()];
        let json = tag_list_to_json(&tags).unwrap();
        assert_eq!(parse_tag_list(Some(json), "tags").unwrap(), tags);
        assert!(parse_tag_list(None, "tags").unwrap().is_empty());
    }
}
