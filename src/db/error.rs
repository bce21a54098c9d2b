use thiserror::Error;

/// Errors surfaced by the local store.
///
/// The `Integrity` variant marks failures caused by stored data that no
/// longer matches the expected shape (unparseable timestamp, unknown enum
/// value, wrong column type). The sync path inspects this classification to
/// decide whether to quarantine.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(rusqlite::Error),

    #[error("data integrity error in {field}: {message}")]
    Integrity { field: String, message: String },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database worker unavailable: {0}")]
    Worker(String),

    #[error("{0}")]
    Other(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn integrity(field: &str, message: impl Into<String>) -> Self {
        StoreError::Integrity {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// True when this error means stored data violates the expected shape,
    /// as opposed to an I/O or usage failure.
    pub fn is_integrity(&self) -> bool {
        match self {
            StoreError::Integrity { .. } => true,
            StoreError::Sqlite(err) => matches!(
                err,
                rusqlite::Error::FromSqlConversionFailure(..)
                    | rusqlite::Error::InvalidColumnType(..)
                    | rusqlite::Error::IntegralValueOutOfRange(..)
            ),
            _ => false,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Sqlite(err)
    }
}
