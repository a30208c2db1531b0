//! Storage-specific error type wrapping sqlx errors.

use scoreboard_domain::error::ScoreboardError;
use sqlx::error::ErrorKind;

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query, transaction, or connection failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// A migration step failed and was rolled back.
    #[error("migration {id} failed")]
    Migration {
        id: String,
        #[source]
        source: sqlx::Error,
    },

    /// A recorded migration step no longer matches its definition.
    #[error("migration {id} was modified after being applied")]
    ChecksumMismatch { id: String },
}

impl StorageError {
    /// The constraint the engine reported as violated, if any.
    #[must_use]
    pub fn constraint_violation(&self) -> Option<ErrorKind> {
        match self {
            Self::Database(sqlx::Error::Database(err)) => match err.kind() {
                ErrorKind::Other => None,
                kind => Some(kind),
            },
            _ => None,
        }
    }
}

impl From<StorageError> for ScoreboardError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}

/// Find the violated constraint behind a storage failure returned by a port.
#[must_use]
pub fn constraint_violation(err: &ScoreboardError) -> Option<ErrorKind> {
    match err {
        ScoreboardError::Storage(source) => source
            .downcast_ref::<StorageError>()
            .and_then(StorageError::constraint_violation),
        _ => None,
    }
}
