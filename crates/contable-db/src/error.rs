//! # Local Storage Errors
//!
//! Everything the queue and settings tables can fail with.
//!
//! ## Where They Go
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError ← classified: missing row, trigger, pool, query               │
//! │       │                                                                 │
//! │       ├──► SyncError::Db (contable-sync)                               │
//! │       ▼                                                                 │
//! │  CommandError (terminal) ← What the register shows                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Message raised by the forward-only trigger on `pending_sales`.
pub(crate) const FORWARD_ONLY_MARKER: &str = "synced sale cannot return to pending";

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - `mark_synced` / `record_failure` on an id that was never enqueued
    /// - `fetch_one` returns no rows
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A status change the record's lifecycle does not allow.
    ///
    /// ## When This Occurs
    /// - Recording a failed upload against an already synced sale
    /// - Any update that would move a synced sale back to pending
    #[error("Invalid transition for {entity} {id}: {reason}")]
    InvalidTransition {
        entity: String,
        id: String,
        reason: String,
    },

    /// A `UNIQUE` column already holds the value.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// The pool could not open, or has been closed.
    ///
    /// ## When This Occurs
    /// - `contable.db` can't be created (permissions, missing directory)
    /// - A query runs after `Database::close`
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// An embedded migration did not apply.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// SQLite rejected the statement.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A stored JSON value could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Every pooled connection stayed busy past `acquire_timeout`.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Driver failures with no better category.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// `DbError::not_found("PendingSale", 42)`
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn invalid_transition(
        entity: impl Into<String>,
        id: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        DbError::InvalidTransition {
            entity: entity.into(),
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}

/// ## Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message (unique / trigger / other)
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                if msg.contains(FORWARD_ONLY_MARKER) {
                    DbError::invalid_transition("PendingSale", "unknown", msg)
                } else if let Some(field) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    DbError::UniqueViolation {
                        field: field.to_string(),
                        value: "unknown".to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Serialization(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;
