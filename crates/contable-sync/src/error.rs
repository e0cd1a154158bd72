//! # Sync Error Types
//!
//! Failures of the sync layer itself. A single sale that the server rejects
//! is not one of them: it is recorded on the row and reported in the
//! [`SyncReport`](crate::SyncReport).
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Configuration   InvalidConfig           → fix config, restart          │
//! │  Storage         Database(DbError)       → pass aborted, retried later  │
//! │  Session         Api(Unauthorized|       → pass aborted until sign-in   │
//! │                      NoSession)                                         │
//! │  Lifecycle       ShuttingDown, Channel   → agent gone                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use contable_api::ApiError;
use contable_db::DbError;
use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Invalid sync configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Database(#[from] DbError),

    /// Errors that stop a whole pass (no session). Per-sale API failures
    /// never surface here.
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Sync agent is shutting down")]
    ShuttingDown,

    #[error("Channel error: {0}")]
    Channel(String),
}

impl SyncError {
    /// Whether the next scheduled pass may succeed without user action.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Database(_) => true,
            SyncError::Api(err) => err.is_retryable(),
            _ => false,
        }
    }

    /// Whether the user has to sign in again before sync can continue.
    pub fn needs_sign_in(&self) -> bool {
        matches!(
            self,
            SyncError::Api(ApiError::Unauthorized(_)) | SyncError::Api(ApiError::NoSession)
        )
    }
}
