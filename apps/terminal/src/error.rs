//! # Command Error Type
//!
//! Unified error type for terminal commands, plus the errors that can stop
//! the terminal from starting.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Terminal                           │
//! │                                                                         │
//! │  Front end                   Rust Backend                               │
//! │  ─────────                   ────────────                               │
//! │                                                                         │
//! │  complete_sale(payload)                                                 │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │  Result<T, CommandError>                                         │  │
//! │  │         │                                                        │  │
//! │  │  CoreError::TotalsMismatch ──────────────► VALIDATION_ERROR ────►│  │
//! │  │  CoreError::MissingPermission ───────────► FORBIDDEN ───────────►│  │
//! │  │  ApiError::Network / Timeout ────────────► OFFLINE ─────────────►│  │
//! │  │  ApiError::Unauthorized / NoSession ─────► UNAUTHORIZED ────────►│  │
//! │  │  DbError::QueryFailed("...") ────────────► DATABASE_ERROR ──────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  catch (e) {                                                            │
//! │    // e.code    = "OFFLINE"                                             │
//! │    // e.message = "Cannot reach the server: connection refused"         │
//! │  }                                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The message is the toast text: server-side validation messages pass
//! through as the server wrote them, internal failures are logged and
//! replaced by a generic message.

use std::collections::BTreeMap;

use contable_api::ApiError;
use contable_core::CoreError;
use contable_db::DbError;
use contable_sync::SyncError;
use serde::Serialize;
use thiserror::Error;
use ts_rs::TS;

// =============================================================================
// Command Error
// =============================================================================

/// Error returned from commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "VALIDATION_ERROR",
///   "message": "items: Producto sin existencia.",
///   "fields": { "items": ["Producto sin existencia."] }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    /// Per-field messages when the server rejected a form.
    pub fields: BTreeMap<String, Vec<String>>,
}

/// Error codes for command responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed, locally or on the server (400)
    ValidationError,

    /// Nobody is signed in, or the session expired (401)
    Unauthorized,

    /// Signed in without the needed permission (403)
    Forbidden,

    /// The server could not be reached
    Offline,

    /// The server answered with an error (5xx, unexpected body)
    ServerError,

    /// Passkey login is not possible on this device
    AuthenticatorError,

    /// Local storage failed
    DatabaseError,

    /// A downloaded file could not be written
    FileError,

    /// Business rule violated (e.g. invalid state transition)
    BusinessLogic,

    /// Anything else
    Internal,
}

/// Result type alias for commands.
pub type CommandResult<T> = Result<T, CommandError>;

impl CommandError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        CommandError {
            code,
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        CommandError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        CommandError::new(ErrorCode::ValidationError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        CommandError::new(ErrorCode::Unauthorized, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        CommandError::new(ErrorCode::Internal, message)
    }

    pub fn is_offline(&self) -> bool {
        self.code == ErrorCode::Offline
    }
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for CommandError {}

// =============================================================================
// Conversions
// =============================================================================

impl From<ApiError> for CommandError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Network(_) | ApiError::Timeout => {
                CommandError::new(ErrorCode::Offline, err.to_string())
            }
            ApiError::Unauthorized(message) => CommandError::unauthorized(message),
            ApiError::NoSession => CommandError::unauthorized("Sign in first"),
            ApiError::Forbidden(message) => CommandError::new(ErrorCode::Forbidden, message),
            ApiError::NotFound(message) => CommandError::new(ErrorCode::NotFound, message),
            ApiError::Validation { message, fields } => CommandError {
                code: ErrorCode::ValidationError,
                message,
                fields,
            },
            ApiError::InvalidTotpCode => CommandError::validation(err.to_string()),
            ApiError::AuthenticatorUnavailable | ApiError::Authenticator(_) => {
                CommandError::new(ErrorCode::AuthenticatorError, err.to_string())
            }
            ApiError::Http { status, message } => {
                tracing::warn!(status, %message, "Server returned an error");
                CommandError::new(ErrorCode::ServerError, message)
            }
            ApiError::Decode(e) => {
                tracing::error!("Unexpected server response: {}", e);
                CommandError::new(ErrorCode::ServerError, "Unexpected response from server")
            }
            ApiError::InvalidUrl(e) => {
                tracing::error!("Invalid API URL: {}", e);
                CommandError::internal("The server address is misconfigured")
            }
        }
    }
}

impl From<DbError> for CommandError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => CommandError::not_found(&entity, &id),
            DbError::InvalidTransition { .. } => {
                CommandError::new(ErrorCode::BusinessLogic, err.to_string())
            }
            DbError::UniqueViolation { field, value } => {
                CommandError::validation(format!("{} '{}' already exists", field, value))
            }
            DbError::ConnectionFailed(_) => {
                CommandError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                CommandError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::PoolExhausted => {
                CommandError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::QueryFailed(e) | DbError::Serialization(e) | DbError::Internal(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database operation failed: {}", e);
                CommandError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl From<CoreError> for CommandError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::MissingPermission(permission) => CommandError::new(
                ErrorCode::Forbidden,
                format!("You are not allowed to do this ({})", permission),
            ),
            CoreError::TotalsMismatch { .. } | CoreError::InvalidPayload(_) => {
                CommandError::validation(err.to_string())
            }
            CoreError::Validation(e) => CommandError::validation(e.to_string()),
        }
    }
}

impl From<SyncError> for CommandError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Database(e) => e.into(),
            SyncError::Api(e) => e.into(),
            SyncError::InvalidConfig(message) => CommandError::internal(message),
            SyncError::ShuttingDown | SyncError::Channel(_) => {
                CommandError::internal("Sync is not running")
            }
        }
    }
}

impl From<std::io::Error> for CommandError {
    fn from(err: std::io::Error) -> Self {
        tracing::error!("File operation failed: {}", err);
        CommandError::new(ErrorCode::FileError, format!("Could not save the file: {}", err))
    }
}

// =============================================================================
// Startup Errors
// =============================================================================

/// Failures that keep the terminal from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Could not read config file: {0}")]
    ConfigRead(#[from] std::io::Error),

    #[error("Could not parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Could not determine the app data directory")]
    NoDataDir,

    #[error(transparent)]
    Database(#[from] DbError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}

pub type StartupResult<T> = Result<T, StartupError>;
