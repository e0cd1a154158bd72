//! # Domain Errors
//!
//! Raised before anything touches the network or the disk.
//!
//! ## Per-Crate Errors
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  contable-core (this file)                                             │
//! │  ├── CoreError        - Domain rule violations                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  contable-db   → DbError     (storage)                                 │
//! │  contable-api  → ApiError    (HTTP / auth)                             │
//! │  contable-sync → SyncError   (flush / config)                          │
//! │  terminal      → CommandError (what the screen shows)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::permissions::Permission;

// =============================================================================
// Core Error
// =============================================================================

/// A sale or an action the domain rules refuse.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The session lacks the capability needed for an action.
    #[error("Missing permission: {0}")]
    MissingPermission(Permission),

    /// Declared totals do not match the lines on the ticket.
    #[error("Sale {field} mismatch: expected {expected} cents, got {actual} cents")]
    TotalsMismatch {
        field: &'static str,
        expected: i64,
        actual: i64,
    },

    /// A sale payload could not be (de)serialized.
    #[error("Invalid sale payload: {0}")]
    InvalidPayload(String),

    /// A single field failed its check.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Field-level input checks. `field` names the offending input so the
/// terminal can highlight it.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Malformed email or one-time code.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::TotalsMismatch {
            field: "total",
            expected: 580,
            actual: 500,
        };
        assert_eq!(
            err.to_string(),
            "Sale total mismatch: expected 580 cents, got 500 cents"
        );

        let err = CoreError::MissingPermission(Permission::PosSell);
        assert_eq!(err.to_string(), "Missing permission: pos.sell");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("email").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.to_string(), "Validation error: email is required");
    }
}
