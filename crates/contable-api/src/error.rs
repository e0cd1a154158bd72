//! # API Error Types
//!
//! What can go wrong talking to the ERP server, and the user-facing message
//! for each case.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Transport (is_offline)   Network, Timeout         → queue / retry later│
//! │  Session                  Unauthorized, NoSession  → back to login      │
//! │  Server said no           Forbidden, NotFound,                          │
//! │                           Validation, Http{status} → show the message   │
//! │  Login                    InvalidTotpCode,                              │
//! │                           AuthenticatorUnavailable → fix input / method │
//! │  Client                   Decode, InvalidUrl       → bug or bad config  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use reqwest::StatusCode;
use thiserror::Error;

/// Errors returned by [`ApiClient`](crate::ApiClient) and the services.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server could not be reached (DNS, refused, TLS, reset).
    #[error("Cannot reach the server: {0}")]
    Network(String),

    /// The request did not finish within the configured timeout.
    #[error("The server took too long to respond")]
    Timeout,

    /// The session is gone: no valid access token and refresh failed.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated, but not allowed to do this.
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// The server rejected the input (400 / 422).
    #[error("{message}")]
    Validation {
        message: String,
        fields: BTreeMap<String, Vec<String>>,
    },

    /// Any other non-2xx response.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// A one-time code that is not exactly six digits.
    #[error("The code must be exactly 6 digits")]
    InvalidTotpCode,

    /// Passkey login was chosen but this device cannot perform it.
    #[error("No passkey authenticator is available on this device")]
    AuthenticatorUnavailable,

    /// The platform authenticator started but did not produce an assertion.
    #[error("Passkey ceremony failed: {0}")]
    Authenticator(String),

    /// An authenticated call was made with nobody signed in.
    #[error("Not signed in")]
    NoSession,

    /// Response body did not match the expected shape.
    #[error("Unexpected response from server: {0}")]
    Decode(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Whether the failure means "no connection" rather than "server said no".
    ///
    /// Offline failures are the ones worth queueing a sale for.
    pub fn is_offline(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::Timeout)
    }

    /// Whether trying again later could succeed without user action.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Network(_) | ApiError::Timeout => true,
            ApiError::Http { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// HTTP status behind the error, when there was a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized(_) => Some(401),
            ApiError::Forbidden(_) => Some(403),
            ApiError::NotFound(_) => Some(404),
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Builds the error for a non-2xx response from its status and body.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let json: Option<serde_json::Value> = serde_json::from_str(body).ok();
        let message = json
            .as_ref()
            .and_then(extract_message)
            .unwrap_or_else(|| status_message(status));

        match status.as_u16() {
            401 => ApiError::Unauthorized(message),
            403 => ApiError::Forbidden(message),
            404 => ApiError::NotFound(message),
            400 | 422 => ApiError::Validation {
                message,
                fields: json.as_ref().map(field_errors).unwrap_or_default(),
            },
            s => ApiError::Http { status: s, message },
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else if err.is_builder() {
            ApiError::InvalidUrl(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl From<url::ParseError> for ApiError {
    fn from(err: url::ParseError) -> Self {
        ApiError::InvalidUrl(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// Error Body Parsing
// =============================================================================

/// Pulls the user-facing message out of an error body.
///
/// Order: `detail`, `message`, `error`, then the first field error of a
/// validation map (`{"email": ["Enter a valid email."]}`). `non_field_errors`
/// is reported without its key.
pub fn extract_message(body: &serde_json::Value) -> Option<String> {
    for key in ["detail", "message", "error"] {
        if let Some(text) = body.get(key).and_then(first_text) {
            return Some(text);
        }
    }

    let fields = body.as_object()?;
    fields.iter().find_map(|(field, value)| {
        let text = first_text(value)?;
        if field == "non_field_errors" || field == "__all__" {
            Some(text)
        } else {
            Some(format!("{}: {}", field, text))
        }
    })
}

fn first_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Array(items) => items.iter().find_map(first_text),
        _ => None,
    }
}

fn field_errors(body: &serde_json::Value) -> BTreeMap<String, Vec<String>> {
    let Some(map) = body.as_object() else {
        return BTreeMap::new();
    };

    map.iter()
        .filter(|(key, _)| !matches!(key.as_str(), "detail" | "message" | "error" | "code"))
        .filter_map(|(key, value)| {
            let messages: Vec<String> = match value {
                serde_json::Value::String(s) => vec![s.clone()],
                serde_json::Value::Array(items) => items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect(),
                _ => return None,
            };
            (!messages.is_empty()).then(|| (key.clone(), messages))
        })
        .collect()
}

/// Fallback message when the body says nothing useful.
fn status_message(status: StatusCode) -> String {
    match status.as_u16() {
        401 => "Your session has expired, sign in again".to_string(),
        403 => "You don't have permission to do this".to_string(),
        404 => "Not found".to_string(),
        s if s >= 500 => format!("Server error (HTTP {s})"),
        s => status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| format!("Unexpected response (HTTP {s})")),
    }
}
