//! # Token Store
//!
//! Holds the access/refresh pair of the current session and tells readers
//! when it changes.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  login ──► TokenStore::set(pair) ──► watch ──► terminal persists       │
//! │                  │                              refresh token          │
//! │                  ▼                                                      │
//! │  ApiClient reads access token ── 401 ──► refresh ──► set(new pair)     │
//! │                                      └─ refresh fails ──► clear()      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Expiry is read from the access token's `exp` claim. The signature is not
//! checked here; the server checks it on every request.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Refresh this long before the access token expires.
pub const REFRESH_MARGIN_SECS: i64 = 60;

/// Access and refresh tokens as issued by `/users/login/...` and
/// `/users/token/refresh/`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access", &"<redacted>")
            .field("refresh", &"<redacted>")
            .finish()
    }
}

impl TokenPair {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        TokenPair {
            access: access.into(),
            refresh: refresh.into(),
        }
    }

    /// When the access token expires, if it carries an `exp` claim.
    pub fn access_expires_at(&self) -> Option<DateTime<Utc>> {
        jwt_expiry(&self.access)
    }

    /// Whether the access token expires within `margin_secs` of `now`.
    ///
    /// Tokens without a readable `exp` are never refreshed proactively;
    /// the 401 path covers them.
    pub fn expires_within(&self, now: DateTime<Utc>, margin_secs: i64) -> bool {
        self.access_expires_at()
            .map(|exp| now + Duration::seconds(margin_secs) >= exp)
            .unwrap_or(false)
    }
}

#[derive(Deserialize)]
struct ExpClaim {
    exp: i64,
}

/// Reads the `exp` claim of a JWT without verifying its signature.
pub fn jwt_expiry(token: &str) -> Option<DateTime<Utc>> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<ExpClaim>(token, &DecodingKey::from_secret(&[]), &validation).ok()?;
    Utc.timestamp_opt(data.claims.exp, 0).single()
}

// =============================================================================
// Token Store
// =============================================================================

/// Shared, observable holder of the current token pair.
///
/// Cloning shares the same slot.
#[derive(Debug, Clone)]
pub struct TokenStore {
    tx: Arc<watch::Sender<Option<TokenPair>>>,
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        TokenStore { tx: Arc::new(tx) }
    }

    pub fn with_tokens(tokens: TokenPair) -> Self {
        let store = Self::new();
        store.set(tokens);
        store
    }

    pub fn get(&self) -> Option<TokenPair> {
        self.tx.borrow().clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.tx.borrow().as_ref().map(|t| t.access.clone())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.tx.borrow().as_ref().map(|t| t.refresh.clone())
    }

    pub fn is_signed_in(&self) -> bool {
        self.tx.borrow().is_some()
    }

    pub fn set(&self, tokens: TokenPair) {
        self.tx.send_replace(Some(tokens));
    }

    pub fn clear(&self) {
        self.tx.send_replace(None);
    }

    /// Notified on every login, refresh and sign-out.
    pub fn subscribe(&self) -> watch::Receiver<Option<TokenPair>> {
        self.tx.subscribe()
    }

    /// Whether the access token is close enough to expiry to refresh first.
    pub fn needs_refresh(&self) -> bool {
        self.tx
            .borrow()
            .as_ref()
            .map(|t| t.expires_within(Utc::now(), REFRESH_MARGIN_SECS))
            .unwrap_or(false)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    /// Signed access token expiring `secs_from_now` seconds from now.
    pub(crate) fn access_token(secs_from_now: i64) -> String {
        let exp = (Utc::now() + Duration::seconds(secs_from_now)).timestamp();
        encode(
            &Header::default(),
            &serde_json::json!({"exp": exp, "user_id": 7}),
            &EncodingKey::from_secret(b"server-secret"),
        )
        .unwrap()
    }

    #[test]
    fn test_reads_exp_without_key() {
        let token = access_token(3600);
        let exp = jwt_expiry(&token).unwrap();
        let delta = exp - Utc::now();
        assert!(delta > Duration::seconds(3500) && delta <= Duration::seconds(3600));

        assert_eq!(jwt_expiry("not-a-jwt"), None);
    }

    #[test]
    fn test_expires_within_margin() {
        let fresh = TokenPair::new(access_token(3600), "r");
        let stale = TokenPair::new(access_token(30), "r");
        let opaque = TokenPair::new("opaque", "r");

        assert!(!fresh.expires_within(Utc::now(), REFRESH_MARGIN_SECS));
        assert!(stale.expires_within(Utc::now(), REFRESH_MARGIN_SECS));
        assert!(!opaque.expires_within(Utc::now(), REFRESH_MARGIN_SECS));
    }

    #[test]
    fn test_store_notifies_subscribers() {
        let store = TokenStore::new();
        let mut rx = store.subscribe();
        assert!(!store.is_signed_in());

        store.set(TokenPair::new("a", "r"));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().as_ref().map(|t| t.access.as_str()), Some("a"));

        let shared = store.clone();
        shared.clear();
        assert!(store.get().is_none());
        assert!(rx.has_changed().unwrap());
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let pair = TokenPair::new("secret-access", "secret-refresh");
        let dbg = format!("{:?}", pair);
        assert!(!dbg.contains("secret"));
    }
}
