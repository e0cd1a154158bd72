//! # Authentication
//!
//! Passwordless login with a per-user second factor.
//!
//! ## Login Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  begin_login(email) ── POST /users/login/ ──► LoginChallenge           │
//! │                                               { login_token, methods } │
//! │       │                                                                 │
//! │       ├── Totp                                                         │
//! │       │     code is 6 digits? ──no──► InvalidTotpCode (no request)     │
//! │       │     POST /users/login/totp/ { login_token, code }              │
//! │       │                                                                 │
//! │       └── Passkey                                                      │
//! │             authenticator present? ──no──► AuthenticatorUnavailable    │
//! │             POST /users/login/passkey/options/ ──► challenge           │
//! │             PlatformAuthenticator::get_assertion(challenge)            │
//! │             POST /users/login/passkey/verify/ { login_token, assertion}│
//! │                                                                         │
//! │  ──► LoginSuccess { tokens, user }   (tokens go into the TokenStore)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The ceremony itself, token issuance and code checking are the server's
//! job; this module only moves the pieces.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};
use ts_rs::TS;

use contable_core::validation::{validate_email, validate_totp_code};
use contable_core::CapabilitySet;

use crate::client::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::token::TokenPair;

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecondFactor {
    Totp,
    Passkey,
    /// A method this client does not implement.
    #[serde(other)]
    Unsupported,
}

/// First step of a login: which second factors the user may complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginChallenge {
    pub login_token: String,
    pub methods: Vec<SecondFactor>,
}

impl LoginChallenge {
    pub fn supports(&self, method: SecondFactor) -> bool {
        self.methods.contains(&method)
    }
}

/// The signed-in user as the server describes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub is_superuser: bool,
    /// `"module.action"` permission strings.
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl UserProfile {
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.email.clone()
        } else {
            full.to_string()
        }
    }

    pub fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::resolve(&self.permissions, self.is_superuser)
    }
}

/// Outcome of a completed second factor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginSuccess {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub user: UserProfile,
}

// =============================================================================
// Platform Authenticator
// =============================================================================

/// Performs the passkey ceremony on this device (OS prompt, security key).
///
/// `options` is the server's challenge, passed through untouched; the
/// returned assertion is sent back untouched.
#[async_trait]
pub trait PlatformAuthenticator: Send + Sync {
    /// Whether a passkey can be used on this device right now.
    fn is_available(&self) -> bool {
        true
    }

    async fn get_assertion(&self, options: &serde_json::Value) -> Result<serde_json::Value, String>;
}

// =============================================================================
// Auth Service
// =============================================================================

/// Login, refresh and logout against `/users/...`.
#[derive(Debug, Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        AuthService { client }
    }

    /// Starts a login for `email`.
    pub async fn begin_login(&self, email: &str) -> ApiResult<LoginChallenge> {
        validate_email(email).map_err(|e| ApiError::Validation {
            message: e.to_string(),
            fields: [("email".to_string(), vec![e.to_string()])].into(),
        })?;

        let challenge: LoginChallenge = self
            .client
            .post_public("users/login/", &json!({ "email": email.trim() }))
            .await?;

        debug!(methods = ?challenge.methods, "Login challenge received");
        Ok(challenge)
    }

    /// Completes a login with a time-based one-time code.
    pub async fn verify_totp(&self, login_token: &str, code: &str) -> ApiResult<LoginSuccess> {
        validate_totp_code(code).map_err(|_| ApiError::InvalidTotpCode)?;

        let success: LoginSuccess = self
            .client
            .post_public(
                "users/login/totp/",
                &json!({ "login_token": login_token, "code": code.trim() }),
            )
            .await?;

        Ok(self.signed_in(success))
    }

    /// Fetches the passkey challenge for this login.
    pub async fn passkey_options(&self, login_token: &str) -> ApiResult<serde_json::Value> {
        self.client
            .post_public(
                "users/login/passkey/options/",
                &json!({ "login_token": login_token }),
            )
            .await
    }

    /// Completes a login with a passkey assertion.
    pub async fn verify_passkey(
        &self,
        login_token: &str,
        assertion: &serde_json::Value,
    ) -> ApiResult<LoginSuccess> {
        let success: LoginSuccess = self
            .client
            .post_public(
                "users/login/passkey/verify/",
                &json!({ "login_token": login_token, "assertion": assertion }),
            )
            .await?;

        Ok(self.signed_in(success))
    }

    /// Runs the whole passkey step: options, ceremony, verify.
    pub async fn login_with_passkey(
        &self,
        login_token: &str,
        authenticator: Option<&dyn PlatformAuthenticator>,
    ) -> ApiResult<LoginSuccess> {
        let authenticator = match authenticator {
            Some(a) if a.is_available() => a,
            _ => return Err(ApiError::AuthenticatorUnavailable),
        };

        let options = self.passkey_options(login_token).await?;
        let assertion = authenticator
            .get_assertion(&options)
            .await
            .map_err(ApiError::Authenticator)?;

        self.verify_passkey(login_token, &assertion).await
    }

    /// Current user's profile.
    pub async fn me(&self) -> ApiResult<UserProfile> {
        self.client.get("users/me/").await
    }

    /// Resumes a session from a stored refresh token.
    pub async fn resume(&self, refresh_token: &str) -> ApiResult<LoginSuccess> {
        self.client
            .tokens()
            .set(TokenPair::new(String::new(), refresh_token));

        let tokens = self.client.refresh().await?;
        let user = self.me().await?;

        info!(user_id = user.id, "Session resumed");
        Ok(LoginSuccess { tokens, user })
    }

    pub async fn refresh(&self) -> ApiResult<TokenPair> {
        self.client.refresh().await
    }

    /// Ends the session. The server call is best effort; local tokens are
    /// always cleared.
    pub async fn logout(&self) {
        if let Some(tokens) = self.client.tokens().get() {
            if let Err(e) = self
                .client
                .post_unit("users/logout/", &json!({ "refresh": tokens.refresh }))
                .await
            {
                warn!(error = %e, "Server logout failed, clearing local session anyway");
            }
        }

        self.client.tokens().clear();
        info!("Signed out");
    }

    fn signed_in(&self, success: LoginSuccess) -> LoginSuccess {
        self.client.tokens().set(success.tokens.clone());
        info!(user_id = success.user.id, "Signed in");
        success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ApiClientConfig;
    use crate::token::TokenStore;
    use contable_core::Permission;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn auth(server: &MockServer) -> (AuthService, TokenStore) {
        let tokens = TokenStore::new();
        let client =
            ApiClient::new(ApiClientConfig::new(server.uri()), tokens.clone()).unwrap();
        (AuthService::new(client), tokens)
    }

    fn success_body() -> serde_json::Value {
        json!({
            "access": "acc",
            "refresh": "ref",
            "user": {
                "id": 3,
                "email": "caja@empresa.mx",
                "first_name": "Ana",
                "last_name": "Ruiz",
                "permissions": ["pos.add_venta", "pos.view_venta", "old.removed"]
            }
        })
    }

    struct FakeAuthenticator {
        available: bool,
    }

    #[async_trait]
    impl PlatformAuthenticator for FakeAuthenticator {
        fn is_available(&self) -> bool {
            self.available
        }

        async fn get_assertion(
            &self,
            options: &serde_json::Value,
        ) -> Result<serde_json::Value, String> {
            Ok(json!({ "signed": options["challenge"] }))
        }
    }

    #[tokio::test]
    async fn test_begin_login() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users/login/"))
            .and(body_json(json!({"email": "caja@empresa.mx"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"login_token": "lt", "methods": ["totp", "passkey", "sms"]}),
            ))
            .mount(&server)
            .await;

        let (auth, _) = auth(&server);
        let challenge = auth.begin_login(" caja@empresa.mx ").await.unwrap();

        assert_eq!(challenge.login_token, "lt");
        assert!(challenge.supports(SecondFactor::Totp));
        assert!(challenge.supports(SecondFactor::Passkey));
        assert_eq!(challenge.methods[2], SecondFactor::Unsupported);
    }

    #[tokio::test]
    async fn test_bad_email_rejected_locally() {
        let server = MockServer::start().await;
        let (auth, _) = auth(&server);

        let err = auth.begin_login("not-an-email").await.unwrap_err();
        assert!(matches!(err, ApiError::Validation { .. }));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_totp_login_stores_tokens() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users/login/totp/"))
            .and(body_json(json!({"login_token": "lt", "code": "123456"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
            .mount(&server)
            .await;

        let (auth, tokens) = auth(&server);
        let success = auth.verify_totp("lt", "123456").await.unwrap();

        assert_eq!(success.user.display_name(), "Ana Ruiz");
        assert_eq!(tokens.get(), Some(TokenPair::new("acc", "ref")));

        let caps = success.user.capabilities();
        assert!(caps.has(Permission::PosSell));
        assert!(!caps.has(Permission::PayrollView));
        assert_eq!(caps.len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_totp_never_sent() {
        let server = MockServer::start().await;
        let (auth, _) = auth(&server);

        for code in ["12345", "1234567", "12a456", ""] {
            let err = auth.verify_totp("lt", code).await.unwrap_err();
            assert!(matches!(err, ApiError::InvalidTotpCode), "code {code:?}");
        }
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_wrong_totp_reports_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users/login/totp/"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"detail": "Código incorrecto."})),
            )
            .mount(&server)
            .await;

        let (auth, tokens) = auth(&server);
        let err = auth.verify_totp("lt", "000000").await.unwrap_err();
        assert_eq!(err.to_string(), "Código incorrecto.");
        assert!(!tokens.is_signed_in());
    }

    #[tokio::test]
    async fn test_passkey_login() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users/login/passkey/options/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"challenge": "c-123"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/users/login/passkey/verify/"))
            .and(body_json(json!({"login_token": "lt", "assertion": {"signed": "c-123"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
            .mount(&server)
            .await;

        let (auth, tokens) = auth(&server);
        let device = FakeAuthenticator { available: true };
        let success = auth.login_with_passkey("lt", Some(&device)).await.unwrap();

        assert_eq!(success.user.id, 3);
        assert!(tokens.is_signed_in());
    }

    #[tokio::test]
    async fn test_passkey_without_authenticator() {
        let server = MockServer::start().await;
        let (auth, _) = auth(&server);

        let err = auth.login_with_passkey("lt", None).await.unwrap_err();
        assert!(matches!(err, ApiError::AuthenticatorUnavailable));

        let device = FakeAuthenticator { available: false };
        let err = auth.login_with_passkey("lt", Some(&device)).await.unwrap_err();
        assert!(matches!(err, ApiError::AuthenticatorUnavailable));

        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_logout_clears_even_when_server_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users/logout/"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let (auth, tokens) = auth(&server);
        tokens.set(TokenPair::new("acc", "ref"));

        auth.logout().await;
        assert!(!tokens.is_signed_in());
    }

    #[tokio::test]
    async fn test_resume_from_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users/token/refresh/"))
            .and(body_json(json!({"refresh": "stored"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "acc2"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/me/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body()["user"].clone()))
            .mount(&server)
            .await;

        let (auth, tokens) = auth(&server);
        let resumed = auth.resume("stored").await.unwrap();

        assert_eq!(resumed.tokens, TokenPair::new("acc2", "stored"));
        assert_eq!(resumed.user.email, "caja@empresa.mx");
        assert_eq!(tokens.access_token().as_deref(), Some("acc2"));
    }
}
