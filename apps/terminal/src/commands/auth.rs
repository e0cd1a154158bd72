//! # Auth Commands
//!
//! ```text
//! begin_login(email) ──► LoginStep { login_token, totp, passkey }
//!        │
//!        ├── complete_totp(login_token, code) ───┐
//!        └── complete_passkey(login_token) ──────┴──► Session
//!
//! restore_session() on startup:
//!   stored refresh token ──► refresh + /users/me/ ──► SignedIn
//!                       └──► offline ──► cached profile ──► SignedIn (offline)
//!                       └──► rejected ──► forget ──► SignedOut
//! ```

use contable_api::{ApiError, SecondFactor, UserProfile};
use contable_db::setting_keys;
use serde::Serialize;
use tracing::{debug, info, warn};
use ts_rs::TS;

use crate::error::CommandResult;
use crate::state::{AppState, Session, SessionState};

/// What the login screen shows after the email step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LoginStep {
    pub login_token: String,
    /// A 6-digit code can complete the login.
    pub totp: bool,
    /// A passkey can complete the login on this device.
    pub passkey: bool,
}

pub async fn begin_login(state: &AppState, email: &str) -> CommandResult<LoginStep> {
    debug!("begin_login command");

    let challenge = state.api().auth().begin_login(email).await?;

    let passkey_ready = state
        .authenticator()
        .map(|a| a.is_available())
        .unwrap_or(false);

    Ok(LoginStep {
        totp: challenge.supports(SecondFactor::Totp),
        passkey: challenge.supports(SecondFactor::Passkey) && passkey_ready,
        login_token: challenge.login_token,
    })
}

pub async fn complete_totp(
    state: &AppState,
    login_token: &str,
    code: &str,
) -> CommandResult<Session> {
    debug!("complete_totp command");

    let success = state.api().auth().verify_totp(login_token, code).await?;
    state.sign_in(success.user, false).await
}

pub async fn complete_passkey(state: &AppState, login_token: &str) -> CommandResult<Session> {
    debug!("complete_passkey command");

    let success = state
        .api()
        .auth()
        .login_with_passkey(login_token, state.authenticator())
        .await?;
    state.sign_in(success.user, false).await
}

pub async fn logout(state: &AppState) -> CommandResult<()> {
    debug!("logout command");
    state.sign_out().await
}

/// Signs back in with the refresh token stored by the last session.
///
/// While the server is unreachable the cached profile is used, so the
/// register keeps selling (into the offline queue).
pub async fn restore_session(state: &AppState) -> CommandResult<SessionState> {
    debug!("restore_session command");

    let settings = state.db().settings();
    let Some(refresh) = settings.get(setting_keys::REFRESH_TOKEN).await? else {
        debug!("No stored session");
        return Ok(SessionState::SignedOut);
    };

    match state.api().auth().resume(&refresh).await {
        Ok(success) => {
            let session = state.sign_in(success.user, false).await?;
            Ok(SessionState::SignedIn(session))
        }
        Err(e) if e.is_offline() => {
            let cached: Option<UserProfile> =
                settings.get_json(setting_keys::USER_PROFILE).await?;
            match cached {
                Some(user) => {
                    warn!(error = %e, "Server unreachable, restoring cached session");
                    let session = state.sign_in(user, true).await?;
                    Ok(SessionState::SignedIn(session))
                }
                None => {
                    state.api().tokens().clear();
                    Err(e.into())
                }
            }
        }
        Err(e @ (ApiError::Unauthorized(_) | ApiError::NoSession)) => {
            info!(error = %e, "Stored session no longer valid");
            state.forget_session().await?;
            Ok(SessionState::SignedOut)
        }
        Err(e) => {
            state.api().tokens().clear();
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::error::ErrorCode;
    use crate::state::test_support::{signed_in, state};
    use async_trait::async_trait;
    use contable_api::PlatformAuthenticator;
    use contable_core::Permission;
    use contable_db::{Database, DbConfig};
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct Authenticator;

    #[async_trait]
    impl PlatformAuthenticator for Authenticator {
        async fn get_assertion(
            &self,
            options: &serde_json::Value,
        ) -> Result<serde_json::Value, String> {
            Ok(json!({ "signed": options["challenge"] }))
        }
    }

    fn success_body() -> serde_json::Value {
        json!({
            "access": "acc",
            "refresh": "ref",
            "user": {
                "id": 3,
                "email": "caja@empresa.mx",
                "first_name": "Ana",
                "permissions": ["pos.add_venta"]
            }
        })
    }

    async fn mount_challenge(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/users/login/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"login_token": "lt", "methods": ["totp", "passkey"]}),
            ))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_passkey_hidden_without_authenticator() {
        let server = MockServer::start().await;
        mount_challenge(&server).await;
        let state = state(&server).await;

        let step = begin_login(&state, "caja@empresa.mx").await.unwrap();
        assert_eq!(step.login_token, "lt");
        assert!(step.totp);
        assert!(!step.passkey);
    }

    #[tokio::test]
    async fn test_totp_login_signs_in() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users/login/totp/"))
            .and(body_json(json!({"login_token": "lt", "code": "123456"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
            .mount(&server)
            .await;
        let state = state(&server).await;

        let session = complete_totp(&state, "lt", "123456").await.unwrap();
        assert_eq!(session.user.id, 3);
        assert!(session.can(Permission::PosSell));
        assert!(state.session().is_signed_in());
        assert!(state.require(Permission::PosSell).is_ok());
    }

    #[tokio::test]
    async fn test_short_totp_code_is_a_validation_error() {
        let server = MockServer::start().await;
        let state = state(&server).await;

        let err = complete_totp(&state, "lt", "12345").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(!state.session().is_signed_in());
    }

    #[tokio::test]
    async fn test_passkey_login() {
        let server = MockServer::start().await;
        mount_challenge(&server).await;
        Mock::given(method("POST"))
            .and(path("/users/login/passkey/options/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"challenge": "c-1"})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/users/login/passkey/verify/"))
            .and(body_json(json!({"login_token": "lt", "assertion": {"signed": "c-1"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
            .mount(&server)
            .await;

        let mut config = AppConfig::default();
        config.server.base_url = server.uri();
        config.sync.enabled = false;
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let (state, _task) = AppState::with_database(config, db, Some(Arc::new(Authenticator)))
            .await
            .unwrap();

        let step = begin_login(&state, "caja@empresa.mx").await.unwrap();
        assert!(step.passkey);

        let session = complete_passkey(&state, &step.login_token).await.unwrap();
        assert_eq!(session.user.email, "caja@empresa.mx");
    }

    #[tokio::test]
    async fn test_passkey_without_authenticator() {
        let server = MockServer::start().await;
        let state = state(&server).await;

        let err = complete_passkey(&state, "lt").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::AuthenticatorError);
    }

    #[tokio::test]
    async fn test_restore_without_stored_session() {
        let server = MockServer::start().await;
        let state = state(&server).await;

        assert_eq!(restore_session(&state).await.unwrap(), SessionState::SignedOut);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_restore_online() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users/token/refresh/"))
            .and(body_json(json!({"refresh": "stored"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "acc"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/me/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body()["user"].clone()))
            .mount(&server)
            .await;

        let state = state(&server).await;
        state
            .db()
            .settings()
            .set(setting_keys::REFRESH_TOKEN, "stored")
            .await
            .unwrap();

        let restored = restore_session(&state).await.unwrap();
        let session = restored.session().unwrap();
        assert_eq!(session.user.id, 3);
        assert!(!session.offline);
    }

    #[tokio::test]
    async fn test_restore_offline_uses_cached_profile() {
        let server = MockServer::start().await;
        let online = signed_in(&server, &["pos.add_venta"]).await;

        // Same database, unreachable server.
        let mut config = AppConfig::default();
        config.server.base_url = "http://127.0.0.1:9".into();
        config.sync.enabled = false;
        let (offline, _task) = AppState::with_database(config, online.db().clone(), None)
            .await
            .unwrap();

        let restored = restore_session(&offline).await.unwrap();
        let session = restored.session().unwrap();
        assert!(session.offline);
        assert_eq!(session.user.email, "caja@empresa.mx");
        assert!(offline.require(Permission::PosSell).is_ok());
    }

    #[tokio::test]
    async fn test_restore_rejected_forgets_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users/token/refresh/"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"detail": "Token is blacklisted"})),
            )
            .mount(&server)
            .await;

        let state = state(&server).await;
        state
            .db()
            .settings()
            .set(setting_keys::REFRESH_TOKEN, "revoked")
            .await
            .unwrap();

        assert_eq!(restore_session(&state).await.unwrap(), SessionState::SignedOut);
        assert_eq!(
            state.db().settings().get(setting_keys::REFRESH_TOKEN).await.unwrap(),
            None
        );
    }
}
