//! # State Module
//!
//! One `AppState` built at startup and handed to every command. Cloning it
//! is cheap; clones share everything.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           AppState                                      │
//! │                                                                         │
//! │  ┌──────────────┐ ┌──────────────┐ ┌──────────────────────────────────┐ │
//! │  │  Database    │ │  ApiClient   │ │  SyncAgentHandle                 │ │
//! │  │  (SQLite     │ │  (reqwest +  │ │  (background flush, status)      │ │
//! │  │   pool)      │ │  TokenStore) │ │                                  │ │
//! │  └──────────────┘ └──────┬───────┘ └──────────────────────────────────┘ │
//! │                          │ tokens changed                               │
//! │                          ▼                                              │
//! │  ┌──────────────────────────────────┐ ┌──────────────────────────────┐  │
//! │  │  session: watch<SessionState>    │ │  ui: watch<UiPreferences>    │  │
//! │  │  SignedOut | SignedIn(Session)   │ │  persisted in app_settings   │  │
//! │  └──────────────────────────────────┘ └──────────────────────────────┘  │
//! │                                                                         │
//! │  Readers subscribe; only AppState methods write.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Token Watch
//! A background task follows the `TokenStore`. A rotated refresh token is
//! persisted; cleared tokens (refresh rejected) move the session to
//! `SignedOut`.

mod session;
mod ui;

pub use session::{Session, SessionState};
pub use ui::UiPreferences;

use std::sync::Arc;

use contable_api::{ApiClient, PlatformAuthenticator, TokenPair, TokenStore, UserProfile};
use contable_core::Permission;
use contable_db::{setting_keys, Database, DbConfig};
use contable_sync::{SyncAgent, SyncAgentHandle, SyncClient};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::{CommandError, CommandResult, StartupResult};

#[derive(Clone)]
pub struct AppState {
    db: Database,
    api: ApiClient,
    sync: SyncAgentHandle,
    session: Arc<watch::Sender<SessionState>>,
    ui: Arc<watch::Sender<UiPreferences>>,
    config: Arc<AppConfig>,
    authenticator: Option<Arc<dyn PlatformAuthenticator>>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("base_url", &self.api.base_url().as_str())
            .field("session", &*self.session.borrow())
            .field("ui", &*self.ui.borrow())
            .field("authenticator", &self.authenticator.is_some())
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Opens the configured database and wires everything up.
    ///
    /// Returns the sync agent's task so the caller can await it on shutdown.
    pub async fn build(
        config: AppConfig,
        authenticator: Option<Arc<dyn PlatformAuthenticator>>,
    ) -> StartupResult<(Self, JoinHandle<()>)> {
        let db_path = config.database.resolve_path()?;
        info!(?db_path, "Database path determined");

        let db = Database::new(DbConfig::new(db_path)).await?;
        info!("Database connected and migrations applied");

        Self::with_database(config, db, authenticator).await
    }

    /// Wires up an already opened database.
    pub async fn with_database(
        config: AppConfig,
        db: Database,
        authenticator: Option<Arc<dyn PlatformAuthenticator>>,
    ) -> StartupResult<(Self, JoinHandle<()>)> {
        let api = ApiClient::new(config.server.api_config(), TokenStore::new())?;

        let device_id = db.settings().device_id().await?;
        info!(device_id = %device_id, base_url = %api.base_url(), "Terminal identity");

        let sync_client = SyncClient::new(db.clone(), &api, device_id);
        let (sync, sync_task) = SyncAgent::spawn(sync_client, config.sync.clone())?;

        let ui_prefs = db
            .settings()
            .get_json::<UiPreferences>(setting_keys::UI_PREFERENCES)
            .await?
            .unwrap_or_default();

        let (session_tx, _) = watch::channel(SessionState::SignedOut);
        let (ui_tx, _) = watch::channel(ui_prefs);

        let state = AppState {
            db,
            api,
            sync,
            session: Arc::new(session_tx),
            ui: Arc::new(ui_tx),
            config: Arc::new(config),
            authenticator,
        };
        state.spawn_token_watch();

        info!("State initialized");
        Ok((state, sync_task))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn sync(&self) -> &SyncAgentHandle {
        &self.sync
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn authenticator(&self) -> Option<&dyn PlatformAuthenticator> {
        self.authenticator.as_deref()
    }

    pub fn session(&self) -> SessionState {
        self.session.borrow().clone()
    }

    pub fn subscribe_session(&self) -> watch::Receiver<SessionState> {
        self.session.subscribe()
    }

    pub fn ui(&self) -> UiPreferences {
        self.ui.borrow().clone()
    }

    pub fn subscribe_ui(&self) -> watch::Receiver<UiPreferences> {
        self.ui.subscribe()
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Fails unless someone is signed in with `permission`.
    pub fn require(&self, permission: Permission) -> CommandResult<()> {
        match &*self.session.borrow() {
            SessionState::SignedOut => Err(CommandError::unauthorized("Sign in first")),
            SessionState::SignedIn(session) => Ok(session.capabilities.require(permission)?),
        }
    }

    /// Publishes a signed-in session and remembers it for the next start.
    ///
    /// The API client must already hold the session's tokens.
    pub async fn sign_in(&self, user: UserProfile, offline: bool) -> CommandResult<Session> {
        let session = Session::new(user, offline);
        self.session
            .send_replace(SessionState::SignedIn(session.clone()));

        let settings = self.db.settings();
        if let Some(refresh) = self.api.tokens().refresh_token() {
            settings.set(setting_keys::REFRESH_TOKEN, &refresh).await?;
        }
        settings
            .set_json(setting_keys::USER_PROFILE, &session.user)
            .await?;

        info!(
            user_id = session.user.id,
            permissions = session.capabilities.len(),
            offline,
            "Session started"
        );
        Ok(session)
    }

    /// Ends the session locally and on the server (best effort).
    pub async fn sign_out(&self) -> CommandResult<()> {
        self.session.send_replace(SessionState::SignedOut);
        self.forget_session().await?;
        self.api.auth().logout().await;
        Ok(())
    }

    /// Drops the persisted refresh token and cached profile.
    pub(crate) async fn forget_session(&self) -> CommandResult<()> {
        let settings = self.db.settings();
        settings.delete(setting_keys::REFRESH_TOKEN).await?;
        settings.delete(setting_keys::USER_PROFILE).await?;
        Ok(())
    }

    fn spawn_token_watch(&self) {
        let mut tokens_rx = self.api.tokens().subscribe();
        let state = self.clone();

        tokio::spawn(async move {
            while tokens_rx.changed().await.is_ok() {
                let tokens = tokens_rx.borrow_and_update().clone();
                state.on_tokens_changed(tokens).await;
            }
            debug!("Token watch stopped");
        });
    }

    async fn on_tokens_changed(&self, tokens: Option<TokenPair>) {
        if !self.session.borrow().is_signed_in() {
            return;
        }

        match tokens {
            Some(pair) => {
                self.session.send_if_modified(|state| match state {
                    SessionState::SignedIn(session) if session.offline && !pair.access.is_empty() => {
                        info!("Server reachable again, session is online");
                        session.offline = false;
                        true
                    }
                    _ => false,
                });

                if let Err(e) = self
                    .db
                    .settings()
                    .set(setting_keys::REFRESH_TOKEN, &pair.refresh)
                    .await
                {
                    warn!(error = %e, "Could not persist refresh token");
                }
            }
            None => {
                info!("Session expired, signing out");
                self.session.send_replace(SessionState::SignedOut);
                if let Err(e) = self.forget_session().await {
                    warn!(error = ?e, "Could not clear stored session");
                }
            }
        }
    }

    // =========================================================================
    // UI Preferences
    // =========================================================================

    pub async fn set_sidebar_open(&self, open: bool) -> CommandResult<UiPreferences> {
        self.ui.send_modify(|prefs| prefs.sidebar_open = open);
        let prefs = self.ui();
        self.db
            .settings()
            .set_json(setting_keys::UI_PREFERENCES, &prefs)
            .await?;
        Ok(prefs)
    }

    // =========================================================================
    // Shutdown
    // =========================================================================

    /// Stops the sync agent and closes the database.
    pub async fn shutdown(&self) {
        if let Err(e) = self.sync.shutdown().await {
            debug!(error = %e, "Sync agent already stopped");
        }
        self.db.close().await;
        info!("Terminal state shut down");
    }
}
