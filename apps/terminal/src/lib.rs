//! # Contable Terminal Library
//!
//! Composition root of the ERP client: loads config, opens the local
//! database, builds the API client and sync agent, and exposes the
//! commands the front end calls.
//!
//! ## Module Organization
//! ```text
//! contable_terminal/
//! ├── lib.rs          ◄─── You are here (startup & run)
//! ├── config.rs       ◄─── config.toml + CONTABLE_* overrides
//! ├── error.rs        ◄─── CommandError for commands, StartupError
//! ├── state/
//! │   ├── mod.rs      ◄─── AppState container
//! │   ├── session.rs  ◄─── SessionState / Session
//! │   └── ui.rs       ◄─── UiPreferences
//! └── commands/
//!     ├── auth.rs     ◄─── Login, logout, restore
//!     ├── sale.rs     ◄─── complete_sale, queue_sale
//!     ├── sync.rs     ◄─── sync_now, sync_status, list_pending_sales
//!     ├── reports.rs  ◄─── PDF / XLSX downloads
//!     └── ui.rs       ◄─── toggle_sidebar
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod state;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use config::AppConfig;
use error::StartupResult;
use state::AppState;

/// Runs the terminal until Ctrl-C.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Terminal Startup                                  │
/// │                                                                         │
/// │  1. Initialize Logging ───────────────────────────────────────────────► │
/// │     • tracing-subscriber with env filter                                │
/// │     • Default: info,contable=debug,sqlx=warn; override with RUST_LOG    │
/// │                                                                         │
/// │  2. Load Config ──────────────────────────────────────────────────────► │
/// │     • config.toml, then CONTABLE_* env vars, then validate              │
/// │                                                                         │
/// │  3. Build State ──────────────────────────────────────────────────────► │
/// │     • SQLite (WAL) + migrations, device id                              │
/// │     • ApiClient, SyncAgent (first pass right away)                      │
/// │                                                                         │
/// │  4. Restore Session ──────────────────────────────────────────────────► │
/// │     • stored refresh token, cached profile when offline                 │
/// │                                                                         │
/// │  5. Wait for Ctrl-C, stop sync agent, close database                    │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run() -> StartupResult<()> {
    init_tracing();

    info!(version = env!("CARGO_PKG_VERSION"), "Starting Contable terminal");

    let config = AppConfig::load(None)?;
    let (state, sync_task) = AppState::build(config, None).await?;

    match commands::auth::restore_session(&state).await {
        Ok(session) => info!(signed_in = session.is_signed_in(), "Session restored"),
        Err(e) => warn!(error = %e, "Could not restore session"),
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Could not listen for Ctrl-C, shutting down");
    }

    info!("Shutting down");
    state.shutdown().await;
    if let Err(e) = sync_task.await {
        warn!(error = %e, "Sync agent task ended abnormally");
    }
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=contable=trace` - Show trace for contable crates only
/// - Default: `info,contable=debug,sqlx=warn`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,contable=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
