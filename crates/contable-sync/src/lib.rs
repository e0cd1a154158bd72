//! # contable-sync: Offline Sale Sync
//!
//! Sales completed while the ERP server is unreachable are queued in
//! `contable-db`. This crate pushes them once the server answers again.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   complete_sale ──(offline)──► pending_sales (SQLite)                   │
//! │                                      │                                  │
//! │   ┌──────────────────────────────────▼──────────────────────────────┐   │
//! │   │ SyncAgent (tokio task)                                          │   │
//! │   │   every poll_interval_secs, or SyncAgentHandle::sync_now()      │   │
//! │   │        │                                                        │   │
//! │   │        ▼                                                        │   │
//! │   │   SyncClient::flush ── POST /pos/ventas/ ──► ERP server         │   │
//! │   │        │  2xx ─► mark synced   else ─► record failure           │   │
//! │   │        ▼                                                        │   │
//! │   │   SyncStatus ──(watch)──► status bar                            │   │
//! │   └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use contable_sync::{SyncAgent, SyncClient, SyncSettings};
//!
//! let device_id = db.settings().device_id().await?;
//! let client = SyncClient::new(db.clone(), &api, device_id);
//! let (handle, _task) = SyncAgent::spawn(client, SyncSettings::default())?;
//!
//! let report = handle.sync_now().await?;
//! println!("{} synced, {} failed", report.synced, report.failed);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod agent;
pub mod client;
pub mod config;
pub mod error;

// =============================================================================
// Re-exports
// =============================================================================

pub use agent::{SyncAgent, SyncAgentHandle, SyncStatus};
pub use client::{idempotency_key, SaleSyncFailure, SyncClient, SyncReport};
pub use config::SyncSettings;
pub use error::{SyncError, SyncResult};
