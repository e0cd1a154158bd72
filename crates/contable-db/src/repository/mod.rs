//! # Repository Module
//!
//! Repository implementations for the terminal's local database.
//!
//! ```text
//! Command / SyncAgent
//!      │
//!      │  db.pending_sales().list_pending()
//!      ▼
//! PendingSaleRepository ── SQL ──► SQLite
//! ```
//!
//! ## Available Repositories
//!
//! - [`PendingSaleRepository`](pending_sale::PendingSaleRepository) - Offline sale queue
//! - [`SettingsRepository`](settings::SettingsRepository) - Key/value settings

pub mod pending_sale;
pub mod settings;
