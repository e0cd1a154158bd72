//! # contable-db: Local Storage for the Contable Terminal
//!
//! The ERP server owns all business data. The terminal keeps only what it
//! needs to keep working offline and to survive a restart.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Terminal Data Flow                               │
//! │                                                                         │
//! │  complete_sale (offline)          SyncAgent tick                       │
//! │       │                                │                                │
//! │       ▼                                ▼                                │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  contable-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────────┐  ┌────────────┐  │   │
//! │  │   │   Database    │    │   Repositories     │  │ Migrations │  │   │
//! │  │   │   (pool.rs)   │◄───│ PendingSaleRepo    │  │ 001, 002   │  │   │
//! │  │   │  SqlitePool   │    │ SettingsRepo       │  │ (embedded) │  │   │
//! │  │   └───────────────┘    └────────────────────┘  └────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  contable.db (WAL) in the platform data directory                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use contable_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("contable.db")).await?;
//!
//! let id = db.pending_sales().enqueue(&payload).await?;
//! for sale in db.pending_sales().list_pending().await? {
//!     // upload, then:
//!     db.pending_sales().mark_synced(sale.id).await?;
//! }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::pending_sale::PendingSaleRepository;
pub use repository::settings::{keys as setting_keys, SettingsRepository};
