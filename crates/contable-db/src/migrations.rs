//! # Database Migrations
//!
//! Embedded SQL migrations for the terminal's local database.
//!
//! ```text
//! migrations/sqlite/
//! ├── 001_pending_sales.sql   # Offline sale queue + forward-only trigger
//! └── 002_app_settings.sql    # Key/value settings
//! ```
//!
//! Terminals in the field upgrade in place with sales still queued, so
//! applied files are never edited. Schema changes go in a new numbered file.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies whatever the database has not seen yet, in filename order.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    MIGRATOR.run(pool).await?;
    info!(migrations = MIGRATOR.migrations.len(), "Local schema up to date");
    Ok(())
}

/// `(embedded, applied)`. A fresh file reports zero applied.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((total, applied as usize))
}
