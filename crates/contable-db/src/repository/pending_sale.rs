//! # Pending Sale Repository
//!
//! The offline sale queue: sales the register completed while the ERP
//! server was unreachable, held until the sync agent uploads them.
//!
//! ## Queue Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Offline Sale Queue                                   │
//! │                                                                         │
//! │  complete_sale fails to reach the server (or queue_sale)               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  enqueue(payload)                                                      │
//! │     INSERT INTO pending_sales (payload, status='pending', created_at)   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            SYNC FLUSH (contable-sync)                           │   │
//! │  │                                                                 │   │
//! │  │  1. list_pending()  ← status='pending' ORDER BY id              │   │
//! │  │                                                                 │   │
//! │  │  2. For each sale, one at a time:                               │   │
//! │  │     a. POST /pos/ventas/                                        │   │
//! │  │     b. 2xx:   mark_synced(id)       status='synced'             │   │
//! │  │     c. else:  record_failure(id)    attempts += 1, last_error   │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  KEY GUARANTEES:                                                       │
//! │  • A queued sale stays listed until the server accepted it             │
//! │  • pending → synced only (trigger enforced); rows are never deleted    │
//! │  • mark_synced is idempotent                                           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use contable_core::{PendingSale, PendingSaleStatus};

const ENTITY: &str = "PendingSale";

const SELECT_COLUMNS: &str = r#"
    SELECT id, payload, status, created_at, synced_at, attempts, last_error, remote_id
    FROM pending_sales
"#;

/// Row shape of `pending_sales`; the payload is stored as JSON text.
#[derive(Debug, sqlx::FromRow)]
struct PendingSaleRow {
    id: i64,
    payload: String,
    status: PendingSaleStatus,
    created_at: DateTime<Utc>,
    synced_at: Option<DateTime<Utc>>,
    attempts: i64,
    last_error: Option<String>,
    remote_id: Option<String>,
}

impl TryFrom<PendingSaleRow> for PendingSale {
    type Error = DbError;

    fn try_from(row: PendingSaleRow) -> DbResult<Self> {
        Ok(PendingSale {
            id: row.id,
            payload: serde_json::from_str(&row.payload)?,
            status: row.status,
            created_at: row.created_at,
            synced_at: row.synced_at,
            attempts: row.attempts,
            last_error: row.last_error,
            remote_id: row.remote_id,
        })
    }
}

/// Repository for the offline sale queue.
#[derive(Debug, Clone)]
pub struct PendingSaleRepository {
    pool: SqlitePool,
}

impl PendingSaleRepository {
    /// Creates a new PendingSaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PendingSaleRepository { pool }
    }

    /// Appends a sale to the queue and returns its local id.
    ///
    /// The payload is stored as given. Storage failures propagate to the
    /// caller; nothing is retried here.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let id = repo.enqueue(&payload.to_value()?).await?;
    /// ```
    pub async fn enqueue(&self, payload: &serde_json::Value) -> DbResult<i64> {
        let payload = serde_json::to_string(payload)?;
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO pending_sales (payload, status, created_at, attempts)
            VALUES (?1, 'pending', ?2, 0)
            "#,
        )
        .bind(&payload)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!(id, bytes = payload.len(), "Sale queued for sync");

        Ok(id)
    }

    /// Every pending sale, oldest first.
    pub async fn list_pending(&self) -> DbResult<Vec<PendingSale>> {
        let sql = format!("{SELECT_COLUMNS} WHERE status = 'pending' ORDER BY id ASC");

        let rows: Vec<PendingSaleRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;

        rows.into_iter().map(PendingSale::try_from).collect()
    }

    /// Gets a queued sale by local id, whatever its status.
    pub async fn get(&self, id: i64) -> DbResult<Option<PendingSale>> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?1");

        let row: Option<PendingSaleRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(PendingSale::try_from).transpose()
    }

    /// Counts sales still waiting for upload.
    pub async fn count_pending(&self) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM pending_sales WHERE status = 'pending'")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Marks a sale as accepted by the server.
    ///
    /// Idempotent: marking an already synced sale succeeds and keeps the
    /// original `synced_at`. An unknown id is [`DbError::NotFound`].
    pub async fn mark_synced(&self, id: i64) -> DbResult<()> {
        self.set_synced(id, None).await
    }

    /// Same as [`mark_synced`](Self::mark_synced), also storing the id the
    /// server assigned to the sale. A remote id already stored is kept.
    pub async fn mark_synced_with_remote(&self, id: i64, remote_id: &str) -> DbResult<()> {
        self.set_synced(id, Some(remote_id)).await
    }

    async fn set_synced(&self, id: i64, remote_id: Option<&str>) -> DbResult<()> {
        let now = Utc::now();

        // SQLite counts matched rows, so a repeat mark still affects one row.
        let result = sqlx::query(
            r#"
            UPDATE pending_sales SET
                status = 'synced',
                synced_at = COALESCE(synced_at, ?2),
                remote_id = COALESCE(remote_id, ?3)
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(now)
        .bind(remote_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(ENTITY, id));
        }

        debug!(id, remote_id = ?remote_id, "Sale marked synced");
        Ok(())
    }

    /// Records a failed upload attempt against a pending sale.
    ///
    /// ## Errors
    /// - [`DbError::NotFound`] when the id was never enqueued
    /// - [`DbError::InvalidTransition`] when the sale is already synced
    pub async fn record_failure(&self, id: i64, error: &str) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE pending_sales SET
                attempts = attempts + 1,
                last_error = ?2
            WHERE id = ?1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return match self.get(id).await? {
                None => Err(DbError::not_found(ENTITY, id)),
                Some(_) => Err(DbError::invalid_transition(
                    ENTITY,
                    id,
                    "already synced",
                )),
            };
        }

        warn!(id, error = %error, "Sale upload failed");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use serde_json::json;

    async fn repo() -> PendingSaleRepository {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.pending_sales()
    }

    fn ids(sales: &[PendingSale]) -> Vec<i64> {
        sales.iter().map(|s| s.id).collect()
    }

    #[tokio::test]
    async fn test_enqueue_then_sync_in_insertion_order() {
        let repo = repo().await;

        let a = repo.enqueue(&json!({"total": 100})).await.unwrap();
        let b = repo.enqueue(&json!({"total": 50})).await.unwrap();

        let pending = repo.list_pending().await.unwrap();
        assert_eq!(ids(&pending), vec![a, b]);
        assert_eq!(pending[0].payload["total"], 100);
        assert_eq!(pending[1].payload["total"], 50);
        assert!(pending.iter().all(|s| s.status == PendingSaleStatus::Pending));

        repo.mark_synced(a).await.unwrap();

        let pending = repo.list_pending().await.unwrap();
        assert_eq!(ids(&pending), vec![b]);
        assert_eq!(repo.count_pending().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_mark_synced_is_idempotent() {
        let repo = repo().await;
        let id = repo.enqueue(&json!({"total": 1})).await.unwrap();

        repo.mark_synced(id).await.unwrap();
        let first = repo.get(id).await.unwrap().unwrap();

        repo.mark_synced(id).await.unwrap();
        let second = repo.get(id).await.unwrap().unwrap();

        assert_eq!(second.status, PendingSaleStatus::Synced);
        assert_eq!(first.synced_at, second.synced_at);
        assert!(repo.list_pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mark_synced_unknown_id_is_not_found() {
        let repo = repo().await;

        let err = repo.mark_synced(999).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        let err = repo.record_failure(999, "boom").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_record_failure_keeps_sale_pending() {
        let repo = repo().await;
        let id = repo.enqueue(&json!({"total": 7})).await.unwrap();

        repo.record_failure(id, "HTTP 500").await.unwrap();
        repo.record_failure(id, "timeout").await.unwrap();

        let sale = repo.get(id).await.unwrap().unwrap();
        assert!(sale.is_pending());
        assert_eq!(sale.attempts, 2);
        assert_eq!(sale.last_error.as_deref(), Some("timeout"));

        repo.mark_synced(id).await.unwrap();
        let err = repo.record_failure(id, "late").await.unwrap_err();
        assert!(matches!(err, DbError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_remote_id_is_stored_once() {
        let repo = repo().await;
        let id = repo.enqueue(&json!({"total": 3})).await.unwrap();

        repo.mark_synced_with_remote(id, "V-1001").await.unwrap();
        repo.mark_synced_with_remote(id, "V-2002").await.unwrap();

        let sale = repo.get(id).await.unwrap().unwrap();
        assert_eq!(sale.remote_id.as_deref(), Some("V-1001"));
        assert!(sale.synced_at.is_some());
    }

    #[tokio::test]
    async fn test_synced_sale_cannot_go_back_to_pending() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.pending_sales();
        let id = repo.enqueue(&json!({"total": 5})).await.unwrap();
        repo.mark_synced(id).await.unwrap();

        let err: DbError = sqlx::query("UPDATE pending_sales SET status = 'pending' WHERE id = ?1")
            .bind(id)
            .execute(db.pool())
            .await
            .unwrap_err()
            .into();

        assert!(matches!(err, DbError::InvalidTransition { .. }));
        assert!(repo.list_pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let repo = repo().await;
        assert!(repo.get(1).await.unwrap().is_none());
    }
}
