//! # Sync Client
//!
//! One flush pass over the pending-sales queue.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          flush()                                        │
//! │                                                                         │
//! │  lock flush mutex (one pass at a time per process)                     │
//! │     │                                                                   │
//! │  list_pending()  ──► [s1, s2, s3]   oldest first                        │
//! │     │                                                                   │
//! │     ├─ s1: POST /pos/ventas/  Idempotency-Key: {device}-{s1.id}         │
//! │     │        2xx ─► mark_synced(_with_remote)                           │
//! │     ├─ s2: POST ...  400/5xx/offline ─► record_failure, continue        │
//! │     ├─ s3: POST ...  401 after refresh / no session ─► abort pass       │
//! │     │                                                                   │
//! │  SyncReport { attempted, synced, failed, errors }                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Delivery is at-least-once: a sale is marked synced only after the server
//! answered 2xx, so a crash between the answer and the mark re-sends it on
//! the next pass with the same idempotency key.

use std::sync::Arc;

use contable_api::services::pos::PosService;
use contable_api::{ApiClient, ApiError};
use contable_core::PendingSale;
use contable_db::Database;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use ts_rs::TS;

use crate::error::{SyncError, SyncResult};

/// Key sent with every upload of a given sale. Stable across retries.
pub fn idempotency_key(device_id: &str, local_id: i64) -> String {
    format!("{}-{}", device_id, local_id)
}

// =============================================================================
// Report
// =============================================================================

/// One sale the server did not accept during a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleSyncFailure {
    pub local_id: i64,
    pub message: String,
    /// True when the server was unreachable rather than refusing the sale.
    pub offline: bool,
}

/// Outcome of one flush pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SyncReport {
    pub attempted: usize,
    pub synced: usize,
    pub failed: usize,
    pub errors: Vec<SaleSyncFailure>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }

    /// Message of the last failure, for status display.
    pub fn last_error(&self) -> Option<&str> {
        self.errors.last().map(|e| e.message.as_str())
    }
}

// =============================================================================
// Sync Client
// =============================================================================

/// Uploads queued sales. Cheap to clone; clones share the flush lock.
#[derive(Debug, Clone)]
pub struct SyncClient {
    db: Database,
    pos: PosService,
    device_id: String,
    limit: Option<usize>,
    flush_lock: Arc<Mutex<()>>,
}

impl SyncClient {
    pub fn new(db: Database, api: &ApiClient, device_id: impl Into<String>) -> Self {
        SyncClient {
            db,
            pos: api.pos(),
            device_id: device_id.into(),
            limit: None,
            flush_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Caps the number of uploads per pass.
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub async fn pending_count(&self) -> SyncResult<i64> {
        Ok(self.db.pending_sales().count_pending().await?)
    }

    /// Runs one pass. Waits if another pass is in progress.
    ///
    /// ## Errors
    /// - storage failures
    /// - [`ApiError::Unauthorized`] / [`ApiError::NoSession`]: the pass stops
    ///   at the sale being uploaded, which stays pending untouched
    pub async fn flush(&self) -> SyncResult<SyncReport> {
        let _guard = self.flush_lock.lock().await;

        let repo = self.db.pending_sales();
        let pending = repo.list_pending().await?;
        let total = pending.len();
        let batch: Vec<PendingSale> = match self.limit {
            Some(limit) => pending.into_iter().take(limit).collect(),
            None => pending,
        };

        if batch.is_empty() {
            debug!("No pending sales to sync");
            return Ok(SyncReport::default());
        }

        info!(count = batch.len(), total, "Syncing pending sales");

        let mut report = SyncReport::default();

        for sale in batch {
            report.attempted += 1;
            let key = idempotency_key(&self.device_id, sale.id);

            match self.pos.create_sale(&sale.payload, Some(&key)).await {
                Ok(created) => {
                    match created.remote_id() {
                        Some(remote_id) => repo.mark_synced_with_remote(sale.id, &remote_id).await?,
                        None => repo.mark_synced(sale.id).await?,
                    }
                    report.synced += 1;
                }
                Err(err @ (ApiError::Unauthorized(_) | ApiError::NoSession)) => {
                    warn!(id = sale.id, error = %err, "Sync stopped: not signed in");
                    return Err(SyncError::Api(err));
                }
                Err(err) => {
                    let message = err.to_string();
                    repo.record_failure(sale.id, &message).await?;
                    report.failed += 1;
                    report.errors.push(SaleSyncFailure {
                        local_id: sale.id,
                        message,
                        offline: err.is_offline(),
                    });
                }
            }
        }

        info!(
            attempted = report.attempted,
            synced = report.synced,
            failed = report.failed,
            "Sync pass finished"
        );
        Ok(report)
    }
}
