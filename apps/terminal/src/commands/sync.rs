//! # Sync Commands
//!
//! Status bar and "sync now" button for the offline sale queue.

use contable_core::{PendingSale, Permission};
use contable_sync::{SyncReport, SyncStatus};
use tracing::{debug, info};

use crate::error::CommandResult;
use crate::state::AppState;

/// Uploads every pending sale now and reports what happened.
pub async fn sync_now(state: &AppState) -> CommandResult<SyncReport> {
    debug!("sync_now command");
    state.require(Permission::PosSell)?;

    let report = state.sync().sync_now().await?;
    info!(synced = report.synced, failed = report.failed, "Manual sync finished");
    Ok(report)
}

pub fn sync_status(state: &AppState) -> SyncStatus {
    state.sync().status()
}

/// Sales still waiting for upload, oldest first.
pub async fn list_pending_sales(state: &AppState) -> CommandResult<Vec<PendingSale>> {
    debug!("list_pending_sales command");
    state.require(Permission::PosSell)?;

    Ok(state.db().pending_sales().list_pending().await?)
}
