//! # Sync Agent
//!
//! Background task that runs [`SyncClient::flush`] on a timer and on demand,
//! and publishes a [`SyncStatus`] for the UI.
//!
//! ## Agent Loop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         SyncAgent::run                                  │
//! │                                                                         │
//! │   tokio::select! {                                                      │
//! │     interval.tick()  (if enabled)   ──► flush pass                      │
//! │     SyncNow(reply)                  ──► flush pass, reply with report   │
//! │     Refresh                         ──► recount pending                 │
//! │     Shutdown / all handles dropped  ──► exit                            │
//! │   }                                                                     │
//! │                                                                         │
//! │   every pass: running=true ─► flush ─► last_sync / last_error ─►        │
//! │               pending_count ─► running=false   (watch channel)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use ts_rs::TS;

use crate::client::{SyncClient, SyncReport};
use crate::config::SyncSettings;
use crate::error::{SyncError, SyncResult};

// =============================================================================
// Sync Status
// =============================================================================

/// What the status bar shows about sync.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SyncStatus {
    /// Sales waiting for upload.
    pub pending_count: i64,

    /// End of the last pass that ran to completion.
    #[ts(as = "Option<String>")]
    pub last_sync: Option<DateTime<Utc>>,

    /// Why the last pass, or a sale in it, failed.
    pub last_error: Option<String>,

    /// A pass is in progress.
    pub running: bool,

    /// Background sync is on.
    pub enabled: bool,
}

// =============================================================================
// Commands
// =============================================================================

enum AgentCommand {
    SyncNow(oneshot::Sender<SyncResult<SyncReport>>),
    Refresh,
    Shutdown,
}

impl std::fmt::Debug for AgentCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentCommand::SyncNow(_) => f.write_str("SyncNow"),
            AgentCommand::Refresh => f.write_str("Refresh"),
            AgentCommand::Shutdown => f.write_str("Shutdown"),
        }
    }
}

// =============================================================================
// Agent Handle
// =============================================================================

/// Controls a running [`SyncAgent`]. Clones talk to the same agent.
#[derive(Debug, Clone)]
pub struct SyncAgentHandle {
    command_tx: mpsc::Sender<AgentCommand>,
    status_rx: watch::Receiver<SyncStatus>,
}

impl SyncAgentHandle {
    /// Latest published status.
    pub fn status(&self) -> SyncStatus {
        self.status_rx.borrow().clone()
    }

    /// Receiver that wakes on every status change.
    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.status_rx.clone()
    }

    /// Runs a pass now and waits for its report.
    pub async fn sync_now(&self) -> SyncResult<SyncReport> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(AgentCommand::SyncNow(reply_tx))
            .await
            .map_err(|_| SyncError::ShuttingDown)?;
        reply_rx.await.map_err(|_| SyncError::ShuttingDown)?
    }

    /// Asks the agent to recount pending sales, e.g. after one was queued.
    /// Never blocks; a full command queue drops the request.
    pub fn notify_queued(&self) {
        if let Err(e) = self.command_tx.try_send(AgentCommand::Refresh) {
            debug!(error = %e, "Refresh request dropped");
        }
    }

    /// Signals the agent to stop after the current pass.
    pub async fn shutdown(&self) -> SyncResult<()> {
        self.command_tx
            .send(AgentCommand::Shutdown)
            .await
            .map_err(|e| SyncError::Channel(e.to_string()))
    }
}

// =============================================================================
// Sync Agent
// =============================================================================

pub struct SyncAgent {
    client: SyncClient,
    settings: SyncSettings,
    status_tx: watch::Sender<SyncStatus>,
    command_rx: mpsc::Receiver<AgentCommand>,
}

impl SyncAgent {
    /// Validates settings and spawns the agent on the current runtime.
    pub fn spawn(
        client: SyncClient,
        settings: SyncSettings,
    ) -> SyncResult<(SyncAgentHandle, JoinHandle<()>)> {
        settings.validate()?;

        let client = client.with_limit(settings.pass_limit());
        let (command_tx, command_rx) = mpsc::channel(16);
        let (status_tx, status_rx) = watch::channel(SyncStatus {
            enabled: settings.enabled,
            ..Default::default()
        });

        let agent = SyncAgent {
            client,
            settings,
            status_tx,
            command_rx,
        };
        let task = tokio::spawn(agent.run());

        Ok((
            SyncAgentHandle {
                command_tx,
                status_rx,
            },
            task,
        ))
    }

    async fn run(mut self) {
        info!(
            device_id = %self.client.device_id(),
            enabled = self.settings.enabled,
            interval_secs = self.settings.poll_interval_secs,
            "Sync agent starting"
        );

        self.refresh_pending().await;

        let period = self.settings.poll_interval();
        let start = if self.settings.sync_on_start {
            Instant::now()
        } else {
            Instant::now() + period
        };
        let mut interval = time::interval_at(start, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick(), if self.settings.enabled => {
                    if let Err(e) = self.run_pass().await {
                        if e.needs_sign_in() {
                            debug!("Background sync waiting for sign-in");
                        } else {
                            error!(error = %e, "Background sync failed");
                        }
                    }
                }

                command = self.command_rx.recv() => match command {
                    Some(AgentCommand::SyncNow(reply)) => {
                        let result = self.run_pass().await;
                        // The caller may have given up waiting.
                        let _ = reply.send(result);
                    }
                    Some(AgentCommand::Refresh) => self.refresh_pending().await,
                    Some(AgentCommand::Shutdown) | None => {
                        info!("Sync agent received shutdown");
                        break;
                    }
                },
            }
        }

        self.status_tx.send_modify(|s| s.running = false);
        info!("Sync agent stopped");
    }

    async fn run_pass(&self) -> SyncResult<SyncReport> {
        self.status_tx.send_modify(|s| s.running = true);

        let result = self.client.flush().await;

        self.status_tx.send_modify(|s| {
            s.running = false;
            match &result {
                Ok(report) => {
                    s.last_sync = Some(Utc::now());
                    s.last_error = report.last_error().map(str::to_string);
                }
                Err(e) => s.last_error = Some(e.to_string()),
            }
        });
        self.refresh_pending().await;

        result
    }

    async fn refresh_pending(&self) {
        match self.client.pending_count().await {
            Ok(count) => self.status_tx.send_modify(|s| s.pending_count = count),
            Err(e) => warn!(error = %e, "Could not count pending sales"),
        }
    }
}
