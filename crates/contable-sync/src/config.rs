//! # Sync Settings
//!
//! The `[sync]` table of the terminal's `config.toml`. Loading the file and
//! applying `CONTABLE_*` overrides is the terminal's job; this module only
//! holds the values, their defaults and `validate()`.
//!
//! ```toml
//! [sync]
//! enabled = true
//! poll_interval_secs = 30
//! sync_on_start = true
//! max_per_pass = 0        # 0 = no limit
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};

/// Shortest poll interval accepted. Anything lower would hammer the server
/// while it is down.
pub const MIN_POLL_INTERVAL_SECS: u64 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Background sync on/off. `sync_now` works either way.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Seconds between background flushes.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Flush once as soon as the agent starts.
    #[serde(default = "default_true")]
    pub sync_on_start: bool,

    /// Cap on uploads per pass. 0 means every pending sale.
    #[serde(default)]
    pub max_per_pass: usize,
}

fn default_true() -> bool {
    true
}

fn default_poll_interval() -> u64 {
    30
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            enabled: true,
            poll_interval_secs: default_poll_interval(),
            sync_on_start: true,
            max_per_pass: 0,
        }
    }
}

impl SyncSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// `None` when there is no cap.
    pub fn pass_limit(&self) -> Option<usize> {
        (self.max_per_pass > 0).then_some(self.max_per_pass)
    }

    pub fn validate(&self) -> SyncResult<()> {
        if self.poll_interval_secs < MIN_POLL_INTERVAL_SECS {
            return Err(SyncError::InvalidConfig(format!(
                "poll_interval_secs must be at least {}, got {}",
                MIN_POLL_INTERVAL_SECS, self.poll_interval_secs
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_table() {
        let settings: SyncSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, SyncSettings::default());
        assert_eq!(settings.poll_interval(), Duration::from_secs(30));
        assert_eq!(settings.pass_limit(), None);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_tiny_interval() {
        let settings = SyncSettings {
            poll_interval_secs: 1,
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(SyncError::InvalidConfig(_))));
    }

    #[test]
    fn test_pass_limit() {
        let settings = SyncSettings {
            max_per_pass: 25,
            ..Default::default()
        };
        assert_eq!(settings.pass_limit(), Some(25));
    }
}
