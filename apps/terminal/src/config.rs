//! # Terminal Configuration
//!
//! Loaded once at startup.
//!
//! ## Precedence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   defaults  ──►  config.toml  ──►  CONTABLE_* env vars  ──►  validate() │
//! │                                                                         │
//! │   config.toml location (ProjectDirs "mx.contable.terminal"):            │
//! │   • Linux:   ~/.config/terminal/config.toml                             │
//! │   • macOS:   ~/Library/Application Support/mx.contable.terminal/        │
//! │   • Windows: %APPDATA%\contable\terminal\config\                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```toml
//! [server]
//! base_url = "https://erp.example.com/api/"
//! timeout_secs = 30
//!
//! [database]
//! path = "/var/lib/contable/terminal.db"
//!
//! [sync]
//! poll_interval_secs = 60
//!
//! [downloads]
//! dir = "/home/caja/Descargas"
//! ```
//!
//! ## Environment Overrides
//! | Variable                      | Field                       |
//! |-------------------------------|-----------------------------|
//! | `CONTABLE_API_URL`            | `server.base_url`           |
//! | `CONTABLE_API_TIMEOUT_SECS`   | `server.timeout_secs`       |
//! | `CONTABLE_DB_PATH`            | `database.path`             |
//! | `CONTABLE_SYNC_ENABLED`       | `sync.enabled`              |
//! | `CONTABLE_SYNC_INTERVAL_SECS` | `sync.poll_interval_secs`   |
//! | `CONTABLE_DOWNLOAD_DIR`       | `downloads.dir`             |

use std::path::{Path, PathBuf};
use std::time::Duration;

use contable_api::ApiClientConfig;
use contable_sync::SyncSettings;
use directories::{ProjectDirs, UserDirs};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{StartupError, StartupResult};

const DATABASE_FILE: &str = "contable.db";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("mx", "contable", "terminal")
}

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the ERP REST API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000/api/".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl ServerConfig {
    pub fn api_config(&self) -> ApiClientConfig {
        let mut config = ApiClientConfig::new(self.base_url.clone())
            .timeout(Duration::from_secs(self.timeout_secs));
        config.connect_timeout = Duration::from_secs(self.connect_timeout_secs);
        config
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file. Default: `contable.db` in the app data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl DatabaseConfig {
    /// The database file, with its parent directory created.
    pub fn resolve_path(&self) -> StartupResult<PathBuf> {
        let path = match &self.path {
            Some(path) => path.clone(),
            None => project_dirs()
                .ok_or(StartupError::NoDataDir)?
                .data_dir()
                .join(DATABASE_FILE),
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Ok(path)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadsConfig {
    /// Where PDFs and spreadsheets are saved. Default: the user's download
    /// directory.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl DownloadsConfig {
    pub fn resolve_dir(&self) -> PathBuf {
        if let Some(dir) = &self.dir {
            return dir.clone();
        }
        UserDirs::new()
            .and_then(|dirs| dirs.download_dir().map(Path::to_path_buf))
            .or_else(|| project_dirs().map(|dirs| dirs.data_dir().join("downloads")))
            .unwrap_or_else(|| PathBuf::from("downloads"))
    }
}

// =============================================================================
// App Config
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub sync: SyncSettings,

    #[serde(default)]
    pub downloads: DownloadsConfig,
}

impl AppConfig {
    /// Loads configuration from file and environment.
    ///
    /// `config_path` overrides the default location. A missing file is not
    /// an error; a malformed one is.
    pub fn load(config_path: Option<PathBuf>) -> StartupResult<Self> {
        Self::load_with(config_path, |key| std::env::var(key).ok())
    }

    fn load_with<F>(config_path: Option<PathBuf>, lookup: F) -> StartupResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides_from(lookup);
        config.validate()?;
        Ok(config)
    }

    /// Applies `CONTABLE_*` overrides read through `lookup`. Values that do
    /// not parse are ignored with a warning.
    pub fn apply_env_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("CONTABLE_API_URL") {
            debug!(url = %url, "Overriding API URL from environment");
            self.server.base_url = url;
        }

        if let Some(value) = lookup("CONTABLE_API_TIMEOUT_SECS") {
            match value.parse() {
                Ok(secs) => self.server.timeout_secs = secs,
                Err(_) => warn!(value = %value, "Ignoring invalid CONTABLE_API_TIMEOUT_SECS"),
            }
        }

        if let Some(path) = lookup("CONTABLE_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(value) = lookup("CONTABLE_SYNC_ENABLED") {
            match value.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.sync.enabled = true,
                "0" | "false" | "no" | "off" => self.sync.enabled = false,
                _ => warn!(value = %value, "Ignoring invalid CONTABLE_SYNC_ENABLED"),
            }
        }

        if let Some(value) = lookup("CONTABLE_SYNC_INTERVAL_SECS") {
            match value.parse() {
                Ok(secs) => self.sync.poll_interval_secs = secs,
                Err(_) => warn!(value = %value, "Ignoring invalid CONTABLE_SYNC_INTERVAL_SECS"),
            }
        }

        if let Some(dir) = lookup("CONTABLE_DOWNLOAD_DIR") {
            self.downloads.dir = Some(PathBuf::from(dir));
        }
    }

    pub fn validate(&self) -> StartupResult<()> {
        let url = &self.server.base_url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(StartupError::Config(format!(
                "server.base_url must start with http:// or https://, got: {}",
                url
            )));
        }

        if self.server.timeout_secs == 0 || self.server.connect_timeout_secs == 0 {
            return Err(StartupError::Config(
                "server timeouts must be greater than zero".to_string(),
            ));
        }

        self.sync
            .validate()
            .map_err(|e| StartupError::Config(e.to_string()))
    }

    fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
