//! # Settings Repository
//!
//! Key/value storage for the few things the terminal remembers across
//! restarts.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;

/// Well-known setting keys.
pub mod keys {
    /// Refresh token of the last signed-in session.
    pub const REFRESH_TOKEN: &str = "auth.refresh_token";
    /// Profile of that session, for restoring it while offline.
    pub const USER_PROFILE: &str = "auth.user_profile";
    /// Stable id of this terminal, generated on first use.
    pub const DEVICE_ID: &str = "device.id";
    /// UI preferences (JSON).
    pub const UI_PREFERENCES: &str = "ui.preferences";
}

/// Repository for the `app_settings` table.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    pub async fn get(&self, key: &str) -> DbResult<Option<String>> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM app_settings WHERE key = ?1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(value)
    }

    /// Inserts or replaces a setting.
    pub async fn set(&self, key: &str, value: &str) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO app_settings (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        debug!(key = %key, "Setting stored");
        Ok(())
    }

    /// Removes a setting. Returns whether it existed.
    pub async fn delete(&self, key: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM app_settings WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> DbResult<Option<T>> {
        match self.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T) -> DbResult<()> {
        let raw = serde_json::to_string(value)?;
        self.set(key, &raw).await
    }

    /// Returns this terminal's device id, creating it on first call.
    pub async fn device_id(&self) -> DbResult<String> {
        // INSERT OR IGNORE keeps the first id if two callers race.
        sqlx::query(
            "INSERT OR IGNORE INTO app_settings (key, value, updated_at) VALUES (?1, ?2, ?3)",
        )
        .bind(keys::DEVICE_ID)
        .bind(Uuid::new_v4().to_string())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let id: String = sqlx::query_scalar("SELECT value FROM app_settings WHERE key = ?1")
            .bind(keys::DEVICE_ID)
            .fetch_one(&self.pool)
            .await?;

        Ok(id)
    }
}
