//! # Settings Repository
//!
//! Key/value rows of `system_settings`. Values are JSON text.

use sqlx::SqlitePool;
use tracing::warn;

use crate::error::DbResult;
use medstock_core::reminder::{ReminderConfig, REMINDER_SETTING_KEY};

/// Repository for system settings.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Reads a raw setting value.
    pub async fn get(&self, key: &str) -> DbResult<Option<String>> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM system_settings WHERE key = ?1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(value)
    }

    /// Writes a setting, replacing any previous value.
    pub async fn set(&self, key: &str, value: &str) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO system_settings (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Loads the reminder configuration.
    ///
    /// A missing or unparsable value yields the defaults.
    pub async fn reminder_config(&self) -> DbResult<ReminderConfig> {
        let Some(raw) = self.get(REMINDER_SETTING_KEY).await? else {
            return Ok(ReminderConfig::default());
        };

        match ReminderConfig::from_json(&raw) {
            Ok(config) => Ok(config),
            Err(e) => {
                warn!(error = %e, "Invalid reminder config, using defaults");
                Ok(ReminderConfig::default())
            }
        }
    }

    /// Stores the reminder configuration as JSON.
    pub async fn save_reminder_config(&self, config: &ReminderConfig) -> DbResult<()> {
        let raw = serde_json::to_string(config)
            .map_err(|e| crate::DbError::Internal(e.to_string()))?;
        self.set(REMINDER_SETTING_KEY, &raw).await
    }
}

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use medstock_core::reminder::{ReminderConfig, REMINDER_SETTING_KEY};

    #[tokio::test]
    async fn test_reminder_config_defaults_when_missing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert_eq!(
            db.settings().reminder_config().await.unwrap(),
            ReminderConfig::default()
        );
    }

    #[tokio::test]
    async fn test_reminder_config_round_trip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.settings()
            .set(REMINDER_SETTING_KEY, r#"{"enabled":true,"schedule_days":[7]}"#)
            .await
            .unwrap();

        let config = db.settings().reminder_config().await.unwrap();
        assert_eq!(config.schedule_days.into_iter().collect::<Vec<_>>(), vec![7]);

        db.settings()
            .save_reminder_config(&ReminderConfig::disabled())
            .await
            .unwrap();
        assert!(!db.settings().reminder_config().await.unwrap().enabled);
    }

    #[tokio::test]
    async fn test_garbage_value_falls_back() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.settings().set(REMINDER_SETTING_KEY, "not json").await.unwrap();
        assert!(db.settings().reminder_config().await.unwrap().enabled);
    }
}
