//! System Configuration Repository
//!
//! Singleton row; a missing row materializes as defaults on first read so a
//! fresh station works without seeding.

use super::{RepoError, RepoResult};
use shared::models::{PointsRates, SystemConfig};
use shared::util::now_millis;
use sqlx::SqlitePool;

#[derive(Debug, sqlx::FromRow)]
struct SystemConfigRow {
    points_rates: String,
    points_expiry_months: i64,
    points_expiry_notification_days: String,
    redemption_expiry_days: i64,
    updated_at: i64,
}

impl TryFrom<SystemConfigRow> for SystemConfig {
    type Error = RepoError;

    fn try_from(row: SystemConfigRow) -> Result<Self, Self::Error> {
        let points_rates: PointsRates = serde_json::from_str(&row.points_rates)
            .map_err(|e| RepoError::Database(format!("Invalid points_rates JSON: {e}")))?;
        let notification_days: Vec<u32> =
            serde_json::from_str(&row.points_expiry_notification_days)
                .map_err(|e| RepoError::Database(format!("Invalid notification days JSON: {e}")))?;
        Ok(SystemConfig {
            points_rates,
            points_expiry_months: row.points_expiry_months as u32,
            points_expiry_notification_days: notification_days,
            redemption_expiry_days: row.redemption_expiry_days as u32,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Clone)]
pub struct SystemConfigRepository {
    pool: SqlitePool,
}

impl SystemConfigRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Read the configuration, falling back to defaults when unset
    pub async fn get(&self) -> RepoResult<SystemConfig> {
        let row = sqlx::query_as::<_, SystemConfigRow>(
            "SELECT points_rates, points_expiry_months, points_expiry_notification_days,
                    redemption_expiry_days, updated_at
             FROM system_config WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => SystemConfig::try_from(row),
            None => Ok(SystemConfig::default()),
        }
    }

    /// Replace the configuration (upsert on the singleton row)
    pub async fn update(&self, config: &SystemConfig) -> RepoResult<SystemConfig> {
        let rates = serde_json::to_string(&config.points_rates)
            .map_err(|e| RepoError::Database(e.to_string()))?;
        let days = serde_json::to_string(&config.points_expiry_notification_days)
            .map_err(|e| RepoError::Database(e.to_string()))?;

        sqlx::query(
            "INSERT INTO system_config (id, points_rates, points_expiry_months,
                                        points_expiry_notification_days, redemption_expiry_days,
                                        updated_at)
             VALUES (1, ?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                 points_rates = ?1,
                 points_expiry_months = ?2,
                 points_expiry_notification_days = ?3,
                 redemption_expiry_days = ?4,
                 updated_at = ?5",
        )
        .bind(&rates)
        .bind(config.points_expiry_months as i64)
        .bind(&days)
        .bind(config.redemption_expiry_days as i64)
        .bind(now_millis())
        .execute(&self.pool)
        .await?;

        self.get().await
    }
}
