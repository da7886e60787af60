//! Reward Repository
//!
//! Stock claims are a single atomic UPDATE guarded at the storage layer, so
//! two concurrent catalog redemptions can never both take the last unit.

use super::{RepoError, RepoResult};
use shared::models::{Reward, RewardAvailability};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

const COLUMNS: &str = "id, name, points_required, availability, total_quantity, \
                       redeemed_quantity, valid_from, valid_until, is_active, created_at";

#[derive(Clone)]
pub struct RewardRepository {
    pool: SqlitePool,
}

impl RewardRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i64) -> RepoResult<Option<Reward>> {
        let row =
            sqlx::query_as::<_, Reward>(&format!("SELECT {COLUMNS} FROM reward WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row)
    }

    /// Claim one unit of stock; returns None when the reward is limited and
    /// exhausted. `redeemed_quantity <= total_quantity` is enforced here.
    pub async fn claim(&self, id: i64) -> RepoResult<Option<Reward>> {
        let result = sqlx::query(
            "UPDATE reward SET redeemed_quantity = redeemed_quantity + 1
             WHERE id = ? AND is_active = 1
               AND (availability = 'UNLIMITED' OR redeemed_quantity < total_quantity)",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    /// Hand a claimed unit back (rejection/cancellation, or an aborted
    /// redemption transaction)
    pub async fn release(&self, id: i64) -> RepoResult<()> {
        sqlx::query(
            "UPDATE reward SET redeemed_quantity = MAX(0, redeemed_quantity - 1) WHERE id = ?",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn create(
        &self,
        name: &str,
        points_required: i64,
        availability: RewardAvailability,
        total_quantity: i64,
        valid_from: i64,
        valid_until: i64,
    ) -> RepoResult<Reward> {
        let id = snowflake_id();
        sqlx::query(
            "INSERT INTO reward (id, name, points_required, availability, total_quantity,
                                 redeemed_quantity, valid_from, valid_until, is_active, created_at)
             VALUES (?, ?, ?, ?, ?, 0, ?, ?, 1, ?)",
        )
        .bind(id)
        .bind(name)
        .bind(points_required)
        .bind(availability)
        .bind(total_quantity)
        .bind(valid_from)
        .bind(valid_until)
        .bind(now_millis())
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::Database("Failed to create reward".to_string()))
    }
}
