//! Campaign Repository
//!
//! Campaigns carry two JSON columns (categories, pump_ids), so reads go
//! through a private row struct before becoming the shared model.

use super::{RepoError, RepoResult};
use shared::models::{Campaign, CampaignConditions, CampaignKind, TransactionCategory};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

const COLUMNS: &str = "id, name, kind, multiplier, bonus_points, bonus_percentage, start_date, \
                       end_date, min_amount, categories, frequency_limit, pump_ids, \
                       applied_count, is_active, created_at";

/// Raw campaign row (JSON columns still serialized)
#[derive(Debug, sqlx::FromRow)]
struct CampaignRow {
    id: i64,
    name: String,
    kind: CampaignKind,
    multiplier: Option<f64>,
    bonus_points: Option<i64>,
    bonus_percentage: Option<f64>,
    start_date: i64,
    end_date: i64,
    min_amount: Option<f64>,
    categories: Option<String>,
    frequency_limit: Option<i64>,
    pump_ids: String,
    applied_count: i64,
    is_active: bool,
    created_at: i64,
}

impl TryFrom<CampaignRow> for Campaign {
    type Error = RepoError;

    fn try_from(row: CampaignRow) -> Result<Self, Self::Error> {
        let categories: Option<Vec<TransactionCategory>> = row
            .categories
            .as_deref()
            .map(|s| serde_json::from_str(s))
            .transpose()
            .map_err(|e| RepoError::Database(format!("Invalid categories JSON: {e}")))?;
        let pump_ids: Vec<String> = serde_json::from_str(&row.pump_ids)
            .map_err(|e| RepoError::Database(format!("Invalid pump_ids JSON: {e}")))?;

        Ok(Campaign {
            id: row.id,
            name: row.name,
            kind: row.kind,
            multiplier: row.multiplier,
            bonus_points: row.bonus_points,
            bonus_percentage: row.bonus_percentage,
            start_date: row.start_date,
            end_date: row.end_date,
            conditions: CampaignConditions {
                min_amount: row.min_amount,
                categories,
                frequency_limit: row.frequency_limit,
            },
            pump_ids,
            applied_count: row.applied_count,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

/// Create campaign payload
#[derive(Debug, Clone)]
pub struct CampaignCreate {
    pub name: String,
    pub kind: CampaignKind,
    pub multiplier: Option<f64>,
    pub bonus_points: Option<i64>,
    pub bonus_percentage: Option<f64>,
    pub start_date: i64,
    pub end_date: i64,
    pub conditions: CampaignConditions,
    pub pump_ids: Vec<String>,
}

#[derive(Clone)]
pub struct CampaignRepository {
    pool: SqlitePool,
}

impl CampaignRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Active campaigns whose validity window covers `now`, in creation
    /// order (the matcher's deterministic selection relies on it)
    pub async fn find_active(&self, now: i64) -> RepoResult<Vec<Campaign>> {
        let rows = sqlx::query_as::<_, CampaignRow>(&format!(
            "SELECT {COLUMNS} FROM campaign
             WHERE is_active = 1 AND start_date <= ?1 AND end_date >= ?1
             ORDER BY created_at, id",
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Campaign::try_from).collect()
    }

    pub async fn find_by_id(&self, id: i64) -> RepoResult<Option<Campaign>> {
        let row = sqlx::query_as::<_, CampaignRow>(&format!(
            "SELECT {COLUMNS} FROM campaign WHERE id = ?",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Campaign::try_from).transpose()
    }

    /// Create a new campaign
    ///
    /// The value field must match the kind (multiplier for Multiplier, etc.);
    /// the others stay NULL.
    pub async fn create(&self, data: CampaignCreate) -> RepoResult<Campaign> {
        let value_present = match data.kind {
            CampaignKind::Multiplier => data.multiplier.is_some(),
            CampaignKind::BonusPoints => data.bonus_points.is_some(),
            CampaignKind::BonusPercentage => data.bonus_percentage.is_some(),
        };
        if !value_present {
            return Err(RepoError::Validation(format!(
                "campaign kind {:?} requires its matching value field",
                data.kind
            )));
        }

        let id = snowflake_id();
        let categories = data
            .conditions
            .categories
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| RepoError::Database(e.to_string()))?;
        let pump_ids = serde_json::to_string(&data.pump_ids)
            .map_err(|e| RepoError::Database(e.to_string()))?;

        sqlx::query(
            "INSERT INTO campaign (id, name, kind, multiplier, bonus_points, bonus_percentage,
                                   start_date, end_date, min_amount, categories, frequency_limit,
                                   pump_ids, applied_count, is_active, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, 1, ?)",
        )
        .bind(id)
        .bind(&data.name)
        .bind(data.kind)
        .bind(data.multiplier)
        .bind(data.bonus_points)
        .bind(data.bonus_percentage)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(data.conditions.min_amount)
        .bind(categories)
        .bind(data.conditions.frequency_limit)
        .bind(pump_ids)
        .bind(now_millis())
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::Database("Failed to create campaign".to_string()))
    }

    /// Count one application against the campaign's frequency cap
    pub async fn increment_applied(&self, id: i64) -> RepoResult<()> {
        sqlx::query("UPDATE campaign SET applied_count = applied_count + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Deactivate a campaign
    pub async fn deactivate(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query("UPDATE campaign SET is_active = 0 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::test_pool;

    fn multiplier_campaign(name: &str, start: i64, end: i64) -> CampaignCreate {
        CampaignCreate {
            name: name.to_string(),
            kind: CampaignKind::Multiplier,
            multiplier: Some(2.0),
            bonus_points: None,
            bonus_percentage: None,
            start_date: start,
            end_date: end,
            conditions: CampaignConditions {
                min_amount: Some(100.0),
                categories: Some(vec![TransactionCategory::Fuel]),
                frequency_limit: None,
            },
            pump_ids: vec!["pump-1".to_string()],
        }
    }

    #[tokio::test]
    async fn test_create_roundtrips_json_columns() {
        let repo = CampaignRepository::new(test_pool().await);
        let campaign = repo
            .create(multiplier_campaign("Double Fuel", 0, i64::MAX))
            .await
            .unwrap();

        assert_eq!(campaign.kind, CampaignKind::Multiplier);
        assert_eq!(campaign.multiplier, Some(2.0));
        assert_eq!(campaign.pump_ids, vec!["pump-1".to_string()]);
        assert_eq!(
            campaign.conditions.categories,
            Some(vec![TransactionCategory::Fuel])
        );
        assert_eq!(campaign.conditions.min_amount, Some(100.0));
        assert!(campaign.is_active);
    }

    #[tokio::test]
    async fn test_find_active_filters_window() {
        let repo = CampaignRepository::new(test_pool().await);
        repo.create(multiplier_campaign("Past", 0, 10)).await.unwrap();
        repo.create(multiplier_campaign("Current", 0, i64::MAX))
            .await
            .unwrap();
        let expired = repo
            .create(multiplier_campaign("Disabled", 0, i64::MAX))
            .await
            .unwrap();
        repo.deactivate(expired.id).await.unwrap();

        let active = repo.find_active(1000).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Current");
    }

    #[tokio::test]
    async fn test_mismatched_value_field_rejected() {
        let repo = CampaignRepository::new(test_pool().await);
        let mut data = multiplier_campaign("Broken", 0, i64::MAX);
        data.multiplier = None;
        let result = repo.create(data).await;
        assert!(matches!(result, Err(RepoError::Validation(_))));
    }

    #[tokio::test]
    async fn test_increment_applied() {
        let repo = CampaignRepository::new(test_pool().await);
        let campaign = repo
            .create(multiplier_campaign("Counted", 0, i64::MAX))
            .await
            .unwrap();
        repo.increment_applied(campaign.id).await.unwrap();
        repo.increment_applied(campaign.id).await.unwrap();
        let loaded = repo.find_by_id(campaign.id).await.unwrap().unwrap();
        assert_eq!(loaded.applied_count, 2);
    }
}
