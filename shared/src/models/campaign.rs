//! Campaign Model

use super::transaction::TransactionCategory;
use serde::{Deserialize, Serialize};

/// Campaign kind enum
///
/// Exactly the value field matching the kind is set on [`Campaign`];
/// the others stay `None`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum CampaignKind {
    /// Scales base points: `floor(base * multiplier)`
    Multiplier,
    /// Adds a flat amount on top of base points
    BonusPoints,
    /// Adds `floor(base * pct / 100)` on top of base points
    BonusPercentage,
}

/// Business conditions a transaction must satisfy for a campaign to apply
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CampaignConditions {
    /// Minimum transaction amount
    pub min_amount: Option<f64>,
    /// Restrict to these categories (None/empty = all categories)
    pub categories: Option<Vec<TransactionCategory>>,
    /// Maximum number of applications across all accounts (None = unbounded)
    pub frequency_limit: Option<i64>,
}

/// Promotional campaign entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: i64,
    pub name: String,
    pub kind: CampaignKind,
    pub multiplier: Option<f64>,
    pub bonus_points: Option<i64>,
    pub bonus_percentage: Option<f64>,
    /// Validity window (Unix millis, inclusive)
    pub start_date: i64,
    pub end_date: i64,
    pub conditions: CampaignConditions,
    /// Pumps this campaign applies to (empty = every pump)
    pub pump_ids: Vec<String>,
    /// Times this campaign has been applied (checked against frequency_limit)
    pub applied_count: i64,
    pub is_active: bool,
    pub created_at: i64,
}

impl Campaign {
    /// Whether `now` falls inside the campaign's validity window
    pub fn is_in_window(&self, now: i64) -> bool {
        now >= self.start_date && now <= self.end_date
    }

    /// Whether the frequency cap (if any) still has headroom
    pub fn has_frequency_headroom(&self) -> bool {
        match self.conditions.frequency_limit {
            Some(limit) => self.applied_count < limit,
            None => true,
        }
    }
}

/// Snapshot of the campaign applied to a transaction (for audit/receipts)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppliedCampaign {
    pub campaign_id: i64,
    pub campaign_name: String,
    pub kind: CampaignKind,
    /// Points added (or delta from scaling) relative to the base award
    pub bonus_points: i64,
}
