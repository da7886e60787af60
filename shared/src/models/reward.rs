//! Reward Catalog Model

use serde::{Deserialize, Serialize};

/// Reward stock model
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum RewardAvailability {
    Unlimited,
    Limited,
}

/// Reward catalog item
///
/// Invariant: `redeemed_quantity <= total_quantity` when availability is
/// Limited. The counter is claimed atomically at redemption creation and
/// released on rejection/cancellation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Reward {
    pub id: i64,
    pub name: String,
    pub points_required: i64,
    pub availability: RewardAvailability,
    /// Only meaningful when availability is Limited
    pub total_quantity: i64,
    pub redeemed_quantity: i64,
    /// Validity window (Unix millis, inclusive)
    pub valid_from: i64,
    pub valid_until: i64,
    pub is_active: bool,
    pub created_at: i64,
}

impl Reward {
    /// Whether the reward can be redeemed at `now` (active, in-date, in-stock)
    pub fn is_redeemable(&self, now: i64) -> bool {
        self.is_active
            && now >= self.valid_from
            && now <= self.valid_until
            && (self.availability == RewardAvailability::Unlimited
                || self.redeemed_quantity < self.total_quantity)
    }
}
