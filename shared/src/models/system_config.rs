//! System Configuration Model
//!
//! Business configuration served through a bounded-TTL cache so that rate
//! changes become visible within seconds. Rates are configuration values,
//! never constants.

use super::transaction::TransactionCategory;
use serde::{Deserialize, Serialize};

/// Earning rates per transaction category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PointsRates {
    /// Points per liter of fuel
    pub fuel_per_liter: f64,
    /// Points per 100 currency units of lubricant
    pub lubricant_per_100: f64,
    /// Points per 100 currency units of store purchases
    pub store_per_100: f64,
    /// Points per 100 currency units of services
    pub service_per_100: f64,
}

impl PointsRates {
    /// Rate applicable to a category. Fuel is per-liter, the rest per-100.
    pub fn rate_for(&self, category: TransactionCategory) -> f64 {
        match category {
            TransactionCategory::Fuel => self.fuel_per_liter,
            TransactionCategory::Lubricant => self.lubricant_per_100,
            TransactionCategory::Store => self.store_per_100,
            TransactionCategory::Service => self.service_per_100,
        }
    }
}

impl Default for PointsRates {
    fn default() -> Self {
        Self {
            fuel_per_liter: 1.0,
            lubricant_per_100: 5.0,
            store_per_100: 5.0,
            service_per_100: 5.0,
        }
    }
}

/// Station-wide business configuration (singleton row)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    pub points_rates: PointsRates,
    /// Months until earned credits expire
    pub points_expiry_months: u32,
    /// Days before expiry at which to warn account holders
    pub points_expiry_notification_days: Vec<u32>,
    /// Days a redemption code stays valid after creation
    pub redemption_expiry_days: u32,
    pub updated_at: i64,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            points_rates: PointsRates::default(),
            points_expiry_months: 12,
            points_expiry_notification_days: vec![30, 7, 1],
            redemption_expiry_days: 30,
            updated_at: 0,
        }
    }
}
