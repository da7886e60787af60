//! Points Calculator
//!
//! Pure mapping from (category, amount, liters) to base points. Uses
//! rust_decimal internally and floors at the edges; rates come from system
//! configuration, never constants.

use rust_decimal::prelude::*;
use shared::models::{PointsRates, TransactionCategory};

/// Convert f64 to Decimal for calculation
#[inline]
fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Floor a Decimal down to whole points
#[inline]
fn floor_points(value: Decimal) -> i64 {
    value.floor().to_i64().unwrap_or(0).max(0)
}

/// Base points for a transaction, before any campaign
///
/// - Fuel earns per liter: `floor(liters * rate_per_liter)`. Zero or
///   negative liters yields 0 points; that is a non-fatal business rule
///   (the transaction itself stays valid), not an error.
/// - Other categories earn per 100 currency units:
///   `floor(amount / 100 * rate_per_100)`.
pub fn base_points(
    category: TransactionCategory,
    amount: f64,
    liters: f64,
    rates: &PointsRates,
) -> i64 {
    match category {
        TransactionCategory::Fuel => {
            if liters <= 0.0 {
                tracing::warn!(amount, liters, "Fuel transaction without liters earns no points");
                return 0;
            }
            floor_points(to_decimal(liters) * to_decimal(rates.fuel_per_liter))
        }
        _ => {
            if amount <= 0.0 {
                return 0;
            }
            let per_hundred = to_decimal(amount) / Decimal::ONE_HUNDRED;
            floor_points(per_hundred * to_decimal(rates.rate_for(category)))
        }
    }
}

/// Scale base points by a campaign multiplier: `floor(base * multiplier)`
pub fn apply_multiplier(base: i64, multiplier: f64) -> i64 {
    floor_points(Decimal::from(base) * to_decimal(multiplier))
}

/// Percentage bonus on top of base points: `floor(base * pct / 100)`
pub fn percentage_bonus(base: i64, percentage: f64) -> i64 {
    floor_points(Decimal::from(base) * to_decimal(percentage) / Decimal::ONE_HUNDRED)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rates() -> PointsRates {
        PointsRates {
            fuel_per_liter: 1.0,
            lubricant_per_100: 5.0,
            store_per_100: 5.0,
            service_per_100: 5.0,
        }
    }

    #[test]
    fn test_fuel_per_liter() {
        // 20 liters at 1 pt/liter
        assert_eq!(
            base_points(TransactionCategory::Fuel, 2000.0, 20.0, &rates()),
            20
        );
    }

    #[test]
    fn test_fuel_fractional_liters_floor() {
        assert_eq!(
            base_points(TransactionCategory::Fuel, 0.0, 12.8, &rates()),
            12
        );
    }

    #[test]
    fn test_fuel_without_liters_earns_nothing() {
        assert_eq!(base_points(TransactionCategory::Fuel, 500.0, 0.0, &rates()), 0);
        assert_eq!(
            base_points(TransactionCategory::Fuel, 500.0, -3.0, &rates()),
            0
        );
    }

    #[test]
    fn test_lubricant_per_hundred() {
        // ₹250 at 5 pt/₹100: floor(2.5 * 5) = 12
        assert_eq!(
            base_points(TransactionCategory::Lubricant, 250.0, 0.0, &rates()),
            12
        );
    }

    #[test]
    fn test_store_and_service_use_their_rates() {
        let mut rates = rates();
        rates.store_per_100 = 3.0;
        rates.service_per_100 = 7.0;
        assert_eq!(base_points(TransactionCategory::Store, 1000.0, 0.0, &rates), 30);
        assert_eq!(
            base_points(TransactionCategory::Service, 1000.0, 0.0, &rates),
            70
        );
    }

    #[test]
    fn test_zero_amount_earns_nothing() {
        assert_eq!(base_points(TransactionCategory::Store, 0.0, 0.0, &rates()), 0);
        assert_eq!(
            base_points(TransactionCategory::Store, -10.0, 0.0, &rates()),
            0
        );
    }

    #[test]
    fn test_multiplier_floors() {
        assert_eq!(apply_multiplier(20, 2.0), 40);
        assert_eq!(apply_multiplier(15, 1.5), 22); // floor(22.5)
        assert_eq!(apply_multiplier(0, 3.0), 0);
    }

    #[test]
    fn test_percentage_bonus_floors() {
        assert_eq!(percentage_bonus(50, 10.0), 5);
        assert_eq!(percentage_bonus(55, 10.0), 5); // floor(5.5)
        assert_eq!(percentage_bonus(50, 0.0), 0);
    }
}
