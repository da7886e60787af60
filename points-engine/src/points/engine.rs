//! Points Engine
//!
//! Combines base calculation and campaign selection into one award. Exactly
//! one campaign applies per transaction:
//!
//! - `Multiplier` scales base points
//! - `BonusPoints` adds a flat amount
//! - `BonusPercentage` adds `floor(base * pct / 100)`

use super::calculator;
use super::matcher;
use serde::{Deserialize, Serialize};
use shared::models::{AppliedCampaign, Campaign, CampaignKind, PointsRates, TransactionCategory};

/// Computed award for a transaction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PointsBreakdown {
    pub base_points: i64,
    /// Campaign applied, if any (with the delta it contributed)
    pub campaign: Option<AppliedCampaign>,
    pub total_points: i64,
}

/// Compute the points awarded for a transaction
pub fn compute_award(
    category: TransactionCategory,
    amount: f64,
    liters: f64,
    rates: &PointsRates,
    campaigns: &[Campaign],
    pump_id: &str,
    now: i64,
) -> PointsBreakdown {
    let base = calculator::base_points(category, amount, liters, rates);
    if base == 0 {
        // Campaigns modify earned points; nothing earned, nothing to modify
        return PointsBreakdown {
            base_points: 0,
            campaign: None,
            total_points: 0,
        };
    }

    let Some(campaign) = matcher::select_campaign(campaigns, pump_id, category, amount, now)
    else {
        return PointsBreakdown {
            base_points: base,
            campaign: None,
            total_points: base,
        };
    };

    let total = match campaign.kind {
        CampaignKind::Multiplier => {
            calculator::apply_multiplier(base, campaign.multiplier.unwrap_or(1.0))
        }
        CampaignKind::BonusPoints => base + campaign.bonus_points.unwrap_or(0).max(0),
        CampaignKind::BonusPercentage => {
            base + calculator::percentage_bonus(base, campaign.bonus_percentage.unwrap_or(0.0))
        }
    };

    PointsBreakdown {
        base_points: base,
        campaign: Some(AppliedCampaign {
            campaign_id: campaign.id,
            campaign_name: campaign.name.clone(),
            kind: campaign.kind,
            bonus_points: total - base,
        }),
        total_points: total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::CampaignConditions;

    fn rates() -> PointsRates {
        PointsRates {
            fuel_per_liter: 1.0,
            lubricant_per_100: 5.0,
            store_per_100: 5.0,
            service_per_100: 5.0,
        }
    }

    fn campaign(kind: CampaignKind) -> Campaign {
        Campaign {
            id: 1,
            name: "Monsoon Bonus".to_string(),
            kind,
            multiplier: matches!(kind, CampaignKind::Multiplier).then_some(2.0),
            bonus_points: matches!(kind, CampaignKind::BonusPoints).then_some(25),
            bonus_percentage: matches!(kind, CampaignKind::BonusPercentage).then_some(10.0),
            start_date: 0,
            end_date: i64::MAX,
            conditions: CampaignConditions::default(),
            pump_ids: vec![],
            applied_count: 0,
            is_active: true,
            created_at: 100,
        }
    }

    #[test]
    fn test_fuel_without_campaign() {
        let breakdown = compute_award(
            TransactionCategory::Fuel,
            2000.0,
            20.0,
            &rates(),
            &[],
            "pump-1",
            1000,
        );
        assert_eq!(breakdown.base_points, 20);
        assert!(breakdown.campaign.is_none());
        assert_eq!(breakdown.total_points, 20);
    }

    #[test]
    fn test_lubricant_without_campaign() {
        let breakdown = compute_award(
            TransactionCategory::Lubricant,
            250.0,
            0.0,
            &rates(),
            &[],
            "pump-1",
            1000,
        );
        assert_eq!(breakdown.total_points, 12);
    }

    #[test]
    fn test_multiplier_campaign_doubles_fuel_points() {
        let campaigns = vec![campaign(CampaignKind::Multiplier)];
        let breakdown = compute_award(
            TransactionCategory::Fuel,
            2000.0,
            20.0,
            &rates(),
            &campaigns,
            "pump-1",
            1000,
        );
        assert_eq!(breakdown.base_points, 20);
        assert_eq!(breakdown.total_points, 40);
        assert_eq!(breakdown.campaign.unwrap().bonus_points, 20);
    }

    #[test]
    fn test_bonus_percentage_campaign() {
        // Store ₹1000 → base 50; +10% → 55
        let campaigns = vec![campaign(CampaignKind::BonusPercentage)];
        let breakdown = compute_award(
            TransactionCategory::Store,
            1000.0,
            0.0,
            &rates(),
            &campaigns,
            "pump-1",
            1000,
        );
        assert_eq!(breakdown.base_points, 50);
        assert_eq!(breakdown.total_points, 55);
    }

    #[test]
    fn test_flat_bonus_campaign() {
        let campaigns = vec![campaign(CampaignKind::BonusPoints)];
        let breakdown = compute_award(
            TransactionCategory::Store,
            1000.0,
            0.0,
            &rates(),
            &campaigns,
            "pump-1",
            1000,
        );
        assert_eq!(breakdown.total_points, 75);
        assert_eq!(breakdown.campaign.unwrap().bonus_points, 25);
    }

    #[test]
    fn test_only_first_campaign_applies_no_stacking() {
        let mut second = campaign(CampaignKind::BonusPoints);
        second.id = 2;
        second.created_at = 200;
        let campaigns = vec![campaign(CampaignKind::Multiplier), second];

        let breakdown = compute_award(
            TransactionCategory::Fuel,
            2000.0,
            20.0,
            &rates(),
            &campaigns,
            "pump-1",
            1000,
        );
        // Oldest campaign (the multiplier) wins; the flat bonus never stacks
        assert_eq!(breakdown.total_points, 40);
        assert_eq!(breakdown.campaign.unwrap().campaign_id, 1);
    }

    #[test]
    fn test_zero_base_skips_campaigns() {
        let campaigns = vec![campaign(CampaignKind::BonusPoints)];
        let breakdown = compute_award(
            TransactionCategory::Fuel,
            500.0,
            0.0, // no liters recorded
            &rates(),
            &campaigns,
            "pump-1",
            1000,
        );
        assert_eq!(breakdown.total_points, 0);
        assert!(breakdown.campaign.is_none());
    }
}
