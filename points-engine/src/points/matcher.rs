//! Campaign Matcher
//!
//! Pure filtering and selection of campaigns for a transaction. Selection is
//! deterministic: earliest `created_at` wins, id as tie-break. Exactly one
//! campaign applies per transaction; campaigns never stack.

use shared::models::{Campaign, TransactionCategory};

/// Check if a campaign applies to a transaction
pub fn is_applicable(
    campaign: &Campaign,
    pump_id: &str,
    category: TransactionCategory,
    amount: f64,
    now: i64,
) -> bool {
    if !campaign.is_active || !campaign.is_in_window(now) || !campaign.has_frequency_headroom() {
        return false;
    }

    // Pump scope: empty = every pump
    if !campaign.pump_ids.is_empty() && !campaign.pump_ids.iter().any(|p| p == pump_id) {
        return false;
    }

    if let Some(min_amount) = campaign.conditions.min_amount
        && amount < min_amount
    {
        return false;
    }

    if let Some(categories) = &campaign.conditions.categories
        && !categories.is_empty()
        && !categories.contains(&category)
    {
        return false;
    }

    true
}

/// All campaigns applicable to a transaction
pub fn find_applicable<'a>(
    campaigns: &'a [Campaign],
    pump_id: &str,
    category: TransactionCategory,
    amount: f64,
    now: i64,
) -> Vec<&'a Campaign> {
    campaigns
        .iter()
        .filter(|c| is_applicable(c, pump_id, category, amount, now))
        .collect()
}

/// Select the single campaign to apply: oldest creation first, id tie-break
pub fn select_campaign<'a>(
    campaigns: &'a [Campaign],
    pump_id: &str,
    category: TransactionCategory,
    amount: f64,
    now: i64,
) -> Option<&'a Campaign> {
    find_applicable(campaigns, pump_id, category, amount, now)
        .into_iter()
        .min_by_key(|c| (c.created_at, c.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{CampaignConditions, CampaignKind};

    fn make_campaign(id: i64, created_at: i64) -> Campaign {
        Campaign {
            id,
            name: format!("campaign-{id}"),
            kind: CampaignKind::Multiplier,
            multiplier: Some(2.0),
            bonus_points: None,
            bonus_percentage: None,
            start_date: 0,
            end_date: i64::MAX,
            conditions: CampaignConditions::default(),
            pump_ids: vec![],
            applied_count: 0,
            is_active: true,
            created_at,
        }
    }

    #[test]
    fn test_global_campaign_matches_any_pump() {
        let c = make_campaign(1, 100);
        assert!(is_applicable(&c, "pump-1", TransactionCategory::Fuel, 500.0, 1000));
        assert!(is_applicable(&c, "pump-9", TransactionCategory::Store, 500.0, 1000));
    }

    #[test]
    fn test_pump_scope() {
        let mut c = make_campaign(1, 100);
        c.pump_ids = vec!["pump-1".to_string(), "pump-2".to_string()];
        assert!(is_applicable(&c, "pump-1", TransactionCategory::Fuel, 500.0, 1000));
        assert!(!is_applicable(&c, "pump-3", TransactionCategory::Fuel, 500.0, 1000));
    }

    #[test]
    fn test_validity_window() {
        let mut c = make_campaign(1, 100);
        c.start_date = 1000;
        c.end_date = 2000;
        assert!(!is_applicable(&c, "pump-1", TransactionCategory::Fuel, 500.0, 999));
        assert!(is_applicable(&c, "pump-1", TransactionCategory::Fuel, 500.0, 1000));
        assert!(is_applicable(&c, "pump-1", TransactionCategory::Fuel, 500.0, 2000));
        assert!(!is_applicable(&c, "pump-1", TransactionCategory::Fuel, 500.0, 2001));
    }

    #[test]
    fn test_inactive_campaign_never_matches() {
        let mut c = make_campaign(1, 100);
        c.is_active = false;
        assert!(!is_applicable(&c, "pump-1", TransactionCategory::Fuel, 500.0, 1000));
    }

    #[test]
    fn test_min_amount_condition() {
        let mut c = make_campaign(1, 100);
        c.conditions.min_amount = Some(300.0);
        assert!(!is_applicable(&c, "pump-1", TransactionCategory::Fuel, 299.9, 1000));
        assert!(is_applicable(&c, "pump-1", TransactionCategory::Fuel, 300.0, 1000));
    }

    #[test]
    fn test_category_condition() {
        let mut c = make_campaign(1, 100);
        c.conditions.categories = Some(vec![TransactionCategory::Fuel]);
        assert!(is_applicable(&c, "pump-1", TransactionCategory::Fuel, 500.0, 1000));
        assert!(!is_applicable(&c, "pump-1", TransactionCategory::Store, 500.0, 1000));
    }

    #[test]
    fn test_frequency_limit_exhausted() {
        let mut c = make_campaign(1, 100);
        c.conditions.frequency_limit = Some(10);
        c.applied_count = 10;
        assert!(!is_applicable(&c, "pump-1", TransactionCategory::Fuel, 500.0, 1000));
        c.applied_count = 9;
        assert!(is_applicable(&c, "pump-1", TransactionCategory::Fuel, 500.0, 1000));
    }

    #[test]
    fn test_selection_is_deterministic_oldest_first() {
        // Same applicability; creation order decides, id breaks ties
        let campaigns = vec![
            make_campaign(3, 500),
            make_campaign(1, 200),
            make_campaign(2, 200),
        ];
        let selected =
            select_campaign(&campaigns, "pump-1", TransactionCategory::Fuel, 500.0, 1000).unwrap();
        assert_eq!(selected.id, 1);
    }

    #[test]
    fn test_no_match_selects_nothing() {
        let mut c = make_campaign(1, 100);
        c.conditions.min_amount = Some(10_000.0);
        let campaigns = vec![c];
        assert!(
            select_campaign(&campaigns, "pump-1", TransactionCategory::Fuel, 500.0, 1000).is_none()
        );
    }
}
