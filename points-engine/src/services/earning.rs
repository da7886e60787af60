//! Earning Service
//!
//! The transaction-to-points flow: resolve the account, match campaigns,
//! compute the award, credit the ledger. Campaign application counting is
//! best-effort after the credit commits; a counting failure is logged, never
//! surfaced.

use crate::db::repository::{AccountRepository, CampaignRepository, RepoError};
use crate::ledger::LedgerManager;
use crate::points::{PointsBreakdown, compute_award};
use crate::services::ConfigService;
use shared::ledger::{EntryKind, LedgerCommand, LedgerCommandPayload, WalletSummary};
use shared::models::TransactionCategory;
use shared::util::now_millis;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EarningError {
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Account is inactive: {0}")]
    AccountInactive(String),

    #[error("Catalog error: {0}")]
    Repo(#[from] RepoError),

    #[error("Ledger rejected credit: {0}")]
    Command(String),
}

/// One pump transaction to award points for
#[derive(Debug, Clone)]
pub struct EarnRequest {
    /// Free-form account identifier: loyalty id, mobile, or internal id
    pub identifier: String,
    pub pump_id: String,
    pub category: TransactionCategory,
    pub amount: f64,
    /// Liters dispensed; only meaningful for fuel
    pub liters: f64,
    pub transaction_id: String,
    pub operator_id: String,
    pub operator_name: String,
}

/// Award result with the updated wallet for the caller's audit sink
#[derive(Debug, Clone)]
pub struct EarnOutcome {
    pub account_id: i64,
    pub breakdown: PointsBreakdown,
    pub wallet: Option<WalletSummary>,
}

pub struct EarningService {
    accounts: AccountRepository,
    campaigns: CampaignRepository,
    config: Arc<ConfigService>,
    manager: LedgerManager,
}

impl EarningService {
    pub fn new(
        accounts: AccountRepository,
        campaigns: CampaignRepository,
        config: Arc<ConfigService>,
        manager: LedgerManager,
    ) -> Self {
        Self {
            accounts,
            campaigns,
            config,
            manager,
        }
    }

    /// Award points for a transaction
    pub async fn record_transaction(&self, req: EarnRequest) -> Result<EarnOutcome, EarningError> {
        let account = self
            .accounts
            .resolve(&req.identifier)
            .await?
            .ok_or_else(|| EarningError::AccountNotFound(req.identifier.clone()))?;
        if !account.is_active {
            return Err(EarningError::AccountInactive(req.identifier.clone()));
        }

        let now = now_millis();
        let config = self.config.get().await;
        let campaigns = self.campaigns.find_active(now).await?;
        let breakdown = compute_award(
            req.category,
            req.amount,
            req.liters,
            &config.points_rates,
            &campaigns,
            &req.pump_id,
            now,
        );

        // Zero points is a valid outcome (e.g. fuel with no liters recorded),
        // not an error; nothing is written
        if breakdown.total_points == 0 {
            tracing::info!(
                account_id = account.id,
                transaction_id = %req.transaction_id,
                "Transaction earned no points"
            );
            return Ok(EarnOutcome {
                account_id: account.id,
                breakdown,
                wallet: self.manager.get_wallet(account.id).ok(),
            });
        }

        let reason = match breakdown.campaign.as_ref() {
            Some(campaign) => format!(
                "{} transaction at {} ({})",
                req.category, req.pump_id, campaign.campaign_name
            ),
            None => format!("{} transaction at {}", req.category, req.pump_id),
        };
        let cmd = LedgerCommand::new(
            req.operator_id.clone(),
            req.operator_name.clone(),
            LedgerCommandPayload::Credit {
                account_id: account.id,
                points: breakdown.total_points,
                kind: EntryKind::Credit,
                reason,
                related_transaction_id: Some(req.transaction_id.clone()),
                related_redemption_id: None,
            },
        );
        let response = self.manager.execute(cmd).await;
        if !response.success {
            let message = response
                .error
                .map(|e| e.message)
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(EarningError::Command(message));
        }

        // Best-effort frequency counting, after the credit is committed
        if let Some(campaign) = &breakdown.campaign
            && let Err(e) = self.campaigns.increment_applied(campaign.campaign_id).await
        {
            tracing::warn!(
                campaign_id = campaign.campaign_id,
                error = %e,
                "Campaign application count not recorded (ignored)"
            );
        }

        Ok(EarnOutcome {
            account_id: account.id,
            breakdown,
            wallet: response.wallet,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::campaign::CampaignCreate;
    use crate::db::repository::test_support::test_pool;
    use crate::db::repository::SystemConfigRepository;
    use crate::ledger::LedgerStorage;
    use shared::models::{AccountRole, CampaignConditions, CampaignKind};
    use std::time::Duration;

    async fn make_service() -> (EarningService, AccountRepository, CampaignRepository) {
        let pool = test_pool().await;
        let accounts = AccountRepository::new(pool.clone());
        let campaigns = CampaignRepository::new(pool.clone());
        let config = Arc::new(ConfigService::new(
            SystemConfigRepository::new(pool.clone()),
            Duration::from_secs(60),
        ));
        let manager = LedgerManager::new(LedgerStorage::open_in_memory().unwrap());
        let service = EarningService::new(
            accounts.clone(),
            campaigns.clone(),
            config,
            manager,
        );
        (service, accounts, campaigns)
    }

    fn fuel_request(identifier: &str, liters: f64) -> EarnRequest {
        EarnRequest {
            identifier: identifier.to_string(),
            pump_id: "pump-1".to_string(),
            category: TransactionCategory::Fuel,
            amount: liters * 100.0,
            liters,
            transaction_id: uuid::Uuid::new_v4().to_string(),
            operator_id: "staff-1".to_string(),
            operator_name: "Station Staff".to_string(),
        }
    }

    #[tokio::test]
    async fn test_earn_without_campaign() {
        let (service, accounts, _) = make_service().await;
        accounts
            .create("FLT-1", "Asha", "111", AccountRole::Customer)
            .await
            .unwrap();

        let outcome = service
            .record_transaction(fuel_request("FLT-1", 20.0))
            .await
            .unwrap();

        assert_eq!(outcome.breakdown.total_points, 20);
        assert!(outcome.breakdown.campaign.is_none());
        assert_eq!(outcome.wallet.unwrap().available_points, 20);
    }

    #[tokio::test]
    async fn test_earn_with_multiplier_campaign_counts_application() {
        let (service, accounts, campaigns) = make_service().await;
        accounts
            .create("FLT-1", "Asha", "111", AccountRole::Customer)
            .await
            .unwrap();
        let campaign = campaigns
            .create(CampaignCreate {
                name: "Double Fuel".to_string(),
                kind: CampaignKind::Multiplier,
                multiplier: Some(2.0),
                bonus_points: None,
                bonus_percentage: None,
                start_date: 0,
                end_date: i64::MAX,
                conditions: CampaignConditions::default(),
                pump_ids: vec![],
            })
            .await
            .unwrap();

        let outcome = service
            .record_transaction(fuel_request("FLT-1", 20.0))
            .await
            .unwrap();

        assert_eq!(outcome.breakdown.total_points, 40);
        assert_eq!(
            outcome.breakdown.campaign.as_ref().unwrap().campaign_id,
            campaign.id
        );
        let loaded = campaigns.find_by_id(campaign.id).await.unwrap().unwrap();
        assert_eq!(loaded.applied_count, 1);
    }

    #[tokio::test]
    async fn test_unknown_account_fails() {
        let (service, _, _) = make_service().await;
        let result = service.record_transaction(fuel_request("nobody", 10.0)).await;
        assert!(matches!(result, Err(EarningError::AccountNotFound(_))));
    }

    #[tokio::test]
    async fn test_inactive_account_fails() {
        let (service, accounts, _) = make_service().await;
        let account = accounts
            .create("FLT-1", "Asha", "111", AccountRole::Customer)
            .await
            .unwrap();
        accounts.deactivate(account.id).await.unwrap();

        let result = service.record_transaction(fuel_request("FLT-1", 10.0)).await;
        assert!(matches!(result, Err(EarningError::AccountInactive(_))));
    }

    #[tokio::test]
    async fn test_zero_point_transaction_writes_nothing() {
        let (service, accounts, _) = make_service().await;
        accounts
            .create("FLT-1", "Asha", "111", AccountRole::Customer)
            .await
            .unwrap();

        let outcome = service
            .record_transaction(fuel_request("FLT-1", 0.0))
            .await
            .unwrap();

        assert_eq!(outcome.breakdown.total_points, 0);
        assert!(outcome.wallet.is_none(), "no wallet should exist yet");
    }
}
