//! RedeemAtPump command handler
//!
//! Staff-mediated redemption of a raw point amount, not tied to a catalog
//! reward. Balance sufficiency is validated here but the debit itself is
//! deferred to approval; until then the points are only conceptually
//! reserved.

use async_trait::async_trait;

use super::redemption_event;
use crate::ledger::traits::{CommandContext, CommandHandler, CommandMetadata, LedgerError};
use shared::ledger::{LedgerEvent, LedgerEventKind, Redemption, RedemptionStatus};
use shared::util::now_millis;

/// RedeemAtPump action
#[derive(Debug, Clone)]
pub struct RedeemAtPumpAction {
    pub account_id: i64,
    pub points: i64,
    pub code: String,
    pub expiry_date: i64,
}

#[async_trait]
impl CommandHandler for RedeemAtPumpAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        if self.points <= 0 {
            return Err(LedgerError::InvalidAmount);
        }

        let wallet = ctx.load_wallet(self.account_id)?;
        if wallet.available_points < self.points {
            return Err(LedgerError::InsufficientBalance {
                available: wallet.available_points,
                requested: self.points,
            });
        }

        let now = now_millis();
        let redemption = Redemption {
            redemption_id: uuid::Uuid::new_v4().to_string(),
            account_id: self.account_id,
            reward_id: None,
            points_used: self.points,
            code: self.code.clone(),
            status: RedemptionStatus::Pending,
            debited: false,
            approved_by: None,
            used_at_pump: None,
            expiry_date: self.expiry_date,
            used_at: None,
            rejected_reason: None,
            created_by: metadata.operator_id.clone(),
            created_at: now,
            updated_at: now,
        };
        ctx.save_redemption(redemption.clone());

        Ok(vec![redemption_event(
            ctx,
            metadata,
            LedgerEventKind::RedemptionCreated,
            &redemption,
        )])
    }
}
