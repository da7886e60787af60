//! RedeemReward command handler
//!
//! Catalog redemption: the customer spends points on a reward. Points are
//! debited immediately at creation and the redemption starts Pending. The
//! reward's stock counter was already claimed atomically by the manager
//! before this transaction opened; a failure here rolls that claim back.

use async_trait::async_trait;

use super::{entry_event, post_debit, redemption_event};
use crate::ledger::traits::{CommandContext, CommandHandler, CommandMetadata, LedgerError};
use shared::ledger::{EntryKind, LedgerEvent, LedgerEventKind, Redemption, RedemptionStatus};
use shared::models::Reward;
use shared::util::now_millis;

/// RedeemReward action
///
/// `code` and `expiry_date` are pre-resolved by the manager (code generation
/// needs the committed uniqueness index; expiry comes from configuration).
#[derive(Debug, Clone)]
pub struct RedeemRewardAction {
    pub account_id: i64,
    pub reward: Reward,
    pub code: String,
    pub expiry_date: i64,
}

#[async_trait]
impl CommandHandler for RedeemRewardAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        let redemption_id = uuid::Uuid::new_v4().to_string();
        let now = now_millis();

        let entry = post_debit(
            ctx,
            metadata,
            self.account_id,
            self.reward.points_required,
            EntryKind::Debit,
            format!("Reward redemption: {}", self.reward.name),
            None,
            Some(redemption_id.clone()),
        )?;

        let redemption = Redemption {
            redemption_id,
            account_id: self.account_id,
            reward_id: Some(self.reward.id),
            points_used: self.reward.points_required,
            code: self.code.clone(),
            status: RedemptionStatus::Pending,
            debited: true,
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

        Ok(vec![
            entry_event(
                metadata,
                LedgerEventKind::PointsDebited,
                &entry,
                Some(&redemption),
            ),
            redemption_event(ctx, metadata, LedgerEventKind::RedemptionCreated, &redemption),
        ])
    }
}
