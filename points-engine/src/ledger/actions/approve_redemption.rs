//! ApproveRedemption command handler
//!
//! Pending -> Approved. At-pump redemptions take their deferred debit here,
//! inside the same transaction as the status flip. The status check and the
//! debit share one write transaction, so a retried approve can never debit
//! twice: the second attempt sees Approved and fails InvalidState.

use async_trait::async_trait;

use super::{entry_event, post_debit, redemption_event};
use crate::ledger::traits::{CommandContext, CommandHandler, CommandMetadata, LedgerError};
use shared::ledger::{EntryKind, LedgerEvent, LedgerEventKind, RedemptionStatus};
use shared::util::now_millis;

/// ApproveRedemption action
#[derive(Debug, Clone)]
pub struct ApproveRedemptionAction {
    pub redemption_id: String,
}

#[async_trait]
impl CommandHandler for ApproveRedemptionAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        let mut redemption = ctx.load_redemption(&self.redemption_id)?;

        if redemption.status != RedemptionStatus::Pending {
            return Err(LedgerError::InvalidState(format!(
                "cannot approve redemption in status {}",
                redemption.status
            )));
        }

        let mut events = Vec::new();

        // Deferred debit for at-pump redemptions
        if !redemption.debited {
            let entry = post_debit(
                ctx,
                metadata,
                redemption.account_id,
                redemption.points_used,
                EntryKind::Debit,
                "At-pump redemption".to_string(),
                None,
                Some(redemption.redemption_id.clone()),
            )?;
            redemption.debited = true;
            events.push(entry_event(
                metadata,
                LedgerEventKind::PointsDebited,
                &entry,
                Some(&redemption),
            ));
        }

        redemption.status = RedemptionStatus::Approved;
        redemption.approved_by = Some(metadata.operator_id.clone());
        redemption.updated_at = now_millis();
        ctx.save_redemption(redemption.clone());

        events.push(redemption_event(
            ctx,
            metadata,
            LedgerEventKind::RedemptionApproved,
            &redemption,
        ));
        Ok(events)
    }
}
