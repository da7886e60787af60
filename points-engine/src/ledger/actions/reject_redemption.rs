//! RejectRedemption command handler
//!
//! Pending -> Rejected, with a reason. Points debited at creation (catalog
//! path) come back as a Refund credit; at-pump redemptions that never
//! debited flip status only. Reward stock release happens in the manager
//! after commit.

use async_trait::async_trait;

use super::{entry_event, post_credit, redemption_event};
use crate::ledger::traits::{CommandContext, CommandHandler, CommandMetadata, LedgerError};
use shared::ledger::{EntryKind, LedgerEvent, LedgerEventKind, RedemptionStatus};
use shared::util::now_millis;

/// RejectRedemption action
#[derive(Debug, Clone)]
pub struct RejectRedemptionAction {
    pub redemption_id: String,
    pub reason: String,
}

#[async_trait]
impl CommandHandler for RejectRedemptionAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        if self.reason.trim().is_empty() {
            return Err(LedgerError::InvalidState(
                "rejection requires a reason".to_string(),
            ));
        }

        let mut redemption = ctx.load_redemption(&self.redemption_id)?;
        if redemption.status != RedemptionStatus::Pending {
            return Err(LedgerError::InvalidState(format!(
                "cannot reject redemption in status {}",
                redemption.status
            )));
        }

        let mut events = Vec::new();

        if redemption.debited {
            let entry = post_credit(
                ctx,
                metadata,
                redemption.account_id,
                redemption.points_used,
                EntryKind::Refund,
                format!("Redemption rejected: {}", self.reason),
                None,
                Some(redemption.redemption_id.clone()),
                None,
            )?;
            redemption.debited = false;
            events.push(entry_event(
                metadata,
                LedgerEventKind::PointsCredited,
                &entry,
                Some(&redemption),
            ));
        }

        redemption.status = RedemptionStatus::Rejected;
        redemption.rejected_reason = Some(self.reason.clone());
        redemption.updated_at = now_millis();
        ctx.save_redemption(redemption.clone());

        events.push(redemption_event(
            ctx,
            metadata,
            LedgerEventKind::RedemptionRejected,
            &redemption,
        ));
        Ok(events)
    }
}
