//! CancelRedemption command handler
//!
//! Customer-initiated Pending -> Cancelled. Same refund semantics as
//! rejection, without a required reason.

use async_trait::async_trait;

use super::{entry_event, post_credit, redemption_event};
use crate::ledger::traits::{CommandContext, CommandHandler, CommandMetadata, LedgerError};
use shared::ledger::{EntryKind, LedgerEvent, LedgerEventKind, RedemptionStatus};
use shared::util::now_millis;

/// CancelRedemption action
#[derive(Debug, Clone)]
pub struct CancelRedemptionAction {
    pub redemption_id: String,
}

#[async_trait]
impl CommandHandler for CancelRedemptionAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        let mut redemption = ctx.load_redemption(&self.redemption_id)?;
        if redemption.status != RedemptionStatus::Pending {
            return Err(LedgerError::InvalidState(format!(
                "cannot cancel redemption in status {}",
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
                "Redemption cancelled".to_string(),
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

        redemption.status = RedemptionStatus::Cancelled;
        redemption.updated_at = now_millis();
        ctx.save_redemption(redemption.clone());

        events.push(redemption_event(
            ctx,
            metadata,
            LedgerEventKind::RedemptionCancelled,
            &redemption,
        ));
        Ok(events)
    }
}
