//! UseRedemption command handler
//!
//! A pump presents a redemption code for verification and consumption.
//! Approved + in-date codes become Used. Expiry is lazy: presenting a code
//! past its expiry date flips the record to Expired and the transition is
//! committed even though the caller gets an Expired failure (the manager
//! turns the `RedemptionExpired` event into the error response).

use async_trait::async_trait;

use super::redemption_event;
use crate::ledger::traits::{CommandContext, CommandHandler, CommandMetadata, LedgerError};
use shared::ledger::{LedgerEvent, LedgerEventKind, RedemptionStatus};
use shared::util::now_millis;

/// UseRedemption action
#[derive(Debug, Clone)]
pub struct UseRedemptionAction {
    pub code: String,
    pub pump_id: String,
}

#[async_trait]
impl CommandHandler for UseRedemptionAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        let mut redemption = ctx.find_redemption_by_code(&self.code)?;
        let now = now_millis();

        match redemption.status {
            RedemptionStatus::Used => {
                return Err(LedgerError::AlreadyUsed(self.code.clone()));
            }
            RedemptionStatus::Expired => {
                return Err(LedgerError::Expired(self.code.clone()));
            }
            RedemptionStatus::Rejected | RedemptionStatus::Cancelled => {
                return Err(LedgerError::InvalidState(format!(
                    "code {} belongs to a {} redemption",
                    self.code, redemption.status
                )));
            }
            RedemptionStatus::Pending | RedemptionStatus::Approved => {}
        }

        // Lazy expiry: no timer ever ran, the code decides its fate when shown
        if now > redemption.expiry_date {
            redemption.status = RedemptionStatus::Expired;
            redemption.updated_at = now;
            ctx.save_redemption(redemption.clone());
            return Ok(vec![redemption_event(
                ctx,
                metadata,
                LedgerEventKind::RedemptionExpired,
                &redemption,
            )]);
        }

        if redemption.status == RedemptionStatus::Pending {
            return Err(LedgerError::InvalidState(format!(
                "code {} has not been approved yet",
                self.code
            )));
        }

        redemption.status = RedemptionStatus::Used;
        redemption.used_at = Some(now);
        redemption.used_at_pump = Some(self.pump_id.clone());
        redemption.updated_at = now;
        ctx.save_redemption(redemption.clone());

        Ok(vec![redemption_event(
            ctx,
            metadata,
            LedgerEventKind::RedemptionUsed,
            &redemption,
        )])
    }
}
