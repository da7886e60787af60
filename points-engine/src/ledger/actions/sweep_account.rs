//! SweepAccount command handler
//!
//! FIFO expiry for one account: every credit entry whose expiry date has
//! passed and whose points are not fully consumed yet gets expired, oldest
//! expiry first. Each swept entry produces an Expiry debit, and the *source*
//! credit entry's consumed counters advance so the same points are never
//! swept twice.
//!
//! The expired amount is capped at the account's available balance: spent
//! points cannot expire a second time, and the balance never goes negative.

use async_trait::async_trait;

use super::{entry_event, post_debit};
use crate::ledger::traits::{CommandContext, CommandHandler, CommandMetadata, LedgerError};
use shared::ledger::{EntryKind, LedgerEvent, LedgerEventKind};

/// SweepAccount action
#[derive(Debug, Clone)]
pub struct SweepAccountAction {
    pub account_id: i64,
    /// Sweep reference instant (Unix millis)
    pub now: i64,
}

#[async_trait]
impl CommandHandler for SweepAccountAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        // Accounts without a wallet never earned anything
        let wallet = match ctx.load_wallet(self.account_id) {
            Ok(wallet) => wallet,
            Err(LedgerError::AccountNotFound(_)) => return Ok(vec![]),
            Err(e) => return Err(e),
        };
        if wallet.available_points == 0 {
            return Ok(vec![]);
        }

        let due = ctx.expirable_entries(self.account_id, self.now)?;
        let mut events = Vec::new();

        for mut source in due {
            let available = ctx.load_wallet(self.account_id)?.available_points;
            if available == 0 {
                break;
            }
            let amount = source.remaining_points().min(available);
            if amount == 0 {
                continue;
            }

            let entry = post_debit(
                ctx,
                metadata,
                self.account_id,
                amount,
                EntryKind::Expiry,
                "Points expired".to_string(),
                None,
                None,
            )?;

            source.consumed_points += amount;
            source.consumed_at = Some(self.now);
            ctx.mark_consumed(source);

            events.push(entry_event(
                metadata,
                LedgerEventKind::PointsExpired,
                &entry,
                None,
            ));
        }

        Ok(events)
    }
}
