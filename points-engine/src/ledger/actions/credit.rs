//! Credit command handler
//!
//! Adds points to an account: transaction earnings (Credit), manual
//! corrections (Adjustment), or redemption refunds (Refund).

use async_trait::async_trait;

use super::{entry_event, post_credit};
use crate::ledger::traits::{CommandContext, CommandHandler, CommandMetadata, LedgerError};
use shared::ledger::{EntryKind, LedgerEvent, LedgerEventKind};

/// Credit action
///
/// `expiry_date` is resolved by the manager from system configuration
/// (`now + points_expiry_months`) before the transaction opens; it only
/// applies when `kind` is `Credit`.
#[derive(Debug, Clone)]
pub struct CreditAction {
    pub account_id: i64,
    pub points: i64,
    pub kind: EntryKind,
    pub reason: String,
    pub related_transaction_id: Option<String>,
    pub related_redemption_id: Option<String>,
    pub expiry_date: Option<i64>,
}

#[async_trait]
impl CommandHandler for CreditAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        let entry = post_credit(
            ctx,
            metadata,
            self.account_id,
            self.points,
            self.kind,
            self.reason.clone(),
            self.related_transaction_id.clone(),
            self.related_redemption_id.clone(),
            self.expiry_date,
        )?;

        Ok(vec![entry_event(
            metadata,
            LedgerEventKind::PointsCredited,
            &entry,
            None,
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::actions::test_support::{seed_wallet, test_metadata};
    use crate::ledger::storage::LedgerStorage;
    use crate::ledger::traits::CommandContext;
    use shared::util::now_millis;

    fn credit_action(points: i64, kind: EntryKind) -> CreditAction {
        CreditAction {
            account_id: 1,
            points,
            kind,
            reason: "Fuel transaction".to_string(),
            related_transaction_id: Some("txn-1".to_string()),
            related_redemption_id: None,
            expiry_date: Some(now_millis() + 86_400_000),
        }
    }

    #[tokio::test]
    async fn test_credit_creates_wallet_and_entry() {
        let storage = LedgerStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);
        let metadata = test_metadata();

        let events = credit_action(100, EntryKind::Credit)
            .execute(&mut ctx, &metadata)
            .await
            .unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, LedgerEventKind::PointsCredited);
        let entry = events[0].entry.as_ref().unwrap();
        assert_eq!(entry.points, 100);
        assert_eq!(entry.balance_after, 100);
        assert!(entry.expiry_date.is_some());

        let wallet = ctx.staged_wallet(1).unwrap();
        assert_eq!(wallet.total_earned, 100);
        assert_eq!(wallet.available_points, 100);
    }

    #[tokio::test]
    async fn test_refund_has_no_expiry_and_unwinds_redeemed() {
        let storage = LedgerStorage::open_in_memory().unwrap();
        seed_wallet(&storage, 1, 500);

        // Move 200 into the redeemed bucket first
        {
            let txn = storage.begin_write().unwrap();
            let mut ctx = CommandContext::new(&txn, &storage, 1);
            let metadata = test_metadata();
            crate::ledger::actions::post_debit(
                &mut ctx,
                &metadata,
                1,
                200,
                EntryKind::Debit,
                "redeem".to_string(),
                None,
                None,
            )
            .unwrap();
            for wallet in ctx.staged_wallets() {
                storage.store_wallet(&txn, wallet).unwrap();
            }
            for entry in ctx.staged_entries() {
                storage.store_entry(&txn, entry).unwrap();
            }
            txn.commit().unwrap();
        }

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 2);
        let metadata = test_metadata();
        let events = credit_action(200, EntryKind::Refund)
            .execute(&mut ctx, &metadata)
            .await
            .unwrap();

        let entry = events[0].entry.as_ref().unwrap();
        assert!(entry.expiry_date.is_none(), "refunds must not age out");

        let wallet = ctx.staged_wallet(1).unwrap();
        assert_eq!(wallet.available_points, 500);
        assert_eq!(wallet.redeemed_points, 0);
        assert!(wallet.is_consistent());
    }

    #[tokio::test]
    async fn test_zero_and_negative_points_rejected() {
        let storage = LedgerStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let metadata = test_metadata();

        let mut ctx = CommandContext::new(&txn, &storage, 0);
        let result = credit_action(0, EntryKind::Credit)
            .execute(&mut ctx, &metadata)
            .await;
        assert!(matches!(result, Err(LedgerError::InvalidAmount)));

        let mut ctx = CommandContext::new(&txn, &storage, 0);
        let result = credit_action(-50, EntryKind::Credit)
            .execute(&mut ctx, &metadata)
            .await;
        assert!(matches!(result, Err(LedgerError::InvalidAmount)));
    }

    #[tokio::test]
    async fn test_debit_kind_rejected() {
        let storage = LedgerStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);
        let metadata = test_metadata();

        let result = credit_action(50, EntryKind::Debit)
            .execute(&mut ctx, &metadata)
            .await;
        assert!(matches!(result, Err(LedgerError::InvalidState(_))));
    }
}
