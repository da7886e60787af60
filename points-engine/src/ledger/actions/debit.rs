//! Debit command handler
//!
//! Removes points from an account. The entry is stored with a negative
//! points value so summing an account's entries reconstructs its balance.

use async_trait::async_trait;

use super::{entry_event, post_debit};
use crate::ledger::traits::{CommandContext, CommandHandler, CommandMetadata, LedgerError};
use shared::ledger::{EntryKind, LedgerEvent, LedgerEventKind};

/// Debit action
#[derive(Debug, Clone)]
pub struct DebitAction {
    pub account_id: i64,
    pub points: i64,
    pub kind: EntryKind,
    pub reason: String,
    pub related_transaction_id: Option<String>,
    pub related_redemption_id: Option<String>,
}

#[async_trait]
impl CommandHandler for DebitAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        let entry = post_debit(
            ctx,
            metadata,
            self.account_id,
            self.points,
            self.kind,
            self.reason.clone(),
            self.related_transaction_id.clone(),
            self.related_redemption_id.clone(),
        )?;

        let event_kind = if self.kind == EntryKind::Expiry {
            LedgerEventKind::PointsExpired
        } else {
            LedgerEventKind::PointsDebited
        };
        Ok(vec![entry_event(metadata, event_kind, &entry, None)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::actions::test_support::{seed_wallet, test_metadata};
    use crate::ledger::storage::LedgerStorage;
    use crate::ledger::traits::CommandContext;

    fn debit_action(points: i64) -> DebitAction {
        DebitAction {
            account_id: 1,
            points,
            kind: EntryKind::Debit,
            reason: "At-pump discount".to_string(),
            related_transaction_id: None,
            related_redemption_id: None,
        }
    }

    #[tokio::test]
    async fn test_debit_stores_negative_points() {
        let storage = LedgerStorage::open_in_memory().unwrap();
        seed_wallet(&storage, 1, 1000);

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 1);
        let metadata = test_metadata();

        let events = debit_action(300).execute(&mut ctx, &metadata).await.unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, LedgerEventKind::PointsDebited);
        let entry = events[0].entry.as_ref().unwrap();
        assert_eq!(entry.points, -300);
        assert_eq!(entry.balance_after, 700);

        let wallet = ctx.staged_wallet(1).unwrap();
        assert_eq!(wallet.available_points, 700);
        assert_eq!(wallet.redeemed_points, 300);
    }

    #[tokio::test]
    async fn test_overdraft_rejected() {
        let storage = LedgerStorage::open_in_memory().unwrap();
        seed_wallet(&storage, 1, 100);

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 1);
        let metadata = test_metadata();

        let result = debit_action(101).execute(&mut ctx, &metadata).await;
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientBalance {
                available: 100,
                requested: 101
            })
        ));
        // Nothing staged on failure
        assert!(ctx.staged_entries().is_empty());
    }

    #[tokio::test]
    async fn test_exact_balance_debit_succeeds() {
        let storage = LedgerStorage::open_in_memory().unwrap();
        seed_wallet(&storage, 1, 100);

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 1);
        let metadata = test_metadata();

        let events = debit_action(100).execute(&mut ctx, &metadata).await.unwrap();
        assert_eq!(events[0].entry.as_ref().unwrap().balance_after, 0);
    }

    #[tokio::test]
    async fn test_debit_unknown_account_fails() {
        let storage = LedgerStorage::open_in_memory().unwrap();

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);
        let metadata = test_metadata();

        let result = debit_action(10).execute(&mut ctx, &metadata).await;
        assert!(matches!(result, Err(LedgerError::AccountNotFound(1))));
    }

    #[tokio::test]
    async fn test_expiry_kind_maps_to_expired_event() {
        let storage = LedgerStorage::open_in_memory().unwrap();
        seed_wallet(&storage, 1, 50);

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 1);
        let metadata = test_metadata();

        let action = DebitAction {
            account_id: 1,
            points: 50,
            kind: EntryKind::Expiry,
            reason: "Points expired".to_string(),
            related_transaction_id: None,
            related_redemption_id: None,
        };
        let events = action.execute(&mut ctx, &metadata).await.unwrap();
        assert_eq!(events[0].kind, LedgerEventKind::PointsExpired);

        let wallet = ctx.staged_wallet(1).unwrap();
        assert_eq!(wallet.expired_points, 50);
        assert_eq!(wallet.available_points, 0);
    }
}
