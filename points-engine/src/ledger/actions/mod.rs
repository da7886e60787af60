//! Command action implementations
//!
//! Each action implements the `CommandHandler` trait and handles one
//! specific command type. Shared posting helpers live here: every credit or
//! debit flows through `post_credit`/`post_debit`, which validate the
//! amount, apply the wallet bucket, and stage the entry with its balance
//! snapshot in one step.

use async_trait::async_trait;

use crate::ledger::traits::{CommandContext, CommandHandler, CommandMetadata, LedgerError};
use crate::ledger::wallet::apply_delta;
use shared::ledger::{EntryKind, LedgerEntry, LedgerEvent, LedgerEventKind, Redemption};
use shared::util::now_millis;

mod approve_redemption;
mod cancel_redemption;
mod credit;
mod debit;
mod redeem_at_pump;
mod redeem_reward;
mod reject_redemption;
mod sweep_account;
mod use_redemption;

pub use approve_redemption::ApproveRedemptionAction;
pub use cancel_redemption::CancelRedemptionAction;
pub use credit::CreditAction;
pub use debit::DebitAction;
pub use redeem_at_pump::RedeemAtPumpAction;
pub use redeem_reward::RedeemRewardAction;
pub use reject_redemption::RejectRedemptionAction;
pub use sweep_account::SweepAccountAction;
pub use use_redemption::UseRedemptionAction;

/// CommandAction enum - dispatches to concrete action implementations
pub enum CommandAction {
    Credit(CreditAction),
    Debit(DebitAction),
    RedeemReward(RedeemRewardAction),
    RedeemAtPump(RedeemAtPumpAction),
    ApproveRedemption(ApproveRedemptionAction),
    RejectRedemption(RejectRedemptionAction),
    UseRedemption(UseRedemptionAction),
    CancelRedemption(CancelRedemptionAction),
    SweepAccount(SweepAccountAction),
}

#[async_trait]
impl CommandHandler for CommandAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        match self {
            CommandAction::Credit(action) => action.execute(ctx, metadata).await,
            CommandAction::Debit(action) => action.execute(ctx, metadata).await,
            CommandAction::RedeemReward(action) => action.execute(ctx, metadata).await,
            CommandAction::RedeemAtPump(action) => action.execute(ctx, metadata).await,
            CommandAction::ApproveRedemption(action) => action.execute(ctx, metadata).await,
            CommandAction::RejectRedemption(action) => action.execute(ctx, metadata).await,
            CommandAction::UseRedemption(action) => action.execute(ctx, metadata).await,
            CommandAction::CancelRedemption(action) => action.execute(ctx, metadata).await,
            CommandAction::SweepAccount(action) => action.execute(ctx, metadata).await,
        }
    }
}

// ============================================================================
// Posting helpers
// ============================================================================

/// Validate and stage a credit-like entry, updating the wallet in lockstep
#[allow(clippy::too_many_arguments)]
pub(crate) fn post_credit(
    ctx: &mut CommandContext<'_>,
    metadata: &CommandMetadata,
    account_id: i64,
    points: i64,
    kind: EntryKind,
    reason: String,
    related_transaction_id: Option<String>,
    related_redemption_id: Option<String>,
    expiry_date: Option<i64>,
) -> Result<LedgerEntry, LedgerError> {
    if points <= 0 {
        return Err(LedgerError::InvalidAmount);
    }
    if !kind.is_credit_like() {
        return Err(LedgerError::InvalidState(format!(
            "{kind} is not a credit kind"
        )));
    }

    let mut wallet = ctx.load_or_create_wallet(account_id)?;
    let seq = ctx.next_sequence();
    let now = now_millis();
    apply_delta(&mut wallet, kind, points, seq, now);

    let entry = LedgerEntry {
        entry_id: uuid::Uuid::new_v4().to_string(),
        sequence: seq,
        account_id,
        kind,
        points,
        balance_after: wallet.available_points,
        // Only earned credits age out; refunds and adjustments do not
        expiry_date: if kind == EntryKind::Credit {
            expiry_date
        } else {
            None
        },
        consumed_points: 0,
        consumed_at: None,
        related_transaction_id,
        related_redemption_id,
        reason,
        created_by: metadata.operator_id.clone(),
        command_id: metadata.command_id.clone(),
        created_at: now,
    };

    ctx.save_wallet(wallet);
    ctx.push_entry(entry.clone());
    Ok(entry)
}

/// Validate and stage a debit-like entry, updating the wallet in lockstep
///
/// The sufficiency check runs against the staged wallet inside the write
/// transaction, so two racing debits can never both pass it.
#[allow(clippy::too_many_arguments)]
pub(crate) fn post_debit(
    ctx: &mut CommandContext<'_>,
    metadata: &CommandMetadata,
    account_id: i64,
    points: i64,
    kind: EntryKind,
    reason: String,
    related_transaction_id: Option<String>,
    related_redemption_id: Option<String>,
) -> Result<LedgerEntry, LedgerError> {
    if points <= 0 {
        return Err(LedgerError::InvalidAmount);
    }
    if !kind.is_debit_like() {
        return Err(LedgerError::InvalidState(format!(
            "{kind} is not a debit kind"
        )));
    }

    let mut wallet = ctx.load_wallet(account_id)?;
    if wallet.available_points < points {
        return Err(LedgerError::InsufficientBalance {
            available: wallet.available_points,
            requested: points,
        });
    }

    let seq = ctx.next_sequence();
    let now = now_millis();
    apply_delta(&mut wallet, kind, points, seq, now);

    let entry = LedgerEntry {
        entry_id: uuid::Uuid::new_v4().to_string(),
        sequence: seq,
        account_id,
        kind,
        // Stored negative so summing all entries reconstructs the balance
        points: -points,
        balance_after: wallet.available_points,
        expiry_date: None,
        consumed_points: 0,
        consumed_at: None,
        related_transaction_id,
        related_redemption_id,
        reason,
        created_by: metadata.operator_id.clone(),
        command_id: metadata.command_id.clone(),
        created_at: now,
    };

    ctx.save_wallet(wallet);
    ctx.push_entry(entry.clone());
    Ok(entry)
}

/// Build an event for a staged entry
pub(crate) fn entry_event(
    metadata: &CommandMetadata,
    kind: LedgerEventKind,
    entry: &LedgerEntry,
    redemption: Option<&Redemption>,
) -> LedgerEvent {
    LedgerEvent {
        event_id: uuid::Uuid::new_v4().to_string(),
        sequence: entry.sequence,
        account_id: entry.account_id,
        timestamp: entry.created_at,
        command_id: metadata.command_id.clone(),
        kind,
        entry: Some(entry.clone()),
        redemption: redemption.cloned(),
    }
}

/// Build an event for a redemption state change with no ledger entry
pub(crate) fn redemption_event(
    ctx: &mut CommandContext<'_>,
    metadata: &CommandMetadata,
    kind: LedgerEventKind,
    redemption: &Redemption,
) -> LedgerEvent {
    LedgerEvent {
        event_id: uuid::Uuid::new_v4().to_string(),
        sequence: ctx.next_sequence(),
        account_id: redemption.account_id,
        timestamp: now_millis(),
        command_id: metadata.command_id.clone(),
        kind,
        entry: None,
        redemption: Some(redemption.clone()),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Helpers shared by action tests

    use super::*;
    use crate::ledger::storage::LedgerStorage;
    use shared::ledger::RedemptionStatus;

    pub fn test_metadata() -> CommandMetadata {
        CommandMetadata {
            command_id: uuid::Uuid::new_v4().to_string(),
            operator_id: "op-1".to_string(),
            operator_name: "Test Operator".to_string(),
            timestamp: now_millis(),
        }
    }

    /// Commit a wallet with `available` points (earned bucket) for account 1
    pub fn seed_wallet(storage: &LedgerStorage, account_id: i64, available: i64) {
        let txn = storage.begin_write().unwrap();
        let seq = 1;
        let mut wallet = shared::ledger::WalletSummary::new(account_id);
        apply_delta(&mut wallet, EntryKind::Credit, available, seq, now_millis());
        let entry = LedgerEntry {
            entry_id: uuid::Uuid::new_v4().to_string(),
            sequence: seq,
            account_id,
            kind: EntryKind::Credit,
            points: available,
            balance_after: available,
            expiry_date: None,
            consumed_points: 0,
            consumed_at: None,
            related_transaction_id: None,
            related_redemption_id: None,
            reason: "seed".to_string(),
            created_by: "seed".to_string(),
            command_id: "seed-cmd".to_string(),
            created_at: now_millis(),
        };
        storage.store_entry(&txn, &entry).unwrap();
        storage.store_wallet(&txn, &wallet).unwrap();
        storage.set_sequence(&txn, seq).unwrap();
        txn.commit().unwrap();
    }

    /// Commit a redemption record directly (state-machine test setup)
    pub fn seed_redemption(
        storage: &LedgerStorage,
        redemption_id: &str,
        account_id: i64,
        points: i64,
        status: RedemptionStatus,
        debited: bool,
        expiry_date: i64,
    ) -> Redemption {
        let redemption = Redemption {
            redemption_id: redemption_id.to_string(),
            account_id,
            reward_id: None,
            points_used: points,
            code: format!("RED{:08}", rand::random::<u32>() % 100_000_000),
            status,
            debited,
            approved_by: None,
            used_at_pump: None,
            expiry_date,
            used_at: None,
            rejected_reason: None,
            created_by: "op-1".to_string(),
            created_at: now_millis(),
            updated_at: now_millis(),
        };
        let txn = storage.begin_write().unwrap();
        storage.store_redemption(&txn, &redemption).unwrap();
        txn.commit().unwrap();
        redemption
    }
}
