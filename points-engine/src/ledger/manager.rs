//! LedgerManager - Core command processing and entry generation
//!
//! This module handles:
//! - Command validation and processing
//! - Entry generation with global sequence numbers
//! - Persistence to redb (transactional)
//! - Wallet summary updates in lockstep with entries
//! - Event broadcasting after commit
//!
//! # Command Flow
//!
//! ```text
//! execute(cmd)
//!     ├─ 1. Idempotency check (command_id)
//!     ├─ 2. Resolve account and take its lock (bounded wait)
//!     ├─ 3. Pre-transaction prep (config read, reward claim, code gen)
//!     ├─ 4. Begin write transaction
//!     ├─ 5. Execute action, staging entries/wallets/redemptions
//!     ├─ 6. Persist staged state + sequence, mark command processed
//!     ├─ 7. Commit transaction
//!     ├─ 8. Broadcast event(s), release reward stock if needed
//!     └─ 9. Return response with the resulting wallet summary
//! ```
//!
//! # Serialization contract
//!
//! All credit/debit operations against one account are serialized twice
//! over: a per-account async mutex bounds the wait and surfaces contention
//! as `ConcurrencyConflict`, and the redb write transaction (single-writer)
//! guarantees the read-check-write sequence is atomic even across accounts.
//! Two concurrent debits can never both pass the sufficiency check.

use super::actions::{
    ApproveRedemptionAction, CancelRedemptionAction, CommandAction, CreditAction, DebitAction,
    RedeemAtPumpAction, RedeemRewardAction, RejectRedemptionAction, SweepAccountAction,
    UseRedemptionAction,
};
use super::code;
use super::storage::{LedgerStorage, StorageError};
use super::traits::{CommandContext, CommandHandler, CommandMetadata, LedgerError};
use crate::db::repository::{RepoError, RewardRepository};
use crate::services::ConfigService;
use crate::utils::time::{millis_after_days, millis_after_months};
use dashmap::DashMap;
use shared::ledger::{
    CommandError, CommandErrorCode, CommandResponse, EntryKind, LedgerCommand,
    LedgerCommandPayload, LedgerEvent, LedgerEventKind, Redemption, WalletSummary,
};
use shared::models::SystemConfig;
use shared::util::now_millis;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;

/// Event broadcast channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 16384;

/// Bounded wait for the per-account lock before reporting contention
const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Internal retries on lock contention before surfacing ConcurrencyConflict
const CONFLICT_RETRY_ATTEMPTS: u32 = 3;
const CONFLICT_RETRY_BACKOFF: Duration = Duration::from_millis(50);

/// Manager errors
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] RepoError),

    #[error("Account {0} is busy")]
    Conflict(i64),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Map storage errors to error codes (frontend handles localization)
fn classify_storage_error(e: &StorageError) -> CommandErrorCode {
    if let StorageError::Serialization(_) = e {
        return CommandErrorCode::InternalError;
    }

    // redb errors are classified by message
    let err_str = e.to_string().to_lowercase();

    if err_str.contains("no space") || err_str.contains("disk full") || err_str.contains("enospc")
    {
        return CommandErrorCode::StorageFull;
    }
    if err_str.contains("out of memory") || err_str.contains("cannot allocate") {
        return CommandErrorCode::OutOfMemory;
    }
    if err_str.contains("corrupt") || err_str.contains("invalid database") {
        return CommandErrorCode::StorageCorrupted;
    }

    CommandErrorCode::SystemBusy
}

impl From<ManagerError> for CommandError {
    fn from(err: ManagerError) -> Self {
        let (code, message) = match err {
            ManagerError::Storage(e) => {
                let code = classify_storage_error(&e);
                let message = e.to_string();
                tracing::error!(error = %e, error_code = ?code, "Storage error occurred");
                (code, message)
            }
            ManagerError::Ledger(e) => {
                let code = match &e {
                    LedgerError::InvalidAmount => CommandErrorCode::InvalidAmount,
                    LedgerError::InsufficientBalance { .. } => {
                        CommandErrorCode::InsufficientBalance
                    }
                    LedgerError::AccountNotFound(_) => CommandErrorCode::AccountNotFound,
                    LedgerError::RewardNotFound(_) => CommandErrorCode::RewardNotFound,
                    LedgerError::RewardOutOfStock(_) => CommandErrorCode::RewardOutOfStock,
                    LedgerError::RedemptionNotFound(_) => CommandErrorCode::RedemptionNotFound,
                    LedgerError::InvalidState(_) => CommandErrorCode::InvalidState,
                    LedgerError::AlreadyUsed(_) => CommandErrorCode::AlreadyUsed,
                    LedgerError::Expired(_) => CommandErrorCode::Expired,
                    LedgerError::CodeGeneration(_) | LedgerError::Storage(_) => {
                        CommandErrorCode::InternalError
                    }
                };
                (code, e.to_string())
            }
            ManagerError::Catalog(e) => {
                let code = match &e {
                    RepoError::NotFound(_) => CommandErrorCode::RewardNotFound,
                    _ => CommandErrorCode::InternalError,
                };
                (code, e.to_string())
            }
            ManagerError::Conflict(account_id) => (
                CommandErrorCode::ConcurrencyConflict,
                format!("Account {account_id} is busy, try again"),
            ),
            ManagerError::Internal(msg) => (CommandErrorCode::InternalError, msg),
        };
        CommandError::new(code, message)
    }
}

pub type ManagerResult<T> = Result<T, ManagerError>;

/// Pre-transaction preparation result
struct Prep {
    action: CommandAction,
    /// Reward whose stock was claimed before the transaction; rolled back if
    /// the transaction fails
    claimed_reward: Option<i64>,
}

/// LedgerManager for command processing
///
/// The `epoch` field is a unique identifier generated on each startup.
/// Embedders use it to detect engine restarts and re-read wallet state.
#[derive(Clone)]
pub struct LedgerManager {
    storage: LedgerStorage,
    event_tx: broadcast::Sender<LedgerEvent>,
    /// Engine instance epoch - unique ID generated on startup
    epoch: String,
    /// Per-account locks serializing read-check-write sequences
    account_locks: Arc<DashMap<i64, Arc<tokio::sync::Mutex<()>>>>,
    /// Reward repository for catalog redemptions (optional, SQLite-backed)
    rewards: Option<RewardRepository>,
    /// Configuration accessor (expiry months, redemption validity)
    config: Option<Arc<ConfigService>>,
}

impl std::fmt::Debug for LedgerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerManager")
            .field("storage", &"<LedgerStorage>")
            .field("epoch", &self.epoch)
            .finish()
    }
}

impl LedgerManager {
    /// Create a new LedgerManager over an opened storage
    pub fn new(storage: LedgerStorage) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let epoch = uuid::Uuid::new_v4().to_string();
        tracing::info!(epoch = %epoch, "LedgerManager started with new epoch");
        Self {
            storage,
            event_tx,
            epoch,
            account_locks: Arc::new(DashMap::new()),
            rewards: None,
            config: None,
        }
    }

    /// Set the reward repository for catalog redemptions
    pub fn set_reward_repository(&mut self, rewards: RewardRepository) {
        self.rewards = Some(rewards);
    }

    /// Set the configuration accessor
    pub fn set_config_service(&mut self, config: Arc<ConfigService>) {
        self.config = Some(config);
    }

    /// Get the engine epoch (unique instance ID)
    pub fn epoch(&self) -> &str {
        &self.epoch
    }

    /// Get the underlying storage
    pub fn storage(&self) -> &LedgerStorage {
        &self.storage
    }

    /// Subscribe to committed-event broadcasts
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.event_tx.subscribe()
    }

    /// Execute a command and return the response
    pub async fn execute(&self, cmd: LedgerCommand) -> CommandResponse {
        self.execute_with_events(cmd).await.0
    }

    /// Execute a command and return both the response and committed events
    ///
    /// Events are returned to the caller (the sweeper aggregates them) while
    /// still being broadcast internally. Lock contention is retried a bounded
    /// number of times before surfacing as ConcurrencyConflict.
    pub async fn execute_with_events(
        &self,
        cmd: LedgerCommand,
    ) -> (CommandResponse, Vec<LedgerEvent>) {
        let mut attempt = 0u32;
        loop {
            match self.process(&cmd).await {
                Ok((response, events)) => {
                    // Broadcast after successful commit
                    for event in &events {
                        let _ = self.event_tx.send(event.clone());
                    }
                    return (response, events);
                }
                Err(ManagerError::Conflict(account_id)) if attempt < CONFLICT_RETRY_ATTEMPTS => {
                    attempt += 1;
                    tracing::warn!(
                        account_id,
                        attempt,
                        "Account lock contention, retrying command"
                    );
                    tokio::time::sleep(CONFLICT_RETRY_BACKOFF * attempt).await;
                }
                Err(err) => {
                    return (
                        CommandResponse::error(cmd.command_id.clone(), err.into()),
                        vec![],
                    );
                }
            }
        }
    }

    /// Process one command attempt
    async fn process(
        &self,
        cmd: &LedgerCommand,
    ) -> ManagerResult<(CommandResponse, Vec<LedgerEvent>)> {
        tracing::info!(command_id = %cmd.command_id, payload = ?cmd.payload, "Processing ledger command");

        // 1. Idempotency check (before lock/transaction)
        if self.storage.is_command_processed(&cmd.command_id)? {
            tracing::warn!(command_id = %cmd.command_id, "Duplicate command");
            return Ok((CommandResponse::duplicate(cmd.command_id.clone()), vec![]));
        }

        // 2. Serialize on the owning account
        let account_id = self.resolve_account_id(&cmd.payload)?;
        let lock = self.account_locks.entry(account_id).or_default().clone();
        let _guard = tokio::time::timeout(LOCK_TIMEOUT, lock.lock_owned())
            .await
            .map_err(|_| ManagerError::Conflict(account_id))?;

        // 3. Pre-transaction preparation (async catalog/config reads; redb
        //    transactions are synchronous and must not await)
        let prep = self.prepare(cmd).await?;
        let claimed_reward = prep.claimed_reward;

        // 4-7. Transactional execution
        let result = self.run_transaction(cmd, account_id, prep.action);

        match result {
            Ok(ok) => {
                self.post_commit(cmd, &ok.0).await;
                Ok(ok)
            }
            Err(err) => {
                // Roll the pre-claimed reward slot back, best-effort
                if let Some(reward_id) = claimed_reward
                    && let Some(rewards) = &self.rewards
                    && let Err(e) = rewards.release(reward_id).await
                {
                    tracing::error!(reward_id, error = %e, "Failed to release claimed reward after aborted redemption");
                }
                Err(err)
            }
        }
    }

    /// Account that owns the command, for lock routing
    fn resolve_account_id(&self, payload: &LedgerCommandPayload) -> ManagerResult<i64> {
        match payload {
            LedgerCommandPayload::Credit { account_id, .. }
            | LedgerCommandPayload::Debit { account_id, .. }
            | LedgerCommandPayload::RedeemReward { account_id, .. }
            | LedgerCommandPayload::RedeemAtPump { account_id, .. }
            | LedgerCommandPayload::SweepAccount { account_id } => Ok(*account_id),
            LedgerCommandPayload::ApproveRedemption { redemption_id }
            | LedgerCommandPayload::RejectRedemption { redemption_id, .. }
            | LedgerCommandPayload::CancelRedemption { redemption_id } => Ok(self
                .storage
                .get_redemption(redemption_id)?
                .ok_or_else(|| LedgerError::RedemptionNotFound(redemption_id.clone()))?
                .account_id),
            LedgerCommandPayload::UseRedemption { code, .. } => Ok(self
                .storage
                .find_redemption_by_code(code)?
                .ok_or_else(|| LedgerError::RedemptionNotFound(code.clone()))?
                .account_id),
        }
    }

    /// Business configuration, defaulting when no accessor is wired (tests)
    async fn current_config(&self) -> SystemConfig {
        match &self.config {
            Some(config) => config.get().await,
            None => SystemConfig::default(),
        }
    }

    /// Resolve async side inputs so the transaction itself never awaits
    async fn prepare(&self, cmd: &LedgerCommand) -> ManagerResult<Prep> {
        let action = match &cmd.payload {
            LedgerCommandPayload::Credit {
                account_id,
                points,
                kind,
                reason,
                related_transaction_id,
                related_redemption_id,
            } => {
                // Earned credits age out per configuration; refunds and
                // adjustments never expire
                let expiry_date = if *kind == EntryKind::Credit {
                    let config = self.current_config().await;
                    Some(millis_after_months(now_millis(), config.points_expiry_months))
                } else {
                    None
                };
                CommandAction::Credit(CreditAction {
                    account_id: *account_id,
                    points: *points,
                    kind: *kind,
                    reason: reason.clone(),
                    related_transaction_id: related_transaction_id.clone(),
                    related_redemption_id: related_redemption_id.clone(),
                    expiry_date,
                })
            }
            LedgerCommandPayload::Debit {
                account_id,
                points,
                kind,
                reason,
                related_transaction_id,
                related_redemption_id,
            } => CommandAction::Debit(DebitAction {
                account_id: *account_id,
                points: *points,
                kind: *kind,
                reason: reason.clone(),
                related_transaction_id: related_transaction_id.clone(),
                related_redemption_id: related_redemption_id.clone(),
            }),
            LedgerCommandPayload::RedeemReward {
                account_id,
                reward_id,
            } => {
                let rewards = self.rewards.as_ref().ok_or_else(|| {
                    ManagerError::Internal("reward repository not configured".to_string())
                })?;
                let now = now_millis();
                let reward = rewards
                    .find_by_id(*reward_id)
                    .await?
                    .ok_or(LedgerError::RewardNotFound(*reward_id))?;
                if !reward.is_active || now < reward.valid_from || now > reward.valid_until {
                    return Err(LedgerError::InvalidState(format!(
                        "reward {} is not available",
                        reward.name
                    ))
                    .into());
                }
                // Atomic stock claim; a race past the read above surfaces here
                let reward = rewards
                    .claim(*reward_id)
                    .await?
                    .ok_or(LedgerError::RewardOutOfStock(*reward_id))?;

                let config = self.current_config().await;
                let code = self.generate_code()?;
                return Ok(Prep {
                    action: CommandAction::RedeemReward(RedeemRewardAction {
                        account_id: *account_id,
                        reward,
                        code,
                        expiry_date: millis_after_days(
                            now,
                            config.redemption_expiry_days as i64,
                        ),
                    }),
                    claimed_reward: Some(*reward_id),
                });
            }
            LedgerCommandPayload::RedeemAtPump { account_id, points } => {
                let config = self.current_config().await;
                CommandAction::RedeemAtPump(RedeemAtPumpAction {
                    account_id: *account_id,
                    points: *points,
                    code: self.generate_code()?,
                    expiry_date: millis_after_days(
                        now_millis(),
                        config.redemption_expiry_days as i64,
                    ),
                })
            }
            LedgerCommandPayload::ApproveRedemption { redemption_id } => {
                CommandAction::ApproveRedemption(ApproveRedemptionAction {
                    redemption_id: redemption_id.clone(),
                })
            }
            LedgerCommandPayload::RejectRedemption {
                redemption_id,
                reason,
            } => CommandAction::RejectRedemption(RejectRedemptionAction {
                redemption_id: redemption_id.clone(),
                reason: reason.clone(),
            }),
            LedgerCommandPayload::UseRedemption { code, pump_id } => {
                CommandAction::UseRedemption(UseRedemptionAction {
                    code: code.clone(),
                    pump_id: pump_id.clone(),
                })
            }
            LedgerCommandPayload::CancelRedemption { redemption_id } => {
                CommandAction::CancelRedemption(CancelRedemptionAction {
                    redemption_id: redemption_id.clone(),
                })
            }
            LedgerCommandPayload::SweepAccount { account_id } => {
                CommandAction::SweepAccount(SweepAccountAction {
                    account_id: *account_id,
                    now: now_millis(),
                })
            }
        };
        Ok(Prep {
            action,
            claimed_reward: None,
        })
    }

    fn generate_code(&self) -> Result<String, LedgerError> {
        code::generate_code(|candidate| Ok(self.storage.code_exists(candidate)?))
    }

    /// Execute the action and persist everything atomically
    fn run_transaction(
        &self,
        cmd: &LedgerCommand,
        account_id: i64,
        action: CommandAction,
    ) -> ManagerResult<(CommandResponse, Vec<LedgerEvent>)> {
        let txn = self.storage.begin_write()?;

        // Double-check idempotency within the transaction
        if self.storage.is_command_processed_txn(&txn, &cmd.command_id)? {
            return Ok((CommandResponse::duplicate(cmd.command_id.clone()), vec![]));
        }

        let current_sequence = self.storage.get_current_sequence()?;
        let mut ctx = CommandContext::new(&txn, &self.storage, current_sequence);
        let metadata = CommandMetadata {
            command_id: cmd.command_id.clone(),
            operator_id: cmd.operator_id.clone(),
            operator_name: cmd.operator_name.clone(),
            timestamp: cmd.timestamp,
        };

        // Actions are async by trait signature but never await; the
        // transaction scope stays synchronous
        let events = futures::executor::block_on(action.execute(&mut ctx, &metadata))
            .map_err(ManagerError::from)?;

        // Persist staged state: entry + wallet writes share the transaction,
        // so neither can exist without the other
        for entry in ctx.staged_entries() {
            self.storage.store_entry(&txn, entry)?;
        }
        for entry in ctx.staged_consumed_updates() {
            self.storage.store_entry(&txn, entry)?;
        }
        for wallet in ctx.staged_wallets() {
            self.storage.store_wallet(&txn, wallet)?;
        }
        for redemption in ctx.staged_redemptions() {
            self.storage.store_redemption(&txn, redemption)?;
        }

        let max_sequence = ctx.current_sequence();
        if max_sequence > current_sequence {
            self.storage.set_sequence(&txn, max_sequence)?;
        }
        self.storage.mark_command_processed(&txn, &cmd.command_id)?;

        // Response data, resolved before the context goes away
        let wallet_after: Option<WalletSummary> = match ctx.staged_wallet(account_id) {
            Some(wallet) => Some(wallet.clone()),
            None => self.storage.get_wallet_txn(&txn, account_id)?,
        };
        let redemption_after: Option<Redemption> = events
            .iter()
            .rev()
            .find_map(|e| e.redemption.clone());

        txn.commit().map_err(StorageError::from)?;

        // Lazy code expiry commits the state flip but still fails the caller
        let response = if events
            .iter()
            .any(|e| e.kind == LedgerEventKind::RedemptionExpired)
            && matches!(cmd.payload, LedgerCommandPayload::UseRedemption { .. })
        {
            CommandResponse::error(
                cmd.command_id.clone(),
                CommandError::new(CommandErrorCode::Expired, "Redemption code expired"),
            )
        } else {
            CommandResponse::success(cmd.command_id.clone(), wallet_after, redemption_after)
        };

        tracing::info!(
            command_id = %cmd.command_id,
            account_id,
            event_count = events.len(),
            "Ledger command processed"
        );
        Ok((response, events))
    }

    /// Best-effort side effects after a successful commit
    async fn post_commit(&self, cmd: &LedgerCommand, response: &CommandResponse) {
        if !response.success {
            return;
        }
        // Rejected/cancelled catalog redemptions hand their stock back
        if matches!(
            cmd.payload,
            LedgerCommandPayload::RejectRedemption { .. }
                | LedgerCommandPayload::CancelRedemption { .. }
        ) && let Some(reward_id) = response.redemption.as_ref().and_then(|r| r.reward_id)
            && let Some(rewards) = &self.rewards
            && let Err(e) = rewards.release(reward_id).await
        {
            tracing::error!(reward_id, error = %e, "Failed to release reward stock after rejection");
        }
    }

    // ========== Public Query Methods ==========

    /// Get an account's wallet summary
    pub fn get_wallet(&self, account_id: i64) -> ManagerResult<WalletSummary> {
        self.storage
            .get_wallet(account_id)?
            .ok_or_else(|| LedgerError::AccountNotFound(account_id).into())
    }

    /// Get all ledger entries for an account, in sequence order
    pub fn get_entries(&self, account_id: i64) -> ManagerResult<Vec<shared::ledger::LedgerEntry>> {
        Ok(self.storage.get_entries(account_id)?)
    }

    /// Get a redemption by ID
    pub fn get_redemption(&self, redemption_id: &str) -> ManagerResult<Option<Redemption>> {
        Ok(self.storage.get_redemption(redemption_id)?)
    }

    /// Look a redemption up by its code
    pub fn find_redemption_by_code(&self, code: &str) -> ManagerResult<Option<Redemption>> {
        Ok(self.storage.find_redemption_by_code(code)?)
    }

    /// Accounts holding a wallet (the sweeper's iteration set)
    pub fn wallet_account_ids(&self) -> ManagerResult<Vec<i64>> {
        Ok(self.storage.wallet_account_ids()?)
    }

    /// Verify the conservation invariant for an account:
    /// `available == Σ entries.points` and the bucket identity holds
    pub fn verify_reconciliation(&self, account_id: i64) -> ManagerResult<bool> {
        let wallet = self.get_wallet(account_id)?;
        let entry_sum = self.storage.sum_entry_points(account_id)?;
        Ok(wallet.is_consistent() && entry_sum == wallet.available_points)
    }
}
