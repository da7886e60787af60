//! Command processing traits and context
//!
//! Each ledger command is handled by an action implementing
//! [`CommandHandler`]. Actions read and stage state through a
//! [`CommandContext`] bound to one redb write transaction; nothing touches
//! the database directly until the manager persists the staged state and
//! commits. Reads through the context see staged writes first, so a single
//! command observes its own effects.

use super::storage::{LedgerStorage, StorageError};
use async_trait::async_trait;
use redb::WriteTransaction;
use shared::ledger::{LedgerEntry, LedgerEvent, Redemption, WalletSummary};
use std::collections::HashMap;
use thiserror::Error;

/// Domain errors for ledger operations
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Invalid amount: points must be positive")]
    InvalidAmount,

    #[error("Insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance { available: i64, requested: i64 },

    #[error("Account not found: {0}")]
    AccountNotFound(i64),

    #[error("Reward not found: {0}")]
    RewardNotFound(i64),

    #[error("Reward out of stock: {0}")]
    RewardOutOfStock(i64),

    #[error("Redemption not found: {0}")]
    RedemptionNotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Redemption code already used: {0}")]
    AlreadyUsed(String),

    #[error("Redemption code expired: {0}")]
    Expired(String),

    #[error("Code generation failed: {0}")]
    CodeGeneration(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<StorageError> for LedgerError {
    fn from(err: StorageError) -> Self {
        LedgerError::Storage(err.to_string())
    }
}

/// Metadata propagated from the command into entries and events
#[derive(Debug, Clone)]
pub struct CommandMetadata {
    pub command_id: String,
    pub operator_id: String,
    pub operator_name: String,
    pub timestamp: i64,
}

/// Command handler trait implemented by every action
#[async_trait]
pub trait CommandHandler {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<LedgerEvent>, LedgerError>;
}

/// Mutable state window for one command
///
/// Wallets, entries, and redemptions staged here are persisted by the
/// manager inside the same write transaction, so a ledger entry can never
/// exist without its matching wallet update or vice versa.
pub struct CommandContext<'a> {
    txn: &'a WriteTransaction,
    storage: &'a LedgerStorage,
    current_sequence: u64,
    wallets: HashMap<i64, WalletSummary>,
    redemptions: HashMap<String, Redemption>,
    entries: Vec<LedgerEntry>,
    /// Credit entries whose consumed counters advanced (expiry sweep)
    consumed_updates: Vec<LedgerEntry>,
}

impl<'a> CommandContext<'a> {
    pub fn new(
        txn: &'a WriteTransaction,
        storage: &'a LedgerStorage,
        current_sequence: u64,
    ) -> Self {
        Self {
            txn,
            storage,
            current_sequence,
            wallets: HashMap::new(),
            redemptions: HashMap::new(),
            entries: Vec::new(),
            consumed_updates: Vec::new(),
        }
    }

    /// Allocate the next global sequence number
    pub fn next_sequence(&mut self) -> u64 {
        self.current_sequence += 1;
        self.current_sequence
    }

    pub fn current_sequence(&self) -> u64 {
        self.current_sequence
    }

    /// Load a wallet, staged version first. Fails when the account has no
    /// wallet row (never earned points / unknown account).
    pub fn load_wallet(&mut self, account_id: i64) -> Result<WalletSummary, LedgerError> {
        if let Some(wallet) = self.wallets.get(&account_id) {
            return Ok(wallet.clone());
        }
        self.storage
            .get_wallet_txn(self.txn, account_id)?
            .ok_or(LedgerError::AccountNotFound(account_id))
    }

    /// Load a wallet, creating an empty summary for first-time earners
    pub fn load_or_create_wallet(&mut self, account_id: i64) -> Result<WalletSummary, LedgerError> {
        match self.load_wallet(account_id) {
            Ok(wallet) => Ok(wallet),
            Err(LedgerError::AccountNotFound(_)) => Ok(WalletSummary::new(account_id)),
            Err(e) => Err(e),
        }
    }

    /// Stage a wallet update
    pub fn save_wallet(&mut self, wallet: WalletSummary) {
        self.wallets.insert(wallet.account_id, wallet);
    }

    pub fn load_redemption(&mut self, redemption_id: &str) -> Result<Redemption, LedgerError> {
        if let Some(redemption) = self.redemptions.get(redemption_id) {
            return Ok(redemption.clone());
        }
        self.storage
            .get_redemption_txn(self.txn, redemption_id)?
            .ok_or_else(|| LedgerError::RedemptionNotFound(redemption_id.to_string()))
    }

    pub fn find_redemption_by_code(&mut self, code: &str) -> Result<Redemption, LedgerError> {
        if let Some(redemption) = self.redemptions.values().find(|r| r.code == code) {
            return Ok(redemption.clone());
        }
        self.storage
            .find_redemption_by_code_txn(self.txn, code)?
            .ok_or_else(|| LedgerError::RedemptionNotFound(code.to_string()))
    }

    /// Stage a redemption create/update
    pub fn save_redemption(&mut self, redemption: Redemption) {
        self.redemptions
            .insert(redemption.redemption_id.clone(), redemption);
    }

    /// Stage a new ledger entry
    pub fn push_entry(&mut self, entry: LedgerEntry) {
        self.entries.push(entry);
    }

    /// Stage a consumed-counter update on an existing credit entry
    pub fn mark_consumed(&mut self, entry: LedgerEntry) {
        self.consumed_updates.push(entry);
    }

    /// Credit entries of an account due for expiry at `now`, oldest first
    pub fn expirable_entries(
        &self,
        account_id: i64,
        now: i64,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        let mut entries: Vec<LedgerEntry> = self
            .storage
            .get_entries_txn(self.txn, account_id)?
            .into_iter()
            .filter(|e| e.is_expirable(now))
            .collect();
        entries.sort_by_key(|e| (e.expiry_date.unwrap_or(i64::MAX), e.sequence));
        Ok(entries)
    }

    // ========== Accessors for persistence (manager only) ==========

    pub fn staged_wallets(&self) -> impl Iterator<Item = &WalletSummary> {
        self.wallets.values()
    }

    pub fn staged_wallet(&self, account_id: i64) -> Option<&WalletSummary> {
        self.wallets.get(&account_id)
    }

    pub fn staged_redemptions(&self) -> impl Iterator<Item = &Redemption> {
        self.redemptions.values()
    }

    pub fn staged_entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn staged_consumed_updates(&self) -> &[LedgerEntry] {
        &self.consumed_updates
    }
}
