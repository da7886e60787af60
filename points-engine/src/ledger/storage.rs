//! redb-based storage layer for the points ledger
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `entries` | `(account_id, sequence)` | `LedgerEntry` | Ledger log (append-mostly) |
//! | `wallets` | `account_id` | `WalletSummary` | Denormalized balances |
//! | `redemptions` | `redemption_id` | `Redemption` | Redemption records |
//! | `redemption_codes` | `code` | `redemption_id` | Code uniqueness index |
//! | `processed_commands` | `command_id` | `()` | Idempotency check |
//! | `sequence_counter` | `()` | `u64` | Global sequence |
//!
//! # Durability
//!
//! redb commits with `Durability::Immediate`: copy-on-write with an atomic
//! pointer swap, so the file stays consistent across power loss. Station
//! controllers get hard-reset often enough that this matters.
//!
//! # Serialization
//!
//! Write transactions are single-writer. Every command runs its
//! read-check-write sequence inside one write transaction, which is what
//! serializes concurrent debits against the same account.

use redb::{
    Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction,
};
use shared::ledger::{LedgerEntry, Redemption, WalletSummary};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Ledger log: key = (account_id, sequence), value = JSON-serialized LedgerEntry
const ENTRIES_TABLE: TableDefinition<(i64, u64), &[u8]> = TableDefinition::new("entries");

/// Wallet summaries: key = account_id, value = JSON-serialized WalletSummary
const WALLETS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("wallets");

/// Redemptions: key = redemption_id, value = JSON-serialized Redemption
const REDEMPTIONS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("redemptions");

/// Code uniqueness index: key = code, value = redemption_id
const REDEMPTION_CODES_TABLE: TableDefinition<&str, &str> =
    TableDefinition::new("redemption_codes");

/// Processed commands: key = command_id, value = empty (idempotency)
const PROCESSED_COMMANDS_TABLE: TableDefinition<&str, ()> =
    TableDefinition::new("processed_commands");

/// Sequence counter: key = "seq", value = u64
const SEQUENCE_TABLE: TableDefinition<&str, u64> = TableDefinition::new("sequence_counter");

const SEQUENCE_KEY: &str = "seq";

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Ledger storage backed by redb
#[derive(Clone)]
pub struct LedgerStorage {
    db: Arc<Database>,
}

impl LedgerStorage {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    fn init_tables(&self) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let _ = write_txn.open_table(ENTRIES_TABLE)?;
            let _ = write_txn.open_table(WALLETS_TABLE)?;
            let _ = write_txn.open_table(REDEMPTIONS_TABLE)?;
            let _ = write_txn.open_table(REDEMPTION_CODES_TABLE)?;
            let _ = write_txn.open_table(PROCESSED_COMMANDS_TABLE)?;

            let mut seq_table = write_txn.open_table(SEQUENCE_TABLE)?;
            if seq_table.get(SEQUENCE_KEY)?.is_none() {
                seq_table.insert(SEQUENCE_KEY, 0u64)?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Sequence Operations ==========

    /// Get current sequence (read-only)
    pub fn get_current_sequence(&self) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SEQUENCE_TABLE)?;
        Ok(table
            .get(SEQUENCE_KEY)?
            .map(|guard| guard.value())
            .unwrap_or(0))
    }

    /// Set sequence number (within transaction)
    pub fn set_sequence(&self, txn: &WriteTransaction, sequence: u64) -> StorageResult<()> {
        let mut table = txn.open_table(SEQUENCE_TABLE)?;
        table.insert(SEQUENCE_KEY, sequence)?;
        Ok(())
    }

    // ========== Command Idempotency ==========

    /// Check if a command has been processed
    pub fn is_command_processed(&self, command_id: &str) -> StorageResult<bool> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        Ok(table.get(command_id)?.is_some())
    }

    /// Check if a command has been processed (within transaction)
    pub fn is_command_processed_txn(
        &self,
        txn: &WriteTransaction,
        command_id: &str,
    ) -> StorageResult<bool> {
        let table = txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        Ok(table.get(command_id)?.is_some())
    }

    /// Mark a command as processed
    pub fn mark_command_processed(
        &self,
        txn: &WriteTransaction,
        command_id: &str,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        table.insert(command_id, ())?;
        Ok(())
    }

    // ========== Entry Operations ==========

    /// Store an entry (also used to advance consumed counters on a credit
    /// entry; the key is stable so the write replaces the old record)
    pub fn store_entry(&self, txn: &WriteTransaction, entry: &LedgerEntry) -> StorageResult<()> {
        let mut table = txn.open_table(ENTRIES_TABLE)?;
        let key = (entry.account_id, entry.sequence);
        let value = serde_json::to_vec(entry)?;
        table.insert(key, value.as_slice())?;
        Ok(())
    }

    /// Get all entries for an account, in sequence order
    pub fn get_entries(&self, account_id: i64) -> StorageResult<Vec<LedgerEntry>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ENTRIES_TABLE)?;

        let mut entries = Vec::new();
        let range_start = (account_id, 0u64);
        let range_end = (account_id, u64::MAX);
        for result in table.range(range_start..=range_end)? {
            let (_key, value) = result?;
            let entry: LedgerEntry = serde_json::from_slice(value.value())?;
            entries.push(entry);
        }

        entries.sort_by_key(|e| e.sequence);
        Ok(entries)
    }

    /// Get all entries for an account (within transaction)
    pub fn get_entries_txn(
        &self,
        txn: &WriteTransaction,
        account_id: i64,
    ) -> StorageResult<Vec<LedgerEntry>> {
        let table = txn.open_table(ENTRIES_TABLE)?;

        let mut entries = Vec::new();
        let range_start = (account_id, 0u64);
        let range_end = (account_id, u64::MAX);
        for result in table.range(range_start..=range_end)? {
            let (_key, value) = result?;
            let entry: LedgerEntry = serde_json::from_slice(value.value())?;
            entries.push(entry);
        }

        entries.sort_by_key(|e| e.sequence);
        Ok(entries)
    }

    /// Sum of signed entry points for an account (balance reconstruction)
    pub fn sum_entry_points(&self, account_id: i64) -> StorageResult<i64> {
        Ok(self.get_entries(account_id)?.iter().map(|e| e.points).sum())
    }

    // ========== Wallet Operations ==========

    /// Store a wallet summary
    pub fn store_wallet(&self, txn: &WriteTransaction, wallet: &WalletSummary) -> StorageResult<()> {
        let mut table = txn.open_table(WALLETS_TABLE)?;
        let value = serde_json::to_vec(wallet)?;
        table.insert(wallet.account_id, value.as_slice())?;
        Ok(())
    }

    /// Get a wallet summary by account ID
    pub fn get_wallet(&self, account_id: i64) -> StorageResult<Option<WalletSummary>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(WALLETS_TABLE)?;
        match table.get(account_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Get a wallet summary (within transaction)
    pub fn get_wallet_txn(
        &self,
        txn: &WriteTransaction,
        account_id: i64,
    ) -> StorageResult<Option<WalletSummary>> {
        let table = txn.open_table(WALLETS_TABLE)?;
        match table.get(account_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Every account that holds a wallet (sweeper iteration set: accounts
    /// without a wallet never earned anything, so there is nothing to expire)
    pub fn wallet_account_ids(&self) -> StorageResult<Vec<i64>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(WALLETS_TABLE)?;
        let mut ids = Vec::new();
        for result in table.iter()? {
            let (key, _value) = result?;
            ids.push(key.value());
        }
        Ok(ids)
    }

    // ========== Redemption Operations ==========

    /// Store a redemption and maintain the code index
    pub fn store_redemption(
        &self,
        txn: &WriteTransaction,
        redemption: &Redemption,
    ) -> StorageResult<()> {
        {
            let mut table = txn.open_table(REDEMPTIONS_TABLE)?;
            let value = serde_json::to_vec(redemption)?;
            table.insert(redemption.redemption_id.as_str(), value.as_slice())?;
        }
        let mut codes = txn.open_table(REDEMPTION_CODES_TABLE)?;
        codes.insert(redemption.code.as_str(), redemption.redemption_id.as_str())?;
        Ok(())
    }

    /// Get a redemption by ID
    pub fn get_redemption(&self, redemption_id: &str) -> StorageResult<Option<Redemption>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(REDEMPTIONS_TABLE)?;
        match table.get(redemption_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Get a redemption by ID (within transaction)
    pub fn get_redemption_txn(
        &self,
        txn: &WriteTransaction,
        redemption_id: &str,
    ) -> StorageResult<Option<Redemption>> {
        let table = txn.open_table(REDEMPTIONS_TABLE)?;
        match table.get(redemption_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Look a redemption up by its code
    pub fn find_redemption_by_code(&self, code: &str) -> StorageResult<Option<Redemption>> {
        let read_txn = self.db.begin_read()?;
        let codes = read_txn.open_table(REDEMPTION_CODES_TABLE)?;
        let redemption_id = match codes.get(code)? {
            Some(guard) => guard.value().to_string(),
            None => return Ok(None),
        };
        drop(codes);
        let table = read_txn.open_table(REDEMPTIONS_TABLE)?;
        match table.get(redemption_id.as_str())? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Look a redemption up by its code (within transaction)
    pub fn find_redemption_by_code_txn(
        &self,
        txn: &WriteTransaction,
        code: &str,
    ) -> StorageResult<Option<Redemption>> {
        let codes = txn.open_table(REDEMPTION_CODES_TABLE)?;
        let redemption_id = match codes.get(code)? {
            Some(guard) => guard.value().to_string(),
            None => return Ok(None),
        };
        drop(codes);
        let table = txn.open_table(REDEMPTIONS_TABLE)?;
        match table.get(redemption_id.as_str())? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Whether a redemption code is already taken
    pub fn code_exists(&self, code: &str) -> StorageResult<bool> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(REDEMPTION_CODES_TABLE)?;
        Ok(table.get(code)?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::ledger::EntryKind;
    use shared::util::now_millis;

    fn make_entry(account_id: i64, sequence: u64, points: i64) -> LedgerEntry {
        LedgerEntry {
            entry_id: uuid::Uuid::new_v4().to_string(),
            sequence,
            account_id,
            kind: if points >= 0 {
                EntryKind::Credit
            } else {
                EntryKind::Debit
            },
            points,
            balance_after: 0,
            expiry_date: None,
            consumed_points: 0,
            consumed_at: None,
            related_transaction_id: None,
            related_redemption_id: None,
            reason: "test".to_string(),
            created_by: "op-1".to_string(),
            command_id: "cmd-1".to_string(),
            created_at: now_millis(),
        }
    }

    #[test]
    fn test_entry_roundtrip_and_ordering() {
        let storage = LedgerStorage::open_in_memory().unwrap();

        let txn = storage.begin_write().unwrap();
        storage.store_entry(&txn, &make_entry(1, 2, -30)).unwrap();
        storage.store_entry(&txn, &make_entry(1, 1, 100)).unwrap();
        storage.store_entry(&txn, &make_entry(2, 3, 50)).unwrap();
        txn.commit().unwrap();

        let entries = storage.get_entries(1).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].sequence, 1);
        assert_eq!(entries[1].sequence, 2);
        assert_eq!(storage.sum_entry_points(1).unwrap(), 70);
        assert_eq!(storage.sum_entry_points(2).unwrap(), 50);
    }

    #[test]
    fn test_wallet_roundtrip() {
        let storage = LedgerStorage::open_in_memory().unwrap();
        assert!(storage.get_wallet(1).unwrap().is_none());

        let mut wallet = WalletSummary::new(1);
        wallet.total_earned = 100;
        wallet.available_points = 100;

        let txn = storage.begin_write().unwrap();
        storage.store_wallet(&txn, &wallet).unwrap();
        txn.commit().unwrap();

        let loaded = storage.get_wallet(1).unwrap().unwrap();
        assert_eq!(loaded, wallet);
        assert_eq!(storage.wallet_account_ids().unwrap(), vec![1]);
    }

    #[test]
    fn test_command_idempotency_marks() {
        let storage = LedgerStorage::open_in_memory().unwrap();
        assert!(!storage.is_command_processed("cmd-1").unwrap());

        let txn = storage.begin_write().unwrap();
        assert!(!storage.is_command_processed_txn(&txn, "cmd-1").unwrap());
        storage.mark_command_processed(&txn, "cmd-1").unwrap();
        txn.commit().unwrap();

        assert!(storage.is_command_processed("cmd-1").unwrap());
    }

    #[test]
    fn test_redemption_code_index() {
        let storage = LedgerStorage::open_in_memory().unwrap();

        let redemption = Redemption {
            redemption_id: "red-1".to_string(),
            account_id: 1,
            reward_id: None,
            points_used: 100,
            code: "RED12345678".to_string(),
            status: shared::ledger::RedemptionStatus::Pending,
            debited: false,
            approved_by: None,
            used_at_pump: None,
            expiry_date: now_millis() + 86_400_000,
            used_at: None,
            rejected_reason: None,
            created_by: "op-1".to_string(),
            created_at: now_millis(),
            updated_at: now_millis(),
        };

        let txn = storage.begin_write().unwrap();
        storage.store_redemption(&txn, &redemption).unwrap();
        txn.commit().unwrap();

        assert!(storage.code_exists("RED12345678").unwrap());
        assert!(!storage.code_exists("RED00000000").unwrap());

        let found = storage.find_redemption_by_code("RED12345678").unwrap().unwrap();
        assert_eq!(found.redemption_id, "red-1");
    }
}
