//! Points Ledger Engine
//!
//! The consistency core of the loyalty platform:
//!
//! - **manager**: LedgerManager for command processing and entry generation
//! - **storage**: redb-based persistence for entries, wallets, redemptions
//! - **actions**: one handler per command (credit, debit, redemption
//!   transitions, expiry sweep)
//! - **wallet**: the single wallet-mutation path with its bucket mapping
//! - **code**: bounded-retry redemption code generation
//! - **sweeper**: daily FIFO expiry task
//!
//! # Architecture
//!
//! ```text
//! Command → LedgerManager → Action → staged entries/wallets/redemptions
//!                 ↓                           ↓
//!             Broadcast               Persist (redb, one txn)
//!                 ↓
//!           All Subscribers
//! ```
//!
//! Every wallet mutation commits atomically with the ledger entry that
//! describes it, and `sum(entries.points) == wallet.available_points` holds
//! for every account after every command.

pub mod actions;
pub mod code;
pub mod manager;
pub mod storage;
pub mod sweeper;
pub mod traits;
pub mod wallet;

// Re-exports
pub use manager::{LedgerManager, ManagerError, ManagerResult};
pub use storage::{LedgerStorage, StorageError};
pub use sweeper::{ExpirySweeper, SweepReport};
pub use traits::{CommandContext, CommandHandler, CommandMetadata, LedgerError};

// Re-export shared types for convenience
pub use shared::ledger::{
    CommandError, CommandErrorCode, CommandResponse, EntryKind, LedgerCommand,
    LedgerCommandPayload, LedgerEntry, LedgerEvent, LedgerEventKind, Redemption, RedemptionStatus,
    WalletSummary,
};
