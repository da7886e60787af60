//! Ledger types
//!
//! Types for the points ledger engine:
//! - Commands: requests to mutate an account's points
//! - Entries: immutable facts appended after command processing
//! - Wallet summaries: denormalized per-account balance snapshots
//! - Redemptions: point-spend instances moving through a state machine

pub mod entry;
pub mod redemption;
pub mod types;
pub mod wallet;

// Re-exports
pub use entry::{EntryKind, LedgerEntry};
pub use redemption::{Redemption, RedemptionStatus};
pub use types::{
    CommandError, CommandErrorCode, CommandResponse, LedgerCommand, LedgerCommandPayload,
    LedgerEvent, LedgerEventKind,
};
pub use wallet::{WalletBucket, WalletSummary};
