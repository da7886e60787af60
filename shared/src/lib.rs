//! Shared types for the fuel-station loyalty platform
//!
//! Common types used across crates: catalog models (accounts, campaigns,
//! rewards, system configuration), ledger types (entries, wallet summaries,
//! redemptions, commands/events), and small utilities.

pub mod ledger;
pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

// Ledger re-exports (for convenient access)
pub use ledger::{
    CommandError, CommandErrorCode, CommandResponse, EntryKind, LedgerCommand,
    LedgerCommandPayload, LedgerEntry, LedgerEvent, LedgerEventKind, Redemption, RedemptionStatus,
    WalletBucket, WalletSummary,
};
