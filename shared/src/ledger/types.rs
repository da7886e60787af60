//! Shared types for ledger command processing

use super::entry::{EntryKind, LedgerEntry};
use super::redemption::Redemption;
use super::wallet::WalletSummary;
use serde::{Deserialize, Serialize};

// ============================================================================
// Commands
// ============================================================================

/// Request to mutate an account's points
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerCommand {
    /// Client-generated unique ID; replays of the same ID are no-ops
    pub command_id: String,
    /// Operator who issued the command
    pub operator_id: String,
    /// Operator name (snapshot for audit)
    pub operator_name: String,
    /// Client timestamp (Unix milliseconds)
    pub timestamp: i64,
    pub payload: LedgerCommandPayload,
}

impl LedgerCommand {
    pub fn new(
        operator_id: impl Into<String>,
        operator_name: impl Into<String>,
        payload: LedgerCommandPayload,
    ) -> Self {
        Self {
            command_id: uuid::Uuid::new_v4().to_string(),
            operator_id: operator_id.into(),
            operator_name: operator_name.into(),
            timestamp: crate::util::now_millis(),
            payload,
        }
    }
}

/// Command payload variants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerCommandPayload {
    /// Add points. `kind` must be credit-like (Credit/Refund/Adjustment).
    Credit {
        account_id: i64,
        points: i64,
        kind: EntryKind,
        reason: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        related_transaction_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        related_redemption_id: Option<String>,
    },
    /// Remove points. `kind` must be debit-like (Debit/Expiry).
    Debit {
        account_id: i64,
        points: i64,
        kind: EntryKind,
        reason: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        related_transaction_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        related_redemption_id: Option<String>,
    },
    /// Catalog redemption: debits immediately, starts Pending
    RedeemReward { account_id: i64, reward_id: i64 },
    /// At-pump redemption: no debit until approval
    RedeemAtPump { account_id: i64, points: i64 },
    ApproveRedemption {
        redemption_id: String,
    },
    RejectRedemption {
        redemption_id: String,
        reason: String,
    },
    /// Verify a code at a pump and consume it
    UseRedemption {
        code: String,
        pump_id: String,
    },
    CancelRedemption {
        redemption_id: String,
    },
    /// FIFO-expire due credit entries for one account (sweeper-issued)
    SweepAccount { account_id: i64 },
}

// ============================================================================
// Events
// ============================================================================

/// What a committed command did (broadcast to subscribers after commit)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerEventKind {
    PointsCredited,
    PointsDebited,
    PointsExpired,
    RedemptionCreated,
    RedemptionApproved,
    RedemptionRejected,
    RedemptionUsed,
    RedemptionCancelled,
    RedemptionExpired,
}

/// Ledger event - immutable audit record, broadcast after commit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEvent {
    /// Event unique ID
    pub event_id: String,
    /// Global sequence number at commit time
    pub sequence: u64,
    pub account_id: i64,
    /// Server timestamp (Unix milliseconds)
    pub timestamp: i64,
    /// Command that triggered this event (for audit tracing)
    pub command_id: String,
    pub kind: LedgerEventKind,
    /// Entry appended by this event, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<LedgerEntry>,
    /// Redemption state after this event, if one was touched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redemption: Option<Redemption>,
}

// ============================================================================
// Responses
// ============================================================================

/// Response to a ledger command
///
/// Successful mutations carry the full resulting wallet summary so upstream
/// callers can feed their audit sink with before/after state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    /// The command ID this responds to
    pub command_id: String,
    /// Whether the command succeeded
    pub success: bool,
    /// Wallet summary after the mutation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet: Option<WalletSummary>,
    /// Redemption touched by the command, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redemption: Option<Redemption>,
    /// Error details if failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CommandError>,
}

impl CommandResponse {
    pub fn success(
        command_id: String,
        wallet: Option<WalletSummary>,
        redemption: Option<Redemption>,
    ) -> Self {
        Self {
            command_id,
            success: true,
            wallet,
            redemption,
            error: None,
        }
    }

    /// Replayed command: acknowledged without re-execution
    pub fn duplicate(command_id: String) -> Self {
        Self {
            command_id,
            success: true,
            wallet: None,
            redemption: None,
            error: None,
        }
    }

    pub fn error(command_id: String, error: CommandError) -> Self {
        Self {
            command_id,
            success: false,
            wallet: None,
            redemption: None,
            error: Some(error),
        }
    }
}

/// Structured command failure (frontend maps codes to localized messages)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandError {
    pub code: CommandErrorCode,
    pub message: String,
}

impl CommandError {
    pub fn new(code: CommandErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Command error codes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandErrorCode {
    InvalidAmount,
    InsufficientBalance,
    AccountNotFound,
    RewardNotFound,
    RedemptionNotFound,
    RewardOutOfStock,
    InvalidState,
    AlreadyUsed,
    Expired,
    ConcurrencyConflict,
    DuplicateCommand,
    InternalError,
    // Storage errors
    StorageFull,
    OutOfMemory,
    StorageCorrupted,
    SystemBusy,
}
