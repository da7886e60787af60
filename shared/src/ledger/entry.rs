//! Ledger entries - immutable facts recorded after command processing

use serde::{Deserialize, Serialize};

/// Kind of point-affecting event
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryKind {
    /// Points earned from a transaction; carries an expiry date
    Credit,
    /// Points spent on a redemption
    Debit,
    /// Points removed by the expiry sweeper
    Expiry,
    /// Manual correction by an operator
    Adjustment,
    /// Points returned after a rejected/cancelled redemption
    Refund,
}

impl EntryKind {
    /// Kinds that add points to the available balance
    pub fn is_credit_like(&self) -> bool {
        matches!(
            self,
            EntryKind::Credit | EntryKind::Refund | EntryKind::Adjustment
        )
    }

    /// Kinds that remove points from the available balance
    pub fn is_debit_like(&self) -> bool {
        matches!(self, EntryKind::Debit | EntryKind::Expiry)
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryKind::Credit => write!(f, "CREDIT"),
            EntryKind::Debit => write!(f, "DEBIT"),
            EntryKind::Expiry => write!(f, "EXPIRY"),
            EntryKind::Adjustment => write!(f, "ADJUSTMENT"),
            EntryKind::Refund => write!(f, "REFUND"),
        }
    }
}

/// One immutable ledger record
///
/// `points` is signed: positive for credit-like entries, negative for
/// debit-like ones, so summing every entry of an account reconstructs its
/// available balance. Entries are never deleted; the only post-creation
/// writes are `consumed_points`/`consumed_at`, which the expiry sweeper
/// advances on the *source* credit entry so the same points are never swept
/// twice while the historical `points` value stays intact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Entry unique ID
    pub entry_id: String,
    /// Global sequence number (authoritative ordering)
    pub sequence: u64,
    pub account_id: i64,
    pub kind: EntryKind,
    /// Signed point delta
    pub points: i64,
    /// Available balance immediately after this entry
    pub balance_after: i64,
    /// Expiry date (Unix millis); set only for Credit entries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<i64>,
    /// Portion of a credit entry already consumed by the expiry sweeper
    #[serde(default)]
    pub consumed_points: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumed_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_redemption_id: Option<String>,
    pub reason: String,
    /// Operator who triggered the entry (snapshot for audit)
    pub created_by: String,
    /// Command that produced this entry (for audit tracing)
    pub command_id: String,
    pub created_at: i64,
}

impl LedgerEntry {
    /// Unconsumed remainder of a credit entry (0 for non-credit kinds)
    pub fn remaining_points(&self) -> i64 {
        if self.kind == EntryKind::Credit {
            (self.points - self.consumed_points).max(0)
        } else {
            0
        }
    }

    /// Whether the sweeper should pick this entry up at `now`
    pub fn is_expirable(&self, now: i64) -> bool {
        self.kind == EntryKind::Credit
            && self.remaining_points() > 0
            && matches!(self.expiry_date, Some(expiry) if expiry <= now)
    }
}
