//! Redemption - an instance of spending points

use serde::{Deserialize, Serialize};

/// Redemption lifecycle states
///
/// `pending -> approved -> used`, or `pending -> rejected/cancelled`, and any
/// non-terminal state lapses to `expired` when the code is presented past its
/// expiry date. Expiry is checked lazily at verification time; there is no
/// active timer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RedemptionStatus {
    Pending,
    Approved,
    Rejected,
    Used,
    Expired,
    Cancelled,
}

impl RedemptionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RedemptionStatus::Used
                | RedemptionStatus::Rejected
                | RedemptionStatus::Expired
                | RedemptionStatus::Cancelled
        )
    }
}

impl std::fmt::Display for RedemptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RedemptionStatus::Pending => write!(f, "PENDING"),
            RedemptionStatus::Approved => write!(f, "APPROVED"),
            RedemptionStatus::Rejected => write!(f, "REJECTED"),
            RedemptionStatus::Used => write!(f, "USED"),
            RedemptionStatus::Expired => write!(f, "EXPIRED"),
            RedemptionStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Redemption record
///
/// Two creation paths: catalog redemptions (against a reward, points debited
/// at creation) and at-pump redemptions (`reward_id` is None, points debited
/// only at approval). `debited` tracks which side of that line the record is
/// on so reject/cancel refund exactly what was taken and approval never
/// double-debits. Kept forever for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Redemption {
    /// Redemption unique ID
    pub redemption_id: String,
    pub account_id: i64,
    /// None for at-pump redemptions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward_id: Option<i64>,
    pub points_used: i64,
    /// Unique uppercase code, e.g. `RED04217693`
    pub code: String,
    pub status: RedemptionStatus,
    /// Whether points have been debited for this redemption
    pub debited: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_at_pump: Option<String>,
    /// Code no longer honored past this instant (Unix millis)
    pub expiry_date: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_reason: Option<String>,
    pub created_by: String,
    pub created_at: i64,
    pub updated_at: i64,
}
