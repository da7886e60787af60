//! Wallet summary - denormalized per-account balance snapshot

use serde::{Deserialize, Serialize};

/// Counter that absorbs a wallet change alongside `available_points`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WalletBucket {
    Earned,
    Redeemed,
    Expired,
}

/// Per-account points summary
///
/// Mutated exclusively by the ledger engine, atomically with the entry that
/// describes the change. Invariant at all times:
/// `available_points == total_earned - redeemed_points - expired_points`,
/// with `available_points >= 0`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WalletSummary {
    pub account_id: i64,
    pub total_earned: i64,
    pub available_points: i64,
    pub redeemed_points: i64,
    pub expired_points: i64,
    /// Sequence of the last entry applied to this summary
    pub last_sequence: u64,
    pub updated_at: i64,
}

impl WalletSummary {
    pub fn new(account_id: i64) -> Self {
        Self {
            account_id,
            total_earned: 0,
            available_points: 0,
            redeemed_points: 0,
            expired_points: 0,
            last_sequence: 0,
            updated_at: 0,
        }
    }

    /// Check the conservation invariant
    pub fn is_consistent(&self) -> bool {
        self.available_points >= 0
            && self.available_points
                == self.total_earned - self.redeemed_points - self.expired_points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_wallet_is_consistent() {
        assert!(WalletSummary::new(1).is_consistent());
    }

    #[test]
    fn test_inconsistent_wallet_detected() {
        let mut w = WalletSummary::new(1);
        w.total_earned = 100;
        w.available_points = 90; // 10 points unaccounted for
        assert!(!w.is_consistent());

        w.redeemed_points = 10;
        assert!(w.is_consistent());
    }

    #[test]
    fn test_negative_available_is_inconsistent() {
        let mut w = WalletSummary::new(1);
        w.total_earned = 10;
        w.redeemed_points = 20;
        w.available_points = -10;
        assert!(!w.is_consistent());
    }
}
