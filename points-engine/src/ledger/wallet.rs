//! Wallet store mutation
//!
//! The only path that changes a wallet summary. Every entry kind maps to the
//! counter that absorbs the change alongside `available_points`:
//!
//! | Kind       | Available | Bucket                 |
//! |------------|-----------|------------------------|
//! | Credit     | +points   | total_earned +points   |
//! | Refund     | +points   | redeemed_points -points|
//! | Adjustment | +points   | total_earned +points   |
//! | Debit      | -points   | redeemed_points +points|
//! | Expiry     | -points   | expired_points +points |
//!
//! Refunds unwind the redeemed counter instead of growing total_earned so
//! `available == total_earned - redeemed - expired` holds at all times.

use shared::ledger::{EntryKind, WalletBucket, WalletSummary};

/// Bucket absorbing the change for an entry kind
pub fn bucket_for(kind: EntryKind) -> WalletBucket {
    match kind {
        EntryKind::Credit | EntryKind::Adjustment => WalletBucket::Earned,
        EntryKind::Refund | EntryKind::Debit => WalletBucket::Redeemed,
        EntryKind::Expiry => WalletBucket::Expired,
    }
}

/// Apply a point delta to a wallet summary
///
/// `points` is the positive magnitude; the direction comes from the entry
/// kind. The caller has already validated sufficiency for debit-like kinds.
pub fn apply_delta(
    wallet: &mut WalletSummary,
    kind: EntryKind,
    points: i64,
    sequence: u64,
    now: i64,
) {
    match kind {
        EntryKind::Credit | EntryKind::Adjustment => {
            wallet.total_earned += points;
            wallet.available_points += points;
        }
        EntryKind::Refund => {
            wallet.redeemed_points -= points;
            wallet.available_points += points;
        }
        EntryKind::Debit => {
            wallet.redeemed_points += points;
            wallet.available_points -= points;
        }
        EntryKind::Expiry => {
            wallet.expired_points += points;
            wallet.available_points -= points;
        }
    }
    wallet.last_sequence = sequence;
    wallet.updated_at = now;
    debug_assert!(wallet.is_consistent(), "wallet invariant broken: {wallet:?}");
}
