//! Launch Snapshot and Pro-Rata Distribution
//!
//! The snapshot is captured exactly once, at the active -> frozen transition,
//! and is the sole input to the launch distribution. Frozen curves cannot
//! trade, so nothing after the freeze can move an allocation.
//!
//! # Invariants
//! - Allocations sum to exactly the configured distribution supply; the
//!   floor-division remainder goes to the largest holder, ties broken by
//!   ascending account id
//! - The digest commits to the full holder set and is an input to the token
//!   mint, so the mint pins the distribution it paid out

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use lib_types::{
    AccountId, Amount, Bps, CurveId, KeyAmount, Timestamp, TokenMint, BPS_DENOMINATOR,
};

use crate::curve::Curve;

// ============================================================================
// SNAPSHOT
// ============================================================================

/// One holder's balance at snapshot time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub account: AccountId,
    /// Balance at the freeze instant, milli-keys
    pub balance: KeyAmount,
    /// Share of snapshot supply, basis points (truncated)
    pub share_bps: Bps,
}

/// Immutable copy of every nonzero holder balance at freeze time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchSnapshot {
    pub curve_id: CurveId,
    /// Entries in ascending account-id order (the canonical encoding)
    pub entries: Vec<SnapshotEntry>,
    /// Sum of all entry balances, milli-keys
    pub total_supply: KeyAmount,
    /// sha256 over the canonical encoding
    pub digest: [u8; 32],
    pub captured_at: Timestamp,
}

impl LaunchSnapshot {
    /// Capture a snapshot from the ledger's balance map
    ///
    /// The map comes from `HolderLedger::snapshot`, already restricted to
    /// nonzero balances and ordered by account id.
    pub fn capture(
        curve_id: CurveId,
        balances: BTreeMap<AccountId, KeyAmount>,
        captured_at: Timestamp,
    ) -> Self {
        let total_supply: KeyAmount = balances.values().sum();

        let entries: Vec<SnapshotEntry> = balances
            .into_iter()
            .map(|(account, balance)| SnapshotEntry {
                account,
                balance,
                share_bps: share_bps(balance, total_supply),
            })
            .collect();

        let mut hasher = Sha256::new();
        hasher.update(curve_id.as_bytes());
        hasher.update(total_supply.to_be_bytes());
        for entry in &entries {
            hasher.update(entry.account.as_bytes());
            hasher.update(entry.balance.to_be_bytes());
        }
        let digest: [u8; 32] = hasher.finalize().into();

        Self {
            curve_id,
            entries,
            total_supply,
            digest,
            captured_at,
        }
    }

    pub fn holder_count(&self) -> usize {
        self.entries.len()
    }

    /// Compute the pro-rata allocation of `distribution_supply` tokens
    ///
    /// Floor division per entry; the remainder is assigned to the largest
    /// holder so the allocations sum exactly. Returns an empty list for an
    /// empty snapshot (unreachable behind the freeze thresholds).
    pub fn distribute(&self, distribution_supply: Amount) -> Vec<Allocation> {
        if self.total_supply == 0 {
            return Vec::new();
        }

        let mut allocations: Vec<Allocation> = self
            .entries
            .iter()
            .map(|entry| Allocation {
                account: entry.account,
                snapshot_balance: entry.balance,
                share_bps: entry.share_bps,
                // balance and total fit u64; the product fits u128 for any
                // realistic distribution supply.
                amount: (entry.balance as u128) * distribution_supply
                    / (self.total_supply as u128),
            })
            .collect();

        let floored: Amount = allocations.iter().map(|a| a.amount).sum();
        let remainder = distribution_supply - floored;
        if remainder > 0 {
            // Entries are in ascending account order, so strict `>` lands
            // the remainder on the lowest account id among tied balances.
            if let Some(largest) = allocations
                .iter_mut()
                .reduce(|best, a| if a.snapshot_balance > best.snapshot_balance { a } else { best })
            {
                largest.amount += remainder;
            }
        }

        allocations
    }

    /// Derive the external token mint from the curve, the snapshot digest,
    /// and the launch timestamp
    pub fn derive_token_mint(&self, launched_at: Timestamp) -> TokenMint {
        let mut hasher = Sha256::new();
        hasher.update(b"token-mint");
        hasher.update(self.curve_id.as_bytes());
        hasher.update(self.digest);
        hasher.update(launched_at.to_be_bytes());
        TokenMint::new(hasher.finalize().into())
    }
}

fn share_bps(balance: KeyAmount, total: KeyAmount) -> Bps {
    if total == 0 {
        return 0;
    }
    ((balance as u128) * BPS_DENOMINATOR as u128 / total as u128) as Bps
}

// ============================================================================
// DISTRIBUTION RESULT
// ============================================================================

/// One holder's launch allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub account: AccountId,
    /// Balance the allocation was computed from, milli-keys
    pub snapshot_balance: KeyAmount,
    /// Share of snapshot supply, basis points
    pub share_bps: Bps,
    /// Allocated external tokens, token micro-units
    pub amount: Amount,
}

/// Result of a successful launch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchOutcome {
    /// The curve record after the terminal transition
    pub curve: Curve,
    /// The derived token mint
    pub token_mint: TokenMint,
    /// Every holder's allocation
    pub distributions: Vec<Allocation>,
    /// Sum of all allocations; equals the configured distribution supply
    pub distributed_total: Amount,
    /// Caller-supplied listing price of the external token
    pub initial_price: Amount,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use lib_types::keys;

    fn account(n: u8) -> AccountId {
        AccountId::new([n; 32])
    }

    fn snapshot_of(balances: &[(u8, KeyAmount)]) -> LaunchSnapshot {
        let map: BTreeMap<AccountId, KeyAmount> = balances
            .iter()
            .map(|(n, b)| (account(*n), *b))
            .collect();
        LaunchSnapshot::capture(CurveId::new([7u8; 32]), map, 1_700_000_000)
    }

    #[test]
    fn test_capture_totals_and_shares() {
        let snap = snapshot_of(&[(1, keys(100)), (2, keys(50)), (3, keys(50))]);

        assert_eq!(snap.total_supply, keys(200));
        assert_eq!(snap.holder_count(), 3);
        assert_eq!(snap.entries[0].share_bps, 5_000);
        assert_eq!(snap.entries[1].share_bps, 2_500);
        assert_eq!(snap.entries[2].share_bps, 2_500);
    }

    #[test]
    fn test_digest_changes_with_balances() {
        let a = snapshot_of(&[(1, keys(100)), (2, keys(50))]);
        let b = snapshot_of(&[(1, keys(100)), (2, keys(51))]);
        let c = snapshot_of(&[(1, keys(100)), (2, keys(50))]);

        assert_ne!(a.digest, b.digest);
        assert_eq!(a.digest, c.digest);
    }

    #[test]
    fn invariant_distribution_sums_exactly() {
        // Three-way split of a supply that does not divide evenly.
        let snap = snapshot_of(&[(1, keys(1)), (2, keys(1)), (3, keys(1))]);
        let supply: Amount = 1_000_000_000_001;

        let allocations = snap.distribute(supply);
        let total: Amount = allocations.iter().map(|a| a.amount).sum();
        assert_eq!(total, supply);
    }

    #[test]
    fn test_remainder_goes_to_largest_holder() {
        let snap = snapshot_of(&[(1, keys(10)), (2, keys(70)), (3, keys(20))]);
        let allocations = snap.distribute(1_000_000_000_001);

        let largest = allocations.iter().find(|a| a.account == account(2)).unwrap();
        let floored = (keys(70) as u128) * 1_000_000_000_001 / (keys(100) as u128);
        assert!(largest.amount > floored - 1);
        assert!(largest.amount >= floored);

        let total: Amount = allocations.iter().map(|a| a.amount).sum();
        assert_eq!(total, 1_000_000_000_001);
    }

    #[test]
    fn test_remainder_tie_breaks_by_account_id() {
        // Two equal holders; an odd supply leaves a remainder of 1.
        let snap = snapshot_of(&[(5, keys(10)), (3, keys(10))]);
        let allocations = snap.distribute(101);

        let to_3 = allocations.iter().find(|a| a.account == account(3)).unwrap();
        let to_5 = allocations.iter().find(|a| a.account == account(5)).unwrap();
        assert_eq!(to_3.amount, 51);
        assert_eq!(to_5.amount, 50);
    }

    #[test]
    fn test_proportionality() {
        let snap = snapshot_of(&[(1, keys(75)), (2, keys(25))]);
        let allocations = snap.distribute(1_000_000);

        let to_1 = allocations.iter().find(|a| a.account == account(1)).unwrap();
        let to_2 = allocations.iter().find(|a| a.account == account(2)).unwrap();
        assert_eq!(to_1.amount, 750_000);
        assert_eq!(to_2.amount, 250_000);
    }

    #[test]
    fn test_mint_derivation_is_deterministic() {
        let snap = snapshot_of(&[(1, keys(100))]);

        let mint_a = snap.derive_token_mint(1_700_000_100);
        let mint_b = snap.derive_token_mint(1_700_000_100);
        let mint_c = snap.derive_token_mint(1_700_000_101);

        assert_eq!(mint_a, mint_b);
        assert_ne!(mint_a, mint_c);
        assert!(!mint_a.is_zero());
    }

    #[test]
    fn test_empty_snapshot_distributes_nothing() {
        let snap = snapshot_of(&[]);
        assert!(snap.distribute(1_000_000).is_empty());
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let snap = snapshot_of(&[(1, keys(100)), (2, keys(50))]);
        let encoded = bincode::serialize(&snap).unwrap();
        let decoded: LaunchSnapshot = bincode::deserialize(&encoded).unwrap();
        assert_eq!(snap, decoded);
    }
}
