//! Holder Position Ledger
//!
//! Per-curve map of participant to position. Average-cost accounting: buys
//! re-weight the cost basis, sells release basis at the running average and
//! realize P&L against it. Positions are never deleted; a balance may fall
//! to zero and the row stays for P&L history.
//!
//! # Invariants
//! - `balance >= 0` always; an oversell is rejected before any mutation
//! - The sum of all balances equals the curve supply (enforced by the trade
//!   path, checkable via `total_balance`)
//! - `avg_price` changes only on buys; a sell leaves it unchanged for the
//!   remaining balance

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use lib_types::{
    AccountId, Amount, KeyAmount, SignedAmount, Timestamp, MILLIKEYS_PER_KEY,
};

use crate::types::{CurveError, CurveResult};

// ============================================================================
// POSITION
// ============================================================================

/// One participant's position on one curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderPosition {
    /// Current balance, milli-keys
    pub balance: KeyAmount,
    /// Weighted-average cost per whole key, micro-units
    pub avg_price: Amount,
    /// Cost basis still held (reduced proportionally on sells), micro-units
    pub total_invested: Amount,
    /// P&L realized against average cost, micro-units
    pub realized_pnl: SignedAmount,
    /// Timestamp of the first buy
    pub first_buy_at: Timestamp,
    /// Timestamp of the most recent buy or sell
    pub last_trade_at: Timestamp,
}

impl HolderPosition {
    fn open(timestamp: Timestamp) -> Self {
        Self {
            balance: 0,
            avg_price: 0,
            total_invested: 0,
            realized_pnl: 0,
            first_buy_at: timestamp,
            last_trade_at: timestamp,
        }
    }

    /// Unrealized P&L at the given spot price, computed on read so it can
    /// never go stale against the live curve
    pub fn unrealized_pnl(&self, spot_price: Amount) -> SignedAmount {
        let value = (self.balance as u128).saturating_mul(spot_price) / MILLIKEYS_PER_KEY as u128;
        value as SignedAmount - self.total_invested as SignedAmount
    }
}

// ============================================================================
// LEDGER
// ============================================================================

/// All positions on one curve, keyed by participant
///
/// BTreeMap keeps iteration deterministic, which the snapshot digest and the
/// distribution remainder rule both depend on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HolderLedger {
    positions: BTreeMap<AccountId, HolderPosition>,
}

impl HolderLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self, participant: &AccountId) -> Option<&HolderPosition> {
        self.positions.get(participant)
    }

    /// Apply a buy: balance grows, cost basis re-weights
    ///
    /// Returns `true` when the participant moves from zero to a nonzero
    /// balance (the holder-count trigger).
    pub fn apply_buy(
        &mut self,
        participant: AccountId,
        keys: KeyAmount,
        cost: Amount,
        timestamp: Timestamp,
    ) -> CurveResult<bool> {
        if keys == 0 {
            return Err(CurveError::InvalidQuantity);
        }

        let current = self
            .positions
            .get(&participant)
            .copied()
            .unwrap_or_else(|| HolderPosition::open(timestamp));

        // Validate everything before touching the map.
        let new_balance = current
            .balance
            .checked_add(keys)
            .ok_or(CurveError::Overflow)?;
        let new_invested = current
            .total_invested
            .checked_add(cost)
            .ok_or(CurveError::Overflow)?;
        let new_avg = new_invested
            .checked_mul(MILLIKEYS_PER_KEY as u128)
            .ok_or(CurveError::Overflow)?
            / new_balance as u128;

        let was_empty = current.balance == 0;
        let entry = self
            .positions
            .entry(participant)
            .or_insert_with(|| HolderPosition::open(timestamp));
        entry.balance = new_balance;
        entry.total_invested = new_invested;
        entry.avg_price = new_avg;
        entry.last_trade_at = timestamp;

        Ok(was_empty)
    }

    /// Apply a sell: balance shrinks, basis is released proportionally and
    /// P&L is realized against it
    ///
    /// `payout` is what the seller actually receives (net of tax). Returns
    /// `true` when the balance reaches zero (the holder-count trigger).
    pub fn apply_sell(
        &mut self,
        participant: AccountId,
        keys: KeyAmount,
        payout: Amount,
        timestamp: Timestamp,
    ) -> CurveResult<bool> {
        if keys == 0 {
            return Err(CurveError::InvalidQuantity);
        }

        let current = self
            .positions
            .get(&participant)
            .copied()
            .unwrap_or_else(|| HolderPosition::open(timestamp));

        if keys > current.balance {
            return Err(CurveError::InsufficientBalance {
                balance: current.balance,
                requested: keys,
            });
        }

        // Proportional release empties the basis exactly on a full exit,
        // which keys * avg_price (truncated) would not.
        let released = current
            .total_invested
            .checked_mul(keys as u128)
            .ok_or(CurveError::Overflow)?
            / current.balance as u128;
        let realized = payout as SignedAmount - released as SignedAmount;

        let entry = self
            .positions
            .get_mut(&participant)
            .ok_or(CurveError::InsufficientBalance {
                balance: 0,
                requested: keys,
            })?;
        entry.balance -= keys;
        entry.total_invested -= released;
        entry.realized_pnl += realized;
        entry.last_trade_at = timestamp;

        Ok(entry.balance == 0)
    }

    /// Immutable copy of every nonzero balance
    pub fn snapshot(&self) -> BTreeMap<AccountId, KeyAmount> {
        self.positions
            .iter()
            .filter(|(_, p)| p.balance > 0)
            .map(|(account, p)| (*account, p.balance))
            .collect()
    }

    /// Number of participants with a nonzero balance
    pub fn holder_count(&self) -> u32 {
        self.positions.values().filter(|p| p.balance > 0).count() as u32
    }

    /// Sum of all balances, for conservation checks
    pub fn total_balance(&self) -> KeyAmount {
        self.positions.values().map(|p| p.balance).sum()
    }

    /// Positions ranked by balance descending, ties by account id
    pub fn ranked(&self, limit: usize) -> Vec<(AccountId, HolderPosition)> {
        let mut all: Vec<_> = self
            .positions
            .iter()
            .filter(|(_, p)| p.balance > 0)
            .map(|(account, p)| (*account, *p))
            .collect();
        all.sort_by(|a, b| b.1.balance.cmp(&a.1.balance).then(a.0.cmp(&b.0)));
        all.truncate(limit);
        all
    }

    /// Every position ever opened, zero balances included
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================
