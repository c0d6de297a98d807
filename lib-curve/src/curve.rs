//! Curve Aggregate and Trade Application
//!
//! `Curve` is the published aggregate record; `CurveCell` bundles it with the
//! holder ledger, the event log, the fee accruals, the rolling volume window,
//! and the launch snapshot slot. A cell is mutated as a unit under one
//! exclusive lock per curve.
//!
//! # Invariants
//! - Every mutating entry point is validate-then-apply: all checked
//!   arithmetic and precondition checks complete before the first write
//! - `supply` equals the ledger's total balance after every commit
//! - `reserve` changes only by the reserve share of buys and the payout of
//!   sells
//! - Lifecycle transitions are irreversible and snapshot capture happens in
//!   the same mutation path that admits trades

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::VecDeque;

use lib_pricing::{average_key_price, buy_cost, price_impact_bps, sell_proceeds, LinearCurveExt};
use lib_types::{
    AccountId, Amount, Bps, CurveId, KeyAmount, Timestamp, TokenMint, MILLIKEYS_PER_KEY,
};

use crate::config::EngineConfig;
use crate::events::{TradeEvent, TradeFees, TradeKind};
use crate::fees::{BuyFees, FeeLedger, ReferralRoute, SellFees};
use crate::launch::{LaunchOutcome, LaunchSnapshot};
use crate::ledger::HolderLedger;
use crate::types::{CurveError, CurveResult, CurveState, Owner, ThresholdProgress};

/// Rolling-volume window length
const SECONDS_PER_DAY: u64 = 86_400;

/// Holders included in a stats reading
const TOP_HOLDERS_IN_STATS: usize = 10;

// ============================================================================
// AGGREGATE RECORD
// ============================================================================

/// The published per-curve aggregate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Curve {
    pub id: CurveId,
    pub owner: Owner,
    pub state: CurveState,
    /// Outstanding keys, milli-keys
    pub supply: KeyAmount,
    /// Reserve balance, micro-units
    pub reserve: Amount,
    /// Holders with a nonzero balance (derived, maintained transactionally)
    pub holder_count: u32,
    /// Gross notional ever traded, micro-units
    pub volume_total: Amount,
    /// Gross notional traded in the trailing day, micro-units
    pub volume_24h: Amount,
    /// External token mint, set at launch
    pub token_mint: Option<TokenMint>,
    pub created_at: Timestamp,
    pub launched_at: Option<Timestamp>,
}

impl Curve {
    /// Deterministic curve id from the owner (ownership is 1:1)
    pub fn derive_id(owner: &Owner) -> CurveId {
        let mut hasher = Sha256::new();
        hasher.update(b"curve-id");
        hasher.update(owner.kind().as_bytes());
        hasher.update(owner.account().as_bytes());
        CurveId::new(hasher.finalize().into())
    }
}

/// Receipt returned to the caller of a committed trade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeReceipt {
    pub curve_id: CurveId,
    pub participant: AccountId,
    pub kind: TradeKind,
    /// Keys moved, milli-keys
    pub keys: KeyAmount,
    /// Gross notional: cost paid for buys, gross proceeds for sells
    pub notional: Amount,
    /// Amount paid out to the seller, zero for buys
    pub payout: Amount,
    pub fees: TradeFees,
    /// Average price actually paid/received per whole key
    pub price_per_key: Amount,
    /// Spot price after the trade
    pub spot_price: Amount,
    pub supply_after: KeyAmount,
    pub reserve_after: Amount,
    /// Per-curve event sequence number
    pub seq: u64,
    pub timestamp: Timestamp,
}

// ============================================================================
// STATS
// ============================================================================

/// One ranked holder in a stats reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopHolder {
    pub account: AccountId,
    pub balance: KeyAmount,
    /// Share of current supply, basis points
    pub share_bps: Bps,
}

/// Point-in-time derived statistics, computed on read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveStats {
    pub spot_price: Amount,
    /// `supply x spot price`, micro-units
    pub market_cap: Amount,
    pub volume_24h: Amount,
    pub volume_total: Amount,
    /// Spot move versus the newest event older than 24h; absent without a
    /// baseline
    pub price_change_24h_bps: Option<i64>,
    pub progress: ThresholdProgress,
    pub top_holders: Vec<TopHolder>,
}

// ============================================================================
// CELL
// ============================================================================

/// One curve's complete mutable state, locked as a unit
#[derive(Debug, Clone)]
pub struct CurveCell {
    pub curve: Curve,
    config: EngineConfig,
    ledger: HolderLedger,
    events: Vec<TradeEvent>,
    fee_ledger: FeeLedger,
    snapshot: Option<LaunchSnapshot>,
    /// (timestamp, gross notional) pairs inside the trailing day
    window: VecDeque<(Timestamp, Amount)>,
    next_seq: u64,
}

impl CurveCell {
    pub fn new(owner: Owner, config: EngineConfig, created_at: Timestamp) -> Self {
        let id = Curve::derive_id(&owner);
        Self {
            curve: Curve {
                id,
                owner,
                state: CurveState::Active,
                supply: 0,
                reserve: 0,
                holder_count: 0,
                volume_total: 0,
                volume_24h: 0,
                token_mint: None,
                created_at,
                launched_at: None,
            },
            config,
            ledger: HolderLedger::new(),
            events: Vec::new(),
            fee_ledger: FeeLedger::new(),
            snapshot: None,
            window: VecDeque::new(),
            next_seq: 0,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn ledger(&self) -> &HolderLedger {
        &self.ledger
    }

    pub fn fee_ledger(&self) -> &FeeLedger {
        &self.fee_ledger
    }

    pub fn snapshot(&self) -> Option<&LaunchSnapshot> {
        self.snapshot.as_ref()
    }

    /// Events most recent first
    pub fn recent_events(&self, limit: usize) -> Vec<TradeEvent> {
        self.events.iter().rev().take(limit).cloned().collect()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Events appended at or after the given sequence number, oldest first.
    /// The engine uses this to forward freshly committed events to the sink.
    /// The log is append-only and `seq` is assigned from its length, so a
    /// sequence number is also an index into it.
    pub fn events_since(&self, seq: u64) -> &[TradeEvent] {
        let start = (seq as usize).min(self.events.len());
        &self.events[start..]
    }

    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    fn require_active(&self) -> CurveResult<()> {
        if !self.curve.state.can_trade() {
            return Err(CurveError::CurveNotActive {
                state: self.curve.state,
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // TRADES
    // ------------------------------------------------------------------

    /// Validate and apply a buy
    pub fn apply_buy(
        &mut self,
        participant: AccountId,
        keys: KeyAmount,
        referrer: Option<AccountId>,
        timestamp: Timestamp,
    ) -> CurveResult<TradeReceipt> {
        self.require_active()?;
        if keys == 0 {
            return Err(CurveError::InvalidQuantity);
        }
        if referrer == Some(participant) {
            return Err(CurveError::Unauthorized);
        }

        let cost = buy_cost(&self.config.pricing, self.curve.supply, keys)?;
        let route = referrer
            .map(ReferralRoute::Referrer)
            .unwrap_or(ReferralRoute::RewardsPool);
        let fees = BuyFees::split(cost, &self.config.fee_split, route)?;

        // Everything that can fail happens before the first write.
        let new_supply = self
            .curve
            .supply
            .checked_add(keys)
            .ok_or(CurveError::Overflow)?;
        let new_reserve = self
            .curve
            .reserve
            .checked_add(fees.reserve)
            .ok_or(CurveError::Overflow)?;
        let new_volume_total = self
            .curve
            .volume_total
            .checked_add(cost)
            .ok_or(CurveError::Overflow)?;

        let new_holder = self.ledger.apply_buy(participant, keys, cost, timestamp)?;

        self.curve.supply = new_supply;
        self.curve.reserve = new_reserve;
        self.curve.volume_total = new_volume_total;
        if new_holder {
            self.curve.holder_count += 1;
        }
        self.roll_volume(timestamp, cost);
        self.fee_ledger
            .accrue_buy(self.curve.id, self.curve.owner.account(), &fees);

        let spot = self.config.pricing.spot_price(new_supply);
        let event_fees = TradeFees {
            reserve: fees.reserve,
            project: fees.project,
            platform: fees.platform,
            referral: fees.referral,
            tax: 0,
        };
        let seq = self.append_event(
            participant,
            TradeKind::Buy { referrer },
            keys,
            cost,
            event_fees,
            spot,
            timestamp,
        );

        tracing::debug!(
            curve = %self.curve.id,
            participant = %participant,
            keys,
            cost,
            supply = new_supply,
            reserve = new_reserve,
            "buy applied"
        );

        Ok(TradeReceipt {
            curve_id: self.curve.id,
            participant,
            kind: TradeKind::Buy { referrer },
            keys,
            notional: cost,
            payout: 0,
            fees: event_fees,
            price_per_key: average_key_price(cost, keys),
            spot_price: spot,
            supply_after: new_supply,
            reserve_after: new_reserve,
            seq,
            timestamp,
        })
    }

    /// Validate and apply a sell
    pub fn apply_sell(
        &mut self,
        participant: AccountId,
        keys: KeyAmount,
        timestamp: Timestamp,
    ) -> CurveResult<TradeReceipt> {
        self.require_active()?;
        if keys == 0 {
            return Err(CurveError::InvalidQuantity);
        }

        let balance = self
            .ledger
            .position(&participant)
            .map(|p| p.balance)
            .unwrap_or(0);
        if keys > balance {
            return Err(CurveError::InsufficientBalance {
                balance,
                requested: keys,
            });
        }

        let gross = sell_proceeds(&self.config.pricing, self.curve.supply, keys)?;
        let fees = SellFees::split(gross, self.config.sell_tax_bps)?;

        // A hit here means reserve accounting already broke.
        if self.curve.reserve < gross {
            tracing::error!(
                curve = %self.curve.id,
                reserve = self.curve.reserve,
                required = gross,
                "reserve invariant violated"
            );
            return Err(CurveError::InsufficientReserve {
                reserve: self.curve.reserve,
                required: gross,
            });
        }

        let new_supply = self
            .curve
            .supply
            .checked_sub(keys)
            .ok_or(CurveError::Overflow)?;
        let new_reserve = self
            .curve
            .reserve
            .checked_sub(fees.payout)
            .ok_or(CurveError::Overflow)?;
        let new_volume_total = self
            .curve
            .volume_total
            .checked_add(gross)
            .ok_or(CurveError::Overflow)?;

        let emptied = self
            .ledger
            .apply_sell(participant, keys, fees.payout, timestamp)?;

        self.curve.supply = new_supply;
        self.curve.reserve = new_reserve;
        self.curve.volume_total = new_volume_total;
        if emptied {
            self.curve.holder_count = self.curve.holder_count.saturating_sub(1);
        }
        self.roll_volume(timestamp, gross);
        self.fee_ledger.accrue_sell_tax(&fees);

        let spot = self.config.pricing.spot_price(new_supply);
        let event_fees = TradeFees {
            tax: fees.tax,
            ..TradeFees::default()
        };
        let seq = self.append_event(
            participant,
            TradeKind::Sell,
            keys,
            gross,
            event_fees,
            spot,
            timestamp,
        );

        tracing::debug!(
            curve = %self.curve.id,
            participant = %participant,
            keys,
            gross,
            payout = fees.payout,
            supply = new_supply,
            reserve = new_reserve,
            "sell applied"
        );

        Ok(TradeReceipt {
            curve_id: self.curve.id,
            participant,
            kind: TradeKind::Sell,
            keys,
            notional: gross,
            payout: fees.payout,
            fees: event_fees,
            price_per_key: average_key_price(gross, keys),
            spot_price: spot,
            supply_after: new_supply,
            reserve_after: new_reserve,
            seq,
            timestamp,
        })
    }

    // ------------------------------------------------------------------
    // LIFECYCLE
    // ------------------------------------------------------------------

    /// Whether the curve currently meets every freeze threshold
    pub fn can_freeze(&self) -> bool {
        self.curve.state == CurveState::Active
            && self.config.thresholds.are_met(
                self.curve.supply,
                self.curve.holder_count,
                self.curve.reserve,
            )
    }

    /// Active -> Frozen: stop trading and capture the snapshot
    pub fn freeze(&mut self, requester: AccountId, timestamp: Timestamp) -> CurveResult<Curve> {
        if requester != self.curve.owner.account() {
            return Err(CurveError::Unauthorized);
        }
        if self.curve.state != CurveState::Active {
            return Err(CurveError::InvalidStateTransition {
                from: self.curve.state,
                to: CurveState::Frozen,
            });
        }

        let thresholds = &self.config.thresholds;
        if !thresholds.are_met(self.curve.supply, self.curve.holder_count, self.curve.reserve) {
            return Err(CurveError::ThresholdsNotMet {
                supply: self.curve.supply,
                min_supply: thresholds.min_supply,
                holders: self.curve.holder_count,
                min_holders: thresholds.min_holders,
                reserve: self.curve.reserve,
                min_reserve: thresholds.min_reserve,
            });
        }

        let snapshot =
            LaunchSnapshot::capture(self.curve.id, self.ledger.snapshot(), timestamp);
        tracing::info!(
            curve = %self.curve.id,
            holders = snapshot.holder_count(),
            supply = snapshot.total_supply,
            digest = %hex::encode(&snapshot.digest[..8]),
            "curve frozen, snapshot captured"
        );
        self.snapshot = Some(snapshot);
        self.curve.state = CurveState::Frozen;

        let spot = self.config.pricing.spot_price(self.curve.supply);
        self.append_event(
            requester,
            TradeKind::Freeze,
            self.curve.supply,
            self.curve.reserve,
            TradeFees::default(),
            spot,
            timestamp,
        );

        Ok(self.curve.clone())
    }

    /// Frozen -> Launched: distribute tokens pro-rata and terminate
    pub fn launch(
        &mut self,
        requester: AccountId,
        initial_price: Amount,
        timestamp: Timestamp,
    ) -> CurveResult<LaunchOutcome> {
        if requester != self.curve.owner.account() {
            return Err(CurveError::Unauthorized);
        }
        match self.curve.state {
            CurveState::Launched => return Err(CurveError::AlreadyLaunched),
            CurveState::Active => {
                return Err(CurveError::InvalidStateTransition {
                    from: CurveState::Active,
                    to: CurveState::Launched,
                })
            }
            CurveState::Frozen => {}
        }

        let snapshot = self
            .snapshot
            .as_ref()
            .ok_or(CurveError::InvalidStateTransition {
                from: self.curve.state,
                to: CurveState::Launched,
            })?
            .clone();

        let distributions = snapshot.distribute(self.config.launch.distribution_supply);
        let distributed_total: Amount = distributions.iter().map(|a| a.amount).sum();
        let token_mint = snapshot.derive_token_mint(timestamp);

        for allocation in &distributions {
            self.append_event(
                allocation.account,
                TradeKind::LaunchDistribution,
                allocation.snapshot_balance,
                allocation.amount,
                TradeFees::default(),
                initial_price,
                timestamp,
            );
        }

        self.curve.token_mint = Some(token_mint);
        self.curve.launched_at = Some(timestamp);
        self.curve.state = CurveState::Launched;

        self.append_event(
            requester,
            TradeKind::Launch,
            snapshot.total_supply,
            distributed_total,
            TradeFees::default(),
            initial_price,
            timestamp,
        );

        tracing::info!(
            curve = %self.curve.id,
            mint = %token_mint,
            holders = distributions.len(),
            distributed = distributed_total,
            "curve launched"
        );

        Ok(LaunchOutcome {
            curve: self.curve.clone(),
            token_mint,
            distributions,
            distributed_total,
            initial_price,
        })
    }

    // ------------------------------------------------------------------
    // DERIVED READS
    // ------------------------------------------------------------------

    /// Derived statistics at the given instant
    pub fn stats(&self, now: Timestamp) -> CurveStats {
        let spot = self.config.pricing.spot_price(self.curve.supply);
        let market_cap =
            (self.curve.supply as u128).saturating_mul(spot) / MILLIKEYS_PER_KEY as u128;

        // Newest event old enough to serve as the 24h baseline.
        let baseline = self
            .events
            .iter()
            .rev()
            .find(|e| e.timestamp.saturating_add(SECONDS_PER_DAY) <= now)
            .map(|e| e.price);
        let price_change_24h_bps =
            baseline.filter(|b| *b > 0).map(|b| price_impact_bps(b, spot));

        let top_holders = self
            .ledger
            .ranked(TOP_HOLDERS_IN_STATS)
            .into_iter()
            .map(|(account, pos)| TopHolder {
                account,
                balance: pos.balance,
                share_bps: if self.curve.supply == 0 {
                    0
                } else {
                    ((pos.balance as u128) * 10_000 / self.curve.supply as u128) as Bps
                },
            })
            .collect();

        CurveStats {
            spot_price: spot,
            market_cap,
            volume_24h: self.curve.volume_24h,
            volume_total: self.curve.volume_total,
            price_change_24h_bps,
            progress: self.config.thresholds.progress(
                self.curve.supply,
                self.curve.holder_count,
                self.curve.reserve,
            ),
            top_holders,
        }
    }

    // ------------------------------------------------------------------
    // INTERNALS
    // ------------------------------------------------------------------

    fn roll_volume(&mut self, now: Timestamp, notional: Amount) {
        self.window.push_back((now, notional));
        let cutoff = now.saturating_sub(SECONDS_PER_DAY);
        while matches!(self.window.front(), Some((ts, _)) if *ts < cutoff) {
            self.window.pop_front();
        }
        self.curve.volume_24h = self.window.iter().map(|(_, v)| v).sum();
    }

    #[allow(clippy::too_many_arguments)]
    fn append_event(
        &mut self,
        participant: AccountId,
        kind: TradeKind,
        keys: KeyAmount,
        notional: Amount,
        fees: TradeFees,
        price: Amount,
        timestamp: Timestamp,
    ) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.events.push(TradeEvent {
            seq,
            curve_id: self.curve.id,
            participant,
            kind,
            keys,
            notional,
            fees,
            price,
            timestamp,
        });
        seq
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use lib_types::{keys, units};

    fn account(n: u8) -> AccountId {
        AccountId::new([n; 32])
    }

    fn owner_account() -> AccountId {
        account(1)
    }

    fn test_cell() -> CurveCell {
        CurveCell::new(
            Owner::User(owner_account()),
            EngineConfig::for_testing(),
            1_700_000_000,
        )
    }

    fn strict_cell() -> CurveCell {
        CurveCell::new(
            Owner::User(owner_account()),
            EngineConfig::default(),
            1_700_000_000,
        )
    }

    #[test]
    fn test_new_cell_starts_empty_and_active() {
        let cell = test_cell();
        assert_eq!(cell.curve.state, CurveState::Active);
        assert_eq!(cell.curve.supply, 0);
        assert_eq!(cell.curve.reserve, 0);
        assert_eq!(cell.curve.holder_count, 0);
        assert!(cell.curve.token_mint.is_none());
        assert_eq!(cell.event_count(), 0);
    }

    #[test]
    fn test_id_derivation_is_stable_and_owner_scoped() {
        let user = Owner::User(account(1));
        let project = Owner::Project(account(1));
        assert_eq!(Curve::derive_id(&user), Curve::derive_id(&user));
        // Same account, different owner kind, different curve.
        assert_ne!(Curve::derive_id(&user), Curve::derive_id(&project));
    }

    #[test]
    fn test_concrete_scenario() {
        // price(s) = 0.0001*s + 0.001 units: the canonical parameters.
        let mut cell = test_cell();

        // First participant buys 100 keys from zero supply.
        let receipt = cell
            .apply_buy(account(2), keys(100), None, 1_700_000_100)
            .unwrap();
        assert_eq!(receipt.notional, 600_000);
        assert_eq!(cell.curve.supply, keys(100));
        assert_eq!(cell.curve.holder_count, 1);
        assert_eq!(cell.curve.reserve, 564_000);

        // Second participant buys 50 keys.
        let receipt = cell
            .apply_buy(account(3), keys(50), None, 1_700_000_200)
            .unwrap();
        assert_eq!(receipt.notional, 675_000);
        assert_eq!(cell.curve.holder_count, 2);

        // Second participant sells 30 keys at supply 150.
        let receipt = cell
            .apply_sell(account(3), keys(30), 1_700_000_300)
            .unwrap();
        assert_eq!(receipt.notional, 435_000);
        assert_eq!(receipt.fees.tax, 21_750);
        assert_eq!(receipt.payout, 413_250);
        assert_eq!(cell.curve.supply, keys(120));
        assert_eq!(cell.curve.holder_count, 2);
    }

    #[test]
    fn invariant_conservation_after_trade_sequence() {
        let mut cell = test_cell();
        let mut reserve_shares: Amount = 0;
        let mut payouts: Amount = 0;

        let r = cell.apply_buy(account(2), keys(100), None, 1).unwrap();
        reserve_shares += r.fees.reserve;
        let r = cell.apply_buy(account(3), keys(50), None, 2).unwrap();
        reserve_shares += r.fees.reserve;
        let r = cell.apply_sell(account(3), keys(30), 3).unwrap();
        payouts += r.payout;
        let r = cell.apply_buy(account(4), keys(7), Some(account(2)), 4).unwrap();
        reserve_shares += r.fees.reserve;
        let r = cell.apply_sell(account(2), keys(100), 5).unwrap();
        payouts += r.payout;

        assert_eq!(cell.curve.supply, cell.ledger().total_balance());
        assert_eq!(cell.curve.reserve, reserve_shares - payouts);
    }

    #[test]
    fn test_round_trip_returns_supply_and_reserve_net_of_fees() {
        let mut cell = test_cell();
        cell.apply_buy(account(2), keys(500), None, 1).unwrap();
        let supply_before = cell.curve.supply;
        let reserve_before = cell.curve.reserve;

        let buy = cell.apply_buy(account(3), keys(40), None, 2).unwrap();
        let sell = cell.apply_sell(account(3), keys(40), 3).unwrap();

        // Same integral both ways at the same boundary.
        assert_eq!(buy.notional, sell.notional);
        assert_eq!(cell.curve.supply, supply_before);
        // Reserve differs only by the buy's routed fees and the sell tax.
        assert_eq!(
            cell.curve.reserve,
            reserve_before + buy.fees.reserve - sell.payout
        );
    }

    #[test]
    fn invariant_oversell_changes_nothing() {
        let mut cell = test_cell();
        cell.apply_buy(account(2), keys(10), None, 1).unwrap();
        let before = cell.curve.clone();
        let events_before = cell.event_count();

        let result = cell.apply_sell(account(2), keys(11), 2);
        assert!(matches!(result, Err(CurveError::InsufficientBalance { .. })));
        assert_eq!(cell.curve, before);
        assert_eq!(cell.event_count(), events_before);
    }

    #[test]
    fn invariant_zero_quantity_rejected() {
        let mut cell = test_cell();
        assert_eq!(
            cell.apply_buy(account(2), 0, None, 1),
            Err(CurveError::InvalidQuantity)
        );
        assert_eq!(
            cell.apply_sell(account(2), 0, 1),
            Err(CurveError::InvalidQuantity)
        );
    }

    #[test]
    fn invariant_self_referral_rejected() {
        let mut cell = test_cell();
        let result = cell.apply_buy(account(2), keys(10), Some(account(2)), 1);
        assert_eq!(result, Err(CurveError::Unauthorized));
        assert_eq!(cell.curve.supply, 0);
    }

    #[test]
    fn test_referral_share_routes_to_referrer() {
        let mut cell = test_cell();
        cell.apply_buy(account(2), keys(100), Some(account(9)), 1)
            .unwrap();

        assert_eq!(cell.fee_ledger().referrer_accrued(&account(9)), 6_000);
        assert_eq!(cell.fee_ledger().rewards_pool_accrued(), 0);

        cell.apply_buy(account(3), keys(10), None, 2).unwrap();
        assert!(cell.fee_ledger().rewards_pool_accrued() > 0);
    }

    #[test]
    fn test_volume_window_prunes_old_trades() {
        let mut cell = test_cell();
        cell.apply_buy(account(2), keys(10), None, 1_000).unwrap();
        let first_volume = cell.curve.volume_24h;
        assert!(first_volume > 0);

        // A day later the first trade ages out of the window.
        cell.apply_buy(account(2), keys(10), None, 1_000 + 90_000)
            .unwrap();
        assert!(cell.curve.volume_24h < cell.curve.volume_total);
        assert_eq!(cell.event_count(), 2);
    }

    #[test]
    fn invariant_freeze_requires_owner() {
        let mut cell = test_cell();
        cell.apply_buy(account(2), keys(100), None, 1).unwrap();
        assert_eq!(cell.freeze(account(2), 2), Err(CurveError::Unauthorized));
        assert_eq!(cell.curve.state, CurveState::Active);
    }

    #[test]
    fn invariant_freeze_gated_by_thresholds() {
        let mut cell = strict_cell();
        // One holder, tiny supply: well below the 100-key/4-holder/10-unit floor.
        cell.apply_buy(account(2), keys(10), None, 1).unwrap();

        let result = cell.freeze(owner_account(), 2);
        assert!(matches!(result, Err(CurveError::ThresholdsNotMet { .. })));

        // Curve stays active and tradable after the failed attempt.
        assert_eq!(cell.curve.state, CurveState::Active);
        assert!(cell.apply_buy(account(3), keys(5), None, 3).is_ok());
    }

    #[test]
    fn test_freeze_meets_default_thresholds() {
        let mut cell = strict_cell();
        // Four holders, >=100 keys, reserve >= 10 units.
        for (n, amount) in [(2u8, 400u64), (3, 300), (4, 200), (5, 100)] {
            cell.apply_buy(account(n), keys(amount), None, 1).unwrap();
        }
        assert!(cell.curve.reserve >= units(10));
        assert!(cell.can_freeze());

        let curve = cell.freeze(owner_account(), 100).unwrap();
        assert_eq!(curve.state, CurveState::Frozen);
        let snapshot = cell.snapshot().unwrap();
        assert_eq!(snapshot.holder_count(), 4);
        assert_eq!(snapshot.total_supply, keys(1_000));
    }

    #[test]
    fn invariant_no_trading_after_freeze() {
        let mut cell = test_cell();
        cell.apply_buy(account(2), keys(100), None, 1).unwrap();
        cell.freeze(owner_account(), 2).unwrap();

        assert_eq!(
            cell.apply_buy(account(3), keys(1), None, 3),
            Err(CurveError::CurveNotActive {
                state: CurveState::Frozen
            })
        );
        assert_eq!(
            cell.apply_sell(account(2), keys(1), 3),
            Err(CurveError::CurveNotActive {
                state: CurveState::Frozen
            })
        );
    }

    #[test]
    fn invariant_double_freeze_rejected() {
        let mut cell = test_cell();
        cell.apply_buy(account(2), keys(100), None, 1).unwrap();
        cell.freeze(owner_account(), 2).unwrap();

        assert_eq!(
            cell.freeze(owner_account(), 3),
            Err(CurveError::InvalidStateTransition {
                from: CurveState::Frozen,
                to: CurveState::Frozen,
            })
        );
    }

    #[test]
    fn invariant_launch_requires_frozen() {
        let mut cell = test_cell();
        cell.apply_buy(account(2), keys(100), None, 1).unwrap();

        assert_eq!(
            cell.launch(owner_account(), 1_000, 2),
            Err(CurveError::InvalidStateTransition {
                from: CurveState::Active,
                to: CurveState::Launched,
            })
        );
    }

    #[test]
    fn test_launch_distributes_exactly_and_terminates() {
        let mut cell = test_cell();
        cell.apply_buy(account(2), keys(100), None, 1).unwrap();
        cell.apply_buy(account(3), keys(33), None, 2).unwrap();
        cell.apply_buy(account(4), keys(67), None, 3).unwrap();
        cell.freeze(owner_account(), 10).unwrap();

        let outcome = cell.launch(owner_account(), 2_000, 20).unwrap();
        let expected = cell.config().launch.distribution_supply;

        assert_eq!(outcome.distributed_total, expected);
        let sum: Amount = outcome.distributions.iter().map(|a| a.amount).sum();
        assert_eq!(sum, expected);
        assert_eq!(outcome.distributions.len(), 3);
        assert_eq!(outcome.curve.state, CurveState::Launched);
        assert_eq!(outcome.curve.token_mint, Some(outcome.token_mint));
        assert_eq!(outcome.curve.launched_at, Some(20));

        // Distribution event per holder plus the launch marker.
        let events = cell.recent_events(100);
        let dist = events
            .iter()
            .filter(|e| e.kind == TradeKind::LaunchDistribution)
            .count();
        assert_eq!(dist, 3);
        assert_eq!(events[0].kind, TradeKind::Launch);
    }

    #[test]
    fn invariant_second_launch_is_already_launched() {
        let mut cell = test_cell();
        cell.apply_buy(account(2), keys(100), None, 1).unwrap();
        cell.freeze(owner_account(), 2).unwrap();
        cell.launch(owner_account(), 1_000, 3).unwrap();

        let events_before = cell.event_count();
        assert_eq!(
            cell.launch(owner_account(), 1_000, 4),
            Err(CurveError::AlreadyLaunched)
        );
        // No additional distribution events.
        assert_eq!(cell.event_count(), events_before);

        // Launched rejects everything else too.
        assert!(matches!(
            cell.apply_buy(account(2), keys(1), None, 5),
            Err(CurveError::CurveNotActive { .. })
        ));
        assert!(matches!(
            cell.freeze(owner_account(), 5),
            Err(CurveError::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn test_stats_reading() {
        let mut cell = test_cell();
        cell.apply_buy(account(2), keys(100), None, 1_000).unwrap();
        cell.apply_buy(account(3), keys(50), None, 2_000).unwrap();

        let stats = cell.stats(3_000);
        // spot at 150 keys: 1_000 + 100 * 150 = 16_000 micro/key.
        assert_eq!(stats.spot_price, 16_000);
        assert_eq!(stats.market_cap, 150 * 16_000);
        assert_eq!(stats.volume_total, 600_000 + 675_000);
        assert_eq!(stats.top_holders.len(), 2);
        assert_eq!(stats.top_holders[0].account, account(2));
        // 100 of 150 keys: 66.66% truncates to 6666 bps.
        assert_eq!(stats.top_holders[0].share_bps, 6_666);
        // No event older than 24h yet.
        assert!(stats.price_change_24h_bps.is_none());

        // A day later the trades become the baseline.
        let stats = cell.stats(2_000 + 86_400);
        assert_eq!(stats.price_change_24h_bps, Some(0));
    }

    #[test]
    fn test_events_since_forwards_only_new() {
        let mut cell = test_cell();
        cell.apply_buy(account(2), keys(10), None, 1).unwrap();
        cell.apply_buy(account(3), keys(10), None, 2).unwrap();

        assert_eq!(cell.events_since(0).len(), 2);
        assert_eq!(cell.events_since(1).len(), 1);
        assert_eq!(cell.events_since(2).len(), 0);
        // Past the end of the log is empty, not a panic.
        assert_eq!(cell.events_since(100).len(), 0);

        // Sequence numbers are also log indexes.
        let slice = cell.events_since(1);
        assert_eq!(slice[0].seq, 1);
    }
}
