//! Concurrent Engine Facade
//!
//! The external interface of the engine. One exclusive lock per curve, held
//! across validate-compute-apply-append; curves trade in parallel with each
//! other. Reads go through a published aggregate map refreshed after every
//! commit, so they never contend with the trade path and are stale by at
//! most one in-flight trade.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;

use lib_pricing::{average_key_price, buy_cost, price_impact_bps, sell_proceeds, LinearCurveExt};
use lib_types::{
    AccountId, Amount, Bps, CurveId, KeyAmount, SignedAmount, Timestamp,
};

use crate::config::EngineConfig;
use crate::curve::{Curve, CurveStats, TradeReceipt};
use crate::events::{EventSink, TradeEvent, TradeFees};
use crate::fees::{BuyFees, ReferralRoute, SellFees};
use crate::launch::LaunchOutcome;
use crate::registry::{CellHandle, CurveRegistry, RegistryStats};
use crate::types::{CurveError, CurveResult, CurveState, Owner};

/// Wall-clock Unix seconds; the deterministic core never reads this itself
fn unix_now() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

// ============================================================================
// READ-SIDE VIEWS
// ============================================================================

/// Read-only preview of a buy; execution with the same quantity at the same
/// supply produces exactly these numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyQuote {
    pub keys: KeyAmount,
    pub cost: Amount,
    /// Average price per whole key
    pub price_per_key: Amount,
    pub fees: TradeFees,
    pub spot_before: Amount,
    pub spot_after: Amount,
    pub price_impact_bps: i64,
}

/// Read-only preview of a sell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellQuote {
    pub keys: KeyAmount,
    /// Gross proceeds before tax
    pub proceeds: Amount,
    pub tax: Amount,
    pub payout: Amount,
    pub price_per_key: Amount,
    pub spot_before: Amount,
    pub spot_after: Amount,
    pub price_impact_bps: i64,
}

/// One participant's position as surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionView {
    pub account: AccountId,
    pub balance: KeyAmount,
    pub avg_price: Amount,
    pub total_invested: Amount,
    pub realized_pnl: SignedAmount,
    /// Computed against the live spot price at read time
    pub unrealized_pnl: SignedAmount,
    /// Share of current supply, basis points
    pub share_bps: Bps,
    pub first_buy_at: Timestamp,
    pub last_trade_at: Timestamp,
}

// ============================================================================
// ENGINE
// ============================================================================

/// The bonding-curve trading and token-launch engine
#[derive(Clone)]
pub struct CurveEngine {
    registry: Arc<RwLock<CurveRegistry>>,
    /// Aggregate snapshots refreshed after every commit
    published: Arc<RwLock<HashMap<CurveId, Curve>>>,
    config: EngineConfig,
    sink: Option<Arc<dyn EventSink>>,
}

impl CurveEngine {
    pub fn new(config: EngineConfig) -> CurveResult<Self> {
        config.validate()?;
        Ok(Self {
            registry: Arc::new(RwLock::new(CurveRegistry::new())),
            published: Arc::new(RwLock::new(HashMap::new())),
            config,
            sink: None,
        })
    }

    /// Engine with a durable event sink; sink failures never fail a trade
    pub fn with_sink(config: EngineConfig, sink: Arc<dyn EventSink>) -> CurveResult<Self> {
        let mut engine = Self::new(config)?;
        engine.sink = Some(sink);
        Ok(engine)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // CURVE MANAGEMENT
    // ------------------------------------------------------------------

    /// Create a curve for an owner; `DuplicateCurve` if one exists
    pub async fn create_curve(&self, owner: Owner) -> CurveResult<Curve> {
        let now = unix_now();
        let handle = self.registry.write().await.create(owner, self.config, now)?;
        let curve = handle.lock().await.curve.clone();
        self.publish(curve.clone()).await;
        Ok(curve)
    }

    /// Published aggregate, at most one trade stale
    pub async fn get_curve(&self, id: &CurveId) -> CurveResult<Curve> {
        self.published
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or(CurveError::CurveNotFound)
    }

    pub async fn get_curve_by_owner(&self, owner: &Owner) -> CurveResult<Curve> {
        let handle = self
            .registry
            .read()
            .await
            .get_by_owner(owner)
            .ok_or(CurveError::CurveNotFound)?;
        let curve = handle.lock().await.curve.clone();
        Ok(curve)
    }

    /// Published aggregates of every curve in the given state
    pub async fn list_by_state(&self, state: CurveState) -> Vec<Curve> {
        let ids = self.registry.read().await.ids_by_state(state);
        let published = self.published.read().await;
        ids.iter().filter_map(|id| published.get(id).cloned()).collect()
    }

    /// Active curves currently meeting every freeze threshold
    pub async fn ready_to_freeze(&self) -> Vec<CurveId> {
        let ids = self.registry.read().await.ids_by_state(CurveState::Active);
        let mut ready = Vec::new();
        for id in ids {
            if let Some(handle) = self.registry.read().await.get(&id) {
                if handle.lock().await.can_freeze() {
                    ready.push(id);
                }
            }
        }
        ready
    }

    pub async fn registry_stats(&self) -> RegistryStats {
        self.registry.read().await.stats()
    }

    // ------------------------------------------------------------------
    // QUOTES (read-only)
    // ------------------------------------------------------------------

    /// Preview a buy without committing anything
    pub async fn quote_buy(&self, id: &CurveId, keys: KeyAmount) -> CurveResult<BuyQuote> {
        let handle = self.handle(id).await?;
        let cell = handle.lock().await;
        if !cell.curve.state.can_trade() {
            return Err(CurveError::CurveNotActive {
                state: cell.curve.state,
            });
        }
        if keys == 0 {
            return Err(CurveError::InvalidQuantity);
        }

        let pricing = &self.config.pricing;
        let supply = cell.curve.supply;
        let cost = buy_cost(pricing, supply, keys)?;
        // Quotes carry no referrer; the split is identical either way.
        let fees = BuyFees::split(cost, &self.config.fee_split, ReferralRoute::RewardsPool)?;

        let spot_before = pricing.spot_price(supply);
        let spot_after = pricing.spot_price(supply.checked_add(keys).ok_or(CurveError::Overflow)?);

        Ok(BuyQuote {
            keys,
            cost,
            price_per_key: average_key_price(cost, keys),
            fees: TradeFees {
                reserve: fees.reserve,
                project: fees.project,
                platform: fees.platform,
                referral: fees.referral,
                tax: 0,
            },
            spot_before,
            spot_after,
            price_impact_bps: price_impact_bps(spot_before, spot_after),
        })
    }

    /// Preview a sell without committing anything
    pub async fn quote_sell(&self, id: &CurveId, keys: KeyAmount) -> CurveResult<SellQuote> {
        let handle = self.handle(id).await?;
        let cell = handle.lock().await;
        if !cell.curve.state.can_trade() {
            return Err(CurveError::CurveNotActive {
                state: cell.curve.state,
            });
        }
        if keys == 0 {
            return Err(CurveError::InvalidQuantity);
        }

        let pricing = &self.config.pricing;
        let supply = cell.curve.supply;
        let proceeds = sell_proceeds(pricing, supply, keys)?;
        let fees = SellFees::split(proceeds, self.config.sell_tax_bps)?;

        let spot_before = pricing.spot_price(supply);
        let spot_after = pricing.spot_price(supply - keys);

        Ok(SellQuote {
            keys,
            proceeds,
            tax: fees.tax,
            payout: fees.payout,
            price_per_key: average_key_price(proceeds, keys),
            spot_before,
            spot_after,
            price_impact_bps: price_impact_bps(spot_before, spot_after),
        })
    }

    // ------------------------------------------------------------------
    // TRADES
    // ------------------------------------------------------------------

    /// Buy keys; serializes with every other mutation on the same curve
    pub async fn buy(
        &self,
        id: &CurveId,
        participant: AccountId,
        keys: KeyAmount,
        referrer: Option<AccountId>,
    ) -> CurveResult<TradeReceipt> {
        let handle = self.handle(id).await?;
        let now = unix_now();

        let (receipt, curve) = {
            let mut cell = handle.lock().await;
            let first_new_seq = cell.next_seq();
            let receipt = cell.apply_buy(participant, keys, referrer, now)?;
            self.forward_events(cell.events_since(first_new_seq));
            (receipt, cell.curve.clone())
        };

        self.publish(curve).await;
        Ok(receipt)
    }

    /// Sell keys back to the curve
    pub async fn sell(
        &self,
        id: &CurveId,
        participant: AccountId,
        keys: KeyAmount,
    ) -> CurveResult<TradeReceipt> {
        let handle = self.handle(id).await?;
        let now = unix_now();

        let (receipt, curve) = {
            let mut cell = handle.lock().await;
            let first_new_seq = cell.next_seq();
            let receipt = cell.apply_sell(participant, keys, now)?;
            self.forward_events(cell.events_since(first_new_seq));
            (receipt, cell.curve.clone())
        };

        self.publish(curve).await;
        Ok(receipt)
    }

    // ------------------------------------------------------------------
    // POSITIONS & EVENTS
    // ------------------------------------------------------------------

    /// A participant's position, or `None` if they never traded this curve
    pub async fn position(
        &self,
        id: &CurveId,
        participant: &AccountId,
    ) -> CurveResult<Option<PositionView>> {
        let handle = self.handle(id).await?;
        let cell = handle.lock().await;
        let spot = self.config.pricing.spot_price(cell.curve.supply);
        let supply = cell.curve.supply;

        Ok(cell
            .ledger()
            .position(participant)
            .map(|pos| view_of(*participant, pos, spot, supply)))
    }

    /// Holders ranked by balance descending
    pub async fn holders(&self, id: &CurveId, limit: usize) -> CurveResult<Vec<PositionView>> {
        let handle = self.handle(id).await?;
        let cell = handle.lock().await;
        let spot = self.config.pricing.spot_price(cell.curve.supply);
        let supply = cell.curve.supply;

        Ok(cell
            .ledger()
            .ranked(limit)
            .into_iter()
            .map(|(account, pos)| view_of(account, &pos, spot, supply))
            .collect())
    }

    /// Events most recent first
    pub async fn events(&self, id: &CurveId, limit: usize) -> CurveResult<Vec<TradeEvent>> {
        let handle = self.handle(id).await?;
        let cell = handle.lock().await;
        Ok(cell.recent_events(limit))
    }

    /// Derived statistics at the current instant
    pub async fn stats(&self, id: &CurveId) -> CurveResult<CurveStats> {
        let handle = self.handle(id).await?;
        let cell = handle.lock().await;
        Ok(cell.stats(unix_now()))
    }

    // ------------------------------------------------------------------
    // LIFECYCLE
    // ------------------------------------------------------------------

    /// Stop trading and capture the launch snapshot
    pub async fn freeze(&self, id: &CurveId, requester: AccountId) -> CurveResult<Curve> {
        let handle = self.handle(id).await?;
        let now = unix_now();

        let curve = {
            let mut cell = handle.lock().await;
            let first_new_seq = cell.next_seq();
            let curve = cell.freeze(requester, now)?;
            self.forward_events(cell.events_since(first_new_seq));
            curve
        };

        self.registry
            .write()
            .await
            .update_state(id, CurveState::Active, CurveState::Frozen);
        self.publish(curve.clone()).await;
        Ok(curve)
    }

    /// Distribute tokens pro-rata and terminate the curve
    pub async fn launch(
        &self,
        id: &CurveId,
        requester: AccountId,
        initial_price: Amount,
    ) -> CurveResult<LaunchOutcome> {
        let handle = self.handle(id).await?;
        let now = unix_now();

        let outcome = {
            let mut cell = handle.lock().await;
            let first_new_seq = cell.next_seq();
            let outcome = cell.launch(requester, initial_price, now)?;
            self.forward_events(cell.events_since(first_new_seq));
            outcome
        };

        self.registry
            .write()
            .await
            .update_state(id, CurveState::Frozen, CurveState::Launched);
        self.publish(outcome.curve.clone()).await;
        Ok(outcome)
    }

    /// Flush the durable sink, if one is configured
    pub fn flush_sink(&self) {
        if let Some(sink) = &self.sink {
            sink.flush();
        }
    }

    // ------------------------------------------------------------------
    // INTERNALS
    // ------------------------------------------------------------------

    async fn handle(&self, id: &CurveId) -> CurveResult<CellHandle> {
        self.registry
            .read()
            .await
            .get(id)
            .ok_or(CurveError::CurveNotFound)
    }

    async fn publish(&self, curve: Curve) {
        self.published.write().await.insert(curve.id, curve);
    }

    fn forward_events(&self, events: &[TradeEvent]) {
        if let Some(sink) = &self.sink {
            for event in events {
                sink.record(event);
            }
        }
    }
}

fn view_of(
    account: AccountId,
    pos: &crate::ledger::HolderPosition,
    spot: Amount,
    supply: KeyAmount,
) -> PositionView {
    PositionView {
        account,
        balance: pos.balance,
        avg_price: pos.avg_price,
        total_invested: pos.total_invested,
        realized_pnl: pos.realized_pnl,
        unrealized_pnl: pos.unrealized_pnl(spot),
        share_bps: if supply == 0 {
            0
        } else {
            ((pos.balance as u128) * 10_000 / supply as u128) as Bps
        },
        first_buy_at: pos.first_buy_at,
        last_trade_at: pos.last_trade_at,
    }
}

// ============================================================================
// TESTS
// ============================================================================
