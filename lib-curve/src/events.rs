//! Trade Events
//!
//! Every state change on a curve appends an immutable event to its per-curve
//! log. The log is the source of truth for volume derivation and audit; the
//! `EventSink` seam carries committed events to durable storage.

use serde::{Deserialize, Serialize};

use lib_types::{AccountId, Amount, CurveId, KeyAmount, Timestamp};

// ============================================================================
// EVENT TYPES
// ============================================================================

/// Per-destination fee breakdown carried on buy events
///
/// Zeroed for every other event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TradeFees {
    /// Share retained in the reserve
    pub reserve: Amount,
    /// Share routed to the curve owner
    pub project: Amount,
    /// Share routed to the platform treasury
    pub platform: Amount,
    /// Share routed to the referrer or rewards pool
    pub referral: Amount,
    /// Sell tax withheld (sell events only)
    pub tax: Amount,
}

/// What kind of state change an event records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeKind {
    /// Keys bought from the curve
    Buy {
        /// Referrer the buy carried, if any
        referrer: Option<AccountId>,
    },
    /// Keys sold back to the curve
    Sell,
    /// Pro-rata token allocation recorded at launch
    LaunchDistribution,
    /// Trading stopped, snapshot captured
    Freeze,
    /// Terminal transition, token mint assigned
    Launch,
}

impl TradeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeKind::Buy { .. } => "buy",
            TradeKind::Sell => "sell",
            TradeKind::LaunchDistribution => "launch_distribution",
            TradeKind::Freeze => "freeze",
            TradeKind::Launch => "launch",
        }
    }

    /// Whether the event moves keys against the reserve
    pub fn is_trade(&self) -> bool {
        matches!(self, TradeKind::Buy { .. } | TradeKind::Sell)
    }
}

/// Immutable append-only log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeEvent {
    /// Per-curve sequence number, monotonic from zero
    pub seq: u64,
    /// Curve the event belongs to
    pub curve_id: CurveId,
    /// Participant the event concerns
    pub participant: AccountId,
    /// Event kind plus kind-specific data
    pub kind: TradeKind,
    /// Keys moved, milli-keys (allocation amount for distributions)
    pub keys: KeyAmount,
    /// Gross notional, micro-units (cost for buys, gross proceeds for sells,
    /// allocated tokens for distributions)
    pub notional: Amount,
    /// Fee breakdown
    pub fees: TradeFees,
    /// Spot price after the event, micro-units per whole key
    pub price: Amount,
    /// Event timestamp, Unix seconds
    pub timestamp: Timestamp,
}

impl TradeEvent {
    pub fn curve_id(&self) -> &CurveId {
        &self.curve_id
    }

    pub fn kind_name(&self) -> &'static str {
        self.kind.as_str()
    }

    pub fn is_trade(&self) -> bool {
        self.kind.is_trade()
    }
}

// ============================================================================
// SINK SEAM
// ============================================================================

/// Durable-storage seam for committed events
///
/// The in-process log stays authoritative; a sink failure is logged and the
/// trade stands. Implementations take `&self` so one sink instance can serve
/// every curve concurrently.
pub trait EventSink: Send + Sync {
    /// Persist one committed event
    fn record(&self, event: &TradeEvent);

    /// Flush any buffered writes
    fn flush(&self);
}

/// In-memory sink for tests and embedding without durable storage
#[derive(Debug, Default)]
pub struct MemoryEventLog {
    events: std::sync::Mutex<Vec<TradeEvent>>,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// All recorded events for one curve, in record order
    pub fn events_for(&self, curve_id: &CurveId) -> Vec<TradeEvent> {
        self.events
            .lock()
            .map(|events| {
                events
                    .iter()
                    .filter(|e| e.curve_id() == curve_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl EventSink for MemoryEventLog {
    fn record(&self, event: &TradeEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(e) => tracing::error!("memory event log poisoned: {}", e),
        }
    }

    fn flush(&self) {}
}

// ============================================================================
// TESTS
// ============================================================================
