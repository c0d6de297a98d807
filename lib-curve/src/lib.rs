//! Bonding-Curve Trading & Token-Launch Engine
//!
//! Deterministic trading over per-owner bonding curves with a three-stage
//! lifecycle ending in a pro-rata token distribution.
//!
//! # State Machine
//! ```text
//!   ┌────────┐    Thresholds Met     ┌────────┐    Distribution      ┌──────────┐
//!   │ Active │ ────────────────────▶ │ Frozen │ ──────────────────▶ │ Launched │
//!   └────────┘    (owner freeze)     └────────┘    (owner launch)    └──────────┘
//! ```
//! Transitions are irreversible; `Launched` is terminal. Trading is legal in
//! `Active` only, and the snapshot captured at freeze time is the sole input
//! to the launch distribution.
//!
//! # Architecture
//! - `CurveEngine`: concurrent facade; one exclusive lock per curve held
//!   across validate-compute-apply-append
//! - `CurveCell`: curve aggregate + holder ledger + event log, mutated as a
//!   unit under that lock
//! - `HolderLedger`: average-cost positions with realized/unrealized P&L
//! - `FeeSplit`/`FeeLedger`: exact fee decomposition and routed accruals
//! - `LaunchSnapshot`: frozen balances, digest, pro-rata allocation
//! - `EventSink`: persistence seam for the append-only trade log (in-memory
//!   and sled-backed implementations)
//!
//! # Invariants
//! - Supply equals the sum of holder balances, to the milli-key
//! - Reserve equals reserve shares collected minus payouts made, to the
//!   micro-unit
//! - Fee shares of a buy sum exactly to its cost
//! - Launch allocations sum exactly to the configured distribution supply
//! - A rejected operation mutates nothing

pub mod config;
pub mod curve;
pub mod engine;
pub mod events;
pub mod fees;
pub mod launch;
pub mod ledger;
pub mod registry;
pub mod sled_log;
pub mod types;

// Re-export core types
pub use config::{EngineConfig, FeeSplit, LaunchConfig, SELL_TAX_BPS};
pub use curve::{Curve, CurveCell, CurveStats, TopHolder, TradeReceipt};
pub use engine::{BuyQuote, CurveEngine, PositionView, SellQuote};
pub use events::{EventSink, MemoryEventLog, TradeEvent, TradeFees, TradeKind};
pub use fees::{BuyFees, FeeLedger, ReferralRoute, SellFees};
pub use launch::{Allocation, LaunchOutcome, LaunchSnapshot, SnapshotEntry};
pub use ledger::{HolderLedger, HolderPosition};
pub use registry::{CurveRegistry, RegistryStats};
pub use sled_log::SledEventLog;
pub use types::{CurveError, CurveResult, CurveState, LaunchThresholds, Owner, ThresholdProgress};
