//! Curve Price Model
//!
//! Pure, deterministic pricing for the linear bonding curve.
//!
//! # Design Principles
//!
//! 1. **Pure functions** - No side effects, no global state
//! 2. **Deterministic** - Same inputs produce identical outputs across all platforms
//! 3. **No floats** - All arithmetic uses u64/u128 integers (milli-keys, micro-units)
//! 4. **Overflow is an error** - Checked arithmetic on every path that prices a trade
//!
//! # Type Architecture
//!
//! Pure data types (`LinearCurve`, `PricingError`) are defined in
//! `lib-types::pricing` and re-exported here for convenience.
//!
//! # Usage
//!
//! ```ignore
//! use lib_pricing::{buy_cost, sell_proceeds, LinearCurve, LinearCurveExt};
//! use lib_types::keys;
//!
//! let params = LinearCurve::default();
//! params.validate()?;
//!
//! let cost = buy_cost(&params, 0, keys(100))?;
//! let gross = sell_proceeds(&params, keys(100), keys(100))?;
//! assert_eq!(cost, gross);
//! ```

pub mod model;

#[cfg(test)]
mod golden_vectors;

// Re-export pure data types from lib-types (canonical location)
pub use lib_types::pricing::{LinearCurve, PricingError};

// Re-export computation functions and logic from model
pub use model::{average_key_price, buy_cost, price_impact_bps, sell_proceeds, LinearCurveExt};
