//! Linear Price Integration (Pure Functions)
//!
//! Deterministic cost/proceeds computation for the linear bonding curve.
//!
//! # Rules (enforced in code)
//!
//! - No floats - all arithmetic is integer (milli-keys in, micro-units out)
//! - u128 arithmetic internally, checked on every trade-pricing path
//! - Buy and sell evaluate the same closed-form integral over the same
//!   interval with the same truncating division, so they are exact inverses
//!   for the same quantity at the same boundary
//!
//! # Units
//!
//! Supply and quantities arrive in milli-keys (`s = S / 1000` whole keys);
//! prices are micro-units per whole key. The instantaneous price truncates to
//! the micro-unit, which makes it a step function at milli-key granularity:
//! non-decreasing everywhere, strictly increasing across whole-key steps.
//! The cost integral below does not inherit that truncation; it divides once.

use lib_types::pricing::{LinearCurve, PricingError};
use lib_types::{Amount, KeyAmount, MILLIKEYS_PER_KEY};

/// Milli-keys per key, widened for u128 arithmetic
const SCALE: u128 = MILLIKEYS_PER_KEY as u128;

/// Common denominator of the cost integral: 2 * SCALE^2
const COST_DENOMINATOR: u128 = 2 * SCALE * SCALE;

// =============================================================================
// PARAMETER BEHAVIOR
// =============================================================================

/// Behavior attached to the pure `LinearCurve` parameter type
pub trait LinearCurveExt {
    /// Validate the parameters: both must be positive so the price starts
    /// above zero and increases strictly with supply
    fn validate(&self) -> Result<(), PricingError>;

    /// Instantaneous price at the given supply, micro-units per whole key
    ///
    /// `price(s) = base_price + slope * s`, truncated to the micro-unit.
    /// Saturating: the spot price is display/event data, not trade money.
    fn spot_price(&self, supply: KeyAmount) -> Amount;
}

impl LinearCurveExt for LinearCurve {
    fn validate(&self) -> Result<(), PricingError> {
        if self.base_price == 0 {
            return Err(PricingError::InvalidParams("base_price must be positive"));
        }
        if self.slope == 0 {
            return Err(PricingError::InvalidParams("slope must be positive"));
        }
        Ok(())
    }

    fn spot_price(&self, supply: KeyAmount) -> Amount {
        let rise = self.slope.saturating_mul(supply as u128) / SCALE;
        self.base_price.saturating_add(rise)
    }
}

// =============================================================================
// COST INTEGRATION (PURE FUNCTIONS)
// =============================================================================

/// Cost of buying `delta` milli-keys at the given supply
///
/// The definite integral of the price function from `supply` to
/// `supply + delta`.
///
/// # Algorithm
///
/// ```text
/// With L = supply, D = delta (milli-keys), K = SCALE:
///
/// cost = integral of (base + slope*s) ds over [L/K, (L+D)/K]
///      = (slope*D*(2L + D) + 2*K*base*D) / (2*K^2)
///
/// evaluated as a single truncating u128 division.
/// ```
pub fn buy_cost(
    params: &LinearCurve,
    supply: KeyAmount,
    delta: KeyAmount,
) -> Result<Amount, PricingError> {
    segment_cost(params, supply, delta)
}

/// Gross proceeds of selling `delta` milli-keys at the given supply
///
/// The definite integral of the price function from `supply - delta` to
/// `supply`. Exactly equal to `buy_cost(supply - delta, delta)`, which is
/// what makes an immediate buy/sell round trip reversible.
pub fn sell_proceeds(
    params: &LinearCurve,
    supply: KeyAmount,
    delta: KeyAmount,
) -> Result<Amount, PricingError> {
    if delta > supply {
        return Err(PricingError::SupplyExceeded {
            supply,
            requested: delta,
        });
    }
    segment_cost(params, supply - delta, delta)
}

/// Integral of the price function over `[lower, lower + delta)` milli-keys
fn segment_cost(
    params: &LinearCurve,
    lower: KeyAmount,
    delta: KeyAmount,
) -> Result<Amount, PricingError> {
    if delta == 0 {
        return Err(PricingError::ZeroQuantity);
    }

    let lower = lower as u128;
    let delta = delta as u128;

    // slope * D * (2L + D)
    let span = (2 * lower)
        .checked_add(delta)
        .ok_or(PricingError::Overflow)?;
    let slope_term = params
        .slope
        .checked_mul(delta)
        .and_then(|v| v.checked_mul(span))
        .ok_or(PricingError::Overflow)?;

    // 2 * SCALE * base * D
    let base_term = params
        .base_price
        .checked_mul(delta)
        .and_then(|v| v.checked_mul(2 * SCALE))
        .ok_or(PricingError::Overflow)?;

    let numerator = slope_term
        .checked_add(base_term)
        .ok_or(PricingError::Overflow)?;

    Ok(numerator / COST_DENOMINATOR)
}

// =============================================================================
// QUOTE HELPERS
// =============================================================================

/// Average price actually paid/received per whole key, micro-units
///
/// Zero quantity yields zero rather than an error; quote assembly guards
/// quantities before pricing.
pub fn average_key_price(total: Amount, delta: KeyAmount) -> Amount {
    if delta == 0 {
        return 0;
    }
    total.saturating_mul(SCALE) / (delta as u128)
}

/// Signed spot-price move in basis points between two price readings
///
/// Positive for buys (price rises with supply), negative for sells.
pub fn price_impact_bps(before: Amount, after: Amount) -> i64 {
    if before == 0 {
        return 0;
    }
    let diff = (after as i128) - (before as i128);
    let bps = diff.saturating_mul(10_000) / (before as i128);
    bps.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

// =============================================================================
// TESTS
// =============================================================================
