//! Pricing primitives for the curve engine.
//!
//! Pure data types for the linear price model. Behavior (integration,
//! quoting) lives in lib-pricing.
//!
//! Rule: These types must remain behavior-free and serialization-stable.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::primitives::{Amount, KeyAmount};

/// Linear price model parameters
///
/// `price(s) = base_price + slope * s`, with `s` in whole keys and prices in
/// micro-units per whole key. Both parameters must be positive: `base_price`
/// keeps `price(0) > 0`, `slope` keeps the price strictly increasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearCurve {
    /// Price of the first key at zero supply, micro-units per key
    pub base_price: Amount,
    /// Price increase per whole key of supply, micro-units per key squared
    pub slope: Amount,
}

impl Default for LinearCurve {
    fn default() -> Self {
        // Canonical launch parameters: price(s) = 0.0001 * s + 0.001 units.
        Self {
            base_price: 1_000,
            slope: 100,
        }
    }
}

impl LinearCurve {
    /// Parameters used across the test suites (same as the canonical set)
    pub fn for_testing() -> Self {
        Self::default()
    }
}

/// Pricing computation failure
///
/// Carried back to the trade executor, which maps it onto its own error
/// space before anything is mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PricingError {
    /// Quantity was zero; every priced operation needs a positive quantity
    ZeroQuantity,
    /// Sell quantity exceeds the current supply
    SupplyExceeded {
        supply: KeyAmount,
        requested: KeyAmount,
    },
    /// Intermediate arithmetic exceeded u128 range
    Overflow,
    /// Model parameters fail validation (zero base price or slope)
    InvalidParams(&'static str),
}

impl fmt::Display for PricingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PricingError::ZeroQuantity => write!(f, "quantity must be positive"),
            PricingError::SupplyExceeded { supply, requested } => write!(
                f,
                "sell of {} milli-keys exceeds supply of {} milli-keys",
                requested, supply
            ),
            PricingError::Overflow => write!(f, "pricing arithmetic overflow"),
            PricingError::InvalidParams(reason) => {
                write!(f, "invalid pricing parameters: {}", reason)
            }
        }
    }
}

impl std::error::Error for PricingError {}
