//! Curve engine primitives.
//! Stable, transport-neutral, behavior-free.
//!
//! Rule: no floats and no String identifiers in engine state. Ever.

pub mod primitives;
pub mod pricing;

pub use primitives::{
    keys, units, AccountId, Amount, Bps, CurveId, KeyAmount, SignedAmount, Timestamp, TokenMint,
    BPS_DENOMINATOR, CURRENCY_DECIMALS, KEY_DECIMALS, MICROS_PER_UNIT, MILLIKEYS_PER_KEY,
};
pub use pricing::{LinearCurve, PricingError};
