//! Canonical Primitive Types for the Curve Engine
//!
//! Rule: no floats and no String identifiers in engine state. Ever.
//!
//! These types are the foundational building blocks for all trade-critical
//! data structures. They are designed to be:
//! - Fixed-size (no dynamic allocation)
//! - Deterministically serializable
//! - Exact under integer arithmetic (micro-units and milli-keys)

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// TYPE ALIASES
// ============================================================================

/// Base-currency amounts in micro-units, 6 decimals (1 unit = 1_000_000 micro)
pub type Amount = u128;

/// Signed base-currency amount in micro-units, used for P&L accounting
pub type SignedAmount = i128;

/// Key quantities in milli-keys, 3 decimals (1 key = 1_000 milli-keys)
pub type KeyAmount = u64;

/// Basis points for percentage calculations (10000 = 100%)
pub type Bps = u16;

/// Unix timestamp in seconds
pub type Timestamp = u64;

// ============================================================================
// SCALING CONSTANTS
// ============================================================================

/// Micro-units per whole base-currency unit
pub const MICROS_PER_UNIT: Amount = 1_000_000;

/// Milli-keys per whole key
pub const MILLIKEYS_PER_KEY: KeyAmount = 1_000;

/// Denominator for basis-point arithmetic
pub const BPS_DENOMINATOR: Bps = 10_000;

/// Decimal places of the base currency
pub const CURRENCY_DECIMALS: u8 = 6;

/// Decimal places of key quantities
pub const KEY_DECIMALS: u8 = 3;

/// Convert whole base-currency units to micro-units
pub const fn units(n: u64) -> Amount {
    (n as Amount) * MICROS_PER_UNIT
}

/// Convert whole keys to milli-keys
pub const fn keys(n: u64) -> KeyAmount {
    n * MILLIKEYS_PER_KEY
}

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// 32-byte curve identifier (derived from the owning account)
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize, Default)]
pub struct CurveId(pub [u8; 32]);

impl CurveId {
    /// Create a new CurveId from raw bytes
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create a zeroed CurveId
    pub const fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Get the underlying bytes
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check if this is the zero id
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Debug for CurveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CurveId({})", hex::encode(&self.0[..8]))
    }
}

impl fmt::Display for CurveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

impl From<[u8; 32]> for CurveId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for CurveId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// 32-byte participant account identifier, supplied by the embedding
/// application (the engine treats it as opaque)
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize, Default)]
pub struct AccountId(pub [u8; 32]);

impl AccountId {
    /// Create a new AccountId from raw bytes
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create a zeroed AccountId
    pub const fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Get the underlying bytes
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check if this is the zero account
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", hex::encode(&self.0[..8]))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

impl From<[u8; 32]> for AccountId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for AccountId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// 32-byte external token mint identifier, assigned at launch
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize, Default)]
pub struct TokenMint(pub [u8; 32]);

impl TokenMint {
    /// Create a new TokenMint from raw bytes
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create a zeroed TokenMint
    pub const fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Get the underlying bytes
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check if this is the zero mint
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Debug for TokenMint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenMint({})", hex::encode(&self.0[..8]))
    }
}

impl fmt::Display for TokenMint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

impl From<[u8; 32]> for TokenMint {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for TokenMint {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// ============================================================================
// TESTS
// ============================================================================
