//! Engine Configuration
//!
//! Fee schedule, sell tax, launch thresholds, and distribution parameters.
//! All percent-like values are basis points; the canonical defaults are
//! guarded at compile time, custom values at runtime.

use serde::{Deserialize, Serialize};

use lib_types::pricing::LinearCurve;
use lib_types::{units, Amount, Bps, BPS_DENOMINATOR};

use crate::types::{CurveError, CurveResult, LaunchThresholds};

// ============================================================================
// CANONICAL CONSTANTS
// ============================================================================

/// Reserve share of every buy: 94%
pub const RESERVE_SHARE_BPS: Bps = 9_400;

/// Curve-owner (project) share of every buy: 3%
pub const PROJECT_SHARE_BPS: Bps = 300;

/// Platform treasury share of every buy: 2%
pub const PLATFORM_SHARE_BPS: Bps = 200;

/// Referral-or-rewards share of every buy: 1%
pub const REFERRAL_SHARE_BPS: Bps = 100;

/// Flat tax withheld from every sell payout: 5%
pub const SELL_TAX_BPS: Bps = 500;

/// Compile-time assertion: the canonical buy split must cover the cost
/// exactly. Changing the constants to not sum to 100% fails compilation.
const _: () = assert!(
    RESERVE_SHARE_BPS as u32
        + PROJECT_SHARE_BPS as u32
        + PLATFORM_SHARE_BPS as u32
        + REFERRAL_SHARE_BPS as u32
        == BPS_DENOMINATOR as u32,
    "buy fee split must sum to 100%"
);

// ============================================================================
// FEE SPLIT
// ============================================================================

/// Buy-side fee schedule in basis points
///
/// The four shares must sum to exactly `BPS_DENOMINATOR`; the reserve share
/// additionally absorbs the integer-division remainder when a cost is split,
/// so the split of any cost sums back to that cost with no residual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSplit {
    /// Share retained in the curve reserve
    pub reserve_bps: Bps,
    /// Share routed to the curve owner's account
    pub project_bps: Bps,
    /// Share routed to the platform treasury
    pub platform_bps: Bps,
    /// Share routed to the referrer, or to the curve rewards pool when the
    /// buy carries no referrer
    pub referral_bps: Bps,
}

impl Default for FeeSplit {
    fn default() -> Self {
        Self {
            reserve_bps: RESERVE_SHARE_BPS,
            project_bps: PROJECT_SHARE_BPS,
            platform_bps: PLATFORM_SHARE_BPS,
            referral_bps: REFERRAL_SHARE_BPS,
        }
    }
}

impl FeeSplit {
    /// Validate a custom split: shares must sum to exactly 100%
    pub fn validate(&self) -> CurveResult<()> {
        let sum = self.reserve_bps as u32
            + self.project_bps as u32
            + self.platform_bps as u32
            + self.referral_bps as u32;
        if sum != BPS_DENOMINATOR as u32 {
            return Err(CurveError::InvalidParams(format!(
                "fee split sums to {} bps, expected {}",
                sum, BPS_DENOMINATOR
            )));
        }
        Ok(())
    }
}

// ============================================================================
// LAUNCH CONFIGURATION
// ============================================================================

/// Parameters of the pro-rata token distribution performed at launch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchConfig {
    /// Total external-token pool distributed at launch, in token micro-units.
    /// Allocations sum to exactly this value.
    pub distribution_supply: Amount,
    /// Decimal places of the distributed token
    pub token_decimals: u8,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        // 1,000,000 whole tokens at 6 decimals.
        Self {
            distribution_supply: units(1_000_000),
            token_decimals: 6,
        }
    }
}

// ============================================================================
// ENGINE CONFIGURATION
// ============================================================================

/// Complete engine configuration
///
/// One instance per engine; every curve created by that engine prices and
/// splits trades with these parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Linear price model parameters
    pub pricing: LinearCurve,
    /// Buy-side fee schedule
    pub fee_split: FeeSplit,
    /// Flat tax withheld from sell payouts, basis points
    pub sell_tax_bps: Bps,
    /// Freeze eligibility floor
    pub thresholds: LaunchThresholds,
    /// Launch distribution parameters
    pub launch: LaunchConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pricing: LinearCurve::default(),
            fee_split: FeeSplit::default(),
            sell_tax_bps: SELL_TAX_BPS,
            thresholds: LaunchThresholds::default(),
            launch: LaunchConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Canonical pricing and fees with loosened freeze thresholds
    pub fn for_testing() -> Self {
        Self {
            thresholds: LaunchThresholds::for_testing(),
            ..Self::default()
        }
    }

    /// Validate the full configuration
    pub fn validate(&self) -> CurveResult<()> {
        use lib_pricing::LinearCurveExt;

        self.pricing.validate()?;
        self.fee_split.validate()?;
        if self.sell_tax_bps >= BPS_DENOMINATOR {
            return Err(CurveError::InvalidParams(format!(
                "sell tax of {} bps would confiscate the full payout",
                self.sell_tax_bps
            )));
        }
        if self.launch.distribution_supply == 0 {
            return Err(CurveError::InvalidParams(
                "distribution supply must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_split_is_canonical() {
        let split = FeeSplit::default();
        assert_eq!(split.reserve_bps, 9_400);
        assert_eq!(split.project_bps, 300);
        assert_eq!(split.platform_bps, 200);
        assert_eq!(split.referral_bps, 100);
        assert!(split.validate().is_ok());
    }

    #[test]
    fn invariant_split_must_sum_to_full() {
        let split = FeeSplit {
            reserve_bps: 9_400,
            project_bps: 400,
            platform_bps: 100,
            referral_bps: 200,
        };
        // 9400 + 400 + 100 + 200 = 10100
        assert!(split.validate().is_err());
    }

    #[test]
    fn test_default_config_validates() {
        assert!(EngineConfig::default().validate().is_ok());
        assert!(EngineConfig::for_testing().validate().is_ok());
    }

    #[test]
    fn invariant_full_sell_tax_rejected() {
        let config = EngineConfig {
            sell_tax_bps: BPS_DENOMINATOR,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn invariant_zero_distribution_supply_rejected() {
        let config = EngineConfig {
            launch: LaunchConfig {
                distribution_supply: 0,
                token_decimals: 6,
            },
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_roundtrip() {
        let config = EngineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
