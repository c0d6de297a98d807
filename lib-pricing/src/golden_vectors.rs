//! Golden Vector Tests for the Linear Price Model
//!
//! These tests define EXACT expected values for specific inputs. If any of
//! these tests fail, quote and execution math has diverged from the canonical
//! curve and every stored reserve/volume figure becomes suspect.
//!
//! # Purpose
//!
//! Golden vectors ensure:
//! 1. Price integration is deterministic across all platforms
//! 2. Changes to the pricing logic are intentional (not accidental regressions)
//! 3. Engine, quotes, and any external consumer compute identical numbers
//!
//! # Updating Golden Vectors
//!
//! If you need to change pricing logic:
//! 1. Update the computation code
//! 2. Update these vectors with new expected values
//! 3. Re-derive any stored aggregate that was priced under the old curve

#[cfg(test)]
mod tests {
    use crate::{buy_cost, sell_proceeds, LinearCurve, LinearCurveExt};
    use lib_types::keys;

    // =========================================================================
    // GOLDEN VECTOR: First buy on an empty curve
    // =========================================================================

    /// Golden vector: 100 keys bought at zero supply
    ///
    /// Canonical parameters: base_price = 1_000, slope = 100 (micro-units).
    ///
    /// Closed form, whole-key units:
    /// - slope term: 0.0001 * 100^2 / 2          = 0.5 units
    /// - base term:  0.001 * 100                 = 0.1 units
    /// - cost: 0.6 units                         = 600_000 micro
    ///
    /// Integer form, milli-keys (L = 0, D = 100_000):
    /// - slope term: 100 * 100_000 * 100_000     = 1_000_000_000_000
    /// - base term:  1_000 * 100_000 * 2_000     = 200_000_000_000
    /// - numerator: 1_200_000_000_000
    /// - cost: numerator / 2_000_000             = 600_000
    #[test]
    fn golden_first_buy_hundred_keys() {
        let params = LinearCurve::default();
        let cost = buy_cost(&params, 0, keys(100)).unwrap();
        assert_eq!(cost, 600_000, "Golden vector mismatch: first_buy_hundred_keys");
    }

    // =========================================================================
    // GOLDEN VECTOR: Second buy at supply 100
    // =========================================================================

    /// Golden vector: 50 keys bought at supply 100
    ///
    /// Closed form: 0.0001 * (100*50 + 50^2/2) + 0.001 * 50
    ///            = 0.0001 * 6_250 + 0.05
    ///            = 0.675 units = 675_000 micro
    #[test]
    fn golden_second_buy_fifty_keys() {
        let params = LinearCurve::default();
        let cost = buy_cost(&params, keys(100), keys(50)).unwrap();
        assert_eq!(cost, 675_000, "Golden vector mismatch: second_buy_fifty_keys");
    }

    // =========================================================================
    // GOLDEN VECTOR: Sell at supply 150
    // =========================================================================

    /// Golden vector: 30 keys sold at supply 150 (gross, before sell tax)
    ///
    /// Integral over [120, 150] whole keys:
    /// 0.0001 * (120*30 + 30^2/2) + 0.001 * 30
    ///   = 0.0001 * 4_050 + 0.03
    ///   = 0.435 units = 435_000 micro
    #[test]
    fn golden_sell_thirty_keys() {
        let params = LinearCurve::default();
        let gross = sell_proceeds(&params, keys(150), keys(30)).unwrap();
        assert_eq!(gross, 435_000, "Golden vector mismatch: sell_thirty_keys");
    }

    /// The same interval priced as a buy must agree exactly
    #[test]
    fn golden_sell_equals_buy_over_same_interval() {
        let params = LinearCurve::default();
        let gross = sell_proceeds(&params, keys(150), keys(30)).unwrap();
        let cost = buy_cost(&params, keys(120), keys(30)).unwrap();
        assert_eq!(gross, cost, "Golden vector mismatch: interval_symmetry");
    }

    // =========================================================================
    // GOLDEN VECTOR: Spot prices along the canonical curve
    // =========================================================================

    /// Golden vector: spot price at landmark supplies
    ///
    /// price(0)   = 1_000 micro (0.001 units)
    /// price(100) = 100 * 100 + 1_000 = 11_000 micro
    /// price(120) = 100 * 120 + 1_000 = 13_000 micro
    /// price(150) = 100 * 150 + 1_000 = 16_000 micro
    #[test]
    fn golden_spot_prices() {
        let params = LinearCurve::default();
        assert_eq!(params.spot_price(0), 1_000);
        assert_eq!(params.spot_price(keys(100)), 11_000);
        assert_eq!(params.spot_price(keys(120)), 13_000);
        assert_eq!(params.spot_price(keys(150)), 16_000);
    }

    // =========================================================================
    // GOLDEN VECTOR: Smallest tradable quantity
    // =========================================================================

    /// Golden vector: one milli-key at zero supply
    ///
    /// numerator = 100 * 1 * 1 + 1_000 * 1 * 2_000 = 2_000_100
    /// cost = 2_000_100 / 2_000_000 = 1 micro (truncated)
    #[test]
    fn golden_single_milli_key() {
        let params = LinearCurve::default();
        let cost = buy_cost(&params, 0, 1).unwrap();
        assert_eq!(cost, 1, "Golden vector mismatch: single_milli_key");
    }
}
