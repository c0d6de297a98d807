//! Fee Splitting and Accrual
//!
//! Decomposes every buy cost into reserve / project / platform / referral
//! shares and every sell into tax and payout, then accrues the routed shares
//! to named destinations.
//!
//! # Invariants
//! - The four buy shares sum exactly to the cost; the reserve share absorbs
//!   the integer-division remainder
//! - Quote and execution use the same split function, so a preview always
//!   matches the trade that follows it

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use lib_types::{AccountId, Amount, Bps, CurveId, BPS_DENOMINATOR};

use crate::config::FeeSplit;
use crate::types::{CurveError, CurveResult};

// ============================================================================
// ROUTING
// ============================================================================

/// Destination of the referral share of a buy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferralRoute {
    /// The buy carried a referrer; the share accrues to their account
    Referrer(AccountId),
    /// No referrer; the share accrues to the curve's rewards pool
    RewardsPool,
}

// ============================================================================
// BUY / SELL DECOMPOSITION
// ============================================================================

/// Exact decomposition of a buy cost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyFees {
    /// Total cost being split
    pub cost: Amount,
    /// Share added to the curve reserve (absorbs the remainder)
    pub reserve: Amount,
    /// Share routed to the curve owner
    pub project: Amount,
    /// Share routed to the platform treasury
    pub platform: Amount,
    /// Share routed per `route`
    pub referral: Amount,
    /// Where the referral share goes
    pub route: ReferralRoute,
}

impl BuyFees {
    /// Split a buy cost per the configured schedule
    ///
    /// Project, platform, and referral shares truncate; the reserve takes
    /// the rest, so the four shares always sum back to `cost`.
    pub fn split(cost: Amount, split: &FeeSplit, route: ReferralRoute) -> CurveResult<Self> {
        let project = share_of(cost, split.project_bps)?;
        let platform = share_of(cost, split.platform_bps)?;
        let referral = share_of(cost, split.referral_bps)?;

        let routed = project
            .checked_add(platform)
            .and_then(|v| v.checked_add(referral))
            .ok_or(CurveError::Overflow)?;
        let reserve = cost.checked_sub(routed).ok_or(CurveError::Overflow)?;

        Ok(Self {
            cost,
            reserve,
            project,
            platform,
            referral,
            route,
        })
    }

    /// Sum of the non-reserve shares
    pub fn routed_total(&self) -> Amount {
        self.project + self.platform + self.referral
    }
}

/// Exact decomposition of a sell
///
/// The tax is withheld inside the reserve; only the payout leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellFees {
    /// Gross proceeds from the price integral
    pub gross: Amount,
    /// Withheld sell tax
    pub tax: Amount,
    /// Amount paid out to the seller (`gross - tax`)
    pub payout: Amount,
}

impl SellFees {
    /// Withhold the flat sell tax from gross proceeds
    pub fn split(gross: Amount, tax_bps: Bps) -> CurveResult<Self> {
        let tax = share_of(gross, tax_bps)?;
        let payout = gross.checked_sub(tax).ok_or(CurveError::Overflow)?;
        Ok(Self { gross, tax, payout })
    }
}

/// Truncating basis-point share of an amount
fn share_of(amount: Amount, bps: Bps) -> CurveResult<Amount> {
    amount
        .checked_mul(bps as u128)
        .map(|v| v / BPS_DENOMINATOR as u128)
        .ok_or(CurveError::Overflow)
}

// ============================================================================
// ACCRUAL LEDGER
// ============================================================================

/// Running totals of routed fee shares per destination
///
/// One per curve, mutated inside the same critical section as the trade that
/// produced the shares. The reserve share is curve state, not an accrual,
/// and never appears here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeeLedger {
    /// Accrued to the curve owner's account
    project: BTreeMap<AccountId, Amount>,
    /// Accrued to the platform treasury
    platform: Amount,
    /// Accrued per referrer
    referrers: BTreeMap<AccountId, Amount>,
    /// Accrued to the curve's rewards pool
    rewards_pool: Amount,
    /// Withheld sell tax, retained in the reserve
    sell_tax_withheld: Amount,
    /// Everything ever routed through this ledger
    total_accrued: Amount,
}

impl FeeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accrue the routed shares of a buy
    pub fn accrue_buy(&mut self, curve_id: CurveId, owner: AccountId, fees: &BuyFees) {
        *self.project.entry(owner).or_insert(0) += fees.project;
        self.platform += fees.platform;

        match fees.route {
            ReferralRoute::Referrer(referrer) => {
                *self.referrers.entry(referrer).or_insert(0) += fees.referral;
            }
            ReferralRoute::RewardsPool => {
                self.rewards_pool += fees.referral;
            }
        }

        self.total_accrued += fees.routed_total();
        tracing::debug!(
            curve = %curve_id,
            project = fees.project,
            platform = fees.platform,
            referral = fees.referral,
            "accrued buy fees"
        );
    }

    /// Record the tax withheld from a sell
    pub fn accrue_sell_tax(&mut self, fees: &SellFees) {
        self.sell_tax_withheld += fees.tax;
    }

    pub fn project_accrued(&self, owner: &AccountId) -> Amount {
        self.project.get(owner).copied().unwrap_or(0)
    }

    pub fn platform_accrued(&self) -> Amount {
        self.platform
    }

    pub fn referrer_accrued(&self, referrer: &AccountId) -> Amount {
        self.referrers.get(referrer).copied().unwrap_or(0)
    }

    pub fn rewards_pool_accrued(&self) -> Amount {
        self.rewards_pool
    }

    pub fn sell_tax_withheld(&self) -> Amount {
        self.sell_tax_withheld
    }

    pub fn total_accrued(&self) -> Amount {
        self.total_accrued
    }
}

// ============================================================================
// TESTS
// ============================================================================
