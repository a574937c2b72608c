//! Protocol and market fee arithmetic.
//!
//! Two independent fee layers exist:
//! - a flat base protocol fee charged on every share-quantity movement
//!   at the ledger boundary, and
//! - a per-market fee on LMSR trade costs, credited to the market's
//!   `collected_fees` for its creator to withdraw.
//!
//! Both are expressed in parts per million of `FEE_RANGE`. The base fee
//! defaults to zero and is configuration, never a hard-coded rate.

use super::error::{ExchangeError, Result};
use super::fixed::mul_div_floor;
use super::lmsr::FEE_RANGE;

/// Protocol-wide fee schedule, fixed at construction from configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeeSchedule {
    /// Base protocol fee in parts per million.
    base_fee_ppm: u128,
}

impl FeeSchedule {
    /// Creates a schedule; the base fee must leave the gross-up formula
    /// well defined, so it has to be strictly below `FEE_RANGE`.
    pub fn new(base_fee_ppm: u128) -> Result<Self> {
        if base_fee_ppm >= FEE_RANGE {
            return Err(ExchangeError::DomainError("base fee must be below fee range"));
        }
        Ok(Self { base_fee_ppm })
    }

    /// A schedule with no base protocol fee.
    pub const fn zero() -> Self {
        Self { base_fee_ppm: 0 }
    }

    pub const fn base_fee_ppm(&self) -> u128 {
        self.base_fee_ppm
    }

    /// Base protocol fee on a quantity movement: amount · fee / range.
    pub fn base_fee(&self, amount: u128) -> u128 {
        mul_div_floor(amount, self.base_fee_ppm, FEE_RANGE)
    }

    /// Fee a caller must add on top so that `shares` arrive net of the
    /// base fee: shares · range / (range − fee) − shares.
    pub fn base_fee_for_shares(&self, shares: u128) -> u128 {
        mul_div_floor(shares, FEE_RANGE, FEE_RANGE - self.base_fee_ppm) - shares
    }

    /// Per-market fee on a trade cost, at the market's own rate.
    pub fn market_fee(cost: u128, fee_rate_ppm: u128) -> u128 {
        mul_div_floor(cost, fee_rate_ppm, FEE_RANGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_base_fee_charges_nothing() {
        let fees = FeeSchedule::zero();
        assert_eq!(fees.base_fee(1_000_000_000_000_000_000), 0);
        assert_eq!(fees.base_fee_for_shares(1_000_000_000_000_000_000), 0);
    }

    #[test]
    fn test_base_fee_proportional() {
        // 0.2 %, the rate the original deployment used before zeroing it
        let fees = FeeSchedule::new(2_000).unwrap();
        assert_eq!(fees.base_fee(1_000_000), 2_000);
        assert_eq!(fees.base_fee(500), 1);
    }

    #[test]
    fn test_base_fee_gross_up_covers_fee() {
        let fees = FeeSchedule::new(2_000).unwrap();
        let shares = 1_000_000_000_000_000_000u128;
        let surcharge = fees.base_fee_for_shares(shares);
        // paying shares + surcharge must survive the fee with >= shares left
        let paid = shares + surcharge;
        assert!(paid - fees.base_fee(paid) >= shares);
    }

    #[test]
    fn test_market_fee_rate() {
        // 0.5 % market fee
        assert_eq!(FeeSchedule::market_fee(1_000_000_000, 5_000), 5_000_000);
        assert_eq!(FeeSchedule::market_fee(0, 5_000), 0);
    }

    #[test]
    fn test_rejects_fee_at_or_above_range() {
        assert!(FeeSchedule::new(FEE_RANGE).is_err());
        assert!(FeeSchedule::new(FEE_RANGE + 1).is_err());
        assert!(FeeSchedule::new(FEE_RANGE - 1).is_ok());
    }
}
