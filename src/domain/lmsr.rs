//! Logarithmic Market Scoring Rule pricing.
//!
//! Cost function C(q) = b · ln(Σᵢ e^(−qᵢ/b)) over the market's own
//! outcome holdings q, with the liquidity parameter fixed at creation as
//! b = initialFunding / ln(outcomeCount). Buying shares of an outcome
//! removes them from the pool, so the market's holding of that outcome
//! shrinks and its price rises; bounded loss for the operator follows
//! from the cost function shape. Reference: Hanson (2003),
//! "Combinatorial Information Market Design".
//!
//! All arithmetic is 64.64 fixed point. The level sum is evaluated in
//! log-sum-exp form against the minimum holding, so every exponent is
//! non-positive and each partial sum stays below outcomeCount·2^64.

use super::error::{ExchangeError, Result};
use super::fixed::{exp_neg, ln_raw, mul_div_floor, Fixed, ONE};

/// Denominator of all proportional fee and margin ratios.
pub const FEE_RANGE: u128 = 1_000_000;

/// Rounding margin on trade quotes, in parts of `FEE_RANGE`: quoted
/// costs are rounded up and earnings down by 0.002 % so accumulated
/// fixed-point error can never drain the pool.
const MARGIN: u128 = 20;

/// Pricing capability consulted by the market maker.
///
/// LMSR is the one concrete scoring rule shipped; alternative rules can
/// implement this trait without touching the ledger or the trade state
/// machine.
pub trait PriceEngine: Send + Sync {
    /// Cost of buying `shares` of `outcome` against distribution `q`,
    /// rounding margin included, capped at face value.
    fn costs_buying(
        &self,
        funding: u128,
        q: &[u128],
        outcome: usize,
        shares: u128,
    ) -> Result<u128>;

    /// Earnings for selling `shares` of `outcome` into distribution `q`,
    /// rounding margin included. Always ≤ `shares`.
    fn earnings_selling(
        &self,
        funding: u128,
        q: &[u128],
        outcome: usize,
        shares: u128,
    ) -> Result<u128>;

    /// Marginal price of `outcome` in (0, 1); prices over all outcomes
    /// sum to one within fixed-point tolerance.
    fn marginal_price(&self, funding: u128, q: &[u128], outcome: usize) -> Result<Fixed>;

    /// Stable identifier mixed into market hashes.
    fn kind(&self) -> &'static str;
}

/// The LMSR scoring rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct LmsrMaker;

impl LmsrMaker {
    /// Liquidity parameter b = funding / ln(outcomeCount), in collateral
    /// base units.
    pub fn liquidity(funding: u128, outcome_count: usize) -> Result<u128> {
        let ln_n = ln_outcomes(outcome_count)?;
        Ok(mul_div_floor(funding, ONE, ln_n))
    }
}

impl PriceEngine for LmsrMaker {
    fn costs_buying(
        &self,
        funding: u128,
        q: &[u128],
        outcome: usize,
        shares: u128,
    ) -> Result<u128> {
        let (holdings, ln_n) = validate(funding, q, outcome, shares)?;
        let before = cost_level(funding, &holdings, ln_n);
        let mut after_q = holdings;
        after_q[outcome] -= shares as i128;
        let after = cost_level(funding, &after_q, ln_n);
        let raw = (after - before).max(0) as u128;
        let costs = mul_div_floor(raw, FEE_RANGE + MARGIN, FEE_RANGE);
        // price never exceeds 1, so a share never costs more than face value
        Ok(costs.min(shares))
    }

    fn earnings_selling(
        &self,
        funding: u128,
        q: &[u128],
        outcome: usize,
        shares: u128,
    ) -> Result<u128> {
        let (holdings, ln_n) = validate(funding, q, outcome, shares)?;
        let before = cost_level(funding, &holdings, ln_n);
        let mut after_q = holdings;
        after_q[outcome] = after_q[outcome]
            .checked_add(shares as i128)
            .ok_or(ExchangeError::DomainError("holding exceeds representable range"))?;
        let after = cost_level(funding, &after_q, ln_n);
        let raw = (before - after).max(0) as u128;
        Ok(mul_div_floor(raw, FEE_RANGE - MARGIN, FEE_RANGE))
    }

    fn marginal_price(&self, funding: u128, q: &[u128], outcome: usize) -> Result<Fixed> {
        let (holdings, ln_n) = validate(funding, q, outcome, 1)?;
        let qmin = holdings.iter().min().copied().unwrap_or(0);
        let mut sum: u128 = 0;
        let mut own: u128 = 0;
        for (i, &qi) in holdings.iter().enumerate() {
            let term = level_term(qi, qmin, funding, ln_n);
            sum += term;
            if i == outcome {
                own = term;
            }
        }
        Ok(Fixed::from_raw(mul_div_floor(own, ONE, sum) as i128))
    }

    fn kind(&self) -> &'static str {
        "lmsr"
    }
}

/// ln(outcomeCount) in fixed point; at least two outcomes required.
fn ln_outcomes(outcome_count: usize) -> Result<u128> {
    if outcome_count < 2 {
        return Err(ExchangeError::DomainError("market needs at least two outcomes"));
    }
    Ok(ln_raw(outcome_count as u128 * ONE) as u128)
}

/// Shared input validation; returns signed holdings and ln(N).
fn validate(
    funding: u128,
    q: &[u128],
    outcome: usize,
    shares: u128,
) -> Result<(Vec<i128>, u128)> {
    let ln_n = ln_outcomes(q.len())?;
    if funding == 0 {
        return Err(ExchangeError::DomainError("funding must be positive"));
    }
    if outcome >= q.len() {
        return Err(ExchangeError::DomainError("outcome index out of range"));
    }
    if shares == 0 {
        return Err(ExchangeError::DomainError("share count must be positive"));
    }
    if shares > i128::MAX as u128 {
        return Err(ExchangeError::DomainError("share count exceeds representable range"));
    }
    let mut holdings = Vec::with_capacity(q.len());
    for &qi in q {
        if qi > i128::MAX as u128 {
            return Err(ExchangeError::DomainError("holding exceeds representable range"));
        }
        holdings.push(qi as i128);
    }
    Ok((holdings, ln_n))
}

/// Cost level b·ln(Σ e^(−qᵢ/b)) expressed against the minimum holding:
///
///   level(q) = funding·ln(Σᵢ e^(−(qᵢ−qmin)·lnN/funding)) / lnN − qmin
///
/// The offset makes every exponent ≤ 0, so the sum is bounded by
/// outcomeCount·2^64 and fits comfortably in u128. Holdings may be
/// transiently negative while quoting a buy.
fn cost_level(funding: u128, q: &[i128], ln_n: u128) -> i128 {
    let qmin = q.iter().min().copied().unwrap_or(0);
    let mut sum: u128 = 0;
    for &qi in q {
        sum += level_term(qi, qmin, funding, ln_n);
    }
    // sum ≥ ONE because the minimum holding contributes e^0
    let scaled = mul_div_floor(funding, ln_raw(sum) as u128, ln_n);
    scaled as i128 - qmin
}

/// One term e^(−(qi−qmin)·lnN/funding) of the level sum. Holdings may
/// be transiently negative while quoting a buy, so the offset is taken
/// with wrapping arithmetic; the true difference always fits u128.
fn level_term(qi: i128, qmin: i128, funding: u128, ln_n: u128) -> u128 {
    let offset = qi.wrapping_sub(qmin) as u128;
    // past 64 fundings the exponential is a true zero and the scaled
    // offset would no longer fit u128
    if offset / funding >= 64 {
        return 0;
    }
    exp_neg(mul_div_floor(offset, ln_n, funding))
}
