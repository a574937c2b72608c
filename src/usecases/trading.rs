//! Trading against a market's automated maker.
//!
//! Three trade shapes exist: buying one outcome, selling one outcome,
//! and short selling (buying full sets and immediately selling the
//! named outcome back). Every trade is quoted from the pool's current
//! holdings, checked against the caller's slippage bound, and applied
//! atomically; the pool's distribution update keeps the maker's state
//! consistent with the cost function.
//!
//! Fee layering on a trade:
//! - the per-market fee on the LMSR cost, credited to `collected_fees`
//! - the base protocol fee on the share quantity moved

use tracing::{info, warn};

use crate::domain::entities::{Market, MarketId};
use crate::domain::error::{ExchangeError, Result};
use crate::domain::fees::FeeSchedule;
use crate::domain::fixed::Fixed;
use crate::ports::collateral::CollateralToken;
use crate::ports::resolver::OutcomeResolver;

use super::Exchange;

/// Price breakdown of a prospective buy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuyQuote {
  /// LMSR cost of the shares, margin included.
  pub cost: u128,
  /// Per-market fee on the cost.
  pub market_fee: u128,
  /// Base protocol fee surcharge on the share quantity.
  pub base_fee: u128,
  /// Collateral the buyer pays in total.
  pub total: u128,
}

/// Price breakdown of a prospective sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SellQuote {
  /// LMSR earnings for the shares, margin included.
  pub earnings: u128,
  /// Per-market fee on the earnings.
  pub market_fee: u128,
  /// Base protocol fee on the share quantity.
  pub base_fee: u128,
  /// Collateral the seller receives after fees.
  pub net: u128,
}

impl<C: CollateralToken, R: OutcomeResolver> Exchange<C, R> {
  /// Quotes buying `shares` of `outcome` without touching any state.
  pub fn quote_buy(&self, id: MarketId, outcome: u8, shares: u128) -> Result<BuyQuote> {
    let market = self.open_market(id)?;
    let holdings = self.pool_holdings(market)?;
    self.buy_quote(market, &holdings, outcome, shares)
  }

  /// Quotes selling `shares` of `outcome` without touching any state.
  pub fn quote_sell(&self, id: MarketId, outcome: u8, shares: u128) -> Result<SellQuote> {
    let market = self.open_market(id)?;
    let holdings = self.pool_holdings(market)?;
    self.sell_quote(market, &holdings, outcome, shares)
  }

  /// Marginal price of `outcome` at the pool's current distribution.
  pub fn marginal_price(&self, id: MarketId, outcome: u8) -> Result<Fixed> {
    let market = self.open_market(id)?;
    let holdings = self.pool_holdings(market)?;
    self
      .engine
      .marginal_price(market.initial_funding, &holdings, outcome as usize)
  }

  /// Buys `shares` of `outcome` from the market. Fails with
  /// `SlippageExceeded` when the total charge (fees included) comes out
  /// above `max_cost`. Returns the total charged.
  pub fn buy(
    &mut self,
    buyer: &str,
    id: MarketId,
    outcome: u8,
    shares: u128,
    max_cost: u128,
  ) -> Result<u128> {
    let market = self.open_market(id)?.clone();
    let holdings = self.pool_holdings(&market)?;
    let quote = self.buy_quote(&market, &holdings, outcome, shares)?;
    if quote.total > max_cost {
      warn!(market = %id, buyer, total = quote.total, max_cost, "buy rejected on slippage");
      return Err(ExchangeError::SlippageExceeded {
        computed: quote.total,
        bound: max_cost,
      });
    }
    // the pool hands out `shares` after minting `cost` of each outcome
    let pool_after = holdings[outcome as usize] + quote.cost;
    if pool_after < shares {
      return Err(ExchangeError::InsufficientBalance {
        needed: shares,
        available: pool_after,
      });
    }

    let pool = market.pool_account();
    self.pull_collateral(buyer, quote.total)?;
    self.ledger.mint_all(market.event, &pool, quote.cost)?;
    self
      .ledger
      .transfer(market.event, outcome, &pool, buyer, shares)?;
    if let Some(market) = self.markets.get_mut(&id) {
      market.collected_fees += quote.market_fee;
    }
    self.protocol_fees += quote.base_fee;
    info!(
      market = %id, buyer, outcome, shares,
      cost = quote.cost, total = quote.total, "shares bought"
    );
    Ok(quote.total)
  }

  /// Sells `shares` of `outcome` to the market. Fails with
  /// `SlippageExceeded` when the net payout (fees deducted) comes out
  /// below `min_earnings`. Returns the net payout.
  pub fn sell(
    &mut self,
    seller: &str,
    id: MarketId,
    outcome: u8,
    shares: u128,
    min_earnings: u128,
  ) -> Result<u128> {
    let market = self.open_market(id)?.clone();
    let holdings = self.pool_holdings(&market)?;
    let quote = self.sell_quote(&market, &holdings, outcome, shares)?;
    if quote.net < min_earnings {
      warn!(market = %id, seller, net = quote.net, min_earnings, "sell rejected on slippage");
      return Err(ExchangeError::SlippageExceeded {
        computed: quote.net,
        bound: min_earnings,
      });
    }
    let available = self.ledger.balance_of(market.event, outcome, seller);
    if available < shares {
      return Err(ExchangeError::InsufficientBalance { needed: shares, available });
    }
    check_pool_coverage(&holdings, outcome, shares, quote.earnings)?;

    let pool = market.pool_account();
    self
      .ledger
      .transfer(market.event, outcome, seller, &pool, shares)?;
    self.ledger.burn_all(market.event, &pool, quote.earnings)?;
    if let Some(market) = self.markets.get_mut(&id) {
      market.collected_fees += quote.market_fee;
    }
    self.protocol_fees += quote.base_fee;
    self.pay_collateral(seller, quote.net)?;
    info!(
      market = %id, seller, outcome, shares,
      earnings = quote.earnings, net = quote.net, "shares sold"
    );
    Ok(quote.net)
  }

  /// Short sells `shares` of `outcome`: buys full outcome sets at face
  /// value and sells the named outcome back to the market in one atomic
  /// step, leaving the trader holding every other outcome. Fails with
  /// `SlippageExceeded` when the sell leg nets below `min_earnings`.
  /// Returns the net outlay.
  pub fn short_sell(
    &mut self,
    trader: &str,
    id: MarketId,
    outcome: u8,
    shares: u128,
    min_earnings: u128,
  ) -> Result<u128> {
    let market = self.open_market(id)?.clone();
    let holdings = self.pool_holdings(&market)?;
    let quote = self.sell_quote(&market, &holdings, outcome, shares)?;
    if quote.net < min_earnings {
      warn!(market = %id, trader, net = quote.net, min_earnings, "short sell rejected on slippage");
      return Err(ExchangeError::SlippageExceeded {
        computed: quote.net,
        bound: min_earnings,
      });
    }
    let mint_fee = self.fees.base_fee_for_shares(shares);
    // earnings never exceed face value, so the outlay cannot underflow
    let outlay = (shares + mint_fee) - quote.net;
    check_pool_coverage(&holdings, outcome, shares, quote.earnings)?;

    let pool = market.pool_account();
    self.pull_collateral(trader, shares + mint_fee)?;
    self.ledger.mint_all(market.event, trader, shares)?;
    self
      .ledger
      .transfer(market.event, outcome, trader, &pool, shares)?;
    self.ledger.burn_all(market.event, &pool, quote.earnings)?;
    if let Some(market) = self.markets.get_mut(&id) {
      market.collected_fees += quote.market_fee;
    }
    self.protocol_fees += mint_fee + quote.base_fee;
    self.pay_collateral(trader, quote.net)?;
    info!(
      market = %id, trader, outcome, shares, outlay, "shares short sold"
    );
    Ok(outlay)
  }

  // ──── internals ────

  fn open_market(&self, id: MarketId) -> Result<&Market> {
    let market = self.market(id)?;
    if !market.is_open {
      return Err(ExchangeError::MarketClosed);
    }
    Ok(market)
  }

  fn buy_quote(
    &self,
    market: &Market,
    holdings: &[u128],
    outcome: u8,
    shares: u128,
  ) -> Result<BuyQuote> {
    let cost =
      self
        .engine
        .costs_buying(market.initial_funding, holdings, outcome as usize, shares)?;
    let market_fee = FeeSchedule::market_fee(cost, market.fee_rate_ppm);
    let base_fee = self.fees.base_fee_for_shares(shares);
    Ok(BuyQuote {
      cost,
      market_fee,
      base_fee,
      total: cost + market_fee + base_fee,
    })
  }

  fn sell_quote(
    &self,
    market: &Market,
    holdings: &[u128],
    outcome: u8,
    shares: u128,
  ) -> Result<SellQuote> {
    let earnings =
      self
        .engine
        .earnings_selling(market.initial_funding, holdings, outcome as usize, shares)?;
    let market_fee = FeeSchedule::market_fee(earnings, market.fee_rate_ppm);
    let base_fee = self.fees.base_fee(shares);
    let net = earnings
      .checked_sub(market_fee + base_fee)
      .ok_or(ExchangeError::DomainError("fees exceed trade earnings"))?;
    Ok(SellQuote { earnings, market_fee, base_fee, net })
  }
}

/// A sell burns `earnings` full sets out of the pool after it receives
/// the sold shares; every outcome balance must cover that burn.
fn check_pool_coverage(
  holdings: &[u128],
  outcome: u8,
  shares: u128,
  earnings: u128,
) -> Result<()> {
  for (i, &held) in holdings.iter().enumerate() {
    let available = if i == outcome as usize { held + shares } else { held };
    if available < earnings {
      return Err(ExchangeError::InsufficientBalance {
        needed: earnings,
        available,
      });
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::fixed::ONE;
  use crate::usecases::testkit::{binary_event, exchange, fund, TestExchange, FUNDING, SHARES};
  use crate::usecases::EXCHANGE_ACCOUNT;

  // engine literals for a fresh 10-unit two-outcome pool
  const BUY_COST: u128 = 508672779061082142;
  const SELL_EARNINGS: u128 = 491327567443150216;

  fn market(exchange: &mut TestExchange, fee_rate_ppm: u128) -> MarketId {
    let event = binary_event(exchange);
    fund(exchange, "creator", FUNDING);
    exchange.create_market("creator", event, FUNDING, fee_rate_ppm).unwrap()
  }

  #[test]
  fn test_buy_charges_quoted_cost() {
    let mut exchange = exchange();
    let id = market(&mut exchange, 0);
    let event = exchange.get_market(id).unwrap().event;
    fund(&mut exchange, "alice", 2 * SHARES);

    let quote = exchange.quote_buy(id, 1, SHARES).unwrap();
    assert_eq!(quote.total, BUY_COST);
    let paid = exchange.buy("alice", id, 1, SHARES, SHARES).unwrap();
    assert_eq!(paid, BUY_COST);
    assert_eq!(exchange.collateral().balance_of("alice"), 2 * SHARES - BUY_COST);
    assert_eq!(exchange.ledger().balance_of(event, 1, "alice"), SHARES);

    // distribution update: every outcome gains the cost, the bought
    // outcome loses the shares handed out
    let pool = exchange.get_market(id).unwrap().pool_account();
    assert_eq!(
      exchange.ledger().balance_of(event, 0, &pool),
      FUNDING + BUY_COST
    );
    assert_eq!(
      exchange.ledger().balance_of(event, 1, &pool),
      FUNDING + BUY_COST - SHARES
    );
  }

  #[test]
  fn test_buy_slippage_bound_is_atomic() {
    let mut exchange = exchange();
    let id = market(&mut exchange, 0);
    fund(&mut exchange, "alice", 2 * SHARES);

    let err = exchange.buy("alice", id, 1, SHARES, BUY_COST - 1).unwrap_err();
    assert_eq!(
      err,
      ExchangeError::SlippageExceeded { computed: BUY_COST, bound: BUY_COST - 1 }
    );
    assert_eq!(exchange.collateral().balance_of("alice"), 2 * SHARES);
  }

  #[test]
  fn test_sell_pays_quoted_earnings() {
    let mut exchange = exchange();
    let id = market(&mut exchange, 0);
    let event = exchange.get_market(id).unwrap().event;
    fund(&mut exchange, "alice", SHARES);
    exchange.buy_all_outcomes("alice", event, SHARES).unwrap();

    let quote = exchange.quote_sell(id, 1, SHARES).unwrap();
    assert_eq!(quote.net, SELL_EARNINGS);
    let earned = exchange.sell("alice", id, 1, SHARES, SELL_EARNINGS).unwrap();
    assert_eq!(earned, SELL_EARNINGS);
    assert_eq!(exchange.collateral().balance_of("alice"), SELL_EARNINGS);
    assert_eq!(exchange.ledger().balance_of(event, 1, "alice"), 0);
    // the other leg of the full set stays with alice
    assert_eq!(exchange.ledger().balance_of(event, 0, "alice"), SHARES);
  }

  #[test]
  fn test_sell_requires_shares_and_bound() {
    let mut exchange = exchange();
    let id = market(&mut exchange, 0);
    let event = exchange.get_market(id).unwrap().event;
    fund(&mut exchange, "alice", SHARES);

    let err = exchange.sell("alice", id, 1, SHARES, 0).unwrap_err();
    assert!(matches!(err, ExchangeError::InsufficientBalance { .. }));

    exchange.buy_all_outcomes("alice", event, SHARES).unwrap();
    let err = exchange
      .sell("alice", id, 1, SHARES, SELL_EARNINGS + 1)
      .unwrap_err();
    assert_eq!(
      err,
      ExchangeError::SlippageExceeded {
        computed: SELL_EARNINGS,
        bound: SELL_EARNINGS + 1
      }
    );
  }

  #[test]
  fn test_short_sell_buys_set_and_sells_one_leg() {
    let mut exchange = exchange();
    let id = market(&mut exchange, 0);
    let event = exchange.get_market(id).unwrap().event;
    fund(&mut exchange, "alice", SHARES);

    let outlay = exchange
      .short_sell("alice", id, 1, SHARES, SELL_EARNINGS)
      .unwrap();
    assert_eq!(outlay, SHARES - SELL_EARNINGS);
    assert_eq!(exchange.collateral().balance_of("alice"), SELL_EARNINGS);
    assert_eq!(exchange.ledger().balance_of(event, 0, "alice"), SHARES);
    assert_eq!(exchange.ledger().balance_of(event, 1, "alice"), 0);

    let err = exchange
      .short_sell("alice", id, 0, SHARES, SHARES)
      .unwrap_err();
    assert!(matches!(err, ExchangeError::SlippageExceeded { .. }));
  }

  #[test]
  fn test_market_fee_accrues_on_trades() {
    let mut exchange = exchange();
    // 1 % market fee
    let id = market(&mut exchange, 10_000);
    fund(&mut exchange, "alice", 2 * SHARES);

    let quote = exchange.quote_buy(id, 1, SHARES).unwrap();
    assert_eq!(quote.cost, BUY_COST);
    assert_eq!(quote.market_fee, BUY_COST / 100);
    assert_eq!(quote.total, BUY_COST + BUY_COST / 100);
    exchange.buy("alice", id, 1, SHARES, 2 * SHARES).unwrap();
    assert_eq!(
      exchange.get_market(id).unwrap().collected_fees,
      BUY_COST / 100
    );
  }

  #[test]
  fn test_closed_market_refuses_trades() {
    let mut exchange = exchange();
    let id = market(&mut exchange, 0);
    fund(&mut exchange, "alice", SHARES);
    exchange.close_market("creator", id).unwrap();
    assert_eq!(
      exchange.buy("alice", id, 1, SHARES, SHARES).unwrap_err(),
      ExchangeError::MarketClosed
    );
    assert_eq!(
      exchange.quote_sell(id, 1, SHARES).unwrap_err(),
      ExchangeError::MarketClosed
    );
  }

  #[test]
  fn test_even_pool_prices_at_half() {
    let mut exchange = exchange();
    let id = market(&mut exchange, 0);
    let price = exchange.marginal_price(id, 0).unwrap();
    assert_eq!(price.raw() as u128, ONE / 2);
  }

  #[test]
  fn test_exchange_account_covers_all_liabilities() {
    let mut exchange = exchange();
    let id = market(&mut exchange, 10_000);
    let event = exchange.get_market(id).unwrap().event;
    fund(&mut exchange, "alice", 4 * SHARES);

    exchange.buy("alice", id, 1, SHARES, 2 * SHARES).unwrap();
    exchange.buy_all_outcomes("alice", event, SHARES).unwrap();
    exchange.sell("alice", id, 0, SHARES / 2, 0).unwrap();

    let held = exchange.collateral().balance_of(EXCHANGE_ACCOUNT);
    let liabilities = exchange.ledger().locked_collateral(event)
      + exchange.protocol_fees()
      + exchange.get_market(id).unwrap().collected_fees;
    assert_eq!(held, liabilities);
  }
}
