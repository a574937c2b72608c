//! Market lifecycle: creation, closing, fee withdrawal.
//!
//! A market is an automated maker instance over one event. Its creator
//! funds it once at creation, may close it to reclaim the pooled
//! outcome tokens, and withdraws accrued trading fees at any time.
//! Closed markets stay in the arena so their content hash can never be
//! reused for a fresh instance.

use tracing::info;

use crate::domain::entities::{EventId, Market, MarketId};
use crate::domain::error::{ExchangeError, Result};
use crate::domain::lmsr::FEE_RANGE;
use crate::ports::collateral::CollateralToken;
use crate::ports::resolver::OutcomeResolver;

use super::Exchange;

impl<C: CollateralToken, R: OutcomeResolver> Exchange<C, R> {
  /// Creates and funds a market over `event`. The funding (plus base
  /// fee surcharge) is pulled from the creator and converted into the
  /// market's initial outcome-token pool.
  pub fn create_market(
    &mut self,
    creator: &str,
    event: EventId,
    funding: u128,
    fee_rate_ppm: u128,
  ) -> Result<MarketId> {
    self.event(event)?;
    if funding < self.policy.min_funding {
      return Err(ExchangeError::DomainError("funding below configured minimum"));
    }
    if fee_rate_ppm > self.policy.max_fee_ppm || fee_rate_ppm >= FEE_RANGE {
      return Err(ExchangeError::DomainError("market fee above configured ceiling"));
    }
    let id = Market::content_hash(&event, creator, self.engine.kind());
    if self.markets.contains_key(&id) {
      return Err(ExchangeError::DuplicateMarket);
    }

    let fee = self.fees.base_fee_for_shares(funding);
    self.pull_collateral(creator, funding + fee)?;
    self.protocol_fees += fee;

    let market = Market {
      id,
      event,
      creator: creator.to_string(),
      maker_kind: self.engine.kind().to_string(),
      fee_rate_ppm,
      collected_fees: 0,
      initial_funding: funding,
      created_at_block: self.current_block,
      is_open: true,
    };
    self.ledger.mint_all(event, &market.pool_account(), funding)?;
    self
      .active_markets
      .entry(event)
      .or_default()
      .push(id);
    self.markets.insert(id, market);
    info!(market = %id, event = %event, creator, funding, fee_rate_ppm, "market created");
    Ok(id)
  }

  pub fn get_market(&self, id: MarketId) -> Result<&Market> {
    self.market(id)
  }

  /// Open markets over an event, in creation order.
  pub fn open_markets(&self, event: EventId) -> Vec<MarketId> {
    self.active_markets.get(&event).cloned().unwrap_or_default()
  }

  /// Closes a market and returns its pooled outcome tokens to the
  /// creator. Creator-only; accrued fees stay withdrawable afterwards.
  pub fn close_market(&mut self, caller: &str, id: MarketId) -> Result<()> {
    let market = self.market(id)?;
    if market.creator != caller {
      return Err(ExchangeError::Unauthorized);
    }
    if !market.is_open {
      return Err(ExchangeError::MarketClosed);
    }
    let event = market.event;
    let pool = market.pool_account();
    let holdings = self.pool_holdings(market)?;

    for (outcome, &held) in holdings.iter().enumerate() {
      if held > 0 {
        self
          .ledger
          .transfer(event, outcome as u8, &pool, caller, held)?;
      }
    }
    if let Some(open) = self.active_markets.get_mut(&event) {
      open.retain(|&m| m != id);
    }
    if let Some(market) = self.markets.get_mut(&id) {
      market.is_open = false;
    }
    info!(market = %id, event = %event, "market closed");
    Ok(())
  }

  /// Pays the market's accrued trading fees out to its creator and
  /// resets the accumulator. Creator-only; works on closed markets too.
  pub fn withdraw_fees(&mut self, caller: &str, id: MarketId) -> Result<u128> {
    let market = self.market(id)?;
    if market.creator != caller {
      return Err(ExchangeError::Unauthorized);
    }
    let amount = market.collected_fees;
    if let Some(market) = self.markets.get_mut(&id) {
      market.collected_fees = 0;
    }
    self.pay_collateral(caller, amount)?;
    info!(market = %id, caller, amount, "fees withdrawn");
    Ok(amount)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::usecases::testkit::{binary_event, exchange, fund, FUNDING, SHARES};

  #[test]
  fn test_create_market_funds_the_pool() {
    let mut exchange = exchange();
    let event = binary_event(&mut exchange);
    fund(&mut exchange, "creator", FUNDING);

    let id = exchange.create_market("creator", event, FUNDING, 0).unwrap();
    let market = exchange.get_market(id).unwrap();
    assert!(market.is_open);
    assert_eq!(market.initial_funding, FUNDING);
    let pool = market.pool_account();
    assert_eq!(exchange.ledger().balance_of(event, 0, &pool), FUNDING);
    assert_eq!(exchange.ledger().balance_of(event, 1, &pool), FUNDING);
    assert_eq!(exchange.collateral().balance_of("creator"), 0);
    assert_eq!(exchange.open_markets(event), vec![id]);
  }

  #[test]
  fn test_same_creator_cannot_duplicate_market() {
    let mut exchange = exchange();
    let event = binary_event(&mut exchange);
    fund(&mut exchange, "creator", 3 * FUNDING);
    fund(&mut exchange, "other", FUNDING);

    exchange.create_market("creator", event, FUNDING, 0).unwrap();
    let err = exchange.create_market("creator", event, FUNDING, 0).unwrap_err();
    assert_eq!(err, ExchangeError::DuplicateMarket);
    // a different creator hashes to a different market
    assert!(exchange.create_market("other", event, FUNDING, 0).is_ok());
  }

  #[test]
  fn test_create_market_enforces_policy() {
    let mut exchange = exchange();
    let event = binary_event(&mut exchange);
    fund(&mut exchange, "creator", FUNDING);
    // policy floor is 1 in the fixture
    assert!(exchange.create_market("creator", event, 0, 0).is_err());
    // fee ceiling is 10 %
    assert!(exchange.create_market("creator", event, FUNDING, 100_001).is_err());
  }

  #[test]
  fn test_close_market_returns_pool_to_creator() {
    let mut exchange = exchange();
    let event = binary_event(&mut exchange);
    fund(&mut exchange, "creator", FUNDING);
    let id = exchange.create_market("creator", event, FUNDING, 0).unwrap();

    assert_eq!(
      exchange.close_market("mallory", id).unwrap_err(),
      ExchangeError::Unauthorized
    );
    exchange.close_market("creator", id).unwrap();
    assert_eq!(exchange.ledger().balance_of(event, 0, "creator"), FUNDING);
    assert_eq!(exchange.ledger().balance_of(event, 1, "creator"), FUNDING);
    assert!(!exchange.get_market(id).unwrap().is_open);
    assert!(exchange.open_markets(event).is_empty());
    // closing twice fails, and the hash stays burned
    assert_eq!(
      exchange.close_market("creator", id).unwrap_err(),
      ExchangeError::MarketClosed
    );
    assert_eq!(
      exchange.create_market("creator", event, FUNDING, 0).unwrap_err(),
      ExchangeError::DuplicateMarket
    );
  }

  #[test]
  fn test_withdraw_fees_pays_creator_once() {
    let mut exchange = exchange();
    let event = binary_event(&mut exchange);
    fund(&mut exchange, "creator", FUNDING);
    fund(&mut exchange, "alice", 2 * SHARES);
    // 1 % market fee
    let id = exchange.create_market("creator", event, FUNDING, 10_000).unwrap();
    exchange.buy("alice", id, 1, SHARES, 2 * SHARES).unwrap();
    let accrued = exchange.get_market(id).unwrap().collected_fees;
    assert!(accrued > 0);

    assert_eq!(
      exchange.withdraw_fees("mallory", id).unwrap_err(),
      ExchangeError::Unauthorized
    );
    assert_eq!(exchange.withdraw_fees("creator", id).unwrap(), accrued);
    assert_eq!(exchange.collateral().balance_of("creator"), accrued);
    assert_eq!(exchange.withdraw_fees("creator", id).unwrap(), 0);
  }

  #[test]
  fn test_market_records_creation_block() {
    let mut exchange = exchange();
    let event = binary_event(&mut exchange);
    fund(&mut exchange, "creator", FUNDING);
    exchange.advance_block(42);
    let id = exchange.create_market("creator", event, FUNDING, 0).unwrap();
    assert_eq!(exchange.get_market(id).unwrap().created_at_block, 42);
  }
}
