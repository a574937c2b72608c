//! Event registry and bulk outcome-set conversions.
//!
//! Events are created once, identified by content hash and never
//! mutated. The two conversions here move between collateral and full
//! outcome sets without touching any market: one unit of collateral
//! always mints one unit of every outcome token, and a full set always
//! burns back to one unit.

use tracing::info;

use crate::domain::entities::{Event, EventId};
use crate::domain::error::{ExchangeError, Result};
use crate::ports::collateral::CollateralToken;
use crate::ports::resolver::OutcomeResolver;

use super::Exchange;

/// Creation parameters of an event; the content hash is derived over
/// all of them.
#[derive(Debug, Clone)]
pub struct EventParams {
  /// Hash of the off-ledger event description.
  pub description_hash: [u8; 32],
  /// Ranged events resolve to a position between the bounds.
  pub is_ranged: bool,
  pub lower_bound: i64,
  pub upper_bound: i64,
  pub outcome_count: u8,
  /// Identifier of the collateral token backing the outcome tokens.
  pub collateral_token: String,
  /// Identifier of the resolver authorized to report the outcome.
  pub resolver: String,
}

impl<C: CollateralToken, R: OutcomeResolver> Exchange<C, R> {
  /// Registers a new event and its outcome tokens. Fails with
  /// `DuplicateEvent` when an event with the same content hash exists.
  pub fn create_event(&mut self, params: EventParams) -> Result<EventId> {
    if params.outcome_count < 2 {
      return Err(ExchangeError::DomainError("event needs at least two outcomes"));
    }
    if params.is_ranged && params.lower_bound >= params.upper_bound {
      return Err(ExchangeError::DomainError("ranged event bounds are inverted"));
    }
    let id = Event::content_hash(
      &params.description_hash,
      params.is_ranged,
      params.lower_bound,
      params.upper_bound,
      params.outcome_count,
      &params.collateral_token,
      &params.resolver,
    );
    if self.events.contains_key(&id) {
      return Err(ExchangeError::DuplicateEvent);
    }
    let event = Event {
      id,
      description_hash: params.description_hash,
      is_ranged: params.is_ranged,
      lower_bound: params.lower_bound,
      upper_bound: params.upper_bound,
      outcome_count: params.outcome_count,
      collateral_token: params.collateral_token,
      resolver: params.resolver,
    };
    self.ledger.register_event(&event)?;
    self.events.insert(id, event);
    self.active_markets.insert(id, Vec::new());
    info!(event = %id, outcomes = params.outcome_count, "event created");
    Ok(id)
  }

  pub fn get_event(&self, id: EventId) -> Result<&Event> {
    self.event(id)
  }

  /// Per-outcome balances of `account` across the listed events; events
  /// where the account holds nothing are omitted.
  pub fn get_shares(&self, account: &str, events: &[EventId]) -> Vec<(EventId, Vec<u128>)> {
    self.ledger.shares_of(account, events)
  }

  /// Converts collateral into full outcome sets: pulls `amount` plus the
  /// base fee surcharge from `buyer` and mints `amount` of every outcome
  /// token to them.
  pub fn buy_all_outcomes(&mut self, buyer: &str, event: EventId, amount: u128) -> Result<()> {
    self.event(event)?;
    if amount == 0 {
      return Err(ExchangeError::DomainError("amount must be positive"));
    }
    let fee = self.fees.base_fee_for_shares(amount);
    self.pull_collateral(buyer, amount + fee)?;
    self.ledger.mint_all(event, buyer, amount)?;
    self.protocol_fees += fee;
    info!(event = %event, buyer, amount, fee, "bought all outcomes");
    Ok(())
  }

  /// Converts full outcome sets back to collateral: burns `amount` of
  /// every outcome token held by `seller` and pays out `amount` minus
  /// the base fee.
  pub fn sell_all_outcomes(&mut self, seller: &str, event: EventId, amount: u128) -> Result<()> {
    self.event(event)?;
    if amount == 0 {
      return Err(ExchangeError::DomainError("amount must be positive"));
    }
    self.ledger.burn_all(event, seller, amount)?;
    let fee = self.fees.base_fee(amount);
    self.protocol_fees += fee;
    self.pay_collateral(seller, amount - fee)?;
    info!(event = %event, seller, amount, fee, "sold all outcomes");
    Ok(())
  }
}
