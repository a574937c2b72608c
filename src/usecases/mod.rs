//! Use Cases Layer - Exchange Orchestration
//!
//! The `Exchange` aggregate owns the entity arena (events, markets,
//! outcome-token ledger) together with the two ports, and exposes the
//! public operations of the protocol. Each module is one self-contained
//! slice of behavior:
//!
//! - `registry`: event creation, lookups, bulk outcome-set conversions
//! - `lifecycle`: market creation, closing, fee withdrawal
//! - `trading`: buy / sell / short-sell against the price engine
//! - `redemption`: paying out winning tokens after resolution
//!
//! Execution is strictly serialized by the host; every operation
//! validates all preconditions before its first mutation, so a failure
//! leaves no partial state behind.

pub mod lifecycle;
pub mod redemption;
pub mod registry;
pub mod trading;

use std::collections::HashMap;

use crate::domain::entities::{Event, EventId, Market, MarketId};
use crate::domain::error::{ExchangeError, Result};
use crate::domain::fees::FeeSchedule;
use crate::domain::ledger::OutcomeTokenLedger;
use crate::domain::lmsr::{LmsrMaker, PriceEngine};
use crate::ports::collateral::CollateralToken;
use crate::ports::resolver::OutcomeResolver;

/// Ledger account under which the exchange itself holds locked
/// collateral and accrued base protocol fees.
pub const EXCHANGE_ACCOUNT: &str = "exchange";

/// Operator limits on market creation, from configuration.
#[derive(Debug, Clone, Copy)]
pub struct MarketPolicy {
  /// Minimum initial funding, in collateral base units.
  pub min_funding: u128,
  /// Highest per-market fee rate a creator may set, parts per million.
  pub max_fee_ppm: u128,
}

impl Default for MarketPolicy {
  fn default() -> Self {
    Self {
      // one whole collateral unit at 18 decimals, 10 % fee ceiling
      min_funding: 1_000_000_000_000_000_000,
      max_fee_ppm: 100_000,
    }
  }
}

/// The exchange core: entity arena, price engine and ports.
pub struct Exchange<C: CollateralToken, R: OutcomeResolver> {
  pub(crate) ledger: OutcomeTokenLedger,
  pub(crate) events: HashMap<EventId, Event>,
  /// Markets stay in the arena after closing so a closed market's hash
  /// can never be reused; `active_markets` indexes the open ones.
  pub(crate) markets: HashMap<MarketId, Market>,
  pub(crate) active_markets: HashMap<EventId, Vec<MarketId>>,
  pub(crate) engine: Box<dyn PriceEngine>,
  pub(crate) fees: FeeSchedule,
  pub(crate) policy: MarketPolicy,
  pub(crate) collateral: C,
  pub(crate) resolver: R,
  /// Base protocol fees accrued, in collateral base units.
  pub(crate) protocol_fees: u128,
  /// Host-ledger block height stamped onto new markets.
  pub(crate) current_block: u64,
}

impl<C: CollateralToken, R: OutcomeResolver> Exchange<C, R> {
  /// Builds an exchange pricing with the LMSR scoring rule.
  pub fn new(collateral: C, resolver: R, fees: FeeSchedule, policy: MarketPolicy) -> Self {
    Self::with_engine(collateral, resolver, fees, policy, Box::new(LmsrMaker))
  }

  /// Builds an exchange with a custom scoring rule.
  pub fn with_engine(
    collateral: C,
    resolver: R,
    fees: FeeSchedule,
    policy: MarketPolicy,
    engine: Box<dyn PriceEngine>,
  ) -> Self {
    Self {
      ledger: OutcomeTokenLedger::new(),
      events: HashMap::new(),
      markets: HashMap::new(),
      active_markets: HashMap::new(),
      engine,
      fees,
      policy,
      collateral,
      resolver,
      protocol_fees: 0,
      current_block: 0,
    }
  }

  /// Advances the host-ledger block height.
  pub fn advance_block(&mut self, blocks: u64) {
    self.current_block += blocks;
  }

  pub fn collateral(&self) -> &C {
    &self.collateral
  }

  pub fn collateral_mut(&mut self) -> &mut C {
    &mut self.collateral
  }

  pub fn ledger(&self) -> &OutcomeTokenLedger {
    &self.ledger
  }

  pub fn resolver_mut(&mut self) -> &mut R {
    &mut self.resolver
  }

  /// Base protocol fees accrued so far.
  pub fn protocol_fees(&self) -> u128 {
    self.protocol_fees
  }

  // ──── shared lookups ────

  pub(crate) fn event(&self, id: EventId) -> Result<&Event> {
    self.events.get(&id).ok_or(ExchangeError::UnknownEntity("event"))
  }

  pub(crate) fn market(&self, id: MarketId) -> Result<&Market> {
    self.markets.get(&id).ok_or(ExchangeError::UnknownEntity("market"))
  }

  /// The market's pool holdings per outcome, the price engine's state
  /// vector.
  pub(crate) fn pool_holdings(&self, market: &Market) -> Result<Vec<u128>> {
    let outcome_count = self.ledger.outcome_count(market.event)?;
    let pool = market.pool_account();
    Ok((0..outcome_count)
      .map(|o| self.ledger.balance_of(market.event, o, &pool))
      .collect())
  }

  /// Pulls `amount` of collateral from `from` into the exchange account
  /// after checking balance and allowance, so errors carry the exact
  /// shortfall.
  pub(crate) fn pull_collateral(&mut self, from: &str, amount: u128) -> Result<()> {
    let approved = self.collateral.allowance(from, EXCHANGE_ACCOUNT);
    if approved < amount {
      return Err(ExchangeError::InsufficientAllowance { needed: amount, approved });
    }
    let available = self.collateral.balance_of(from);
    if available < amount {
      return Err(ExchangeError::InsufficientBalance { needed: amount, available });
    }
    self
      .collateral
      .transfer_from(EXCHANGE_ACCOUNT, from, EXCHANGE_ACCOUNT, amount)
  }

  /// Pays `amount` of collateral out of the exchange account.
  pub(crate) fn pay_collateral(&mut self, to: &str, amount: u128) -> Result<()> {
    if amount == 0 {
      return Ok(());
    }
    self.collateral.transfer(EXCHANGE_ACCOUNT, to, amount)
  }
}
