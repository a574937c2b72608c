//! In-Memory Port Adapters
//!
//! Reference implementations of the collateral and resolver ports
//! backed by plain maps. They power the demo binary and the test
//! suites; a deployment embedding the core in a host ledger supplies
//! its own adapters against the same traits.

use std::collections::HashMap;

use crate::domain::entities::EventId;
use crate::domain::error::{ExchangeError, Result};
use crate::ports::collateral::CollateralToken;
use crate::ports::resolver::OutcomeResolver;

/// Map-backed fungible token with the owner/allowance model.
#[derive(Debug, Default)]
pub struct InMemoryToken {
  balances: HashMap<String, u128>,
  /// (owner, spender) → remaining allowance.
  allowances: HashMap<(String, String), u128>,
}

impl InMemoryToken {
  pub fn new() -> Self {
    Self::default()
  }

  /// Credits freshly issued collateral to an account.
  pub fn mint(&mut self, account: &str, amount: u128) {
    *self.balances.entry(account.to_string()).or_insert(0) += amount;
  }

  /// Sets the allowance `spender` may move out of `owner`'s balance.
  pub fn approve(&mut self, owner: &str, spender: &str, amount: u128) {
    self
      .allowances
      .insert((owner.to_string(), spender.to_string()), amount);
  }
}

impl CollateralToken for InMemoryToken {
  fn balance_of(&self, account: &str) -> u128 {
    self.balances.get(account).copied().unwrap_or(0)
  }

  fn allowance(&self, owner: &str, spender: &str) -> u128 {
    self
      .allowances
      .get(&(owner.to_string(), spender.to_string()))
      .copied()
      .unwrap_or(0)
  }

  fn transfer(&mut self, from: &str, to: &str, amount: u128) -> Result<()> {
    let available = self.balance_of(from);
    if available < amount {
      return Err(ExchangeError::InsufficientBalance { needed: amount, available });
    }
    *self.balances.entry(from.to_string()).or_insert(0) -= amount;
    *self.balances.entry(to.to_string()).or_insert(0) += amount;
    Ok(())
  }

  fn transfer_from(&mut self, spender: &str, from: &str, to: &str, amount: u128) -> Result<()> {
    let key = (from.to_string(), spender.to_string());
    let approved = self.allowances.get(&key).copied().unwrap_or(0);
    if approved < amount {
      return Err(ExchangeError::InsufficientAllowance { needed: amount, approved });
    }
    self.transfer(from, to, amount)?;
    if let Some(remaining) = self.allowances.get_mut(&key) {
      *remaining -= amount;
    }
    Ok(())
  }
}

/// Resolver whose outcomes are reported by direct calls, standing in
/// for an oracle contract.
#[derive(Debug, Default)]
pub struct ManualResolver {
  outcomes: HashMap<EventId, u8>,
}

impl ManualResolver {
  pub fn new() -> Self {
    Self::default()
  }

  /// Reports the winning outcome of an event.
  pub fn report(&mut self, event: EventId, outcome: u8) {
    self.outcomes.insert(event, outcome);
  }
}

impl OutcomeResolver for ManualResolver {
  fn is_outcome_set(&self, event: EventId) -> bool {
    self.outcomes.contains_key(&event)
  }

  fn outcome(&self, event: EventId) -> Result<u8> {
    self
      .outcomes
      .get(&event)
      .copied()
      .ok_or(ExchangeError::NotResolved)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_transfer_moves_balance() {
    let mut token = InMemoryToken::new();
    token.mint("alice", 100);
    token.transfer("alice", "bob", 30).unwrap();
    assert_eq!(token.balance_of("alice"), 70);
    assert_eq!(token.balance_of("bob"), 30);
  }

  #[test]
  fn test_transfer_from_consumes_allowance() {
    let mut token = InMemoryToken::new();
    token.mint("alice", 100);
    token.approve("alice", "exchange", 50);
    token.transfer_from("exchange", "alice", "pool", 40).unwrap();
    assert_eq!(token.allowance("alice", "exchange"), 10);
    let err = token.transfer_from("exchange", "alice", "pool", 20).unwrap_err();
    assert_eq!(
      err,
      ExchangeError::InsufficientAllowance { needed: 20, approved: 10 }
    );
  }

  #[test]
  fn test_overdraft_rejected() {
    let mut token = InMemoryToken::new();
    token.mint("alice", 10);
    assert!(token.transfer("alice", "bob", 11).is_err());
    assert_eq!(token.balance_of("alice"), 10);
  }

  #[test]
  fn test_resolver_reports_once_set() {
    let mut resolver = ManualResolver::new();
    let event = EventId([1; 32]);
    assert!(!resolver.is_outcome_set(event));
    assert_eq!(resolver.outcome(event), Err(ExchangeError::NotResolved));
    resolver.report(event, 1);
    assert!(resolver.is_outcome_set(event));
    assert_eq!(resolver.outcome(event), Ok(1));
  }
}
