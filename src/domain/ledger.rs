//! Outcome-token ledger.
//!
//! One fungible balance ledger per (event, outcome index), with the
//! owner/allowance transfer model, plus the two conversions that tie
//! outcome tokens to collateral: minting a full outcome set against
//! locked collateral and burning a full set to release it.
//!
//! The ledger is pure bookkeeping over an arena keyed by event hash,
//! outcome index and account id. Collateral token movement is the
//! caller's concern (through the `CollateralToken` port); the ledger
//! tracks the locked amount per event so conservation is checkable at
//! any time. Every operation validates all preconditions before the
//! first mutation, so a failure never leaves partial state.

use std::collections::HashMap;

use super::entities::{AccountId, Event, EventId};
use super::error::{ExchangeError, Result};

/// Balance ledger for all outcome tokens of all events.
#[derive(Debug, Default)]
pub struct OutcomeTokenLedger {
    /// Outcome count per registered event.
    outcome_counts: HashMap<EventId, u8>,
    /// (event, outcome) → account → balance.
    balances: HashMap<(EventId, u8), HashMap<AccountId, u128>>,
    /// (event, outcome) → supply. Identical across the outcomes of an
    /// event until redemption burns winning tokens asymmetrically.
    supply: HashMap<(EventId, u8), u128>,
    /// (event, outcome) → (owner, spender) → remaining allowance.
    allowances: HashMap<(EventId, u8), HashMap<(AccountId, AccountId), u128>>,
    /// Collateral locked per event, in collateral base units.
    locked_collateral: HashMap<EventId, u128>,
}

impl OutcomeTokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the outcome tokens of a newly created event.
    pub fn register_event(&mut self, event: &Event) -> Result<()> {
        if self.outcome_counts.contains_key(&event.id) {
            return Err(ExchangeError::DuplicateEvent);
        }
        self.outcome_counts.insert(event.id, event.outcome_count);
        for outcome in 0..event.outcome_count {
            self.balances.insert((event.id, outcome), HashMap::new());
            self.supply.insert((event.id, outcome), 0);
        }
        self.locked_collateral.insert(event.id, 0);
        Ok(())
    }

    pub fn outcome_count(&self, event: EventId) -> Result<u8> {
        self.outcome_counts
            .get(&event)
            .copied()
            .ok_or(ExchangeError::UnknownEntity("event"))
    }

    /// Credits `amount` of every outcome token of `event` to `account`
    /// against `amount` of freshly locked collateral. The caller must
    /// have already pulled the collateral; this records the lock.
    pub fn mint_all(&mut self, event: EventId, account: &str, amount: u128) -> Result<()> {
        let outcome_count = self.outcome_count(event)?;
        let locked = self.locked_collateral[&event]
            .checked_add(amount)
            .ok_or(ExchangeError::DomainError("collateral lock overflow"))?;
        for outcome in 0..outcome_count {
            let supply = self.supply[&(event, outcome)];
            supply
                .checked_add(amount)
                .ok_or(ExchangeError::DomainError("token supply overflow"))?;
        }
        // all checks passed, apply
        for outcome in 0..outcome_count {
            *self.supply.entry((event, outcome)).or_insert(0) += amount;
            *self
                .balances
                .entry((event, outcome))
                .or_default()
                .entry(account.to_string())
                .or_insert(0) += amount;
        }
        self.locked_collateral.insert(event, locked);
        Ok(())
    }

    /// Burns `amount` of every outcome token of `event` held by
    /// `account` and releases `amount` of collateral. Fails with
    /// `InsufficientBalance` if any single outcome balance is short,
    /// without touching the others.
    pub fn burn_all(&mut self, event: EventId, account: &str, amount: u128) -> Result<()> {
        let outcome_count = self.outcome_count(event)?;
        for outcome in 0..outcome_count {
            let available = self.balance_of(event, outcome, account);
            if available < amount {
                return Err(ExchangeError::InsufficientBalance {
                    needed: amount,
                    available,
                });
            }
        }
        for outcome in 0..outcome_count {
            *self
                .balances
                .entry((event, outcome))
                .or_default()
                .entry(account.to_string())
                .or_insert(0) -= amount;
            *self.supply.entry((event, outcome)).or_insert(0) -= amount;
        }
        *self.locked_collateral.entry(event).or_insert(0) -= amount;
        Ok(())
    }

    /// Burns `amount` of one outcome token only. Used by redemption,
    /// where winning and losing tokens leave the supply asymmetrically;
    /// `release_collateral` says whether locked collateral backs the
    /// burned amount out of the event.
    pub(crate) fn burn_single(
        &mut self,
        event: EventId,
        outcome: u8,
        account: &str,
        amount: u128,
        release_collateral: bool,
    ) -> Result<()> {
        self.check_outcome(event, outcome)?;
        let available = self.balance_of(event, outcome, account);
        if available < amount {
            return Err(ExchangeError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        *self
            .balances
            .entry((event, outcome))
            .or_default()
            .entry(account.to_string())
            .or_insert(0) -= amount;
        *self.supply.entry((event, outcome)).or_insert(0) -= amount;
        if release_collateral {
            *self.locked_collateral.entry(event).or_insert(0) -= amount;
        }
        Ok(())
    }

    /// Owner-authorized transfer of one outcome token.
    pub fn transfer(
        &mut self,
        event: EventId,
        outcome: u8,
        from: &str,
        to: &str,
        amount: u128,
    ) -> Result<()> {
        self.check_outcome(event, outcome)?;
        let available = self.balance_of(event, outcome, from);
        if available < amount {
            return Err(ExchangeError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        let balances = self.balances.entry((event, outcome)).or_default();
        *balances.entry(from.to_string()).or_insert(0) -= amount;
        *balances.entry(to.to_string()).or_insert(0) += amount;
        Ok(())
    }

    /// Sets the allowance `spender` may move out of `owner`'s balance.
    pub fn approve(
        &mut self,
        event: EventId,
        outcome: u8,
        owner: &str,
        spender: &str,
        amount: u128,
    ) -> Result<()> {
        self.check_outcome(event, outcome)?;
        self.allowances
            .entry((event, outcome))
            .or_default()
            .insert((owner.to_string(), spender.to_string()), amount);
        Ok(())
    }

    pub fn allowance(&self, event: EventId, outcome: u8, owner: &str, spender: &str) -> u128 {
        self.allowances
            .get(&(event, outcome))
            .and_then(|a| a.get(&(owner.to_string(), spender.to_string())))
            .copied()
            .unwrap_or(0)
    }

    /// Spender-authorized transfer, deducting from the allowance.
    pub fn transfer_from(
        &mut self,
        event: EventId,
        outcome: u8,
        spender: &str,
        from: &str,
        to: &str,
        amount: u128,
    ) -> Result<()> {
        self.check_outcome(event, outcome)?;
        let approved = self.allowance(event, outcome, from, spender);
        if approved < amount {
            return Err(ExchangeError::InsufficientAllowance {
                needed: amount,
                approved,
            });
        }
        self.transfer(event, outcome, from, to, amount)?;
        *self
            .allowances
            .entry((event, outcome))
            .or_default()
            .entry((from.to_string(), spender.to_string()))
            .or_insert(0) -= amount;
        Ok(())
    }

    pub fn balance_of(&self, event: EventId, outcome: u8, account: &str) -> u128 {
        self.balances
            .get(&(event, outcome))
            .and_then(|b| b.get(account))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_supply(&self, event: EventId, outcome: u8) -> u128 {
        self.supply.get(&(event, outcome)).copied().unwrap_or(0)
    }

    /// Collateral currently locked for an event.
    pub fn locked_collateral(&self, event: EventId) -> u128 {
        self.locked_collateral.get(&event).copied().unwrap_or(0)
    }

    /// Per-outcome balances of `account` for each listed event; events
    /// where the account holds nothing are omitted, mirroring the
    /// discovery query of the host protocol.
    pub fn shares_of(&self, account: &str, events: &[EventId]) -> Vec<(EventId, Vec<u128>)> {
        let mut result = Vec::new();
        for &event in events {
            let Ok(outcome_count) = self.outcome_count(event) else {
                continue;
            };
            let balances: Vec<u128> = (0..outcome_count)
                .map(|o| self.balance_of(event, o, account))
                .collect();
            if balances.iter().any(|&b| b > 0) {
                result.push((event, balances));
            }
        }
        result
    }

    fn check_outcome(&self, event: EventId, outcome: u8) -> Result<()> {
        let count = self.outcome_count(event)?;
        if outcome >= count {
            return Err(ExchangeError::DomainError("outcome index out of range"));
        }
        Ok(())
    }
}
