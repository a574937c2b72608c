//! Redemption of winning outcome tokens.
//!
//! Once the event's resolver has reported an outcome, holders redeem
//! winning tokens one-to-one for the collateral locked behind them;
//! losing tokens burn worthless in the same step. Redemption works per
//! account and is idempotent: a second call finds nothing left to burn.

use tracing::info;

use crate::domain::entities::EventId;
use crate::domain::error::{ExchangeError, Result};
use crate::ports::collateral::CollateralToken;
use crate::ports::resolver::OutcomeResolver;

use super::Exchange;

impl<C: CollateralToken, R: OutcomeResolver> Exchange<C, R> {
  /// Redeems all of `account`'s outcome tokens of a resolved event.
  /// Returns the collateral paid out. Fails with `NotResolved` while
  /// the resolver has not reported.
  pub fn redeem_winnings(&mut self, account: &str, event: EventId) -> Result<u128> {
    let outcome_count = self.event(event)?.outcome_count;
    if !self.resolver.is_outcome_set(event) {
      return Err(ExchangeError::NotResolved);
    }
    let winning = self.resolver.outcome(event)?;
    if winning >= outcome_count {
      return Err(ExchangeError::DomainError("resolved outcome index out of range"));
    }

    let winnings = self.ledger.balance_of(event, winning, account);
    if winnings > 0 {
      // the winning burn releases the collateral backing the payout
      self
        .ledger
        .burn_single(event, winning, account, winnings, true)?;
    }
    for outcome in 0..outcome_count {
      if outcome == winning {
        continue;
      }
      let held = self.ledger.balance_of(event, outcome, account);
      if held > 0 {
        self.ledger.burn_single(event, outcome, account, held, false)?;
      }
    }
    self.pay_collateral(account, winnings)?;
    info!(event = %event, account, winning, winnings, "winnings redeemed");
    Ok(winnings)
  }
}
