//! Collateral Token Port
//!
//! The standard fungible-token surface the ledger relies on — nothing
//! beyond transfer, allowance and balance queries is ever assumed. The
//! exchange core executes inside the host's serialized transaction
//! context, so moves name their `from` account explicitly and the host
//! is trusted to have authenticated the caller.

use crate::domain::error::Result;

/// Fungible collateral token contract surface.
#[cfg_attr(test, mockall::automock)]
pub trait CollateralToken: Send + Sync {
  /// Balance of an account in collateral base units.
  fn balance_of(&self, account: &str) -> u128;

  /// Remaining amount `spender` may pull from `owner`.
  fn allowance(&self, owner: &str, spender: &str) -> u128;

  /// Owner-authorized move. Fails with `InsufficientBalance`.
  fn transfer(&mut self, from: &str, to: &str, amount: u128) -> Result<()>;

  /// Spender-authorized move, deducting from the allowance. Fails with
  /// `InsufficientAllowance` or `InsufficientBalance`.
  fn transfer_from(
    &mut self,
    spender: &str,
    from: &str,
    to: &str,
    amount: u128,
  ) -> Result<()>;
}
