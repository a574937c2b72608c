//! Outcome Resolver Port
//!
//! The oracle collaborator that reports which outcome of an event
//! occurred. The core never decides outcomes itself; redemption refuses
//! to pay until the resolver has spoken.

use crate::domain::entities::EventId;
use crate::domain::error::Result;

/// Oracle surface consumed by the redemption path.
#[cfg_attr(test, mockall::automock)]
pub trait OutcomeResolver: Send + Sync {
  /// Whether the event's outcome has been reported.
  fn is_outcome_set(&self, event: EventId) -> bool;

  /// The winning outcome index. Fails with `NotResolved` while
  /// `is_outcome_set` is false.
  fn outcome(&self, event: EventId) -> Result<u8>;
}
