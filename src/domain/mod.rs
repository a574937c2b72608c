//! Domain layer - core pricing and ledger logic.
//!
//! Pure, deterministic business logic: fixed-point math, the LMSR cost
//! function, fee arithmetic, entity identities and the outcome-token
//! ledger. No I/O and no host-ledger assumptions here (hexagonal
//! architecture inner ring); everything is testable in isolation.

pub mod entities;
pub mod error;
pub mod fees;
pub mod fixed;
pub mod ledger;
pub mod lmsr;

// Re-export core types for convenience
pub use entities::{AccountId, Event, EventId, Market, MarketId};
pub use error::{ExchangeError, Result};
pub use fees::FeeSchedule;
pub use fixed::Fixed;
pub use ledger::OutcomeTokenLedger;
pub use lmsr::{LmsrMaker, PriceEngine, FEE_RANGE};
