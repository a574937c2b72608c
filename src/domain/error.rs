//! Error taxonomy for the exchange core.
//!
//! Every fallible operation in the crate returns one of these variants.
//! All failures abort the whole operation with zero side effects; callers
//! never observe a partially applied trade or mint.

use thiserror::Error;

/// Errors surfaced by the ledger, pricing engine and market state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExchangeError {
    /// Math input outside its valid range (e.g. ln of a non-positive
    /// number, outcome index past the distribution). Never silently
    /// clamped.
    #[error("math domain error: {0}")]
    DomainError(&'static str),

    /// Quoted bound violated at execution time. The caller may re-quote
    /// and retry with a fresh bound.
    #[error("slippage bound exceeded: computed {computed}, bound {bound}")]
    SlippageExceeded { computed: u128, bound: u128 },

    /// A token balance precondition failed.
    #[error("insufficient balance: needed {needed}, available {available}")]
    InsufficientBalance { needed: u128, available: u128 },

    /// A spender allowance precondition failed.
    #[error("insufficient allowance: needed {needed}, approved {approved}")]
    InsufficientAllowance { needed: u128, approved: u128 },

    /// Trade attempted against a market that is no longer open.
    #[error("market is closed")]
    MarketClosed,

    /// A market with the same {event, creator, maker kind} hash exists.
    #[error("market already exists")]
    DuplicateMarket,

    /// An event with the same content hash exists.
    #[error("event already exists")]
    DuplicateEvent,

    /// Caller is not authorized for this operation (e.g. closing a market
    /// it did not create).
    #[error("caller is not authorized")]
    Unauthorized,

    /// Redemption attempted before the event's resolver reported an
    /// outcome.
    #[error("event outcome is not resolved yet")]
    NotResolved,

    /// Referenced event or market does not exist.
    #[error("unknown entity: {0}")]
    UnknownEntity(&'static str),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ExchangeError>;
