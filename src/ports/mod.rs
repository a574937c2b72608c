//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) the core requires from its external
//! collaborators. Adapters implement these traits.
//!
//! Port categories:
//! - `CollateralToken`: the fungible token outcome shares are backed by
//! - `OutcomeResolver`: the oracle that reports resolved outcomes

pub mod collateral;
pub mod resolver;

pub use collateral::CollateralToken;
pub use resolver::OutcomeResolver;
