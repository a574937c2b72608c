//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` plus the
//! operation journal. The core never depends on these; the binary (or
//! an embedding host ledger) wires them in.
//!
//! Adapter categories:
//! - `memory`: map-backed collateral token and manually reported
//!   resolver, used by the demo binary and the test suites
//! - `journal`: append-only JSONL record of executed operations

pub mod journal;
pub mod memory;

pub use journal::{Action, OperationRecord, TradeJournal};
pub use memory::{InMemoryToken, ManualResolver};
