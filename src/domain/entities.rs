//! Core exchange entities.
//!
//! Events, markets and their stable identities. Both entity kinds are
//! identified by SHA-256 content hashes, so every participant derives
//! the same id from the same creation parameters and duplicates are
//! detected structurally.

use std::fmt;

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────
// Identifiers
// ────────────────────────────────────────────

/// Account identifier in the host ledger's signer-address model.
pub type AccountId = String;

/// Content-hash identity of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub [u8; 32]);

/// Content-hash identity of a market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarketId(pub [u8; 32]);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_hex(f, &self.0)
    }
}

impl fmt::Display for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_hex(f, &self.0)
    }
}

fn write_hex(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    for b in bytes {
        write!(f, "{b:02x}")?;
    }
    Ok(())
}

// ────────────────────────────────────────────
// Event
// ────────────────────────────────────────────

/// A question the world will answer with exactly one of `outcome_count`
/// mutually exclusive outcomes. Immutable once created; its outcome
/// tokens persist for redemption even after resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Content hash over all fields below.
    pub id: EventId,
    /// Hash of the off-ledger event description.
    pub description_hash: [u8; 32],
    /// Ranged events resolve to a position between the bounds instead of
    /// a plain category.
    pub is_ranged: bool,
    pub lower_bound: i64,
    pub upper_bound: i64,
    /// Number of outcome tokens; at least two.
    pub outcome_count: u8,
    /// Identifier of the collateral token backing the outcome tokens.
    pub collateral_token: AccountId,
    /// Identifier of the resolver authorized to report the outcome.
    pub resolver: AccountId,
}

impl Event {
    /// Derives the content-hash identity of an event from its creation
    /// parameters.
    pub fn content_hash(
        description_hash: &[u8; 32],
        is_ranged: bool,
        lower_bound: i64,
        upper_bound: i64,
        outcome_count: u8,
        collateral_token: &str,
        resolver: &str,
    ) -> EventId {
        let mut data = Vec::with_capacity(64 + collateral_token.len() + resolver.len());
        data.extend_from_slice(description_hash);
        data.push(u8::from(is_ranged));
        data.extend_from_slice(&lower_bound.to_be_bytes());
        data.extend_from_slice(&upper_bound.to_be_bytes());
        data.push(outcome_count);
        data.extend_from_slice(collateral_token.as_bytes());
        data.push(0);
        data.extend_from_slice(resolver.as_bytes());
        EventId(hmac_sha256::Hash::hash(&data))
    }
}

// ────────────────────────────────────────────
// Market
// ────────────────────────────────────────────

/// An automated market maker instance over one event.
///
/// The market's own outcome-token balances (the LMSR state vector) live
/// in the ledger under `pool_account`; this struct carries the
/// parameters fixed at creation plus the mutable fee accumulator and
/// open flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    pub id: MarketId,
    pub event: EventId,
    pub creator: AccountId,
    /// Scoring-rule identifier (mixed into the market hash).
    pub maker_kind: String,
    /// Per-market fee on trade costs, parts per million.
    pub fee_rate_ppm: u128,
    /// Fees accrued and not yet withdrawn by the creator.
    pub collected_fees: u128,
    /// Liquidity the funder locked at creation; the LMSR funding
    /// constant is derived from this and never changes.
    pub initial_funding: u128,
    /// Host-ledger block at creation time.
    pub created_at_block: u64,
    pub is_open: bool,
}

impl Market {
    /// Derives the content-hash identity of a market. A closed market's
    /// hash is never reused because creation rejects duplicates.
    pub fn content_hash(event: &EventId, creator: &str, maker_kind: &str) -> MarketId {
        let mut data = Vec::with_capacity(32 + creator.len() + maker_kind.len());
        data.extend_from_slice(&event.0);
        data.extend_from_slice(creator.as_bytes());
        data.push(0);
        data.extend_from_slice(maker_kind.as_bytes());
        MarketId(hmac_sha256::Hash::hash(&data))
    }

    /// Ledger account that holds the market's pooled outcome tokens.
    pub fn pool_account(&self) -> AccountId {
        format!("market:{}", self.id)
    }
}
