//! LMSR Exchange — Demo Entry Point
//!
//! Wires the exchange core to the in-memory adapters and replays a
//! scripted session end to end: event creation, market funding, trades
//! in all three shapes, resolution and redemption. Every executed
//! operation lands in the JSONL journal under `data/`.
//!
//! Wiring sequence:
//! 1. Load config.toml + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Build the exchange with in-memory collateral and resolver
//! 4. Run the scripted session, journaling each operation

use anyhow::{Context, Result};
use tracing::info;

use lmsr_exchange::adapters::{Action, InMemoryToken, ManualResolver, OperationRecord, TradeJournal};
use lmsr_exchange::config;
use lmsr_exchange::domain::FeeSchedule;
use lmsr_exchange::ports::CollateralToken;
use lmsr_exchange::usecases::registry::EventParams;
use lmsr_exchange::usecases::{Exchange, MarketPolicy};

const UNIT: u128 = 1_000_000_000_000_000_000;

fn main() -> Result<()> {
    // ── 1. Load configuration from config.toml ──────────────
    let config = config::loader::load_config("config.toml")
        .context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new(&config.exchange.log_level)
                }),
        )
        .json()
        .init();

    info!(
        name = %config.exchange.name,
        version = env!("CARGO_PKG_VERSION"),
        base_fee_ppm = config.fees.base_fee_ppm,
        "Starting LMSR exchange demo"
    );

    // ── 3. Build the exchange with in-memory adapters ───────
    let fees = FeeSchedule::new(config.fees.base_fee_ppm).context("Invalid base fee")?;
    let policy = MarketPolicy {
        min_funding: config.markets.min_funding,
        max_fee_ppm: config.markets.max_fee_ppm,
    };
    let mut exchange = Exchange::new(InMemoryToken::new(), ManualResolver::new(), fees, policy);
    let journal = TradeJournal::new("data").context("Failed to open journal")?;

    // ── 4. Scripted session ─────────────────────────────────
    seed_account(&mut exchange, "creator", 20 * UNIT);
    seed_account(&mut exchange, "alice", 5 * UNIT);
    seed_account(&mut exchange, "bob", 5 * UNIT);

    let event = exchange
        .create_event(EventParams {
            description_hash: hmac_sha256::Hash::hash(b"Will it rain tomorrow?"),
            is_ranged: false,
            lower_bound: 0,
            upper_bound: 0,
            outcome_count: 2,
            collateral_token: "usd".into(),
            resolver: "oracle".into(),
        })?;

    let market = exchange
        .create_market("creator", event, 10 * UNIT, 5_000)?;
    journal.append(&OperationRecord {
        block: 0,
        account: "creator".into(),
        action: Action::FundMarket,
        event,
        market: Some(market),
        outcome: None,
        shares: 0,
        collateral: 10 * UNIT,
    })?;

    exchange.advance_block(1);
    let paid = exchange
        .buy("alice", market, 1, UNIT, 2 * UNIT)?;
    journal.append(&OperationRecord {
        block: 1,
        account: "alice".into(),
        action: Action::Buy,
        event,
        market: Some(market),
        outcome: Some(1),
        shares: UNIT,
        collateral: paid,
    })?;

    exchange.advance_block(1);
    let outlay = exchange
        .short_sell("bob", market, 1, UNIT, 0)?;
    journal.append(&OperationRecord {
        block: 2,
        account: "bob".into(),
        action: Action::ShortSell,
        event,
        market: Some(market),
        outcome: Some(1),
        shares: UNIT,
        collateral: outlay,
    })?;

    let price = exchange
        .marginal_price(market, 1)?;
    info!(market = %market, price = ?price, "price after trading");

    exchange.advance_block(1);
    let earned = exchange
        .sell("alice", market, 1, UNIT, 0)?;
    journal.append(&OperationRecord {
        block: 3,
        account: "alice".into(),
        action: Action::Sell,
        event,
        market: Some(market),
        outcome: Some(1),
        shares: UNIT,
        collateral: earned,
    })?;

    // creator takes fees and winds the market down
    let fees_out = exchange
        .withdraw_fees("creator", market)?;
    exchange
        .close_market("creator", market)?;
    journal.append(&OperationRecord {
        block: 3,
        account: "creator".into(),
        action: Action::CloseMarket,
        event,
        market: Some(market),
        outcome: None,
        shares: 0,
        collateral: fees_out,
    })?;

    // the oracle reports outcome 0 and holders redeem
    exchange.resolver_mut().report(event, 0);
    for account in ["creator", "alice", "bob"] {
        let winnings = exchange
            .redeem_winnings(account, event)?;
        journal.append(&OperationRecord {
            block: 3,
            account: account.into(),
            action: Action::Redeem,
            event,
            market: None,
            outcome: Some(0),
            shares: winnings,
            collateral: winnings,
        })?;
    }

    info!(
        creator = exchange.collateral().balance_of("creator"),
        alice = exchange.collateral().balance_of("alice"),
        bob = exchange.collateral().balance_of("bob"),
        protocol_fees = exchange.protocol_fees(),
        "Session complete"
    );
    Ok(())
}

/// Mints demo collateral and pre-approves the exchange.
fn seed_account(
    exchange: &mut Exchange<InMemoryToken, ManualResolver>,
    account: &str,
    amount: u128,
) {
    exchange.collateral_mut().mint(account, amount);
    exchange
        .collateral_mut()
        .approve(account, lmsr_exchange::usecases::EXCHANGE_ACCOUNT, u128::MAX);
}
