//! Configuration Module - TOML-based Exchange Configuration
//!
//! Loads and validates configuration from `config.toml`. All protocol
//! parameters with an operator choice behind them live here - the base
//! protocol fee, the market creation floor, logging - nothing is
//! hardcoded in the domain layer.

pub mod loader;

use serde::Deserialize;

/// Top-level exchange configuration.
///
/// Loaded from `config.toml` at startup. All fields are validated
/// before the exchange accepts its first operation.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Exchange identity and logging.
  pub exchange: ExchangeConfig,
  /// Fee parameters.
  pub fees: FeesConfig,
  /// Market creation parameters.
  pub markets: MarketsConfig,
}

/// Exchange identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeConfig {
  /// Human-readable deployment name.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
}

/// Fee configuration.
///
/// Rates are parts per million of `FEE_RANGE` (1 000 000), so 2000
/// means 0.2 %.
#[derive(Debug, Clone, Deserialize)]
pub struct FeesConfig {
  /// Base protocol fee on share-quantity movements. Zero by default.
  #[serde(default)]
  pub base_fee_ppm: u128,
}

/// Market creation configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketsConfig {
  /// Minimum initial funding for a new market, in collateral base
  /// units. Guards against dust markets whose LMSR state rounds badly.
  #[serde(default = "default_min_funding")]
  pub min_funding: u128,
  /// Highest per-market fee rate a creator may set, parts per million.
  #[serde(default = "default_max_fee_ppm")]
  pub max_fee_ppm: u128,
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

fn default_min_funding() -> u128 {
  // one whole collateral unit at 18 decimals
  1_000_000_000_000_000_000
}

fn default_max_fee_ppm() -> u128 {
  // 10 %
  100_000
}
