//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::domain::lmsr::FEE_RANGE;

use super::AppConfig;

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config: AppConfig = toml::from_str(&content)
    .with_context(|| "Failed to parse config.toml")?;

  validate_config(&config)?;

  info!(
    name = %config.exchange.name,
    base_fee_ppm = config.fees.base_fee_ppm,
    min_funding = config.markets.min_funding,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Validate all configuration parameters.
fn validate_config(config: &AppConfig) -> Result<()> {
  anyhow::ensure!(
    !config.exchange.name.is_empty(),
    "Exchange name must not be empty"
  );

  anyhow::ensure!(
    config.fees.base_fee_ppm < FEE_RANGE,
    "base_fee_ppm must be below {}, got {}",
    FEE_RANGE,
    config.fees.base_fee_ppm
  );

  anyhow::ensure!(
    config.markets.min_funding > 0,
    "min_funding must be positive"
  );
  anyhow::ensure!(
    config.markets.max_fee_ppm < FEE_RANGE,
    "max_fee_ppm must be below {}, got {}",
    FEE_RANGE,
    config.markets.max_fee_ppm
  );

  Ok(())
}
