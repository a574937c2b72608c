//! Trade Journal - Append-only JSONL Operation Records
//!
//! Persists every executed operation to an append-only JSONL file,
//! one self-contained JSON object per line. The core itself stays
//! storage-free; the embedding binary appends a record after each
//! successful operation, giving an auditable replay log without a
//! database dependency.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::entities::{EventId, MarketId};

/// One executed exchange operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRecord {
  /// Host-ledger block height at execution.
  pub block: u64,
  pub account: String,
  pub action: Action,
  pub event: EventId,
  /// Market involved, absent for registry and redemption operations.
  pub market: Option<MarketId>,
  /// Outcome index, absent for full-set conversions.
  pub outcome: Option<u8>,
  /// Share quantity moved.
  pub shares: u128,
  /// Collateral that changed hands, fees included.
  pub collateral: u128,
}

/// Operation discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
  Buy,
  Sell,
  ShortSell,
  BuyAllOutcomes,
  SellAllOutcomes,
  FundMarket,
  CloseMarket,
  WithdrawFees,
  Redeem,
}

/// Append-only JSONL journal.
pub struct TradeJournal {
  path: PathBuf,
}

impl TradeJournal {
  /// Opens (creating if needed) the journal at `dir/operations.jsonl`.
  pub fn new(dir: &str) -> Result<Self> {
    fs::create_dir_all(dir)
      .with_context(|| format!("Failed to create journal directory {dir}"))?;
    Ok(Self {
      path: Path::new(dir).join("operations.jsonl"),
    })
  }

  /// Appends one record and flushes it to disk.
  pub fn append(&self, record: &OperationRecord) -> Result<()> {
    let mut json =
      serde_json::to_string(record).context("Failed to serialize operation record")?;
    json.push('\n');

    let mut file = OpenOptions::new()
      .create(true)
      .append(true)
      .open(&self.path)
      .context("Failed to open journal file")?;
    file
      .write_all(json.as_bytes())
      .context("Failed to write operation record")?;
    file.flush().context("Failed to flush journal")?;
    Ok(())
  }

  /// Loads every record in append order.
  pub fn load_all(&self) -> Result<Vec<OperationRecord>> {
    if !self.path.exists() {
      return Ok(Vec::new());
    }
    let content = fs::read_to_string(&self.path).context("Failed to read journal file")?;
    let mut records = Vec::new();
    for line in content.lines() {
      if line.trim().is_empty() {
        continue;
      }
      let record = serde_json::from_str(line)
        .with_context(|| format!("Malformed journal line: {line}"))?;
      records.push(record);
    }
    Ok(records)
  }
}
