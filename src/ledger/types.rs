use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use std::fmt;
use std::str::FromStr;

use crate::error::MonitorError;

/// Shortest string accepted as a program address before decoding.
pub const MIN_ADDRESS_LEN: usize = 32;

/// Validated address of the monitored on-chain program.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ProgramAddress {
    raw: String,
    pubkey: Pubkey,
}

impl ProgramAddress {
    pub fn parse(input: &str) -> Result<Self, MonitorError> {
        let raw = input.trim();
        if raw.is_empty() {
            return Err(MonitorError::InvalidAddress("address is empty".to_string()));
        }
        if raw.len() < MIN_ADDRESS_LEN {
            return Err(MonitorError::InvalidAddress(format!(
                "'{}' is shorter than {} characters",
                raw, MIN_ADDRESS_LEN
            )));
        }

        let pubkey = Pubkey::from_str(raw)
            .map_err(|e| MonitorError::InvalidAddress(format!("'{}': {}", raw, e)))?;

        Ok(Self {
            raw: raw.to_string(),
            pubkey,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn pubkey(&self) -> &Pubkey {
        &self.pubkey
    }
}

impl fmt::Display for ProgramAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for ProgramAddress {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SignatureRecord {
    pub signature: String,
    pub slot_time: Option<DateTime<Utc>>,
}

/// Token balance of one account, before or after execution.
#[derive(Clone, Debug, PartialEq)]
pub struct MintBalance {
    pub mint: String,
    pub ui_amount: Option<f64>,
}

impl MintBalance {
    pub fn new(mint: impl Into<String>, ui_amount: Option<f64>) -> Self {
        Self {
            mint: mint.into(),
            ui_amount,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParsedTransaction {
    pub signature: String,
    pub block_time: DateTime<Utc>,
    pub succeeded: bool,
    pub pre_balances: Vec<MintBalance>,
    pub post_balances: Vec<MintBalance>,
    pub top_level_program: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TxStatus {
    Success,
    Failed,
}

/// Converts a ledger unix timestamp (seconds) into UTC.
pub fn block_time_to_utc(timestamp: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(timestamp, 0).single()
}
