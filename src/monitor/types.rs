use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::dex::DexProtocol;
use crate::ledger::{ProgramAddress, TxStatus};
use crate::metadata::TokenInfo;

pub const UNKNOWN_PROGRAM: &str = "Unknown";

/// One side of a classified transfer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TokenLeg {
    pub mint: String,
    pub symbol: String,
    pub name: String,
    pub amount: f64,
    pub is_input: bool,
}

impl TokenLeg {
    /// A negative balance change means the monitored side paid this token.
    pub fn from_delta(info: &TokenInfo, delta: f64) -> Self {
        Self {
            mint: info.mint.clone(),
            symbol: info.symbol.clone(),
            name: info.name.clone(),
            amount: delta.abs(),
            is_input: delta < 0.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TransactionRecord {
    pub signature: String,
    pub timestamp: DateTime<Utc>,
    pub status: TxStatus,
    pub input_leg: Option<TokenLeg>,
    pub output_leg: Option<TokenLeg>,
    pub program_name: String,
    pub protocol: Option<DexProtocol>,
}

/// A batch of records emitted by one completed cycle, newest first.
#[derive(Clone, Debug)]
pub struct FeedUpdate {
    pub address: ProgramAddress,
    pub records: Vec<TransactionRecord>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollPhase {
    Idle,
    Polling,
}

/// What a single poll cycle ended up doing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Cycle ran; `emitted` records were prepended to the feed.
    Completed { emitted: usize },
    /// Another cycle of the same session was still running.
    Busy,
    /// The address changed while the cycle ran; its results were dropped.
    Discarded,
    /// Listing signatures failed; nothing was processed.
    Failed,
    /// No address is being monitored.
    Inactive,
}
