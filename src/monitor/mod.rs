pub mod classifier;
pub mod config;
mod orchestrator;
pub mod session;
mod types;

#[cfg(test)]
mod testing;

pub use classifier::{balance_deltas, DiffClassifier, MintDelta};
pub use config::{MonitorConfig, NoveltyPolicy};
pub use orchestrator::TransactionMonitor;
pub use session::{CycleDraft, DedupLedger};
pub use types::{
    CycleOutcome,
    FeedUpdate,
    PollPhase,
    TokenLeg,
    TransactionRecord,
    UNKNOWN_PROGRAM,
};
