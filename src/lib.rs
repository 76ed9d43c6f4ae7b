pub mod dex;
pub mod error;
pub mod ledger;
pub mod metadata;
pub mod monitor;
mod solana_config;

pub use solana_config::SolanaConfig;

// Re-export key types
pub use dex::DexProtocol;

pub use error::{MonitorError, MonitorErrorKind, MonitorResult};

pub use ledger::{
    LedgerClient,
    ParsedTransaction,
    ProgramAddress,
    RpcLedgerClient,
    SignatureRecord,
    TxStatus,
};

pub use metadata::{
    HeliusMetadataResolver,
    MetadataConfig,
    MetadataResolver,
    TokenInfo,
};

pub use monitor::{
    CycleOutcome,
    DedupLedger,
    DiffClassifier,
    FeedUpdate,
    MonitorConfig,
    NoveltyPolicy,
    TokenLeg,
    TransactionMonitor,
    TransactionRecord,
};
