mod client;
pub mod parse;
mod types;

pub use client::{LedgerClient, RpcLedgerClient};
#[cfg(test)]
pub use client::MockLedgerClient;
pub use types::{
    block_time_to_utc,
    MintBalance,
    ParsedTransaction,
    ProgramAddress,
    SignatureRecord,
    TxStatus,
    MIN_ADDRESS_LEN,
};
