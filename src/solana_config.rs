use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::{CommitmentConfig, CommitmentLevel};
use std::env;
use std::str::FromStr;

use crate::error::MonitorError;

const MAINNET_RPC_URL: &str = "https://api.mainnet-beta.solana.com";

#[derive(Clone, Debug)]
pub struct SolanaConfig {
    pub rpc_url: String,
    pub commitment: CommitmentConfig,
    pub max_supported_transaction_version: Option<u8>,
}

impl SolanaConfig {
    // Default mainnet configuration
    pub fn mainnet_default() -> Self {
        Self::custom(MAINNET_RPC_URL.to_string(), CommitmentConfig::confirmed())
    }

    pub fn custom(rpc_url: String, commitment: CommitmentConfig) -> Self {
        Self {
            rpc_url,
            commitment,
            max_supported_transaction_version: Some(0),
        }
    }

    /// Reads `SOLANA_RPC_URL`, `SOLANA_COMMITMENT` and `SOLANA_MAX_TX_VERSION`,
    /// falling back to mainnet with `confirmed` commitment.
    pub fn load_from_env() -> Result<Self, MonitorError> {
        let mut config = Self::mainnet_default();

        if let Ok(url) = env::var("SOLANA_RPC_URL") {
            config.rpc_url = url;
        }

        if let Ok(level) = env::var("SOLANA_COMMITMENT") {
            let commitment = CommitmentLevel::from_str(&level).map_err(|_| {
                MonitorError::Config(format!("unknown commitment level '{}'", level))
            })?;
            config.commitment = CommitmentConfig { commitment };
        }

        if let Ok(version) = env::var("SOLANA_MAX_TX_VERSION") {
            let version = version.parse::<u8>().map_err(|e| {
                MonitorError::Config(format!("SOLANA_MAX_TX_VERSION: {}", e))
            })?;
            config.max_supported_transaction_version = Some(version);
        }

        Ok(config)
    }

    // Create RPC client
    pub fn create_rpc_client(&self) -> RpcClient {
        RpcClient::new_with_commitment(self.rpc_url.clone(), self.commitment)
    }
}

impl Default for SolanaConfig {
    fn default() -> Self {
        Self::mainnet_default()
    }
}
