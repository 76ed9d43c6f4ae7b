use async_trait::async_trait;
use log::debug;
use serde_json::json;
use solana_client::{
    nonblocking::rpc_client::RpcClient,
    rpc_client::GetConfirmedSignaturesForAddress2Config,
    rpc_config::RpcTransactionConfig,
    rpc_request::RpcRequest,
};
use solana_sdk::{commitment_config::CommitmentConfig, signature::Signature};
use solana_transaction_status::{EncodedConfirmedTransactionWithStatusMeta, UiTransactionEncoding};
use std::str::FromStr;
use std::sync::Arc;

use super::parse;
use super::types::{block_time_to_utc, ParsedTransaction, ProgramAddress, SignatureRecord};
use crate::error::{MonitorError, MonitorResult};
use crate::solana_config::SolanaConfig;

#[cfg(test)]
use mockall::automock;

/// Read-only view of the ledger used by the polling loop.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Most recent signatures touching `address`, newest first.
    async fn list_recent_signatures(
        &self,
        address: &ProgramAddress,
        limit: usize,
    ) -> MonitorResult<Vec<SignatureRecord>>;

    /// `Ok(None)` means the ledger has nothing confirmed for this signature yet.
    async fn fetch_parsed_transaction(
        &self,
        signature: &str,
    ) -> MonitorResult<Option<ParsedTransaction>>;
}

#[async_trait]
impl<T: LedgerClient + ?Sized> LedgerClient for Arc<T> {
    async fn list_recent_signatures(
        &self,
        address: &ProgramAddress,
        limit: usize,
    ) -> MonitorResult<Vec<SignatureRecord>> {
        (**self).list_recent_signatures(address, limit).await
    }

    async fn fetch_parsed_transaction(
        &self,
        signature: &str,
    ) -> MonitorResult<Option<ParsedTransaction>> {
        (**self).fetch_parsed_transaction(signature).await
    }
}

pub struct RpcLedgerClient {
    client: RpcClient,
    commitment: CommitmentConfig,
    max_supported_transaction_version: Option<u8>,
}

impl RpcLedgerClient {
    pub fn new(solana_config: &SolanaConfig) -> Self {
        Self {
            client: solana_config.create_rpc_client(),
            commitment: solana_config.commitment,
            max_supported_transaction_version: solana_config.max_supported_transaction_version,
        }
    }

    fn transaction_config(&self) -> RpcTransactionConfig {
        RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::JsonParsed),
            commitment: Some(self.commitment),
            max_supported_transaction_version: self.max_supported_transaction_version,
        }
    }
}

#[async_trait]
impl LedgerClient for RpcLedgerClient {
    async fn list_recent_signatures(
        &self,
        address: &ProgramAddress,
        limit: usize,
    ) -> MonitorResult<Vec<SignatureRecord>> {
        let config = GetConfirmedSignaturesForAddress2Config {
            before: None,
            until: None,
            limit: Some(limit),
            commitment: Some(self.commitment),
        };

        let statuses = self
            .client
            .get_signatures_for_address_with_config(address.pubkey(), config)
            .await?;

        Ok(statuses
            .into_iter()
            .map(|status| SignatureRecord {
                signature: status.signature,
                slot_time: status.block_time.and_then(block_time_to_utc),
            })
            .collect())
    }

    async fn fetch_parsed_transaction(
        &self,
        signature: &str,
    ) -> MonitorResult<Option<ParsedTransaction>> {
        let parsed_signature = Signature::from_str(signature)
            .map_err(|e| MonitorError::InvalidSignature(format!("{}: {}", signature, e)))?;

        // Raw request so a `null` result stays distinguishable from a failure.
        let response: Option<EncodedConfirmedTransactionWithStatusMeta> = self
            .client
            .send(
                RpcRequest::GetTransaction,
                json!([parsed_signature.to_string(), self.transaction_config()]),
            )
            .await?;

        match response {
            Some(confirmed) => Ok(parse::parsed_transaction(signature, confirmed)),
            None => {
                debug!("Ledger returned no transaction for {}", signature);
                Ok(None)
            }
        }
    }
}
