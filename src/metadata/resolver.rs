use async_trait::async_trait;
use log::{debug, warn};
use std::sync::Arc;

use super::config::MetadataConfig;
use super::types::{TokenInfo, TokenMetadataEntry, TokenMetadataRequest};
use crate::error::{MonitorError, MonitorResult};

#[cfg(test)]
use mockall::automock;

/// Looks up display metadata for a mint. Never fails: `None` means the leg
/// for this mint gets dropped.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MetadataResolver: Send + Sync {
    async fn resolve(&self, mint: &str) -> Option<TokenInfo>;
}

#[async_trait]
impl<T: MetadataResolver + ?Sized> MetadataResolver for Arc<T> {
    async fn resolve(&self, mint: &str) -> Option<TokenInfo> {
        (**self).resolve(mint).await
    }
}

pub struct HeliusMetadataResolver {
    config: MetadataConfig,
    http_client: reqwest::Client,
}

impl HeliusMetadataResolver {
    pub fn new(config: MetadataConfig) -> MonitorResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        if config.api_key.is_none() {
            warn!("No METADATA_API_KEY set, token metadata requests will likely be rejected");
        }

        Ok(Self {
            config,
            http_client,
        })
    }

    async fn fetch(&self, mint: &str) -> MonitorResult<TokenInfo> {
        let body = TokenMetadataRequest {
            mint_accounts: vec![mint],
            include_off_chain: true,
            disable_cache: false,
        };

        let mut request = self.http_client.post(&self.config.api_url).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.query(&[("api-key", key)]);
        }

        let entries = request
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<Option<TokenMetadataEntry>>>()
            .await?;

        first_entry(entries, mint)
    }
}

// Only the first entry counts; a missing or null one means the indexer does
// not know the mint.
fn first_entry(entries: Vec<Option<TokenMetadataEntry>>, mint: &str) -> MonitorResult<TokenInfo> {
    entries
        .into_iter()
        .next()
        .flatten()
        .map(|entry| entry.into_token_info(mint))
        .ok_or_else(|| MonitorError::MetadataUnavailable(mint.to_string()))
}

#[async_trait]
impl MetadataResolver for HeliusMetadataResolver {
    async fn resolve(&self, mint: &str) -> Option<TokenInfo> {
        match self.fetch(mint).await {
            Ok(info) => {
                debug!("Resolved mint {} as {} ({})", mint, info.symbol, info.name);
                Some(info)
            }
            Err(e) => {
                warn!("Error fetching token info for {}: {}", mint, e);
                None
            }
        }
    }
}
