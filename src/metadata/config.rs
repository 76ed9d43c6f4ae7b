use std::env;
use std::time::Duration;

use crate::error::MonitorError;

pub const DEFAULT_METADATA_URL: &str = "https://api.helius.xyz/v0/token-metadata";

#[derive(Clone, Debug)]
pub struct MetadataConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub request_timeout: Duration,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_METADATA_URL.to_string(),
            api_key: None,
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl MetadataConfig {
    pub fn load_from_env() -> Result<Self, MonitorError> {
        let mut config = Self::default();

        if let Ok(url) = env::var("METADATA_API_URL") {
            config.api_url = url;
        }
        config.api_key = env::var("METADATA_API_KEY").ok().filter(|key| !key.is_empty());

        if let Ok(secs) = env::var("METADATA_TIMEOUT_SECS") {
            let secs = secs
                .parse::<u64>()
                .map_err(|e| MonitorError::Config(format!("METADATA_TIMEOUT_SECS: {}", e)))?;
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}
