use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::MonitorError;

/// Which novelty check decides whether a transaction yields a record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NoveltyPolicy {
    /// Every unseen signature is classified; known mints only skip the
    /// metadata lookup.
    #[default]
    PerSignature,
    /// Mints already seen in this session are left out of classification,
    /// so a transaction touching only known mints yields nothing.
    PerMint,
}

impl FromStr for NoveltyPolicy {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "signature" | "per-signature" => Ok(NoveltyPolicy::PerSignature),
            "mint" | "per-mint" => Ok(NoveltyPolicy::PerMint),
            other => Err(MonitorError::Config(format!("unknown novelty policy '{}'", other))),
        }
    }
}

#[derive(Clone, Debug)]
pub struct MonitorConfig {
    pub poll_interval: Duration,  // Time between scheduled cycles
    pub fetch_delay: Duration,    // Pause before every transaction fetch
    pub signature_limit: usize,   // Signatures listed per cycle
    pub fetch_timeout: Duration,  // Upper bound for a single ledger call
    pub feed_capacity: usize,     // Records kept for presentation
    pub novelty: NoveltyPolicy,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            fetch_delay: Duration::from_millis(500),
            signature_limit: 10,
            fetch_timeout: Duration::from_secs(30),
            feed_capacity: 500,
            novelty: NoveltyPolicy::default(),
        }
    }
}

impl MonitorConfig {
    pub fn load_from_env() -> Result<Self, MonitorError> {
        let defaults = Self::default();

        Ok(Self {
            poll_interval: Duration::from_secs(env_or(
                "MONITOR_POLL_INTERVAL_SECS",
                defaults.poll_interval.as_secs(),
            )?),
            fetch_delay: Duration::from_millis(env_or(
                "MONITOR_FETCH_DELAY_MS",
                defaults.fetch_delay.as_millis() as u64,
            )?),
            signature_limit: env_or("MONITOR_SIGNATURE_LIMIT", defaults.signature_limit)?,
            fetch_timeout: Duration::from_secs(env_or(
                "MONITOR_FETCH_TIMEOUT_SECS",
                defaults.fetch_timeout.as_secs(),
            )?),
            feed_capacity: env_or("MONITOR_FEED_CAPACITY", defaults.feed_capacity)?,
            novelty: env_or("MONITOR_NOVELTY", defaults.novelty)?,
        })
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T, MonitorError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(value) => value
            .parse::<T>()
            .map_err(|e| MonitorError::Config(format!("{}: {}", key, e))),
        Err(_) => Ok(default),
    }
}
