use solana_client::client_error::ClientError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Timeout error after {0:?}")]
    Timeout(Duration),

    #[error("Transaction not yet confirmed: {0}")]
    NotYetConfirmed(String),

    #[error("Metadata unavailable for mint {0}")]
    MetadataUnavailable(String),

    #[error("Invalid program address: {0}")]
    InvalidAddress(String),

    #[error("Invalid transaction signature: {0}")]
    InvalidSignature(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorErrorKind {
    Transport,
    Timeout,
    NotYetConfirmed,
    MetadataUnavailable,
    InvalidAddress,
    InvalidSignature,
    Config,
}

impl MonitorError {
    pub fn kind(&self) -> MonitorErrorKind {
        match self {
            MonitorError::Transport(_) => MonitorErrorKind::Transport,
            MonitorError::Timeout(_) => MonitorErrorKind::Timeout,
            MonitorError::NotYetConfirmed(_) => MonitorErrorKind::NotYetConfirmed,
            MonitorError::MetadataUnavailable(_) => MonitorErrorKind::MetadataUnavailable,
            MonitorError::InvalidAddress(_) => MonitorErrorKind::InvalidAddress,
            MonitorError::InvalidSignature(_) => MonitorErrorKind::InvalidSignature,
            MonitorError::Config(_) => MonitorErrorKind::Config,
        }
    }

    /// Failures that clear up on their own; the signature stays unseen and
    /// the next cycle picks it up again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            MonitorErrorKind::Transport
                | MonitorErrorKind::Timeout
                | MonitorErrorKind::NotYetConfirmed
                | MonitorErrorKind::MetadataUnavailable
        )
    }
}

impl From<ClientError> for MonitorError {
    fn from(error: ClientError) -> Self {
        MonitorError::Transport(error.to_string())
    }
}

impl From<reqwest::Error> for MonitorError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            MonitorError::Transport(format!("request timed out: {}", error))
        } else {
            MonitorError::Transport(error.to_string())
        }
    }
}

pub type MonitorResult<T> = Result<T, MonitorError>;
