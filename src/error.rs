use std::time::Duration;

use thiserror::Error;

/// Failure of a single backend call. `Display` strings are shown to the user as-is.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeedError {
    #[error("cannot connect to server, are you offline? ({0})")]
    Network(String),

    #[error("server took too long to respond ({}s)", .0.as_secs())]
    Timeout(Duration),

    #[error("server error: {0}")]
    Server(String),

    #[error("match {0} not found")]
    NotFound(String),

    #[error("malformed response: {0}")]
    Protocol(String),
}

pub type FeedResult<T> = Result<T, FeedError>;

impl FeedError {
    pub fn from_transport(err: &reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            FeedError::Timeout(timeout)
        } else if let Some(status) = err.status() {
            FeedError::Server(format!("http {}", status.as_u16()))
        } else {
            FeedError::Network(err.to_string())
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, FeedError::Timeout(_))
    }

    /// Short tag for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            FeedError::Network(_) => "network",
            FeedError::Timeout(_) => "timeout",
            FeedError::Server(_) => "server",
            FeedError::NotFound(_) => "not-found",
            FeedError::Protocol(_) => "protocol",
        }
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        FeedError::Protocol(err.to_string())
    }
}
