//! Error types for the feed

use thiserror::Error;

/// Feed-wide error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingEnv(Vec<String>),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Connect error: {0}")]
    Connect(String),

    #[error("Link error: {0}")]
    TransientLink(String),

    #[error("Reconnect attempts exhausted after {attempts} attempts")]
    ReconnectExhausted { attempts: u32 },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Subscription rejected: {0}")]
    SubscriptionRejected(String),

    #[error("Connection closed by remote (code {code}): {reason}")]
    RemoteClosed { code: u16, reason: String },
}

impl FeedError {
    pub fn config(msg: impl Into<String>) -> Self {
        FeedError::Config(msg.into())
    }

    pub fn signing(msg: impl Into<String>) -> Self {
        FeedError::Signing(msg.into())
    }

    pub fn connect(msg: impl Into<String>) -> Self {
        FeedError::Connect(msg.into())
    }

    pub fn link(msg: impl Into<String>) -> Self {
        FeedError::TransientLink(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        FeedError::Parse(msg.into())
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        FeedError::SubscriptionRejected(msg.into())
    }

    /// Whether this error ends the process.
    ///
    /// Parse and link errors are recovered locally (message dropped, or
    /// reconnect ladder); everything else terminates.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, FeedError::Parse(_) | FeedError::TransientLink(_))
    }
}

/// Result type alias for feed operations
pub type FeedResult<T> = Result<T, FeedError>;
