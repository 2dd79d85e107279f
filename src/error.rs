use thiserror::Error;

use crate::ResultCode;

/// Errors that can occur during backend RPC operations
#[derive(Error, Debug)]
pub enum RpcError {
    /// Payload could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Answer decoded but violates the protocol (e.g. transaction id mismatch)
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// HTTP send or pub/sub subscription could not complete
    #[error("transport error: {0}")]
    Transport(String),

    /// No matching answer was published within the async timeout
    #[error("async timeout")]
    AsyncTimeout,

    /// Caller cancelled the wait before an answer arrived
    #[error("request cancelled while awaiting answer")]
    Cancelled,

    /// Peer answered with a non-success result code
    #[error("response error, code: {code}, description: {description}")]
    Application {
        code: ResultCode,
        description: String,
    },

    /// Async answer could not be delivered to the broker
    #[error("publish answer error: {0}")]
    Publish(String),

    /// Answer push was not acknowledged with HTTP 200
    #[error("expected: 200, got: {status} ({body})")]
    UnexpectedStatus { status: u16, body: String },

    /// CA bundle or client certificate could not be loaded
    #[error("tls configuration error: {0}")]
    Tls(String),

    /// Required configuration value not provided
    #[error("missing required configuration: {0}")]
    MissingConfig(String),

    /// Configuration values contradict each other
    #[error("configuration conflict: {0}")]
    ConfigConflict(String),

    /// Operation not valid for the client's correlation mode
    #[error("invalid mode: {0}")]
    InvalidMode(String),
}

impl RpcError {
    /// True when the peer may still deliver an answer for this attempt.
    ///
    /// A timed out or cancelled async request was sent (or is still being
    /// sent); every other failure is final for that attempt.
    pub fn may_be_pending(&self) -> bool {
        matches!(self, RpcError::AsyncTimeout | RpcError::Cancelled)
    }
}

/// Result type alias for backend RPC operations
pub type Result<T> = std::result::Result<T, RpcError>;
