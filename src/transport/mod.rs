//! Transport implementations.
//!
//! This module provides concrete implementations of the domain-level
//! `HttpTransport` and `PubSub` traits. Broker-backed pub/sub lives behind
//! feature flags and is exposed only through constructor functions.
//!
//! Domain code must not depend on transport-specific types.

mod http;
mod memory;
mod redis;

pub use http::{create_http_transport, HttpConfig};
pub use memory::{create_memory_pubsub, create_memory_pubsub_with_hub, MemoryHub};
pub use self::redis::create_redis_pubsub;

use crate::{log_debug, PubSubPtr, Result, RpcError};

/// Create a pub/sub answer channel from a URI.
///
/// - `memory://` for the process-global in-memory hub
/// - `redis://…` or `rediss://…` for Redis Pub/Sub (`transport_redis` feature)
///
/// # Errors
///
/// Returns `RpcError::Transport` for an unrecognized scheme, a disabled
/// transport, or a failed broker connection.
pub async fn create_pubsub(uri: &str) -> Result<PubSubPtr> {
    // ---
    let scheme = uri.split_once("://").map(|(scheme, _)| scheme);
    log_debug!("create pub/sub for {uri} (scheme {scheme:?})");

    match scheme {
        Some("memory") => Ok(create_memory_pubsub()),
        Some("redis") | Some("rediss") => create_redis_pubsub(uri).await,
        _ => Err(RpcError::Transport(format!(
            "unrecognized pub/sub URI: {uri}, valid schemes: memory, redis, rediss"
        ))),
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[tokio::test]
    async fn test_memory_scheme() {
        // ---
        assert!(create_pubsub("memory://").await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_scheme() {
        // ---
        let err = create_pubsub("mqtt://localhost:1883").await.err().unwrap();
        assert!(matches!(err, RpcError::Transport(_)));
    }

    #[cfg(not(feature = "transport_redis"))]
    #[tokio::test]
    async fn test_redis_disabled() {
        // ---
        let err = create_pubsub("redis://127.0.0.1:6379").await.err().unwrap();
        assert!(err.to_string().contains("transport_redis"));
    }
}
