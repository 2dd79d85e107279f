//! Redis Pub/Sub answer channel.
//!
//! Compiled only with the `transport_redis` feature; otherwise a stub
//! reports the missing feature so URI dispatch stays uniform.

#[cfg(feature = "transport_redis")]
#[allow(clippy::module_inception)]
mod redis;

#[cfg(feature = "transport_redis")]
pub use self::redis::create_pubsub as create_redis_pubsub;

#[cfg(not(feature = "transport_redis"))]
pub async fn create_redis_pubsub(_uri: &str) -> crate::Result<crate::PubSubPtr> {
    Err(crate::RpcError::Transport(
        "transport_redis feature is not enabled".into(),
    ))
}
