//! Public client configuration.
//!
//! This type holds the fixed endpoint identity and the correlation settings
//! of a [`BackendClient`](crate::BackendClient). Transport objects are not
//! part of it; they are supplied through [`ClientBuilder`](crate::ClientBuilder).

use std::path::PathBuf;
use std::time::Duration;

use crate::{KeySpace, PROTOCOL_VERSION_1_0};

/// What an async request does when its HTTP send fails.
///
/// The peer may still publish an answer even though the acknowledgement
/// failed (for instance a proxy timed out after forwarding the request).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SendFailurePolicy {
    /// Return the transport failure as soon as the send fails.
    #[default]
    FailFast,

    /// Log the send failure and keep waiting for a published answer until
    /// the async timeout.
    AwaitAnswer,
}

/// Endpoint identity and correlation settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    // ---
    /// Identifier of this network server, stamped as `SenderID`.
    pub sender_id: String,

    /// Identifier of the peer, stamped as `ReceiverID`.
    pub receiver_id: String,

    /// Protocol version stamped as `ProtocolVersion`.
    ///
    /// Default: `"1.0"`
    pub protocol_version: String,

    /// Peer endpoint URL.
    pub server: String,

    /// PEM CA bundle used to verify the peer.
    pub ca_cert: Option<PathBuf>,

    /// PEM client certificate for mutual TLS.
    pub tls_cert: Option<PathBuf>,

    /// PEM private key for `tls_cert`.
    pub tls_key: Option<PathBuf>,

    /// How long an async request waits for its published answer.
    ///
    /// Required when a pub/sub transport is configured.
    pub async_timeout: Option<Duration>,

    /// Prefix of every correlation key.
    ///
    /// Default: `lora:backend`
    pub key_space: KeySpace,

    /// Behavior of async requests whose HTTP send fails.
    ///
    /// Default: [`SendFailurePolicy::FailFast`]
    pub send_failure_policy: SendFailurePolicy,
}

impl ClientConfig {
    /// Create a config for the given identities and endpoint.
    pub fn new(
        sender_id: impl Into<String>,
        receiver_id: impl Into<String>,
        server: impl Into<String>,
    ) -> Self {
        Self {
            sender_id: sender_id.into(),
            receiver_id: receiver_id.into(),
            protocol_version: PROTOCOL_VERSION_1_0.into(),
            server: server.into(),
            ca_cert: None,
            tls_cert: None,
            tls_key: None,
            async_timeout: None,
            key_space: KeySpace::default(),
            send_failure_policy: SendFailurePolicy::default(),
        }
    }

    /// Set the CA bundle used to verify the peer.
    pub fn with_ca_cert(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_cert = Some(path.into());
        self
    }

    /// Set the client certificate and key used for mutual TLS.
    pub fn with_client_cert(mut self, cert: impl Into<PathBuf>, key: impl Into<PathBuf>) -> Self {
        self.tls_cert = Some(cert.into());
        self.tls_key = Some(key.into());
        self
    }

    /// Set the async answer timeout.
    pub fn with_async_timeout(mut self, timeout: Duration) -> Self {
        self.async_timeout = Some(timeout);
        self
    }

    /// Set the correlation key space.
    pub fn with_key_space(mut self, key_space: KeySpace) -> Self {
        self.key_space = key_space;
        self
    }

    /// Set the send failure policy for async requests.
    pub fn with_send_failure_policy(mut self, policy: SendFailurePolicy) -> Self {
        self.send_failure_policy = policy;
        self
    }

    /// Override the protocol version.
    pub fn with_protocol_version(mut self, version: impl Into<String>) -> Self {
        self.protocol_version = version.into();
        self
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_defaults() {
        // ---
        let config = ClientConfig::new("000001", "000002", "https://peer:8443");
        assert_eq!(config.protocol_version, "1.0");
        assert_eq!(config.send_failure_policy, SendFailurePolicy::FailFast);
        assert_eq!(config.key_space, KeySpace::default());
        assert!(config.async_timeout.is_none());
    }

    #[test]
    fn test_setters() {
        // ---
        let config = ClientConfig::new("a", "b", "http://peer")
            .with_client_cert("client.pem", "client-key.pem")
            .with_async_timeout(Duration::from_secs(2))
            .with_send_failure_policy(SendFailurePolicy::AwaitAnswer);

        assert_eq!(config.tls_cert, Some(PathBuf::from("client.pem")));
        assert_eq!(config.tls_key, Some(PathBuf::from("client-key.pem")));
        assert_eq!(config.async_timeout, Some(Duration::from_secs(2)));
        assert_eq!(config.send_failure_policy, SendFailurePolicy::AwaitAnswer);
    }
}
