//! HTTP(S) transport implementation using `reqwest`.
//!
//! Posts JSON documents to one statically configured endpoint. When a CA
//! bundle or a client certificate/key pair is configured, both are loaded
//! once at construction and the connection pool is built with mutual TLS.
//!
//! The underlying `reqwest::Client` pools connections and is safe to share
//! across any number of concurrent requests.

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;

use crate::{
    // ---
    log_debug,
    log_error,
    log_info,
    HttpResponse,
    HttpTransport,
    HttpTransportPtr,
    Result,
    RpcError,
};

/// Endpoint and TLS material for the HTTP transport.
#[derive(Debug, Clone, Default)]
pub struct HttpConfig {
    /// Peer endpoint URL.
    pub server: String,
    /// PEM CA bundle used to verify the peer.
    pub ca_cert: Option<std::path::PathBuf>,
    /// PEM client certificate presented to the peer.
    pub tls_cert: Option<std::path::PathBuf>,
    /// PEM private key for `tls_cert`.
    pub tls_key: Option<std::path::PathBuf>,
}

struct ReqwestTransport {
    // ---
    server: String,
    client: reqwest::Client,
}

#[async_trait::async_trait]
impl HttpTransport for ReqwestTransport {
    // ---
    async fn post(&self, body: Bytes) -> Result<HttpResponse> {
        // ---
        let resp = self
            .client
            .post(&self.server)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|err| {
                let msg = format!("http post error: {err}");
                log_error!("{msg}");
                RpcError::Transport(msg)
            })?;

        let status = resp.status().as_u16();

        let body = resp.bytes().await.map_err(|err| {
            let msg = format!("read body error: {err}");
            log_error!("{msg}");
            RpcError::Transport(msg)
        })?;

        log_debug!("http: {} answered {status} ({} bytes)", self.server, body.len());

        Ok(HttpResponse { status, body })
    }
}

fn read_pem(label: &str, path: &Path) -> Result<Vec<u8>> {
    // ---
    std::fs::read(path)
        .map_err(|err| RpcError::Tls(format!("read {label} {} error: {err}", path.display())))
}

/// Create an HTTP transport for the configured endpoint.
///
/// # Errors
///
/// Returns:
/// - `RpcError::MissingConfig` if `server` is empty
/// - `RpcError::ConfigConflict` if only one of `tls_cert` / `tls_key` is set
/// - `RpcError::Tls` if a PEM file cannot be read or parsed
/// - `RpcError::Transport` if the client cannot be built
pub fn create_http_transport(config: &HttpConfig) -> Result<HttpTransportPtr> {
    // ---
    if config.server.is_empty() {
        return Err(RpcError::MissingConfig("server".into()));
    }

    let mut builder = reqwest::Client::builder().use_rustls_tls();

    if let Some(path) = &config.ca_cert {
        let pem = read_pem("ca cert", path)?;
        let certs = reqwest::Certificate::from_pem_bundle(&pem)
            .map_err(|err| RpcError::Tls(format!("append ca cert to pool error: {err}")))?;
        if certs.is_empty() {
            return Err(RpcError::Tls(format!(
                "no certificates found in {}",
                path.display()
            )));
        }
        for cert in certs {
            builder = builder.add_root_certificate(cert);
        }
    }

    match (&config.tls_cert, &config.tls_key) {
        (Some(cert_path), Some(key_path)) => {
            // rustls identities are parsed from one PEM buffer holding both parts.
            let mut pem = read_pem("tls cert", cert_path)?;
            pem.push(b'\n');
            pem.extend(read_pem("tls key", key_path)?);

            let identity = reqwest::Identity::from_pem(&pem)
                .map_err(|err| RpcError::Tls(format!("load x509 keypair error: {err}")))?;
            builder = builder.identity(identity);
        }
        (None, None) => {}
        _ => {
            return Err(RpcError::ConfigConflict(
                "tls_cert and tls_key must be set together".into(),
            ));
        }
    }

    let client = builder
        .build()
        .map_err(|err| RpcError::Transport(format!("http client build error: {err}")))?;

    log_info!(
        "http: transport ready for {} (mtls: {})",
        config.server,
        config.tls_cert.is_some()
    );

    Ok(Arc::new(ReqwestTransport {
        server: config.server.clone(),
        client,
    }))
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_missing_server() {
        // ---
        let err = create_http_transport(&HttpConfig::default()).err().unwrap();
        assert!(matches!(err, RpcError::MissingConfig(_)));
    }

    #[test]
    fn test_half_keypair_rejected() {
        // ---
        let config = HttpConfig {
            server: "https://peer.example:8443".into(),
            tls_cert: Some("client.pem".into()),
            ..HttpConfig::default()
        };
        let err = create_http_transport(&config).err().unwrap();
        assert!(matches!(err, RpcError::ConfigConflict(_)));
    }

    #[test]
    fn test_unreadable_ca_cert() {
        // ---
        let config = HttpConfig {
            server: "https://peer.example:8443".into(),
            ca_cert: Some("/nonexistent/ca.pem".into()),
            ..HttpConfig::default()
        };
        let err = create_http_transport(&config).err().unwrap();
        assert!(matches!(err, RpcError::Tls(_)));
    }
}
