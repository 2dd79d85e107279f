//! Two network servers roaming over an in-process hub.
//!
//! The serving side acknowledges each POST immediately and publishes the
//! real answer a little later, the way an async roaming peer does.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use roam_rpc::{
    // ---
    create_memory_pubsub_with_hub,
    BackendClient,
    BasePayload,
    ClientBuilder,
    ClientConfig,
    HomeNsAnsBody,
    HomeNsAnsPayload,
    HomeNsReqBody,
    HomeNsReqPayload,
    HttpResponse,
    HttpTransport,
    MemoryHub,
    Result,
    ResultPayload,
};

/// Stand-in for the serving network server's HTTP endpoint.
struct ServingPeer {
    answers: BackendClient,
}

#[async_trait::async_trait]
impl HttpTransport for ServingPeer {
    async fn post(&self, body: Bytes) -> Result<HttpResponse> {
        // ---
        let req: HomeNsReqPayload = serde_json::from_slice(&body)?;
        println!(
            "serving: {} from {} (tx {})",
            req.base.message_type.map(|t| t.as_str()).unwrap_or("?"),
            req.base.sender_id,
            req.base.transaction_id
        );

        let answers = self.answers.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;

            let ans = HomeNsAnsPayload::new(
                BasePayload::with_transaction_id(req.base.transaction_id),
                ResultPayload::success(),
                HomeNsAnsBody {
                    h_net_id: Some("C00053".into()),
                },
            );
            if let Err(err) = answers.handle_async_home_ns_ans(&ans).await {
                eprintln!("serving: publish failed: {err}");
            }
        });

        Ok(HttpResponse::ok(Bytes::new()))
    }
}

/// Answer-only client; its own requests are never sent.
struct Unused;

#[async_trait::async_trait]
impl HttpTransport for Unused {
    async fn post(&self, _body: Bytes) -> Result<HttpResponse> {
        Ok(HttpResponse::new(503, Bytes::new()))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let hub = MemoryHub::new();

    let answers = ClientBuilder::new(ClientConfig::new("000002", "000001", ""))
        .http_transport(Arc::new(Unused))
        .pubsub(create_memory_pubsub_with_hub(hub.clone()))
        .async_timeout(Duration::from_secs(1))
        .build()?;

    let client = ClientBuilder::new(ClientConfig::new("000001", "000002", ""))
        .http_transport(Arc::new(ServingPeer { answers }))
        .pubsub(create_memory_pubsub_with_hub(hub.clone()))
        .async_timeout(Duration::from_secs(1))
        .build()?;

    let tx = client.random_transaction_id();
    println!("visited: waiting on {}", client.key_for::<roam_rpc::HomeNs>(tx));

    let ans = client
        .home_ns_req(HomeNsReqPayload::new(
            BasePayload::with_transaction_id(tx),
            HomeNsReqBody {
                dev_eui: Some("0102030405060708".into()),
            },
        ))
        .await?;

    println!(
        "visited: home network of device is {}",
        ans.body.h_net_id.as_deref().unwrap_or("unknown")
    );
    Ok(())
}
