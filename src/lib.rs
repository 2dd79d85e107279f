//! Roaming backend client with sync and async answer correlation
//!
//! This library implements the client side of a LoRaWAN roaming backend
//! interface between network servers. Requests are POSTed as JSON to a peer
//! endpoint; the answer either comes back in the HTTP response body (sync
//! mode) or is published later on a pub/sub channel keyed by the request's
//! message type and transaction id (async mode).
//!
//! ```no_run
//! use roam_rpc::{BasePayload, BackendClient, ClientConfig, PrStartReqBody, PrStartReqPayload};
//!
//! # async fn example() -> roam_rpc::Result<()> {
//! let client = BackendClient::new(ClientConfig::new("000001", "000002", "https://peer:8443"))?;
//!
//! let req = PrStartReqPayload::new(
//!     BasePayload::with_transaction_id(client.random_transaction_id()),
//!     PrStartReqBody::default(),
//! );
//! let ans = client.pr_start_req(req).await?;
//! println!("lifetime: {:?}", ans.body.lifetime);
//! # Ok(())
//! # }
//! ```

mod macros;

// Import all sub modules once...
mod client;
mod client_builder;
mod client_config;
mod correlation_mode;
mod domain;
mod error;
mod protocol;
mod transport;

pub(crate) use macros::{log_debug, log_error, log_info, log_warn};

// Re-export main types
pub use client::{AnswerPublisher, BackendClient, ResponseCorrelator};
pub use client_builder::ClientBuilder;
pub use client_config::{ClientConfig, SendFailurePolicy};
pub use correlation_mode::CorrelationMode;

pub use error::{Result, RpcError};

pub use transport::{
    // ---
    create_http_transport,
    create_memory_pubsub,
    create_memory_pubsub_with_hub,
    create_pubsub,
    create_redis_pubsub,
    HttpConfig,
    MemoryHub,
};

// --- public re-exports
pub use domain::{
    //
    HttpResponse,
    HttpTransport,
    HttpTransportPtr,
    PubSub,
    PubSubPtr,
    SubscriptionHandle,
};

pub use protocol::{
    // ---
    random_transaction_id,
    Answer,
    AnswerPayload,
    BasePayload,
    CorrelationKey,
    EmptyBody,
    HomeNs,
    HomeNsAnsBody,
    HomeNsAnsPayload,
    HomeNsReqBody,
    HomeNsReqPayload,
    KeySpace,
    Message,
    MessageType,
    Operation,
    PrStart,
    PrStartAnsBody,
    PrStartAnsPayload,
    PrStartReqBody,
    PrStartReqPayload,
    PrStop,
    PrStopAnsPayload,
    PrStopReqBody,
    PrStopReqPayload,
    Profile,
    ProfileAnsBody,
    ProfileAnsPayload,
    ProfileReqBody,
    ProfileReqPayload,
    RequestPayload,
    ResultCode,
    ResultPayload,
    TransactionId,
    XmitData,
    XmitDataAnsBody,
    XmitDataAnsPayload,
    XmitDataReqBody,
    XmitDataReqPayload,
    PROTOCOL_VERSION_1_0,
};
