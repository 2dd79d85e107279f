//! Domain layer public interface.
//!
//! This module defines the transport abstractions the client depends on,
//! independent of HTTP stacks, brokers, or other infrastructure concerns.
//!
//! All domain consumers must import symbols via this module, not by
//! referencing individual files directly.

mod http;
mod transport;

// --- Transport domain re-exports ---

pub use http::{
    //
    HttpResponse,
    HttpTransport,
    HttpTransportPtr,
};

pub use transport::{
    //
    PubSub,
    PubSubPtr,
    SubscriptionHandle,
};
