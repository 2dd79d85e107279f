//! Correlation mode enumeration.
//!
//! Defines how a [`BackendClient`](crate::BackendClient) obtains answers.

/// Client-wide answer correlation mode, fixed at construction.
///
/// - [`Sync`](CorrelationMode::Sync): the HTTP response body is the answer
/// - [`Async`](CorrelationMode::Async): the HTTP response is only an
///   acknowledgement; the answer is published on the request's correlation
///   key and awaited with a timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrelationMode {
    /// Answer carried by the HTTP response body.
    Sync,

    /// Answer delivered via pub/sub.
    ///
    /// Allows: `handle_async_*_ans()` answer publishing
    Async,
}
