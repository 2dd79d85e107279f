/// Protocol types for the roaming backend interface
///
/// This module defines the wire format for request/answer messages,
/// the five operations, and correlation key derivation.
mod correlation;
mod message;
mod operation;

pub use correlation::{random_transaction_id, CorrelationKey, KeySpace, TransactionId};
pub use message::{BasePayload, MessageType, ResultCode, ResultPayload, PROTOCOL_VERSION_1_0};
pub use operation::{
    // ---
    Answer,
    AnswerPayload,
    EmptyBody,
    HomeNs,
    HomeNsAnsBody,
    HomeNsAnsPayload,
    HomeNsReqBody,
    HomeNsReqPayload,
    Message,
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
    XmitData,
    XmitDataAnsBody,
    XmitDataAnsPayload,
    XmitDataReqBody,
    XmitDataReqPayload,
};
