//! Wire-level message metadata shared by every operation.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::TransactionId;

/// Protocol version stamped on outgoing requests unless overridden.
pub const PROTOCOL_VERSION_1_0: &str = "1.0";

/// Closed set of message type tags.
///
/// Each operation owns a request/answer pair. Correlation keys are always
/// built from the request tag, so the answer to a `PRStartReq` is published
/// under the `PRStartReq` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    #[serde(rename = "PRStartReq")]
    PrStartReq,
    #[serde(rename = "PRStartAns")]
    PrStartAns,
    #[serde(rename = "PRStopReq")]
    PrStopReq,
    #[serde(rename = "PRStopAns")]
    PrStopAns,
    #[serde(rename = "XmitDataReq")]
    XmitDataReq,
    #[serde(rename = "XmitDataAns")]
    XmitDataAns,
    #[serde(rename = "ProfileReq")]
    ProfileReq,
    #[serde(rename = "ProfileAns")]
    ProfileAns,
    #[serde(rename = "HomeNSReq")]
    HomeNsReq,
    #[serde(rename = "HomeNSAns")]
    HomeNsAns,
}

impl MessageType {
    /// Wire name of the tag.
    pub fn as_str(&self) -> &'static str {
        // ---
        match self {
            MessageType::PrStartReq => "PRStartReq",
            MessageType::PrStartAns => "PRStartAns",
            MessageType::PrStopReq => "PRStopReq",
            MessageType::PrStopAns => "PRStopAns",
            MessageType::XmitDataReq => "XmitDataReq",
            MessageType::XmitDataAns => "XmitDataAns",
            MessageType::ProfileReq => "ProfileReq",
            MessageType::ProfileAns => "ProfileAns",
            MessageType::HomeNsReq => "HomeNSReq",
            MessageType::HomeNsAns => "HomeNSAns",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata common to every request and answer.
///
/// All fields default when absent so that minimal answers such as
/// `{"TransactionID":42,"Result":{"ResultCode":"Success"}}` decode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BasePayload {
    #[serde(rename = "ProtocolVersion", skip_serializing_if = "String::is_empty")]
    pub protocol_version: String,

    #[serde(rename = "SenderID", skip_serializing_if = "String::is_empty")]
    pub sender_id: String,

    #[serde(rename = "ReceiverID", skip_serializing_if = "String::is_empty")]
    pub receiver_id: String,

    #[serde(rename = "TransactionID")]
    pub transaction_id: TransactionId,

    #[serde(rename = "MessageType", skip_serializing_if = "Option::is_none")]
    pub message_type: Option<MessageType>,

    #[serde(rename = "SenderNSID", skip_serializing_if = "Option::is_none")]
    pub sender_ns_id: Option<String>,

    #[serde(rename = "ReceiverNSID", skip_serializing_if = "Option::is_none")]
    pub receiver_ns_id: Option<String>,
}

impl BasePayload {
    /// Base payload carrying only a transaction id; the client stamps the rest.
    pub fn with_transaction_id(transaction_id: TransactionId) -> Self {
        Self {
            transaction_id,
            ..Self::default()
        }
    }
}

/// Result code carried by every answer.
///
/// Codes outside the known set are preserved verbatim in [`ResultCode::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResultCode {
    Success,
    MicFailed,
    JoinReqFailed,
    NoRoamingAgreement,
    DevRoamingDisallowed,
    RoamingActDisallowed,
    ActivationDisallowed,
    UnknownDevEui,
    UnknownDevAddr,
    UnknownSender,
    UnknownReceiver,
    Deferred,
    XmitFailed,
    InvalidFPort,
    InvalidProtocolVersion,
    StaleDeviceProfile,
    MalformedRequest,
    FrameSizeError,
    Other(String),
}

impl ResultCode {
    pub fn as_str(&self) -> &str {
        // ---
        match self {
            ResultCode::Success => "Success",
            ResultCode::MicFailed => "MICFailed",
            ResultCode::JoinReqFailed => "JoinReqFailed",
            ResultCode::NoRoamingAgreement => "NoRoamingAgreement",
            ResultCode::DevRoamingDisallowed => "DevRoamingDisallowed",
            ResultCode::RoamingActDisallowed => "RoamingActDisallowed",
            ResultCode::ActivationDisallowed => "ActivationDisallowed",
            ResultCode::UnknownDevEui => "UnknownDevEUI",
            ResultCode::UnknownDevAddr => "UnknownDevAddr",
            ResultCode::UnknownSender => "UnknownSender",
            ResultCode::UnknownReceiver => "UnknownReceiver",
            ResultCode::Deferred => "Deferred",
            ResultCode::XmitFailed => "XmitFailed",
            ResultCode::InvalidFPort => "InvalidFPort",
            ResultCode::InvalidProtocolVersion => "InvalidProtocolVersion",
            ResultCode::StaleDeviceProfile => "StaleDeviceProfile",
            ResultCode::MalformedRequest => "MalformedRequest",
            ResultCode::FrameSizeError => "FrameSizeError",
            ResultCode::Other(code) => code,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ResultCode::Success)
    }
}

impl From<&str> for ResultCode {
    fn from(value: &str) -> Self {
        // ---
        match value {
            "Success" => ResultCode::Success,
            "MICFailed" => ResultCode::MicFailed,
            "JoinReqFailed" => ResultCode::JoinReqFailed,
            "NoRoamingAgreement" => ResultCode::NoRoamingAgreement,
            "DevRoamingDisallowed" => ResultCode::DevRoamingDisallowed,
            "RoamingActDisallowed" => ResultCode::RoamingActDisallowed,
            "ActivationDisallowed" => ResultCode::ActivationDisallowed,
            "UnknownDevEUI" => ResultCode::UnknownDevEui,
            "UnknownDevAddr" => ResultCode::UnknownDevAddr,
            "UnknownSender" => ResultCode::UnknownSender,
            "UnknownReceiver" => ResultCode::UnknownReceiver,
            "Deferred" => ResultCode::Deferred,
            "XmitFailed" => ResultCode::XmitFailed,
            "InvalidFPort" => ResultCode::InvalidFPort,
            "InvalidProtocolVersion" => ResultCode::InvalidProtocolVersion,
            "StaleDeviceProfile" => ResultCode::StaleDeviceProfile,
            "MalformedRequest" => ResultCode::MalformedRequest,
            "FrameSizeError" => ResultCode::FrameSizeError,
            other => ResultCode::Other(other.to_string()),
        }
    }
}

impl From<String> for ResultCode {
    fn from(value: String) -> Self {
        ResultCode::from(value.as_str())
    }
}

impl From<ResultCode> for String {
    fn from(code: ResultCode) -> Self {
        match code {
            ResultCode::Other(code) => code,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome block of an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultPayload {
    #[serde(rename = "ResultCode")]
    pub result_code: ResultCode,

    #[serde(rename = "Description", default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl ResultPayload {
    pub fn success() -> Self {
        Self {
            result_code: ResultCode::Success,
            description: String::new(),
        }
    }

    pub fn failure(code: impl Into<ResultCode>, description: impl Into<String>) -> Self {
        Self {
            result_code: code.into(),
            description: description.into(),
        }
    }
}

impl Default for ResultPayload {
    fn default() -> Self {
        Self::success()
    }
}
