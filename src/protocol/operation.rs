//! Request/answer payloads of the five roaming operations.
//!
//! Every payload is a [`BasePayload`] plus an operation-specific body, and
//! every answer additionally carries a [`ResultPayload`]. Bodies are kept
//! deliberately loose: metadata blocks and key envelopes travel as raw JSON
//! values since their schema is owned by the peer, not by this client.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{BasePayload, MessageType, ResultPayload};

/// A request as sent on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestPayload<B> {
    #[serde(flatten)]
    pub base: BasePayload,

    #[serde(flatten)]
    pub body: B,
}

/// An answer as received (or published) on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnswerPayload<B> {
    #[serde(flatten)]
    pub base: BasePayload,

    // An answer without a result block is not a success.
    #[serde(rename = "Result", default = "missing_result")]
    pub result: ResultPayload,

    #[serde(flatten)]
    pub body: B,
}

fn missing_result() -> ResultPayload {
    ResultPayload::failure("", "")
}

impl<B> RequestPayload<B> {
    pub fn new(base: BasePayload, body: B) -> Self {
        Self { base, body }
    }
}

impl<B> AnswerPayload<B> {
    pub fn new(base: BasePayload, result: ResultPayload, body: B) -> Self {
        Self { base, result, body }
    }
}

/// Access to the metadata shared by requests and answers.
pub trait Message: Serialize + DeserializeOwned + Send + Sync + 'static {
    fn base(&self) -> &BasePayload;
    fn base_mut(&mut self) -> &mut BasePayload;
}

/// Answer-side accessors.
pub trait Answer: Message {
    fn result(&self) -> &ResultPayload;
}

impl<B> Message for RequestPayload<B>
where
    B: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn base(&self) -> &BasePayload {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BasePayload {
        &mut self.base
    }
}

impl<B> Message for AnswerPayload<B>
where
    B: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn base(&self) -> &BasePayload {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BasePayload {
        &mut self.base
    }
}

impl<B> Answer for AnswerPayload<B>
where
    B: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn result(&self) -> &ResultPayload {
        &self.result
    }
}

/// One request/answer pair of the protocol.
///
/// Implemented by zero-sized markers; the client's dispatcher and answer
/// publisher are generic over this trait.
pub trait Operation: Send + Sync + 'static {
    /// Tag stamped on requests and used to build correlation keys.
    const REQUEST_TYPE: MessageType;

    /// Tag carried by answers.
    const ANSWER_TYPE: MessageType;

    type Request: Message;
    type Answer: Answer;
}

macro_rules! operation {
    ($(#[$doc:meta])* $name:ident, $req_type:ident, $ans_type:ident, $req:ty, $ans:ty) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl Operation for $name {
            const REQUEST_TYPE: MessageType = MessageType::$req_type;
            const ANSWER_TYPE: MessageType = MessageType::$ans_type;
            type Request = $req;
            type Answer = $ans;
        }
    };
}

//
// Bodies
//

/// Passive-roaming start request body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrStartReqBody {
    #[serde(rename = "PHYPayload", skip_serializing_if = "Option::is_none")]
    pub phy_payload: Option<String>,

    #[serde(rename = "ULMetaData", skip_serializing_if = "Option::is_none")]
    pub ul_meta_data: Option<Value>,
}

/// Passive-roaming start answer body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrStartAnsBody {
    #[serde(rename = "PHYPayload", skip_serializing_if = "Option::is_none")]
    pub phy_payload: Option<String>,

    #[serde(rename = "DevEUI", skip_serializing_if = "Option::is_none")]
    pub dev_eui: Option<String>,

    #[serde(rename = "Lifetime", skip_serializing_if = "Option::is_none")]
    pub lifetime: Option<u32>,

    #[serde(rename = "FNwkSIntKey", skip_serializing_if = "Option::is_none")]
    pub f_nwk_s_int_key: Option<Value>,

    #[serde(rename = "NwkSKey", skip_serializing_if = "Option::is_none")]
    pub nwk_s_key: Option<Value>,

    #[serde(rename = "FCntUp", skip_serializing_if = "Option::is_none")]
    pub f_cnt_up: Option<u32>,

    #[serde(rename = "ServiceProfile", skip_serializing_if = "Option::is_none")]
    pub service_profile: Option<Value>,

    #[serde(rename = "DLMetaData", skip_serializing_if = "Option::is_none")]
    pub dl_meta_data: Option<Value>,
}

/// Passive-roaming stop request body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrStopReqBody {
    #[serde(rename = "DevEUI", skip_serializing_if = "Option::is_none")]
    pub dev_eui: Option<String>,

    #[serde(rename = "Lifetime", skip_serializing_if = "Option::is_none")]
    pub lifetime: Option<u32>,
}

/// Answer body for operations whose answer is only a result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyBody {}

/// Transmit data request body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XmitDataReqBody {
    #[serde(rename = "PHYPayload", skip_serializing_if = "Option::is_none")]
    pub phy_payload: Option<String>,

    #[serde(rename = "FRMPayload", skip_serializing_if = "Option::is_none")]
    pub frm_payload: Option<String>,

    #[serde(rename = "ULMetaData", skip_serializing_if = "Option::is_none")]
    pub ul_meta_data: Option<Value>,

    #[serde(rename = "DLMetaData", skip_serializing_if = "Option::is_none")]
    pub dl_meta_data: Option<Value>,
}

/// Transmit data answer body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XmitDataAnsBody {
    #[serde(rename = "DLFreq1", skip_serializing_if = "Option::is_none")]
    pub dl_freq1: Option<f64>,

    #[serde(rename = "DLFreq2", skip_serializing_if = "Option::is_none")]
    pub dl_freq2: Option<f64>,
}

/// Profile request body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileReqBody {
    #[serde(rename = "DevEUI", skip_serializing_if = "Option::is_none")]
    pub dev_eui: Option<String>,
}

/// Profile answer body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileAnsBody {
    #[serde(rename = "DeviceProfile", skip_serializing_if = "Option::is_none")]
    pub device_profile: Option<Value>,

    #[serde(rename = "DeviceProfileTimestamp", skip_serializing_if = "Option::is_none")]
    pub device_profile_timestamp: Option<String>,

    #[serde(rename = "RoamingActivationType", skip_serializing_if = "Option::is_none")]
    pub roaming_activation_type: Option<String>,
}

/// Home network server request body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HomeNsReqBody {
    #[serde(rename = "DevEUI", skip_serializing_if = "Option::is_none")]
    pub dev_eui: Option<String>,
}

/// Home network server answer body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HomeNsAnsBody {
    #[serde(rename = "HNetID", skip_serializing_if = "Option::is_none")]
    pub h_net_id: Option<String>,
}

pub type PrStartReqPayload = RequestPayload<PrStartReqBody>;
pub type PrStartAnsPayload = AnswerPayload<PrStartAnsBody>;
pub type PrStopReqPayload = RequestPayload<PrStopReqBody>;
pub type PrStopAnsPayload = AnswerPayload<EmptyBody>;
pub type XmitDataReqPayload = RequestPayload<XmitDataReqBody>;
pub type XmitDataAnsPayload = AnswerPayload<XmitDataAnsBody>;
pub type ProfileReqPayload = RequestPayload<ProfileReqBody>;
pub type ProfileAnsPayload = AnswerPayload<ProfileAnsBody>;
pub type HomeNsReqPayload = RequestPayload<HomeNsReqBody>;
pub type HomeNsAnsPayload = AnswerPayload<HomeNsAnsBody>;

operation!(
    /// Start a passive-roaming session.
    PrStart, PrStartReq, PrStartAns, PrStartReqPayload, PrStartAnsPayload
);
operation!(
    /// Stop a passive-roaming session.
    PrStop, PrStopReq, PrStopAns, PrStopReqPayload, PrStopAnsPayload
);
operation!(
    /// Transmit an uplink or downlink frame.
    XmitData, XmitDataReq, XmitDataAns, XmitDataReqPayload, XmitDataAnsPayload
);
operation!(
    /// Query the device profile.
    Profile, ProfileReq, ProfileAns, ProfileReqPayload, ProfileAnsPayload
);
operation!(
    /// Resolve the home network server of a device.
    HomeNs, HomeNsReq, HomeNsAns, HomeNsReqPayload, HomeNsAnsPayload
);

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::{ResultCode, PROTOCOL_VERSION_1_0};
    use serde_json::json;

    fn base(transaction_id: u32, typ: MessageType) -> BasePayload {
        // ---
        BasePayload {
            protocol_version: PROTOCOL_VERSION_1_0.into(),
            sender_id: "000001".into(),
            receiver_id: "000002".into(),
            transaction_id,
            message_type: Some(typ),
            ..BasePayload::default()
        }
    }

    fn round_trip<A: Answer + PartialEq + std::fmt::Debug>(answer: A) {
        // ---
        let bytes = serde_json::to_vec(&answer).unwrap();
        let decoded: A = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, answer);
    }

    #[test]
    fn test_answers_round_trip() {
        // ---
        round_trip(PrStartAnsPayload::new(
            base(1, MessageType::PrStartAns),
            ResultPayload::success(),
            PrStartAnsBody {
                phy_payload: Some("400102030480".into()),
                dev_eui: Some("0102030405060708".into()),
                lifetime: Some(300),
                nwk_s_key: Some(json!({"KEKLabel": "", "AESKey": "00112233"})),
                f_cnt_up: Some(17),
                ..PrStartAnsBody::default()
            },
        ));

        round_trip(PrStopAnsPayload::new(
            base(2, MessageType::PrStopAns),
            ResultPayload::failure(ResultCode::UnknownDevEui, "who?"),
            EmptyBody {},
        ));

        round_trip(XmitDataAnsPayload::new(
            base(3, MessageType::XmitDataAns),
            ResultPayload::success(),
            XmitDataAnsBody {
                dl_freq1: Some(869.5),
                dl_freq2: None,
            },
        ));

        round_trip(ProfileAnsPayload::new(
            base(4, MessageType::ProfileAns),
            ResultPayload::failure("500", "server error"),
            ProfileAnsBody {
                device_profile: Some(json!({"SupportsClassB": false})),
                device_profile_timestamp: Some("2026-01-01T00:00:00Z".into()),
                roaming_activation_type: Some("Passive".into()),
            },
        ));

        round_trip(HomeNsAnsPayload::new(
            base(u32::MAX, MessageType::HomeNsAns),
            ResultPayload::success(),
            HomeNsAnsBody {
                h_net_id: Some("C00053".into()),
            },
        ));
    }

    #[test]
    fn test_request_wire_shape() {
        // ---
        let req = PrStartReqPayload::new(
            base(42, MessageType::PrStartReq),
            PrStartReqBody {
                phy_payload: Some("40aabbcc".into()),
                ul_meta_data: None,
            },
        );

        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            json!({
                "ProtocolVersion": "1.0",
                "SenderID": "000001",
                "ReceiverID": "000002",
                "TransactionID": 42,
                "MessageType": "PRStartReq",
                "PHYPayload": "40aabbcc",
            })
        );
    }

    #[test]
    fn test_minimal_answer_decodes() {
        // ---
        let ans: PrStartAnsPayload =
            serde_json::from_str(r#"{"TransactionID":42,"Result":{"ResultCode":"Success"}}"#)
                .unwrap();

        assert_eq!(ans.base.transaction_id, 42);
        assert!(ans.result().result_code.is_success());
        assert_eq!(ans.body, PrStartAnsBody::default());
    }

    #[test]
    fn test_missing_result_is_failure() {
        // ---
        let ans: HomeNsAnsPayload = serde_json::from_str(r#"{"TransactionID":5}"#).unwrap();
        assert!(!ans.result().result_code.is_success());
        assert_eq!(ans.result().result_code.as_str(), "");
    }

    #[test]
    fn test_operation_tags() {
        // ---
        assert_eq!(PrStart::REQUEST_TYPE, MessageType::PrStartReq);
        assert_eq!(PrStop::ANSWER_TYPE, MessageType::PrStopAns);
        assert_eq!(HomeNs::REQUEST_TYPE.as_str(), "HomeNSReq");
    }
}
