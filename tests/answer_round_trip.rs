// tests/answer_round_trip.rs

use proptest::prelude::*;
use serde_json::{json, Value};

use roam_rpc::{
    // ---
    BasePayload,
    EmptyBody,
    HomeNsAnsBody,
    HomeNsAnsPayload,
    MessageType,
    PrStartAnsBody,
    PrStartAnsPayload,
    PrStopAnsPayload,
    ProfileAnsBody,
    ProfileAnsPayload,
    ResultCode,
    ResultPayload,
    XmitDataAnsBody,
    XmitDataAnsPayload,
};

fn message_type() -> impl Strategy<Value = Option<MessageType>> {
    prop::option::of(prop::sample::select(vec![
        MessageType::PrStartAns,
        MessageType::PrStopAns,
        MessageType::XmitDataAns,
        MessageType::ProfileAns,
        MessageType::HomeNsAns,
    ]))
}

prop_compose! {
    fn base_payload()(
        transaction_id in any::<u32>(),
        protocol_version in "(1\\.0|1\\.1)?",
        sender_id in "[0-9A-F]{0,6}",
        receiver_id in "[0-9A-F]{0,6}",
        message_type in message_type(),
        sender_ns_id in prop::option::of("[0-9A-F]{6}"),
        receiver_ns_id in prop::option::of("[0-9A-F]{6}"),
    ) -> BasePayload {
        BasePayload {
            protocol_version,
            sender_id,
            receiver_id,
            transaction_id,
            message_type,
            sender_ns_id,
            receiver_ns_id,
        }
    }
}

fn result_code() -> impl Strategy<Value = ResultCode> {
    // Codes go through `From<String>` so known names map to their variant,
    // the way they arrive off the wire.
    prop_oneof![
        prop::sample::select(vec![
            "Success",
            "MICFailed",
            "UnknownDevEUI",
            "Deferred",
            "XmitFailed",
            "MalformedRequest",
            "FrameSizeError",
        ])
        .prop_map(ResultCode::from),
        "[A-Za-z0-9]{0,12}".prop_map(ResultCode::from),
    ]
}

prop_compose! {
    fn result_payload()(
        result_code in result_code(),
        description in ".{0,24}",
    ) -> ResultPayload {
        ResultPayload { result_code, description }
    }
}

/// Opaque JSON blobs as carried in metadata fields. Never `null`, which
/// reads back as an absent field.
fn opaque() -> impl Strategy<Value = Value> {
    prop_oneof![
        scalar(),
        ("[A-Za-z]{1,8}", scalar()).prop_map(|(k, v)| json!({ k: v })),
    ]
}

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<u32>().prop_map(Value::from),
        "[A-Za-z0-9 ]{0,16}".prop_map(Value::String),
    ]
}

fn hex() -> impl Strategy<Value = Option<String>> {
    prop::option::of("[0-9a-f]{0,32}")
}

/// Frequencies in whole hundreds of Hz, exact in both f64 and JSON.
fn frequency() -> impl Strategy<Value = Option<f64>> {
    prop::option::of((0u32..10_000_000).prop_map(|n| f64::from(n) * 100.0))
}

prop_compose! {
    fn pr_start_ans_body()(
        phy_payload in hex(),
        dev_eui in hex(),
        lifetime in prop::option::of(any::<u32>()),
        f_nwk_s_int_key in prop::option::of(opaque()),
        nwk_s_key in prop::option::of(opaque()),
        f_cnt_up in prop::option::of(any::<u32>()),
        service_profile in prop::option::of(opaque()),
        dl_meta_data in prop::option::of(opaque()),
    ) -> PrStartAnsBody {
        PrStartAnsBody {
            phy_payload,
            dev_eui,
            lifetime,
            f_nwk_s_int_key,
            nwk_s_key,
            f_cnt_up,
            service_profile,
            dl_meta_data,
        }
    }
}

prop_compose! {
    fn profile_ans_body()(
        device_profile in prop::option::of(opaque()),
        device_profile_timestamp in prop::option::of("[0-9:TZ-]{0,20}"),
        roaming_activation_type in prop::option::of("(Passive|Handover)"),
    ) -> ProfileAnsBody {
        ProfileAnsBody { device_profile, device_profile_timestamp, roaming_activation_type }
    }
}

fn round_trip<T>(value: &T) -> T
where
    T: serde::Serialize + serde::de::DeserializeOwned,
{
    let bytes = serde_json::to_vec(value).expect("encode");
    serde_json::from_slice(&bytes).expect("decode")
}

proptest! {
    #[test]
    fn pr_start_answer_round_trips(
        base in base_payload(),
        result in result_payload(),
        body in pr_start_ans_body(),
    ) {
        let ans = PrStartAnsPayload::new(base, result, body);
        prop_assert_eq!(round_trip(&ans), ans);
    }

    #[test]
    fn pr_stop_answer_round_trips(base in base_payload(), result in result_payload()) {
        let ans = PrStopAnsPayload::new(base, result, EmptyBody {});
        prop_assert_eq!(round_trip(&ans), ans);
    }

    #[test]
    fn xmit_data_answer_round_trips(
        base in base_payload(),
        result in result_payload(),
        dl_freq1 in frequency(),
        dl_freq2 in frequency(),
    ) {
        let ans = XmitDataAnsPayload::new(base, result, XmitDataAnsBody { dl_freq1, dl_freq2 });
        prop_assert_eq!(round_trip(&ans), ans);
    }

    #[test]
    fn profile_answer_round_trips(
        base in base_payload(),
        result in result_payload(),
        body in profile_ans_body(),
    ) {
        let ans = ProfileAnsPayload::new(base, result, body);
        prop_assert_eq!(round_trip(&ans), ans);
    }

    #[test]
    fn home_ns_answer_round_trips(
        base in base_payload(),
        result in result_payload(),
        h_net_id in prop::option::of("[0-9A-F]{6}"),
    ) {
        let ans = HomeNsAnsPayload::new(base, result, HomeNsAnsBody { h_net_id });
        prop_assert_eq!(round_trip(&ans), ans);
    }

    #[test]
    fn only_success_code_is_success(code in result_code()) {
        let decoded: ResultPayload = serde_json::from_value(json!({ "ResultCode": code.as_str() }))
            .expect("decode");
        prop_assert_eq!(decoded.result_code.is_success(), code.as_str() == "Success");
        prop_assert_eq!(decoded.result_code, code);
    }
}
