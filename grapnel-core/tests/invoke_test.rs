use grapnel_core::invoke::{self, CallRequest, InvokeError};
use serde_json::json;
use std::collections::BTreeMap;

fn request(host: String, method: &str, message: Option<serde_json::Value>) -> CallRequest {
    CallRequest {
        host,
        method: method.to_string(),
        message,
        meta_data: None,
    }
}

#[tokio::test]
async fn unary_sum_round_trips_json() {
    let addr = adder_service::spawn().await;

    let envelope = request(
        addr.to_string(),
        "addsvc.Add.Sum",
        Some(json!({ "a": 2, "b": 3 })),
    );
    let response = invoke::invoke_unary(&envelope, None).await.unwrap();

    assert_eq!(response, json!({ "v": 5 }));
}

#[tokio::test]
async fn unary_concat_round_trips_json() {
    let addr = adder_service::spawn().await;

    let envelope = request(
        addr.to_string(),
        "addsvc.Add.Concat",
        Some(json!({ "a": "foo", "b": "bar" })),
    );
    let response = invoke::invoke_unary(&envelope, None).await.unwrap();

    assert_eq!(response, json!({ "v": "foobar" }));
}

#[tokio::test]
async fn missing_message_is_treated_as_empty() {
    let addr = adder_service::spawn().await;

    let envelope = request(addr.to_string(), "addsvc.Add.Sum", None);
    let response = invoke::invoke_unary(&envelope, None).await.unwrap();

    // 0 + 0 is the proto3 default and is omitted from the JSON rendering.
    assert_eq!(response, json!({}));
}

#[tokio::test]
async fn loosely_qualified_method_path_resolves() {
    let addr = adder_service::spawn().await;

    let envelope = request(
        addr.to_string(),
        "Add.sum",
        Some(json!({ "a": 20, "b": 22 })),
    );
    let response = invoke::invoke_unary(&envelope, None).await.unwrap();

    assert_eq!(response, json!({ "v": 42 }));
}

#[tokio::test]
async fn dotless_method_is_rejected_before_any_io() {
    let envelope = request("256.0.0.1:1".to_string(), "Sum", None);

    let err = invoke::invoke_unary(&envelope, None).await.unwrap_err();

    assert!(matches!(err, InvokeError::InvalidMethod(_)));
    assert_eq!(err.to_string(), "invalid method name format: Sum");
}

#[tokio::test]
async fn unknown_method_is_a_schema_error() {
    let addr = adder_service::spawn().await;

    let envelope = request(addr.to_string(), "addsvc.Add.Ghost", None);
    let err = invoke::invoke_unary(&envelope, None).await.unwrap_err();

    assert!(matches!(err, InvokeError::Schema(_)));
    assert_eq!(
        err.to_string(),
        "Method Ghost not found in service addsvc.Add"
    );
}

#[tokio::test]
async fn mismatched_payload_is_an_encode_error() {
    let addr = adder_service::spawn().await;

    let envelope = request(
        addr.to_string(),
        "addsvc.Add.Sum",
        Some(json!({ "no_such_field": true })),
    );
    let err = invoke::invoke_unary(&envelope, None).await.unwrap_err();

    assert!(matches!(err, InvokeError::Encode(_)));
}

#[tokio::test]
async fn metadata_arrives_lowercased_with_empty_values_dropped() {
    let addr = adder_service::spawn().await;

    let envelope = CallRequest {
        host: addr.to_string(),
        method: "addsvc.Add.Meta".to_string(),
        message: Some(json!({ "key": "x-trace-id" })),
        meta_data: Some(BTreeMap::from([
            ("X-Trace-Id".to_string(), "abc".to_string()),
            ("Blank".to_string(), String::new()),
        ])),
    };
    let response = invoke::invoke_unary(&envelope, None).await.unwrap();

    assert_eq!(response, json!({ "values": ["abc"] }));
}

#[tokio::test]
async fn authorization_header_is_forwarded_unless_envelope_sets_one() {
    let addr = adder_service::spawn().await;

    // No authorization in the envelope: the HTTP header flows through.
    let envelope = CallRequest {
        host: addr.to_string(),
        method: "addsvc.Add.Meta".to_string(),
        message: Some(json!({ "key": "authorization" })),
        meta_data: None,
    };
    let response = invoke::invoke_unary(&envelope, Some("Bearer XYZ"))
        .await
        .unwrap();
    assert_eq!(response, json!({ "values": ["Bearer XYZ"] }));

    // Envelope metadata wins over the HTTP header.
    let envelope = CallRequest {
        meta_data: Some(BTreeMap::from([(
            "authorization".to_string(),
            "X".to_string(),
        )])),
        ..envelope
    };
    let response = invoke::invoke_unary(&envelope, Some("Bearer XYZ"))
        .await
        .unwrap();
    assert_eq!(response, json!({ "values": ["X"] }));
}
