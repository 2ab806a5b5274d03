//! # Dynamic Invoker
//!
//! The high-level entry point for executing a caller's request envelope end to end:
//! open a verified channel, resolve the method descriptor via reflection, build the
//! typed request message out of caller-supplied JSON, attach metadata, perform the
//! unary call and decode the response back to JSON.
//!
//! The envelope is modeled as a tagged request kind ([`ProxyRequest`]) so that further
//! kinds (REST passthrough, streaming calls) can slot in beside the unary gRPC path
//! without changing the call sites.
use crate::INVOKE_TIMEOUT;
use crate::connect::{self, ConnectError};
use crate::grpc::client::{GrpcClient, GrpcRequestError};
use crate::schema::{self, SchemaError};
use prost_reflect::DynamicMessage;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// The request envelope for a dynamic gRPC call.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRequest {
    /// Target host, possibly carrying a scheme and/or port.
    pub host: String,
    /// Fully qualified method name, `pkg.Service.Method`.
    pub method: String,
    /// JSON payload interpreted against the method's input descriptor. Absent or
    /// `null` is treated as an empty message.
    #[serde(default)]
    pub message: Option<serde_json::Value>,
    /// Flat metadata entries attached to the call.
    #[serde(default)]
    pub meta_data: Option<BTreeMap<String, String>>,
}

#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    #[error("invalid method name format: {0}")]
    InvalidMethod(String),

    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Failed to parse request message: {0}")]
    Encode(String),

    #[error(transparent)]
    Transport(#[from] GrpcRequestError),

    #[error("gRPC call failed: {0}")]
    Rpc(tonic::Status),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("gRPC call exceeded the {}s deadline", INVOKE_TIMEOUT.as_secs())]
    Deadline,
}

/// The kinds of requests the backend can execute.
///
/// Unary gRPC is the only kind today; every kind provides `validate` and `execute`.
#[derive(Debug, Clone)]
pub enum ProxyRequest {
    GrpcUnary(CallRequest),
}

impl ProxyRequest {
    /// Checks the envelope before any I/O happens.
    pub fn validate(&self) -> Result<(), InvokeError> {
        match self {
            ProxyRequest::GrpcUnary(request) => {
                split_method_path(&request.method)?;
                Ok(())
            }
        }
    }

    /// Executes the request. `authorization` is the incoming HTTP `Authorization`
    /// header, forwarded as call metadata unless the envelope already carries one.
    pub async fn execute(
        &self,
        authorization: Option<&str>,
    ) -> Result<serde_json::Value, InvokeError> {
        match self {
            ProxyRequest::GrpcUnary(request) => invoke_unary(request, authorization).await,
        }
    }
}

/// Splits `pkg.Service.Method` on the last dot into service and method short name.
pub fn split_method_path(path: &str) -> Result<(&str, &str), InvokeError> {
    path.rsplit_once('.')
        .ok_or_else(|| InvokeError::InvalidMethod(path.to_string()))
}

/// Performs one unary invocation as described by the envelope.
pub async fn invoke_unary(
    request: &CallRequest,
    authorization: Option<&str>,
) -> Result<serde_json::Value, InvokeError> {
    let (service, method_name) = split_method_path(&request.method)?;
    info!(host = %request.host, method = %request.method, "making gRPC call");

    let channel = connect::connect(&request.host).await?;
    let method = schema::resolve_method(channel.clone(), service, method_name).await?;
    debug!(resolved = %method.full_name(), "resolved method");

    let payload = match request.message.clone() {
        Some(serde_json::Value::Null) | None => serde_json::Value::Object(Default::default()),
        Some(value) => value,
    };
    let message = DynamicMessage::deserialize(method.input(), payload)
        .map_err(|e| InvokeError::Encode(e.to_string()))?;

    let metadata = compose_metadata(request.meta_data.as_ref(), authorization);

    let mut client = GrpcClient::new(channel);
    let response = tokio::time::timeout(INVOKE_TIMEOUT, client.unary(&method, message, metadata))
        .await
        .map_err(|_| InvokeError::Deadline)??
        .map_err(InvokeError::Rpc)?;

    serde_json::to_value(&response).map_err(|e| InvokeError::Decode(e.to_string()))
}

/// Builds the outbound metadata entries from the envelope.
///
/// Keys are lowercased, entries with empty values are dropped, and the incoming HTTP
/// `Authorization` header is appended iff the envelope did not set one itself.
pub fn compose_metadata(
    entries: Option<&BTreeMap<String, String>>,
    authorization: Option<&str>,
) -> Vec<(String, String)> {
    let mut metadata = Vec::new();

    if let Some(entries) = entries {
        for (key, value) in entries {
            if value.is_empty() {
                continue;
            }
            metadata.push((key.to_lowercase(), value.clone()));
        }
    }

    if let Some(auth) = authorization
        && !auth.is_empty()
        && !metadata.iter().any(|(key, _)| key == "authorization")
    {
        metadata.push(("authorization".to_string(), auth.to_string()));
    }

    metadata
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_path_splits_on_last_dot() {
        assert_eq!(
            split_method_path("addsvc.Add.Sum").unwrap(),
            ("addsvc.Add", "Sum")
        );
        assert_eq!(split_method_path("Greeter.SayHello").unwrap(), ("Greeter", "SayHello"));
    }

    #[test]
    fn dotless_method_path_is_rejected() {
        let err = split_method_path("Sum").unwrap_err();
        assert_eq!(err.to_string(), "invalid method name format: Sum");
    }

    #[test]
    fn metadata_keys_are_lowercased_and_empty_values_dropped() {
        let entries = BTreeMap::from([
            ("X-Trace-Id".to_string(), "abc".to_string()),
            ("Blank".to_string(), String::new()),
        ]);

        assert_eq!(
            compose_metadata(Some(&entries), None),
            vec![("x-trace-id".to_string(), "abc".to_string())]
        );
    }

    #[test]
    fn authorization_header_is_forwarded_when_absent() {
        let metadata = compose_metadata(None, Some("Bearer XYZ"));
        assert_eq!(
            metadata,
            vec![("authorization".to_string(), "Bearer XYZ".to_string())]
        );
    }

    #[test]
    fn envelope_authorization_takes_precedence() {
        let entries = BTreeMap::from([("Authorization".to_string(), "X".to_string())]);
        let metadata = compose_metadata(Some(&entries), Some("Bearer XYZ"));
        assert_eq!(
            metadata,
            vec![("authorization".to_string(), "X".to_string())]
        );
    }

    #[test]
    fn empty_authorization_header_is_ignored() {
        assert!(compose_metadata(None, Some("")).is_empty());
    }
}
