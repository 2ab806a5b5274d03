//! # Dynamic gRPC Client
//!
//! A thin wrapper around `tonic::client::Grpc` issuing unary calls against a method
//! path constructed at runtime.
//!
//! The HTTP/2 path is always derived from the *descriptor's* fully qualified service
//! name. Name resolution upstream may have matched the user's input loosely, but the
//! wire path must be the authoritative one or the server will reject the call.
use super::codec::DynamicCodec;
use crate::{BoxError, INVOKE_TIMEOUT};
use prost_reflect::{DynamicMessage, MethodDescriptor};
use std::str::FromStr;
use tonic::{
    metadata::{
        MetadataKey, MetadataValue,
        errors::{InvalidMetadataKey, InvalidMetadataValue},
    },
    transport::Channel,
};

#[derive(Debug, thiserror::Error)]
pub enum GrpcRequestError {
    #[error("Internal error, the client was not ready: '{0}'")]
    ClientNotReady(#[source] BoxError),
    #[error("Invalid metadata (header) key '{key}': '{source}'")]
    InvalidMetadataKey {
        key: String,
        source: InvalidMetadataKey,
    },
    #[error("Invalid metadata (header) value for key '{key}': '{source}'")]
    InvalidMetadataValue {
        key: String,
        source: InvalidMetadataValue,
    },
}

/// A dynamic gRPC client over an owned per-request channel.
pub struct GrpcClient {
    client: tonic::client::Grpc<Channel>,
}

impl GrpcClient {
    pub fn new(channel: Channel) -> Self {
        Self {
            client: tonic::client::Grpc::new(channel),
        }
    }

    /// Performs a unary gRPC call (single request, single response).
    ///
    /// # Returns
    /// * `Ok(Ok(DynamicMessage))` - Successful RPC execution.
    /// * `Ok(Err(Status))` - RPC executed, but the server returned an error.
    /// * `Err(GrpcRequestError)` - The request could not be sent at all.
    pub async fn unary(
        &mut self,
        method: &MethodDescriptor,
        message: DynamicMessage,
        metadata: Vec<(String, String)>,
    ) -> Result<Result<DynamicMessage, tonic::Status>, GrpcRequestError> {
        self.client
            .ready()
            .await
            .map_err(|e| GrpcRequestError::ClientNotReady(e.into()))?;

        let codec = DynamicCodec::new(method.output());
        let path = http_path(method);
        let request = build_request(message, metadata)?;

        match self.client.unary(request, path, codec).await {
            Ok(response) => Ok(Ok(response.into_inner())),
            Err(status) => Ok(Err(status)),
        }
    }
}

fn http_path(method: &MethodDescriptor) -> http::uri::PathAndQuery {
    let path = format!("/{}/{}", method.parent_service().full_name(), method.name());
    http::uri::PathAndQuery::from_str(&path).expect("valid gRPC path")
}

fn build_request(
    message: DynamicMessage,
    metadata: Vec<(String, String)>,
) -> Result<tonic::Request<DynamicMessage>, GrpcRequestError> {
    let mut request = tonic::Request::new(message);
    // Let the server see the same deadline the client enforces.
    request.set_timeout(INVOKE_TIMEOUT);

    for (k, v) in metadata {
        let key =
            MetadataKey::from_str(&k).map_err(|source| GrpcRequestError::InvalidMetadataKey {
                key: k.clone(),
                source,
            })?;
        let value = MetadataValue::from_str(&v)
            .map_err(|source| GrpcRequestError::InvalidMetadataValue { key: k, source })?;
        // append, not insert: a key may legitimately carry several values.
        request.metadata_mut().append(key, value);
    }

    Ok(request)
}
