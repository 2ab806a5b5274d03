//! # Reflection Client
//!
//! A client for the `grpc.reflection.v1alpha` protocol. It can:
//!
//! 1. **List Services**: query the server for all exposed service names.
//! 2. **Symbol Resolution**: fetch the `FileDescriptorProto` defining a symbol, then
//!    recursively fetch any imported files until the resulting `FileDescriptorSet` is
//!    self-contained and can back a [`DescriptorPool`].
//!
//! Every operation is bounded by [`REFLECT_TIMEOUT`]; servers that accept the stream but
//! never answer surface as [`ReflectionError::Deadline`] instead of hanging a request.
//!
//! ## References
//!
//! * [gRPC Server Reflection Protocol](https://github.com/grpc/grpc/blob/master/doc/server-reflection.md)
use crate::REFLECT_TIMEOUT;
use prost::Message;
use prost_reflect::DescriptorPool;
use prost_types::{FileDescriptorProto, FileDescriptorSet};
use std::collections::{HashMap, HashSet};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::Streaming;
use tonic::transport::Channel;
use tonic_reflection::pb::v1alpha::{
    ServerReflectionRequest, ServerReflectionResponse,
    server_reflection_client::ServerReflectionClient, server_reflection_request::MessageRequest,
    server_reflection_response::MessageResponse,
};

/// Errors that can occur while talking to the reflection service.
#[derive(Debug, thiserror::Error)]
pub enum ReflectionError {
    #[error(
        "Failed to start a stream request with the reflection server, reflection might not be supported: '{0}'"
    )]
    StreamInitFailed(#[source] tonic::Status),

    #[error("The server stream returned an error status: '{0}'")]
    StreamFailure(#[source] tonic::Status),

    #[error("Reflection stream closed unexpectedly")]
    StreamClosed,

    #[error("Internal error: Failed to send request to stream")]
    SendFailed,

    #[error("Server returned reflection error code {code}: {message}")]
    ServerError { code: i32, message: String },

    #[error("Protocol error: Received unexpected response type: {0}")]
    UnexpectedResponseType(String),

    #[error("Failed to decode FileDescriptorProto: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("Failed to build descriptor pool: {0}")]
    Pool(#[from] prost_reflect::DescriptorError),

    #[error("Reflection request exceeded the {}s deadline", REFLECT_TIMEOUT.as_secs())]
    Deadline,
}

// The host field of a reflection request is undocumented and servers ignore it,
// so we never ask the caller for one.
const NO_HOST: &str = "";

fn request(message: MessageRequest) -> ServerReflectionRequest {
    ServerReflectionRequest {
        host: NO_HOST.to_string(),
        message_request: Some(message),
    }
}

/// A client for interacting with the gRPC Server Reflection Service over an open channel.
pub struct ReflectionClient {
    client: ServerReflectionClient<Channel>,
}

impl ReflectionClient {
    pub fn new(channel: Channel) -> Self {
        Self {
            client: ServerReflectionClient::new(channel),
        }
    }

    /// Lists the fully qualified names of all services exposed by the server.
    pub async fn list_services(&mut self) -> Result<Vec<String>, ReflectionError> {
        tokio::time::timeout(REFLECT_TIMEOUT, self.list_services_inner())
            .await
            .map_err(|_| ReflectionError::Deadline)?
    }

    async fn list_services_inner(&mut self) -> Result<Vec<String>, ReflectionError> {
        let req = request(MessageRequest::ListServices(String::new()));

        let mut responses = self
            .client
            .server_reflection_info(futures_util::stream::once(async { req }))
            .await
            .map_err(ReflectionError::StreamInitFailed)?
            .into_inner();

        let response = next_message(&mut responses).await?;

        match response {
            MessageResponse::ListServicesResponse(resp) => {
                Ok(resp.service.into_iter().map(|s| s.name).collect())
            }
            other => Err(unexpected(other)),
        }
    }

    /// Fetches the complete `FileDescriptorSet` containing the definition of `symbol`.
    ///
    /// The server answers a `FileContainingSymbol` request with one or more file
    /// descriptors; each of those may import files the server did not send. This method
    /// keeps requesting the missing imports over the same stream until the transitive
    /// closure is complete, so the returned set can back a [`DescriptorPool`] on its own.
    pub async fn file_descriptor_set_by_symbol(
        &mut self,
        symbol: &str,
    ) -> Result<FileDescriptorSet, ReflectionError> {
        tokio::time::timeout(REFLECT_TIMEOUT, self.file_descriptor_set_inner(symbol))
            .await
            .map_err(|_| ReflectionError::Deadline)?
    }

    /// Convenience wrapper building a [`DescriptorPool`] straight from
    /// [`Self::file_descriptor_set_by_symbol`].
    pub async fn descriptor_pool_for_symbol(
        &mut self,
        symbol: &str,
    ) -> Result<DescriptorPool, ReflectionError> {
        let fd_set = self.file_descriptor_set_by_symbol(symbol).await?;
        Ok(DescriptorPool::from_file_descriptor_set(fd_set)?)
    }

    async fn file_descriptor_set_inner(
        &mut self,
        symbol: &str,
    ) -> Result<FileDescriptorSet, ReflectionError> {
        let (tx, rx) = mpsc::channel(16);

        let mut responses = self
            .client
            .server_reflection_info(ReceiverStream::new(rx))
            .await
            .map_err(ReflectionError::StreamInitFailed)?
            .into_inner();

        tx.send(request(MessageRequest::FileContainingSymbol(
            symbol.to_string(),
        )))
        .await
        .map_err(|_| ReflectionError::SendFailed)?;

        let mut walk = DependencyWalk::default();
        let mut inflight = 1usize;

        while inflight > 0 {
            let response = next_message(&mut responses).await?;
            inflight -= 1;

            let batch = match response {
                MessageResponse::FileDescriptorResponse(res) => res.file_descriptor_proto,
                other => return Err(unexpected(other)),
            };

            for missing in walk.absorb(batch)? {
                tx.send(request(MessageRequest::FileByFilename(missing)))
                    .await
                    .map_err(|_| ReflectionError::SendFailed)?;
                inflight += 1;
            }
        }

        Ok(walk.into_file_descriptor_set())
    }
}

async fn next_message(
    responses: &mut Streaming<ServerReflectionResponse>,
) -> Result<MessageResponse, ReflectionError> {
    responses
        .message()
        .await
        .map_err(ReflectionError::StreamFailure)?
        .ok_or(ReflectionError::StreamClosed)?
        .message_response
        .ok_or_else(|| ReflectionError::UnexpectedResponseType("Empty Message".into()))
}

fn unexpected(response: MessageResponse) -> ReflectionError {
    match response {
        MessageResponse::ErrorResponse(e) => ReflectionError::ServerError {
            code: e.error_code,
            message: e.error_message,
        },
        other => ReflectionError::UnexpectedResponseType(format!("{other:?}")),
    }
}

/// Tracks which file descriptors have been collected and which imports are still owed.
#[derive(Default)]
struct DependencyWalk {
    files: HashMap<String, FileDescriptorProto>,
    requested: HashSet<String>,
}

impl DependencyWalk {
    /// Decodes a batch of raw descriptors and records them. Returns the imports that are
    /// neither collected nor already requested, in the order they were discovered.
    fn absorb(
        &mut self,
        batch: impl IntoIterator<Item = impl AsRef<[u8]>>,
    ) -> Result<Vec<String>, ReflectionError> {
        let mut missing = Vec::new();

        for raw in batch {
            let fd = FileDescriptorProto::decode(raw.as_ref())?;

            let Some(name) = fd.name.clone() else {
                continue;
            };
            if self.files.contains_key(&name) {
                continue;
            }

            for dep in &fd.dependency {
                if !self.files.contains_key(dep) && self.requested.insert(dep.clone()) {
                    missing.push(dep.clone());
                }
            }

            self.files.insert(name, fd);
        }

        Ok(missing)
    }

    fn into_file_descriptor_set(self) -> FileDescriptorSet {
        FileDescriptorSet {
            file: self.files.into_values().collect(),
        }
    }
}
