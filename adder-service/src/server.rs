//! A hand-rolled tonic service for the fixture.
//!
//! Generated servers are not an option here (no generated message types exist), so this
//! follows the structure `tonic` code generation produces: route on the request path,
//! wrap a per-method `UnaryService`, and let `tonic::server::Grpc` drive the codec.
//! Messages cross the boundary as [`DynamicMessage`] via [`DynamicCodec`].
use crate::descriptor::descriptor_pool;
use grapnel_core::grpc::codec::DynamicCodec;
use prost_reflect::{DescriptorPool, DynamicMessage, MessageDescriptor, Value};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tonic::codegen::Service;
use tonic::server::{Grpc, NamedService, UnaryService};

pub const SERVICE_NAME: &str = "addsvc.Add";

type BoxedResponseFuture =
    Pin<Box<dyn Future<Output = Result<tonic::Response<DynamicMessage>, tonic::Status>> + Send>>;

/// The fixture implementation of `addsvc.Add`.
///
/// `Sum` adds two int32 fields, `Concat` joins two strings, `Meta` echoes the request
/// metadata values stored under the key named by the request. `Annotate` and
/// `StreamSum` exist for schema discovery only and answer `UNIMPLEMENTED`.
#[derive(Clone)]
pub struct AdderServer {
    pool: DescriptorPool,
}

impl AdderServer {
    pub fn new() -> Self {
        Self {
            pool: descriptor_pool(),
        }
    }

    fn message(&self, name: &str) -> MessageDescriptor {
        self.pool
            .get_message_by_name(name)
            .expect("fixture message descriptor present")
    }
}

impl Default for AdderServer {
    fn default() -> Self {
        Self::new()
    }
}

impl NamedService for AdderServer {
    const NAME: &'static str = SERVICE_NAME;
}

impl Service<http::Request<tonic::body::Body>> for AdderServer {
    type Response = http::Response<tonic::body::Body>;
    type Error = std::convert::Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<tonic::body::Body>) -> Self::Future {
        match req.uri().path() {
            "/addsvc.Add/Sum" => {
                let codec = DynamicCodec::new(self.message("addsvc.SumRequest"));
                let svc = SumSvc {
                    reply: self.message("addsvc.SumReply"),
                };
                Box::pin(async move {
                    let mut grpc = Grpc::new(codec);
                    Ok(grpc.unary(svc, req).await)
                })
            }
            "/addsvc.Add/Concat" => {
                let codec = DynamicCodec::new(self.message("addsvc.ConcatRequest"));
                let svc = ConcatSvc {
                    reply: self.message("addsvc.ConcatReply"),
                };
                Box::pin(async move {
                    let mut grpc = Grpc::new(codec);
                    Ok(grpc.unary(svc, req).await)
                })
            }
            "/addsvc.Add/Meta" => {
                let codec = DynamicCodec::new(self.message("addsvc.MetaRequest"));
                let svc = MetaSvc {
                    reply: self.message("addsvc.MetaReply"),
                };
                Box::pin(async move {
                    let mut grpc = Grpc::new(codec);
                    Ok(grpc.unary(svc, req).await)
                })
            }
            _ => Box::pin(async move { Ok(unimplemented_response()) }),
        }
    }
}

struct SumSvc {
    reply: MessageDescriptor,
}

impl UnaryService<DynamicMessage> for SumSvc {
    type Response = DynamicMessage;
    type Future = BoxedResponseFuture;

    fn call(&mut self, request: tonic::Request<DynamicMessage>) -> Self::Future {
        let reply_desc = self.reply.clone();
        Box::pin(async move {
            let message = request.into_inner();
            let sum = int32_field(&message, "a") + int32_field(&message, "b");

            let mut reply = DynamicMessage::new(reply_desc);
            reply.set_field_by_name("v", Value::I32(sum));
            Ok(tonic::Response::new(reply))
        })
    }
}

struct ConcatSvc {
    reply: MessageDescriptor,
}

impl UnaryService<DynamicMessage> for ConcatSvc {
    type Response = DynamicMessage;
    type Future = BoxedResponseFuture;

    fn call(&mut self, request: tonic::Request<DynamicMessage>) -> Self::Future {
        let reply_desc = self.reply.clone();
        Box::pin(async move {
            let message = request.into_inner();
            let joined = format!(
                "{}{}",
                string_field(&message, "a"),
                string_field(&message, "b")
            );

            let mut reply = DynamicMessage::new(reply_desc);
            reply.set_field_by_name("v", Value::String(joined));
            Ok(tonic::Response::new(reply))
        })
    }
}

struct MetaSvc {
    reply: MessageDescriptor,
}

impl UnaryService<DynamicMessage> for MetaSvc {
    type Response = DynamicMessage;
    type Future = BoxedResponseFuture;

    fn call(&mut self, request: tonic::Request<DynamicMessage>) -> Self::Future {
        let reply_desc = self.reply.clone();
        Box::pin(async move {
            let metadata = request.metadata().clone();
            let message = request.into_inner();
            let key = string_field(&message, "key");

            let values: Vec<Value> = metadata
                .get_all(key.as_str())
                .iter()
                .filter_map(|value| value.to_str().ok())
                .map(|value| Value::String(value.to_string()))
                .collect();

            let mut reply = DynamicMessage::new(reply_desc);
            reply.set_field_by_name("values", Value::List(values));
            Ok(tonic::Response::new(reply))
        })
    }
}

fn int32_field(message: &DynamicMessage, name: &str) -> i32 {
    message
        .get_field_by_name(name)
        .and_then(|value| value.as_i32())
        .unwrap_or_default()
}

fn string_field(message: &DynamicMessage, name: &str) -> String {
    message
        .get_field_by_name(name)
        .and_then(|value| value.as_str().map(str::to_string))
        .unwrap_or_default()
}

fn unimplemented_response() -> http::Response<tonic::body::Body> {
    http::Response::builder()
        .status(http::StatusCode::OK)
        .header("grpc-status", (tonic::Code::Unimplemented as i32).to_string())
        .header("content-type", "application/grpc")
        .body(tonic::body::Body::empty())
        .expect("static response parts are valid")
}
