//! # Adder Service
//!
//! **INTERNAL USE ONLY**: This crate exists solely to provide a gRPC server
//! implementation and descriptor set for integration testing the `grapnel` workspace.
//! It is not intended for production use.
//!
//! The service mirrors the shape of the public `addsvc.Add` playground service (`Sum`,
//! `Concat`), extended with the schema corners the resolver has to handle: a nested
//! message, an inline enum, a self-referential message and a server-streaming method.
//!
//! Everything is assembled in Rust: the [`prost_types::FileDescriptorSet`] is built by
//! hand and the unary methods are served through the same dynamic codec the client
//! uses, so no `protoc` run is needed at build time.

mod descriptor;
mod server;

pub use descriptor::{descriptor_pool, file_descriptor_set};
pub use server::{AdderServer, SERVICE_NAME};

use tokio_stream::wrappers::TcpListenerStream;

/// Spawns the fixture (reflection v1alpha + `addsvc.Add`) on an ephemeral local port.
pub async fn spawn() -> std::net::SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fixture listener");
    let addr = listener.local_addr().expect("fixture listener address");

    let reflection = tonic_reflection::server::Builder::configure()
        .register_file_descriptor_set(file_descriptor_set())
        .build_v1alpha()
        .expect("fixture descriptors are valid");

    tokio::spawn(async move {
        tonic::transport::Server::builder()
            .add_service(reflection)
            .add_service(AdderServer::new())
            .serve_with_incoming(TcpListenerStream::new(listener))
            .await
            .expect("fixture server failed");
    });

    addr
}
