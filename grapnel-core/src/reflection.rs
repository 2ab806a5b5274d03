//! # Server Reflection
//!
//! This module contains the logic necessary to interact with the gRPC Server Reflection
//! Protocol (`grpc.reflection.v1alpha`).
//!
//! It enables the backend to query a server for its own Protobuf schema at runtime,
//! which is what allows Grapnel to function without any `.proto` files on disk.
pub mod client;
