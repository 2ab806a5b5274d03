//! # Generic gRPC Transport
//!
//! The low-level building blocks for performing gRPC calls with message types that are
//! only known at runtime.
//!
//! Instead of generated request/response structs, the components here move
//! [`prost_reflect::DynamicMessage`] values over the wire, with the method path and the
//! codec both derived from a [`prost_reflect::MethodDescriptor`] resolved via
//! reflection.
pub mod client;
pub mod codec;
