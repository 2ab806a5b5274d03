//! # Grapnel Core
//!
//! `grapnel-core` is the library powering the Grapnel backend. It lets callers invoke
//! methods on any gRPC server that exposes the server-reflection protocol, without
//! compile-time knowledge of the Protobuf schema.
//!
//! ## Key Components
//!
//! * **[`connect::connect`]:** Opens a verified channel to a user-supplied host, probing
//!   an ordered list of port / transport-security combinations until one answers a
//!   reflection `ListServices` call.
//! * **[`schema`]:** Resolves service and method descriptors by (possibly loosely
//!   qualified) name and flattens message schemas into transport-neutral descriptions a
//!   UI can render as forms.
//! * **[`invoke`]:** Builds a dynamic request message from caller-supplied JSON, attaches
//!   metadata, performs the unary call and decodes the response back to JSON.
//! * **[`cache::ReflectionCache`]:** Time-based memoization of per-host reflection
//!   results, shared across concurrent requests.
//!
//! ## Internal clients
//!
//! The lower-level pieces are exposed as well, for callers that want to drive the
//! individual steps themselves:
//!
//! * **[`grpc::client::GrpcClient`]:** A dynamic gRPC client transporting
//!   [`prost_reflect::DynamicMessage`] values through a runtime-resolved method path.
//! * **[`reflection::client::ReflectionClient`]:** A client for the
//!   `grpc.reflection.v1alpha` protocol, able to reconstruct a self-contained
//!   `FileDescriptorSet` for any symbol the server exposes.
//!
//! ## Re-exports
//!
//! This crate re-exports `prost`, `prost-reflect`, and `tonic` to ensure that consumers
//! use compatible versions of these underlying dependencies.

pub mod cache;
pub mod connect;
pub mod grpc;
pub mod invoke;
pub mod reflection;
pub mod schema;

// Re-exports
pub use prost;
pub use prost_reflect;
pub use tonic;

use std::time::Duration;

/// How long a single dial attempt may take before the next strategy is tried.
pub const DIAL_TIMEOUT: Duration = Duration::from_secs(15);

/// Deadline applied to every reflection RPC, including the verification probe.
pub const REFLECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Deadline for a unary invocation, also propagated to the server as `grpc-timeout`.
pub const INVOKE_TIMEOUT: Duration = Duration::from_secs(30);

/// Type alias for the standard boxed error used in generic bounds.
type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
