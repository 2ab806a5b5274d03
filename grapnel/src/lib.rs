//! # Grapnel
//!
//! The HTTP backend a browser UI talks to in order to explore and invoke gRPC services.
//! All heavy lifting (connection probing, reflection, dynamic invocation, caching)
//! lives in `grapnel-core`; this crate is the thin routing and error-mapping layer on
//! top of it.
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
