//! lnd backend for [`fuse_lightning::LightningProvider`].
//!
//! [`GrpcLnd`] talks to lnd over its TLS + macaroon authenticated gRPC
//! interface, and [`LndProvider`] maps it onto the provider interface,
//! including the already-paid detection and the bounded connection retry.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Command line and environment configuration
pub mod config;
/// Startup connection retry
pub mod connect;
/// Error types
pub mod error;
/// gRPC client
pub mod grpc;
pub mod lnd;
/// The provider implementation
pub mod provider;

/// Generated lnd gRPC bindings
#[allow(missing_docs)]
pub mod lnrpc {
    tonic::include_proto!("lnrpc");
}

pub use config::LndArgs;
pub use connect::{connect_with_retry, RetryPolicy};
pub use error::LndError;
pub use grpc::GrpcLnd;
pub use lnd::Lnd;
pub use provider::LndProvider;
