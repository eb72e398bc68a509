//! LNURL-pay and node management payloads built from a
//! [`fuse_lightning::LightningProvider`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub use fuse_lightning;
pub use fuse_lnd;

/// HTTP response payloads
pub mod responses;
/// Serialization helpers and logging setup
pub mod util;
