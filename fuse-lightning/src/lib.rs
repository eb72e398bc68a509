//! Provider-agnostic view of a Lightning node.
//!
//! This crate holds the value types shared by every node backend, the BOLT-11
//! invoice codec, the [`LightningProvider`] capability trait, and the LNURL
//! helpers used to bind invoices to LNURL-pay metadata.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub use bitcoin;
pub use lightning_invoice;

/// Error taxonomy
pub mod error;
/// BOLT-11 invoice codec
pub mod invoice;
/// LNURL metadata and LUD-01 URL encoding
pub mod lnurl;
/// The provider capability trait
pub mod provider;
/// Domain value types
pub mod types;
/// Utilities
pub mod util;

pub use error::Error;
pub use invoice::{Invoice, InvoiceDescription};
pub use lnurl::Metadata;
pub use provider::LightningProvider;
pub use types::{
    Channel, MilliSatoshi, Network, PaymentHash, PaymentResult, Peer, Preimage, Vertex,
};
