use thiserror::Error;

use crate::types::Network;

/// Errors surfaced by the provider layer
#[derive(Debug, Error)]
pub enum Error {
    /// The payment request is malformed or its checksum/signature is invalid
    #[error("invalid invoice: {0}")]
    InvoiceDecode(String),
    /// The payment request is for a different network than the one requested
    #[error("invoice is for {actual}, expected {expected}")]
    WrongNetwork {
        /// The network the caller asked for
        expected: Network,
        /// The network encoded in the payment request
        actual: Network,
    },
    /// The network name is not one we know
    #[error("unknown network: {0}")]
    UnknownNetwork(String),
    /// A node public key was not 33 bytes of valid hex
    #[error("invalid public key: {0}")]
    InvalidVertex(String),
    /// A 32-byte hash or preimage had the wrong length or encoding
    #[error("invalid 32-byte value: {0}")]
    InvalidHash(String),
    /// LNURL encoding failure
    #[error("invalid lnurl: {0}")]
    Lnurl(String),
    /// The backend reported success without a preimage, meaning the invoice
    /// had already been settled by an earlier payment
    #[error("invoice has already been paid")]
    InvoiceAlreadyPaid,
    /// The backend abandoned the call before delivering a result
    #[error("call cancelled")]
    Cancelled,
    /// Any error raised by the node backend, passed through unchanged
    #[error(transparent)]
    Backend(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wrap a backend error without altering it
    pub fn backend<E: std::error::Error + Send + Sync + 'static>(err: E) -> Self {
        Error::Backend(Box::new(err))
    }

    /// Whether the error is the already-paid condition
    pub fn is_already_paid(&self) -> bool {
        matches!(self, Error::InvoiceAlreadyPaid)
    }
}
