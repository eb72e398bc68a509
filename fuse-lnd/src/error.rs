use std::path::PathBuf;

use fuse_lightning::Network;
use thiserror::Error;
use tonic::Status;

/// Errors raised while talking to lnd
#[derive(Debug, Error)]
pub enum LndError {
    /// The gRPC channel could not be established
    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
    /// lnd answered with a non-OK status
    #[error("rpc error: {0}")]
    Rpc(#[from] Status),
    /// Reading the TLS certificate or macaroon failed
    #[error("cannot read {path}: {source}")]
    Io {
        /// The file that could not be read
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
    /// The macaroon could not be used as request metadata
    #[error("invalid macaroon: {0}")]
    InvalidMacaroon(String),
    /// The node runs on a different chain than configured
    #[error("lnd is on {actual}, configured for {expected}")]
    NetworkMismatch {
        /// Configured network
        expected: Network,
        /// The node's network as reported by GetInfo
        actual: String,
    },
    /// lnd reported a payment failure
    #[error("payment failed: {0}")]
    Payment(String),
    /// lnd returned a field we could not interpret
    #[error("malformed response: {0}")]
    Malformed(String),
    /// The call was abandoned before it produced a result
    #[error("cancelled")]
    Cancelled,
}

impl LndError {
    pub(crate) fn malformed<E: std::fmt::Display>(what: &str, err: E) -> Self {
        LndError::Malformed(format!("{}: {}", what, err))
    }
}

impl From<LndError> for fuse_lightning::Error {
    fn from(err: LndError) -> Self {
        match err {
            LndError::Cancelled => fuse_lightning::Error::Cancelled,
            LndError::Rpc(status) if status.code() == tonic::Code::Cancelled => {
                fuse_lightning::Error::Cancelled
            }
            err => fuse_lightning::Error::backend(err),
        }
    }
}
