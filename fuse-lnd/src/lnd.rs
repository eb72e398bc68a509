//! The client contract [`LndProvider`](crate::LndProvider) is written against.
//!
//! It follows the shape of lnd's own RPC surface rather than the provider
//! interface: payments resolve through a one-shot result channel, lists come
//! back as raw records, and the reserved [`Preimage::NULL`] still appears in
//! payment results. [`GrpcLnd`](crate::GrpcLnd) is the production
//! implementation; tests substitute their own.

use std::time::Duration;

use async_trait::async_trait;
use fuse_lightning::bitcoin::{Amount, Txid};
use fuse_lightning::{MilliSatoshi, PaymentHash, Preimage, Vertex};
use tokio::sync::oneshot;

use crate::LndError;

/// On-chain wallet balance
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WalletBalance {
    /// Confirmed funds
    pub confirmed: Amount,
    /// Funds waiting for confirmation
    pub unconfirmed: Amount,
}

/// Parameters of a new invoice.
///
/// lnd honors whichever of `memo` and `description_hash` is set; callers set
/// at most one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AddInvoiceData {
    /// Human readable memo
    pub memo: String,
    /// Requested amount
    pub value: MilliSatoshi,
    /// Commitment to an out-of-band description
    pub description_hash: Option<[u8; 32]>,
}

/// The outcome of a resolved payment.
///
/// `preimage` is [`Preimage::NULL`] when lnd reports that the invoice had
/// already been paid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LndPayment {
    /// Proof of payment, or the null preimage
    pub preimage: Preimage,
    /// Routing fee
    pub paid_fee: MilliSatoshi,
}

/// A peer record as reported by lnd
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LndPeer {
    /// Remote identity
    pub pubkey: Vertex,
    /// Remote address
    pub address: String,
    /// Remote initiated the connection
    pub inbound: bool,
    /// Last ping round trip
    pub ping_time: Duration,
    /// Bytes sent
    pub sent: u64,
    /// Bytes received
    pub received: u64,
}

/// A channel record as reported by lnd
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LndChannel {
    /// Short channel id
    pub chan_id: u64,
    /// Our balance
    pub local_balance: Amount,
    /// Their balance
    pub remote_balance: Amount,
    /// Funding amount
    pub capacity: Amount,
    /// Usable for routing right now
    pub active: bool,
    /// Not announced to the network
    pub private: bool,
    /// Counterparty
    pub remote_pubkey: Vertex,
}

/// Receives the single result of an in-flight payment
pub type PaymentReceiver = oneshot::Receiver<Result<LndPayment, LndError>>;

/// A connected lnd client
#[async_trait]
pub trait Lnd: Send + Sync {
    /// On-chain balance
    async fn wallet_balance(&self) -> Result<WalletBalance, LndError>;

    /// Create an invoice, returning its hash and encoded payment request
    async fn add_invoice(&self, data: AddInvoiceData) -> Result<(PaymentHash, String), LndError>;

    /// Start paying `invoice`.
    ///
    /// The payment runs in the background and delivers exactly one result on
    /// the returned channel. Dropping the receiver abandons the attempt.
    async fn pay_invoice(
        &self,
        invoice: &str,
        max_fee: Amount,
        outgoing_chan_id: Option<u64>,
    ) -> PaymentReceiver;

    /// Connect to a peer; a `permanent` peer is reconnected by lnd on loss
    async fn connect(&self, peer: Vertex, host: &str, permanent: bool) -> Result<(), LndError>;

    /// Connected peers
    async fn list_peers(&self) -> Result<Vec<LndPeer>, LndError>;

    /// Open a channel and wait for the funding transaction to be published
    async fn open_channel(
        &self,
        peer: Vertex,
        local_amount: Amount,
        push_amount: Amount,
        private: bool,
    ) -> Result<(Txid, u32), LndError>;

    /// Channels matching the filters
    async fn list_channels(
        &self,
        active_only: bool,
        public_only: bool,
    ) -> Result<Vec<LndChannel>, LndError>;
}
