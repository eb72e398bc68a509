use async_trait::async_trait;
use bitcoin::{Amount, Txid};

use crate::invoice::Invoice;
use crate::types::{Channel, MilliSatoshi, Network, PaymentResult, Peer, Vertex};
use crate::Error;

/// The capabilities every Lightning node backend exposes.
///
/// Callers hold an `Arc<dyn LightningProvider>` and never learn which node
/// implementation is behind it. Every call is a future; dropping it aborts the
/// in-flight backend call. Backend failures are passed through as
/// [`Error::Backend`] and are not retried.
#[async_trait]
pub trait LightningProvider: Send + Sync {
    /// The network the provider's node operates on
    fn network(&self) -> Network;

    /// Confirmed on-chain wallet balance, unconfirmed funds excluded
    async fn wallet_balance(&self) -> Result<Amount, Error>;

    /// Issue an invoice for `value`.
    ///
    /// A non-empty `description_hash` is committed to instead of `memo`, and
    /// the memo is then not sent at all.
    async fn add_invoice(
        &self,
        value: MilliSatoshi,
        memo: &str,
        description_hash: &[u8],
    ) -> Result<Invoice, Error>;

    /// Pay an invoice and wait for the attempt to resolve.
    ///
    /// Returns [`Error::InvoiceAlreadyPaid`] if the node reports the invoice
    /// was settled by an earlier payment.
    async fn pay_invoice(&self, invoice: &Invoice) -> Result<PaymentResult, Error>;

    /// Currently connected peers
    async fn list_peers(&self) -> Result<Vec<Peer>, Error>;

    /// Connect to `peer` at `host`
    async fn connect_peer(&self, peer: Vertex, host: &str) -> Result<(), Error>;

    /// Open a channel to `peer`, returning the funding outpoint
    async fn open_channel(
        &self,
        peer: Vertex,
        local_amount: Amount,
        push_amount: Amount,
        private: bool,
    ) -> Result<(Txid, u32), Error>;

    /// List channels, optionally restricted to active and/or public ones
    async fn list_channels(&self, active_only: bool, public_only: bool)
        -> Result<Vec<Channel>, Error>;
}
