use async_trait::async_trait;
use fuse_lightning::bitcoin::{Amount, Txid};
use fuse_lightning::{
    Channel, Error, Invoice, LightningProvider, MilliSatoshi, Network, PaymentResult, Peer, Vertex,
};
use log::*;

use crate::config::LndArgs;
use crate::connect::{connect_with_retry, RetryPolicy};
use crate::lnd::{AddInvoiceData, Lnd, LndChannel, LndPeer};
use crate::{GrpcLnd, LndError};

/// A [`LightningProvider`] backed by an lnd node
pub struct LndProvider<L: Lnd = GrpcLnd> {
    lnd: L,
    network: Network,
    max_fee: Amount,
}

impl LndProvider<GrpcLnd> {
    /// Connect to lnd, retrying with the default policy while it starts up
    pub async fn connect(args: &LndArgs) -> Result<Self, LndError> {
        Self::connect_with_policy(args, RetryPolicy::default()).await
    }

    /// Connect to lnd with a custom retry policy
    pub async fn connect_with_policy(args: &LndArgs, policy: RetryPolicy) -> Result<Self, LndError> {
        info!("connecting to lnd at {} ({})", args.lnd_address, args.network);
        let lnd = connect_with_retry(policy, || {
            GrpcLnd::connect(&args.lnd_address, args.network, &args.tls_path, &args.macaroon_path)
        })
        .await?;
        Ok(LndProvider::new(lnd, args.network, args.max_fee()))
    }
}

impl<L: Lnd> LndProvider<L> {
    /// Wrap an already connected client
    pub fn new(lnd: L, network: Network, max_fee: Amount) -> Self {
        LndProvider { lnd, network, max_fee }
    }

    /// Routing fee ceiling applied to payments
    pub fn max_fee(&self) -> Amount {
        self.max_fee
    }
}

impl From<LndPeer> for Peer {
    fn from(p: LndPeer) -> Self {
        Peer {
            address: p.address,
            inbound: p.inbound,
            ping_time: p.ping_time,
            pubkey: p.pubkey,
            sent: p.sent,
            received: p.received,
        }
    }
}

impl From<LndChannel> for Channel {
    fn from(c: LndChannel) -> Self {
        Channel {
            id: c.chan_id,
            local_balance: c.local_balance,
            remote_balance: c.remote_balance,
            capacity: c.capacity,
            active: c.active,
            private: c.private,
            remote_pubkey: c.remote_pubkey,
        }
    }
}

#[async_trait]
impl<L: Lnd> LightningProvider for LndProvider<L> {
    fn network(&self) -> Network {
        self.network
    }

    async fn wallet_balance(&self) -> Result<Amount, Error> {
        debug!("ENTER wallet_balance");
        let balance = self.lnd.wallet_balance().await?;
        Ok(balance.confirmed)
    }

    async fn add_invoice(
        &self,
        value: MilliSatoshi,
        memo: &str,
        description_hash: &[u8],
    ) -> Result<Invoice, Error> {
        debug!("ENTER add_invoice {}", value);
        let mut data = AddInvoiceData { value, ..Default::default() };
        if description_hash.is_empty() {
            data.memo = memo.to_string();
        } else {
            let hash = <[u8; 32]>::try_from(description_hash).map_err(|_| {
                Error::InvalidHash(format!(
                    "description hash must be 32 bytes, got {}",
                    description_hash.len()
                ))
            })?;
            data.description_hash = Some(hash);
        }

        let (_, encoded) = self.lnd.add_invoice(data).await?;
        let invoice = Invoice::decode(&encoded, self.network)?;
        debug!("REPLY add_invoice {}", invoice.payment_hash());
        Ok(invoice)
    }

    async fn pay_invoice(&self, invoice: &Invoice) -> Result<PaymentResult, Error> {
        debug!("ENTER pay_invoice {}", invoice.payment_hash());
        let receiver = self.lnd.pay_invoice(invoice.encoded(), self.max_fee, None).await;
        let payment = receiver.await.map_err(|_| Error::Cancelled)??;
        if payment.preimage.is_null() {
            info!("invoice {} was already paid", invoice.payment_hash());
            return Err(Error::InvoiceAlreadyPaid);
        }
        debug!("REPLY pay_invoice {} fee {}", invoice.payment_hash(), payment.paid_fee);
        Ok(PaymentResult { preimage: payment.preimage, paid_fee: payment.paid_fee })
    }

    async fn list_peers(&self) -> Result<Vec<Peer>, Error> {
        debug!("ENTER list_peers");
        let peers = self.lnd.list_peers().await?;
        Ok(peers.into_iter().map(Peer::from).collect())
    }

    async fn connect_peer(&self, peer: Vertex, host: &str) -> Result<(), Error> {
        debug!("ENTER connect_peer {}@{}", peer, host);
        self.lnd.connect(peer, host, true).await?;
        Ok(())
    }

    async fn open_channel(
        &self,
        peer: Vertex,
        local_amount: Amount,
        push_amount: Amount,
        private: bool,
    ) -> Result<(Txid, u32), Error> {
        debug!("ENTER open_channel {} {} push {}", peer, local_amount, push_amount);
        let outpoint = self.lnd.open_channel(peer, local_amount, push_amount, private).await?;
        debug!("REPLY open_channel {}:{}", outpoint.0, outpoint.1);
        Ok(outpoint)
    }

    async fn list_channels(
        &self,
        active_only: bool,
        public_only: bool,
    ) -> Result<Vec<Channel>, Error> {
        debug!("ENTER list_channels active_only={} public_only={}", active_only, public_only);
        let channels = self.lnd.list_channels(active_only, public_only).await?;
        Ok(channels.into_iter().map(Channel::from).collect())
    }
}
