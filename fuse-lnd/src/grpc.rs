use std::future::Future;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use fuse_lightning::bitcoin::hashes::Hash;
use fuse_lightning::bitcoin::{Amount, Txid};
use fuse_lightning::{MilliSatoshi, Network, PaymentHash, Preimage, Vertex};
use log::*;
use tokio::sync::oneshot;
use tonic::metadata::{Ascii, MetadataValue};
use tonic::service::interceptor::InterceptedService;
use tonic::service::Interceptor;
use tonic::transport::{Certificate, Channel, ClientTlsConfig, Endpoint};
use tonic::{Code, Request, Status};

use crate::lnd::{
    AddInvoiceData, Lnd, LndChannel, LndPayment, LndPeer, PaymentReceiver, WalletBalance,
};
use crate::lnrpc::channel_point::FundingTxid;
use crate::lnrpc::fee_limit::Limit;
use crate::lnrpc::lightning_client::LightningClient;
use crate::lnrpc::{self, FeeLimit};
use crate::LndError;

/// How long to wait before asking again about a payment lnd still has in flight
pub const PAYMENT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// The `payment_error` lnd reports when the invoice was settled before
const ALREADY_PAID: &str = "invoice is already paid";
/// The `payment_error` lnd reports while an earlier attempt is unresolved
const IN_TRANSITION: &str = "payment is in transition";

/// The name lnd's TLS certificate is issued for
const TLS_DOMAIN: &str = "localhost";

/// Attaches the macaroon to every request
#[derive(Clone)]
pub struct MacaroonInterceptor {
    macaroon: MetadataValue<Ascii>,
}

impl MacaroonInterceptor {
    /// Build from the raw macaroon file contents
    pub fn new(macaroon: &[u8]) -> Result<Self, LndError> {
        let macaroon = MetadataValue::try_from(hex::encode(macaroon))
            .map_err(|e| LndError::InvalidMacaroon(e.to_string()))?;
        Ok(MacaroonInterceptor { macaroon })
    }
}

impl Interceptor for MacaroonInterceptor {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        request.metadata_mut().insert("macaroon", self.macaroon.clone());
        Ok(request)
    }
}

type Client = LightningClient<InterceptedService<Channel, MacaroonInterceptor>>;

/// An lnd node reached over gRPC
#[derive(Clone)]
pub struct GrpcLnd {
    client: Client,
    network: Network,
}

async fn read_file(path: &Path) -> Result<Vec<u8>, LndError> {
    tokio::fs::read(path).await.map_err(|source| LndError::Io { path: path.to_path_buf(), source })
}

impl GrpcLnd {
    /// Open a TLS channel to lnd and check that it runs on `network`
    pub async fn connect(
        address: &str,
        network: Network,
        tls_path: &Path,
        macaroon_path: &Path,
    ) -> Result<Self, LndError> {
        let cert = read_file(tls_path).await?;
        let macaroon = read_file(macaroon_path).await?;

        let tls = ClientTlsConfig::new()
            .ca_certificate(Certificate::from_pem(cert))
            .domain_name(TLS_DOMAIN);
        let channel =
            Endpoint::from_shared(format!("https://{}", address))?.tls_config(tls)?.connect().await?;

        let client = LightningClient::with_interceptor(channel, MacaroonInterceptor::new(&macaroon)?);
        let lnd = GrpcLnd { client, network };
        lnd.check_network().await?;
        info!("connected to lnd at {} on {}", address, network);
        Ok(lnd)
    }

    async fn check_network(&self) -> Result<(), LndError> {
        let info =
            self.client.clone().get_info(lnrpc::GetInfoRequest {}).await?.into_inner();
        let chain = info.chains.first().ok_or_else(|| LndError::Malformed("no chains".into()))?;
        debug!("lnd {} {} at height {}", info.alias, info.version, info.block_height);
        if chain.network != self.network.as_str() {
            return Err(LndError::NetworkMismatch {
                expected: self.network,
                actual: chain.network.clone(),
            });
        }
        Ok(())
    }
}

fn sats(what: &str, value: i64) -> Result<Amount, LndError> {
    u64::try_from(value).map(Amount::from_sat).map_err(|e| LndError::malformed(what, e))
}

fn msats(what: &str, value: i64) -> Result<MilliSatoshi, LndError> {
    u64::try_from(value).map(MilliSatoshi).map_err(|e| LndError::malformed(what, e))
}

fn to_i64(what: &str, value: u64) -> Result<i64, LndError> {
    i64::try_from(value).map_err(|e| LndError::malformed(what, e))
}

fn vertex(what: &str, hex: &str) -> Result<Vertex, LndError> {
    Vertex::from_str(hex).map_err(|e| LndError::malformed(what, e))
}

fn funding_txid(point: &lnrpc::ChannelPoint) -> Result<Txid, LndError> {
    match &point.funding_txid {
        Some(FundingTxid::FundingTxidBytes(bytes)) => {
            let bytes: [u8; 32] = bytes
                .as_slice()
                .try_into()
                .map_err(|_| LndError::Malformed(format!("txid of {} bytes", bytes.len())))?;
            Ok(Txid::from_byte_array(bytes))
        }
        Some(FundingTxid::FundingTxidStr(s)) => {
            Txid::from_str(s).map_err(|e| LndError::malformed("funding txid", e))
        }
        None => Err(LndError::Malformed("missing funding txid".into())),
    }
}

fn convert_peer(peer: lnrpc::Peer) -> Result<LndPeer, LndError> {
    Ok(LndPeer {
        pubkey: vertex("peer pubkey", &peer.pub_key)?,
        address: peer.address,
        inbound: peer.inbound,
        ping_time: Duration::from_micros(peer.ping_time.max(0) as u64),
        sent: peer.bytes_sent,
        received: peer.bytes_recv,
    })
}

fn convert_channel(channel: lnrpc::Channel) -> Result<LndChannel, LndError> {
    Ok(LndChannel {
        chan_id: channel.chan_id,
        local_balance: sats("local balance", channel.local_balance)?,
        remote_balance: sats("remote balance", channel.remote_balance)?,
        capacity: sats("capacity", channel.capacity)?,
        active: channel.active,
        private: channel.private,
        remote_pubkey: vertex("remote pubkey", &channel.remote_pubkey)?,
    })
}

/// Interpret one `SendPaymentSync` reply.
///
/// `Ok(None)` means the payment is still in flight and should be asked about
/// again.
fn interpret_send_response(
    response: lnrpc::SendResponse,
) -> Result<Option<LndPayment>, LndError> {
    match response.payment_error.as_str() {
        "" => {
            let preimage = Preimage::try_from(response.payment_preimage.as_slice())
                .map_err(|e| LndError::malformed("preimage", e))?;
            let route = response.payment_route.unwrap_or_default();
            let paid_fee = msats("route fee", route.total_fees_msat)?;
            Ok(Some(LndPayment { preimage, paid_fee }))
        }
        ALREADY_PAID => {
            Ok(Some(LndPayment { preimage: Preimage::NULL, paid_fee: MilliSatoshi::ZERO }))
        }
        IN_TRANSITION => Ok(None),
        other => Err(LndError::Payment(other.to_string())),
    }
}

fn send_request(
    invoice: &str,
    max_fee: Amount,
    outgoing_chan_id: Option<u64>,
) -> Result<lnrpc::SendRequest, LndError> {
    let fee_limit = to_i64("max fee", max_fee.to_sat())?;
    Ok(lnrpc::SendRequest {
        payment_request: invoice.to_string(),
        fee_limit: Some(FeeLimit { limit: Some(Limit::Fixed(fee_limit)) }),
        outgoing_chan_id: outgoing_chan_id.unwrap_or(0),
        ..Default::default()
    })
}

async fn payment_loop(
    mut client: Client,
    request: lnrpc::SendRequest,
) -> Result<LndPayment, LndError> {
    loop {
        let response = match client.send_payment_sync(request.clone()).await {
            Ok(response) => response.into_inner(),
            Err(status) if status.code() == Code::Cancelled => return Err(LndError::Cancelled),
            Err(status) => return Err(status.into()),
        };
        match interpret_send_response(response)? {
            Some(payment) => return Ok(payment),
            None => {
                debug!("payment in transition, checking again in {:?}", PAYMENT_POLL_INTERVAL);
                tokio::time::sleep(PAYMENT_POLL_INTERVAL).await;
            }
        }
    }
}

/// Run `task` in the background and deliver its output on the returned
/// channel. The task is dropped as soon as the receiver is.
fn spawn_abandonable<T, F>(task: F) -> oneshot::Receiver<T>
where
    T: Send + 'static,
    F: Future<Output = T> + Send + 'static,
{
    let (mut tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        tokio::select! {
            _ = tx.closed() => debug!("receiver dropped, abandoning background call"),
            output = task => {
                // the receiver may have gone away in the meantime
                let _ = tx.send(output);
            }
        }
    });
    rx
}

#[async_trait]
impl Lnd for GrpcLnd {
    async fn wallet_balance(&self) -> Result<WalletBalance, LndError> {
        let resp =
            self.client.clone().wallet_balance(lnrpc::WalletBalanceRequest {}).await?.into_inner();
        Ok(WalletBalance {
            confirmed: sats("confirmed balance", resp.confirmed_balance)?,
            unconfirmed: sats("unconfirmed balance", resp.unconfirmed_balance)?,
        })
    }

    async fn add_invoice(&self, data: AddInvoiceData) -> Result<(PaymentHash, String), LndError> {
        let request = lnrpc::Invoice {
            memo: data.memo,
            value_msat: to_i64("invoice value", data.value.0)?,
            description_hash: data.description_hash.map(|h| h.to_vec()).unwrap_or_default(),
            ..Default::default()
        };
        let resp = self.client.clone().add_invoice(request).await?.into_inner();
        let hash = PaymentHash::try_from(resp.r_hash.as_slice())
            .map_err(|e| LndError::malformed("r_hash", e))?;
        Ok((hash, resp.payment_request))
    }

    async fn pay_invoice(
        &self,
        invoice: &str,
        max_fee: Amount,
        outgoing_chan_id: Option<u64>,
    ) -> PaymentReceiver {
        let request = send_request(invoice, max_fee, outgoing_chan_id);
        let client = self.client.clone();
        spawn_abandonable(async move {
            let result = match request {
                Ok(request) => payment_loop(client, request).await,
                Err(e) => Err(e),
            };
            if let Err(e) = &result {
                warn!("payment failed: {}", e);
            }
            result
        })
    }

    async fn connect(&self, peer: Vertex, host: &str, permanent: bool) -> Result<(), LndError> {
        let request = lnrpc::ConnectPeerRequest {
            addr: Some(lnrpc::LightningAddress { pubkey: peer.to_string(), host: host.to_string() }),
            perm: permanent,
            timeout: 0,
        };
        self.client.clone().connect_peer(request).await?;
        Ok(())
    }

    async fn list_peers(&self) -> Result<Vec<LndPeer>, LndError> {
        let resp = self
            .client
            .clone()
            .list_peers(lnrpc::ListPeersRequest { latest_error: false })
            .await?
            .into_inner();
        resp.peers.into_iter().map(convert_peer).collect()
    }

    async fn open_channel(
        &self,
        peer: Vertex,
        local_amount: Amount,
        push_amount: Amount,
        private: bool,
    ) -> Result<(Txid, u32), LndError> {
        let request = lnrpc::OpenChannelRequest {
            node_pubkey: peer.as_ref().to_vec(),
            local_funding_amount: to_i64("local amount", local_amount.to_sat())?,
            push_sat: to_i64("push amount", push_amount.to_sat())?,
            private,
            ..Default::default()
        };
        let point = self.client.clone().open_channel_sync(request).await?.into_inner();
        Ok((funding_txid(&point)?, point.output_index))
    }

    async fn list_channels(
        &self,
        active_only: bool,
        public_only: bool,
    ) -> Result<Vec<LndChannel>, LndError> {
        let request = lnrpc::ListChannelsRequest { active_only, public_only, ..Default::default() };
        let resp = self.client.clone().list_channels(request).await?.into_inner();
        resp.channels.into_iter().map(convert_channel).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    const PUBKEY: &str = "03e7156ae33b0a208d0744199163177e909e80176e55d97a2f221ede0f934dd9ad";

    fn send_response(error: &str, preimage: &[u8], fees_msat: i64, amt_msat: i64) -> lnrpc::SendResponse {
        lnrpc::SendResponse {
            payment_error: error.to_string(),
            payment_preimage: preimage.to_vec(),
            payment_route: Some(lnrpc::Route {
                total_fees_msat: fees_msat,
                total_amt_msat: amt_msat,
                ..Default::default()
            }),
            payment_hash: Vec::new(),
        }
    }

    #[test]
    fn send_success_test() {
        let payment =
            interpret_send_response(send_response("", &[5; 32], 1_234, 101_234)).unwrap().unwrap();
        assert_eq!(payment.preimage, Preimage([5; 32]));
        assert_eq!(payment.paid_fee, MilliSatoshi(1_234));
    }

    #[test]
    fn send_already_paid_test() {
        let payment =
            interpret_send_response(send_response(ALREADY_PAID, &[], 0, 0)).unwrap().unwrap();
        assert!(payment.preimage.is_null());
        assert_eq!(payment.paid_fee, MilliSatoshi::ZERO);
    }

    #[test]
    fn send_in_transition_test() {
        let result = interpret_send_response(send_response(IN_TRANSITION, &[], 0, 0)).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn send_failure_test() {
        let err =
            interpret_send_response(send_response("unable to find a path to destination", &[], 0, 0))
                .unwrap_err();
        assert!(matches!(err, LndError::Payment(text) if text == "unable to find a path to destination"));

        let err = interpret_send_response(send_response("", &[1; 31], 0, 0)).unwrap_err();
        assert!(matches!(err, LndError::Malformed(_)));
    }

    #[test]
    fn send_request_test() {
        let request = send_request("lnbcrt1", Amount::from_sat(100), Some(7)).unwrap();
        assert_eq!(request.payment_request, "lnbcrt1");
        assert_eq!(request.outgoing_chan_id, 7);
        assert_eq!(request.fee_limit, Some(FeeLimit { limit: Some(Limit::Fixed(100)) }));
        assert_eq!(send_request("lnbcrt1", Amount::from_sat(1), None).unwrap().outgoing_chan_id, 0);

        let err = send_request("lnbcrt1", Amount::from_sat(u64::MAX), None).unwrap_err();
        assert!(matches!(err, LndError::Malformed(_)));
    }

    /// Reports on `dropped` when the value goes away
    struct DropSignal(Option<oneshot::Sender<()>>);

    impl Drop for DropSignal {
        fn drop(&mut self) {
            if let Some(dropped) = self.0.take() {
                let _ = dropped.send(());
            }
        }
    }

    #[tokio::test]
    async fn spawn_abandonable_delivers_output_test() {
        let rx = spawn_abandonable(async { 7 });
        assert_eq!(rx.await.unwrap(), 7);
    }

    #[tokio::test]
    async fn spawn_abandonable_drops_task_with_receiver_test() {
        let (dropped_tx, dropped_rx) = oneshot::channel();
        let signal = DropSignal(Some(dropped_tx));
        let rx = spawn_abandonable(async move {
            let _signal = signal;
            std::future::pending::<()>().await
        });
        // let the task start waiting before abandoning it
        tokio::task::yield_now().await;
        drop(rx);
        tokio::time::timeout(Duration::from_secs(5), dropped_rx)
            .await
            .expect("task still running after its receiver was dropped")
            .unwrap();
    }

    #[test]
    fn convert_channel_test() {
        let channel = convert_channel(lnrpc::Channel {
            active: true,
            remote_pubkey: PUBKEY.to_string(),
            channel_point: "00".repeat(32) + ":1",
            chan_id: 123_456_789,
            capacity: 1_000_000,
            local_balance: 600_000,
            remote_balance: 390_000,
            private: true,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(channel.chan_id, 123_456_789);
        assert_eq!(channel.capacity, Amount::from_sat(1_000_000));
        assert_eq!(channel.local_balance, Amount::from_sat(600_000));
        assert_eq!(channel.remote_balance, Amount::from_sat(390_000));
        assert_eq!(channel.remote_pubkey.to_string(), PUBKEY);
        assert!(channel.active && channel.private);

        let bad = lnrpc::Channel { remote_pubkey: "abcd".to_string(), ..Default::default() };
        assert!(matches!(convert_channel(bad), Err(LndError::Malformed(_))));
        let negative = lnrpc::Channel {
            remote_pubkey: PUBKEY.to_string(),
            capacity: -1,
            ..Default::default()
        };
        assert!(matches!(convert_channel(negative), Err(LndError::Malformed(_))));
    }

    #[test]
    fn convert_peer_test() {
        let peer = convert_peer(lnrpc::Peer {
            pub_key: PUBKEY.to_string(),
            address: "127.0.0.1:9735".to_string(),
            bytes_sent: 10,
            bytes_recv: 20,
            inbound: true,
            ping_time: 1_500,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(peer.address, "127.0.0.1:9735");
        assert_eq!(peer.ping_time, Duration::from_micros(1_500));
        assert_eq!((peer.sent, peer.received), (10, 20));
        assert!(peer.inbound);
    }

    #[test]
    fn funding_txid_test() {
        let mut bytes = [0u8; 32];
        bytes[0] = 1;
        let point = lnrpc::ChannelPoint {
            funding_txid: Some(FundingTxid::FundingTxidBytes(bytes.to_vec())),
            output_index: 1,
        };
        let txid = funding_txid(&point).unwrap();
        // lnd sends txid bytes in internal order, display is reversed
        assert_eq!(txid.to_string(), "00".repeat(31) + "01");

        let point = lnrpc::ChannelPoint {
            funding_txid: Some(FundingTxid::FundingTxidStr(txid.to_string())),
            output_index: 0,
        };
        assert_eq!(funding_txid(&point).unwrap(), txid);
        assert!(funding_txid(&lnrpc::ChannelPoint::default()).is_err());
    }

    #[test]
    fn macaroon_interceptor_test() {
        let mut interceptor = MacaroonInterceptor::new(&[0x02, 0x01, 0xff]).unwrap();
        let request = interceptor.call(Request::new(())).unwrap();
        assert_eq!(request.metadata().get("macaroon").unwrap().to_str().unwrap(), "0201ff");
    }
}
