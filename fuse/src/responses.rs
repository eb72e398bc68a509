//! JSON payloads returned to HTTP clients.
//!
//! Every payload implements [`Render`]. Payloads with invariants check them
//! in [`Render::validate`], and again inside their `Serialize` impl so that a
//! payload which violates them can never be written out.

use fuse_lightning::bitcoin::{Amount, Txid};
use fuse_lightning::lnurl::{self, Metadata};
use fuse_lightning::{Channel, Invoice, PaymentResult, Peer, Preimage, Vertex};
use serde::ser::Error as _;
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::util::{as_display, as_hex, as_sat};

/// The `tag` of an LNURL-pay parameters response
pub const PAY_REQUEST_TAG: &str = "payRequest";

/// Errors preventing a payload from being emitted
#[derive(Debug, Error)]
pub enum ResponseError {
    /// LNURL-pay bounds are inverted
    #[error("maxSendable must be larger than minSendable ({max} < {min})")]
    SendableRange {
        /// minSendable, millisatoshis
        min: i64,
        /// maxSendable, millisatoshis
        max: i64,
    },
    /// LNURL encoding failed
    #[error(transparent)]
    Lnurl(#[from] fuse_lightning::Error),
    /// Serialization failed
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

/// A payload that can be sent to a client
pub trait Render: Serialize {
    /// Check the payload's invariants
    fn validate(&self) -> Result<(), ResponseError> {
        Ok(())
    }

    /// Validate and serialize compactly
    fn render(&self) -> Result<String, ResponseError> {
        self.validate()?;
        Ok(serde_json::to_string(self)?)
    }

    /// Validate and serialize for humans
    fn render_pretty(&self) -> Result<String, ResponseError> {
        self.validate()?;
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// LNURL-pay parameters, the first response of the pay flow
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LnurlPayResponse {
    /// Where the wallet asks for an invoice
    pub callback: String,
    /// Upper bound, millisatoshis
    pub max_sendable: i64,
    /// Lower bound, millisatoshis
    pub min_sendable: i64,
    /// Encoded [`Metadata`], committed to by the callback invoice
    pub metadata: String,
    /// Always [`PAY_REQUEST_TAG`] for LUD-06 services
    pub tag: String,
}

impl LnurlPayResponse {
    /// Build the response. The sendable range is checked when rendering.
    pub fn new(callback: &str, min: i64, max: i64, metadata: &Metadata, tag: &str) -> Self {
        LnurlPayResponse {
            callback: callback.to_string(),
            max_sendable: max,
            min_sendable: min,
            metadata: metadata.encode(),
            tag: tag.to_string(),
        }
    }
}

impl Render for LnurlPayResponse {
    fn validate(&self) -> Result<(), ResponseError> {
        if self.max_sendable < self.min_sendable {
            return Err(ResponseError::SendableRange {
                min: self.min_sendable,
                max: self.max_sendable,
            });
        }
        Ok(())
    }
}

impl Serialize for LnurlPayResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Wire<'a> {
            callback: &'a str,
            max_sendable: i64,
            min_sendable: i64,
            metadata: &'a str,
            tag: &'a str,
        }

        self.validate().map_err(S::Error::custom)?;
        Wire {
            callback: &self.callback,
            max_sendable: self.max_sendable,
            min_sendable: self.min_sendable,
            metadata: &self.metadata,
            tag: &self.tag,
        }
        .serialize(serializer)
    }
}

/// LNURL-pay callback answer carrying the invoice
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LnurlPayCallbackResponse {
    /// Encoded payment request
    pub pr: String,
    /// Route hints, always present and currently always empty
    pub routes: Vec<String>,
}

impl LnurlPayCallbackResponse {
    /// Answer with `invoice`
    pub fn new(invoice: &Invoice) -> Self {
        LnurlPayCallbackResponse { pr: invoice.encoded().to_string(), routes: Vec::new() }
    }
}

impl Render for LnurlPayCallbackResponse {}

/// A shareable LUD-01 code for an LNURL endpoint
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LnurlpCodeResponse {
    /// bech32 `LNURL1...` string
    pub code: String,
}

impl LnurlpCodeResponse {
    /// Encode `url`
    pub fn new(url: &str) -> Result<Self, ResponseError> {
        Ok(LnurlpCodeResponse { code: lnurl::encode_url(url)? })
    }
}

impl Render for LnurlpCodeResponse {}

/// A freshly issued invoice
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CreateInvoiceResponse {
    /// Encoded payment request
    pub invoice: String,
}

impl CreateInvoiceResponse {
    /// Wrap `invoice`
    pub fn new(invoice: &Invoice) -> Self {
        CreateInvoiceResponse { invoice: invoice.encoded().to_string() }
    }
}

impl Render for CreateInvoiceResponse {}

/// A settled payment
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PayResponse {
    /// Proof of payment
    #[serde(serialize_with = "as_hex")]
    pub preimage: Preimage,
    /// Fee in satoshis, fractional part kept
    pub paid_fee: f64,
}

impl PayResponse {
    /// Report `result`
    pub fn new(result: &PaymentResult) -> Self {
        PayResponse { preimage: result.preimage, paid_fee: result.paid_fee.to_satoshis_f64() }
    }
}

impl Render for PayResponse {}

/// The funding outpoint of a new channel
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OpenChannelResponse {
    /// Funding txid in the usual reversed hex
    #[serde(serialize_with = "as_display")]
    pub hash: Txid,
    /// Funding output index
    pub index: u32,
}

impl OpenChannelResponse {
    /// Report the funding outpoint
    pub fn new(hash: Txid, index: u32) -> Self {
        OpenChannelResponse { hash, index }
    }
}

impl Render for OpenChannelResponse {}

/// One channel, amounts in satoshis
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChannelResponse {
    /// Short channel id
    pub id: u64,
    /// Our balance
    #[serde(serialize_with = "as_sat")]
    pub local_balance: Amount,
    /// Their balance
    #[serde(serialize_with = "as_sat")]
    pub remote_balance: Amount,
    /// Funding amount
    #[serde(serialize_with = "as_sat")]
    pub capacity: Amount,
    /// Usable for routing right now
    pub active: bool,
    /// Not announced to the network
    pub private: bool,
    /// Counterparty
    #[serde(serialize_with = "as_hex")]
    pub remote_pubkey: Vertex,
}

impl From<&Channel> for ChannelResponse {
    fn from(c: &Channel) -> Self {
        ChannelResponse {
            id: c.id,
            local_balance: c.local_balance,
            remote_balance: c.remote_balance,
            capacity: c.capacity,
            active: c.active,
            private: c.private,
            remote_pubkey: c.remote_pubkey,
        }
    }
}

/// Channel listing; `channels` is an empty array, never null, when there are none
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ListChannelsResponse {
    /// The channels
    pub channels: Vec<ChannelResponse>,
}

impl ListChannelsResponse {
    /// List `channels` in order
    pub fn new(channels: &[Channel]) -> Self {
        ListChannelsResponse { channels: channels.iter().map(ChannelResponse::from).collect() }
    }
}

impl Render for ListChannelsResponse {}

/// One connected peer
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PeerResponse {
    /// Remote identity
    #[serde(serialize_with = "as_hex")]
    pub pubkey: Vertex,
    /// Remote address
    pub address: String,
    /// Remote initiated the connection
    pub inbound: bool,
    /// Ping round trip in microseconds
    pub ping_time_us: u64,
    /// Bytes sent
    pub sent: u64,
    /// Bytes received
    pub received: u64,
}

impl From<&Peer> for PeerResponse {
    fn from(p: &Peer) -> Self {
        PeerResponse {
            pubkey: p.pubkey,
            address: p.address.clone(),
            inbound: p.inbound,
            ping_time_us: u64::try_from(p.ping_time.as_micros()).unwrap_or(u64::MAX),
            sent: p.sent,
            received: p.received,
        }
    }
}

/// Peer listing
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ListPeersResponse {
    /// The peers
    pub peers: Vec<PeerResponse>,
}

impl ListPeersResponse {
    /// List `peers` in order
    pub fn new(peers: &[Peer]) -> Self {
        ListPeersResponse { peers: peers.iter().map(PeerResponse::from).collect() }
    }
}

impl Render for ListPeersResponse {}

/// Confirmed on-chain balance
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WalletBalanceResponse {
    /// Confirmed funds, satoshis
    #[serde(serialize_with = "as_sat")]
    pub confirmed: Amount,
}

impl WalletBalanceResponse {
    /// Report `confirmed`
    pub fn new(confirmed: Amount) -> Self {
        WalletBalanceResponse { confirmed }
    }
}

impl Render for WalletBalanceResponse {}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use fuse_lightning::bitcoin::hashes::Hash;
    use fuse_lightning::util::test_utils::{make_test_invoice, make_test_invoice_with_hash};
    use fuse_lightning::{InvoiceDescription, MilliSatoshi, Network};
    use serde_json::{json, Value};
    use test_log::test;

    use super::*;

    const PUBKEY: &str = "03e7156ae33b0a208d0744199163177e909e80176e55d97a2f221ede0f934dd9ad";

    fn parse(rendered: &str) -> Value {
        serde_json::from_str(rendered).unwrap()
    }

    #[test]
    fn lnurlp_params_test() {
        let metadata = Metadata::text("coffee");
        let response = LnurlPayResponse::new(
            "https://example.com/lnurlp/callback",
            1_000,
            1_000_000,
            &metadata,
            PAY_REQUEST_TAG,
        );
        assert_eq!(
            response.render().unwrap(),
            r#"{"callback":"https://example.com/lnurlp/callback","maxSendable":1000000,"minSendable":1000,"metadata":"[[\"text/plain\",\"coffee\"]]","tag":"payRequest"}"#
        );
    }

    #[test]
    fn lnurlp_params_range_test() {
        let metadata = Metadata::text("coffee");
        for (min, max) in [(0, 0), (1, 2), (5, 5), (1_000, i64::MAX)] {
            let response = LnurlPayResponse::new("cb", min, max, &metadata, PAY_REQUEST_TAG);
            let value = parse(&response.render().unwrap());
            assert_eq!(value["minSendable"], json!(min));
            assert_eq!(value["maxSendable"], json!(max));
        }
        for (min, max) in [(1, 0), (1_000, 999), (0, -1)] {
            let response = LnurlPayResponse::new("cb", min, max, &metadata, PAY_REQUEST_TAG);
            assert!(matches!(
                response.render(),
                Err(ResponseError::SendableRange { min: m, max: x }) if m == min && x == max
            ));
            // plain serialization cannot bypass the check
            assert!(serde_json::to_string(&response).is_err());
        }
    }

    #[test]
    fn lnurlp_callback_test() {
        let encoded = make_test_invoice(Network::Regtest, Some(5_000), "coffee", 2);
        let invoice = Invoice::decode(&encoded, Network::Regtest).unwrap();
        let response = LnurlPayCallbackResponse::new(&invoice);
        assert_eq!(parse(&response.render().unwrap()), json!({"pr": encoded, "routes": []}));
    }

    #[test]
    fn lnurlp_invoice_binds_metadata_test() {
        let metadata = Metadata::text("coffee");
        let params = LnurlPayResponse::new("cb", 1, 10, &metadata, PAY_REQUEST_TAG);
        let encoded = make_test_invoice_with_hash(
            Network::Regtest,
            Some(5),
            metadata.description_hash(),
            2,
        );
        let invoice = Invoice::decode(&encoded, Network::Regtest).unwrap();
        let wallet_view = parse(&params.render().unwrap());
        let hashed = fuse_lightning::bitcoin::hashes::sha256::Hash::hash(
            wallet_view["metadata"].as_str().unwrap().as_bytes(),
        );
        assert_eq!(invoice.description(), &InvoiceDescription::Hash(hashed.to_byte_array()));
    }

    #[test]
    fn lnurlp_code_test() {
        let response = LnurlpCodeResponse::new("https://example.com/lnurlp/alice").unwrap();
        assert!(response.code.starts_with("LNURL1"));
        assert_eq!(
            lnurl::decode_url(&response.code).unwrap(),
            "https://example.com/lnurlp/alice"
        );
    }

    #[test]
    fn create_invoice_test() {
        let encoded = make_test_invoice(Network::Testnet, None, "open", 4);
        let invoice = Invoice::decode(&encoded, Network::Testnet).unwrap();
        assert_eq!(
            parse(&CreateInvoiceResponse::new(&invoice).render().unwrap()),
            json!({ "invoice": encoded })
        );
    }

    #[test]
    fn pay_test() {
        let result = PaymentResult { preimage: Preimage([0xab; 32]), paid_fee: MilliSatoshi(1_500) };
        assert_eq!(
            parse(&PayResponse::new(&result).render().unwrap()),
            json!({ "preimage": "ab".repeat(32), "paid_fee": 1.5 })
        );
    }

    #[test]
    fn open_channel_test() {
        let mut bytes = [0u8; 32];
        bytes[0] = 0xff;
        let response = OpenChannelResponse::new(Txid::from_byte_array(bytes), 2);
        assert_eq!(
            parse(&response.render().unwrap()),
            json!({ "hash": "00".repeat(31) + "ff", "index": 2 })
        );
    }

    #[test]
    fn list_channels_test() {
        assert_eq!(ListChannelsResponse::new(&[]).render().unwrap(), r#"{"channels":[]}"#);

        let channel = Channel {
            id: 42,
            local_balance: Amount::from_sat(700),
            remote_balance: Amount::from_sat(300),
            capacity: Amount::from_sat(1_000),
            active: true,
            private: false,
            remote_pubkey: PUBKEY.parse().unwrap(),
        };
        assert_eq!(
            parse(&ListChannelsResponse::new(&[channel]).render().unwrap()),
            json!({ "channels": [{
                "id": 42,
                "local_balance": 700,
                "remote_balance": 300,
                "capacity": 1000,
                "active": true,
                "private": false,
                "remote_pubkey": PUBKEY,
            }]})
        );
    }

    #[test]
    fn list_peers_test() {
        let peer = Peer {
            address: "10.0.0.1:9735".to_string(),
            inbound: true,
            ping_time: Duration::from_millis(3),
            pubkey: PUBKEY.parse().unwrap(),
            sent: 1,
            received: 2,
        };
        assert_eq!(
            parse(&ListPeersResponse::new(&[peer]).render().unwrap()),
            json!({ "peers": [{
                "pubkey": PUBKEY,
                "address": "10.0.0.1:9735",
                "inbound": true,
                "ping_time_us": 3000,
                "sent": 1,
                "received": 2,
            }]})
        );
    }

    #[test]
    fn wallet_balance_test() {
        assert_eq!(
            WalletBalanceResponse::new(Amount::from_sat(12_345)).render().unwrap(),
            r#"{"confirmed":12345}"#
        );
    }
}
