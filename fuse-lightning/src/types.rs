use core::fmt;
use core::str::FromStr;
use std::time::Duration;

use bitcoin::hashes::{sha256, Hash};
use bitcoin::secp256k1::PublicKey;
use bitcoin::Amount;
use lightning_invoice::Currency;

use crate::Error;

/// The chain a node operates on.
///
/// Names follow the node's own conventions (`mainnet`, `testnet`, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Network {
    /// Bitcoin mainnet
    Mainnet,
    /// Bitcoin testnet
    Testnet,
    /// Local regression test chain
    Regtest,
    /// btcd simulation network
    Simnet,
    /// Signet
    Signet,
}

impl Network {
    /// All supported networks
    pub const ALL: [Network; 5] =
        [Network::Mainnet, Network::Testnet, Network::Regtest, Network::Simnet, Network::Signet];

    /// The network name as used by the node RPC
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Regtest => "regtest",
            Network::Simnet => "simnet",
            Network::Signet => "signet",
        }
    }

    /// The BOLT-11 currency prefix for this network
    pub fn currency(&self) -> Currency {
        match self {
            Network::Mainnet => Currency::Bitcoin,
            Network::Testnet => Currency::BitcoinTestnet,
            Network::Regtest => Currency::Regtest,
            Network::Simnet => Currency::Simnet,
            Network::Signet => Currency::Signet,
        }
    }

    /// The network a BOLT-11 currency prefix belongs to
    pub fn from_currency(currency: Currency) -> Self {
        match currency {
            Currency::Bitcoin => Network::Mainnet,
            Currency::BitcoinTestnet => Network::Testnet,
            Currency::Regtest => Network::Regtest,
            Currency::Simnet => Network::Simnet,
            Currency::Signet => Network::Signet,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" | "bitcoin" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "regtest" => Ok(Network::Regtest),
            "simnet" => Ok(Network::Simnet),
            "signet" => Ok(Network::Signet),
            _ => Err(Error::UnknownNetwork(s.to_string())),
        }
    }
}

/// A node identity: the 33-byte compressed public key
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Vertex(pub [u8; Vertex::LEN]);

impl Vertex {
    /// Length of a compressed public key
    pub const LEN: usize = 33;
}

impl TryFrom<&[u8]> for Vertex {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; Vertex::LEN] = bytes.try_into().map_err(|_| {
            Error::InvalidVertex(format!("expected {} bytes, got {}", Vertex::LEN, bytes.len()))
        })?;
        Ok(Vertex(arr))
    }
}

impl From<PublicKey> for Vertex {
    fn from(key: PublicKey) -> Self {
        Vertex(key.serialize())
    }
}

impl FromStr for Vertex {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| Error::InvalidVertex(e.to_string()))?;
        Vertex::try_from(bytes.as_slice())
    }
}

impl AsRef<[u8]> for Vertex {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vertex({})", self)
    }
}

/// An amount of millisatoshis, the unit Lightning invoices and routing fees use
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MilliSatoshi(pub u64);

impl MilliSatoshi {
    /// Zero
    pub const ZERO: MilliSatoshi = MilliSatoshi(0);

    /// Satoshis as a float, keeping the sub-satoshi part
    pub fn to_satoshis_f64(&self) -> f64 {
        self.0 as f64 / 1000.0
    }
}

impl fmt::Display for MilliSatoshi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} msat", self.0)
    }
}

fn parse_32(bytes: &[u8]) -> Result<[u8; 32], Error> {
    bytes
        .try_into()
        .map_err(|_| Error::InvalidHash(format!("expected 32 bytes, got {}", bytes.len())))
}

/// The SHA-256 hash of a payment preimage
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PaymentHash(pub [u8; 32]);

impl TryFrom<&[u8]> for PaymentHash {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        parse_32(bytes).map(PaymentHash)
    }
}

impl fmt::Display for PaymentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for PaymentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PaymentHash({})", self)
    }
}

/// A payment preimage, the proof of payment
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Preimage(pub [u8; 32]);

impl Preimage {
    /// The reserved all-zero value.
    ///
    /// A backend returns this when a payment resolved without revealing a
    /// preimage, which happens when the invoice was settled by an earlier
    /// payment. It is never a valid proof of payment.
    pub const NULL: Preimage = Preimage([0; 32]);

    /// Whether this is the reserved all-zero value
    pub fn is_null(&self) -> bool {
        *self == Preimage::NULL
    }

    /// The payment hash this preimage unlocks
    pub fn payment_hash(&self) -> PaymentHash {
        PaymentHash(sha256::Hash::hash(&self.0).to_byte_array())
    }
}

impl TryFrom<&[u8]> for Preimage {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        parse_32(bytes).map(Preimage)
    }
}

impl AsRef<[u8]> for Preimage {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Preimage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Preimage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Preimage({})", self)
    }
}

/// A successfully settled outgoing payment
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaymentResult {
    /// Proof of payment, never [`Preimage::NULL`]
    pub preimage: Preimage,
    /// Routing fee paid
    pub paid_fee: MilliSatoshi,
}

/// A connected remote node
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Peer {
    /// Network address of the connection
    pub address: String,
    /// Whether the remote side initiated the connection
    pub inbound: bool,
    /// Last measured ping round trip
    pub ping_time: Duration,
    /// Remote identity
    pub pubkey: Vertex,
    /// Bytes sent to the peer
    pub sent: u64,
    /// Bytes received from the peer
    pub received: u64,
}

/// A payment channel.
///
/// Balances are reported by the backend as-is; `local_balance +
/// remote_balance <= capacity` is expected but not checked here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Channel {
    /// Short channel id
    pub id: u64,
    /// Our side of the channel
    pub local_balance: Amount,
    /// Their side of the channel
    pub remote_balance: Amount,
    /// Total funding amount
    pub capacity: Amount,
    /// Whether the channel can currently route
    pub active: bool,
    /// Whether the channel is unannounced
    pub private: bool,
    /// The counterparty
    pub remote_pubkey: Vertex,
}
