use core::fmt;
use core::str::FromStr;
use core::time::Duration;

use bitcoin::hashes::Hash;
use lightning_invoice::Bolt11Invoice;
use log::debug;

use crate::types::{MilliSatoshi, Network, PaymentHash, Vertex};
use crate::Error;

const URI_PREFIX: &str = "lightning:";

/// What an invoice commits to as its purpose
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvoiceDescription {
    /// A human-readable memo
    Memo(String),
    /// The SHA-256 of a longer description, e.g. LNURL-pay metadata
    Hash([u8; 32]),
}

/// A decoded BOLT-11 payment request.
///
/// Only constructed through [`Invoice::decode`], so the encoded string is
/// always well formed and for the network the caller asked for.
#[derive(Clone, PartialEq, Eq)]
pub struct Invoice {
    encoded: String,
    network: Network,
    payment_hash: PaymentHash,
    amount: Option<MilliSatoshi>,
    description: InvoiceDescription,
    timestamp: Duration,
    expiry: Duration,
    payee: Vertex,
}

impl Invoice {
    /// Decode a payment request, requiring it to be for `network`.
    ///
    /// Surrounding whitespace and a `lightning:` URI prefix are ignored.
    pub fn decode(encoded: &str, network: Network) -> Result<Invoice, Error> {
        let trimmed = encoded.trim();
        let trimmed = match trimmed.get(..URI_PREFIX.len()) {
            Some(prefix) if prefix.eq_ignore_ascii_case(URI_PREFIX) => &trimmed[URI_PREFIX.len()..],
            _ => trimmed,
        };
        let bolt11 =
            Bolt11Invoice::from_str(trimmed).map_err(|e| Error::InvoiceDecode(e.to_string()))?;

        let actual = Network::from_currency(bolt11.currency());
        if actual != network {
            return Err(Error::WrongNetwork { expected: network, actual });
        }

        let payee = bolt11.payee_pub_key().cloned().unwrap_or_else(|| bolt11.recover_payee_pub_key());
        let payment_hash = PaymentHash(bolt11.payment_hash().to_byte_array());
        let amount = bolt11.amount_milli_satoshis().map(MilliSatoshi);
        let timestamp = bolt11.duration_since_epoch();
        let expiry = bolt11.expiry_time();

        let signed = bolt11.into_signed_raw();
        let raw = signed.raw_invoice();
        let description = match (raw.description(), raw.description_hash()) {
            (_, Some(hash)) => InvoiceDescription::Hash(hash.0.to_byte_array()),
            (Some(memo), None) => InvoiceDescription::Memo(memo.to_string()),
            // a valid invoice carries exactly one of the two
            (None, None) => InvoiceDescription::Memo(String::new()),
        };

        debug!("decoded invoice {} for {:?} on {}", payment_hash, amount, network);
        Ok(Invoice {
            encoded: trimmed.to_string(),
            network,
            payment_hash,
            amount,
            description,
            timestamp,
            expiry,
            payee: payee.into(),
        })
    }

    /// The payment request as it was decoded, without any URI prefix
    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    /// The network the invoice is payable on
    pub fn network(&self) -> Network {
        self.network
    }

    /// The payment hash
    pub fn payment_hash(&self) -> PaymentHash {
        self.payment_hash
    }

    /// The requested amount, `None` for an open-amount invoice
    pub fn amount(&self) -> Option<MilliSatoshi> {
        self.amount
    }

    /// Memo or description hash
    pub fn description(&self) -> &InvoiceDescription {
        &self.description
    }

    /// Creation time as duration since the UNIX epoch
    pub fn timestamp(&self) -> Duration {
        self.timestamp
    }

    /// Validity period, relative to [`Invoice::timestamp`]
    pub fn expiry(&self) -> Duration {
        self.expiry
    }

    /// The node to be paid
    pub fn payee(&self) -> Vertex {
        self.payee
    }
}

impl fmt::Display for Invoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded)
    }
}

impl fmt::Debug for Invoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invoice")
            .field("network", &self.network)
            .field("payment_hash", &self.payment_hash)
            .field("amount", &self.amount)
            .field("description", &self.description)
            .field("payee", &self.payee)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test_utils::{make_test_invoice, make_test_invoice_with_hash, test_payee};
    use test_log::test;

    // from https://github.com/lightning/bolts/blob/master/11-payment-encoding.md#examples
    const DONATION: &str = "lnbc1pvjluezsp5zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zygspp5qqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqypqdpl2pkx2ctnv5sxxmmwwd5kgetjypeh2ursdae8g6twvus8g6rfwvs8qun0dfjkxaq9qrsgq357wnc5r2ueh7ck6q93dj32dlqnls087fxdwk8qakdyafkq3yap9us6v52vjjsrvywa6rt52cm9r9zqt8r2t7mlcwspyetp5h2tztugp9lfyql";

    #[test]
    fn decode_bolt_example_test() {
        let invoice = Invoice::decode(DONATION, Network::Mainnet).unwrap();
        assert_eq!(invoice.amount(), None);
        assert_eq!(
            invoice.payment_hash().to_string(),
            "0001020304050607080900010203040506070809000102030405060708090102"
        );
        assert_eq!(
            invoice.payee().to_string(),
            "03e7156ae33b0a208d0744199163177e909e80176e55d97a2f221ede0f934dd9ad"
        );
        assert_eq!(
            invoice.description(),
            &InvoiceDescription::Memo("Please consider supporting this project".to_string())
        );
        assert_eq!(invoice.timestamp(), Duration::from_secs(1496314658));
    }

    #[test]
    fn decode_uri_prefix_test() {
        let uri = format!("  lightning:{}\n", DONATION);
        let invoice = Invoice::decode(&uri, Network::Mainnet).unwrap();
        assert_eq!(invoice.encoded(), DONATION);
        assert_eq!(invoice.to_string(), DONATION);
    }

    #[test]
    fn decode_wrong_network_test() {
        let err = Invoice::decode(DONATION, Network::Testnet).unwrap_err();
        assert!(matches!(
            err,
            Error::WrongNetwork { expected: Network::Testnet, actual: Network::Mainnet }
        ));
    }

    #[test]
    fn decode_garbage_test() {
        assert!(matches!(Invoice::decode("lnbc1nope", Network::Mainnet), Err(Error::InvoiceDecode(_))));
        assert!(matches!(Invoice::decode("", Network::Mainnet), Err(Error::InvoiceDecode(_))));
    }

    #[test]
    fn decode_generated_test() {
        for network in Network::ALL {
            let encoded = make_test_invoice(network, Some(21_000), "coffee", 3);
            let invoice = Invoice::decode(&encoded, network).unwrap();
            assert_eq!(invoice.network(), network);
            assert_eq!(invoice.amount(), Some(MilliSatoshi(21_000)));
            assert_eq!(invoice.description(), &InvoiceDescription::Memo("coffee".to_string()));
            assert_eq!(invoice.payment_hash(), crate::Preimage([3; 32]).payment_hash());
            assert_eq!(invoice.payee(), test_payee());
        }
    }

    #[test]
    fn decode_description_hash_test() {
        let hash = [7u8; 32];
        let encoded = make_test_invoice_with_hash(Network::Regtest, None, hash, 1);
        let invoice = Invoice::decode(&encoded, Network::Regtest).unwrap();
        assert_eq!(invoice.description(), &InvoiceDescription::Hash(hash));
        assert_eq!(invoice.amount(), None);
        assert_eq!(invoice.timestamp(), Duration::from_secs(1_700_000_000));
    }
}
