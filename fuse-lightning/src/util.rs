/// Invoice builders for tests
#[cfg(any(test, feature = "test_utils"))]
#[allow(missing_docs)]
pub mod test_utils {
    use core::time::Duration;

    use bitcoin::hashes::{sha256, Hash};
    use bitcoin::secp256k1::{PublicKey, Secp256k1, SecretKey};
    use lightning_invoice::{InvoiceBuilder, PaymentSecret};

    use crate::types::{Network, Vertex};

    fn payee_key() -> SecretKey {
        SecretKey::from_slice(&[42; 32]).unwrap()
    }

    /// The node id every test invoice is signed by
    pub fn test_payee() -> Vertex {
        PublicKey::from_secret_key(&Secp256k1::new(), &payee_key()).into()
    }

    /// A signed invoice with a memo, paying to the preimage `[x; 32]`
    pub fn make_test_invoice(
        network: Network,
        amount_msat: Option<u64>,
        memo: &str,
        x: u8,
    ) -> String {
        let payment_hash = sha256::Hash::hash(&[x; 32]);
        let builder = InvoiceBuilder::new(network.currency())
            .description(memo.into())
            .payment_hash(payment_hash)
            .payment_secret(PaymentSecret([x; 32]))
            .duration_since_epoch(Duration::from_secs(1_700_000_000))
            .min_final_cltv_expiry_delta(144);
        let builder = match amount_msat {
            Some(amt) => builder.amount_milli_satoshis(amt),
            None => builder,
        };
        builder
            .build_signed(|hash| Secp256k1::new().sign_ecdsa_recoverable(hash, &payee_key()))
            .unwrap()
            .to_string()
    }

    /// A signed invoice committing to a description hash
    pub fn make_test_invoice_with_hash(
        network: Network,
        amount_msat: Option<u64>,
        description_hash: [u8; 32],
        x: u8,
    ) -> String {
        let payment_hash = sha256::Hash::hash(&[x; 32]);
        let builder = InvoiceBuilder::new(network.currency())
            .description_hash(sha256::Hash::from_byte_array(description_hash))
            .payment_hash(payment_hash)
            .payment_secret(PaymentSecret([x; 32]))
            .duration_since_epoch(Duration::from_secs(1_700_000_000))
            .min_final_cltv_expiry_delta(144);
        let builder = match amount_msat {
            Some(amt) => builder.amount_milli_satoshis(amt),
            None => builder,
        };
        builder
            .build_signed(|hash| Secp256k1::new().sign_ecdsa_recoverable(hash, &payee_key()))
            .unwrap()
            .to_string()
    }
}
