use bech32::{FromBase32, ToBase32, Variant};
use bitcoin::hashes::{sha256, Hash};

use crate::Error;

/// Human readable part of a bech32 LNURL
pub const LNURL_HRP: &str = "lnurl";

/// Entry type of the plain text description every LNURL-pay service must provide
pub const TEXT_PLAIN: &str = "text/plain";

/// LNURL-pay metadata: an ordered list of `[type, content]` entries.
///
/// The encoded form is what wallets hash and compare against the invoice's
/// description hash, so it must not change between the pay-parameters
/// response and the invoice.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Metadata(Vec<(String, String)>);

impl Metadata {
    /// Empty metadata
    pub fn new() -> Self {
        Metadata(Vec::new())
    }

    /// Metadata with a single `text/plain` description
    pub fn text(description: &str) -> Self {
        let mut metadata = Metadata::new();
        metadata.push(TEXT_PLAIN, description);
        metadata
    }

    /// Append an entry, keeping insertion order
    pub fn push(&mut self, kind: &str, content: &str) {
        self.0.push((kind.to_string(), content.to_string()));
    }

    /// Compact JSON encoding, e.g. `[["text/plain","coffee"]]`
    pub fn encode(&self) -> String {
        // a list of string pairs always serializes
        serde_json::to_string(&self.0).unwrap_or_default()
    }

    /// SHA-256 of [`Metadata::encode`], to be committed to in the invoice
    pub fn description_hash(&self) -> [u8; 32] {
        sha256::Hash::hash(self.encode().as_bytes()).to_byte_array()
    }
}

/// Encode a URL as a LUD-01 `LNURL1...` string
pub fn encode_url(url: &str) -> Result<String, Error> {
    let encoded = bech32::encode(LNURL_HRP, url.as_bytes().to_base32(), Variant::Bech32)
        .map_err(|e| Error::Lnurl(e.to_string()))?;
    Ok(encoded.to_uppercase())
}

/// Decode a LUD-01 LNURL back into its URL
pub fn decode_url(lnurl: &str) -> Result<String, Error> {
    let lnurl = lnurl.trim();
    let lnurl = lnurl
        .strip_prefix("lightning:")
        .or_else(|| lnurl.strip_prefix("LIGHTNING:"))
        .unwrap_or(lnurl);
    let (hrp, data, variant) = bech32::decode(lnurl).map_err(|e| Error::Lnurl(e.to_string()))?;
    if hrp != LNURL_HRP || variant != Variant::Bech32 {
        return Err(Error::Lnurl(format!("unexpected prefix {} ({:?})", hrp, variant)));
    }
    let bytes = Vec::<u8>::from_base32(&data).map_err(|e| Error::Lnurl(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| Error::Lnurl(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn metadata_encoding_test() {
        let mut metadata = Metadata::text("Pay to \"fuse\"");
        metadata.push("text/identifier", "alice@example.com");
        assert_eq!(
            metadata.encode(),
            r#"[["text/plain","Pay to \"fuse\""],["text/identifier","alice@example.com"]]"#
        );
        assert_eq!(metadata.encode(), metadata.clone().encode());
        assert_eq!(
            metadata.description_hash(),
            sha256::Hash::hash(metadata.encode().as_bytes()).to_byte_array()
        );
    }

    #[test]
    fn empty_metadata_test() {
        assert_eq!(Metadata::new().encode(), "[]");
    }

    #[test]
    fn lud01_test() {
        // from LUD-01
        let url = "https://service.com/api?q=3fc3645b439ce8e7f2553a69e5267081d96dcd340693afabe04be7b0ccd178df";
        let lnurl = "LNURL1DP68GURN8GHJ7UM9WFMXJCM99E3K7MF0V9CXJ0M385EKVCENXC6R2C35XVUKXEFCV5MKVV34X5EKZD3EV56NYD3HXQURZEPEXEJXXEPNXSCRVWFNV9NXZCN9XQ6XYEFHVGCXXCMYXYMNSERXFQ5FNS";
        assert_eq!(encode_url(url).unwrap(), lnurl);
        assert_eq!(decode_url(lnurl).unwrap(), url);
        assert_eq!(decode_url(&format!("lightning:{}", lnurl.to_lowercase())).unwrap(), url);
    }

    #[test]
    fn decode_wrong_hrp_test() {
        let other = bech32::encode("lnbc", b"x".to_base32(), Variant::Bech32).unwrap();
        assert!(matches!(decode_url(&other), Err(Error::Lnurl(_))));
    }
}
