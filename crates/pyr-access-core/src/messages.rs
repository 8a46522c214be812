//! Wire messages of the access-grant protocol.
//!
//! ```text
//! Claimant                         discovery topic <contentID>            Publisher
//!   |-- AccessClaim {contentID, signature, block} ------------------------->|
//!   |                                                 verify freshness      |
//!   |                                                 recover signer        |
//!   |                                                 check token balance   |
//!   |<------------------- GrantPackage {key, addresses, content, contentID} |
//!   |                      (direct channel, one framed write)               |
//! ```
//!
//! Denied claims produce no message at all.

use serde::{Deserialize, Serialize};

use crate::crypto::ClaimSignature;
use crate::error::CoreError;
use crate::types::ContentId;

/// Maximum age, in ledger blocks, of the block a claim may be signed against.
///
/// This is part of the wire contract: claimants sign the latest block they
/// see, and publishers reject claims older than this many blocks.
pub const DEFAULT_FRESHNESS_WINDOW: u64 = 20;

/// Direct-channel protocol name used to deliver grant packages.
pub const GRANT_PROTOCOL: &str = "/sharedBucket";

/// Check whether a claim signed at `signed_block` is acceptable at `current_block`.
///
/// Claims that reference a block ahead of the ledger's head are never fresh.
pub fn is_fresh(current_block: u64, signed_block: u64, window: u64) -> bool {
    match current_block.checked_sub(signed_block) {
        Some(age) => age <= window,
        None => false,
    }
}

/// A block-bound claim that the sender owns an entitlement token for `content_id`.
///
/// The sender's identity is not part of the payload; it comes from the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaim {
    /// The content the sender wants access to.
    #[serde(rename = "contentID")]
    pub content_id: ContentId,
    /// Signature over the hash of block `block`.
    pub signature: ClaimSignature,
    /// Number of the signed block.
    pub block: u64,
}

impl AccessClaim {
    /// Serialize to JSON bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CoreError> {
        serde_json::to_vec(self).map_err(|e| CoreError::EncodingError(e.to_string()))
    }

    /// Deserialize from JSON bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        serde_json::from_slice(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))
    }
}

/// Storage-bucket credentials released to a verified claimant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantPackage {
    /// Bucket access key.
    pub key: String,
    /// Reachability addresses of the bucket.
    pub addresses: Vec<String>,
    /// Bucket name.
    pub content: String,
    /// The content this grant answers.
    #[serde(rename = "contentID")]
    pub content_id: ContentId,
}

impl GrantPackage {
    /// Serialize to JSON bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CoreError> {
        serde_json::to_vec(self).map_err(|e| CoreError::EncodingError(e.to_string()))
    }

    /// Deserialize from JSON bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        serde_json::from_slice(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;
    use crate::types::BlockHash;
    use proptest::prelude::*;

    #[test]
    fn test_freshness_boundary() {
        assert!(is_fresh(1020, 1000, DEFAULT_FRESHNESS_WINDOW));
        assert!(!is_fresh(1021, 1000, DEFAULT_FRESHNESS_WINDOW));
        assert!(is_fresh(1000, 1000, DEFAULT_FRESHNESS_WINDOW));
    }

    #[test]
    fn test_future_block_is_not_fresh() {
        assert!(!is_fresh(1000, 1001, DEFAULT_FRESHNESS_WINDOW));
    }

    #[test]
    fn test_claim_wire_field_names() {
        let keypair = Keypair::from_seed(&[5u8; 32]);
        let claim = AccessClaim {
            content_id: ContentId::new("0xABC"),
            signature: keypair.sign_hash(&BlockHash::from_bytes([1u8; 32])),
            block: 1000,
        };

        let value: serde_json::Value = serde_json::from_slice(&claim.to_bytes().unwrap()).unwrap();
        assert_eq!(value["contentID"], "0xABC");
        assert_eq!(value["block"], 1000);
        assert!(value["signature"].as_str().unwrap().starts_with("0x"));
    }

    #[test]
    fn test_grant_package_wire_shape() {
        let package = GrantPackage {
            key: "k1".into(),
            addresses: vec!["/ip/1".into()],
            content: "0xABC".into(),
            content_id: ContentId::new("0xABC"),
        };

        let value: serde_json::Value =
            serde_json::from_slice(&package.to_bytes().unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "key": "k1",
                "addresses": ["/ip/1"],
                "content": "0xABC",
                "contentID": "0xABC",
            })
        );
    }

    #[test]
    fn test_claim_rejects_malformed_signature() {
        let raw = br#"{"contentID":"0xABC","signature":"0x1234","block":5}"#;
        assert!(matches!(
            AccessClaim::from_bytes(raw),
            Err(CoreError::DecodingError(_))
        ));
    }

    proptest! {
        #[test]
        fn freshness_is_monotonic(signed in 0u64..1_000_000, age in 0u64..200) {
            let current = signed + age;
            prop_assert_eq!(is_fresh(current, signed, DEFAULT_FRESHNESS_WINDOW), age <= 20);
        }
    }
}
