//! Signing primitives for ownership claims.
//!
//! A claim signature binds a ledger account to a block hash. The signature
//! carries the signer's Ed25519 public key so the account address can be
//! recovered from `(hash, signature)` alone, which is what the verification
//! engine needs.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;
use crate::types::{Address, BlockHash};

/// Domain separator prepended to every signed block hash.
const CLAIM_DOMAIN: &[u8] = b"pyr-claim-v0:";

/// A 32-byte Ed25519 public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey(pub [u8; 32]);

impl PublicKey {
    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The ledger account controlled by this key.
    pub fn address(&self) -> Address {
        Address::from_public_key(&self.0)
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", &self.to_hex()[..16])
    }
}

/// Signature over a block hash, recoverable to the signing account.
///
/// Encoded on the wire as `0x` + hex(public_key || signature).
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClaimSignature {
    public_key: [u8; 32],
    signature: [u8; 64],
}

impl ClaimSignature {
    /// Length of the raw encoding in bytes.
    pub const ENCODED_LEN: usize = 96;

    /// Recover the account that signed `hash`.
    ///
    /// Fails if the signature does not verify against the embedded key.
    pub fn recover(&self, hash: &BlockHash) -> Result<Address, CoreError> {
        let verifying_key =
            VerifyingKey::from_bytes(&self.public_key).map_err(|_| CoreError::InvalidPublicKey)?;
        let sig = Signature::from_bytes(&self.signature);

        verifying_key
            .verify(&signed_message(hash), &sig)
            .map_err(|_| CoreError::InvalidSignature)?;

        Ok(Address::from_public_key(&self.public_key))
    }

    /// Convert to `0x`-prefixed hex.
    pub fn to_hex(&self) -> String {
        let mut raw = Vec::with_capacity(Self::ENCODED_LEN);
        raw.extend_from_slice(&self.public_key);
        raw.extend_from_slice(&self.signature);
        format!("0x{}", hex::encode(raw))
    }

    /// Parse from hex, with or without the `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s))?;
        if bytes.len() != Self::ENCODED_LEN {
            return Err(CoreError::InvalidSignature);
        }
        let mut public_key = [0u8; 32];
        let mut signature = [0u8; 64];
        public_key.copy_from_slice(&bytes[..32]);
        signature.copy_from_slice(&bytes[32..]);
        Ok(Self {
            public_key,
            signature,
        })
    }
}

impl fmt::Debug for ClaimSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClaimSignature({}...)", &self.to_hex()[..18])
    }
}

impl TryFrom<String> for ClaimSignature {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

impl From<ClaimSignature> for String {
    fn from(sig: ClaimSignature) -> Self {
        sig.to_hex()
    }
}

fn signed_message(hash: &BlockHash) -> Vec<u8> {
    let mut msg = Vec::with_capacity(CLAIM_DOMAIN.len() + 32);
    msg.extend_from_slice(CLAIM_DOMAIN);
    msg.extend_from_slice(hash.as_bytes());
    msg
}

/// A ledger account keypair.
///
/// This wraps ed25519-dalek's SigningKey.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            signing_key: SigningKey::generate(&mut rng),
        }
    }

    /// Create from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Get the public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.signing_key.verifying_key().to_bytes())
    }

    /// The ledger account this keypair controls.
    pub fn address(&self) -> Address {
        self.public_key().address()
    }

    /// Sign a block hash, producing a recoverable claim signature.
    pub fn sign_hash(&self, hash: &BlockHash) -> ClaimSignature {
        let sig = self.signing_key.sign(&signed_message(hash));
        ClaimSignature {
            public_key: self.public_key().0,
            signature: sig.to_bytes(),
        }
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({})", self.address())
    }
}
