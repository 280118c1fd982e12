//! # Key Management
//!
//! secp256k1 keys in the hex conventions the network has always used, and
//! the Bitcoin addresses derived from them.
//!
//! ## The compression flag
//!
//! A private key travels as hex. 64 characters means "derive the
//! uncompressed public key"; 66 characters ending in `01` means "derive the
//! compressed one". The flag matters because the address is a hash of the
//! *serialized* public key, so one secret owns two different addresses.
//! Verification code has to accept either (see [`PublicKey::matches`]).
//!
//! ## Security considerations
//!
//! - Key generation goes through `OsRng`.
//! - `Debug` on [`PrivateKey`] prints the public half only.
//! - Error messages never echo key material.

use crate::config::{COMPRESSED_KEY_SUFFIX, MAINNET_ADDRESS_VERSION};
use crate::crypto::hash::hash160;
use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::SecretKey;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Length of a private key in the uncompressed hex convention.
const PRIVATE_KEY_HEX_LEN: usize = 64;

/// Length of a private key in the compressed hex convention (`...01`).
const COMPRESSED_PRIVATE_KEY_HEX_LEN: usize = 66;

/// Errors that can occur during key operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// The private key hex does not follow either length convention, is not
    /// hex, or is not a valid scalar.
    #[error("invalid private key encoding: {0}")]
    InvalidKeyEncoding(&'static str),

    /// The public key bytes are not a SEC1 point on secp256k1.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(&'static str),

    /// The signer refused the digest. k256 only does this for degenerate input.
    #[error("signing failed")]
    SigningFailed,
}

// ---------------------------------------------------------------------------
// PrivateKey
// ---------------------------------------------------------------------------

/// A secp256k1 private key plus the compression flag it was encoded with.
///
/// Deliberately not `Serialize`: turning a secret into a string should be
/// an explicit [`to_hex`](Self::to_hex) call, not a side effect of logging
/// a struct.
#[derive(Clone)]
pub struct PrivateKey {
    secret: SecretKey,
    compressed: bool,
}

impl PrivateKey {
    /// Generate a fresh key from the OS RNG, in the 64-hex convention.
    pub fn generate() -> Self {
        Self {
            secret: SecretKey::random(&mut OsRng),
            compressed: false,
        }
    }

    /// Parse a private key in either hex convention.
    ///
    /// ```
    /// use stackid::crypto::PrivateKey;
    ///
    /// let hex = "a5c61c6ca7b3e7e55edee68566aeab22e4da26baa285c7bd10e8d2218aa3b22901";
    /// let key = PrivateKey::from_hex(hex).unwrap();
    /// assert!(key.is_compressed());
    /// assert_eq!(key.to_hex(), hex);
    /// ```
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        if !hex_str.is_ascii() {
            return Err(KeyError::InvalidKeyEncoding("not hex"));
        }
        let compressed = match hex_str.len() {
            PRIVATE_KEY_HEX_LEN => false,
            COMPRESSED_PRIVATE_KEY_HEX_LEN if hex_str.ends_with(COMPRESSED_KEY_SUFFIX) => true,
            COMPRESSED_PRIVATE_KEY_HEX_LEN => {
                return Err(KeyError::InvalidKeyEncoding(
                    "66-character keys must end with the 01 compression flag",
                ))
            }
            _ => {
                return Err(KeyError::InvalidKeyEncoding(
                    "expected 64 or 66 hex characters",
                ))
            }
        };

        let bytes = hex::decode(&hex_str[..PRIVATE_KEY_HEX_LEN])
            .map_err(|_| KeyError::InvalidKeyEncoding("not hex"))?;
        let secret = SecretKey::from_slice(&bytes)
            .map_err(|_| KeyError::InvalidKeyEncoding("not a valid secp256k1 scalar"))?;

        Ok(Self { secret, compressed })
    }

    /// Hex-encode the key, appending `01` when the compression flag is set.
    pub fn to_hex(&self) -> String {
        let mut out = hex::encode(self.secret.to_bytes());
        if self.compressed {
            out.push_str(COMPRESSED_KEY_SUFFIX);
        }
        out
    }

    /// Whether this key derives the compressed public key.
    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// The public key, serialized according to the compression flag.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            inner: self.secret.public_key(),
            compressed: self.compressed,
        }
    }

    /// Address of [`public_key`](Self::public_key).
    pub fn address(&self) -> String {
        self.public_key().address()
    }

    /// ECDSA-sign a 32-byte digest. The signature is low-S normalized.
    pub fn sign_prehash(&self, digest: &[u8; 32]) -> Result<Signature, KeyError> {
        let signing_key = SigningKey::from(&self.secret);
        signing_key
            .sign_prehash(digest)
            .map_err(|_| KeyError::SigningFailed)
    }

    pub(crate) fn secret(&self) -> &SecretKey {
        &self.secret
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("public_key", &self.public_key().to_hex())
            .field("compressed", &self.compressed)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// PublicKey
// ---------------------------------------------------------------------------

/// Both address encodings of one public key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressForms {
    pub compressed: String,
    pub uncompressed: String,
}

/// A secp256k1 public key that remembers how it was serialized.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    inner: k256::PublicKey,
    compressed: bool,
}

impl PublicKey {
    /// Parse a hex SEC1 public key (33-byte compressed or 65-byte uncompressed).
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str).map_err(|_| KeyError::InvalidPublicKey("not hex"))?;
        Self::from_sec1_bytes(&bytes)
    }

    /// Parse raw SEC1 bytes.
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let inner = k256::PublicKey::from_sec1_bytes(bytes)
            .map_err(|_| KeyError::InvalidPublicKey("not a point on secp256k1"))?;
        Ok(Self {
            inner,
            compressed: bytes.len() == 33,
        })
    }

    /// SEC1 serialization in this key's own form.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.serialize(self.compressed)
    }

    /// SEC1 serialization in the requested form.
    pub fn serialize(&self, compressed: bool) -> Vec<u8> {
        self.inner.to_encoded_point(compressed).as_bytes().to_vec()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// Mainnet P2PKH address of the key as serialized.
    pub fn address(&self) -> String {
        encode_address(&self.to_bytes())
    }

    /// Addresses of both serializations, whichever one this key uses.
    pub fn address_forms(&self) -> AddressForms {
        AddressForms {
            compressed: encode_address(&self.serialize(true)),
            uncompressed: encode_address(&self.serialize(false)),
        }
    }

    /// Does `expected` name this key?
    ///
    /// Accepts the raw hex key (any case) or either derived address.
    pub fn matches(&self, expected: &str) -> bool {
        if expected.eq_ignore_ascii_case(&self.to_hex()) {
            return true;
        }
        let forms = self.address_forms();
        expected == forms.compressed || expected == forms.uncompressed
    }

    /// Verify an ECDSA signature over a 32-byte digest.
    pub fn verify_prehash(&self, digest: &[u8; 32], signature: &Signature) -> bool {
        VerifyingKey::from(&self.inner)
            .verify_prehash(digest, signature)
            .is_ok()
    }

    pub(crate) fn as_k256(&self) -> &k256::PublicKey {
        &self.inner
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// Hex-level helpers
// ---------------------------------------------------------------------------

fn encode_address(public_key_bytes: &[u8]) -> String {
    let mut payload = Vec::with_capacity(21);
    payload.push(MAINNET_ADDRESS_VERSION);
    payload.extend_from_slice(&hash160(public_key_bytes));
    bs58::encode(payload).with_check().into_string()
}

/// Derive the public key hex from a private key hex.
///
/// 64-hex input yields a 130-hex uncompressed key, `...01` input yields a
/// 66-hex compressed key.
pub fn derive_public_key(private_key_hex: &str) -> Result<String, KeyError> {
    Ok(PrivateKey::from_hex(private_key_hex)?.public_key().to_hex())
}

/// Base58check address of a hex public key.
pub fn public_key_to_address(public_key_hex: &str) -> Result<String, KeyError> {
    Ok(PublicKey::from_hex(public_key_hex)?.address())
}

/// Compressed and uncompressed addresses of a hex public key.
pub fn address_forms(public_key_hex: &str) -> Result<AddressForms, KeyError> {
    Ok(PublicKey::from_hex(public_key_hex)?.address_forms())
}

/// A fresh private key in the 64-hex convention.
pub fn make_private_key() -> String {
    PrivateKey::generate().to_hex()
}

/// `n` bytes from the OS CSPRNG.
pub fn get_entropy(n: usize) -> Vec<u8> {
    let mut buf = vec![0u8; n];
    OsRng.fill_bytes(&mut buf);
    buf
}
