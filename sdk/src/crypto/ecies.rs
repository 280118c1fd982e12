//! # ECIES
//!
//! Encrypt a small secret (an app private key, a session token, a file)
//! to a secp256k1 public key. The construction matches what deployed
//! wallets and hubs already read, so none of its parameters are negotiable:
//!
//! 1. Generate an ephemeral key and do ECDH with the recipient. Keep the
//!    x-coordinate of the shared point.
//! 2. `SHA-512(shared_x)`: first 32 bytes are the AES key, last 32 the MAC key.
//! 3. AES-256-CBC with PKCS#7 padding under a random 16-byte IV.
//! 4. `HMAC-SHA256(mac_key, iv || ephemeral_pk_compressed || ciphertext)`.
//!
//! ## Wire format
//!
//! ```json
//! {"iv": "..", "ephemeralPK": "..", "cipherText": "..", "mac": "..", "wasString": true}
//! ```
//!
//! Every field except `wasString` is lowercase hex.
//!
//! ## Decryption order
//!
//! The MAC is recomputed and compared in constant time before a single
//! block is decrypted. A bad MAC means no plaintext, partial or otherwise.

use crate::crypto::hash::sha512;
use crate::crypto::keys::{KeyError, PrivateKey, PublicKey};
use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::SecretKey;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;
type HmacSha256 = Hmac<Sha256>;

const IV_LENGTH: usize = 16;

/// Errors from ECIES encryption and decryption.
#[derive(Debug, Error)]
pub enum EciesError {
    #[error(transparent)]
    Key(#[from] KeyError),

    /// A cipher object field is not valid hex.
    #[error("malformed cipher object: field `{0}` is not hex")]
    MalformedCipherObject(&'static str),

    /// The stored MAC does not match the recomputed one. Wrong key or
    /// tampered ciphertext; no plaintext is released.
    #[error("MAC validation failed")]
    MacValidation,

    /// The MAC matched but the padding did not. Only reachable if the
    /// sender itself produced garbage.
    #[error("decryption failed")]
    Decrypt,

    /// AES or HMAC rejected the derived key material.
    #[error("invalid key or IV length")]
    InvalidLength,

    /// `wasString` was set but the plaintext is not UTF-8.
    #[error("decrypted payload marked as a string is not UTF-8")]
    NotUtf8,
}

/// The JSON-serializable result of [`encrypt_ecies`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CipherObject {
    pub iv: String,
    #[serde(rename = "ephemeralPK")]
    pub ephemeral_pk: String,
    #[serde(rename = "cipherText")]
    pub cipher_text: String,
    pub mac: String,
    #[serde(rename = "wasString")]
    pub was_string: bool,
}

/// Plaintext going into or coming out of ECIES.
///
/// Text and bytes are tracked separately because the wire format records
/// which one the sender had.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plaintext {
    Text(String),
    Bytes(Vec<u8>),
}

impl Plaintext {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Plaintext::Text(s) => s.as_bytes(),
            Plaintext::Bytes(b) => b,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Plaintext::Text(s) => s.into_bytes(),
            Plaintext::Bytes(b) => b,
        }
    }

    /// The text, if the sender encrypted text.
    pub fn into_text(self) -> Option<String> {
        match self {
            Plaintext::Text(s) => Some(s),
            Plaintext::Bytes(_) => None,
        }
    }

    fn is_text(&self) -> bool {
        matches!(self, Plaintext::Text(_))
    }
}

impl From<&str> for Plaintext {
    fn from(value: &str) -> Self {
        Plaintext::Text(value.to_string())
    }
}

impl From<String> for Plaintext {
    fn from(value: String) -> Self {
        Plaintext::Text(value)
    }
}

impl From<Vec<u8>> for Plaintext {
    fn from(value: Vec<u8>) -> Self {
        Plaintext::Bytes(value)
    }
}

impl From<&[u8]> for Plaintext {
    fn from(value: &[u8]) -> Self {
        Plaintext::Bytes(value.to_vec())
    }
}

// ---------------------------------------------------------------------------
// Key schedule
// ---------------------------------------------------------------------------

struct SharedKeys {
    encryption: [u8; 32],
    mac: [u8; 32],
}

fn derive_shared_keys(secret: &SecretKey, public: &k256::PublicKey) -> SharedKeys {
    let shared = k256::ecdh::diffie_hellman(secret.to_nonzero_scalar(), public.as_affine());
    let digest = sha512(shared.raw_secret_bytes().as_slice());

    let mut encryption = [0u8; 32];
    let mut mac = [0u8; 32];
    encryption.copy_from_slice(&digest[..32]);
    mac.copy_from_slice(&digest[32..]);
    SharedKeys { encryption, mac }
}

fn mac_over(
    mac_key: &[u8; 32],
    iv: &[u8],
    ephemeral_pk: &[u8],
    cipher_text: &[u8],
) -> Result<HmacSha256, EciesError> {
    let mut mac =
        <HmacSha256 as Mac>::new_from_slice(mac_key).map_err(|_| EciesError::InvalidLength)?;
    mac.update(iv);
    mac.update(ephemeral_pk);
    mac.update(cipher_text);
    Ok(mac)
}

fn decode_field(value: &str, field: &'static str) -> Result<Vec<u8>, EciesError> {
    hex::decode(value).map_err(|_| EciesError::MalformedCipherObject(field))
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Encrypt `plaintext` to the hex public key `public_key_hex`.
///
/// ```
/// use stackid::crypto::{decrypt_ecies, encrypt_ecies, PrivateKey, Plaintext};
///
/// let key = PrivateKey::generate();
/// let cipher = encrypt_ecies(&key.public_key().to_hex(), "hello").unwrap();
/// let plain = decrypt_ecies(&key.to_hex(), &cipher).unwrap();
/// assert_eq!(plain, Plaintext::Text("hello".into()));
/// ```
pub fn encrypt_ecies(
    public_key_hex: &str,
    plaintext: impl Into<Plaintext>,
) -> Result<CipherObject, EciesError> {
    let plaintext = plaintext.into();
    let recipient = PublicKey::from_hex(public_key_hex)?;

    let ephemeral = SecretKey::random(&mut OsRng);
    let ephemeral_pk = ephemeral.public_key().to_encoded_point(true);
    let keys = derive_shared_keys(&ephemeral, recipient.as_k256());

    let mut iv = [0u8; IV_LENGTH];
    OsRng.fill_bytes(&mut iv);

    let cipher_text = Aes256CbcEnc::new_from_slices(&keys.encryption, &iv)
        .map_err(|_| EciesError::InvalidLength)?
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

    let mac = mac_over(&keys.mac, &iv, ephemeral_pk.as_bytes(), &cipher_text)?
        .finalize()
        .into_bytes();

    Ok(CipherObject {
        iv: hex::encode(iv),
        ephemeral_pk: hex::encode(ephemeral_pk.as_bytes()),
        cipher_text: hex::encode(cipher_text),
        mac: hex::encode(mac),
        was_string: plaintext.is_text(),
    })
}

/// Decrypt a [`CipherObject`] with the hex private key it was encrypted to.
///
/// Fails with [`EciesError::MacValidation`] before decrypting anything if
/// the MAC does not check out.
pub fn decrypt_ecies(private_key_hex: &str, cipher: &CipherObject) -> Result<Plaintext, EciesError> {
    let private_key = PrivateKey::from_hex(private_key_hex)?;

    let iv = decode_field(&cipher.iv, "iv")?;
    let ephemeral_bytes = decode_field(&cipher.ephemeral_pk, "ephemeralPK")?;
    let cipher_text = decode_field(&cipher.cipher_text, "cipherText")?;
    let stored_mac = decode_field(&cipher.mac, "mac")?;
    if iv.len() != IV_LENGTH {
        return Err(EciesError::MalformedCipherObject("iv"));
    }

    let ephemeral = PublicKey::from_sec1_bytes(&ephemeral_bytes)?;
    let keys = derive_shared_keys(private_key.secret(), ephemeral.as_k256());

    mac_over(&keys.mac, &iv, &ephemeral_bytes, &cipher_text)?
        .verify_slice(&stored_mac)
        .map_err(|_| EciesError::MacValidation)?;

    let decryptor = Aes256CbcDec::new_from_slices(&keys.encryption, &iv)
        .map_err(|_| EciesError::InvalidLength)?;
    let plain = decryptor
        .decrypt_padded_vec_mut::<Pkcs7>(&cipher_text)
        .map_err(|_| EciesError::Decrypt)?;

    if cipher.was_string {
        String::from_utf8(plain)
            .map(Plaintext::Text)
            .map_err(|_| EciesError::NotUtf8)
    } else {
        Ok(Plaintext::Bytes(plain))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keypair(compressed: bool) -> (String, String) {
        let key = PrivateKey::generate();
        let hex = if compressed {
            format!("{}01", key.to_hex())
        } else {
            key.to_hex()
        };
        let public = PrivateKey::from_hex(&hex).unwrap().public_key().to_hex();
        (hex, public)
    }

    #[test]
    fn test_text_round_trip() {
        let (private, public) = keypair(true);
        let cipher = encrypt_ecies(&public, "the app private key").unwrap();
        assert!(cipher.was_string);
        let plain = decrypt_ecies(&private, &cipher).unwrap();
        assert_eq!(plain.into_text().as_deref(), Some("the app private key"));
    }

    #[test]
    fn test_bytes_round_trip_to_uncompressed_key() {
        let (private, public) = keypair(false);
        let data: Vec<u8> = (0u8..=255).collect();
        let cipher = encrypt_ecies(&public, data.clone()).unwrap();
        assert!(!cipher.was_string);
        assert_eq!(decrypt_ecies(&private, &cipher).unwrap(), Plaintext::Bytes(data));
    }

    #[test]
    fn test_empty_plaintext_pads_to_one_block() {
        let (private, public) = keypair(true);
        let cipher = encrypt_ecies(&public, "").unwrap();
        assert_eq!(cipher.cipher_text.len(), 32);
        assert_eq!(
            decrypt_ecies(&private, &cipher).unwrap(),
            Plaintext::Text(String::new())
        );
    }

    #[test]
    fn test_corrupted_mac_fails_before_decrypting() {
        let (private, public) = keypair(true);
        let mut cipher = encrypt_ecies(&public, "secret").unwrap();
        let mut mac = hex::decode(&cipher.mac).unwrap();
        mac[0] ^= 0x01;
        cipher.mac = hex::encode(mac);
        assert!(matches!(
            decrypt_ecies(&private, &cipher),
            Err(EciesError::MacValidation)
        ));
    }

    #[test]
    fn test_corrupted_ciphertext_is_a_mac_failure() {
        let (private, public) = keypair(true);
        let mut cipher = encrypt_ecies(&public, "secret").unwrap();
        let mut ct = hex::decode(&cipher.cipher_text).unwrap();
        let last = ct.len() - 1;
        ct[last] ^= 0x80;
        cipher.cipher_text = hex::encode(ct);
        assert!(matches!(
            decrypt_ecies(&private, &cipher),
            Err(EciesError::MacValidation)
        ));
    }

    #[test]
    fn test_wrong_recipient_key_fails_mac() {
        let (_, public) = keypair(true);
        let (other_private, _) = keypair(true);
        let cipher = encrypt_ecies(&public, "secret").unwrap();
        assert!(matches!(
            decrypt_ecies(&other_private, &cipher),
            Err(EciesError::MacValidation)
        ));
    }

    #[test]
    fn test_ephemeral_key_is_compressed_and_fresh() {
        let (_, public) = keypair(false);
        let a = encrypt_ecies(&public, "x").unwrap();
        let b = encrypt_ecies(&public, "x").unwrap();
        assert_eq!(a.ephemeral_pk.len(), 66);
        assert_ne!(a.ephemeral_pk, b.ephemeral_pk);
        assert_ne!(a.iv, b.iv);
    }

    #[test]
    fn test_wire_field_names() {
        let (_, public) = keypair(true);
        let cipher = encrypt_ecies(&public, "x").unwrap();
        let json = serde_json::to_value(&cipher).unwrap();
        for field in ["iv", "ephemeralPK", "cipherText", "mac", "wasString"] {
            assert!(json.get(field).is_some(), "missing {field}");
        }
    }

    #[test]
    fn test_non_hex_field_is_malformed() {
        let (private, public) = keypair(true);
        let mut cipher = encrypt_ecies(&public, "x").unwrap();
        cipher.iv = "not-hex".into();
        assert!(matches!(
            decrypt_ecies(&private, &cipher),
            Err(EciesError::MalformedCipherObject("iv"))
        ));
    }
}
