//! # Hashing Utilities
//!
//! The three digests the protocol actually uses:
//!
//! - **SHA-256** for JWS signing input and hub challenges.
//! - **SHA-512** for splitting an ECDH secret into cipher and MAC keys.
//! - **HASH160** (`RIPEMD160(SHA256(x))`) for Bitcoin addresses.
//!
//! Nothing here is novel, which is the point.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256, Sha512};

/// Compute the SHA-256 hash of the input data as a fixed-size array.
///
/// # Example
///
/// ```
/// use stackid::crypto::sha256;
///
/// let hash = sha256(b"some-name.id");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute the SHA-512 hash of the input data.
pub fn sha512(data: &[u8]) -> [u8; 64] {
    let mut hasher = Sha512::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Bitcoin's HASH160: `RIPEMD160(SHA256(data))`.
///
/// This is the 20-byte payload inside every P2PKH address. Note that the
/// result depends on the *serialized* public key, so a compressed and an
/// uncompressed encoding of the same point hash to different addresses.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let mut hasher = Ripemd160::new();
    hasher.update(sha256(data));
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            hex::encode(sha256(b"abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_sha512_length_and_determinism() {
        let a = sha512(b"shared secret");
        let b = sha512(b"shared secret");
        assert_eq!(a, b);
        assert_ne!(a, sha512(b"other secret"));
    }

    #[test]
    fn test_hash160_empty_input() {
        // RIPEMD160(SHA256("")), a well-known constant.
        assert_eq!(
            hex::encode(hash160(b"")),
            "b472a266d0bd89c13706a4132ccfb16f7c3b9fcb"
        );
    }
}
