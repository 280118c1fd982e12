//! # Cryptographic Primitives
//!
//! Everything signature- or secret-shaped flows through here:
//!
//! - **secp256k1** keys with the network's hex compression convention.
//! - **HASH160 + base58check** for Bitcoin addresses.
//! - **ECIES** for encrypting secrets to a public key.
//!
//! All of it is a thin, typed layer over the RustCrypto crates. The only
//! thing this module decides on its own is encoding.

pub mod ecies;
pub mod hash;
pub mod keys;

pub use ecies::{decrypt_ecies, encrypt_ecies, CipherObject, EciesError, Plaintext};
pub use hash::{hash160, sha256, sha512};
pub use keys::{
    address_forms, derive_public_key, get_entropy, make_private_key, public_key_to_address,
    AddressForms, KeyError, PrivateKey, PublicKey,
};
