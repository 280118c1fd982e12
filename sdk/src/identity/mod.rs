//! # Identity Module
//!
//! Decentralized identifiers tie a token to the key or address that issued
//! it. Auth messages put a `did:btc-addr:` in `iss`; relying parties parse
//! it back and compare addresses.

pub mod did;

pub use did::{address_from_did, DecentralizedId, DidError, DidType};
