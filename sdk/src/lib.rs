// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # stackid: Client Identity SDK
//!
//! Names on Bitcoin, profiles on whatever web server you like, and enough
//! cryptography in between that the web server does not have to be trusted.
//!
//! A name owner publishes a zone file on-chain. The zone file points at a
//! token file. The token file holds a secp256k1-signed profile. This crate
//! walks that chain, checks every signature against the name's owner
//! address, and hands back a schema.org profile document.
//!
//! ## Architecture
//!
//! - **crypto**: secp256k1 keys, Bitcoin addresses, ECIES.
//! - **identity**: `did:btc-addr:` / `did:ecdsa-pub:` identifiers.
//! - **token**: ES256K compact tokens and the profile token codec.
//! - **zonefile**: zone file codec and the single-URI record type.
//! - **profile**: profile documents, legacy lifting, resolution and lookup.
//! - **proofs**: social account proof validation.
//! - **auth**: sign-in request/response tokens and transit key storage.
//! - **network**: HTTP and name resolver seams.
//! - **storage**: Gaia-style hub client and the file API on top of it.
//! - **config**: protocol constants and client configuration.
//!
//! ## Ground rules
//!
//! 1. Verification never degrades into "return an empty profile".
//! 2. Only one fallback exists: legacy JSON zone files.
//! 3. Everything that touches the network is async and behind a trait.

pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod network;
pub mod profile;
pub mod proofs;
pub mod storage;
pub mod token;
pub mod utils;
pub mod zonefile;
