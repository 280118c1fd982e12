//! # Decentralized Identifiers
//!
//! The two DID methods this network issues:
//!
//! ```text
//! did:btc-addr:<base58check address>
//! did:ecdsa-pub:<hex public key>
//! ```
//!
//! The method set is open, so an unknown type still parses; it simply
//! cannot be turned into an address. A serialized DID always has exactly
//! three colon-separated segments. Identifiers that would need a colon of
//! their own are not representable, and parsing refuses them rather than
//! guessing where the identifier starts.

use crate::crypto::keys::PublicKey;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during DID operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DidError {
    /// The string is not `did:<type>:<identifier>`.
    #[error("malformed decentralized identifier: {0}")]
    MalformedIdentifier(String),

    /// The DID is of the wrong type for the requested operation.
    #[error("DID type mismatch: expected '{expected}', got '{actual}'")]
    TypeMismatch { expected: &'static str, actual: String },
}

// ---------------------------------------------------------------------------
// DidType
// ---------------------------------------------------------------------------

/// The method segment of a DID.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DidType {
    /// `btc-addr`: the identifier is a Bitcoin address.
    BtcAddr,
    /// `ecdsa-pub`: the identifier is a hex secp256k1 public key.
    EcdsaPub,
    /// Anything else. Kept verbatim.
    Other(String),
}

impl DidType {
    pub fn as_str(&self) -> &str {
        match self {
            DidType::BtcAddr => "btc-addr",
            DidType::EcdsaPub => "ecdsa-pub",
            DidType::Other(s) => s,
        }
    }
}

impl From<&str> for DidType {
    fn from(value: &str) -> Self {
        match value {
            "btc-addr" => DidType::BtcAddr,
            "ecdsa-pub" => DidType::EcdsaPub,
            other => DidType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for DidType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// DecentralizedId
// ---------------------------------------------------------------------------

/// An immutable `did:<type>:<identifier>` triple.
///
/// # Examples
///
/// ```
/// use stackid::identity::DecentralizedId;
///
/// let did: DecentralizedId = "did:btc-addr:1NZNxhoxobqwsNvTb16pdeiqvFvce3Yg8U".parse().unwrap();
/// assert_eq!(did.address().unwrap(), "1NZNxhoxobqwsNvTb16pdeiqvFvce3Yg8U");
/// assert_eq!(did.to_string(), "did:btc-addr:1NZNxhoxobqwsNvTb16pdeiqvFvce3Yg8U");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DecentralizedId {
    did_type: DidType,
    identifier: String,
}

impl DecentralizedId {
    /// Build a DID from its parts, enforcing the same rules as parsing.
    pub fn new(did_type: DidType, identifier: impl Into<String>) -> Result<Self, DidError> {
        let identifier = identifier.into();
        let type_str = did_type.as_str();
        if type_str.is_empty() || type_str.contains(':') {
            return Err(DidError::MalformedIdentifier(format!(
                "type segment {type_str:?} must be non-empty and colon-free"
            )));
        }
        if identifier.is_empty() || identifier.contains(':') {
            return Err(DidError::MalformedIdentifier(format!(
                "identifier {identifier:?} must be non-empty and colon-free"
            )));
        }
        Ok(Self {
            did_type,
            identifier,
        })
    }

    /// `did:btc-addr:<address>`.
    pub fn from_address(address: &str) -> Result<Self, DidError> {
        Self::new(DidType::BtcAddr, address)
    }

    /// `did:btc-addr:` of the key's address, the form used as token issuer.
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        Self {
            did_type: DidType::BtcAddr,
            identifier: public_key.address(),
        }
    }

    /// `did:ecdsa-pub:<hex public key>`.
    pub fn from_ecdsa_public_key(public_key: &PublicKey) -> Self {
        Self {
            did_type: DidType::EcdsaPub,
            identifier: public_key.to_hex(),
        }
    }

    pub fn did_type(&self) -> &DidType {
        &self.did_type
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// The Bitcoin address, if this is a `btc-addr` DID.
    pub fn address(&self) -> Result<&str, DidError> {
        match self.did_type {
            DidType::BtcAddr => Ok(&self.identifier),
            _ => Err(DidError::TypeMismatch {
                expected: "btc-addr",
                actual: self.did_type.to_string(),
            }),
        }
    }
}

impl FromStr for DecentralizedId {
    type Err = DidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 3 {
            return Err(DidError::MalformedIdentifier(format!(
                "expected 3 colon-separated segments, got {} in {s:?}",
                parts.len()
            )));
        }
        if !parts[0].eq_ignore_ascii_case("did") {
            return Err(DidError::MalformedIdentifier(format!(
                "expected 'did' scheme, got {:?}",
                parts[0]
            )));
        }
        Self::new(DidType::from(parts[1]), parts[2])
    }
}

impl fmt::Display for DecentralizedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "did:{}:{}", self.did_type, self.identifier)
    }
}

impl Serialize for DecentralizedId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DecentralizedId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Address of a `did:btc-addr:` string in one call.
pub fn address_from_did(did: &str) -> Result<String, DidError> {
    let did: DecentralizedId = did.parse()?;
    did.address().map(str::to_string)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::PrivateKey;

    #[test]
    fn test_round_trip_known_and_unknown_types() {
        for (ty, id) in [
            ("btc-addr", "1NZNxhoxobqwsNvTb16pdeiqvFvce3Yg8U"),
            ("ecdsa-pub", "027d28f9951ce46538951e3697c62588a87f1f1f295de4a14fdd4c780fc52cfe69"),
            ("web", "example.com"),
        ] {
            let did = DecentralizedId::new(DidType::from(ty), id).unwrap();
            let parsed: DecentralizedId = did.to_string().parse().unwrap();
            assert_eq!(parsed.did_type().as_str(), ty);
            assert_eq!(parsed.identifier(), id);
        }
    }

    #[test]
    fn test_rejects_malformed_strings() {
        for bad in ["did:1:2:3", "did:1", "", "no-did:1:2", "did::x", "did:btc-addr:"] {
            assert!(
                matches!(
                    bad.parse::<DecentralizedId>(),
                    Err(DidError::MalformedIdentifier(_))
                ),
                "{bad:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_scheme_is_case_insensitive() {
        let did: DecentralizedId = "DID:btc-addr:1abc".parse().unwrap();
        assert_eq!(did.address().unwrap(), "1abc");
        assert_eq!(did.to_string(), "did:btc-addr:1abc");
    }

    #[test]
    fn test_address_requires_btc_addr_type() {
        let did: DecentralizedId = "did:ecdsa-pub:02abcdef".parse().unwrap();
        assert!(matches!(
            did.address(),
            Err(DidError::TypeMismatch { expected: "btc-addr", .. })
        ));
        assert_eq!(
            address_from_did("did:btc-addr:1NZNxhoxobqwsNvTb16pdeiqvFvce3Yg8U").unwrap(),
            "1NZNxhoxobqwsNvTb16pdeiqvFvce3Yg8U"
        );
    }

    #[test]
    fn test_from_public_key_uses_address() {
        let key = PrivateKey::generate().public_key();
        let did = DecentralizedId::from_public_key(&key);
        assert_eq!(did.to_string(), format!("did:btc-addr:{}", key.address()));

        let ecdsa = DecentralizedId::from_ecdsa_public_key(&key);
        assert_eq!(ecdsa.did_type(), &DidType::EcdsaPub);
        assert!(ecdsa.address().is_err());
    }

    #[test]
    fn test_serde_as_plain_string() {
        let did = DecentralizedId::from_address("1abc").unwrap();
        let json = serde_json::to_string(&did).unwrap();
        assert_eq!(json, "\"did:btc-addr:1abc\"");
        let back: DecentralizedId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, did);
        assert!(serde_json::from_str::<DecentralizedId>("\"did:x\"").is_err());
    }
}
