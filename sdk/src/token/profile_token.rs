//! # Profile Tokens
//!
//! A profile is published as a signed token whose payload is:
//!
//! ```json
//! {
//!   "jti": "<uuid v4>",
//!   "iat": "2026-01-01T00:00:00.000Z",
//!   "exp": "2027-01-01T00:00:00.000Z",
//!   "subject": {"publicKey": "<hex>"},
//!   "issuer":  {"publicKey": "<hex>"},
//!   "claim":   { ...profile document... }
//! }
//! ```
//!
//! Verification is identity first, cryptography second: the caller's
//! expected key or address must name the issuer before the signature is
//! even looked at. That ordering is what lets callers tell "somebody else
//! signed this" apart from "this was tampered with".
//!
//! Token files wrap one or more tokens in a JSON array of
//! `{"token": .., "decodedToken": ..}` records. Only the first is read.

use crate::config::{PROFILE_TOKEN_LIFETIME, SIGNING_ALGORITHM};
use crate::crypto::keys::{PrivateKey, PublicKey};
use crate::token::jws::{decode_token, sign_compact, verify_compact, DecodedToken, TokenError};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

// ---------------------------------------------------------------------------
// Payload types
// ---------------------------------------------------------------------------

/// `subject` / `issuer` of a profile token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenParty {
    #[serde(rename = "publicKey")]
    pub public_key: String,
    /// Anything else the signer chose to put here.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TokenParty {
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        Self {
            public_key: public_key.to_hex(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ProfileTokenPayload<'a> {
    jti: String,
    iat: String,
    exp: String,
    subject: &'a TokenParty,
    issuer: &'a TokenParty,
    claim: &'a Value,
}

/// Knobs for [`sign_profile_token`]. `Default` gives the usual token:
/// ES256K, issued now, valid for a year, subject and issuer both the
/// signing key.
#[derive(Debug, Clone)]
pub struct SignOptions {
    pub subject: Option<TokenParty>,
    pub issuer: Option<TokenParty>,
    pub signing_algorithm: String,
    pub issued_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Default for SignOptions {
    fn default() -> Self {
        Self {
            subject: None,
            issuer: None,
            signing_algorithm: SIGNING_ALGORITHM.to_string(),
            issued_at: None,
            expires_at: None,
        }
    }
}

/// How [`extract_claim`] should treat the token.
#[derive(Debug, Clone, Copy)]
pub enum ClaimVerification<'a> {
    /// Verify against this public key (hex) or address first.
    Against(&'a str),
    /// Skip verification entirely. The claim is whatever the token says,
    /// signed by whoever; only use this for display of data you already
    /// trust by other means.
    Unverified,
}

fn iso8601(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ---------------------------------------------------------------------------
// Sign / verify / extract
// ---------------------------------------------------------------------------

/// Sign `claim` into a profile token.
pub fn sign_profile_token(
    claim: &Value,
    private_key_hex: &str,
    options: SignOptions,
) -> Result<String, TokenError> {
    if options.signing_algorithm != SIGNING_ALGORITHM {
        return Err(TokenError::UnsupportedAlgorithm(options.signing_algorithm));
    }

    let private_key = PrivateKey::from_hex(private_key_hex)?;
    let own = TokenParty::from_public_key(&private_key.public_key());
    let subject = options.subject.unwrap_or_else(|| own.clone());
    let issuer = options.issuer.unwrap_or(own);

    let issued_at = options.issued_at.unwrap_or_else(Utc::now);
    let expires_at = match options.expires_at {
        Some(t) => t,
        None => {
            let lifetime = Duration::from_std(PROFILE_TOKEN_LIFETIME)
                .map_err(|e| TokenError::MalformedToken(format!("token lifetime: {e}")))?;
            issued_at + lifetime
        }
    };

    let payload = ProfileTokenPayload {
        jti: uuid::Uuid::new_v4().to_string(),
        iat: iso8601(issued_at),
        exp: iso8601(expires_at),
        subject: &subject,
        issuer: &issuer,
        claim,
    };
    sign_compact(&payload, &private_key)
}

fn require_public_key<'a>(payload: &'a Value, party: &str) -> Result<&'a str, TokenError> {
    let party_value = payload
        .get(party)
        .ok_or_else(|| TokenError::MalformedToken(format!("token doesn't have a {party}")))?;
    party_value
        .get("publicKey")
        .and_then(Value::as_str)
        .ok_or_else(|| TokenError::MalformedToken(format!("token doesn't have a {party} public key")))
}

/// Verify a profile token against an expected public key or address.
///
/// Checks, in order: the token decodes; `subject.publicKey`,
/// `issuer.publicKey` and `claim` are present; `public_key_or_address`
/// names the issuer (raw key, compressed address or uncompressed address);
/// the signature verifies under the issuer key.
pub fn verify_profile_token(
    token: &str,
    public_key_or_address: &str,
) -> Result<DecodedToken, TokenError> {
    let decoded = decode_token(token)?;
    let payload = &decoded.payload;

    require_public_key(payload, "subject")?;
    let issuer_hex = require_public_key(payload, "issuer")?;
    if payload.get("claim").is_none() {
        return Err(TokenError::MalformedToken("token doesn't have a claim".into()));
    }

    let issuer = PublicKey::from_hex(issuer_hex).map_err(|_| {
        TokenError::MalformedToken("issuer public key is not a secp256k1 key".into())
    })?;
    if !issuer.matches(public_key_or_address) {
        debug!(expected = %public_key_or_address, issuer = %issuer_hex, "profile token issuer mismatch");
        return Err(TokenError::IssuerMismatch {
            expected: public_key_or_address.to_string(),
        });
    }

    verify_compact(token, &issuer)?;
    Ok(decoded)
}

/// Pull the `claim` out of a profile token.
pub fn extract_claim(token: &str, verification: ClaimVerification<'_>) -> Result<Value, TokenError> {
    let decoded = match verification {
        ClaimVerification::Against(expected) => verify_profile_token(token, expected)?,
        ClaimVerification::Unverified => decode_token(token)?,
    };
    match decoded.payload {
        Value::Object(mut map) => map
            .remove("claim")
            .ok_or_else(|| TokenError::MalformedToken("token doesn't have a claim".into())),
        _ => Err(TokenError::MalformedToken("payload is not an object".into())),
    }
}

// ---------------------------------------------------------------------------
// Token files
// ---------------------------------------------------------------------------

/// One entry of a token file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrappedToken {
    pub token: String,
    #[serde(rename = "decodedToken")]
    pub decoded_token: DecodedToken,
}

/// Decode `token` and pair it with its decoded form for publishing.
pub fn wrap_profile_token(token: &str) -> Result<WrappedToken, TokenError> {
    Ok(WrappedToken {
        token: token.to_string(),
        decoded_token: decode_token(token)?,
    })
}

/// Serialize tokens into a token file body.
pub fn make_token_file(tokens: &[String]) -> Result<String, TokenError> {
    let wrapped = tokens
        .iter()
        .map(|t| wrap_profile_token(t))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(serde_json::to_string(&wrapped)?)
}

/// Why a token file body was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenFileError {
    #[error("token file is not JSON")]
    NotJson,
    #[error("token file is not a JSON array")]
    NotAnArray,
    #[error("token file is empty")]
    Empty,
    #[error("first token file entry has no token")]
    MissingToken,
}

/// The first token in a token file body.
pub fn first_token(body: &str) -> Result<String, TokenFileError> {
    let value: Value = serde_json::from_str(body).map_err(|_| TokenFileError::NotJson)?;
    let entries = value.as_array().ok_or(TokenFileError::NotAnArray)?;
    let first = entries.first().ok_or(TokenFileError::Empty)?;
    first
        .get("token")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(TokenFileError::MissingToken)
}
