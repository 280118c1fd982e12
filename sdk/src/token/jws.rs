//! # Compact ES256K Tokens
//!
//! `base64url(header) . base64url(payload) . base64url(signature)`, no
//! padding. Signed headers are always `{"typ":"JWT","alg":"ES256K"}`;
//! decoding only needs `alg`, since `typ` is optional in JOSE. The
//! signature is the 64-byte `r || s` ECDSA signature over
//! `SHA-256(header_b64 "." payload_b64)`.
//!
//! Decoding and verifying are separate steps on purpose: callers first
//! look at the (untrusted) payload to learn which key to check against,
//! then verify.

use crate::config::{SIGNING_ALGORITHM, TOKEN_TYPE};
use crate::crypto::hash::sha256;
use crate::crypto::keys::{KeyError, PrivateKey, PublicKey};
use k256::ecdsa::Signature;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors from token signing, decoding and verification.
///
/// The three verification failures are separate variants: a garbage token,
/// a token naming the wrong signer, and a token whose named signer did not
/// actually sign it are very different situations for a caller.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The token does not decode, or a required field is absent.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// The token was issued by someone other than the expected key/address.
    #[error("token issuer does not match {expected}")]
    IssuerMismatch { expected: String },

    /// The signer matched but the signature does not verify.
    #[error("token signature verification failed")]
    SignatureVerificationFailed,

    #[error("unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error("payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The JOSE header. Field order matters for byte-identical output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
    pub alg: String,
}

impl Default for TokenHeader {
    fn default() -> Self {
        Self {
            typ: Some(TOKEN_TYPE.to_string()),
            alg: SIGNING_ALGORITHM.to_string(),
        }
    }
}

/// A token split into its decoded parts. Nothing here has been verified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedToken {
    pub header: TokenHeader,
    pub payload: Value,
    /// The signature segment, still base64url.
    pub signature: String,
}

// ---------------------------------------------------------------------------
// Encoding helpers
// ---------------------------------------------------------------------------

fn b64_encode(data: &[u8]) -> String {
    base64::encode_config(data, base64::URL_SAFE_NO_PAD)
}

fn b64_decode(segment: &str) -> Option<Vec<u8>> {
    base64::decode_config(segment.trim_end_matches('='), base64::URL_SAFE_NO_PAD).ok()
}

fn split_token(token: &str) -> Result<[&str; 3], TokenError> {
    let parts: Vec<&str> = token.split('.').collect();
    match parts.as_slice() {
        [header, payload, signature] => Ok([*header, *payload, *signature]),
        _ => Err(TokenError::MalformedToken(format!(
            "expected 3 dot-separated segments, got {}",
            parts.len()
        ))),
    }
}

fn is_es256k(alg: &str) -> bool {
    alg.eq_ignore_ascii_case(SIGNING_ALGORITHM)
}

// ---------------------------------------------------------------------------
// Sign / decode / verify
// ---------------------------------------------------------------------------

/// Sign any serializable payload into a compact ES256K token.
pub fn sign_compact<T: Serialize + ?Sized>(
    payload: &T,
    private_key: &PrivateKey,
) -> Result<String, TokenError> {
    let header = serde_json::to_vec(&TokenHeader::default())?;
    let body = serde_json::to_vec(payload)?;
    let signing_input = format!("{}.{}", b64_encode(&header), b64_encode(&body));

    let signature = private_key.sign_prehash(&sha256(signing_input.as_bytes()))?;
    Ok(format!(
        "{}.{}",
        signing_input,
        b64_encode(&signature.to_bytes())
    ))
}

/// Split and decode a token without checking anything cryptographic.
pub fn decode_token(token: &str) -> Result<DecodedToken, TokenError> {
    let [header_b64, payload_b64, signature] = split_token(token)?;

    let header_bytes = b64_decode(header_b64)
        .ok_or_else(|| TokenError::MalformedToken("header is not base64url".into()))?;
    let header: TokenHeader = serde_json::from_slice(&header_bytes)
        .map_err(|e| TokenError::MalformedToken(format!("header is not a JOSE header: {e}")))?;

    let payload_bytes = b64_decode(payload_b64)
        .ok_or_else(|| TokenError::MalformedToken("payload is not base64url".into()))?;
    let payload: Value = serde_json::from_slice(&payload_bytes)
        .map_err(|e| TokenError::MalformedToken(format!("payload is not JSON: {e}")))?;

    Ok(DecodedToken {
        header,
        payload,
        signature: signature.to_string(),
    })
}

/// Verify the token's signature against `public_key`.
///
/// The header's `alg` must be ES256K (any case). Anything about the
/// signature segment that does not check out, including undecodable bytes,
/// is [`TokenError::SignatureVerificationFailed`].
pub fn verify_compact(token: &str, public_key: &PublicKey) -> Result<(), TokenError> {
    let decoded = decode_token(token)?;
    if !is_es256k(&decoded.header.alg) {
        return Err(TokenError::UnsupportedAlgorithm(decoded.header.alg));
    }

    let [header_b64, payload_b64, signature_b64] = split_token(token)?;
    let digest = sha256(format!("{header_b64}.{payload_b64}").as_bytes());

    let signature = b64_decode(signature_b64)
        .and_then(|bytes| Signature::from_slice(&bytes).ok())
        .ok_or(TokenError::SignatureVerificationFailed)?;
    // Other implementations are not always strict about low-S.
    let signature = signature.normalize_s().unwrap_or(signature);

    if public_key.verify_prehash(&digest, &signature) {
        Ok(())
    } else {
        Err(TokenError::SignatureVerificationFailed)
    }
}
