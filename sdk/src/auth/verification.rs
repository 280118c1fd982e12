//! # Auth Message Verification
//!
//! Checks a relying party (or authenticator) runs on a received auth
//! message before trusting anything in it:
//!
//! 1. exactly one public key, and the signature verifies under it
//! 2. `iss` is the `did:btc-addr:` of that key
//! 3. not expired, not issued in the future
//! 4. requests only: manifest and redirect URIs share the app's origin
//!
//! Each check is also exported on its own for callers that need a subset.

use crate::auth::messages::{AuthRequestPayload, AuthResponsePayload};
use crate::crypto::keys::{KeyError, PublicKey};
use crate::identity::{DecentralizedId, DidError};
use crate::network::resolver::{NameLookupError, NameResolver};
use crate::token::{decode_token, verify_compact, TokenError};
use crate::utils::is_same_origin_absolute_url;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("token carries no public key")]
    MissingPublicKey,

    #[error("multiple public keys are not supported (token has {0})")]
    MultiplePublicKeysNotSupported(usize),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Did(#[from] DidError),

    #[error("issuer {iss} is not the address of the signing key {address}")]
    IssuerMismatch { iss: String, address: String },

    #[error("token expired at {0}")]
    Expired(i64),

    #[error("token claims to be issued in the future ({0})")]
    IssuedInFuture(i64),

    #[error("{field} {uri} is not on the origin of {domain}")]
    OriginMismatch {
        field: &'static str,
        uri: String,
        domain: String,
    },

    #[error("username {username} is owned by {owner}, not {address}")]
    UsernameMismatch {
        username: String,
        owner: String,
        address: String,
    },

    #[error(transparent)]
    Lookup(#[from] NameLookupError),
}

// ---------------------------------------------------------------------------
// Individual checks
// ---------------------------------------------------------------------------

/// The single public key in `public_keys`, after checking the token's
/// signature under it.
pub fn do_signatures_match_public_keys(token: &str) -> Result<PublicKey, VerificationError> {
    let payload = decode_token(token)?.payload;
    let keys = payload
        .get("public_keys")
        .and_then(Value::as_array)
        .ok_or(VerificationError::MissingPublicKey)?;
    let key_hex = match keys.as_slice() {
        [] => return Err(VerificationError::MissingPublicKey),
        [key] => key.as_str().ok_or(VerificationError::MissingPublicKey)?,
        many => return Err(VerificationError::MultiplePublicKeysNotSupported(many.len())),
    };
    let public_key = PublicKey::from_hex(key_hex)?;
    verify_compact(token, &public_key)?;
    Ok(public_key)
}

/// `iss` must be the `btc-addr` DID of `public_key`.
pub fn do_public_keys_match_issuer(iss: &str, public_key: &PublicKey) -> Result<(), VerificationError> {
    let did: DecentralizedId = iss.parse()?;
    let address = public_key.address();
    if did.address()? != address {
        return Err(VerificationError::IssuerMismatch {
            iss: iss.to_string(),
            address,
        });
    }
    Ok(())
}

pub fn is_expiration_date_valid(exp: i64) -> Result<(), VerificationError> {
    if exp < Utc::now().timestamp() {
        return Err(VerificationError::Expired(exp));
    }
    Ok(())
}

pub fn is_issuance_date_valid(iat: i64) -> Result<(), VerificationError> {
    if iat > Utc::now().timestamp() {
        return Err(VerificationError::IssuedInFuture(iat));
    }
    Ok(())
}

fn same_origin(field: &'static str, uri: &str, domain: &str) -> Result<(), VerificationError> {
    if is_same_origin_absolute_url(domain, uri) {
        Ok(())
    } else {
        Err(VerificationError::OriginMismatch {
            field,
            uri: uri.to_string(),
            domain: domain.to_string(),
        })
    }
}

pub fn is_manifest_uri_valid(request: &AuthRequestPayload) -> Result<(), VerificationError> {
    same_origin("manifest_uri", &request.manifest_uri, &request.domain_name)
}

pub fn is_redirect_uri_valid(request: &AuthRequestPayload) -> Result<(), VerificationError> {
    same_origin("redirect_uri", &request.redirect_uri, &request.domain_name)
}

/// If the response names a username, its registered owner must be the
/// response's signing key.
pub async fn do_public_keys_match_username(
    resolver: &dyn NameResolver,
    response: &AuthResponsePayload,
) -> Result<(), VerificationError> {
    let Some(username) = response.username.as_deref() else {
        return Ok(());
    };
    let [key_hex] = response.public_keys.as_slice() else {
        return Err(VerificationError::MultiplePublicKeysNotSupported(
            response.public_keys.len(),
        ));
    };
    let address = PublicKey::from_hex(key_hex)?.address();
    let owner = resolver.get_name_info(username).await?.address;
    if owner != address {
        return Err(VerificationError::UsernameMismatch {
            username: username.to_string(),
            owner,
            address,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Whole-message verification
// ---------------------------------------------------------------------------

fn typed_payload<T: DeserializeOwned>(token: &str) -> Result<T, VerificationError> {
    let payload = decode_token(token)?.payload;
    serde_json::from_value(payload)
        .map_err(|e| TokenError::MalformedToken(format!("unexpected auth payload: {e}")).into())
}

/// Verify an auth request and return its payload.
pub fn verify_auth_request(token: &str) -> Result<AuthRequestPayload, VerificationError> {
    let public_key = do_signatures_match_public_keys(token)?;
    let request: AuthRequestPayload = typed_payload(token)?;
    do_public_keys_match_issuer(&request.iss, &public_key)?;
    is_expiration_date_valid(request.exp)?;
    is_issuance_date_valid(request.iat)?;
    is_manifest_uri_valid(&request)?;
    is_redirect_uri_valid(&request)?;
    debug!(domain = %request.domain_name, "auth request verified");
    Ok(request)
}

/// Verify an auth response and return its payload.
///
/// Username ownership needs a name lookup and is checked separately by
/// [`do_public_keys_match_username`].
pub fn verify_auth_response(token: &str) -> Result<AuthResponsePayload, VerificationError> {
    let public_key = do_signatures_match_public_keys(token)?;
    let response: AuthResponsePayload = typed_payload(token)?;
    do_public_keys_match_issuer(&response.iss, &public_key)?;
    is_expiration_date_valid(response.exp)?;
    is_issuance_date_valid(response.iat)?;
    debug!(version = ?response.version(), "auth response verified");
    Ok(response)
}
