//! # Auth Messages
//!
//! The two signed tokens exchanged during "sign in with a decentralized ID":
//!
//! ```text
//!   app ──── auth request (signed by transit key) ────► authenticator
//!   app ◄─── auth response (signed by identity key) ─── authenticator
//! ```
//!
//! Both carry `iss = did:btc-addr:{address of the signing key}` and a single
//! entry in `public_keys`. Times are JWT seconds.
//!
//! ## Response versions
//!
//! A response that carries an app private key is a **v1.1.0** response and
//! gains `email`, `hubUrl`, `profile_url` and `version`. If the request also
//! supplied a transit public key, the app key and core token are ECIES
//! encrypted to it. Without an app private key the response keeps the
//! legacy shape so old relying parties can still parse it.

use crate::auth::transit::{TransitKeyError, TransitKeyStore};
use crate::config::{
    AUTH_PROTOCOL_VERSION, AUTH_REQUEST_LIFETIME, AUTH_RESPONSE_LIFETIME, DEFAULT_SCOPE,
};
use crate::crypto::ecies::{decrypt_ecies, encrypt_ecies, CipherObject, EciesError};
use crate::crypto::keys::{KeyError, PrivateKey};
use crate::identity::DecentralizedId;
use crate::token::{sign_compact, TokenError};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Ecies(#[from] EciesError),

    #[error(transparent)]
    TransitKey(#[from] TransitKeyError),

    /// The hex-wrapped cipher object could not be unwrapped.
    #[error("encrypted payload is malformed: {0}")]
    MalformedCipherText(String),
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRequestPayload {
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub public_keys: Vec<String>,
    pub domain_name: String,
    pub manifest_uri: String,
    pub redirect_uri: String,
    pub version: String,
    pub do_not_include_profile: bool,
    pub supports_hub_url: bool,
    pub scopes: Vec<String>,
}

/// Fields only present on v1.1.0 responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponseExtension {
    pub email: Option<String>,
    #[serde(rename = "hubUrl")]
    pub hub_url: Option<String>,
    pub profile_url: Option<String>,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponsePayload {
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub public_keys: Vec<String>,
    pub profile: Value,
    pub username: Option<String>,
    pub core_token: Option<String>,
    pub private_key: Option<String>,
    #[serde(flatten)]
    pub extension: Option<AuthResponseExtension>,
}

impl AuthResponsePayload {
    /// `version` if this is a v1.1.0 response, `None` for the legacy shape.
    pub fn version(&self) -> Option<&str> {
        self.extension.as_ref().map(|ext| ext.version.as_str())
    }
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// What an app asks for when it requests sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRequestParams {
    pub redirect_uri: String,
    pub manifest_uri: String,
    pub scopes: Vec<String>,
    pub domain_name: String,
    /// Defaults to an hour from now.
    pub expires_at: Option<DateTime<Utc>>,
}

impl AuthRequestParams {
    /// The conventional layout for an app served from `origin`: redirect
    /// to `{origin}/`, manifest at `{origin}/manifest.json`, default scope.
    pub fn for_origin(origin: &str) -> Self {
        let origin = origin.trim_end_matches('/');
        Self {
            redirect_uri: format!("{origin}/"),
            manifest_uri: format!("{origin}/manifest.json"),
            scopes: vec![DEFAULT_SCOPE.to_string()],
            domain_name: origin.to_string(),
            expires_at: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthMetadata {
    pub email: Option<String>,
    pub profile_url: Option<String>,
}

/// What the authenticator hands back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthResponseParams {
    pub profile: Value,
    pub username: Option<String>,
    pub metadata: AuthMetadata,
    pub core_token: Option<String>,
    pub app_private_key: Option<String>,
    /// Defaults to thirty days from now.
    pub expires_at: Option<DateTime<Utc>>,
    pub transit_public_key: Option<String>,
    pub hub_url: Option<String>,
}

fn lifetime(duration: std::time::Duration) -> Duration {
    Duration::from_std(duration).unwrap_or_else(|_| Duration::hours(1))
}

fn issuer(key: &PrivateKey) -> (String, String) {
    let public_key = key.public_key();
    let did = DecentralizedId::from_public_key(&public_key);
    (did.to_string(), public_key.to_hex())
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Sign an auth request with `transit_private_key`.
pub fn make_auth_request(
    transit_private_key: &str,
    params: &AuthRequestParams,
) -> Result<String, AuthError> {
    let key = PrivateKey::from_hex(transit_private_key)?;
    let (iss, public_key) = issuer(&key);
    let now = Utc::now();
    let expires_at = params
        .expires_at
        .unwrap_or(now + lifetime(AUTH_REQUEST_LIFETIME));

    let payload = AuthRequestPayload {
        jti: Uuid::new_v4().to_string(),
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
        iss,
        public_keys: vec![public_key],
        domain_name: params.domain_name.clone(),
        manifest_uri: params.manifest_uri.clone(),
        redirect_uri: params.redirect_uri.clone(),
        version: AUTH_PROTOCOL_VERSION.to_string(),
        do_not_include_profile: true,
        supports_hub_url: true,
        scopes: params.scopes.clone(),
    };

    info!(version = AUTH_PROTOCOL_VERSION, domain = %params.domain_name, "generating auth request");
    Ok(sign_compact(&payload, &key)?)
}

/// Generate a transit key through `store`, then sign the request with it.
///
/// Returns the token and the transit key. The key is already persisted by
/// the time this returns.
pub async fn make_auth_request_with_store(
    store: &dyn TransitKeyStore,
    params: &AuthRequestParams,
) -> Result<(String, String), AuthError> {
    let transit_key = store.generate_and_store().await?;
    let token = make_auth_request(&transit_key, params)?;
    Ok((token, transit_key))
}

/// Sign an auth response with the identity key.
pub fn make_auth_response(
    identity_private_key: &str,
    params: &AuthResponseParams,
) -> Result<String, AuthError> {
    let key = PrivateKey::from_hex(identity_private_key)?;
    let (iss, public_key) = issuer(&key);

    let mut private_key = params.app_private_key.clone();
    let mut core_token = params.core_token.clone();
    let extension = match &params.app_private_key {
        Some(app_key) => {
            info!(version = AUTH_PROTOCOL_VERSION, "generating auth response");
            if let Some(transit) = &params.transit_public_key {
                private_key = Some(encrypt_private_key(transit, app_key)?);
                if let Some(token) = &params.core_token {
                    core_token = Some(encrypt_private_key(transit, token)?);
                }
            }
            Some(AuthResponseExtension {
                email: params.metadata.email.clone(),
                hub_url: params.hub_url.clone(),
                profile_url: params.metadata.profile_url.clone(),
                version: AUTH_PROTOCOL_VERSION.to_string(),
            })
        }
        None => {
            warn!("generating a legacy auth response");
            None
        }
    };

    let now = Utc::now();
    let expires_at = params
        .expires_at
        .unwrap_or(now + lifetime(AUTH_RESPONSE_LIFETIME));
    let payload = AuthResponsePayload {
        jti: Uuid::new_v4().to_string(),
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
        iss,
        public_keys: vec![public_key],
        profile: params.profile.clone(),
        username: params.username.clone(),
        core_token,
        private_key,
        extension,
    };
    Ok(sign_compact(&payload, &key)?)
}

// ---------------------------------------------------------------------------
// Secret wrapping
// ---------------------------------------------------------------------------

/// ECIES-encrypt `secret` to `public_key` and hex-encode the JSON cipher object.
pub fn encrypt_private_key(public_key: &str, secret: &str) -> Result<String, AuthError> {
    let cipher = encrypt_ecies(public_key, secret)?;
    let json = serde_json::to_vec(&cipher).map_err(|e| AuthError::MalformedCipherText(e.to_string()))?;
    Ok(hex::encode(json))
}

/// Inverse of [`encrypt_private_key`].
pub fn decrypt_private_key(private_key: &str, hexed: &str) -> Result<String, AuthError> {
    let json = hex::decode(hexed).map_err(|e| AuthError::MalformedCipherText(e.to_string()))?;
    let cipher: CipherObject =
        serde_json::from_slice(&json).map_err(|e| AuthError::MalformedCipherText(e.to_string()))?;
    decrypt_ecies(private_key, &cipher)?
        .into_text()
        .ok_or_else(|| AuthError::MalformedCipherText("payload was not text".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::transit::MemoryTransitKeyStore;
    use crate::token::decode_token;
    use serde_json::json;

    fn request_payload(token: &str) -> AuthRequestPayload {
        serde_json::from_value(decode_token(token).unwrap().payload).unwrap()
    }

    fn response_payload(token: &str) -> AuthResponsePayload {
        serde_json::from_value(decode_token(token).unwrap().payload).unwrap()
    }

    #[test]
    fn test_auth_request_payload() {
        let key = PrivateKey::generate();
        let token = make_auth_request(&key.to_hex(), &AuthRequestParams::for_origin("https://app.example")).unwrap();
        let payload = request_payload(&token);

        assert_eq!(payload.iss, format!("did:btc-addr:{}", key.address()));
        assert_eq!(payload.public_keys, vec![key.public_key().to_hex()]);
        assert_eq!(payload.domain_name, "https://app.example");
        assert_eq!(payload.redirect_uri, "https://app.example/");
        assert_eq!(payload.manifest_uri, "https://app.example/manifest.json");
        assert_eq!(payload.scopes, vec!["store_write"]);
        assert_eq!(payload.version, "1.1.0");
        assert!(payload.do_not_include_profile && payload.supports_hub_url);
        assert!(payload.exp - payload.iat >= 3599 && payload.exp - payload.iat <= 3601);
        assert!(Uuid::parse_str(&payload.jti).is_ok());
    }

    #[tokio::test]
    async fn test_request_with_store_persists_key_first() {
        let store = MemoryTransitKeyStore::new();
        let (token, transit) =
            make_auth_request_with_store(&store, &AuthRequestParams::for_origin("https://app.example"))
                .await
                .unwrap();
        assert_eq!(store.load().await.unwrap(), Some(transit.clone()));
        let expected = PrivateKey::from_hex(&transit).unwrap().public_key().to_hex();
        assert_eq!(request_payload(&token).public_keys, vec![expected]);
    }

    #[test]
    fn test_legacy_response_has_no_extension() {
        let identity = PrivateKey::generate();
        let params = AuthResponseParams {
            profile: json!({"name": "Alice"}),
            username: Some("alice.id".into()),
            core_token: Some("core".into()),
            ..AuthResponseParams::default()
        };
        let token = make_auth_response(&identity.to_hex(), &params).unwrap();
        let raw = decode_token(&token).unwrap().payload;

        assert!(raw.get("version").is_none());
        assert!(raw.get("hubUrl").is_none());
        assert_eq!(raw["core_token"], "core");
        assert_eq!(raw["private_key"], Value::Null);
        assert_eq!(response_payload(&token).version(), None);
    }

    #[test]
    fn test_v110_response_without_transit_key_is_plain() {
        let identity = PrivateKey::generate();
        let params = AuthResponseParams {
            app_private_key: Some("ab".repeat(32)),
            hub_url: Some("https://hub.example".into()),
            metadata: AuthMetadata {
                email: Some("alice@example.com".into()),
                profile_url: None,
            },
            ..AuthResponseParams::default()
        };
        let token = make_auth_response(&identity.to_hex(), &params).unwrap();
        let raw = decode_token(&token).unwrap().payload;

        assert_eq!(raw["version"], "1.1.0");
        assert_eq!(raw["hubUrl"], "https://hub.example");
        assert_eq!(raw["email"], "alice@example.com");
        assert_eq!(raw["profile_url"], Value::Null);
        assert_eq!(raw["private_key"], "ab".repeat(32));
    }

    #[test]
    fn test_v110_response_encrypts_to_transit_key() {
        let identity = PrivateKey::generate();
        let transit = PrivateKey::generate();
        let app_key = PrivateKey::generate().to_hex();
        let params = AuthResponseParams {
            app_private_key: Some(app_key.clone()),
            core_token: Some("core-session".into()),
            transit_public_key: Some(transit.public_key().to_hex()),
            ..AuthResponseParams::default()
        };
        let token = make_auth_response(&identity.to_hex(), &params).unwrap();
        let payload = response_payload(&token);

        assert_eq!(payload.version(), Some("1.1.0"));
        let sealed_key = payload.private_key.unwrap();
        assert_ne!(sealed_key, app_key);
        assert_eq!(decrypt_private_key(&transit.to_hex(), &sealed_key).unwrap(), app_key);
        assert_eq!(
            decrypt_private_key(&transit.to_hex(), &payload.core_token.unwrap()).unwrap(),
            "core-session"
        );
    }

    #[test]
    fn test_decrypt_private_key_errors() {
        let key = PrivateKey::generate();
        assert!(matches!(
            decrypt_private_key(&key.to_hex(), "zz"),
            Err(AuthError::MalformedCipherText(_))
        ));
        assert!(matches!(
            decrypt_private_key(&key.to_hex(), &hex::encode("{}")),
            Err(AuthError::MalformedCipherText(_))
        ));
        let sealed = encrypt_private_key(&key.public_key().to_hex(), "secret").unwrap();
        let other = PrivateKey::generate();
        assert!(matches!(
            decrypt_private_key(&other.to_hex(), &sealed),
            Err(AuthError::Ecies(EciesError::MacValidation))
        ));
    }

    #[test]
    fn test_bad_identity_key() {
        assert!(matches!(
            make_auth_response("nope", &AuthResponseParams::default()),
            Err(AuthError::Key(KeyError::InvalidKeyEncoding(_)))
        ));
    }
}
