//! # Zone File → Profile
//!
//! Turns the zone file text published for a name into a verified profile.
//!
//! ```text
//!  zone file text
//!        │ parse_zone_file
//!        ├── no $ORIGIN ──► legacy JSON ──► lift ──► ProfileDocument
//!        ▼
//!  first URI target (https:// defaulted)
//!        │ GET
//!        ▼
//!  token file  [{"token": "..."}]
//!        │ first_token
//!        ▼
//!  verify issuer + signature, take claim ──► ProfileDocument
//! ```
//!
//! Steps run strictly in order with no retries or caching. Each failure
//! mode has its own [`ResolveError`] variant and token failures keep their
//! [`TokenError`] kind.

use crate::network::http::{HttpClient, HttpError, HttpResponse};
use crate::network::resolver::NameLookupError;
use crate::profile::document::ProfileDocument;
use crate::profile::legacy::person_from_legacy_json;
use crate::token::{extract_claim, first_token, ClaimVerification, TokenError, TokenFileError};
use crate::zonefile::{parse_zone_file, token_file_url, ZoneFileError};
use thiserror::Error;
use tracing::{debug, warn};

/// Why a name or zone file could not be resolved to a profile.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("malformed zone file: {0}")]
    MalformedZoneFile(#[from] ZoneFileError),

    /// No `$ORIGIN` and the text is not a legacy JSON profile either.
    #[error("zone file is not in a recognised profile format: {0}")]
    UnrecognizedProfileFormat(#[source] serde_json::Error),

    #[error("zone file has no token file URL")]
    MissingTokenFileUrl,

    #[error("could not fetch token file from {url}: {source}")]
    TokenFileFetchFailed {
        url: String,
        #[source]
        source: HttpError,
    },

    /// The token file body is not `[{"token": ...}, ...]`.
    #[error("invalid profile token file: {reason}")]
    InvalidProfileToken { reason: TokenFileError, body: String },

    #[error("profile claim is not a profile document: {0}")]
    InvalidProfileDocument(#[source] serde_json::Error),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("name {name} has no zone file")]
    MissingZoneFile { name: String },

    #[error(transparent)]
    Lookup(#[from] NameLookupError),
}

/// Resolve zone file text to a profile signed by `public_key_or_address`.
pub async fn resolve_zone_file_to_profile(
    http: &dyn HttpClient,
    zone_file: &str,
    public_key_or_address: &str,
) -> Result<ProfileDocument, ResolveError> {
    let parsed = match parse_zone_file(zone_file) {
        Ok(parsed) => parsed,
        Err(e) if zone_file.trim_start().starts_with('{') => {
            debug!(error = %e, "zone file does not parse, trying legacy profile format");
            return person_from_legacy_json(zone_file).map_err(|_| ResolveError::MalformedZoneFile(e));
        }
        Err(e) => return Err(e.into()),
    };

    if parsed.origin.is_none() {
        debug!("zone file has no $ORIGIN, trying legacy profile format");
        return person_from_legacy_json(zone_file).map_err(ResolveError::UnrecognizedProfileFormat);
    }

    let url = token_file_url(&parsed).ok_or(ResolveError::MissingTokenFileUrl)?;
    debug!(%url, "fetching profile token file");

    let response = http
        .get(&url)
        .await
        .and_then(HttpResponse::error_for_status)
        .map_err(|source| {
            warn!(%url, error = %source, "token file fetch failed");
            ResolveError::TokenFileFetchFailed {
                url: url.clone(),
                source,
            }
        })?;

    let body = response.text();
    let token = match first_token(&body) {
        Ok(token) => token,
        Err(reason) => return Err(ResolveError::InvalidProfileToken { reason, body }),
    };

    let claim = extract_claim(&token, ClaimVerification::Against(public_key_or_address))?;
    debug!("profile token verified");
    serde_json::from_value(claim).map_err(ResolveError::InvalidProfileDocument)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::PrivateKey;
    use crate::network::testing::MockHttp;
    use crate::token::{make_token_file, sign_profile_token, SignOptions};
    use crate::zonefile::make_profile_zone_file;
    use serde_json::json;

    const TOKEN_URL: &str = "https://hub.example/alice/profile.json";

    fn signed_file(key: &PrivateKey, claim: &serde_json::Value) -> String {
        let token = sign_profile_token(claim, &key.to_hex(), SignOptions::default()).unwrap();
        make_token_file(&[token]).unwrap()
    }

    fn person() -> serde_json::Value {
        json!({"@context": "http://schema.org", "@type": "Person", "@id": "alice.id", "name": "Alice"})
    }

    #[tokio::test]
    async fn test_happy_path() {
        let key = PrivateKey::generate();
        let http = MockHttp::new().route(TOKEN_URL, 200, signed_file(&key, &person()));
        let zone = make_profile_zone_file("alice.id", TOKEN_URL).unwrap();

        let profile = resolve_zone_file_to_profile(&http, &zone, &key.address())
            .await
            .unwrap();
        assert_eq!(profile.name.as_deref(), Some("Alice"));
        assert_eq!(profile.id, "alice.id");
    }

    #[tokio::test]
    async fn test_scheme_less_target_is_fetched_over_https() {
        let key = PrivateKey::generate();
        let http = MockHttp::new().route(TOKEN_URL, 200, signed_file(&key, &person()));
        let zone = "$ORIGIN alice.id\n$TTL 3600\n_http._tcp IN URI 10 1 \"hub.example/alice/profile.json\"\n";

        assert!(resolve_zone_file_to_profile(&http, zone, &key.address())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_legacy_zone_file() {
        let http = MockHttp::new();
        let zone = r#"{"name": {"formatted": "Old Timer"}, "bio": "since 2014"}"#;
        let profile = resolve_zone_file_to_profile(&http, zone, "1Anything")
            .await
            .unwrap();
        assert_eq!(profile.name.as_deref(), Some("Old Timer"));
        assert_eq!(profile.context, "http://schema.org/");

        let flat = r#"{"name": "flat string", "bio": "since 2014"}"#;
        let profile = resolve_zone_file_to_profile(&http, flat, "1Anything")
            .await
            .unwrap();
        assert!(profile.name.is_none());
        assert_eq!(profile.description.as_deref(), Some("since 2014"));
    }

    #[tokio::test]
    async fn test_pretty_printed_legacy_zone_file() {
        let http = MockHttp::new();
        let zone = "{\n  \"name\": {\"formatted\": \"Old Timer\"},\n  \"bio\": \"URI\"\n}\n";
        let profile = resolve_zone_file_to_profile(&http, zone, "1Anything")
            .await
            .unwrap();
        assert_eq!(profile.name.as_deref(), Some("Old Timer"));
        assert_eq!(profile.description.as_deref(), Some("URI"));
    }

    #[tokio::test]
    async fn test_broken_json_keeps_zone_file_error() {
        let http = MockHttp::new();
        let zone = "{\"name\": {\"formatted\": \"A\"},\n$TTL soon\n}";
        assert!(matches!(
            resolve_zone_file_to_profile(&http, zone, "1A").await,
            Err(ResolveError::MalformedZoneFile(_))
        ));
    }

    #[tokio::test]
    async fn test_unrecognized_and_missing_url() {
        let http = MockHttp::new();
        assert!(matches!(
            resolve_zone_file_to_profile(&http, "just some words", "1A").await,
            Err(ResolveError::UnrecognizedProfileFormat(_))
        ));
        assert!(matches!(
            resolve_zone_file_to_profile(&http, "$ORIGIN alice.id\n$TTL 3600\n", "1A").await,
            Err(ResolveError::MissingTokenFileUrl)
        ));
        assert!(matches!(
            resolve_zone_file_to_profile(&http, "$TTL forever\n", "1A").await,
            Err(ResolveError::MalformedZoneFile(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_failures() {
        let zone = make_profile_zone_file("alice.id", TOKEN_URL).unwrap();

        let missing = MockHttp::new();
        match resolve_zone_file_to_profile(&missing, &zone, "1A").await {
            Err(ResolveError::TokenFileFetchFailed { url, source }) => {
                assert_eq!(url, TOKEN_URL);
                assert!(matches!(source, HttpError::Status { status: 404, .. }));
            }
            other => panic!("unexpected {other:?}"),
        }

        let refused = MockHttp::new().fail(TOKEN_URL);
        assert!(matches!(
            resolve_zone_file_to_profile(&refused, &zone, "1A").await,
            Err(ResolveError::TokenFileFetchFailed {
                source: HttpError::Transport { .. },
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_bad_envelopes() {
        let zone = make_profile_zone_file("alice.id", TOKEN_URL).unwrap();
        for (body, expected) in [
            ("[]", TokenFileError::Empty),
            ("[{}]", TokenFileError::MissingToken),
            ("{}", TokenFileError::NotAnArray),
            ("<html>", TokenFileError::NotJson),
        ] {
            let http = MockHttp::new().route(TOKEN_URL, 200, body);
            match resolve_zone_file_to_profile(&http, &zone, "1A").await {
                Err(ResolveError::InvalidProfileToken { reason, body: got }) => {
                    assert_eq!(reason, expected);
                    assert_eq!(got, body);
                }
                other => panic!("{body}: unexpected {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_wrong_owner_keeps_token_error_kind() {
        let key = PrivateKey::generate();
        let other = PrivateKey::generate();
        let http = MockHttp::new().route(TOKEN_URL, 200, signed_file(&key, &person()));
        let zone = make_profile_zone_file("alice.id", TOKEN_URL).unwrap();

        assert!(matches!(
            resolve_zone_file_to_profile(&http, &zone, &other.address()).await,
            Err(ResolveError::Token(TokenError::IssuerMismatch { .. }))
        ));
    }

    #[tokio::test]
    async fn test_claim_that_is_not_a_profile() {
        let key = PrivateKey::generate();
        let http = MockHttp::new().route(TOKEN_URL, 200, signed_file(&key, &json!("a string")));
        let zone = make_profile_zone_file("alice.id", TOKEN_URL).unwrap();

        assert!(matches!(
            resolve_zone_file_to_profile(&http, &zone, &key.address()).await,
            Err(ResolveError::InvalidProfileDocument(_))
        ));
    }
}
