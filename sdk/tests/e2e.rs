//! End-to-end integration tests for the stackid SDK.
//!
//! These walk the public API the way an application would: publish a
//! profile (sign, wrap, zone file), resolve it back through a name lookup,
//! and run the sign-in and storage flows on top. All network traffic goes
//! to an in-memory [`HttpClient`] so every test is hermetic.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use stackid::auth::{
    decrypt_private_key, make_auth_request, make_auth_response, verify_auth_request,
    verify_auth_response, AuthRequestParams, AuthResponseParams,
};
use stackid::config::ClientConfig;
use stackid::crypto::{decrypt_ecies, encrypt_ecies, EciesError, Plaintext, PrivateKey};
use stackid::identity::{DecentralizedId, DidError, DidType};
use stackid::network::{CoreNodeClient, HttpClient, HttpError, HttpResponse};
use stackid::profile::{lookup_profile, resolve_zone_file_to_profile, ResolveError};
use stackid::storage::{GaiaHubClient, Storage, StorageHub};
use stackid::token::{
    make_token_file, sign_profile_token, verify_profile_token, SignOptions, TokenError,
    TokenFileError,
};
use stackid::zonefile::{make_profile_zone_file, ZoneFileRecord};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

/// Serves canned bodies by URL, 404 for everything else. POSTs are stored
/// so a later GET of the hub read URL returns what was uploaded.
#[derive(Default)]
struct FakeWeb {
    pages: Mutex<HashMap<String, (u16, Vec<u8>)>>,
}

impl FakeWeb {
    fn serve(&self, url: &str, body: impl Into<Vec<u8>>) {
        self.pages.lock().insert(url.to_string(), (200, body.into()));
    }
}

#[async_trait]
impl HttpClient for FakeWeb {
    async fn get(&self, url: &str) -> Result<HttpResponse, HttpError> {
        Ok(match self.pages.lock().get(url) {
            Some((status, body)) => HttpResponse::with_status(url, *status, body.clone()),
            None => HttpResponse::with_status(url, 404, ""),
        })
    }

    async fn post(
        &self,
        url: &str,
        body: Vec<u8>,
        _headers: &[(&str, &str)],
    ) -> Result<HttpResponse, HttpError> {
        // {server}/store/{address}/{path} → {read prefix}{address}/{path}
        let read_url = url.replace("https://hub.test/store/", "https://read.test/");
        self.serve(&read_url, body);
        let reply = json!({ "publicURL": read_url }).to_string();
        Ok(HttpResponse::ok(url, reply))
    }
}

fn john_doe() -> Value {
    json!({
        "@context": "http://schema.org",
        "@type": "Person",
        "@id": "some-name.id",
        "name": "John Doe"
    })
}

fn signed_token_file(key: &PrivateKey, claim: &Value) -> String {
    let token = sign_profile_token(claim, &key.to_hex(), SignOptions::default()).unwrap();
    make_token_file(&[token]).unwrap()
}

// ---------------------------------------------------------------------------
// Profile resolution
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_end_to_end_scenario() {
    let key = PrivateKey::generate();
    let web = FakeWeb::default();
    web.serve("https://host/hub/ADDR/0/profile.json", signed_token_file(&key, &john_doe()));

    let zone_file = "$ORIGIN some-name.id\n$TTL 3600\n_http._tcp IN URI 10 1 \"https://host/hub/ADDR/0/profile.json\"\n";
    let profile = resolve_zone_file_to_profile(&web, zone_file, &key.address())
        .await
        .unwrap();

    assert_eq!(profile.to_json().unwrap(), john_doe());
}

#[tokio::test]
async fn test_legacy_fallback() {
    let web = FakeWeb::default();
    let legacy = r#"{"name": {"formatted": "John Doe"}, "bio": "hi"}"#;
    let profile = resolve_zone_file_to_profile(&web, legacy, "1Whatever")
        .await
        .unwrap();
    assert_eq!(profile.name.as_deref(), Some("John Doe"));
    assert_eq!(profile.type_, "Person");
}

#[tokio::test]
async fn test_empty_envelopes_are_rejected() {
    let url = "https://hub.test/profile.json";
    let zone_file = make_profile_zone_file("some-name.id", url).unwrap();

    for (body, reason) in [("[]", TokenFileError::Empty), ("[{}]", TokenFileError::MissingToken)] {
        let web = FakeWeb::default();
        web.serve(url, body);
        match resolve_zone_file_to_profile(&web, &zone_file, "1A").await {
            Err(ResolveError::InvalidProfileToken { reason: got, .. }) => assert_eq!(got, reason),
            other => panic!("{body}: expected InvalidProfileToken, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_lookup_through_core_node() {
    let key = PrivateKey::generate();
    let web = Arc::new(FakeWeb::default());
    let token_url = "https://hub.test/some-name/profile.json";
    web.serve(token_url, signed_token_file(&key, &john_doe()));
    web.serve(
        "https://core.test/v1/names/some-name.id/zonefile",
        json!({ "zonefile": make_profile_zone_file("some-name.id", token_url).unwrap() }).to_string(),
    );
    web.serve(
        "https://core.test/v1/names/some-name.id",
        json!({ "address": key.address(), "status": "registered" }).to_string(),
    );

    let core = CoreNodeClient::new(web.clone(), &ClientConfig::with_core_node("https://core.test"));
    let profile = lookup_profile(&core, web.as_ref(), "some-name.id")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.name.as_deref(), Some("John Doe"));

    assert!(lookup_profile(&core, web.as_ref(), "unknown.id")
        .await
        .unwrap()
        .is_none());
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

#[test]
fn test_token_round_trip_both_address_forms() {
    let key = PrivateKey::generate();
    let token = sign_profile_token(&john_doe(), &key.to_hex(), SignOptions::default()).unwrap();
    let forms = key.public_key().address_forms();

    for expected in [forms.compressed, forms.uncompressed] {
        let decoded = verify_profile_token(&token, &expected).unwrap();
        assert_eq!(decoded.payload["claim"], john_doe());
    }
}

#[test]
fn test_every_signature_byte_is_covered() {
    let key = PrivateKey::generate();
    let token = sign_profile_token(&john_doe(), &key.to_hex(), SignOptions::default()).unwrap();
    let (head, signature) = token.rsplit_once('.').unwrap();
    let raw = base64::decode_config(signature, base64::URL_SAFE_NO_PAD).unwrap();

    for index in 0..raw.len() {
        let mut tampered = raw.clone();
        tampered[index] ^= 0x80;
        let token = format!(
            "{head}.{}",
            base64::encode_config(&tampered, base64::URL_SAFE_NO_PAD)
        );
        assert!(
            matches!(
                verify_profile_token(&token, &key.address()),
                Err(TokenError::SignatureVerificationFailed)
            ),
            "byte {index}"
        );
    }
}

#[test]
fn test_issuer_mismatch_is_not_a_signature_failure() {
    let key = PrivateKey::generate();
    let stranger = PrivateKey::generate();
    let token = sign_profile_token(&john_doe(), &key.to_hex(), SignOptions::default()).unwrap();
    assert!(matches!(
        verify_profile_token(&token, &stranger.public_key().to_hex()),
        Err(TokenError::IssuerMismatch { .. })
    ));
}

// ---------------------------------------------------------------------------
// Identifiers, zone files, ECIES
// ---------------------------------------------------------------------------

#[test]
fn test_did_round_trip_and_rejection() {
    for (did_type, identifier) in [
        (DidType::BtcAddr, "1NZNxhoxobqwsNvTb16pdeiqvFvce3Yg8U"),
        (DidType::EcdsaPub, "02abcdef"),
        (DidType::Other("web".into()), "example.com"),
    ] {
        let did = DecentralizedId::new(did_type.clone(), identifier).unwrap();
        let parsed: DecentralizedId = did.to_string().parse().unwrap();
        assert_eq!(parsed.did_type(), &did_type);
        assert_eq!(parsed.identifier(), identifier);
    }

    for bad in ["did:1:2:3", "did:1", "", "no-did:1:2"] {
        assert!(matches!(
            bad.parse::<DecentralizedId>(),
            Err(DidError::MalformedIdentifier(_))
        ));
    }

    let ecdsa: DecentralizedId = "did:ecdsa-pub:02abcdef".parse().unwrap();
    assert!(matches!(ecdsa.address(), Err(DidError::TypeMismatch { .. })));
}

#[test]
fn test_zone_file_round_trip() {
    let with_scheme = make_profile_zone_file("some-name.id", "http://example.com/p.json").unwrap();
    let record = ZoneFileRecord::from_text(&with_scheme).unwrap();
    assert_eq!(record.origin(), "some-name.id");
    assert_eq!(record.token_file_url(), "http://example.com/p.json");

    let scheme_less = make_profile_zone_file("some-name.id", "example.com/p.json").unwrap();
    assert_eq!(
        ZoneFileRecord::from_text(&scheme_less).unwrap().token_file_url(),
        "https://example.com/p.json"
    );
}

#[test]
fn test_ecies_integrity() {
    let key = PrivateKey::generate();
    let public = key.public_key().to_hex();

    let cipher = encrypt_ecies(&public, "attack at dawn").unwrap();
    assert_eq!(
        decrypt_ecies(&key.to_hex(), &cipher).unwrap(),
        Plaintext::Text("attack at dawn".into())
    );

    let mut corrupted = cipher.clone();
    let flipped = if corrupted.mac.starts_with('0') { "1" } else { "0" };
    corrupted.mac.replace_range(0..1, flipped);
    assert!(matches!(
        decrypt_ecies(&key.to_hex(), &corrupted),
        Err(EciesError::MacValidation)
    ));
}

// ---------------------------------------------------------------------------
// Sign-in and storage
// ---------------------------------------------------------------------------

#[test]
fn test_sign_in_round_trip() {
    let transit = PrivateKey::generate();
    let request = make_auth_request(&transit.to_hex(), &AuthRequestParams::for_origin("https://app.test")).unwrap();
    let request = verify_auth_request(&request).unwrap();

    let identity = PrivateKey::generate();
    let app_key = PrivateKey::generate().to_hex();
    let response = make_auth_response(
        &identity.to_hex(),
        &AuthResponseParams {
            profile: john_doe(),
            username: Some("some-name.id".into()),
            app_private_key: Some(app_key.clone()),
            transit_public_key: Some(request.public_keys[0].clone()),
            hub_url: Some("https://hub.test".into()),
            ..AuthResponseParams::default()
        },
    )
    .unwrap();

    let response = verify_auth_response(&response).unwrap();
    assert_eq!(response.version(), Some("1.1.0"));
    assert_eq!(response.profile, john_doe());
    let sealed = response.private_key.unwrap();
    assert_eq!(decrypt_private_key(&transit.to_hex(), &sealed).unwrap(), app_key);
}

#[tokio::test]
async fn test_storage_round_trip() {
    let web = Arc::new(FakeWeb::default());
    web.serve(
        "https://hub.test/hub_info",
        json!({"challenge_text": "please sign", "read_url_prefix": "https://read.test/"}).to_string(),
    );
    let hub: Arc<dyn StorageHub> = Arc::new(GaiaHubClient::new(web.clone()));
    let core = Arc::new(CoreNodeClient::new(web.clone(), &ClientConfig::default()));
    let app_key = PrivateKey::generate().to_hex();

    let storage = Storage::connect(hub, web.clone(), core, "https://hub.test", &app_key)
        .await
        .unwrap();

    let url = storage.put_file("notes/today.txt", "buy milk", false).await.unwrap();
    assert!(url.starts_with("https://read.test/"));
    assert_eq!(
        storage.get_file("notes/today.txt", false).await.unwrap(),
        Some(Plaintext::Text("buy milk".into()))
    );

    storage.put_file("secret.json", "pin 1234", true).await.unwrap();
    assert_eq!(
        storage.get_file("secret.json", true).await.unwrap(),
        Some(Plaintext::Text("pin 1234".into()))
    );

    assert_eq!(storage.get_file("missing.txt", false).await.unwrap(), None);
    assert!(storage.delete_file("notes/today.txt").is_err());
}
