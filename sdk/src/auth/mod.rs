//! # Authentication
//!
//! Building, signing, and verifying the request/response pair of the
//! decentralized sign-in flow, plus the transit key persistence the app
//! side needs in between.

pub mod messages;
pub mod transit;
pub mod verification;

pub use messages::{
    decrypt_private_key, encrypt_private_key, make_auth_request, make_auth_request_with_store,
    make_auth_response, AuthError, AuthMetadata, AuthRequestParams, AuthRequestPayload,
    AuthResponseExtension, AuthResponseParams, AuthResponsePayload,
};
pub use transit::{FileTransitKeyStore, MemoryTransitKeyStore, TransitKeyError, TransitKeyStore};
pub use verification::{
    do_public_keys_match_issuer, do_public_keys_match_username, do_signatures_match_public_keys,
    is_expiration_date_valid, is_issuance_date_valid, is_manifest_uri_valid, is_redirect_uri_valid,
    verify_auth_request, verify_auth_response, VerificationError,
};
