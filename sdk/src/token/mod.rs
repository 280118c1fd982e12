//! # Signed Tokens
//!
//! [`jws`] is the compact ES256K encoding shared by every signed object the
//! SDK produces. [`profile_token`] layers the profile claim format and its
//! issuer-first verification on top.

pub mod jws;
pub mod profile_token;

pub use jws::{decode_token, sign_compact, verify_compact, DecodedToken, TokenError, TokenHeader};
pub use profile_token::{
    extract_claim, first_token, make_token_file, sign_profile_token, verify_profile_token,
    wrap_profile_token, ClaimVerification, SignOptions, TokenFileError, TokenParty, WrappedToken,
};
