//! # Social Proofs
//!
//! A profile's `account` entries can point at a public post ("proof") on a
//! social network that ties the account to the name or owner address.
//! [`validate_proofs`] fetches every supported proof concurrently and
//! reports which ones hold up.
//!
//! Failures while fetching or reading a proof never fail the batch: that
//! proof just comes back with `valid: false`.

pub mod services;
pub mod statement;

pub use services::{og_description, proof_service, ProofError, ProofService};
pub use statement::{contains_valid_address_proof_statement, contains_valid_proof_statement};

use crate::error::ParameterError;
use crate::network::http::HttpClient;
use crate::profile::document::{Account, ProfileDocument};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Outcome of checking one account's proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    pub service: String,
    pub identifier: String,
    pub proof_url: String,
    pub valid: bool,
}

/// A not-yet-validated proof for `account`, if it describes one we can check.
fn candidate(account: &Account) -> Option<(&'static dyn ProofService, Proof)> {
    let service = proof_service(account.service.as_deref()?)?;
    if account.proof_type.as_deref() != Some("http") {
        return None;
    }
    Some((
        service,
        Proof {
            service: service.name().to_string(),
            identifier: account.identifier.clone()?,
            proof_url: account.proof_url.clone()?,
            valid: false,
        },
    ))
}

async fn validate_one(
    http: &dyn HttpClient,
    service: &dyn ProofService,
    mut proof: Proof,
    owner_address: &str,
    name: Option<&str>,
) -> Proof {
    let url = match service.proof_url(&proof) {
        Ok(url) => url,
        Err(e) => {
            warn!(error = %e, "skipping proof");
            return proof;
        }
    };

    let body = match http.get(&url).await {
        Ok(response) if response.status == 200 => response.text(),
        Ok(response) => {
            warn!(%url, status = response.status, "unexpected status fetching proof");
            return proof;
        }
        Err(e) => {
            warn!(%url, error = %e, "error fetching proof");
            return proof;
        }
    };

    if service.should_validate_identity_in_body() && service.proof_identity(&body) != proof.identifier {
        debug!(%url, "proof page names a different account");
        return proof;
    }

    let statement = service.proof_statement(&body);
    // `name` was checked up front, so the statement check cannot fail here.
    let names_match = name
        .map(|n| contains_valid_proof_statement(&statement, n).unwrap_or(false))
        .unwrap_or(false);
    proof.valid = names_match || contains_valid_address_proof_statement(&statement, owner_address);
    debug!(service = %proof.service, valid = proof.valid, "proof checked");
    proof
}

/// Validate every `http` proof in `profile` for a supported service.
///
/// Proofs are fetched concurrently and returned in account order.
/// `name`, when given, must be fully qualified.
pub async fn validate_proofs(
    http: &dyn HttpClient,
    profile: &ProfileDocument,
    owner_address: &str,
    name: Option<&str>,
) -> Result<Vec<Proof>, ParameterError> {
    if let Some(name) = name {
        contains_valid_proof_statement("", name)?;
    }
    let Some(accounts) = &profile.account else {
        return Ok(Vec::new());
    };

    let checks = accounts
        .iter()
        .filter_map(candidate)
        .map(|(service, proof)| validate_one(http, service, proof, owner_address, name));
    Ok(join_all(checks).await)
}
