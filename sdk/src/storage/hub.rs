//! # Gaia Hub Client
//!
//! A hub hands out write access per address. Connecting is a challenge
//! round trip:
//!
//! ```text
//! GET  {hub}/hub_info            → {challenge_text, read_url_prefix}
//! sign sha256(challenge_text)    → DER signature
//! token = base64({"publickey": .., "signature": ..})
//! POST {server}/store/{address}/{path}   Authorization: bearer {token}
//! ```
//!
//! Hub identities always use the compressed public key and its address.

use crate::crypto::hash::sha256;
use crate::crypto::keys::PrivateKey;
use crate::network::http::{HttpClient, HttpResponse};
use crate::storage::StorageError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Everything needed to write to one bucket on a hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubConfig {
    pub address: String,
    pub url_prefix: String,
    pub token: String,
    pub server: String,
}

/// Public URL of `path` in the bucket described by `config`.
pub fn full_read_url(path: &str, config: &HubConfig) -> String {
    format!("{}{}/{}", config.url_prefix, config.address, path)
}

#[derive(Debug, Deserialize)]
struct HubInfo {
    read_url_prefix: String,
    challenge_text: String,
}

#[derive(Serialize)]
struct AuthToken<'a> {
    publickey: &'a str,
    signature: &'a str,
}

#[derive(Deserialize)]
struct UploadResponse {
    #[serde(rename = "publicURL")]
    public_url: String,
}

/// Where files go.
#[async_trait]
pub trait StorageHub: Send + Sync {
    /// Authenticate against the hub at `hub_url` with `challenge_signer_key`.
    async fn connect(&self, hub_url: &str, challenge_signer_key: &str) -> Result<HubConfig, StorageError>;

    /// Store `content` at `path`, returning its public URL.
    async fn upload(
        &self,
        path: &str,
        content: Vec<u8>,
        config: &HubConfig,
        content_type: &str,
    ) -> Result<String, StorageError>;
}

/// [`StorageHub`] speaking the Gaia HTTP protocol.
#[derive(Clone)]
pub struct GaiaHubClient {
    http: Arc<dyn HttpClient>,
}

fn hub_key(hex: &str) -> Result<(PrivateKey, String, String), StorageError> {
    let key = PrivateKey::from_hex(hex)?;
    let public_key = key.public_key();
    let compressed_hex = hex::encode(public_key.serialize(true));
    let address = public_key.address_forms().compressed;
    Ok((key, compressed_hex, address))
}

fn require_success(response: HttpResponse) -> Result<HttpResponse, StorageError> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(StorageError::RemoteService {
            url: response.url,
            status: response.status,
        })
    }
}

impl GaiaHubClient {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self { http }
    }

    async fn hub_info(&self, hub_url: &str) -> Result<HubInfo, StorageError> {
        let url = format!("{}/hub_info", hub_url.trim_end_matches('/'));
        let response = require_success(self.http.get(&url).await?)?;
        Ok(response.json()?)
    }

    /// Read URL of the bucket `app_private_key` writes to on `hub_url`.
    pub async fn bucket_url(&self, hub_url: &str, app_private_key: &str) -> Result<String, StorageError> {
        let (_, _, address) = hub_key(app_private_key)?;
        let info = self.hub_info(hub_url).await?;
        Ok(format!("{}{address}/", info.read_url_prefix))
    }
}

#[async_trait]
impl StorageHub for GaiaHubClient {
    async fn connect(&self, hub_url: &str, challenge_signer_key: &str) -> Result<HubConfig, StorageError> {
        info!(hub = hub_url, "connecting to storage hub");
        let (key, publickey, address) = hub_key(challenge_signer_key)?;
        let info = self.hub_info(hub_url).await?;

        let signature = key.sign_prehash(&sha256(info.challenge_text.as_bytes()))?;
        let signature = hex::encode(signature.to_der().as_bytes());
        let token = serde_json::to_vec(&AuthToken {
            publickey: &publickey,
            signature: &signature,
        })
        .map_err(|e| StorageError::InvalidResponse(e.to_string()))?;

        Ok(HubConfig {
            address,
            url_prefix: info.read_url_prefix,
            token: base64::encode(token),
            server: hub_url.trim_end_matches('/').to_string(),
        })
    }

    async fn upload(
        &self,
        path: &str,
        content: Vec<u8>,
        config: &HubConfig,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let url = format!("{}/store/{}/{}", config.server, config.address, path);
        info!(%url, bytes = content.len(), "uploading to storage hub");
        let authorization = format!("bearer {}", config.token);
        let headers = [
            ("Authorization", authorization.as_str()),
            ("Content-Type", content_type),
        ];
        let response = require_success(self.http.post(&url, content, &headers).await?)?;
        let body: UploadResponse = response.json()?;
        Ok(body.public_url)
    }
}
