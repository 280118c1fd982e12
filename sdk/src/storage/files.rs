//! # App Files
//!
//! [`Storage`] is what an app holds once the user has signed in: a hub
//! connection plus the app private key, with file-level operations on top.
//! Encryption is ECIES to the app key's own public key; encrypted files are
//! stored as JSON cipher objects.

use crate::crypto::ecies::{decrypt_ecies, encrypt_ecies, CipherObject, Plaintext};
use crate::crypto::keys::PrivateKey;
use crate::error::NotImplementedError;
use crate::network::http::HttpClient;
use crate::network::resolver::NameResolver;
use crate::profile::lookup_profile;
use crate::storage::hub::{full_read_url, HubConfig, StorageHub};
use crate::storage::StorageError;
use std::sync::Arc;
use tracing::{debug, info};

const TEXT_CONTENT_TYPE: &str = "text/plain";
const BINARY_CONTENT_TYPE: &str = "application/octet-stream";
const JSON_CONTENT_TYPE: &str = "application/json";

/// File operations against one app bucket.
pub struct Storage {
    hub: Arc<dyn StorageHub>,
    http: Arc<dyn HttpClient>,
    resolver: Arc<dyn NameResolver>,
    config: HubConfig,
    app_private_key: String,
}

impl Storage {
    /// Connect to `hub_url` with the app key and wrap the result.
    pub async fn connect(
        hub: Arc<dyn StorageHub>,
        http: Arc<dyn HttpClient>,
        resolver: Arc<dyn NameResolver>,
        hub_url: &str,
        app_private_key: &str,
    ) -> Result<Self, StorageError> {
        let config = hub.connect(hub_url, app_private_key).await?;
        Self::new(hub, http, resolver, config, app_private_key)
    }

    /// Use an existing hub connection.
    pub fn new(
        hub: Arc<dyn StorageHub>,
        http: Arc<dyn HttpClient>,
        resolver: Arc<dyn NameResolver>,
        config: HubConfig,
        app_private_key: &str,
    ) -> Result<Self, StorageError> {
        PrivateKey::from_hex(app_private_key)?;
        Ok(Self {
            hub,
            http,
            resolver,
            config,
            app_private_key: app_private_key.to_string(),
        })
    }

    pub fn hub_config(&self) -> &HubConfig {
        &self.config
    }

    /// Store `content` at `path`, optionally encrypted to the app key.
    /// Returns the public URL.
    pub async fn put_file(
        &self,
        path: &str,
        content: impl Into<Plaintext>,
        encrypt: bool,
    ) -> Result<String, StorageError> {
        let content = content.into();
        let (body, content_type) = if encrypt {
            let public_key = PrivateKey::from_hex(&self.app_private_key)?.public_key();
            let cipher = encrypt_ecies(&public_key.to_hex(), content)?;
            (serde_json::to_vec(&cipher)?, JSON_CONTENT_TYPE)
        } else {
            let content_type = match &content {
                Plaintext::Text(_) => TEXT_CONTENT_TYPE,
                Plaintext::Bytes(_) => BINARY_CONTENT_TYPE,
            };
            (content.into_bytes(), content_type)
        };
        self.hub.upload(path, body, &self.config, content_type).await
    }

    /// Read `path` from this app's bucket. A missing file is `Ok(None)`.
    pub async fn get_file(&self, path: &str, decrypt: bool) -> Result<Option<Plaintext>, StorageError> {
        let url = full_read_url(path, &self.config);
        self.fetch(&url, decrypt).await
    }

    /// Read `path` from the bucket `username` publishes for `app_origin`.
    ///
    /// `Ok(None)` when the name is unregistered, the profile lists no
    /// bucket for the app, or the file is missing. Other users' files are
    /// never decrypted with this app's key.
    pub async fn get_user_file(
        &self,
        path: &str,
        username: &str,
        app_origin: &str,
    ) -> Result<Option<Plaintext>, StorageError> {
        let Some(url) = self.user_app_file_url(path, username, app_origin).await? else {
            info!(username, app_origin, "no app bucket for user");
            return Ok(None);
        };
        self.fetch(&url, false).await
    }

    async fn fetch(&self, url: &str, decrypt: bool) -> Result<Option<Plaintext>, StorageError> {
        let response = self.http.get(url).await?;
        match response.status {
            200 => {}
            404 => {
                info!(url, "file not found");
                return Ok(None);
            }
            status => {
                return Err(StorageError::RemoteService {
                    url: url.to_string(),
                    status,
                })
            }
        }

        if decrypt {
            let cipher: CipherObject = serde_json::from_slice(&response.body)?;
            return Ok(Some(decrypt_ecies(&self.app_private_key, &cipher)?));
        }

        let is_text = match response.content_type.as_deref() {
            None => true,
            Some(ct) => ct.starts_with("text") || ct.starts_with(JSON_CONTENT_TYPE),
        };
        Ok(Some(if is_text {
            Plaintext::Text(response.text())
        } else {
            Plaintext::Bytes(response.body)
        }))
    }

    /// Public URL of `path` in the bucket `username` publishes for
    /// `app_origin`, found through their profile's `apps` map.
    pub async fn user_app_file_url(
        &self,
        path: &str,
        username: &str,
        app_origin: &str,
    ) -> Result<Option<String>, StorageError> {
        let Some(profile) =
            lookup_profile(self.resolver.as_ref(), self.http.as_ref(), username).await?
        else {
            return Ok(None);
        };
        let url = profile
            .app_bucket_url(app_origin)
            .map(|bucket| format!("{}/{path}", bucket.trim_end_matches('/')));
        debug!(username, app_origin, found = url.is_some(), "resolved app bucket");
        Ok(url)
    }

    /// Hubs have no delete operation.
    pub fn delete_file(&self, path: &str) -> Result<(), StorageError> {
        debug!(path, "delete requested");
        Err(NotImplementedError {
            operation: "delete_file",
            reason: "storage hubs do not support deletion",
        }
        .into())
    }
}
