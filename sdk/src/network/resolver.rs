//! # Name Resolution
//!
//! A [`NameResolver`] answers two questions about a registered name: what
//! its zone file is and who owns it. [`CoreNodeClient`] asks a core node's
//! REST API:
//!
//! | Call | Endpoint |
//! |------|----------|
//! | `get_name_info` | `GET {core}/v1/names/{name}` |
//! | `get_zone_file` | `GET {core}/v1/names/{name}/zonefile` |
//!
//! A 404 from either endpoint means the name is not registered and maps to
//! [`NameLookupError::NotFound`]. The name is pushed as a single
//! percent-encoded path segment, so `/`, `?` and `#` in it stay inside it.

use crate::config::ClientConfig;
use crate::network::http::{HttpClient, HttpError, HttpResponse};
use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum NameLookupError {
    #[error("name {name} is not registered")]
    NotFound { name: String },

    #[error("cannot build a name URL from core node base {base}")]
    InvalidCoreNodeUrl { base: String },

    #[error(transparent)]
    Http(#[from] HttpError),
}

/// Zone file lookup result. Either field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneFileResponse {
    #[serde(default)]
    pub zonefile: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Registration record for a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameInfo {
    /// Current owner address.
    pub address: String,
    #[serde(default)]
    pub blockchain: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub expire_block: Option<i64>,
    #[serde(default)]
    pub last_txid: Option<String>,
    #[serde(default)]
    pub zonefile: Option<String>,
    #[serde(default)]
    pub zonefile_hash: Option<String>,
}

#[async_trait]
pub trait NameResolver: Send + Sync {
    async fn get_zone_file(&self, name: &str) -> Result<ZoneFileResponse, NameLookupError>;
    async fn get_name_info(&self, name: &str) -> Result<NameInfo, NameLookupError>;
}

// ---------------------------------------------------------------------------
// Core node client
// ---------------------------------------------------------------------------

/// [`NameResolver`] backed by a core node.
#[derive(Clone)]
pub struct CoreNodeClient {
    http: Arc<dyn HttpClient>,
    base_url: String,
}

impl CoreNodeClient {
    pub fn new(http: Arc<dyn HttpClient>, config: &ClientConfig) -> Self {
        Self {
            http,
            base_url: config.name_lookup_url(),
        }
    }

    /// `{base}/{name}[/{suffix}]` with `name` as one encoded segment.
    fn name_url(&self, name: &str, suffix: Option<&str>) -> Result<String, NameLookupError> {
        let invalid = || NameLookupError::InvalidCoreNodeUrl {
            base: self.base_url.clone(),
        };
        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| invalid())?;
            segments.pop_if_empty().push(name);
            if let Some(suffix) = suffix {
                segments.push(suffix);
            }
        }
        Ok(url.to_string())
    }

    async fn fetch(&self, name: &str, url: &str) -> Result<HttpResponse, NameLookupError> {
        debug!(name, url, "querying core node");
        let response = self.http.get(url).await?;
        if response.status == 404 {
            return Err(NameLookupError::NotFound {
                name: name.to_string(),
            });
        }
        Ok(response.error_for_status()?)
    }
}

#[async_trait]
impl NameResolver for CoreNodeClient {
    async fn get_zone_file(&self, name: &str) -> Result<ZoneFileResponse, NameLookupError> {
        let url = self.name_url(name, Some("zonefile"))?;
        let response = self.fetch(name, &url).await?;
        Ok(response.json()?)
    }

    async fn get_name_info(&self, name: &str) -> Result<NameInfo, NameLookupError> {
        let url = self.name_url(name, None)?;
        let response = self.fetch(name, &url).await?;
        Ok(response.json()?)
    }
}
