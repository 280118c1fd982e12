//! # Storage
//!
//! Per-user, per-app files on a storage hub. [`StorageHub`] is the hub
//! contract, [`GaiaHubClient`] its HTTP implementation, and [`Storage`] the
//! file API apps use.

pub mod files;
pub mod hub;

pub use files::Storage;
pub use hub::{full_read_url, GaiaHubClient, HubConfig, StorageHub};

use crate::crypto::{EciesError, KeyError};
use crate::error::NotImplementedError;
use crate::network::HttpError;
use crate::profile::ResolveError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The hub answered with a status we cannot work with.
    #[error("{url} failed with HTTP status {status}")]
    RemoteService { url: String, status: u16 },

    #[error("unexpected response from storage hub: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Ecies(#[from] EciesError),

    #[error("cipher object JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    NotImplemented(#[from] NotImplementedError),
}
