//! # Transit Keys
//!
//! An app signs its auth request with a throwaway "transit" key and later
//! needs the same key to decrypt the secrets in the response. Whatever
//! generates that key must also persist it before the request leaves the
//! process, so generation and storage are one operation on the store.

use crate::crypto::keys::{KeyError, PrivateKey};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TransitKeyError {
    #[error("transit key storage failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored transit key is unusable: {0}")]
    InvalidKey(#[from] KeyError),
}

/// Persistence for the app's transit key.
#[async_trait]
pub trait TransitKeyStore: Send + Sync {
    /// Generate a fresh key, persist it, and return its hex form.
    async fn generate_and_store(&self) -> Result<String, TransitKeyError>;

    /// The stored key, if any.
    async fn load(&self) -> Result<Option<String>, TransitKeyError>;
}

// ---------------------------------------------------------------------------
// Memory
// ---------------------------------------------------------------------------

/// Process-local store. Handy for tests and short-lived tools.
#[derive(Default)]
pub struct MemoryTransitKeyStore {
    key: Mutex<Option<String>>,
}

impl MemoryTransitKeyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransitKeyStore for MemoryTransitKeyStore {
    async fn generate_and_store(&self) -> Result<String, TransitKeyError> {
        let key = PrivateKey::generate().to_hex();
        *self.key.lock() = Some(key.clone());
        Ok(key)
    }

    async fn load(&self) -> Result<Option<String>, TransitKeyError> {
        Ok(self.key.lock().clone())
    }
}

// ---------------------------------------------------------------------------
// File
// ---------------------------------------------------------------------------

/// Keeps the key as hex text in a single file.
#[derive(Debug, Clone)]
pub struct FileTransitKeyStore {
    path: PathBuf,
}

impl FileTransitKeyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TransitKeyStore for FileTransitKeyStore {
    async fn generate_and_store(&self) -> Result<String, TransitKeyError> {
        let key = PrivateKey::generate().to_hex();
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, &key).await?;
        debug!(path = %self.path.display(), "stored new transit key");
        Ok(key)
    }

    async fn load(&self) -> Result<Option<String>, TransitKeyError> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let key = text.trim();
        PrivateKey::from_hex(key)?;
        Ok(Some(key.to_string()))
    }
}
