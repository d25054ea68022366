//! [`KeyStore`]: thread-safe holder for the service's default key.

use std::sync::Arc;

use password_cipher::{KeyError, SecretKey};
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors produced by the key store.
#[derive(Debug, Error)]
pub enum KeyStoreError {
    /// No default key has been configured.
    #[error("default key not configured")]
    NotInitialised,

    /// The supplied key material could not be imported.
    #[error(transparent)]
    InvalidKey(#[from] KeyError),
}

/// Thread-safe store for the default key.
///
/// Wraps an `Arc<RwLock<Option<SecretKey>>>` so that request handlers can read
/// the key concurrently while a replacement is swapped in atomically.
#[derive(Clone, Debug, Default)]
pub struct KeyStore {
    inner: Arc<RwLock<Option<SecretKey>>>,
}

impl KeyStore {
    /// Create a new, empty [`KeyStore`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if a default key is currently held.
    pub async fn is_ready(&self) -> bool {
        self.inner.read().await.is_some()
    }

    /// Store (or replace) the default key from its base64 form.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::InvalidKey`] if the key cannot be imported; the
    /// previously held key is kept.
    pub async fn store_base64(&self, encoded: &str) -> Result<(), KeyStoreError> {
        let key = SecretKey::from_base64(encoded)?;
        *self.inner.write().await = Some(key);
        Ok(())
    }

    /// Borrow a clone of the default key.
    ///
    /// The clone is a short-lived copy; callers should use and drop it promptly.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::NotInitialised`] if no key has been stored.
    pub async fn current(&self) -> Result<SecretKey, KeyStoreError> {
        let lock = self.inner.read().await;
        lock.as_ref().cloned().ok_or(KeyStoreError::NotInitialised)
    }
}
