//! Shared application state injected into every Axum handler.

use password_cipher::PasswordCipher;

use crate::keys::KeyStore;

/// Application state shared across all request handlers.
///
/// All fields are cheaply cloneable so that Axum can clone the state for each
/// request without copying key material.
#[derive(Clone, Default)]
pub struct AppState {
    /// Stateless cipher carrying the fixed AES-GCM parameters.
    pub cipher: PasswordCipher,
    /// Default key used when a request does not supply one.
    pub key_store: KeyStore,
}

impl AppState {
    /// Create a new [`AppState`] from a cipher and key store.
    pub fn new(cipher: PasswordCipher, key_store: KeyStore) -> Self {
        Self { cipher, key_store }
    }
}
