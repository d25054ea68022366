//! AES-GCM password encryption helpers.
//!
//! Four stateless operations, each taking and returning plain strings so they
//! can sit behind any UI or network layer:
//!
//! - [`generate_key`]: fresh 256-bit key, base64 encoded.
//! - [`encrypt`]: `base64(nonce || ciphertext || tag)` under a base64 key.
//! - [`decrypt`]: the inverse; every failure is the same [`CipherError::Decryption`].
//! - [`validate_password`]: boolean strength check.
//!
//! The free functions use the default [`CipherSuite`]. [`PasswordCipher`]
//! exposes the same operations as methods for callers that hold a suite value.

pub mod cipher;
mod encoding;
pub mod error;
pub mod key;
pub mod policy;

pub use cipher::{CipherSuite, PasswordCipher, NONCE_LEN, TAG_LEN};
pub use error::{CipherError, KeyError};
pub use key::{SecretKey, KEY_LEN};
pub use policy::validate_password;

/// Generate a fresh 256-bit key, base64 encoded.
pub fn generate_key() -> Result<String, CipherError> {
    PasswordCipher::default().generate_key()
}

/// Encrypt `plaintext` under the base64 `key`.
pub fn encrypt(plaintext: &str, key: &str) -> Result<String, CipherError> {
    PasswordCipher::default().encrypt(plaintext, key)
}

/// Decrypt `encoded` under the base64 `key`.
pub fn decrypt(encoded: &str, key: &str) -> Result<String, CipherError> {
    PasswordCipher::default().decrypt(encoded, key)
}
