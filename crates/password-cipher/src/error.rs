//! Error types for the cipher layer.

use thiserror::Error;

use crate::key::SUPPORTED_KEY_LENS;

/// Errors produced by the password cipher.
///
/// Variants carry no detail. In particular [`CipherError::Decryption`] is the
/// same value for malformed input, a wrong key, and a failed tag check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CipherError {
    /// The OS random source could not produce key material.
    #[error("key generation failed")]
    KeyGeneration,

    /// The key could not be imported or the AEAD primitive failed.
    #[error("encryption failed")]
    Encryption,

    /// The encoded ciphertext is invalid or has been tampered with.
    #[error("decryption failed")]
    Decryption,
}

/// Reasons a base64 key string cannot be imported.
///
/// Only surfaced where a descriptive message is safe, such as validating the
/// service configuration at startup. The encrypt and decrypt paths collapse it
/// into [`CipherError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("key is not valid base64")]
    InvalidEncoding,

    #[error("unsupported key length: {0} bytes (expected one of {SUPPORTED_KEY_LENS:?})")]
    InvalidLength(usize),
}
