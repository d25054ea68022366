//! [`SecretKey`]: raw AES key material with base64 import and export.

use aes_gcm::aead::{rand_core::RngCore, OsRng};
use tracing::error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::encoding;
use crate::error::{CipherError, KeyError};

/// Byte length of a generated key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Raw key lengths accepted on import: AES-128, AES-192 and AES-256.
pub const SUPPORTED_KEY_LENS: [usize; 3] = [16, 24, 32];

/// Symmetric key bytes.
///
/// When this type is dropped, the memory is overwritten with zeroes to
/// minimise the window during which key material lives in RAM. The AES key
/// schedules built from it are wiped on drop as well.
#[derive(Clone)]
pub struct SecretKey(Box<[u8]>);

impl SecretKey {
    /// Draw a fresh [`KEY_LEN`]-byte key from the OS CSPRNG.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::KeyGeneration`] if the random source fails.
    pub fn generate() -> Result<Self, CipherError> {
        let mut buf = vec![0u8; KEY_LEN].into_boxed_slice();
        OsRng.try_fill_bytes(&mut buf).map_err(|e| {
            error!(error = %e, "OS random source unavailable");
            CipherError::KeyGeneration
        })?;
        Ok(Self(buf))
    }

    /// Import raw key bytes.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::InvalidLength`] unless `bytes` is one of
    /// [`SUPPORTED_KEY_LENS`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        if !SUPPORTED_KEY_LENS.contains(&bytes.len()) {
            return Err(KeyError::InvalidLength(bytes.len()));
        }
        Ok(Self(bytes.into()))
    }

    /// Import a key from standard base64. Padding is optional.
    pub fn from_base64(encoded: &str) -> Result<Self, KeyError> {
        let mut bytes = encoding::decode(encoded).map_err(|_| KeyError::InvalidEncoding)?;
        let key = Self::from_bytes(&bytes);
        bytes.zeroize();
        key
    }

    /// Export the key as standard base64.
    pub fn to_base64(&self) -> String {
        encoding::encode(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl ZeroizeOnDrop for SecretKey {}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material, not even in debug builds.
        f.write_str("SecretKey([REDACTED])")
    }
}
