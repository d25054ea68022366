//! AES-GCM encryption and decryption of short secret strings.
//!
//! # Encoded ciphertext format
//!
//! ```text
//! base64( nonce[12] || ciphertext || tag[16] )
//! ```
//!
//! Standard padded base64 on output; padding is optional on input. The bytes
//! are compatible with WebCrypto `AES-GCM` and `javax.crypto`
//! `AES/GCM/NoPadding` output. There is no version prefix and no
//! metadata; both sides agree on the [`CipherSuite`] constants.
//!
//! **Every encryption draws a fresh random nonce.** GCM nonce reuse under one
//! key breaks both confidentiality and authentication.

use aes_gcm::{
    aead::{consts::U12, rand_core::RngCore, Aead, KeyInit, OsRng},
    Aes128Gcm, Aes256Gcm, AesGcm, Nonce,
};
use aes::Aes192;
use tracing::error;

use crate::encoding;
use crate::error::CipherError;
use crate::key::SecretKey;
use crate::policy;

/// Byte length of an AES-GCM nonce (12 bytes = 96 bits).
pub const NONCE_LEN: usize = 12;

/// Byte length of the GCM authentication tag (16 bytes = 128 bits).
pub const TAG_LEN: usize = 16;

type Aes192Gcm = AesGcm<Aes192, U12>;

/// Fixed parameters shared by the encrypt and decrypt paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CipherSuite {
    algorithm: &'static str,
    nonce_len: usize,
    tag_len: usize,
}

impl CipherSuite {
    /// AES-GCM with a 96-bit nonce and a 128-bit tag.
    pub const AES_GCM: Self = Self {
        algorithm: "AES-GCM",
        nonce_len: NONCE_LEN,
        tag_len: TAG_LEN,
    };

    pub fn algorithm(&self) -> &'static str {
        self.algorithm
    }

    pub fn nonce_len(&self) -> usize {
        self.nonce_len
    }

    pub fn tag_len(&self) -> usize {
        self.tag_len
    }

    /// Bytes added to every plaintext: nonce plus tag.
    pub fn overhead(&self) -> usize {
        self.nonce_len + self.tag_len
    }
}

impl Default for CipherSuite {
    fn default() -> Self {
        Self::AES_GCM
    }
}

/// Stateless password cipher.
///
/// Holds only its [`CipherSuite`]; cloning is free and every method may be
/// called concurrently from any number of threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordCipher {
    suite: CipherSuite,
}

impl PasswordCipher {
    pub fn new(suite: CipherSuite) -> Self {
        Self { suite }
    }

    pub fn suite(&self) -> CipherSuite {
        self.suite
    }

    /// Generate a fresh 256-bit key, base64 encoded.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::KeyGeneration`] if the OS random source fails.
    pub fn generate_key(&self) -> Result<String, CipherError> {
        SecretKey::generate().map(|k| k.to_base64())
    }

    /// Encrypt `plaintext` under the base64 `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Encryption`] if the key cannot be imported or the
    /// primitive fails. The plaintext content never causes a failure.
    pub fn encrypt(&self, plaintext: &str, key: &str) -> Result<String, CipherError> {
        let key = SecretKey::from_base64(key).map_err(|_| CipherError::Encryption)?;
        self.encrypt_with(plaintext, &key)
    }

    /// Encrypt `plaintext` under an already imported key.
    pub fn encrypt_with(&self, plaintext: &str, key: &SecretKey) -> Result<String, CipherError> {
        let engine = Engine::new(key).ok_or(CipherError::Encryption)?;

        let mut nonce = [0u8; NONCE_LEN];
        OsRng.try_fill_bytes(&mut nonce).map_err(|e| {
            error!(error = %e, "OS random source unavailable");
            CipherError::Encryption
        })?;

        // aes-gcm appends the tag to the ciphertext.
        let sealed = engine
            .seal(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|_| CipherError::Encryption)?;

        let mut out = Vec::with_capacity(self.suite.nonce_len + sealed.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);
        Ok(encoding::encode(out))
    }

    /// Decrypt an encoded ciphertext under the base64 `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Decryption`] for every failure: invalid base64,
    /// input shorter than nonce + tag, unusable or wrong key, tag mismatch, or
    /// a plaintext that is not UTF-8.
    pub fn decrypt(&self, encoded: &str, key: &str) -> Result<String, CipherError> {
        let key = SecretKey::from_base64(key).map_err(|_| CipherError::Decryption)?;
        self.decrypt_with(encoded, &key)
    }

    /// Decrypt an encoded ciphertext under an already imported key.
    pub fn decrypt_with(&self, encoded: &str, key: &SecretKey) -> Result<String, CipherError> {
        let raw = encoding::decode(encoded).map_err(|_| CipherError::Decryption)?;
        if raw.len() < self.suite.overhead() {
            return Err(CipherError::Decryption);
        }
        let (nonce, sealed) = raw.split_at(self.suite.nonce_len);

        let engine = Engine::new(key).ok_or(CipherError::Decryption)?;
        let plaintext = engine
            .open(Nonce::from_slice(nonce), sealed)
            .map_err(|_| CipherError::Decryption)?;

        String::from_utf8(plaintext).map_err(|_| CipherError::Decryption)
    }

    /// Check `candidate` against the password strength policy.
    pub fn validate_password(&self, candidate: &str) -> bool {
        policy::validate_password(candidate)
    }
}

/// AES-GCM instance keyed for one call, sized by the imported key.
///
/// The AES key schedule and GHASH key are zeroed when it drops.
enum Engine {
    Aes128(Aes128Gcm),
    Aes192(Aes192Gcm),
    Aes256(Aes256Gcm),
}

impl Engine {
    fn new(key: &SecretKey) -> Option<Self> {
        let bytes = key.as_bytes();
        match bytes.len() {
            16 => Aes128Gcm::new_from_slice(bytes).ok().map(Self::Aes128),
            24 => Aes192Gcm::new_from_slice(bytes).ok().map(Self::Aes192),
            32 => Aes256Gcm::new_from_slice(bytes).ok().map(Self::Aes256),
            _ => None,
        }
    }

    fn seal(&self, nonce: &Nonce<U12>, plaintext: &[u8]) -> aes_gcm::aead::Result<Vec<u8>> {
        match self {
            Self::Aes128(c) => c.encrypt(nonce, plaintext),
            Self::Aes192(c) => c.encrypt(nonce, plaintext),
            Self::Aes256(c) => c.encrypt(nonce, plaintext),
        }
    }

    fn open(&self, nonce: &Nonce<U12>, sealed: &[u8]) -> aes_gcm::aead::Result<Vec<u8>> {
        match self {
            Self::Aes128(c) => c.decrypt(nonce, sealed),
            Self::Aes192(c) => c.decrypt(nonce, sealed),
            Self::Aes256(c) => c.decrypt(nonce, sealed),
        }
    }
}
