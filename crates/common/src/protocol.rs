//! Request and response types exchanged with the cipher service.
//!
//! Keys and ciphertexts travel as standard base64 strings so that browser
//! callers can hand them straight to `atob`/`btoa`.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Key generation
// ---------------------------------------------------------------------------

/// Response body for `POST /keys`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyResponse {
    /// Freshly generated 256-bit key, base64 encoded.
    pub key: String,
}

// ---------------------------------------------------------------------------
// Encrypt / decrypt
// ---------------------------------------------------------------------------

/// Request body for `POST /encrypt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptRequest {
    /// The password to encrypt.
    pub plaintext: String,
    /// Base64 key. When absent the service's configured key is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

/// Successful response body for `POST /encrypt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptResponse {
    /// Base64 of `nonce || ciphertext || tag`.
    pub ciphertext: String,
}

/// Request body for `POST /decrypt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecryptRequest {
    /// Base64 of `nonce || ciphertext || tag`.
    pub ciphertext: String,
    /// Base64 key. When absent the service's configured key is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

/// Successful response body for `POST /decrypt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecryptResponse {
    pub plaintext: String,
}

// ---------------------------------------------------------------------------
// Password policy
// ---------------------------------------------------------------------------

/// Request body for `POST /validate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateRequest {
    pub password: String,
}

/// Response body for `POST /validate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateResponse {
    /// Whether the password satisfies the strength policy.
    pub valid: bool,
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"bad_request"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<&crate::ServiceError> for ErrorResponse {
    fn from(e: &crate::ServiceError) -> Self {
        Self::new(e.code(), e.message())
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the process is serving.
    pub status: String,
    /// Whether a default server-side key is configured.
    pub key_loaded: bool,
}
