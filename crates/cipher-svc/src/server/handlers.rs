//! Axum request handlers for all service endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::protocol::{
    DecryptRequest, DecryptResponse, EncryptRequest, EncryptResponse, ErrorResponse,
    HealthResponse, KeyResponse, ValidateRequest, ValidateResponse,
};
use common::ServiceError;
use password_cipher::{CipherError, SecretKey};
use tracing::{debug, warn};

use super::state::AppState;

/// Handler error: a [`ServiceError`] rendered as an [`ErrorResponse`] body.
#[derive(Debug)]
pub struct ApiError(ServiceError);

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        Self(e)
    }
}

impl From<CipherError> for ApiError {
    fn from(e: CipherError) -> Self {
        let err = match e {
            CipherError::KeyGeneration => ServiceError::Internal(e.to_string()),
            CipherError::Encryption => ServiceError::Internal(e.to_string()),
            CipherError::Decryption => ServiceError::BadRequest(e.to_string()),
        };
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorResponse::from(&self.0))).into_response()
    }
}

/// `POST /keys` — generate a fresh 256-bit key.
pub async fn generate_key(State(state): State<AppState>) -> Result<Json<KeyResponse>, ApiError> {
    let key = state.cipher.generate_key().inspect_err(|e| {
        warn!(error = %e, "key generation failed");
    })?;
    debug!("key generated");
    Ok(Json(KeyResponse { key }))
}

/// `POST /encrypt` — encrypt a password under the supplied or default key.
pub async fn encrypt(
    State(state): State<AppState>,
    Json(req): Json<EncryptRequest>,
) -> Result<Json<EncryptResponse>, ApiError> {
    let key = resolve_key(&state, req.key.as_deref(), "invalid key").await?;
    let ciphertext = state
        .cipher
        .encrypt_with(&req.plaintext, &key)
        .inspect_err(|e| warn!(error = %e, "encryption failed"))?;
    Ok(Json(EncryptResponse { ciphertext }))
}

/// `POST /decrypt` — recover a password from its encoded ciphertext.
///
/// Every failure produces the same 400 body, whatever its cause.
pub async fn decrypt(
    State(state): State<AppState>,
    Json(req): Json<DecryptRequest>,
) -> Result<Json<DecryptResponse>, ApiError> {
    // A bad key must look exactly like a bad ciphertext.
    let key = resolve_key(
        &state,
        req.key.as_deref(),
        &CipherError::Decryption.to_string(),
    )
    .await?;
    let plaintext = state
        .cipher
        .decrypt_with(&req.ciphertext, &key)
        .inspect_err(|_| debug!("decryption rejected"))?;
    Ok(Json(DecryptResponse { plaintext }))
}

/// `POST /validate` — check a password against the strength policy.
pub async fn validate(
    State(state): State<AppState>,
    Json(req): Json<ValidateRequest>,
) -> Json<ValidateResponse> {
    Json(ValidateResponse {
        valid: state.cipher.validate_password(&req.password),
    })
}

/// `GET /health` — liveness check.
///
/// Always `200 OK`; `key_loaded` reports whether a default key is configured.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        key_loaded: state.key_store.is_ready().await,
    })
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}

/// Pick the request's own key, falling back to the default key.
///
/// A supplied key that cannot be imported is a 400 carrying `invalid_message`.
async fn resolve_key(
    state: &AppState,
    supplied: Option<&str>,
    invalid_message: &str,
) -> Result<SecretKey, ApiError> {
    match supplied {
        Some(encoded) => SecretKey::from_base64(encoded)
            .map_err(|_| ApiError(ServiceError::BadRequest(invalid_message.to_owned()))),
        None => state.key_store.current().await.map_err(|_| {
            ApiError(ServiceError::Unavailable(
                "no key supplied and no default key configured".into(),
            ))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request},
        routing::{get, post},
        Router,
    };
    use serde::de::DeserializeOwned;
    use serde_json::json;
    use tower::ServiceExt;

    use crate::keys::KeyStore;

    fn test_router(state: AppState) -> Router {
        Router::new()
            .route("/keys", post(generate_key))
            .route("/encrypt", post(encrypt))
            .route("/decrypt", post(decrypt))
            .route("/validate", post(validate))
            .route("/health", get(health))
            .with_state(state)
    }

    async fn state_with_default_key() -> (AppState, String) {
        let key = password_cipher::generate_key().unwrap();
        let store = KeyStore::new();
        store.store_base64(&key).await.unwrap();
        (AppState::new(Default::default(), store), key)
    }

    async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> (StatusCode, Vec<u8>) {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    fn parse<T: DeserializeOwned>(bytes: &[u8]) -> T {
        serde_json::from_slice(bytes).unwrap()
    }

    #[tokio::test]
    async fn generate_key_returns_32_byte_key() {
        use base64::{engine::general_purpose::STANDARD, Engine as _};
        let app = test_router(AppState::default());
        let (status, body) = post_json(&app, "/keys", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        let resp: KeyResponse = parse(&body);
        assert_eq!(STANDARD.decode(resp.key).unwrap().len(), 32);
    }

    #[tokio::test]
    async fn round_trip_with_request_key() {
        let app = test_router(AppState::default());
        let key = password_cipher::generate_key().unwrap();

        let (status, body) =
            post_json(&app, "/encrypt", json!({"plaintext": "Abcdef1!", "key": key})).await;
        assert_eq!(status, StatusCode::OK);
        let enc: EncryptResponse = parse(&body);

        let (status, body) =
            post_json(&app, "/decrypt", json!({"ciphertext": enc.ciphertext, "key": key})).await;
        assert_eq!(status, StatusCode::OK);
        let dec: DecryptResponse = parse(&body);
        assert_eq!(dec.plaintext, "Abcdef1!");
    }

    #[tokio::test]
    async fn round_trip_with_default_key() {
        let (state, key) = state_with_default_key().await;
        let app = test_router(state);

        let (_, body) = post_json(&app, "/encrypt", json!({"plaintext": "secret"})).await;
        let enc: EncryptResponse = parse(&body);

        // The default key and an explicitly supplied copy are interchangeable.
        let decrypted = password_cipher::decrypt(&enc.ciphertext, &key).unwrap();
        assert_eq!(decrypted, "secret");

        let (status, body) =
            post_json(&app, "/decrypt", json!({"ciphertext": enc.ciphertext})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(parse::<DecryptResponse>(&body).plaintext, "secret");
    }

    #[tokio::test]
    async fn missing_key_without_default_is_503() {
        let app = test_router(AppState::default());
        let (status, body) = post_json(&app, "/encrypt", json!({"plaintext": "x"})).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(parse::<ErrorResponse>(&body).code, "service_unavailable");
    }

    #[tokio::test]
    async fn invalid_encrypt_key_is_400() {
        let app = test_router(AppState::default());
        let (status, _) =
            post_json(&app, "/encrypt", json!({"plaintext": "x", "key": "c2hvcnQ="})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn decrypt_failures_are_indistinguishable() {
        let app = test_router(AppState::default());
        let key = password_cipher::generate_key().unwrap();
        let other = password_cipher::generate_key().unwrap();
        let ciphertext = password_cipher::encrypt("Abcdef1!", &key).unwrap();

        let cases = [
            json!({"ciphertext": "!!!", "key": key}),
            json!({"ciphertext": "AAAA", "key": key}),
            json!({"ciphertext": ciphertext, "key": other}),
            json!({"ciphertext": ciphertext, "key": "c2hvcnQ="}),
        ];
        let mut bodies = Vec::new();
        for case in cases {
            let (status, body) = post_json(&app, "/decrypt", case).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            bodies.push(body);
        }
        assert!(bodies.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(parse::<ErrorResponse>(&bodies[0]).message, "decryption failed");
    }

    #[tokio::test]
    async fn validate_applies_policy() {
        let app = test_router(AppState::default());
        for (password, expected) in [("Abcdef1!", true), ("abcdefgh", false), ("", false), ("A1!bcde", false)] {
            let (status, body) = post_json(&app, "/validate", json!({"password": password})).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(parse::<ValidateResponse>(&body).valid, expected, "{password}");
        }
    }

    #[tokio::test]
    async fn health_reports_key_state() {
        let app = test_router(AppState::default());
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert!(!parse::<HealthResponse>(&bytes).key_loaded);

        let (state, _) = state_with_default_key().await;
        let app = test_router(state);
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert!(parse::<HealthResponse>(&bytes).key_loaded);
    }

    #[test]
    fn cipher_errors_map_to_status() {
        let status = |e: CipherError| ApiError::from(e).into_response().status();
        assert_eq!(status(CipherError::KeyGeneration), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(status(CipherError::Encryption), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(status(CipherError::Decryption), StatusCode::BAD_REQUEST);
    }
}
