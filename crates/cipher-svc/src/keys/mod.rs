//! Default key loading.
//!
//! # Security invariants
//!
//! - The key is held only in process memory and zeroed when dropped.
//! - Key material is **never** logged or included in traces.

pub mod store;

pub use store::{KeyStore, KeyStoreError};

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;

/// Seed `store` with the configured `SECRET_KEY`, if any.
///
/// # Errors
///
/// Returns an error if the configured key cannot be imported.
pub async fn load_from_config(cfg: &Config, store: &KeyStore) -> Result<()> {
    match &cfg.secret_key {
        Some(encoded) => {
            store
                .store_base64(encoded.trim())
                .await
                .context("failed to load SECRET_KEY")?;
            info!("default key loaded");
        }
        None => info!("no default key configured; requests must supply a key"),
    }
    Ok(())
}
