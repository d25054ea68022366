//! `cipher-svc` — password cipher service entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise the telemetry pipeline (JSON logs, optional OTLP export).
//! 3. Seed the [`KeyStore`] with the configured default key, if any.
//! 4. Build the Axum router and serve it, over TLS when a certificate is configured.
//! 5. On Ctrl-C or SIGTERM, stop accepting and flush telemetry.

mod config;
mod keys;
mod server;
mod telemetry;

use anyhow::{Context, Result};
use password_cipher::{CipherSuite, PasswordCipher};
use tracing::{info, warn};

use config::Config;
use keys::KeyStore;
use server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(cfg.otel_exporter_otlp_endpoint.as_deref(), &cfg.log_level)?;
    let suite = CipherSuite::default();
    info!(
        version = env!("CARGO_PKG_VERSION"),
        listen_port = cfg.listen_port,
        algorithm = suite.algorithm(),
        "cipher-svc starting"
    );

    // -----------------------------------------------------------------------
    // 3. Default key
    // -----------------------------------------------------------------------
    let key_store = KeyStore::new();
    keys::load_from_config(&cfg, &key_store).await?;

    // -----------------------------------------------------------------------
    // 4. HTTP server
    // -----------------------------------------------------------------------
    let state = AppState::new(PasswordCipher::new(suite), key_store);
    let router = server::router::build(state);

    let addr: std::net::SocketAddr = ([0, 0, 0, 0], cfg.listen_port).into();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    match cfg.tls_paths() {
        Some((cert_path, key_path)) => {
            let tls_config = server::tls::load_server_config(cert_path, key_path)?;
            info!(addr = %addr, "listening (TLS)");
            server::tls::serve(listener, router, tls_config, shutdown_signal()).await;
        }
        None => {
            warn!(addr = %addr, "TLS not configured; serving plain HTTP");
            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
    }

    info!("cipher-svc stopped");
    telemetry::shutdown_telemetry();
    Ok(())
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    info!("shutdown signal received");
}
