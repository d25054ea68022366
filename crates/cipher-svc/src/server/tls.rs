//! TLS termination using rustls.
//!
//! When a certificate and key are configured the service accepts TCP
//! connections itself, completes the rustls handshake, and hands each stream
//! to hyper with the Axum router as the service.

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{extract::Request, Router};
use hyper::body::Incoming;
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::conn::auto::Builder,
};
use rustls::ServerConfig;
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use tower::ServiceExt;
use tracing::{debug, error, info, warn};

/// Build a [`rustls::ServerConfig`] from PEM-encoded certificate and private key bytes.
///
/// # Errors
///
/// Returns an error if the certificate or key cannot be parsed, or if rustls
/// rejects the configuration.
pub fn build_server_config(cert_pem: &[u8], key_pem: &[u8]) -> Result<Arc<ServerConfig>> {
    let certs = rustls_pemfile::certs(&mut std::io::BufReader::new(cert_pem))
        .collect::<Result<Vec<_>, _>>()
        .context("failed to parse TLS certificate chain")?;
    if certs.is_empty() {
        anyhow::bail!("no certificates found in PEM data");
    }

    let key = rustls_pemfile::private_key(&mut std::io::BufReader::new(key_pem))
        .context("failed to read TLS private key")?
        .context("no private key found in PEM data")?;

    let mut config =
        ServerConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
            .with_safe_default_protocol_versions()
            .context("failed to select TLS protocol versions")?
            .with_no_client_auth()
            .with_single_cert(certs, key)
            .context("failed to build rustls ServerConfig")?;
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    Ok(Arc::new(config))
}

/// Load the certificate chain and key from disk and build the server config.
pub fn load_server_config(cert_path: &str, key_path: &str) -> Result<Arc<ServerConfig>> {
    let cert_pem = std::fs::read(cert_path)
        .with_context(|| format!("failed to read TLS certificate {cert_path}"))?;
    let key_pem =
        std::fs::read(key_path).with_context(|| format!("failed to read TLS key {key_path}"))?;
    build_server_config(&cert_pem, &key_pem)
}

/// Accept loop: terminate TLS on each connection and serve `router` over it.
///
/// Returns once `shutdown` resolves. Connections already accepted finish on
/// their own tasks.
pub async fn serve<F>(
    listener: TcpListener,
    router: Router,
    config: Arc<ServerConfig>,
    shutdown: F,
) where
    F: Future<Output = ()> + Send,
{
    let acceptor = TlsAcceptor::from(config);
    tokio::pin!(shutdown);

    loop {
        let accepted = tokio::select! {
            () = &mut shutdown => {
                info!("shutdown requested; no longer accepting connections");
                return;
            }
            accepted = listener.accept() => accepted,
        };
        let (tcp_stream, peer_addr) = match accepted {
            Ok(conn) => conn,
            Err(e) => {
                error!(error = %e, "accept error");
                continue;
            }
        };

        let acceptor = acceptor.clone();
        let router = router.clone();
        tokio::spawn(async move {
            let tls_stream = match acceptor.accept(tcp_stream).await {
                Ok(s) => s,
                Err(e) => {
                    debug!(%peer_addr, error = %e, "TLS handshake failed");
                    return;
                }
            };

            let service = hyper::service::service_fn(move |req: Request<Incoming>| {
                router.clone().oneshot(req)
            });

            if let Err(e) = Builder::new(TokioExecutor::new())
                .serve_connection(TokioIo::new(tls_stream), service)
                .await
            {
                warn!(%peer_addr, error = %e, "connection error");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::time::Duration;

    use rcgen::{generate_simple_self_signed, CertifiedKey};
    use rustls::pki_types::{CertificateDer, ServerName};
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpStream,
        sync::oneshot,
        task::JoinHandle,
    };
    use tokio_rustls::TlsConnector;

    use crate::server::{router, state::AppState};

    struct RunningServer {
        addr: SocketAddr,
        ca: CertificateDer<'static>,
        shutdown: oneshot::Sender<()>,
        handle: JoinHandle<()>,
    }

    async fn start_server() -> RunningServer {
        let CertifiedKey { cert, key_pair } =
            generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
        let config =
            build_server_config(cert.pem().as_bytes(), key_pair.serialize_pem().as_bytes())
                .unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(serve(
            listener,
            router::build(AppState::default()),
            config,
            async move {
                let _ = rx.await;
            },
        ));

        RunningServer {
            addr,
            ca: cert.der().clone(),
            shutdown: tx,
            handle,
        }
    }

    fn connector(ca: CertificateDer<'static>) -> TlsConnector {
        let mut roots = rustls::RootCertStore::empty();
        roots.add(ca).unwrap();
        let config = rustls::ClientConfig::builder_with_provider(Arc::new(
            rustls::crypto::ring::default_provider(),
        ))
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_root_certificates(roots)
        .with_no_client_auth();
        TlsConnector::from(Arc::new(config))
    }

    #[tokio::test]
    async fn serves_health_over_tls() {
        let server = start_server().await;

        let tcp = TcpStream::connect(server.addr).await.unwrap();
        let mut tls = connector(server.ca.clone())
            .connect(ServerName::try_from("localhost").unwrap(), tcp)
            .await
            .unwrap();
        tls.write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();

        let mut response = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            match tls.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => response.extend_from_slice(&buf[..n]),
            }
        }
        let response = String::from_utf8_lossy(&response);
        assert!(response.starts_with("HTTP/1.1 200"), "{response}");
        assert!(response.contains(r#""key_loaded":false"#), "{response}");

        server.shutdown.send(()).unwrap();
        server.handle.await.unwrap();
    }

    #[tokio::test]
    async fn untrusted_client_fails_handshake() {
        let server = start_server().await;
        let other = generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();

        let tcp = TcpStream::connect(server.addr).await.unwrap();
        let result = connector(other.cert.der().clone())
            .connect(ServerName::try_from("localhost").unwrap(), tcp)
            .await;
        assert!(result.is_err());

        server.shutdown.send(()).unwrap();
        server.handle.await.unwrap();
    }

    #[tokio::test]
    async fn shutdown_stops_accept_loop() {
        let server = start_server().await;
        server.shutdown.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), server.handle)
            .await
            .expect("accept loop did not stop")
            .unwrap();
    }

    #[test]
    fn rejects_empty_cert_pem() {
        let result = build_server_config(b"", b"");
        assert!(result.is_err());
    }

    #[test]
    fn rejects_garbage_pem() {
        let result = build_server_config(b"not a pem", b"also not a pem");
        assert!(result.is_err());
    }

    #[test]
    fn missing_files_are_reported() {
        let err = load_server_config("/nonexistent/tls.crt", "/nonexistent/tls.key").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/tls.crt"));
    }
}
