//! Listener startup, routing, and graceful shutdown.
//!
//! Shutdown is modeled as message passing: the signal task publishes on a
//! `watch` channel, the serve loop stops accepting on receipt and drains
//! in-flight connections, optionally bounded by an operator-configured
//! grace period. The signal-handling path itself never blocks.

use std::future::IntoFuture;
use std::time::Duration;

use anyhow::Context;
use axum::http::Method;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::handler;
use crate::state::AppState;

/// Interpret the `--port` value: a bare port listens on all interfaces,
/// anything containing a colon is used as a full `host:port` address.
pub fn listen_addr(port: &str) -> String {
    if port.contains(':') {
        port.to_string()
    } else {
        format!("0.0.0.0:{}", port)
    }
}

/// Build the service router: the validate route (including the bare and
/// trailing-slash forms for the empty-identifier case), permissive GET-only
/// CORS, and request tracing.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    Router::new()
        .route("/validate", get(handler::validate_empty))
        .route("/validate/", get(handler::validate_empty))
        .route("/validate/{iban}", get(handler::validate))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the listener and serve until an interrupt arrives.
///
/// A bind failure is fatal. A listener error after shutdown was requested
/// is logged and swallowed; the process still terminates cleanly.
pub async fn run(addr: &str, state: AppState, grace: Option<Duration>) -> anyhow::Result<()> {
    let app = build_router(state.clone());

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind listener on {}", addr))?;
    info!(addr = %addr, "listening");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    spawn_cache_sweeper(state, shutdown_rx.clone());

    serve_until_shutdown(listener, app, shutdown_rx, grace).await
}

/// Serve connections until the shutdown channel fires, then drain.
///
/// With `grace` set, the post-signal drain is bounded: once the period
/// elapses, remaining connections are abandoned and the serve loop is
/// dropped.
async fn serve_until_shutdown(
    listener: TcpListener,
    app: Router,
    shutdown_rx: watch::Receiver<bool>,
    grace: Option<Duration>,
) -> anyhow::Result<()> {
    let mut serve_shutdown = shutdown_rx.clone();
    let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
        let _ = serve_shutdown.changed().await;
        info!("shutdown requested, draining in-flight connections");
    });

    let mut signal_rx = shutdown_rx.clone();
    match grace {
        None => finish(serve.await, *shutdown_rx.borrow())?,
        Some(grace) => {
            let mut serve = std::pin::pin!(serve.into_future());
            tokio::select! {
                result = &mut serve => finish(result, *shutdown_rx.borrow())?,
                _ = signal_rx.changed() => {
                    match tokio::time::timeout(grace, &mut serve).await {
                        Ok(result) => finish(result, true)?,
                        Err(_) => warn!(
                            grace_secs = grace.as_secs(),
                            "grace period elapsed before all connections closed"
                        ),
                    }
                }
            }
        }
    }

    info!("server stopped");
    Ok(())
}

fn finish(result: std::io::Result<()>, shutting_down: bool) -> anyhow::Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(err) if shutting_down => {
            warn!(error = %err, "listener shutdown error");
            Ok(())
        }
        Err(err) => Err(err).context("listener failed"),
    }
}

/// Periodically drop expired cache entries. `get` already treats expired
/// entries as absent; the sweep only reclaims memory.
fn spawn_cache_sweeper(state: AppState, mut shutdown: watch::Receiver<bool>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(30));
        loop {
            tokio::select! {
                _ = interval.tick() => state.cache().purge_expired(),
                _ = shutdown.changed() => break,
            }
        }
    });
}

/// Resolve once an interrupt (SIGINT) or terminate (SIGTERM) signal arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT"),
        _ = terminate => info!("received SIGTERM"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ResponseCache;
    use ibancheck_lib::InMemoryBankData;
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    fn empty_state() -> AppState {
        AppState::from_components(Arc::new(InMemoryBankData::new()), ResponseCache::new())
    }

    async fn spawn_server(
        grace: Option<Duration>,
    ) -> (
        std::net::SocketAddr,
        watch::Sender<bool>,
        tokio::task::JoinHandle<anyhow::Result<()>>,
    ) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = watch::channel(false);
        let server = tokio::spawn(serve_until_shutdown(
            listener,
            build_router(empty_state()),
            rx,
            grace,
        ));
        (addr, tx, server)
    }

    #[test]
    fn test_listen_addr_bare_port() {
        assert_eq!(listen_addr("8080"), "0.0.0.0:8080");
    }

    #[test]
    fn test_listen_addr_host_port_passthrough() {
        assert_eq!(listen_addr("127.0.0.1:9000"), "127.0.0.1:9000");
        assert_eq!(listen_addr("[::1]:9000"), "[::1]:9000");
    }

    #[tokio::test]
    async fn test_shutdown_without_connections() {
        let (_addr, tx, server) = spawn_server(None).await;

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("server did not stop after shutdown signal")
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_grace_bounded_shutdown_without_connections() {
        let (_addr, tx, server) = spawn_server(Some(Duration::from_secs(5))).await;

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("server did not stop within the grace period")
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_in_flight_request_completes_during_shutdown() {
        let (addr, tx, server) = spawn_server(None).await;

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(
                b"GET /validate/DE89370400440532013000 HTTP/1.1\r\n\
                  host: localhost\r\nconnection: close\r\n\r\n",
            )
            .await
            .unwrap();

        // Give the server a moment to accept the connection, then signal.
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();

        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        let text = String::from_utf8_lossy(&response);
        assert!(text.starts_with("HTTP/1.1 200"), "response was: {}", text);

        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("server did not stop after draining")
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_in_flight_request_completes_within_grace() {
        let (addr, tx, server) = spawn_server(Some(Duration::from_secs(5))).await;

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(
                b"GET /validate/DE89370400440532013000 HTTP/1.1\r\n\
                  host: localhost\r\nconnection: close\r\n\r\n",
            )
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();

        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        let text = String::from_utf8_lossy(&response);
        assert!(text.starts_with("HTTP/1.1 200"), "response was: {}", text);

        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("server did not stop within the grace period")
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_new_connections_refused_after_shutdown() {
        let (addr, tx, server) = spawn_server(None).await;

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .unwrap()
            .unwrap()
            .unwrap();

        // The listener is gone; a fresh connection attempt must fail.
        assert!(TcpStream::connect(addr).await.is_err());
    }
}
