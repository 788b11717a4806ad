// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Embedded HTTP server for the pin creator.
//
// The server listens on a configurable TCP port (default 8080).  Each
// connection carries exactly one request: we read it, route it through the
// `Router`, write the response, and close.  Requests share nothing but the
// read-only route table and an atomic connection counter.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use certpins_core::AppConfig;
use certpins_core::error::{CertPinsError, Result};
use certpins_core::types::ServerStatus;

use crate::http::{HttpResponse, ReadOutcome, read_request};
use crate::pages;
use crate::routes::Router;

// ---------------------------------------------------------------------------
// Shared state passed to connection handlers
// ---------------------------------------------------------------------------

/// State shared across all connection-handling tasks.
struct SharedState {
    router: Router,
    /// Largest accepted request body.
    max_body_bytes: usize,
    /// Time allowed for a client to send its whole request.
    read_timeout: Duration,
    /// Counter of active connections (for status reporting).
    active_connections: Arc<AtomicU32>,
}

// ---------------------------------------------------------------------------
// PinServer
// ---------------------------------------------------------------------------

/// HTTP server serving the paste form, the about page, and pin results.
pub struct PinServer {
    config: AppConfig,
    /// Current lifecycle state of the server.
    status: ServerStatus,
    /// Notification handle used to signal a graceful shutdown.
    shutdown_signal: Arc<Notify>,
    /// Handle to the Tokio task running the accept loop.
    task_handle: Option<JoinHandle<()>>,
    /// Counter of currently active TCP connections.
    active_connections: Arc<AtomicU32>,
    /// Address actually bound (differs from the config when port is 0).
    local_addr: Option<SocketAddr>,
}

impl PinServer {
    /// Create a new server for `config`.
    ///
    /// The server is created in `Stopped` state.  Call [`PinServer::start`]
    /// to begin accepting connections.
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            status: ServerStatus::Stopped,
            shutdown_signal: Arc::new(Notify::new()),
            task_handle: None,
            active_connections: Arc::new(AtomicU32::new(0)),
            local_addr: None,
        }
    }

    /// Return the configured port (0 means ephemeral, see [`PinServer::local_addr`]).
    pub fn port(&self) -> u16 {
        self.config.port
    }

    /// Return the bound address while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Return the current server status.
    pub fn status(&self) -> ServerStatus {
        self.status
    }

    /// Return the number of currently active client connections.
    pub fn active_connections(&self) -> u32 {
        self.active_connections.load(Ordering::Relaxed)
    }

    /// Bind the listener and spawn the accept loop.
    ///
    /// Returns the bound address.  Calling `start` on a running server is a
    /// no-op that returns the existing address.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is already in use or the listener
    /// cannot be created; the status becomes `Error`.
    pub async fn start(&mut self) -> Result<SocketAddr> {
        if let (ServerStatus::Running, Some(addr)) = (self.status, self.local_addr) {
            debug!(%addr, "server already running");
            return Ok(addr);
        }

        self.status = ServerStatus::Starting;

        let bind_addr = self.config.socket_addr();
        let listener = match TcpListener::bind(bind_addr).await {
            Ok(listener) => listener,
            Err(e) => {
                self.status = ServerStatus::Error;
                return Err(CertPinsError::Server(format!("bind {bind_addr}: {e}")));
            }
        };
        let local_addr = listener
            .local_addr()
            .map_err(|e| CertPinsError::Server(format!("local address: {e}")))?;

        info!(addr = %local_addr, "pin server listening");

        let shared = Arc::new(SharedState {
            router: Router::new(&self.config),
            max_body_bytes: self.config.max_body_bytes,
            read_timeout: self.config.read_timeout(),
            active_connections: Arc::clone(&self.active_connections),
        });
        let shutdown = Arc::clone(&self.shutdown_signal);

        let handle = tokio::spawn(async move {
            Self::accept_loop(listener, shutdown, shared).await;
        });

        self.task_handle = Some(handle);
        self.local_addr = Some(local_addr);
        self.status = ServerStatus::Running;
        Ok(local_addr)
    }

    /// Gracefully stop the server.
    ///
    /// Signals the accept loop to exit and awaits its completion.  Requests
    /// already being handled run to completion in their own tasks.
    pub async fn stop(&mut self) -> Result<()> {
        if self.status != ServerStatus::Running {
            return Ok(());
        }

        info!(addr = ?self.local_addr, "stopping pin server");

        self.shutdown_signal.notify_one();

        if let Some(handle) = self.task_handle.take() {
            handle
                .await
                .map_err(|e| CertPinsError::Server(format!("task join: {e}")))?;
        }

        self.local_addr = None;
        self.status = ServerStatus::Stopped;
        info!("pin server stopped");
        Ok(())
    }

    /// The main accept loop.
    ///
    /// Runs until the shutdown signal is received.  Each incoming connection
    /// is handed off to [`PinServer::handle_connection`] in a separate task.
    async fn accept_loop(listener: TcpListener, shutdown: Arc<Notify>, shared: Arc<SharedState>) {
        loop {
            tokio::select! {
                _ = shutdown.notified() => {
                    debug!("accept loop received shutdown signal");
                    break;
                }

                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, peer_addr)) => {
                            debug!(peer = %peer_addr, "incoming connection");
                            let state = Arc::clone(&shared);
                            tokio::spawn(async move {
                                state.active_connections.fetch_add(1, Ordering::Relaxed);
                                if let Err(e) = Self::handle_connection(stream, peer_addr, &state).await {
                                    warn!(
                                        peer = %peer_addr,
                                        error = %e,
                                        "connection handler error"
                                    );
                                }
                                state.active_connections.fetch_sub(1, Ordering::Relaxed);
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "failed to accept connection");
                        }
                    }
                }
            }
        }
    }

    /// Handle a single incoming TCP connection: one request, one response.
    async fn handle_connection(
        mut stream: TcpStream,
        peer_addr: SocketAddr,
        state: &SharedState,
    ) -> Result<()> {
        let read = tokio::time::timeout(
            state.read_timeout,
            read_request(&mut stream, state.max_body_bytes),
        )
        .await;

        let outcome = match read {
            Ok(outcome) => outcome?,
            Err(_) => {
                warn!(peer = %peer_addr, timeout = ?state.read_timeout, "request read timed out");
                let response = HttpResponse::html(
                    408,
                    pages::status_page("Request Timeout", "The request was not received in time."),
                );
                return response.write_to(&mut stream, false).await;
            }
        };

        let request = match outcome {
            ReadOutcome::Request(request) => request,
            ReadOutcome::Closed => {
                debug!(peer = %peer_addr, "empty request -- closing connection");
                return Ok(());
            }
            ReadOutcome::Malformed(reason) => {
                warn!(peer = %peer_addr, error = %reason, "malformed HTTP request");
                let response =
                    HttpResponse::html(400, pages::status_page("Bad Request", &reason));
                return response.write_to(&mut stream, false).await;
            }
        };

        let response = state.router.dispatch(&request);
        response.write_to(&mut stream, request.is_head()).await?;

        info!(
            peer = %peer_addr,
            method = %request.method,
            path = %request.path,
            status = response.status,
            bytes = response.body.len(),
            "request served"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    const GOOGLE_PEM: &str = include_str!("../../certpins-security/tests/fixtures/google.pem");
    const EXAMPLE_PEM: &str = include_str!("../../certpins-security/tests/fixtures/example.pem");
    const GOOGLE_SHA1_HEX: &str = "522627dff7c1275311c9723317d7cfbc10f495a4";
    const EXAMPLE_SHA1_HEX: &str = "3e7cc802da3409547cd09dd77146fbf54e7c5fdc";

    fn local_config() -> AppConfig {
        AppConfig {
            bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            ..AppConfig::default()
        }
    }

    async fn started() -> (PinServer, SocketAddr) {
        let mut server = PinServer::new(local_config());
        let addr = server.start().await.expect("server should start");
        (server, addr)
    }

    /// Send `raw` and return the full response text.
    async fn exchange(addr: SocketAddr, raw: Vec<u8>) -> String {
        let mut stream = TcpStream::connect(addr).await.expect("connect");
        stream.write_all(&raw).await.expect("write");
        let mut out = Vec::new();
        stream.read_to_end(&mut out).await.expect("read");
        String::from_utf8(out).expect("utf8 response")
    }

    fn get(path: &str) -> Vec<u8> {
        format!("GET {path} HTTP/1.1\r\nHost: localhost\r\n\r\n").into_bytes()
    }

    fn post_cert(pem: &str) -> Vec<u8> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("cert", pem)
            .finish();
        format!(
            "POST /pin HTTP/1.1\r\nHost: localhost\r\n\
             Content-Type: application/x-www-form-urlencoded\r\n\
             Content-Length: {}\r\n\r\n{body}",
            body.len()
        )
        .into_bytes()
    }

    #[test]
    fn default_port_is_8080() {
        let server = PinServer::new(AppConfig::default());
        assert_eq!(server.port(), 8080);
    }

    #[test]
    fn initial_status_is_stopped() {
        let server = PinServer::new(AppConfig::default());
        assert_eq!(server.status(), ServerStatus::Stopped);
        assert_eq!(server.local_addr(), None);
        assert_eq!(server.active_connections(), 0);
    }

    #[tokio::test]
    async fn start_and_stop_lifecycle() {
        let (mut server, addr) = started().await;
        assert_eq!(server.status(), ServerStatus::Running);
        assert_ne!(addr.port(), 0);

        // Starting again keeps the same listener.
        assert_eq!(server.start().await.expect("restart"), addr);

        server.stop().await.expect("stop");
        assert_eq!(server.status(), ServerStatus::Stopped);
        assert_eq!(server.local_addr(), None);
    }

    #[tokio::test]
    async fn bind_conflict_sets_error_status() {
        let (mut first, addr) = started().await;
        let mut second = PinServer::new(AppConfig {
            port: addr.port(),
            ..local_config()
        });
        assert!(second.start().await.is_err());
        assert_eq!(second.status(), ServerStatus::Error);
        first.stop().await.expect("stop");
    }

    #[tokio::test]
    async fn serves_index_with_hsts() {
        let (mut server, addr) = started().await;
        let response = exchange(addr, get("/")).await;
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("Strict-Transport-Security: max-age=31536000\r\n"));
        assert!(response.contains(r#"<form action="/pin" method="post">"#));
        server.stop().await.expect("stop");
    }

    #[tokio::test]
    async fn head_request_has_no_body() {
        let (mut server, addr) = started().await;
        let response = exchange(addr, b"HEAD /about HTTP/1.1\r\n\r\n".to_vec()).await;
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.ends_with("\r\n\r\n"));
        server.stop().await.expect("stop");
    }

    #[tokio::test]
    async fn garbage_gets_400() {
        let (mut server, addr) = started().await;
        let response = exchange(addr, b"NOT HTTP AT ALL\r\n\r\n".to_vec()).await;
        assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        server.stop().await.expect("stop");
    }

    #[tokio::test]
    async fn stalled_client_gets_408() {
        let mut server = PinServer::new(AppConfig {
            read_timeout_secs: 1,
            ..local_config()
        });
        let addr = server.start().await.expect("start");

        let mut stream = TcpStream::connect(addr).await.expect("connect");
        stream.write_all(b"GET / HTTP/1.1\r\n").await.expect("write");
        let mut out = Vec::new();
        tokio::time::timeout(Duration::from_secs(10), stream.read_to_end(&mut out))
            .await
            .expect("server should close the connection")
            .expect("read");
        let response = String::from_utf8(out).expect("utf8 response");
        assert!(response.starts_with("HTTP/1.1 408 Request Timeout\r\n"));

        server.stop().await.expect("stop");
    }

    #[tokio::test]
    async fn unknown_path_serves_form() {
        let (mut server, addr) = started().await;
        let response = exchange(addr, get("/favicon.ico")).await;
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains(r#"<form action="/pin" method="post">"#));
        server.stop().await.expect("stop");
    }

    #[tokio::test]
    async fn posted_certificate_is_pinned() {
        let (mut server, addr) = started().await;
        let response = exchange(addr, post_cert(GOOGLE_PEM)).await;
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("Certificate Pin created for www.google.com"));
        assert!(response.contains(GOOGLE_SHA1_HEX));
        server.stop().await.expect("stop");
    }

    #[tokio::test]
    async fn oversized_body_reports_form_error() {
        let mut server = PinServer::new(AppConfig {
            max_body_bytes: 64,
            ..local_config()
        });
        let addr = server.start().await.expect("start");
        let response = exchange(addr, post_cert(GOOGLE_PEM)).await;
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("Error Parsing Form Data: "));
        assert!(response.contains("no PEM structure found!"));
        server.stop().await.expect("stop");
    }

    #[tokio::test]
    async fn concurrent_submissions_do_not_interfere() {
        let (mut server, addr) = started().await;

        let mut tasks = Vec::new();
        for i in 0..16 {
            let (pem, expected) = if i % 2 == 0 {
                (GOOGLE_PEM, GOOGLE_SHA1_HEX)
            } else {
                (EXAMPLE_PEM, EXAMPLE_SHA1_HEX)
            };
            tasks.push(tokio::spawn(async move {
                (exchange(addr, post_cert(pem)).await, expected)
            }));
        }

        for task in tasks {
            let (response, expected) = task.await.expect("task");
            assert!(response.contains(expected));
            let other = if expected == GOOGLE_SHA1_HEX {
                EXAMPLE_SHA1_HEX
            } else {
                GOOGLE_SHA1_HEX
            };
            assert!(!response.contains(other));
        }

        server.stop().await.expect("stop");
    }
}
