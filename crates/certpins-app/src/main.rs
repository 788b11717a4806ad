// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// CertPins — paste a certificate, get its public key pins.
//
// Entry point. Initialises logging, loads configuration, and runs the HTTP
// server until Ctrl-C / SIGTERM.

use certpins_core::AppConfig;
use certpins_core::error::{CertPinsError, Result};
use certpins_server::PinServer;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "CertPins starting");

    if let Err(e) = run().await {
        tracing::error!(error = %e, "CertPins exited with an error");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = AppConfig::from_env()?;
    tracing::debug!(?config, "configuration resolved");

    let mut server = PinServer::new(config);
    let addr = server.start().await?;
    tracing::info!(%addr, "open http://{addr}/ to create pins");

    shutdown_signal().await?;

    server.stop().await
}

/// Resolve on Ctrl-C, or on SIGTERM where available.
async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate())
            .map_err(|e| CertPinsError::Server(format!("install SIGTERM handler: {e}")))?;
        tokio::select! {
            res = tokio::signal::ctrl_c() => {
                res.map_err(|e| CertPinsError::Server(format!("wait for Ctrl-C: {e}")))?;
            }
            _ = term.recv() => {}
        }
    }

    #[cfg(not(unix))]
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| CertPinsError::Server(format!("wait for Ctrl-C: {e}")))?;

    tracing::info!("shutdown signal received");
    Ok(())
}
