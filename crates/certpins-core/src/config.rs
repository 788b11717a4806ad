// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{CertPinsError, Result};

/// Environment variable naming an optional JSON config file.
pub const CONFIG_PATH_ENV: &str = "CERTPINS_CONFIG";

/// Port overrides, checked in this order.
pub const PORT_ENVS: [&str; 2] = ["CERTPINS_PORT", "PORT"];

/// Listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Address the HTTP listener binds to.
    pub bind_address: IpAddr,
    /// Port for the HTTP listener (default 8080, 0 picks an ephemeral port).
    pub port: u16,
    /// `max-age` in seconds for the Strict-Transport-Security header.
    pub hsts_max_age: u64,
    /// Largest request body accepted for a pin submission.
    pub max_body_bytes: usize,
    /// Seconds a client has to send its complete request.
    pub read_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
            hsts_max_age: 31_536_000,
            max_body_bytes: 64 * 1024,
            read_timeout_secs: 30,
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    ///
    /// Defaults, then the JSON file named by `CERTPINS_CONFIG` (if set), then
    /// the first port variable found in [`PORT_ENVS`].
    pub fn from_env() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).ok();
        let port = PORT_ENVS.iter().find_map(|name| std::env::var(name).ok());
        Self::from_sources(path.as_deref().map(Path::new), port.as_deref())
    }

    /// Build a config from an optional file and an optional port override.
    pub fn from_sources(path: Option<&Path>, port: Option<&str>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    CertPinsError::Config(format!("read {}: {e}", path.display()))
                })?;
                let parsed: AppConfig = serde_json::from_str(&raw)?;
                info!(path = %path.display(), "configuration file loaded");
                parsed
            }
            None => Self::default(),
        };

        if let Some(port) = port {
            config.port = port
                .trim()
                .parse()
                .map_err(|e| CertPinsError::Config(format!("port {port:?}: {e}")))?;
            debug!(port = config.port, "port overridden from environment");
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_body_bytes == 0 {
            return Err(CertPinsError::Config(
                "max_body_bytes must be greater than zero".into(),
            ));
        }
        if self.read_timeout_secs == 0 {
            return Err(CertPinsError::Config(
                "read_timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Deadline for reading one request.
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    /// The socket address the listener should bind.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }
}
