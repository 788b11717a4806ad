// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for CertPins.

use thiserror::Error;

/// Top-level error type for all CertPins operations.
///
/// The first three variants are per-request failures: they are rendered into
/// the response page and never end the process.  The rest only surface while
/// starting or stopping the server.
#[derive(Debug, Error)]
pub enum CertPinsError {
    // -- Request errors --
    #[error("Error Parsing Form Data: {0}")]
    FormParse(String),

    #[error("no PEM structure found!")]
    PemDecode,

    /// Carries the X.509 decoder's own diagnostic, shown verbatim.
    #[error("{0}")]
    CertificateParse(String),

    // -- Process errors --
    #[error("server error: {0}")]
    Server(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CertPinsError {
    /// Whether this error belongs to a single request rather than the process.
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            Self::FormParse(_) | Self::PemDecode | Self::CertificateParse(_)
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CertPinsError>;
