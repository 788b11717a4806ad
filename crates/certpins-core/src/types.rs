// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for CertPins.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// Length of a SHA-1 digest in bytes.
pub const SHA1_LEN: usize = 20;

/// Length of a SHA-256 digest in bytes.
pub const SHA256_LEN: usize = 32;

/// SHA-1 and SHA-256 digests of one certificate's SubjectPublicKeyInfo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PinResult {
    pub sha1: [u8; SHA1_LEN],
    pub sha256: [u8; SHA256_LEN],
}

impl PinResult {
    /// Standard (padded) base64 of the SHA-1 digest, as used in `pin-sha1`.
    pub fn sha1_base64(&self) -> String {
        STANDARD.encode(self.sha1)
    }

    /// Standard (padded) base64 of the SHA-256 digest, as used in `pin-sha256`.
    pub fn sha256_base64(&self) -> String {
        STANDARD.encode(self.sha256)
    }

    /// Lowercase hex of the SHA-1 digest (AndroidPinning format).
    pub fn sha1_hex(&self) -> String {
        hex::encode(self.sha1)
    }

    pub fn sha256_hex(&self) -> String {
        hex::encode(self.sha256)
    }
}

/// The pins for a certificate together with the name they were created for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinReport {
    /// Subject common name; empty when the certificate has none.
    pub common_name: String,
    pub pins: PinResult,
}

/// Lifecycle state of the HTTP listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerStatus {
    Stopped,
    Starting,
    Running,
    Error,
}
