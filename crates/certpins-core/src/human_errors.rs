// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the pin page.
//
// The message is always the error's own text (the certificate decoder's
// diagnostic is shown verbatim); the suggestion tells the user what to paste
// instead.

use crate::error::CertPinsError;

/// Who can fix the problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The submitted input is wrong; the user can fix and resubmit.
    ActionRequired,
    /// Something on the server side failed.
    Internal,
}

/// An error message with an actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Shown as-is in the page.
    pub message: String,
    /// What the user should try next.
    pub suggestion: String,
    pub severity: Severity,
}

/// Convert a `CertPinsError` into the message and hint shown to the user.
pub fn humanize_error(err: &CertPinsError) -> HumanError {
    let message = err.to_string();
    match err {
        CertPinsError::FormParse(_) => HumanError {
            message,
            suggestion: "Submit the certificate with the form on this page.".into(),
            severity: Severity::ActionRequired,
        },

        CertPinsError::PemDecode => HumanError {
            message,
            suggestion: "Paste the whole certificate, including the -----BEGIN CERTIFICATE----- and -----END CERTIFICATE----- lines.".into(),
            severity: Severity::ActionRequired,
        },

        CertPinsError::CertificateParse(_) => HumanError {
            message,
            suggestion: "The PEM block was found but does not contain an X.509 certificate. Check that you copied a certificate and not a key or CSR.".into(),
            severity: Severity::ActionRequired,
        },

        CertPinsError::Server(_)
        | CertPinsError::Config(_)
        | CertPinsError::Serialization(_) => HumanError {
            message,
            suggestion: "Try again in a moment.".into(),
            severity: Severity::Internal,
        },
    }
}
