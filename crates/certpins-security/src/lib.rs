// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! certpins-security — turn pasted PEM text into HPKP pins.
//!
//! The pipeline is three steps, each in its own module:
//!
//! 1. [`envelope`] finds the first PEM block and base64-decodes it.
//! 2. [`certificate`] parses the first DER certificate in that payload.
//! 3. [`pins`] hashes the certificate's SubjectPublicKeyInfo with SHA-1 and
//!    SHA-256.
//!
//! No validation of any kind happens: expired, self-signed or CA
//! certificates are pinned like any other.

pub mod certificate;
pub mod envelope;
pub mod pins;

use certpins_core::error::Result;
use certpins_core::types::PinReport;
use tracing::{debug, instrument};

// PUBLIC API: Re-export the pipeline steps
pub use certificate::Certificate;
pub use envelope::{DecodedBlock, decode_first_block};
pub use pins::compute_pins;

/// Run the whole pipeline on user-supplied text.
///
/// Fails with `PemDecode` when no PEM block is found and with
/// `CertificateParse` when the block is not an X.509 certificate.
#[instrument(skip(input), fields(input_len = input.len()))]
pub fn pin_certificate(input: &str) -> Result<PinReport> {
    let block = decode_first_block(input)?;
    let cert = Certificate::parse_first(&block.der)?;
    let pins = compute_pins(cert.spki_der());

    debug!(
        common_name = cert.common_name().unwrap_or_default(),
        spki_len = cert.spki_der().len(),
        "pins computed"
    );

    Ok(PinReport {
        common_name: cert.common_name().unwrap_or_default().to_owned(),
        pins,
    })
}
