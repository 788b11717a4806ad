// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PEM envelope decoding — locate the first armored block in pasted text.

use certpins_core::error::{CertPinsError, Result};
use tracing::debug;

/// The binary payload of one PEM block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedBlock {
    /// The label between `-----BEGIN ` and `-----`, e.g. `CERTIFICATE`.
    pub label: String,
    /// Base64-decoded contents (DER for certificates).
    pub der: Vec<u8>,
}

const BEGIN_MARKER: &str = "-----BEGIN ";

/// Decode the first well-formed PEM block found in `input`.
///
/// Anything before the first `-----BEGIN` line and anything after the
/// matching `-----END` line is ignored, so only one block is ever consumed.
/// A block that does not decode (no END line, mismatched labels, bad
/// base64) is skipped and scanning resumes after its BEGIN marker.  The
/// label is not checked here; a `PUBLIC KEY` block decodes fine and is
/// rejected later by the certificate parser.
///
/// Returns [`CertPinsError::PemDecode`] when no well-formed block is present.
pub fn decode_first_block(input: &str) -> Result<DecodedBlock> {
    // Browsers submit textarea contents with CRLF line endings.
    let normalized = input.replace("\r\n", "\n");

    for (start, _) in normalized.match_indices(BEGIN_MARKER) {
        match pem::parse(&normalized.as_bytes()[start..]) {
            Ok(block) => {
                debug!(label = block.tag(), der_len = block.contents().len(), "PEM block decoded");
                return Ok(DecodedBlock {
                    label: block.tag().to_owned(),
                    der: block.into_contents(),
                });
            }
            Err(e) => debug!(offset = start, error = %e, "skipping malformed PEM block"),
        }
    }

    debug!("no usable PEM block in input");
    Err(CertPinsError::PemDecode)
}
