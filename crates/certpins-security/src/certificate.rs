// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// X.509 certificate parsing — just enough of the certificate to pin it.
//
// DER decoding is done by `x509-parser`.  We keep an owned copy of the two
// fields pin creation needs (subject CN and the raw SubjectPublicKeyInfo
// encoding) so the parsed value outlives the decoded PEM buffer.

use certpins_core::error::{CertPinsError, Result};
use tracing::{debug, instrument};
use x509_parser::parse_x509_certificate;

/// The parts of an X.509 certificate used for pin creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    common_name: Option<String>,
    spki_der: Vec<u8>,
    trailing_bytes: usize,
}

impl Certificate {
    /// Parse the first DER certificate in `der`.
    ///
    /// A payload may hold several certificates back to back.  Every one of
    /// them must decode, but only the first is kept (see
    /// [`Certificate::trailing_bytes`]).  Decoder failures, including junk
    /// after the first certificate, are returned as
    /// [`CertPinsError::CertificateParse`] with the decoder's own message.
    #[instrument(skip(der), fields(der_len = der.len()))]
    pub fn parse_first(der: &[u8]) -> Result<Self> {
        let (rest, cert) = parse_x509_certificate(der)
            .map_err(|e| CertPinsError::CertificateParse(e.to_string()))?;

        // When a subject carries several CN attributes the last one wins.
        let common_name = cert
            .subject()
            .iter_common_name()
            .filter_map(|cn| cn.as_str().ok())
            .last()
            .map(str::to_owned);

        let spki_der = cert.public_key().raw.to_vec();

        let mut remaining = rest;
        let mut extra_certs = 0usize;
        while !remaining.is_empty() {
            let (next, _) = parse_x509_certificate(remaining)
                .map_err(|e| CertPinsError::CertificateParse(e.to_string()))?;
            remaining = next;
            extra_certs += 1;
        }
        if extra_certs > 0 {
            debug!(extra_certs, trailing = rest.len(), "ignoring certificates after the first");
        }

        Ok(Self {
            common_name,
            spki_der,
            trailing_bytes: rest.len(),
        })
    }

    /// Subject common name, if the certificate has one.
    pub fn common_name(&self) -> Option<&str> {
        self.common_name.as_deref()
    }

    /// DER encoding of the SubjectPublicKeyInfo (algorithm + key bits).
    pub fn spki_der(&self) -> &[u8] {
        &self.spki_der
    }

    /// Bytes of the further certificates that followed the first one.
    pub fn trailing_bytes(&self) -> usize {
        self.trailing_bytes
    }
}
