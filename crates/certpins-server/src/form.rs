// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `application/x-www-form-urlencoded` decoding for the pin form.

use tracing::debug;
use url::form_urlencoded;

use certpins_core::error::{CertPinsError, Result};

use crate::http::{BodyState, HttpRequest};

const URLENCODED: &str = "application/x-www-form-urlencoded";

/// Decoded form fields: body fields first, then query-string fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    fields: Vec<(String, String)>,
}

impl FormData {
    /// First value of field `name`, if present.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Fields from the query string only; used when the body is unusable.
    pub fn from_query(request: &HttpRequest) -> Self {
        let mut form = Self::default();
        form.extend_from(request.query.as_deref().unwrap_or_default().as_bytes());
        form
    }

    fn extend_from(&mut self, encoded: &[u8]) {
        self.fields.extend(
            form_urlencoded::parse(encoded).map(|(k, v)| (k.into_owned(), v.into_owned())),
        );
    }
}

/// Decode the request body (and query string) as form data.
///
/// Fails with [`CertPinsError::FormParse`] only when the body was cut off or
/// over the size limit.  A body with any other content type is left unread
/// and only the query string is decoded.  Invalid UTF-8 in a urlencoded body
/// is decoded lossily.
pub fn parse_form(request: &HttpRequest) -> Result<FormData> {
    match request.body_state {
        BodyState::Complete => {}
        BodyState::TooLarge { declared, limit } => {
            return Err(CertPinsError::FormParse(format!(
                "request body of {declared} bytes exceeds the {limit} byte limit"
            )));
        }
        BodyState::Truncated { declared, received } => {
            return Err(CertPinsError::FormParse(format!(
                "request body ended after {received} of {declared} bytes"
            )));
        }
    }

    let mut form = FormData::default();

    if !request.body.is_empty() {
        let content_type = request.header("content-type").unwrap_or_default();
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if mime == URLENCODED {
            form.extend_from(&request.body);
        } else {
            debug!(content_type, "body is not urlencoded, ignoring it");
        }
    }

    form.extend_from(request.query.as_deref().unwrap_or_default().as_bytes());
    Ok(form)
}
