// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Minimal HTTP/1.1 framing — one request per connection.
//
// Browsers only ever send us small GETs and a form POST, so we parse the
// request line and headers ourselves, read exactly `Content-Length` body
// bytes, and always answer with `Connection: close`.  No chunked bodies, no
// keep-alive, no pipelining.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use certpins_core::error::{CertPinsError, Result};

/// Largest request line + headers we accept.
pub const MAX_HEAD_BYTES: usize = 16 * 1024;

/// Oversized bodies are drained up to this many bytes so the client sees our
/// response instead of a reset.
const MAX_DRAIN_BYTES: u64 = 1024 * 1024;

const READ_CHUNK: usize = 4096;

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// How much of the declared body actually arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyState {
    /// `Content-Length` bytes were read (or no body was declared).
    Complete,
    /// The declared length exceeded the configured limit; body discarded.
    TooLarge { declared: usize, limit: usize },
    /// The peer closed the connection before sending the whole body.
    Truncated { declared: usize, received: usize },
}

/// A parsed HTTP request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Request method, upper-case as sent (`GET`, `POST`, ...).
    pub method: String,
    /// Path component of the request target, without the query.
    pub path: String,
    /// Raw query string (after `?`), if any.
    pub query: Option<String>,
    /// Header fields in arrival order; names lower-cased.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub body_state: BodyState,
}

impl HttpRequest {
    /// First value of header `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_head(&self) -> bool {
        self.method == "HEAD"
    }
}

/// Outcome of reading one request from a connection.
#[derive(Debug)]
pub enum ReadOutcome {
    Request(HttpRequest),
    /// The bytes received are not an HTTP request we understand.
    Malformed(String),
    /// The peer closed the connection without sending anything.
    Closed,
}

/// The parts of a request available before the body is read.
#[derive(Debug, PartialEq, Eq)]
struct RequestHead {
    method: String,
    path: String,
    query: Option<String>,
    headers: Vec<(String, String)>,
    content_length: usize,
}

/// Parse the request line and header block (without the blank line).
fn parse_request_head(head: &[u8]) -> std::result::Result<RequestHead, String> {
    let text = std::str::from_utf8(head).map_err(|_| "request head is not UTF-8".to_string())?;
    let mut lines = text.split("\r\n");

    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split(' ');
    let (method, target, version) = match (parts.next(), parts.next(), parts.next(), parts.next())
    {
        (Some(m), Some(t), Some(v), None) if !m.is_empty() && !t.is_empty() => (m, t, v),
        _ => return Err(format!("malformed request line: {request_line:?}")),
    };

    if !version.starts_with("HTTP/1.") {
        return Err(format!("unsupported protocol version: {version}"));
    }
    if !method.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(format!("invalid method: {method:?}"));
    }

    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path.to_string(), Some(query.to_string())),
        None => (target.to_string(), None),
    };
    if !path.starts_with('/') {
        return Err(format!("unsupported request target: {target:?}"));
    }

    let mut headers = Vec::new();
    for line in lines {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| format!("malformed header line: {line:?}"))?;
        headers.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
    }

    if headers
        .iter()
        .any(|(n, v)| n == "transfer-encoding" && !v.eq_ignore_ascii_case("identity"))
    {
        return Err("chunked request bodies are not supported".into());
    }

    let content_length = match headers.iter().find(|(n, _)| n == "content-length") {
        Some((_, value)) => value
            .parse::<usize>()
            .map_err(|_| format!("invalid Content-Length: {value:?}"))?,
        None => 0,
    };

    Ok(RequestHead {
        method: method.to_string(),
        path,
        query,
        headers,
        content_length,
    })
}

/// Find the first occurrence of `needle` in `haystack`.
fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Read one request from `reader`, accepting at most `max_body` body bytes.
///
/// I/O failures are returned as errors; anything the peer sent that we
/// cannot interpret comes back as [`ReadOutcome::Malformed`] so the caller
/// can still answer `400 Bad Request`.
pub async fn read_request<R>(reader: &mut R, max_body: usize) -> Result<ReadOutcome>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::with_capacity(READ_CHUNK);
    let mut chunk = [0u8; READ_CHUNK];

    let header_end = loop {
        if let Some(pos) = find_subsequence(&buf, b"\r\n\r\n") {
            break pos;
        }
        if buf.len() > MAX_HEAD_BYTES {
            return Ok(ReadOutcome::Malformed("request head too large".into()));
        }
        let n = reader
            .read(&mut chunk)
            .await
            .map_err(|e| CertPinsError::Server(format!("read request head: {e}")))?;
        if n == 0 {
            return Ok(if buf.is_empty() {
                ReadOutcome::Closed
            } else {
                ReadOutcome::Malformed("connection closed before end of headers".into())
            });
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = match parse_request_head(&buf[..header_end]) {
        Ok(head) => head,
        Err(e) => return Ok(ReadOutcome::Malformed(e)),
    };

    let mut body = buf.split_off(header_end + 4);
    let declared = head.content_length;

    let body_state = if declared > max_body {
        let already = body.len() as u64;
        let remaining = (declared as u64).saturating_sub(already).min(MAX_DRAIN_BYTES);
        tokio::io::copy(&mut (&mut *reader).take(remaining), &mut tokio::io::sink())
            .await
            .map_err(|e| CertPinsError::Server(format!("drain request body: {e}")))?;
        body.clear();
        BodyState::TooLarge {
            declared,
            limit: max_body,
        }
    } else {
        while body.len() < declared {
            let want = (declared - body.len()).min(READ_CHUNK);
            let n = reader
                .read(&mut chunk[..want])
                .await
                .map_err(|e| CertPinsError::Server(format!("read request body: {e}")))?;
            if n == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..n]);
        }
        if body.len() < declared {
            BodyState::Truncated {
                declared,
                received: body.len(),
            }
        } else {
            body.truncate(declared);
            BodyState::Complete
        }
    };

    Ok(ReadOutcome::Request(HttpRequest {
        method: head.method,
        path: head.path,
        query: head.query,
        headers: head.headers,
        body,
        body_state,
    }))
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// An HTML response ready to be written to the socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// A `text/html` response with the given status and body.
    pub fn html(status: u16, body: String) -> Self {
        Self {
            status,
            headers: vec![(
                "Content-Type".into(),
                "text/html; charset=utf-8".into(),
            )],
            body,
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    /// First value of header `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Serialize the status line and headers.
    fn head_bytes(&self) -> Vec<u8> {
        let mut head = format!("HTTP/1.1 {} {}\r\n", self.status, reason_phrase(self.status));
        for (name, value) in &self.headers {
            head.push_str(name);
            head.push_str(": ");
            head.push_str(value);
            head.push_str("\r\n");
        }
        head.push_str(&format!("Content-Length: {}\r\n", self.body.len()));
        head.push_str("Connection: close\r\n\r\n");
        head.into_bytes()
    }

    /// Write the response; with `head_only` the body is omitted (HEAD).
    pub async fn write_to<W>(&self, writer: &mut W, head_only: bool) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        writer
            .write_all(&self.head_bytes())
            .await
            .map_err(|e| CertPinsError::Server(format!("write HTTP headers: {e}")))?;

        if !head_only {
            writer
                .write_all(self.body.as_bytes())
                .await
                .map_err(|e| CertPinsError::Server(format!("write HTTP body: {e}")))?;
        }

        writer
            .flush()
            .await
            .map_err(|e| CertPinsError::Server(format!("flush: {e}")))?;

        Ok(())
    }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        405 => "Method Not Allowed",
        408 => "Request Timeout",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}
