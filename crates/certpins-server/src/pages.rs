// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTML pages.  Every page is `HEAD + content + FOOT`; only the pin page has
// dynamic content, and everything interpolated into it is escaped.

use certpins_core::error::CertPinsError;
use certpins_core::human_errors::humanize_error;
use certpins_core::types::PinReport;

/// `max-age` written into the sample `Public-Key-Pins` header.
pub const PKP_MAX_AGE: u64 = 31_536_000;

const HEAD: &str = r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>Certificate Pinning - Pin Creator</title>
    <style media="screen" type="text/css">
      html, body { margin: 0; padding: 0; height: 100%; }
      #container { min-height: 100%; position: relative; }
      #header, #body { padding: 10px; max-width: 50em; margin-left: auto; margin-right: auto; }
      #body { padding-bottom: 2em; }
      #footer { position: absolute; bottom: 0; width: 100%; height: 2em; text-align: center; }
      .hint { color: #555; font-size: 90%; }
      pre, tt, textarea { font-family: monospace; }
    </style>
  </head>
  <body><div id="container">
  <div id="header">
    <h1>Certificate Pinning - Pin Creator</h1>
    <h5><a href="/">home</a>&emsp;<a href="/about">about this tool</a></h5>
  </div>
  <div id="body">
"#;

const FOOT: &str = r#"
  </div>
  <div id="footer">CertPins &middot; PMPL-1.0-or-later</div>
  </div></body>
</html>
"#;

const CERT_FORM: &str = r#"
    <p>Paste in a certificate below, PEM encoded with base64, including the BEGIN and END lines.</p>
    <form action="/pin" method="post">
      <div><textarea name="cert" rows="20" cols="70" spellcheck="false"></textarea></div>
      <div><input type="submit" value="Create Cert Pin"></div>
    </form>
"#;

const ABOUT_INTRO: &str = r#"
    <p>Certificate pinning tells clients which public key they should see when
    they connect to your site, independent of which certificate authority
    signed it. A pin is a hash of the certificate's SubjectPublicKeyInfo, so it
    survives certificate renewal as long as the key stays the same.</p>
    <ul>
      <li><a href="https://tools.ietf.org/html/rfc7469">RFC 7469: Public Key Pinning Extension for HTTP</a></li>
      <li><a href="https://www.imperialviolet.org/2011/05/04/pinning.html">Public key pinning (imperialviolet.org)</a></li>
      <li><a href="https://github.com/moxie0/AndroidPinning">AndroidPinning</a></li>
    </ul>
    <p>Nothing you paste is stored, and certificates are not validated: expired
    or self-signed certificates are pinned like any other. Only the first
    certificate of a pasted chain is used.</p>
    <h2>Example</h2>
    <p>Pasting a certificate for <tt>www.google.com</tt> produces:</p>
"#;

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(content: &str) -> String {
    let mut html = String::with_capacity(HEAD.len() + content.len() + FOOT.len());
    html.push_str(HEAD);
    html.push_str(content);
    html.push_str(FOOT);
    html
}

/// `/`: the paste form.
pub fn index_page() -> String {
    page(CERT_FORM)
}

/// `/about`: background plus a worked example.
///
/// `example` is the outcome of running the pipeline on the bundled example
/// certificate.
pub fn about_page(example: &Result<PinReport, CertPinsError>) -> String {
    let mut content = String::from(ABOUT_INTRO);
    match example {
        Ok(report) => content.push_str(&render_report(report)),
        Err(e) => content.push_str(&render_error(e)),
    }
    page(&content)
}

/// `/pin`: any form error, then the pins or the pipeline error, then the
/// form again.
pub fn pin_page(
    form_error: Option<&CertPinsError>,
    outcome: &Result<PinReport, CertPinsError>,
) -> String {
    let mut content = String::new();
    if let Some(e) = form_error {
        content.push_str(&render_error(e));
    }
    match outcome {
        Ok(report) => content.push_str(&render_report(report)),
        Err(e) => content.push_str(&render_error(e)),
    }
    content.push_str("<hr />");
    content.push_str(CERT_FORM);
    page(&content)
}

/// Error page for 400/405/408 responses.
pub fn status_page(title: &str, detail: &str) -> String {
    page(&format!(
        "<h3>{}</h3>\n<p>{}</p>\n",
        escape_html(title),
        escape_html(detail)
    ))
}

/// Error message and hint as HTML paragraphs.
pub fn render_error(err: &CertPinsError) -> String {
    let human = humanize_error(err);
    format!(
        "<p>{}</p>\n<p class=\"hint\">{}</p>\n",
        escape_html(&human.message),
        escape_html(&human.suggestion)
    )
}

/// The three pin formats: Chrome HSTS entry, `Public-Key-Pins` header, and
/// an AndroidPinning snippet.
pub fn render_report(report: &PinReport) -> String {
    let sha1 = report.pins.sha1_base64();
    let sha256 = report.pins.sha256_base64();
    let sha1_hex = report.pins.sha1_hex();

    format!(
        concat!(
            "<h3>Certificate Pin created for {cn}</h3>\n",
            "<p>Go to <tt>chrome://net-internals/#hsts</tt> to add it to your Chrome install by hand:</p>\n",
            "<p><b>sha1/{sha1}</b></p>\n",
            "<p>and/or send it in your <a href=\"https://tools.ietf.org/html/rfc7469\">website's headers</a>, ",
            "the same way as HSTS (HTTP Strict Transport Security).<br />",
            "You <a href=\"https://tools.ietf.org/html/rfc7469#section-4.3\">MUST</a> also pin a backup key with this method, ",
            "otherwise browsers ignore the header.</p>\n",
            "<p><b>Public-Key-Pins: max-age={max_age};<br />",
            "&emsp;pin-sha1=\"{sha1}\";<br />",
            "&emsp;pin-sha256=\"{sha256}\";</b></p>\n",
            "<p>For Android apps using <a href=\"https://github.com/moxie0/AndroidPinning\">AndroidPinning</a>:</p>\n",
            "<pre>String[] pins = new String[] {{\"{sha1_hex}\"}};</pre>\n",
        ),
        cn = escape_html(&report.common_name),
        sha1 = sha1,
        sha256 = sha256,
        sha1_hex = sha1_hex,
        max_age = PKP_MAX_AGE,
    )
}
