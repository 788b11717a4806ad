// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Route table and request handlers.
//
// The table is built once when the server starts and is read-only after
// that, so it is shared between connection tasks behind an `Arc`.

use tracing::{debug, warn};

use certpins_core::AppConfig;
use certpins_core::error::CertPinsError;
use certpins_security::pin_certificate;

use crate::form::{FormData, parse_form};
use crate::http::{HttpRequest, HttpResponse};
use crate::pages;

/// Certificate shown in the worked example on `/about`.
const EXAMPLE_CERT_PEM: &str = include_str!("../assets/example-cert.pem");

/// Path whose routes serve any request that matches no other path.
const FALLBACK_PATH: &str = "/";

/// Form field holding the pasted certificate.
pub const CERT_FIELD: &str = "cert";

type Handler = fn(&Router, &HttpRequest) -> HttpResponse;

struct Route {
    path: &'static str,
    method: &'static str,
    handler: Handler,
}

/// Maps `(method, path)` to a handler.
pub struct Router {
    routes: Vec<Route>,
    hsts_value: String,
    about_html: String,
}

impl Router {
    /// Build the route table and pre-render the static pages.
    pub fn new(config: &AppConfig) -> Self {
        let example = pin_certificate(EXAMPLE_CERT_PEM);
        if let Err(e) = &example {
            warn!(error = %e, "bundled example certificate did not pin");
        }

        Self {
            routes: vec![
                Route {
                    path: "/",
                    method: "GET",
                    handler: handle_index,
                },
                Route {
                    path: "/about",
                    method: "GET",
                    handler: handle_about,
                },
                Route {
                    path: "/pin",
                    method: "POST",
                    handler: handle_pin,
                },
                Route {
                    path: "/pin",
                    method: "GET",
                    handler: handle_pin,
                },
            ],
            hsts_value: format!("max-age={}", config.hsts_max_age),
            about_html: pages::about_page(&example),
        }
    }

    /// Route `request` to its handler.
    ///
    /// `HEAD` is served by the `GET` handler (the caller drops the body).
    /// Paths with no route of their own are served as `/`, so stray links
    /// land on the paste form.  A known path with the wrong method gets 405.
    pub fn dispatch(&self, request: &HttpRequest) -> HttpResponse {
        let method = if request.is_head() { "GET" } else { request.method.as_str() };

        let mut candidates: Vec<&Route> = self
            .routes
            .iter()
            .filter(|r| r.path == request.path)
            .collect();

        if candidates.is_empty() {
            debug!(path = %request.path, "no route, serving fallback");
            candidates = self
                .routes
                .iter()
                .filter(|r| r.path == FALLBACK_PATH)
                .collect();
        }

        match candidates.iter().find(|r| r.method == method) {
            Some(route) => {
                let response = (route.handler)(self, request);
                if response.status == 200 {
                    response.with_header("Strict-Transport-Security", self.hsts_value.clone())
                } else {
                    response
                }
            }
            None => {
                let mut allow: Vec<&str> = candidates.iter().map(|r| r.method).collect();
                allow.sort_unstable();
                if allow.contains(&"GET") {
                    allow.push("HEAD");
                }
                HttpResponse::html(
                    405,
                    pages::status_page(
                        "Method Not Allowed",
                        &format!("{} does not accept {}.", request.path, request.method),
                    ),
                )
                .with_header("Allow", allow.join(", "))
            }
        }
    }
}

fn handle_index(_router: &Router, _request: &HttpRequest) -> HttpResponse {
    HttpResponse::html(200, pages::index_page())
}

fn handle_about(router: &Router, _request: &HttpRequest) -> HttpResponse {
    HttpResponse::html(200, router.about_html.clone())
}

/// Form errors are shown but do not stop the attempt: the `cert` value is
/// then taken from the query string, usually leaving it empty.  A plain
/// `GET /pin` therefore renders the "no PEM structure" result.
fn handle_pin(_router: &Router, request: &HttpRequest) -> HttpResponse {
    let (form, form_error): (FormData, Option<CertPinsError>) = match parse_form(request) {
        Ok(form) => (form, None),
        Err(e) => {
            warn!(error = %e, "form data rejected");
            (FormData::from_query(request), Some(e))
        }
    };

    let cert_text = form.value(CERT_FIELD).unwrap_or_default();
    let outcome = pin_certificate(cert_text);

    match &outcome {
        Ok(report) => debug!(common_name = %report.common_name, "pin page rendered"),
        Err(e) => debug!(error = %e, "pin attempt failed"),
    }

    HttpResponse::html(200, pages::pin_page(form_error.as_ref(), &outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::BodyState;

    const GOOGLE_SHA1_HEX: &str = "522627dff7c1275311c9723317d7cfbc10f495a4";

    fn request(method: &str, path: &str, body: &str) -> HttpRequest {
        HttpRequest {
            method: method.into(),
            path: path.into(),
            query: None,
            headers: vec![(
                "content-type".into(),
                "application/x-www-form-urlencoded".into(),
            )],
            body: body.as_bytes().to_vec(),
            body_state: BodyState::Complete,
        }
    }

    fn encoded_cert(pem: &str) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair(CERT_FIELD, pem)
            .finish()
    }

    fn router() -> Router {
        Router::new(&AppConfig::default())
    }

    #[test]
    fn index_and_about_are_served_with_hsts() {
        let router = router();
        for path in ["/", "/about"] {
            let resp = router.dispatch(&request("GET", path, ""));
            assert_eq!(resp.status, 200, "{path}");
            assert_eq!(resp.header("Strict-Transport-Security"), Some("max-age=31536000"));
        }
    }

    #[test]
    fn about_contains_worked_example() {
        let resp = router().dispatch(&request("GET", "/about", ""));
        assert!(resp.body.contains("Certificate Pin created for www.google.com"));
        assert!(resp.body.contains(GOOGLE_SHA1_HEX));
    }

    #[test]
    fn head_uses_get_handler() {
        let resp = router().dispatch(&request("HEAD", "/", ""));
        assert_eq!(resp.status, 200);
    }

    #[test]
    fn unknown_path_serves_paste_form() {
        let resp = router().dispatch(&request("GET", "/favicon.ico", ""));
        assert_eq!(resp.status, 200);
        assert!(resp.body.contains(r#"<form action="/pin" method="post">"#));
        assert_eq!(resp.header("Strict-Transport-Security"), Some("max-age=31536000"));
    }

    #[test]
    fn get_pin_reports_missing_pem() {
        let resp = router().dispatch(&request("GET", "/pin", ""));
        assert_eq!(resp.status, 200);
        assert!(resp.body.contains("no PEM structure found!"));
    }

    #[test]
    fn get_pin_reads_query_string() {
        let mut req = request("GET", "/pin", "");
        req.query = Some(encoded_cert(include_str!("../assets/example-cert.pem")));
        let resp = router().dispatch(&req);
        assert!(resp.body.contains(GOOGLE_SHA1_HEX));
    }

    #[test]
    fn wrong_method_is_405_with_allow() {
        let router = router();
        let resp = router.dispatch(&request("PUT", "/pin", ""));
        assert_eq!(resp.status, 405);
        assert_eq!(resp.header("Allow"), Some("GET, POST, HEAD"));
        assert!(resp.header("Strict-Transport-Security").is_none());

        let resp = router.dispatch(&request("POST", "/about", ""));
        assert_eq!(resp.status, 405);
        assert_eq!(resp.header("Allow"), Some("GET, HEAD"));

        let resp = router.dispatch(&request("POST", "/elsewhere", ""));
        assert_eq!(resp.status, 405);
        assert_eq!(resp.header("Allow"), Some("GET, HEAD"));
    }

    #[test]
    fn pin_renders_pins() {
        let body = encoded_cert(include_str!("../assets/example-cert.pem"));
        let resp = router().dispatch(&request("POST", "/pin", &body));
        assert_eq!(resp.status, 200);
        assert!(resp.body.contains("Certificate Pin created for www.google.com"));
        assert!(resp.body.contains(GOOGLE_SHA1_HEX));
        assert!(resp.body.contains("pin-sha256=\"izqEDFPvHqfbDADLnBAtYVvlg/ofVEOGbbL+k25AnpA=\""));
    }

    #[test]
    fn pin_without_pem_reports_error_with_200() {
        let resp = router().dispatch(&request("POST", "/pin", "cert=hello+world"));
        assert_eq!(resp.status, 200);
        assert!(resp.body.contains("no PEM structure found!"));
        assert!(!resp.body.contains("Certificate Pin created"));
    }

    #[test]
    fn form_error_is_inline_and_attempt_continues() {
        let mut req = request("POST", "/pin", "");
        req.body_state = BodyState::Truncated {
            declared: 40,
            received: 6,
        };
        let resp = router().dispatch(&req);
        assert_eq!(resp.status, 200);
        assert!(resp.body.contains("Error Parsing Form Data: "));
        assert!(resp.body.contains("no PEM structure found!"));
    }

    #[test]
    fn non_form_body_is_ignored_without_error() {
        let mut req = request("POST", "/pin", "cert=x");
        req.headers = vec![("content-type".into(), "text/plain".into())];
        let resp = router().dispatch(&req);
        assert_eq!(resp.status, 200);
        assert!(!resp.body.contains("Error Parsing Form Data"));
        assert!(resp.body.contains("no PEM structure found!"));
    }

    #[test]
    fn custom_hsts_max_age() {
        let config = AppConfig {
            hsts_max_age: 600,
            ..AppConfig::default()
        };
        let resp = Router::new(&config).dispatch(&request("GET", "/", ""));
        assert_eq!(resp.header("Strict-Transport-Security"), Some("max-age=600"));
    }
}
