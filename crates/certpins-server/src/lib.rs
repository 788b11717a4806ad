// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// CertPins HTTP front end — listener, request framing, routing, and pages.

pub mod form;
pub mod http;
pub mod pages;
pub mod routes;
pub mod server;

pub use routes::Router;
pub use server::PinServer;
