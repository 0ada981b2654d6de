//! Service wiring: HTTP server and application state

pub mod http;
