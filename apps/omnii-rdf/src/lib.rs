//! # omnii-rdf
//!
//! HTTP API and CLI for the Omnii RDF knowledge service.
//!
//! The binary in `main.rs` only sets up tracing and dispatches to [`cli`];
//! everything is exposed here so integration tests can build the router
//! directly.

pub mod api;
pub mod cli;
