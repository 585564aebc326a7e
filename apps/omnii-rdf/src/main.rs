//! # Omnii RDF - Reasoning Service
//!
//! The main binary for the Omnii RDF knowledge service.
//!
//! This application provides:
//! - HTTP JSON API server (axum-based)
//! - CLI interface for one-shot queries, imports and ontology dumps
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │               apps/omnii-rdf (THE BINARY)            │
//! │                                                      │
//! │      ┌─────────────┐          ┌─────────────┐        │
//! │      │    CLI      │          │  HTTP API   │        │
//! │      │   (clap)    │          │   (axum)    │        │
//! │      └──────┬──────┘          └──────┬──────┘        │
//! │             └────────────┬───────────┘               │
//! │                          ▼                           │
//! │                 ┌─────────────────┐                  │
//! │                 │ omnii-rdf-core  │                  │
//! │                 │  (THE LOGIC)    │                  │
//! │                 └─────────────────┘                  │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server, preloading a Turtle file
//! omnii-rdf server --host 0.0.0.0 --port 8000 --load seed.ttl
//!
//! # One-shot query against the baseline plus a data file
//! omnii-rdf query -e 'SELECT ?c WHERE { ?c a owl:Class }' --data seed.ttl
//! ```

use clap::Parser;
use omnii_rdf::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // OMNII_RDF_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("OMNII_RDF_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "omnii_rdf=info,omnii_rdf_core=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && cli.is_server() {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn print_banner() {
    println!(
        r#"
   ___  __  __ _  _ ___ ___   ___ ___  ___
  / _ \|  \/  | \| |_ _|_ _| | _ \   \| __|
 | (_) | |\/| | .` || | | |  |   / |) | _|
  \___/|_|  |_|_|\_|___|___| |_|_\___/|_|

  Reasoning Service v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
