//! # CLI Module
//!
//! Command-line interface for the Omnii RDF service.
//!
//! The knowledge base lives in memory, so every command starts from the
//! baseline ontology plus whatever `--data`/`--load` files it is given.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `query` - Run a SELECT query against the loaded data
//! - `import` - Validate a document and report what it would add
//! - `ontology` - Serialize the loaded graph
//! - `status` - Show store, cache and ontology counts

mod commands;

use clap::{Parser, Subcommand};
use omnii_rdf_core::RdfError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Omnii RDF - Reasoning Service
///
/// In-memory RDF store with RDFS/OWL reasoning, a SPARQL subset and a
/// brain-memory context layer.
#[derive(Parser, Debug)]
#[command(name = "omnii-rdf")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Service configuration (TOML)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Whether this invocation starts the HTTP server.
    #[must_use]
    pub fn is_server(&self) -> bool {
        matches!(self.command, Some(Commands::Server { .. }))
    }
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8000")]
        port: u16,

        /// RDF files to import before serving
        #[arg(short, long)]
        load: Vec<PathBuf>,
    },

    /// Run a SELECT query
    Query {
        /// Query text
        #[arg(short = 'e', long, conflicts_with = "file")]
        query: Option<String>,

        /// File holding the query text
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// RDF files to import first
        #[arg(short, long)]
        data: Vec<PathBuf>,

        /// Evaluate against the inferred closure
        #[arg(short, long)]
        reasoning: bool,

        /// Maximum number of rows
        #[arg(short, long)]
        limit: Option<usize>,

        /// Scope the query to this user's memory
        #[arg(short, long)]
        user: Option<String>,

        /// Channel recorded with the user scope
        #[arg(long, default_value = "cli")]
        channel: String,
    },

    /// Validate an RDF document against the baseline
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// Input format (turtle, nt); inferred from the extension if absent
        #[arg(short = 't', long)]
        format: Option<String>,
    },

    /// Serialize the loaded graph
    Ontology {
        /// Output format (turtle, nt)
        #[arg(short = 't', long, default_value = "turtle")]
        format: String,

        /// RDF files to import first
        #[arg(short, long)]
        data: Vec<PathBuf>,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show store, cache and ontology counts
    Status {
        /// RDF files to import first
        #[arg(short, long)]
        data: Vec<PathBuf>,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), RdfError> {
    let config = load_config(cli.config.as_deref())?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port, load }) => {
            cmd_server(config, &host, port, &load, cli.quiet).await
        }
        Some(Commands::Query {
            query,
            file,
            data,
            reasoning,
            limit,
            user,
            channel,
        }) => {
            let text = query_text(query, file.as_deref())?;
            let scope = user.map(|user| (user, channel));
            cmd_query(
                config,
                json_mode,
                &QueryArgs {
                    text,
                    data,
                    reasoning,
                    limit,
                    scope,
                    verbose: cli.verbose,
                },
            )
        }
        Some(Commands::Import { input, format }) => {
            cmd_import(config, json_mode, &input, format.as_deref())
        }
        Some(Commands::Ontology {
            format,
            data,
            output,
        }) => cmd_ontology(config, &format, &data, output.as_deref()),
        Some(Commands::Status { data }) => cmd_status(config, json_mode, &data),
        None => cmd_status(config, json_mode, &[]),
    }
}
