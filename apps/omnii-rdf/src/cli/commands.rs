//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::api;
use omnii_rdf_core::{
    BrainContext, ImportOutcome, ImportRequest, KnowledgeBase, QueryOutcome, QueryRequest,
    RdfError, RdfFormat, ServiceConfig, vocab::MAX_IMPORT_LENGTH,
};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE VALIDATION
// =============================================================================

/// Maximum size of a query file.
const MAX_QUERY_FILE_SIZE: u64 = 64 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), RdfError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| RdfError::Io(format!("Cannot read file metadata: {e}")))?;

    if metadata.len() > max_size {
        return Err(RdfError::Validation(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve `path` to an existing regular file.
///
/// Canonicalizing resolves `..` and symlinks before anything is read.
fn validate_file_path(path: &Path) -> Result<PathBuf, RdfError> {
    let canonical = path
        .canonicalize()
        .map_err(|e| RdfError::Io(format!("Invalid file path '{}': {e}", path.display())))?;

    if !canonical.is_file() {
        return Err(RdfError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// For output files, the parent directory must exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, RdfError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        RdfError::Io(format!(
            "Invalid output directory '{}': {e}",
            parent.display()
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(RdfError::Io(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| RdfError::Io("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

/// Read a validated, size-checked text file.
fn read_text_file(path: &Path, max_size: u64) -> Result<String, RdfError> {
    let validated = validate_file_path(path)?;
    validate_file_size(&validated, max_size)?;
    std::fs::read_to_string(&validated)
        .map_err(|e| RdfError::Io(format!("Read '{}': {e}", path.display())))
}

/// `.nt` means N-Triples; everything else is read as Turtle.
#[must_use]
pub fn format_for_path(path: &Path) -> RdfFormat {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("nt") => RdfFormat::NTriples,
        _ => RdfFormat::Turtle,
    }
}

// =============================================================================
// SHARED SETUP
// =============================================================================

/// The given configuration file, or the defaults.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig, RdfError> {
    match path {
        Some(path) => {
            let validated = validate_file_path(path)?;
            let config = ServiceConfig::from_file(&validated)?;
            tracing::debug!(path = %validated.display(), "Configuration loaded");
            Ok(config)
        }
        None => Ok(ServiceConfig::default()),
    }
}

/// A fresh knowledge base with each file merged in order.
///
/// The first file that fails to parse aborts the load.
pub fn load_knowledge(config: ServiceConfig, files: &[PathBuf]) -> Result<KnowledgeBase, RdfError> {
    let mut knowledge = KnowledgeBase::with_config(config);
    for path in files {
        let outcome = import_file(&mut knowledge, path, None)?;
        if let Some(error) = outcome.error {
            return Err(RdfError::Validation(format!("{}: {error}", path.display())));
        }
        tracing::info!(
            path = %path.display(),
            added = outcome.triples_imported,
            "Data file loaded"
        );
    }
    Ok(knowledge)
}

fn import_file(
    knowledge: &mut KnowledgeBase,
    path: &Path,
    format: Option<&str>,
) -> Result<ImportOutcome, RdfError> {
    let format = match format {
        Some(name) => name.parse()?,
        None => format_for_path(path),
    };
    let data = read_text_file(path, MAX_IMPORT_LENGTH as u64)?;
    Ok(knowledge.import(&ImportRequest::new(data, format)))
}

/// Query text from `--query` or `--file`.
pub fn query_text(inline: Option<String>, file: Option<&Path>) -> Result<String, RdfError> {
    match (inline, file) {
        (Some(text), _) => Ok(text),
        (None, Some(path)) => read_text_file(path, MAX_QUERY_FILE_SIZE),
        (None, None) => Err(RdfError::Validation(
            "either --query or --file is required".to_string(),
        )),
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(
    config: ServiceConfig,
    host: &str,
    port: u16,
    load: &[PathBuf],
    quiet: bool,
) -> Result<(), RdfError> {
    let knowledge = load_knowledge(config, load)?;

    if !quiet {
        println!("Omnii RDF Reasoning Service Starting...");
        println!();
        println!("Configuration:");
        println!("  Host:     {host}");
        println!("  Port:     {port}");
        println!("  Triples:  {}", knowledge.len());
        println!();
        println!("Endpoints:");
        println!("  POST /query                - Run a SELECT query");
        println!("  POST /import-rdf           - Import Turtle or N-Triples");
        println!("  POST /evolve-concept       - Evolve a concept");
        println!("  POST /analyze-brain-memory - Analyze working memory");
        println!("  GET  /ontology             - Serialize the graph");
        println!("  GET  /metrics              - Store and cache metrics");
        println!("  GET  /health               - Health check");
        println!();
        println!("Press Ctrl+C to stop");
        println!();
    }

    let addr = format!("{host}:{port}");
    api::run_server(&addr, knowledge).await
}

// =============================================================================
// QUERY COMMAND
// =============================================================================

/// Arguments of the `query` command.
#[derive(Debug, Clone)]
pub struct QueryArgs {
    pub text: String,
    pub data: Vec<PathBuf>,
    pub reasoning: bool,
    pub limit: Option<usize>,
    /// `(user_id, channel)` to scope the query to.
    pub scope: Option<(String, String)>,
    pub verbose: bool,
}

impl QueryArgs {
    fn to_request(&self) -> QueryRequest {
        let mut request = QueryRequest::new(self.text.clone()).with_reasoning(self.reasoning);
        if let Some(limit) = self.limit {
            request = request.with_limit(limit);
        }
        if let Some((user, channel)) = &self.scope {
            request = request.with_context(BrainContext::new(user.clone(), channel.clone()));
        }
        request
    }
}

/// Run one query and print the rows.
pub fn cmd_query(config: ServiceConfig, json_mode: bool, args: &QueryArgs) -> Result<(), RdfError> {
    let knowledge = load_knowledge(config, &args.data)?;
    let outcome = knowledge.query(&args.to_request());

    if json_mode {
        print_json(&outcome);
    } else {
        print_query_outcome(&outcome, args.verbose);
    }

    match outcome.error {
        Some(error) if !outcome.success => Err(RdfError::Validation(error)),
        _ => Ok(()),
    }
}

fn print_query_outcome(outcome: &QueryOutcome, verbose: bool) {
    if !outcome.success {
        return;
    }
    for (index, row) in outcome.results.iter().enumerate() {
        let cells: Vec<String> = row
            .iter()
            .map(|(name, term)| format!("?{name} = {}", term.value))
            .collect();
        println!("[{}] {}", index + 1, cells.join("  "));
    }
    println!();
    println!("{} result(s)", outcome.total_results);
    if outcome.reasoning_applied {
        println!("Reasoning:  applied");
    }
    if verbose {
        println!("Hash:       {}", outcome.query_hash);
        println!("Time:       {} ms", outcome.execution_time_ms);
    }
}

// =============================================================================
// IMPORT COMMAND
// =============================================================================

/// Parse a document against the baseline and report what it adds.
pub fn cmd_import(
    config: ServiceConfig,
    json_mode: bool,
    input: &Path,
    format: Option<&str>,
) -> Result<(), RdfError> {
    let mut knowledge = KnowledgeBase::with_config(config);
    let outcome = import_file(&mut knowledge, input, format)?;

    if json_mode {
        print_json(&outcome);
    } else if outcome.success {
        println!("Format:          {}", outcome.format);
        println!("New triples:     {}", outcome.triples_imported);
        println!("Total triples:   {}", outcome.total_triples);
    }

    match outcome.error {
        Some(error) => Err(RdfError::Validation(error)),
        None => Ok(()),
    }
}

// =============================================================================
// ONTOLOGY COMMAND
// =============================================================================

/// Serialize the baseline plus data files.
pub fn cmd_ontology(
    config: ServiceConfig,
    format: &str,
    data: &[PathBuf],
    output: Option<&Path>,
) -> Result<(), RdfError> {
    let format: RdfFormat = format.parse()?;
    let knowledge = load_knowledge(config, data)?;
    let text = knowledge.serialize_ontology(format)?;

    match output {
        Some(path) => {
            let validated = validate_output_path(path)?;
            std::fs::write(&validated, text.as_bytes())
                .map_err(|e| RdfError::Io(format!("Write file: {e}")))?;
            println!(
                "Wrote {} triples ({}) to {}",
                knowledge.len(),
                format,
                validated.display()
            );
        }
        None => print!("{text}"),
    }
    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show store, cache and ontology counts.
pub fn cmd_status(config: ServiceConfig, json_mode: bool, data: &[PathBuf]) -> Result<(), RdfError> {
    let knowledge = load_knowledge(config, data)?;
    let metrics = knowledge.metrics();

    if json_mode {
        print_json(&metrics);
        return Ok(());
    }

    println!("Omnii RDF Status");
    println!("================");
    println!("Triples:             {}", metrics.graph_size);
    println!("Ontology classes:    {}", metrics.ontology_classes);
    println!("Ontology properties: {}", metrics.ontology_properties);
    println!("Cached results:      {}", metrics.cache_stats.key_count);
    println!("Namespaces:          {}", metrics.namespaces.join(", "));

    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
