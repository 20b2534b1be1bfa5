//! # srptn-cli — Configuration Checking from the Command Line
//!
//! Provides the `srptn` command-line interface over the schema engine.
//!
//! ## Subcommands
//!
//! - `srptn validate` — path-scoped violations of a configuration document.
//! - `srptn infer` — print the inferred schema of a document.
//! - `srptn reconcile` — structural diff between a document and the reference.
//! - `srptn extend` — print the reference schema widened by the document.
//! - `srptn check` — validation plus reconciliation; exit status gates a run.
//!
//! Inputs are either an analysis directory (`--analysis`, default: the
//! workdir) or an explicit `--config`/`--schema` pair:
//!
//! ```bash
//! srptn check --analysis analyses/liver
//! srptn validate --config config.yaml --schema workflow/schemas/config.schema.yaml --json
//! srptn infer config/config.yaml --format json
//! ```
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from the handlers.
//! - Handlers delegate to `srptn-schema` and `srptn-workflow`; no schema
//!   semantics here.
//! - Handlers return the process exit code: 0 clean, 1 problems found.

pub mod check;
pub mod extend;
pub mod infer;
pub mod reconcile;
pub mod validate;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use serde_json::Value;

use srptn_schema::SchemaModel;
use srptn_workflow::{
    load_canonical_schema, load_document, render_document, AnalysisLayout, DocumentFormat, Session,
};

/// Resolve a path that may be relative to the workdir.
///
/// If the path is absolute, returns it as-is. If relative and the file
/// exists relative to `workdir`, uses that. Otherwise returns the path
/// relative to the current directory.
pub fn resolve_path(path: &Path, workdir: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let relative = workdir.join(path);
    if relative.exists() {
        relative
    } else {
        path.to_path_buf()
    }
}

/// Where the document and its reference schema come from.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceArgs {
    /// Analysis directory holding config/config.y(a)ml and the deployed
    /// workflow. Defaults to the workdir.
    #[arg(long, conflicts_with = "config")]
    pub analysis: Option<PathBuf>,

    /// Configuration document (YAML or JSON).
    #[arg(long, requires = "schema")]
    pub config: Option<PathBuf>,

    /// Canonical schema definition for --config.
    #[arg(long, requires = "config")]
    pub schema: Option<PathBuf>,
}

/// A loaded document and the model it is checked against.
#[derive(Debug, Clone)]
pub struct Inputs {
    pub config_path: PathBuf,
    pub document: Value,
    pub canonical: Arc<SchemaModel>,
}

impl SourceArgs {
    /// Load the document and its reference model.
    pub fn load(&self, workdir: &Path) -> Result<Inputs> {
        if let (Some(config), Some(schema)) = (&self.config, &self.schema) {
            let config_path = resolve_path(config, workdir);
            let schema_path = resolve_path(schema, workdir);
            let document = load_document(&config_path)
                .with_context(|| format!("failed to load config: {}", config_path.display()))?;
            let canonical = load_canonical_schema(&schema_path)
                .with_context(|| format!("failed to load schema: {}", schema_path.display()))?;
            return Ok(Inputs {
                config_path,
                document,
                canonical: Arc::new(canonical),
            });
        }

        let dir = match &self.analysis {
            Some(dir) => resolve_path(dir, workdir),
            None => workdir.to_path_buf(),
        };
        let session = Session::open(AnalysisLayout::new(&dir))
            .with_context(|| format!("failed to open analysis: {}", dir.display()))?;
        Ok(Inputs {
            config_path: session.config_path().to_path_buf(),
            document: session.document().clone(),
            canonical: session.canonical(),
        })
    }
}

/// Output format for schema definitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

impl From<OutputFormat> for DocumentFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Yaml => DocumentFormat::Yaml,
            OutputFormat::Json => DocumentFormat::Json,
        }
    }
}

/// Render a schema definition in the requested format.
pub fn render_definition(definition: &Value, format: OutputFormat) -> Result<String> {
    render_document(definition, format.into()).context("failed to render schema definition")
}

/// Pretty JSON for `--json` output.
pub fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("failed to serialize output")
}
