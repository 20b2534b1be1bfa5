//! Workflow-layer error types.
//!
//! Every variant that concerns a file carries its path, so the CLI can
//! report which document or schema failed without extra context.

use std::path::PathBuf;

use srptn_schema::SchemaDefinitionError;
use thiserror::Error;

/// Errors raised while loading an analysis directory.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A document could not be read or parsed.
    #[error("failed to load {path}: {reason}")]
    DocumentLoad { path: PathBuf, reason: String },

    /// The workflow package ships no schema for the requested item.
    #[error("no schema for {item:?} in {dir}")]
    SchemaNotFound { item: String, dir: PathBuf },

    /// The analysis directory has no configuration file.
    #[error("no config/config.yml or config/config.yaml in {dir}")]
    ConfigNotFound { dir: PathBuf },

    /// The document holds nothing.
    #[error("configuration file is empty: {path}")]
    EmptyDocument { path: PathBuf },

    /// The canonical schema definition is malformed.
    #[error("invalid canonical schema: {0}")]
    Schema(#[from] SchemaDefinitionError),

    /// A value could not be serialized for output.
    #[error("failed to render document: {reason}")]
    Render { reason: String },

    /// `SRPTN_CONFIG` could not be read.
    #[error("invalid settings: {reason}")]
    Settings { reason: String },

    /// Writing a document failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias.
pub type WorkflowResult<T> = Result<T, WorkflowError>;
