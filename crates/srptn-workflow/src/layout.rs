//! Analysis directory layout.
//!
//! ```text
//! <analysis>/
//!   config/config.yml | config/config.yaml
//!   workflow/schemas/<item>.schema.{yaml,yml,json}
//! ```
//!
//! The first existing candidate wins in every lookup.

use std::path::{Path, PathBuf};

use crate::error::{WorkflowError, WorkflowResult};

/// Configuration file names, in lookup order.
pub const CONFIG_FILE_NAMES: [&str; 2] = ["config.yml", "config.yaml"];

/// Schema file extensions, in lookup order.
pub const SCHEMA_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// Paths inside one analysis directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisLayout {
    root: PathBuf,
}

impl AnalysisLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_dir(&self) -> PathBuf {
        self.root.join("config")
    }

    /// Deployed workflow package.
    pub fn workflow_dir(&self) -> PathBuf {
        self.root.join("workflow")
    }

    pub fn schema_dir(&self) -> PathBuf {
        self.workflow_dir().join("schemas")
    }

    /// The analysis configuration file, `config.yml` before `config.yaml`.
    pub fn config_path(&self) -> WorkflowResult<PathBuf> {
        let dir = self.config_dir();
        let found = CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file());
        found.ok_or(WorkflowError::ConfigNotFound { dir })
    }

    /// Schema shipped for `item` (e.g. `config`, `samples`, `units`), if any.
    pub fn schema_path(&self, item: &str) -> Option<PathBuf> {
        let dir = self.schema_dir();
        SCHEMA_EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("{item}.schema.{ext}")))
            .find(|path| path.is_file())
    }

    /// Like [`schema_path`](Self::schema_path), but a missing schema is an error.
    pub fn require_schema(&self, item: &str) -> WorkflowResult<PathBuf> {
        self.schema_path(item)
            .ok_or_else(|| WorkflowError::SchemaNotFound {
                item: item.to_string(),
                dir: self.schema_dir(),
            })
    }
}
