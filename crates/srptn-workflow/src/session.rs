//! Per-analysis schema session.
//!
//! A session owns the analysis configuration document and the canonical
//! model it is checked against. The canonical model is parsed once and
//! shared read-only behind an `Arc`; editing the document and re-checking
//! never re-parses the schema.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use srptn_schema::{
    check, extend, infer, parse_canonical, validate, ConfigReport, SchemaExtension, SchemaModel,
    Violation,
};

use crate::document::load_document;
use crate::error::WorkflowResult;
use crate::layout::AnalysisLayout;

/// Schema item name of the analysis configuration.
pub const CONFIG_SCHEMA_ITEM: &str = "config";

/// Where the session's reference model came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    /// Parsed from a schema file shipped with the workflow package.
    Canonical(PathBuf),
    /// The workflow ships no config schema; inferred from the document.
    Inferred,
}

/// Load and parse a canonical schema definition file.
pub fn load_canonical_schema(path: &Path) -> WorkflowResult<SchemaModel> {
    let definition = load_document(path)?;
    Ok(parse_canonical(&definition)?)
}

/// Configuration document plus its reference schema.
#[derive(Debug, Clone)]
pub struct Session {
    layout: AnalysisLayout,
    config_path: PathBuf,
    document: Value,
    canonical: Arc<SchemaModel>,
    source: SchemaSource,
}

impl Session {
    /// Open the analysis at `layout`: load its configuration and the
    /// workflow's config schema, falling back to the inferred schema of the
    /// document when the workflow ships none.
    pub fn open(layout: AnalysisLayout) -> WorkflowResult<Self> {
        let config_path = layout.config_path()?;
        let document = load_document(&config_path)?;
        let (canonical, source) = match layout.schema_path(CONFIG_SCHEMA_ITEM) {
            Some(schema_path) => {
                let model = load_canonical_schema(&schema_path)?;
                tracing::info!(schema = %schema_path.display(), "loaded canonical config schema");
                (model, SchemaSource::Canonical(schema_path))
            }
            None => {
                tracing::info!(
                    dir = %layout.schema_dir().display(),
                    "workflow ships no config schema, using inferred schema"
                );
                (infer(&document), SchemaSource::Inferred)
            }
        };
        Ok(Self {
            layout,
            config_path,
            document,
            canonical: Arc::new(canonical),
            source,
        })
    }

    pub fn layout(&self) -> &AnalysisLayout {
        &self.layout
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Shared handle to the reference model.
    pub fn canonical(&self) -> Arc<SchemaModel> {
        Arc::clone(&self.canonical)
    }

    pub fn schema_source(&self) -> &SchemaSource {
        &self.source
    }

    /// Replace the document, e.g. after an edit. The reference model is kept.
    pub fn set_document(&mut self, document: Value) {
        self.document = document;
    }

    /// Re-read the configuration file from disk.
    pub fn reload(&mut self) -> WorkflowResult<()> {
        self.document = load_document(&self.config_path)?;
        Ok(())
    }

    pub fn validate(&self) -> Vec<Violation> {
        validate(&self.document, &self.canonical)
    }

    pub fn check(&self) -> ConfigReport {
        check(&self.document, &self.canonical)
    }

    /// Reference model widened with the fields the document adds.
    pub fn extended_schema(&self) -> SchemaExtension {
        extend(&self.canonical, &self.document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WorkflowError;
    use serde_json::json;

    const SCHEMA: &str = "\
type: object
properties:
  samples:
    type: string
  enrichment:
    type: object
    properties:
      fdr:
        type: number
    required: [fdr]
required: [samples, enrichment]
";

    fn write(root: &Path, rel: &str, text: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, text).unwrap();
    }

    #[test]
    fn opens_with_canonical_schema() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "workflow/schemas/config.schema.yaml", SCHEMA);
        write(dir.path(), "config/config.yaml", "samples: s.tsv\nenrichment:\n  fdr: 0.05\n");

        let session = Session::open(AnalysisLayout::new(dir.path())).unwrap();
        assert!(matches!(session.schema_source(), SchemaSource::Canonical(_)));
        assert!(session.validate().is_empty());
        assert!(session.check().is_runnable());
    }

    #[test]
    fn falls_back_to_inferred_schema() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "config/config.yml", "samples: s.tsv\n");

        let session = Session::open(AnalysisLayout::new(dir.path())).unwrap();
        assert_eq!(session.schema_source(), &SchemaSource::Inferred);
        assert!(session.check().is_runnable(), "a document always fits its own shape");
    }

    #[test]
    fn edits_are_checked_against_the_same_model() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "workflow/schemas/config.schema.yaml", SCHEMA);
        write(dir.path(), "config/config.yaml", "samples: s.tsv\nenrichment:\n  fdr: 0.05\n");

        let mut session = Session::open(AnalysisLayout::new(dir.path())).unwrap();
        let before = session.canonical();
        session.set_document(json!({ "samples": "s.tsv" }));
        assert_eq!(session.validate().len(), 1);
        assert!(Arc::ptr_eq(&before, &session.canonical()));

        session.reload().unwrap();
        assert!(session.validate().is_empty());
    }

    #[test]
    fn extended_schema_covers_document_additions() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "workflow/schemas/config.schema.yaml", SCHEMA);
        write(
            dir.path(),
            "config/config.yaml",
            "samples: s.tsv\nenrichment:\n  fdr: 0.05\nscatter:\n  activate: true\n",
        );
        let session = Session::open(AnalysisLayout::new(dir.path())).unwrap();
        let ext = session.extended_schema();
        assert_eq!(ext.added.len(), 1);
        assert_eq!(ext.added[0].to_string(), "scatter");
    }

    #[test]
    fn malformed_schema_is_a_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "workflow/schemas/config.schema.yaml",
            "type: object\nproperties:\n  a:\n    $ref: '#/definitions/a'\n",
        );
        write(dir.path(), "config/config.yaml", "a: 1\n");
        let err = Session::open(AnalysisLayout::new(dir.path())).unwrap_err();
        assert!(matches!(err, WorkflowError::Schema(_)), "{err}");
    }

    #[test]
    fn missing_config_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let err = Session::open(AnalysisLayout::new(dir.path())).unwrap_err();
        assert!(matches!(err, WorkflowError::ConfigNotFound { .. }));
    }
}
