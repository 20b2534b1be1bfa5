//! # srptn-workflow — Analysis Workspace Access
//!
//! The I/O side of configuration checking: reads YAML/JSON documents,
//! locates the configuration and the schemas a deployed workflow package
//! ships, and holds the per-analysis [`Session`] that pairs a document with
//! its shared canonical model. All schema semantics live in `srptn-schema`.
//!
//! ## Crate Policy
//!
//! - Errors carry the path of the file that failed.
//! - No `.unwrap()` outside tests.

pub mod document;
pub mod error;
pub mod layout;
pub mod session;
pub mod settings;

pub use document::{
    load_document, parse_document, render_document, write_document, DocumentFormat,
};
pub use error::{WorkflowError, WorkflowResult};
pub use layout::AnalysisLayout;
pub use session::{load_canonical_schema, SchemaSource, Session, CONFIG_SCHEMA_ITEM};
pub use settings::{Settings, SETTINGS_ENV};
