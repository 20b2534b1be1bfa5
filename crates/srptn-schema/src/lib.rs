//! # srptn-schema — Configuration Schema Engine
//!
//! Decides whether a user-edited analysis configuration is fit to drive an
//! RNA-seq workflow run, and explains precisely where it is not.
//!
//! ## Data Flow
//!
//! ```text
//! canonical definition ──parse_canonical──▶ SchemaModel (shared, read-only)
//!                                               │
//! document ──validate──────────────────────────▶ Vec<Violation>
//! document ──infer──▶ SchemaModel ──reconcile──▶ ReconciliationDiff
//! ```
//!
//! [`check`] runs both halves and returns a [`ConfigReport`]. [`extend`]
//! widens a canonical model with the fields a document carries beyond it.
//!
//! ## Accepted Definition Subset
//!
//! `type`, `properties`, `required`, `items` and `patternProperties`. The
//! `missing` type is the "not set" sentinel (`null` is read as an alias).
//! Composition and reference keywords are rejected when the definition is
//! parsed, never silently ignored.
//!
//! ## Crate Policy
//!
//! - No I/O. Loading documents and locating schemas belongs to `srptn-workflow`.
//! - Validation never fails: every problem in a document is a [`Violation`].
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod definition;
pub mod extend;
pub mod infer;
pub mod model;
pub mod reconcile;
pub mod report;
pub mod validate;

pub use definition::{parse_canonical, SchemaDefinitionError};
pub use extend::{extend, SchemaExtension};
pub use infer::{infer, infer_node};
pub use model::{
    describe_value, ConfigPath, KeyPattern, NodeKind, ObjectNode, PathSegment, PatternGroup,
    SchemaModel, SchemaNode, TypeSet, ValueType,
};
pub use reconcile::{reconcile, ReconciliationDiff, TypeDisagreement};
pub use report::{check, ConfigReport};
pub use validate::{render_violations, validate, Violation, ViolationKind, ABSENT};
