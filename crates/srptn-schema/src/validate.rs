//! # Document Validation
//!
//! Walks a configuration document against a [`SchemaModel`] and collects
//! every violation in one pass, depth-first in document order.
//!
//! ## Rules
//!
//! - **Object:** each required field absent from the document is reported
//!   as [`ViolationKind::MissingRequired`] (unless its leaf admits the
//!   `missing` type). Present keys are resolved against declared fields,
//!   then against the object's pattern groups. Keys matching neither are
//!   ignored: configuration documents are open.
//! - **Leaf:** the value's runtime type must be accepted by one of the
//!   allowed types, else [`ViolationKind::TypeMismatch`].
//! - **Array:** every element is validated against the item schema; a
//!   non-array value is [`ViolationKind::UnexpectedType`].
//! - **Pattern group:** every key must match the pattern, else
//!   [`ViolationKind::UnknownPatternKey`]. Instances are validated
//!   independently of one another.
//!
//! `validate` never fails. A document value that cannot satisfy the schema
//! is reported as a violation.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::model::{describe_value, ConfigPath, ObjectNode, PatternGroup, SchemaModel, SchemaNode};

/// Observed description for a field that is not in the document.
pub const ABSENT: &str = "absent";

/// Category of a validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// A required field is absent.
    MissingRequired,
    /// A leaf value has a type the schema does not allow.
    TypeMismatch,
    /// A container was expected (object or array) but something else was found.
    UnexpectedType,
    /// A key inside a pattern group does not match its pattern.
    UnknownPatternKey,
}

impl ViolationKind {
    /// Stable snake_case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingRequired => "missing_required",
            Self::TypeMismatch => "type_mismatch",
            Self::UnexpectedType => "unexpected_type",
            Self::UnknownPatternKey => "unknown_pattern_key",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single path-scoped validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Path from the document root to the violating field.
    pub path: ConfigPath,
    /// Failure category.
    pub kind: ViolationKind,
    /// What the schema expects at this path (a type description, or the
    /// key pattern for [`ViolationKind::UnknownPatternKey`]).
    pub expected: String,
    /// What the document holds (a type description, [`ABSENT`], or the
    /// offending key).
    pub observed: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_root() {
            "(root)".to_string()
        } else {
            self.path.to_string()
        };
        write!(
            f,
            "  {path}: {}: expected {}, observed {}",
            self.kind, self.expected, self.observed
        )
    }
}

/// Validate `document` against `schema`.
///
/// Deterministic: the same inputs always produce the same sequence. At
/// each object, missing required fields are reported first (in field-name
/// order), followed by the violations under each present key in document
/// order.
pub fn validate(document: &Value, schema: &SchemaModel) -> Vec<Violation> {
    let mut walker = Walker::default();
    let mut path = ConfigPath::root();
    walker.walk(document, schema.root(), &mut path);
    tracing::debug!(
        violations = walker.violations.len(),
        "validated configuration document"
    );
    walker.violations
}

/// Render a violation list one per line, as shown to the user.
pub fn render_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Default)]
struct Walker {
    violations: Vec<Violation>,
}

impl Walker {
    fn report(&mut self, path: &ConfigPath, kind: ViolationKind, expected: String, observed: String) {
        self.violations.push(Violation {
            path: path.clone(),
            kind,
            expected,
            observed,
        });
    }

    fn walk(&mut self, value: &Value, node: &SchemaNode, path: &mut ConfigPath) {
        match node {
            SchemaNode::Leaf(types) => {
                if !types.accepts(value) {
                    self.report(
                        path,
                        ViolationKind::TypeMismatch,
                        types.to_string(),
                        describe_value(value).to_string(),
                    );
                }
            }
            SchemaNode::Object(obj) => match value.as_object() {
                Some(map) => self.walk_object(map, obj, path),
                None => self.unexpected(value, node, path),
            },
            SchemaNode::Array(item) => match value.as_array() {
                Some(elements) => {
                    for (i, element) in elements.iter().enumerate() {
                        path.push(i);
                        self.walk(element, item, path);
                        path.pop();
                    }
                }
                None => self.unexpected(value, node, path),
            },
            SchemaNode::PatternGroup(group) => match value.as_object() {
                Some(map) => self.walk_instances(map, group, path),
                None => self.unexpected(value, node, path),
            },
        }
    }

    fn unexpected(&mut self, value: &Value, node: &SchemaNode, path: &ConfigPath) {
        self.report(
            path,
            ViolationKind::UnexpectedType,
            node.describe(),
            describe_value(value).to_string(),
        );
    }

    fn walk_object(&mut self, map: &Map<String, Value>, obj: &ObjectNode, path: &mut ConfigPath) {
        for field in obj.required() {
            if map.contains_key(field) {
                continue;
            }
            match obj.child(field) {
                Some(child) if child.admits_absence() => {}
                Some(child) => {
                    let at = path.join(field.as_str());
                    self.report(&at, ViolationKind::MissingRequired, child.describe(), ABSENT.to_string());
                }
                // Unreachable for a well-formed ObjectNode; nothing to check against.
                None => {}
            }
        }

        for (key, value) in map {
            if let Some(child) = obj.resolve(key) {
                path.push(key.as_str());
                self.walk(value, child, path);
                path.pop();
            }
        }
    }

    fn walk_instances(&mut self, map: &Map<String, Value>, group: &PatternGroup, path: &mut ConfigPath) {
        for (name, instance) in map {
            path.push(name.as_str());
            if group.matches(name) {
                self.walk(instance, group.item(), path);
            } else {
                self.report(
                    path,
                    ViolationKind::UnknownPatternKey,
                    group.pattern().as_str().to_string(),
                    name.clone(),
                );
            }
            path.pop();
        }
    }
}
