//! # Schema Extension
//!
//! Widen a canonical model so it also covers the fields a document carries
//! but the canonical schema does not know. The form layer uses the widened
//! model to render those fields instead of silently dropping them.
//!
//! The canonical model is never mutated; [`extend`] works on a copy.

use serde_json::{Map, Value};

use crate::infer::infer_node;
use crate::model::{ConfigPath, ObjectNode, SchemaModel, SchemaNode};

/// A widened model and the document paths that caused each addition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaExtension {
    /// Canonical model plus inferred nodes for unknown fields.
    pub schema: SchemaModel,
    /// Document path of every added field, in walk order. A field added to
    /// a pattern group's item schema is reported once, at the first
    /// instance that carried it.
    pub added: Vec<ConfigPath>,
}

impl SchemaExtension {
    /// Whether the document fit the canonical schema without additions.
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty()
    }
}

/// Extend `canonical` with every field of `document` it does not declare.
///
/// Unknown fields get the node [`infer_node`] produces for their value.
/// Pattern-group instances are walked against the shared item schema, so a
/// field added through one instance becomes known for all of them. Values
/// whose kind disagrees with the schema are left to the validator.
pub fn extend(canonical: &SchemaModel, document: &Value) -> SchemaExtension {
    let mut root = canonical.clone().into_root();
    let mut added = Vec::new();
    let mut path = ConfigPath::root();
    walk(&mut root, document, &mut path, &mut added);
    if !added.is_empty() {
        tracing::debug!(added = added.len(), "extended configuration schema");
    }
    SchemaExtension {
        schema: SchemaModel::new(root),
        added,
    }
}

fn walk(node: &mut SchemaNode, value: &Value, path: &mut ConfigPath, added: &mut Vec<ConfigPath>) {
    match value {
        Value::Object(map) => {
            let rejects_key = matches!(
                node,
                SchemaNode::PatternGroup(group) if map.keys().any(|key| !group.matches(key))
            );
            if rejects_key {
                widen_group(node);
            }
            match node {
                SchemaNode::Object(obj) => walk_object(obj, map, path, added),
                SchemaNode::PatternGroup(group) => {
                    for (key, instance) in map {
                        path.push(key.as_str());
                        walk(group.item_mut(), instance, path, added);
                        path.pop();
                    }
                }
                _ => {}
            }
        }
        Value::Array(elements) => {
            if let SchemaNode::Array(item) = node {
                for (i, element) in elements.iter().enumerate() {
                    path.push(i);
                    walk(item, element, path, added);
                    path.pop();
                }
            }
        }
        _ => {}
    }
}

fn walk_object(obj: &mut ObjectNode, map: &Map<String, Value>, path: &mut ConfigPath, added: &mut Vec<ConfigPath>) {
    for (key, child) in map {
        path.push(key.as_str());
        match obj.resolve_mut(key) {
            Some(node) => walk(node, child, path, added),
            None => {
                tracing::warn!(field = %path, "field not in canonical schema");
                obj.insert_child(key.clone(), infer_node(child));
                added.push(path.clone());
            }
        }
        path.pop();
    }
}

/// Turn a bare pattern group into an object holding the group, so keys the
/// pattern rejects can be declared next to it.
fn widen_group(node: &mut SchemaNode) {
    let placeholder = SchemaNode::Object(ObjectNode::default());
    if let SchemaNode::PatternGroup(group) = std::mem::replace(node, placeholder) {
        *node = SchemaNode::Object(ObjectNode::with_patterns(vec![group]));
    }
}
