//! # Schema Inference
//!
//! Bottom-up type deduction from a single configuration document, with no
//! access to a canonical schema. The inferred model is strictly weaker
//! than a canonical one: objects carry no required fields and repeated
//! named children are plain object fields, never pattern groups.

use serde_json::Value;

use crate::model::{ObjectNode, SchemaModel, SchemaNode, ValueType};

/// Infer the shape of `document`.
pub fn infer(document: &Value) -> SchemaModel {
    let model = SchemaModel::new(infer_node(document));
    tracing::debug!(root = %model.root().describe(), "inferred configuration schema");
    model
}

/// Infer the node for one value.
///
/// - scalars become a singleton leaf of their runtime type (null → `missing`);
/// - objects become open objects with one child per present key;
/// - arrays take the item schema of their first non-null element; an empty
///   or all-null array becomes a `missing` leaf placeholder.
pub fn infer_node(value: &Value) -> SchemaNode {
    match value {
        Value::Object(map) => SchemaNode::Object(ObjectNode::open(
            map.iter()
                .map(|(key, child)| (key.clone(), infer_node(child)))
                .collect(),
        )),
        Value::Array(elements) => match elements.iter().find(|e| !e.is_null()) {
            Some(first) => SchemaNode::Array(Box::new(infer_node(first))),
            None => SchemaNode::leaf(ValueType::Missing),
        },
        Value::Null => SchemaNode::leaf(ValueType::Missing),
        Value::Bool(_) => SchemaNode::leaf(ValueType::Boolean),
        Value::String(_) => SchemaNode::leaf(ValueType::String),
        Value::Number(n) if n.is_i64() || n.is_u64() => SchemaNode::leaf(ValueType::Integer),
        Value::Number(_) => SchemaNode::leaf(ValueType::Number),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeKind, PathSegment};
    use serde_json::json;

    fn describe_at(model: &SchemaModel, path: &[&str]) -> String {
        let segments: Vec<PathSegment> = path.iter().map(|s| PathSegment::from(*s)).collect();
        model
            .node(&segments)
            .unwrap_or_else(|| panic!("no node at {path:?}"))
            .describe()
    }

    #[test]
    fn infers_scalar_types() {
        let model = infer(&json!({
            "text": "",
            "flag": false,
            "float": 1.0,
            "int": 1,
            "unset": null
        }));
        assert_eq!(describe_at(&model, &["text"]), "string");
        assert_eq!(describe_at(&model, &["flag"]), "boolean");
        assert_eq!(describe_at(&model, &["float"]), "number");
        assert_eq!(describe_at(&model, &["int"]), "integer");
        assert_eq!(describe_at(&model, &["unset"]), "missing");
    }

    #[test]
    fn infers_array_item_from_first_non_null_element() {
        let model = infer(&json!({
            "labels": ["condition"],
            "thresholds": [null, 1.5],
            "empty": [],
            "nothing": [null]
        }));
        assert_eq!(describe_at(&model, &["labels"]), "array<string>");
        assert_eq!(describe_at(&model, &["thresholds"]), "array<number>");
        assert_eq!(describe_at(&model, &["empty"]), "missing");
        assert_eq!(describe_at(&model, &["nothing"]), "missing");
    }

    #[test]
    fn inferred_objects_have_no_required_fields() {
        let model = infer(&json!({
            "diffexp": {
                "models": {
                    "a": { "full": "~x", "reduced": "~1" },
                    "b": { "full": "~y", "reduced": "~1" }
                }
            }
        }));
        match model.root() {
            SchemaNode::Object(obj) => assert!(obj.required().is_empty()),
            other => panic!("expected object, got {other:?}"),
        }
        let models = model
            .node(&[PathSegment::from("diffexp"), PathSegment::from("models")])
            .unwrap();
        assert_eq!(models.kind(), NodeKind::Object, "inference never produces pattern groups");
        match models {
            SchemaNode::Object(obj) => {
                assert_eq!(obj.children().keys().collect::<Vec<_>>(), ["a", "b"]);
                assert!(obj.required().is_empty());
            }
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn infers_array_of_objects() {
        let model = infer(&json!({ "units": [{ "sample": "A", "fq1": "a.fq" }] }));
        let item = model
            .node(&[PathSegment::from("units"), PathSegment::from(0usize)])
            .unwrap();
        assert_eq!(item.kind(), NodeKind::Object);
    }

    #[test]
    fn inferred_definition_form() {
        let model = infer(&json!({ "pca": { "activate": true, "labels": ["condition"] } }));
        assert_eq!(
            model.to_definition(),
            json!({
                "type": "object",
                "properties": {
                    "pca": {
                        "type": "object",
                        "properties": {
                            "activate": { "type": "boolean" },
                            "labels": { "type": "array", "items": { "type": "string" } }
                        }
                    }
                }
            })
        );
    }
}
