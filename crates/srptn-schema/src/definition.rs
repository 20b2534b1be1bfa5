//! # Canonical Schema Definitions
//!
//! Resolves a schema definition (nested mappings as shipped with the
//! workflow package) into a [`SchemaModel`] once, at load time.
//!
//! ## Recognized keywords
//!
//! `type` (a name or a list of names, including the sentinel `missing`),
//! `properties`, `required`, `items`, `patternProperties`. Annotation
//! keywords such as `$schema`, `description`, `format` or `default` are
//! ignored. Composition and conditional keywords are rejected with
//! [`SchemaDefinitionError::UnsupportedKeyword`].
//!
//! ## Node resolution
//!
//! - Scalar type names (or unions of them) resolve to a leaf.
//! - `object` with only `patternProperties` holding a single pattern, and no
//!   `required`, resolves to a pattern group.
//! - Any other `object` resolves to an object node; its pattern groups (if
//!   any) govern keys that are not declared fields.
//! - `array` requires `items`.
//! - A node without `type` is typed by its keywords (`properties` /
//!   `patternProperties` → object, `items` → array).

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};
use thiserror::Error;

use crate::model::{KeyPattern, ObjectNode, PatternGroup, SchemaModel, SchemaNode, TypeSet, ValueType};

/// Keywords outside the supported subset.
const UNSUPPORTED_KEYWORDS: &[&str] = &[
    "$ref",
    "$dynamicRef",
    "allOf",
    "anyOf",
    "oneOf",
    "not",
    "if",
    "then",
    "else",
    "dependentSchemas",
    "dependencies",
];

/// A canonical schema definition could not be resolved.
///
/// Fatal to session start: the user sees "cannot load configuration
/// schema" with this error as the cause. `path` is a pointer into the
/// definition (`#/properties/diffexp/properties/models`).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaDefinitionError {
    /// The definition uses a keyword outside the supported subset.
    #[error("unsupported schema keyword '{keyword}' at {path}")]
    UnsupportedKeyword {
        /// Pointer to the offending node.
        path: String,
        /// The keyword, e.g. `$ref`.
        keyword: String,
    },

    /// `type` names something other than a supported type.
    #[error("unknown type '{name}' at {path}")]
    UnknownType {
        /// Pointer to the offending node.
        path: String,
        /// The unrecognized type name.
        name: String,
    },

    /// `required` lists a field absent from `properties`.
    #[error("required field '{field}' is not declared in properties at {path}")]
    RequiredNotDeclared {
        /// Pointer to the object node.
        path: String,
        /// The undeclared field name.
        field: String,
    },

    /// A `patternProperties` key is not a valid regular expression.
    #[error("invalid key pattern '{pattern}' at {path}: {reason}")]
    InvalidPattern {
        /// Pointer to the object node.
        path: String,
        /// The pattern source.
        pattern: String,
        /// Compiler message.
        reason: String,
    },

    /// An `array` node has no `items`.
    #[error("array node at {path} declares no items")]
    MissingItems {
        /// Pointer to the array node.
        path: String,
    },

    /// A node has no `type` and no keyword implying one.
    #[error("node at {path} declares no type")]
    UntypedNode {
        /// Pointer to the node.
        path: String,
    },

    /// A recognized keyword has the wrong shape (e.g. `required` not a list).
    #[error("malformed '{keyword}' at {path}: {reason}")]
    MalformedKeyword {
        /// Pointer to the node.
        path: String,
        /// The keyword.
        keyword: String,
        /// What was wrong.
        reason: String,
    },

    /// A type union mixes `object`/`array` with other types.
    #[error("type union at {path} mixes container types with other types")]
    CompositeUnion {
        /// Pointer to the node.
        path: String,
    },

    /// A schema node is not a mapping.
    #[error("schema node at {path} is not a mapping")]
    NotAMapping {
        /// Pointer to the node.
        path: String,
    },
}

/// What a node's `type` keyword declares.
enum DeclaredType {
    Object,
    Array,
    Leaf(TypeSet),
}

/// Resolve a canonical schema definition into a [`SchemaModel`].
///
/// # Errors
///
/// Returns [`SchemaDefinitionError`] for unsupported constructs, unknown
/// types, malformed keywords, or a `required` entry naming an undeclared
/// field.
pub fn parse_canonical(definition: &Value) -> Result<SchemaModel, SchemaDefinitionError> {
    let root = parse_node(definition, "#")?;
    Ok(SchemaModel::new(root))
}

impl TryFrom<&Value> for SchemaModel {
    type Error = SchemaDefinitionError;

    fn try_from(definition: &Value) -> Result<Self, Self::Error> {
        parse_canonical(definition)
    }
}

fn parse_node(definition: &Value, path: &str) -> Result<SchemaNode, SchemaDefinitionError> {
    let map = definition
        .as_object()
        .ok_or_else(|| SchemaDefinitionError::NotAMapping {
            path: path.to_string(),
        })?;

    if let Some(keyword) = UNSUPPORTED_KEYWORDS.iter().find(|k| map.contains_key(**k)) {
        return Err(SchemaDefinitionError::UnsupportedKeyword {
            path: path.to_string(),
            keyword: (*keyword).to_string(),
        });
    }

    let declared = match map.get("type") {
        Some(ty) => parse_type(ty, path)?,
        None if map.contains_key("properties") || map.contains_key("patternProperties") => {
            DeclaredType::Object
        }
        None if map.contains_key("items") => DeclaredType::Array,
        None => {
            return Err(SchemaDefinitionError::UntypedNode {
                path: path.to_string(),
            })
        }
    };

    match declared {
        DeclaredType::Leaf(types) => Ok(SchemaNode::Leaf(types)),
        DeclaredType::Array => {
            let items = map
                .get("items")
                .ok_or_else(|| SchemaDefinitionError::MissingItems {
                    path: path.to_string(),
                })?;
            let item = parse_node(items, &format!("{path}/items"))?;
            Ok(SchemaNode::Array(Box::new(item)))
        }
        DeclaredType::Object => parse_object(map, path),
    }
}

fn parse_type(ty: &Value, path: &str) -> Result<DeclaredType, SchemaDefinitionError> {
    let names: Vec<&str> = match ty {
        Value::String(name) => vec![name.as_str()],
        Value::Array(names) => names
            .iter()
            .map(|n| {
                n.as_str().ok_or_else(|| SchemaDefinitionError::MalformedKeyword {
                    path: path.to_string(),
                    keyword: "type".to_string(),
                    reason: format!("expected a type name, found {n}"),
                })
            })
            .collect::<Result<_, _>>()?,
        other => {
            return Err(SchemaDefinitionError::MalformedKeyword {
                path: path.to_string(),
                keyword: "type".to_string(),
                reason: format!("expected a name or a list of names, found {other}"),
            })
        }
    };

    let has_container = names.iter().any(|n| matches!(*n, "object" | "array"));
    if has_container {
        if names.len() != 1 {
            return Err(SchemaDefinitionError::CompositeUnion {
                path: path.to_string(),
            });
        }
        return Ok(if names[0] == "object" {
            DeclaredType::Object
        } else {
            DeclaredType::Array
        });
    }

    let mut types = Vec::with_capacity(names.len());
    for name in names {
        let ty = ValueType::from_name(name).ok_or_else(|| SchemaDefinitionError::UnknownType {
            path: path.to_string(),
            name: name.to_string(),
        })?;
        types.push(ty);
    }

    TypeSet::new(types)
        .map(DeclaredType::Leaf)
        .ok_or_else(|| SchemaDefinitionError::MalformedKeyword {
            path: path.to_string(),
            keyword: "type".to_string(),
            reason: "empty type list".to_string(),
        })
}

fn parse_object(map: &Map<String, Value>, path: &str) -> Result<SchemaNode, SchemaDefinitionError> {
    let mut children = BTreeMap::new();
    if let Some(properties) = map.get("properties") {
        let properties = expect_mapping(properties, path, "properties")?;
        for (field, child) in properties {
            let node = parse_node(child, &format!("{path}/properties/{field}"))?;
            children.insert(field.clone(), node);
        }
    }

    let mut required = BTreeSet::new();
    if let Some(fields) = map.get("required") {
        let fields = fields
            .as_array()
            .ok_or_else(|| SchemaDefinitionError::MalformedKeyword {
                path: path.to_string(),
                keyword: "required".to_string(),
                reason: "expected a list of field names".to_string(),
            })?;
        for field in fields {
            let name = field
                .as_str()
                .ok_or_else(|| SchemaDefinitionError::MalformedKeyword {
                    path: path.to_string(),
                    keyword: "required".to_string(),
                    reason: format!("expected a field name, found {field}"),
                })?;
            required.insert(name.to_string());
        }
    }

    let mut patterns = Vec::new();
    if let Some(pattern_properties) = map.get("patternProperties") {
        let pattern_properties = expect_mapping(pattern_properties, path, "patternProperties")?;
        for (source, child) in pattern_properties {
            let pattern = KeyPattern::new(source).map_err(|e| SchemaDefinitionError::InvalidPattern {
                path: path.to_string(),
                pattern: source.clone(),
                reason: e.to_string(),
            })?;
            let item = parse_node(child, &format!("{path}/patternProperties/{source}"))?;
            patterns.push(PatternGroup::new(pattern, item));
        }
    }

    if children.is_empty() && required.is_empty() && patterns.len() == 1 {
        if let Some(group) = patterns.pop() {
            return Ok(SchemaNode::PatternGroup(group));
        }
    }

    ObjectNode::with_required(children, required, patterns)
        .map(SchemaNode::Object)
        .map_err(|field| SchemaDefinitionError::RequiredNotDeclared {
            path: path.to_string(),
            field,
        })
}

fn expect_mapping<'a>(
    value: &'a Value,
    path: &str,
    keyword: &str,
) -> Result<&'a Map<String, Value>, SchemaDefinitionError> {
    value
        .as_object()
        .ok_or_else(|| SchemaDefinitionError::MalformedKeyword {
            path: path.to_string(),
            keyword: keyword.to_string(),
            reason: "expected a mapping".to_string(),
        })
}
