//! # Schema Reconciliation
//!
//! Structural comparison between an observed (inferred) model and the
//! canonical model. Where validation says "this document is wrong",
//! reconciliation says "this document's shape differs from the reference
//! shape", which also catches drift such as a newer canonical schema
//! adding a required field.
//!
//! ## Rules
//!
//! At each object pairing:
//! - canonical required fields absent from observed → `missing_in_observed`
//!   (skipped for leaves that admit the `missing` type);
//! - observed fields unknown to canonical → `missing_in_canonical`
//!   (informational: the user added something the reference does not know);
//! - fields present in both with disjoint leaf types or different node
//!   kinds → `type_disagreements`.
//!
//! A canonical pattern group treats each observed key as one instance,
//! reconciled against the item schema. Recursion stops at leaves and
//! arrays; arrays are compared by item schema only.

use std::fmt;

use serde::Serialize;

use crate::model::{ConfigPath, ObjectNode, PatternGroup, SchemaModel, SchemaNode};

/// A field present on both sides whose types do not overlap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeDisagreement {
    /// Path of the field.
    pub path: ConfigPath,
    /// Canonical type description.
    pub canonical: String,
    /// Observed type description.
    pub observed: String,
}

/// Result of [`reconcile`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationDiff {
    /// Fields the document has but the reference does not recognize.
    pub missing_in_canonical: Vec<ConfigPath>,
    /// Required reference fields the document lacks.
    pub missing_in_observed: Vec<ConfigPath>,
    /// Fields with the wrong type.
    pub type_disagreements: Vec<TypeDisagreement>,
}

impl ReconciliationDiff {
    /// No differences at all.
    pub fn is_empty(&self) -> bool {
        self.missing_in_canonical.is_empty()
            && self.missing_in_observed.is_empty()
            && self.type_disagreements.is_empty()
    }

    /// Nothing missing and nothing wrong-typed. Extra fields are allowed.
    pub fn is_consistent(&self) -> bool {
        self.missing_in_observed.is_empty() && self.type_disagreements.is_empty()
    }
}

impl fmt::Display for ReconciliationDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "configuration shape matches the reference schema");
        }
        if !self.missing_in_observed.is_empty() {
            writeln!(f, "Fields you must add:")?;
            for path in &self.missing_in_observed {
                writeln!(f, "  {}", path.to_breadcrumb())?;
            }
        }
        if !self.missing_in_canonical.is_empty() {
            writeln!(f, "Fields the reference does not expect:")?;
            for path in &self.missing_in_canonical {
                writeln!(f, "  {}", path.to_breadcrumb())?;
            }
        }
        if !self.type_disagreements.is_empty() {
            writeln!(f, "Fields with the wrong type:")?;
            for d in &self.type_disagreements {
                writeln!(
                    f,
                    "  {}: expected {}, found {}",
                    d.path.to_breadcrumb(),
                    d.canonical,
                    d.observed
                )?;
            }
        }
        Ok(())
    }
}

/// Compare `observed` against `canonical`.
pub fn reconcile(observed: &SchemaModel, canonical: &SchemaModel) -> ReconciliationDiff {
    let mut diff = ReconciliationDiff::default();
    let mut path = ConfigPath::root();
    compare(&mut diff, observed.root(), canonical.root(), &mut path);
    tracing::debug!(
        missing_in_canonical = diff.missing_in_canonical.len(),
        missing_in_observed = diff.missing_in_observed.len(),
        type_disagreements = diff.type_disagreements.len(),
        "reconciled configuration schema"
    );
    diff
}

fn compare(diff: &mut ReconciliationDiff, observed: &SchemaNode, canonical: &SchemaNode, path: &mut ConfigPath) {
    if observed.same_shape(canonical) {
        return;
    }
    match (observed, canonical) {
        (SchemaNode::Object(obs), SchemaNode::Object(can)) => compare_object(diff, obs, can, path),
        (SchemaNode::Object(obs), SchemaNode::PatternGroup(group)) => {
            compare_instances(diff, obs, group, path)
        }
        (SchemaNode::Leaf(obs), SchemaNode::Leaf(can)) => {
            if !can.admits(obs) {
                disagree(diff, observed, canonical, path);
            }
        }
        (SchemaNode::Array(obs), SchemaNode::Array(can)) => {
            if !items_compatible(obs, can) {
                disagree(diff, observed, canonical, path);
            }
        }
        // An empty array infers to a placeholder leaf.
        (SchemaNode::Leaf(obs), SchemaNode::Array(_)) if obs.is_placeholder() => {}
        _ => disagree(diff, observed, canonical, path),
    }
}

fn compare_object(diff: &mut ReconciliationDiff, observed: &ObjectNode, canonical: &ObjectNode, path: &mut ConfigPath) {
    for field in canonical.required() {
        let admits_absence = canonical
            .child(field)
            .is_some_and(SchemaNode::admits_absence);
        if observed.child(field).is_none() && !admits_absence {
            diff.missing_in_observed.push(path.join(field.as_str()));
        }
    }

    for (key, child) in observed.children() {
        path.push(key.as_str());
        match canonical.resolve(key) {
            Some(reference) => compare(diff, child, reference, path),
            None => diff.missing_in_canonical.push(path.clone()),
        }
        path.pop();
    }
}

fn compare_instances(diff: &mut ReconciliationDiff, observed: &ObjectNode, group: &PatternGroup, path: &mut ConfigPath) {
    for (name, instance) in observed.children() {
        path.push(name.as_str());
        if group.matches(name) {
            compare(diff, instance, group.item(), path);
        } else {
            diff.missing_in_canonical.push(path.clone());
        }
        path.pop();
    }
}

/// Shallow item comparison for arrays: kinds must agree and leaf types
/// must overlap. Object items are not descended into.
fn items_compatible(observed: &SchemaNode, canonical: &SchemaNode) -> bool {
    match (observed, canonical) {
        (SchemaNode::Leaf(obs), SchemaNode::Leaf(can)) => can.admits(obs),
        (SchemaNode::Leaf(obs), _) => obs.is_placeholder(),
        (SchemaNode::Object(_), SchemaNode::Object(_) | SchemaNode::PatternGroup(_)) => true,
        (SchemaNode::Array(obs), SchemaNode::Array(can)) => items_compatible(obs, can),
        _ => false,
    }
}

fn disagree(diff: &mut ReconciliationDiff, observed: &SchemaNode, canonical: &SchemaNode, path: &ConfigPath) {
    diff.type_disagreements.push(TypeDisagreement {
        path: path.clone(),
        canonical: canonical.describe(),
        observed: observed.describe(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::parse_canonical;
    use crate::infer::infer;
    use serde_json::{json, Value};

    fn canonical() -> SchemaModel {
        parse_canonical(&json!({
            "type": "object",
            "properties": {
                "samples": { "type": "string" },
                "pca": {
                    "type": "object",
                    "properties": {
                        "activate": { "type": "boolean" },
                        "labels": { "type": "array", "items": { "type": "string" } }
                    },
                    "required": ["activate", "labels"]
                },
                "diffexp": {
                    "type": "object",
                    "properties": {
                        "exclude": { "type": "missing" },
                        "models": {
                            "type": "object",
                            "patternProperties": {
                                "^[a-z_]+$": {
                                    "type": "object",
                                    "properties": {
                                        "full": { "type": "string" },
                                        "base_level": { "type": ["number", "string"] }
                                    },
                                    "required": ["full", "base_level"]
                                }
                            }
                        }
                    },
                    "required": ["models", "exclude"]
                },
                "enrichment": {
                    "type": "object",
                    "properties": { "fdr": { "type": "number" } },
                    "required": ["fdr"]
                }
            },
            "required": ["samples", "pca", "diffexp", "enrichment"]
        }))
        .unwrap()
    }

    fn exact_instance() -> Value {
        json!({
            "samples": "config/samples.tsv",
            "pca": { "activate": true, "labels": ["condition"] },
            "diffexp": {
                "models": {
                    "treated": { "full": "~condition", "base_level": "untreated" },
                    "dosage": { "full": "~dose", "base_level": 0 }
                }
            },
            "enrichment": { "fdr": 1 }
        })
    }

    #[test]
    fn exact_instance_reconciles_cleanly() {
        let diff = reconcile(&infer(&exact_instance()), &canonical());
        assert!(diff.missing_in_observed.is_empty(), "{diff}");
        assert!(diff.type_disagreements.is_empty(), "{diff}");
        assert!(diff.missing_in_canonical.is_empty(), "{diff}");
        assert!(diff.is_consistent());
    }

    #[test]
    fn missing_required_section_is_missing_in_observed() {
        let mut doc = exact_instance();
        doc.as_object_mut().unwrap().remove("enrichment");
        let diff = reconcile(&infer(&doc), &canonical());
        assert_eq!(diff.missing_in_observed, vec![ConfigPath::root().join("enrichment")]);
        assert!(!diff.is_consistent());
    }

    #[test]
    fn extra_field_is_missing_in_canonical() {
        let mut doc = exact_instance();
        doc["scatter"] = json!({ "activate": false });
        let diff = reconcile(&infer(&doc), &canonical());
        assert_eq!(diff.missing_in_canonical, vec![ConfigPath::root().join("scatter")]);
        assert!(diff.is_consistent(), "extra fields are informational");
    }

    #[test]
    fn leaf_type_disagreement() {
        let mut doc = exact_instance();
        doc["samples"] = json!(7);
        let diff = reconcile(&infer(&doc), &canonical());
        assert_eq!(
            diff.type_disagreements,
            vec![TypeDisagreement {
                path: ConfigPath::root().join("samples"),
                canonical: "string".to_string(),
                observed: "integer".to_string(),
            }]
        );
    }

    #[test]
    fn kind_disagreement_stops_recursion() {
        let mut doc = exact_instance();
        doc["pca"] = json!("yes");
        let diff = reconcile(&infer(&doc), &canonical());
        assert_eq!(diff.type_disagreements.len(), 1);
        assert_eq!(diff.type_disagreements[0].canonical, "object");
        assert_eq!(diff.type_disagreements[0].observed, "string");
        assert!(diff.missing_in_observed.is_empty());
    }

    #[test]
    fn pattern_instances_reconcile_against_item_schema() {
        let mut doc = exact_instance();
        doc["diffexp"]["models"]["unfinished"] = json!({ "full": "~x" });
        let diff = reconcile(&infer(&doc), &canonical());
        let expected: ConfigPath = ["diffexp", "models", "unfinished", "base_level"]
            .into_iter()
            .collect();
        assert_eq!(diff.missing_in_observed, vec![expected]);
    }

    #[test]
    fn non_matching_instance_is_missing_in_canonical() {
        let mut doc = exact_instance();
        doc["diffexp"]["models"]["Model-1"] = json!({ "full": "~x", "base_level": 1 });
        let diff = reconcile(&infer(&doc), &canonical());
        let expected: ConfigPath = ["diffexp", "models", "Model-1"].into_iter().collect();
        assert_eq!(diff.missing_in_canonical, vec![expected]);
    }

    #[test]
    fn array_item_disagreement_is_reported_at_array_path() {
        let mut doc = exact_instance();
        doc["pca"]["labels"] = json!([1, 2]);
        let diff = reconcile(&infer(&doc), &canonical());
        assert_eq!(diff.type_disagreements.len(), 1);
        let d = &diff.type_disagreements[0];
        assert_eq!(d.path.to_string(), "pca/labels");
        assert_eq!(d.canonical, "array<string>");
        assert_eq!(d.observed, "array<integer>");
    }

    #[test]
    fn empty_array_is_a_placeholder() {
        let mut doc = exact_instance();
        doc["pca"]["labels"] = json!([]);
        let diff = reconcile(&infer(&doc), &canonical());
        assert!(diff.is_empty(), "{diff}");
    }

    #[test]
    fn integer_observed_for_number_is_compatible() {
        let diff = reconcile(&infer(&exact_instance()), &canonical());
        assert!(diff.type_disagreements.is_empty());
    }

    #[test]
    fn number_observed_for_integer_disagrees() {
        let canonical = parse_canonical(&json!({
            "type": "object",
            "properties": { "release": { "type": "integer" } }
        }))
        .unwrap();
        let diff = reconcile(&infer(&json!({ "release": 110.5 })), &canonical);
        assert_eq!(diff.type_disagreements.len(), 1);
    }

    #[test]
    fn summary_panel_sections() {
        let mut doc = exact_instance();
        doc.as_object_mut().unwrap().remove("enrichment");
        doc["scatter"] = json!({});
        doc["samples"] = json!(false);
        let text = reconcile(&infer(&doc), &canonical()).to_string();
        assert!(text.contains("Fields you must add:\n  enrichment"));
        assert!(text.contains("Fields the reference does not expect:\n  scatter"));
        assert!(text.contains("samples: expected string, found boolean"));
    }
}
