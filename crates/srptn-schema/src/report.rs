//! # Configuration Report
//!
//! One call that runs the full check of a document against the canonical
//! schema: validation of the document itself, then reconciliation of its
//! inferred shape. The launcher gates a run on [`ConfigReport::is_runnable`].

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::infer::infer;
use crate::model::SchemaModel;
use crate::reconcile::{reconcile, ReconciliationDiff};
use crate::validate::{render_violations, validate, Violation};

/// Violations plus reconciliation diff for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigReport {
    pub violations: Vec<Violation>,
    pub diff: ReconciliationDiff,
}

impl ConfigReport {
    /// True when the document has no violations and lacks no required
    /// field. Extra fields do not block a run.
    pub fn is_runnable(&self) -> bool {
        self.violations.is_empty() && self.diff.missing_in_observed.is_empty()
    }
}

impl fmt::Display for ConfigReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.violations.is_empty() {
            writeln!(f, "document is valid")?;
        } else {
            writeln!(f, "{} violation(s):", self.violations.len())?;
            writeln!(f, "{}", render_violations(&self.violations))?;
        }
        write!(f, "{}", self.diff)
    }
}

/// Validate `document` against `canonical` and reconcile its inferred shape.
pub fn check(document: &Value, canonical: &SchemaModel) -> ConfigReport {
    let violations = validate(document, canonical);
    let diff = reconcile(&infer(document), canonical);
    ConfigReport { violations, diff }
}
