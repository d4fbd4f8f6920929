//! Constraint comparison by structural identity
//!
//! Constraints are keyed by kind plus sorted column list. Declared names are
//! ignored, so a renamed constraint produces no diff at all.

use crate::expr::normalize_expression;
use crate::severity::SeverityClassifier;
use sqlmeta_core::{
    Constraint, ConstraintChange, ConstraintDiff, ConstraintIdentity, ConstraintKind, Finding,
    ForeignKeyReference,
};
use std::collections::{HashMap, HashSet};

/// Result of comparing two constraint lists
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintComparison {
    pub added: Vec<ConstraintDiff>,
    pub removed: Vec<ConstraintDiff>,
    pub changed: Vec<ConstraintDiff>,
    pub findings: Vec<Finding>,
}

impl ConstraintComparison {
    /// All diffs in report order: removed, added, changed
    pub fn into_diffs(self) -> (Vec<ConstraintDiff>, Vec<Finding>) {
        let mut diffs = self.removed;
        diffs.extend(self.added);
        diffs.extend(self.changed);
        (diffs, self.findings)
    }
}

/// Compare constraint lists
///
/// Within one identity, equivalent constraints pair up first; the rest pair
/// in declaration order as changes, and leftovers are additions or removals.
/// Identities are visited in target order, then source-only ones in source
/// order.
pub fn compare_constraints(
    source: &[Constraint],
    target: &[Constraint],
    classifier: &SeverityClassifier<'_>,
) -> ConstraintComparison {
    let source_groups = group_by_identity(source);
    let target_groups = group_by_identity(target);

    let mut seen = HashSet::new();
    let order: Vec<ConstraintIdentity> = target
        .iter()
        .chain(source)
        .map(Constraint::identity)
        .filter(|identity| seen.insert(identity.clone()))
        .collect();

    let mut result = ConstraintComparison::default();
    let empty = Vec::new();

    for identity in &order {
        let source_side = source_groups.get(identity).unwrap_or(&empty);
        let target_side = target_groups.get(identity).unwrap_or(&empty);

        let mut unpaired_source: Vec<&Constraint> = source_side.clone();
        let mut unpaired_target: Vec<&Constraint> = Vec::new();
        for &candidate in target_side {
            match unpaired_source.iter().position(|s| equivalent(s, candidate)) {
                Some(pos) => {
                    unpaired_source.remove(pos);
                }
                None => unpaired_target.push(candidate),
            }
        }

        let paired = unpaired_source.len().min(unpaired_target.len());
        for (s, t) in unpaired_source.iter().zip(&unpaired_target) {
            let diff = build_diff(
                ConstraintChange::Changed,
                identity,
                Some(*s),
                Some(*t),
                classifier,
            );
            result.findings.push(finding(&diff, classifier));
            result.changed.push(diff);
        }
        for t in &unpaired_target[paired..] {
            let diff = build_diff(ConstraintChange::Added, identity, None, Some(*t), classifier);
            result.findings.push(finding(&diff, classifier));
            result.added.push(diff);
        }
        for s in &unpaired_source[paired..] {
            let diff = build_diff(ConstraintChange::Removed, identity, Some(*s), None, classifier);
            result.findings.push(finding(&diff, classifier));
            result.removed.push(diff);
        }
    }

    result
}

fn group_by_identity(constraints: &[Constraint]) -> HashMap<ConstraintIdentity, Vec<&Constraint>> {
    let mut groups: HashMap<ConstraintIdentity, Vec<&Constraint>> = HashMap::new();
    for constraint in constraints {
        groups.entry(constraint.identity()).or_default().push(constraint);
    }
    groups
}

/// Same target for foreign keys, same expression for checks
fn equivalent(a: &Constraint, b: &Constraint) -> bool {
    match a.kind {
        ConstraintKind::ForeignKey => references_match(a, b),
        ConstraintKind::Check => {
            let a_expr = a.check_expression.as_deref().map(normalize_expression);
            let b_expr = b.check_expression.as_deref().map(normalize_expression);
            a_expr == b_expr
        }
        _ => true,
    }
}

/// Foreign keys match when they point at the same table and pair each local
/// column with the same referenced column
///
/// A reference without a schema matches any schema qualification of the
/// same table name.
fn references_match(a: &Constraint, b: &Constraint) -> bool {
    let (Some(ra), Some(rb)) = (&a.references, &b.references) else {
        return a.references == b.references;
    };

    let same_table = ra.table.name == rb.table.name
        && match (&ra.table.schema, &rb.table.schema) {
            (Some(sa), Some(sb)) => sa == sb,
            _ => true,
        };

    same_table && column_pairs(a, ra) == column_pairs(b, rb)
}

fn column_pairs<'a>(
    constraint: &'a Constraint,
    reference: &'a ForeignKeyReference,
) -> Vec<(&'a str, Option<&'a str>)> {
    let mut pairs: Vec<(&str, Option<&str>)> = constraint
        .columns
        .iter()
        .enumerate()
        .map(|(i, local)| (local.as_str(), reference.columns.get(i).map(String::as_str)))
        .collect();
    pairs.sort_unstable();
    pairs
}

fn build_diff(
    change: ConstraintChange,
    identity: &ConstraintIdentity,
    source: Option<&Constraint>,
    target: Option<&Constraint>,
    classifier: &SeverityClassifier<'_>,
) -> ConstraintDiff {
    let code = SeverityClassifier::constraint_change(change, identity.kind);
    ConstraintDiff {
        change,
        kind: identity.kind,
        columns: identity.columns.clone(),
        source_name: source.and_then(|c| c.name.clone()),
        target_name: target.and_then(|c| c.name.clone()),
        source_reference: source.and_then(|c| c.references.clone()),
        target_reference: target.and_then(|c| c.references.clone()),
        source_expression: source.and_then(|c| c.check_expression.clone()),
        target_expression: target.and_then(|c| c.check_expression.clone()),
        severity: classifier.severity(code),
    }
}

fn finding(diff: &ConstraintDiff, classifier: &SeverityClassifier<'_>) -> Finding {
    let code = SeverityClassifier::constraint_change(diff.change, diff.kind);
    let subject = diff.describe();
    let name = diff
        .target_name
        .as_deref()
        .or(diff.source_name.as_deref())
        .map(|n| format!(" '{}'", n))
        .unwrap_or_default();

    let message = match diff.change {
        ConstraintChange::Added => format!("Constraint{} {} was added", name, subject),
        ConstraintChange::Removed => format!("Constraint{} {} was removed", name, subject),
        ConstraintChange::Changed => match (&diff.source_reference, &diff.target_reference) {
            (Some(s), Some(t)) => format!(
                "Foreign key{} {} now references {} (was {})",
                name, subject, t, s
            ),
            _ => format!(
                "Check constraint{} {} changed: was {}, now {}",
                name,
                subject,
                diff.source_expression.as_deref().unwrap_or("none"),
                diff.target_expression.as_deref().unwrap_or("none")
            ),
        },
    };

    classifier.finding(code, subject, message)
}
