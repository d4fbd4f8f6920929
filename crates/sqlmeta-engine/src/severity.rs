//! Severity classification
//!
//! Maps each kind of difference to a change code, then to a severity through
//! the configured overrides. The built-in table lives on
//! [`ChangeCode::default_severity`].

use crate::normalize::NormalizedType;
use crate::widening::is_widening;
use sqlmeta_core::{
    ChangeCode, Column, ConstraintChange, ConstraintKind, DiffSeverity, Finding, SeverityRules,
};

/// Classifies differences and produces findings
#[derive(Debug, Clone, Copy)]
pub struct SeverityClassifier<'a> {
    rules: &'a SeverityRules,
}

impl<'a> SeverityClassifier<'a> {
    pub fn new(rules: &'a SeverityRules) -> Self {
        Self { rules }
    }

    /// Severity for a code after overrides
    pub fn severity(&self, code: ChangeCode) -> DiffSeverity {
        self.rules.get_severity(code)
    }

    /// Build a finding with its configured severity
    pub fn finding(
        &self,
        code: ChangeCode,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Finding {
        Finding::new(code, self.severity(code), subject, message)
    }

    /// `TYPE_WIDENED` when the target holds every source value, else `TYPE_CHANGED`
    pub fn type_change(source: &NormalizedType, target: &NormalizedType) -> ChangeCode {
        if is_widening(source, target) {
            ChangeCode::TypeWidened
        } else {
            ChangeCode::TypeChanged
        }
    }

    /// Code for a nullability flip from `source_nullable` to `target_nullable`
    pub fn nullability_change(source_nullable: bool, target_nullable: bool) -> Option<ChangeCode> {
        match (source_nullable, target_nullable) {
            (true, false) => Some(ChangeCode::NullabilityTightened),
            (false, true) => Some(ChangeCode::NullabilityRelaxed),
            _ => None,
        }
    }

    /// Code for a column present only in the target
    ///
    /// A column that fills itself (explicit default or identity) can be
    /// added to a populated table without further work.
    pub fn missing_column(column: &Column, normalized: &NormalizedType) -> ChangeCode {
        if column.default_value.is_some() || normalized.is_identity() {
            ChangeCode::ColumnAddedWithDefault
        } else {
            ChangeCode::ColumnAdded
        }
    }

    /// Code for a constraint difference
    pub fn constraint_change(change: ConstraintChange, kind: ConstraintKind) -> ChangeCode {
        match (change, kind.is_key()) {
            (ConstraintChange::Added, true) => ChangeCode::KeyConstraintAdded,
            (ConstraintChange::Added, false) => ChangeCode::ConstraintAdded,
            (ConstraintChange::Removed, true) => ChangeCode::KeyConstraintRemoved,
            (ConstraintChange::Removed, false) => ChangeCode::ConstraintRemoved,
            (ConstraintChange::Changed, _) if kind == ConstraintKind::ForeignKey => {
                ChangeCode::ForeignKeyChanged
            }
            (ConstraintChange::Changed, _) => ChangeCode::CheckChanged,
        }
    }
}
