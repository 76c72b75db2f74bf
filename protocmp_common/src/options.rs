use crate::{
    is_ignored, ComparisonScope, FieldPath, FloatComparison, ProtoCmpError,
    RepeatedFieldComparison,
};
use serde::Serialize;
use std::collections::HashSet;

/// Immutable comparison policy. Build with the `with_*` methods; the
/// float tolerances are validated at construction so a comparison call
/// never has to reject its configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonOptions {
    scope: ComparisonScope,
    float_comp: FloatComparison,
    float_fraction: f64,
    float_margin: f64,
    repeated_field_comp: RepeatedFieldComparison,
    ignore_field_paths: HashSet<FieldPath>,
}

impl Default for ComparisonOptions {
    fn default() -> Self {
        Self {
            scope: ComparisonScope::Full,
            float_comp: FloatComparison::Exact,
            float_fraction: 0.0,
            float_margin: 0.0,
            repeated_field_comp: RepeatedFieldComparison::AsList,
            ignore_field_paths: HashSet::new(),
        }
    }
}

impl ComparisonOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scope(mut self, scope: ComparisonScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_float_comparison(mut self, float_comp: FloatComparison) -> Self {
        self.float_comp = float_comp;
        self
    }

    /// Relative tolerance for approximate float comparison. Zero disables
    /// the fraction axis.
    pub fn with_float_fraction(mut self, fraction: f64) -> Result<Self, ProtoCmpError> {
        if !fraction.is_finite() || fraction < 0.0 {
            return Err(ProtoCmpError::InvalidOption(format!(
                "float_fraction must be finite and non-negative, got {fraction}"
            )));
        }
        self.float_fraction = fraction;
        Ok(self)
    }

    /// Absolute tolerance for approximate float comparison. Zero disables
    /// the margin axis.
    pub fn with_float_margin(mut self, margin: f64) -> Result<Self, ProtoCmpError> {
        if !margin.is_finite() || margin < 0.0 {
            return Err(ProtoCmpError::InvalidOption(format!(
                "float_margin must be finite and non-negative, got {margin}"
            )));
        }
        self.float_margin = margin;
        Ok(self)
    }

    pub fn with_repeated_field_comparison(
        mut self,
        repeated_field_comp: RepeatedFieldComparison,
    ) -> Self {
        self.repeated_field_comp = repeated_field_comp;
        self
    }

    /// Add one path to the ignore set. Everything at or beneath the path
    /// is excluded from comparison.
    pub fn ignore_field_path(mut self, path: FieldPath) -> Self {
        self.ignore_field_paths.insert(path);
        self
    }

    pub fn with_ignored_paths<I>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = FieldPath>,
    {
        self.ignore_field_paths.extend(paths);
        self
    }

    pub fn scope(&self) -> ComparisonScope {
        self.scope
    }

    pub fn float_comparison(&self) -> FloatComparison {
        self.float_comp
    }

    pub fn float_fraction(&self) -> f64 {
        self.float_fraction
    }

    pub fn float_margin(&self) -> f64 {
        self.float_margin
    }

    pub fn repeated_field_comparison(&self) -> RepeatedFieldComparison {
        self.repeated_field_comp
    }

    pub fn ignore_field_paths(&self) -> &HashSet<FieldPath> {
        &self.ignore_field_paths
    }

    pub fn is_ignored(&self, path: &FieldPath) -> bool {
        is_ignored(path, &self.ignore_field_paths)
    }
}
