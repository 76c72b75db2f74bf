use crate::descriptor::{FieldDescriptor, FieldKind, FieldType};
use crate::matching::find_perfect_matching;
use crate::message::{DynamicMessage, MapKey, Value};
use crate::scalar::scalar_equal;
use protocmp_common::{
    ComparisonOptions, ComparisonResult, ComparisonScope, FieldPath, ProtoCmpError,
    RepeatedFieldComparison, Result,
};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Two messages are comparable iff they declare the same schema,
/// independent of field contents.
pub fn comparable(a: &DynamicMessage, b: &DynamicMessage) -> bool {
    a.descriptor().full_name() == b.descriptor().full_name()
}

/// Compare two messages under default options.
pub fn compare(actual: &DynamicMessage, expected: &DynamicMessage) -> Result<ComparisonResult> {
    MessageComparator::new(ComparisonOptions::default()).compare(actual, expected)
}

/// Compare two messages under the given options.
pub fn compare_with_options(
    actual: &DynamicMessage,
    expected: &DynamicMessage,
    options: &ComparisonOptions,
) -> Result<ComparisonResult> {
    MessageComparator::new(options.clone()).compare(actual, expected)
}

/// Recursive comparison engine. Holds the policy; every `compare` call
/// is pure, takes read-only access to both messages, and leaves them
/// untouched.
pub struct MessageComparator {
    options: ComparisonOptions,
}

impl MessageComparator {
    pub fn new(options: ComparisonOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ComparisonOptions {
        &self.options
    }

    /// Walk both messages and produce a verdict with an explanation of
    /// every recorded divergence.
    ///
    /// Comparing messages of different schemas is a precondition
    /// violation reported as `SchemaMismatch`, never as an unequal
    /// verdict; descriptor divergence under an identical full name
    /// surfaces mid-walk as a `Schema` error.
    pub fn compare(
        &self,
        actual: &DynamicMessage,
        expected: &DynamicMessage,
    ) -> Result<ComparisonResult> {
        if !comparable(actual, expected) {
            return Err(ProtoCmpError::SchemaMismatch {
                actual: actual.descriptor().full_name().to_string(),
                expected: expected.descriptor().full_name().to_string(),
            });
        }

        debug!(
            schema = actual.descriptor().full_name(),
            "comparing message instances"
        );

        let mut diffs = Vec::new();
        let is_equal = self.message_equal(actual, expected, &FieldPath::root(), &mut diffs)?;
        debug!(is_equal, divergences = diffs.len(), "comparison finished");

        Ok(ComparisonResult {
            is_equal,
            explanation: diffs.join("\n"),
        })
    }

    fn message_equal(
        &self,
        actual: &DynamicMessage,
        expected: &DynamicMessage,
        path: &FieldPath,
        diffs: &mut Vec<String>,
    ) -> Result<bool> {
        let descriptor = actual.descriptor();
        if !Arc::ptr_eq(descriptor, expected.descriptor())
            && *descriptor != *expected.descriptor()
        {
            return Err(ProtoCmpError::Schema(format!(
                "descriptors for `{}` diverge between the two messages",
                descriptor.full_name()
            )));
        }
        let partial = self.options.scope() == ComparisonScope::Partial;
        let mut equal = true;

        // Oneof selection identity is checked per group; the member
        // fields of a mismatched group are not reported separately.
        let mut mismatched_groups: HashSet<&str> = HashSet::new();
        for group in descriptor.oneof_groups() {
            let actual_case = self.visible_oneof_case(actual, group, path);
            let expected_case = self.visible_oneof_case(expected, group, path);
            if partial && expected_case.is_none() {
                continue;
            }
            if actual_case != expected_case {
                let at = if path.is_empty() {
                    descriptor.full_name().to_string()
                } else {
                    path.to_string()
                };
                diffs.push(format!(
                    "{at}: oneof `{group}` selects {} in actual, {} in expected",
                    describe_case(actual_case),
                    describe_case(expected_case),
                ));
                mismatched_groups.insert(group);
                equal = false;
            }
        }

        for field in descriptor.fields() {
            let child = path.child(field.name());
            if self.options.is_ignored(&child) {
                continue;
            }
            if let Some(group) = field.oneof() {
                if mismatched_groups.contains(group) {
                    continue;
                }
            }
            let actual_value = actual.get(field.name());
            let expected_value = expected.get(field.name());
            if partial && expected_value.is_none() {
                continue;
            }

            match (actual_value, expected_value) {
                (None, None) => {}
                (Some(a), Some(e)) => {
                    if !self.value_equal(a, e, field, &child, diffs)? {
                        equal = false;
                    }
                }
                (Some(a), None) => {
                    diffs.push(format!("{child}: set in actual only (actual {a})"));
                    equal = false;
                }
                (None, Some(e)) => {
                    diffs.push(format!("{child}: set in expected only (expected {e})"));
                    equal = false;
                }
            }
        }

        Ok(equal)
    }

    /// The set member of a oneof group, unless that member's path is
    /// ignored, in which case the group counts as unset on this side.
    fn visible_oneof_case<'a>(
        &self,
        message: &'a DynamicMessage,
        group: &str,
        path: &FieldPath,
    ) -> Option<&'a str> {
        let case = message.oneof_case(group)?;
        if self.options.is_ignored(&path.child(case)) {
            None
        } else {
            Some(case)
        }
    }

    fn value_equal(
        &self,
        actual: &Value,
        expected: &Value,
        field: &FieldDescriptor,
        path: &FieldPath,
        diffs: &mut Vec<String>,
    ) -> Result<bool> {
        match field.kind() {
            FieldKind::Singular(FieldType::Message(_)) => match (actual, expected) {
                (Value::Message(a), Value::Message(e)) => self.message_equal(a, e, path, diffs),
                _ => Err(kind_divergence(path)),
            },
            FieldKind::Singular(_) => {
                if scalar_equal(actual, expected, &self.options) {
                    Ok(true)
                } else {
                    diffs.push(format!("{path}: actual {actual} vs expected {expected}"));
                    Ok(false)
                }
            }
            FieldKind::Repeated(element) => match (actual, expected) {
                (Value::List(a), Value::List(e)) => {
                    self.repeated_equal(a, e, element, path, diffs)
                }
                _ => Err(kind_divergence(path)),
            },
            FieldKind::Map { value, .. } => match (actual, expected) {
                (Value::Map(a), Value::Map(e)) => self.map_equal(a, e, value, path, diffs),
                _ => Err(kind_divergence(path)),
            },
        }
    }

    fn repeated_equal(
        &self,
        actual: &[Value],
        expected: &[Value],
        element: &FieldType,
        path: &FieldPath,
        diffs: &mut Vec<String>,
    ) -> Result<bool> {
        if actual.len() != expected.len() {
            diffs.push(format!(
                "{path}: element count differs, actual {} vs expected {}",
                actual.len(),
                expected.len()
            ));
            return Ok(false);
        }

        match self.options.repeated_field_comparison() {
            RepeatedFieldComparison::AsList => {
                let mut equal = true;
                for (index, (a, e)) in actual.iter().zip(expected).enumerate() {
                    match (element, a, e) {
                        (FieldType::Message(_), Value::Message(am), Value::Message(em)) => {
                            if !self.message_equal(am, em, path, diffs)? {
                                equal = false;
                            }
                        }
                        (FieldType::Message(_), _, _) => return Err(kind_divergence(path)),
                        _ => {
                            if !scalar_equal(a, e, &self.options) {
                                diffs.push(format!(
                                    "{path}[{index}]: actual {a} vs expected {e}"
                                ));
                                equal = false;
                            }
                        }
                    }
                }
                Ok(equal)
            }
            RepeatedFieldComparison::AsSet => {
                // The pairing search works on indices only; the caller's
                // sequences are never reordered.
                let mut probe_error: Option<ProtoCmpError> = None;
                let matching = find_perfect_matching(actual.len(), |i, j| {
                    match self.element_equal(&actual[i], &expected[j], element, path) {
                        Ok(eq) => eq,
                        Err(err) => {
                            probe_error.get_or_insert(err);
                            false
                        }
                    }
                });
                if let Some(err) = probe_error {
                    return Err(err);
                }
                if matching.is_none() {
                    diffs.push(format!(
                        "{path}: no order-insensitive pairing of the {} elements matches",
                        actual.len()
                    ));
                    return Ok(false);
                }
                Ok(true)
            }
        }
    }

    /// Quiet element comparison used by the pairing search.
    fn element_equal(
        &self,
        actual: &Value,
        expected: &Value,
        element: &FieldType,
        path: &FieldPath,
    ) -> Result<bool> {
        match (element, actual, expected) {
            (FieldType::Message(_), Value::Message(a), Value::Message(e)) => {
                let mut scratch = Vec::new();
                self.message_equal(a, e, path, &mut scratch)
            }
            (FieldType::Message(_), _, _) => Err(kind_divergence(path)),
            _ => Ok(scalar_equal(actual, expected, &self.options)),
        }
    }

    /// Map entries pair by exact key equality regardless of the repeated
    /// field policy.
    fn map_equal(
        &self,
        actual: &BTreeMap<MapKey, Value>,
        expected: &BTreeMap<MapKey, Value>,
        value_type: &FieldType,
        path: &FieldPath,
        diffs: &mut Vec<String>,
    ) -> Result<bool> {
        let mut equal = true;

        for (key, a) in actual {
            match expected.get(key) {
                None => {
                    diffs.push(format!("{path}[{key}]: key present in actual only"));
                    equal = false;
                }
                Some(e) => match (value_type, a, e) {
                    (FieldType::Message(_), Value::Message(am), Value::Message(em)) => {
                        if !self.message_equal(am, em, path, diffs)? {
                            equal = false;
                        }
                    }
                    (FieldType::Message(_), _, _) => return Err(kind_divergence(path)),
                    _ => {
                        if !scalar_equal(a, e, &self.options) {
                            diffs.push(format!("{path}[{key}]: actual {a} vs expected {e}"));
                            equal = false;
                        }
                    }
                },
            }
        }

        for key in expected.keys() {
            if !actual.contains_key(key) {
                diffs.push(format!("{path}[{key}]: key present in expected only"));
                equal = false;
            }
        }

        Ok(equal)
    }
}

fn describe_case(case: Option<&str>) -> String {
    match case {
        Some(name) => format!("`{name}`"),
        None => "nothing".to_string(),
    }
}

fn kind_divergence(path: &FieldPath) -> ProtoCmpError {
    ProtoCmpError::Schema(format!(
        "field `{path}` has diverging kinds between the two schemas"
    ))
}
