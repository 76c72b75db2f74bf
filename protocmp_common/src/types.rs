use serde::{Deserialize, Serialize};

/// Which fields of the expected message take part in a comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ComparisonScope {
    /// Every declared field is compared; a field set on one side only is
    /// a divergence
    #[default]
    Full,
    /// Only fields set in the expected message are compared; extra fields
    /// in the actual message are never a divergence
    Partial,
}

/// How floating-point leaf values are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FloatComparison {
    /// Bit/value equality, no tolerance
    #[default]
    Exact,
    /// Within the configured margin or fraction (logical OR)
    Approximate,
}

/// How repeated fields are paired up for comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RepeatedFieldComparison {
    /// Positional: element i is compared against element i
    #[default]
    AsList,
    /// Order-insensitive: any perfect one-to-one pairing may satisfy the
    /// comparison
    AsSet,
}

/// Outcome of one comparison call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub is_equal: bool,
    /// One line per recorded divergence; empty when equal
    pub explanation: String,
}

impl ComparisonResult {
    pub fn equal() -> Self {
        Self {
            is_equal: true,
            explanation: String::new(),
        }
    }

    pub fn unequal(explanation: String) -> Self {
        Self {
            is_equal: false,
            explanation,
        }
    }
}
