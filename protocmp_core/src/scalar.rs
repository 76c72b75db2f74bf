use crate::message::Value;
use protocmp_common::{ComparisonOptions, FloatComparison};

/// Compare two leaf values of the same declared type.
///
/// Non-floating types use exact value equality (enums by number). Float
/// and double honor the configured float comparison mode: Exact is
/// bit/value equality; Approximate accepts a difference within the
/// absolute margin or within the relative fraction (either suffices).
/// With both tolerances unset, Approximate falls back to a relative
/// epsilon scaled to the declared precision.
pub fn scalar_equal(a: &Value, b: &Value, opts: &ComparisonOptions) -> bool {
    match (a, b) {
        (Value::Float(x), Value::Float(y)) => match opts.float_comparison() {
            FloatComparison::Exact => x.to_bits() == y.to_bits() || x == y,
            FloatComparison::Approximate => {
                approx_equal(f64::from(*x), f64::from(*y), f64::from(f32::EPSILON), opts)
            }
        },
        (Value::Double(x), Value::Double(y)) => match opts.float_comparison() {
            FloatComparison::Exact => x.to_bits() == y.to_bits() || x == y,
            FloatComparison::Approximate => approx_equal(*x, *y, f64::EPSILON, opts),
        },
        _ => a == b,
    }
}

fn approx_equal(a: f64, b: f64, epsilon: f64, opts: &ComparisonOptions) -> bool {
    if a.to_bits() == b.to_bits() || a == b {
        return true;
    }
    let diff = (a - b).abs();
    let magnitude = a.abs().max(b.abs());
    let fraction = opts.float_fraction();
    let margin = opts.float_margin();
    if fraction == 0.0 && margin == 0.0 {
        // Both tolerance axes unset: near-equality at 32 ULP of the
        // declared precision.
        return diff <= 32.0 * epsilon * magnitude;
    }
    diff <= margin || diff <= fraction * magnitude
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approximate() -> ComparisonOptions {
        ComparisonOptions::new().with_float_comparison(FloatComparison::Approximate)
    }

    #[test]
    fn non_float_scalars_compare_exactly() {
        let opts = ComparisonOptions::default();
        assert!(scalar_equal(&Value::Int32(5), &Value::Int32(5), &opts));
        assert!(!scalar_equal(&Value::Int32(5), &Value::Int32(6), &opts));
        assert!(scalar_equal(&Value::Enum(1), &Value::Enum(1), &opts));
        assert!(!scalar_equal(&Value::Enum(0), &Value::Enum(1), &opts));
        assert!(scalar_equal(
            &Value::String("hehe".to_string()),
            &Value::String("hehe".to_string()),
            &opts
        ));
        assert!(!scalar_equal(
            &Value::Bytes(vec![1, 2]),
            &Value::Bytes(vec![1, 3]),
            &opts
        ));
    }

    #[test]
    fn exact_floats_have_no_tolerance() {
        // Fraction and margin do not matter while the mode is Exact.
        let opts = ComparisonOptions::new().with_float_margin(10.0).unwrap();
        assert!(!scalar_equal(
            &Value::Float(100.0),
            &Value::Float(109.9),
            &opts
        ));
        assert!(scalar_equal(
            &Value::Float(2.5),
            &Value::Float(2.5),
            &opts
        ));
    }

    #[test]
    fn exact_handles_nan_and_signed_zero() {
        let opts = ComparisonOptions::default();
        assert!(scalar_equal(
            &Value::Double(f64::NAN),
            &Value::Double(f64::NAN),
            &opts
        ));
        assert!(scalar_equal(&Value::Double(0.0), &Value::Double(-0.0), &opts));
        assert!(!scalar_equal(&Value::Double(f64::NAN), &Value::Double(0.0), &opts));
    }

    #[test]
    fn approximate_default_equates_adjacent_values() {
        let opts = approximate();
        assert!(scalar_equal(
            &Value::Float(2.300005),
            &Value::Float(2.300006),
            &opts
        ));
        assert!(scalar_equal(
            &Value::Double(2.3 + 1.1e-15),
            &Value::Double(2.3 + 1.2e-15),
            &opts
        ));
        assert!(!scalar_equal(&Value::Float(2.3), &Value::Float(2.4), &opts));
    }

    #[test]
    fn margin_and_fraction_combine_with_or() {
        let margin_only = approximate().with_float_margin(10.0).unwrap();
        assert!(scalar_equal(
            &Value::Float(100.0),
            &Value::Float(109.9),
            &margin_only
        ));

        let fraction_only = approximate().with_float_fraction(0.2).unwrap();
        assert!(scalar_equal(
            &Value::Float(100.0),
            &Value::Float(109.9),
            &fraction_only
        ));

        let tight_fraction = approximate().with_float_fraction(0.01).unwrap();
        assert!(!scalar_equal(
            &Value::Float(100.0),
            &Value::Float(109.9),
            &tight_fraction
        ));

        let both = approximate()
            .with_float_fraction(0.10)
            .unwrap()
            .with_float_margin(10.0)
            .unwrap();
        assert!(scalar_equal(
            &Value::Float(100.0),
            &Value::Float(109.9),
            &both
        ));
    }

    #[test]
    fn approximate_is_symmetric() {
        let opts = approximate().with_float_margin(0.5).unwrap();
        let pairs = [
            (1.0f64, 1.4),
            (1.4, 1.0),
            (-3.0, -3.6),
            (0.0, 0.49),
            (100.0, 200.0),
        ];
        for (x, y) in pairs {
            assert_eq!(
                scalar_equal(&Value::Double(x), &Value::Double(y), &opts),
                scalar_equal(&Value::Double(y), &Value::Double(x), &opts),
                "asymmetric for {x} vs {y}"
            );
        }
    }
}
