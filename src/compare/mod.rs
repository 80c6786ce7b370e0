// src/compare/mod.rs

//! Positional, absolute-tolerance comparison of result and reference sequences.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest absolute difference for two values to count as equal.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Returns `|a - b| < eps`. NaN is never equal to anything.
pub fn approx_equal(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() < eps
}

/// Outcome of comparing a result sequence against its reference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Comparison {
    Match,
    LengthMismatch { result: usize, reference: usize },
    ToleranceViolation { index: usize, result: f64, reference: f64 },
}

impl Comparison {
    pub fn passed(&self) -> bool {
        matches!(self, Comparison::Match)
    }

    /// Index of the first element outside tolerance. Length mismatches have none.
    pub fn first_mismatch(&self) -> Option<usize> {
        match self {
            Comparison::ToleranceViolation { index, .. } => Some(*index),
            _ => None,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Comparison::Match => write!(f, "all values within tolerance"),
            Comparison::LengthMismatch { result, reference } => write!(
                f,
                "length mismatch: result has {} values, reference has {}",
                result, reference
            ),
            Comparison::ToleranceViolation { index, result, reference } => write!(
                f,
                "Not equal at {}: result {} vs reference {}",
                index, result, reference
            ),
        }
    }
}

/// Walks both sequences in lock-step and stops at the first pair that is not
/// within `eps`. Lengths are checked before any element is touched.
pub fn compare_sequences(result: &[f64], reference: &[f64], eps: f64) -> Comparison {
    if result.len() != reference.len() {
        return Comparison::LengthMismatch {
            result: result.len(),
            reference: reference.len(),
        };
    }

    result
        .iter()
        .zip(reference)
        .position(|(&r, &e)| !approx_equal(r, e, eps))
        .map_or(Comparison::Match, |index| Comparison::ToleranceViolation {
            index,
            result: result[index],
            reference: reference[index],
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approx_equal_is_strict() {
        assert!(approx_equal(1.0, 1.0 + 5e-7, DEFAULT_TOLERANCE));
        assert!(!approx_equal(0.0, 2e-6, DEFAULT_TOLERANCE));
        assert!(!approx_equal(f64::NAN, f64::NAN, DEFAULT_TOLERANCE));
    }

    #[test]
    fn test_compare_sequences_match() {
        let result = [1.0000001, 2.0, 2.9999995];
        let reference = [1.0, 2.0, 3.0];
        let comparison = compare_sequences(&result, &reference, DEFAULT_TOLERANCE);
        assert!(comparison.passed());
        assert_eq!(comparison.first_mismatch(), None);
    }

    #[test]
    fn test_compare_sequences_stops_at_first_violation() {
        let result = [1.0, 2.5, 3.5];
        let reference = [1.0, 2.0, 3.0];
        match compare_sequences(&result, &reference, DEFAULT_TOLERANCE) {
            Comparison::ToleranceViolation { index, result, reference } => {
                assert_eq!(index, 1);
                assert_eq!(result, 2.5);
                assert_eq!(reference, 2.0);
            }
            other => panic!("expected a tolerance violation, got {:?}", other),
        }
    }

    #[test]
    fn test_compare_sequences_length_checked_first() {
        // The shared prefix differs, but the length mismatch wins.
        let comparison = compare_sequences(&[9.0], &[1.0, 2.0], DEFAULT_TOLERANCE);
        assert_eq!(comparison, Comparison::LengthMismatch { result: 1, reference: 2 });
        assert!(!comparison.passed());
        assert_eq!(comparison.first_mismatch(), None);
    }

    #[test]
    fn test_empty_sequences_match() {
        assert!(compare_sequences(&[], &[], DEFAULT_TOLERANCE).passed());
    }

    #[test]
    fn test_display_names_index() {
        let comparison = compare_sequences(&[1.0, 2.0, 3.1], &[1.0, 2.0, 3.0], DEFAULT_TOLERANCE);
        assert!(comparison.to_string().starts_with("Not equal at 2"));
    }
}
