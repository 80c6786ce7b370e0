//! Property-based tests for the reference store and the comparator.
//!
//! Covers: save/load round trip, matching within tolerance, first-mismatch
//! reporting, length mismatches.

use proptest::prelude::*;
use regression_harness::reference;
use regression_harness::{compare_sequences, Comparison, DEFAULT_TOLERANCE};

fn values() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(prop::num::f64::NORMAL | prop::num::f64::ZERO | prop::num::f64::SUBNORMAL, 0..64)
}

proptest! {
    /// Whatever is saved loads back bit for bit.
    #[test]
    fn save_then_load_round_trips(values in values()) {
        let dir = tempfile::tempdir().expect("tempdir should build");
        let path = dir.path().join("ref.txt");

        reference::save(&path, &values).unwrap();
        let loaded = reference::load(&path).unwrap();

        prop_assert_eq!(loaded.len(), values.len());
        for (a, b) in loaded.iter().zip(&values) {
            prop_assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    /// Perturbations strictly inside the tolerance always match.
    #[test]
    fn within_tolerance_matches(
        pairs in prop::collection::vec((-1e3f64..1e3, -0.9f64..0.9), 0..64),
    ) {
        let reference: Vec<f64> = pairs.iter().map(|(v, _)| *v).collect();
        let result: Vec<f64> = pairs.iter().map(|(v, d)| v + d * DEFAULT_TOLERANCE * 0.5).collect();

        prop_assert_eq!(compare_sequences(&result, &reference, DEFAULT_TOLERANCE), Comparison::Match);
    }

    /// The first index pushed beyond tolerance is the one reported.
    #[test]
    fn first_violation_is_reported(
        reference in prop::collection::vec(-1e3f64..1e3, 1..64),
        picks in prop::collection::vec(any::<prop::sample::Index>(), 1..4),
    ) {
        let mut result = reference.clone();
        let bumped: Vec<usize> = picks.iter().map(|p| p.index(reference.len())).collect();
        for &k in &bumped {
            result[k] += 1.0;
        }
        let first = *bumped.iter().min().unwrap();

        let comparison = compare_sequences(&result, &reference, DEFAULT_TOLERANCE);
        prop_assert!(!comparison.passed());
        prop_assert_eq!(comparison.first_mismatch(), Some(first));
    }

    /// Unequal lengths never pass, whatever the shared prefix holds.
    #[test]
    fn unequal_lengths_fail(
        reference in prop::collection::vec(-1e3f64..1e3, 0..32),
        extra in 1usize..8,
    ) {
        let mut longer = reference.clone();
        longer.extend(std::iter::repeat(0.0).take(extra));

        let comparison = compare_sequences(&longer, &reference, DEFAULT_TOLERANCE);
        prop_assert_eq!(
            comparison,
            Comparison::LengthMismatch { result: reference.len() + extra, reference: reference.len() }
        );
    }
}
