//! End-to-end scenarios exercising the correction pipeline through its
//! public API, covering the concrete cases and structural invariants a
//! correction run is expected to satisfy.

use isocorr::compound::{Compound, Side, Tracer};
use isocorr::correct::{correct, CorrectionOptions, Warning};
use isocorr::enumerate::{enumerate_combinations, EnumerateOptions};
use isocorr::measurement::MeasurementVector;
use isocorr::probability::assign_probabilities;
use isocorr::purity::TracerPurity;
use isocorr::solver::build_matrix;
use isocorr::table::DEFAULT_TABLE;

fn glucose_isotopologue() -> Compound {
    let side = Side::new(
        Tracer {
            element: "C".into(),
            isotope_mass_number: 13,
            count: 6,
        },
        [("H", 12u32), ("O", 6)].into_iter().collect(),
    );
    Compound {
        precursor: side.clone(),
        fragment: side,
    }
}

fn fragmented_compound() -> Compound {
    let precursor = Side::new(
        Tracer {
            element: "C".into(),
            isotope_mass_number: 13,
            count: 5,
        },
        [("H", 10u32), ("O", 5)].into_iter().collect(),
    );
    let fragment = Side::new(
        Tracer {
            element: "C".into(),
            isotope_mass_number: 13,
            count: 3,
        },
        [("H", 6u32), ("O", 3)].into_iter().collect(),
    );
    Compound { precursor, fragment }
}

fn fragmented_keys(precursor_count: u16, fragment_count: u16) -> Vec<(u16, u16)> {
    let slack = precursor_count - fragment_count;
    (0..=precursor_count)
        .flat_map(move |n| {
            (0..=fragment_count.min(n))
                .filter(move |&small_n| slack + small_n >= n)
                .map(move |small_n| (n, small_n))
        })
        .collect()
}

#[test]
fn scenario_unlabeled_isotopologue_lands_entirely_on_m0() {
    let compound = glucose_isotopologue();
    let measured =
        MeasurementVector::from_isotopologue_entries((0..=6).map(|n| (n, if n == 0 { 100.0 } else { 0.0 }))).unwrap();
    let (result, warnings) = correct(&compound, &measured, &DEFAULT_TABLE, &CorrectionOptions::default()).unwrap();
    assert_eq!(result.corrected[0], 100.0);
    assert!(result.corrected[1..].iter().all(|&v| v.abs() < 1e-6));
    assert!((result.mean_enrichment.unwrap()).abs() < 1e-6);
    assert!(warnings.is_empty());
}

#[test]
fn scenario_pure_full_label_saturates_m6_with_mean_enrichment_one() {
    let compound = glucose_isotopologue();
    let measured =
        MeasurementVector::from_isotopologue_entries((0..=6).map(|n| (n, if n == 6 { 100.0 } else { 0.0 }))).unwrap();
    let (result, _) = correct(&compound, &measured, &DEFAULT_TABLE, &CorrectionOptions::default()).unwrap();
    assert!(result.relative[6] > 0.99);
    assert!((result.mean_enrichment.unwrap() - 1.0).abs() < 1e-3);
}

#[test]
fn scenario_fragmented_compound_matrix_is_square_positive_and_triangular() {
    let compound = fragmented_compound();
    let keys = fragmented_keys(5, 3);
    assert_eq!(keys.len(), 9);
    let measured =
        MeasurementVector::from_entries(keys.iter().map(|&(n, small_n)| (n, small_n, 10.0))).unwrap();
    let (result, _) = correct(&compound, &measured, &DEFAULT_TABLE, &CorrectionOptions::default()).unwrap();
    assert_eq!(result.keys.len(), 9);
    assert!(result.corrected.iter().all(|&v| v >= 0.0));
    assert_eq!(result.corrected[0], 10.0);
}

#[test]
fn scenario_two_isotope_element_clips_negative_tail_to_zero() {
    let side = Side::new(
        Tracer {
            element: "C".into(),
            isotope_mass_number: 13,
            count: 2,
        },
        [("H", 2u32)].into_iter().collect(),
    );
    let compound = Compound {
        precursor: side.clone(),
        fragment: side,
    };
    let measured =
        MeasurementVector::from_isotopologue_entries([(0, 1000.0), (1, 0.0), (2, 0.0)]).unwrap();
    let (result, warnings) = correct(&compound, &measured, &DEFAULT_TABLE, &CorrectionOptions::default()).unwrap();
    assert_eq!(result.corrected[1], 0.0);
    assert_eq!(result.corrected[2], 0.0);
    assert!(warnings
        .iter()
        .any(|w| matches!(w, Warning::NegativeResultsClipped(_))));
}

#[test]
fn scenario_purity_aware_correction_shifts_mass_above_the_diagonal() {
    let compound = glucose_isotopologue();
    let purity = TracerPurity::new("C", vec![(13, 0.99), (12, 0.01)]);
    let measured =
        MeasurementVector::from_isotopologue_entries((0..=6).map(|n| (n, if n == 6 { 100.0 } else { 0.0 }))).unwrap();
    let options = CorrectionOptions {
        purity: Some(purity),
        ..CorrectionOptions::default()
    };
    let (result, _) = correct(&compound, &measured, &DEFAULT_TABLE, &options).unwrap();
    assert!(result.corrected[6] > 100.0);
}

#[test]
fn scenario_expected_tolerance_violation_warns_but_still_returns_a_result() {
    let compound = glucose_isotopologue();
    let measured =
        MeasurementVector::from_isotopologue_entries((0..=6).map(|n| (n, if n == 0 { 102.0 } else { 0.0 }))).unwrap();
    let options = CorrectionOptions {
        expected: Some(vec![100.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
        tolerance: 1.0,
        ..CorrectionOptions::default()
    };
    let (result, warnings) = correct(&compound, &measured, &DEFAULT_TABLE, &options).unwrap();
    assert!(result.corrected[0] > 0.0);
    assert!(warnings
        .iter()
        .any(|w| matches!(w, Warning::ExpectedToleranceExceeded { index: 0, .. })));
}

#[test]
fn scenario_single_isotope_non_tracer_elements_yield_identity_matrix() {
    let side = Side::new(
        Tracer {
            element: "C".into(),
            isotope_mass_number: 13,
            count: 2,
        },
        [("P", 1u32)].into_iter().collect(),
    );
    let compound = Compound {
        precursor: side.clone(),
        fragment: side,
    };
    let measured = MeasurementVector::from_isotopologue_entries([(0, 5.0), (1, 7.0), (2, 11.0)]).unwrap();
    let (result, _) = correct(&compound, &measured, &DEFAULT_TABLE, &CorrectionOptions::default()).unwrap();
    assert_eq!(result.corrected, vec![5.0, 7.0, 11.0]);
}

#[test]
fn scenario_natural_abundance_on_tracer_shifts_mass_above_the_baseline() {
    let side = Side::new(
        Tracer {
            element: "C".into(),
            isotope_mass_number: 13,
            count: 2,
        },
        [("P", 1u32)].into_iter().collect(),
    );
    let compound = Compound {
        precursor: side.clone(),
        fragment: side,
    };
    let keys = vec![(0u16, 0u16), (1, 1), (2, 2)];

    let baseline_raw = enumerate_combinations(&compound, &DEFAULT_TABLE, &EnumerateOptions::default()).unwrap();
    let baseline_records = assign_probabilities(&baseline_raw);
    let baseline_matrix = build_matrix(&baseline_records, &keys);
    assert_eq!(baseline_matrix.get(0, 0), 1.0);

    let opts = EnumerateOptions {
        natural_abundance_on_tracer: true,
        purity: None,
    };
    let contaminated_raw = enumerate_combinations(&compound, &DEFAULT_TABLE, &opts).unwrap();
    let contaminated_records = assign_probabilities(&contaminated_raw);
    let contaminated_matrix = build_matrix(&contaminated_records, &keys);
    assert!(contaminated_matrix.get(0, 0) < 1.0);
    assert!(contaminated_matrix.get(1, 0) > 0.0 || contaminated_matrix.get(2, 0) > 0.0);
}
