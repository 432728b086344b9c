//! Top-level orchestration (spec.md §4, §6, §7): validates a
//! [`Compound`]/[`MeasurementVector`] pair, runs the enumerator and
//! probability engine, solves the correction matrix, and reports
//! non-fatal conditions as [`Warning`]s rather than failing the call.

use std::fmt;

use crate::compound::{Compound, CompoundError};
use crate::element::IsotopeTable;
use crate::enumerate::{self, EnumerateError, EnumerateOptions};
use crate::measurement::{MeasurementError, MeasurementVector};
use crate::probability;
use crate::purity::{PurityError, TracerPurity};
use crate::solver::{self, CorrectionResult, SolverError};

/// Tunable behavior for one correction run (spec.md §6). `tolerance`
/// governs the optional `expected`-vector validation warning.
#[derive(Debug, Clone)]
pub struct CorrectionOptions {
    pub purity: Option<TracerPurity>,
    pub natural_abundance_on_tracer: bool,
    pub expected: Option<Vec<f64>>,
    pub tolerance: f64,
}

impl Default for CorrectionOptions {
    fn default() -> CorrectionOptions {
        CorrectionOptions {
            purity: None,
            natural_abundance_on_tracer: false,
            expected: None,
            tolerance: 1.0,
        }
    }
}

/// Non-fatal conditions surfaced alongside a successful [`CorrectionResult`]
/// (spec.md §7): these never abort the call, they're returned for the
/// caller to act on or ignore.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    MeanEnrichmentNotApplicable,
    NegativeResultsClipped(usize),
    ExpectedToleranceExceeded { index: usize, expected: f64, actual: f64, delta: f64 },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Warning::MeanEnrichmentNotApplicable => write!(
                f,
                "mean enrichment was requested but the compound is not an isotopologue"
            ),
            Warning::NegativeResultsClipped(count) => {
                write!(f, "{count} corrected value(s) were negative and clipped to zero")
            }
            Warning::ExpectedToleranceExceeded { index, expected, actual, delta } => write!(
                f,
                "entry {index} differs from the expected value by {delta} (expected {expected}, got {actual}), exceeding tolerance"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CorrectionError {
    Compound(CompoundError),
    Purity(PurityError),
    Measurement(MeasurementError),
    Enumerate(String),
    Solver(SolverError),
}

impl fmt::Display for CorrectionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CorrectionError::Compound(err) => write!(f, "{err}"),
            CorrectionError::Purity(err) => write!(f, "{err}"),
            CorrectionError::Measurement(err) => write!(f, "{err}"),
            CorrectionError::Enumerate(msg) => write!(f, "{msg}"),
            CorrectionError::Solver(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for CorrectionError {}

impl From<CompoundError> for CorrectionError {
    fn from(err: CompoundError) -> Self {
        CorrectionError::Compound(err)
    }
}

impl From<PurityError> for CorrectionError {
    fn from(err: PurityError) -> Self {
        CorrectionError::Purity(err)
    }
}

impl From<MeasurementError> for CorrectionError {
    fn from(err: MeasurementError) -> Self {
        CorrectionError::Measurement(err)
    }
}

impl From<EnumerateError> for CorrectionError {
    fn from(err: EnumerateError) -> Self {
        CorrectionError::Enumerate(err.to_string())
    }
}

impl From<SolverError> for CorrectionError {
    fn from(err: SolverError) -> Self {
        CorrectionError::Solver(err)
    }
}

/// Run the full correction pipeline for `compound`/`measured` (spec.md §4).
pub fn correct(
    compound: &Compound,
    measured: &MeasurementVector,
    table: &IsotopeTable,
    options: &CorrectionOptions,
) -> Result<(CorrectionResult, Vec<Warning>), CorrectionError> {
    compound.validate(table)?;
    if let Some(purity) = &options.purity {
        purity.validate(
            &compound.precursor.tracer.element,
            compound.precursor.tracer.isotope_mass_number,
            table,
        )?;
    }

    let enumerate_opts = EnumerateOptions {
        natural_abundance_on_tracer: options.natural_abundance_on_tracer,
        purity: options.purity.as_ref(),
    };
    let raw = enumerate::enumerate_combinations(compound, table, &enumerate_opts)?;

    let mut keys: Vec<(u16, u16)> = raw.iter().map(|c| c.tracer_slot).collect();
    keys.sort();
    keys.dedup();

    measured.validate_against(&keys)?;

    let records = probability::assign_probabilities(&raw);
    let matrix = solver::build_matrix(&records, &keys);

    let canonical_measured: Vec<f64> = keys
        .iter()
        .map(|&(n, small_n)| {
            measured
                .index_of(n, small_n)
                .map(|idx| measured.entries()[idx].value)
                .unwrap_or(0.0)
        })
        .collect();

    let tracer_count = compound.is_isotopologue().then_some(compound.precursor.tracer.count);
    let result = solver::solve(
        &matrix,
        &canonical_measured,
        options.purity.is_some(),
        tracer_count,
    )?;

    let mut warnings = Vec::new();
    if tracer_count.is_none() {
        warnings.push(Warning::MeanEnrichmentNotApplicable);
    }
    if result.clipped_negative_count > 0 {
        warnings.push(Warning::NegativeResultsClipped(result.clipped_negative_count));
    }
    if let Some(expected) = &options.expected {
        for (index, (&actual, &expected_value)) in result.corrected.iter().zip(expected).enumerate() {
            let delta = (actual - expected_value).abs();
            if delta > options.tolerance {
                warnings.push(Warning::ExpectedToleranceExceeded {
                    index,
                    expected: expected_value,
                    actual,
                    delta,
                });
            }
        }
    }

    Ok((result, warnings))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::compound::{Side, Tracer};
    use crate::table::DEFAULT_TABLE;

    fn glucose() -> Compound {
        let precursor = Side::new(
            Tracer {
                element: "C".into(),
                isotope_mass_number: 13,
                count: 6,
            },
            [("H", 12u32), ("O", 6)].into_iter().collect(),
        );
        let fragment = precursor.clone();
        Compound { precursor, fragment }
    }

    #[test]
    fn test_unlabeled_glucose_corrects_to_mostly_m0() {
        let compound = glucose();
        let measured = MeasurementVector::from_isotopologue_entries(
            (0..=6).map(|n| (n, if n == 0 { 1000.0 } else { 0.0 })),
        )
        .unwrap();
        let (result, warnings) =
            correct(&compound, &measured, &DEFAULT_TABLE, &CorrectionOptions::default()).unwrap();
        assert!(result.corrected[0] > 900.0);
        assert!(result.mean_enrichment.unwrap() < 0.05);
        assert!(warnings.iter().all(|w| !matches!(w, Warning::MeanEnrichmentNotApplicable)));
    }

    #[test]
    fn test_pure_full_label_corrects_to_m6() {
        let compound = glucose();
        let measured = MeasurementVector::from_isotopologue_entries(
            (0..=6).map(|n| (n, if n == 6 { 1000.0 } else { 0.0 })),
        )
        .unwrap();
        let (result, _) =
            correct(&compound, &measured, &DEFAULT_TABLE, &CorrectionOptions::default()).unwrap();
        assert!(result.relative[6] > 0.95);
        assert!((result.mean_enrichment.unwrap() - 1.0).abs() < 0.05);
    }

    #[test]
    fn test_key_mismatch_is_fatal() {
        let compound = glucose();
        let measured = MeasurementVector::from_isotopologue_entries([(0, 1.0), (1, 0.0)]).unwrap();
        let err = correct(&compound, &measured, &DEFAULT_TABLE, &CorrectionOptions::default())
            .unwrap_err();
        assert!(matches!(err, CorrectionError::Measurement(_)));
    }

    #[test]
    fn test_fragmented_compound_has_no_mean_enrichment() {
        let mut compound = glucose();
        compound.fragment.tracer.count = 3;
        compound.fragment.elements.set("H", 6);
        compound.fragment.elements.set("O", 3);
        let keys: Vec<(u16, u16)> = (0..=6u16)
            .flat_map(|n| (0..=3u16.min(n)).filter(move |&small_n| (6 - 3) + small_n >= n).map(move |small_n| (n, small_n)))
            .collect();
        let measured = MeasurementVector::from_entries(
            keys.iter().map(|&(n, small_n)| (n, small_n, if (n, small_n) == (0, 0) { 1000.0 } else { 0.0 })),
        )
        .unwrap();
        let (result, warnings) =
            correct(&compound, &measured, &DEFAULT_TABLE, &CorrectionOptions::default()).unwrap();
        assert!(result.mean_enrichment.is_none());
        assert!(warnings.contains(&Warning::MeanEnrichmentNotApplicable));
    }

    #[test]
    fn test_purity_aware_correction_runs() {
        let compound = glucose();
        let purity = TracerPurity::new("C", vec![(13, 0.95), (12, 0.05)]);
        let measured = MeasurementVector::from_isotopologue_entries(
            (0..=6).map(|n| (n, if n == 6 { 1000.0 } else { 0.0 })),
        )
        .unwrap();
        let options = CorrectionOptions {
            purity: Some(purity),
            ..CorrectionOptions::default()
        };
        let (result, _) = correct(&compound, &measured, &DEFAULT_TABLE, &options).unwrap();
        assert_eq!(result.corrected.len(), 7);
        assert!(result.corrected.iter().all(|v| v.is_finite()));
    }
}
