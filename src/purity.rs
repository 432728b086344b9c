//! Optional tracer-purity descriptor (spec.md §3, §6): the isotopic
//! composition of the tracer reagent itself, used to expand combinations
//! in [`crate::enumerate`] when the reagent is not 100% pure.

use std::fmt;

use crate::element::IsotopeTable;

const SUM_TOLERANCE: f64 = 1e-8;

/// Fraction of each tracer-element isotope actually present in the
/// labeling reagent, keyed by mass number.
#[derive(Debug, Clone, PartialEq)]
pub struct TracerPurity {
    pub element: String,
    fractions: Vec<(u16, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PurityError {
    NotTracerElement { purity: String, tracer: String },
    TracerIsotopeMissing(u16),
    SumOutOfTolerance(f64),
    UnknownElement(crate::element::TableError),
}

impl fmt::Display for PurityError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PurityError::NotTracerElement { purity, tracer } => write!(
                f,
                "purity table references element {purity}, but the tracer element is {tracer}"
            ),
            PurityError::TracerIsotopeMissing(mass_number) => {
                write!(f, "purity table does not list the tracer isotope (mass {mass_number})")
            }
            PurityError::SumOutOfTolerance(sum) => {
                write!(f, "purity fractions sum to {sum}, not 1 within tolerance")
            }
            PurityError::UnknownElement(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for PurityError {}

impl From<crate::element::TableError> for PurityError {
    fn from(err: crate::element::TableError) -> Self {
        PurityError::UnknownElement(err)
    }
}

impl TracerPurity {
    pub fn new(element: impl Into<String>, fractions: Vec<(u16, f64)>) -> TracerPurity {
        TracerPurity {
            element: element.into(),
            fractions,
        }
    }

    pub fn fraction(&self, mass_number: u16) -> f64 {
        self.fractions
            .iter()
            .find(|(m, _)| *m == mass_number)
            .map(|(_, f)| *f)
            .unwrap_or(0.0)
    }

    pub fn fractions(&self) -> &[(u16, f64)] {
        &self.fractions
    }

    /// Validate against the compound's tracer element/isotope (spec.md §7):
    /// the purity table must reference the tracer element, list the tracer
    /// isotope, and sum to 1 within tolerance.
    pub fn validate(
        &self,
        tracer_element: &str,
        tracer_isotope_mass_number: u16,
        table: &IsotopeTable,
    ) -> Result<(), PurityError> {
        if self.element != tracer_element {
            return Err(PurityError::NotTracerElement {
                purity: self.element.clone(),
                tracer: tracer_element.to_string(),
            });
        }
        table.get(&self.element)?;
        if !self
            .fractions
            .iter()
            .any(|(m, _)| *m == tracer_isotope_mass_number)
        {
            return Err(PurityError::TracerIsotopeMissing(tracer_isotope_mass_number));
        }
        let sum: f64 = self.fractions.iter().map(|(_, f)| f).sum();
        if (sum - 1.0).abs() > SUM_TOLERANCE {
            return Err(PurityError::SumOutOfTolerance(sum));
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::table::DEFAULT_TABLE;

    #[test]
    fn test_valid_purity() {
        let purity = TracerPurity::new("C", vec![(13, 0.99), (12, 0.01)]);
        purity.validate("C", 13, &DEFAULT_TABLE).unwrap();
    }

    #[test]
    fn test_wrong_element_is_fatal() {
        let purity = TracerPurity::new("N", vec![(15, 0.99), (14, 0.01)]);
        let err = purity.validate("C", 13, &DEFAULT_TABLE).unwrap_err();
        assert!(matches!(err, PurityError::NotTracerElement { .. }));
    }

    #[test]
    fn test_bad_sum_is_fatal() {
        let purity = TracerPurity::new("C", vec![(13, 0.5), (12, 0.1)]);
        let err = purity.validate("C", 13, &DEFAULT_TABLE).unwrap_err();
        assert!(matches!(err, PurityError::SumOutOfTolerance(_)));
    }

    #[test]
    fn test_missing_tracer_isotope_is_fatal() {
        let purity = TracerPurity::new("C", vec![(12, 1.0)]);
        let err = purity.validate("C", 13, &DEFAULT_TABLE).unwrap_err();
        assert!(matches!(err, PurityError::TracerIsotopeMissing(13)));
    }
}
