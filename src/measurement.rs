//! Measured intensity vectors (spec.md §3, §6) and their validation
//! against the tracer `(N, n)` pair set the enumerator derives from a
//! compound.

use std::collections::HashSet;
use std::fmt;

/// One measured entry: precursor tracer-mass offset `N` (M+N), fragment
/// tracer-mass offset `n` (m+n), and the measured intensity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementEntry {
    pub precursor_offset: u16,
    pub fragment_offset: u16,
    pub value: f64,
}

/// An ordered list of measurement entries, keyed uniquely by `(N, n)`
/// (spec.md §3). Row order is input order and becomes the row/column order
/// of the correction matrix once validated against a tracer pair set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasurementVector {
    entries: Vec<MeasurementEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MeasurementError {
    DuplicateKey { precursor_offset: u16, fragment_offset: u16 },
    KeySetMismatch {
        missing: Vec<(u16, u16)>,
        unexpected: Vec<(u16, u16)>,
    },
}

impl fmt::Display for MeasurementError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MeasurementError::DuplicateKey {
                precursor_offset,
                fragment_offset,
            } => write!(
                f,
                "duplicate measurement key (N={precursor_offset}, n={fragment_offset})"
            ),
            MeasurementError::KeySetMismatch { missing, unexpected } => write!(
                f,
                "measurement (N,n) keys do not match the compound's tracer pairs: missing {missing:?}, unexpected {unexpected:?}"
            ),
        }
    }
}

impl std::error::Error for MeasurementError {}

impl MeasurementVector {
    pub fn new() -> MeasurementVector {
        MeasurementVector::default()
    }

    /// Build from `(N, n, value)` triples in input order, rejecting
    /// duplicate `(N, n)` keys.
    pub fn from_entries(
        entries: impl IntoIterator<Item = (u16, u16, f64)>,
    ) -> Result<MeasurementVector, MeasurementError> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for (precursor_offset, fragment_offset, value) in entries {
            if !seen.insert((precursor_offset, fragment_offset)) {
                return Err(MeasurementError::DuplicateKey {
                    precursor_offset,
                    fragment_offset,
                });
            }
            out.push(MeasurementEntry {
                precursor_offset,
                fragment_offset,
                value,
            });
        }
        Ok(MeasurementVector { entries: out })
    }

    /// Build an isotopologue measurement vector from `(N, value)` pairs,
    /// defaulting `n = N` (spec.md §6).
    pub fn from_isotopologue_entries(
        entries: impl IntoIterator<Item = (u16, f64)>,
    ) -> Result<MeasurementVector, MeasurementError> {
        Self::from_entries(entries.into_iter().map(|(n, v)| (n, n, v)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[MeasurementEntry] {
        &self.entries
    }

    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.value).collect()
    }

    pub fn keys(&self) -> Vec<(u16, u16)> {
        self.entries
            .iter()
            .map(|e| (e.precursor_offset, e.fragment_offset))
            .collect()
    }

    /// Row index for a given `(N, n)` key, in input order.
    pub fn index_of(&self, precursor_offset: u16, fragment_offset: u16) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.precursor_offset == precursor_offset && e.fragment_offset == fragment_offset)
    }

    /// Check this vector's `(N, n)` key set exactly matches `tracer_pairs`
    /// (spec.md §3: "a mismatch is fatal"), irrespective of order.
    pub fn validate_against(&self, tracer_pairs: &[(u16, u16)]) -> Result<(), MeasurementError> {
        let expected: HashSet<(u16, u16)> = tracer_pairs.iter().copied().collect();
        let actual: HashSet<(u16, u16)> = self.keys().into_iter().collect();
        if expected == actual {
            return Ok(());
        }
        let mut missing: Vec<_> = expected.difference(&actual).copied().collect();
        let mut unexpected: Vec<_> = actual.difference(&expected).copied().collect();
        missing.sort();
        unexpected.sort();
        Err(MeasurementError::KeySetMismatch { missing, unexpected })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_from_isotopologue_entries() {
        let m = MeasurementVector::from_isotopologue_entries([(0, 100.0), (1, 0.0)]).unwrap();
        assert_eq!(m.keys(), vec![(0, 0), (1, 1)]);
        assert_eq!(m.values(), vec![100.0, 0.0]);
    }

    #[test]
    fn test_duplicate_key_is_fatal() {
        let err = MeasurementVector::from_entries([(0, 0, 1.0), (0, 0, 2.0)]).unwrap_err();
        assert!(matches!(err, MeasurementError::DuplicateKey { .. }));
    }

    #[test]
    fn test_validate_against_mismatch() {
        let m = MeasurementVector::from_isotopologue_entries([(0, 1.0), (1, 0.0)]).unwrap();
        let err = m.validate_against(&[(0, 0), (2, 2)]).unwrap_err();
        match err {
            MeasurementError::KeySetMismatch { missing, unexpected } => {
                assert_eq!(missing, vec![(2, 2)]);
                assert_eq!(unexpected, vec![(1, 1)]);
            }
            _ => panic!("wrong error variant"),
        }
    }

    #[test]
    fn test_validate_against_match() {
        let m = MeasurementVector::from_isotopologue_entries([(0, 1.0), (1, 0.0)]).unwrap();
        m.validate_against(&[(1, 1), (0, 0)]).unwrap();
    }
}
