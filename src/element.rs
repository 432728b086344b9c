use std::collections::HashMap;
use std::fmt;
use std::ops;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use fnv::FnvBuildHasher as RandomState;

/// A known isotope of an element, named by its absolute mass number.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Isotope {
    /// Absolute mass number (protons + neutrons), e.g. `13` for `C13`.
    pub mass_number: u16,
    /// Natural relative intensity, in `[0, 1]`.
    pub relative_intensity: f64,
    /// `mass_number` minus the mass number of the element's lightest isotope.
    pub mass_delta: u16,
}

impl fmt::Display for Isotope {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Isotope({}, {}, +{})",
            self.mass_number, self.relative_intensity, self.mass_delta
        )
    }
}

/// A chemical element, identified by a one- or two-letter symbol, carrying
/// its ordered set of isotopes. Isotopes are stored lightest-first; that
/// order is the deterministic slot order the enumerator relies on (spec.md
/// §3, §4.2.4).
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Element {
    pub symbol: String,
    isotopes: Vec<Isotope>,
}

impl Element {
    /// Build an element from `(mass_number, relative_intensity)` pairs,
    /// given in any order. Mass deltas are computed relative to the
    /// smallest mass number in the list.
    pub fn new(symbol: impl Into<String>, isotopes: &[(u16, f64)]) -> Element {
        let mut sorted: Vec<(u16, f64)> = isotopes.to_vec();
        sorted.sort_by_key(|(mass_number, _)| *mass_number);
        let lightest = sorted[0].0;
        let isotopes = sorted
            .into_iter()
            .map(|(mass_number, relative_intensity)| Isotope {
                mass_number,
                relative_intensity,
                mass_delta: mass_number - lightest,
            })
            .collect();
        Element {
            symbol: symbol.into(),
            isotopes,
        }
    }

    #[inline]
    pub fn isotope_count(&self) -> usize {
        self.isotopes.len()
    }

    /// An element with a single known isotope carries no natural-abundance
    /// variation and is excluded from combination enumeration (spec.md §3).
    #[inline]
    pub fn is_inert(&self) -> bool {
        self.isotopes.len() <= 1
    }

    #[inline]
    pub fn lightest(&self) -> &Isotope {
        &self.isotopes[0]
    }

    /// Isotopes in deterministic (mass-ascending) order.
    #[inline]
    pub fn isotopes(&self) -> &[Isotope] {
        &self.isotopes
    }

    /// Non-lightest isotopes, in deterministic order — the slots the
    /// enumerator assigns one combination axis per (spec.md §4.2.1).
    #[inline]
    pub fn non_lightest_isotopes(&self) -> &[Isotope] {
        if self.isotopes.is_empty() {
            &[]
        } else {
            &self.isotopes[1..]
        }
    }

    pub fn isotope_by_mass_number(&self, mass_number: u16) -> Option<&Isotope> {
        self.isotopes
            .iter()
            .find(|iso| iso.mass_number == mass_number)
    }

    pub fn isotope_by_mass_delta(&self, mass_delta: u16) -> Option<&Isotope> {
        self.isotopes
            .iter()
            .find(|iso| iso.mass_delta == mass_delta)
    }

    /// Rescale relative intensities so they sum to exactly 1 (spec.md §9
    /// design note (d): renormalize at load rather than carry the excess).
    pub(crate) fn renormalize(&mut self) {
        let total: f64 = self.isotopes.iter().map(|i| i.relative_intensity).sum();
        if total > 0.0 {
            for iso in self.isotopes.iter_mut() {
                iso.relative_intensity /= total;
            }
        }
    }

    pub(crate) fn abundance_sum(&self) -> f64 {
        self.isotopes.iter().map(|i| i.relative_intensity).sum()
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Element({}, {} isotopes)",
            self.symbol,
            self.isotopes.len()
        )
    }
}

/// Error raised while validating or loading an [`IsotopeTable`] (spec.md
/// §7: malformed natural-abundance data is fatal).
#[derive(Debug, Clone, PartialEq)]
pub enum TableError {
    UnknownElement(String),
    UnknownIsotope(String),
    NegativeIntensity(String),
    AbundanceSumOutOfTolerance { element: String, sum: f64 },
    EmptyElement(String),
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TableError::UnknownElement(sym) => write!(f, "unknown element {sym:?}"),
            TableError::UnknownIsotope(name) => write!(f, "unknown isotope {name:?}"),
            TableError::NegativeIntensity(sym) => {
                write!(f, "element {sym:?} has a negative relative intensity")
            }
            TableError::AbundanceSumOutOfTolerance { element, sum } => write!(
                f,
                "element {element:?} relative intensities sum to {sum}, not 1 within tolerance"
            ),
            TableError::EmptyElement(sym) => write!(f, "element {sym:?} has no isotopes"),
        }
    }
}

impl std::error::Error for TableError {}

/// The tolerance spec.md §3 requires natural abundances to be checked
/// against before renormalization is allowed to paper over the gap.
const LOAD_TOLERANCE: f64 = 1e-2;

/// Lookup service over known elements and their isotopes (spec.md C1,
/// §4.1). Provides `lightest`, `isotopes_of`, `mass_delta`,
/// `relative_intensity`, `isotope_count`; unknown element/isotope lookups
/// are fatal per spec.md §7.
#[derive(Debug, Clone, Default)]
pub struct IsotopeTable {
    elements: HashMap<String, Element, RandomState>,
}

impl IsotopeTable {
    pub fn new() -> IsotopeTable {
        IsotopeTable::default()
    }

    /// Insert or replace an element, renormalizing its intensities and
    /// checking the pre-renormalization sum is within tolerance of 1.
    pub fn add(&mut self, mut element: Element) -> Result<(), TableError> {
        if element.isotopes().is_empty() {
            return Err(TableError::EmptyElement(element.symbol));
        }
        for iso in element.isotopes() {
            if iso.relative_intensity < 0.0 {
                return Err(TableError::NegativeIntensity(element.symbol));
            }
        }
        let sum = element.abundance_sum();
        if (sum - 1.0).abs() > LOAD_TOLERANCE {
            return Err(TableError::AbundanceSumOutOfTolerance {
                element: element.symbol,
                sum,
            });
        }
        element.renormalize();
        self.elements.insert(element.symbol.clone(), element);
        Ok(())
    }

    pub fn get(&self, symbol: &str) -> Result<&Element, TableError> {
        self.elements
            .get(symbol)
            .ok_or_else(|| TableError::UnknownElement(symbol.to_string()))
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.elements.contains_key(symbol)
    }

    pub fn lightest(&self, symbol: &str) -> Result<&Isotope, TableError> {
        Ok(self.get(symbol)?.lightest())
    }

    pub fn isotopes_of(&self, symbol: &str) -> Result<&[Isotope], TableError> {
        Ok(self.get(symbol)?.isotopes())
    }

    pub fn isotope_count(&self, symbol: &str) -> Result<usize, TableError> {
        Ok(self.get(symbol)?.isotope_count())
    }

    pub fn mass_delta(&self, symbol: &str, mass_number: u16) -> Result<u16, TableError> {
        let element = self.get(symbol)?;
        element
            .isotope_by_mass_number(mass_number)
            .map(|iso| iso.mass_delta)
            .ok_or_else(|| TableError::UnknownIsotope(isotope_name(symbol, mass_number)))
    }

    pub fn relative_intensity(&self, symbol: &str, mass_number: u16) -> Result<f64, TableError> {
        let element = self.get(symbol)?;
        element
            .isotope_by_mass_number(mass_number)
            .map(|iso| iso.relative_intensity)
            .ok_or_else(|| TableError::UnknownIsotope(isotope_name(symbol, mass_number)))
    }
}

impl ops::Index<&str> for IsotopeTable {
    type Output = Element;

    #[inline]
    fn index(&self, symbol: &str) -> &Self::Output {
        &self.elements[symbol]
    }
}

/// Format an isotope name by concatenating an element symbol and an
/// absolute mass number, e.g. `("C", 13) -> "C13"`.
pub fn isotope_name(symbol: &str, mass_number: u16) -> String {
    format!("{symbol}{mass_number}")
}

/// Split an isotope name such as `"C13"` into its element symbol and mass
/// number. The symbol is one uppercase letter optionally followed by one
/// lowercase letter; everything after that must be the decimal mass number.
pub fn parse_isotope_name(name: &str) -> Option<(&str, u16)> {
    let mut chars = name.char_indices();
    let (_, first) = chars.next()?;
    if !first.is_ascii_uppercase() {
        return None;
    }
    let mut split_at = first.len_utf8();
    if let Some((idx, second)) = chars.next() {
        if second.is_ascii_lowercase() {
            split_at = idx + second.len_utf8();
        }
    }
    let (symbol, rest) = name.split_at(split_at);
    if rest.is_empty() {
        return None;
    }
    let mass_number: u16 = rest.parse().ok()?;
    Some((symbol, mass_number))
}
