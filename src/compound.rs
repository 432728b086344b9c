//! Compound description: a precursor/fragment pair, each with a tracer
//! descriptor and a non-tracer element-count map (spec.md §3).

use std::fmt;

use crate::composition::ElementCounts;
use crate::element::IsotopeTable;

/// The deliberately-labeled isotope species and how many of those atoms
/// exist on one side of a compound.
#[derive(Debug, Clone, PartialEq)]
pub struct Tracer {
    pub element: String,
    pub isotope_mass_number: u16,
    pub count: u32,
}

/// One side (precursor or fragment) of a compound: its tracer atoms plus
/// every other element present.
#[derive(Debug, Clone, PartialEq)]
pub struct Side {
    pub tracer: Tracer,
    pub elements: ElementCounts,
}

impl Side {
    pub fn new(tracer: Tracer, elements: ElementCounts) -> Side {
        Side { tracer, elements }
    }
}

/// A precursor/fragment pair, as measured in a tandem MS experiment
/// (spec.md §3, glossary).
#[derive(Debug, Clone, PartialEq)]
pub struct Compound {
    pub precursor: Side,
    pub fragment: Side,
}

/// Fatal validation failures for a [`Compound`] (spec.md §7).
#[derive(Debug, Clone, PartialEq)]
pub enum CompoundError {
    TracerElementMismatch {
        precursor: String,
        fragment: String,
    },
    TracerIsotopeMismatch {
        precursor: u16,
        fragment: u16,
    },
    TracerElementInert(String),
    TracerCountDecreases {
        precursor: u32,
        fragment: u32,
    },
    ElementSetMismatch {
        only_in_precursor: Vec<String>,
        only_in_fragment: Vec<String>,
    },
    ElementCountDecreases {
        symbol: String,
        precursor: u32,
        fragment: u32,
    },
    UnknownElement(crate::element::TableError),
}

impl fmt::Display for CompoundError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CompoundError::TracerElementMismatch { precursor, fragment } => write!(
                f,
                "tracer element differs between precursor ({precursor}) and fragment ({fragment})"
            ),
            CompoundError::TracerIsotopeMismatch { precursor, fragment } => write!(
                f,
                "tracer isotope differs between precursor ({precursor}) and fragment ({fragment})"
            ),
            CompoundError::TracerElementInert(symbol) => write!(
                f,
                "tracer element {symbol} has only one known isotope and cannot be labeled"
            ),
            CompoundError::TracerCountDecreases { precursor, fragment } => write!(
                f,
                "tracer count increases across fragmentation: precursor {precursor} < fragment {fragment}"
            ),
            CompoundError::ElementSetMismatch {
                only_in_precursor,
                only_in_fragment,
            } => write!(
                f,
                "element set mismatch between precursor and fragment: only in precursor {only_in_precursor:?}, only in fragment {only_in_fragment:?}"
            ),
            CompoundError::ElementCountDecreases { symbol, precursor, fragment } => write!(
                f,
                "element {symbol} count increases across fragmentation: precursor {precursor} < fragment {fragment}"
            ),
            CompoundError::UnknownElement(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for CompoundError {}

impl From<crate::element::TableError> for CompoundError {
    fn from(err: crate::element::TableError) -> Self {
        CompoundError::UnknownElement(err)
    }
}

impl Compound {
    /// Validate the invariants spec.md §3 lists for a compound: matching
    /// tracer identity, a non-inert tracer element, non-increasing atom
    /// counts from precursor to fragment (fragmentation only removes
    /// atoms), and an identical non-tracer element set on both sides.
    pub fn validate(&self, table: &IsotopeTable) -> Result<(), CompoundError> {
        let p = &self.precursor.tracer;
        let f = &self.fragment.tracer;
        if p.element != f.element {
            return Err(CompoundError::TracerElementMismatch {
                precursor: p.element.clone(),
                fragment: f.element.clone(),
            });
        }
        if p.isotope_mass_number != f.isotope_mass_number {
            return Err(CompoundError::TracerIsotopeMismatch {
                precursor: p.isotope_mass_number,
                fragment: f.isotope_mass_number,
            });
        }
        let tracer_element = table.get(&p.element)?;
        if tracer_element.is_inert() {
            return Err(CompoundError::TracerElementInert(p.element.clone()));
        }
        if p.count < f.count {
            return Err(CompoundError::TracerCountDecreases {
                precursor: p.count,
                fragment: f.count,
            });
        }

        let mut only_in_precursor = Vec::new();
        let mut only_in_fragment = Vec::new();
        for symbol in self.precursor.elements.symbols() {
            if !self.fragment_has_key(symbol) {
                only_in_precursor.push(symbol.to_string());
            }
        }
        for symbol in self.fragment.elements.symbols() {
            if !self.precursor_has_key(symbol) {
                only_in_fragment.push(symbol.to_string());
            }
        }
        if !only_in_precursor.is_empty() || !only_in_fragment.is_empty() {
            only_in_precursor.sort();
            only_in_fragment.sort();
            return Err(CompoundError::ElementSetMismatch {
                only_in_precursor,
                only_in_fragment,
            });
        }

        for symbol in self.precursor.elements.symbols() {
            let pc = self.precursor.elements.get(symbol);
            let fc = self.fragment.elements.get(symbol);
            if pc < fc {
                return Err(CompoundError::ElementCountDecreases {
                    symbol: symbol.to_string(),
                    precursor: pc,
                    fragment: fc,
                });
            }
        }

        Ok(())
    }

    fn fragment_has_key(&self, symbol: &str) -> bool {
        self.fragment.elements.symbols().any(|s| s == symbol)
    }

    fn precursor_has_key(&self, symbol: &str) -> bool {
        self.precursor.elements.symbols().any(|s| s == symbol)
    }

    /// A compound is an isotopologue when every element, including the
    /// tracer, has equal precursor and fragment counts (no fragmentation;
    /// spec.md glossary).
    pub fn is_isotopologue(&self) -> bool {
        if self.precursor.tracer.count != self.fragment.tracer.count {
            return false;
        }
        self.precursor
            .elements
            .symbols()
            .all(|symbol| self.precursor.elements.get(symbol) == self.fragment.elements.get(symbol))
    }
}

#[cfg(test)]
mod test {
    use super::*;
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
    fn test_glucose_validates_and_is_isotopologue() {
        let compound = glucose();
        compound.validate(&DEFAULT_TABLE).unwrap();
        assert!(compound.is_isotopologue());
    }

    #[test]
    fn test_tracer_element_mismatch_is_fatal() {
        let mut compound = glucose();
        compound.fragment.tracer.element = "N".into();
        let err = compound.validate(&DEFAULT_TABLE).unwrap_err();
        assert!(matches!(err, CompoundError::TracerElementMismatch { .. }));
    }

    #[test]
    fn test_element_set_mismatch_is_fatal() {
        let mut compound = glucose();
        compound.fragment.elements.set("N", 1);
        let err = compound.validate(&DEFAULT_TABLE).unwrap_err();
        assert!(matches!(err, CompoundError::ElementSetMismatch { .. }));
    }

    #[test]
    fn test_fragmentation_reduces_counts() {
        let mut compound = glucose();
        compound.fragment.tracer.count = 3;
        compound.fragment.elements.set("H", 6);
        compound.fragment.elements.set("O", 3);
        compound.validate(&DEFAULT_TABLE).unwrap();
        assert!(!compound.is_isotopologue());
    }

    #[test]
    fn test_inert_tracer_element_is_fatal() {
        let mut compound = glucose();
        compound.precursor.tracer.element = "P".into();
        compound.fragment.tracer.element = "P".into();
        let err = compound.validate(&DEFAULT_TABLE).unwrap_err();
        assert!(matches!(err, CompoundError::TracerElementInert(_)));
    }
}
