//! External collaborator contracts (spec.md §6): plain-text formats for a
//! compound's element formula, a natural-abundance table, a purity table,
//! and a measurement table. None of this feeds back into the core's
//! invariants — callers build `Compound`/`IsotopeTable`/`TracerPurity`/
//! `MeasurementVector` values from what these parsers return, and those
//! types re-validate on their own terms.

use std::fmt;

use crate::composition::ElementCounts;
use crate::element::Element;
use crate::purity::TracerPurity;

#[derive(Debug, Clone, PartialEq)]
pub enum IoError {
    InvalidFormula { formula: String, position: usize },
    MalformedTableLine(String),
    IsotopeCountMismatch { names: usize, values: usize },
    InvalidNumber(String),
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            IoError::InvalidFormula { formula, position } => {
                write!(f, "invalid formula {formula:?} at byte {position}")
            }
            IoError::MalformedTableLine(line) => write!(f, "malformed table line: {line:?}"),
            IoError::IsotopeCountMismatch { names, values } => write!(
                f,
                "isotope name count ({names}) does not match value count ({values})"
            ),
            IoError::InvalidNumber(token) => write!(f, "invalid number {token:?}"),
        }
    }
}

impl std::error::Error for IoError {}

#[derive(Default, PartialEq)]
enum FormulaState {
    #[default]
    Element,
    Count,
}

/// Parse a simple chemical formula (`"C6H12O6"`) into element counts. An
/// element symbol is one uppercase letter optionally followed by one
/// lowercase letter; a missing count defaults to 1 (spec.md §6: a compound
/// record provides "an unordered mapping element -> count").
pub fn parse_formula(formula: &str) -> Result<ElementCounts, IoError> {
    let mut counts = ElementCounts::new();
    let mut state = FormulaState::Element;
    let mut symbol_start = 0;
    let mut symbol_end = 0;
    let mut count_start = 0;

    let bytes = formula.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let c = formula[i..].chars().next().unwrap();
        match state {
            FormulaState::Element => {
                if !c.is_ascii_uppercase() {
                    return Err(IoError::InvalidFormula {
                        formula: formula.to_string(),
                        position: i,
                    });
                }
                symbol_start = i;
                i += c.len_utf8();
                symbol_end = i;
                if let Some(next) = formula[i..].chars().next() {
                    if next.is_ascii_lowercase() {
                        symbol_end += next.len_utf8();
                        i += next.len_utf8();
                    }
                }
                count_start = i;
                state = FormulaState::Count;
            }
            FormulaState::Count => {
                if c.is_ascii_digit() {
                    i += c.len_utf8();
                    continue;
                }
                let symbol = &formula[symbol_start..symbol_end];
                let count = if count_start == i {
                    1
                } else {
                    formula[count_start..i]
                        .parse()
                        .map_err(|_| IoError::InvalidFormula {
                            formula: formula.to_string(),
                            position: count_start,
                        })?
                };
                counts.inc(symbol, count);
                state = FormulaState::Element;
            }
        }
    }
    if state == FormulaState::Count {
        let symbol = &formula[symbol_start..symbol_end];
        let count = if count_start == bytes.len() {
            1
        } else {
            formula[count_start..]
                .parse()
                .map_err(|_| IoError::InvalidFormula {
                    formula: formula.to_string(),
                    position: count_start,
                })?
        };
        counts.inc(symbol, count);
    } else if bytes.is_empty() {
        return Err(IoError::InvalidFormula {
            formula: formula.to_string(),
            position: 0,
        });
    }
    Ok(counts)
}

fn parse_numbers(tokens: &str) -> Result<Vec<f64>, IoError> {
    tokens
        .split_whitespace()
        .map(|tok| tok.parse::<f64>().map_err(|_| IoError::InvalidNumber(tok.to_string())))
        .collect()
}

/// One line of a natural-abundance table (spec.md §6): whitespace-separated
/// isotope names, a colon, then whitespace-separated intensities in the
/// same order. The first isotope listed is the lightest.
pub fn parse_abundance_line(line: &str) -> Result<Element, IoError> {
    let (names_part, values_part) = line
        .split_once(':')
        .ok_or_else(|| IoError::MalformedTableLine(line.to_string()))?;
    let names: Vec<&str> = names_part.split_whitespace().collect();
    let values = parse_numbers(values_part)?;
    if names.len() != values.len() || names.is_empty() {
        return Err(IoError::IsotopeCountMismatch {
            names: names.len(),
            values: values.len(),
        });
    }
    let mut symbol = None;
    let mut isotopes = Vec::with_capacity(names.len());
    for (name, intensity) in names.iter().zip(values) {
        let (sym, mass_number) = crate::element::parse_isotope_name(name)
            .ok_or_else(|| IoError::MalformedTableLine(line.to_string()))?;
        if let Some(existing) = symbol {
            if existing != sym {
                return Err(IoError::MalformedTableLine(line.to_string()));
            }
        } else {
            symbol = Some(sym);
        }
        isotopes.push((mass_number, intensity));
    }
    Ok(Element::new(symbol.unwrap(), &isotopes))
}

/// One line of a purity table (spec.md §6): same `names : values` grammar as
/// an abundance line, interpreted as tracer-isotope purity fractions.
pub fn parse_purity_line(line: &str) -> Result<TracerPurity, IoError> {
    let (names_part, values_part) = line
        .split_once(':')
        .ok_or_else(|| IoError::MalformedTableLine(line.to_string()))?;
    let names: Vec<&str> = names_part.split_whitespace().collect();
    let values = parse_numbers(values_part)?;
    if names.len() != values.len() || names.is_empty() {
        return Err(IoError::IsotopeCountMismatch {
            names: names.len(),
            values: values.len(),
        });
    }
    let mut symbol = None;
    let mut fractions = Vec::with_capacity(names.len());
    for (name, fraction) in names.iter().zip(values) {
        let (sym, mass_number) = crate::element::parse_isotope_name(name)
            .ok_or_else(|| IoError::MalformedTableLine(line.to_string()))?;
        if let Some(existing) = symbol {
            if existing != sym {
                return Err(IoError::MalformedTableLine(line.to_string()));
            }
        } else {
            symbol = Some(sym);
        }
        fractions.push((mass_number, fraction));
    }
    Ok(TracerPurity::new(symbol.unwrap(), fractions))
}

/// One line of a measurement table (spec.md §6): `"name N [n] : v1 v2 ..."`.
/// A missing `n` defaults to `N` (the isotopologue shorthand).
pub fn parse_measurement_line(line: &str) -> Result<(String, u16, u16, Vec<f64>), IoError> {
    let (prefix_part, values_part) = line
        .split_once(':')
        .ok_or_else(|| IoError::MalformedTableLine(line.to_string()))?;
    let prefix: Vec<&str> = prefix_part.split_whitespace().collect();
    let values = parse_numbers(values_part)?;
    match prefix.as_slice() {
        [name, n] => {
            let n: u16 = n
                .parse()
                .map_err(|_| IoError::InvalidNumber(n.to_string()))?;
            Ok((name.to_string(), n, n, values))
        }
        [name, big_n, small_n] => {
            let big_n: u16 = big_n
                .parse()
                .map_err(|_| IoError::InvalidNumber(big_n.to_string()))?;
            let small_n: u16 = small_n
                .parse()
                .map_err(|_| IoError::InvalidNumber(small_n.to_string()))?;
            Ok((name.to_string(), big_n, small_n, values))
        }
        _ => Err(IoError::MalformedTableLine(line.to_string())),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_formula_glucose() {
        let counts = parse_formula("C6H12O6").unwrap();
        assert_eq!(counts.get("C"), 6);
        assert_eq!(counts.get("H"), 12);
        assert_eq!(counts.get("O"), 6);
    }

    #[test]
    fn test_parse_formula_defaults_count_to_one() {
        let counts = parse_formula("NaCl").unwrap();
        assert_eq!(counts.get("Na"), 1);
        assert_eq!(counts.get("Cl"), 1);
    }

    #[test]
    fn test_parse_formula_rejects_lowercase_start() {
        assert!(parse_formula("c6").is_err());
    }

    #[test]
    fn test_parse_abundance_line() {
        let element = parse_abundance_line("C12 C13 : 0.9893 0.0107").unwrap();
        assert_eq!(element.symbol, "C");
        assert_eq!(element.lightest().mass_number, 12);
    }

    #[test]
    fn test_parse_purity_line() {
        let purity = parse_purity_line("C13 C12 : 0.99 0.01").unwrap();
        assert_eq!(purity.element, "C");
        assert_eq!(purity.fraction(13), 0.99);
    }

    #[test]
    fn test_parse_measurement_line_isotopologue_shorthand() {
        let (name, n, small_n, values) = parse_measurement_line("glucose 3 : 10 20 30").unwrap();
        assert_eq!(name, "glucose");
        assert_eq!(n, 3);
        assert_eq!(small_n, 3);
        assert_eq!(values, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_parse_measurement_line_with_fragment_offset() {
        let (_, n, small_n, _) = parse_measurement_line("glucose 5 3 : 10").unwrap();
        assert_eq!(n, 5);
        assert_eq!(small_n, 3);
    }
}
