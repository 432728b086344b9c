//! A small element-symbol-to-count map, used for the non-tracer elements of
//! one side of a [`crate::compound::Compound`] (spec.md §3). Grounded on the
//! teacher crate's `composition_map.rs`: `Index`/`IndexMut` by `&str`, `get`,
//! `inc` in the same style. The teacher's three-way `Vec`/`Map`/tagged-enum
//! storage trade-off (`composition_list.rs`, `abstract_composition.rs`,
//! `props.rs`) is not carried — see DESIGN.md.

use std::collections::hash_map::{HashMap, Iter};
use std::iter::FromIterator;
use std::ops::{Index, IndexMut};

use fnv::FnvBuildHasher as RandomState;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ElementCounts {
    counts: HashMap<String, u32, RandomState>,
}

impl ElementCounts {
    pub fn new() -> ElementCounts {
        ElementCounts::default()
    }

    #[inline]
    pub fn get(&self, symbol: &str) -> u32 {
        *self.counts.get(symbol).unwrap_or(&0)
    }

    #[inline]
    pub fn set(&mut self, symbol: impl Into<String>, count: u32) {
        self.counts.insert(symbol.into(), count);
    }

    #[inline]
    pub fn inc(&mut self, symbol: impl Into<String>, count: u32) {
        let symbol = symbol.into();
        let entry = self.counts.entry(symbol).or_insert(0);
        *entry += count;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> Iter<String, u32> {
        self.counts.iter()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(|s| s.as_str())
    }
}

impl Index<&str> for ElementCounts {
    type Output = u32;

    #[inline]
    fn index(&self, symbol: &str) -> &u32 {
        self.counts.get(symbol).unwrap_or(&0)
    }
}

impl IndexMut<&str> for ElementCounts {
    #[inline]
    fn index_mut(&mut self, symbol: &str) -> &mut u32 {
        self.counts.entry(symbol.to_string()).or_insert(0)
    }
}

impl<'a> FromIterator<(&'a str, u32)> for ElementCounts {
    fn from_iter<T: IntoIterator<Item = (&'a str, u32)>>(iter: T) -> Self {
        let mut counts = ElementCounts::new();
        for (symbol, count) in iter {
            counts.inc(symbol, count);
        }
        counts
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_get_set_inc() {
        let mut counts = ElementCounts::new();
        assert_eq!(counts.get("H"), 0);
        counts.set("H", 12);
        assert_eq!(counts.get("H"), 12);
        counts.inc("H", 3);
        assert_eq!(counts.get("H"), 15);
    }

    #[test]
    fn test_index() {
        let counts: ElementCounts = [("C", 6u32), ("O", 6)].into_iter().collect();
        assert_eq!(counts["C"], 6);
        assert_eq!(counts["H"], 0);
    }

}
