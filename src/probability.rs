//! Probability engine (spec.md C3, §4.3): assigns each [`RawCombination`]
//! from [`crate::enumerate`] a probability mass, combining a multinomial
//! placement of natural-abundance isotopes across the precursor pool with
//! the hypergeometric coupling that links the precursor's labeling to
//! what a sampled fragment actually carries.

use std::cell::RefCell;
use std::collections::HashMap;

use fnv::FnvBuildHasher as RandomState;

use crate::enumerate::{ElementContribution, RawCombination, TracerContribution};

/// Binomial coefficients are recomputed often across combinations that
/// share the same `(n, k)`; cache them per solver call (spec.md §5: caches
/// are local to one call, never process-wide).
#[derive(Default)]
pub struct BinomialCache {
    cache: RefCell<HashMap<(u32, u32), f64, RandomState>>,
}

impl BinomialCache {
    pub fn new() -> BinomialCache {
        BinomialCache::default()
    }

    pub fn get(&self, n: u32, k: u32) -> f64 {
        if k > n {
            return 0.0;
        }
        if let Some(value) = self.cache.borrow().get(&(n, k)) {
            return *value;
        }
        let k = k.min(n - k);
        let mut value = 1.0;
        for i in 0..k {
            value *= (n - i) as f64 / (i + 1) as f64;
        }
        self.cache.borrow_mut().insert((n, k), value);
        value
    }
}

/// `P! / (N_1! * N_2! * ... * (P - ΣN_i)!)`, computed via the standard
/// chained-binomial identity so no single factorial needs to be formed.
fn multinomial_coefficient(cache: &BinomialCache, total: u32, counts: &[u32]) -> f64 {
    let mut remaining = total;
    let mut result = 1.0;
    for &count in counts {
        result *= cache.get(remaining, count);
        remaining -= count;
    }
    result
}

/// The running hypergeometric-coupling product of spec.md §4.3: draws are
/// processed category by category (lightest first, then each non-lightest
/// isotope in slot order), with the denominator pool decrementing once per
/// draw regardless of which category it belongs to. The product is
/// independent of category order — it always evaluates to
/// `Π_i (N_i)_{(n_i)} / (P)_{(ΣF_i)}`.
fn hyper_factor(precursor_pool: u32, categories: &[(u32, u32)]) -> f64 {
    let mut pool = precursor_pool as f64;
    let mut result = 1.0;
    for &(big_n, small_n) in categories {
        for s in 0..small_n {
            if pool <= 0.0 {
                return 0.0;
            }
            result *= (big_n as f64 - s as f64) / pool;
            pool -= 1.0;
        }
    }
    result
}

/// Probability of one element's (or element-like slot group's) isotope
/// realization, per spec.md §4.3:
///
/// `C(P;{N_i}) · Π p_i^{N_i} · p_0^{N_0} · C(F;{n_i}) · hyper(...)`
///
/// where category `0` is the implicit lightest/reference slot and its
/// probability `p_0 = 1 - Σp_i` is folded in explicitly so the total is an
/// exact probability mass function (the sum over all valid `{N_i}` is 1).
fn slot_group_probability(
    cache: &BinomialCache,
    precursor_count: u32,
    fragment_count: u32,
    isotopes: &[(f64, u16, u16)],
) -> f64 {
    if precursor_count == 0 {
        return 1.0;
    }
    let sum_n: u32 = isotopes.iter().map(|(_, n, _)| u32::from(*n)).sum();
    let sum_small_n: u32 = isotopes.iter().map(|(_, _, n)| u32::from(*n)).sum();
    let reference_n = precursor_count - sum_n;
    let reference_small_n = fragment_count - sum_small_n;
    let reference_p = (1.0 - isotopes.iter().map(|(p, _, _)| p).sum::<f64>()).max(0.0);

    let precursor_counts: Vec<u32> = isotopes.iter().map(|(_, n, _)| u32::from(*n)).collect();
    let precursor_multinomial = multinomial_coefficient(cache, precursor_count, &precursor_counts);
    let precursor_weight = isotopes
        .iter()
        .map(|(p, n, _)| p.powi(i32::from(*n)))
        .product::<f64>()
        * reference_p.powi(reference_n as i32);

    let fragment_counts: Vec<u32> = isotopes.iter().map(|(_, _, n)| u32::from(*n)).collect();
    let fragment_multinomial = multinomial_coefficient(cache, fragment_count, &fragment_counts);

    let mut categories = Vec::with_capacity(isotopes.len() + 1);
    categories.push((reference_n, reference_small_n));
    for (_, n, small_n) in isotopes {
        categories.push((u32::from(*n), u32::from(*small_n)));
    }
    let hyper = hyper_factor(precursor_count, &categories);

    precursor_multinomial * precursor_weight * fragment_multinomial * hyper
}

fn element_contribution_probability(cache: &BinomialCache, contrib: &ElementContribution) -> f64 {
    slot_group_probability(
        cache,
        contrib.precursor_count,
        contrib.fragment_count,
        &contrib.isotopes,
    )
}

/// One combination record ready for the solver: the `(N*, n*)` column it
/// belongs to, the `(M, m)` row it lands in, and its probability mass.
#[derive(Debug, Clone, Copy)]
pub struct CombinationRecord {
    pub column: (u16, u16),
    pub row: (u32, u32),
    pub probability: f64,
}

/// Assign probabilities to every enumerated combination (spec.md C3). The
/// tracer slot's own contribution is `1` (deterministic labeling) unless a
/// purity table is in effect, in which case it is the same multinomial /
/// hypergeometric probability as any other slot group, evaluated over the
/// tracer-element isotope distribution (spec.md §4.2.5, §4.3).
pub fn assign_probabilities(combinations: &[RawCombination]) -> Vec<CombinationRecord> {
    let cache = BinomialCache::new();
    combinations
        .iter()
        .map(|combo| {
            let mut probability = 1.0;
            for contrib in &combo.non_tracer {
                probability *= element_contribution_probability(&cache, contrib);
            }
            if let Some(contrib) = &combo.natural_abundance_on_tracer {
                probability *= element_contribution_probability(&cache, contrib);
            }
            probability *= match &combo.tracer {
                TracerContribution::Deterministic { .. } => 1.0,
                TracerContribution::Purity {
                    precursor_count,
                    fragment_count,
                    isotopes,
                    ..
                } => slot_group_probability(&cache, *precursor_count, *fragment_count, isotopes),
            };
            CombinationRecord {
                column: combo.tracer_slot,
                row: (combo.total_precursor_offset, combo.total_fragment_offset),
                probability,
            }
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_binomial_cache_matches_pascals_triangle() {
        let cache = BinomialCache::new();
        assert_eq!(cache.get(5, 0), 1.0);
        assert_eq!(cache.get(5, 1), 5.0);
        assert_eq!(cache.get(5, 2), 10.0);
        assert_eq!(cache.get(5, 5), 1.0);
        assert_eq!(cache.get(2, 3), 0.0);
    }

    #[test]
    fn test_slot_group_probability_single_isotope_sums_to_one() {
        let cache = BinomialCache::new();
        // Oxygen-like element, one non-lightest isotope at natural abundance.
        let p = 0.00205;
        let total: f64 = (0..=6)
            .map(|n| {
                (0..=n)
                    .map(|small_n| slot_group_probability(&cache, 6, 6, &[(p, n, small_n)]))
                    .sum::<f64>()
            })
            .sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_deterministic_tracer_contributes_no_weight() {
        let combos = vec![crate::enumerate::RawCombination {
            tracer_slot: (2, 2),
            non_tracer: Vec::new(),
            natural_abundance_on_tracer: None,
            tracer: TracerContribution::Deterministic { mass_delta: 1 },
            total_precursor_offset: 2,
            total_fragment_offset: 2,
        }];
        let records = assign_probabilities(&combos);
        assert_eq!(records.len(), 1);
        assert!((records[0].probability - 1.0).abs() < 1e-12);
    }
}
