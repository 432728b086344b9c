//! Combination enumerator (spec.md C2, §4.2): produces every valid
//! `(N, n)` distribution across precursor/fragment atoms, subject to
//! conservation and tracer-mass-cap constraints, plus the optional purity
//! expansion (§4.2.5). Output feeds [`crate::probability`] (C3).

use crate::compound::Compound;
use crate::element::IsotopeTable;
use crate::purity::TracerPurity;

/// One non-lightest isotope axis to fold into a cross-isotope merge:
/// its natural (or purity) weight, its mass delta, and its own valid
/// `(N, n)` pairs (spec.md §4.2.1).
#[derive(Debug, Clone)]
struct IsotopeAxis {
    relative_intensity: f64,
    mass_delta: u16,
    pairs: Vec<(u16, u16)>,
}

/// One joint outcome of folding several isotope axes together: the
/// `(relative_intensity, N_i, n_i)` triples in axis order, plus the
/// summed mass contribution on each side (spec.md §4.2.3).
#[derive(Debug, Clone)]
struct AxisRecord {
    contributions: Vec<(f64, u16, u16)>,
    precursor_mass: u32,
    fragment_mass: u32,
}

/// All `(N, n)` pairs for a single isotope satisfying the conservation
/// constraints of spec.md §4.2.1 (fragment at most as labeled as
/// precursor; the atoms lost in fragmentation absorb at most `P - F`
/// labeled atoms).
fn conservation_pairs(precursor_count: u32, fragment_count: u32) -> Vec<(u16, u16)> {
    let mut out = Vec::new();
    for big_n in 0..=precursor_count {
        let small_n_max = fragment_count.min(big_n);
        for small_n in 0..=small_n_max {
            if (precursor_count - fragment_count) + small_n < big_n {
                continue;
            }
            out.push((big_n as u16, small_n as u16));
        }
    }
    out
}

/// Per-isotope pair generation (spec.md §4.2.1), additionally bounded by
/// the tracer mass caps on each side.
fn per_isotope_pairs(
    precursor_count: u32,
    fragment_count: u32,
    mass_delta: u16,
    precursor_cap: u32,
    fragment_cap: u32,
) -> Vec<(u16, u16)> {
    conservation_pairs(precursor_count, fragment_count)
        .into_iter()
        .filter(|&(big_n, small_n)| {
            u32::from(mass_delta) * u32::from(big_n) <= precursor_cap
                && u32::from(mass_delta) * u32::from(small_n) <= fragment_cap
        })
        .collect()
}

/// Tracer pair generation (spec.md §4.2.2): no mass cap, since this *is*
/// the tracer.
fn tracer_pairs(tracer_precursor_count: u32, tracer_fragment_count: u32) -> Vec<(u16, u16)> {
    conservation_pairs(tracer_precursor_count, tracer_fragment_count)
}

/// Fold a set of isotope axes into joint records, filtering after every
/// stage (spec.md §4.2.3/§4.2.4, §5 streaming guidance): cumulative counts
/// must stay within `(precursor_count, fragment_count)` under the same
/// conservation rule, and cumulative mass within `(precursor_cap,
/// fragment_cap)`.
fn merge_isotope_axes(
    precursor_count: u32,
    fragment_count: u32,
    precursor_cap: u32,
    fragment_cap: u32,
    axes: &[IsotopeAxis],
) -> Vec<AxisRecord> {
    let mut records = vec![AxisRecord {
        contributions: Vec::with_capacity(axes.len()),
        precursor_mass: 0,
        fragment_mass: 0,
    }];

    for axis in axes {
        let mut next = Vec::new();
        for rec in &records {
            let sum_n: u32 = rec.contributions.iter().map(|(_, n, _)| *n as u32).sum();
            let sum_small_n: u32 = rec.contributions.iter().map(|(_, _, n)| *n as u32).sum();
            for &(n, small_n) in &axis.pairs {
                let new_sum_n = sum_n + n as u32;
                let new_sum_small_n = sum_small_n + small_n as u32;
                if new_sum_n > precursor_count || new_sum_small_n > fragment_count {
                    continue;
                }
                if (precursor_count - fragment_count) + new_sum_small_n < new_sum_n {
                    continue;
                }
                let precursor_mass = rec.precursor_mass + u32::from(axis.mass_delta) * u32::from(n);
                let fragment_mass =
                    rec.fragment_mass + u32::from(axis.mass_delta) * u32::from(small_n);
                if precursor_mass > precursor_cap || fragment_mass > fragment_cap {
                    continue;
                }
                let mut contributions = rec.contributions.clone();
                contributions.push((axis.relative_intensity, n, small_n));
                next.push(AxisRecord {
                    contributions,
                    precursor_mass,
                    fragment_mass,
                });
            }
        }
        records = next;
    }

    records
}

/// One non-tracer element's contribution to a combination: its own atom
/// pool size and the non-lightest isotope counts realized in this record.
#[derive(Debug, Clone)]
pub struct ElementContribution {
    pub element: String,
    pub precursor_count: u32,
    pub fragment_count: u32,
    /// `(relative_intensity, N_i, n_i)` per non-lightest isotope realized.
    pub isotopes: Vec<(f64, u16, u16)>,
}

/// How the tracer slot's `(N*, n*)` value contributes probability:
/// deterministic (purity off) or split across tracer-element isotopes
/// by purity fraction (spec.md §4.2.5, §4.3).
#[derive(Debug, Clone)]
pub enum TracerContribution {
    Deterministic {
        mass_delta: u16,
    },
    Purity {
        precursor_count: u32,
        fragment_count: u32,
        /// `(purity fraction, N_i, n_i)` per non-lightest tracer-element
        /// isotope realized in this purity-expanded record.
        isotopes: Vec<(f64, u16, u16)>,
        precursor_mass: u32,
        fragment_mass: u32,
    },
}

/// One enumerated combination, ready for probability assignment. Mirrors
/// spec.md §3's "combination record": the tracer slot indexes the column
/// this record contributes to, and the total offsets index the row.
#[derive(Debug, Clone)]
pub struct RawCombination {
    pub tracer_slot: (u16, u16),
    pub non_tracer: Vec<ElementContribution>,
    pub natural_abundance_on_tracer: Option<ElementContribution>,
    pub tracer: TracerContribution,
    pub total_precursor_offset: u32,
    pub total_fragment_offset: u32,
}

#[derive(Debug, Clone)]
pub enum EnumerateError {
    UnknownElement(crate::element::TableError),
}

impl std::fmt::Display for EnumerateError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            EnumerateError::UnknownElement(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for EnumerateError {}

impl From<crate::element::TableError> for EnumerateError {
    fn from(err: crate::element::TableError) -> Self {
        EnumerateError::UnknownElement(err)
    }
}

/// Options that change which optional slots the enumerator emits
/// (spec.md §4.2.4/§4.2.5).
#[derive(Debug, Clone, Default)]
pub struct EnumerateOptions<'a> {
    pub natural_abundance_on_tracer: bool,
    pub purity: Option<&'a TracerPurity>,
}

fn element_axes(
    table: &IsotopeTable,
    symbol: &str,
    precursor_cap: u32,
    fragment_cap: u32,
    precursor_count: u32,
    fragment_count: u32,
) -> Result<Vec<IsotopeAxis>, EnumerateError> {
    let element = table.get(symbol)?;
    Ok(element
        .non_lightest_isotopes()
        .iter()
        .map(|iso| IsotopeAxis {
            relative_intensity: iso.relative_intensity,
            mass_delta: iso.mass_delta,
            pairs: per_isotope_pairs(
                precursor_count,
                fragment_count,
                iso.mass_delta,
                precursor_cap,
                fragment_cap,
            ),
        })
        .collect())
}

/// Enumerate every valid combination record for `compound` (spec.md C2).
/// `precursor_cap`/`fragment_cap` are `Δm_tracer * tracer_N_max` and
/// `Δm_tracer * tracer_n_max` respectively — the overall tracer mass span
/// that bounds every other element's contribution.
pub fn enumerate_combinations(
    compound: &Compound,
    table: &IsotopeTable,
    options: &EnumerateOptions,
) -> Result<Vec<RawCombination>, EnumerateError> {
    let tracer_element = table.get(&compound.precursor.tracer.element)?;
    let tracer_mass_delta = tracer_element
        .isotope_by_mass_number(compound.precursor.tracer.isotope_mass_number)
        .map(|iso| iso.mass_delta)
        .ok_or_else(|| {
            EnumerateError::UnknownElement(crate::element::TableError::UnknownIsotope(
                crate::element::isotope_name(
                    &compound.precursor.tracer.element,
                    compound.precursor.tracer.isotope_mass_number,
                ),
            ))
        })?;

    let precursor_cap = u32::from(tracer_mass_delta) * compound.precursor.tracer.count;
    let fragment_cap = u32::from(tracer_mass_delta) * compound.fragment.tracer.count;

    // Cross-element merge across non-tracer elements (spec.md §4.2.4),
    // deterministic sort of element symbols for stable slot order.
    let mut symbols: Vec<&str> = compound.precursor.elements.symbols().collect();
    symbols.sort();

    let mut non_tracer_records: Vec<(Vec<ElementContribution>, u32, u32)> =
        vec![(Vec::new(), 0, 0)];

    for symbol in symbols {
        let precursor_count = compound.precursor.elements.get(symbol);
        let fragment_count = compound.fragment.elements.get(symbol);
        let element = table.get(symbol)?;
        if element.is_inert() {
            continue;
        }
        let axes = element_axes(
            table,
            symbol,
            precursor_cap,
            fragment_cap,
            precursor_count,
            fragment_count,
        )?;
        let axis_records = merge_isotope_axes(
            precursor_count,
            fragment_count,
            precursor_cap,
            fragment_cap,
            &axes,
        );

        let mut next = Vec::new();
        for (contributions, precursor_mass, fragment_mass) in &non_tracer_records {
            for axis_record in &axis_records {
                let new_precursor_mass = precursor_mass + axis_record.precursor_mass;
                let new_fragment_mass = fragment_mass + axis_record.fragment_mass;
                if new_precursor_mass > precursor_cap || new_fragment_mass > fragment_cap {
                    continue;
                }
                let mut contributions = contributions.clone();
                contributions.push(ElementContribution {
                    element: symbol.to_string(),
                    precursor_count,
                    fragment_count,
                    isotopes: axis_record.contributions.clone(),
                });
                next.push((contributions, new_precursor_mass, new_fragment_mass));
            }
        }
        non_tracer_records = next;
    }

    let tracer_pairs = tracer_pairs(
        compound.precursor.tracer.count,
        compound.fragment.tracer.count,
    );

    let mut combinations = Vec::new();

    for (big_n, small_n) in tracer_pairs {
        let nat_ab = if options.natural_abundance_on_tracer {
            let bg_precursor = compound.precursor.tracer.count - u32::from(big_n);
            let bg_fragment = compound.fragment.tracer.count - u32::from(small_n);
            let axes: Vec<IsotopeAxis> = tracer_element
                .non_lightest_isotopes()
                .iter()
                .map(|iso| IsotopeAxis {
                    relative_intensity: iso.relative_intensity,
                    mass_delta: iso.mass_delta,
                    pairs: per_isotope_pairs(
                        bg_precursor,
                        bg_fragment,
                        iso.mass_delta,
                        precursor_cap,
                        fragment_cap,
                    ),
                })
                .collect();
            let records =
                merge_isotope_axes(bg_precursor, bg_fragment, precursor_cap, fragment_cap, &axes);
            records
                .into_iter()
                .map(|r| {
                    (
                        ElementContribution {
                            element: compound.precursor.tracer.element.clone(),
                            precursor_count: bg_precursor,
                            fragment_count: bg_fragment,
                            isotopes: r.contributions,
                        },
                        r.precursor_mass,
                        r.fragment_mass,
                    )
                })
                .collect::<Vec<_>>()
        } else {
            vec![(
                ElementContribution {
                    element: compound.precursor.tracer.element.clone(),
                    precursor_count: 0,
                    fragment_count: 0,
                    isotopes: Vec::new(),
                },
                0,
                0,
            )]
        };
        let nat_ab_variants: Vec<Option<(ElementContribution, u32, u32)>> = if options
            .natural_abundance_on_tracer
        {
            nat_ab.into_iter().map(Some).collect()
        } else {
            vec![None]
        };

        let tracer_variants: Vec<TracerContribution> = match options.purity {
            None => vec![TracerContribution::Deterministic {
                mass_delta: tracer_mass_delta,
            }],
            Some(purity) => {
                let axes: Vec<IsotopeAxis> = tracer_element
                    .non_lightest_isotopes()
                    .iter()
                    .map(|iso| IsotopeAxis {
                        relative_intensity: purity.fraction(iso.mass_number),
                        mass_delta: iso.mass_delta,
                        pairs: conservation_pairs(u32::from(big_n), u32::from(small_n)),
                    })
                    .collect();
                let records = merge_isotope_axes(
                    u32::from(big_n),
                    u32::from(small_n),
                    u32::MAX,
                    u32::MAX,
                    &axes,
                );
                records
                    .into_iter()
                    .map(|r| TracerContribution::Purity {
                        precursor_count: u32::from(big_n),
                        fragment_count: u32::from(small_n),
                        isotopes: r.contributions,
                        precursor_mass: r.precursor_mass,
                        fragment_mass: r.fragment_mass,
                    })
                    .collect()
            }
        };

        for (contributions, non_tracer_precursor_mass, non_tracer_fragment_mass) in
            &non_tracer_records
        {
            for nat_ab_variant in &nat_ab_variants {
                let (nat_ab_contrib, nat_ab_precursor_mass, nat_ab_fragment_mass) =
                    match nat_ab_variant {
                        Some((c, p, f)) => (Some(c.clone()), *p, *f),
                        None => (None, 0, 0),
                    };

                for tracer_variant in &tracer_variants {
                    let (tracer_precursor_mass, tracer_fragment_mass) = match tracer_variant {
                        TracerContribution::Deterministic { mass_delta } => (
                            u32::from(*mass_delta) * u32::from(big_n),
                            u32::from(*mass_delta) * u32::from(small_n),
                        ),
                        TracerContribution::Purity {
                            precursor_mass,
                            fragment_mass,
                            ..
                        } => (*precursor_mass, *fragment_mass),
                    };

                    let total_precursor_offset = non_tracer_precursor_mass
                        + nat_ab_precursor_mass
                        + tracer_precursor_mass;
                    let total_fragment_offset =
                        non_tracer_fragment_mass + nat_ab_fragment_mass + tracer_fragment_mass;

                    if total_precursor_offset > precursor_cap
                        || total_fragment_offset > fragment_cap
                    {
                        continue;
                    }

                    combinations.push(RawCombination {
                        tracer_slot: (big_n, small_n),
                        non_tracer: contributions.clone(),
                        natural_abundance_on_tracer: nat_ab_contrib.clone(),
                        tracer: tracer_variant.clone(),
                        total_precursor_offset,
                        total_fragment_offset,
                    });
                }
            }
        }
    }

    Ok(combinations)
}
