//! Built-in natural-abundance table for the seven elements spec.md §4.1
//! names as the default set: C, H, N, O, Si, S, P. Values are published
//! IUPAC natural isotopic compositions; the loader in [`crate::element`]
//! renormalizes each element so its intensities sum to exactly 1 (spec.md
//! §9 design note (d)).

use std::sync::LazyLock;

use crate::element::{Element, IsotopeTable};

pub fn populate_default_table(table: &mut IsotopeTable) {
    table.add(Element::new("H", &[(1, 0.999885), (2, 0.000115)])).unwrap();
    table.add(Element::new("C", &[(12, 0.9893), (13, 0.0107)])).unwrap();
    table.add(Element::new("N", &[(14, 0.99636), (15, 0.00364)])).unwrap();
    table
        .add(Element::new(
            "O",
            &[(16, 0.99757), (17, 0.00038), (18, 0.00205)],
        ))
        .unwrap();
    table
        .add(Element::new(
            "Si",
            &[(28, 0.922297), (29, 0.046832), (30, 0.030872)],
        ))
        .unwrap();
    table
        .add(Element::new(
            "S",
            &[(32, 0.9499), (33, 0.0075), (34, 0.0425), (36, 0.0001)],
        ))
        .unwrap();
    table.add(Element::new("P", &[(31, 1.0)])).unwrap();
}

/// The crate's built-in default natural-isotope table, populated once on
/// first use. A correction call that doesn't receive an externally loaded
/// table uses this one (spec.md §4.1: "may be initialized from a built-in
/// default set").
pub static DEFAULT_TABLE: LazyLock<IsotopeTable> = LazyLock::new(|| {
    let mut t = IsotopeTable::new();
    populate_default_table(&mut t);
    t
});
