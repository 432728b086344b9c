/*!
Isotope correction for tandem mass spectrometry tracer experiments.

Given a measured intensity vector for a tracer-labeled compound (and,
optionally, a fragment derived from it), this crate removes the confounding
contribution of natural isotopic abundance — and, if supplied, tracer
impurity — to recover the true labeling distribution.

```
# fn main() -> Result<(), Box<dyn std::error::Error>> {
use isocorr::compound::{Compound, Side, Tracer};
use isocorr::correct::{correct, CorrectionOptions};
use isocorr::measurement::MeasurementVector;
use isocorr::table::DEFAULT_TABLE;

let side = Side::new(
    Tracer { element: "C".into(), isotope_mass_number: 13, count: 6 },
    [("H", 12), ("O", 6)].into_iter().collect(),
);
let compound = Compound { precursor: side.clone(), fragment: side };

let measured = MeasurementVector::from_isotopologue_entries(
    (0..=6).map(|n| (n, if n == 0 { 1000.0 } else { 0.0 })),
)?;

let (result, _warnings) =
    correct(&compound, &measured, &DEFAULT_TABLE, &CorrectionOptions::default())?;
assert!(result.corrected[0] > 900.0);
# Ok(())
# }
```
*/
pub mod composition;
pub mod compound;
pub mod correct;
pub mod element;
pub mod enumerate;
pub mod io;
pub mod measurement;
pub mod probability;
pub mod purity;
pub mod solver;
pub mod table;

pub use crate::compound::{Compound, CompoundError, Side, Tracer};
pub use crate::correct::{correct, CorrectionError, CorrectionOptions, Warning};
pub use crate::element::{Element, Isotope, IsotopeTable, TableError};
pub use crate::measurement::{MeasurementError, MeasurementVector};
pub use crate::purity::{PurityError, TracerPurity};
pub use crate::solver::{CorrectionMatrix, CorrectionResult, SolverError};
pub use crate::table::DEFAULT_TABLE;
