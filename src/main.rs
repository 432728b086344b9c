use std::env;
use std::fs;
use std::process;

use isocorr::compound::{Compound, Side, Tracer};
use isocorr::correct::{correct, CorrectionOptions};
use isocorr::io;
use isocorr::measurement::MeasurementVector;
use isocorr::table::DEFAULT_TABLE;

/// Demo driver for an isotopologue correction run. Reads a file with:
/// - one line `tracer_element tracer_isotope_mass_number tracer_count`
/// - one line giving the rest of the formula, e.g. `H12O6`
/// - one measurement line per isotopologue offset (spec.md §6 format)
fn run(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let contents = fs::read_to_string(path)?;
    let mut lines = contents.lines().filter(|line| !line.trim().is_empty());

    let tracer_line = lines.next().ok_or("missing tracer line")?;
    let mut tracer_fields = tracer_line.split_whitespace();
    let tracer = Tracer {
        element: tracer_fields.next().ok_or("missing tracer element")?.to_string(),
        isotope_mass_number: tracer_fields.next().ok_or("missing tracer isotope")?.parse()?,
        count: tracer_fields.next().ok_or("missing tracer count")?.parse()?,
    };

    let formula_line = lines.next().ok_or("missing formula line")?;
    let elements = io::parse_formula(formula_line)?;
    let side = Side::new(tracer, elements);
    let compound = Compound {
        precursor: side.clone(),
        fragment: side,
    };

    let mut entries = Vec::new();
    for line in lines {
        let (_name, n, _small_n, values) = io::parse_measurement_line(line)?;
        let value = values.first().copied().unwrap_or(0.0);
        entries.push((n, value));
    }
    let measured = MeasurementVector::from_isotopologue_entries(entries)?;

    let (result, warnings) = correct(&compound, &measured, &DEFAULT_TABLE, &CorrectionOptions::default())?;

    for warning in &warnings {
        eprintln!("warning: {warning}");
    }
    for (key, (corrected, relative)) in result.keys.iter().zip(result.corrected.iter().zip(&result.relative)) {
        println!("{}\t{}\t{:.6}\t{:.6}", key.0, key.1, corrected, relative);
    }
    if let Some(enrichment) = result.mean_enrichment {
        println!("mean_enrichment\t{enrichment:.6}");
    }
    Ok(())
}

fn main() {
    let mut args = env::args();
    args.next();
    let Some(path) = args.next() else {
        eprintln!("usage: isocorr <measurement-file>");
        process::exit(2);
    };
    if let Err(err) = run(&path) {
        eprintln!("error: {err}");
        process::exit(1);
    }
}
