//! Correction solver (spec.md C4, §4.4): assembles the correction matrix
//! from [`crate::probability::CombinationRecord`]s, solves for the true
//! distribution underlying a measured vector, and derives the summary
//! statistics spec.md §4.4.3 asks for.

use std::fmt;

use crate::probability::CombinationRecord;

/// A square correction matrix in canonical (mass-ascending) column/row
/// order, alongside that order's `(N, n)` keys.
#[derive(Debug, Clone)]
pub struct CorrectionMatrix {
    pub keys: Vec<(u16, u16)>,
    /// Row-major `keys.len() x keys.len()` entries.
    rows: Vec<Vec<f64>>,
}

impl CorrectionMatrix {
    pub fn size(&self) -> usize {
        self.keys.len()
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.rows[row][col]
    }

    /// `true` once every non-zero entry lies on or below the diagonal —
    /// the structural property spec.md §8 expects when purity is off,
    /// since natural-abundance contamination only ever adds mass.
    pub fn is_lower_triangular(&self) -> bool {
        for (row, values) in self.rows.iter().enumerate() {
            for (col, value) in values.iter().enumerate() {
                if col > row && value.abs() > 1e-12 {
                    return false;
                }
            }
        }
        true
    }
}

/// Build the correction matrix from enumerated, probability-weighted
/// records (spec.md §4.4.1): columns and rows share the same canonical,
/// mass-ascending `(N, n)` key order, and an entry accumulates every
/// record whose tracer slot and total offset land on that (row, col) pair.
pub fn build_matrix(records: &[CombinationRecord], keys: &[(u16, u16)]) -> CorrectionMatrix {
    let index_of = |key: (u16, u16)| keys.iter().position(|&k| k == key);
    let n = keys.len();
    let mut rows = vec![vec![0.0; n]; n];
    for record in records {
        let Some(col) = index_of(record.column) else {
            continue;
        };
        let row_key = (record.row.0 as u16, record.row.1 as u16);
        let Some(row) = index_of(row_key) else {
            continue;
        };
        rows[row][col] += record.probability;
    }
    CorrectionMatrix {
        keys: keys.to_vec(),
        rows,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SolverError {
    SingularMatrix,
    ZeroDiagonal { index: usize },
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SolverError::SingularMatrix => write!(f, "correction matrix is singular"),
            SolverError::ZeroDiagonal { index } => {
                write!(f, "correction matrix has a zero diagonal entry at row {index}")
            }
        }
    }
}

impl std::error::Error for SolverError {}

/// Forward substitution for a (guaranteed) lower-triangular matrix — the
/// no-purity fast path, since natural-abundance contamination can only
/// push probability mass to equal-or-higher rows (spec.md §4.4.2).
fn solve_forward_substitution(matrix: &CorrectionMatrix, b: &[f64]) -> Result<Vec<f64>, SolverError> {
    let n = matrix.size();
    let mut x = vec![0.0; n];
    for i in 0..n {
        let mut acc = b[i];
        for j in 0..i {
            acc -= matrix.get(i, j) * x[j];
        }
        let diag = matrix.get(i, i);
        if diag.abs() < 1e-12 {
            return Err(SolverError::ZeroDiagonal { index: i });
        }
        x[i] = acc / diag;
    }
    Ok(x)
}

/// Gaussian elimination with partial pivoting — the purity-active path,
/// since purity can reassign a labeled position to a lighter isotope and
/// shed mass below the nominal column offset, breaking the strict
/// lower-triangular structure the no-purity matrix guarantees.
fn solve_gaussian_elimination(matrix: &CorrectionMatrix, b: &[f64]) -> Result<Vec<f64>, SolverError> {
    let n = matrix.size();
    let mut a: Vec<Vec<f64>> = (0..n).map(|r| (0..n).map(|c| matrix.get(r, c)).collect()).collect();
    let mut rhs = b.to_vec();

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&r1, &r2| a[r1][col].abs().partial_cmp(&a[r2][col].abs()).unwrap())
            .unwrap();
        if a[pivot_row][col].abs() < 1e-12 {
            return Err(SolverError::SingularMatrix);
        }
        a.swap(col, pivot_row);
        rhs.swap(col, pivot_row);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let mut acc = rhs[row];
        for col in (row + 1)..n {
            acc -= a[row][col] * x[col];
        }
        x[row] = acc / a[row][row];
    }
    Ok(x)
}

/// The solved correction output (spec.md §4.4.3): the raw corrected
/// vector (negative entries clipped to zero), its anchor-normalized
/// relative distribution, and — only for isotopologues — the mean
/// fractional enrichment.
#[derive(Debug, Clone)]
pub struct CorrectionResult {
    pub keys: Vec<(u16, u16)>,
    pub corrected: Vec<f64>,
    pub relative: Vec<f64>,
    pub mean_enrichment: Option<f64>,
    pub clipped_negative_count: usize,
}

/// Solve for the true distribution underlying `measured` (already
/// reordered into `matrix`'s canonical key order), clip negative results
/// to zero, and normalize to a relative distribution (spec.md §4.4.2,
/// §4.4.3).
pub fn solve(
    matrix: &CorrectionMatrix,
    measured: &[f64],
    purity_active: bool,
    tracer_count: Option<u32>,
) -> Result<CorrectionResult, SolverError> {
    let raw = if purity_active {
        solve_gaussian_elimination(matrix, measured)?
    } else {
        solve_forward_substitution(matrix, measured)?
    };

    let mut clipped_negative_count = 0;
    let corrected: Vec<f64> = raw
        .into_iter()
        .map(|v| {
            if v < 0.0 {
                clipped_negative_count += 1;
                0.0
            } else {
                v
            }
        })
        .collect();

    let mut corrected = corrected;
    if corrected[0] > 0.0 {
        let anchor = measured[0] / corrected[0];
        for v in &mut corrected {
            *v *= anchor;
        }
    }

    let total: f64 = corrected.iter().sum();
    let relative: Vec<f64> = if total > 0.0 {
        corrected.iter().map(|v| v / total).collect()
    } else {
        vec![0.0; corrected.len()]
    };

    let mean_enrichment = tracer_count.and_then(|count| {
        if count == 0 {
            return None;
        }
        Some(
            matrix
                .keys
                .iter()
                .zip(relative.iter())
                .map(|(&(n, _), &frac)| (f64::from(n) / f64::from(count as u16)) * frac)
                .sum(),
        )
    });

    Ok(CorrectionResult {
        keys: matrix.keys.clone(),
        corrected,
        relative,
        mean_enrichment,
        clipped_negative_count,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    fn identity_matrix(n: usize) -> CorrectionMatrix {
        let keys: Vec<(u16, u16)> = (0..n as u16).map(|i| (i, i)).collect();
        let rows = (0..n)
            .map(|r| (0..n).map(|c| if r == c { 1.0 } else { 0.0 }).collect())
            .collect();
        CorrectionMatrix { keys, rows }
    }

    #[test]
    fn test_identity_matrix_solves_to_input() {
        let matrix = identity_matrix(3);
        let result = solve(&matrix, &[100.0, 0.0, 0.0], false, Some(3)).unwrap();
        assert_eq!(result.corrected, vec![100.0, 0.0, 0.0]);
        assert_eq!(result.relative, vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_negative_results_are_clipped() {
        let keys = vec![(0u16, 0u16), (1, 1)];
        let rows = vec![vec![1.0, 0.0], vec![0.2, 1.0]];
        let matrix = CorrectionMatrix { keys, rows };
        let result = solve(&matrix, &[1000.0, 0.0], false, Some(2)).unwrap();
        assert_eq!(result.corrected[0], 1000.0);
        assert_eq!(result.corrected[1], 0.0);
        assert_eq!(result.clipped_negative_count, 1);
    }

    #[test]
    fn test_zero_diagonal_is_fatal() {
        let keys = vec![(0u16, 0u16), (1, 1)];
        let rows = vec![vec![0.0, 0.0], vec![0.2, 1.0]];
        let matrix = CorrectionMatrix { keys, rows };
        let err = solve(&matrix, &[1.0, 1.0], false, None).unwrap_err();
        assert_eq!(err, SolverError::ZeroDiagonal { index: 0 });
    }

    #[test]
    fn test_gaussian_elimination_matches_forward_substitution_on_triangular_input() {
        let keys = vec![(0u16, 0u16), (1, 1), (2, 2)];
        let rows = vec![
            vec![0.9, 0.0, 0.0],
            vec![0.08, 0.9, 0.0],
            vec![0.02, 0.08, 0.9],
        ];
        let matrix = CorrectionMatrix { keys, rows };
        let measured = [900.0, 150.0, 20.0];
        let a = solve(&matrix, &measured, false, None).unwrap();
        let b = solve(&matrix, &measured, true, None).unwrap();
        for (x, y) in a.corrected.iter().zip(b.corrected.iter()) {
            assert!((x - y).abs() < 1e-6);
        }
    }

    #[test]
    fn test_mean_enrichment_of_pure_label_is_one() {
        let matrix = identity_matrix(3);
        let result = solve(&matrix, &[0.0, 0.0, 100.0], false, Some(2)).unwrap();
        assert!((result.mean_enrichment.unwrap() - 1.0).abs() < 1e-9);
    }
}
