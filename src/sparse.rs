//! Sparse matrix utilities.
//!
//! Helper functions for working with nalgebra-sparse matrices.

use nalgebra::DVector;
use nalgebra_sparse::{CooMatrix, CscMatrix};

/// Create a CSC matrix from triplets (row, col, value).
///
/// Duplicates are summed together. Out-of-range entries are dropped.
pub fn csc_from_triplets(
    nrows: usize,
    ncols: usize,
    rows: Vec<usize>,
    cols: Vec<usize>,
    vals: Vec<f64>,
) -> CscMatrix<f64> {
    if rows.is_empty() {
        return CscMatrix::zeros(nrows, ncols);
    }

    let mut coo = CooMatrix::new(nrows, ncols);
    for ((row, col), val) in rows.into_iter().zip(cols).zip(vals) {
        if row < nrows && col < ncols {
            coo.push(row, col, val);
        }
    }

    CscMatrix::from(&coo)
}

/// Create a square CSC matrix with `diag` on the diagonal.
///
/// Exact zeros are not stored.
pub fn csc_diag(diag: &[f64]) -> CscMatrix<f64> {
    let n = diag.len();
    let (rows, vals): (Vec<usize>, Vec<f64>) = diag
        .iter()
        .enumerate()
        .filter(|(_, v)| **v != 0.0)
        .map(|(i, v)| (i, *v))
        .unzip();
    let cols = rows.clone();
    csc_from_triplets(n, n, rows, cols, vals)
}

/// Create a dense-valued column (n x 1) as CSC.
pub fn csc_column(values: &[f64]) -> CscMatrix<f64> {
    let (rows, vals): (Vec<usize>, Vec<f64>) = values
        .iter()
        .enumerate()
        .filter(|(_, v)| **v != 0.0)
        .map(|(i, v)| (i, *v))
        .unzip();
    let cols = vec![0; rows.len()];
    csc_from_triplets(values.len(), 1, rows, cols, vals)
}

/// Add two CSC matrices of the same dimensions.
pub fn csc_add(a: &CscMatrix<f64>, b: &CscMatrix<f64>) -> CscMatrix<f64> {
    let mut rows = Vec::with_capacity(a.nnz() + b.nnz());
    let mut cols = Vec::with_capacity(a.nnz() + b.nnz());
    let mut vals = Vec::with_capacity(a.nnz() + b.nnz());

    for (r, c, v) in a.triplet_iter().chain(b.triplet_iter()) {
        rows.push(r);
        cols.push(c);
        vals.push(*v);
    }

    csc_from_triplets(a.nrows(), a.ncols(), rows, cols, vals)
}

/// Scale a CSC matrix.
pub fn csc_scale(a: &CscMatrix<f64>, scalar: f64) -> CscMatrix<f64> {
    let mut scaled = a.clone();
    for v in scaled.values_mut() {
        *v *= scalar;
    }
    scaled
}

/// Repeat rows of a CSC matrix: the result stacks `times` copies vertically.
pub fn csc_repeat_rows(m: &CscMatrix<f64>, times: usize) -> CscMatrix<f64> {
    let mut rows = Vec::new();
    let mut cols = Vec::new();
    let mut vals = Vec::new();

    for (r, c, v) in m.triplet_iter() {
        for t in 0..times {
            rows.push(t * m.nrows() + r);
            cols.push(c);
            vals.push(*v);
        }
    }

    csc_from_triplets(m.nrows() * times, m.ncols(), rows, cols, vals)
}

/// Select a single row of a CSC matrix as a 1 x ncols matrix.
pub fn csc_row(m: &CscMatrix<f64>, row: usize) -> CscMatrix<f64> {
    let mut cols = Vec::new();
    let mut vals = Vec::new();
    for (r, c, v) in m.triplet_iter() {
        if r == row {
            cols.push(c);
            vals.push(*v);
        }
    }
    let rows = vec![0; cols.len()];
    csc_from_triplets(1, m.ncols(), rows, cols, vals)
}

/// Sparse matrix times dense vector.
///
/// Returns `None` if the vector length does not match the column count.
pub fn csc_matvec(m: &CscMatrix<f64>, x: &DVector<f64>) -> Option<DVector<f64>> {
    if m.ncols() != x.len() {
        return None;
    }
    let mut out = DVector::zeros(m.nrows());
    for (r, c, v) in m.triplet_iter() {
        out[r] += v * x[c];
    }
    Some(out)
}
