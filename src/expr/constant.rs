//! Constant expression creation.

use nalgebra::{DMatrix, DVector};

use super::expression::{Array, Expr};

/// Create a constant expression from a scalar.
pub fn constant(value: f64) -> Expr {
    Expr::Constant(Array::Scalar(value))
}

/// Create a constant expression from a vector.
pub fn constant_vec(values: Vec<f64>) -> Expr {
    Expr::Constant(Array::Vector(DVector::from_vec(values)))
}

/// Create a constant matrix from column-major values.
pub fn constant_matrix(values: Vec<f64>, rows: usize, cols: usize) -> Expr {
    Expr::Constant(Array::Dense(DMatrix::from_vec(rows, cols, values)))
}
