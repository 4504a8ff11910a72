//! Shared plumbing for unary elementwise atoms.
//!
//! An elementwise atom applies a scalar function to every element of its
//! single argument, so its output shape is the argument's shape and its
//! subgradient is diagonal.

use nalgebra_sparse::CscMatrix;

use crate::canon::LinExpr;
use crate::error::{CvxError, Result};
use crate::expr::{Array, Shape};
use crate::sparse::csc_diag;

/// The single argument handle of a unary atom.
pub fn unary_arg<'a>(atom: &'static str, args: &'a [LinExpr]) -> Result<&'a LinExpr> {
    match args {
        [x] => Ok(x),
        _ => Err(CvxError::ArityMismatch {
            atom,
            expected: 1,
            got: args.len(),
        }),
    }
}

/// The single argument value of a unary atom.
pub fn unary_value<'a>(atom: &'static str, values: &'a [Array]) -> Result<&'a Array> {
    match values {
        [x] => Ok(x),
        _ => Err(CvxError::ArityMismatch {
            atom,
            expected: 1,
            got: values.len(),
        }),
    }
}

/// Check that an argument handle has exactly the output shape.
pub fn check_same_shape(arg: &LinExpr, shape: &Shape) -> Result<()> {
    if &arg.shape != shape {
        return Err(CvxError::shape_mismatch(shape, &arg.shape));
    }
    Ok(())
}

/// Apply `f` to every element of `value`, shaped as the atom output.
pub fn elemwise_map(value: &Array, shape: &Shape, f: impl Fn(f64) -> f64) -> Result<Array> {
    Array::from_vector(value.to_vector().map(f), shape)
}

/// Turn per-element derivatives into a diagonal Jacobian.
pub fn elemwise_grad_to_diag(value: &Array, f: impl Fn(f64) -> f64) -> CscMatrix<f64> {
    let diag: Vec<f64> = value.iter().map(f).collect();
    csc_diag(&diag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::VarAllocator;

    #[test]
    fn test_unary_arg_arity() {
        assert!(matches!(
            unary_arg("test", &[]),
            Err(CvxError::ArityMismatch { expected: 1, got: 0, .. })
        ));
    }

    #[test]
    fn test_check_same_shape() {
        let alloc = VarAllocator::new();
        let x = LinExpr::variable(alloc.fresh(), Shape::vector(3));
        assert!(check_same_shape(&x, &Shape::vector(3)).is_ok());
        assert!(check_same_shape(&x, &Shape::matrix(3, 1)).is_err());
    }

    #[test]
    fn test_elemwise_map_uses_output_shape() {
        let v = elemwise_map(&Array::from_vec(vec![2.0]), &Shape::scalar(), |x| x + 1.0).unwrap();
        assert_eq!(v, Array::Scalar(3.0));
        let m = elemwise_map(&Array::from_vec(vec![1.0; 4]), &Shape::matrix(2, 2), |x| -x);
        assert_eq!(m.unwrap().shape(), Shape::matrix(2, 2));
    }

    #[test]
    fn test_elemwise_grad_to_diag() {
        let g = elemwise_grad_to_diag(&Array::from_vec(vec![1.0, -2.0]), |v| 2.0 * v);
        assert_eq!(g.nrows(), 2);
        assert_eq!(g.get_entry(1, 1).map(|e| e.into_value()), Some(-4.0));
        assert_eq!(g.get_entry(0, 1).map(|e| e.into_value()), Some(0.0));
    }
}
