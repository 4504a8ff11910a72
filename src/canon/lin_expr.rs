//! Parametric linear expressions for canonicalization.
//!
//! After canonicalization, expressions are represented in standard form:
//!
//! ```text
//! sum_k p_k * (A_k x_k + b_k)
//! ```
//!
//! where each `p_k` is either the constant 1 or a scalar parameter whose value
//! is only known at solve time. Every term is a sparse coefficient matrix
//! keyed by a [`TermKey`]. A term without a variable is a constant column.

use std::collections::BTreeMap;

use nalgebra::DVector;
use nalgebra_sparse::CscMatrix;

use crate::error::{CvxError, Result};
use crate::expr::{Array, ExprId, Parameter, Shape, ValueMap};
use crate::sparse::{
    csc_add, csc_column, csc_from_triplets, csc_matvec, csc_repeat_rows, csc_row, csc_scale,
};

/// Key of a term in a [`LinExpr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TermKey {
    /// Scalar parameter scaling the term, if any.
    pub param: Option<ExprId>,
    /// Variable the coefficient multiplies; `None` for a constant column.
    pub var: Option<ExprId>,
}

impl TermKey {
    fn constant() -> Self {
        TermKey {
            param: None,
            var: None,
        }
    }
}

/// A linear expression in standard form.
///
/// Variable terms have coefficient shape `(size, var_size)`; constant terms
/// have shape `(size, 1)`. Terms are kept in a `BTreeMap` so iteration, and
/// therefore anything built from it, is deterministic.
#[derive(Debug, Clone)]
pub struct LinExpr {
    /// Coefficient matrices by term.
    pub terms: BTreeMap<TermKey, CscMatrix<f64>>,
    /// Output shape of this expression.
    pub shape: Shape,
}

impl LinExpr {
    /// Create a zero linear expression with the given shape.
    pub fn zeros(shape: Shape) -> Self {
        LinExpr {
            terms: BTreeMap::new(),
            shape,
        }
    }

    /// Create a linear expression for a single variable (identity coefficient).
    pub fn variable(var_id: ExprId, shape: Shape) -> Self {
        let mut terms = BTreeMap::new();
        terms.insert(
            TermKey {
                param: None,
                var: Some(var_id),
            },
            CscMatrix::identity(shape.size()),
        );
        LinExpr { terms, shape }
    }

    /// Create a constant linear expression.
    pub fn constant(value: &Array) -> Self {
        let values: Vec<f64> = value.iter().collect();
        let mut terms = BTreeMap::new();
        terms.insert(TermKey::constant(), csc_column(&values));
        LinExpr {
            terms,
            shape: value.shape(),
        }
    }

    /// Create a scalar constant.
    pub fn scalar(value: f64) -> Self {
        LinExpr::constant(&Array::Scalar(value))
    }

    /// Create the expression `p` for a scalar parameter.
    pub fn parameter(param: &Parameter) -> Result<Self> {
        LinExpr::scalar(1.0).mul_param(param)
    }

    /// Check if this is a constant (no variables).
    ///
    /// Parameter-scaled constants count as constant.
    pub fn is_constant(&self) -> bool {
        self.terms.keys().all(|k| k.var.is_none())
    }

    /// Get the output size (flattened).
    pub fn size(&self) -> usize {
        self.shape.size()
    }

    /// Add two linear expressions, broadcasting a single-element side.
    pub fn add(&self, other: &LinExpr) -> Result<LinExpr> {
        let shape = self
            .shape
            .broadcast(&other.shape)
            .ok_or_else(|| CvxError::shape_mismatch(&self.shape, &other.shape))?;
        let size = shape.size();

        let mut terms = self.broadcast_terms(size);
        for (key, coeff) in other.broadcast_terms(size) {
            match terms.get_mut(&key) {
                Some(existing) => *existing = csc_add(existing, &coeff),
                None => {
                    terms.insert(key, coeff);
                }
            }
        }

        Ok(LinExpr { terms, shape })
    }

    /// Subtract: self - other.
    pub fn sub(&self, other: &LinExpr) -> Result<LinExpr> {
        self.add(&other.neg())
    }

    fn broadcast_terms(&self, size: usize) -> BTreeMap<TermKey, CscMatrix<f64>> {
        if self.size() == size {
            return self.terms.clone();
        }
        self.terms
            .iter()
            .map(|(k, c)| (*k, csc_repeat_rows(c, size)))
            .collect()
    }

    /// Negate a linear expression.
    pub fn neg(&self) -> LinExpr {
        self.scale(-1.0)
    }

    /// Scale by a scalar.
    pub fn scale(&self, scalar: f64) -> LinExpr {
        LinExpr {
            terms: self
                .terms
                .iter()
                .map(|(k, c)| (*k, csc_scale(c, scalar)))
                .collect(),
            shape: self.shape.clone(),
        }
    }

    /// Multiply elementwise by a constant of the same size.
    pub fn scale_elementwise(&self, factor: &Array) -> Result<LinExpr> {
        if factor.size() != self.size() {
            return Err(CvxError::shape_mismatch(&self.shape, factor.shape()));
        }
        let factor = factor.to_vector();
        let terms = self
            .terms
            .iter()
            .map(|(k, c)| {
                let (rows, cols, vals): (Vec<_>, Vec<_>, Vec<_>) = c
                    .triplet_iter()
                    .map(|(r, col, v)| (r, col, v * factor[r]))
                    .fold((vec![], vec![], vec![]), |(mut rs, mut cs, mut vs), (r, col, v)| {
                        rs.push(r);
                        cs.push(col);
                        vs.push(v);
                        (rs, cs, vs)
                    });
                (*k, csc_from_triplets(c.nrows(), c.ncols(), rows, cols, vals))
            })
            .collect();
        Ok(LinExpr {
            terms,
            shape: self.shape.clone(),
        })
    }

    /// Multiply by a scalar parameter.
    ///
    /// The result stays linear in the variables with the parameter in
    /// coefficient position. Fails if a term is already parameter-scaled.
    pub fn mul_param(&self, param: &Parameter) -> Result<LinExpr> {
        if param.shape().size() != 1 {
            return Err(CvxError::NotDcp(format!(
                "parameter {} with shape {} cannot scale a linear expression",
                param.label(),
                param.shape()
            )));
        }
        let mut terms = BTreeMap::new();
        for (key, coeff) in &self.terms {
            if let Some(existing) = key.param {
                return Err(CvxError::NotDcp(format!(
                    "product of parameters {} and {}",
                    existing,
                    param.id()
                )));
            }
            terms.insert(
                TermKey {
                    param: Some(param.id()),
                    var: key.var,
                },
                coeff.clone(),
            );
        }
        Ok(LinExpr {
            terms,
            shape: self.shape.clone(),
        })
    }

    /// Extract element `idx` (column-major) as a scalar expression.
    pub fn extract_element(&self, idx: usize) -> LinExpr {
        LinExpr {
            terms: self
                .terms
                .iter()
                .map(|(k, c)| (*k, csc_row(c, idx)))
                .collect(),
            shape: Shape::scalar(),
        }
    }

    /// Get all variable IDs in this expression, sorted.
    pub fn variables(&self) -> Vec<ExprId> {
        let mut vars: Vec<_> = self.terms.keys().filter_map(|k| k.var).collect();
        vars.sort();
        vars.dedup();
        vars
    }

    /// Get all parameter IDs in this expression, sorted.
    pub fn parameters(&self) -> Vec<ExprId> {
        let mut params: Vec<_> = self.terms.keys().filter_map(|k| k.param).collect();
        params.sort();
        params.dedup();
        params
    }

    /// Evaluate at concrete variable and parameter values.
    ///
    /// Returns the column-major flattened value.
    pub fn evaluate(&self, values: &ValueMap) -> Result<DVector<f64>> {
        let mut out = DVector::zeros(self.size());
        let one = DVector::from_element(1, 1.0);

        for (key, coeff) in &self.terms {
            let input = match key.var {
                Some(id) => values
                    .vector(id)
                    .ok_or_else(|| CvxError::MissingValue(format!("variable {}", id)))?,
                None => one.clone(),
            };
            let term = csc_matvec(coeff, &input).ok_or_else(|| {
                CvxError::shape_mismatch(
                    format!("{} values", coeff.ncols()),
                    format!("{} values", input.len()),
                )
            })?;
            let factor = match key.param {
                Some(id) => values
                    .get(id)
                    .and_then(Array::as_scalar)
                    .ok_or_else(|| CvxError::MissingValue(format!("parameter {}", id)))?,
                None => 1.0,
            };
            if term.len() != out.len() {
                return Err(CvxError::shape_mismatch(
                    format!("{} rows", out.len()),
                    format!("{} rows", term.len()),
                ));
            }
            out += term * factor;
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{ParameterBuilder, VarAllocator};

    #[test]
    fn test_lin_expr_zeros() {
        let e = LinExpr::zeros(Shape::vector(5));
        assert!(e.is_constant());
        assert_eq!(e.size(), 5);
    }

    #[test]
    fn test_lin_expr_variable() {
        let alloc = VarAllocator::new();
        let var_id = alloc.fresh();
        let e = LinExpr::variable(var_id, Shape::vector(3));
        assert!(!e.is_constant());
        assert_eq!(e.variables(), vec![var_id]);
    }

    #[test]
    fn test_add_and_evaluate() {
        let alloc = VarAllocator::new();
        let x = alloc.fresh();
        let y = alloc.fresh();
        let e = LinExpr::variable(x, Shape::vector(2))
            .add(&LinExpr::variable(y, Shape::vector(2)).scale(3.0))
            .unwrap();
        assert_eq!(e.variables(), vec![x, y]);

        let mut values = ValueMap::new();
        values.insert(x, vec![1.0, 2.0]).insert(y, vec![1.0, -1.0]);
        assert_eq!(e.evaluate(&values).unwrap().as_slice(), &[4.0, -1.0]);
    }

    #[test]
    fn test_add_broadcasts_scalar() {
        let alloc = VarAllocator::new();
        let x = alloc.fresh();
        let e = LinExpr::variable(x, Shape::vector(3))
            .add(&LinExpr::scalar(1.0))
            .unwrap();
        assert_eq!(e.shape, Shape::vector(3));

        let mut values = ValueMap::new();
        values.insert(x, vec![0.0, 1.0, 2.0]);
        assert_eq!(e.evaluate(&values).unwrap().as_slice(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_add_shape_mismatch() {
        let alloc = VarAllocator::new();
        let a = LinExpr::variable(alloc.fresh(), Shape::vector(2));
        let b = LinExpr::variable(alloc.fresh(), Shape::vector(3));
        assert!(matches!(a.add(&b), Err(CvxError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_mul_param_defers_value() {
        let alloc = VarAllocator::new();
        let x = alloc.fresh();
        let p = ParameterBuilder::scalar().build(&alloc).unwrap();
        let e = LinExpr::variable(x, Shape::scalar()).mul_param(&p).unwrap();
        assert_eq!(e.parameters(), vec![p.id()]);

        let mut values = ValueMap::new();
        values.insert(x, 3.0);
        assert!(matches!(e.evaluate(&values), Err(CvxError::MissingValue(_))));
        values.insert(p.id(), 2.0);
        assert_eq!(e.evaluate(&values).unwrap()[0], 6.0);
        values.insert(p.id(), 0.5);
        assert_eq!(e.evaluate(&values).unwrap()[0], 1.5);
    }

    #[test]
    fn test_mul_param_twice_is_rejected() {
        let alloc = VarAllocator::new();
        let p = ParameterBuilder::scalar().build(&alloc).unwrap();
        let q = ParameterBuilder::scalar().build(&alloc).unwrap();
        let e = LinExpr::parameter(&p).unwrap();
        assert!(matches!(e.mul_param(&q), Err(CvxError::NotDcp(_))));
    }

    #[test]
    fn test_scale_elementwise() {
        let alloc = VarAllocator::new();
        let x = alloc.fresh();
        let e = LinExpr::variable(x, Shape::vector(2))
            .scale_elementwise(&Array::from_vec(vec![2.0, -1.0]))
            .unwrap();
        let mut values = ValueMap::new();
        values.insert(x, vec![1.0, 1.0]);
        assert_eq!(e.evaluate(&values).unwrap().as_slice(), &[2.0, -1.0]);
    }

    #[test]
    fn test_extract_element() {
        let alloc = VarAllocator::new();
        let x = alloc.fresh();
        let e = LinExpr::variable(x, Shape::vector(3))
            .add(&LinExpr::constant(&Array::from_vec(vec![10.0, 20.0, 30.0])))
            .unwrap();
        let e1 = e.extract_element(1);
        assert_eq!(e1.shape, Shape::scalar());

        let mut values = ValueMap::new();
        values.insert(x, vec![1.0, 2.0, 3.0]);
        assert_eq!(e1.evaluate(&values).unwrap()[0], 22.0);
    }
}
