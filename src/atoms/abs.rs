//! Elementwise absolute value.

use nalgebra_sparse::CscMatrix;

use super::atom::{Atom, AtomData};
use super::elementwise::{
    check_same_shape, elemwise_grad_to_diag, elemwise_map, unary_arg, unary_value,
};
use crate::canon::{ConeConstraint, LinExpr, Reduction};
use crate::dcp::Sign;
use crate::error::Result;
use crate::expr::{Array, Expr, Shape, VarAllocator};

/// Absolute value: |x| elementwise.
///
/// Properties:
/// - Curvature: Convex
/// - Sign: Non-negative
/// - Monotonicity: Increasing for x >= 0, decreasing for x <= 0
#[derive(Debug, Clone)]
pub struct Abs {
    args: [Expr; 1],
}

impl Abs {
    /// Absolute value of `x`.
    pub fn new(x: &Expr) -> Self {
        Abs {
            args: [x.clone()],
        }
    }

    /// Epigraph of |x|: t - x >= 0 and t + x >= 0, objective t.
    pub fn graph_implementation(
        args: &[LinExpr],
        shape: &Shape,
        vars: &VarAllocator,
    ) -> Result<Reduction> {
        let x = unary_arg("abs", args)?;
        check_same_shape(x, shape)?;

        let mut red = Reduction::new(LinExpr::zeros(shape.clone()));
        let t = red.aux_var(vars, shape);
        red.constraints.push(ConeConstraint::NonNeg { a: t.sub(x)? });
        red.constraints.push(ConeConstraint::NonNeg { a: t.add(x)? });
        red.expr = t;
        Ok(red)
    }
}

/// Elementwise absolute value of an expression.
pub fn abs(x: &Expr) -> Expr {
    Expr::atom(Abs::new(x))
}

impl Atom for Abs {
    fn name(&self) -> &'static str {
        "abs"
    }

    fn args(&self) -> &[Expr] {
        &self.args
    }

    fn shape(&self) -> Shape {
        self.args[0].shape()
    }

    fn numeric(&self, values: &[Array], _data: &[f64]) -> Result<Array> {
        elemwise_map(unary_value("abs", values)?, &self.shape(), f64::abs)
    }

    fn sign_from_args(&self) -> Sign {
        Sign::Nonnegative
    }

    fn is_atom_convex(&self) -> bool {
        true
    }

    fn is_atom_concave(&self) -> bool {
        false
    }

    fn is_incr(&self, idx: usize) -> bool {
        self.args.get(idx).map_or(false, Expr::is_nonneg)
    }

    fn is_decr(&self, idx: usize) -> bool {
        self.args.get(idx).map_or(false, Expr::is_nonpos)
    }

    fn partials(
        &self,
        values: &[Array],
        _data: &[f64],
    ) -> Result<Vec<Option<CscMatrix<f64>>>> {
        let x = unary_value("abs", values)?;
        // f64::signum(0.0) is 1.0
        let g = elemwise_grad_to_diag(x, |v| if v == 0.0 { 0.0 } else { v.signum() });
        Ok(vec![Some(g)])
    }

    fn reduce(
        &self,
        args: &[LinExpr],
        shape: &Shape,
        _data: &[AtomData],
        vars: &VarAllocator,
    ) -> Result<Reduction> {
        Abs::graph_implementation(args, shape, vars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dcp::Curvature;
    use crate::error::CvxError;
    use crate::expr::{nonneg_variable, nonpos_variable, variable, ExprId, ValueMap};

    #[test]
    fn test_abs_numeric() {
        let alloc = VarAllocator::new();
        let x = variable(&alloc, 3);
        let a = Abs::new(&x);
        let v = a.evaluate(&[Array::from_vec(vec![-2.0, 0.0, 1.5])]).unwrap();
        assert_eq!(v, Array::from_vec(vec![2.0, 0.0, 1.5]));
    }

    #[test]
    fn test_abs_oracle() {
        let alloc = VarAllocator::new();
        let x = variable(&alloc, 2);
        let e = abs(&x);
        assert_eq!(e.curvature(), Curvature::Convex);
        assert!(e.is_nonneg());

        assert!(Abs::new(&nonneg_variable(&alloc, 2)).is_incr(0));
        assert!(Abs::new(&nonpos_variable(&alloc, 2)).is_decr(0));
        let a = Abs::new(&x);
        assert!(!a.is_incr(0));
        assert!(!a.is_decr(0));
        assert!(!a.is_incr(1));
    }

    #[test]
    fn test_abs_grad() {
        let alloc = VarAllocator::new();
        let a = Abs::new(&variable(&alloc, 3));
        let g = a.grad(&[Array::from_vec(vec![-2.0, 0.0, 3.0])]).unwrap();
        let g = g[0].as_ref().unwrap();
        assert_eq!(g.get_entry(0, 0).unwrap().into_value(), -1.0);
        assert_eq!(g.get_entry(1, 1).unwrap().into_value(), 0.0);
        assert_eq!(g.get_entry(2, 2).unwrap().into_value(), 1.0);
    }

    #[test]
    fn test_abs_reduction() {
        let vars = VarAllocator::starting_at(100);
        let x = LinExpr::variable(ExprId::from_raw(1), Shape::vector(2));
        let red = Abs::graph_implementation(&[x], &Shape::vector(2), &vars).unwrap();
        assert_eq!(red.constraints.len(), 2);
        assert_eq!(red.aux_vars, vec![(ExprId::from_raw(100), Shape::vector(2))]);

        let mut values = ValueMap::new();
        values
            .insert(ExprId::from_raw(1), vec![-3.0, 2.0])
            .insert(ExprId::from_raw(100), vec![3.0, 2.0]);
        assert!(red.constraints.iter().all(|c| c.is_satisfied(&values, 1e-12).unwrap()));
        assert_eq!(red.objective_value(&values).unwrap(), Array::from_vec(vec![3.0, 2.0]));

        values.insert(ExprId::from_raw(100), vec![2.5, 2.0]);
        assert!(!red.constraints[1].is_satisfied(&values, 1e-12).unwrap());
    }

    #[test]
    fn test_abs_reduction_shape_mismatch() {
        let vars = VarAllocator::new();
        let x = LinExpr::variable(vars.fresh(), Shape::vector(2));
        let err = Abs::graph_implementation(&[x], &Shape::vector(3), &vars).unwrap_err();
        assert!(matches!(err, CvxError::ShapeMismatch { .. }));
    }
}
