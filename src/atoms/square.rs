//! Elementwise square.

use nalgebra_sparse::CscMatrix;

use super::atom::{Atom, AtomData};
use super::elementwise::{
    check_same_shape, elemwise_grad_to_diag, elemwise_map, unary_arg, unary_value,
};
use crate::canon::{ConeConstraint, LinExpr, Reduction};
use crate::dcp::Sign;
use crate::error::Result;
use crate::expr::{Array, Expr, Shape, VarAllocator};

/// Square: x^2 elementwise.
///
/// Properties:
/// - Curvature: Convex
/// - Sign: Non-negative
/// - Monotonicity: Increasing for x >= 0, decreasing for x <= 0
#[derive(Debug, Clone)]
pub struct Square {
    args: [Expr; 1],
}

impl Square {
    /// Square of `x`.
    pub fn new(x: &Expr) -> Self {
        Square {
            args: [x.clone()],
        }
    }

    /// Epigraph of x^2 as one second-order cone per element:
    /// ||(2x, t - 1)||_2 <= t + 1, which holds iff x^2 <= t.
    pub fn graph_implementation(
        args: &[LinExpr],
        shape: &Shape,
        vars: &VarAllocator,
    ) -> Result<Reduction> {
        let x = unary_arg("square", args)?;
        check_same_shape(x, shape)?;

        let mut red = Reduction::new(LinExpr::zeros(shape.clone()));
        let t = red.aux_var(vars, shape);
        let one = LinExpr::scalar(1.0);
        red.constraints.push(ConeConstraint::SocElemwise {
            t: t.add(&one)?,
            xs: vec![x.scale(2.0), t.sub(&one)?],
        });
        red.expr = t;
        Ok(red)
    }
}

/// Elementwise square of an expression.
pub fn square(x: &Expr) -> Expr {
    Expr::atom(Square::new(x))
}

impl Atom for Square {
    fn name(&self) -> &'static str {
        "square"
    }

    fn args(&self) -> &[Expr] {
        &self.args
    }

    fn shape(&self) -> Shape {
        self.args[0].shape()
    }

    fn numeric(&self, values: &[Array], _data: &[f64]) -> Result<Array> {
        elemwise_map(unary_value("square", values)?, &self.shape(), |v| v * v)
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
        let x = unary_value("square", values)?;
        Ok(vec![Some(elemwise_grad_to_diag(x, |v| 2.0 * v))])
    }

    fn reduce(
        &self,
        args: &[LinExpr],
        shape: &Shape,
        _data: &[AtomData],
        vars: &VarAllocator,
    ) -> Result<Reduction> {
        Square::graph_implementation(args, shape, vars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dcp::Curvature;
    use crate::expr::{constant, variable, ExprId, ValueMap};

    #[test]
    fn test_square_numeric_and_grad() {
        let alloc = VarAllocator::new();
        let s = Square::new(&variable(&alloc, 2));
        let x = Array::from_vec(vec![-3.0, 0.5]);
        assert_eq!(s.evaluate(&[x.clone()]).unwrap(), Array::from_vec(vec![9.0, 0.25]));

        let g = s.grad(&[x]).unwrap();
        let g = g[0].as_ref().unwrap();
        assert_eq!(g.get_entry(0, 0).unwrap().into_value(), -6.0);
        assert_eq!(g.get_entry(1, 1).unwrap().into_value(), 1.0);
    }

    #[test]
    fn test_square_of_constant() {
        let e = square(&constant(-2.0));
        assert_eq!(e.curvature(), Curvature::Constant);
        assert_eq!(e.value(&ValueMap::new()).unwrap(), Array::Scalar(4.0));
        let Expr::Atom(atom) = &e else {
            panic!("expected atom");
        };
        assert!(atom.grad(&[Array::Scalar(-2.0)]).unwrap()[0].is_none());
    }

    #[test]
    fn test_square_reduction_tight_at_epigraph() {
        let vars = VarAllocator::starting_at(50);
        let x_id = ExprId::from_raw(1);
        let x = LinExpr::variable(x_id, Shape::vector(3));
        let red = Square::graph_implementation(&[x], &Shape::vector(3), &vars).unwrap();
        assert_eq!(red.constraints.len(), 1);
        assert_eq!(red.constraints[0].size(), 3);
        assert!(red.constraints[0].check_shapes().is_ok());

        let t_id = ExprId::from_raw(50);
        let mut values = ValueMap::new();
        values
            .insert(x_id, vec![-2.0, 0.0, 1.5])
            .insert(t_id, vec![4.0, 0.0, 2.25]);
        assert!(red.constraints[0].is_satisfied(&values, 1e-9).unwrap());

        // t below x^2 leaves the cone
        values.insert(t_id, vec![3.9, 0.0, 2.25]);
        assert!(!red.constraints[0].is_satisfied(&values, 1e-9).unwrap());
    }
}
