//! The Huber penalty.
//!
//! ```text
//! huber(x, M) = x^2            if |x| <= M
//!               2M|x| - M^2    if |x| >  M
//! ```
//!
//! Quadratic near zero and linear in the tails, so large residuals count
//! less than under least squares. Applied elementwise.
//!
//! The reduction uses the identity
//! `huber(x, M) = min { n^2 + 2M|s| : n + s = x }`, built from the square
//! and abs reductions plus one linking equality.

use nalgebra_sparse::CscMatrix;
use tracing::trace;

use super::abs::Abs;
use super::atom::{Atom, AtomData};
use super::elementwise::{
    check_same_shape, elemwise_grad_to_diag, elemwise_map, unary_arg, unary_value,
};
use super::square::Square;
use crate::canon::{ConeConstraint, LinExpr, Reduction};
use crate::dcp::Sign;
use crate::error::{CvxError, Result};
use crate::expr::{Array, Expr, Shape, ValueMap, VarAllocator};

/// Default threshold when none is given.
pub const DEFAULT_M: f64 = 1.0;

/// Scalar Huber function.
pub fn huber_value(x: f64, m: f64) -> f64 {
    let a = x.abs();
    if a <= m {
        x * x
    } else {
        2.0 * m * a - m * m
    }
}

/// Elementwise Huber penalty with threshold `M`.
///
/// Properties:
/// - Curvature: Convex
/// - Sign: Non-negative
/// - Monotonicity: Increasing for x >= 0, decreasing for x <= 0
#[derive(Debug, Clone)]
pub struct Huber {
    args: [Expr; 1],
    m: AtomData,
}

impl Huber {
    /// Build the atom, validating `M`.
    ///
    /// # Errors
    ///
    /// Returns [`CvxError::InvalidParameter`] if `M` depends on a variable,
    /// is not a scalar, is not known to be non-negative, or mixes a
    /// parameter with other terms.
    pub fn new(x: &Expr, m: impl Into<Expr>) -> Result<Self> {
        let m = resolve_threshold(&m.into())?;
        Ok(Huber {
            args: [x.clone()],
            m,
        })
    }

    /// The threshold bound at construction.
    pub fn threshold(&self) -> &AtomData {
        &self.m
    }

    /// Reduce `huber(x, M)` given the handle for `x` and `data = [M]`.
    pub fn graph_implementation(
        args: &[LinExpr],
        shape: &Shape,
        data: &[AtomData],
        vars: &VarAllocator,
    ) -> Result<Reduction> {
        let x = unary_arg("huber", args)?;
        check_same_shape(x, shape)?;
        let m = match data {
            [m] => m,
            _ => {
                return Err(CvxError::MalformedData(format!(
                    "huber expects [M], got {} entries",
                    data.len()
                )))
            }
        };

        let mut red = Reduction::new(LinExpr::zeros(shape.clone()));
        let n = red.aux_var(vars, shape);
        let s = red.aux_var(vars, shape);

        let n2 = red.absorb(Square::graph_implementation(
            std::slice::from_ref(&n),
            shape,
            vars,
        )?);
        let abs_s = red.absorb(Abs::graph_implementation(
            std::slice::from_ref(&s),
            shape,
            vars,
        )?);

        red.expr = n2.add(&m.scale(&abs_s)?.scale(2.0))?;
        red.constraints.push(ConeConstraint::Zero {
            a: x.sub(&n.add(&s)?)?,
        });
        trace!(
            constraints = red.constraints.len(),
            aux_vars = red.aux_vars.len(),
            "reduced huber"
        );
        Ok(red)
    }
}

/// Check `M` and resolve it to a literal or a parameter reference.
fn resolve_threshold(m: &Expr) -> Result<AtomData> {
    if !m.variables().is_empty() {
        return Err(CvxError::InvalidParameter(
            "M must be constant, it depends on a variable".into(),
        ));
    }
    if m.shape().size() != 1 {
        return Err(CvxError::InvalidParameter(format!(
            "M must be scalar, got shape {}",
            m.shape()
        )));
    }

    if m.parameters().is_empty() {
        let value = m.value(&ValueMap::new())?.as_scalar().unwrap_or(f64::NAN);
        // NaN fails here too
        if !(value >= 0.0) {
            return Err(CvxError::InvalidParameter(format!(
                "M must be nonnegative, got {value}"
            )));
        }
        return Ok(AtomData::Constant(value));
    }

    if !m.is_nonneg() {
        return Err(CvxError::InvalidParameter(
            "M must be nonnegative, parameter has no nonneg declaration".into(),
        ));
    }
    match m {
        Expr::Parameter(p) => Ok(AtomData::Parameter(p.clone())),
        _ => Err(CvxError::InvalidParameter(
            "M must be a literal or a single parameter".into(),
        )),
    }
}

fn resolved_threshold(data: &[f64]) -> Result<f64> {
    match data {
        [m] => Ok(*m),
        _ => Err(CvxError::MalformedData(format!(
            "huber expects [M], got {} entries",
            data.len()
        ))),
    }
}

/// Huber penalty of `x` with threshold `m`.
pub fn huber(x: &Expr, m: impl Into<Expr>) -> Result<Expr> {
    Ok(Expr::atom(Huber::new(x, m)?))
}

/// Huber penalty of `x` with `M = 1`.
pub fn huber_default(x: &Expr) -> Result<Expr> {
    huber(x, DEFAULT_M)
}

impl Atom for Huber {
    fn name(&self) -> &'static str {
        "huber"
    }

    fn args(&self) -> &[Expr] {
        &self.args
    }

    fn shape(&self) -> Shape {
        self.args[0].shape()
    }

    fn numeric(&self, values: &[Array], data: &[f64]) -> Result<Array> {
        let x = unary_value("huber", values)?;
        let m = resolved_threshold(data)?;
        elemwise_map(x, &self.shape(), |v| huber_value(v, m))
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
        data: &[f64],
    ) -> Result<Vec<Option<CscMatrix<f64>>>> {
        let x = unary_value("huber", values)?;
        let m = resolved_threshold(data)?;
        let g = elemwise_grad_to_diag(x, |v| {
            let sign = if v == 0.0 { 0.0 } else { v.signum() };
            2.0 * sign * v.abs().min(m)
        });
        Ok(vec![Some(g)])
    }

    fn data(&self) -> Vec<AtomData> {
        vec![self.m.clone()]
    }

    fn reduce(
        &self,
        args: &[LinExpr],
        shape: &Shape,
        data: &[AtomData],
        vars: &VarAllocator,
    ) -> Result<Reduction> {
        Huber::graph_implementation(args, shape, data, vars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dcp::Curvature;
    use crate::expr::{
        constant, constant_vec, nonneg_variable, nonpos_variable, variable, ExprId,
        ParameterBuilder,
    };

    const TOL: f64 = 1e-12;

    fn eval(x: f64, m: f64) -> f64 {
        let alloc = VarAllocator::new();
        let h = Huber::new(&variable(&alloc, ()), m).unwrap();
        h.evaluate(&[Array::Scalar(x)]).unwrap().as_scalar().unwrap()
    }

    #[test]
    fn test_huber_branches() {
        assert!((eval(3.0, 1.0) - 5.0).abs() < TOL);
        assert!((eval(0.5, 1.0) - 0.25).abs() < TOL);
        assert!((eval(-3.0, 1.0) - 5.0).abs() < TOL);
        // knee
        assert!((eval(2.0, 2.0) - 4.0).abs() < TOL);
        assert!((huber_value(2.0 + 1e-9, 2.0) - 4.0).abs() < 1e-7);
    }

    #[test]
    fn test_huber_zero_threshold() {
        assert_eq!(eval(3.0, 0.0), 0.0);
        assert_eq!(eval(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_huber_vector() {
        let alloc = VarAllocator::new();
        let h = Huber::new(&variable(&alloc, 3), 1.0).unwrap();
        let v = h.evaluate(&[Array::from_vec(vec![-2.0, 0.5, 1.0])]).unwrap();
        assert_eq!(v, Array::from_vec(vec![3.0, 0.25, 1.0]));
        assert!(h.evaluate(&[Array::from_vec(vec![1.0, 2.0])]).is_err());
    }

    #[test]
    fn test_huber_rejects_negative_m() {
        let alloc = VarAllocator::new();
        let x = variable(&alloc, ());
        let err = huber(&x, -1.0).unwrap_err();
        assert!(matches!(err, CvxError::InvalidParameter(_)));
        assert!(err.to_string().contains("nonnegative"));
        assert!(huber(&x, f64::NAN).is_err());
    }

    #[test]
    fn test_huber_rejects_variable_m() {
        let alloc = VarAllocator::new();
        let x = variable(&alloc, ());
        let m = nonneg_variable(&alloc, ());
        let err = huber(&x, &m).unwrap_err();
        assert!(err.to_string().contains("constant"));
    }

    #[test]
    fn test_huber_rejects_vector_m() {
        let alloc = VarAllocator::new();
        let x = variable(&alloc, 2);
        let err = huber(&x, constant_vec(vec![1.0, 2.0])).unwrap_err();
        assert!(matches!(err, CvxError::InvalidParameter(_)));
        assert!(err.to_string().contains("scalar"));
    }

    #[test]
    fn test_huber_parameter_m() {
        let alloc = VarAllocator::new();
        let x = variable(&alloc, ());
        let p = ParameterBuilder::scalar().nonneg().build(&alloc).unwrap();
        let h = Huber::new(&x, &p).unwrap();
        assert!(matches!(h.threshold(), AtomData::Parameter(_)));

        // unbound
        assert!(matches!(
            h.evaluate(&[Array::Scalar(3.0)]),
            Err(CvxError::MissingValue(_))
        ));
        p.set_value(2.0).unwrap();
        assert_eq!(h.evaluate(&[Array::Scalar(3.0)]).unwrap(), Array::Scalar(8.0));
    }

    #[test]
    fn test_huber_rejects_unsigned_parameter() {
        let alloc = VarAllocator::new();
        let x = variable(&alloc, ());
        let p = ParameterBuilder::scalar().value(1.0).build(&alloc).unwrap();
        assert!(huber(&x, &p).is_err());
    }

    #[test]
    fn test_huber_rejects_compound_parameter() {
        let alloc = VarAllocator::new();
        let x = variable(&alloc, ());
        let p = ParameterBuilder::scalar().nonneg().build(&alloc).unwrap();
        let m = Expr::Mul(
            std::sync::Arc::new(constant(2.0)),
            std::sync::Arc::new(Expr::from(&p)),
        );
        let err = huber(&x, m).unwrap_err();
        assert!(err.to_string().contains("single parameter"));
    }

    #[test]
    fn test_huber_oracle() {
        let alloc = VarAllocator::new();
        let x = variable(&alloc, 2);
        let h = Huber::new(&x, 1.0).unwrap();
        assert_eq!(h.sign_from_args(), Sign::Nonnegative);
        assert!(h.is_atom_convex());
        assert!(!h.is_atom_concave());
        assert!(!h.is_incr(0));
        assert!(!h.is_decr(0));

        let pos = Huber::new(&nonneg_variable(&alloc, 2), 1.0).unwrap();
        assert!(pos.is_incr(0));
        assert!(!pos.is_decr(0));
        let neg = Huber::new(&nonpos_variable(&alloc, 2), 1.0).unwrap();
        assert!(neg.is_decr(0));
        assert!(!neg.is_incr(0));

        assert_eq!(huber_default(&x).unwrap().curvature(), Curvature::Convex);
    }

    #[test]
    fn test_huber_grad() {
        let alloc = VarAllocator::new();
        let h = Huber::new(&variable(&alloc, 4), 1.0).unwrap();
        let g = h.grad(&[Array::from_vec(vec![3.0, -3.0, 0.5, 0.0])]).unwrap();
        let g = g[0].as_ref().unwrap();
        assert_eq!(g.nrows(), 4);
        assert_eq!(g.ncols(), 4);
        assert_eq!(g.get_entry(0, 0).unwrap().into_value(), 2.0);
        assert_eq!(g.get_entry(1, 1).unwrap().into_value(), -2.0);
        assert_eq!(g.get_entry(2, 2).unwrap().into_value(), 1.0);
        assert_eq!(g.get_entry(3, 3).unwrap().into_value(), 0.0);
        assert_eq!(g.get_entry(0, 1).unwrap().into_value(), 0.0);
    }

    #[test]
    fn test_huber_data() {
        let alloc = VarAllocator::new();
        let h = Huber::new(&variable(&alloc, ()), 2.5).unwrap();
        let data = h.data();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].value().unwrap(), 2.5);
    }

    #[test]
    fn test_huber_reduction_layout() {
        let vars = VarAllocator::starting_at(10);
        let x = LinExpr::variable(ExprId::from_raw(1), Shape::vector(2));
        let red = Huber::graph_implementation(
            &[x],
            &Shape::vector(2),
            &[AtomData::Constant(1.0)],
            &vars,
        )
        .unwrap();

        let ids: Vec<u64> = red.aux_vars.iter().map(|(id, _)| id.raw()).collect();
        assert_eq!(ids, vec![10, 11, 12, 13]);
        assert!(red.aux_vars.iter().all(|(_, s)| *s == Shape::vector(2)));

        assert_eq!(red.constraints.len(), 4);
        assert!(matches!(red.constraints[0], ConeConstraint::SocElemwise { .. }));
        assert!(matches!(red.constraints[1], ConeConstraint::NonNeg { .. }));
        assert!(matches!(red.constraints[2], ConeConstraint::NonNeg { .. }));
        assert!(matches!(red.constraints[3], ConeConstraint::Zero { .. }));
        assert_eq!(
            red.expr.variables(),
            vec![ExprId::from_raw(12), ExprId::from_raw(13)]
        );
    }

    #[test]
    fn test_huber_reduction_malformed_data() {
        let vars = VarAllocator::new();
        let x = LinExpr::variable(vars.fresh(), Shape::scalar());
        let err = Huber::graph_implementation(&[x.clone()], &Shape::scalar(), &[], &vars)
            .unwrap_err();
        assert!(matches!(err, CvxError::MalformedData(_)));

        let data = [AtomData::Constant(1.0)];
        let err = Huber::graph_implementation(&[x], &Shape::vector(2), &data, &vars).unwrap_err();
        assert!(matches!(err, CvxError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_huber_bound_threshold_overrides_current_value() {
        let alloc = VarAllocator::new();
        let x = variable(&alloc, ());
        let p = ParameterBuilder::scalar().nonneg().value(1.0).build(&alloc).unwrap();
        let h = Huber::new(&x, &p).unwrap();

        let mut bindings = ValueMap::new();
        bindings.insert(p.id(), 2.0);
        let x_val = [Array::Scalar(3.0)];
        assert_eq!(h.evaluate(&x_val).unwrap(), Array::Scalar(5.0));
        assert_eq!(h.evaluate_bound(&x_val, &bindings).unwrap(), Array::Scalar(8.0));

        let g = h.grad_bound(&x_val, &bindings).unwrap();
        assert_eq!(g[0].as_ref().unwrap().get_entry(0, 0).unwrap().into_value(), 4.0);
    }

    #[test]
    fn test_huber_rejects_reshaped_values() {
        let alloc = VarAllocator::new();
        let h = Huber::new(&variable(&alloc, (2, 2)), 1.0).unwrap();
        let flat = Array::from_vec(vec![1.0, 2.0, 3.0, 4.0]);
        assert!(matches!(
            h.evaluate(&[flat]),
            Err(CvxError::ShapeMismatch { .. })
        ));

        let square = Array::Dense(nalgebra::DMatrix::from_element(2, 2, 2.0));
        assert_eq!(h.evaluate(&[square]).unwrap().shape(), Shape::matrix(2, 2));
    }

    #[test]
    fn test_huber_single_element_value_takes_atom_shape() {
        let alloc = VarAllocator::new();
        let h = Huber::new(&variable(&alloc, ()), 1.0).unwrap();
        let v = h.evaluate(&[Array::from_vec(vec![3.0])]).unwrap();
        assert_eq!(v, Array::Scalar(5.0));
    }
}
