//! The atom contract.

use std::fmt;

use nalgebra_sparse::CscMatrix;

use crate::canon::{LinExpr, Reduction};
use crate::dcp::Sign;
use crate::error::{CvxError, Result};
use crate::expr::{Array, Expr, Parameter, Shape, ValueMap, VarAllocator};

/// Data bound to an atom at construction time and handed back to its
/// reducer.
#[derive(Debug, Clone)]
pub enum AtomData {
    /// A literal value, embedded as a coefficient.
    Constant(f64),
    /// A parameter, embedded as a symbolic coefficient resolved at solve time.
    Parameter(Parameter),
}

impl AtomData {
    /// Current numeric value.
    pub fn value(&self) -> Result<f64> {
        self.resolve(&ValueMap::new())
    }

    /// Numeric value under `bindings`.
    ///
    /// A parameter takes its value in `bindings` if present and its own
    /// current value otherwise, the same rule `Expr::value` uses for
    /// parameter leaves.
    pub fn resolve(&self, bindings: &ValueMap) -> Result<f64> {
        match self {
            AtomData::Constant(v) => Ok(*v),
            AtomData::Parameter(p) => bindings
                .get(p.id())
                .cloned()
                .or_else(|| p.value())
                .and_then(|v| v.as_scalar())
                .ok_or_else(|| CvxError::MissingValue(format!("parameter {}", p.label()))),
        }
    }

    /// Scale a linear expression by this value.
    ///
    /// A constant is applied directly; a parameter stays symbolic.
    pub fn scale(&self, expr: &LinExpr) -> Result<LinExpr> {
        match self {
            AtomData::Constant(v) => Ok(expr.scale(*v)),
            AtomData::Parameter(p) => expr.mul_param(p),
        }
    }
}

/// Interface every atom kind implements.
///
/// Atoms are immutable once constructed. Constructors run the atom's
/// validation before returning, so any atom value reaching these methods has
/// well-formed data.
pub trait Atom: fmt::Debug + Send + Sync {
    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Argument expressions, in order.
    fn args(&self) -> &[Expr];

    /// Output shape.
    fn shape(&self) -> Shape;

    /// Numeric value for the given argument values.
    ///
    /// `data` holds the resolved values of [`Atom::data`], in order. Called
    /// through [`Atom::evaluate`], which has already checked arity and
    /// shapes.
    fn numeric(&self, values: &[Array], data: &[f64]) -> Result<Array>;

    /// Sign of the output, independent of argument values.
    fn sign_from_args(&self) -> Sign;

    /// Is the atom convex?
    fn is_atom_convex(&self) -> bool;

    /// Is the atom concave?
    fn is_atom_concave(&self) -> bool;

    /// Is the atom non-decreasing in argument `idx`?
    fn is_incr(&self, idx: usize) -> bool;

    /// Is the atom non-increasing in argument `idx`?
    fn is_decr(&self, idx: usize) -> bool;

    /// Subgradient with respect to each argument.
    ///
    /// Entry `(j, k)` of the matrix for argument `i` is the derivative of
    /// output element `j` with respect to element `k` of argument `i`, both
    /// flattened column-major. `data` is resolved as for [`Atom::numeric`].
    fn partials(&self, values: &[Array], data: &[f64]) -> Result<Vec<Option<CscMatrix<f64>>>>;

    /// Data the reducer needs besides the argument handles.
    fn data(&self) -> Vec<AtomData> {
        Vec::new()
    }

    /// Reduce the atom to an affine expression and cone constraints.
    ///
    /// `args` are the canonicalized arguments, `shape` the output shape and
    /// `data` what [`Atom::data`] returned. Fresh variables come from `vars`.
    fn reduce(
        &self,
        args: &[LinExpr],
        shape: &Shape,
        data: &[AtomData],
        vars: &VarAllocator,
    ) -> Result<Reduction>;

    /// Check argument values against the atom's arguments.
    ///
    /// Each value must have its argument's shape. Single-element values are
    /// interchangeable.
    fn check_values(&self, values: &[Array]) -> Result<()> {
        let args = self.args();
        if values.len() != args.len() {
            return Err(CvxError::ArityMismatch {
                atom: self.name(),
                expected: args.len(),
                got: values.len(),
            });
        }
        for (arg, value) in args.iter().zip(values) {
            let shape = arg.shape();
            let got = value.shape();
            if got != shape && !(shape.size() == 1 && value.size() == 1) {
                return Err(CvxError::shape_mismatch(shape, got));
            }
        }
        Ok(())
    }

    /// Values of [`Atom::data`] under `bindings`.
    fn resolve_data(&self, bindings: &ValueMap) -> Result<Vec<f64>> {
        self.data().iter().map(|d| d.resolve(bindings)).collect()
    }

    /// Numeric value after checking arity and shapes.
    ///
    /// Parameters in the atom's data use their current value.
    fn evaluate(&self, values: &[Array]) -> Result<Array> {
        self.evaluate_bound(values, &ValueMap::new())
    }

    /// Numeric value with the atom's parameters resolved through `bindings`.
    fn evaluate_bound(&self, values: &[Array], bindings: &ValueMap) -> Result<Array> {
        self.check_values(values)?;
        self.numeric(values, &self.resolve_data(bindings)?)
    }

    /// Subgradient after checking arity and shapes.
    ///
    /// Constant arguments get `None`: the map is identically zero.
    fn grad(&self, values: &[Array]) -> Result<Vec<Option<CscMatrix<f64>>>> {
        self.grad_bound(values, &ValueMap::new())
    }

    /// Subgradient with the atom's parameters resolved through `bindings`.
    fn grad_bound(
        &self,
        values: &[Array],
        bindings: &ValueMap,
    ) -> Result<Vec<Option<CscMatrix<f64>>>> {
        self.check_values(values)?;
        let partials = self.partials(values, &self.resolve_data(bindings)?)?;
        Ok(partials
            .into_iter()
            .zip(self.args())
            .map(|(g, arg)| if arg.is_constant() { None } else { g })
            .collect())
    }
}
