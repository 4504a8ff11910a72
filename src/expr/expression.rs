//! Core expression types for cvxatoms.
//!
//! The `Expr` enum is the argument type atoms are built over. It covers the
//! leaves (variables, constants, parameters), the affine operations needed to
//! combine them, and an open `Atom` variant that holds any type implementing
//! the [`Atom`] contract. Expressions are immutable and use `Arc` for sharing.

use std::sync::Arc;

use nalgebra::{DMatrix, DVector};

use super::id::ExprId;
use super::parameter::Parameter;
use super::shape::Shape;
use super::values::ValueMap;
use crate::atoms::{Atom, AtomData};
use crate::error::{CvxError, Result};

/// Numeric value of an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Array {
    /// Scalar value.
    Scalar(f64),
    /// Vector value.
    Vector(DVector<f64>),
    /// Dense matrix value.
    Dense(DMatrix<f64>),
}

impl Array {
    /// Get the shape of the array.
    pub fn shape(&self) -> Shape {
        match self {
            Array::Scalar(_) => Shape::scalar(),
            Array::Vector(v) => Shape::vector(v.len()),
            Array::Dense(m) => Shape::matrix(m.nrows(), m.ncols()),
        }
    }

    /// Get the total number of elements.
    pub fn size(&self) -> usize {
        match self {
            Array::Scalar(_) => 1,
            Array::Vector(v) => v.len(),
            Array::Dense(m) => m.len(),
        }
    }

    /// Try to get as a scalar value.
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Array::Scalar(v) => Some(*v),
            Array::Vector(v) if v.len() == 1 => Some(v[0]),
            Array::Dense(m) if m.len() == 1 => Some(m[(0, 0)]),
            _ => None,
        }
    }

    /// Check if all elements are non-negative.
    pub fn is_nonneg(&self) -> bool {
        self.iter().all(|v| v >= 0.0)
    }

    /// Check if all elements are non-positive.
    pub fn is_nonpos(&self) -> bool {
        self.iter().all(|v| v <= 0.0)
    }

    /// Iterate over the elements in column-major order.
    pub fn iter(&self) -> Box<dyn Iterator<Item = f64> + '_> {
        match self {
            Array::Scalar(v) => Box::new(std::iter::once(*v)),
            Array::Vector(v) => Box::new(v.iter().copied()),
            Array::Dense(m) => Box::new(m.iter().copied()),
        }
    }

    /// Apply `f` to every element, keeping the shape.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Array {
        match self {
            Array::Scalar(v) => Array::Scalar(f(*v)),
            Array::Vector(v) => Array::Vector(v.map(f)),
            Array::Dense(m) => Array::Dense(m.map(f)),
        }
    }

    /// Combine two arrays elementwise, broadcasting single-element operands.
    pub fn zip_map(&self, other: &Array, f: impl Fn(f64, f64) -> f64) -> Result<Array> {
        let shape = self
            .shape()
            .broadcast(&other.shape())
            .ok_or_else(|| CvxError::shape_mismatch(self.shape(), other.shape()))?;
        let a = self.to_vector();
        let b = other.to_vector();
        let values: Vec<f64> = (0..shape.size())
            .map(|i| {
                let x = if a.len() == 1 { a[0] } else { a[i] };
                let y = if b.len() == 1 { b[0] } else { b[i] };
                f(x, y)
            })
            .collect();
        Array::from_vector(DVector::from_vec(values), &shape)
    }

    /// Flatten to a column-major vector.
    pub fn to_vector(&self) -> DVector<f64> {
        DVector::from_iterator(self.size(), self.iter())
    }

    /// Rebuild an array of the given shape from column-major values.
    pub fn from_vector(values: DVector<f64>, shape: &Shape) -> Result<Array> {
        if values.len() != shape.size() {
            return Err(CvxError::shape_mismatch(
                format!("{} values", shape.size()),
                format!("{} values", values.len()),
            ));
        }
        Ok(match shape.ndim() {
            0 => Array::Scalar(values[0]),
            1 => Array::Vector(values),
            _ => Array::Dense(DMatrix::from_column_slice(
                shape.rows(),
                shape.cols(),
                values.as_slice(),
            )),
        })
    }

    /// Create from a vector.
    pub fn from_vec(v: Vec<f64>) -> Self {
        Array::Vector(DVector::from_vec(v))
    }
}

impl From<f64> for Array {
    fn from(v: f64) -> Self {
        Array::Scalar(v)
    }
}

impl From<Vec<f64>> for Array {
    fn from(v: Vec<f64>) -> Self {
        Array::from_vec(v)
    }
}

impl From<DVector<f64>> for Array {
    fn from(v: DVector<f64>) -> Self {
        Array::Vector(v)
    }
}

impl From<DMatrix<f64>> for Array {
    fn from(m: DMatrix<f64>) -> Self {
        Array::Dense(m)
    }
}

/// Data for a variable expression.
#[derive(Debug, Clone)]
pub struct VariableData {
    /// Unique identifier.
    pub id: ExprId,
    /// Shape of the variable.
    pub shape: Shape,
    /// Optional name for display.
    pub name: Option<String>,
    /// Variable is known to be non-negative.
    pub nonneg: bool,
    /// Variable is known to be non-positive.
    pub nonpos: bool,
}

/// The core expression type.
#[derive(Debug, Clone)]
pub enum Expr {
    // ========== Leaf nodes ==========
    /// A decision variable.
    Variable(VariableData),
    /// A constant value.
    Constant(Array),
    /// A parameter: constant during a solve, value bound at solve time.
    Parameter(Parameter),

    // ========== Affine operations ==========
    /// Addition: a + b
    Add(Arc<Expr>, Arc<Expr>),
    /// Negation: -a
    Neg(Arc<Expr>),
    /// Elementwise multiplication; affine only when one side is constant.
    Mul(Arc<Expr>, Arc<Expr>),

    // ========== Atoms ==========
    /// Any function implementing the atom contract.
    Atom(Arc<dyn Atom>),
}

impl Expr {
    /// Get the shape of the expression.
    pub fn shape(&self) -> Shape {
        match self {
            Expr::Variable(v) => v.shape.clone(),
            Expr::Constant(c) => c.shape(),
            Expr::Parameter(p) => p.shape().clone(),
            Expr::Add(a, b) | Expr::Mul(a, b) => a
                .shape()
                .broadcast(&b.shape())
                .unwrap_or_else(Shape::scalar),
            Expr::Neg(a) => a.shape(),
            Expr::Atom(atom) => atom.shape(),
        }
    }

    /// Wrap an atom as an expression node.
    pub fn atom(atom: impl Atom + 'static) -> Expr {
        Expr::Atom(Arc::new(atom))
    }

    /// Get the unique ID if this is a variable.
    pub fn variable_id(&self) -> Option<ExprId> {
        match self {
            Expr::Variable(v) => Some(v.id),
            _ => None,
        }
    }

    /// Check if this is a scalar expression.
    pub fn is_scalar(&self) -> bool {
        self.shape().is_scalar()
    }

    /// Check if the expression contains no variables.
    ///
    /// Parameters count as constant: their value is fixed during a solve.
    pub fn is_constant(&self) -> bool {
        match self {
            Expr::Variable(_) => false,
            Expr::Constant(_) | Expr::Parameter(_) => true,
            Expr::Add(a, b) | Expr::Mul(a, b) => a.is_constant() && b.is_constant(),
            Expr::Neg(a) => a.is_constant(),
            Expr::Atom(atom) => atom.args().iter().all(Expr::is_constant),
        }
    }

    /// Get the constant value if this is a constant leaf.
    pub fn constant_value(&self) -> Option<&Array> {
        match self {
            Expr::Constant(c) => Some(c),
            _ => None,
        }
    }

    /// Collect all variables in this expression, sorted by id.
    pub fn variables(&self) -> Vec<ExprId> {
        let mut vars = Vec::new();
        self.visit_leaves(&mut |e| {
            if let Expr::Variable(v) = e {
                vars.push(v.id);
            }
        });
        vars.sort();
        vars.dedup();
        vars
    }

    /// Collect all parameters in this expression, sorted by id.
    ///
    /// Parameters bound into atom data (such as a Huber threshold) count.
    pub fn parameters(&self) -> Vec<Parameter> {
        let mut params = Vec::new();
        self.visit_leaves(&mut |e| {
            if let Expr::Parameter(p) = e {
                params.push(p.clone());
            }
        });
        params.sort_by_key(|p| p.id());
        params.dedup_by_key(|p| p.id());
        params
    }

    fn visit_leaves(&self, f: &mut dyn FnMut(&Expr)) {
        match self {
            Expr::Variable(_) | Expr::Constant(_) | Expr::Parameter(_) => f(self),
            Expr::Add(a, b) | Expr::Mul(a, b) => {
                a.visit_leaves(f);
                b.visit_leaves(f);
            }
            Expr::Neg(a) => a.visit_leaves(f),
            Expr::Atom(atom) => {
                for arg in atom.args() {
                    arg.visit_leaves(f);
                }
                for data in atom.data() {
                    if let AtomData::Parameter(p) = data {
                        f(&Expr::Parameter(p));
                    }
                }
            }
        }
    }

    /// Evaluate the expression numerically.
    ///
    /// Variables are looked up in `values`; parameters, including those in
    /// atom data, use the value in `values` if present and their own current
    /// value otherwise.
    pub fn value(&self, values: &ValueMap) -> Result<Array> {
        match self {
            Expr::Variable(v) => values.get(v.id).cloned().ok_or_else(|| {
                CvxError::MissingValue(format!(
                    "variable {}",
                    v.name.clone().unwrap_or_else(|| v.id.to_string())
                ))
            }),
            Expr::Constant(c) => Ok(c.clone()),
            Expr::Parameter(p) => values
                .get(p.id())
                .cloned()
                .or_else(|| p.value())
                .ok_or_else(|| CvxError::MissingValue(format!("parameter {}", p.label()))),
            Expr::Add(a, b) => a.value(values)?.zip_map(&b.value(values)?, |x, y| x + y),
            Expr::Neg(a) => Ok(a.value(values)?.map(|x| -x)),
            Expr::Mul(a, b) => a.value(values)?.zip_map(&b.value(values)?, |x, y| x * y),
            Expr::Atom(atom) => {
                let args = atom
                    .args()
                    .iter()
                    .map(|arg| arg.value(values))
                    .collect::<Result<Vec<_>>>()?;
                atom.evaluate_bound(&args, values)
            }
        }
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::Constant(Array::Scalar(value))
    }
}

impl From<&Expr> for Expr {
    fn from(expr: &Expr) -> Self {
        expr.clone()
    }
}

impl From<Parameter> for Expr {
    fn from(p: Parameter) -> Self {
        Expr::Parameter(p)
    }
}

impl From<&Parameter> for Expr {
    fn from(p: &Parameter) -> Self {
        Expr::Parameter(p.clone())
    }
}
