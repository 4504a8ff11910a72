//! The reduced graph: an affine expression plus the constraints and
//! auxiliary variables that make it equal, at the optimum, to the expression
//! it replaces.

use tracing::trace;

use super::cone::{worst_violation, ConeConstraint};
use super::lin_expr::LinExpr;
use crate::error::Result;
use crate::expr::{Array, ExprId, Shape, ValueMap, VarAllocator};

/// Settings for checking a reduced graph at a concrete point.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Absolute slack allowed on cone membership.
    pub feasibility_tol: f64,
    /// Verify constraint expression sizes before evaluating.
    pub check_shapes: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            feasibility_tol: 1e-8,
            check_shapes: true,
        }
    }
}

/// Result of reducing an atom or canonicalizing an expression.
#[derive(Debug, Clone)]
pub struct Reduction {
    /// The affine replacement expression.
    pub expr: LinExpr,
    /// Constraints introduced by the reduction, in the order produced.
    pub constraints: Vec<ConeConstraint>,
    /// Auxiliary variables introduced by the reduction, in allocation order.
    pub aux_vars: Vec<(ExprId, Shape)>,
}

impl Reduction {
    /// Create a reduction with no constraints or auxiliary variables.
    pub fn new(expr: LinExpr) -> Self {
        Reduction {
            expr,
            constraints: Vec::new(),
            aux_vars: Vec::new(),
        }
    }

    /// Allocate an auxiliary variable scoped to this reduction.
    pub fn aux_var(&mut self, vars: &VarAllocator, shape: &Shape) -> LinExpr {
        let id = vars.fresh();
        trace!(id = id.raw(), shape = %shape, "allocated auxiliary variable");
        self.aux_vars.push((id, shape.clone()));
        LinExpr::variable(id, shape.clone())
    }

    /// Append a sub-reduction's constraints and auxiliary variables, and
    /// return its expression.
    pub fn absorb(&mut self, other: Reduction) -> LinExpr {
        self.constraints.extend(other.constraints);
        self.aux_vars.extend(other.aux_vars);
        other.expr
    }

    /// Check if an id belongs to one of this reduction's auxiliary variables.
    pub fn is_aux(&self, id: ExprId) -> bool {
        self.aux_vars.iter().any(|(aux, _)| *aux == id)
    }

    /// Value of the replacement expression at a point.
    pub fn objective_value(&self, values: &ValueMap) -> Result<Array> {
        Array::from_vector(self.expr.evaluate(values)?, &self.expr.shape)
    }

    /// Largest constraint violation at a point.
    pub fn max_violation(&self, values: &ValueMap, settings: &Settings) -> Result<f64> {
        let mut worst = 0.0_f64;
        for c in &self.constraints {
            if settings.check_shapes {
                c.check_shapes()?;
            }
            worst = worst_violation(worst, c.violation(values)?);
        }
        Ok(worst)
    }

    /// Check whether a point satisfies every constraint.
    pub fn check(&self, values: &ValueMap, settings: &Settings) -> Result<bool> {
        Ok(self.max_violation(values, settings)? <= settings.feasibility_tol)
    }
}
