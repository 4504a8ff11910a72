//! Cone constraints in standard form.

use nalgebra::DVector;

use super::lin_expr::LinExpr;
use crate::error::{CvxError, Result};
use crate::expr::{ExprId, ValueMap};

/// A cone constraint in standard form: Ax + b in K.
#[derive(Debug, Clone)]
pub enum ConeConstraint {
    /// Zero cone: a = 0 (equality).
    Zero { a: LinExpr },
    /// Nonnegative cone: a >= 0.
    NonNeg { a: LinExpr },
    /// Elementwise second-order cones: for every element i,
    /// ||(xs[0]_i, xs[1]_i, ...)||_2 <= t_i.
    SocElemwise {
        /// Upper bounds, one per cone.
        t: LinExpr,
        /// Cone arguments, each with the size of `t`.
        xs: Vec<LinExpr>,
    },
}

impl ConeConstraint {
    /// Number of scalar cones (or rows) this constraint represents.
    pub fn size(&self) -> usize {
        match self {
            ConeConstraint::Zero { a } | ConeConstraint::NonNeg { a } => a.size(),
            ConeConstraint::SocElemwise { t, .. } => t.size(),
        }
    }

    /// All linear expressions in this constraint.
    pub fn expressions(&self) -> Vec<&LinExpr> {
        match self {
            ConeConstraint::Zero { a } | ConeConstraint::NonNeg { a } => vec![a],
            ConeConstraint::SocElemwise { t, xs } => std::iter::once(t).chain(xs).collect(),
        }
    }

    /// Get all variable IDs in this constraint, sorted.
    pub fn variables(&self) -> Vec<ExprId> {
        let mut vars: Vec<_> = self
            .expressions()
            .into_iter()
            .flat_map(LinExpr::variables)
            .collect();
        vars.sort();
        vars.dedup();
        vars
    }

    /// Check that every expression has the size the cone requires.
    pub fn check_shapes(&self) -> Result<()> {
        if let ConeConstraint::SocElemwise { t, xs } = self {
            for x in xs {
                if x.size() != t.size() {
                    return Err(CvxError::shape_mismatch(&t.shape, &x.shape));
                }
            }
        }
        Ok(())
    }

    /// Largest violation of the constraint at the given point.
    ///
    /// Zero means the point is in the cone. A NaN residual counts as an
    /// infinite violation.
    pub fn violation(&self, values: &ValueMap) -> Result<f64> {
        match self {
            ConeConstraint::Zero { a } => {
                Ok(max_or_zero(a.evaluate(values)?.iter().map(|v| v.abs())))
            }
            ConeConstraint::NonNeg { a } => Ok(max_or_zero(a.evaluate(values)?.iter().map(|v| -v))),
            ConeConstraint::SocElemwise { t, xs } => {
                let t_val = t.evaluate(values)?;
                let x_vals = xs
                    .iter()
                    .map(|x| x.evaluate(values))
                    .collect::<Result<Vec<DVector<f64>>>>()?;
                let mut worst = 0.0_f64;
                for i in 0..t_val.len() {
                    let norm = x_vals
                        .iter()
                        .map(|x| x.get(i).copied().unwrap_or(0.0).powi(2))
                        .sum::<f64>()
                        .sqrt();
                    worst = worst_violation(worst, norm - t_val[i]);
                }
                Ok(worst)
            }
        }
    }

    /// Check whether the point satisfies the constraint within `tol`.
    pub fn is_satisfied(&self, values: &ValueMap, tol: f64) -> Result<bool> {
        Ok(self.violation(values)? <= tol)
    }
}

fn max_or_zero(iter: impl Iterator<Item = f64>) -> f64 {
    iter.fold(0.0_f64, worst_violation)
}

/// Running maximum of violations where NaN is infinitely bad.
pub(crate) fn worst_violation(worst: f64, v: f64) -> f64 {
    if v.is_nan() {
        f64::INFINITY
    } else {
        worst.max(v)
    }
}
