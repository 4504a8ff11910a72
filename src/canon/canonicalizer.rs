//! Expression canonicalization.
//!
//! Canonicalization walks an expression tree and turns it into a reduced
//! graph: leaves and affine nodes become `LinExpr`, and every atom is
//! replaced by its own reduction applied to its canonicalized arguments.
//! Constraints and auxiliary variables are collected in traversal order.

use tracing::debug;

use super::lin_expr::LinExpr;
use super::reduction::Reduction;
use crate::error::{CvxError, Result};
use crate::expr::{Array, Expr, Shape, ValueMap, VarAllocator};

/// Canonicalize an expression into a reduced graph.
///
/// Fresh auxiliary variables are drawn from `vars`, so they never collide
/// with the tree's own variables as long as both come from one allocator.
pub fn canonicalize(expr: &Expr, vars: &VarAllocator) -> Result<Reduction> {
    let mut ctx = CanonContext::new(vars);
    let lin = ctx.canonicalize_expr(expr)?;
    debug!(
        aux_vars = ctx.red.aux_vars.len(),
        constraints = ctx.red.constraints.len(),
        "canonicalized expression"
    );
    ctx.red.expr = lin;
    Ok(ctx.red)
}

/// Context for canonicalization, tracking auxiliary variables and constraints.
struct CanonContext<'a> {
    vars: &'a VarAllocator,
    red: Reduction,
}

impl<'a> CanonContext<'a> {
    fn new(vars: &'a VarAllocator) -> Self {
        CanonContext {
            vars,
            red: Reduction::new(LinExpr::zeros(Shape::scalar())),
        }
    }

    fn canonicalize_expr(&mut self, expr: &Expr) -> Result<LinExpr> {
        match expr {
            // Leaves
            Expr::Variable(v) => Ok(LinExpr::variable(v.id, v.shape.clone())),
            Expr::Constant(c) => Ok(LinExpr::constant(c)),
            Expr::Parameter(p) => LinExpr::parameter(p),

            // Affine operations
            Expr::Add(a, b) => {
                let la = self.canonicalize_expr(a)?;
                let lb = self.canonicalize_expr(b)?;
                la.add(&lb)
            }
            Expr::Neg(a) => Ok(self.canonicalize_expr(a)?.neg()),
            Expr::Mul(a, b) => self.canonicalize_mul(a, b),

            Expr::Atom(atom) => {
                if expr.parameters().is_empty() && expr.is_constant() {
                    return Ok(LinExpr::constant(&expr.value(&ValueMap::new())?));
                }
                let args = atom
                    .args()
                    .iter()
                    .map(|arg| self.canonicalize_expr(arg))
                    .collect::<Result<Vec<_>>>()?;
                let sub = atom.reduce(&args, &atom.shape(), &atom.data(), self.vars)?;
                debug!(
                    atom = atom.name(),
                    aux_vars = sub.aux_vars.len(),
                    constraints = sub.constraints.len(),
                    "reduced atom"
                );
                Ok(self.red.absorb(sub))
            }
        }
    }

    /// Elementwise product; one side must be a literal constant or a bare
    /// scalar parameter.
    fn canonicalize_mul(&mut self, a: &Expr, b: &Expr) -> Result<LinExpr> {
        if let Some(value) = literal_value(a)? {
            let lb = self.canonicalize_expr(b)?;
            return scale_by(lb, &value);
        }
        if let Some(value) = literal_value(b)? {
            let la = self.canonicalize_expr(a)?;
            return scale_by(la, &value);
        }
        match (a, b) {
            (Expr::Parameter(p), other) | (other, Expr::Parameter(p)) => {
                self.canonicalize_expr(other)?.mul_param(p)
            }
            _ => Err(CvxError::NotDcp(
                "product of two non-constant expressions".into(),
            )),
        }
    }
}

/// Value of a constant subtree without parameters.
fn literal_value(expr: &Expr) -> Result<Option<Array>> {
    if expr.is_constant() && expr.parameters().is_empty() {
        Ok(Some(expr.value(&ValueMap::new())?))
    } else {
        Ok(None)
    }
}

fn scale_by(lin: LinExpr, factor: &Array) -> Result<LinExpr> {
    if let Some(v) = factor.as_scalar() {
        return Ok(lin.scale(v));
    }
    let lin = if lin.size() == 1 {
        LinExpr::zeros(factor.shape()).add(&lin)?
    } else {
        lin
    };
    lin.scale_elementwise(factor)
}
