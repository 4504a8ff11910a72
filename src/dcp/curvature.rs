//! Curvature tracking for DCP.
//!
//! This module implements the curvature rules that determine whether an
//! expression is convex, concave, affine, or unknown. Atoms contribute only
//! their static declarations; [`compose_curvature`] turns those declarations
//! into the curvature of the atom applied to its arguments.

use crate::atoms::Atom;
use crate::expr::Expr;

/// Curvature of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Curvature {
    /// Constant value (most restrictive).
    Constant,
    /// Affine function (both convex and concave).
    Affine,
    /// Convex function.
    Convex,
    /// Concave function.
    Concave,
    /// Unknown curvature (not DCP-compliant).
    Unknown,
}

impl Curvature {
    /// Check if the curvature is convex (constant, affine, or convex).
    pub fn is_convex(self) -> bool {
        matches!(self, Curvature::Constant | Curvature::Affine | Curvature::Convex)
    }

    /// Check if the curvature is concave (constant, affine, or concave).
    pub fn is_concave(self) -> bool {
        matches!(self, Curvature::Constant | Curvature::Affine | Curvature::Concave)
    }

    /// Check if the curvature is affine (constant or affine).
    pub fn is_affine(self) -> bool {
        matches!(self, Curvature::Constant | Curvature::Affine)
    }

    /// Check if this is a constant.
    pub fn is_constant(self) -> bool {
        matches!(self, Curvature::Constant)
    }

    /// Negate the curvature (convex <-> concave).
    pub fn negate(self) -> Self {
        match self {
            Curvature::Convex => Curvature::Concave,
            Curvature::Concave => Curvature::Convex,
            other => other,
        }
    }
}

/// Combine curvatures for addition: a + b.
pub fn add_curvature(a: Curvature, b: Curvature) -> Curvature {
    use Curvature::*;
    match (a, b) {
        (Constant, x) | (x, Constant) => x,
        (Affine, x) | (x, Affine) => x,
        (Convex, Convex) => Convex,
        (Concave, Concave) => Concave,
        _ => Unknown,
    }
}

/// Combine curvatures for scalar multiplication: scalar * expr.
pub fn scalar_mul_curvature(scalar: f64, expr_curv: Curvature) -> Curvature {
    if scalar == 0.0 {
        Curvature::Constant
    } else if scalar > 0.0 {
        expr_curv
    } else {
        expr_curv.negate()
    }
}

/// Curvature of an atom applied to its arguments.
///
/// A convex atom stays convex when every argument `i` is affine, or convex
/// with the atom non-decreasing in `i`, or concave with the atom
/// non-increasing in `i`. Concave atoms mirror the rule.
pub fn compose_curvature(atom: &dyn Atom) -> Curvature {
    let args = atom.args();
    if args.iter().all(Expr::is_constant) {
        return Curvature::Constant;
    }

    let curvatures: Vec<Curvature> = args.iter().map(Expr::curvature).collect();

    let convex = atom.is_atom_convex()
        && curvatures.iter().enumerate().all(|(i, c)| {
            c.is_affine()
                || (c.is_convex() && atom.is_incr(i))
                || (c.is_concave() && atom.is_decr(i))
        });
    let concave = atom.is_atom_concave()
        && curvatures.iter().enumerate().all(|(i, c)| {
            c.is_affine()
                || (c.is_concave() && atom.is_incr(i))
                || (c.is_convex() && atom.is_decr(i))
        });

    match (convex, concave) {
        (true, true) => Curvature::Affine,
        (true, false) => Curvature::Convex,
        (false, true) => Curvature::Concave,
        (false, false) => Curvature::Unknown,
    }
}

impl Expr {
    /// Get the curvature of this expression.
    pub fn curvature(&self) -> Curvature {
        match self {
            Expr::Variable(_) => Curvature::Affine,
            Expr::Constant(_) | Expr::Parameter(_) => Curvature::Constant,
            Expr::Add(a, b) => add_curvature(a.curvature(), b.curvature()),
            Expr::Neg(a) => a.curvature().negate(),
            Expr::Mul(a, b) => mul_curvature(a, b),
            Expr::Atom(atom) => compose_curvature(atom.as_ref()),
        }
    }

    /// Check if this expression is convex.
    pub fn is_convex(&self) -> bool {
        self.curvature().is_convex()
    }

    /// Check if this expression is concave.
    pub fn is_concave(&self) -> bool {
        self.curvature().is_concave()
    }

    /// Check if this expression is affine.
    pub fn is_affine(&self) -> bool {
        self.curvature().is_affine()
    }
}

/// Handle multiplication curvature.
fn mul_curvature(a: &Expr, b: &Expr) -> Curvature {
    let (ac, bc) = (a.curvature(), b.curvature());

    if ac.is_constant() && bc.is_constant() {
        return Curvature::Constant;
    }

    let (factor, other, other_curv) = if ac.is_constant() {
        (a, b, bc)
    } else if bc.is_constant() {
        (b, a, ac)
    } else {
        return Curvature::Unknown;
    };

    if let Some(scalar) = factor.constant_value().and_then(|v| v.as_scalar()) {
        return scalar_mul_curvature(scalar, other_curv);
    }

    let sign = factor.sign();
    if sign.is_zero() {
        Curvature::Constant
    } else if sign.is_nonneg() {
        other_curv
    } else if sign.is_nonpos() {
        other_curv.negate()
    } else if other.is_affine() {
        Curvature::Affine
    } else {
        Curvature::Unknown
    }
}
