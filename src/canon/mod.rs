//! Canonicalization transforms expressions into reduced graphs.
//!
//! This module provides:
//! - Linear expressions (LinExpr) for affine parts, with parameter terms
//! - Cone constraints (ConeConstraint) produced by atom reductions
//! - The reduced graph (Reduction) and the settings used to check it
//! - The tree walk (canonicalize) that drives atom reductions

pub mod canonicalizer;
pub mod cone;
pub mod lin_expr;
pub mod reduction;

pub use canonicalizer::canonicalize;
pub use cone::ConeConstraint;
pub use lin_expr::{LinExpr, TermKey};
pub use reduction::{Reduction, Settings};
