//! DCP (Disciplined Convex Programming) analysis.
//!
//! This module provides the analysis surface atoms plug into:
//! - Curvature tracking (convex, concave, affine, constant)
//! - Sign tracking (non-negative, non-positive, unknown)
//! - The composition rule that combines atom declarations with argument
//!   curvature

pub mod curvature;
pub mod sign;

pub use curvature::{add_curvature, compose_curvature, scalar_mul_curvature, Curvature};
pub use sign::{add_sign, mul_sign, Sign};
