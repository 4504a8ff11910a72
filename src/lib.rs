//! # cvxatoms
//!
//! Convex atoms for Disciplined Convex Programming (DCP), with the Huber
//! penalty as the centerpiece.
//!
//! An atom is a nonlinear function node in an expression tree. Each atom
//! carries the declarations a DCP checker needs (sign, curvature,
//! monotonicity), a numeric evaluator, a subgradient, and a reduction that
//! rewrites it as an affine expression plus cone constraints over fresh
//! auxiliary variables.
//!
//! ## Quick Start
//!
//! ```
//! use cvxatoms::prelude::*;
//!
//! let vars = VarAllocator::new();
//! let x = variable(&vars, 3);
//!
//! let h = huber(&x, 1.0)?;
//! assert!(h.is_convex());
//!
//! // n, s and one auxiliary variable each for square(n) and abs(s)
//! let red = canonicalize(&h, &vars)?;
//! assert_eq!(red.aux_vars.len(), 4);
//! assert_eq!(red.constraints.len(), 4);
//! # Ok::<(), CvxError>(())
//! ```
//!
//! ## Supported Atoms
//!
//! - `abs`: elementwise |x|, reduced to two linear inequalities
//! - `square`: elementwise x^2, reduced to one second-order cone per element
//! - `huber`: elementwise Huber penalty with threshold `M`, reduced through
//!   `square` and `abs`
//!
//! `M` may be a literal or a non-negative scalar [`Parameter`](expr::Parameter),
//! in which case the reduced graph keeps it symbolic and follows later
//! changes of its value.
//!
//! ## Architecture
//!
//! - **Expression trees** built using the `Expr` enum with `Arc` sharing
//! - **Atoms** implement the [`Atom`](atoms::Atom) trait and plug in as `Expr::Atom`
//! - **DCP verification** via curvature and sign tracking
//! - **Canonicalization** transforms to parametric affine + cone constraints
//! - **Fresh variables** come from an injected [`VarAllocator`](expr::VarAllocator)

pub mod atoms;
pub mod canon;
pub mod dcp;
pub mod error;
pub mod expr;
pub mod sparse;

/// Prelude module for convenient imports.
///
/// ```
/// use cvxatoms::prelude::*;
/// ```
pub mod prelude {
    // Expression types
    pub use crate::expr::{
        constant, constant_matrix, constant_vec, nonneg_variable, nonpos_variable, variable,
        Array, Expr, ExprId, Parameter, ParameterBuilder, Shape, ValueMap, VarAllocator,
        VariableBuilder,
    };

    // Atoms
    pub use crate::atoms::{abs, huber, huber_default, square, Abs, Atom, AtomData, Huber, Square};

    // Canonicalization
    pub use crate::canon::{canonicalize, ConeConstraint, LinExpr, Reduction, Settings};

    // DCP
    pub use crate::dcp::{Curvature, Sign};

    // Errors
    pub use crate::error::{CvxError, Result};
}

// Re-export main types at crate root
pub use error::{CvxError, Result};
