//! Atoms and the contract they implement.
//!
//! An atom is a primitive, possibly nonsmooth function node. Each atom kind
//! implements [`Atom`]: it evaluates numerically, declares its sign,
//! curvature and monotonicity, computes a subgradient, and reduces itself to
//! an affine expression plus cone constraints over fresh auxiliary variables.
//!
//! - [`abs()`]: |x|, reduced to two linear inequalities
//! - [`square()`]: x^2, reduced to elementwise second-order cones
//! - [`huber()`]: the Huber penalty, reduced by composing square and abs

pub mod abs;
pub mod atom;
pub mod elementwise;
pub mod huber;
pub mod square;

pub use self::abs::{abs, Abs};
pub use atom::{Atom, AtomData};
pub use huber::{huber, huber_default, huber_value, Huber};
pub use square::{square, Square};
