//! Sign tracking for DCP.
//!
//! Tracks whether expressions are non-negative, non-positive, or have unknown
//! sign. Atom monotonicity declarations read the sign of their arguments.

use crate::expr::{Array, Expr};

/// Sign of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sign {
    /// Expression is always >= 0.
    Nonnegative,
    /// Expression is always <= 0.
    Nonpositive,
    /// Expression is always == 0.
    Zero,
    /// Sign is unknown.
    Unknown,
}

impl Sign {
    /// Build a sign from an `(is_nonneg, is_nonpos)` pair.
    pub fn from_flags(is_nonneg: bool, is_nonpos: bool) -> Self {
        match (is_nonneg, is_nonpos) {
            (true, true) => Sign::Zero,
            (true, false) => Sign::Nonnegative,
            (false, true) => Sign::Nonpositive,
            (false, false) => Sign::Unknown,
        }
    }

    /// The `(is_nonneg, is_nonpos)` pair.
    pub fn flags(self) -> (bool, bool) {
        (self.is_nonneg(), self.is_nonpos())
    }

    /// Check if the sign is non-negative (>= 0).
    pub fn is_nonneg(self) -> bool {
        matches!(self, Sign::Nonnegative | Sign::Zero)
    }

    /// Check if the sign is non-positive (<= 0).
    pub fn is_nonpos(self) -> bool {
        matches!(self, Sign::Nonpositive | Sign::Zero)
    }

    /// Check if the sign is zero.
    pub fn is_zero(self) -> bool {
        matches!(self, Sign::Zero)
    }

    /// Negate the sign.
    pub fn negate(self) -> Self {
        match self {
            Sign::Nonnegative => Sign::Nonpositive,
            Sign::Nonpositive => Sign::Nonnegative,
            other => other,
        }
    }

    /// Sign of a concrete value.
    pub fn of_array(value: &Array) -> Self {
        Sign::from_flags(value.is_nonneg(), value.is_nonpos())
    }
}

/// Combine signs for addition: a + b.
pub fn add_sign(a: Sign, b: Sign) -> Sign {
    use Sign::*;
    match (a, b) {
        (Zero, x) | (x, Zero) => x,
        (Nonnegative, Nonnegative) => Nonnegative,
        (Nonpositive, Nonpositive) => Nonpositive,
        _ => Unknown,
    }
}

/// Combine signs for multiplication: a * b.
pub fn mul_sign(a: Sign, b: Sign) -> Sign {
    use Sign::*;
    match (a, b) {
        (Zero, _) | (_, Zero) => Zero,
        (Nonnegative, Nonnegative) | (Nonpositive, Nonpositive) => Nonnegative,
        (Nonnegative, Nonpositive) | (Nonpositive, Nonnegative) => Nonpositive,
        (Unknown, _) | (_, Unknown) => Unknown,
    }
}

impl Expr {
    /// Get the sign of this expression.
    pub fn sign(&self) -> Sign {
        match self {
            Expr::Variable(v) => Sign::from_flags(v.nonneg, v.nonpos),
            Expr::Constant(c) => Sign::of_array(c),
            Expr::Parameter(p) => p.sign(),
            Expr::Add(a, b) => add_sign(a.sign(), b.sign()),
            Expr::Neg(a) => a.sign().negate(),
            Expr::Mul(a, b) => mul_sign(a.sign(), b.sign()),
            Expr::Atom(atom) => atom.sign_from_args(),
        }
    }

    /// Check if the expression is known to be non-negative.
    pub fn is_nonneg(&self) -> bool {
        self.sign().is_nonneg()
    }

    /// Check if the expression is known to be non-positive.
    pub fn is_nonpos(&self) -> bool {
        self.sign().is_nonpos()
    }
}
