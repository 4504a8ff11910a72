//! Variable creation with builder pattern.

use super::expression::{Expr, VariableData};
use super::id::VarAllocator;
use super::shape::Shape;

/// Builder for creating variables with various attributes.
#[derive(Default)]
pub struct VariableBuilder {
    shape: Shape,
    name: Option<String>,
    nonneg: bool,
    nonpos: bool,
}

impl VariableBuilder {
    /// Create a new variable builder with the given shape.
    pub fn new(shape: impl Into<Shape>) -> Self {
        Self {
            shape: shape.into(),
            ..Default::default()
        }
    }

    /// Create a scalar variable builder.
    pub fn scalar() -> Self {
        Self::new(Shape::scalar())
    }

    /// Set the name of the variable.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Declare the variable non-negative (x >= 0).
    pub fn nonneg(mut self) -> Self {
        self.nonneg = true;
        self.nonpos = false;
        self
    }

    /// Declare the variable non-positive (x <= 0).
    pub fn nonpos(mut self) -> Self {
        self.nonpos = true;
        self.nonneg = false;
        self
    }

    /// Build the variable expression, drawing its id from `alloc`.
    pub fn build(self, alloc: &VarAllocator) -> Expr {
        Expr::Variable(VariableData {
            id: alloc.fresh(),
            shape: self.shape,
            name: self.name,
            nonneg: self.nonneg,
            nonpos: self.nonpos,
        })
    }
}

/// Create a variable with the given shape.
///
/// # Examples
///
/// ```
/// use cvxatoms::expr::{variable, VarAllocator};
///
/// let alloc = VarAllocator::new();
/// let x = variable(&alloc, ());
/// let y = variable(&alloc, 5);
/// let z = variable(&alloc, (3, 4));
/// ```
pub fn variable(alloc: &VarAllocator, shape: impl Into<Shape>) -> Expr {
    VariableBuilder::new(shape).build(alloc)
}

/// Create a non-negative variable with the given shape.
pub fn nonneg_variable(alloc: &VarAllocator, shape: impl Into<Shape>) -> Expr {
    VariableBuilder::new(shape).nonneg().build(alloc)
}

/// Create a non-positive variable with the given shape.
pub fn nonpos_variable(alloc: &VarAllocator, shape: impl Into<Shape>) -> Expr {
    VariableBuilder::new(shape).nonpos().build(alloc)
}
