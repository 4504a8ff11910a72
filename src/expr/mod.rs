//! Expression types and creation utilities.
//!
//! This module provides the argument types atoms are built over:
//! - `Expr` - the expression enum, with an open `Atom` variant
//! - `Shape` and `Array` - shapes and numeric values
//! - `ExprId` and `VarAllocator` - identifiers and their allocator
//! - Variables, parameters and constants
//! - `ValueMap` - concrete values for numeric evaluation

pub mod constant;
pub mod expression;
pub mod id;
pub mod parameter;
pub mod shape;
pub mod values;
pub mod variable;

pub use constant::{constant, constant_matrix, constant_vec};
pub use expression::{Array, Expr, VariableData};
pub use id::{ExprId, VarAllocator};
pub use parameter::{Parameter, ParameterBuilder};
pub use shape::Shape;
pub use values::ValueMap;
pub use variable::{nonneg_variable, nonpos_variable, variable, VariableBuilder};
