//! Concrete values for variables and parameters.

use std::collections::HashMap;

use nalgebra::DVector;

use super::expression::{Array, Expr};
use super::id::ExprId;
use super::parameter::Parameter;
use crate::error::{CvxError, Result};

/// Values of variables and parameters, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct ValueMap {
    values: HashMap<ExprId, Array>,
}

impl ValueMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value by id without shape checks.
    pub fn insert(&mut self, id: ExprId, value: impl Into<Array>) -> &mut Self {
        self.values.insert(id, value.into());
        self
    }

    /// Set the value of a variable or parameter leaf, checking its size.
    ///
    /// The value is stored with the leaf's shape.
    pub fn set(&mut self, leaf: &Expr, value: impl Into<Array>) -> Result<&mut Self> {
        let value = value.into();
        let (id, shape) = match leaf {
            Expr::Variable(v) => (v.id, v.shape.clone()),
            Expr::Parameter(p) => (p.id(), p.shape().clone()),
            _ => {
                return Err(CvxError::InvalidParameter(
                    "values can only be set on variable or parameter leaves".to_string(),
                ))
            }
        };
        if value.size() != shape.size() {
            return Err(CvxError::shape_mismatch(shape, value.shape()));
        }
        self.values.insert(id, Array::from_vector(value.to_vector(), &shape)?);
        Ok(self)
    }

    /// Copy the current value of a parameter into the map.
    pub fn bind_parameter(&mut self, param: &Parameter) -> Result<&mut Self> {
        let value = param
            .value()
            .ok_or_else(|| CvxError::MissingValue(format!("parameter {}", param.label())))?;
        self.values.insert(param.id(), value);
        Ok(self)
    }

    /// Get a value by id.
    pub fn get(&self, id: ExprId) -> Option<&Array> {
        self.values.get(&id)
    }

    /// Get a value by id, flattened column-major.
    pub fn vector(&self, id: ExprId) -> Option<DVector<f64>> {
        self.values.get(&id).map(Array::to_vector)
    }

    /// Number of bound values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if no values are bound.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
