//! Parameters: values that are constant during a solve but can change
//! between solves.
//!
//! A `Parameter` is a shared handle. Clones refer to the same parameter, so a
//! value set through one handle is seen by every expression and every reduced
//! graph that embeds it.

use std::fmt;
use std::sync::{Arc, RwLock};

use super::expression::Array;
use super::id::{ExprId, VarAllocator};
use super::shape::Shape;
use crate::dcp::Sign;
use crate::error::{CvxError, Result};

struct ParameterInner {
    id: ExprId,
    shape: Shape,
    name: Option<String>,
    nonneg: bool,
    nonpos: bool,
    value: RwLock<Option<Array>>,
}

/// Handle to a parameter.
#[derive(Clone)]
pub struct Parameter {
    inner: Arc<ParameterInner>,
}

impl Parameter {
    /// Unique identifier.
    pub fn id(&self) -> ExprId {
        self.inner.id
    }

    /// Shape of the parameter.
    pub fn shape(&self) -> &Shape {
        &self.inner.shape
    }

    /// Optional name.
    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// Name if set, id otherwise.
    pub fn label(&self) -> String {
        self.inner
            .name
            .clone()
            .unwrap_or_else(|| self.inner.id.to_string())
    }

    /// Declared sign.
    pub fn sign(&self) -> Sign {
        if self.inner.nonneg {
            Sign::Nonnegative
        } else if self.inner.nonpos {
            Sign::Nonpositive
        } else {
            Sign::Unknown
        }
    }

    /// Current value, if one has been set.
    pub fn value(&self) -> Option<Array> {
        self.inner
            .value
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Set the value. The shape and the declared sign are checked.
    pub fn set_value(&self, value: impl Into<Array>) -> Result<()> {
        let value = value.into();
        self.check_value(&value)?;
        *self
            .inner
            .value
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(value);
        Ok(())
    }

    fn check_value(&self, value: &Array) -> Result<()> {
        if value.shape() != self.inner.shape
            && !(value.size() == 1 && self.inner.shape.size() == 1)
        {
            return Err(CvxError::shape_mismatch(&self.inner.shape, value.shape()));
        }
        if self.inner.nonneg && !value.is_nonneg() {
            return Err(CvxError::InvalidParameter(format!(
                "value of parameter {} must be nonnegative",
                self.label()
            )));
        }
        if self.inner.nonpos && !value.is_nonpos() {
            return Err(CvxError::InvalidParameter(format!(
                "value of parameter {} must be nonpositive",
                self.label()
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameter")
            .field("id", &self.inner.id)
            .field("shape", &self.inner.shape)
            .field("name", &self.inner.name)
            .field("sign", &self.sign())
            .field("value", &self.value())
            .finish()
    }
}

/// Builder for parameters.
#[derive(Default)]
pub struct ParameterBuilder {
    shape: Shape,
    name: Option<String>,
    nonneg: bool,
    nonpos: bool,
    value: Option<Array>,
}

impl ParameterBuilder {
    /// Create a new parameter builder with the given shape.
    pub fn new(shape: impl Into<Shape>) -> Self {
        Self {
            shape: shape.into(),
            ..Default::default()
        }
    }

    /// Create a scalar parameter builder.
    pub fn scalar() -> Self {
        Self::new(Shape::scalar())
    }

    /// Set the name of the parameter.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Declare the parameter non-negative.
    pub fn nonneg(mut self) -> Self {
        self.nonneg = true;
        self.nonpos = false;
        self
    }

    /// Declare the parameter non-positive.
    pub fn nonpos(mut self) -> Self {
        self.nonpos = true;
        self.nonneg = false;
        self
    }

    /// Set an initial value.
    pub fn value(mut self, value: impl Into<Array>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Build the parameter. The initial value, if any, is checked like
    /// [`Parameter::set_value`].
    pub fn build(self, alloc: &VarAllocator) -> Result<Parameter> {
        let param = Parameter {
            inner: Arc::new(ParameterInner {
                id: alloc.fresh(),
                shape: self.shape,
                name: self.name,
                nonneg: self.nonneg,
                nonpos: self.nonpos,
                value: RwLock::new(None),
            }),
        };
        if let Some(value) = self.value {
            param.set_value(value)?;
        }
        Ok(param)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_value_is_shared_between_clones() {
        let alloc = VarAllocator::new();
        let p = ParameterBuilder::scalar().nonneg().build(&alloc).unwrap();
        let q = p.clone();
        assert!(p.value().is_none());
        q.set_value(2.5).unwrap();
        assert_eq!(p.value().and_then(|v| v.as_scalar()), Some(2.5));
    }

    #[test]
    fn test_parameter_rejects_wrong_sign() {
        let alloc = VarAllocator::new();
        let p = ParameterBuilder::scalar().nonneg().name("M").build(&alloc).unwrap();
        let err = p.set_value(-1.0).unwrap_err();
        assert!(matches!(err, CvxError::InvalidParameter(_)));
        assert!(err.to_string().contains("M"));
        assert!(p.value().is_none());
    }

    #[test]
    fn test_parameter_rejects_wrong_shape() {
        let alloc = VarAllocator::new();
        let p = ParameterBuilder::new(3).build(&alloc).unwrap();
        assert!(matches!(
            p.set_value(vec![1.0, 2.0]),
            Err(CvxError::ShapeMismatch { .. })
        ));
        assert!(p.set_value(vec![1.0, 2.0, 3.0]).is_ok());
    }

    #[test]
    fn test_builder_checks_initial_value() {
        let alloc = VarAllocator::new();
        assert!(ParameterBuilder::scalar().nonpos().value(1.0).build(&alloc).is_err());
        let p = ParameterBuilder::scalar().nonpos().value(-1.0).build(&alloc).unwrap();
        assert_eq!(p.sign(), Sign::Nonpositive);
    }
}
