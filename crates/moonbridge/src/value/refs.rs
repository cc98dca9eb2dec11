//! Indirection values

use std::sync::Arc;

use super::Value;

/// A shared reference to another value, or a null reference.
///
/// The encoder dereferences exactly one level and pushes whatever the
/// reference points at; a null reference is pushed like [`Value::Nil`].
#[derive(Debug, Clone, Default)]
pub struct ValueRef {
    /// The referenced value, `None` for a null reference
    pub target: Option<Arc<Value>>,
}

impl ValueRef {
    /// Create a reference to `value`
    pub fn new(value: Value) -> Self {
        Self {
            target: Some(Arc::new(value)),
        }
    }

    /// Create a null reference
    pub fn null() -> Self {
        Self { target: None }
    }

    /// Check whether the reference is null
    pub fn is_null(&self) -> bool {
        self.target.is_none()
    }

    /// Borrow the referenced value, if any
    pub fn get(&self) -> Option<&Value> {
        self.target.as_deref()
    }
}

impl From<Arc<Value>> for ValueRef {
    fn from(value: Arc<Value>) -> Self {
        Self {
            target: Some(value),
        }
    }
}
