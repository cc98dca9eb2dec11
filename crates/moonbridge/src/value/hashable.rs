//! Hashable wrapper for Value to enable use as HashMap keys

use std::hash::{Hash, Hasher};

use super::Value;

/// A wrapper for Value that implements Hash and Eq.
///
/// Any value can be wrapped, which lets host mappings carry keys that Lua
/// accepts but the decoder rejects (booleans, handles, tables). Floats hash
/// by bit pattern; composites only contribute their discriminant, which
/// keeps `Hash` consistent with `Eq` without walking the structure.
#[derive(Debug, Clone)]
pub struct HashableValue(pub Value);

impl HashableValue {
    /// Wrap anything convertible into a Value
    pub fn new(value: impl Into<Value>) -> Self {
        HashableValue(value.into())
    }
}

impl Hash for HashableValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Hash the discriminant first
        std::mem::discriminant(&self.0).hash(state);

        match &self.0 {
            Value::Nil => {}
            Value::Bool(b) => b.hash(state),
            Value::I8(n) => n.hash(state),
            Value::I16(n) => n.hash(state),
            Value::I32(n) => n.hash(state),
            Value::I64(n) => n.hash(state),
            Value::Isize(n) => n.hash(state),
            Value::U8(n) => n.hash(state),
            Value::U16(n) => n.hash(state),
            Value::U32(n) => n.hash(state),
            Value::U64(n) => n.hash(state),
            Value::Usize(n) => n.hash(state),
            // -0.0 == 0.0, so both must hash alike
            Value::F32(n) => (n + 0.0).to_bits().hash(state),
            Value::F64(n) => (n + 0.0).to_bits().hash(state),
            Value::String(s) => s.hash(state),
            Value::Bytes(b) => b.hash(state),
            Value::Handle(h) => h.hash(state),
            _ => {}
        }
    }
}

impl PartialEq for HashableValue {
    fn eq(&self, other: &Self) -> bool {
        // Delegate to Value's PartialEq
        self.0 == other.0
    }
}

impl Eq for HashableValue {}

impl From<Value> for HashableValue {
    fn from(value: Value) -> Self {
        HashableValue(value)
    }
}
