//! Record values

use indexmap::IndexMap;

use super::Value;

/// A record instance with named fields.
///
/// Uses IndexMap to preserve field order, so records are pushed to Lua in
/// declaration order.
#[derive(Debug, Clone)]
pub struct StructValue {
    /// The record's type name (e.g., "Point", "Person")
    pub type_name: String,

    /// The record's fields in definition order.
    /// For tuple structs, keys are "0", "1", "2", etc.
    pub fields: IndexMap<String, Value>,

    /// Whether this is a tuple struct. Tuple structs are pushed to Lua as
    /// 0-based sequences in field order, like serde tuple structs.
    pub is_tuple_struct: bool,
}

impl StructValue {
    /// Create a new named record
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: IndexMap::new(),
            is_tuple_struct: false,
        }
    }

    /// Create a new tuple struct
    pub fn tuple(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: IndexMap::new(),
            is_tuple_struct: true,
        }
    }

    /// Add a field (builder pattern)
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Get a field by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
