//! Value trait implementations: constructors, predicates, extractors, From traits, PartialEq

use std::collections::HashMap;
use std::sync::Arc;

use super::*;

// ═══════════════════════════════════════════════════════════════════
// Convenience Constructors
// ═══════════════════════════════════════════════════════════════════

impl Value {
    /// Create a string value
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(Arc::new(s.into()))
    }

    /// Create a byte string value
    pub fn bytes(b: impl Into<Vec<u8>>) -> Self {
        Value::Bytes(Arc::new(b.into()))
    }

    /// Create a vec value
    pub fn vec(items: Vec<Value>) -> Self {
        Value::Vec(Arc::new(items))
    }

    /// Create a tuple value
    pub fn tuple(items: Vec<Value>) -> Self {
        Value::Tuple(Arc::new(items))
    }

    /// Create a string-keyed table from `(key, value)` pairs
    pub fn table<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Table(Arc::new(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }

    /// Create a mapping with arbitrary keys from `(key, value)` pairs
    pub fn hash_map<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        Value::HashMap(Arc::new(
            entries
                .into_iter()
                .map(|(k, v)| (HashableValue(k), v))
                .collect(),
        ))
    }

    /// Create a struct value
    pub fn structure(s: StructValue) -> Self {
        Value::Struct(Arc::new(s))
    }

    /// Create a reference to `value`
    pub fn reference(value: Value) -> Self {
        Value::Ref(ValueRef::new(value))
    }

    /// Create a null reference
    pub fn null_ref() -> Self {
        Value::Ref(ValueRef::null())
    }

    /// Create an opaque handle value
    pub fn handle(addr: impl Into<RawHandle>) -> Self {
        Value::Handle(addr.into())
    }

    // ═══════════════════════════════════════════════════════════════════
    // Type Predicates
    // ═══════════════════════════════════════════════════════════════════
    /// Check if value is nil
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Check if value is any integer type
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Value::I8(_)
                | Value::I16(_)
                | Value::I32(_)
                | Value::I64(_)
                | Value::Isize(_)
                | Value::U8(_)
                | Value::U16(_)
                | Value::U32(_)
                | Value::U64(_)
                | Value::Usize(_)
        )
    }

    /// Check if value is any float type
    pub fn is_float(&self) -> bool {
        matches!(self, Value::F32(_) | Value::F64(_))
    }

    /// Check if value is a string-keyed table
    pub fn is_table(&self) -> bool {
        matches!(self, Value::Table(_))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Extractors (return Option for safe access)
    // ═══════════════════════════════════════════════════════════════════
    /// Extract boolean value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract as i64 (converts from smaller integer types)
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I8(n) => Some(*n as i64),
            Value::I16(n) => Some(*n as i64),
            Value::I32(n) => Some(*n as i64),
            Value::I64(n) => Some(*n),
            Value::Isize(n) => Some(*n as i64),
            // Unsigned that fit
            Value::U8(n) => Some(*n as i64),
            Value::U16(n) => Some(*n as i64),
            Value::U32(n) => Some(*n as i64),
            Value::U64(n) => (*n).try_into().ok(),
            Value::Usize(n) => (*n).try_into().ok(),
            _ => None,
        }
    }

    /// Extract as f64 (converts from every numeric type)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F32(n) => Some(*n as f64),
            Value::F64(n) => Some(*n),
            Value::U64(n) => Some(*n as f64),
            Value::Usize(n) => Some(*n as f64),
            other => other.as_i64().map(|n| n as f64),
        }
    }

    /// Extract string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Extract the raw bytes of a string or byte string
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::String(s) => Some(s.as_bytes()),
            Value::Bytes(b) => Some(b.as_slice()),
            _ => None,
        }
    }

    /// Extract the opaque handle
    pub fn as_handle(&self) -> Option<RawHandle> {
        match self {
            Value::Handle(h) => Some(*h),
            _ => None,
        }
    }

    /// Extract vec or tuple as slice
    pub fn as_vec(&self) -> Option<&[Value]> {
        match self {
            Value::Vec(v) => Some(v.as_slice()),
            Value::Tuple(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    /// Extract a string-keyed table
    pub fn as_table(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Table(t) => Some(t.as_ref()),
            _ => None,
        }
    }

    /// Look up `key` in a string-keyed table
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_table().and_then(|t| t.get(key))
    }

    /// Get the type name of this value (for error messages and logs)
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::I8(_) => "i8",
            Value::I16(_) => "i16",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::Isize(_) => "isize",
            Value::U8(_) => "u8",
            Value::U16(_) => "u16",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::Usize(_) => "usize",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::Handle(_) => "handle",
            Value::String(_) => "String",
            Value::Bytes(_) => "Vec<u8>",
            Value::Table(_) => "table",
            Value::Vec(_) => "Vec",
            Value::Tuple(_) => "tuple",
            Value::HashMap(_) => "HashMap",
            Value::Struct(_) => "struct",
            Value::Ref(_) => "ref",
            Value::HostFn(_) => "fn",
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// PartialEq Implementation
// ═══════════════════════════════════════════════════════════════════

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,

            (Value::Bool(a), Value::Bool(b)) => a == b,

            // Signed integers
            (Value::I8(a), Value::I8(b)) => a == b,
            (Value::I16(a), Value::I16(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::Isize(a), Value::Isize(b)) => a == b,

            // Unsigned integers
            (Value::U8(a), Value::U8(b)) => a == b,
            (Value::U16(a), Value::U16(b)) => a == b,
            (Value::U32(a), Value::U32(b)) => a == b,
            (Value::U64(a), Value::U64(b)) => a == b,
            (Value::Usize(a), Value::Usize(b)) => a == b,

            // Floats (IEEE equality)
            (Value::F32(a), Value::F32(b)) => a == b,
            (Value::F64(a), Value::F64(b)) => a == b,

            (Value::Handle(a), Value::Handle(b)) => a == b,

            // Strings and bytes
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,

            // Collections (element-wise comparison)
            (Value::Table(a), Value::Table(b)) => a == b,
            (Value::Vec(a), Value::Vec(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::HashMap(a), Value::HashMap(b)) => a == b,

            // Structs (by type name and fields)
            (Value::Struct(a), Value::Struct(b)) => {
                a.type_name == b.type_name && a.fields == b.fields
            }

            (Value::Ref(a), Value::Ref(b)) => a.get() == b.get(),

            // Host functions compare by identity
            (Value::HostFn(a), Value::HostFn(b)) => Arc::ptr_eq(&a.func, &b.func),

            _ => false,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// From Implementations
// ═══════════════════════════════════════════════════════════════════

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Nil
    }
}

/// Scalars that map one-to-one onto a variant
macro_rules! scalar_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

scalar_from! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => Usize,
    f32 => F32,
    f64 => F64,
    RawHandle => Handle,
    HostFn => HostFn,
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Arc::new(s))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Arc::new(s.to_string()))
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Bytes(Arc::new(b.to_vec()))
    }
}

impl From<StructValue> for Value {
    fn from(s: StructValue) -> Self {
        Value::Struct(Arc::new(s))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Vec(Arc::new(v.into_iter().map(Into::into).collect()))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Nil, Into::into)
    }
}

impl<V: Into<Value>> From<HashMap<String, V>> for Value {
    fn from(map: HashMap<String, V>) -> Self {
        Value::Table(Arc::new(
            map.into_iter().map(|(k, v)| (k, v.into())).collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_constructor() {
        let t = Value::table([("a", 1i64), ("b", 2i64)]);
        assert!(t.is_table());
        assert_eq!(t.get("a"), Some(&Value::I64(1)));
        assert_eq!(t.get("missing"), None);
    }

    #[test]
    fn test_as_i64_unsigned_overflow() {
        assert_eq!(Value::U64(u64::MAX).as_i64(), None);
        assert_eq!(Value::U64(7).as_i64(), Some(7));
    }

    #[test]
    fn test_as_f64_widens_integers() {
        assert_eq!(Value::I32(3).as_f64(), Some(3.0));
        assert_eq!(Value::U64(u64::MAX).as_f64(), Some(u64::MAX as f64));
        assert_eq!(Value::string("3").as_f64(), None);
    }

    #[test]
    fn test_option_into_value() {
        assert_eq!(Value::from(None::<i64>), Value::Nil);
        assert_eq!(Value::from(Some(5i64)), Value::I64(5));
    }

    #[test]
    fn test_ref_equality_follows_target() {
        assert_eq!(Value::reference(Value::I64(1)), Value::reference(Value::I64(1)));
        assert_ne!(Value::reference(Value::I64(1)), Value::null_ref());
        assert_eq!(Value::null_ref(), Value::null_ref());
    }

    #[test]
    fn test_host_fn_identity() {
        let f = HostFn::new("noop", |_| Ok(Value::Nil));
        let a = Value::from(f.clone());
        let b = Value::from(f);
        let c = Value::from(HostFn::new("noop", |_| Ok(Value::Nil)));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_numeric_predicates() {
        assert!(Value::U8(1).is_integer());
        assert!(!Value::F32(1.0).is_integer());
        assert!(Value::F32(1.0).is_float());
        assert!(Value::Nil.is_nil());
    }

    #[test]
    fn test_extractors() {
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::I64(1).as_bool(), None);
        let items = Value::tuple(vec![Value::I64(1), Value::Nil]);
        assert_eq!(items.as_vec().map(|v| v.len()), Some(2));
        assert_eq!(Value::bytes(vec![1u8]).as_bytes(), Some(&[1u8][..]));
        assert_eq!(Value::string("x").as_bytes(), Some(&b"x"[..]));
    }

    #[test]
    fn test_host_fn_call() {
        let double = HostFn::new("double", |args| match args.first().and_then(Value::as_i64) {
            Some(n) => Ok(Value::I64(n * 2)),
            None => Err("expected an integer".to_string()),
        });
        assert_eq!(double.call(&[Value::I32(4)]), Ok(Value::I64(8)));
        assert!(double.call(&[]).is_err());
    }

    #[test]
    fn test_record_field_access() {
        let pair = StructValue::tuple("Pair").with_field("0", 1i64).with_field("1", "b");
        assert!(pair.is_tuple_struct);
        assert_eq!(pair.get("1"), Some(&Value::string("b")));
        assert_eq!(pair.get("0"), Some(&Value::I64(1)));
        assert_eq!(pair.len(), 2);
    }

    #[test]
    fn test_hashable_keys() {
        use std::collections::HashSet;
        let mut keys = HashSet::new();
        keys.insert(HashableValue::new(0.0f64));
        keys.insert(HashableValue::new(-0.0f64));
        keys.insert(HashableValue::new("k"));
        assert_eq!(keys.len(), 2);
    }
}
