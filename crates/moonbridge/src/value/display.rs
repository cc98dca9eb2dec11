//! Display and Debug implementations for Value

use std::fmt;

use super::*;

fn write_seq(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{:?}", item)?;
    }
    Ok(())
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),

            Value::I8(n) => write!(f, "{}i8", n),
            Value::I16(n) => write!(f, "{}i16", n),
            Value::I32(n) => write!(f, "{}i32", n),
            Value::I64(n) => write!(f, "{}", n), // Default integer type
            Value::Isize(n) => write!(f, "{}isize", n),

            Value::U8(n) => write!(f, "{}u8", n),
            Value::U16(n) => write!(f, "{}u16", n),
            Value::U32(n) => write!(f, "{}u32", n),
            Value::U64(n) => write!(f, "{}u64", n),
            Value::Usize(n) => write!(f, "{}usize", n),

            Value::F32(n) => write!(f, "{}f32", n),
            Value::F64(n) => write!(f, "{}", n), // Default float type

            Value::Handle(h) => write!(f, "handle({:#x})", h.addr()),

            Value::String(s) => write!(f, "{:?}", s.as_ref()),
            Value::Bytes(b) => write!(f, "b{:?}", b.as_ref()),

            Value::Table(map) => {
                // Lua iteration order is unstable; sort for readable output
                let mut entries: Vec<_> = map.iter().collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));
                write!(f, "{{")?;
                for (i, (k, v)) in entries.into_iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}: {:?}", k, v)?;
                }
                write!(f, "}}")
            }

            Value::Vec(v) => {
                write!(f, "vec![")?;
                write_seq(f, v)?;
                write!(f, "]")
            }

            Value::Tuple(items) => {
                write!(f, "(")?;
                write_seq(f, items)?;
                if items.len() == 1 {
                    write!(f, ",")?; // Single-element tuple needs trailing comma
                }
                write!(f, ")")
            }

            Value::HashMap(map) => {
                write!(f, "HashMap ")?;
                f.debug_map()
                    .entries(map.iter().map(|(k, v)| (&k.0, v)))
                    .finish()
            }

            Value::Struct(s) if s.is_tuple_struct => {
                let mut out = f.debug_tuple(&s.type_name);
                for v in s.fields.values() {
                    out.field(v);
                }
                out.finish()
            }

            Value::Struct(s) => {
                let mut out = f.debug_struct(&s.type_name);
                for (k, v) in &s.fields {
                    out.field(k, v);
                }
                out.finish()
            }

            Value::Ref(r) => match r.get() {
                Some(v) => write!(f, "&{:?}", v),
                None => write!(f, "&null"),
            },

            Value::HostFn(func) => write!(f, "<fn {}>", func.name),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Display is more user-friendly, Debug is more detailed
        match self {
            Value::String(s) => write!(f, "{}", s.as_ref()), // No quotes for Display
            Value::Bytes(b) => write!(f, "{}", String::from_utf8_lossy(b)),
            _ => fmt::Debug::fmt(self, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_debug_is_sorted() {
        let t = Value::table([("b", 2.0), ("a", 1.0)]);
        assert_eq!(format!("{:?}", t), r#"{"a": 1, "b": 2}"#);
    }

    #[test]
    fn test_display_string_unquoted() {
        assert_eq!(format!("{}", Value::string("hi")), "hi");
        assert_eq!(format!("{:?}", Value::string("hi")), "\"hi\"");
    }

    #[test]
    fn test_handle_debug() {
        assert_eq!(format!("{:?}", Value::handle(0x10usize)), "handle(0x10)");
    }

    #[test]
    fn test_null_ref_debug() {
        assert_eq!(format!("{:?}", Value::null_ref()), "&null");
        assert_eq!(format!("{:?}", Value::Nil), "nil");
    }

    #[test]
    fn test_struct_debug() {
        let point = StructValue::new("Point").with_field("x", 1i64);
        assert_eq!(format!("{:?}", Value::structure(point)), "Point { x: 1 }");
        let pair = StructValue::tuple("Pair").with_field("0", true);
        assert_eq!(format!("{:?}", Value::structure(pair)), "Pair(true)");
    }
}
