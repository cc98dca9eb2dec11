//! serde::Serialize for Value, so decoded values can be rendered (e.g. as JSON)

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use super::*;

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Nil | Value::HostFn(_) => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::I8(n) => serializer.serialize_i8(*n),
            Value::I16(n) => serializer.serialize_i16(*n),
            Value::I32(n) => serializer.serialize_i32(*n),
            Value::I64(n) => serializer.serialize_i64(*n),
            Value::Isize(n) => serializer.serialize_i64(*n as i64),
            Value::U8(n) => serializer.serialize_u8(*n),
            Value::U16(n) => serializer.serialize_u16(*n),
            Value::U32(n) => serializer.serialize_u32(*n),
            Value::U64(n) => serializer.serialize_u64(*n),
            Value::Usize(n) => serializer.serialize_u64(*n as u64),
            Value::F32(n) => serializer.serialize_f32(*n),
            Value::F64(n) => serializer.serialize_f64(*n),
            Value::Handle(h) => serializer.serialize_u64(h.addr() as u64),
            Value::String(s) => serializer.serialize_str(s),
            Value::Bytes(b) => serializer.serialize_bytes(b),
            Value::Table(map) => {
                let mut entries: Vec<_> = map.iter().collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));
                let mut out = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
            Value::Vec(items) | Value::Tuple(items) => {
                let mut out = serializer.serialize_seq(Some(items.len()))?;
                for item in items.iter() {
                    out.serialize_element(item)?;
                }
                out.end()
            }
            Value::HashMap(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map.iter() {
                    out.serialize_entry(&k.0, v)?;
                }
                out.end()
            }
            Value::Struct(s) => {
                // Field names are owned strings, so go through a map
                let mut out = serializer.serialize_map(Some(s.fields.len()))?;
                for (k, v) in &s.fields {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
            Value::Ref(r) => match r.get() {
                Some(v) => v.serialize(serializer),
                None => serializer.serialize_unit(),
            },
        }
    }
}
