//! Reflective bridge: composite host shapes without a direct Lua mapping
//!
//! Two entry points share the same rules:
//! - [`Lua::push_reflect`] walks the composite variants of [`Value`]
//! - [`Lua::push_serialize`] accepts any `T: Serialize`, so host types opt
//!   in by deriving `Serialize` instead of being inspected at runtime
//!
//! Shape rules:
//! - indirection: dereferenced once, a null indirection is absent
//! - sequence: table with 0-based integer keys
//! - mapping: table, keys pushed with their own rules (not forced to string)
//! - record: table keyed by field name
//! - anything else: absent
//!
//! Values stored in a table use the null marker when absent. Keys that Lua
//! cannot index with (nil, NaN) drop their entry.

mod ser;

use serde::Serialize;
use tracing::{debug, warn};

use crate::state::Lua;
use crate::stack::LuaType;
use crate::value::Value;

use ser::StackSerializer;

impl Lua {
    /// Push any serializable host value.
    ///
    /// Follows the same shape rules as [`push`](Lua::push). Where the
    /// value's `Serialize` impl reports an error (types that refuse to
    /// serialize, such as handles to channels or callbacks), the failing
    /// part is replaced by nil and the stack is restored around it. As with
    /// `push`, nothing is pushed when the stack cannot grow.
    pub fn push_serialize<T: Serialize + ?Sized>(&mut self, value: &T) {
        if !self.ensure_stack(1) {
            warn!("stack is full, serialized value not pushed");
            return;
        }
        self.push_serialized(value, false, 0);
    }

    pub(crate) fn push_serialized<T: Serialize + ?Sized>(
        &mut self,
        value: &T,
        slot: bool,
        depth: usize,
    ) {
        let top = self.stack_size();
        if let Err(err) = value.serialize(StackSerializer::new(self, slot, depth)) {
            warn!(%err, "value cannot be represented in Lua, pushing nil instead");
            self.restore_top(top);
            self.push_absent(slot);
        }
    }

    /// Push a composite value the encoder has no direct rule for.
    pub(crate) fn push_reflect(&mut self, value: &Value, slot: bool, depth: usize) {
        match value {
            Value::Ref(r) => match r.get() {
                Some(target) => self.push_value(target, slot, depth),
                None => self.push_absent(slot),
            },

            Value::Vec(items) | Value::Tuple(items) => {
                if !self.enter_table(depth) {
                    self.push_absent(slot);
                    return;
                }
                self.new_table(items.len(), 1);
                for (i, item) in items.iter().enumerate() {
                    self.push_integer(i as i64);
                    self.push_value(item, true, depth + 1);
                    self.raw_set(-3);
                }
            }

            Value::HashMap(map) => {
                if !self.enter_table(depth) {
                    self.push_absent(slot);
                    return;
                }
                self.new_table(0, map.len());
                for (key, item) in map.iter() {
                    self.push_value(&key.0, false, depth + 1);
                    self.push_value(item, true, depth + 1);
                    self.bind_entry();
                }
            }

            Value::Struct(record) => {
                if !self.enter_table(depth) {
                    self.push_absent(slot);
                    return;
                }
                if record.is_tuple_struct {
                    self.new_table(record.fields.len(), 1);
                    for (i, item) in record.fields.values().enumerate() {
                        self.push_integer(i as i64);
                        self.push_value(item, true, depth + 1);
                        self.raw_set(-3);
                    }
                    return;
                }
                self.new_table(0, record.fields.len());
                for (name, item) in &record.fields {
                    self.push_bytes(name.as_bytes());
                    self.push_value(item, true, depth + 1);
                    self.raw_set(-3);
                }
            }

            other => {
                debug!(kind = other.type_name(), "no Lua counterpart, pushing nil");
                self.push_absent(slot);
            }
        }
    }

    /// Store the key/value pair on top of the stack into the table just
    /// below them. Pairs whose key cannot index a table are dropped.
    pub(crate) fn bind_entry(&mut self) {
        let key_ok = match self.type_at(-2) {
            LuaType::Nil => false,
            LuaType::Number => !self.to_number(-2).is_nan(),
            _ => true,
        };
        if key_ok {
            self.raw_set(-3);
        } else {
            debug!("dropping table entry with a nil or NaN key");
            self.pop_n(2);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{HashableValue, Lua, LuaType, Value};
    use std::collections::HashMap;
    use std::sync::Arc;

    #[test]
    fn test_nil_and_nan_keys_are_dropped() {
        let mut lua = Lua::new().unwrap();
        let mut map = HashMap::new();
        map.insert(HashableValue(Value::Nil), Value::I64(1));
        map.insert(HashableValue(Value::F64(f64::NAN)), Value::I64(2));
        map.insert(HashableValue(Value::string("kept")), Value::I64(3));
        lua.push(&Value::HashMap(Arc::new(map)));
        let back = lua.pop().unwrap();
        assert_eq!(back.as_table().map(|t| t.len()), Some(1));
        assert_eq!(back.get("kept"), Some(&Value::F64(3.0)));
        assert_eq!(lua.stack_size(), 0);
    }

    #[test]
    fn test_null_ref_at_top_level_is_nil() {
        let mut lua = Lua::new().unwrap();
        lua.push(&Value::null_ref());
        assert_eq!(lua.type_at(-1), LuaType::Nil);
        lua.pop_n(1);
    }
}
