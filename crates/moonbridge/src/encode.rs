//! Encoder: host values onto the Lua stack
//!
//! The encoder handles the closed set of shapes with a direct Lua
//! counterpart. Everything else is handed to the reflective bridge in
//! `reflect`, which re-enters [`Lua::push_value`] for each constituent.
//!
//! Pushing has no error channel. Every call leaves exactly one new slot:
//! either the converted value or a nil-like substitute.

use tracing::{trace, warn};

use crate::state::Lua;
use crate::value::Value;

/// Slots a table level may need at once: the table, a key and a value.
pub(crate) const TABLE_LEVEL_SLOTS: i32 = 3;

impl Lua {
    /// Push a host value onto the stack.
    ///
    /// Dispatch, in order:
    /// - `Nil` becomes nil
    /// - strings and byte strings keep their exact length
    /// - integers become Lua integers; `u64` values above `i64::MAX` become
    ///   floats and lose precision
    /// - floats become Lua numbers, booleans Lua booleans
    /// - handles become light userdata carrying the raw address
    /// - string-keyed tables become Lua tables without any reflection
    /// - sequences, arbitrary mappings, records and references go through
    ///   the reflective bridge; host functions become nil
    ///
    /// The caller owns the new slot and must pop it once consumed. If the
    /// engine refuses to grow the stack, nothing is pushed and a warning is
    /// logged; compare [`stack_size`](Lua::stack_size) when that matters.
    pub fn push(&mut self, value: &Value) {
        if !self.ensure_stack(1) {
            warn!(kind = value.type_name(), "stack is full, value not pushed");
            return;
        }
        self.push_value(value, false, 0);
    }

    /// Push `value`; `slot` is true when the result will be stored as a
    /// table value, where nil is not allowed.
    pub(crate) fn push_value(&mut self, value: &Value, slot: bool, depth: usize) {
        match value {
            Value::Nil => self.push_absent(slot),

            Value::String(s) => self.push_bytes(s.as_bytes()),
            Value::Bytes(b) => self.push_bytes(b),

            Value::I8(n) => self.push_integer(*n as i64),
            Value::I16(n) => self.push_integer(*n as i64),
            Value::I32(n) => self.push_integer(*n as i64),
            Value::I64(n) => self.push_integer(*n),
            Value::Isize(n) => self.push_integer(*n as i64),
            Value::U8(n) => self.push_integer(*n as i64),
            Value::U16(n) => self.push_integer(*n as i64),
            Value::U32(n) => self.push_integer(*n as i64),
            Value::U64(n) => self.push_unsigned(*n),
            Value::Usize(n) => self.push_unsigned(*n as u64),

            Value::F32(n) => self.push_number(*n as f64),
            Value::F64(n) => self.push_number(*n),

            Value::Bool(b) => self.push_bool(*b),

            Value::Handle(h) => self.push_handle(*h),

            Value::Table(map) => {
                if !self.enter_table(depth) {
                    self.push_absent(slot);
                    return;
                }
                self.new_table(0, map.len());
                for (key, item) in map.iter() {
                    self.push_bytes(key.as_bytes());
                    self.push_value(item, true, depth + 1);
                    self.raw_set(-3);
                }
                trace!(entries = map.len(), depth, "pushed table");
            }

            _ => self.push_reflect(value, slot, depth),
        }
    }

    /// Check that a table may be opened at `depth` and that the engine
    /// has room for it. On refusal the caller pushes a substitute.
    pub(crate) fn enter_table(&mut self, depth: usize) -> bool {
        let limit = self.marshal.max_depth;
        if depth >= limit {
            warn!(limit, "structure nested too deeply, pushing nil instead");
            return false;
        }
        self.ensure_stack(TABLE_LEVEL_SLOTS)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Lua, LuaType, MarshalConfig, Value};

    #[test]
    fn test_scalar_tags() {
        let mut lua = Lua::new().unwrap();
        let cases = [
            (Value::Nil, LuaType::Nil),
            (Value::Bool(true), LuaType::Boolean),
            (Value::I8(-1), LuaType::Number),
            (Value::U64(u64::MAX), LuaType::Number),
            (Value::F32(0.5), LuaType::Number),
            (Value::string("s"), LuaType::String),
            (Value::bytes(vec![0u8, 1]), LuaType::String),
            (Value::handle(8usize), LuaType::LightUserdata),
            (Value::table([("k", 1i64)]), LuaType::Table),
        ];
        for (value, expected) in cases {
            lua.push(&value);
            assert_eq!(lua.type_at(-1), expected, "pushing {:?}", value);
            lua.pop_n(1);
        }
        assert_eq!(lua.stack_size(), 0);
    }

    #[test]
    fn test_table_slot_nil_becomes_marker() {
        let mut lua = Lua::new().unwrap();
        lua.push_value(&Value::Nil, true, 0);
        assert_eq!(lua.type_at(-1), LuaType::LightUserdata);
        assert!(lua.to_handle(-1).is_null());
        lua.pop_n(1);
    }

    #[test]
    fn test_depth_limit_substitutes_nil() {
        let mut lua = Lua::new().unwrap();
        lua.set_marshal_config(MarshalConfig::with_max_depth(1));
        let nested = Value::table([("inner", Value::table([("x", 1i64)]))]);
        lua.push(&nested);
        assert_eq!(lua.type_at(-1), LuaType::Table);
        let back = lua.pop().unwrap();
        assert_eq!(back.get("inner"), Some(&Value::Nil));
        assert_eq!(lua.stack_size(), 0);
    }
}
