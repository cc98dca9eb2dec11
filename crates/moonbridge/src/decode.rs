//! Decoder: Lua stack slots back into host values

use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use crate::encode::TABLE_LEVEL_SLOTS;
use crate::error::{EntryPosition, MarshalError};
use crate::stack::LuaType;
use crate::state::Lua;
use crate::value::Value;

impl Lua {
    /// Read the value at `index` without removing it.
    ///
    /// - nil → `Nil`
    /// - string → `String` if valid UTF-8, else `Bytes`, exact length either way
    /// - number → `F64`; integers are not told apart from floats
    /// - boolean → `Bool`
    /// - light userdata → `Handle`, or `Nil` for the null marker
    /// - table → `Table` keyed by string; numeric keys are formatted as
    ///   integers truncated toward zero, so `2.7` becomes `"2"`; string keys
    ///   that are not valid UTF-8 are rejected with
    ///   [`MarshalError::UnsupportedKeyKind`] rather than merged lossily
    ///
    /// Functions, full userdata and coroutines are rejected with
    /// [`MarshalError::UnsupportedValueKind`], as is an index that names no
    /// occupied slot (kind `"no value"`). On any error the stack is left
    /// exactly as it was.
    pub fn get(&mut self, index: i32) -> Result<Value, MarshalError> {
        self.decode_at(index, 0)
    }

    /// Read and remove the top value.
    ///
    /// The slot is removed whether or not decoding succeeds. On an empty
    /// stack nothing is removed and the error names "no value".
    pub fn pop(&mut self) -> Result<Value, MarshalError> {
        if self.stack_size() == 0 {
            return Err(MarshalError::UnsupportedValueKind {
                kind: LuaType::None.name().to_string(),
            });
        }
        let value = self.get(-1);
        self.pop_n(1);
        value
    }

    fn decode_at(&mut self, index: i32, depth: usize) -> Result<Value, MarshalError> {
        let Some(index) = self.abs_index(index) else {
            return Err(MarshalError::UnsupportedValueKind {
                kind: LuaType::None.name().to_string(),
            });
        };
        match self.type_at(index) {
            LuaType::Nil => Ok(Value::Nil),
            LuaType::String => {
                let bytes = self.to_bytes(index);
                Ok(match String::from_utf8(bytes) {
                    Ok(s) => Value::String(Arc::new(s)),
                    Err(err) => Value::Bytes(Arc::new(err.into_bytes())),
                })
            }
            LuaType::Number => Ok(Value::F64(self.to_number(index))),
            LuaType::Boolean => Ok(Value::Bool(self.to_bool(index))),
            LuaType::LightUserdata => {
                let handle = self.to_handle(index);
                // null marker and nil collapse into one host value
                Ok(if handle.is_null() {
                    Value::Nil
                } else {
                    Value::Handle(handle)
                })
            }
            LuaType::Table => self.decode_table(index, depth),
            other => Err(MarshalError::UnsupportedValueKind {
                kind: other.name().to_string(),
            }),
        }
    }

    fn decode_table(&mut self, table: i32, depth: usize) -> Result<Value, MarshalError> {
        let limit = self.marshal.max_depth;
        if depth >= limit || !self.ensure_stack(TABLE_LEVEL_SLOTS) {
            return Err(MarshalError::DepthLimitExceeded { limit });
        }

        let mut result = HashMap::new();
        self.push_nil();
        while self.next(table) {
            // stack: ... key value
            let key = match self.decode_at(-2, depth + 1) {
                Ok(key) => key,
                Err(err) => {
                    self.pop_n(2);
                    return Err(err.nested(EntryPosition::Key));
                }
            };
            let value = self.decode_at(-1, depth + 1);
            self.pop_n(1);
            let value = match value {
                Ok(value) => value,
                Err(err) => {
                    self.pop_n(1);
                    return Err(err.nested(EntryPosition::Value));
                }
            };
            let key = match key {
                Value::String(s) => Arc::try_unwrap(s).unwrap_or_else(|s| (*s).clone()),
                Value::F64(n) => numeric_key(n),
                other => {
                    self.pop_n(1);
                    return Err(MarshalError::UnsupportedKeyKind {
                        kind: other.type_name(),
                    });
                }
            };
            result.insert(key, value);
        }

        trace!(entries = result.len(), depth, "decoded table");
        Ok(Value::Table(Arc::new(result)))
    }
}

/// Format a numeric table key as an integer, truncating toward zero.
///
/// Fractional keys collide with their integer part (`2.7` and `2` both
/// become `"2"`); out-of-range keys saturate at the `i64` bounds.
pub(crate) fn numeric_key(n: f64) -> String {
    (n as i64).to_string()
}

#[cfg(test)]
mod tests {
    use super::numeric_key;

    #[test]
    fn test_numeric_key_truncates() {
        assert_eq!(numeric_key(2.0), "2");
        assert_eq!(numeric_key(2.7), "2");
        assert_eq!(numeric_key(-1.5), "-1");
        assert_eq!(numeric_key(0.0), "0");
    }

    #[test]
    fn test_numeric_key_saturates() {
        assert_eq!(numeric_key(1e300), i64::MAX.to_string());
        assert_eq!(numeric_key(-1e300), i64::MIN.to_string());
    }
}
