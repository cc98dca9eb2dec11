//! serde Serializer that writes straight onto the Lua stack

use std::fmt;

use serde::ser::{self, Serialize};
use tracing::debug;

use crate::encode::TABLE_LEVEL_SLOTS;
use crate::state::Lua;

/// Why part of a value could not be pushed.
#[derive(Debug)]
pub(crate) struct Unrepresentable(String);

impl fmt::Display for Unrepresentable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for Unrepresentable {}

impl ser::Error for Unrepresentable {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Unrepresentable(msg.to_string())
    }
}

type Outcome = Result<(), Unrepresentable>;

/// Pushes exactly one value for every successful `serialize` call.
pub(crate) struct StackSerializer<'a> {
    lua: &'a mut Lua,
    slot: bool,
    depth: usize,
}

impl<'a> StackSerializer<'a> {
    pub(crate) fn new(lua: &'a mut Lua, slot: bool, depth: usize) -> Self {
        Self { lua, slot, depth }
    }

    /// Open a table at the current depth, reserving `extra` slots beyond
    /// the usual key/value pair.
    fn open_table(self, narr: usize, nrec: usize, extra: i32) -> Result<&'a mut Lua, Unrepresentable> {
        let limit = self.lua.marshal.max_depth;
        if self.depth >= limit {
            return Err(Unrepresentable(format!(
                "structure nested deeper than {limit} levels"
            )));
        }
        if !self.lua.ensure_stack(TABLE_LEVEL_SLOTS + extra) {
            return Err(Unrepresentable("Lua stack cannot grow".into()));
        }
        self.lua.new_table(narr, nrec);
        Ok(self.lua)
    }

    /// Open `{ [variant] = <inner table> }`, leaving the outer table, the
    /// variant key and the inner table on the stack.
    fn open_variant(
        self,
        variant: &'static str,
        nrec_inner: usize,
        narr_inner: usize,
    ) -> Result<&'a mut Lua, Unrepresentable> {
        let depth = self.depth;
        if depth + 1 >= self.lua.marshal.max_depth {
            return Err(Unrepresentable(format!(
                "structure nested deeper than {} levels",
                self.lua.marshal.max_depth
            )));
        }
        let lua = self.open_table(0, 1, 2)?;
        lua.push_bytes(variant.as_bytes());
        lua.new_table(narr_inner, nrec_inner);
        Ok(lua)
    }
}

/// Serialize `value` as a table value at `depth`, replacing it with the
/// null marker if it fails. Always leaves exactly one new slot.
fn push_entry_value<T: Serialize + ?Sized>(lua: &mut Lua, value: &T, depth: usize) {
    lua.push_serialized(value, true, depth);
}

/// Serialize `value` as a table key; a failure leaves nil, which drops the entry.
fn push_entry_key<T: Serialize + ?Sized>(lua: &mut Lua, key: &T, depth: usize) {
    let top = lua.stack_size();
    if let Err(err) = key.serialize(StackSerializer::new(lua, false, depth)) {
        debug!(%err, "table key cannot be represented in Lua");
        lua.restore_top(top);
        lua.push_nil();
    }
}

impl<'a> ser::Serializer for StackSerializer<'a> {
    type Ok = ();
    type Error = Unrepresentable;

    type SerializeSeq = SeqBuilder<'a>;
    type SerializeTuple = SeqBuilder<'a>;
    type SerializeTupleStruct = SeqBuilder<'a>;
    type SerializeTupleVariant = SeqBuilder<'a>;
    type SerializeMap = MapBuilder<'a>;
    type SerializeStruct = RecordBuilder<'a>;
    type SerializeStructVariant = RecordBuilder<'a>;

    fn serialize_bool(self, v: bool) -> Outcome {
        self.lua.push_bool(v);
        Ok(())
    }

    fn serialize_i8(self, v: i8) -> Outcome {
        self.serialize_i64(v as i64)
    }

    fn serialize_i16(self, v: i16) -> Outcome {
        self.serialize_i64(v as i64)
    }

    fn serialize_i32(self, v: i32) -> Outcome {
        self.serialize_i64(v as i64)
    }

    fn serialize_i64(self, v: i64) -> Outcome {
        self.lua.push_integer(v);
        Ok(())
    }

    fn serialize_i128(self, v: i128) -> Outcome {
        match i64::try_from(v) {
            Ok(n) => self.lua.push_integer(n),
            Err(_) => self.lua.push_number(v as f64),
        }
        Ok(())
    }

    fn serialize_u8(self, v: u8) -> Outcome {
        self.serialize_i64(v as i64)
    }

    fn serialize_u16(self, v: u16) -> Outcome {
        self.serialize_i64(v as i64)
    }

    fn serialize_u32(self, v: u32) -> Outcome {
        self.serialize_i64(v as i64)
    }

    fn serialize_u64(self, v: u64) -> Outcome {
        self.lua.push_unsigned(v);
        Ok(())
    }

    fn serialize_u128(self, v: u128) -> Outcome {
        match i64::try_from(v) {
            Ok(n) => self.lua.push_integer(n),
            Err(_) => self.lua.push_number(v as f64),
        }
        Ok(())
    }

    fn serialize_f32(self, v: f32) -> Outcome {
        self.serialize_f64(v as f64)
    }

    fn serialize_f64(self, v: f64) -> Outcome {
        self.lua.push_number(v);
        Ok(())
    }

    fn serialize_char(self, v: char) -> Outcome {
        let mut buf = [0u8; 4];
        self.serialize_str(v.encode_utf8(&mut buf))
    }

    fn serialize_str(self, v: &str) -> Outcome {
        self.lua.push_bytes(v.as_bytes());
        Ok(())
    }

    fn serialize_bytes(self, v: &[u8]) -> Outcome {
        self.lua.push_bytes(v);
        Ok(())
    }

    fn serialize_none(self) -> Outcome {
        self.lua.push_absent(self.slot);
        Ok(())
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Outcome {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Outcome {
        self.lua.push_absent(self.slot);
        Ok(())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Outcome {
        self.serialize_unit()
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Outcome {
        self.serialize_str(variant)
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Outcome {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Outcome {
        let depth = self.depth;
        let lua = self.open_table(0, 1, 0)?;
        lua.push_bytes(variant.as_bytes());
        push_entry_value(lua, value, depth + 1);
        lua.raw_set(-3);
        Ok(())
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqBuilder<'a>, Unrepresentable> {
        let depth = self.depth;
        let lua = self.open_table(len.unwrap_or(0), 1, 0)?;
        Ok(SeqBuilder::new(lua, depth, false))
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqBuilder<'a>, Unrepresentable> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<SeqBuilder<'a>, Unrepresentable> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SeqBuilder<'a>, Unrepresentable> {
        let depth = self.depth;
        let lua = self.open_variant(variant, 1, len)?;
        Ok(SeqBuilder::new(lua, depth + 1, true))
    }

    fn serialize_map(self, len: Option<usize>) -> Result<MapBuilder<'a>, Unrepresentable> {
        let depth = self.depth;
        let lua = self.open_table(0, len.unwrap_or(0), 0)?;
        Ok(MapBuilder { lua, depth })
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<RecordBuilder<'a>, Unrepresentable> {
        let depth = self.depth;
        let lua = self.open_table(0, len, 0)?;
        Ok(RecordBuilder {
            lua,
            depth,
            variant: false,
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<RecordBuilder<'a>, Unrepresentable> {
        let depth = self.depth;
        let lua = self.open_variant(variant, len, 0)?;
        Ok(RecordBuilder {
            lua,
            depth: depth + 1,
            variant: true,
        })
    }
}

/// Fills a table with 0-based integer keys.
pub(crate) struct SeqBuilder<'a> {
    lua: &'a mut Lua,
    depth: usize,
    next: i64,
    variant: bool,
}

impl<'a> SeqBuilder<'a> {
    fn new(lua: &'a mut Lua, depth: usize, variant: bool) -> Self {
        Self {
            lua,
            depth,
            next: 0,
            variant,
        }
    }

    fn push_element<T: Serialize + ?Sized>(&mut self, value: &T) {
        self.lua.push_integer(self.next);
        push_entry_value(self.lua, value, self.depth + 1);
        self.lua.raw_set(-3);
        self.next += 1;
    }

    fn finish(self) -> Outcome {
        if self.variant {
            // bind variant name -> inner table in the outer table
            self.lua.raw_set(-3);
        }
        Ok(())
    }
}

impl<'a> ser::SerializeSeq for SeqBuilder<'a> {
    type Ok = ();
    type Error = Unrepresentable;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Outcome {
        self.push_element(value);
        Ok(())
    }

    fn end(self) -> Outcome {
        self.finish()
    }
}

impl<'a> ser::SerializeTuple for SeqBuilder<'a> {
    type Ok = ();
    type Error = Unrepresentable;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Outcome {
        self.push_element(value);
        Ok(())
    }

    fn end(self) -> Outcome {
        self.finish()
    }
}

impl<'a> ser::SerializeTupleStruct for SeqBuilder<'a> {
    type Ok = ();
    type Error = Unrepresentable;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Outcome {
        self.push_element(value);
        Ok(())
    }

    fn end(self) -> Outcome {
        self.finish()
    }
}

impl<'a> ser::SerializeTupleVariant for SeqBuilder<'a> {
    type Ok = ();
    type Error = Unrepresentable;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Outcome {
        self.push_element(value);
        Ok(())
    }

    fn end(self) -> Outcome {
        self.finish()
    }
}

/// Fills a table from key/value pairs, keys pushed with their own rules.
pub(crate) struct MapBuilder<'a> {
    lua: &'a mut Lua,
    depth: usize,
}

impl<'a> ser::SerializeMap for MapBuilder<'a> {
    type Ok = ();
    type Error = Unrepresentable;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Outcome {
        push_entry_key(self.lua, key, self.depth + 1);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Outcome {
        push_entry_value(self.lua, value, self.depth + 1);
        self.lua.bind_entry();
        Ok(())
    }

    fn end(self) -> Outcome {
        Ok(())
    }
}

/// Fills a table keyed by field name.
pub(crate) struct RecordBuilder<'a> {
    lua: &'a mut Lua,
    depth: usize,
    variant: bool,
}

impl<'a> RecordBuilder<'a> {
    fn push_field<T: Serialize + ?Sized>(&mut self, key: &'static str, value: &T) {
        self.lua.push_bytes(key.as_bytes());
        push_entry_value(self.lua, value, self.depth + 1);
        self.lua.raw_set(-3);
    }
}

impl<'a> ser::SerializeStruct for RecordBuilder<'a> {
    type Ok = ();
    type Error = Unrepresentable;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, key: &'static str, value: &T) -> Outcome {
        self.push_field(key, value);
        Ok(())
    }

    fn end(self) -> Outcome {
        Ok(())
    }
}

impl<'a> ser::SerializeStructVariant for RecordBuilder<'a> {
    type Ok = ();
    type Error = Unrepresentable;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, key: &'static str, value: &T) -> Outcome {
        self.push_field(key, value);
        Ok(())
    }

    fn end(self) -> Outcome {
        if self.variant {
            self.lua.raw_set(-3);
        }
        Ok(())
    }
}
