//! Stack primitives: type tags, scalar transfer, depth, RAII top guard
//!
//! Everything here maps onto one or two Lua C API calls. Higher layers
//! (encoder, decoder, runner) never touch `mlua_sys` for scalar work.
//!
//! Public methods validate their index arguments. The `pub(crate)` pushes
//! assume the caller reserved a slot with `ensure_stack`, and the
//! `pub(crate)` reads and table operations assume their index names an
//! occupied slot.

use std::ffi::{c_char, c_int, CStr};

use mlua_sys as ffi;
use tracing::warn;

use crate::error::{Error, Result};
use crate::state::Lua;
use crate::value::RawHandle;

/// Tag of a Lua value on the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LuaType {
    /// No value at that index
    None,
    /// nil
    Nil,
    /// boolean
    Boolean,
    /// light userdata (raw address)
    LightUserdata,
    /// number (integer or float subtype)
    Number,
    /// string
    String,
    /// table
    Table,
    /// function (Lua or C)
    Function,
    /// full userdata
    Userdata,
    /// coroutine
    Thread,
}

impl LuaType {
    pub(crate) fn from_raw(tag: c_int) -> Self {
        match tag {
            ffi::LUA_TNIL => LuaType::Nil,
            ffi::LUA_TBOOLEAN => LuaType::Boolean,
            ffi::LUA_TLIGHTUSERDATA => LuaType::LightUserdata,
            ffi::LUA_TNUMBER => LuaType::Number,
            ffi::LUA_TSTRING => LuaType::String,
            ffi::LUA_TTABLE => LuaType::Table,
            ffi::LUA_TFUNCTION => LuaType::Function,
            ffi::LUA_TUSERDATA => LuaType::Userdata,
            ffi::LUA_TTHREAD => LuaType::Thread,
            _ => LuaType::None,
        }
    }

    /// The name Lua's `type()` would report
    pub const fn name(self) -> &'static str {
        match self {
            LuaType::None => "no value",
            LuaType::Nil => "nil",
            LuaType::Boolean => "boolean",
            LuaType::LightUserdata | LuaType::Userdata => "userdata",
            LuaType::Number => "number",
            LuaType::String => "string",
            LuaType::Table => "table",
            LuaType::Function => "function",
            LuaType::Thread => "thread",
        }
    }
}

impl Lua {
    // ═══════════════════════════════════════════════════════════════════
    // Depth
    // ═══════════════════════════════════════════════════════════════════

    /// Current number of slots on the evaluation stack.
    ///
    /// Balanced marshaling leaves this unchanged; tests use it to detect
    /// leaked slots.
    pub fn stack_size(&self) -> i32 {
        // SAFETY: the state is valid for the lifetime of self
        unsafe { ffi::lua_gettop(self.raw()) }
    }

    /// Set the stack top. Slots above the current top are filled with nil.
    ///
    /// `index` is either an absolute depth (`0` empties the stack) or a
    /// negative offset from the top down to `-(stack_size() + 1)`. Anything
    /// else, or growth the engine refuses, is an [`Error::InvalidIndex`].
    pub fn set_top(&mut self, index: i32) -> Result<()> {
        let top = self.stack_size();
        let target = if index >= 0 {
            index
        } else {
            top.checked_add(index + 1)
                .filter(|t| *t >= 0)
                .ok_or(Error::InvalidIndex { index, top })?
        };
        if target > top && !self.ensure_stack(target - top) {
            return Err(Error::InvalidIndex { index, top });
        }
        // SAFETY: 0 <= target, and slots above the old top were reserved
        unsafe { ffi::lua_settop(self.raw(), target) }
        Ok(())
    }

    /// Reset the top to a depth recorded earlier by the crate itself.
    pub(crate) fn restore_top(&mut self, top: i32) {
        if let Err(err) = self.set_top(top) {
            warn!(%err, "could not restore the Lua stack top");
        }
    }

    /// Remove `n` slots from the top, clamped to the current depth.
    pub fn pop_n(&mut self, n: i32) {
        let n = n.min(self.stack_size());
        if n > 0 {
            // SAFETY: n <= stack_size, so the new top is at least 0
            unsafe { ffi::lua_settop(self.raw(), -n - 1) }
        }
    }

    /// Convert an index into an absolute one.
    ///
    /// Only indices naming an occupied slot are accepted: `1..=stack_size()`
    /// or `-stack_size()..=-1`. Anything else gives `None`.
    pub fn abs_index(&self, index: i32) -> Option<i32> {
        let top = self.stack_size();
        if 1 <= index && index <= top {
            Some(index)
        } else if -top <= index && index <= -1 {
            Some(top + index + 1)
        } else {
            None
        }
    }

    /// Tag of the value at `index`; [`LuaType::None`] for an index that
    /// names no occupied slot.
    pub fn type_at(&self, index: i32) -> LuaType {
        match self.abs_index(index) {
            // SAFETY: the index names an occupied slot
            Some(index) => LuaType::from_raw(unsafe { ffi::lua_type(self.raw(), index) }),
            None => LuaType::None,
        }
    }

    /// Make room for `extra` more slots. False if the engine refuses.
    pub(crate) fn ensure_stack(&mut self, extra: i32) -> bool {
        if extra <= 0 {
            return true;
        }
        // SAFETY: extra is positive; lua_checkstack never raises
        let ok = unsafe { ffi::lua_checkstack(self.raw(), extra) } != 0;
        if !ok {
            warn!(extra, depth = self.stack_size(), "Lua stack cannot grow");
        }
        ok
    }

    /// Guard that restores the current stack top when dropped.
    pub fn guard(&mut self) -> StackGuard<'_> {
        let top = self.stack_size();
        StackGuard { lua: self, top }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Scalar Pushes
    // ═══════════════════════════════════════════════════════════════════

    pub(crate) fn push_nil(&mut self) {
        // SAFETY: caller reserved one slot
        unsafe { ffi::lua_pushnil(self.raw()) }
    }

    /// Push the null marker: a light userdata holding address zero. Table
    /// values cannot be nil, so absent values inside tables use this.
    pub(crate) fn push_null_marker(&mut self) {
        // SAFETY: caller reserved one slot; the address is never dereferenced
        unsafe { ffi::lua_pushlightuserdata(self.raw(), std::ptr::null_mut()) }
    }

    /// Push an absent value: the null marker in a table value slot, nil elsewhere.
    pub(crate) fn push_absent(&mut self, slot: bool) {
        if slot {
            self.push_null_marker();
        } else {
            self.push_nil();
        }
    }

    /// Push a length-prefixed string. Interior zero bytes are preserved.
    pub(crate) fn push_bytes(&mut self, bytes: &[u8]) {
        // SAFETY: caller reserved one slot; Lua copies `len` bytes from the pointer
        unsafe {
            ffi::lua_pushlstring(self.raw(), bytes.as_ptr() as *const c_char, bytes.len());
        }
    }

    pub(crate) fn push_integer(&mut self, n: i64) {
        // SAFETY: caller reserved one slot
        unsafe { ffi::lua_pushinteger(self.raw(), n as ffi::lua_Integer) }
    }

    /// Push an unsigned integer. Values above `i64::MAX` do not fit a Lua
    /// integer and are pushed as floats, losing precision.
    pub(crate) fn push_unsigned(&mut self, n: u64) {
        match i64::try_from(n) {
            Ok(n) => self.push_integer(n),
            Err(_) => self.push_number(n as f64),
        }
    }

    pub(crate) fn push_number(&mut self, n: f64) {
        // SAFETY: caller reserved one slot
        unsafe { ffi::lua_pushnumber(self.raw(), n as ffi::lua_Number) }
    }

    pub(crate) fn push_bool(&mut self, b: bool) {
        // SAFETY: caller reserved one slot
        unsafe { ffi::lua_pushboolean(self.raw(), b as c_int) }
    }

    /// Push a raw address as a light userdata. No ownership is transferred.
    pub(crate) fn push_handle(&mut self, handle: RawHandle) {
        // SAFETY: caller reserved one slot; Lua stores the address opaquely
        unsafe { ffi::lua_pushlightuserdata(self.raw(), handle.as_mut_ptr()) }
    }

    /// Push a copy of the value at `index`.
    pub(crate) fn push_copy(&mut self, index: i32) {
        // SAFETY: caller reserved one slot and `index` names an occupied slot
        unsafe { ffi::lua_pushvalue(self.raw(), index) }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Tables
    // ═══════════════════════════════════════════════════════════════════

    /// Push a new empty table with preallocated array and hash parts.
    pub(crate) fn new_table(&mut self, narr: usize, nrec: usize) {
        let narr = c_int::try_from(narr).unwrap_or(c_int::MAX);
        let nrec = c_int::try_from(nrec).unwrap_or(c_int::MAX);
        // SAFETY: caller reserved one slot
        unsafe { ffi::lua_createtable(self.raw(), narr, nrec) }
    }

    /// Pop a key and a value and store them in the table at `table`
    /// (raw access, no metamethods). The key must be neither nil nor NaN.
    pub(crate) fn raw_set(&mut self, table: i32) {
        // SAFETY: `table` names a table below the key and value on top
        unsafe { ffi::lua_rawset(self.raw(), table) }
    }

    /// Advance a `lua_next` traversal of the table at absolute index `table`.
    pub(crate) fn next(&mut self, table: i32) -> bool {
        // SAFETY: `table` is an absolute index of a table, a key sits on top,
        // and the caller reserved room for the key and value pushed back
        unsafe { ffi::lua_next(self.raw(), table) != 0 }
    }

    /// Push the globals table.
    pub(crate) fn push_globals(&mut self) {
        // SAFETY: caller reserved one slot; the registry always holds the globals
        unsafe {
            ffi::lua_rawgeti(self.raw(), ffi::LUA_REGISTRYINDEX, ffi::LUA_RIDX_GLOBALS);
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Scalar Reads
    // ═══════════════════════════════════════════════════════════════════

    /// Copy the bytes of the string at `index`. Only call on string slots:
    /// `lua_tolstring` would convert a number in place.
    pub(crate) fn to_bytes(&self, index: i32) -> Vec<u8> {
        let mut len = 0usize;
        // SAFETY: `index` names an occupied string slot
        let ptr = unsafe { ffi::lua_tolstring(self.raw(), index, &mut len) };
        if ptr.is_null() {
            return Vec::new();
        }
        // SAFETY: Lua guarantees `len` readable bytes while the string is on the stack
        unsafe { std::slice::from_raw_parts(ptr as *const u8, len) }.to_vec()
    }

    pub(crate) fn to_number(&self, index: i32) -> f64 {
        // SAFETY: `index` names an occupied slot; a null isnum pointer is allowed
        unsafe { ffi::lua_tonumberx(self.raw(), index, std::ptr::null_mut()) as f64 }
    }

    pub(crate) fn to_bool(&self, index: i32) -> bool {
        // SAFETY: `index` names an occupied slot
        unsafe { ffi::lua_toboolean(self.raw(), index) != 0 }
    }

    pub(crate) fn to_handle(&self, index: i32) -> RawHandle {
        // SAFETY: `index` names an occupied slot; the address is only copied
        RawHandle(unsafe { ffi::lua_touserdata(self.raw(), index) } as usize)
    }

    /// Lua's name for the type of the value at `index`.
    /// `"no value"` for an index that names no occupied slot.
    pub fn type_name_at(&self, index: i32) -> String {
        let Some(index) = self.abs_index(index) else {
            return LuaType::None.name().to_string();
        };
        // SAFETY: the index names an occupied slot
        let tag = unsafe { ffi::lua_type(self.raw(), index) };
        // SAFETY: `tag` came from lua_type, so it is a valid type tag
        let name = unsafe { ffi::lua_typename(self.raw(), tag) };
        if name.is_null() {
            return LuaType::from_raw(tag).name().to_string();
        }
        // SAFETY: lua_typename returns a static NUL-terminated string
        unsafe { CStr::from_ptr(name) }.to_string_lossy().into_owned()
    }
}

/// RAII guard that resets the stack top when dropped.
///
/// Operations that may bail out halfway (a failed protected call, a
/// decode error while collecting several results) hold one so that every
/// exit path leaves the stack where it started.
///
/// # Example
///
/// ```no_run
/// use moonbridge::{Lua, Value};
///
/// let mut lua = Lua::new()?;
/// {
///     let mut guard = lua.guard();
///     guard.push(&Value::I64(1));
///     guard.push(&Value::I64(2));
/// }
/// assert_eq!(lua.stack_size(), 0);
/// # Ok::<(), moonbridge::Error>(())
/// ```
pub struct StackGuard<'a> {
    lua: &'a mut Lua,
    top: i32,
}

impl<'a> StackGuard<'a> {
    /// The depth that will be restored on drop
    pub fn saved_top(&self) -> i32 {
        self.top
    }
}

impl<'a> Drop for StackGuard<'a> {
    fn drop(&mut self) {
        self.lua.restore_top(self.top);
    }
}

impl<'a> std::ops::Deref for StackGuard<'a> {
    type Target = Lua;

    fn deref(&self) -> &Self::Target {
        self.lua
    }
}

impl<'a> std::ops::DerefMut for StackGuard<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.lua
    }
}
