//! Native extensions installed into new interpreters
//!
//! Currently a single global table, `hash`, with non-cryptographic hash
//! functions over Lua strings.

mod hash;

use mlua_sys as ffi;
use tracing::debug;

use crate::state::Lua;

const HASH_FUNCTIONS: &[(&str, ffi::lua_CFunction)] = &[
    ("murmur3", hash::lua_murmur3),
    ("crc32", hash::lua_crc32),
    ("postgres", hash::lua_pg_hash),
];

/// Register every extension table as a global.
pub(crate) fn install(lua: &mut Lua) {
    let mut guard = lua.guard();
    install_library(&mut guard, "hash", HASH_FUNCTIONS);
}

fn install_library(lua: &mut Lua, name: &str, functions: &[(&str, ffi::lua_CFunction)]) {
    if !lua.ensure_stack(3) {
        return;
    }
    lua.new_table(0, functions.len());
    for (field, func) in functions {
        lua.push_bytes(field.as_bytes());
        unsafe { ffi::lua_pushcclosure(lua.raw(), *func, 0) }
        lua.raw_set(-3);
    }
    // the table is the only value pushed, so this cannot fail
    if lua.set_global(name).is_ok() {
        debug!(library = name, functions = functions.len(), "installed extension");
    }
}
