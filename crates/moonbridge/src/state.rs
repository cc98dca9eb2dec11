//! The interpreter handle

use std::ptr::NonNull;

use mlua_sys as ffi;
use tracing::debug;

use crate::config::MarshalConfig;

/// An owned Lua interpreter.
///
/// `Lua` wraps one `lua_State` and its evaluation stack. The engine is
/// single-threaded and non-reentrant, so `Lua` is neither `Send` nor
/// `Sync`; sharing an interpreter across threads is the embedder's job.
///
/// The marshaling operations ([`push`](Lua::push), [`get`](Lua::get),
/// [`pop`](Lua::pop)) and the runner operations ([`load`](Lua::load),
/// [`call`](Lua::call), ...) are implemented in separate modules on this
/// one type.
pub struct Lua {
    state: NonNull<ffi::lua_State>,
    pub(crate) marshal: MarshalConfig,
}

impl Lua {
    /// Take ownership of a freshly created state.
    pub(crate) fn from_raw(state: NonNull<ffi::lua_State>, marshal: MarshalConfig) -> Self {
        Self { state, marshal }
    }

    /// The raw state pointer, for FFI calls.
    #[inline]
    pub(crate) fn raw(&self) -> *mut ffi::lua_State {
        self.state.as_ptr()
    }

    /// Current marshaling limits.
    pub fn marshal_config(&self) -> MarshalConfig {
        self.marshal
    }

    /// Replace the marshaling limits.
    pub fn set_marshal_config(&mut self, config: MarshalConfig) {
        self.marshal = config;
    }
}

impl Drop for Lua {
    fn drop(&mut self) {
        debug!(stack = self.stack_size(), "closing Lua state");
        // SAFETY: the state was created by luaL_newstate and is closed exactly once
        unsafe { ffi::lua_close(self.raw()) }
    }
}

impl std::fmt::Debug for Lua {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lua")
            .field("state", &self.state)
            .field("stack_size", &self.stack_size())
            .field("marshal", &self.marshal)
            .finish()
    }
}
