//! Interpreter lifecycle, chunk loading and protected calls
//!
//! These are thin wrappers over the Lua C API. Loading leaves the compiled
//! chunk on the stack; calling consumes it. Errors raised by Lua are popped
//! off the stack and returned as [`Error::Load`] or [`Error::Runtime`].

use std::ffi::{c_char, CString};
use std::path::Path;
use std::ptr::{self, NonNull};

use mlua_sys as ffi;
use tracing::{debug, trace};

use crate::config::LuaConfig;
use crate::error::{Error, Result};
use crate::ext;
use crate::stack::LuaType;
use crate::state::Lua;
use crate::value::Value;

/// Pass as `nresults` to [`Lua::call`] to keep every returned value.
pub const MULTRET: i32 = ffi::LUA_MULTRET;

const CHUNK_NAME: &[u8] = b"=chunk\0";

const STRICT_READ: &str = r#"
local mt = getmetatable(_G) or {}
mt.__index = function(_, key)
    error("Attempt to read an uninitialized variable: " .. tostring(key), 2)
end
setmetatable(_G, mt)
"#;

const STRICT_WRITE: &str = r#"
local mt = getmetatable(_G) or {}
mt.__newindex = function(_, key, _)
    error("Attempt to write to undeclared variable: " .. tostring(key), 2)
end
setmetatable(_G, mt)
"#;

const APPEND_PACKAGE_PATH: &str = "package.path = package.path .. ';' .. ...";
const APPEND_PACKAGE_CPATH: &str = "package.cpath = package.cpath .. ';' .. ...";

impl Lua {
    /// Create an interpreter with the standard libraries and the bundled
    /// extensions.
    pub fn new() -> Result<Self> {
        Self::with_config(LuaConfig::default())
    }

    /// Create an interpreter from an explicit configuration.
    pub fn with_config(config: LuaConfig) -> Result<Self> {
        // SAFETY: luaL_newstate has no preconditions; null means allocation failed
        let state = NonNull::new(unsafe { ffi::luaL_newstate() }).ok_or(Error::StateCreation)?;
        let mut lua = Lua::from_raw(state, config.marshal);

        if config.open_libs {
            unsafe { ffi::luaL_openlibs(lua.raw()) }
        }
        if config.extensions {
            ext::install(&mut lua);
        }
        for pattern in &config.package_paths {
            lua.add_package_path(pattern)?;
        }
        for pattern in &config.package_cpaths {
            lua.add_package_cpath(pattern)?;
        }
        if config.strict_read {
            lua.strict_read()?;
        }
        if config.strict_write {
            lua.strict_write()?;
        }

        debug!(
            open_libs = config.open_libs,
            extensions = config.extensions,
            strict_read = config.strict_read,
            strict_write = config.strict_write,
            max_depth = config.marshal.max_depth,
            "created Lua state"
        );
        Ok(lua)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Loading and Calling
    // ═══════════════════════════════════════════════════════════════════

    /// Compile `code` and push the resulting function. Run it with
    /// [`run`](Lua::run) or [`call`](Lua::call).
    pub fn load(&mut self, code: &str) -> Result<()> {
        self.ensure_stack(1);
        let status = unsafe {
            ffi::luaL_loadbufferx(
                self.raw(),
                code.as_ptr() as *const c_char,
                code.len(),
                CHUNK_NAME.as_ptr() as *const c_char,
                ptr::null(),
            )
        };
        if status != ffi::LUA_OK {
            let message = self.pop_error_message();
            debug!(%message, "chunk failed to compile");
            return Err(Error::Load { message });
        }
        trace!(bytes = code.len(), "loaded chunk");
        Ok(())
    }

    /// Compile the file at `path` and push the resulting function.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let name = path
            .to_str()
            .ok_or_else(|| Error::InvalidName(path.display().to_string()))?;
        let c_name = CString::new(name).map_err(|_| Error::InvalidName(name.to_string()))?;

        self.ensure_stack(1);
        let status = unsafe { ffi::luaL_loadfilex(self.raw(), c_name.as_ptr(), ptr::null()) };
        if status != ffi::LUA_OK {
            let message = self.pop_error_message();
            debug!(path = %path.display(), %message, "file failed to load");
            return Err(Error::Load { message });
        }
        debug!(path = %path.display(), "loaded file");
        Ok(())
    }

    /// Call the function sitting below its `nargs` arguments in protected
    /// mode. The function and arguments are consumed; `nresults` values
    /// (or all of them with [`MULTRET`]) are left on the stack.
    ///
    /// Fails without calling anything when the stack does not hold the
    /// function and its arguments, or cannot grow to hold `nresults`.
    pub fn call(&mut self, nargs: i32, nresults: i32) -> Result<()> {
        if nargs < 0 || self.stack_size() <= nargs {
            return Err(Error::Runtime {
                message: format!(
                    "call needs a function and {nargs} arguments, stack holds {}",
                    self.stack_size()
                ),
            });
        }
        let no_room = nresults != MULTRET
            && (nresults < 0 || !self.ensure_stack(nresults.saturating_sub(nargs + 1)));
        if no_room {
            return Err(Error::Runtime {
                message: format!("stack cannot hold {nresults} results"),
            });
        }
        // SAFETY: the function and nargs arguments are on the stack and
        // there is room for nresults values once they are consumed
        let status = unsafe { ffi::lua_pcall(self.raw(), nargs, nresults, 0) };
        if status != ffi::LUA_OK {
            let message = self.pop_error_message();
            debug!(%message, "protected call failed");
            return Err(Error::Runtime { message });
        }
        Ok(())
    }

    /// Call the loaded chunk on top of the stack with no arguments, keeping
    /// every returned value.
    pub fn run(&mut self) -> Result<()> {
        self.call(0, MULTRET)
    }

    /// Load and run `code`, then pop and return every value it returned,
    /// in return order. The stack is left as it was found, even on error.
    pub fn exec(&mut self, code: &str) -> Result<Vec<Value>> {
        let mut guard = self.guard();
        let base = guard.saved_top();
        guard.load(code)?;
        guard.run()?;
        let count = guard.stack_size() - base;
        let mut values = Vec::with_capacity(count.max(0) as usize);
        for index in (base + 1)..=(base + count) {
            values.push(guard.get(index)?);
        }
        Ok(values)
    }

    /// Pop the error object Lua left on top of the stack as text.
    fn pop_error_message(&mut self) -> String {
        let message = match self.type_at(-1) {
            LuaType::String | LuaType::Number => {
                String::from_utf8_lossy(&self.to_bytes(-1)).into_owned()
            }
            LuaType::None => "unknown error".to_string(),
            _ => match self.get(-1) {
                Ok(value) => format!("{:?}", value),
                Err(_) => format!("({} error object)", self.type_name_at(-1)),
            },
        };
        self.pop_n(1);
        message
    }

    // ═══════════════════════════════════════════════════════════════════
    // Globals
    // ═══════════════════════════════════════════════════════════════════

    /// Push the global `name`. Bypasses `_G`'s metatable, so it is safe
    /// under [`strict_read`](Lua::strict_read).
    pub fn get_global(&mut self, name: &str) {
        self.ensure_stack(2);
        self.push_globals();
        self.push_bytes(name.as_bytes());
        unsafe {
            ffi::lua_rawget(self.raw(), -2);
            // drop the globals table below the value
            ffi::lua_rotate(self.raw(), -2, 1);
        }
        self.pop_n(1);
    }

    /// Pop the top value into the global `name`. Bypasses `_G`'s metatable,
    /// so it is the way to declare globals under
    /// [`strict_write`](Lua::strict_write).
    pub fn set_global(&mut self, name: &str) -> Result<()> {
        if self.stack_size() == 0 {
            return Err(Error::Runtime {
                message: format!("no value on the stack to assign to global {name:?}"),
            });
        }
        self.ensure_stack(3);
        self.push_globals();
        self.push_bytes(name.as_bytes());
        self.push_copy(-3);
        self.raw_set(-3);
        self.pop_n(2);
        Ok(())
    }

    /// Read the global `name` as a host value.
    pub fn global(&mut self, name: &str) -> Result<Value> {
        self.get_global(name);
        Ok(self.pop()?)
    }

    /// Assign a host value to the global `name`.
    pub fn set_global_value(&mut self, name: &str, value: &Value) -> Result<()> {
        self.push(value);
        self.set_global(name)
    }

    /// Check whether the global `name` is a function. The stack is unchanged.
    pub fn check_function(&mut self, name: &str) -> bool {
        self.get_global(name);
        let found = self.type_at(-1) == LuaType::Function;
        self.pop_n(1);
        found
    }

    // ═══════════════════════════════════════════════════════════════════
    // Environment
    // ═══════════════════════════════════════════════════════════════════

    /// Append a pattern to `package.path` (the `require` search path).
    pub fn add_package_path(&mut self, pattern: &str) -> Result<()> {
        self.run_with_arg(APPEND_PACKAGE_PATH, pattern)
    }

    /// Append a pattern to `package.cpath` (the native `require` search path).
    pub fn add_package_cpath(&mut self, pattern: &str) -> Result<()> {
        self.run_with_arg(APPEND_PACKAGE_CPATH, pattern)
    }

    /// Make reading an undefined global an error.
    pub fn strict_read(&mut self) -> Result<()> {
        self.exec(STRICT_READ).map(|_| ())
    }

    /// Make assigning an undeclared global an error. Globals can still be
    /// declared with [`set_global`](Lua::set_global) or `rawset`.
    pub fn strict_write(&mut self) -> Result<()> {
        self.exec(STRICT_WRITE).map(|_| ())
    }

    fn run_with_arg(&mut self, code: &str, arg: &str) -> Result<()> {
        let mut guard = self.guard();
        guard.load(code)?;
        guard.push(&Value::string(arg));
        guard.call(1, 0)
    }
}
