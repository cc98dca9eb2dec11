//! # Moonbridge
//!
//! An embedded Lua 5.4 interpreter with a value marshaling layer between
//! host values and the Lua evaluation stack.
//!
//! ## Architecture
//!
//! - **Stack primitives** (`stack`): type tags, length-prefixed string
//!   transfer, numeric widening/narrowing, stack depth, RAII top guard
//! - **Encoder** (`encode`): [`Lua::push`] turns a host [`Value`] into
//!   exactly one new stack slot
//! - **Reflective bridge** (`reflect`): composite host shapes (sequences,
//!   arbitrary mappings, records, indirections) and any `T: Serialize` via
//!   [`Lua::push_serialize`]
//! - **Decoder** (`decode`): [`Lua::get`] and [`Lua::pop`] read a slot back
//!   into a [`Value`], recursing into tables
//! - **Runner** (`runner`): interpreter lifecycle, chunk loading and
//!   protected calls
//! - **Extensions** (`ext`): the `hash` table (`murmur3`, `crc32`, `postgres`)
//!   installed into every new interpreter unless disabled in [`LuaConfig`]
//!
//! ## Example
//!
//! ```no_run
//! use moonbridge::{Lua, Value};
//!
//! let mut lua = Lua::new()?;
//! lua.push(&Value::table([("answer", 42i64)]));
//! let back = lua.pop()?;
//! assert_eq!(back.get("answer"), Some(&Value::F64(42.0)));
//! assert_eq!(lua.stack_size(), 0);
//! # Ok::<(), moonbridge::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod value;

mod decode;
mod encode;
mod ext;
mod reflect;
mod runner;
mod stack;
mod state;

// Re-export main types
pub use config::{LuaConfig, MarshalConfig, DEFAULT_MAX_DEPTH};
pub use error::{EntryPosition, Error, MarshalError, Result};
pub use runner::MULTRET;
pub use stack::{LuaType, StackGuard};
pub use state::Lua;
pub use value::{HashableValue, HostFn, HostFnPtr, RawHandle, StructValue, Value, ValueRef};

/// Moonbridge version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }
}
