//! Host callables

use std::sync::Arc;

use super::Value;

/// Shared host closure behind a [`HostFn`]
pub type HostFnPtr = Arc<dyn Fn(&[Value]) -> Result<Value, String> + Send + Sync>;

/// A native host function.
///
/// Host functions live in the host value universe only. The marshaling
/// layer has no way to hand them to Lua, so they are pushed as nil (or as
/// the null marker inside a table) and can never be decoded back.
#[derive(Clone)]
pub struct HostFn {
    /// Function name (for display/debugging)
    pub name: String,

    /// The actual function pointer
    pub func: HostFnPtr,
}

impl HostFn {
    /// Wrap a closure as a host function
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// Invoke the function on the host side
    pub fn call(&self, args: &[Value]) -> Result<Value, String> {
        (self.func)(args)
    }
}

impl std::fmt::Debug for HostFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HostFn({})", self.name)
    }
}
