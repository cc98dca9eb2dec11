//! Opaque addresses carried across the boundary

use std::ffi::c_void;

/// A raw, non-owning address.
///
/// The address is pushed to Lua as a light userdata and read back
/// unchanged. Neither side takes ownership and neither side may
/// dereference it: it is a transparent token the host hands to scripts
/// and later recognises again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawHandle(pub usize);

impl RawHandle {
    /// The null handle
    pub const NULL: RawHandle = RawHandle(0);

    /// Create a handle from a pointer. The pointee is not touched.
    pub fn from_ptr<T>(ptr: *const T) -> Self {
        RawHandle(ptr as usize)
    }

    /// The raw address
    pub fn addr(self) -> usize {
        self.0
    }

    /// Check whether this is the null address
    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    pub(crate) fn as_mut_ptr(self) -> *mut c_void {
        self.0 as *mut c_void
    }
}

impl From<usize> for RawHandle {
    fn from(addr: usize) -> Self {
        RawHandle(addr)
    }
}

impl<T> From<*const T> for RawHandle {
    fn from(ptr: *const T) -> Self {
        RawHandle::from_ptr(ptr)
    }
}

impl<T> From<*mut T> for RawHandle {
    fn from(ptr: *mut T) -> Self {
        RawHandle::from_ptr(ptr as *const T)
    }
}
