//! Host-side value representation exchanged with the Lua stack

mod callable;
mod compound;
mod display;
mod handle;
mod hashable;
mod impls;
mod refs;
mod ser;

pub use callable::{HostFn, HostFnPtr};
pub use compound::StructValue;
pub use handle::RawHandle;
pub use hashable::HashableValue;
pub use refs::ValueRef;

use std::collections::HashMap;
use std::sync::Arc;

/// A value native to the host application.
///
/// Values are organized into three tiers:
/// - Tier 1: Inline scalars (no allocation)
/// - Tier 2: Heap-allocated strings and composites (Arc-wrapped)
/// - Tier 3: Shapes with no direct Lua counterpart, reached through the
///   reflective bridge
///
/// The marshaling layer only ever reads a `Value`; conversions never mutate
/// the input.
#[derive(Clone)]
pub enum Value {
    // ═══════════════════════════════════════════════════════════════════
    // Tier 1: Inline Scalars
    // ═══════════════════════════════════════════════════════════════════
    /// Absent / null
    Nil,

    /// Boolean: `true` or `false`
    Bool(bool),

    // Signed integers
    /// 8-bit signed integer
    I8(i8),
    /// 16-bit signed integer
    I16(i16),
    /// 32-bit signed integer
    I32(i32),
    /// 64-bit signed integer (default integer type)
    I64(i64),
    /// Pointer-sized signed integer
    Isize(isize),

    // Unsigned integers
    /// 8-bit unsigned integer
    U8(u8),
    /// 16-bit unsigned integer
    U16(u16),
    /// 32-bit unsigned integer
    U32(u32),
    /// 64-bit unsigned integer
    U64(u64),
    /// Pointer-sized unsigned integer
    Usize(usize),

    // Floating point
    /// 32-bit floating point
    F32(f32),
    /// 64-bit floating point (default float type, and the only numeric
    /// kind the decoder produces)
    F64(f64),

    /// Opaque address passed through as a Lua light userdata
    Handle(RawHandle),

    // ═══════════════════════════════════════════════════════════════════
    // Tier 2: Heap-Allocated Strings and Composites
    // ═══════════════════════════════════════════════════════════════════
    /// UTF-8 string
    String(Arc<String>),

    /// Binary string; may contain interior zero bytes
    Bytes(Arc<Vec<u8>>),

    /// String-keyed mapping. This is the shape the decoder produces for
    /// every Lua table, and the only composite the encoder pushes without
    /// going through the reflective bridge.
    Table(Arc<HashMap<String, Value>>),

    /// Ordered sequence
    Vec(Arc<Vec<Value>>),

    /// Tuple (heterogeneous, fixed-size)
    Tuple(Arc<Vec<Value>>),

    /// Mapping with arbitrary hashable keys
    HashMap(Arc<HashMap<HashableValue, Value>>),

    /// Record with named fields
    Struct(Arc<StructValue>),

    /// Indirection to another value; may be null
    Ref(ValueRef),

    // ═══════════════════════════════════════════════════════════════════
    // Tier 3: No Lua Counterpart
    // ═══════════════════════════════════════════════════════════════════
    /// Host callable. Pushed as nil.
    HostFn(HostFn),
}
