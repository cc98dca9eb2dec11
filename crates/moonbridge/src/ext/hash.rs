//! `hash.murmur3`, `hash.crc32` and `hash.postgres`

use std::ffi::c_int;

use mlua_sys as ffi;

/// MurmurHash3, x86 32-bit variant.
pub(crate) fn murmur3_32(data: &[u8], seed: u32) -> u32 {
    const C1: u32 = 0xcc9e_2d51;
    const C2: u32 = 0x1b87_3593;

    let mut h = seed;
    let mut chunks = data.chunks_exact(4);
    for chunk in &mut chunks {
        let mut k = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        k = k.wrapping_mul(C1).rotate_left(15).wrapping_mul(C2);
        h ^= k;
        h = h.rotate_left(13).wrapping_mul(5).wrapping_add(0xe654_6b64);
    }

    let tail = chunks.remainder();
    if !tail.is_empty() {
        let mut k = 0u32;
        for (i, byte) in tail.iter().enumerate() {
            k |= (*byte as u32) << (8 * i);
        }
        k = k.wrapping_mul(C1).rotate_left(15).wrapping_mul(C2);
        h ^= k;
    }

    h ^= data.len() as u32;
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    h
}

const CRC32_POLY: u32 = 0x04c1_1db7;

/// CRC-32 over the 0x04C11DB7 polynomial, most significant bit first, with
/// no reflection and no final XOR.
pub(crate) fn crc32(data: &[u8], init: u32) -> u32 {
    let mut crc = init;
    for byte in data {
        crc ^= (*byte as u32) << 24;
        for _ in 0..8 {
            crc = if crc & 0x8000_0000 != 0 {
                (crc << 1) ^ CRC32_POLY
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// Bob Jenkins' lookup3 mixing step
fn pg_mix(a: &mut u32, b: &mut u32, c: &mut u32) {
    *a = a.wrapping_sub(*c);
    *a ^= c.rotate_left(4);
    *c = c.wrapping_add(*b);
    *b = b.wrapping_sub(*a);
    *b ^= a.rotate_left(6);
    *a = a.wrapping_add(*c);
    *c = c.wrapping_sub(*b);
    *c ^= b.rotate_left(8);
    *b = b.wrapping_add(*a);
    *a = a.wrapping_sub(*c);
    *a ^= c.rotate_left(16);
    *c = c.wrapping_add(*b);
    *b = b.wrapping_sub(*a);
    *b ^= a.rotate_left(19);
    *a = a.wrapping_add(*c);
    *c = c.wrapping_sub(*b);
    *c ^= b.rotate_left(4);
    *b = b.wrapping_add(*a);
}

fn pg_final(a: &mut u32, b: &mut u32, c: &mut u32) {
    *c ^= *b;
    *c = c.wrapping_sub(b.rotate_left(14));
    *a ^= *c;
    *a = a.wrapping_sub(c.rotate_left(11));
    *b ^= *a;
    *b = b.wrapping_sub(a.rotate_left(25));
    *c ^= *b;
    *c = c.wrapping_sub(b.rotate_left(16));
    *a ^= *c;
    *a = a.wrapping_sub(c.rotate_left(4));
    *b ^= *a;
    *b = b.wrapping_sub(a.rotate_left(14));
    *c ^= *b;
    *c = c.wrapping_sub(b.rotate_left(24));
}

/// PostgreSQL's `hash_bytes` (the function behind `hashtext`), as computed
/// on little-endian hosts. PostgreSQL prints the result as a signed `int4`.
pub(crate) fn pg_hash_bytes(data: &[u8]) -> u32 {
    let init = 0x9e37_79b9u32
        .wrapping_add(data.len() as u32)
        .wrapping_add(3_923_095);
    let (mut a, mut b, mut c) = (init, init, init);

    let word = |bytes: &[u8]| u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    let mut blocks = data.chunks_exact(12);
    for block in &mut blocks {
        a = a.wrapping_add(word(&block[0..4]));
        b = b.wrapping_add(word(&block[4..8]));
        c = c.wrapping_add(word(&block[8..12]));
        pg_mix(&mut a, &mut b, &mut c);
    }

    // the low byte of c is reserved for the length in lookup3
    for (i, byte) in blocks.remainder().iter().enumerate() {
        let byte = *byte as u32;
        match i {
            0..=3 => a = a.wrapping_add(byte << (8 * i)),
            4..=7 => b = b.wrapping_add(byte << (8 * (i - 4))),
            _ => c = c.wrapping_add(byte << (8 * (i - 7))),
        }
    }
    pg_final(&mut a, &mut b, &mut c);
    c
}

/// Bytes of argument 1 if it is a string.
///
/// # Safety
/// `state` must be a live Lua state inside a native function call.
unsafe fn string_arg<'a>(state: *mut ffi::lua_State) -> Option<&'a [u8]> {
    if ffi::lua_type(state, 1) != ffi::LUA_TSTRING {
        return None;
    }
    let mut len = 0usize;
    let ptr = ffi::lua_tolstring(state, 1, &mut len);
    if ptr.is_null() {
        return None;
    }
    Some(std::slice::from_raw_parts(ptr as *const u8, len))
}

unsafe fn push_hash(state: *mut ffi::lua_State, hash: Option<u32>) -> c_int {
    match hash {
        Some(hash) => ffi::lua_pushinteger(state, hash as ffi::lua_Integer),
        None => ffi::lua_pushnil(state),
    }
    1
}

pub(crate) unsafe extern "C-unwind" fn lua_murmur3(state: *mut ffi::lua_State) -> c_int {
    let hash = string_arg(state).map(|bytes| murmur3_32(bytes, 0));
    push_hash(state, hash)
}

pub(crate) unsafe extern "C-unwind" fn lua_crc32(state: *mut ffi::lua_State) -> c_int {
    let hash = string_arg(state).map(|bytes| crc32(bytes, 0xffff_ffff));
    push_hash(state, hash)
}

pub(crate) unsafe extern "C-unwind" fn lua_pg_hash(state: *mut ffi::lua_State) -> c_int {
    let hash = string_arg(state).map(pg_hash_bytes);
    push_hash(state, hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Lua, Value};

    #[test]
    fn test_murmur3_vectors() {
        assert_eq!(murmur3_32(b"", 0), 0);
        assert_eq!(murmur3_32(b"hello", 0), 0x248b_fa47);
        assert_eq!(
            murmur3_32(b"The quick brown fox jumps over the lazy dog", 0),
            776_992_547
        );
        assert_eq!(murmur3_32(b"test_string", 0), 3_657_699_736);
    }

    #[test]
    fn test_crc32_vectors() {
        assert_eq!(crc32(b"123456789", 0xffff_ffff), 0x0376_e6e7);
        assert_eq!(crc32(b"", 0xffff_ffff), 0xffff_ffff);
        assert_eq!(crc32(b"test_string", 0xffff_ffff), 3_045_299_962);
    }

    #[test]
    fn test_pg_hash_bytes_matches_hashtext() {
        assert_eq!(pg_hash_bytes(b""), 2_817_148_525);
        assert_eq!(pg_hash_bytes(b"") as i32, -1_477_818_771);
        assert_eq!(pg_hash_bytes(b"a"), 1_075_015_857);
        assert_eq!(pg_hash_bytes(b"test_string"), 1_712_383_838);
        // exactly one full block, then the tail path
        assert_eq!(pg_hash_bytes(b"123456789012") as i32, -2_102_057_603);
        assert_eq!(pg_hash_bytes(b"hello world, abc"), 1_859_866_748);
    }

    #[test]
    fn test_hash_functions_from_lua() {
        let mut lua = Lua::new().unwrap();
        let values = lua
            .exec("return hash.murmur3('test_string'), hash.crc32('test_string')")
            .unwrap();
        assert_eq!(
            values,
            vec![Value::F64(3_657_699_736.0), Value::F64(3_045_299_962.0)]
        );
    }

    #[test]
    fn test_postgres_hash_from_lua_is_unsigned() {
        let mut lua = Lua::new().unwrap();
        let values = lua
            .exec("return hash.postgres('test_string'), hash.postgres('')")
            .unwrap();
        assert_eq!(
            values,
            vec![Value::F64(1_712_383_838.0), Value::F64(2_817_148_525.0)]
        );
    }

    #[test]
    fn test_non_string_argument_is_nil() {
        let mut lua = Lua::new().unwrap();
        let values = lua
            .exec("return hash.murmur3(42), hash.crc32({}), hash.crc32(), hash.postgres(true)")
            .unwrap();
        assert_eq!(values, vec![Value::Nil, Value::Nil, Value::Nil, Value::Nil]);
    }
}
