//! The slicing hash: SipHash-2-4 under a fixed key, plus the per-type
//! canonicalization rules that make semantically equal values hash equal.
//!
//! Every writer and reader in this crate partitions records with these
//! functions, so their outputs are part of the on-disk contract: a value
//! placed in slice `s` by a writer must be recognized as slice `s` by any
//! later reader.

use std::hash::Hasher;

use siphasher::sip::SipHasher24;

/// The key used for slicing unless a caller supplies their own.
pub const DEFAULT_HASH_KEY: [u8; 16] = [
    94, 70, 175, 255, 152, 30, 237, 97, 252, 125, 174, 76, 165, 112, 16, 9,
];

/// SipHash-2-4 of `data` under the default slicing key.
///
/// This is the raw primitive: unlike the canonical value hashes, it does
/// not special-case empty input.
pub fn siphash24(data: &[u8]) -> u64 {
    siphash24_keyed(data, &DEFAULT_HASH_KEY)
}

/// SipHash-2-4 of `data` under a caller-supplied 16-byte key.
pub fn siphash24_keyed(data: &[u8], key: &[u8; 16]) -> u64 {
    let mut h = SipHasher24::new_with_key(key);
    h.write(data);
    h.finish()
}

/// Hash a byte sequence for slicing. Empty input hashes to 0.
pub(crate) fn hash_bytes(data: &[u8]) -> u64 {
    if data.is_empty() {
        return 0;
    }
    siphash24(data)
}

/// Hash an integer-like value: the 8-byte little-endian two's-complement
/// image, except that 0 short-circuits to 0.
pub(crate) fn hash_i64(v: i64) -> u64 {
    if v == 0 {
        return 0;
    }
    siphash24(&v.to_le_bytes())
}

/// Same rule on an unsigned bit pattern.
pub(crate) fn hash_u64(v: u64) -> u64 {
    if v == 0 {
        return 0;
    }
    siphash24(&v.to_le_bytes())
}

/// Booleans canonicalize to the integers 0/1, so `hash(true)` equals
/// `hash(1)` and `hash(false)` equals `hash(0)`.
pub(crate) fn hash_bool(v: bool) -> u64 {
    hash_i64(v as i64)
}

/// Floats that hold an exact 64-bit integer hash as that integer, so
/// `hash(1.0) == hash(1)`. Everything else hashes its IEEE-754 image.
pub(crate) fn hash_f64(v: f64) -> u64 {
    if v.fract() == 0.0 && v >= i64::MIN as f64 && v <= i64::MAX as f64 {
        let i = v as i64;
        if i as f64 == v {
            return hash_i64(i);
        }
    }
    siphash24(&v.to_le_bytes())
}

/// Complex values with a zero imaginary part collapse to the float rule
/// on the real part; otherwise the full (re, im) image is hashed.
pub(crate) fn hash_complex(re: f64, im: f64) -> u64 {
    if im == 0.0 {
        return hash_f64(re);
    }
    let mut buf = [0u8; 16];
    buf[..8].copy_from_slice(&re.to_le_bytes());
    buf[8..].copy_from_slice(&im.to_le_bytes());
    siphash24(&buf)
}

/// Hash a packed DateTime/Time image with the fold bit masked off.
pub(crate) fn hash_datetime(i0: u32, i1: u32) -> u64 {
    let mut buf = [0u8; 8];
    buf[..4].copy_from_slice(&(i0 & 0x0fff_ffff).to_le_bytes());
    buf[4..].copy_from_slice(&i1.to_le_bytes());
    siphash24(&buf)
}

/// Hash a packed Date image.
pub(crate) fn hash_date(i0: u32) -> u64 {
    siphash24(&i0.to_le_bytes())
}
