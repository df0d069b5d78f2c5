//! The Number logical type: a variable-length encoding that reproduces
//! integers exactly up to ±(2^1007 − 1) while keeping floats
//! distinguishable by tag, and spending only one byte on common small
//! integers.

use std::cmp::Ordering;
use std::fmt;

use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::error::{Error, Result};
use crate::hash;

/// Longest wire record: one tag byte plus up to 126 payload bytes.
pub(crate) const NUMBER_MAX_BYTES: usize = 127;

/// A Number value: an integer (machine-sized or big) or a float.
///
/// Integers that fit in an `i64` are always held as [`Number::Int`];
/// conversions from `BigInt` normalize, so `Number::from(BigInt::from(7))`
/// equals `Number::from(7i64)`.
#[derive(Clone, Debug, PartialEq)]
pub enum Number {
    /// An integer representable in 64 bits.
    Int(i64),
    /// An integer outside the 64-bit range.
    Big(BigInt),
    /// An IEEE-754 double.
    Float(f64),
}

impl Number {
    /// True for a float NaN.
    pub fn is_nan(&self) -> bool {
        matches!(*self, Number::Float(v) if v.is_nan())
    }

    /// The value as an `f64`, rounding or saturating as needed.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Number::Int(v) => v as f64,
            Number::Float(v) => v,
            Number::Big(ref v) => v.to_f64().unwrap_or(f64::NAN),
        }
    }

    /// Numeric comparison across the three representations. `None` when
    /// a NaN is involved.
    pub fn numeric_cmp(&self, other: &Number) -> Option<Ordering> {
        use Number::*;
        match (self, other) {
            (Int(a), Int(b)) => Some(a.cmp(b)),
            (Big(a), Big(b)) => Some(a.cmp(b)),
            (Int(a), Big(b)) => Some(BigInt::from(*a).cmp(b)),
            (Big(a), Int(b)) => Some(a.cmp(&BigInt::from(*b))),
            _ => self.as_f64().partial_cmp(&other.as_f64()),
        }
    }

    /// The canonical slicing hash of this value.
    pub(crate) fn canonical_hash(&self) -> u64 {
        match *self {
            Number::Int(v) => hash::hash_i64(v),
            Number::Float(v) => hash::hash_f64(v),
            // A directly-constructed Big may still fit 64 bits; it must
            // hash like the equivalent Int.
            Number::Big(ref v) => match v.to_i64() {
                Some(small) => hash::hash_i64(small),
                None => hash::hash_bytes(&big_payload_unchecked(v)),
            },
        }
    }
}

impl From<i64> for Number {
    fn from(v: i64) -> Self {
        Number::Int(v)
    }
}

impl From<f64> for Number {
    fn from(v: f64) -> Self {
        Number::Float(v)
    }
}

impl From<BigInt> for Number {
    fn from(v: BigInt) -> Self {
        match v.to_i64() {
            Some(small) => Number::Int(small),
            None => Number::Big(v),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Number::Int(v) => write!(f, "{}", v),
            Number::Big(ref v) => write!(f, "{}", v),
            Number::Float(v) => write!(f, "{}", v),
        }
    }
}

/// The signed little-endian payload of a big integer, sized
/// `magnitude_bits/8 + 1` (sign-extended past the minimal length where
/// needed). The big-int hash covers exactly these bytes.
fn big_payload_unchecked(v: &BigInt) -> Vec<u8> {
    let len = (v.bits() / 8 + 1) as usize;
    let mut bytes = v.to_signed_bytes_le();
    let fill = if v.sign() == num_bigint::Sign::Minus {
        0xff
    } else {
        0x00
    };
    bytes.resize(len, fill);
    bytes
}

/// Append the wire encoding of `v` to `out`.
///
/// Layout: tag 0x80..=0xFA inlines −5..=117; tags 2/4/8 carry that many
/// little-endian signed bytes; tag 1 carries an 8-byte double; tags
/// 9..=126 carry a signed big integer of that many bytes.
pub(crate) fn encode(v: &Number, out: &mut Vec<u8>, error_extra: &str) -> Result<()> {
    // Route a 64-bit-sized Big through the Int branches so the wire
    // image never depends on how the value was constructed.
    if let Number::Big(ref big) = *v {
        if let Some(small) = big.to_i64() {
            return encode(&Number::Int(small), out, error_extra);
        }
    }
    match *v {
        Number::Float(value) => {
            out.push(1);
            out.extend_from_slice(&value.to_ne_bytes());
        }
        Number::Int(value) => {
            if (-5..=117).contains(&value) {
                out.push(0x80 | (value + 5) as u8);
            } else if (i16::MIN as i64..=i16::MAX as i64).contains(&value) {
                out.push(2);
                out.extend_from_slice(&(value as i16).to_ne_bytes());
            } else if (i32::MIN as i64..=i32::MAX as i64).contains(&value) {
                out.push(4);
                out.extend_from_slice(&(value as i32).to_ne_bytes());
            } else {
                out.push(8);
                out.extend_from_slice(&value.to_ne_bytes());
            }
        }
        Number::Big(ref value) => {
            let len = (value.bits() / 8 + 1) as usize;
            if len >= NUMBER_MAX_BYTES {
                return Err(Error::Overflow(format!(
                    "Value does not fit in {} bytes{}",
                    NUMBER_MAX_BYTES, error_extra
                )));
            }
            out.push(len as u8);
            out.extend_from_slice(&big_payload_unchecked(value));
        }
    }
    Ok(())
}

/// Payload length for a tag byte, or the inline/None interpretation.
pub(crate) enum Tag {
    /// Tag 0: the None marker.
    None,
    /// Tags 0x80..=0xFA: the value is inline in the tag.
    Inline(i64),
    /// A payload of this many bytes follows; `float` for tag 1.
    Payload { len: usize, float: bool },
}

/// Classify a Number tag byte. Refuses the tags of older layout
/// revisions along with everything else outside §3.3.
pub(crate) fn classify_tag(tag: u8) -> Result<Tag> {
    match tag {
        0 => Ok(Tag::None),
        1 => Ok(Tag::Payload { len: 8, float: true }),
        2 | 4 | 8 => Ok(Tag::Payload {
            len: tag as usize,
            float: false,
        }),
        9..=126 => Ok(Tag::Payload {
            len: tag as usize,
            float: false,
        }),
        0x80..=0xFA => Ok(Tag::Inline((tag & 0x7f) as i64 - 5)),
        _ => Err(Error::Format("File format error".into())),
    }
}

/// Decode a non-float payload of `len` bytes (2, 4, 8, or a big-int
/// length) into a Number.
pub(crate) fn decode_int_payload(payload: &[u8]) -> Number {
    match payload.len() {
        2 => Number::Int(i16::from_ne_bytes(payload.try_into().unwrap()) as i64),
        4 => Number::Int(i32::from_ne_bytes(payload.try_into().unwrap()) as i64),
        8 => Number::Int(i64::from_ne_bytes(payload.try_into().unwrap())),
        _ => Number::from(BigInt::from_signed_bytes_le(payload)),
    }
}
