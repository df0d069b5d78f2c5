//! Fixed-width codecs: integers, booleans, floats, and complex numbers.
//!
//! None is a reserved bit pattern inside the value space, not a tag:
//! the minimum value for signed integers, 255 for Bool, and signaling
//! NaNs with DEAD-patterned significands for the float family. The
//! unsigned Bits types reserve nothing and admit no None.

use byteorder::{ByteOrder, NativeEndian};
use num_traits::Float;

use super::{minmax_by_ord, Codec, MinMax, Sink, Source};
use crate::error::{Error, Result};
use crate::hash;

// Signaling NaNs with extra DEADness in the significand. The bit
// patterns depend on the byte order because the on-disk image is the
// host-endian memory image.
#[cfg(target_endian = "little")]
pub(crate) const NONEVAL_F64: u64 = 0xfff0_adde_adde_adde;
#[cfg(target_endian = "big")]
pub(crate) const NONEVAL_F64: u64 = 0xfff0_dead_dead_dead;
#[cfg(target_endian = "little")]
pub(crate) const NONEVAL_F32: u32 = 0xff80_adde;
#[cfg(target_endian = "big")]
pub(crate) const NONEVAL_F32: u32 = 0xff80_dead;

// The smallest value is one less than -biggest, so it makes a good
// signal value.
const NONEVAL_I64: i64 = i64::MIN;
const NONEVAL_I32: i32 = i32::MIN;

const NONEVAL_BOOL: u8 = 255;

fn none_collision(name: &str, extra: &str, line: u64) -> Error {
    Error::Overflow(format!(
        "{}: Value becomes None-marker{}{}",
        name,
        extra,
        super::line_suffix(line)
    ))
}

/// Parse the Python `complex()` surface syntax: `1+2j`, `-3.5j`, `(2)`,
/// `j`, with `inf`/`nan` accepted wherever a float is.
pub(crate) fn parse_complex(s: &str) -> Option<num_complex::Complex64> {
    let mut s = s.trim();
    if s.starts_with('(') && s.ends_with(')') {
        s = &s[1..s.len() - 1];
    }
    if s.is_empty() || s.contains(char::is_whitespace) {
        return None;
    }
    if !s.ends_with(['j', 'J']) {
        return Some(num_complex::Complex64::new(s.parse().ok()?, 0.0));
    }
    let body = &s[..s.len() - 1];
    // Split before the last +/- that starts the imaginary term; a sign
    // right after an exponent marker does not count.
    let bytes = body.as_bytes();
    let split = (1..bytes.len())
        .rev()
        .find(|&i| {
            (bytes[i] == b'+' || bytes[i] == b'-')
                && !matches!(bytes[i - 1], b'e' | b'E')
        });
    let (re_str, im_str) = match split {
        Some(i) => (&body[..i], &body[i..]),
        None => ("", body),
    };
    let re = if re_str.is_empty() { 0.0 } else { re_str.parse().ok()? };
    let im = match im_str {
        "" | "+" => 1.0,
        "-" => -1.0,
        _ => im_str.parse().ok()?,
    };
    Some(num_complex::Complex64::new(re, im))
}

impl super::ParsedCodec for Int64 {
    fn parse(s: &str) -> Option<i64> {
        s.trim().parse().ok()
    }
}

impl super::ParsedCodec for Int32 {
    fn parse(s: &str) -> Option<i32> {
        s.trim().parse().ok()
    }
}

impl super::ParsedCodec for Bits64 {
    fn parse(s: &str) -> Option<u64> {
        s.trim().parse().ok()
    }
}

impl super::ParsedCodec for Bits32 {
    fn parse(s: &str) -> Option<u32> {
        s.trim().parse().ok()
    }
}

impl super::ParsedCodec for Float64 {
    fn parse(s: &str) -> Option<f64> {
        s.trim().parse().ok()
    }
}

impl super::ParsedCodec for Float32 {
    fn parse(s: &str) -> Option<f32> {
        s.trim().parse().ok()
    }
}

impl super::ParsedCodec for Complex64 {
    fn parse(s: &str) -> Option<num_complex::Complex64> {
        parse_complex(s)
    }
}

impl super::ParsedCodec for Complex32 {
    fn parse(s: &str) -> Option<num_complex::Complex32> {
        let v = parse_complex(s)?;
        Some(num_complex::Complex32::new(v.re as f32, v.im as f32))
    }
}

/// Float min/max: any NaN already recorded is dominated by the next
/// non-NaN, so NaN is only ever reported when nothing else was observed.
fn minmax_float<T: Float>(mm: &mut MinMax<T>, v: T) {
    match mm.min {
        Some(m) if v >= m || (v.is_nan() && !m.is_nan()) => {}
        _ => mm.min = Some(v),
    }
    match mm.max {
        Some(m) if v <= m || (v.is_nan() && !m.is_nan()) => {}
        _ => mm.max = Some(v),
    }
}

/// Signed 64-bit integers. None is `i64::MIN`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Int64;

impl Codec for Int64 {
    type Value = i64;
    const NAME: &'static str = "Int64";
    const LIKELY_SIZE: usize = 8;
    const OPTIONAL: bool = true;
    const SUPPORTS_DEFAULT: bool = true;

    fn decode(&self, src: &mut dyn Source) -> Result<Option<i64>> {
        let v = NativeEndian::read_i64(src.take(8)?);
        if v == NONEVAL_I64 {
            return Ok(None);
        }
        Ok(Some(v))
    }

    fn check(&self, v: &i64, extra: &str, line: u64) -> Result<()> {
        if *v == NONEVAL_I64 {
            return Err(none_collision(Self::NAME, extra, line));
        }
        Ok(())
    }

    fn hash(v: &i64) -> u64 {
        hash::hash_i64(*v)
    }

    fn encode(&self, v: &i64, out: &mut dyn Sink) -> Result<()> {
        out.put(&v.to_ne_bytes())
    }

    fn encode_none(&self, out: &mut dyn Sink) -> Result<()> {
        out.put(&NONEVAL_I64.to_ne_bytes())
    }

    fn update_minmax(mm: &mut MinMax<i64>, v: &i64) {
        minmax_by_ord(mm, *v);
    }
}

/// Signed 32-bit integers. None is `i32::MIN`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Int32;

impl Codec for Int32 {
    type Value = i32;
    const NAME: &'static str = "Int32";
    const LIKELY_SIZE: usize = 4;
    const OPTIONAL: bool = true;
    const SUPPORTS_DEFAULT: bool = true;

    fn decode(&self, src: &mut dyn Source) -> Result<Option<i32>> {
        let v = NativeEndian::read_i32(src.take(4)?);
        if v == NONEVAL_I32 {
            return Ok(None);
        }
        Ok(Some(v))
    }

    fn check(&self, v: &i32, extra: &str, line: u64) -> Result<()> {
        if *v == NONEVAL_I32 {
            return Err(none_collision(Self::NAME, extra, line));
        }
        Ok(())
    }

    fn hash(v: &i32) -> u64 {
        hash::hash_i64(*v as i64)
    }

    fn encode(&self, v: &i32, out: &mut dyn Sink) -> Result<()> {
        out.put(&v.to_ne_bytes())
    }

    fn encode_none(&self, out: &mut dyn Sink) -> Result<()> {
        out.put(&NONEVAL_I32.to_ne_bytes())
    }

    fn update_minmax(mm: &mut MinMax<i32>, v: &i32) {
        minmax_by_ord(mm, *v);
    }
}

/// Unsigned 64-bit integers. No None.
#[derive(Clone, Copy, Debug, Default)]
pub struct Bits64;

impl Codec for Bits64 {
    type Value = u64;
    const NAME: &'static str = "Bits64";
    const LIKELY_SIZE: usize = 8;
    const OPTIONAL: bool = false;
    const SUPPORTS_DEFAULT: bool = true;

    fn decode(&self, src: &mut dyn Source) -> Result<Option<u64>> {
        Ok(Some(NativeEndian::read_u64(src.take(8)?)))
    }

    fn hash(v: &u64) -> u64 {
        hash::hash_u64(*v)
    }

    fn encode(&self, v: &u64, out: &mut dyn Sink) -> Result<()> {
        out.put(&v.to_ne_bytes())
    }

    fn update_minmax(mm: &mut MinMax<u64>, v: &u64) {
        minmax_by_ord(mm, *v);
    }
}

/// Unsigned 32-bit integers. No None.
#[derive(Clone, Copy, Debug, Default)]
pub struct Bits32;

impl Codec for Bits32 {
    type Value = u32;
    const NAME: &'static str = "Bits32";
    const LIKELY_SIZE: usize = 4;
    const OPTIONAL: bool = false;
    const SUPPORTS_DEFAULT: bool = true;

    fn decode(&self, src: &mut dyn Source) -> Result<Option<u32>> {
        Ok(Some(NativeEndian::read_u32(src.take(4)?)))
    }

    fn hash(v: &u32) -> u64 {
        hash::hash_u64(*v as u64)
    }

    fn encode(&self, v: &u32, out: &mut dyn Sink) -> Result<()> {
        out.put(&v.to_ne_bytes())
    }

    fn update_minmax(mm: &mut MinMax<u32>, v: &u32) {
        minmax_by_ord(mm, *v);
    }
}

/// Booleans, one byte each. None is 255.
#[derive(Clone, Copy, Debug, Default)]
pub struct Bool;

impl Codec for Bool {
    type Value = bool;
    const NAME: &'static str = "Bool";
    const LIKELY_SIZE: usize = 1;
    const OPTIONAL: bool = true;
    const SUPPORTS_DEFAULT: bool = true;

    fn decode(&self, src: &mut dyn Source) -> Result<Option<bool>> {
        match src.take_u8()? {
            0 => Ok(Some(false)),
            1 => Ok(Some(true)),
            NONEVAL_BOOL => Ok(None),
            _ => Err(Error::Format("File format error".into())),
        }
    }

    fn hash(v: &bool) -> u64 {
        hash::hash_bool(*v)
    }

    fn encode(&self, v: &bool, out: &mut dyn Sink) -> Result<()> {
        out.put(&[*v as u8])
    }

    fn encode_none(&self, out: &mut dyn Sink) -> Result<()> {
        out.put(&[NONEVAL_BOOL])
    }

    fn update_minmax(mm: &mut MinMax<bool>, v: &bool) {
        minmax_by_ord(mm, *v);
    }
}

/// IEEE-754 doubles. None is a reserved signaling NaN.
#[derive(Clone, Copy, Debug, Default)]
pub struct Float64;

impl Codec for Float64 {
    type Value = f64;
    const NAME: &'static str = "Float64";
    const LIKELY_SIZE: usize = 8;
    const OPTIONAL: bool = true;
    const SUPPORTS_DEFAULT: bool = true;

    fn decode(&self, src: &mut dyn Source) -> Result<Option<f64>> {
        let bits = NativeEndian::read_u64(src.take(8)?);
        if bits == NONEVAL_F64 {
            return Ok(None);
        }
        Ok(Some(f64::from_bits(bits)))
    }

    fn check(&self, v: &f64, extra: &str, line: u64) -> Result<()> {
        if v.to_bits() == NONEVAL_F64 {
            return Err(none_collision(Self::NAME, extra, line));
        }
        Ok(())
    }

    fn hash(v: &f64) -> u64 {
        hash::hash_f64(*v)
    }

    fn encode(&self, v: &f64, out: &mut dyn Sink) -> Result<()> {
        out.put(&v.to_ne_bytes())
    }

    fn encode_none(&self, out: &mut dyn Sink) -> Result<()> {
        out.put(&NONEVAL_F64.to_ne_bytes())
    }

    fn update_minmax(mm: &mut MinMax<f64>, v: &f64) {
        minmax_float(mm, *v);
    }
}

/// IEEE-754 single floats. None is a reserved signaling NaN.
#[derive(Clone, Copy, Debug, Default)]
pub struct Float32;

impl Codec for Float32 {
    type Value = f32;
    const NAME: &'static str = "Float32";
    const LIKELY_SIZE: usize = 4;
    const OPTIONAL: bool = true;
    const SUPPORTS_DEFAULT: bool = true;

    fn decode(&self, src: &mut dyn Source) -> Result<Option<f32>> {
        let bits = NativeEndian::read_u32(src.take(4)?);
        if bits == NONEVAL_F32 {
            return Ok(None);
        }
        Ok(Some(f32::from_bits(bits)))
    }

    fn check(&self, v: &f32, extra: &str, line: u64) -> Result<()> {
        if v.to_bits() == NONEVAL_F32 {
            return Err(none_collision(Self::NAME, extra, line));
        }
        Ok(())
    }

    fn hash(v: &f32) -> u64 {
        hash::hash_f64(*v as f64)
    }

    fn encode(&self, v: &f32, out: &mut dyn Sink) -> Result<()> {
        out.put(&v.to_ne_bytes())
    }

    fn encode_none(&self, out: &mut dyn Sink) -> Result<()> {
        out.put(&NONEVAL_F32.to_ne_bytes())
    }

    fn update_minmax(mm: &mut MinMax<f32>, v: &f32) {
        minmax_float(mm, *v);
    }
}

/// Complex doubles, real then imaginary. None is the Float64 sentinel
/// real part with a +0.0 imaginary part. No min/max: complex numbers
/// have no natural order.
#[derive(Clone, Copy, Debug, Default)]
pub struct Complex64;

impl Codec for Complex64 {
    type Value = num_complex::Complex64;
    const NAME: &'static str = "Complex64";
    const LIKELY_SIZE: usize = 16;
    const OPTIONAL: bool = true;
    const SUPPORTS_DEFAULT: bool = true;

    fn decode(&self, src: &mut dyn Source) -> Result<Option<num_complex::Complex64>> {
        let bytes = src.take(16)?;
        let re_bits = NativeEndian::read_u64(&bytes[..8]);
        let im_bits = NativeEndian::read_u64(&bytes[8..]);
        if re_bits == NONEVAL_F64 && im_bits == 0 {
            return Ok(None);
        }
        Ok(Some(num_complex::Complex64::new(
            f64::from_bits(re_bits),
            f64::from_bits(im_bits),
        )))
    }

    fn check(&self, v: &num_complex::Complex64, extra: &str, line: u64) -> Result<()> {
        if v.re.to_bits() == NONEVAL_F64 && v.im.to_bits() == 0 {
            return Err(none_collision(Self::NAME, extra, line));
        }
        Ok(())
    }

    fn hash(v: &num_complex::Complex64) -> u64 {
        hash::hash_complex(v.re, v.im)
    }

    fn encode(&self, v: &num_complex::Complex64, out: &mut dyn Sink) -> Result<()> {
        let mut buf = [0u8; 16];
        buf[..8].copy_from_slice(&v.re.to_ne_bytes());
        buf[8..].copy_from_slice(&v.im.to_ne_bytes());
        out.put(&buf)
    }

    fn encode_none(&self, out: &mut dyn Sink) -> Result<()> {
        let mut buf = [0u8; 16];
        buf[..8].copy_from_slice(&NONEVAL_F64.to_ne_bytes());
        out.put(&buf)
    }
}

/// Complex single floats. None is the Float32 sentinel real part with a
/// +0.0 imaginary part.
#[derive(Clone, Copy, Debug, Default)]
pub struct Complex32;

impl Codec for Complex32 {
    type Value = num_complex::Complex32;
    const NAME: &'static str = "Complex32";
    const LIKELY_SIZE: usize = 8;
    const OPTIONAL: bool = true;
    const SUPPORTS_DEFAULT: bool = true;

    fn decode(&self, src: &mut dyn Source) -> Result<Option<num_complex::Complex32>> {
        let bytes = src.take(8)?;
        let re_bits = NativeEndian::read_u32(&bytes[..4]);
        let im_bits = NativeEndian::read_u32(&bytes[4..]);
        if re_bits == NONEVAL_F32 && im_bits == 0 {
            return Ok(None);
        }
        Ok(Some(num_complex::Complex32::new(
            f32::from_bits(re_bits),
            f32::from_bits(im_bits),
        )))
    }

    fn check(&self, v: &num_complex::Complex32, extra: &str, line: u64) -> Result<()> {
        if v.re.to_bits() == NONEVAL_F32 && v.im.to_bits() == 0 {
            return Err(none_collision(Self::NAME, extra, line));
        }
        Ok(())
    }

    fn hash(v: &num_complex::Complex32) -> u64 {
        hash::hash_complex(v.re as f64, v.im as f64)
    }

    fn encode(&self, v: &num_complex::Complex32, out: &mut dyn Sink) -> Result<()> {
        let mut buf = [0u8; 8];
        buf[..4].copy_from_slice(&v.re.to_ne_bytes());
        buf[4..].copy_from_slice(&v.im.to_ne_bytes());
        out.put(&buf)
    }

    fn encode_none(&self, out: &mut dyn Sink) -> Result<()> {
        let mut buf = [0u8; 8];
        buf[..4].copy_from_slice(&NONEVAL_F32.to_ne_bytes());
        out.put(&buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_are_nans() {
        assert!(f64::from_bits(NONEVAL_F64).is_nan());
        assert!(f32::from_bits(NONEVAL_F32).is_nan());
    }

    #[test]
    fn float_minmax_drops_nan() {
        let mut mm = MinMax::<f64>::default();
        minmax_float(&mut mm, f64::NAN);
        assert!(mm.min.unwrap().is_nan());
        assert!(mm.max.unwrap().is_nan());
        minmax_float(&mut mm, 2.0);
        assert_eq!(mm.min, Some(2.0));
        assert_eq!(mm.max, Some(2.0));
        minmax_float(&mut mm, f64::NAN);
        assert_eq!(mm.min, Some(2.0));
        assert_eq!(mm.max, Some(2.0));
        minmax_float(&mut mm, -1.0);
        minmax_float(&mut mm, 5.0);
        assert_eq!(mm.min, Some(-1.0));
        assert_eq!(mm.max, Some(5.0));
    }

    #[test]
    fn int_minmax() {
        let mut mm = MinMax::<i64>::default();
        for v in [3i64, -7, 3, 12, 0] {
            minmax_by_ord(&mut mm, v);
        }
        assert_eq!(mm.min, Some(-7));
        assert_eq!(mm.max, Some(12));
    }
}
