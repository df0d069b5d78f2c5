//! The Number codec: variable-length integers and floats.

use super::{minmax_by_key, Codec, MinMax, Sink, Source};
use crate::error::Result;
use crate::number::{self, Tag};

/// Variable-length numbers; see [`crate::Number`] for the value type.
#[derive(Clone, Copy, Debug, Default)]
pub struct Number;

impl Codec for Number {
    type Value = crate::number::Number;
    const NAME: &'static str = "Number";
    const LIKELY_SIZE: usize = 9;
    const OPTIONAL: bool = true;
    const SUPPORTS_DEFAULT: bool = true;

    fn decode(&self, src: &mut dyn Source) -> Result<Option<crate::number::Number>> {
        let tag = src.take_u8()?;
        match number::classify_tag(tag)? {
            Tag::None => Ok(None),
            Tag::Inline(v) => Ok(Some(crate::number::Number::Int(v))),
            Tag::Payload { len, float } => {
                let payload = src.take(len)?;
                if float {
                    let bits = payload.try_into().unwrap();
                    Ok(Some(crate::number::Number::Float(f64::from_ne_bytes(bits))))
                } else {
                    Ok(Some(number::decode_int_payload(payload)))
                }
            }
        }
    }

    fn check(&self, v: &crate::number::Number, extra: &str, line: u64) -> Result<()> {
        // The only unencodable Number is a big integer past 126 payload
        // bytes; reuse the encoder's size logic against a throwaway
        // buffer so the limit lives in one place.
        if let crate::number::Number::Big(_) = *v {
            let mut scratch = Vec::new();
            number::encode(v, &mut scratch, extra).map_err(|e| {
                crate::error::Error::Overflow(format!("{}{}", e, super::line_suffix(line)))
            })?;
        }
        Ok(())
    }

    fn hash(v: &crate::number::Number) -> u64 {
        v.canonical_hash()
    }

    fn encode(&self, v: &crate::number::Number, out: &mut dyn Sink) -> Result<()> {
        let mut scratch = Vec::with_capacity(Self::LIKELY_SIZE);
        number::encode(v, &mut scratch, "")?;
        out.put(&scratch)
    }

    fn encode_none(&self, out: &mut dyn Sink) -> Result<()> {
        out.put(&[0u8])
    }

    fn update_minmax(mm: &mut MinMax<crate::number::Number>, v: &crate::number::Number) {
        // NaN handling mirrors the float rule: a recorded NaN is
        // replaced by the next real value and never replaces one.
        let v = v.clone();
        match mm.min {
            Some(ref m) if m.is_nan() && !v.is_nan() => {
                mm.min = Some(v.clone());
                mm.max = Some(v);
                return;
            }
            _ => {}
        }
        minmax_by_key(mm, v, |n| NumKey(n.clone()));
    }
}

impl super::ParsedCodec for Number {
    fn parse(s: &str) -> Option<crate::number::Number> {
        let t = s.trim();
        if let Ok(v) = t.parse::<i64>() {
            return Some(crate::number::Number::Int(v));
        }
        if let Ok(v) = t.parse::<num_bigint::BigInt>() {
            return Some(crate::number::Number::from(v));
        }
        if let Ok(v) = t.parse::<f64>() {
            return Some(crate::number::Number::Float(v));
        }
        None
    }
}

/// Total-order adapter over numeric comparison; NaN sorts as equal to
/// everything, which keeps it from ever displacing a real extremum.
struct NumKey(crate::number::Number);

impl PartialEq for NumKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for NumKey {}

impl PartialOrd for NumKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NumKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0
            .numeric_cmp(&other.0)
            .unwrap_or(std::cmp::Ordering::Equal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::number::Number as Num;
    use num_bigint::BigInt;

    #[test]
    fn minmax_spans_representations() {
        let mut mm = MinMax::default();
        for v in [
            Num::Int(5),
            Num::Float(-2.5),
            Num::Big(BigInt::from(2).pow(80)),
            Num::Int(3),
        ] {
            Number::update_minmax(&mut mm, &v);
        }
        assert_eq!(mm.min, Some(Num::Float(-2.5)));
        assert_eq!(mm.max, Some(Num::Big(BigInt::from(2).pow(80))));
    }

    #[test]
    fn minmax_nan_displaced() {
        let mut mm = MinMax::default();
        Number::update_minmax(&mut mm, &Num::Float(f64::NAN));
        assert!(mm.min.as_ref().unwrap().is_nan());
        Number::update_minmax(&mut mm, &Num::Int(4));
        assert_eq!(mm.min, Some(Num::Int(4)));
        assert_eq!(mm.max, Some(Num::Int(4)));
        Number::update_minmax(&mut mm, &Num::Float(f64::NAN));
        assert_eq!(mm.min, Some(Num::Int(4)));
        assert_eq!(mm.max, Some(Num::Int(4)));
    }
}
