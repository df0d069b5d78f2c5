//! Runtime-typed values for the free [`hash`] function.

use num_bigint::BigInt;
use num_complex::Complex64;

use crate::datetime::{Date, DateTime, Time};
use crate::hash as h;
use crate::number::Number;

/// A borrowed value of any supported logical type, used to hash without
/// naming a writer type.
#[derive(Clone, Copy, Debug)]
pub enum Value<'a> {
    /// An absent value.
    None,
    /// A raw byte string.
    Bytes(&'a [u8]),
    /// A text string.
    Str(&'a str),
    /// A boolean.
    Bool(bool),
    /// A 64-bit integer.
    Int(i64),
    /// An integer outside the 64-bit range.
    Big(&'a BigInt),
    /// An IEEE-754 double.
    Float(f64),
    /// A complex number.
    Complex(Complex64),
    /// A date with time of day.
    DateTime(DateTime),
    /// A calendar date.
    Date(Date),
    /// A time of day.
    Time(Time),
}

/// The canonical slicing hash a writer for this value's type would use.
///
/// The collapsing rules make semantically equal values hash equal across
/// types: `hash(1) == hash(1.0) == hash(true)`, complex values with zero
/// imaginary part hash as their real part, and None is always 0.
pub fn hash(value: Value) -> u64 {
    match value {
        Value::None => 0,
        Value::Bytes(v) => h::hash_bytes(v),
        Value::Str(v) => h::hash_bytes(v.as_bytes()),
        Value::Bool(v) => h::hash_bool(v),
        Value::Int(v) => h::hash_i64(v),
        Value::Big(v) => Number::Big(v.clone()).canonical_hash(),
        Value::Float(v) => h::hash_f64(v),
        Value::Complex(v) => h::hash_complex(v.re, v.im),
        Value::DateTime(v) => {
            let (i0, i1) = v.pack();
            h::hash_datetime(i0, i1)
        }
        Value::Date(v) => h::hash_date(v.pack()),
        Value::Time(v) => {
            let (i0, i1) = v.pack();
            h::hash_datetime(i0, i1)
        }
    }
}

impl<'a> From<&'a [u8]> for Value<'a> {
    fn from(v: &'a [u8]) -> Self {
        Value::Bytes(v)
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(v: &'a str) -> Self {
        Value::Str(v)
    }
}

impl From<bool> for Value<'_> {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value<'_> {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value<'_> {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<Complex64> for Value<'_> {
    fn from(v: Complex64) -> Self {
        Value::Complex(v)
    }
}

impl From<DateTime> for Value<'_> {
    fn from(v: DateTime) -> Self {
        Value::DateTime(v)
    }
}

impl From<Date> for Value<'_> {
    fn from(v: Date) -> Self {
        Value::Date(v)
    }
}

impl From<Time> for Value<'_> {
    fn from(v: Time) -> Self {
        Value::Time(v)
    }
}

impl<'a> From<&'a Number> for Value<'a> {
    fn from(v: &'a Number) -> Self {
        match *v {
            Number::Int(i) => Value::Int(i),
            Number::Float(f) => Value::Float(f),
            Number::Big(ref b) => Value::Big(b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_relations() {
        assert_eq!(hash(Value::None), 0);
        assert_eq!(hash(Value::Int(0)), 0);
        assert_eq!(hash(Value::Bool(false)), 0);
        assert_eq!(hash(1i64.into()), hash(1.0f64.into()));
        assert_eq!(hash(1i64.into()), hash(true.into()));
        assert_eq!(
            hash(Value::Complex(Complex64::new(1.0, 0.0))),
            hash(Value::Int(1))
        );
    }

    #[test]
    fn str_and_bytes_agree() {
        assert_eq!(hash("apple".into()), hash(Value::Bytes(b"apple")));
        assert_eq!(hash("".into()), 0);
    }

    #[test]
    fn number_dispatch_matches_typed_hash() {
        let n = Number::Float(2.5);
        assert_eq!(hash((&n).into()), n.canonical_hash());
        let n = Number::Int(99);
        assert_eq!(hash((&n).into()), n.canonical_hash());
    }

    #[test]
    fn datetime_and_time_ignore_fold() {
        let dt = DateTime::new(2024, 2, 29, 12, 34, 56, 789012).unwrap();
        assert_eq!(hash(dt.into()), hash(dt.with_fold(true).into()));
        let t = Time::new(1, 2, 3, 4).unwrap();
        assert_eq!(hash(t.into()), hash(t.with_fold(true).into()));
    }
}
