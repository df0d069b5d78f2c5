//! Date and time codecs over the bit-packed images in
//! [`crate::datetime`]. A zero first word is the None marker for all
//! three; the fold bit rides along in materialized values but is masked
//! out of hashes and min/max comparison.

use byteorder::{ByteOrder, NativeEndian};

use super::{minmax_by_key, minmax_by_ord, Codec, MinMax, Sink, Source};
use crate::error::{Error, Result};
use crate::hash;

fn format_err() -> Error {
    Error::Format("File format error".into())
}

fn put_words(i0: u32, i1: u32, out: &mut dyn Sink) -> Result<()> {
    let mut buf = [0u8; 8];
    buf[..4].copy_from_slice(&i0.to_ne_bytes());
    buf[4..].copy_from_slice(&i1.to_ne_bytes());
    out.put(&buf)
}

/// Calendar date with time of day, 8 bytes.
#[derive(Clone, Copy, Debug, Default)]
pub struct DateTime;

impl Codec for DateTime {
    type Value = crate::datetime::DateTime;
    const NAME: &'static str = "DateTime";
    const LIKELY_SIZE: usize = 8;
    const OPTIONAL: bool = true;
    const SUPPORTS_DEFAULT: bool = true;

    fn decode(&self, src: &mut dyn Source) -> Result<Option<crate::datetime::DateTime>> {
        let bytes = src.take(8)?;
        let i0 = NativeEndian::read_u32(&bytes[..4]);
        let i1 = NativeEndian::read_u32(&bytes[4..]);
        if i0 == 0 {
            return Ok(None);
        }
        crate::datetime::DateTime::unpack(i0, i1)
            .map(Some)
            .ok_or_else(format_err)
    }

    fn hash(v: &crate::datetime::DateTime) -> u64 {
        let (i0, i1) = v.pack();
        hash::hash_datetime(i0, i1)
    }

    fn encode(&self, v: &crate::datetime::DateTime, out: &mut dyn Sink) -> Result<()> {
        let (i0, i1) = v.pack();
        put_words(i0, i1, out)
    }

    fn encode_none(&self, out: &mut dyn Sink) -> Result<()> {
        put_words(0, 0, out)
    }

    fn update_minmax(mm: &mut MinMax<crate::datetime::DateTime>, v: &crate::datetime::DateTime) {
        minmax_by_key(mm, *v, |dt| dt.cmp_key());
    }
}

/// Calendar date, 4 bytes.
#[derive(Clone, Copy, Debug, Default)]
pub struct Date;

impl Codec for Date {
    type Value = crate::datetime::Date;
    const NAME: &'static str = "Date";
    const LIKELY_SIZE: usize = 4;
    const OPTIONAL: bool = true;
    const SUPPORTS_DEFAULT: bool = true;

    fn decode(&self, src: &mut dyn Source) -> Result<Option<crate::datetime::Date>> {
        let i0 = NativeEndian::read_u32(src.take(4)?);
        if i0 == 0 {
            return Ok(None);
        }
        crate::datetime::Date::unpack(i0).map(Some).ok_or_else(format_err)
    }

    fn hash(v: &crate::datetime::Date) -> u64 {
        hash::hash_date(v.pack())
    }

    fn encode(&self, v: &crate::datetime::Date, out: &mut dyn Sink) -> Result<()> {
        out.put(&v.pack().to_ne_bytes())
    }

    fn encode_none(&self, out: &mut dyn Sink) -> Result<()> {
        out.put(&0u32.to_ne_bytes())
    }

    fn update_minmax(mm: &mut MinMax<crate::datetime::Date>, v: &crate::datetime::Date) {
        minmax_by_ord(mm, *v);
    }
}

/// Time of day, 8 bytes with a fixed 1970-01-01 date part.
#[derive(Clone, Copy, Debug, Default)]
pub struct Time;

impl Codec for Time {
    type Value = crate::datetime::Time;
    const NAME: &'static str = "Time";
    const LIKELY_SIZE: usize = 8;
    const OPTIONAL: bool = true;
    const SUPPORTS_DEFAULT: bool = true;

    fn decode(&self, src: &mut dyn Source) -> Result<Option<crate::datetime::Time>> {
        let bytes = src.take(8)?;
        let i0 = NativeEndian::read_u32(&bytes[..4]);
        let i1 = NativeEndian::read_u32(&bytes[4..]);
        if i0 == 0 {
            return Ok(None);
        }
        crate::datetime::Time::unpack(i0, i1)
            .map(Some)
            .ok_or_else(format_err)
    }

    fn hash(v: &crate::datetime::Time) -> u64 {
        let (i0, i1) = v.pack();
        hash::hash_datetime(i0, i1)
    }

    fn encode(&self, v: &crate::datetime::Time, out: &mut dyn Sink) -> Result<()> {
        let (i0, i1) = v.pack();
        put_words(i0, i1, out)
    }

    fn encode_none(&self, out: &mut dyn Sink) -> Result<()> {
        put_words(0, 0, out)
    }

    fn update_minmax(mm: &mut MinMax<crate::datetime::Time>, v: &crate::datetime::Time) {
        minmax_by_key(mm, *v, |t| t.cmp_key());
    }
}
