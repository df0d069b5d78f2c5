//! Blob codecs: length-prefixed byte strings and their text-typed
//! variants.
//!
//! Framing: payloads under 255 bytes carry a one-byte length; longer
//! ones use `0xFF` plus a 32-bit little-endian length. A long-form
//! length of 0 is the None marker, and long-form lengths 1..=254 are
//! format errors. The single byte `0x00` would be ambiguous with the
//! marker and is rejected on write.

use byteorder::{ByteOrder, LittleEndian};

use super::{Codec, Sink, Source};
use crate::error::{Error, Result};
use crate::hash;
use crate::BUFFER_SIZE;

/// Longest encodable payload.
const MAX_BLOB: usize = 0x7fff_ffff;

fn format_err() -> Error {
    Error::Format("File format error".into())
}

fn read_blob(src: &mut dyn Source) -> Result<Option<Vec<u8>>> {
    let mut size = src.take_u8()? as u32;
    if size == 255 {
        // Long form: more than 254 bytes, or the None marker.
        size = LittleEndian::read_u32(src.take(4)?);
        if size == 0 {
            return Ok(None);
        }
        if size < 255 || size as usize > MAX_BLOB {
            return Err(format_err());
        }
    }
    let size = size as usize;
    let payload = if size > BUFFER_SIZE {
        src.take_large(size)?
    } else {
        src.take(size)?.to_vec()
    };
    Ok(Some(payload))
}

fn check_blob(payload: &[u8], extra: &str, line: u64) -> Result<()> {
    if payload == [0u8] {
        return Err(Error::Overflow(format!(
            "Value becomes None-marker{}{}",
            extra,
            super::line_suffix(line)
        )));
    }
    if payload.len() > MAX_BLOB {
        return Err(Error::Overflow(format!("Value too large{}", extra)));
    }
    Ok(())
}

fn write_blob(payload: &[u8], out: &mut dyn Sink) -> Result<()> {
    if payload.len() < 255 {
        out.put(&[payload.len() as u8])?;
    } else {
        let mut lenbuf = [0u8; 5];
        lenbuf[0] = 255;
        LittleEndian::write_u32(&mut lenbuf[1..], payload.len() as u32);
        out.put(&lenbuf)?;
    }
    out.put(payload)
}

const NONE_BLOB: &[u8] = b"\xff\x00\x00\x00\x00";

/// Raw byte strings.
#[derive(Clone, Copy, Debug, Default)]
pub struct Bytes;

impl Codec for Bytes {
    type Value = [u8];
    const NAME: &'static str = "Bytes";
    const LIKELY_SIZE: usize = 20;
    const OPTIONAL: bool = true;

    fn decode(&self, src: &mut dyn Source) -> Result<Option<Vec<u8>>> {
        read_blob(src)
    }

    fn check(&self, v: &[u8], extra: &str, line: u64) -> Result<()> {
        check_blob(v, extra, line)
    }

    fn hash(v: &[u8]) -> u64 {
        hash::hash_bytes(v)
    }

    fn encode(&self, v: &[u8], out: &mut dyn Sink) -> Result<()> {
        write_blob(v, out)
    }

    fn encode_none(&self, out: &mut dyn Sink) -> Result<()> {
        out.put(NONE_BLOB)
    }
}

/// Byte strings restricted to the 7-bit range, materialized as text.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ascii;

impl Codec for Ascii {
    type Value = str;
    const NAME: &'static str = "Ascii";
    const LIKELY_SIZE: usize = 20;
    const OPTIONAL: bool = true;

    fn decode(&self, src: &mut dyn Source) -> Result<Option<String>> {
        let Some(payload) = read_blob(src)? else {
            return Ok(None);
        };
        if !payload.is_ascii() {
            return Err(Error::Format("Non-ASCII byte in Ascii column".into()));
        }
        // All bytes verified 7-bit, so this is also valid UTF-8.
        Ok(Some(String::from_utf8(payload).unwrap()))
    }

    fn check(&self, v: &str, extra: &str, line: u64) -> Result<()> {
        if let Some(pos) = v.bytes().position(|b| b > 127) {
            let byte = v.as_bytes()[pos];
            let suffix = super::line_suffix(line);
            let msg = if v.len() < 1000 {
                format!(
                    "Value contains {} at position {}{}{}: {}",
                    byte, pos, extra, suffix, v
                )
            } else {
                format!(
                    "Value contains {} at position {}{}{}",
                    byte, pos, extra, suffix
                )
            };
            return Err(Error::Format(msg));
        }
        check_blob(v.as_bytes(), extra, line)
    }

    fn hash(v: &str) -> u64 {
        hash::hash_bytes(v.as_bytes())
    }

    fn encode(&self, v: &str, out: &mut dyn Sink) -> Result<()> {
        write_blob(v.as_bytes(), out)
    }

    fn encode_none(&self, out: &mut dyn Sink) -> Result<()> {
        out.put(NONE_BLOB)
    }
}

/// UTF-8 text.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unicode;

impl Codec for Unicode {
    type Value = str;
    const NAME: &'static str = "Unicode";
    const LIKELY_SIZE: usize = 20;
    const OPTIONAL: bool = true;

    fn decode(&self, src: &mut dyn Source) -> Result<Option<String>> {
        let Some(payload) = read_blob(src)? else {
            return Ok(None);
        };
        String::from_utf8(payload)
            .map(Some)
            .map_err(|_| Error::Format("Invalid UTF-8 in Unicode column".into()))
    }

    fn check(&self, v: &str, extra: &str, line: u64) -> Result<()> {
        check_blob(v.as_bytes(), extra, line)
    }

    fn hash(v: &str) -> u64 {
        hash::hash_bytes(v.as_bytes())
    }

    fn encode(&self, v: &str, out: &mut dyn Sink) -> Result<()> {
        write_blob(v.as_bytes(), out)
    }

    fn encode_none(&self, out: &mut dyn Sink) -> Result<()> {
        out.put(NONE_BLOB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct VecSink(Vec<u8>);
    impl Sink for VecSink {
        fn put(&mut self, data: &[u8]) -> Result<()> {
            self.0.extend_from_slice(data);
            Ok(())
        }
    }

    #[test]
    fn framing_boundaries() {
        let mut out = VecSink(Vec::new());
        // 254 bytes: short form with a one-byte length.
        write_blob(&[7u8; 254], &mut out).unwrap();
        assert_eq!(out.0[0], 254);
        assert_eq!(out.0.len(), 255);

        // 255 bytes: long form, 0xFF then the little-endian length.
        let mut out = VecSink(Vec::new());
        write_blob(&[7u8; 255], &mut out).unwrap();
        assert_eq!(&out.0[..5], &[0xff, 255, 0, 0, 0]);
        assert_eq!(out.0.len(), 255 + 5);

        let mut out = VecSink(Vec::new());
        write_blob(b"", &mut out).unwrap();
        assert_eq!(out.0, vec![0]);
    }

    #[test]
    fn none_marker_collision_rejected() {
        assert!(matches!(
            check_blob(&[0u8], "", 1),
            Err(Error::Overflow(_))
        ));
        assert!(check_blob(&[0u8, 0u8], "", 1).is_ok());
        assert!(check_blob(b"", "", 1).is_ok());
    }

    #[test]
    fn ascii_check_reports_byte_and_line() {
        let err = Ascii.check("héllo", " in col", 3).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("195"), "{}", msg);
        assert!(msg.contains("position 1"), "{}", msg);
        assert!(msg.contains("(line 3)"), "{}", msg);
        assert!(msg.contains(" in col"), "{}", msg);
        assert!(Ascii.check("hello", "", 1).is_ok());
    }
}
