//! Line-oriented text codecs: newline-delimited records instead of
//! length prefixes. A line of exactly `b"\x00"` is the None marker; a
//! trailing `\r` is stripped before hashing and materialization, so
//! values may not end in `\r` or contain `\n`.

use super::{Codec, Sink, Source, TextOptions};
use crate::error::{Error, Result};
use crate::hash;

const BOM: &[u8] = b"\xef\xbb\xbf";
const NONE_LINE: &[u8] = b"\x00\n";

/// Text encoding of a line column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineEncoding {
    #[default]
    Utf8,
    Latin1,
    Ascii,
}

impl LineEncoding {
    fn parse(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(LineEncoding::Utf8),
            "latin-1" | "latin1" | "iso-8859-1" => Ok(LineEncoding::Latin1),
            "ascii" | "us-ascii" => Ok(LineEncoding::Ascii),
            _ => Err(Error::Config(format!("Unsupported encoding '{}'", name))),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LineEncoding::Utf8 => "utf-8",
            LineEncoding::Latin1 => "latin-1",
            LineEncoding::Ascii => "ascii",
        }
    }
}

/// What to do with undecodable bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineErrors {
    #[default]
    Strict,
    Replace,
    Ignore,
}

impl LineErrors {
    fn parse(name: &str) -> Result<Self> {
        match name {
            "strict" => Ok(LineErrors::Strict),
            "replace" => Ok(LineErrors::Replace),
            "ignore" => Ok(LineErrors::Ignore),
            _ => Err(Error::Config(format!("Unsupported errors '{}'", name))),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LineErrors::Strict => "strict",
            LineErrors::Replace => "replace",
            LineErrors::Ignore => "ignore",
        }
    }
}

fn reject_text_options(text: &TextOptions, name: &str) -> Result<()> {
    if text.encoding.is_some() || text.errors.is_some() {
        return Err(Error::Config(format!(
            "{} does not take encoding/errors",
            name
        )));
    }
    Ok(())
}

/// Take one line, apply the None marker and `\r` stripping rules.
fn read_line(src: &mut dyn Source) -> Result<Option<Vec<u8>>> {
    let mut line = src.take_line()?;
    if line == [0u8] {
        return Ok(None);
    }
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    Ok(Some(line))
}

fn check_line(v: &[u8], extra: &str, line: u64) -> Result<()> {
    let suffix = super::line_suffix(line);
    if v == [0u8] {
        return Err(Error::Overflow(format!(
            "Value becomes None-marker{}{}",
            extra, suffix
        )));
    }
    if v.contains(&b'\n') {
        return Err(Error::Type(format!(
            "Value must not contain \\n{}{}",
            extra, suffix
        )));
    }
    if v.last() == Some(&b'\r') {
        return Err(Error::Type(format!(
            "Value must not end with \\r{}{}",
            extra, suffix
        )));
    }
    Ok(())
}

fn write_line(v: &[u8], out: &mut dyn Sink) -> Result<()> {
    out.put(v)?;
    out.put(b"\n")
}

fn decode_text(bytes: Vec<u8>, encoding: LineEncoding, errors: LineErrors) -> Result<String> {
    match encoding {
        LineEncoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
        LineEncoding::Ascii => match errors {
            LineErrors::Strict => {
                if !bytes.is_ascii() {
                    return Err(Error::Format("Non-ASCII byte in ascii line".into()));
                }
                Ok(String::from_utf8(bytes).unwrap())
            }
            LineErrors::Replace => Ok(bytes
                .iter()
                .map(|&b| if b < 128 { b as char } else { '\u{fffd}' })
                .collect()),
            LineErrors::Ignore => Ok(bytes
                .iter()
                .filter(|&&b| b < 128)
                .map(|&b| b as char)
                .collect()),
        },
        LineEncoding::Utf8 => match errors {
            LineErrors::Strict => String::from_utf8(bytes)
                .map_err(|_| Error::Format("Invalid UTF-8 in unicode line".into())),
            LineErrors::Replace => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            LineErrors::Ignore => {
                let mut out = String::with_capacity(bytes.len());
                let mut rest = &bytes[..];
                while !rest.is_empty() {
                    match std::str::from_utf8(rest) {
                        Ok(s) => {
                            out.push_str(s);
                            break;
                        }
                        Err(e) => {
                            let good = e.valid_up_to();
                            out.push_str(std::str::from_utf8(&rest[..good]).unwrap());
                            let skip = good + e.error_len().unwrap_or(rest.len() - good);
                            rest = &rest[skip..];
                        }
                    }
                }
                Ok(out)
            }
        },
    }
}

/// Newline-delimited byte strings.
#[derive(Clone, Copy, Debug, Default)]
pub struct BytesLines {
    strip_bom: bool,
}

impl Codec for BytesLines {
    type Value = [u8];
    const NAME: &'static str = "BytesLines";
    const LIKELY_SIZE: usize = 20;
    const OPTIONAL: bool = true;

    fn reader_codec(text: &TextOptions) -> Result<Self> {
        reject_text_options(text, Self::NAME)?;
        Ok(BytesLines {
            strip_bom: text.strip_bom,
        })
    }

    fn strip_bom(&self) -> bool {
        self.strip_bom
    }

    fn decode(&self, src: &mut dyn Source) -> Result<Option<Vec<u8>>> {
        read_line(src)
    }

    fn check(&self, v: &[u8], extra: &str, line: u64) -> Result<()> {
        check_line(v, extra, line)
    }

    fn hash(v: &[u8]) -> u64 {
        hash::hash_bytes(v)
    }

    fn encode(&self, v: &[u8], out: &mut dyn Sink) -> Result<()> {
        write_line(v, out)
    }

    fn encode_none(&self, out: &mut dyn Sink) -> Result<()> {
        out.put(NONE_LINE)
    }
}

/// Newline-delimited 7-bit text.
#[derive(Clone, Copy, Debug, Default)]
pub struct AsciiLines {
    strip_bom: bool,
}

impl Codec for AsciiLines {
    type Value = str;
    const NAME: &'static str = "AsciiLines";
    const LIKELY_SIZE: usize = 20;
    const OPTIONAL: bool = true;

    fn reader_codec(text: &TextOptions) -> Result<Self> {
        reject_text_options(text, Self::NAME)?;
        Ok(AsciiLines {
            strip_bom: text.strip_bom,
        })
    }

    fn strip_bom(&self) -> bool {
        self.strip_bom
    }

    fn decode(&self, src: &mut dyn Source) -> Result<Option<String>> {
        let Some(line) = read_line(src)? else {
            return Ok(None);
        };
        decode_text(line, LineEncoding::Ascii, LineErrors::Strict).map(Some)
    }

    fn check(&self, v: &str, extra: &str, line: u64) -> Result<()> {
        if let Some(pos) = v.bytes().position(|b| b > 127) {
            return Err(Error::Format(format!(
                "Value contains {} at position {}{}{}",
                v.as_bytes()[pos],
                pos,
                extra,
                super::line_suffix(line)
            )));
        }
        check_line(v.as_bytes(), extra, line)
    }

    fn hash(v: &str) -> u64 {
        hash::hash_bytes(v.as_bytes())
    }

    fn encode(&self, v: &str, out: &mut dyn Sink) -> Result<()> {
        write_line(v.as_bytes(), out)
    }

    fn encode_none(&self, out: &mut dyn Sink) -> Result<()> {
        out.put(NONE_LINE)
    }
}

/// Newline-delimited text with a configurable encoding.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnicodeLines {
    strip_bom: bool,
    write_bom: bool,
    pub(crate) encoding: LineEncoding,
    pub(crate) errors: LineErrors,
}

impl Codec for UnicodeLines {
    type Value = str;
    const NAME: &'static str = "UnicodeLines";
    const LIKELY_SIZE: usize = 20;
    const OPTIONAL: bool = true;

    fn reader_codec(text: &TextOptions) -> Result<Self> {
        let encoding = match text.encoding.as_deref() {
            Some(name) => LineEncoding::parse(name)?,
            None => LineEncoding::Utf8,
        };
        let errors = match text.errors.as_deref() {
            Some(name) => LineErrors::parse(name)?,
            None => LineErrors::Strict,
        };
        Ok(UnicodeLines {
            strip_bom: text.strip_bom,
            write_bom: false,
            encoding,
            errors,
        })
    }

    fn writer_codec(text: &TextOptions) -> Result<Self> {
        Ok(UnicodeLines {
            strip_bom: false,
            write_bom: text.write_bom,
            encoding: LineEncoding::Utf8,
            errors: LineErrors::Strict,
        })
    }

    fn prelude(&self) -> &'static [u8] {
        if self.write_bom {
            BOM
        } else {
            b""
        }
    }

    fn strip_bom(&self) -> bool {
        self.strip_bom
    }

    fn decode(&self, src: &mut dyn Source) -> Result<Option<String>> {
        let Some(line) = read_line(src)? else {
            return Ok(None);
        };
        decode_text(line, self.encoding, self.errors).map(Some)
    }

    fn check(&self, v: &str, extra: &str, line: u64) -> Result<()> {
        check_line(v.as_bytes(), extra, line)
    }

    fn hash(v: &str) -> u64 {
        hash::hash_bytes(v.as_bytes())
    }

    fn encode(&self, v: &str, out: &mut dyn Sink) -> Result<()> {
        write_line(v.as_bytes(), out)
    }

    fn encode_none(&self, out: &mut dyn Sink) -> Result<()> {
        out.put(NONE_LINE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_validation() {
        assert!(check_line(b"plain", "", 1).is_ok());
        assert!(check_line(b"", "", 1).is_ok());
        assert!(matches!(check_line(b"\x00", "", 1), Err(Error::Overflow(_))));
        assert!(check_line(b"\x00\x00", "", 1).is_ok());
        assert!(check_line(b"a\nb", "", 1).is_err());
        assert!(check_line(b"ends\r", "", 1).is_err());
        assert!(check_line(b"em\rbedded", "", 1).is_ok());
    }

    #[test]
    fn text_decoding_policies() {
        let bad = b"caf\xe9".to_vec();
        assert!(decode_text(bad.clone(), LineEncoding::Utf8, LineErrors::Strict).is_err());
        assert_eq!(
            decode_text(bad.clone(), LineEncoding::Utf8, LineErrors::Replace).unwrap(),
            "caf\u{fffd}"
        );
        assert_eq!(
            decode_text(bad.clone(), LineEncoding::Utf8, LineErrors::Ignore).unwrap(),
            "caf"
        );
        assert_eq!(
            decode_text(bad.clone(), LineEncoding::Latin1, LineErrors::Strict).unwrap(),
            "café"
        );
        assert!(decode_text(bad.clone(), LineEncoding::Ascii, LineErrors::Strict).is_err());
        assert_eq!(
            decode_text(bad, LineEncoding::Ascii, LineErrors::Ignore).unwrap(),
            "caf"
        );
    }

    #[test]
    fn encoding_names() {
        assert_eq!(LineEncoding::parse("UTF-8").unwrap(), LineEncoding::Utf8);
        assert_eq!(LineEncoding::parse("latin1").unwrap(), LineEncoding::Latin1);
        assert_eq!(
            LineEncoding::parse("iso-8859-1").unwrap(),
            LineEncoding::Latin1
        );
        assert!(LineEncoding::parse("utf-16").is_err());
        assert!(LineErrors::parse("surrogateescape").is_err());
    }
}
