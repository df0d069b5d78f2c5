//! The streaming write engine: per-value encoding through a bounded
//! buffer into a compressed file, with slice filtering, default-value
//! substitution, min/max observation, and deferred file creation.

use std::borrow::Borrow;
use std::fs::{File, OpenOptions};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::codec::{self, Codec, MinMax, Owned, ParsedCodec, Sink, TextOptions};
use crate::compress::{self, CompressSink, Compressor};
use crate::error::{Error, Result};
use crate::hashfilter::{HashFilter, Slicer};
use crate::BUFFER_SIZE;

/// One write operation's observable result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The record was accepted (and, for `write`, emitted).
    Written,
    /// The record belongs to another slice and was skipped.
    Skipped,
}

impl Outcome {
    pub fn is_written(self) -> bool {
        self == Outcome::Written
    }
}

/// Mode shape: `w` or `a`, optional `b`, optional compression level
/// digit with an optional strategy suffix.
fn parse_mode(mode: &str) -> Result<(bool, Option<u32>)> {
    static MODE_RE: OnceLock<Regex> = OnceLock::new();
    let re = MODE_RE.get_or_init(|| Regex::new(r"^([wa])b?(([0-9]).?)?$").unwrap());
    let mode_or_default = if mode.is_empty() { "w" } else { mode };
    let caps = re
        .captures(mode_or_default)
        .ok_or_else(|| Error::Config(format!("Bad mode '{}'", mode)))?;
    let append = &caps[1] == "a";
    let level = caps
        .get(3)
        .map(|d| d.as_str().parse::<u32>().unwrap());
    Ok((append, level))
}

/// Construction options for a [`Writer`].
pub struct WriteOptions<C: Codec> {
    compression: Option<String>,
    mode: String,
    hashfilter: Option<HashFilter>,
    none_support: bool,
    error_extra: String,
    default: Option<Option<Owned<C>>>,
    text: TextOptions,
}

impl<C: Codec> Default for WriteOptions<C> {
    fn default() -> Self {
        WriteOptions {
            compression: None,
            mode: String::new(),
            hashfilter: None,
            none_support: false,
            error_extra: String::new(),
            default: None,
            text: TextOptions::default(),
        }
    }
}

impl<C: Codec> WriteOptions<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compression registry name. Defaults to `gzip`.
    pub fn compression(mut self, name: &str) -> Self {
        self.compression = Some(name.to_owned());
        self
    }

    /// Mode string: `w` truncates, `a` appends; an optional digit picks
    /// the compression level.
    pub fn mode(mut self, mode: &str) -> Self {
        self.mode = mode.to_owned();
        self
    }

    /// Keep only the records of one slice.
    pub fn hashfilter(mut self, filter: impl Into<HashFilter>) -> Self {
        self.hashfilter = Some(filter.into());
        self
    }

    /// Admit None values. Refused by the unsigned types.
    pub fn none_support(mut self, yes: bool) -> Self {
        self.none_support = yes;
        self
    }

    /// Free-form context appended to error messages (typically the
    /// column name).
    pub fn error_extra(mut self, extra: &str) -> Self {
        self.error_extra = extra.to_owned();
        self
    }

    /// Fallback value substituted when a write fails to encode.
    pub fn default_value(mut self, value: Owned<C>) -> Self {
        self.default = Some(Some(value));
        self
    }

    /// Use None as the fallback value (requires `none_support`).
    pub fn default_none(mut self) -> Self {
        self.default = Some(None);
        self
    }

    /// Unicode line writers: start the file with a UTF-8 byte order
    /// mark.
    pub fn write_bom(mut self, yes: bool) -> Self {
        self.text.write_bom = yes;
        self
    }
}

/// The raw buffered output under a writer. The file is not created
/// until the first buffer flush, so a writer that never accepts a
/// record leaves no file behind.
struct RawSink {
    name: PathBuf,
    append: bool,
    level: Option<u32>,
    compressor: &'static dyn Compressor,
    ctx: Option<Box<dyn CompressSink>>,
    closed: bool,
    buf: Box<[u8]>,
    len: usize,
}

impl RawSink {
    fn ensure_open(&mut self) -> Result<()> {
        if self.ctx.is_some() {
            return Ok(());
        }
        if self.closed {
            return Err(Error::Closed);
        }
        let file = if self.append {
            OpenOptions::new()
                .append(true)
                .create(true)
                .open(&self.name)
        } else {
            File::create(&self.name)
        }
        .map_err(|e| Error::io(&self.name, e))?;
        let ctx = self
            .compressor
            .write_open(file, self.level)
            .map_err(|e| Error::io(&self.name, e))?;
        self.ctx = Some(ctx);
        Ok(())
    }

    fn flush_buf(&mut self) -> Result<()> {
        if self.len == 0 {
            return Ok(());
        }
        self.ensure_open()?;
        let len = self.len;
        self.len = 0;
        self.ctx
            .as_mut()
            .unwrap()
            .write_all(&self.buf[..len])
            .map_err(|e| Error::io(&self.name, e))
    }
}

impl Sink for RawSink {
    fn put(&mut self, data: &[u8]) -> Result<()> {
        if data.len() + self.len > BUFFER_SIZE {
            self.flush_buf()?;
        }
        if data.len() > BUFFER_SIZE {
            // Oversized payloads bypass the buffer entirely.
            self.ensure_open()?;
            return self
                .ctx
                .as_mut()
                .unwrap()
                .write_all(data)
                .map_err(|e| Error::io(&self.name, e));
        }
        self.buf[self.len..self.len + data.len()].copy_from_slice(data);
        self.len += data.len();
        Ok(())
    }
}

/// A streaming writer for one column file, parameterized by its logical
/// type. See the `WriteX` aliases for the concrete types.
pub struct Writer<C: Codec> {
    raw: RawSink,
    codec: C,
    slicer: Slicer,
    none_support: bool,
    error_extra: String,
    default: Option<Option<Owned<C>>>,
    minmax: MinMax<Owned<C>>,
    compression_name: &'static str,
    count: u64,
}

impl<C: Codec> Writer<C> {
    /// Create a writer for `name`. The file itself is not created until
    /// the first flush.
    pub fn create(name: impl AsRef<Path>, opts: WriteOptions<C>) -> Result<Self> {
        let name = name.as_ref().to_path_buf();
        let codec = C::writer_codec(&opts.text)?;
        let (append, level) = parse_mode(&opts.mode)?;
        let compression = opts.compression.as_deref().unwrap_or("gzip");
        let compressor = compress::lookup(compression)
            .ok_or_else(|| Error::Config(format!("Unknown compression '{}'", compression)))?;
        if opts.none_support && !C::OPTIONAL {
            return Err(Error::Config(format!(
                "{} objects don't support None values{}",
                C::NAME,
                opts.error_extra
            )));
        }
        let slicer = Slicer::new(opts.hashfilter)?;
        if let Some(ref default) = opts.default {
            if !C::SUPPORTS_DEFAULT {
                return Err(Error::Config(format!(
                    "{} writers don't take a default value{}",
                    C::NAME,
                    opts.error_extra
                )));
            }
            match default {
                None => {
                    if !opts.none_support {
                        return Err(Error::Config(format!(
                            "Default value None requires none_support{}",
                            opts.error_extra
                        )));
                    }
                }
                Some(d) => {
                    // Validate once so a bad default fails here, not on
                    // the write that first needs it.
                    codec.check((*d).borrow(), &opts.error_extra, 0)?;
                }
            }
        }

        let mut raw = RawSink {
            name,
            append,
            level,
            compressor,
            ctx: None,
            closed: false,
            buf: vec![0u8; BUFFER_SIZE].into_boxed_slice(),
            len: 0,
        };
        let prelude = codec.prelude();
        if !prelude.is_empty() {
            raw.buf[..prelude.len()].copy_from_slice(prelude);
            raw.len = prelude.len();
        }

        Ok(Writer {
            raw,
            codec,
            slicer,
            none_support: opts.none_support,
            error_extra: opts.error_extra,
            default: opts.default,
            minmax: MinMax::default(),
            compression_name: compressor.name(),
            count: 0,
        })
    }

    /// The canonical hash a writer of this type uses to slice `v`.
    pub fn hash(v: Option<&C::Value>) -> u64 {
        match v {
            None => 0,
            Some(v) => C::hash(v),
        }
    }

    fn write_none(&mut self, actually_write: bool) -> Result<Outcome> {
        if !self.none_support {
            return Err(Error::Config(format!(
                "Refusing to write None value without none_support=True{}",
                self.error_extra
            )));
        }
        if !self.slicer.keeps_none(actually_write) {
            return Ok(Outcome::Skipped);
        }
        if !actually_write {
            return Ok(Outcome::Written);
        }
        let codec = self.codec;
        codec.encode_none(&mut self.raw)?;
        self.count += 1;
        Ok(Outcome::Written)
    }

    fn commit(&mut self, v: &C::Value, actually_write: bool) -> Result<Outcome> {
        if !self.slicer.keeps(C::hash(v)) {
            return Ok(Outcome::Skipped);
        }
        if !actually_write {
            return Ok(Outcome::Written);
        }
        C::update_minmax(&mut self.minmax, v);
        let codec = self.codec;
        codec.encode(v, &mut self.raw)?;
        self.count += 1;
        Ok(Outcome::Written)
    }

    /// Flush buffered bytes to the compressor, creating the file if it
    /// does not exist yet.
    pub fn flush(&mut self) -> Result<()> {
        self.raw.ensure_open()?;
        self.raw.flush_buf()
    }

    /// Flush and close. Closing twice reports [`Error::Closed`]; a
    /// writer that accepted no bytes still creates no file.
    pub fn close(&mut self) -> Result<()> {
        if self.raw.closed {
            return Err(Error::Closed);
        }
        self.raw.flush_buf()?;
        if let Some(mut ctx) = self.raw.ctx.take() {
            ctx.finish().map_err(|e| Error::io(&self.raw.name, e))?;
        }
        self.raw.closed = true;
        Ok(())
    }

    /// The output path.
    pub fn name(&self) -> &Path {
        &self.raw.name
    }

    /// Number of records actually emitted, including Nones.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// The configured hashfilter, if any.
    pub fn hashfilter(&self) -> Option<HashFilter> {
        self.slicer.filter()
    }

    /// Smallest non-None value written so far.
    pub fn min(&self) -> Option<&Owned<C>> {
        self.minmax.min.as_ref()
    }

    /// Largest non-None value written so far.
    pub fn max(&self) -> Option<&Owned<C>> {
        self.minmax.max.as_ref()
    }

    /// The configured default, if any (`Some(None)` is a None default).
    pub fn default(&self) -> Option<Option<&Owned<C>>> {
        self.default.as_ref().map(|d| d.as_ref())
    }

    /// The compression registry name in use.
    pub fn compression(&self) -> &'static str {
        self.compression_name
    }
}

impl<C: Codec> Writer<C>
where
    Owned<C>: Clone,
{
    /// Write one value; `None` writes the type's None record. Returns
    /// [`Outcome::Skipped`] when the value belongs to another slice.
    pub fn write(&mut self, v: Option<&C::Value>) -> Result<Outcome> {
        self.write_inner(v, true)
    }

    /// Slice check only: like [`write`][Writer::write] but never emits
    /// bytes, never advances `count` or min/max. Requires a hashfilter.
    pub fn hashcheck(&mut self, v: Option<&C::Value>) -> Result<Outcome> {
        if !self.slicer.is_active() {
            return Err(Error::Config(format!(
                "No hashfilter set{}",
                self.error_extra
            )));
        }
        self.write_inner(v, false)
    }

    fn write_inner(&mut self, v: Option<&C::Value>, actually_write: bool) -> Result<Outcome> {
        if self.raw.closed {
            return Err(Error::Closed);
        }
        let Some(v) = v else {
            return self.write_none(actually_write);
        };
        let codec = self.codec;
        let line = self.count + 1;
        if let Err(err) = codec.check(v, &self.error_extra, line) {
            // A failed value is replaced by the default, exactly once.
            return match self.default.clone() {
                Some(Some(d)) => self.commit(d.borrow(), actually_write),
                Some(None) => self.write_none(actually_write),
                None => Err(err),
            };
        }
        self.commit(v, actually_write)
    }
}

impl<C: ParsedCodec> Writer<C>
where
    Owned<C>: Clone,
{
    /// Write a value parsed from text: integer conversion first, then
    /// float, then the configured default.
    pub fn write_parsed(&mut self, s: &str) -> Result<Outcome> {
        self.parsed_inner(s, true)
    }

    /// [`hashcheck`][Writer::hashcheck] over a parsed value.
    pub fn hashcheck_parsed(&mut self, s: &str) -> Result<Outcome> {
        if !self.slicer.is_active() {
            return Err(Error::Config(format!(
                "No hashfilter set{}",
                self.error_extra
            )));
        }
        self.parsed_inner(s, false)
    }

    fn parsed_inner(&mut self, s: &str, actually_write: bool) -> Result<Outcome> {
        if self.raw.closed {
            return Err(Error::Closed);
        }
        match C::parse(s) {
            Some(v) => self.write_inner(Some(v.borrow()), actually_write),
            None => match self.default.clone() {
                Some(Some(d)) => self.write_inner(Some(d.borrow()), actually_write),
                Some(None) => self.write_none(actually_write),
                None => Err(Error::Type(format!(
                    "Cannot parse {:?} as {}{} (line {})",
                    s,
                    C::NAME,
                    self.error_extra,
                    self.count + 1
                ))),
            },
        }
    }
}

impl<C: Codec> Drop for Writer<C> {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

pub type WriteBytes = Writer<codec::Bytes>;
pub type WriteAscii = Writer<codec::Ascii>;
pub type WriteUnicode = Writer<codec::Unicode>;
pub type WriteNumber = Writer<codec::Number>;
pub type WriteInt64 = Writer<codec::Int64>;
pub type WriteInt32 = Writer<codec::Int32>;
pub type WriteBits64 = Writer<codec::Bits64>;
pub type WriteBits32 = Writer<codec::Bits32>;
pub type WriteBool = Writer<codec::Bool>;
pub type WriteFloat64 = Writer<codec::Float64>;
pub type WriteFloat32 = Writer<codec::Float32>;
pub type WriteComplex64 = Writer<codec::Complex64>;
pub type WriteComplex32 = Writer<codec::Complex32>;
pub type WriteDateTime = Writer<codec::DateTime>;
pub type WriteDate = Writer<codec::Date>;
pub type WriteTime = Writer<codec::Time>;
pub type WriteBytesLines = Writer<codec::BytesLines>;
pub type WriteAsciiLines = Writer<codec::AsciiLines>;
pub type WriteUnicodeLines = Writer<codec::UnicodeLines>;
