//! Per-type codecs: the encode/decode/hash/min-max behavior that
//! distinguishes one logical column type from another. The read and
//! write engines are generic over [`Codec`]; each marker type here wires
//! one logical type into them.

use std::borrow::Borrow;

use crate::error::Result;

mod blob;
mod datetime;
mod fixed;
mod lines;
mod number;

pub use blob::{Ascii, Bytes, Unicode};
pub(crate) use fixed::{NONEVAL_F32, NONEVAL_F64};
pub use datetime::{Date, DateTime, Time};
pub use fixed::{Bits32, Bits64, Bool, Complex32, Complex64, Float32, Float64, Int32, Int64};
pub use lines::{AsciiLines, BytesLines, LineEncoding, LineErrors, UnicodeLines};
pub use number::Number;

/// The owned form of a codec's value.
pub type Owned<C> = <<C as Codec>::Value as ToOwned>::Owned;

/// Byte supply for decoders, backed by the read engine's buffer. All
/// methods refill from the compressor as needed; running out of stream
/// mid-record is a format error. Implemented by the read engine; not
/// meant to be implemented outside the crate.
pub trait Source {
    /// The next `n` bytes, contiguous, advancing the cursor. `n` must
    /// not exceed the engine buffer size.
    fn take(&mut self, n: usize) -> Result<&[u8]>;
    /// The next byte.
    fn take_u8(&mut self) -> Result<u8>;
    /// A payload too large for the engine buffer, read to the heap.
    fn take_large(&mut self, n: usize) -> Result<Vec<u8>>;
    /// Bytes up to the next newline (consumed, not included), spanning
    /// any number of refills. End of stream ends the final line.
    fn take_line(&mut self) -> Result<Vec<u8>>;
}

/// Byte sink for encoders, backed by the write engine's buffer.
pub trait Sink {
    fn put(&mut self, data: &[u8]) -> Result<()>;
}

/// Min/max observation state, tracked per writer over accepted values.
#[derive(Clone, Debug)]
pub struct MinMax<T> {
    pub(crate) min: Option<T>,
    pub(crate) max: Option<T>,
}

impl<T> Default for MinMax<T> {
    fn default() -> Self {
        MinMax {
            min: None,
            max: None,
        }
    }
}

/// Text-handling construction options consumed by the line codecs.
#[derive(Clone, Debug, Default)]
pub struct TextOptions {
    pub(crate) strip_bom: bool,
    pub(crate) encoding: Option<String>,
    pub(crate) errors: Option<String>,
    pub(crate) write_bom: bool,
}

/// One logical column type.
///
/// `Value` is the borrowed form writers accept (`[u8]`, `str`, `i64`,
/// ...); readers return its `ToOwned` counterpart. Implementations are
/// tiny `Copy` markers so the engines can hold them by value; the line
/// codecs carry their decode configuration.
pub trait Codec: Copy + Default {
    /// Borrowed value form accepted by writers.
    type Value: ToOwned + ?Sized;

    /// Type name used in error messages.
    const NAME: &'static str;
    /// Likely encoded item size; bounds read-ahead near the end of a
    /// counted stream. Exact for fixed-width types.
    const LIKELY_SIZE: usize;
    /// Whether the encoding reserves a None sentinel.
    const OPTIONAL: bool;
    /// Whether a construction-time default value is accepted.
    const SUPPORTS_DEFAULT: bool = false;

    /// Build the codec for a reader. Only the line codecs look at the
    /// text options; everything else refuses them.
    fn reader_codec(text: &TextOptions) -> Result<Self> {
        if text.strip_bom || text.encoding.is_some() || text.errors.is_some() {
            return Err(crate::error::Error::Config(format!(
                "{} readers don't take text options",
                Self::NAME
            )));
        }
        Ok(Self::default())
    }

    /// Build the codec for a writer. Only the unicode line codec takes
    /// `write_bom`.
    fn writer_codec(text: &TextOptions) -> Result<Self> {
        if text.write_bom {
            return Err(crate::error::Error::Config(format!(
                "{} writers don't take write_bom",
                Self::NAME
            )));
        }
        Ok(Self::default())
    }

    /// Bytes the writer emits before any record (the unicode-line BOM).
    fn prelude(&self) -> &'static [u8] {
        b""
    }

    /// Whether the reader should prime its buffer at construction (the
    /// line codecs do, to strip a leading BOM).
    fn strip_bom(&self) -> bool {
        false
    }

    /// Decode one record. `Ok(None)` is a None record; end-of-stream is
    /// detected by the engine before this is called.
    fn decode(&self, src: &mut dyn Source) -> Result<Option<Owned<Self>>>;

    /// Validate `v` for encoding: sentinel collisions, out-of-range
    /// values, character restrictions. Runs before hashing so a failed
    /// value can be replaced by the writer's default regardless of
    /// slicing. `extra` and `line` localize the error.
    fn check(&self, v: &Self::Value, extra: &str, line: u64) -> Result<()> {
        let _ = (v, extra, line);
        Ok(())
    }

    /// Canonical slicing hash of a value that passed [`Codec::check`].
    fn hash(v: &Self::Value) -> u64;

    /// Append the encoding of a checked value.
    fn encode(&self, v: &Self::Value, out: &mut dyn Sink) -> Result<()>;

    /// Append the None encoding.
    fn encode_none(&self, out: &mut dyn Sink) -> Result<()> {
        let _ = out;
        Err(crate::error::Error::Type(format!(
            "{} objects don't support None values",
            Self::NAME
        )))
    }

    /// Fold an accepted value into the min/max state. Types without
    /// min/max tracking (blobs, complex) leave this a no-op.
    fn update_minmax(mm: &mut MinMax<Owned<Self>>, v: &Self::Value) {
        let _ = (mm, v);
    }
}

/// Min/max by `Ord` on the owned value, for the plain integer-like
/// types.
pub(crate) fn minmax_by_ord<T>(mm: &mut MinMax<T>, v: T)
where
    T: Ord + Clone,
{
    match mm.min {
        Some(ref m) if *m <= v => {}
        _ => mm.min = Some(v.clone()),
    }
    match mm.max {
        Some(ref m) if *m >= v => {}
        _ => mm.max = Some(v),
    }
}

/// Min/max by a comparison key, storing the value whose key won.
pub(crate) fn minmax_by_key<T, K>(mm: &mut MinMax<T>, v: T, key: impl Fn(&T) -> K)
where
    T: Clone,
    K: Ord,
{
    match mm.min {
        Some(ref m) if key(m) <= key(&v) => {}
        _ => mm.min = Some(v.clone()),
    }
    match mm.max {
        Some(ref m) if key(m) >= key(&v) => {}
        _ => mm.max = Some(v),
    }
}

/// The canonical hash of an owned value, routed through the borrowed
/// form.
pub(crate) fn hash_owned<C: Codec>(v: &Owned<C>) -> u64 {
    C::hash((*v).borrow())
}

/// ` (line N)` for error messages; empty for line 0 (construction-time
/// validation, where no record index exists).
pub(crate) fn line_suffix(line: u64) -> String {
    if line == 0 {
        String::new()
    } else {
        format!(" (line {})", line)
    }
}

/// Numeric codecs whose writers also accept values parsed from text.
pub trait ParsedCodec: Codec {
    /// Parse `s` into a value, integer interpretation first, then
    /// float. `None` lets the writer's default apply.
    fn parse(s: &str) -> Option<Owned<Self>>;
}
