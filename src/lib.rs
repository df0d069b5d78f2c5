//! colpack is a typed columnar codec: sequences of homogeneously-typed
//! values serialized into compressed binary files, one file per column,
//! with hash-based slice partitioning for a data-processing framework
//! that shards work across `slices` partitions.
//!
//! Each logical type gets one streaming reader and one streaming writer
//! (`ReadInt64`/`WriteInt64`, `ReadBytes`/`WriteBytes`, ...). A file is
//! just the concatenation of encoded records behind a gzip stream — no
//! header, no footer, no type tag; the type is carried by the consumer's
//! choice of reader.
//!
//! Partitioning uses a fixed-key SipHash-2-4 over canonicalized values:
//! a record belongs to slice `hash(value) % slices`, writers configured
//! with a hashfilter keep only their own slice, and readers can filter
//! the same way on the way back in.
//!
//! ```
//! use colpack::{ReadInt64, ReadOptions, Record, WriteInt64, WriteOptions};
//!
//! # fn main() -> colpack::Result<()> {
//! let dir = tempfile::tempdir().unwrap();
//! let path = dir.path().join("num");
//!
//! let mut w = WriteInt64::create(&path, WriteOptions::default().none_support(true))?;
//! w.write(Some(&1))?;
//! w.write(None)?;
//! w.close()?;
//!
//! let mut r = ReadInt64::open(&path, ReadOptions::new().want_count(2))?;
//! assert_eq!(r.pull()?, Record::Value(Some(1)));
//! assert_eq!(r.pull()?, Record::Value(None));
//! assert_eq!(r.pull()?, Record::End);
//! # Ok(()) }
//! ```

mod compress;
mod datetime;
mod error;
mod hash;
mod hashfilter;
mod number;
mod read;
mod value;
mod write;

pub mod codec;

/// Engine buffer size; a multiple of the largest fixed-width item.
pub(crate) const BUFFER_SIZE: usize = 128 * 1024;

pub use num_bigint::BigInt;
pub use num_complex::{Complex32, Complex64};

pub use self::datetime::{Date, DateTime, Time};
pub use self::error::{Error, Result};
pub use self::hash::{siphash24, siphash24_keyed, DEFAULT_HASH_KEY};
pub use self::hashfilter::HashFilter;
pub use self::number::Number;
pub use self::value::{hash, Value};

pub use self::read::{
    Progress, ReadAscii, ReadAsciiLines, ReadBits32, ReadBits64, ReadBool, ReadBytes,
    ReadBytesLines, ReadComplex32, ReadComplex64, ReadDate, ReadDateTime, ReadFloat32,
    ReadFloat64, ReadInt32, ReadInt64, ReadNumber, ReadOptions, ReadTime, ReadUnicode,
    ReadUnicodeLines, Reader, Record,
};
pub use self::write::{
    Outcome, WriteAscii, WriteAsciiLines, WriteBits32, WriteBits64, WriteBool, WriteBytes,
    WriteBytesLines, WriteComplex32, WriteComplex64, WriteDate, WriteDateTime, WriteFloat32,
    WriteFloat64, WriteInt32, WriteInt64, WriteNumber, WriteOptions, WriteTime, WriteUnicode,
    WriteUnicodeLines, Writer,
};
