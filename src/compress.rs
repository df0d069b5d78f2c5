//! The compressor abstraction: a small interface over streaming
//! compression, with implementations looked up by name. The library
//! ships exactly one implementation, `gzip`, which is the on-disk
//! compatibility format; the registry shape leaves room for others.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

/// How the underlying file read failed to open as a compressed stream.
#[derive(Debug)]
pub(crate) enum OpenError {
    /// The file itself failed.
    Io(io::Error),
    /// The stream is readable but is not this compression.
    NotRecognized(&'static str),
}

impl From<io::Error> for OpenError {
    fn from(e: io::Error) -> Self {
        OpenError::Io(e)
    }
}

/// The write half of a compressor. Closing must flush everything down to
/// the file; a partial write is an error.
pub(crate) trait CompressSink: Write + Send {
    /// Flush all pending compressed data and write the stream trailer.
    fn finish(&mut self) -> io::Result<()>;
}

/// A named streaming compressor.
///
/// `read_open` takes ownership of the file and must fail with
/// [`OpenError::NotRecognized`] when the stream is not in this
/// compression's format. `size_hint` is the caller's estimate of the
/// decompressed byte count (negative when unknown) and may be used to
/// tune buffering.
pub(crate) trait Compressor: Sync {
    fn name(&self) -> &'static str;
    fn read_open(&self, file: File, size_hint: i64) -> Result<Box<dyn Read + Send>, OpenError>;
    fn write_open(&self, file: File, level: Option<u32>) -> io::Result<Box<dyn CompressSink>>;
}

/// Look up a compressor by registry name.
pub(crate) fn lookup(name: &str) -> Option<&'static dyn Compressor> {
    COMPRESSORS
        .iter()
        .copied()
        .find(|c| c.name() == name)
}

static COMPRESSORS: &[&dyn Compressor] = &[&Gzip];

/// The gzip compressor. Append-mode writers produce a second gzip member
/// in the same file, so the read half decodes concatenated members.
struct Gzip;

impl Compressor for Gzip {
    fn name(&self) -> &'static str {
        "gzip"
    }

    fn read_open(&self, file: File, size_hint: i64) -> Result<Box<dyn Read + Send>, OpenError> {
        let buf_size = if (0..400_000).contains(&size_hint) {
            16 * 1024
        } else {
            64 * 1024
        };
        let mut reader = BufReader::with_capacity(buf_size, file);
        let head = reader.fill_buf()?;
        if head.len() < 2 || head[0] != 0x1f || head[1] != 0x8b {
            return Err(OpenError::NotRecognized("not gzip compressed"));
        }
        Ok(Box::new(MultiGzDecoder::new(reader)))
    }

    fn write_open(&self, file: File, level: Option<u32>) -> io::Result<Box<dyn CompressSink>> {
        let level = match level {
            Some(n) => Compression::new(n),
            None => Compression::default(),
        };
        Ok(Box::new(GzEncoder::new(file, level)))
    }
}

impl CompressSink for GzEncoder<File> {
    fn finish(&mut self) -> io::Result<()> {
        self.try_finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Seek;

    #[test]
    fn registry_knows_gzip_only() {
        assert!(lookup("gzip").is_some());
        assert!(lookup("zstd").is_none());
        assert!(lookup("").is_none());
    }

    #[test]
    fn round_trip_and_magic_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.gz");

        let gz = lookup("gzip").unwrap();
        let mut sink = gz.write_open(File::create(&path).unwrap(), Some(9)).unwrap();
        sink.write_all(b"hello columnar world").unwrap();
        sink.finish().unwrap();

        let mut out = Vec::new();
        gz.read_open(File::open(&path).unwrap(), -1)
            .unwrap()
            .read_to_end(&mut out)
            .unwrap();
        assert_eq!(out, b"hello columnar world");

        // A plain-text file must be rejected at open.
        let plain = dir.path().join("t.txt");
        std::fs::write(&plain, b"just text, no framing").unwrap();
        match gz.read_open(File::open(&plain).unwrap(), -1) {
            Err(OpenError::NotRecognized(_)) => (),
            _ => panic!("plain text accepted as gzip"),
        }
    }

    #[test]
    fn concatenated_members_decode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.gz");
        let gz = lookup("gzip").unwrap();

        let mut sink = gz.write_open(File::create(&path).unwrap(), None).unwrap();
        sink.write_all(b"first ").unwrap();
        sink.finish().unwrap();
        drop(sink);

        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        file.seek(io::SeekFrom::End(0)).unwrap();
        let mut sink = gz.write_open(file, None).unwrap();
        sink.write_all(b"second").unwrap();
        sink.finish().unwrap();

        let mut out = Vec::new();
        gz.read_open(File::open(&path).unwrap(), -1)
            .unwrap()
            .read_to_end(&mut out)
            .unwrap();
        assert_eq!(out, b"first second");
    }
}
