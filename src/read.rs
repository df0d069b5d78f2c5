//! The streaming read engine: fixed-size buffered decompression with
//! lookahead for variable-length records, expected-count awareness,
//! progress callbacks, and slice filtering.

use std::fs::File;
use std::io::{ErrorKind, Read as IoRead, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::codec::{self, hash_owned, Codec, Owned, Source, TextOptions};
use crate::compress::{self, OpenError};
use crate::error::{Error, Result};
use crate::hashfilter::{HashFilter, Slicer};
use crate::BUFFER_SIZE;

const BOM: &[u8] = b"\xef\xbb\xbf";

fn format_err() -> Error {
    Error::Format("File format error".into())
}

/// Progress callback verdict: keep going, or end the read cleanly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Progress {
    Continue,
    /// The canonical stop signal: the reader reports end-of-stream with
    /// no error.
    Stop,
}

/// One pull from a reader.
#[derive(Clone, Debug, PartialEq)]
pub enum Record<V> {
    /// A record belonging to this slice (or any record when no
    /// hashfilter is set). `None` is a stored None value.
    Value(Option<V>),
    /// A record belonging to another slice.
    Filtered,
    /// No more records.
    End,
}

type Callback = Box<dyn FnMut(i64) -> Result<Progress> + Send>;

/// Construction options for a [`Reader`].
#[derive(Default)]
pub struct ReadOptions {
    compression: Option<String>,
    fd: Option<File>,
    seek: u64,
    want_count: Option<i64>,
    hashfilter: Option<HashFilter>,
    callback: Option<Callback>,
    callback_interval: i64,
    callback_offset: i64,
    text: TextOptions,
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compression registry name. Defaults to `gzip`.
    pub fn compression(mut self, name: &str) -> Self {
        self.compression = Some(name.to_owned());
        self
    }

    /// Read from an already-open file; the path then only labels
    /// errors.
    pub fn fd(mut self, file: File) -> Self {
        self.fd = Some(file);
        self
    }

    /// Byte offset to seek to before handing the file to the
    /// compressor.
    pub fn seek(mut self, offset: u64) -> Self {
        self.seek = offset;
        self
    }

    /// Expected record count; reading past it stops, falling short of
    /// it is an error. −1 means unknown.
    pub fn want_count(mut self, count: i64) -> Self {
        self.want_count = Some(count);
        self
    }

    /// Keep only the records of one slice.
    pub fn hashfilter(mut self, filter: impl Into<HashFilter>) -> Self {
        self.hashfilter = Some(filter.into());
        self
    }

    /// Progress callback, invoked with `count + callback_offset` every
    /// `callback_interval` records.
    pub fn callback(mut self, cb: impl FnMut(i64) -> Result<Progress> + Send + 'static) -> Self {
        self.callback = Some(Box::new(cb));
        self
    }

    pub fn callback_interval(mut self, interval: i64) -> Self {
        self.callback_interval = interval;
        self
    }

    pub fn callback_offset(mut self, offset: i64) -> Self {
        self.callback_offset = offset;
        self
    }

    /// Line readers: skip a leading UTF-8 byte order mark.
    pub fn strip_bom(mut self, strip: bool) -> Self {
        self.text.strip_bom = strip;
        self
    }

    /// Unicode line readers: text encoding (`utf-8`, `latin-1`,
    /// `ascii`).
    pub fn encoding(mut self, name: &str) -> Self {
        self.text.encoding = Some(name.to_owned());
        self
    }

    /// Unicode line readers: undecodable-byte policy (`strict`,
    /// `replace`, `ignore`).
    pub fn errors(mut self, name: &str) -> Self {
        self.text.errors = Some(name.to_owned());
        self
    }
}

/// The raw buffered stream under a reader: a compressor context and a
/// fixed buffer with a cursor.
struct RawStream {
    name: PathBuf,
    ctx: Option<Box<dyn IoRead + Send>>,
    buf: Box<[u8]>,
    pos: usize,
    len: usize,
    error: bool,
    want_count: i64,
    count: i64,
    likely_size: usize,
}

impl RawStream {
    /// Pull up to `want` bytes into `buf[offset..]`, looping over short
    /// reads. Returns the byte count, 0 at end of stream.
    fn read_stream(&mut self, offset: usize, want: usize) -> Result<usize> {
        let ctx = self.ctx.as_mut().ok_or(Error::Closed)?;
        let mut got = 0;
        while got < want {
            match ctx.read(&mut self.buf[offset + got..offset + want]) {
                Ok(0) => break,
                Ok(n) => got += n,
                Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.error = true;
                    if matches!(e.kind(), ErrorKind::InvalidData | ErrorKind::UnexpectedEof) {
                        return Err(format_err());
                    }
                    return Err(Error::io(&self.name, e));
                }
            }
        }
        Ok(got)
    }

    /// Replace the buffer contents from the stream. `Ok(false)` is a
    /// clean end of stream; ending short of `want_count` is an error.
    fn refill(&mut self) -> Result<bool> {
        if self.error {
            return Err(format_err());
        }
        let mut want = BUFFER_SIZE;
        if self.want_count >= 0 {
            // Request only enough for the remaining wanted records, to
            // avoid reading past the last one.
            let left = (self.want_count - self.count).max(0) as usize;
            let candidate = left
                .saturating_mul(self.likely_size)
                .saturating_add(self.likely_size);
            want = want.min(candidate);
        }
        self.pos = 0;
        self.len = self.read_stream(0, want)?;
        if self.len == 0 {
            if self.want_count >= 0 && self.want_count != self.count {
                self.error = true;
                return Err(Error::Format(format!(
                    "\"{}\" ended after {} items, expected {}",
                    self.name.display(),
                    self.count,
                    self.want_count
                )));
            }
            return Ok(false);
        }
        Ok(true)
    }
}

impl Source for RawStream {
    fn take(&mut self, n: usize) -> Result<&[u8]> {
        debug_assert!(n <= BUFFER_SIZE);
        if self.pos + n > self.len {
            // Compact the partial record to the buffer start and pull
            // the rest of it from the stream.
            self.buf.copy_within(self.pos..self.len, 0);
            self.len -= self.pos;
            self.pos = 0;
            while self.len < n {
                let got = self.read_stream(self.len, BUFFER_SIZE - self.len)?;
                if got == 0 {
                    self.error = true;
                    return Err(format_err());
                }
                self.len += got;
            }
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn take_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn take_large(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(n);
        out.extend_from_slice(&self.buf[self.pos..self.len]);
        self.pos = self.len;
        let ctx = self.ctx.as_mut().ok_or(Error::Closed)?;
        let mut chunk = [0u8; 8192];
        while out.len() < n {
            let want = (n - out.len()).min(chunk.len());
            match ctx.read(&mut chunk[..want]) {
                Ok(0) => {
                    self.error = true;
                    return Err(format_err());
                }
                Ok(m) => out.extend_from_slice(&chunk[..m]),
                Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.error = true;
                    if matches!(e.kind(), ErrorKind::InvalidData | ErrorKind::UnexpectedEof) {
                        return Err(format_err());
                    }
                    return Err(Error::io(&self.name, e));
                }
            }
        }
        Ok(out)
    }

    fn take_line(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        loop {
            match self.buf[self.pos..self.len].iter().position(|&b| b == b'\n') {
                Some(i) => {
                    out.extend_from_slice(&self.buf[self.pos..self.pos + i]);
                    self.pos += i + 1;
                    return Ok(out);
                }
                None => {
                    out.extend_from_slice(&self.buf[self.pos..self.len]);
                    self.pos = self.len;
                    if !self.refill()? {
                        // End of stream ends the final line.
                        return Ok(out);
                    }
                }
            }
        }
    }
}

/// A streaming reader for one column file, parameterized by its logical
/// type. See the `ReadX` aliases for the concrete types.
pub struct Reader<C: Codec> {
    raw: RawStream,
    codec: C,
    slicer: Slicer,
    break_count: i64,
    callback: Option<Callback>,
    callback_interval: i64,
    callback_offset: i64,
    bom_pending: bool,
}

impl<C: Codec> Reader<C> {
    /// Open `name` for reading. The file (or the `fd` option's file) is
    /// owned by the reader until [`close`][Reader::close] or drop.
    pub fn open(name: impl AsRef<Path>, opts: ReadOptions) -> Result<Self> {
        let name = name.as_ref().to_path_buf();
        let codec = C::reader_codec(&opts.text)?;
        let slicer = Slicer::new(opts.hashfilter)?;
        let want_count = opts.want_count.unwrap_or(-1);
        if opts.callback.is_some() && opts.callback_interval <= 0 {
            return Err(Error::Config("callback interval must be > 0".into()));
        }
        let compression = opts.compression.as_deref().unwrap_or("gzip");
        let compressor = compress::lookup(compression)
            .ok_or_else(|| Error::Config(format!("Unknown compression '{}'", compression)))?;

        let mut file = match opts.fd {
            Some(f) => f,
            None => File::open(&name).map_err(|e| Error::io(&name, e))?,
        };
        if opts.seek != 0 {
            file.seek(SeekFrom::Start(opts.seek))
                .map_err(|e| Error::io(&name, e))?;
        }
        let ctx = match compressor.read_open(file, want_count.saturating_mul(4)) {
            Ok(ctx) => ctx,
            Err(OpenError::Io(e)) => return Err(Error::io(&name, e)),
            Err(OpenError::NotRecognized(msg)) => {
                return Err(Error::CompressionInit {
                    path: name,
                    msg: msg.into(),
                })
            }
        };

        let mut break_count = -1;
        if want_count >= 0 {
            break_count = want_count;
        }
        if opts.callback.is_some() && (opts.callback_interval < break_count || break_count < 0) {
            break_count = opts.callback_interval;
        }

        Ok(Reader {
            raw: RawStream {
                name,
                ctx: Some(ctx),
                buf: vec![0u8; BUFFER_SIZE].into_boxed_slice(),
                pos: 0,
                len: 0,
                error: false,
                want_count,
                count: 0,
                likely_size: C::LIKELY_SIZE,
            },
            codec,
            slicer,
            break_count,
            callback: opts.callback,
            callback_interval: opts.callback_interval,
            callback_offset: opts.callback_offset,
            bom_pending: codec.strip_bom(),
        })
    }

    /// Pull one record.
    pub fn pull(&mut self) -> Result<Record<Owned<C>>> {
        if self.raw.ctx.is_none() {
            return Err(Error::Closed);
        }
        if self.raw.count == self.break_count {
            if self.raw.count == self.raw.want_count {
                return Ok(Record::End);
            }
            if self.do_callback()? == Progress::Stop {
                return Ok(Record::End);
            }
        }
        if self.raw.error {
            return Err(format_err());
        }
        if self.raw.pos >= self.raw.len {
            if !self.raw.refill()? {
                return Ok(Record::End);
            }
            if self.bom_pending
                && self.raw.len >= BOM.len()
                && &self.raw.buf[..BOM.len()] == BOM
            {
                self.raw.pos = BOM.len();
            }
        }
        self.bom_pending = false;
        self.raw.count += 1;

        let codec = self.codec;
        let decoded = match codec.decode(&mut self.raw) {
            Ok(d) => d,
            Err(e) => {
                if e.is_sticky() {
                    self.raw.error = true;
                }
                return Err(e);
            }
        };
        if !self.slicer.is_active() {
            return Ok(Record::Value(decoded));
        }
        match decoded {
            None => {
                if self.slicer.keeps_none(true) {
                    Ok(Record::Value(None))
                } else {
                    Ok(Record::Filtered)
                }
            }
            Some(v) => {
                if self.slicer.keeps(hash_owned::<C>(&v)) {
                    Ok(Record::Value(Some(v)))
                } else {
                    Ok(Record::Filtered)
                }
            }
        }
    }

    fn do_callback(&mut self) -> Result<Progress> {
        let Some(cb) = self.callback.as_mut() else {
            return Ok(Progress::Continue);
        };
        match cb(self.raw.count + self.callback_offset)? {
            Progress::Continue => {
                let mut bc = self.break_count + self.callback_interval;
                if self.raw.want_count > 0 && bc > self.raw.want_count {
                    bc = self.raw.want_count;
                }
                self.break_count = bc;
                Ok(Progress::Continue)
            }
            Progress::Stop => Ok(Progress::Stop),
        }
    }

    /// Release the compressor and file. Pulling afterwards, or closing
    /// twice, reports [`Error::Closed`].
    pub fn close(&mut self) -> Result<()> {
        if self.raw.ctx.take().is_none() {
            return Err(Error::Closed);
        }
        Ok(())
    }

    /// The file path (or the label given with a pre-opened file).
    pub fn name(&self) -> &Path {
        &self.raw.name
    }

    /// The configured hashfilter, if any.
    pub fn hashfilter(&self) -> Option<HashFilter> {
        self.slicer.filter()
    }
}

impl Reader<codec::UnicodeLines> {
    /// The text encoding this reader decodes with.
    pub fn encoding(&self) -> &'static str {
        self.codec.encoding.name()
    }

    /// The undecodable-byte policy.
    pub fn errors(&self) -> &'static str {
        self.codec.errors.name()
    }
}

impl<C: Codec> Iterator for Reader<C> {
    type Item = Result<Record<Owned<C>>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.pull() {
            Ok(Record::End) => None,
            other => Some(other),
        }
    }
}

pub type ReadBytes = Reader<codec::Bytes>;
pub type ReadAscii = Reader<codec::Ascii>;
pub type ReadUnicode = Reader<codec::Unicode>;
pub type ReadNumber = Reader<codec::Number>;
pub type ReadInt64 = Reader<codec::Int64>;
pub type ReadInt32 = Reader<codec::Int32>;
pub type ReadBits64 = Reader<codec::Bits64>;
pub type ReadBits32 = Reader<codec::Bits32>;
pub type ReadBool = Reader<codec::Bool>;
pub type ReadFloat64 = Reader<codec::Float64>;
pub type ReadFloat32 = Reader<codec::Float32>;
pub type ReadComplex64 = Reader<codec::Complex64>;
pub type ReadComplex32 = Reader<codec::Complex32>;
pub type ReadDateTime = Reader<codec::DateTime>;
pub type ReadDate = Reader<codec::Date>;
pub type ReadTime = Reader<codec::Time>;
pub type ReadBytesLines = Reader<codec::BytesLines>;
pub type ReadAsciiLines = Reader<codec::AsciiLines>;
pub type ReadUnicodeLines = Reader<codec::UnicodeLines>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::write::{WriteInt64, WriteOptions};
    use std::io::Write as _;
    use std::sync::{Arc, Mutex};

    fn gz_file(dir: &tempfile::TempDir, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        let mut enc = flate2::write::GzEncoder::new(
            File::create(&path).unwrap(),
            flate2::Compression::default(),
        );
        enc.write_all(content).unwrap();
        enc.finish().unwrap();
        path
    }

    fn int64_file(dir: &tempfile::TempDir, name: &str, n: i64) -> PathBuf {
        let path = dir.path().join(name);
        let mut w = WriteInt64::create(&path, WriteOptions::default()).unwrap();
        for v in 1..=n {
            w.write(Some(&v)).unwrap();
        }
        w.close().unwrap();
        path
    }

    #[test]
    fn callback_schedule() {
        let dir = tempfile::tempdir().unwrap();
        let path = int64_file(&dir, "ten", 10);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = Arc::clone(&seen);
        let mut r = ReadInt64::open(
            &path,
            ReadOptions::new()
                .want_count(10)
                .callback(move |n| {
                    seen2.lock().unwrap().push(n);
                    Ok(Progress::Continue)
                })
                .callback_interval(3)
                .callback_offset(100),
        )
        .unwrap();
        let mut pulled = 0;
        while let Record::Value(_) = r.pull().unwrap() {
            pulled += 1;
        }
        assert_eq!(pulled, 10);
        assert_eq!(*seen.lock().unwrap(), vec![103, 106, 109]);
    }

    #[test]
    fn callback_stop_ends_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let path = int64_file(&dir, "ten", 10);
        let mut r = ReadInt64::open(
            &path,
            ReadOptions::new()
                .want_count(10)
                .callback(|n| {
                    if n == 106 {
                        Ok(Progress::Stop)
                    } else {
                        Ok(Progress::Continue)
                    }
                })
                .callback_interval(3)
                .callback_offset(100),
        )
        .unwrap();
        let mut pulled = 0;
        while let Record::Value(_) = r.pull().unwrap() {
            pulled += 1;
        }
        assert_eq!(pulled, 6);
    }

    #[test]
    fn callback_failure_fails_the_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = int64_file(&dir, "ten", 10);
        let mut r = ReadInt64::open(
            &path,
            ReadOptions::new()
                .callback(|_| Err(Error::Callback("boom".into())))
                .callback_interval(2),
        )
        .unwrap();
        assert!(r.pull().is_ok());
        assert!(r.pull().is_ok());
        assert!(matches!(r.pull(), Err(Error::Callback(_))));

        // A callback without a positive interval is refused.
        assert!(matches!(
            ReadInt64::open(
                &path,
                ReadOptions::new().callback(|_| Ok(Progress::Continue))
            ),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn early_stop_and_short_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = int64_file(&dir, "five", 5);
        let mut r = ReadInt64::open(&path, ReadOptions::new().want_count(3)).unwrap();
        assert_eq!(r.pull().unwrap(), Record::Value(Some(1)));
        assert_eq!(r.pull().unwrap(), Record::Value(Some(2)));
        assert_eq!(r.pull().unwrap(), Record::Value(Some(3)));
        assert_eq!(r.pull().unwrap(), Record::End);

        let mut r = ReadInt64::open(&path, ReadOptions::new().want_count(9)).unwrap();
        for _ in 0..5 {
            r.pull().unwrap();
        }
        let err = r.pull().unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, Error::Format(_)), "{}", msg);
        assert!(msg.contains("ended after 5 items, expected 9"), "{}", msg);
        assert!(msg.contains("five"), "{}", msg);
    }

    #[test]
    fn reader_slice_filtering() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("col");
        let mut w = crate::write::WriteBytes::create(
            &path,
            WriteOptions::default().none_support(true),
        )
        .unwrap();
        let values: [&[u8]; 3] = [b"apple", b"banana", b"cherry"];
        for v in values {
            w.write(Some(v)).unwrap();
        }
        w.write(None).unwrap();
        w.close().unwrap();

        let mut kept = Vec::new();
        let mut filtered = 0;
        for sliceno in 0..2u32 {
            let mut r = ReadBytes::open(
                &path,
                ReadOptions::new().want_count(4).hashfilter((sliceno, 2)),
            )
            .unwrap();
            loop {
                match r.pull().unwrap() {
                    Record::Value(v) => kept.push((sliceno, v)),
                    Record::Filtered => filtered += 1,
                    Record::End => break,
                }
            }
        }
        // Every record is kept by exactly one of the two slices.
        assert_eq!(kept.len(), 4);
        assert_eq!(filtered, 4);
        // None belongs to slice 0 with spread off.
        assert!(kept.contains(&(0, None)));
    }

    #[test]
    fn format_errors_are_sticky() {
        let dir = tempfile::tempdir().unwrap();
        // 0x03 is not a valid Number tag.
        let path = gz_file(&dir, "bad", &[0x03, 0x00]);
        let mut r = ReadNumber::open(&path, ReadOptions::new()).unwrap();
        assert!(matches!(r.pull(), Err(Error::Format(_))));
        assert!(matches!(r.pull(), Err(Error::Format(_))));
    }

    #[test]
    fn bool_byte_strictness() {
        let dir = tempfile::tempdir().unwrap();
        let path = gz_file(&dir, "bools", &[1, 0, 255, 7]);
        let mut r = ReadBool::open(&path, ReadOptions::new()).unwrap();
        assert_eq!(r.pull().unwrap(), Record::Value(Some(true)));
        assert_eq!(r.pull().unwrap(), Record::Value(Some(false)));
        assert_eq!(r.pull().unwrap(), Record::Value(None));
        assert!(matches!(r.pull(), Err(Error::Format(_))));
    }

    #[test]
    fn float32_sentinel_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let mut content = Vec::new();
        content.extend_from_slice(&1.5f32.to_ne_bytes());
        content.extend_from_slice(&codec::NONEVAL_F32.to_ne_bytes());
        let path = gz_file(&dir, "floats", &content);
        let mut r = ReadFloat32::open(&path, ReadOptions::new()).unwrap();
        assert_eq!(r.pull().unwrap(), Record::Value(Some(1.5)));
        assert_eq!(r.pull().unwrap(), Record::Value(None));
        assert_eq!(r.pull().unwrap(), Record::End);
    }

    #[test]
    fn not_gzip_is_a_compression_init_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain");
        std::fs::write(&path, b"plain text, definitely not a gzip stream").unwrap();
        assert!(matches!(
            ReadInt64::open(&path, ReadOptions::new()),
            Err(Error::CompressionInit { .. })
        ));
        assert!(matches!(
            ReadInt64::open(&path, ReadOptions::new().compression("nope")),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn seek_and_fd_options() {
        let dir = tempfile::tempdir().unwrap();
        let inner = {
            let path = int64_file(&dir, "tmp", 2);
            std::fs::read(&path).unwrap()
        };
        let path = dir.path().join("prefixed");
        let mut content = b"0123456789".to_vec();
        content.extend_from_slice(&inner);
        std::fs::write(&path, &content).unwrap();

        let mut r =
            ReadInt64::open(&path, ReadOptions::new().seek(10).want_count(2)).unwrap();
        assert_eq!(r.pull().unwrap(), Record::Value(Some(1)));

        // A pre-opened descriptor; the name is only a label.
        let file = File::open(&path).unwrap();
        let mut r = ReadInt64::open(
            "label-only",
            ReadOptions::new().fd(file).seek(10).want_count(2),
        )
        .unwrap();
        assert_eq!(r.pull().unwrap(), Record::Value(Some(1)));
        assert_eq!(r.name(), Path::new("label-only"));
    }

    #[test]
    fn close_is_sticky() {
        let dir = tempfile::tempdir().unwrap();
        let path = int64_file(&dir, "two", 2);
        let mut r = ReadInt64::open(&path, ReadOptions::new()).unwrap();
        r.pull().unwrap();
        r.close().unwrap();
        assert!(matches!(r.pull(), Err(Error::Closed)));
        assert!(matches!(r.close(), Err(Error::Closed)));
    }

    #[test]
    fn records_cross_buffer_boundaries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blobs");
        let mut w = crate::write::WriteBytes::create(&path, WriteOptions::default()).unwrap();
        let mut expect = Vec::new();
        for i in 0..2000u32 {
            let v = vec![(i % 251) as u8; 97 + (i as usize % 53)];
            w.write(Some(&v[..])).unwrap();
            expect.push(v);
        }
        w.close().unwrap();
        let mut r = ReadBytes::open(&path, ReadOptions::new().want_count(2000)).unwrap();
        for want in &expect {
            assert_eq!(r.pull().unwrap(), Record::Value(Some(want.clone())));
        }
        assert_eq!(r.pull().unwrap(), Record::End);
    }

    #[test]
    fn lines_cr_stripping_and_final_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = gz_file(&dir, "lines", b"plain\ncarriage\r\n\x00\nlast");
        let mut r = ReadBytesLines::open(&path, ReadOptions::new()).unwrap();
        assert_eq!(r.pull().unwrap(), Record::Value(Some(b"plain".to_vec())));
        assert_eq!(r.pull().unwrap(), Record::Value(Some(b"carriage".to_vec())));
        assert_eq!(r.pull().unwrap(), Record::Value(None));
        assert_eq!(r.pull().unwrap(), Record::Value(Some(b"last".to_vec())));
        assert_eq!(r.pull().unwrap(), Record::End);
    }

    #[test]
    fn long_line_spans_refills() {
        let dir = tempfile::tempdir().unwrap();
        let long = vec![b'x'; crate::BUFFER_SIZE + 4321];
        let mut content = long.clone();
        content.push(b'\n');
        content.extend_from_slice(b"short\n");
        let path = gz_file(&dir, "long", &content);
        let mut r = ReadBytesLines::open(&path, ReadOptions::new()).unwrap();
        assert_eq!(r.pull().unwrap(), Record::Value(Some(long)));
        assert_eq!(r.pull().unwrap(), Record::Value(Some(b"short".to_vec())));
        assert_eq!(r.pull().unwrap(), Record::End);
    }

    #[test]
    fn latin1_lines_with_errors_policy() {
        let dir = tempfile::tempdir().unwrap();
        let path = gz_file(&dir, "latin", b"caf\xe9\n");
        let mut r = ReadUnicodeLines::open(
            &path,
            ReadOptions::new().encoding("latin-1"),
        )
        .unwrap();
        assert_eq!(r.encoding(), "latin-1");
        assert_eq!(r.pull().unwrap(), Record::Value(Some("café".into())));

        let mut r = ReadUnicodeLines::open(&path, ReadOptions::new().errors("replace")).unwrap();
        assert_eq!(
            r.pull().unwrap(),
            Record::Value(Some("caf\u{fffd}".into()))
        );

        let mut r = ReadUnicodeLines::open(&path, ReadOptions::new()).unwrap();
        assert!(matches!(r.pull(), Err(Error::Format(_))));

        assert!(matches!(
            ReadUnicodeLines::open(&path, ReadOptions::new().encoding("utf-16")),
            Err(Error::Config(_))
        ));
        // Non-line readers refuse text options.
        assert!(matches!(
            ReadInt64::open(&path, ReadOptions::new().strip_bom(true)),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn iterator_adapter() {
        let dir = tempfile::tempdir().unwrap();
        let path = int64_file(&dir, "it", 3);
        let r = ReadInt64::open(&path, ReadOptions::new().want_count(3)).unwrap();
        let got: Vec<_> = r.map(|item| item.unwrap()).collect();
        assert_eq!(
            got,
            vec![
                Record::Value(Some(1)),
                Record::Value(Some(2)),
                Record::Value(Some(3)),
            ]
        );
    }
}
