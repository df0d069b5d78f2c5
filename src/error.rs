//! Library error types.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// A colpack Result, normally returning a colpack [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A colpack error. Encompasses any issue that can happen while
/// constructing, reading, or writing a column file.
#[derive(Debug)]
pub enum Error {
    /// Any operation on a reader or writer that has been closed.
    Closed,
    /// An open/seek/read/write on the underlying file failed.
    Io {
        /// Path of the file involved, for error localization.
        path: PathBuf,
        /// The operating system error.
        source: io::Error,
    },
    /// The stream did not start with the expected compression framing
    /// (e.g. a gzip reader handed a plain-text file).
    CompressionInit {
        /// Path of the offending file.
        path: PathBuf,
        /// What the compressor objected to.
        msg: String,
    },
    /// Malformed encoded bytes: a bad tag, a truncated record, a
    /// disallowed length-prefix combination, or a stream that ended
    /// before the expected record count. Fatal to the instance.
    Format(String),
    /// The value's runtime type cannot be encoded by this writer.
    Type(String),
    /// A numeric value does not fit its encoding, including collision
    /// with the reserved None-sentinel bit pattern.
    Overflow(String),
    /// Invalid construction parameters: bad slice tuple, bad mode
    /// string, unknown compression or encoding name, and similar.
    Config(String),
    /// The progress callback failed with something other than the
    /// canonical stop signal.
    Callback(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Closed => write!(f, "I/O operation on closed file"),
            Error::Io { ref path, ref source } => {
                write!(f, "{}: {}", path.display(), source)
            }
            Error::CompressionInit { ref path, ref msg } => {
                write!(f, "{}: {}", path.display(), msg)
            }
            Error::Format(ref msg) => f.write_str(msg),
            Error::Type(ref msg) => f.write_str(msg),
            Error::Overflow(ref msg) => f.write_str(msg),
            Error::Config(ref msg) => f.write_str(msg),
            Error::Callback(ref msg) => write!(f, "Callback error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::Io { ref source, .. } => Some(source),
            _ => None,
        }
    }
}

impl Error {
    pub(crate) fn io(path: &std::path::Path, source: io::Error) -> Self {
        Error::Io {
            path: path.to_owned(),
            source,
        }
    }

    /// True for errors that permanently poison a reader.
    pub(crate) fn is_sticky(&self) -> bool {
        matches!(*self, Error::Format(_) | Error::Io { .. })
    }
}
