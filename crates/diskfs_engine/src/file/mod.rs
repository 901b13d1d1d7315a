/* 📖 # Two file handle backends

Both backends implement the same FileHandle capability on top of `std::fs::File` but keep
the native semantics they are modelled on:

- `BufferedStreamFile` is a buffered stream. Write mode creates or truncates. Its end-of-file
  state is the stream's indicator: a read that comes up short sets it and any seek clears it.
- `RawHandleFile` is an unbuffered OS handle. Write mode creates the file if missing and keeps
  existing content. The handle has no end-of-file query of its own, so the backend remembers
  whether the most recent read returned zero bytes. Seeking does not touch that flag.

Neither reports end-of-file before a read has observed it, so both are false right after
`seek_to_end`. They differ on a short non-empty read (only the stream sets the indicator) and on
seeking back afterwards (only the stream clears it). Both cases are tested per backend.
*/

mod buffered;
mod raw;

use std::fmt;
use std::io::{self, Read, Write};
use std::path::Path;

use diskfs_base::error::ErrorKind;
use diskfs_base::{FsError, FsResult};
use serde::Deserialize;
use tracing::debug;

pub use buffered::BufferedStreamFile;
pub use raw::RawHandleFile;

/// How a file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Read-only. Never creates the file.
    Read,
    /// Write-only. Creation and truncation are backend-defined.
    Write,
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpenMode::Read => write!(f, "read"),
            OpenMode::Write => write!(f, "write"),
        }
    }
}

/// Byte-oriented random access to a single open file.
///
/// A handle is either closed or bound to exactly one native file. Every method except
/// `open`, `close` and `is_open` panics when called on a closed handle. Native failures are
/// returned as errors carrying the path and the OS error.
///
/// Sizes and offsets are 32-bit.
pub trait FileHandle: fmt::Debug + Send {
    /// Binds the handle to the file at `path`. Panics if the handle is already open.
    fn open(&mut self, path: &Path, mode: OpenMode) -> FsResult<()>;

    /// Releases the native file. Closing a closed handle does nothing.
    fn close(&mut self);

    fn is_open(&self) -> bool;

    /// Total length in bytes. The cursor is left where it was.
    fn size(&mut self) -> FsResult<u32>;

    /// Current cursor offset from the start of the file.
    fn position(&mut self) -> FsResult<u32>;

    /// Whether a read has observed end-of-file. The exact rule differs per backend, see the
    /// module docs.
    fn end_of_file(&mut self) -> FsResult<bool>;

    /// Moves the cursor to an absolute offset.
    fn seek(&mut self, position: u32) -> FsResult<()>;

    /// Moves the cursor to the end of the file.
    fn seek_to_end(&mut self) -> FsResult<()>;

    /// Moves the cursor forward by `bytes`.
    fn skip(&mut self, bytes: u32) -> FsResult<()>;

    /// Reads up to `data.len()` bytes, stopping early only at end-of-file.
    /// Returns the number of bytes read.
    fn read(&mut self, data: &mut [u8]) -> FsResult<u32>;

    /// Writes all of `data` and returns its length.
    ///
    /// Partial writes are not tolerated: if the native layer stops making progress the
    /// process panics.
    fn write(&mut self, data: &[u8]) -> FsResult<u32>;

    /// Pushes buffered data to the underlying storage.
    fn flush(&mut self) -> FsResult<()>;

    /// Reads from the cursor to end-of-file, appending to `out`.
    fn read_to_end(&mut self, out: &mut Vec<u8>) -> FsResult<u32> {
        let mut chunk = [0u8; 4096];
        let mut total: u32 = 0;
        loop {
            let bytes_read = self.read(&mut chunk)?;
            if bytes_read == 0 {
                return Ok(total);
            }
            out.extend_from_slice(&chunk[..bytes_read as usize]);
            total = total.saturating_add(bytes_read);
        }
    }
}

/// The file handle implementation a filesystem hands out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    BufferedStream,
    RawHandle,
}

impl Backend {
    /// Raw handles on Windows, buffered streams everywhere else.
    pub fn platform_default() -> Self {
        if cfg!(windows) {
            Backend::RawHandle
        } else {
            Backend::BufferedStream
        }
    }

    /// Creates a closed handle of this backend.
    pub fn new_handle(self) -> Box<dyn FileHandle> {
        match self {
            Backend::BufferedStream => Box::new(BufferedStreamFile::new()),
            Backend::RawHandle => Box::new(RawHandleFile::new()),
        }
    }
}

impl Default for Backend {
    fn default() -> Self {
        Self::platform_default()
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::BufferedStream => write!(f, "buffered-stream"),
            Backend::RawHandle => write!(f, "raw-handle"),
        }
    }
}

/// Native operation that failed, used to pick the error variant.
#[derive(Debug, Clone, Copy)]
pub(crate) enum NativeOp {
    Open,
    Read,
    Write,
    Seek,
    Flush,
}

impl NativeOp {
    pub(crate) fn error(self, path: &Path, source: io::Error) -> Box<FsError> {
        debug!(operation = ?self, path = %path.display(), error = %source, "native call failed");
        let path = path.to_path_buf();
        let kind = match self {
            NativeOp::Open => ErrorKind::OpenFailed { path, source },
            NativeOp::Read => ErrorKind::ReadFailed { path, source },
            NativeOp::Write => ErrorKind::WriteFailed { path, source },
            NativeOp::Seek => ErrorKind::SeekFailed { path, source },
            NativeOp::Flush => ErrorKind::FlushFailed { path, source },
        };
        Box::new(FsError::new(kind))
    }
}

/// Returns the bound native resource, panicking on a closed handle.
#[track_caller]
pub(crate) fn require_open<'a, T>(slot: &'a mut Option<T>, path: &Path) -> &'a mut T {
    match slot {
        Some(resource) => resource,
        None => panic!("file handle is not open (last path: '{}')", path.display()),
    }
}

#[track_caller]
pub(crate) fn assert_not_open<T>(slot: &Option<T>, path: &Path) {
    assert!(
        slot.is_none(),
        "file handle is already open on '{}'",
        path.display()
    );
}

/// Buffer lengths must be representable as 32-bit byte counts.
#[track_caller]
pub(crate) fn checked_len(len: usize) -> u32 {
    match u32::try_from(len) {
        Ok(len) => len,
        Err(_) => panic!("buffer of {} bytes exceeds the 32-bit I/O limit", len),
    }
}

pub(crate) fn to_u32(path: &Path, value: u64) -> FsResult<u32> {
    u32::try_from(value).map_err(|_| {
        Box::new(FsError::new(ErrorKind::FileTooLarge {
            path: path.to_path_buf(),
            size: value,
        }))
    })
}

/// Reads until `data` is full or the reader reports end-of-file.
pub(crate) fn read_fully(reader: &mut impl Read, data: &mut [u8]) -> io::Result<usize> {
    let mut total = 0;
    while total < data.len() {
        match reader.read(&mut data[total..]) {
            Ok(0) => break,
            Ok(bytes_read) => total += bytes_read,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(total)
}

/// Writes all of `data`. A native write that makes no progress is fatal.
pub(crate) fn write_fully(
    writer: &mut impl Write,
    data: &[u8],
    path: &Path,
) -> io::Result<usize> {
    let mut written = 0;
    while written < data.len() {
        match writer.write(&data[written..]) {
            Ok(0) => panic!(
                "short write to '{}': {} of {} bytes written",
                path.display(),
                written,
                data.len()
            ),
            Ok(bytes_written) => written += bytes_written,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(written)
}
