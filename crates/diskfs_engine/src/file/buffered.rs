use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use diskfs_base::FsResult;
use tracing::{debug, instrument, trace, warn};

use super::{
    FileHandle, NativeOp, OpenMode, assert_not_open, checked_len, read_fully, require_open,
    to_u32, write_fully,
};

/// Buffered stream over a file, one direction per open mode.
#[derive(Debug)]
enum Stream {
    Reader(BufReader<File>),
    Writer(BufWriter<File>),
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Stream::Reader(reader) => reader.read(buf),
            // Write streams are opened write-only, so the native read reports the failure
            Stream::Writer(writer) => {
                writer.flush()?;
                writer.get_mut().read(buf)
            }
        }
    }
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Stream::Reader(reader) => reader.get_mut().write(buf),
            Stream::Writer(writer) => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Stream::Reader(_) => Ok(()),
            Stream::Writer(writer) => writer.flush(),
        }
    }
}

impl Seek for Stream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            Stream::Reader(reader) => reader.seek(pos),
            Stream::Writer(writer) => writer.seek(pos),
        }
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        match self {
            Stream::Reader(reader) => reader.stream_position(),
            Stream::Writer(writer) => writer.stream_position(),
        }
    }
}

/// File handle backed by a buffered stream.
///
/// - `Write` mode creates the file or truncates an existing one.
/// - `size` seeks to the end and back to the saved position.
/// - `end_of_file` is the stream's end-of-file indicator. A `read` that returns fewer bytes
///   than requested sets it. `seek`, `seek_to_end`, `skip` and reopening clear it. It is
///   never set by positioning alone, so it is false right after `seek_to_end`.
#[derive(Debug, Default)]
pub struct BufferedStreamFile {
    path: PathBuf,
    stream: Option<Stream>,
    eof: bool,
}

impl BufferedStreamFile {
    /// Create a closed handle.
    pub fn new() -> Self {
        Self::default()
    }
}

impl FileHandle for BufferedStreamFile {
    #[instrument(skip(self, path), fields(path = %path.display()))]
    fn open(&mut self, path: &Path, mode: OpenMode) -> FsResult<()> {
        assert_not_open(&self.stream, &self.path);
        self.path = path.to_path_buf();
        self.eof = false;
        let stream = match mode {
            OpenMode::Read => File::open(path).map(|file| Stream::Reader(BufReader::new(file))),
            OpenMode::Write => {
                File::create(path).map(|file| Stream::Writer(BufWriter::new(file)))
            }
        }
        .map_err(|e| NativeOp::Open.error(path, e))?;
        self.stream = Some(stream);
        debug!("buffered stream opened");
        Ok(())
    }

    fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.flush() {
                warn!(path = %self.path.display(), error = %e, "failed to flush stream on close");
            }
            trace!(path = %self.path.display(), "buffered stream closed");
        }
        self.eof = false;
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    fn size(&mut self) -> FsResult<u32> {
        let stream = require_open(&mut self.stream, &self.path);
        let path = self.path.as_path();
        let seek_error = |e: io::Error| NativeOp::Seek.error(path, e);

        let saved = stream.stream_position().map_err(seek_error)?;
        let end = stream.seek(SeekFrom::End(0)).map_err(seek_error)?;
        stream.seek(SeekFrom::Start(saved)).map_err(seek_error)?;
        to_u32(path, end)
    }

    fn position(&mut self) -> FsResult<u32> {
        let stream = require_open(&mut self.stream, &self.path);
        let position = stream
            .stream_position()
            .map_err(|e| NativeOp::Seek.error(&self.path, e))?;
        to_u32(&self.path, position)
    }

    fn end_of_file(&mut self) -> FsResult<bool> {
        require_open(&mut self.stream, &self.path);
        Ok(self.eof)
    }

    fn seek(&mut self, position: u32) -> FsResult<()> {
        let stream = require_open(&mut self.stream, &self.path);
        stream
            .seek(SeekFrom::Start(u64::from(position)))
            .map_err(|e| NativeOp::Seek.error(&self.path, e))?;
        self.eof = false;
        Ok(())
    }

    fn seek_to_end(&mut self) -> FsResult<()> {
        let stream = require_open(&mut self.stream, &self.path);
        stream
            .seek(SeekFrom::End(0))
            .map_err(|e| NativeOp::Seek.error(&self.path, e))?;
        self.eof = false;
        Ok(())
    }

    fn skip(&mut self, bytes: u32) -> FsResult<()> {
        let stream = require_open(&mut self.stream, &self.path);
        stream
            .seek(SeekFrom::Current(i64::from(bytes)))
            .map_err(|e| NativeOp::Seek.error(&self.path, e))?;
        self.eof = false;
        Ok(())
    }

    fn read(&mut self, data: &mut [u8]) -> FsResult<u32> {
        let requested = checked_len(data.len());
        let stream = require_open(&mut self.stream, &self.path);
        let bytes_read =
            read_fully(stream, data).map_err(|e| NativeOp::Read.error(&self.path, e))?;
        if bytes_read < data.len() {
            self.eof = true;
        }
        trace!(path = %self.path.display(), requested, bytes_read, "read");
        Ok(checked_len(bytes_read))
    }

    fn write(&mut self, data: &[u8]) -> FsResult<u32> {
        let requested = checked_len(data.len());
        let stream = require_open(&mut self.stream, &self.path);
        write_fully(stream, data, &self.path).map_err(|e| NativeOp::Write.error(&self.path, e))?;
        trace!(path = %self.path.display(), requested, "write");
        Ok(requested)
    }

    fn flush(&mut self) -> FsResult<()> {
        let stream = require_open(&mut self.stream, &self.path);
        stream
            .flush()
            .map_err(|e| NativeOp::Flush.error(&self.path, e))
    }
}

impl Drop for BufferedStreamFile {
    fn drop(&mut self) {
        self.close();
    }
}
