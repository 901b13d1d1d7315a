use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use diskfs_base::FsResult;
use tracing::{debug, instrument, trace};

use super::{
    FileHandle, NativeOp, OpenMode, assert_not_open, checked_len, read_fully, require_open,
    to_u32, write_fully,
};

#[derive(Debug)]
struct RawHandle {
    file: File,
    mode: OpenMode,
}

/// File handle backed by an unbuffered OS handle.
///
/// - `Write` mode creates a missing file but never truncates: writes overwrite existing
///   content in place starting at offset 0.
/// - `size` asks the OS for the file length without moving the cursor.
/// - `end_of_file` is true only if the most recent `read` succeeded and returned zero bytes.
///   Seeking, including `seek_to_end`, leaves it unchanged.
/// - `flush` syncs written data to storage and does nothing in `Read` mode.
#[derive(Debug, Default)]
pub struct RawHandleFile {
    path: PathBuf,
    handle: Option<RawHandle>,
    eof: bool,
}

impl RawHandleFile {
    /// Create a closed handle.
    pub fn new() -> Self {
        Self::default()
    }
}

impl FileHandle for RawHandleFile {
    #[instrument(skip(self, path), fields(path = %path.display()))]
    fn open(&mut self, path: &Path, mode: OpenMode) -> FsResult<()> {
        assert_not_open(&self.handle, &self.path);
        self.path = path.to_path_buf();
        self.eof = false;
        let file = match mode {
            OpenMode::Read => File::open(path),
            OpenMode::Write => OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(false)
                .open(path),
        }
        .map_err(|e| NativeOp::Open.error(path, e))?;
        self.handle = Some(RawHandle { file, mode });
        debug!("raw handle opened");
        Ok(())
    }

    fn close(&mut self) {
        if self.handle.take().is_some() {
            trace!(path = %self.path.display(), "raw handle closed");
        }
        self.eof = false;
    }

    fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    fn size(&mut self) -> FsResult<u32> {
        let handle = require_open(&mut self.handle, &self.path);
        let metadata = handle
            .file
            .metadata()
            .map_err(|e| NativeOp::Seek.error(&self.path, e))?;
        to_u32(&self.path, metadata.len())
    }

    fn position(&mut self) -> FsResult<u32> {
        let handle = require_open(&mut self.handle, &self.path);
        let position = handle
            .file
            .stream_position()
            .map_err(|e| NativeOp::Seek.error(&self.path, e))?;
        to_u32(&self.path, position)
    }

    fn end_of_file(&mut self) -> FsResult<bool> {
        require_open(&mut self.handle, &self.path);
        Ok(self.eof)
    }

    fn seek(&mut self, position: u32) -> FsResult<()> {
        let handle = require_open(&mut self.handle, &self.path);
        handle
            .file
            .seek(SeekFrom::Start(u64::from(position)))
            .map_err(|e| NativeOp::Seek.error(&self.path, e))?;
        Ok(())
    }

    fn seek_to_end(&mut self) -> FsResult<()> {
        let handle = require_open(&mut self.handle, &self.path);
        handle
            .file
            .seek(SeekFrom::End(0))
            .map_err(|e| NativeOp::Seek.error(&self.path, e))?;
        Ok(())
    }

    fn skip(&mut self, bytes: u32) -> FsResult<()> {
        let handle = require_open(&mut self.handle, &self.path);
        handle
            .file
            .seek(SeekFrom::Current(i64::from(bytes)))
            .map_err(|e| NativeOp::Seek.error(&self.path, e))?;
        Ok(())
    }

    fn read(&mut self, data: &mut [u8]) -> FsResult<u32> {
        let requested = checked_len(data.len());
        let handle = require_open(&mut self.handle, &self.path);
        match read_fully(&mut handle.file, data) {
            Ok(bytes_read) => {
                self.eof = bytes_read == 0;
                trace!(path = %self.path.display(), requested, bytes_read, "read");
                Ok(checked_len(bytes_read))
            }
            Err(e) => {
                self.eof = false;
                Err(NativeOp::Read.error(&self.path, e))
            }
        }
    }

    fn write(&mut self, data: &[u8]) -> FsResult<u32> {
        let requested = checked_len(data.len());
        let handle = require_open(&mut self.handle, &self.path);
        write_fully(&mut handle.file, data, &self.path)
            .map_err(|e| NativeOp::Write.error(&self.path, e))?;
        trace!(path = %self.path.display(), requested, "write");
        Ok(requested)
    }

    fn flush(&mut self) -> FsResult<()> {
        let handle = require_open(&mut self.handle, &self.path);
        match handle.mode {
            OpenMode::Read => Ok(()),
            OpenMode::Write => handle
                .file
                .sync_all()
                .map_err(|e: io::Error| NativeOp::Flush.error(&self.path, e)),
        }
    }
}

impl Drop for RawHandleFile {
    fn drop(&mut self) {
        self.close();
    }
}
