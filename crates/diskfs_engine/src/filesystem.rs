use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use diskfs_base::pal::path;
use diskfs_base::{FsResult, OsHandle, RealOs};
use tracing::{debug, instrument};

use crate::config::FilesystemConfig;
use crate::file::{Backend, FileHandle, OpenMode};

/* 📖 # How are paths resolved?

Absolute paths are used verbatim and never see the prefix, so callers can always reach a
location outside the configured root on purpose. Relative paths are joined onto the prefix.
Nothing else happens: no `.`/`..` normalization and no existence checks.

An empty prefix leaves relative paths relative, i.e. relative to the working directory.
*/

/// Resolves `path` against `prefix`.
pub fn resolve(prefix: &Path, path: &str) -> PathBuf {
    if path::is_absolute(path) {
        PathBuf::from(path)
    } else {
        path::join(prefix, path)
    }
}

/// An open file handed out by [`DiskFilesystem::open`].
///
/// Owns the handle exclusively. Dropping it releases the native file, so the file is closed
/// on every exit path. [`DiskFilesystem::close`] is the explicit form.
#[derive(Debug)]
pub struct OpenFile {
    handle: Box<dyn FileHandle>,
    path: PathBuf,
}

impl OpenFile {
    /// The resolved path the file was opened with.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Deref for OpenFile {
    type Target = dyn FileHandle;

    fn deref(&self) -> &Self::Target {
        &*self.handle
    }
}

impl DerefMut for OpenFile {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.handle
    }
}

/// Disk filesystem rooted at a prefix.
///
/// Every path is resolved with [`resolve`] before it reaches the OS layer or a file handle.
/// Files are opened with the configured [`Backend`].
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use diskfs_base::{MockOs, OsHandle};
/// use diskfs_engine::DiskFilesystem;
///
/// let mut fs = DiskFilesystem::new(OsHandle::new(MockOs::new()));
/// fs.set_prefix("/data/game");
/// assert_eq!(
///     fs.absolute_path("levels/intro.bin"),
///     Path::new("/data/game").join("levels").join("intro.bin"),
/// );
/// ```
#[derive(Debug, Clone)]
pub struct DiskFilesystem {
    os: OsHandle,
    prefix: PathBuf,
    backend: Backend,
}

impl DiskFilesystem {
    /// Filesystem with an empty prefix and the platform's default backend.
    pub fn new(os: OsHandle) -> Self {
        Self {
            os,
            prefix: PathBuf::new(),
            backend: Backend::platform_default(),
        }
    }

    /// Filesystem over the real OS layer.
    pub fn real() -> Self {
        Self::new(OsHandle::new(RealOs::new()))
    }

    pub fn from_config(os: OsHandle, config: &FilesystemConfig) -> Self {
        let mut filesystem = Self::new(os).with_backend(config.backend);
        filesystem.set_prefix(&config.prefix);
        filesystem
    }

    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    pub fn set_prefix(&mut self, prefix: impl Into<PathBuf>) {
        self.prefix = prefix.into();
        debug!(prefix = %self.prefix.display(), "prefix set");
    }

    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// The path that operations on `path` act on.
    pub fn absolute_path(&self, path: &str) -> PathBuf {
        resolve(&self.prefix, path)
    }

    /// Opens `path` with a fresh handle of the configured backend.
    ///
    /// The handle is released before returning if the native open fails.
    #[instrument(skip(self), fields(backend = %self.backend))]
    pub fn open(&self, path: &str, mode: OpenMode) -> FsResult<OpenFile> {
        let resolved = self.absolute_path(path);
        debug!(resolved = %resolved.display(), "opening file");
        let mut handle = self.backend.new_handle();
        handle.open(&resolved, mode)?;
        Ok(OpenFile {
            handle,
            path: resolved,
        })
    }

    /// Closes a file opened by this filesystem.
    pub fn close(&self, mut file: OpenFile) {
        file.handle.close();
        debug!(path = %file.path.display(), "file closed");
    }

    #[instrument(skip(self))]
    pub fn exists(&self, path: &str) -> FsResult<bool> {
        self.os.exists(&self.absolute_path(path))
    }

    #[instrument(skip(self))]
    pub fn is_directory(&self, path: &str) -> FsResult<bool> {
        self.os.is_directory(&self.absolute_path(path))
    }

    #[instrument(skip(self))]
    pub fn is_file(&self, path: &str) -> FsResult<bool> {
        self.os.is_file(&self.absolute_path(path))
    }

    /// Opaque modification stamp, only meaningful for comparisons.
    #[instrument(skip(self))]
    pub fn last_modified_time(&self, path: &str) -> FsResult<u64> {
        self.os.mtime(&self.absolute_path(path))
    }

    /// Creates the directory unless something already exists at the path.
    ///
    /// The existence check and the creation are separate calls, so a concurrent creator can
    /// still make the second one fail.
    #[instrument(skip(self))]
    pub fn create_directory(&self, path: &str) -> FsResult<()> {
        let resolved = self.absolute_path(path);
        if self.os.exists(&resolved)? {
            debug!(resolved = %resolved.display(), "directory already present");
            return Ok(());
        }
        self.os.create_directory(&resolved)
    }

    #[instrument(skip(self))]
    pub fn delete_directory(&self, path: &str) -> FsResult<()> {
        self.os.delete_directory(&self.absolute_path(path))
    }

    #[instrument(skip(self))]
    pub fn create_file(&self, path: &str) -> FsResult<()> {
        self.os.create_file(&self.absolute_path(path))
    }

    #[instrument(skip(self))]
    pub fn delete_file(&self, path: &str) -> FsResult<()> {
        self.os.delete_file(&self.absolute_path(path))
    }

    /// Entry names inside the directory, in the order the OS layer returns them.
    #[instrument(skip(self))]
    pub fn list_files(&self, path: &str) -> FsResult<Vec<String>> {
        self.os.list_files(&self.absolute_path(path))
    }
}
