use std::path::Path;
use std::sync::Arc;

use crate::FsResult;

/// OS primitives the disk filesystem delegates to.
///
/// Every method receives a path that has already been resolved against the filesystem prefix.
/// Implementations must not reinterpret it. Two implementations are provided:
/// - `RealOs`: the real filesystem
/// - `MockOs`: in-memory implementation for testing
pub trait OsPrimitives: std::fmt::Debug + Send + Sync + 'static {
    /// Check whether anything (file or directory) exists at the path.
    fn exists(&self, path: &Path) -> FsResult<bool>;

    /// Check whether the path names a directory. Missing paths are not directories.
    fn is_directory(&self, path: &Path) -> FsResult<bool>;

    /// Check whether the path names a regular file. Missing paths are not files.
    fn is_file(&self, path: &Path) -> FsResult<bool>;

    /// Last modification time.
    ///
    /// The value is only meaningful when compared against other values from the same
    /// implementation. `RealOs` reports nanoseconds since the Unix epoch.
    fn mtime(&self, path: &Path) -> FsResult<u64>;

    /// Create a single directory. The parent must exist.
    fn create_directory(&self, path: &Path) -> FsResult<()>;

    /// Delete an empty directory.
    fn delete_directory(&self, path: &Path) -> FsResult<()>;

    /// Create an empty file. An existing file is left untouched.
    fn create_file(&self, path: &Path) -> FsResult<()>;

    /// Delete a file.
    fn delete_file(&self, path: &Path) -> FsResult<()>;

    /// Names of the entries (files and directories) directly inside a directory.
    fn list_files(&self, path: &Path) -> FsResult<Vec<String>>;
}

/// Shared handle to an OS primitive implementation.
///
/// Wraps `Arc<dyn OsPrimitives>` so it can be cloned and handed to several filesystems.
#[derive(Debug, Clone)]
pub struct OsHandle(Arc<dyn OsPrimitives>);

impl OsHandle {
    pub fn new(os: impl OsPrimitives) -> Self {
        Self(Arc::new(os))
    }
}

impl std::ops::Deref for OsHandle {
    type Target = dyn OsPrimitives;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}
