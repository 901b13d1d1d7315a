use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::ErrorKind;
use crate::{FsError, FsResult};

use super::traits::OsPrimitives;

/* 📖 # What does MockOs record?

Besides an in-memory tree of files and directories, MockOs keeps a log of every call with
the exact path it received. Tests of the disk filesystem use the log to check that paths
were resolved against the prefix before being handed to the OS layer.
*/

/// A single call received by `MockOs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsCall {
    pub operation: &'static str,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    File,
    Directory,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    kind: EntryKind,
    mtime: u64,
}

#[derive(Debug, Default)]
struct MockState {
    entries: HashMap<PathBuf, Entry>,
    clock: u64,
    calls: Vec<OsCall>,
}

impl MockState {
    fn record(&mut self, operation: &'static str, path: &Path) {
        self.calls.push(OsCall {
            operation,
            path: path.to_path_buf(),
        });
    }

    fn insert(&mut self, path: &Path, kind: EntryKind) {
        self.clock += 1;
        let mtime = self.clock;
        self.entries
            .insert(path.to_path_buf(), Entry { kind, mtime });
    }

    fn kind_of(&self, path: &Path) -> Option<EntryKind> {
        self.entries.get(path).map(|entry| entry.kind)
    }

    /// Fails unless the parent of `path` is a directory. Filesystem roots and bare names
    /// count as having one.
    fn require_parent(&self, path: &Path) -> FsResult<()> {
        let Some(parent) = path.parent() else {
            return Ok(());
        };
        if parent.as_os_str().is_empty() || parent.parent().is_none() {
            return Ok(());
        }
        match self.kind_of(parent) {
            Some(EntryKind::Directory) => Ok(()),
            Some(EntryKind::File) => Err(failure(
                path,
                io::ErrorKind::NotADirectory,
                "parent is not a directory",
            )),
            None => Err(not_found(path)),
        }
    }

    fn has_children(&self, path: &Path) -> bool {
        self.entries.keys().any(|entry| entry.parent() == Some(path))
    }
}

/// In-memory OS primitives for testing.
///
/// Paths are compared exactly as received; no resolution or normalization happens.
/// Modification times come from a counter that ticks on every creation.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use diskfs_base::{MockOs, OsPrimitives};
///
/// let os = MockOs::new();
/// os.add_file("/data/save.bin");
/// assert!(os.is_file(Path::new("/data/save.bin")).unwrap());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockOs {
    state: Arc<Mutex<MockState>>,
}

fn not_found(path: &Path) -> Box<FsError> {
    Box::new(FsError::new(ErrorKind::FileError {
        path: path.to_path_buf(),
        source: io::Error::new(
            io::ErrorKind::NotFound,
            format!("No such file or directory: {}", path.display()),
        ),
    }))
}

fn failure(path: &Path, kind: io::ErrorKind, message: &str) -> Box<FsError> {
    Box::new(FsError::new(ErrorKind::FileError {
        path: path.to_path_buf(),
        source: io::Error::new(kind, message.to_string()),
    }))
}

impl MockOs {
    /// Create a new empty MockOs.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a file without recording a call.
    pub fn add_file(&self, path: impl AsRef<Path>) {
        self.lock().insert(path.as_ref(), EntryKind::File);
    }

    /// Add a directory without recording a call.
    pub fn add_directory(&self, path: impl AsRef<Path>) {
        self.lock().insert(path.as_ref(), EntryKind::Directory);
    }

    /// Override the modification time of an existing entry.
    pub fn set_mtime(&self, path: impl AsRef<Path>, mtime: u64) {
        if let Some(entry) = self.lock().entries.get_mut(path.as_ref()) {
            entry.mtime = mtime;
        }
    }

    /// All calls received so far, in order.
    pub fn calls(&self) -> Vec<OsCall> {
        self.lock().calls.clone()
    }

    /// Paths received so far, in call order.
    pub fn received_paths(&self) -> Vec<PathBuf> {
        self.lock()
            .calls
            .iter()
            .map(|call| call.path.clone())
            .collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }
}

impl OsPrimitives for MockOs {
    fn exists(&self, path: &Path) -> FsResult<bool> {
        let mut state = self.lock();
        state.record("exists", path);
        Ok(state.kind_of(path).is_some())
    }

    fn is_directory(&self, path: &Path) -> FsResult<bool> {
        let mut state = self.lock();
        state.record("is_directory", path);
        Ok(state.kind_of(path) == Some(EntryKind::Directory))
    }

    fn is_file(&self, path: &Path) -> FsResult<bool> {
        let mut state = self.lock();
        state.record("is_file", path);
        Ok(state.kind_of(path) == Some(EntryKind::File))
    }

    fn mtime(&self, path: &Path) -> FsResult<u64> {
        let mut state = self.lock();
        state.record("mtime", path);
        state
            .entries
            .get(path)
            .map(|entry| entry.mtime)
            .ok_or_else(|| not_found(path))
    }

    fn create_directory(&self, path: &Path) -> FsResult<()> {
        let mut state = self.lock();
        state.record("create_directory", path);
        if state.kind_of(path).is_some() {
            return Err(failure(path, io::ErrorKind::AlreadyExists, "already exists"));
        }
        state.require_parent(path)?;
        state.insert(path, EntryKind::Directory);
        Ok(())
    }

    fn delete_directory(&self, path: &Path) -> FsResult<()> {
        let mut state = self.lock();
        state.record("delete_directory", path);
        match state.kind_of(path) {
            Some(EntryKind::Directory) => {}
            Some(EntryKind::File) => {
                return Err(failure(path, io::ErrorKind::Other, "not a directory"));
            }
            None => return Err(not_found(path)),
        }
        if state.has_children(path) {
            return Err(failure(path, io::ErrorKind::Other, "directory not empty"));
        }
        state.entries.remove(path);
        Ok(())
    }

    fn create_file(&self, path: &Path) -> FsResult<()> {
        let mut state = self.lock();
        state.record("create_file", path);
        match state.kind_of(path) {
            Some(EntryKind::File) => Ok(()),
            Some(EntryKind::Directory) => {
                Err(failure(path, io::ErrorKind::Other, "is a directory"))
            }
            None => {
                state.require_parent(path)?;
                state.insert(path, EntryKind::File);
                Ok(())
            }
        }
    }

    fn delete_file(&self, path: &Path) -> FsResult<()> {
        let mut state = self.lock();
        state.record("delete_file", path);
        match state.kind_of(path) {
            Some(EntryKind::File) => {
                state.entries.remove(path);
                Ok(())
            }
            Some(EntryKind::Directory) => {
                Err(failure(path, io::ErrorKind::Other, "is a directory"))
            }
            None => Err(not_found(path)),
        }
    }

    fn list_files(&self, path: &Path) -> FsResult<Vec<String>> {
        let mut state = self.lock();
        state.record("list_files", path);
        match state.kind_of(path) {
            Some(EntryKind::Directory) => {}
            Some(EntryKind::File) => {
                return Err(failure(path, io::ErrorKind::NotADirectory, "not a directory"));
            }
            None => return Err(not_found(path)),
        }
        let mut names: Vec<String> = state
            .entries
            .keys()
            .filter(|entry| entry.parent() == Some(path))
            .filter_map(|entry| entry.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect();
        names.sort();
        Ok(names)
    }
}
