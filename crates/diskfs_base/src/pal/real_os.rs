use std::fs;
use std::io;
use std::path::Path;
use std::time::UNIX_EPOCH;

use tracing::{debug, instrument};
use walkdir::WalkDir;

use crate::{FsError, FsResult, error::ErrorKind};

use super::traits::OsPrimitives;

/// OS primitives backed by the real filesystem via `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealOs;

impl RealOs {
    pub fn new() -> Self {
        Self
    }
}

fn file_error(path: &Path, source: io::Error) -> Box<FsError> {
    Box::new(FsError::new(ErrorKind::FileError {
        path: path.to_path_buf(),
        source,
    }))
}

/// Metadata lookup where a missing path is not an error.
fn metadata_if_present(path: &Path) -> FsResult<Option<fs::Metadata>> {
    match fs::metadata(path) {
        Ok(metadata) => Ok(Some(metadata)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => {
            debug!(error = %e, "failed to read metadata");
            Err(file_error(path, e))
        }
    }
}

impl OsPrimitives for RealOs {
    #[instrument(skip(self), fields(path = %path.display()))]
    fn exists(&self, path: &Path) -> FsResult<bool> {
        let exists = path.try_exists().map_err(|e| {
            debug!(error = %e, "failed to check existence");
            file_error(path, e)
        })?;
        debug!(exists, "checked existence");
        Ok(exists)
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    fn is_directory(&self, path: &Path) -> FsResult<bool> {
        Ok(metadata_if_present(path)?.is_some_and(|metadata| metadata.is_dir()))
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    fn is_file(&self, path: &Path) -> FsResult<bool> {
        Ok(metadata_if_present(path)?.is_some_and(|metadata| metadata.is_file()))
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    fn mtime(&self, path: &Path) -> FsResult<u64> {
        let modified = fs::metadata(path)
            .and_then(|metadata| metadata.modified())
            .map_err(|e| {
                debug!(error = %e, "failed to read modification time");
                file_error(path, e)
            })?;
        // Pre-epoch timestamps clamp to zero
        let nanos = modified
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        Ok(u64::try_from(nanos).unwrap_or(u64::MAX))
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    fn create_directory(&self, path: &Path) -> FsResult<()> {
        fs::create_dir(path).map_err(|e| {
            debug!(error = %e, "failed to create directory");
            file_error(path, e)
        })?;
        debug!("directory created");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    fn delete_directory(&self, path: &Path) -> FsResult<()> {
        fs::remove_dir(path).map_err(|e| {
            debug!(error = %e, "failed to delete directory");
            file_error(path, e)
        })?;
        debug!("directory deleted");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    fn create_file(&self, path: &Path) -> FsResult<()> {
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| {
                debug!(error = %e, "failed to create file");
                file_error(path, e)
            })?;
        debug!("file created");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    fn delete_file(&self, path: &Path) -> FsResult<()> {
        fs::remove_file(path).map_err(|e| {
            debug!(error = %e, "failed to delete file");
            file_error(path, e)
        })?;
        debug!("file deleted");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    fn list_files(&self, path: &Path) -> FsResult<Vec<String>> {
        // walkdir yields no entries for a plain file
        let metadata = fs::metadata(path).map_err(|e| {
            debug!(error = %e, "failed to read metadata");
            file_error(path, e)
        })?;
        if !metadata.is_dir() {
            debug!("not a directory");
            return Err(file_error(
                path,
                io::Error::new(io::ErrorKind::NotADirectory, "not a directory"),
            ));
        }

        let mut names = Vec::new();
        for entry in WalkDir::new(path)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                debug!(error = %e, "error listing directory");
                let failed_path = e.path().unwrap_or(path).to_path_buf();
                let source = e
                    .into_io_error()
                    .unwrap_or_else(|| io::Error::other("directory listing failed"));
                file_error(&failed_path, source)
            })?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        debug!(count = names.len(), "listed directory");
        Ok(names)
    }
}
