use diskfs_base::{FsResult, ResultExt, err};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::file::{Backend, OpenMode};
use crate::filesystem::DiskFilesystem;

/// Configuration for a disk filesystem.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilesystemConfig {
    /// Directory that relative paths are resolved against. Empty means the working directory.
    pub prefix: String,
    /// File handle backend, `buffered-stream` or `raw-handle`.
    pub backend: Backend,
}

impl FilesystemConfig {
    pub fn from_toml_str(content: &str) -> FsResult<Self> {
        toml::from_str(content).map_err(|e| err!("Failed to parse config: {}", e))
    }
}

/// Reads and parses a TOML config file through `filesystem`.
#[instrument(skip(filesystem))]
pub fn load_config(filesystem: &DiskFilesystem, path: &str) -> FsResult<FilesystemConfig> {
    let mut file = filesystem.open(path, OpenMode::Read)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    filesystem.close(file);

    let content =
        String::from_utf8(bytes).map_err(|e| err!("Config file {} is not UTF-8: {}", path, e))?;
    let config =
        FilesystemConfig::from_toml_str(&content).with_context(|| format!("loading {}", path))?;
    debug!(prefix = %config.prefix, backend = %config.backend, "config loaded");
    Ok(config)
}
