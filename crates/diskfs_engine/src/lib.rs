/* 📖 # What does diskfs_engine provide?

The engine turns the platform layer into something callers can use directly:

- `file`: the FileHandle capability and its two backends
- `filesystem`: the DiskFilesystem facade that resolves paths against a prefix, opens files
  and forwards existence and directory queries to the OS layer
- `config`: TOML configuration for the facade

Paths are plain strings at this level. They only become `PathBuf`s once resolved.
*/

pub mod config;
pub mod file;
mod file_tests;
pub mod filesystem;

pub use config::{FilesystemConfig, load_config};
pub use file::{Backend, BufferedStreamFile, FileHandle, OpenMode, RawHandleFile};
pub use filesystem::{DiskFilesystem, OpenFile, resolve};
