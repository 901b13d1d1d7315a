/* 📖 # What lives in diskfs_base?

diskfs_base holds the pieces every other crate builds on: the error type, tracing setup,
and the platform layer (OS primitives and path utilities) that the file handles and the
disk filesystem facade delegate to.
*/

pub mod error;
pub mod pal;
pub mod tracing;

// Re-export commonly used types for convenience
pub use error::{ErrorKind, FsError, FsResult, ResultExt};
pub use pal::{MockOs, OsHandle, OsPrimitives, RealOs};
