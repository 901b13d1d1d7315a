/* 📖 # What is the platform layer?

The platform layer is everything the disk filesystem needs from the operating system besides
the file handles themselves: existence and type queries, modification times, directory and
file creation/deletion, and directory listing. Every call takes an already-resolved path and
does no path interpretation of its own.

Two implementations exist:
- `RealOs` talks to the real filesystem via `std::fs` and `walkdir`
- `MockOs` keeps an in-memory tree and records every resolved path it receives
*/

pub mod mock;
pub mod path;
pub mod real_os;
mod traits;

pub use mock::{MockOs, OsCall};
pub use real_os::RealOs;
pub use traits::{OsHandle, OsPrimitives};
