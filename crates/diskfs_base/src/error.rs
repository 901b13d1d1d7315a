use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use tracing_error::{SpanTrace, SpanTraceStatus};

/* 📖 # How are I/O failures reported?

Every failing native call on a file handle maps to exactly one ErrorKind variant that names the
operation (open, read, write, seek, flush) and carries the resolved path plus the originating
`std::io::Error`. The raw OS error code stays reachable through `FsError::native_code`.

Programmer errors (using a closed handle, opening a handle twice) are not represented here.
They panic at the call site.
*/

/// Error variants that can occur in diskfs operations.
/// Each variant represents a specific error category with its associated context.
#[derive(Debug)]
pub enum ErrorKind {
    /// Opening a file handle failed
    OpenFailed { path: PathBuf, source: io::Error },

    /// Reading through an open handle failed
    ReadFailed { path: PathBuf, source: io::Error },

    /// Writing through an open handle failed
    WriteFailed { path: PathBuf, source: io::Error },

    /// Positioning or position/size queries failed
    SeekFailed { path: PathBuf, source: io::Error },

    /// Flushing buffered data to storage failed
    FlushFailed { path: PathBuf, source: io::Error },

    /// An OS primitive (existence, directory, listing, mtime) failed
    FileError { path: PathBuf, source: io::Error },

    /// The file is larger than the 32-bit size limit
    FileTooLarge { path: PathBuf, size: u64 },

    /// Catch-all for other errors with a message
    Message { message: String },
}

impl ErrorKind {
    /// The resolved path the failing operation was working on, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ErrorKind::OpenFailed { path, .. }
            | ErrorKind::ReadFailed { path, .. }
            | ErrorKind::WriteFailed { path, .. }
            | ErrorKind::SeekFailed { path, .. }
            | ErrorKind::FlushFailed { path, .. }
            | ErrorKind::FileError { path, .. }
            | ErrorKind::FileTooLarge { path, .. } => Some(path),
            ErrorKind::Message { .. } => None,
        }
    }

    /// The underlying I/O error, if the failure came from a native call.
    pub fn io_source(&self) -> Option<&io::Error> {
        match self {
            ErrorKind::OpenFailed { source, .. }
            | ErrorKind::ReadFailed { source, .. }
            | ErrorKind::WriteFailed { source, .. }
            | ErrorKind::SeekFailed { source, .. }
            | ErrorKind::FlushFailed { source, .. }
            | ErrorKind::FileError { source, .. } => Some(source),
            ErrorKind::FileTooLarge { .. } | ErrorKind::Message { .. } => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::OpenFailed { path, source } => {
                write!(f, "Failed to open {}: {}", path.display(), source)
            }
            ErrorKind::ReadFailed { path, source } => {
                write!(f, "Failed to read {}: {}", path.display(), source)
            }
            ErrorKind::WriteFailed { path, source } => {
                write!(f, "Failed to write {}: {}", path.display(), source)
            }
            ErrorKind::SeekFailed { path, source } => {
                write!(f, "Failed to seek in {}: {}", path.display(), source)
            }
            ErrorKind::FlushFailed { path, source } => {
                write!(f, "Failed to flush {}: {}", path.display(), source)
            }
            ErrorKind::FileError { path, source } => {
                write!(f, "File error at {}: {}", path.display(), source)
            }
            ErrorKind::FileTooLarge { path, size } => write!(
                f,
                "File {} is too large: {} bytes exceeds the limit of {} bytes",
                path.display(),
                size,
                u32::MAX
            ),
            ErrorKind::Message { message } => write!(f, "{}", message),
        }
    }
}

/// Error type wrapping ErrorKind with context strings, an optional cause and a span trace.
///
/// The span trace is captured when the error is created, so it reflects the tracing spans
/// that were active at the failure site.
pub struct FsError {
    kind: ErrorKind,
    context: Vec<String>,
    cause: Option<Box<FsError>>,
    span_trace: SpanTrace,
}

impl FsError {
    /// Creates a new error from an ErrorKind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: vec![],
            cause: None,
            span_trace: SpanTrace::capture(),
        }
    }

    /// Creates a new message error.
    pub fn message(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Message {
            message: message.into(),
        })
    }

    /// Attaches context to an error.
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Attaches context using lazy evaluation.
    pub fn with_context<F>(mut self, f: F) -> Self
    where
        F: FnOnce() -> String,
    {
        self.context.push(f());
        self
    }

    /// Records the error that led to this one.
    pub fn caused_by(mut self, cause: impl Into<Box<FsError>>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Returns a reference to the underlying ErrorKind.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn get_context(&self) -> &[String] {
        &self.context
    }

    pub fn cause(&self) -> Option<&FsError> {
        self.cause.as_deref()
    }

    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    /// The resolved path of the failing operation, if any.
    pub fn path(&self) -> Option<&Path> {
        self.kind.path()
    }

    /// The raw OS error code of the failing native call, if one was reported.
    pub fn native_code(&self) -> Option<i32> {
        self.kind.io_source().and_then(io::Error::raw_os_error)
    }

    /// Returns the innermost error in the chain.
    pub fn root_cause(&self) -> &(dyn StdError + 'static) {
        let mut current: &(dyn StdError + 'static) = self;
        while let Some(next) = current.source() {
            current = next;
        }
        current
    }

    fn write_tree(&self, f: &mut fmt::Formatter<'_>, indent: &str) -> fmt::Result {
        let item_count = self.context.len() + usize::from(self.cause.is_some());
        for (i, ctx) in self.context.iter().enumerate() {
            let connector = if i + 1 == item_count { "└─" } else { "├─" };
            writeln!(f, "{indent}{connector} {ctx}")?;
        }
        if let Some(cause) = &self.cause {
            writeln!(f, "{indent}└─ cause: {}", cause.kind)?;
            cause.write_tree(f, &format!("{indent}   "))?;
        }
        Ok(())
    }
}

impl From<ErrorKind> for FsError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl StdError for FsError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        if let Some(source) = self.kind.io_source() {
            return Some(source);
        }
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn StdError + 'static))
    }
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ctx in &self.context {
            write!(f, "{}: ", ctx)?;
        }
        write!(f, "{}", self.kind)
    }
}

impl fmt::Debug for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.kind)?;
        self.write_tree(f, "")?;
        if self.span_trace.status() == SpanTraceStatus::CAPTURED {
            writeln!(f, "Trace: {}", self.span_trace)?;
        }
        Ok(())
    }
}

/// Standard result type for diskfs operations.
pub type FsResult<T> = std::result::Result<T, Box<FsError>>;

/// Extension trait for attaching context to Results.
pub trait ResultExt<T> {
    /// Attaches context to an error, consuming and re-wrapping it.
    fn context(self, context: impl Into<String>) -> FsResult<T>;

    /// Attaches context using lazy evaluation.
    /// Context is only evaluated if the result is an error.
    fn with_context<F>(self, f: F) -> FsResult<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for FsResult<T> {
    fn context(self, context: impl Into<String>) -> FsResult<T> {
        self.map_err(|err| Box::new(err.context(context)))
    }

    fn with_context<F>(self, f: F) -> FsResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|err| Box::new(err.with_context(f)))
    }
}

/// Creates a boxed message error from a format string.
#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        Box::new($crate::FsError::message(format!($($arg)*)))
    };
}

/// Returns early with a boxed message error.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::err!($($arg)*))
    };
}
