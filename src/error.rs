//! Closed error taxonomy shared across every component.
//!
//! Every fallible operation in this crate returns `Result<T, Error>`. The
//! variants form a closed taxonomy so that a caller can match on `kind()`
//! without string-sniffing a message.

use std::fmt;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid session name '{name}': {reason}")]
    InvalidInput { name: String, reason: String },

    #[error("session '{name}' not found in {location}")]
    NotFound { name: String, location: &'static str },

    #[error("session '{name}' already exists in {location}")]
    AlreadyExists { name: String, location: &'static str },

    #[error("I/O failure at {path}: {source}")]
    IoFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("too long for the filesystem: '{path}'")]
    FilesystemLimit { path: String },

    #[error("compositor request failed: {0}")]
    CompositorFailure(String),

    #[error("operation timed out: {0}")]
    TimedOut(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("corrupt data: {0}")]
    Corrupt(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// The closed set of error kinds, independent of the message payload each
/// variant carries. Used by callers that want to branch on category without
/// matching the full enum (e.g. mapping to an exit code or a `Message`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    AlreadyExists,
    IoFailure,
    FilesystemLimit,
    CompositorFailure,
    TimedOut,
    Conflict,
    Corrupt,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::NotFound => "not_found",
            ErrorKind::AlreadyExists => "already_exists",
            ErrorKind::IoFailure => "io_failure",
            ErrorKind::FilesystemLimit => "filesystem_limit",
            ErrorKind::CompositorFailure => "compositor_failure",
            ErrorKind::TimedOut => "timed_out",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Corrupt => "corrupt",
            ErrorKind::Internal => "internal",
        };
        f.write_str(s)
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidInput { .. } => ErrorKind::InvalidInput,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Error::IoFailure { .. } => ErrorKind::IoFailure,
            Error::FilesystemLimit { .. } => ErrorKind::FilesystemLimit,
            Error::CompositorFailure(_) => ErrorKind::CompositorFailure,
            Error::TimedOut(_) => ErrorKind::TimedOut,
            Error::Conflict(_) => ErrorKind::Conflict,
            Error::Corrupt(_) => ErrorKind::Corrupt,
            Error::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Wraps a filesystem `io::Error`, except `ENAMETOOLONG` (errno 36 on
    /// Linux), which gets its own variant — a too-long archived-name path is
    /// a distinct, user-actionable condition (pick a shorter name), not a
    /// generic I/O failure.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.raw_os_error() == Some(36) {
            return Error::FilesystemLimit {
                path: path.display().to_string(),
            };
        }
        Error::IoFailure { path, source }
    }

    pub fn not_found(name: impl Into<String>, location: &'static str) -> Self {
        Error::NotFound {
            name: name.into(),
            location,
        }
    }

    pub fn already_exists(name: impl Into<String>, location: &'static str) -> Self {
        Error::AlreadyExists {
            name: name.into(),
            location,
        }
    }

    pub fn invalid_input(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidInput {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
