//! Error types for filesystem operations.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for filesystem operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during filesystem operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The path does not exist.
    #[error("path not found: {}", path.display())]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// The path already exists and would be clobbered.
    #[error("path already exists: {}", path.display())]
    AlreadyExists {
        /// The existing path.
        path: PathBuf,
    },

    /// A directory was required.
    #[error("not a directory: {}", path.display())]
    NotADirectory {
        /// The offending path.
        path: PathBuf,
    },

    /// A regular file was required.
    #[error("is a directory: {}", path.display())]
    IsADirectory {
        /// The offending path.
        path: PathBuf,
    },

    /// The directory still has entries.
    #[error("directory not empty: {}", path.display())]
    DirectoryNotEmpty {
        /// The offending path.
        path: PathBuf,
    },

    /// A failure injected by [`crate::FaultInjectingFileSystem`].
    #[error("injected {op} failure at {}", path.display())]
    Injected {
        /// The operation that was failed.
        op: &'static str,
        /// The path the operation targeted.
        path: PathBuf,
    },
}

impl StorageError {
    /// Converts an `io::Error` for `path`, mapping well-known kinds onto
    /// the structured variants.
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound {
                path: path.to_path_buf(),
            },
            io::ErrorKind::AlreadyExists => Self::AlreadyExists {
                path: path.to_path_buf(),
            },
            _ => Self::Io(err),
        }
    }

    /// Returns true if the error means the path does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Io(err) => err.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
