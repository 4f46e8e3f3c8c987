//! Filesystem capability trait definition.

use crate::error::StorageResult;
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// One entry produced by [`FileSystem::read_dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Full path of the entry.
    pub path: PathBuf,
    /// Whether the entry is a directory.
    pub is_dir: bool,
}

impl DirEntry {
    /// Returns the final path component.
    #[must_use]
    pub fn file_name(&self) -> Option<&OsStr> {
        self.path.file_name()
    }

    /// Returns the extension of the entry, if any.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        self.path.extension().and_then(OsStr::to_str)
    }
}

/// Metadata for one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metadata {
    /// Whether the path is a directory.
    pub is_dir: bool,
    /// Length in bytes (zero for directories).
    pub len: u64,
    /// Last modification time.
    pub modified: SystemTime,
}

/// The filesystem capability LocalDB is built on.
///
/// Implementations are **plain file stores**. They know nothing about
/// instances, meta files or links; LocalDB owns all layout interpretation.
///
/// # Invariants
///
/// - `write` replaces the whole content of a file, creating it if needed
/// - `rename` of a file atomically replaces an existing destination file
/// - `rename` of a directory fails if the destination exists
/// - `read_dir` returns entries in a stable order for an unchanged directory
/// - Implementations must be `Send + Sync` so a context can be shared
///
/// # Implementors
///
/// - [`super::OsFileSystem`] - the host filesystem
/// - [`super::InMemoryFileSystem`] - for testing
/// - [`super::FaultInjectingFileSystem`] - wraps another implementation and
///   fails chosen operations
pub trait FileSystem: Send + Sync + fmt::Debug {
    /// Reads the whole content of a file.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the file does not exist, or an I/O error.
    fn read(&self, path: &Path) -> StorageResult<Vec<u8>>;

    /// Reads at most `len` bytes from the start of a file.
    ///
    /// # Errors
    ///
    /// Same as [`FileSystem::read`].
    fn read_prefix(&self, path: &Path, len: usize) -> StorageResult<Vec<u8>> {
        let mut data = self.read(path)?;
        data.truncate(len);
        Ok(data)
    }

    /// Writes `data` as the full content of a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory is missing or the write fails.
    fn write(&self, path: &Path, data: &[u8]) -> StorageResult<()>;

    /// Renames a file or directory.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `from` does not exist, or an I/O error.
    fn rename(&self, from: &Path, to: &Path) -> StorageResult<()>;

    /// Removes a regular file.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the file does not exist.
    fn remove_file(&self, path: &Path) -> StorageResult<()>;

    /// Creates one directory. The parent must exist.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` if the path exists.
    fn create_dir(&self, path: &Path) -> StorageResult<()>;

    /// Creates a directory and all missing parents.
    ///
    /// # Errors
    ///
    /// Returns an error if a component exists as a file.
    fn create_dir_all(&self, path: &Path) -> StorageResult<()>;

    /// Removes an empty directory.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryNotEmpty` if the directory has entries.
    fn remove_dir(&self, path: &Path) -> StorageResult<()>;

    /// Lists the direct children of a directory.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `NotADirectory`.
    fn read_dir(&self, path: &Path) -> StorageResult<Vec<DirEntry>>;

    /// Returns metadata for a path.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the path does not exist.
    fn metadata(&self, path: &Path) -> StorageResult<Metadata>;

    /// Returns true if the path exists.
    fn exists(&self, path: &Path) -> bool {
        self.metadata(path).is_ok()
    }

    /// Returns true if the path exists and is a directory.
    fn is_dir(&self, path: &Path) -> bool {
        self.metadata(path).map(|m| m.is_dir).unwrap_or(false)
    }

    /// Returns true if the path exists and is a regular file.
    fn is_file(&self, path: &Path) -> bool {
        self.metadata(path).map(|m| !m.is_dir).unwrap_or(false)
    }
}
