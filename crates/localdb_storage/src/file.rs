//! Host filesystem implementation.

use crate::backend::{DirEntry, FileSystem, Metadata};
use crate::error::{StorageError, StorageResult};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use std::time::SystemTime;

/// The host filesystem, accessed through `std::fs`.
///
/// # Durability
///
/// - `write()` calls `File::sync_all()` before returning, so a later
///   `rename` never publishes a file whose content is still in flight
/// - `rename()` relies on the host's atomic same-volume rename
///
/// # Example
///
/// ```no_run
/// use localdb_storage::{FileSystem, OsFileSystem};
/// use std::path::Path;
///
/// let fs = OsFileSystem::new();
/// fs.write(Path::new("object~new"), b"payload").unwrap();
/// fs.rename(Path::new("object~new"), Path::new("object")).unwrap();
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem {
    sync_writes: bool,
}

impl OsFileSystem {
    /// Creates a filesystem handle that syncs every write.
    #[must_use]
    pub fn new() -> Self {
        Self { sync_writes: true }
    }

    /// Creates a handle that skips `sync_all` after writes.
    ///
    /// Faster, but a crash may publish a truncated file.
    #[must_use]
    pub fn without_sync() -> Self {
        Self { sync_writes: false }
    }
}

impl FileSystem for OsFileSystem {
    fn read(&self, path: &Path) -> StorageResult<Vec<u8>> {
        fs::read(path).map_err(|e| StorageError::from_io(path, e))
    }

    fn read_prefix(&self, path: &Path, len: usize) -> StorageResult<Vec<u8>> {
        let file = File::open(path).map_err(|e| StorageError::from_io(path, e))?;
        let mut buffer = Vec::with_capacity(len);
        file.take(len as u64).read_to_end(&mut buffer)?;
        Ok(buffer)
    }

    fn write(&self, path: &Path, data: &[u8]) -> StorageResult<()> {
        let mut file = File::create(path).map_err(|e| StorageError::from_io(path, e))?;
        file.write_all(data)?;
        if self.sync_writes {
            file.sync_all()?;
        }
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> StorageResult<()> {
        if !from.exists() {
            return Err(StorageError::NotFound {
                path: from.to_path_buf(),
            });
        }
        if from.is_dir() && to.exists() {
            return Err(StorageError::AlreadyExists {
                path: to.to_path_buf(),
            });
        }
        fs::rename(from, to)?;
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> StorageResult<()> {
        if path.is_dir() {
            return Err(StorageError::IsADirectory {
                path: path.to_path_buf(),
            });
        }
        fs::remove_file(path).map_err(|e| StorageError::from_io(path, e))
    }

    fn create_dir(&self, path: &Path) -> StorageResult<()> {
        fs::create_dir(path).map_err(|e| StorageError::from_io(path, e))
    }

    fn create_dir_all(&self, path: &Path) -> StorageResult<()> {
        fs::create_dir_all(path).map_err(|e| StorageError::from_io(path, e))
    }

    fn remove_dir(&self, path: &Path) -> StorageResult<()> {
        if !path.is_dir() {
            return Err(if path.exists() {
                StorageError::NotADirectory {
                    path: path.to_path_buf(),
                }
            } else {
                StorageError::NotFound {
                    path: path.to_path_buf(),
                }
            });
        }
        if fs::read_dir(path)?.next().is_some() {
            return Err(StorageError::DirectoryNotEmpty {
                path: path.to_path_buf(),
            });
        }
        fs::remove_dir(path).map_err(|e| StorageError::from_io(path, e))
    }

    fn read_dir(&self, path: &Path) -> StorageResult<Vec<DirEntry>> {
        if path.exists() && !path.is_dir() {
            return Err(StorageError::NotADirectory {
                path: path.to_path_buf(),
            });
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(path).map_err(|e| StorageError::from_io(path, e))? {
            let entry = entry?;
            entries.push(DirEntry {
                path: entry.path(),
                is_dir: entry.file_type()?.is_dir(),
            });
        }
        // OS enumeration order is unspecified; sort for a stable discovery order.
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    fn metadata(&self, path: &Path) -> StorageResult<Metadata> {
        let meta = fs::metadata(path).map_err(|e| StorageError::from_io(path, e))?;
        Ok(Metadata {
            is_dir: meta.is_dir(),
            len: if meta.is_dir() { 0 } else { meta.len() },
            modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        })
    }
}
