//! Fault-injecting filesystem wrapper.
//!
//! Wraps any [`FileSystem`] and fails chosen mutating operations. Every
//! mutation is recorded, so tests can assert exactly which renames,
//! writes and removals a commit performed.
//!
//! ## Fault Modes
//!
//! - **Nth mutation**: the mutation with the given zero-based index fails
//!   once; later mutations succeed again
//! - **Path**: every mutation whose source or destination equals a path
//!   fails until cleared

use crate::backend::{DirEntry, FileSystem, Metadata};
use crate::error::{StorageError, StorageResult};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Kind of a mutating filesystem operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FsOp {
    /// `write`
    Write,
    /// `rename`
    Rename,
    /// `remove_file`
    RemoveFile,
    /// `create_dir` / `create_dir_all`
    CreateDir,
    /// `remove_dir`
    RemoveDir,
}

impl FsOp {
    fn name(self) -> &'static str {
        match self {
            Self::Write => "write",
            Self::Rename => "rename",
            Self::RemoveFile => "remove_file",
            Self::CreateDir => "create_dir",
            Self::RemoveDir => "remove_dir",
        }
    }
}

/// One recorded mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedOp {
    /// The operation.
    pub op: FsOp,
    /// The path operated on (the source for renames).
    pub path: PathBuf,
    /// The destination of a rename.
    pub to: Option<PathBuf>,
    /// Whether the operation was failed by injection.
    pub injected: bool,
}

/// A filesystem wrapper that can simulate I/O failures.
#[derive(Debug)]
pub struct FaultInjectingFileSystem {
    inner: Arc<dyn FileSystem>,
    mutations: AtomicUsize,
    fail_at: AtomicUsize,
    failing_paths: Mutex<Vec<PathBuf>>,
    log: Mutex<Vec<RecordedOp>>,
}

impl FaultInjectingFileSystem {
    /// Wraps an inner filesystem. No faults are armed initially.
    pub fn new(inner: Arc<dyn FileSystem>) -> Self {
        Self {
            inner,
            mutations: AtomicUsize::new(0),
            fail_at: AtomicUsize::new(usize::MAX),
            failing_paths: Mutex::new(Vec::new()),
            log: Mutex::new(Vec::new()),
        }
    }

    /// Fails the mutation with zero-based index `index`, counted from the
    /// last [`reset`](Self::reset).
    pub fn fail_at_mutation(&self, index: usize) {
        self.fail_at.store(index, Ordering::SeqCst);
    }

    /// Fails every mutation that touches `path`.
    pub fn fail_path(&self, path: impl Into<PathBuf>) {
        self.failing_paths.lock().push(path.into());
    }

    /// Disarms all faults. The mutation counter and log are kept.
    pub fn clear_faults(&self) {
        self.fail_at.store(usize::MAX, Ordering::SeqCst);
        self.failing_paths.lock().clear();
    }

    /// Disarms all faults, zeroes the mutation counter and clears the log.
    pub fn reset(&self) {
        self.clear_faults();
        self.mutations.store(0, Ordering::SeqCst);
        self.log.lock().clear();
    }

    /// Returns the number of mutations attempted since the last reset.
    #[must_use]
    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    /// Returns every recorded mutation in order.
    #[must_use]
    pub fn operations(&self) -> Vec<RecordedOp> {
        self.log.lock().clone()
    }

    /// Returns how many successful mutations of kind `op` were recorded.
    #[must_use]
    pub fn count(&self, op: FsOp) -> usize {
        self.log
            .lock()
            .iter()
            .filter(|r| r.op == op && !r.injected)
            .count()
    }

    /// Returns the wrapped filesystem.
    #[must_use]
    pub fn inner(&self) -> &Arc<dyn FileSystem> {
        &self.inner
    }

    fn check(&self, op: FsOp, path: &Path, to: Option<&Path>) -> StorageResult<()> {
        let index = self.mutations.fetch_add(1, Ordering::SeqCst);

        let injected = if index == self.fail_at.load(Ordering::SeqCst) {
            self.fail_at.store(usize::MAX, Ordering::SeqCst);
            true
        } else {
            self.failing_paths
                .lock()
                .iter()
                .any(|p| p == path || Some(p.as_path()) == to)
        };

        self.log.lock().push(RecordedOp {
            op,
            path: path.to_path_buf(),
            to: to.map(Path::to_path_buf),
            injected,
        });

        if injected {
            Err(StorageError::Injected {
                op: op.name(),
                path: path.to_path_buf(),
            })
        } else {
            Ok(())
        }
    }
}

impl FileSystem for FaultInjectingFileSystem {
    fn read(&self, path: &Path) -> StorageResult<Vec<u8>> {
        self.inner.read(path)
    }

    fn read_prefix(&self, path: &Path, len: usize) -> StorageResult<Vec<u8>> {
        self.inner.read_prefix(path, len)
    }

    fn write(&self, path: &Path, data: &[u8]) -> StorageResult<()> {
        self.check(FsOp::Write, path, None)?;
        self.inner.write(path, data)
    }

    fn rename(&self, from: &Path, to: &Path) -> StorageResult<()> {
        self.check(FsOp::Rename, from, Some(to))?;
        self.inner.rename(from, to)
    }

    fn remove_file(&self, path: &Path) -> StorageResult<()> {
        self.check(FsOp::RemoveFile, path, None)?;
        self.inner.remove_file(path)
    }

    fn create_dir(&self, path: &Path) -> StorageResult<()> {
        self.check(FsOp::CreateDir, path, None)?;
        self.inner.create_dir(path)
    }

    fn create_dir_all(&self, path: &Path) -> StorageResult<()> {
        self.check(FsOp::CreateDir, path, None)?;
        self.inner.create_dir_all(path)
    }

    fn remove_dir(&self, path: &Path) -> StorageResult<()> {
        self.check(FsOp::RemoveDir, path, None)?;
        self.inner.remove_dir(path)
    }

    fn read_dir(&self, path: &Path) -> StorageResult<Vec<DirEntry>> {
        self.inner.read_dir(path)
    }

    fn metadata(&self, path: &Path) -> StorageResult<Metadata> {
        self.inner.metadata(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryFileSystem;

    fn faulty() -> FaultInjectingFileSystem {
        let inner = InMemoryFileSystem::new();
        inner.create_dir_all(Path::new("/db")).unwrap();
        FaultInjectingFileSystem::new(Arc::new(inner))
    }

    #[test]
    fn passes_through_without_faults() {
        let fs = faulty();
        fs.write(Path::new("/db/a"), b"x").unwrap();
        fs.rename(Path::new("/db/a"), Path::new("/db/b")).unwrap();

        assert_eq!(fs.read(Path::new("/db/b")).unwrap(), b"x");
        assert_eq!(fs.mutation_count(), 2);
        assert_eq!(fs.count(FsOp::Rename), 1);
    }

    #[test]
    fn nth_mutation_fails_once() {
        let fs = faulty();
        fs.fail_at_mutation(1);

        fs.write(Path::new("/db/a"), b"x").unwrap();
        let result = fs.write(Path::new("/db/b"), b"y");
        assert!(matches!(result, Err(StorageError::Injected { op: "write", .. })));
        assert!(!fs.exists(Path::new("/db/b")));

        fs.write(Path::new("/db/b"), b"y").unwrap();
        assert!(fs.exists(Path::new("/db/b")));
    }

    #[test]
    fn failing_path_matches_rename_destination() {
        let fs = faulty();
        fs.write(Path::new("/db/a"), b"x").unwrap();
        fs.fail_path("/db/b");

        assert!(fs.rename(Path::new("/db/a"), Path::new("/db/b")).is_err());
        assert!(fs.exists(Path::new("/db/a")));

        fs.clear_faults();
        fs.rename(Path::new("/db/a"), Path::new("/db/b")).unwrap();
    }

    #[test]
    fn log_records_injected_ops() {
        let fs = faulty();
        fs.fail_at_mutation(0);
        let _ = fs.remove_file(Path::new("/db/a"));

        let ops = fs.operations();
        assert_eq!(ops.len(), 1);
        assert!(ops[0].injected);
        assert_eq!(fs.count(FsOp::RemoveFile), 0);

        fs.reset();
        assert!(fs.operations().is_empty());
        assert_eq!(fs.mutation_count(), 0);
    }
}
