//! Named transaction locks.
//!
//! A transaction may be guarded by a lock named after the instance guid.
//! Two strategies share one interface:
//!
//! - [`NoopLockFactory`]: no cross-process exclusion (default)
//! - `FileLockFactory`: advisory `fs2` file locks in a lock directory,
//!   available with the `named-lock` feature
//!
//! Locks are released when the guard is dropped.

use crate::error::CoreResult;
use std::fmt;

/// A held lock. Dropping it releases the lock.
pub trait LockGuard: Send + fmt::Debug {}

/// Produces named locks.
pub trait LockFactory: Send + Sync + fmt::Debug {
    /// Acquires the lock called `name`, waiting up to the factory's timeout.
    ///
    /// # Errors
    ///
    /// Returns `LockTimeout` if the lock stays held elsewhere, or an I/O error.
    fn acquire(&self, name: &str) -> CoreResult<Box<dyn LockGuard>>;
}

/// A factory whose locks never block.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLockFactory;

#[derive(Debug)]
struct NoopGuard;

impl LockGuard for NoopGuard {}

impl LockFactory for NoopLockFactory {
    fn acquire(&self, _name: &str) -> CoreResult<Box<dyn LockGuard>> {
        Ok(Box::new(NoopGuard))
    }
}

#[cfg(feature = "named-lock")]
pub use file_lock::FileLockFactory;

#[cfg(feature = "named-lock")]
mod file_lock {
    use super::{LockFactory, LockGuard};
    use crate::error::{CoreError, CoreResult};
    use fs2::FileExt;
    use std::fs::{self, File, OpenOptions};
    use std::path::PathBuf;
    use std::thread;
    use std::time::{Duration, Instant};

    const RETRY_INTERVAL: Duration = Duration::from_millis(10);

    /// Cross-process locks backed by `<dir>/<name>.lock` files.
    ///
    /// The locks are advisory: only processes that go through a
    /// `FileLockFactory` on the same directory exclude each other.
    #[derive(Debug, Clone)]
    pub struct FileLockFactory {
        dir: PathBuf,
        timeout: Duration,
    }

    impl FileLockFactory {
        /// Creates a factory, creating the lock directory if needed.
        ///
        /// # Errors
        ///
        /// Returns an I/O error if the directory cannot be created.
        pub fn new(dir: impl Into<PathBuf>, timeout: Duration) -> CoreResult<Self> {
            let dir = dir.into();
            fs::create_dir_all(&dir)?;
            Ok(Self { dir, timeout })
        }
    }

    #[derive(Debug)]
    struct FileLockGuard {
        file: File,
    }

    impl LockGuard for FileLockGuard {}

    impl Drop for FileLockGuard {
        fn drop(&mut self) {
            if let Err(e) = self.file.unlock() {
                tracing::warn!(error = %e, "failed to release named lock");
            }
        }
    }

    impl LockFactory for FileLockFactory {
        fn acquire(&self, name: &str) -> CoreResult<Box<dyn LockGuard>> {
            let path = self.dir.join(format!("{name}.lock"));
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(&path)?;

            let deadline = Instant::now() + self.timeout;
            loop {
                if file.try_lock_exclusive().is_ok() {
                    tracing::debug!(lock = name, "named lock acquired");
                    return Ok(Box::new(FileLockGuard { file }));
                }
                if Instant::now() >= deadline {
                    return Err(CoreError::LockTimeout {
                        name: name.to_string(),
                    });
                }
                thread::sleep(RETRY_INTERVAL);
            }
        }
    }

}
