//! Cross-cutting state shared by groups, instances and transactions.

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::lock::{LockFactory, NoopLockFactory};
use localdb_codec::Format;
use localdb_storage::FileSystem;
use std::sync::Arc;

/// Everything an action needs besides its own arguments.
///
/// Cloning is cheap; all clones share the same filesystem and lock factory.
#[derive(Debug, Clone)]
pub struct Context {
    fs: Arc<dyn FileSystem>,
    format: Format,
    locks: Arc<dyn LockFactory>,
}

impl Context {
    /// Creates a context writing binary objects without named locks.
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            format: Format::Binary,
            locks: Arc::new(NoopLockFactory),
        }
    }

    /// Creates a context as described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if named locks are requested but unavailable.
    pub fn from_config(fs: Arc<dyn FileSystem>, config: &Config) -> CoreResult<Self> {
        let context = Self::new(fs).with_format(Format::preferred(config.prefer_binary));
        if !config.named_locks {
            return Ok(context);
        }
        Ok(context.with_locks(named_lock_factory(config)?))
    }

    /// Replaces the format used for new files.
    #[must_use]
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Replaces the lock factory.
    #[must_use]
    pub fn with_locks(mut self, locks: Arc<dyn LockFactory>) -> Self {
        self.locks = locks;
        self
    }

    /// The filesystem.
    #[must_use]
    pub fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    /// A shared handle to the filesystem.
    #[must_use]
    pub fn fs_handle(&self) -> Arc<dyn FileSystem> {
        Arc::clone(&self.fs)
    }

    /// Format used when writing objects, meta and links.
    #[must_use]
    pub fn format(&self) -> Format {
        self.format
    }

    /// The named-lock factory.
    #[must_use]
    pub fn locks(&self) -> &dyn LockFactory {
        self.locks.as_ref()
    }
}

#[cfg(feature = "named-lock")]
fn named_lock_factory(config: &Config) -> CoreResult<Arc<dyn LockFactory>> {
    let dir = config
        .lock_dir
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("localdb-locks"));
    Ok(Arc::new(crate::lock::FileLockFactory::new(
        dir,
        config.lock_timeout,
    )?))
}

#[cfg(not(feature = "named-lock"))]
fn named_lock_factory(_config: &Config) -> CoreResult<Arc<dyn LockFactory>> {
    Err(CoreError::invalid_operation(
        "named locks requested but the `named-lock` feature is disabled",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use localdb_storage::InMemoryFileSystem;

    #[test]
    fn format_follows_config() {
        let fs: Arc<dyn FileSystem> = Arc::new(InMemoryFileSystem::new());
        let text = Context::from_config(Arc::clone(&fs), &Config::new().prefer_binary(false)).unwrap();
        let binary = Context::from_config(fs, &Config::new()).unwrap();

        assert_eq!(text.format(), Format::Text);
        assert_eq!(binary.format(), Format::Binary);
    }

    #[cfg(not(feature = "named-lock"))]
    #[test]
    fn named_locks_need_feature() {
        let fs: Arc<dyn FileSystem> = Arc::new(InMemoryFileSystem::new());
        let result = Context::from_config(fs, &Config::new().named_locks(true));
        assert!(matches!(result, Err(CoreError::InvalidOperation { .. })));
    }
}
