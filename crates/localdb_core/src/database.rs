//! Database entry point.

use crate::config::Config;
use crate::context::Context;
use crate::error::{CoreError, CoreResult};
use crate::group::Group;
use localdb_storage::{FileSystem, InMemoryFileSystem, OsFileSystem};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// An open store rooted at one directory.
///
/// The database itself holds no state besides its [`Context`]; all data
/// lives in the directory tree and is reached through [`Database::root_group`].
#[derive(Debug, Clone)]
pub struct Database {
    context: Context,
    root: PathBuf,
    config: Config,
}

impl Database {
    /// Opens a database with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the root cannot be created or is not a directory.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use localdb_core::Database;
    /// use std::path::Path;
    ///
    /// let db = Database::open(Path::new("assets"))?;
    /// let root = db.root_group();
    /// ```
    pub fn open(path: &Path) -> CoreResult<Self> {
        Self::open_with_config(path, Config::default())
    }

    /// Opens a database on the host filesystem.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the root is missing and `create_if_missing` is
    /// off, `InvalidOperation` if it is not a directory or named locks are
    /// unavailable, or a storage error.
    pub fn open_with_config(path: &Path, config: Config) -> CoreResult<Self> {
        Self::open_with_fs(Arc::new(OsFileSystem::new()), path, config)
    }

    /// Opens a database over an arbitrary filesystem.
    ///
    /// # Errors
    ///
    /// Same as [`Database::open_with_config`].
    pub fn open_with_fs(fs: Arc<dyn FileSystem>, path: &Path, config: Config) -> CoreResult<Self> {
        if !fs.is_dir(path) {
            if fs.exists(path) {
                return Err(CoreError::invalid_operation(format!(
                    "database root {} is not a directory",
                    path.display()
                )));
            }
            if !config.create_if_missing {
                return Err(CoreError::not_found("database root", path));
            }
            fs.create_dir_all(path)?;
            tracing::info!(root = %path.display(), "created database root");
        }

        let context = Context::from_config(fs, &config)?;
        tracing::debug!(root = %path.display(), format = %context.format(), "database opened");
        Ok(Self {
            context,
            root: path.to_path_buf(),
            config,
        })
    }

    /// Opens an empty in-memory database rooted at `/`.
    ///
    /// # Errors
    ///
    /// Only fails if the configuration requests unavailable named locks.
    pub fn open_in_memory() -> CoreResult<Self> {
        Self::open_with_fs(
            Arc::new(InMemoryFileSystem::new()),
            Path::new("/"),
            Config::default(),
        )
    }

    /// Opens the database described by a connection string.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` for a malformed string or a missing
    /// `groupPath`, or any error of [`Database::open_with_config`].
    pub fn from_connection_string(s: &str) -> CoreResult<Self> {
        let config: Config = s.parse()?;
        let root = config
            .group_path
            .clone()
            .ok_or_else(|| CoreError::invalid_operation("connection string: groupPath is required"))?;
        Self::open_with_config(&root, config)
    }

    /// The group at the database root.
    #[must_use]
    pub fn root_group(&self) -> Group {
        Group::new(self.context.clone(), self.root.clone(), false)
    }

    /// Root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Shared context.
    #[must_use]
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Configuration the database was opened with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
}
