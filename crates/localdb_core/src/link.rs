//! Link records (`.xgl` / `.xil`).

use crate::error::CoreResult;
use crate::physical;
use localdb_codec::Format;
use localdb_storage::FileSystem;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Indirection to another group directory or instance stem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLink {
    /// Target path. Relative targets are relative to the link's directory.
    pub path: PathBuf,
}

impl FileLink {
    /// Creates a link to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reads the link stored at `link_path`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or a codec error.
    pub fn read(fs: &dyn FileSystem, link_path: &Path) -> CoreResult<Self> {
        physical::read_object(fs, link_path)
    }

    /// Writes this link to `link_path`.
    ///
    /// # Errors
    ///
    /// Returns a codec or storage error.
    pub fn write(&self, fs: &dyn FileSystem, link_path: &Path, format: Format) -> CoreResult<()> {
        physical::write_object(fs, link_path, self, format)
    }

    /// Resolves the target of a link stored at `link_path`.
    ///
    /// Exactly one level: the result is never itself dereferenced.
    /// `..` components are folded lexically.
    #[must_use]
    pub fn resolve(&self, link_path: &Path) -> PathBuf {
        if self.path.is_absolute() {
            return normalize(&self.path);
        }
        match link_path.parent() {
            Some(dir) => normalize(&dir.join(&self.path)),
            None => normalize(&self.path),
        }
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}
