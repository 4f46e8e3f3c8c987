//! Rename-preserve building blocks shared by the concrete actions.
//!
//! Every mutation an action performs is one of two shapes:
//!
//! - [`Preserved`]: move a file aside to a `~` backup; restore renames it
//!   back, discard deletes it.
//! - [`Replacement`]: write a buffer to `<dest>~new`, preserve the old
//!   destination (if any), then rename the temp file over it.

use crate::error::{CoreError, CoreResult};
use crate::layout;
use localdb_storage::FileSystem;
use std::path::{Path, PathBuf};

/// A file moved aside to a backup name.
#[derive(Debug)]
pub(crate) struct Preserved {
    original: PathBuf,
    backup: PathBuf,
}

impl Preserved {
    /// Renames `path` to the first free backup name.
    pub(crate) fn preserve(fs: &dyn FileSystem, path: &Path) -> CoreResult<Self> {
        let backup = layout::fresh_backup_path(fs, path);
        fs.rename(path, &backup)?;
        Ok(Self {
            original: path.to_path_buf(),
            backup,
        })
    }

    /// Preserves every path in order; on failure restores the ones already moved.
    pub(crate) fn preserve_all(fs: &dyn FileSystem, paths: &[PathBuf]) -> CoreResult<Vec<Self>> {
        let mut moved = Vec::with_capacity(paths.len());
        for path in paths {
            match Self::preserve(fs, path) {
                Ok(p) => moved.push(p),
                Err(e) => return Err(revert_or_wrap(e, restore_all(fs, &mut moved))),
            }
        }
        Ok(moved)
    }

    /// Moves the backup back to the original name.
    pub(crate) fn restore(&self, fs: &dyn FileSystem) -> CoreResult<()> {
        fs.rename(&self.backup, &self.original)?;
        Ok(())
    }

    /// Deletes the backup.
    pub(crate) fn discard(&self, fs: &dyn FileSystem) -> CoreResult<()> {
        fs.remove_file(&self.backup)?;
        Ok(())
    }

    pub(crate) fn backup(&self) -> &Path {
        &self.backup
    }
}

/// Restores `moved` in reverse order, popping each one that succeeds.
///
/// Stops at the first failure so the remaining entries still describe
/// what is left on disk.
pub(crate) fn restore_all(fs: &dyn FileSystem, moved: &mut Vec<Preserved>) -> CoreResult<()> {
    while let Some(last) = moved.last() {
        last.restore(fs)?;
        moved.pop();
    }
    Ok(())
}

/// Discards every backup, logging failures.
pub(crate) fn discard_all(fs: &dyn FileSystem, preserved: &[Preserved]) {
    for p in preserved {
        if let Err(e) = p.discard(fs) {
            tracing::warn!(backup = %p.backup().display(), error = %e, "failed to delete backup");
        }
    }
}

/// Returns `error`, marked as leaving partial changes if `revert` failed.
pub(crate) fn revert_or_wrap(error: CoreError, revert: CoreResult<()>) -> CoreError {
    match revert {
        Ok(()) => error,
        Err(undo) => error.with_failed_revert(undo),
    }
}

/// A destination overwritten through a temp file.
#[derive(Debug)]
pub(crate) struct Replacement {
    path: PathBuf,
    previous: Option<Preserved>,
}

impl Replacement {
    /// Writes `buffer` to `path`, keeping any previous file as a backup.
    ///
    /// On failure nothing is left behind except possibly the temp file.
    pub(crate) fn apply(fs: &dyn FileSystem, path: &Path, buffer: &[u8]) -> CoreResult<Self> {
        let temp = layout::temp_path(path);
        fs.write(&temp, buffer)?;

        let previous = if fs.exists(path) {
            match Preserved::preserve(fs, path) {
                Ok(p) => Some(p),
                Err(e) => {
                    remove_temp(fs, &temp);
                    return Err(e);
                }
            }
        } else {
            None
        };

        if let Err(e) = fs.rename(&temp, path) {
            let restored = previous.as_ref().map_or(Ok(()), |p| p.restore(fs));
            remove_temp(fs, &temp);
            return Err(revert_or_wrap(e.into(), restored));
        }

        Ok(Self {
            path: path.to_path_buf(),
            previous,
        })
    }

    /// Puts the previous file back, or removes the new one if there was none.
    pub(crate) fn revert(&self, fs: &dyn FileSystem) -> CoreResult<()> {
        match &self.previous {
            Some(p) => p.restore(fs),
            None => {
                fs.remove_file(&self.path)?;
                Ok(())
            }
        }
    }

    /// Deletes the backup of the previous file, if any.
    pub(crate) fn discard(&self, fs: &dyn FileSystem) {
        if let Some(p) = &self.previous {
            discard_all(fs, std::slice::from_ref(p));
        }
    }
}

fn remove_temp(fs: &dyn FileSystem, temp: &Path) {
    if fs.exists(temp) {
        if let Err(e) = fs.remove_file(temp) {
            tracing::warn!(path = %temp.display(), error = %e, "failed to remove temp file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use localdb_storage::{FaultInjectingFileSystem, InMemoryFileSystem};
    use std::sync::Arc;

    fn fs() -> InMemoryFileSystem {
        let fs = InMemoryFileSystem::new();
        fs.create_dir(Path::new("/db")).unwrap();
        fs
    }

    #[test]
    fn preserve_restore() {
        let fs = fs();
        let path = Path::new("/db/a");
        fs.write(path, b"old").unwrap();

        let p = Preserved::preserve(&fs, path).unwrap();
        assert!(!fs.exists(path));
        assert_eq!(fs.read(Path::new("/db/a~")).unwrap(), b"old");

        p.restore(&fs).unwrap();
        assert_eq!(fs.read(path).unwrap(), b"old");
    }

    #[test]
    fn replacement_keeps_previous_until_discard() {
        let fs = fs();
        let path = Path::new("/db/a");
        fs.write(path, b"old").unwrap();

        let r = Replacement::apply(&fs, path, b"new").unwrap();
        assert_eq!(fs.read(path).unwrap(), b"new");
        assert_eq!(fs.read(Path::new("/db/a~")).unwrap(), b"old");
        assert!(!fs.exists(Path::new("/db/a~new")));

        r.discard(&fs);
        assert!(!fs.exists(Path::new("/db/a~")));
    }

    #[test]
    fn replacement_revert_without_previous_removes() {
        let fs = fs();
        let path = Path::new("/db/a");

        let r = Replacement::apply(&fs, path, b"new").unwrap();
        r.revert(&fs).unwrap();
        assert!(!fs.exists(path));
    }

    #[test]
    fn failed_final_rename_leaves_original() {
        let mem = Arc::new(fs());
        mem.write(Path::new("/db/a"), b"old").unwrap();
        let before = mem.snapshot();

        let faulty = FaultInjectingFileSystem::new(mem.clone());
        // write temp, preserve, rename temp
        faulty.fail_at_mutation(2);

        assert!(Replacement::apply(&faulty, Path::new("/db/a"), b"new").is_err());
        assert_eq!(mem.snapshot(), before);
    }

    #[test]
    fn preserve_all_reverts_on_failure() {
        let mem = Arc::new(fs());
        for name in ["a", "b", "c"] {
            mem.write(&Path::new("/db").join(name), name.as_bytes()).unwrap();
        }
        let before = mem.snapshot();

        let faulty = FaultInjectingFileSystem::new(mem.clone());
        faulty.fail_path("/db/c~");
        let paths: Vec<PathBuf> = ["a", "b", "c"].iter().map(|n| Path::new("/db").join(n)).collect();

        assert!(Preserved::preserve_all(&faulty, &paths).is_err());
        assert_eq!(mem.snapshot(), before);
    }

    #[test]
    fn preserve_all_reports_failed_restore() {
        let mem = Arc::new(fs());
        for name in ["a", "b", "c"] {
            mem.write(&Path::new("/db").join(name), name.as_bytes()).unwrap();
        }

        let faulty = FaultInjectingFileSystem::new(mem.clone());
        // a, b preserved; c fails; restoring b fails
        faulty.fail_path("/db/c~");
        faulty.fail_at_mutation(3);
        let paths: Vec<PathBuf> = ["a", "b", "c"].iter().map(|n| Path::new("/db").join(n)).collect();

        let err = Preserved::preserve_all(&faulty, &paths).unwrap_err();
        assert!(err.is_revert_failure(), "unexpected {err:?}");
        assert!(mem.exists(Path::new("/db/b~")));
    }
}
