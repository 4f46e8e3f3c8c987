//! On-disk naming conventions.
//!
//! ```text
//! <group>/
//! ├─ Foo            # instance payload (binary unless text magic)
//! ├─ Foo.xdm        # instance meta
//! ├─ Foo.thumb      # instance blob "thumb"
//! ├─ Sub/           # child group
//! ├─ Shared.xgl     # link to a group directory
//! ├─ Alias.xil      # link to an instance stem
//! ├─ Foo~           # backup, only while a commit is in flight
//! └─ Foo~new        # replacement being written, only while in flight
//! ```

use crate::error::{CoreError, CoreResult};
use localdb_storage::FileSystem;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Extension of instance meta files.
pub const META_EXTENSION: &str = "xdm";
/// Extension of group link files.
pub const GROUP_LINK_EXTENSION: &str = "xgl";
/// Extension of instance link files.
pub const INSTANCE_LINK_EXTENSION: &str = "xil";
/// Suffix of backup files.
pub const BACKUP_SUFFIX: char = '~';
/// Suffix of replacement files written before the final rename.
pub const TEMP_SUFFIX: &str = "~new";

const RESERVED: [&str; 3] = [META_EXTENSION, GROUP_LINK_EXTENSION, INSTANCE_LINK_EXTENSION];

/// Appends `suffix` to the final component of `path`.
#[must_use]
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// `<stem>.<extension>` without touching dots already in the stem.
#[must_use]
pub fn with_extension(stem: &Path, extension: &str) -> PathBuf {
    with_suffix(stem, &format!(".{extension}"))
}

/// Meta file of an instance.
#[must_use]
pub fn meta_path(stem: &Path) -> PathBuf {
    with_extension(stem, META_EXTENSION)
}

/// Payload file of an instance.
#[must_use]
pub fn object_path(stem: &Path) -> PathBuf {
    stem.to_path_buf()
}

/// Blob file of an instance.
#[must_use]
pub fn data_path(stem: &Path, data_name: &str) -> PathBuf {
    with_extension(stem, data_name)
}

/// Temp file a replacement for `path` is written to.
#[must_use]
pub fn temp_path(path: &Path) -> PathBuf {
    with_suffix(path, TEMP_SUFFIX)
}

/// First unused backup name for `path`: `path~`, then `path~~`, ...
#[must_use]
pub fn fresh_backup_path(fs: &dyn FileSystem, path: &Path) -> PathBuf {
    let mut candidate = with_suffix(path, "~");
    while fs.exists(&candidate) {
        candidate = with_suffix(&candidate, "~");
    }
    candidate
}

/// Fails if `path` is already claimed within its group.
///
/// A child name is taken by an entry of that name (payload or directory),
/// a meta file, or a link of either kind.
///
/// # Errors
///
/// Returns `AlreadyExists` naming the first occupied path.
pub fn ensure_free(fs: &dyn FileSystem, path: &Path) -> CoreResult<()> {
    let taken = [
        path.to_path_buf(),
        meta_path(path),
        with_extension(path, GROUP_LINK_EXTENSION),
        with_extension(path, INSTANCE_LINK_EXTENSION),
    ];
    match taken.iter().find(|p| fs.exists(p)) {
        Some(existing) => Err(CoreError::already_exists(existing)),
        None => Ok(()),
    }
}

/// True for in-flight artifacts: backups and temp files.
#[must_use]
pub fn is_transient(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(BACKUP_SUFFIX) || n.ends_with(TEMP_SUFFIX))
}

/// Checks that `name` can be used as a group, instance or blob name.
///
/// # Errors
///
/// Returns `InvalidName` for empty names, path separators, dots,
/// tildes and the reserved extensions.
pub fn validate_name(name: &str) -> CoreResult<()> {
    if name.is_empty() {
        return Err(CoreError::invalid_name(name, "empty"));
    }
    if name.contains(['/', '\\']) {
        return Err(CoreError::invalid_name(name, "contains a path separator"));
    }
    if name.contains('.') {
        return Err(CoreError::invalid_name(name, "contains a dot"));
    }
    if name.contains(BACKUP_SUFFIX) {
        return Err(CoreError::invalid_name(name, "contains a tilde"));
    }
    if RESERVED.contains(&name) {
        return Err(CoreError::invalid_name(name, "reserved extension"));
    }
    Ok(())
}

/// Returns the final component of `path` as UTF-8.
#[must_use]
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use localdb_storage::InMemoryFileSystem;

    #[test]
    fn instance_paths() {
        let stem = Path::new("/db/Foo");
        assert_eq!(meta_path(stem), PathBuf::from("/db/Foo.xdm"));
        assert_eq!(object_path(stem), PathBuf::from("/db/Foo"));
        assert_eq!(data_path(stem, "thumb"), PathBuf::from("/db/Foo.thumb"));
        assert_eq!(temp_path(stem), PathBuf::from("/db/Foo~new"));
    }

    #[test]
    fn backup_names_skip_taken_ones() {
        let fs = InMemoryFileSystem::new();
        fs.create_dir(Path::new("/db")).unwrap();
        let path = Path::new("/db/Foo.xdm");

        assert_eq!(fresh_backup_path(&fs, path), PathBuf::from("/db/Foo.xdm~"));
        fs.write(Path::new("/db/Foo.xdm~"), b"").unwrap();
        assert_eq!(fresh_backup_path(&fs, path), PathBuf::from("/db/Foo.xdm~~"));
    }

    #[test]
    fn names_are_claimed_by_entries_metas_and_links() {
        let fs = InMemoryFileSystem::new();
        fs.create_dir_all(Path::new("/db/Sub")).unwrap();
        fs.write(Path::new("/db/Foo.xdm"), b"").unwrap();
        fs.write(Path::new("/db/Shared.xgl"), b"").unwrap();
        fs.write(Path::new("/db/Alias.xil"), b"").unwrap();

        for (name, occupied) in [
            ("Sub", "/db/Sub"),
            ("Foo", "/db/Foo.xdm"),
            ("Shared", "/db/Shared.xgl"),
            ("Alias", "/db/Alias.xil"),
        ] {
            match ensure_free(&fs, &Path::new("/db").join(name)) {
                Err(CoreError::AlreadyExists { path }) => assert_eq!(path, Path::new(occupied)),
                other => panic!("{name}: unexpected {other:?}"),
            }
        }
        assert!(ensure_free(&fs, Path::new("/db/Free")).is_ok());
    }

    #[test]
    fn transient_detection() {
        assert!(is_transient(Path::new("/db/Foo~")));
        assert!(is_transient(Path::new("/db/Foo.xdm~~")));
        assert!(is_transient(Path::new("/db/Foo~new")));
        assert!(!is_transient(Path::new("/db/Foo.xdm")));
    }

    #[test]
    fn name_validation() {
        assert!(validate_name("Foo_1").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("a/b").is_err());
        assert!(validate_name("a.b").is_err());
        assert!(validate_name("a~").is_err());
        assert!(validate_name("xdm").is_err());
    }
}
