//! In-memory filesystem for testing.

use crate::backend::{DirEntry, FileSystem, Metadata};
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[derive(Debug, Clone)]
enum Node {
    File { data: Vec<u8>, modified: SystemTime },
    Dir { modified: SystemTime },
}

/// An in-memory filesystem.
///
/// Paths are kept exactly as given; a path with no parent (`/` or the
/// empty path) is treated as an always-present root directory. It is
/// suitable for:
/// - Unit tests
/// - Property tests that compare whole-tree snapshots
///
/// # Thread Safety
///
/// This filesystem is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use localdb_storage::{FileSystem, InMemoryFileSystem};
/// use std::path::Path;
///
/// let fs = InMemoryFileSystem::new();
/// fs.create_dir_all(Path::new("/db")).unwrap();
/// fs.write(Path::new("/db/object"), b"data").unwrap();
/// assert_eq!(fs.read(Path::new("/db/object")).unwrap(), b"data");
/// ```
#[derive(Debug, Default)]
pub struct InMemoryFileSystem {
    nodes: RwLock<BTreeMap<PathBuf, Node>>,
}

fn is_root(path: &Path) -> bool {
    path.as_os_str().is_empty() || path.parent().is_none()
}

fn not_found(path: &Path) -> StorageError {
    StorageError::NotFound {
        path: path.to_path_buf(),
    }
}

impl InMemoryFileSystem {
    /// Creates a new empty filesystem.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every file with its content, keyed by path.
    ///
    /// Directories are listed with `None`. Useful for comparing the
    /// whole tree before and after an operation.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<PathBuf, Option<Vec<u8>>> {
        self.nodes
            .read()
            .iter()
            .map(|(path, node)| {
                let content = match node {
                    Node::File { data, .. } => Some(data.clone()),
                    Node::Dir { .. } => None,
                };
                (path.clone(), content)
            })
            .collect()
    }

    /// Returns the number of files and directories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    /// Returns true if nothing has been created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }

    fn dir_exists(nodes: &BTreeMap<PathBuf, Node>, path: &Path) -> bool {
        is_root(path) || matches!(nodes.get(path), Some(Node::Dir { .. }))
    }

    fn ensure_parent(nodes: &BTreeMap<PathBuf, Node>, path: &Path) -> StorageResult<()> {
        match path.parent() {
            None => Ok(()),
            Some(parent) if Self::dir_exists(nodes, parent) => Ok(()),
            Some(parent) if nodes.contains_key(parent) => Err(StorageError::NotADirectory {
                path: parent.to_path_buf(),
            }),
            Some(parent) => Err(not_found(parent)),
        }
    }
}

impl FileSystem for InMemoryFileSystem {
    fn read(&self, path: &Path) -> StorageResult<Vec<u8>> {
        match self.nodes.read().get(path) {
            Some(Node::File { data, .. }) => Ok(data.clone()),
            Some(Node::Dir { .. }) => Err(StorageError::IsADirectory {
                path: path.to_path_buf(),
            }),
            None => Err(not_found(path)),
        }
    }

    fn write(&self, path: &Path, data: &[u8]) -> StorageResult<()> {
        let mut nodes = self.nodes.write();
        Self::ensure_parent(&nodes, path)?;
        if matches!(nodes.get(path), Some(Node::Dir { .. })) {
            return Err(StorageError::IsADirectory {
                path: path.to_path_buf(),
            });
        }
        nodes.insert(
            path.to_path_buf(),
            Node::File {
                data: data.to_vec(),
                modified: SystemTime::now(),
            },
        );
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> StorageResult<()> {
        let mut nodes = self.nodes.write();
        let node = nodes.get(from).cloned().ok_or_else(|| not_found(from))?;
        Self::ensure_parent(&nodes, to)?;

        match node {
            Node::File { .. } => {
                if matches!(nodes.get(to), Some(Node::Dir { .. })) {
                    return Err(StorageError::IsADirectory {
                        path: to.to_path_buf(),
                    });
                }
                nodes.remove(from);
                nodes.insert(to.to_path_buf(), node);
            }
            Node::Dir { .. } => {
                if nodes.contains_key(to) {
                    return Err(StorageError::AlreadyExists {
                        path: to.to_path_buf(),
                    });
                }
                if to.starts_with(from) {
                    return Err(StorageError::Io(std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        "cannot move a directory into itself",
                    )));
                }
                let moved: Vec<PathBuf> = nodes
                    .keys()
                    .filter(|p| p.starts_with(from))
                    .cloned()
                    .collect();
                for old in moved {
                    if let Some(n) = nodes.remove(&old) {
                        let suffix = old.strip_prefix(from).unwrap_or(Path::new(""));
                        let new = if suffix.as_os_str().is_empty() {
                            to.to_path_buf()
                        } else {
                            to.join(suffix)
                        };
                        nodes.insert(new, n);
                    }
                }
            }
        }
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> StorageResult<()> {
        let mut nodes = self.nodes.write();
        match nodes.get(path) {
            Some(Node::File { .. }) => {
                nodes.remove(path);
                Ok(())
            }
            Some(Node::Dir { .. }) => Err(StorageError::IsADirectory {
                path: path.to_path_buf(),
            }),
            None => Err(not_found(path)),
        }
    }

    fn create_dir(&self, path: &Path) -> StorageResult<()> {
        let mut nodes = self.nodes.write();
        if is_root(path) || nodes.contains_key(path) {
            return Err(StorageError::AlreadyExists {
                path: path.to_path_buf(),
            });
        }
        Self::ensure_parent(&nodes, path)?;
        nodes.insert(
            path.to_path_buf(),
            Node::Dir {
                modified: SystemTime::now(),
            },
        );
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> StorageResult<()> {
        let mut nodes = self.nodes.write();
        let mut missing: Vec<&Path> = path
            .ancestors()
            .take_while(|p| !is_root(p))
            .filter(|p| !nodes.contains_key(*p))
            .collect();
        missing.reverse();

        for dir in missing {
            Self::ensure_parent(&nodes, dir)?;
            nodes.insert(
                dir.to_path_buf(),
                Node::Dir {
                    modified: SystemTime::now(),
                },
            );
        }

        if Self::dir_exists(&nodes, path) {
            Ok(())
        } else {
            Err(StorageError::NotADirectory {
                path: path.to_path_buf(),
            })
        }
    }

    fn remove_dir(&self, path: &Path) -> StorageResult<()> {
        let mut nodes = self.nodes.write();
        match nodes.get(path) {
            Some(Node::Dir { .. }) => {
                if nodes.keys().any(|p| p.parent() == Some(path)) {
                    return Err(StorageError::DirectoryNotEmpty {
                        path: path.to_path_buf(),
                    });
                }
                nodes.remove(path);
                Ok(())
            }
            Some(Node::File { .. }) => Err(StorageError::NotADirectory {
                path: path.to_path_buf(),
            }),
            None => Err(not_found(path)),
        }
    }

    fn read_dir(&self, path: &Path) -> StorageResult<Vec<DirEntry>> {
        let nodes = self.nodes.read();
        if !Self::dir_exists(&nodes, path) {
            return Err(if nodes.contains_key(path) {
                StorageError::NotADirectory {
                    path: path.to_path_buf(),
                }
            } else {
                not_found(path)
            });
        }

        Ok(nodes
            .iter()
            .filter(|(p, _)| p.parent() == Some(path))
            .map(|(p, node)| DirEntry {
                path: p.clone(),
                is_dir: matches!(node, Node::Dir { .. }),
            })
            .collect())
    }

    fn metadata(&self, path: &Path) -> StorageResult<Metadata> {
        if is_root(path) {
            return Ok(Metadata {
                is_dir: true,
                len: 0,
                modified: SystemTime::UNIX_EPOCH,
            });
        }
        match self.nodes.read().get(path) {
            Some(Node::File { data, modified }) => Ok(Metadata {
                is_dir: false,
                len: data.len() as u64,
                modified: *modified,
            }),
            Some(Node::Dir { modified }) => Ok(Metadata {
                is_dir: true,
                len: 0,
                modified: *modified,
            }),
            None => Err(not_found(path)),
        }
    }
}
