//! Test fixtures and store helpers.
//!
//! Provides convenience functions for setting up test stores
//! and common test scenarios.

use localdb_codec::TEXT_MAGIC;
use localdb_core::{Config, Database, Group, Guid, Instance, Persistent};
use localdb_storage::{FaultInjectingFileSystem, FileSystem, InMemoryFileSystem};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Root directory of memory-backed test stores.
pub const MEMORY_ROOT: &str = "/db";

/// A small persistent type used across tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Free-form label.
    pub label: String,
    /// Arbitrary numbers.
    pub values: Vec<i64>,
}

impl Sample {
    /// Creates a sample.
    pub fn new(label: impl Into<String>, values: Vec<i64>) -> Self {
        Self {
            label: label.into(),
            values,
        }
    }
}

impl Persistent for Sample {
    const TYPE_NAME: &'static str = "testkit.Sample";
}

/// A test store with automatic cleanup.
pub struct TestStore {
    /// The database instance.
    pub db: Database,
    memory: Option<Arc<InMemoryFileSystem>>,
    faults: Option<Arc<FaultInjectingFileSystem>>,
    _temp_dir: Option<TempDir>,
}

impl TestStore {
    /// Creates a new in-memory test store rooted at [`MEMORY_ROOT`].
    pub fn memory() -> Self {
        Self::memory_with_config(Config::default())
    }

    /// Creates a new in-memory test store with a custom configuration.
    pub fn memory_with_config(config: Config) -> Self {
        let memory = Arc::new(InMemoryFileSystem::new());
        let db = Database::open_with_fs(memory.clone(), Path::new(MEMORY_ROOT), config)
            .expect("Failed to open in-memory store");
        Self {
            db,
            memory: Some(memory),
            faults: None,
            _temp_dir: None,
        }
    }

    /// Creates an in-memory store whose mutations can be made to fail.
    pub fn faulty() -> Self {
        let memory = Arc::new(InMemoryFileSystem::new());
        let faults = Arc::new(FaultInjectingFileSystem::new(memory.clone()));
        let db = Database::open_with_fs(faults.clone(), Path::new(MEMORY_ROOT), Config::default())
            .expect("Failed to open faulty store");
        faults.reset();
        Self {
            db,
            memory: Some(memory),
            faults: Some(faults),
            _temp_dir: None,
        }
    }

    /// Creates a new store in a temporary directory.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db = Database::open(&temp_dir.path().join("store")).expect("Failed to open file store");
        Self {
            db,
            memory: None,
            faults: None,
            _temp_dir: Some(temp_dir),
        }
    }

    /// Returns the store root.
    pub fn path(&self) -> PathBuf {
        self.db.root().to_path_buf()
    }

    /// Returns the whole tree, if memory-backed.
    pub fn snapshot(&self) -> Option<BTreeMap<PathBuf, Option<Vec<u8>>>> {
        self.memory.as_ref().map(|m| m.snapshot())
    }

    /// Returns the fault injector, if created with [`TestStore::faulty`].
    pub fn faults(&self) -> Option<&FaultInjectingFileSystem> {
        self.faults.as_deref()
    }

    /// Names of the files directly under the root, sorted.
    pub fn root_file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .db
            .context()
            .fs()
            .read_dir(self.db.root())
            .expect("Failed to list root")
            .into_iter()
            .filter(|e| !e.is_dir)
            .filter_map(|e| e.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        names.sort();
        names
    }
}

impl std::ops::Deref for TestStore {
    type Target = Database;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

/// Runs a test with a temporary in-memory store.
///
/// # Example
///
/// ```rust,ignore
/// use localdb_testkit::with_temp_store;
///
/// #[test]
/// fn my_test() {
///     with_temp_store(|store| {
///         store.root_group().create_group("Sub").unwrap();
///     });
/// }
/// ```
pub fn with_temp_store<F, R>(f: F) -> R
where
    F: FnOnce(&TestStore) -> R,
{
    let store = TestStore::memory();
    f(&store)
}

/// Runs a test with a store in a temporary directory.
pub fn with_file_store<F, R>(f: F) -> R
where
    F: FnOnce(&TestStore) -> R,
{
    let store = TestStore::file();
    f(&store)
}

/// Creates and commits an instance holding `payload` and `blobs`.
pub fn commit_instance(
    group: &Group,
    name: &str,
    guid: Guid,
    payload: &Sample,
    blobs: &[(&str, &[u8])],
) -> Instance {
    let mut instance = group
        .create_instance(name, guid)
        .expect("Failed to create instance");
    instance.write_object(payload).expect("Failed to queue payload");
    for (blob, bytes) in blobs {
        instance
            .write_data(blob, bytes.to_vec())
            .expect("Failed to queue blob");
    }
    instance
        .commit_transaction()
        .expect("Failed to commit instance");
    instance
}

/// Parses the JSON body of a text-encoded file, checking the magic header.
pub fn read_text_json(store: &TestStore, path: &Path) -> serde_json::Value {
    let bytes = store
        .context()
        .fs()
        .read(path)
        .expect("Failed to read text file");
    let body = bytes
        .strip_prefix(TEXT_MAGIC.as_slice())
        .expect("Missing text header");
    serde_json::from_slice(body).expect("Failed to parse JSON body")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_starts_with_root_only() {
        let store = TestStore::memory();
        assert!(store.root_group().children().unwrap().is_empty());
        assert_eq!(store.snapshot().unwrap().len(), 1);
    }

    #[test]
    fn file_store_root_exists() {
        let store = TestStore::file();
        assert!(store.path().is_dir());
    }

    #[test]
    fn commit_instance_writes_payload_and_blobs() {
        with_temp_store(|store| {
            let sample = Sample::new("a", vec![1, 2]);
            let instance = commit_instance(
                &store.root_group(),
                "Foo",
                Guid::new(),
                &sample,
                &[("thumb", b"png")],
            );

            assert_eq!(instance.read_object::<Sample>().unwrap(), sample);
            assert_eq!(
                store.root_file_names(),
                vec!["Foo".to_string(), "Foo.thumb".to_string(), "Foo.xdm".to_string()]
            );
        });
    }

    #[test]
    fn faulty_store_counts_from_zero() {
        let store = TestStore::faulty();
        assert_eq!(store.faults().unwrap().mutation_count(), 0);
    }
}
