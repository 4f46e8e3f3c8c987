//! Cross-crate integration test helpers.
//!
//! Provides utilities for testing groups, instances and transactions
//! together over a real or in-memory filesystem.

use crate::fixtures::{commit_instance, Sample, TestStore};
use crate::generators::ContentOp;
use localdb_core::{CoreResult, Guid, Instance};
use std::collections::BTreeMap;

/// Expected committed state of one instance.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceModel {
    /// Expected id.
    pub guid: Guid,
    /// Expected payload.
    pub payload: Sample,
    /// Expected blobs by name.
    pub blobs: BTreeMap<String, Vec<u8>>,
}

impl InstanceModel {
    /// Applies `op` as a commit would.
    pub fn apply(&mut self, op: &ContentOp) {
        match op {
            ContentOp::WriteObject(sample) => self.payload = sample.clone(),
            ContentOp::WriteData(name, bytes) => {
                self.blobs.insert(name.clone(), bytes.clone());
            }
            ContentOp::RemoveAllData => self.blobs.clear(),
            ContentOp::SetGuid(guid) => self.guid = *guid,
        }
    }

    /// Asserts that `instance` holds exactly this state.
    pub fn verify(&self, instance: &Instance) {
        assert_eq!(instance.guid().expect("Failed to read id"), self.guid);
        assert_eq!(
            instance
                .read_object::<Sample>()
                .expect("Failed to read payload"),
            self.payload
        );
        let names: Vec<String> = self.blobs.keys().cloned().collect();
        assert_eq!(instance.data_names().expect("Failed to list blobs"), names);
        for (name, bytes) in &self.blobs {
            assert_eq!(
                &instance.read_data(name).expect("Failed to read blob"),
                bytes,
                "blob {name} mismatch"
            );
        }
    }
}

/// A test harness tracking the expected state of one instance.
pub struct IntegrationHarness {
    /// The store under test.
    pub store: TestStore,
    /// The instance being exercised.
    pub instance: Instance,
    /// What the instance should contain after the last commit.
    pub model: InstanceModel,
}

impl IntegrationHarness {
    /// Creates a harness with a committed instance `Foo` in an in-memory store.
    pub fn new() -> Self {
        Self::with_store(TestStore::memory())
    }

    /// Creates a harness over `store`.
    pub fn with_store(store: TestStore) -> Self {
        let model = InstanceModel {
            guid: Guid::new(),
            payload: Sample::new("seed", vec![0]),
            blobs: BTreeMap::from([("thumb".to_string(), b"seed".to_vec())]),
        };
        let instance = commit_instance(
            &store.root_group(),
            "Foo",
            model.guid,
            &model.payload,
            &[("thumb", b"seed")],
        );
        Self {
            store,
            instance,
            model,
        }
    }

    /// Queues `ops` in one transaction and commits it.
    ///
    /// # Errors
    ///
    /// Returns the first queueing or commit error; the model is only
    /// updated when the commit succeeds.
    pub fn commit(&mut self, ops: &[ContentOp]) -> CoreResult<()> {
        self.instance.open_transaction()?;
        for op in ops {
            if let Err(e) = op.queue(&mut self.instance) {
                self.instance.discard_transaction()?;
                return Err(e);
            }
        }
        self.instance.commit_transaction()?;
        for op in ops {
            self.model.apply(op);
        }
        Ok(())
    }

    /// Asserts that the instance matches the model.
    pub fn verify(&self) {
        self.model.verify(&self.instance);
    }
}

impl Default for IntegrationHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Reusable end-to-end scenarios.
pub mod scenarios {
    use super::*;
    use localdb_core::{Child, Database};

    /// Creates `Foo`, renames it to `Bar` in a second transaction, and
    /// checks that id, payload and blobs moved with it.
    pub fn test_create_then_rename(db: &Database) {
        let root = db.root_group();
        let guid = Guid::new();
        let payload = Sample::new("p1", vec![1, 2, 3]);
        let mut foo = commit_instance(&root, "Foo", guid, &payload, &[("thumb", b"thumbnail")]);

        foo.open_transaction().expect("Failed to open");
        foo.set_name("Bar").expect("Failed to queue rename");
        foo.commit_transaction().expect("Failed to commit rename");

        assert_eq!(foo.name(), "Bar");
        assert_eq!(foo.guid().expect("Failed to read id"), guid);
        assert_eq!(foo.read_data("thumb").expect("Failed to read blob"), b"thumbnail");
        assert_eq!(foo.read_object::<Sample>().expect("Failed to read payload"), payload);

        let names: Vec<String> = root
            .children()
            .expect("Failed to list")
            .iter()
            .map(Child::name)
            .collect();
        assert_eq!(names, vec!["Bar".to_string()]);
        assert!(root.instance("Foo").is_err());
    }

    /// A freshly loaded handle can open a transaction right after creation.
    pub fn test_reopen_after_create(db: &Database) {
        let root = db.root_group();
        let guid = Guid::new();
        let mut created = root.create_instance("Fresh", guid).expect("Failed to create");
        created.commit_transaction().expect("Failed to commit");
        assert_eq!(created.guid().expect("Failed to read id"), guid);

        let mut loaded = root.instance("Fresh").expect("Failed to load");
        loaded.open_transaction().expect("Failed to reopen");
        loaded.discard_transaction().expect("Failed to discard");
    }

    /// Reads always see the last committed payload.
    pub fn test_reads_see_last_commit(db: &Database) {
        let root = db.root_group();
        let p1 = Sample::new("p1", vec![1]);
        let p2 = Sample::new("p2", vec![2]);
        let mut foo = commit_instance(&root, "Reads", Guid::new(), &p1, &[]);

        foo.open_transaction().expect("Failed to open");
        foo.write_object(&p2).expect("Failed to queue");
        assert_eq!(foo.read_object::<Sample>().expect("Failed to read"), p1);
        foo.discard_transaction().expect("Failed to discard");
        assert_eq!(foo.read_object::<Sample>().expect("Failed to read"), p1);

        foo.open_transaction().expect("Failed to open");
        foo.write_object(&p2).expect("Failed to queue");
        foo.commit_transaction().expect("Failed to commit");
        assert_eq!(foo.read_object::<Sample>().expect("Failed to read"), p2);
    }
}
