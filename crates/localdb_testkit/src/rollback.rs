//! Rollback testing for LocalDB.
//!
//! Commits the same transaction over and over, failing a different
//! filesystem mutation each time, and checks that every failed commit
//! leaves the tree exactly as it was before.
//!
//! ## Test Strategy
//!
//! 1. Build a fresh in-memory store and run the `seed` step with no faults
//! 2. Snapshot the whole tree
//! 3. Arm a one-shot fault at mutation *i* and commit what `queue` prepares
//! 4. A failed commit must restore the snapshot; a successful one means
//!    every mutation index has been covered
//!
//! ## Usage
//!
//! ```rust,ignore
//! use localdb_testkit::rollback::RollbackHarness;
//!
//! let report = RollbackHarness::new()
//!     .run(|db| { /* seed */ Ok(()) }, |db| { /* queue */ todo!() })
//!     .unwrap();
//! assert!(report.passed());
//! ```

use localdb_core::{Config, CoreError, CoreResult, Database, Instance};
use localdb_storage::{FaultInjectingFileSystem, InMemoryFileSystem};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::fixtures::MEMORY_ROOT;

type Snapshot = BTreeMap<PathBuf, Option<Vec<u8>>>;

/// Result of a rollback run.
#[derive(Debug, Clone, Default)]
pub struct RollbackReport {
    /// Mutation indices whose failure aborted the commit.
    pub failure_points: usize,
    /// Faults that hit backup cleanup after a successful commit.
    pub cleanup_faults: usize,
    /// Mutation indices after which the tree differed from the snapshot.
    pub mismatches: Vec<usize>,
    /// Mutation indices whose rollback reported an inconsistency.
    pub inconsistent: Vec<usize>,
    /// Mutations performed by the fault-free commit.
    pub total_mutations: usize,
}

impl RollbackReport {
    /// True if every failed commit restored the snapshot.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty() && self.inconsistent.is_empty()
    }
}

/// Test harness for rollback scenarios.
#[derive(Debug, Clone, Default)]
pub struct RollbackHarness {
    config: Config,
    max_points: Option<usize>,
}

struct Store {
    memory: Arc<InMemoryFileSystem>,
    faults: Arc<FaultInjectingFileSystem>,
    db: Database,
}

impl RollbackHarness {
    /// Creates a harness with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `config` for every store the harness builds.
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Gives up after `max` failure points.
    #[must_use]
    pub fn max_points(mut self, max: usize) -> Self {
        self.max_points = Some(max);
        self
    }

    fn store(&self) -> CoreResult<Store> {
        let memory = Arc::new(InMemoryFileSystem::new());
        let faults = Arc::new(FaultInjectingFileSystem::new(memory.clone()));
        let db = Database::open_with_fs(faults.clone(), Path::new(MEMORY_ROOT), self.config.clone())?;
        Ok(Store { memory, faults, db })
    }

    /// Runs the commit prepared by `queue` with a fault at every mutation.
    ///
    /// `seed` builds the committed starting state; `queue` must only queue
    /// actions and return the instance holding the open transaction.
    ///
    /// # Errors
    ///
    /// Returns errors from `seed` and `queue`, and any commit error other
    /// than `CommitFailed`.
    pub fn run<S, Q>(&self, mut seed: S, mut queue: Q) -> CoreResult<RollbackReport>
    where
        S: FnMut(&Database) -> CoreResult<()>,
        Q: FnMut(&Database) -> CoreResult<Instance>,
    {
        let mut report = RollbackReport::default();

        for index in 0.. {
            if self.max_points.is_some_and(|max| index >= max) {
                break;
            }

            let store = self.store()?;
            seed(&store.db)?;
            let before: Snapshot = store.memory.snapshot();

            let mut instance = queue(&store.db)?;
            store.faults.reset();
            store.faults.fail_at_mutation(index);

            match instance.commit_transaction() {
                Err(CoreError::CommitFailed { consistent, .. }) => {
                    report.failure_points += 1;
                    if !consistent {
                        report.inconsistent.push(index);
                    }
                    if store.memory.snapshot() != before {
                        report.mismatches.push(index);
                    }
                }
                Ok(()) => {
                    let injected = store.faults.operations().iter().any(|op| op.injected);
                    if !injected {
                        report.total_mutations = store.faults.mutation_count();
                        break;
                    }
                    report.cleanup_faults += 1;
                }
                Err(other) => return Err(other),
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{commit_instance, Sample};
    use localdb_core::Guid;

    fn seed_foo(db: &Database) -> CoreResult<()> {
        commit_instance(
            &db.root_group(),
            "Foo",
            Guid::new(),
            &Sample::new("seed", vec![1]),
            &[("thumb", b"old")],
        );
        Ok(())
    }

    #[test]
    fn every_failure_point_of_a_content_change_rolls_back() {
        let report = RollbackHarness::new()
            .run(seed_foo, |db| {
                let mut foo = db.root_group().instance("Foo")?;
                foo.open_transaction()?;
                foo.write_object(&Sample::new("new", vec![2, 3]))?;
                foo.write_data("thumb", b"new".to_vec())?;
                foo.write_data("icon", b"icon".to_vec())?;
                Ok(foo)
            })
            .unwrap();

        assert!(report.passed(), "{report:?}");
        assert!(report.failure_points > 0);
        assert!(report.total_mutations > 0);
    }

    #[test]
    fn every_failure_point_of_a_rename_rolls_back() {
        let report = RollbackHarness::new()
            .run(seed_foo, |db| {
                let mut foo = db.root_group().instance("Foo")?;
                foo.open_transaction()?;
                foo.set_guid(Guid::new())?;
                foo.remove_all_data()?;
                foo.set_name("Bar")?;
                Ok(foo)
            })
            .unwrap();

        assert!(report.passed(), "{report:?}");
    }

    #[test]
    fn every_failure_point_of_a_removal_rolls_back() {
        let report = RollbackHarness::new()
            .run(seed_foo, |db| {
                let mut foo = db.root_group().instance("Foo")?;
                foo.open_transaction()?;
                foo.remove()?;
                Ok(foo)
            })
            .unwrap();

        assert!(report.passed(), "{report:?}");
    }

    #[test]
    fn every_failure_point_of_a_creation_rolls_back() {
        let report = RollbackHarness::new()
            .run(
                |_| Ok(()),
                |db| {
                    let mut foo = db.root_group().create_instance("Foo", Guid::new())?;
                    foo.write_object(&Sample::new("x", vec![]))?;
                    foo.write_data("thumb", b"png".to_vec())?;
                    Ok(foo)
                },
            )
            .unwrap();

        assert!(report.passed(), "{report:?}");
    }
}
