//! Benchmark utilities.

use localdb_core::{Database, Group, Guid, Instance, Persistent};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Payload object used by the benchmarks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Short label.
    pub label: String,
    /// Opaque content.
    pub content: Vec<u8>,
}

impl Persistent for Record {
    const TYPE_NAME: &'static str = "bench.Record";
}

/// Generate random data of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Generate a record with a random payload of `size` bytes.
pub fn random_record(size: usize) -> Record {
    Record {
        label: format!("record-{}", rand::thread_rng().gen::<u32>()),
        content: random_data(size),
    }
}

/// Create and commit an instance holding a random record and `blobs` blobs.
pub fn populate_instance(group: &Group, name: &str, payload_size: usize, blobs: usize) -> Instance {
    let mut instance = group.create_instance(name, Guid::new()).unwrap();
    instance.write_object(&random_record(payload_size)).unwrap();
    for i in 0..blobs {
        instance
            .write_data(&format!("blob{i}"), random_data(payload_size))
            .unwrap();
    }
    instance.commit_transaction().unwrap();
    instance
}

/// Open an in-memory store whose root holds `count` instances.
pub fn populated_store(count: usize, payload_size: usize) -> Database {
    let db = Database::open_in_memory().unwrap();
    let root = db.root_group();
    for i in 0..count {
        populate_instance(&root, &format!("Item{i}"), payload_size, 0);
    }
    db
}
