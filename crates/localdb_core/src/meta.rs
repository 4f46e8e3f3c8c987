//! Instance meta record.

use crate::error::CoreResult;
use crate::guid::Guid;
use crate::physical;
use localdb_codec::Format;
use localdb_storage::FileSystem;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// The sidecar record stored in `<stem>.xdm`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceMeta {
    /// Unique id of the instance.
    pub guid: Guid,
    /// Type name of the payload; empty until an object is written.
    #[serde(default)]
    pub primary_type: String,
    /// Names of the secondary blobs.
    #[serde(default)]
    pub blobs: BTreeSet<String>,
}

impl InstanceMeta {
    /// Creates the meta of a freshly created instance.
    #[must_use]
    pub fn new(guid: Guid) -> Self {
        Self {
            guid,
            primary_type: String::new(),
            blobs: BTreeSet::new(),
        }
    }

    /// Reads a meta file.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or a codec error.
    pub fn read(fs: &dyn FileSystem, path: &Path) -> CoreResult<Self> {
        physical::read_object(fs, path)
    }

    /// Encodes this meta in `format`.
    ///
    /// # Errors
    ///
    /// Returns a codec error.
    pub fn encode(&self, format: Format) -> CoreResult<Vec<u8>> {
        physical::encode_object(self, format)
    }
}
