//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random test data
//! that maintains required invariants.

use crate::fixtures::Sample;
use localdb_core::{CoreResult, Guid, Instance};
use proptest::prelude::*;

/// Strategy for generating valid group, instance and blob names.
pub fn name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z][A-Za-z0-9_]{0,15}")
        .expect("Invalid regex")
        .prop_filter("reserved extensions are not names", |s| {
            !matches!(s.as_str(), "xdm" | "xgl" | "xil")
        })
}

/// Strategy for generating ids.
pub fn guid_strategy() -> impl Strategy<Value = Guid> {
    prop::array::uniform16(any::<u8>()).prop_map(Guid::from_bytes)
}

/// Strategy for generating blob contents.
pub fn blob_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..256)
}

/// Strategy for generating payload objects.
pub fn sample_strategy() -> impl Strategy<Value = Sample> {
    (
        prop::string::string_regex("[a-z ]{0,24}").expect("Invalid regex"),
        prop::collection::vec(any::<i64>(), 0..8),
    )
        .prop_map(|(label, values)| Sample::new(label, values))
}

/// One content change queued on an existing instance.
#[derive(Debug, Clone)]
pub enum ContentOp {
    /// Replace the payload.
    WriteObject(Sample),
    /// Replace one blob.
    WriteData(String, Vec<u8>),
    /// Drop every blob.
    RemoveAllData,
    /// Change the id.
    SetGuid(Guid),
}

impl ContentOp {
    /// Queues this change on `instance`.
    ///
    /// # Errors
    ///
    /// Returns the error of the matching [`Instance`] method.
    pub fn queue(&self, instance: &mut Instance) -> CoreResult<()> {
        match self {
            Self::WriteObject(sample) => instance.write_object(sample),
            Self::WriteData(name, bytes) => instance.write_data(name, bytes.clone()),
            Self::RemoveAllData => instance.remove_all_data(),
            Self::SetGuid(guid) => instance.set_guid(*guid),
        }
    }
}

/// Strategy for generating one content change.
///
/// Blob names come from a small pool so that writes collide and compact.
pub fn content_op_strategy() -> impl Strategy<Value = ContentOp> {
    let blob_name = prop::sample::select(vec!["thumb", "icon", "preview"]);
    prop_oneof![
        sample_strategy().prop_map(ContentOp::WriteObject),
        (blob_name, blob_strategy())
            .prop_map(|(name, bytes)| ContentOp::WriteData(name.to_string(), bytes)),
        Just(ContentOp::RemoveAllData),
        guid_strategy().prop_map(ContentOp::SetGuid),
    ]
}

/// Strategy for generating a transaction's worth of content changes.
pub fn content_ops_strategy(max: usize) -> impl Strategy<Value = Vec<ContentOp>> {
    prop::collection::vec(content_op_strategy(), 1..=max)
}
