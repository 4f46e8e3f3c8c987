//! Reversible filesystem mutations.
//!
//! An [`Action`] is one step of a [`Transaction`](crate::Transaction). Each
//! step moves through:
//!
//! ```text
//! Created -> Executed -> { Committed | RolledBack } -> Cleaned
//! ```
//!
//! `execute` records exactly the partial work it did so that `undo` can
//! reverse it. A failing `execute` reverts its own partial work before
//! returning, so the transaction only has to undo earlier steps.

mod preserve;
mod remove;
mod remove_all_data;
mod set_guid;
mod set_name;
mod write_data;
mod write_object;

pub use remove::Remove;
pub use remove_all_data::RemoveAllData;
pub use set_guid::SetGuid;
pub use set_name::SetName;
pub use write_data::WriteData;
pub use write_object::WriteObject;

use crate::context::Context;
use crate::error::CoreResult;
use std::fmt;
use std::path::Path;

/// Concrete kind of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Create the meta or change the instance id.
    SetGuid,
    /// Rename every file of the instance.
    SetName,
    /// Delete the instance.
    Remove,
    /// Delete every secondary blob.
    RemoveAllData,
    /// Replace the payload.
    WriteObject,
    /// Replace one secondary blob.
    WriteData,
}

impl ActionKind {
    /// Returns the kind name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SetGuid => "SetGuid",
            Self::SetName => "SetName",
            Self::Remove => "Remove",
            Self::RemoveAllData => "RemoveAllData",
            Self::WriteObject => "WriteObject",
            Self::WriteData => "WriteData",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One reversible step of a transaction.
pub trait Action: fmt::Debug + Send {
    /// The concrete kind.
    fn kind(&self) -> ActionKind;

    /// Instance stem this action operates on.
    fn target(&self) -> &Path;

    /// Blob name, for actions scoped to one blob.
    fn data_name(&self) -> Option<&str> {
        None
    }

    /// Performs the step.
    ///
    /// # Errors
    ///
    /// Returns the first I/O or codec error. Partial work is reverted
    /// before returning.
    fn execute(&mut self, ctx: &Context) -> CoreResult<()>;

    /// Reverses what a successful `execute` did. A no-op if nothing ran.
    ///
    /// # Errors
    ///
    /// Returns the first failure; what was not yet reverted stays recorded.
    fn undo(&mut self, ctx: &Context) -> CoreResult<()>;

    /// Deletes backup artifacts. Failures are logged.
    fn clean(&mut self, ctx: &Context);

    /// True when `candidate`, queued later, makes this action moot.
    fn redundant(&self, candidate: &dyn Action) -> bool {
        self.kind() == candidate.kind()
            && self.target() == candidate.target()
            && self.data_name() == candidate.data_name()
    }
}
