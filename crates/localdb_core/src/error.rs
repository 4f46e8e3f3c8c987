//! Error types for LocalDB core.

use crate::action::ActionKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in LocalDB core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Filesystem error (open, rename or remove failed).
    #[error("storage error: {0}")]
    Storage(#[from] localdb_storage::StorageError),

    /// Object could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] localdb_codec::CodecError),

    /// A meta, payload, blob or link file is missing.
    #[error("{what} not found: {}", path.display())]
    NotFound {
        /// What was looked up.
        what: &'static str,
        /// The path that was looked up.
        path: PathBuf,
    },

    /// Creating would overwrite an existing path.
    #[error("already exists: {}", path.display())]
    AlreadyExists {
        /// The existing path.
        path: PathBuf,
    },

    /// A group, instance or blob name is not usable as a file name.
    #[error("invalid name {name:?}: {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The stored object is not of the requested type.
    #[error("type mismatch: instance holds {stored:?}, requested {requested:?}")]
    TypeMismatch {
        /// Primary type recorded in the meta.
        stored: String,
        /// Type the caller asked for.
        requested: &'static str,
    },

    /// A transaction is already open on this instance.
    #[error("transaction already open on {}", path.display())]
    TransactionAlreadyOpen {
        /// The instance path.
        path: PathBuf,
    },

    /// The operation requires an open transaction.
    #[error("no transaction open on {}", path.display())]
    NoTransaction {
        /// The instance path.
        path: PathBuf,
    },

    /// A queued action failed and the transaction was rolled back.
    ///
    /// When `consistent` is false at least one undo step failed as well,
    /// and the on-disk state may differ from the pre-commit state.
    #[error("commit failed at step {step} ({action}); rolled back consistently: {consistent}: {source}")]
    CommitFailed {
        /// Index of the failing action.
        step: usize,
        /// Kind of the failing action.
        action: ActionKind,
        /// Whether every undo step succeeded.
        consistent: bool,
        /// The error that stopped the commit.
        source: Box<CoreError>,
    },

    /// An action failed and putting back its partial changes failed too.
    #[error("{source}; reverting the partial change failed: {revert}")]
    RevertFailed {
        /// The error that stopped the action.
        source: Box<CoreError>,
        /// The error raised while reverting.
        revert: Box<CoreError>,
    },

    /// The named lock could not be acquired in time.
    #[error("timed out acquiring lock {name:?}")]
    LockTimeout {
        /// The lock name.
        name: String,
    },

    /// Only empty groups can be removed.
    #[error("group not empty: {}", path.display())]
    GroupNotEmpty {
        /// The group path.
        path: PathBuf,
    },

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates a not found error.
    pub fn not_found(what: &'static str, path: impl AsRef<Path>) -> Self {
        Self::NotFound {
            what,
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Creates an already exists error.
    pub fn already_exists(path: impl AsRef<Path>) -> Self {
        Self::AlreadyExists {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Creates an invalid name error.
    pub fn invalid_name(name: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidName {
            name: name.into(),
            reason,
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Wraps `self` after the partial change it left could not be reverted.
    #[must_use]
    pub fn with_failed_revert(self, revert: impl Into<CoreError>) -> Self {
        Self::RevertFailed {
            source: Box::new(self),
            revert: Box::new(revert.into()),
        }
    }

    /// Returns true if the failing action left partial changes on disk.
    #[must_use]
    pub fn is_revert_failure(&self) -> bool {
        matches!(self, Self::RevertFailed { .. })
    }

    /// Returns true if the error means something does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Storage(e) => e.is_not_found(),
            _ => false,
        }
    }

    /// Returns true if the error is a single-writer violation.
    #[must_use]
    pub fn is_concurrency_violation(&self) -> bool {
        matches!(
            self,
            Self::TransactionAlreadyOpen { .. } | Self::NoTransaction { .. }
        )
    }
}
