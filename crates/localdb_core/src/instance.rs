//! Instance handle.
//!
//! An instance is a path stem owning a meta file, a payload and any number
//! of named blobs. Reads go straight to the last committed state; writes
//! are queued as actions in the single open transaction and hit the disk
//! only on [`Instance::commit_transaction`].

use crate::action::{Remove, RemoveAllData, SetGuid, SetName, WriteData, WriteObject};
use crate::context::Context;
use crate::error::{CoreError, CoreResult};
use crate::guid::Guid;
use crate::layout;
use crate::meta::InstanceMeta;
use crate::physical::{self, Persistent};
use crate::transaction::Transaction;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A stored object with secondary blobs.
#[derive(Debug)]
pub struct Instance {
    context: Context,
    stem: PathBuf,
    is_link: bool,
    pending: Option<Pending>,
}

/// The open transaction and what has been queued in it.
#[derive(Debug)]
struct Pending {
    txn: Transaction,
    creating: bool,
    renamed_to: Option<PathBuf>,
    removed: bool,
}

impl Pending {
    fn new(txn: Transaction) -> Self {
        Self {
            txn,
            creating: false,
            renamed_to: None,
            removed: false,
        }
    }

    fn ensure_content_change_allowed(&self) -> CoreResult<()> {
        if self.removed {
            return Err(CoreError::invalid_operation(
                "instance removal already queued",
            ));
        }
        if self.renamed_to.is_some() {
            return Err(CoreError::invalid_operation(
                "only a rename or a removal may follow a queued rename",
            ));
        }
        Ok(())
    }
}

impl Instance {
    pub(crate) fn new(context: Context, stem: PathBuf, is_link: bool) -> Self {
        Self {
            context,
            stem,
            is_link,
            pending: None,
        }
    }

    /// An instance whose creation is queued in an open transaction.
    pub(crate) fn create(context: Context, stem: PathBuf, guid: Guid) -> CoreResult<Self> {
        let txn = Transaction::locked(context.clone(), &guid.to_string())?;
        let mut pending = Pending::new(txn);
        pending.creating = true;
        pending.txn.push(SetGuid::new(stem.clone(), guid, true));

        Ok(Self {
            context,
            stem,
            is_link: false,
            pending: Some(pending),
        })
    }

    /// Instance name (the final component of the stem).
    #[must_use]
    pub fn name(&self) -> String {
        layout::file_name(&self.stem)
    }

    /// Path stem of the instance.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.stem
    }

    /// True if this handle was produced by dereferencing an instance link.
    #[must_use]
    pub fn is_link(&self) -> bool {
        self.is_link
    }

    fn meta(&self) -> CoreResult<InstanceMeta> {
        let path = layout::meta_path(&self.stem);
        InstanceMeta::read(self.context.fs(), &path).map_err(|e| {
            if e.is_not_found() {
                CoreError::not_found("instance", &self.stem)
            } else {
                e
            }
        })
    }

    /// The committed id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the instance has not been committed.
    pub fn guid(&self) -> CoreResult<Guid> {
        Ok(self.meta()?.guid)
    }

    /// The committed primary type name; empty if no payload was written.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the instance has not been committed.
    pub fn primary_type_name(&self) -> CoreResult<String> {
        Ok(self.meta()?.primary_type)
    }

    /// Names of the committed blobs, sorted.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the instance has not been committed.
    pub fn data_names(&self) -> CoreResult<Vec<String>> {
        Ok(self.meta()?.blobs.into_iter().collect())
    }

    fn blob_path(&self, name: &str) -> CoreResult<PathBuf> {
        if !self.meta()?.blobs.contains(name) {
            return Err(CoreError::not_found("blob", layout::data_path(&self.stem, name)));
        }
        Ok(layout::data_path(&self.stem, name))
    }

    /// Reads the committed blob `name`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the blob is not registered or its file is missing.
    pub fn read_data(&self, name: &str) -> CoreResult<Vec<u8>> {
        let path = self.blob_path(name)?;
        self.context.fs().read(&path).map_err(|e| {
            if e.is_not_found() {
                CoreError::not_found("blob", &path)
            } else {
                e.into()
            }
        })
    }

    /// Modification time of the committed blob `name`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the blob is not registered or its file is missing.
    pub fn data_last_write_time(&self, name: &str) -> CoreResult<SystemTime> {
        let path = self.blob_path(name)?;
        let metadata = self.context.fs().metadata(&path).map_err(|e| {
            if e.is_not_found() {
                CoreError::not_found("blob", &path)
            } else {
                e.into()
            }
        })?;
        Ok(metadata.modified)
    }

    /// Reads the committed payload as `T`.
    ///
    /// The decoder is picked by sniffing the payload header.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` if the meta records another type, `NotFound`
    /// if the payload is missing, or a codec error.
    pub fn read_object<T: Persistent>(&self) -> CoreResult<T> {
        let meta = self.meta()?;
        if meta.primary_type != T::TYPE_NAME {
            return Err(CoreError::TypeMismatch {
                stored: meta.primary_type,
                requested: T::TYPE_NAME,
            });
        }
        physical::read_object(self.context.fs(), &layout::object_path(&self.stem))
    }

    /// True while a transaction is open.
    #[must_use]
    pub fn is_transaction_open(&self) -> bool {
        self.pending.is_some()
    }

    /// Opens a transaction.
    ///
    /// With named locks enabled the transaction holds the lock named after
    /// the instance id until it is committed or discarded.
    ///
    /// # Errors
    ///
    /// Returns `TransactionAlreadyOpen` if one is open, `NotFound` if the
    /// instance does not exist, or `LockTimeout`.
    pub fn open_transaction(&mut self) -> CoreResult<()> {
        if self.pending.is_some() {
            return Err(CoreError::TransactionAlreadyOpen {
                path: self.stem.clone(),
            });
        }
        let guid = self.guid()?;
        let txn = Transaction::locked(self.context.clone(), &guid.to_string())?;
        self.pending = Some(Pending::new(txn));
        tracing::debug!(instance = %self.stem.display(), "transaction opened");
        Ok(())
    }

    /// Drops every queued action without touching the disk.
    ///
    /// # Errors
    ///
    /// Returns `NoTransaction` if none is open.
    pub fn discard_transaction(&mut self) -> CoreResult<()> {
        self.take_pending()?;
        tracing::debug!(instance = %self.stem.display(), "transaction discarded");
        Ok(())
    }

    /// Commits the open transaction.
    ///
    /// The transaction is closed whether or not the commit succeeds. On
    /// success a queued rename moves this handle to the new stem.
    ///
    /// # Errors
    ///
    /// Returns `NoTransaction`, or `CommitFailed` after rollback.
    pub fn commit_transaction(&mut self) -> CoreResult<()> {
        let pending = self.take_pending()?;
        pending.txn.commit()?;
        if let Some(stem) = pending.renamed_to {
            tracing::info!(from = %self.stem.display(), to = %stem.display(), "instance renamed");
            self.stem = stem;
        }
        Ok(())
    }

    fn take_pending(&mut self) -> CoreResult<Pending> {
        self.pending.take().ok_or_else(|| CoreError::NoTransaction {
            path: self.stem.clone(),
        })
    }

    fn pending_mut(&mut self) -> CoreResult<&mut Pending> {
        self.pending.as_mut().ok_or_else(|| CoreError::NoTransaction {
            path: self.stem.clone(),
        })
    }

    /// Queues an id change.
    ///
    /// # Errors
    ///
    /// Returns `NoTransaction`, or `InvalidOperation` after a queued rename
    /// or removal.
    pub fn set_guid(&mut self, guid: Guid) -> CoreResult<()> {
        let stem = self.stem.clone();
        let pending = self.pending_mut()?;
        pending.ensure_content_change_allowed()?;
        let is_create = pending.creating;
        pending.txn.push(SetGuid::new(stem, guid, is_create));
        Ok(())
    }

    /// Queues a rename within the same group.
    ///
    /// # Errors
    ///
    /// Returns `NoTransaction`, `InvalidName`, or `InvalidOperation` after
    /// a queued removal.
    pub fn set_name(&mut self, name: &str) -> CoreResult<()> {
        layout::validate_name(name)?;
        let stem = self.stem.clone();
        let pending = self.pending_mut()?;
        if pending.removed {
            return Err(CoreError::invalid_operation(
                "instance removal already queued",
            ));
        }
        let action = SetName::new(stem, name);
        pending.renamed_to = Some(action.new_stem().to_path_buf());
        pending.txn.push(action);
        Ok(())
    }

    /// Queues removal of the instance.
    ///
    /// After a queued rename the removal targets the new name.
    ///
    /// # Errors
    ///
    /// Returns `NoTransaction`, or `InvalidOperation` if already queued.
    pub fn remove(&mut self) -> CoreResult<()> {
        let stem = self.stem.clone();
        let pending = self.pending_mut()?;
        if pending.removed {
            return Err(CoreError::invalid_operation(
                "instance removal already queued",
            ));
        }
        let target = pending.renamed_to.clone().unwrap_or(stem);
        pending.txn.push(Remove::new(target));
        pending.removed = true;
        Ok(())
    }

    /// Queues removal of every blob.
    ///
    /// # Errors
    ///
    /// Returns `NoTransaction`, or `InvalidOperation` after a queued rename
    /// or removal.
    pub fn remove_all_data(&mut self) -> CoreResult<()> {
        let stem = self.stem.clone();
        let pending = self.pending_mut()?;
        pending.ensure_content_change_allowed()?;
        pending.txn.push(RemoveAllData::new(stem));
        Ok(())
    }

    /// Serializes `object` and queues it as the new payload.
    ///
    /// # Errors
    ///
    /// Returns `NoTransaction`, `InvalidOperation` after a queued rename or
    /// removal, or a codec error (nothing is queued then).
    pub fn write_object<T: Persistent>(&mut self, object: &T) -> CoreResult<()> {
        let buffer = physical::encode_object(object, self.context.format())?;
        let stem = self.stem.clone();
        let pending = self.pending_mut()?;
        pending.ensure_content_change_allowed()?;
        pending.txn.push(WriteObject::new(stem, buffer, T::TYPE_NAME));
        Ok(())
    }

    /// Queues `bytes` as the new content of blob `name`.
    ///
    /// # Errors
    ///
    /// Returns `NoTransaction`, `InvalidName`, or `InvalidOperation` after
    /// a queued rename or removal.
    pub fn write_data(&mut self, name: &str, bytes: impl Into<Vec<u8>>) -> CoreResult<()> {
        layout::validate_name(name)?;
        let stem = self.stem.clone();
        let pending = self.pending_mut()?;
        pending.ensure_content_change_allowed()?;
        pending.txn.push(WriteData::new(stem, name, bytes.into()));
        Ok(())
    }
}
