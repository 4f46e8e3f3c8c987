//! Ordered, self-compacting batch of actions.
//!
//! Commit runs the queued actions strictly in order. When step *i* fails,
//! steps *i-1 ..= 0* are undone in reverse order; an undo failure is logged
//! as a consistency warning and the rollback keeps going. Every action whose
//! undo did not fail is then cleaned.

use crate::action::{Action, ActionKind};
use crate::context::Context;
use crate::error::{CoreError, CoreResult};
use crate::lock::LockGuard;

/// A batch of reversible actions committed as one unit.
#[derive(Debug)]
pub struct Transaction {
    context: Context,
    actions: Vec<Box<dyn Action>>,
    _lock: Option<Box<dyn LockGuard>>,
}

impl Transaction {
    /// Creates an empty transaction.
    pub fn new(context: Context) -> Self {
        Self {
            context,
            actions: Vec::new(),
            _lock: None,
        }
    }

    /// Creates an empty transaction holding the named lock `name`.
    ///
    /// The lock is released when the transaction is committed or dropped.
    ///
    /// # Errors
    ///
    /// Returns `LockTimeout` if the lock is held elsewhere.
    pub fn locked(context: Context, name: &str) -> CoreResult<Self> {
        let lock = context.locks().acquire(name)?;
        let mut txn = Self::new(context);
        txn._lock = Some(lock);
        Ok(txn)
    }

    /// Queues `action`, first dropping every queued action it makes moot.
    pub fn add(&mut self, action: Box<dyn Action>) {
        let before = self.actions.len();
        self.actions
            .retain(|queued| !queued.redundant(action.as_ref()));
        let dropped = before - self.actions.len();
        if dropped > 0 {
            tracing::debug!(kind = %action.kind(), dropped, "compacted redundant actions");
        }
        self.actions.push(action);
    }

    /// Queues a concrete action.
    pub fn push<A: Action + 'static>(&mut self, action: A) {
        self.add(Box::new(action));
    }

    /// Number of queued actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// True if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Kinds of the queued actions, in commit order.
    #[must_use]
    pub fn kinds(&self) -> Vec<ActionKind> {
        self.actions.iter().map(|a| a.kind()).collect()
    }

    /// True if a queued action has kind `kind`.
    #[must_use]
    pub fn contains(&self, kind: ActionKind) -> bool {
        self.actions.iter().any(|a| a.kind() == kind)
    }

    /// Executes every queued action.
    ///
    /// # Errors
    ///
    /// Returns `CommitFailed` after rolling back. Its `consistent` flag is
    /// false when at least one undo step failed too, or when the failing
    /// action could not revert its own partial changes.
    pub fn commit(mut self) -> CoreResult<()> {
        let count = self.actions.len();
        tracing::debug!(actions = count, "committing transaction");

        let mut failure = None;
        for (step, action) in self.actions.iter_mut().enumerate() {
            if let Err(e) = action.execute(&self.context) {
                failure = Some((step, e));
                break;
            }
        }

        let Some((step, source)) = failure else {
            for action in &mut self.actions {
                action.clean(&self.context);
            }
            tracing::info!(actions = count, "transaction committed");
            return Ok(());
        };

        let kind = self.actions[step].kind();
        tracing::error!(step, action = %kind, error = %source, "action failed, rolling back");

        let mut undo_failed = vec![false; count];
        if source.is_revert_failure() {
            undo_failed[step] = true;
            tracing::warn!(
                step,
                action = %kind,
                target = %self.actions[step].target().display(),
                "consistency warning: failing action left partial changes"
            );
        }
        for i in (0..step).rev() {
            let action = &mut self.actions[i];
            if let Err(e) = action.undo(&self.context) {
                undo_failed[i] = true;
                tracing::warn!(
                    step = i,
                    action = %action.kind(),
                    target = %action.target().display(),
                    error = %e,
                    "consistency warning: undo failed, backups kept"
                );
            }
        }

        for (action, failed) in self.actions.iter_mut().zip(&undo_failed) {
            if !failed {
                action.clean(&self.context);
            }
        }

        let consistent = !undo_failed.contains(&true);
        if consistent {
            tracing::info!(step, "transaction rolled back");
        }
        Err(CoreError::CommitFailed {
            step,
            action: kind,
            consistent,
            source: Box::new(source),
        })
    }
}
