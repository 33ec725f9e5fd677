use std::cell::Cell;
use std::ptr;

use lmdb_sys as ffi;

use crate::env::Environment;
use crate::error::{Error, IntoResult, Result};

/// Outcome requested by the body of [`Environment::write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionResult {
    /// Persist every write performed under the transaction
    Commit,
    /// Discard every write performed under the transaction
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxnState {
    Active,
    Committed,
    Aborted,
}

/// A scoped, atomic sequence of operations against one environment.
///
/// A transaction is terminal after [`commit`](Transaction::commit) or
/// [`abort`](Transaction::abort); both consume the value, and dropping an
/// active transaction aborts it, so no exit path leaves the engine handle
/// open. Read-only transactions observe a snapshot taken at begin time.
/// At most one read-write transaction is in flight per environment; the
/// engine's writer lock blocks any second writer until the first ends.
#[derive(Debug)]
pub struct Transaction<'env> {
    env: &'env Environment,
    txn: *mut ffi::MDB_txn,
    /// Parent transaction for nested txns
    parent: Option<&'env Transaction<'env>>,
    read_only: bool,
    state: Cell<TxnState>,
    has_child: Cell<bool>,
}

impl<'env> Transaction<'env> {
    pub(crate) fn begin(env: &'env Environment, read_only: bool) -> Result<Transaction<'env>> {
        let flags = if read_only { ffi::MDB_RDONLY } else { 0 };
        let mut txn: *mut ffi::MDB_txn = ptr::null_mut();
        unsafe {
            ffi::mdb_txn_begin(env.env_ptr(), ptr::null_mut(), flags, &mut txn).into_result()?;
        }
        Ok(Transaction {
            env,
            txn,
            parent: None,
            read_only,
            state: Cell::new(TxnState::Active),
            has_child: Cell::new(false),
        })
    }

    /// Begin a child transaction nested under this one.
    ///
    /// The child's writes become durable only once the child and every
    /// ancestor commit; aborting any ancestor discards them regardless of
    /// the child's own outcome. While the child is live, every operation
    /// through this transaction fails with [`Error::InvalidState`], since
    /// the engine permits a parent only to end itself during that window.
    pub fn begin_nested(&self) -> Result<Transaction<'_>> {
        self.require_active()?;
        if self.read_only {
            return Err(Error::InvalidArgument);
        }
        let mut child: *mut ffi::MDB_txn = ptr::null_mut();
        unsafe {
            ffi::mdb_txn_begin(self.env.env_ptr(), self.txn, 0, &mut child).into_result()?;
        }
        self.has_child.set(true);
        Ok(Transaction {
            env: self.env,
            txn: child,
            parent: Some(self),
            read_only: false,
            state: Cell::new(TxnState::Active),
            has_child: Cell::new(false),
        })
    }

    /// Persist all writes performed under this transaction.
    ///
    /// For a nested transaction this merges the writes into the parent;
    /// they reach disk when the outermost ancestor commits.
    pub fn commit(self) -> Result<()> {
        self.require_active()?;
        let rc = unsafe { ffi::mdb_txn_commit(self.txn) };
        // The engine frees the handle whether or not the commit succeeded
        self.state.set(if rc == ffi::MDB_SUCCESS {
            TxnState::Committed
        } else {
            TxnState::Aborted
        });
        self.release_parent();
        rc.into_result()
    }

    /// Discard all writes performed under this transaction.
    pub fn abort(mut self) {
        self.abort_inner();
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn is_active(&self) -> bool {
        self.state.get() == TxnState::Active && !self.has_child.get()
    }

    /// Fail fast if this transaction cannot accept operations right now.
    pub(crate) fn require_active(&self) -> Result<()> {
        if self.state.get() != TxnState::Active || self.has_child.get() {
            return Err(Error::InvalidState);
        }
        Ok(())
    }

    pub(crate) fn env(&self) -> &Environment {
        self.env
    }

    pub(crate) fn txn_ptr(&self) -> *mut ffi::MDB_txn {
        self.txn
    }

    fn release_parent(&self) {
        if let Some(parent) = self.parent {
            parent.has_child.set(false);
        }
    }

    fn abort_inner(&mut self) {
        if self.state.get() != TxnState::Active {
            return;
        }
        unsafe { ffi::mdb_txn_abort(self.txn) };
        self.state.set(TxnState::Aborted);
        self.release_parent();
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        self.abort_inner();
    }
}
