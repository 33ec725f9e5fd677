use std::os::raw::c_void;
use std::ptr;
use std::slice;

use lmdb_sys as ffi;
use log::debug;

use crate::codec::{FromBytes, ToBytes};
use crate::cursor::Cursor;
use crate::env::{Environment, Stat};
use crate::error::{Error, IntoResult, Result};
use crate::transaction::Transaction;

/// A named (or default) key space within one environment.
///
/// Every operation takes an optional [`Transaction`]. With `Some`, the
/// operation joins that transaction and becomes visible to other
/// transactions only once it commits. With `None`, the operation runs
/// under an implicit one-shot transaction (read-only for reads,
/// read-write for mutations) committed before the call returns.
///
/// The handle stays valid until [`drop`](Database::drop) consumes it or
/// the owning environment goes away; the borrow checker enforces the
/// latter.
#[derive(Debug)]
pub struct Database<'env> {
    env: &'env Environment,
    dbi: ffi::MDB_dbi,
    name: Option<String>,
}

impl<'env> Database<'env> {
    pub(crate) fn new(
        env: &'env Environment,
        dbi: ffi::MDB_dbi,
        name: Option<String>,
    ) -> Database<'env> {
        Database { env, dbi, name }
    }

    /// Name of the database, `None` for the default unnamed one
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Insert or overwrite the value stored under `key`
    pub fn put<V>(&self, key: &str, value: &V, txn: Option<&Transaction<'_>>) -> Result<()>
    where
        V: ToBytes + ?Sized,
    {
        self.put_bytes(key.as_bytes(), &value.to_bytes(), txn)
    }

    /// Fetch the value stored under `key`, decoded as `V`
    pub fn get<V>(&self, key: &str, txn: Option<&Transaction<'_>>) -> Result<Option<V>>
    where
        V: FromBytes,
    {
        match self.get_bytes(key.as_bytes(), txn)? {
            Some(bytes) => Ok(Some(V::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Remove the entry stored under `key`; missing keys are not an error
    pub fn delete_value(&self, key: &str, txn: Option<&Transaction<'_>>) -> Result<()> {
        self.delete_bytes(key.as_bytes(), txn)
    }

    /// Check whether `key` has a value
    pub fn exists(&self, key: &str, txn: Option<&Transaction<'_>>) -> Result<bool> {
        self.exists_bytes(key.as_bytes(), txn)
    }

    /// Insert or overwrite a raw entry
    pub fn put_bytes(
        &self,
        key: &[u8],
        value: &[u8],
        txn: Option<&Transaction<'_>>,
    ) -> Result<()> {
        reject_empty(key)?;
        self.with_txn(true, txn, |txn| {
            let mut key_val = mdb_val(key);
            let mut data_val = mdb_val(value);
            unsafe {
                ffi::mdb_put(txn.txn_ptr(), self.dbi, &mut key_val, &mut data_val, 0)
                    .into_result()
            }
        })
    }

    /// Fetch a raw entry, `None` when the key is absent
    pub fn get_bytes(&self, key: &[u8], txn: Option<&Transaction<'_>>) -> Result<Option<Vec<u8>>> {
        reject_empty(key)?;
        self.with_txn(false, txn, |txn| {
            let mut key_val = mdb_val(key);
            let mut data_val = mdb_val_out();
            let rc = unsafe {
                ffi::mdb_get(txn.txn_ptr(), self.dbi, &mut key_val, &mut data_val)
            };
            match rc {
                ffi::MDB_SUCCESS => {
                    // Copy out of the map before the transaction can end
                    let data = unsafe {
                        slice::from_raw_parts(data_val.mv_data as *const u8, data_val.mv_size)
                    };
                    Ok(Some(data.to_vec()))
                }
                ffi::MDB_NOTFOUND => Ok(None),
                rc => Err(Error::from(rc)),
            }
        })
    }

    /// Remove a raw entry.
    ///
    /// Deleting a key that is not present is a no-op, mirroring how reads
    /// treat missing keys as absent values rather than failures.
    pub fn delete_bytes(&self, key: &[u8], txn: Option<&Transaction<'_>>) -> Result<()> {
        reject_empty(key)?;
        self.with_txn(true, txn, |txn| {
            let mut key_val = mdb_val(key);
            let rc = unsafe {
                ffi::mdb_del(txn.txn_ptr(), self.dbi, &mut key_val, ptr::null_mut())
            };
            match rc {
                ffi::MDB_SUCCESS | ffi::MDB_NOTFOUND => Ok(()),
                rc => Err(Error::from(rc)),
            }
        })
    }

    /// Check whether a raw key has a value
    pub fn exists_bytes(&self, key: &[u8], txn: Option<&Transaction<'_>>) -> Result<bool> {
        Ok(self.get_bytes(key, txn)?.is_some())
    }

    /// Number of entries, consistent with the supplied transaction's snapshot
    pub fn count(&self, txn: Option<&Transaction<'_>>) -> Result<usize> {
        Ok(self.stat(txn)?.entries)
    }

    /// Get database statistics
    pub fn stat(&self, txn: Option<&Transaction<'_>>) -> Result<Stat> {
        self.with_txn(false, txn, |txn| {
            let mut stat = std::mem::MaybeUninit::<ffi::MDB_stat>::uninit();
            unsafe {
                ffi::mdb_stat(txn.txn_ptr(), self.dbi, stat.as_mut_ptr()).into_result()?;
                Ok(Stat::from_ffi(&stat.assume_init()))
            }
        })
    }

    /// Remove every entry, keeping the database itself
    pub fn empty(&self, txn: Option<&Transaction<'_>>) -> Result<()> {
        self.with_txn(true, txn, |txn| unsafe {
            ffi::mdb_drop(txn.txn_ptr(), self.dbi, 0).into_result()
        })
    }

    /// Remove every entry and the database itself.
    ///
    /// Consumes the handle, which the engine invalidates; reopening the
    /// same name afterwards requires [`DbFlags::CREATE`](crate::DbFlags::CREATE)
    /// again.
    pub fn drop(self, txn: Option<&Transaction<'_>>) -> Result<()> {
        self.with_txn(true, txn, |txn| unsafe {
            ffi::mdb_drop(txn.txn_ptr(), self.dbi, 1).into_result()
        })?;
        debug!("dropped database {:?}", self.name);
        Ok(())
    }

    /// Open a cursor over this database, bound to `txn`
    pub fn cursor<'txn>(&self, txn: &'txn Transaction<'_>) -> Result<Cursor<'txn>> {
        self.check_txn(txn)?;
        Cursor::open(txn, self.dbi)
    }

    /// Route an operation through the supplied transaction, or wrap it in
    /// an implicit one-shot transaction when the caller passed none.
    fn with_txn<T>(
        &self,
        write: bool,
        txn: Option<&Transaction<'_>>,
        body: impl FnOnce(&Transaction<'_>) -> Result<T>,
    ) -> Result<T> {
        match txn {
            Some(txn) => {
                self.check_txn(txn)?;
                if write && txn.is_read_only() {
                    return Err(Error::InvalidArgument);
                }
                body(txn)
            }
            None => {
                let txn = Transaction::begin(self.env, !write)?;
                let value = body(&txn)?;
                txn.commit()?;
                Ok(value)
            }
        }
    }

    fn check_txn(&self, txn: &Transaction<'_>) -> Result<()> {
        if !ptr::eq(txn.env(), self.env) {
            return Err(Error::Incompatible);
        }
        txn.require_active()
    }
}

fn reject_empty(key: &[u8]) -> Result<()> {
    if key.is_empty() {
        return Err(Error::InvalidArgument);
    }
    Ok(())
}

pub(crate) fn mdb_val(bytes: &[u8]) -> ffi::MDB_val {
    ffi::MDB_val {
        mv_size: bytes.len(),
        mv_data: bytes.as_ptr() as *mut c_void,
    }
}

pub(crate) fn mdb_val_out() -> ffi::MDB_val {
    ffi::MDB_val {
        mv_size: 0,
        mv_data: ptr::null_mut(),
    }
}
