use std::os::raw::c_uint;
use std::ptr;
use std::slice;

use lmdb_sys as ffi;

use crate::database::{mdb_val, mdb_val_out};
use crate::error::{Error, IntoResult, Result};
use crate::transaction::Transaction;

/// An ordered positional iterator over one database's keys within one
/// transaction.
///
/// The cursor borrows its transaction, so it cannot be used once the
/// transaction has ended. Each positioning operation either returns the
/// newly positioned entry or fails with [`Error::NotFound`] when no such
/// entry exists, such as walking past the last key of the database.
#[derive(Debug)]
pub struct Cursor<'txn> {
    cursor: *mut ffi::MDB_cursor,
    txn: &'txn Transaction<'txn>,
}

impl<'txn> Cursor<'txn> {
    pub(crate) fn open(txn: &'txn Transaction<'_>, dbi: ffi::MDB_dbi) -> Result<Cursor<'txn>> {
        txn.require_active()?;
        let mut cursor: *mut ffi::MDB_cursor = ptr::null_mut();
        unsafe {
            ffi::mdb_cursor_open(txn.txn_ptr(), dbi, &mut cursor).into_result()?;
        }
        Ok(Cursor { cursor, txn })
    }

    /// Position at the entry with the lexicographically smallest key
    pub fn first(&mut self) -> Result<(Vec<u8>, Vec<u8>)> {
        self.position(None, ffi::MDB_FIRST)
    }

    /// Position at the entry with the lexicographically largest key
    pub fn last(&mut self) -> Result<(Vec<u8>, Vec<u8>)> {
        self.position(None, ffi::MDB_LAST)
    }

    /// Advance to the next entry in key order
    pub fn next(&mut self) -> Result<(Vec<u8>, Vec<u8>)> {
        self.position(None, ffi::MDB_NEXT)
    }

    /// Step back to the previous entry in key order
    pub fn prev(&mut self) -> Result<(Vec<u8>, Vec<u8>)> {
        self.position(None, ffi::MDB_PREV)
    }

    /// Position at exactly `key`
    pub fn seek(&mut self, key: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
        self.position(Some(key), ffi::MDB_SET_KEY)
    }

    /// Position at the first entry whose key is `>= key`
    pub fn seek_range(&mut self, key: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
        self.position(Some(key), ffi::MDB_SET_RANGE)
    }

    fn position(&mut self, key: Option<&[u8]>, op: c_uint) -> Result<(Vec<u8>, Vec<u8>)> {
        self.txn.require_active()?;
        let mut key_val = match key {
            Some(key) => {
                if key.is_empty() {
                    return Err(Error::InvalidArgument);
                }
                mdb_val(key)
            }
            None => mdb_val_out(),
        };
        let mut data_val = mdb_val_out();
        unsafe {
            ffi::mdb_cursor_get(self.cursor, &mut key_val, &mut data_val, op).into_result()?;
        }
        // Both slices point into the map; copy before the borrow can lapse
        let pair = unsafe {
            (
                slice::from_raw_parts(key_val.mv_data as *const u8, key_val.mv_size).to_vec(),
                slice::from_raw_parts(data_val.mv_data as *const u8, data_val.mv_size).to_vec(),
            )
        };
        Ok(pair)
    }
}

impl Drop for Cursor<'_> {
    fn drop(&mut self) {
        // Always closed before the transaction ends; the borrow guarantees it
        unsafe { ffi::mdb_cursor_close(self.cursor) };
    }
}
