use std::ffi::NulError;
use std::os::raw::c_int;
use std::result;

use lmdb_sys as ffi;

/// Custom result type for LMDB operations
pub type Result<T> = result::Result<T, Error>;

/// Error kinds surfaced by this crate.
///
/// The first block mirrors the engine's documented return codes one for
/// one; the second block covers conditions detected in this layer before a
/// call ever reaches the engine. Codes outside the documented range are
/// preserved in [`Error::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Key/data pair already exists
    #[error("key/data pair already exists")]
    KeyExist,
    /// No matching key/data pair found
    #[error("no matching key/data pair found")]
    NotFound,
    /// Requested page not found
    #[error("requested page not found")]
    PageNotFound,
    /// Database file is corrupted
    #[error("database file is corrupted")]
    Corrupted,
    /// Update of meta page failed
    #[error("update of meta page failed, environment must be recovered")]
    Panic,
    /// Database environment version mismatch
    #[error("database environment version mismatch")]
    VersionMismatch,
    /// File is not a valid LMDB file
    #[error("file is not a valid LMDB file")]
    Invalid,
    /// Environment mapsize limit reached
    #[error("environment mapsize limit reached")]
    MapFull,
    /// Environment maxdbs limit reached
    #[error("environment maxdbs limit reached")]
    DbsFull,
    /// Environment maxreaders limit reached
    #[error("environment maxreaders limit reached")]
    ReadersFull,
    /// Thread-local storage keys full
    #[error("thread-local storage keys full")]
    TlsFull,
    /// Transaction has too many dirty pages
    #[error("transaction has too many dirty pages")]
    TxnFull,
    /// Too many open cursors
    #[error("too many open cursors")]
    CursorFull,
    /// Page has not enough space
    #[error("page has not enough space")]
    PageFull,
    /// Database contents grew beyond environment mapsize
    #[error("database contents grew beyond environment mapsize")]
    MapResized,
    /// Operation and DB incompatible, or DB belongs to another environment
    #[error("operation and database incompatible")]
    Incompatible,
    /// Invalid reuse of reader locktable slot
    #[error("invalid reuse of reader locktable slot")]
    BadRslot,
    /// Transaction must abort, has a child, or is invalid
    #[error("transaction must abort, has a child, or is invalid")]
    BadTxn,
    /// Unsupported size of key/DB name/data
    #[error("unsupported size of key, database name, or data")]
    BadValSize,
    /// The specified DBI was changed unexpectedly
    #[error("the specified database handle was changed unexpectedly")]
    BadDbi,
    /// Rejected argument: empty key, bad flag combination, interior NUL
    #[error("invalid argument")]
    InvalidArgument,
    /// Operation through a handle whose owning scope has ended
    #[error("handle is no longer valid in its current state")]
    InvalidState,
    /// Fixed-width value decoded from a buffer of the wrong length
    #[error("cannot decode value: expected {expected} bytes, found {found}")]
    DecodeSize { expected: usize, found: usize },
    /// Text value decoded from bytes that are not valid UTF-8
    #[error("cannot decode value: bytes are not valid UTF-8")]
    DecodeUtf8,
    /// Unknown error code
    #[error("unknown error code: {0}")]
    Other(c_int),
}

impl From<c_int> for Error {
    fn from(err: c_int) -> Error {
        match err {
            ffi::MDB_KEYEXIST => Error::KeyExist,
            ffi::MDB_NOTFOUND => Error::NotFound,
            ffi::MDB_PAGE_NOTFOUND => Error::PageNotFound,
            ffi::MDB_CORRUPTED => Error::Corrupted,
            ffi::MDB_PANIC => Error::Panic,
            ffi::MDB_VERSION_MISMATCH => Error::VersionMismatch,
            ffi::MDB_INVALID => Error::Invalid,
            ffi::MDB_MAP_FULL => Error::MapFull,
            ffi::MDB_DBS_FULL => Error::DbsFull,
            ffi::MDB_READERS_FULL => Error::ReadersFull,
            ffi::MDB_TLS_FULL => Error::TlsFull,
            ffi::MDB_TXN_FULL => Error::TxnFull,
            ffi::MDB_CURSOR_FULL => Error::CursorFull,
            ffi::MDB_PAGE_FULL => Error::PageFull,
            ffi::MDB_MAP_RESIZED => Error::MapResized,
            ffi::MDB_INCOMPATIBLE => Error::Incompatible,
            ffi::MDB_BAD_RSLOT => Error::BadRslot,
            ffi::MDB_BAD_TXN => Error::BadTxn,
            ffi::MDB_BAD_VALSIZE => Error::BadValSize,
            ffi::MDB_BAD_DBI => Error::BadDbi,
            libc::EINVAL => Error::InvalidArgument,
            err => Error::Other(err),
        }
    }
}

impl From<NulError> for Error {
    fn from(_: NulError) -> Error {
        // Names and paths travel to the engine as C strings
        Error::InvalidArgument
    }
}

/// Helper trait for converting C error codes to Results
pub(crate) trait IntoResult {
    fn into_result(self) -> Result<()>;
}

impl IntoResult for c_int {
    fn into_result(self) -> Result<()> {
        if self == ffi::MDB_SUCCESS {
            Ok(())
        } else {
            Err(Error::from(self))
        }
    }
}
