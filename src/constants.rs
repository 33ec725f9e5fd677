use bitflags::bitflags;
use lmdb_sys as ffi;

// Environment flags
bitflags! {
    /// Flags applied when opening an [`Environment`](crate::Environment).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EnvFlags: u32 {
        /// Use a fixed address for the memory map
        const FIXEDMAP = ffi::MDB_FIXEDMAP;
        /// Path is a file, not a directory
        const NOSUBDIR = ffi::MDB_NOSUBDIR;
        /// Don't fsync after commit
        const NOSYNC = ffi::MDB_NOSYNC;
        /// Open the environment read-only
        const RDONLY = ffi::MDB_RDONLY;
        /// Don't fsync the meta page after commit
        const NOMETASYNC = ffi::MDB_NOMETASYNC;
        /// Use a writeable memory map
        const WRITEMAP = ffi::MDB_WRITEMAP;
        /// Use asynchronous msync when WRITEMAP is set
        const MAPASYNC = ffi::MDB_MAPASYNC;
        /// Tie reader locktable slots to transactions instead of threads
        const NOTLS = ffi::MDB_NOTLS;
        /// Don't do any locking; caller manages concurrency
        const NOLOCK = ffi::MDB_NOLOCK;
        /// Don't readahead the memory map
        const NORDAHEAD = ffi::MDB_NORDAHEAD;
        /// Don't initialize malloc'd memory before writing to the datafile
        const NOMEMINIT = ffi::MDB_NOMEMINIT;
    }
}

// Database flags
bitflags! {
    /// Flags applied when opening a [`Database`](crate::Database).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DbFlags: u32 {
        /// Compare keys in reverse byte order
        const REVERSEKEY = ffi::MDB_REVERSEKEY;
        /// Allow duplicate keys, sorted by value
        const DUPSORT = ffi::MDB_DUPSORT;
        /// Keys are binary integers in native byte order
        const INTEGERKEY = ffi::MDB_INTEGERKEY;
        /// Duplicate values are all the same size
        const DUPFIXED = ffi::MDB_DUPFIXED;
        /// Duplicate values are binary integers
        const INTEGERDUP = ffi::MDB_INTEGERDUP;
        /// Compare duplicate values in reverse byte order
        const REVERSEDUP = ffi::MDB_REVERSEDUP;
        /// Create the database if it doesn't exist
        const CREATE = ffi::MDB_CREATE;
    }
}

/// Unix file mode used for the data and lock files unless overridden
pub const DEFAULT_OPEN_MODE: ffi::mode_t = 0o644;
