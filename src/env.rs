use std::ffi::CString;
use std::mem::MaybeUninit;
use std::os::raw::c_int;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::ptr;
use std::sync::Mutex;

use lmdb_sys as ffi;
use log::{debug, warn};

use crate::constants::{DbFlags, EnvFlags, DEFAULT_OPEN_MODE};
use crate::database::Database;
use crate::error::{Error, IntoResult, Result};
use crate::transaction::{Transaction, TransactionResult};

/// Statistics for an environment or a single database
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    /// Page size
    pub psize: u32,
    /// B-tree depth
    pub depth: u32,
    /// Number of branch pages
    pub branch_pages: usize,
    /// Number of leaf pages
    pub leaf_pages: usize,
    /// Number of overflow pages
    pub overflow_pages: usize,
    /// Number of entries
    pub entries: usize,
}

impl Stat {
    pub(crate) fn from_ffi(stat: &ffi::MDB_stat) -> Stat {
        Stat {
            psize: stat.ms_psize as u32,
            depth: stat.ms_depth as u32,
            branch_pages: stat.ms_branch_pages,
            leaf_pages: stat.ms_leaf_pages,
            overflow_pages: stat.ms_overflow_pages,
            entries: stat.ms_entries,
        }
    }
}

/// Runtime information about an environment
#[derive(Debug, Clone)]
pub struct EnvInfo {
    /// Size of the memory map
    pub mapsize: usize,
    /// Number of the last used page
    pub last_pgno: usize,
    /// ID of the last committed transaction
    pub last_txnid: usize,
    /// Maximum number of reader slots
    pub max_readers: u32,
    /// Number of reader slots currently in use
    pub num_readers: u32,
}

/// Configuration applied before an environment is opened.
///
/// Options left unset keep the engine's defaults (10 MiB map, 126 readers,
/// no named databases).
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvironmentOptions {
    map_size: Option<usize>,
    max_readers: Option<u32>,
    max_dbs: Option<u32>,
    mode: Option<ffi::mode_t>,
}

impl EnvironmentOptions {
    pub fn new() -> EnvironmentOptions {
        EnvironmentOptions::default()
    }

    /// Set the size of the memory map, also the maximum size of the data file
    pub fn map_size(mut self, size: usize) -> EnvironmentOptions {
        self.map_size = Some(size);
        self
    }

    /// Set the maximum number of concurrent reader slots
    pub fn max_readers(mut self, readers: u32) -> EnvironmentOptions {
        self.max_readers = Some(readers);
        self
    }

    /// Set the maximum number of named databases.
    ///
    /// Required before any named database can be opened.
    pub fn max_dbs(mut self, dbs: u32) -> EnvironmentOptions {
        self.max_dbs = Some(dbs);
        self
    }

    /// Set the unix file mode for the data and lock files
    pub fn mode(mut self, mode: ffi::mode_t) -> EnvironmentOptions {
        self.mode = Some(mode);
        self
    }

    /// Open the environment at `path`, creating the data file if absent.
    ///
    /// `path` must be an existing directory unless
    /// [`EnvFlags::NOSUBDIR`] names a plain file; intermediate directories
    /// are never created here.
    pub fn open<P: AsRef<Path>>(&self, path: P, flags: EnvFlags) -> Result<Environment> {
        let path = path.as_ref();
        let path_c = CString::new(path.as_os_str().as_bytes())?;

        let mut env: *mut ffi::MDB_env = ptr::null_mut();
        unsafe {
            ffi::mdb_env_create(&mut env).into_result()?;
        }

        let configured = (|| unsafe {
            if let Some(size) = self.map_size {
                ffi::mdb_env_set_mapsize(env, size).into_result()?;
            }
            if let Some(readers) = self.max_readers {
                ffi::mdb_env_set_maxreaders(env, readers).into_result()?;
            }
            if let Some(dbs) = self.max_dbs {
                ffi::mdb_env_set_maxdbs(env, dbs).into_result()?;
            }
            let mode = self.mode.unwrap_or(DEFAULT_OPEN_MODE);
            ffi::mdb_env_open(env, path_c.as_ptr(), flags.bits(), mode).into_result()
        })();

        if let Err(err) = configured {
            // A failed open still leaves a handle that must be closed
            unsafe { ffi::mdb_env_close(env) };
            return Err(err);
        }

        debug!("opened environment at {}", path.display());
        Ok(Environment {
            env,
            path: path.to_path_buf(),
            flags,
            dbi_open_lock: Mutex::new(()),
        })
    }
}

/// The open handle to one memory-mapped storage file: the root of every
/// database, transaction, and cursor derived from it.
///
/// All derived handles borrow the environment, so it cannot be dropped
/// while any of them is alive; dropping it closes the engine handle.
#[derive(Debug)]
pub struct Environment {
    env: *mut ffi::MDB_env,
    path: PathBuf,
    flags: EnvFlags,
    /// The engine forbids concurrent dbi_open calls within one process
    dbi_open_lock: Mutex<()>,
}

// The engine handle is designed for use from multiple threads; every
// mutating entry point below goes through the engine's own locks.
unsafe impl Send for Environment {}
unsafe impl Sync for Environment {}

impl Environment {
    /// Configuration builder for an environment
    pub fn options() -> EnvironmentOptions {
        EnvironmentOptions::new()
    }

    /// Open the environment at `path` with default options
    pub fn open<P: AsRef<Path>>(path: P, flags: EnvFlags) -> Result<Environment> {
        EnvironmentOptions::new().open(path, flags)
    }

    /// Open a database in the environment, the unnamed default one when
    /// `name` is `None`.
    ///
    /// Fails with [`Error::NotFound`] when the named database does not
    /// exist and [`DbFlags::CREATE`] was not requested. Named databases
    /// also require [`EnvironmentOptions::max_dbs`] to have been set.
    ///
    /// The handle is created under a short internal transaction which must
    /// take the writer lock when creating; do not call this while holding
    /// an open read-write transaction on the same thread.
    pub fn open_database(&self, name: Option<&str>, flags: DbFlags) -> Result<Database<'_>> {
        let create = flags.contains(DbFlags::CREATE);
        if create && self.flags.contains(EnvFlags::RDONLY) {
            return Err(Error::InvalidArgument);
        }
        let name_c = name.map(CString::new).transpose()?;

        // Serialize dbi_open against every other caller in this process
        let _guard = self
            .dbi_open_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let txn = Transaction::begin(self, !create)?;
        let mut dbi: ffi::MDB_dbi = 0;
        let name_ptr = name_c
            .as_ref()
            .map_or(ptr::null(), |n| n.as_ptr());
        unsafe {
            ffi::mdb_dbi_open(txn.txn_ptr(), name_ptr, flags.bits(), &mut dbi).into_result()?;
        }
        txn.commit()?;

        debug!("opened database {:?} in {}", name, self.path.display());
        Ok(Database::new(self, dbi, name.map(str::to_owned)))
    }

    /// Begin a new read-write transaction.
    ///
    /// Blocks while another read-write transaction is in flight anywhere
    /// on this environment.
    pub fn begin_txn(&self) -> Result<Transaction<'_>> {
        Transaction::begin(self, false)
    }

    /// Begin a new read-only transaction
    pub fn begin_ro_txn(&self) -> Result<Transaction<'_>> {
        Transaction::begin(self, true)
    }

    /// Run `body` under a read-write transaction and end it as the body
    /// directs.
    ///
    /// The transaction commits on [`TransactionResult::Commit`], aborts on
    /// [`TransactionResult::Abort`], and aborts before the error propagates
    /// when `body` fails; no exit path can leave a half-applied write
    /// visible.
    pub fn write<T, F>(&self, body: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<(TransactionResult, T)>,
    {
        let txn = Transaction::begin(self, false)?;
        match body(&txn) {
            Ok((TransactionResult::Commit, value)) => {
                txn.commit()?;
                Ok(value)
            }
            Ok((TransactionResult::Abort, value)) => {
                txn.abort();
                Ok(value)
            }
            Err(err) => {
                txn.abort();
                Err(err)
            }
        }
    }

    /// Run `body` under a read-only transaction
    pub fn read<T, F>(&self, body: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let txn = Transaction::begin(self, true)?;
        let value = body(&txn)?;
        txn.commit()?;
        Ok(value)
    }

    /// Flush the data buffers to disk.
    ///
    /// If `force` is true the flush is synchronous, regardless of the
    /// NOSYNC/MAPASYNC flags the environment was opened with.
    pub fn sync(&self, force: bool) -> Result<()> {
        unsafe { ffi::mdb_env_sync(self.env, c_int::from(force)).into_result() }
    }

    /// Copy the environment to an empty directory at `path`.
    ///
    /// May be used as a hot backup; `compact` omits free pages and renumbers
    /// the rest, at the cost of a slower copy.
    pub fn copy<P: AsRef<Path>>(&self, path: P, compact: bool) -> Result<()> {
        let path_c = CString::new(path.as_ref().as_os_str().as_bytes())?;
        let flags = if compact { ffi::MDB_CP_COMPACT } else { 0 };
        unsafe { ffi::mdb_env_copy2(self.env, path_c.as_ptr(), flags).into_result() }
    }

    /// Get environment statistics
    pub fn stat(&self) -> Result<Stat> {
        let mut stat = MaybeUninit::<ffi::MDB_stat>::uninit();
        unsafe {
            ffi::mdb_env_stat(self.env, stat.as_mut_ptr()).into_result()?;
            Ok(Stat::from_ffi(&stat.assume_init()))
        }
    }

    /// Get environment runtime information
    pub fn info(&self) -> Result<EnvInfo> {
        let mut info = MaybeUninit::<ffi::MDB_envinfo>::uninit();
        let info = unsafe {
            ffi::mdb_env_info(self.env, info.as_mut_ptr()).into_result()?;
            info.assume_init()
        };
        Ok(EnvInfo {
            mapsize: info.me_mapsize,
            last_pgno: info.me_last_pgno,
            last_txnid: info.me_last_txnid,
            max_readers: info.me_maxreaders as u32,
            num_readers: info.me_numreaders as u32,
        })
    }

    /// Clear reader slots left behind by dead processes, returning how
    /// many were reclaimed.
    pub fn reader_check(&self) -> Result<usize> {
        let mut dead: c_int = 0;
        unsafe {
            ffi::mdb_reader_check(self.env, &mut dead).into_result()?;
        }
        if dead > 0 {
            warn!("cleared {} stale reader slot(s)", dead);
        }
        Ok(dead as usize)
    }

    /// Get the path that was used to open the environment
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the flags the environment was opened with
    pub fn flags(&self) -> EnvFlags {
        self.flags
    }

    /// Get the maximum number of reader slots
    pub fn max_readers(&self) -> Result<u32> {
        let mut readers: libc::c_uint = 0;
        unsafe {
            ffi::mdb_env_get_maxreaders(self.env, &mut readers).into_result()?;
        }
        Ok(readers as u32)
    }

    /// Get the maximum size of a key, in bytes
    pub fn max_key_size(&self) -> u32 {
        unsafe { ffi::mdb_env_get_maxkeysize(self.env) as u32 }
    }

    pub(crate) fn env_ptr(&self) -> *mut ffi::MDB_env {
        self.env
    }
}

impl Drop for Environment {
    fn drop(&mut self) {
        debug!("closing environment at {}", self.path.display());
        unsafe { ffi::mdb_env_close(self.env) };
    }
}

/// Version of the underlying engine as (major, minor, patch)
pub fn version() -> (i32, i32, i32) {
    let mut major: c_int = 0;
    let mut minor: c_int = 0;
    let mut patch: c_int = 0;
    unsafe { ffi::mdb_version(&mut major, &mut minor, &mut patch) };
    (major, minor, patch)
}
