//! Typed, transaction-safe access to LMDB.
//!
//! One [`Environment`] is one memory-mapped data file holding any number
//! of named sub-databases. All reads and writes happen inside
//! [`Transaction`]s: explicit ones shared across operations, or implicit
//! one-shot ones when a [`Database`] call is given no transaction. Typed
//! values cross the storage boundary through [`ToBytes`] and
//! [`FromBytes`]; every engine status code surfaces as an [`Error`] kind.
//!
//! ```no_run
//! use lmdb_typed::{DbFlags, EnvFlags, Environment};
//!
//! # fn main() -> lmdb_typed::Result<()> {
//! let env = Environment::options()
//!     .max_dbs(32)
//!     .open("/tmp/my-data", EnvFlags::empty())?;
//! let db = env.open_database(Some("settings"), DbFlags::CREATE)?;
//!
//! db.put("greeting", "hello", None)?;
//! assert_eq!(db.get::<String>("greeting", None)?.as_deref(), Some("hello"));
//! # Ok(())
//! # }
//! ```

mod codec;
mod constants;
mod cursor;
mod database;
mod env;
mod error;
mod transaction;

pub use codec::{FromBytes, ToBytes};
pub use constants::{DbFlags, EnvFlags};
pub use cursor::Cursor;
pub use database::Database;
pub use env::{version, EnvInfo, Environment, EnvironmentOptions, Stat};
pub use error::{Error, Result};
pub use transaction::{Transaction, TransactionResult};
