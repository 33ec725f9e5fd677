use lmdb_typed::{DbFlags, EnvFlags, Environment, Error, TransactionResult};
use tempfile::TempDir;

fn setup_test_env() -> (TempDir, Environment) {
    let temp_dir = TempDir::new().unwrap();
    let env = Environment::options()
        .max_dbs(32)
        .open(temp_dir.path(), EnvFlags::empty())
        .unwrap();
    (temp_dir, env)
}

#[test]
fn test_read_your_own_writes() {
    let (_dir, env) = setup_test_env();
    let db = env.open_database(Some("ryow"), DbFlags::CREATE).unwrap();

    let txn = env.begin_txn().unwrap();
    db.put("key", "value", Some(&txn)).unwrap();

    // Visible inside the same transaction before it commits
    assert_eq!(db.get::<String>("key", Some(&txn)).unwrap().as_deref(), Some("value"));
    txn.commit().unwrap();

    assert_eq!(db.get::<String>("key", None).unwrap().as_deref(), Some("value"));
}

#[test]
fn test_abort_discards_writes() {
    let (_dir, env) = setup_test_env();
    let db = env.open_database(Some("abort"), DbFlags::CREATE).unwrap();

    let txn = env.begin_txn().unwrap();
    db.put("key", "value", Some(&txn)).unwrap();
    txn.abort();

    assert_eq!(db.get::<String>("key", None).unwrap(), None);
    assert_eq!(db.count(None).unwrap(), 0);
}

#[test]
fn test_snapshot_isolation() {
    let (_dir, env) = setup_test_env();
    let db = env.open_database(Some("iso"), DbFlags::CREATE).unwrap();

    let writer = env.begin_txn().unwrap();
    db.put("key", "value", Some(&writer)).unwrap();

    // A reader that began before the commit never sees the write
    let early_reader = env.begin_ro_txn().unwrap();
    writer.commit().unwrap();
    assert_eq!(db.get::<String>("key", Some(&early_reader)).unwrap(), None);
    early_reader.abort();

    // A reader that began after the commit does
    let late_reader = env.begin_ro_txn().unwrap();
    assert_eq!(
        db.get::<String>("key", Some(&late_reader)).unwrap().as_deref(),
        Some("value")
    );
}

#[test]
fn test_write_closure_commit_and_abort() {
    let (_dir, env) = setup_test_env();
    let db1 = env.open_database(Some("first"), DbFlags::CREATE).unwrap();
    let db2 = env.open_database(Some("second"), DbFlags::CREATE).unwrap();

    db1.put("key", "before", None).unwrap();
    db2.put("key", "before", None).unwrap();

    // Both writes under one aborted transaction: neither is applied
    env.write(|txn| {
        db1.put("key", "after", Some(txn)).unwrap();
        db2.put("key", "after", Some(txn)).unwrap();
        Ok((TransactionResult::Abort, ()))
    })
    .unwrap();

    assert_eq!(db1.get::<String>("key", None).unwrap().as_deref(), Some("before"));
    assert_eq!(db2.get::<String>("key", None).unwrap().as_deref(), Some("before"));

    // Both writes under one committed transaction: both are applied
    env.write(|txn| {
        db1.put("key", "after", Some(txn)).unwrap();
        db2.put("key", "after", Some(txn)).unwrap();
        Ok((TransactionResult::Commit, ()))
    })
    .unwrap();

    assert_eq!(db1.get::<String>("key", None).unwrap().as_deref(), Some("after"));
    assert_eq!(db2.get::<String>("key", None).unwrap().as_deref(), Some("after"));
}

#[test]
fn test_write_closure_aborts_on_error() {
    let (_dir, env) = setup_test_env();
    let db = env.open_database(Some("err"), DbFlags::CREATE).unwrap();

    let result: Result<(), Error> = env.write(|txn| {
        db.put("key", "value", Some(txn))?;
        Err(Error::InvalidArgument)
    });
    assert!(matches!(result, Err(Error::InvalidArgument)));

    // The failed body's write never became visible
    assert_eq!(db.get::<String>("key", None).unwrap(), None);
}

#[test]
fn test_read_closure() {
    let (_dir, env) = setup_test_env();
    let db = env.open_database(Some("read"), DbFlags::CREATE).unwrap();
    db.put("key", &7u32, None).unwrap();

    let value = env
        .read(|txn| db.get::<u32>("key", Some(txn)))
        .unwrap();
    assert_eq!(value, Some(7));
}

#[test]
fn test_write_through_read_only_transaction_is_rejected() {
    let (_dir, env) = setup_test_env();
    let db = env.open_database(Some("ro"), DbFlags::CREATE).unwrap();

    let txn = env.begin_ro_txn().unwrap();
    assert!(matches!(
        db.put("key", "value", Some(&txn)),
        Err(Error::InvalidArgument)
    ));
    assert!(matches!(db.empty(Some(&txn)), Err(Error::InvalidArgument)));
}

#[test]
fn test_foreign_environment_transaction_is_rejected() {
    let (_dir, env) = setup_test_env();
    let (_dir2, other_env) = setup_test_env();
    let db = env.open_database(Some("home"), DbFlags::CREATE).unwrap();

    let foreign = other_env.begin_txn().unwrap();
    assert!(matches!(
        db.get::<String>("key", Some(&foreign)),
        Err(Error::Incompatible)
    ));
}

#[test]
fn test_nested_transaction_commit_then_parent_abort() {
    let (_dir, env) = setup_test_env();
    let db = env.open_database(Some("nested"), DbFlags::CREATE).unwrap();

    let parent = env.begin_txn().unwrap();
    {
        let child = parent.begin_nested().unwrap();
        db.put("key", "child-write", Some(&child)).unwrap();
        child.commit().unwrap();
    }

    // The committed child's write rides on the parent...
    assert_eq!(
        db.get::<String>("key", Some(&parent)).unwrap().as_deref(),
        Some("child-write")
    );

    // ...and dies with it
    parent.abort();
    assert_eq!(db.get::<String>("key", None).unwrap(), None);
}

#[test]
fn test_nested_transaction_durable_after_both_commit() {
    let (_dir, env) = setup_test_env();
    let db = env.open_database(Some("nested2"), DbFlags::CREATE).unwrap();

    let parent = env.begin_txn().unwrap();
    let child = parent.begin_nested().unwrap();
    db.put("key", "value", Some(&child)).unwrap();
    child.commit().unwrap();
    parent.commit().unwrap();

    assert_eq!(db.get::<String>("key", None).unwrap().as_deref(), Some("value"));
}

#[test]
fn test_child_abort_spares_parent_writes() {
    let (_dir, env) = setup_test_env();
    let db = env.open_database(Some("nested3"), DbFlags::CREATE).unwrap();

    let parent = env.begin_txn().unwrap();
    db.put("parent-key", "parent", Some(&parent)).unwrap();

    let child = parent.begin_nested().unwrap();
    db.put("child-key", "child", Some(&child)).unwrap();
    child.abort();

    parent.commit().unwrap();

    assert_eq!(db.get::<String>("parent-key", None).unwrap().as_deref(), Some("parent"));
    assert_eq!(db.get::<String>("child-key", None).unwrap(), None);
}

#[test]
fn test_parent_is_blocked_while_child_is_live() {
    let (_dir, env) = setup_test_env();
    let db = env.open_database(Some("blocked"), DbFlags::CREATE).unwrap();

    let parent = env.begin_txn().unwrap();
    let child = parent.begin_nested().unwrap();

    assert!(matches!(
        db.put("key", "value", Some(&parent)),
        Err(Error::InvalidState)
    ));
    assert!(matches!(
        db.get::<String>("key", Some(&parent)),
        Err(Error::InvalidState)
    ));
    assert!(!parent.is_active());

    // Ending the child unblocks the parent
    child.abort();
    assert!(parent.is_active());
    db.put("key", "value", Some(&parent)).unwrap();
    parent.commit().unwrap();
}

#[test]
fn test_nested_under_read_only_is_rejected() {
    let (_dir, env) = setup_test_env();

    let txn = env.begin_ro_txn().unwrap();
    assert!(matches!(txn.begin_nested(), Err(Error::InvalidArgument)));
}
