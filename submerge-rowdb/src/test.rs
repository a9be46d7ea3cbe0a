use test_log::test;

use crate::{Bucket, Store};

fn temp_store() -> (tempfile::TempDir, Store) {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path().join("osquery.db")).unwrap();
    (dir, store)
}

#[test]
fn opens_empty_buckets() {
    let (_dir, store) = temp_store();
    for bucket in Bucket::ALL {
        assert!(store.range_ordered(bucket).unwrap().is_empty());
    }
}

#[test]
fn put_and_get_kv_roundtrips() {
    let (_dir, store) = temp_store();
    store.put_kv(Bucket::Config, b"node-key", b"NK1").unwrap();
    assert_eq!(
        store.get_kv(Bucket::Config, b"node-key").unwrap(),
        Some(b"NK1".to_vec())
    );
}

#[test]
fn missing_key_is_none() {
    let (_dir, store) = temp_store();
    assert_eq!(store.get_kv(Bucket::Config, b"nope").unwrap(), None);
}

#[test]
fn delete_removes_key() {
    let (_dir, store) = temp_store();
    store.put_kv(Bucket::Config, b"k", b"v").unwrap();
    store.delete(Bucket::Config, b"k").unwrap();
    assert_eq!(store.get_kv(Bucket::Config, b"k").unwrap(), None);
}

#[test]
fn range_ordered_is_byte_lexicographic() {
    let (_dir, store) = temp_store();
    store
        .append_ordered(Bucket::StatusLogs, &3u64.to_be_bytes(), b"three")
        .unwrap();
    store
        .append_ordered(Bucket::StatusLogs, &1u64.to_be_bytes(), b"one")
        .unwrap();
    store
        .append_ordered(Bucket::StatusLogs, &2u64.to_be_bytes(), b"two")
        .unwrap();
    let entries = store.range_ordered(Bucket::StatusLogs).unwrap();
    let values: Vec<Vec<u8>> = entries.into_iter().map(|(_, v)| v).collect();
    assert_eq!(values, vec![b"one".to_vec(), b"two".to_vec(), b"three".to_vec()]);
}

#[test]
fn buckets_are_independent() {
    let (_dir, store) = temp_store();
    store.put_kv(Bucket::StatusLogs, b"k", b"status").unwrap();
    store.put_kv(Bucket::ResultLogs, b"k", b"result").unwrap();
    assert_eq!(
        store.get_kv(Bucket::StatusLogs, b"k").unwrap(),
        Some(b"status".to_vec())
    );
    assert_eq!(
        store.get_kv(Bucket::ResultLogs, b"k").unwrap(),
        Some(b"result".to_vec())
    );
}

#[test]
fn update_rolls_back_on_error() {
    let (_dir, store) = temp_store();
    let result: submerge_base::Result<()> = store.update(|txn| {
        let mut table = txn.open_table(Bucket::Config.table()).unwrap();
        table.insert(&b"k"[..], &b"v"[..]).unwrap();
        Err(submerge_base::err("synthetic failure"))
    });
    assert!(result.is_err());
    assert_eq!(store.get_kv(Bucket::Config, b"k").unwrap(), None);
}
