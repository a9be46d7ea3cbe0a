// The Store owns all on-disk agent state: a redb database file holding the
// `config`, `status-logs` and `result-logs` buckets (see §4.1/§6 of
// SPEC_FULL.md). It is a thin, typed wrapper over redb's own transaction
// API; redb already gives us serializable, single-writer/multi-reader
// transactions, so there is no additional lock discipline to add here.

mod bucket;

use std::path::Path;

use redb::{Database, ReadTransaction, ReadableTable, WriteTransaction};
use submerge_base::{Error, ErrorKind, Result};

pub use bucket::Bucket;

pub struct Store {
    db: Database,
}

fn storage_err<E: std::error::Error + Send + Sync + 'static>(e: E) -> Error {
    Error::new(ErrorKind::Storage, e)
}

impl Store {
    /// Opens (creating if absent) the database file at `path`, creating every
    /// [`Bucket`] idempotently.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Database::create(path.as_ref()).map_err(storage_err)?;
        let store = Store { db };
        store.update(|txn| {
            for bucket in Bucket::ALL {
                txn.open_table(bucket.table()).map_err(storage_err)?;
            }
            Ok(())
        })?;
        Ok(store)
    }

    /// Runs `f` inside a read-only transaction. No state changes are possible.
    pub fn view<T>(&self, f: impl FnOnce(&ReadTransaction) -> Result<T>) -> Result<T> {
        let txn = self.db.begin_read().map_err(storage_err)?;
        f(&txn)
    }

    /// Runs `f` inside a read-write transaction, committing iff `f` succeeds.
    /// If `f` returns an error the transaction is dropped uncommitted, which
    /// redb treats as an abort; no partial writes are ever visible.
    pub fn update<T>(&self, f: impl FnOnce(&WriteTransaction) -> Result<T>) -> Result<T> {
        let txn = self.db.begin_write().map_err(storage_err)?;
        let result = f(&txn)?;
        txn.commit().map_err(storage_err)?;
        Ok(result)
    }

    pub fn get_kv(&self, bucket: Bucket, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.view(|txn| {
            let table = txn.open_table(bucket.table()).map_err(storage_err)?;
            let value = table.get(key).map_err(storage_err)?;
            Ok(value.map(|v| v.value().to_vec()))
        })
    }

    pub fn put_kv(&self, bucket: Bucket, key: &[u8], value: &[u8]) -> Result<()> {
        self.update(|txn| {
            let mut table = txn.open_table(bucket.table()).map_err(storage_err)?;
            table.insert(key, value).map_err(storage_err)?;
            Ok(())
        })
    }

    pub fn delete(&self, bucket: Bucket, key: &[u8]) -> Result<()> {
        self.update(|txn| {
            let mut table = txn.open_table(bucket.table()).map_err(storage_err)?;
            table.remove(key).map_err(storage_err)?;
            Ok(())
        })
    }

    /// Appends `bytes` under `key` in the same way as [`Store::put_kv`]; a
    /// distinct name because callers of ordered buckets are expected to pass
    /// monotonically increasing byte-lexicographic keys (big-endian `seq`).
    pub fn append_ordered(&self, bucket: Bucket, key: &[u8], bytes: &[u8]) -> Result<()> {
        self.put_kv(bucket, key, bytes)
    }

    /// Returns every `(key, value)` pair in `bucket` in ascending key order.
    pub fn range_ordered(&self, bucket: Bucket) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        self.view(|txn| {
            let table = txn.open_table(bucket.table()).map_err(storage_err)?;
            let mut out = Vec::new();
            for entry in table.iter().map_err(storage_err)? {
                let (k, v) = entry.map_err(storage_err)?;
                out.push((k.value().to_vec(), v.value().to_vec()));
            }
            Ok(out)
        })
    }
}

#[cfg(test)]
mod test;
