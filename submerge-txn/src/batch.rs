use std::sync::Arc;

use submerge_base::Result;
use submerge_rowdb::{Bucket, Store};

use crate::storage_err;

/// A slice of oldest-first log lines drained from one kind's bucket, paired
/// with the keys that produced it. Dropping a `Batch` without calling
/// [`Batch::ack`] leaves the store untouched; the next `drain` returns the
/// same records again (ack superset property, SPEC_FULL.md §8 property 2).
pub struct Batch {
    store: Arc<Store>,
    bucket: Bucket,
    keys: Vec<Vec<u8>>,
    lines: Vec<Vec<u8>>,
}

impl Batch {
    pub(crate) fn new(store: Arc<Store>, bucket: Bucket, keys: Vec<Vec<u8>>, lines: Vec<Vec<u8>>) -> Self {
        Batch { store, bucket, keys, lines }
    }

    pub fn lines(&self) -> &[Vec<u8>] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Deletes exactly the drained keys in one transaction. Idempotent on an
    /// empty batch.
    pub fn ack(self) -> Result<()> {
        if self.keys.is_empty() {
            return Ok(());
        }
        self.store.update(|txn| {
            let mut table = txn.open_table(self.bucket.table()).map_err(storage_err)?;
            for key in &self.keys {
                table.remove(key.as_slice()).map_err(storage_err)?;
            }
            Ok(())
        })
    }
}
