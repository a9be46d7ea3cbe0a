// The log buffer: an on-disk, per-kind FIFO queue sitting on top of the
// Store's ordered buckets. Bounded-batch draining with deferred ack and
// atomic size-cap eviction are the two properties a network hiccup or a
// crash between drain and ack must never violate (SPEC_FULL.md §4.3, §8
// properties 1-3).

mod batch;
mod config;
mod kind;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use redb::ReadableTable;
use submerge_base::{Error, ErrorKind, Result};
use submerge_rowdb::Store;

pub use batch::Batch;
pub use config::LogBufferConfig;
pub use kind::Kind;

fn storage_err<E: std::error::Error + Send + Sync + 'static>(e: E) -> Error {
    Error::new(ErrorKind::Storage, e)
}

fn index(kind: Kind) -> usize {
    match kind {
        Kind::Status => 0,
        Kind::Result => 1,
    }
}

pub struct LogBuffer {
    store: Arc<Store>,
    config: LogBufferConfig,
    seq: [AtomicU64; 2],
    dropped: [AtomicU64; 2],
}

impl LogBuffer {
    /// Opens the buffer over `store`, seeding each kind's seq allocator from
    /// the bucket's current max key so a restart never reuses one.
    pub fn open(store: Arc<Store>, config: LogBufferConfig) -> Result<Self> {
        let mut next = [0u64; 2];
        for kind in Kind::ALL {
            let entries = store.range_ordered(kind.bucket())?;
            next[index(kind)] = entries
                .last()
                .map(|(k, _)| u64::from_be_bytes(k.as_slice().try_into().unwrap()) + 1)
                .unwrap_or(0);
        }
        Ok(LogBuffer {
            store,
            config,
            seq: [AtomicU64::new(next[0]), AtomicU64::new(next[1])],
            dropped: [AtomicU64::new(0), AtomicU64::new(0)],
        })
    }

    /// Number of lines dropped for this kind so far because they exceeded
    /// `max_line_bytes`. Never errors to the caller at append time.
    pub fn dropped(&self, kind: Kind) -> u64 {
        self.dropped[index(kind)].load(Ordering::SeqCst)
    }

    /// Assigns a fresh seq and appends `line`, then trims the kind's bucket
    /// back under the configured cap in the same transaction.
    pub fn append(&self, kind: Kind, line: &[u8]) -> Result<()> {
        if line.len() > self.config.max_line_bytes {
            self.dropped[index(kind)].fetch_add(1, Ordering::SeqCst);
            return Ok(());
        }

        let seq = self.seq[index(kind)].fetch_add(1, Ordering::SeqCst);
        let key = seq.to_be_bytes();
        let cap = self.config.max_bucket_bytes;
        let bucket = kind.bucket();

        self.store.update(|txn| {
            let mut table = txn.open_table(bucket.table()).map_err(storage_err)?;
            table.insert(&key[..], line).map_err(storage_err)?;

            let mut entries = Vec::new();
            let mut total: u64 = 0;
            for entry in table.iter().map_err(storage_err)? {
                let (k, v) = entry.map_err(storage_err)?;
                let len = v.value().len() as u64;
                total += len;
                entries.push((k.value().to_vec(), len));
            }
            let mut idx = 0;
            while total > cap && idx < entries.len() {
                let (evict_key, evict_len) = &entries[idx];
                table.remove(evict_key.as_slice()).map_err(storage_err)?;
                total -= evict_len;
                idx += 1;
            }
            Ok(())
        })
    }

    /// Returns up to `max_per_batch` oldest records for `kind`, stopping
    /// early once the configured aggregate byte budget is spent. The batch
    /// carries its own keys; nothing is deleted until [`Batch::ack`] runs.
    pub fn drain(&self, kind: Kind, max_per_batch: usize) -> Result<Batch> {
        let bucket = kind.bucket();
        let max_batch_bytes = self.config.max_batch_bytes;
        let (keys, lines) = self.store.view(|txn| {
            let table = txn.open_table(bucket.table()).map_err(storage_err)?;
            let mut keys = Vec::new();
            let mut lines = Vec::new();
            let mut total_bytes: u64 = 0;
            for entry in table.iter().map_err(storage_err)? {
                if keys.len() >= max_per_batch {
                    break;
                }
                let (k, v) = entry.map_err(storage_err)?;
                let len = v.value().len() as u64;
                if !keys.is_empty() && total_bytes + len > max_batch_bytes {
                    break;
                }
                total_bytes += len;
                keys.push(k.value().to_vec());
                lines.push(v.value().to_vec());
            }
            Ok((keys, lines))
        })?;

        Ok(Batch::new(Arc::clone(&self.store), bucket, keys, lines))
    }
}
