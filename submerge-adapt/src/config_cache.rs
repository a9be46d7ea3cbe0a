use std::sync::Arc;

use submerge_base::Result;
use submerge_rowdb::{Bucket, Store};

const CONFIG_CACHE_KEY: &[u8] = b"config-cache";

/// Last successfully retrieved configuration blob. Served back when a fresh
/// fetch fails; cleared as a side effect of re-enrollment.
pub(crate) struct ConfigCache {
    store: Arc<Store>,
}

impl ConfigCache {
    pub(crate) fn new(store: Arc<Store>) -> Self {
        ConfigCache { store }
    }

    pub(crate) fn get(&self) -> Result<Option<Vec<u8>>> {
        self.store.get_kv(Bucket::Config, CONFIG_CACHE_KEY)
    }

    pub(crate) fn set(&self, blob: &[u8]) -> Result<()> {
        self.store.put_kv(Bucket::Config, CONFIG_CACHE_KEY, blob)
    }

    pub(crate) fn clear(&self) -> Result<()> {
        self.store.delete(Bucket::Config, CONFIG_CACHE_KEY)
    }
}
