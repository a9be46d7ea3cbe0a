use std::sync::Arc;

use submerge_base::Result;
use submerge_rowdb::{Bucket, Store};
use ulid::Ulid;

const NODE_KEY: &[u8] = b"node-key";
const HOST_UUID_KEY: &[u8] = b"host-uuid";

/// Persisted identity state: the server-issued node key (cleared on
/// re-enroll) and the locally-generated host identifier (stable for the
/// agent's lifetime on this host). Both live in the Store's `config` bucket.
pub struct Identity {
    store: Arc<Store>,
}

impl Identity {
    pub fn new(store: Arc<Store>) -> Self {
        Identity { store }
    }

    pub fn node_key(&self) -> Result<Option<String>> {
        let bytes = self.store.get_kv(Bucket::Config, NODE_KEY)?;
        Ok(bytes.map(|b| String::from_utf8_lossy(&b).into_owned()))
    }

    pub fn set_node_key(&self, node_key: &str) -> Result<()> {
        self.store.put_kv(Bucket::Config, NODE_KEY, node_key.as_bytes())
    }

    pub fn clear_node_key(&self) -> Result<()> {
        self.store.delete(Bucket::Config, NODE_KEY)
    }

    /// Returns the persisted host identifier, generating and persisting a
    /// fresh ULID the first time this is called against a given Store.
    pub fn host_identifier(&self) -> Result<String> {
        if let Some(bytes) = self.store.get_kv(Bucket::Config, HOST_UUID_KEY)? {
            if let Ok(text) = String::from_utf8(bytes) {
                if Ulid::from_string(&text).is_ok() {
                    return Ok(text);
                }
            }
        }
        let fresh = Ulid::new().to_string();
        self.store.put_kv(Bucket::Config, HOST_UUID_KEY, fresh.as_bytes())?;
        Ok(fresh)
    }
}
